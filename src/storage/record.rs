use std::io::{Read, Seek};

use crate::{
    storage::{
        cursor::ByteCursor,
        varint::{encode_varint, read_varint, varint_len},
    },
    types::{
        error::{DatabaseError, Result},
        value::Value,
    },
};

/// The serial types this reader understands. Anything else in a record
/// header is reported as an unsupported layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int32,
    Blob(usize),
    Text(usize),
}

impl SerialType {
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            0 => Ok(SerialType::Null),
            1 => Ok(SerialType::Int8),
            4 => Ok(SerialType::Int32),
            n if n >= 12 && n % 2 == 0 => Ok(SerialType::Blob(((n - 12) / 2) as usize)),
            n if n >= 13 => Ok(SerialType::Text(((n - 13) / 2) as usize)),
            n => Err(DatabaseError::unsupported(format!("serial type {n}"))),
        }
    }

    pub fn code(&self) -> u64 {
        match self {
            SerialType::Null => 0,
            SerialType::Int8 => 1,
            SerialType::Int32 => 4,
            SerialType::Blob(len) => *len as u64 * 2 + 12,
            SerialType::Text(len) => *len as u64 * 2 + 13,
        }
    }

    /// Bytes occupied by the value in the record body.
    pub fn size(&self) -> usize {
        match self {
            SerialType::Null => 0,
            SerialType::Int8 => 1,
            SerialType::Int32 => 4,
            SerialType::Blob(len) | SerialType::Text(len) => *len,
        }
    }

    /// Pick the serial type that encodes `value`. Integers outside the i32 range
    /// have no supported serial type.
    pub fn for_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(SerialType::Null),
            Value::Integer(i) if i8::try_from(*i).is_ok() => Ok(SerialType::Int8),
            Value::Integer(i) if i32::try_from(*i).is_ok() => Ok(SerialType::Int32),
            Value::Integer(i) => Err(DatabaseError::unsupported(format!(
                "integer {i} needs a wider serial type"
            ))),
            Value::Text(t) => Ok(SerialType::Text(t.len())),
            Value::Blob(b) => Ok(SerialType::Blob(b.len())),
        }
    }
}

/// Decode a record at the cursor.
///
/// With `expected_columns = Some(n)` the result always has exactly `n` values:
/// serial types are read until `n` are known or the stored header ends, and
/// columns missing from a short header decode as Null. With `None` every
/// serial type in the header is decoded.
pub fn read_record<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    expected_columns: Option<usize>,
) -> Result<Vec<Value>> {
    decode_record(cursor, expected_columns, None)
}

/// Decode a record that must fit in a cell payload of `payload_len` bytes.
/// A header or body that would run past the payload is a malformed stream.
pub fn read_payload_record<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    expected_columns: Option<usize>,
    payload_len: u64,
) -> Result<Vec<Value>> {
    decode_record(cursor, expected_columns, Some(payload_len))
}

fn decode_record<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    expected_columns: Option<usize>,
    payload_len: Option<u64>,
) -> Result<Vec<Value>> {
    let header_start = cursor.position();
    let header_len = read_varint(cursor)?;
    if let Some(limit) = payload_len.filter(|&limit| header_len > limit) {
        return Err(DatabaseError::malformed(
            header_start,
            format!("record header length {header_len} exceeds the {limit}-byte payload"),
        ));
    }
    let header_end = header_start.checked_add(header_len).ok_or_else(|| {
        DatabaseError::malformed(
            header_start,
            format!("record header length {header_len} overflows"),
        )
    })?;
    if header_end < cursor.position() {
        return Err(DatabaseError::malformed(
            header_start,
            format!("record header length {header_len} shorter than its own varint"),
        ));
    }

    let mut serial_types = Vec::new();
    while cursor.position() < header_end
        && expected_columns.is_none_or(|n| serial_types.len() < n)
    {
        let code = read_varint(cursor)?;
        serial_types.push(SerialType::from_code(code)?);
    }
    if cursor.position() > header_end {
        return Err(DatabaseError::malformed(
            header_start,
            format!(
                "serial types overran declared header length {header_len} (consumed {})",
                cursor.position() - header_start
            ),
        ));
    }

    let body_len = serial_types
        .iter()
        .try_fold(0u64, |total, t| total.checked_add(t.size() as u64));
    match (body_len, payload_len) {
        (None, _) => {
            return Err(DatabaseError::malformed(header_start, "record body length overflows"));
        }
        (Some(body_len), Some(limit)) if body_len > limit - header_len => {
            return Err(DatabaseError::malformed(
                header_start,
                format!(
                    "record of {} bytes overruns its {limit}-byte payload",
                    header_len.saturating_add(body_len)
                ),
            ));
        }
        _ => {}
    }

    // Body starts right after the declared header, even if we stopped early.
    cursor.seek(header_end)?;

    let mut values = Vec::with_capacity(serial_types.len());
    for serial_type in &serial_types {
        values.push(read_value(cursor, *serial_type)?);
    }
    if let Some(n) = expected_columns {
        values.resize(n, Value::Null);
    }
    Ok(values)
}

fn read_value<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    serial_type: SerialType,
) -> Result<Value> {
    let value = match serial_type {
        SerialType::Null => Value::Null,
        SerialType::Int8 => Value::Integer(cursor.read_u8()? as i8 as i64),
        SerialType::Int32 => Value::Integer(cursor.read_u32()? as i32 as i64),
        SerialType::Blob(len) => Value::Blob(cursor.read_bytes(len)?),
        SerialType::Text(len) => Value::Text(cursor.read_bytes(len)?),
    };
    Ok(value)
}

/// Encode `values` as a record (header length, serial types, body).
pub fn encode_record(values: &[Value]) -> Result<Vec<u8>> {
    let serial_types = values
        .iter()
        .map(SerialType::for_value)
        .collect::<Result<Vec<_>>>()?;

    let types_len: usize = serial_types.iter().map(|t| varint_len(t.code())).sum();
    // The header length counts its own varint, which can grow the length.
    let mut header_len = types_len + 1;
    while varint_len(header_len as u64) + types_len != header_len {
        header_len = varint_len(header_len as u64) + types_len;
    }

    let mut buffer = encode_varint(header_len as u64);
    for serial_type in &serial_types {
        buffer.extend_from_slice(&encode_varint(serial_type.code()));
    }
    for value in values {
        match value {
            Value::Null => {}
            Value::Integer(i) => match SerialType::for_value(value)? {
                SerialType::Int8 => buffer.push(*i as i8 as u8),
                _ => buffer.extend_from_slice(&(*i as i32).to_be_bytes()),
            },
            Value::Text(bytes) | Value::Blob(bytes) => buffer.extend_from_slice(bytes),
        }
    }
    Ok(buffer)
}

/// Encode a table leaf cell around a record.
pub fn encode_table_cell(row_id: u64, values: &[Value]) -> Result<Vec<u8>> {
    let record = encode_record(values)?;
    let mut cell = encode_varint(record.len() as u64);
    cell.extend_from_slice(&encode_varint(row_id));
    cell.extend_from_slice(&record);
    Ok(cell)
}
