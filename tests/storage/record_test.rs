use std::io::Cursor;

use lembar::{
    storage::{
        cursor::ByteCursor,
        record::{SerialType, encode_record, read_payload_record, read_record},
        varint::encode_varint,
    },
    types::{
        error::DatabaseError,
        value::{DataType, Value},
    },
};

fn cursor(bytes: Vec<u8>) -> ByteCursor<Cursor<Vec<u8>>> {
    ByteCursor::new(Cursor::new(bytes))
}

#[test]
fn test_decode_yields_declared_value_count_and_kinds() {
    let values = vec![
        Value::Null,
        Value::Integer(-5),
        Value::Integer(70_000),
        Value::from("hello"),
        Value::Blob(vec![0xDE, 0xAD]),
    ];
    let bytes = encode_record(&values).unwrap();
    let decoded = read_record(&mut cursor(bytes), Some(values.len())).unwrap();

    assert_eq!(decoded.len(), 5);
    let kinds: Vec<DataType> = decoded.iter().map(Value::data_type).collect();
    assert_eq!(
        kinds,
        vec![
            DataType::Null,
            DataType::Integer,
            DataType::Integer,
            DataType::Text,
            DataType::Blob
        ]
    );
    assert_eq!(decoded, values);
}

#[test]
fn test_int8_and_int32_are_sign_extended() {
    // header len 3, types [1, 4], body 0xFF, 0xFFFFFFFE
    let bytes = vec![3, 1, 4, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE];
    let decoded = read_record(&mut cursor(bytes), Some(2)).unwrap();
    assert_eq!(decoded, vec![Value::Integer(-1), Value::Integer(-2)]);
}

#[test]
fn test_short_header_pads_trailing_columns_with_null() {
    let bytes = encode_record(&[Value::from("only")]).unwrap();
    let decoded = read_record(&mut cursor(bytes), Some(3)).unwrap();
    assert_eq!(decoded, vec![Value::from("only"), Value::Null, Value::Null]);
}

#[test]
fn test_reads_first_columns_of_a_wider_record() {
    let bytes = encode_record(&[Value::from("a"), Value::from("bb"), Value::from("ccc")]).unwrap();
    let decoded = read_record(&mut cursor(bytes), Some(2)).unwrap();
    assert_eq!(decoded, vec![Value::from("a"), Value::from("bb")]);
}

#[test]
fn test_header_driven_decode_reads_every_serial_type() {
    let values = vec![Value::Integer(1), Value::from("x"), Value::Null];
    let bytes = encode_record(&values).unwrap();
    assert_eq!(read_record(&mut cursor(bytes), None).unwrap(), values);
}

#[test]
fn test_unknown_serial_type_is_unsupported_layout() {
    // serial type 7 (float) is outside the supported set
    let bytes = vec![2, 7, 0, 0, 0, 0, 0, 0, 0, 0];
    let err = read_record(&mut cursor(bytes), Some(1)).unwrap_err();
    assert!(matches!(err, DatabaseError::UnsupportedLayout { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_truncated_body_is_malformed_stream() {
    let mut bytes = encode_record(&[Value::from("truncated")]).unwrap();
    bytes.truncate(bytes.len() - 3);
    let err = read_record(&mut cursor(bytes), Some(1)).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { .. }));
}

#[test]
fn test_serial_types_overrunning_header_length_are_malformed() {
    // header claims 2 bytes but the second serial type varint spans two bytes
    let mut bytes = vec![2];
    bytes.extend(encode_varint(SerialType::Text(100).code()));
    bytes.extend(vec![b'x'; 100]);
    let err = read_record(&mut cursor(bytes), Some(1)).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { offset: 0, .. }));
}

#[test]
fn test_long_text_uses_multi_byte_serial_type() {
    let long = "z".repeat(300);
    let bytes = encode_record(&[Value::from(long.as_str())]).unwrap();
    // 300 * 2 + 13 = 613 needs two varint bytes, so header length is 3
    assert_eq!(bytes[0], 3);
    let decoded = read_record(&mut cursor(bytes), Some(1)).unwrap();
    assert_eq!(decoded[0].render(), long);
    assert_eq!(SerialType::from_code(613).unwrap().size(), 300);
}

#[test]
fn test_oversized_serial_type_is_malformed_not_allocated() {
    // header length 10, then one 9-byte serial type decoding to a ~2^63-byte text
    let mut bytes = vec![10];
    bytes.extend([0xFF; 9]);
    let err = read_record(&mut cursor(bytes.clone()), Some(1)).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { .. }));

    let err = read_payload_record(&mut cursor(bytes), Some(1), 10).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { offset: 0, .. }));
}

#[test]
fn test_huge_header_length_away_from_offset_zero_is_malformed() {
    let mut bytes = vec![0u8; 4];
    bytes.extend([0xFF; 9]);
    let mut cursor = cursor(bytes);
    cursor.seek(4).unwrap();
    let err = read_record(&mut cursor, Some(1)).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { offset: 4, .. }));
}

#[test]
fn test_payload_bound_is_enforced() {
    let bytes = encode_record(&[Value::from("abcdef")]).unwrap();
    assert_eq!(bytes.len(), 8);

    let fits = read_payload_record(&mut cursor(bytes.clone()), Some(1), 8).unwrap();
    assert_eq!(fits, vec![Value::from("abcdef")]);

    // header fits but the text body runs past a 5-byte payload
    let err = read_payload_record(&mut cursor(bytes.clone()), Some(1), 5).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { .. }));

    // header length alone exceeds the payload
    let err = read_payload_record(&mut cursor(bytes), Some(1), 1).unwrap_err();
    assert!(matches!(err, DatabaseError::MalformedStream { .. }));
}
