use std::io::{Read, Seek};

use tracing::warn;

use crate::{
    storage::cursor::ByteCursor,
    types::{HEADER_SIZE, PAGE_SIZE_OFFSET, SQLITE_MAGIC, error::DatabaseError},
};

const MIN_PAGE_SIZE: u32 = 512;
const MAX_PAGE_SIZE: u32 = 65536;
const UTF8_ENCODING: u32 = 1;

/// The 100-byte database header at the start of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHeader {
    pub magic: [u8; 16],
    /// Decoded page size in bytes; the on-disk value 1 means 65536.
    pub page_size: u32,
    pub file_format_write_version: u8,
    pub file_format_read_version: u8,
    pub reserved_space: u8,
    pub max_embedded_payload_fraction: u8,
    pub min_embedded_payload_fraction: u8,
    pub leaf_payload_fraction: u8,
    pub file_change_counter: u32,
    pub database_size_pages: u32,
    pub freelist_trunk_page: u32,
    pub freelist_pages_count: u32,
    pub schema_cookie: u32,
    pub schema_format_number: u32,
    pub default_page_cache_size: u32,
    pub largest_root_btree_page: u32,
    pub text_encoding: u32,
    pub user_version: u32,
    pub incremental_vacuum_mode: u32,
    pub application_id: u32,
    pub version_valid_for: u32,
    pub sqlite_version_number: u32,
}

impl Default for DatabaseHeader {
    fn default() -> Self {
        Self {
            magic: *SQLITE_MAGIC,
            page_size: 4096,
            file_format_write_version: 1,
            file_format_read_version: 1,
            reserved_space: 0,
            max_embedded_payload_fraction: 64,
            min_embedded_payload_fraction: 32,
            leaf_payload_fraction: 32,
            file_change_counter: 1,
            database_size_pages: 1,
            freelist_trunk_page: 0,
            freelist_pages_count: 0,
            schema_cookie: 1,
            schema_format_number: 4,
            default_page_cache_size: 0,
            largest_root_btree_page: 0,
            text_encoding: UTF8_ENCODING,
            user_version: 0,
            incremental_vacuum_mode: 0,
            application_id: 0,
            version_valid_for: 1,
            sqlite_version_number: 3_045_000,
        }
    }
}

fn be_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

impl DatabaseHeader {
    /// Read and decode the header at the start of the file.
    pub fn read_from<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Self, DatabaseError> {
        cursor.seek(0)?;
        let bytes = cursor.read_bytes(HEADER_SIZE)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DatabaseError::malformed(
                bytes.len() as u64,
                "database header too short",
            ));
        }

        let mut magic = [0u8; 16];
        magic.copy_from_slice(&bytes[0..16]);
        if &magic != SQLITE_MAGIC {
            warn!(magic = ?String::from_utf8_lossy(&magic), "unexpected database header magic");
        }

        let size_offset = PAGE_SIZE_OFFSET as usize;
        let page_size = match u16::from_be_bytes([bytes[size_offset], bytes[size_offset + 1]]) {
            1 => MAX_PAGE_SIZE,
            raw => raw as u32,
        };
        if !page_size.is_power_of_two() || !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(DatabaseError::malformed(
                PAGE_SIZE_OFFSET,
                format!("invalid page size {page_size}"),
            ));
        }

        let header = Self {
            magic,
            page_size,
            file_format_write_version: bytes[18],
            file_format_read_version: bytes[19],
            reserved_space: bytes[20],
            max_embedded_payload_fraction: bytes[21],
            min_embedded_payload_fraction: bytes[22],
            leaf_payload_fraction: bytes[23],
            file_change_counter: be_u32(bytes, 24),
            database_size_pages: be_u32(bytes, 28),
            freelist_trunk_page: be_u32(bytes, 32),
            freelist_pages_count: be_u32(bytes, 36),
            schema_cookie: be_u32(bytes, 40),
            schema_format_number: be_u32(bytes, 44),
            default_page_cache_size: be_u32(bytes, 48),
            largest_root_btree_page: be_u32(bytes, 52),
            text_encoding: be_u32(bytes, 56),
            user_version: be_u32(bytes, 60),
            incremental_vacuum_mode: be_u32(bytes, 64),
            application_id: be_u32(bytes, 68),
            // 72..92 reserved for expansion
            version_valid_for: be_u32(bytes, 92),
            sqlite_version_number: be_u32(bytes, 96),
        };

        if header.text_encoding != UTF8_ENCODING && header.text_encoding != 0 {
            warn!(
                encoding = header.text_encoding,
                "database text is not UTF-8; rendered text may be garbled"
            );
        }
        Ok(header)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE);

        buffer.extend_from_slice(&self.magic);
        let raw_page_size: u16 = if self.page_size >= MAX_PAGE_SIZE {
            1
        } else {
            self.page_size as u16
        };
        buffer.extend_from_slice(&raw_page_size.to_be_bytes());
        buffer.push(self.file_format_write_version);
        buffer.push(self.file_format_read_version);
        buffer.push(self.reserved_space);
        buffer.push(self.max_embedded_payload_fraction);
        buffer.push(self.min_embedded_payload_fraction);
        buffer.push(self.leaf_payload_fraction);
        for field in [
            self.file_change_counter,
            self.database_size_pages,
            self.freelist_trunk_page,
            self.freelist_pages_count,
            self.schema_cookie,
            self.schema_format_number,
            self.default_page_cache_size,
            self.largest_root_btree_page,
            self.text_encoding,
            self.user_version,
            self.incremental_vacuum_mode,
            self.application_id,
        ] {
            buffer.extend_from_slice(&field.to_be_bytes());
        }
        buffer.extend_from_slice(&[0u8; 20]);
        buffer.extend_from_slice(&self.version_valid_for.to_be_bytes());
        buffer.extend_from_slice(&self.sqlite_version_number.to_be_bytes());

        buffer
    }
}
