pub mod error;
pub mod page;
pub mod row;
pub mod value;

// Common type aliases
pub type PageId = u32;
pub type RowId = u64;

// SQLite file format constants
pub const HEADER_SIZE: usize = 100; // Database header size, precedes page 1 content
pub const PAGE_SIZE_OFFSET: u64 = 16; // Big-endian u16 page size inside the header
pub const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";
pub const LEAF_PAGE_HEADER_SIZE: usize = 8;
pub const INTERIOR_PAGE_HEADER_SIZE: usize = 12;
pub const CELL_POINTER_SIZE: usize = 2;
pub const MAX_VARINT_LEN: usize = 9;
pub const SCHEMA_PAGE_ID: PageId = 1;
pub const SCHEMA_COLUMN_COUNT: usize = 5; // type, name, tbl_name, rootpage, sql
