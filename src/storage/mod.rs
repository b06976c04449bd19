pub mod cursor;
pub mod header;
pub mod page_reader;
pub mod record;
pub mod schema;
pub mod varint;
