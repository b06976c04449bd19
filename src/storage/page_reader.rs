use std::io::{Read, Seek};

use tracing::debug;

use crate::{
    storage::{cursor::ByteCursor, record::read_payload_record, varint::read_varint},
    types::{
        CELL_POINTER_SIZE, HEADER_SIZE, INTERIOR_PAGE_HEADER_SIZE, LEAF_PAGE_HEADER_SIZE, PageId,
        SCHEMA_PAGE_ID,
        error::{DatabaseError, Result},
        page::{PageHeader, PageType},
        row::Row,
    },
};

/// Cell overhead SQLite subtracts from the usable size to get the largest
/// payload a table leaf cell stores without an overflow chain.
const LEAF_PAYLOAD_OVERHEAD: u32 = 35;

/// Decodes table b-tree leaf pages for a fixed page geometry.
#[derive(Debug, Clone, Copy)]
pub struct PageReader {
    page_size: u32,
    reserved_space: u8,
}

impl PageReader {
    pub fn new(page_size: u32, reserved_space: u8) -> Self {
        Self {
            page_size,
            reserved_space,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Byte offset of the start of `page_id` in the file. Pages are 1-indexed.
    pub fn page_offset(&self, page_id: PageId) -> u64 {
        self.page_size as u64 * (page_id as u64).saturating_sub(1)
    }

    /// Page 1 carries the database header before its b-tree header.
    fn header_offset_in_page(page_id: PageId) -> usize {
        if page_id == SCHEMA_PAGE_ID { HEADER_SIZE } else { 0 }
    }

    fn max_local_payload(&self) -> u64 {
        self.page_size
            .saturating_sub(self.reserved_space as u32)
            .saturating_sub(LEAF_PAYLOAD_OVERHEAD) as u64
    }

    /// Decode the page header of `page_id`, leaving the cursor on the first
    /// cell pointer.
    pub fn read_header<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        page_id: PageId,
    ) -> Result<PageHeader> {
        if page_id == 0 {
            return Err(DatabaseError::malformed(0, "page number 0 does not exist"));
        }
        let header_offset = self.page_offset(page_id) + Self::header_offset_in_page(page_id) as u64;
        cursor.seek(header_offset)?;

        let mut bytes = [0u8; INTERIOR_PAGE_HEADER_SIZE];
        cursor.read_exact(&mut bytes[..LEAF_PAGE_HEADER_SIZE])?;
        let is_interior = PageType::from_u8(bytes[0]).is_some_and(|t| !t.is_leaf());
        if is_interior {
            cursor.read_exact(&mut bytes[LEAF_PAGE_HEADER_SIZE..])?;
        }
        let header = PageHeader::from_bytes(&bytes, header_offset)?;

        let pointer_area = (self.page_size as usize)
            .saturating_sub(Self::header_offset_in_page(page_id))
            .saturating_sub(header.size());
        let max_cells = pointer_area / CELL_POINTER_SIZE;
        if header.cell_count as usize > max_cells {
            return Err(DatabaseError::malformed(
                header_offset,
                format!(
                    "cell count {} exceeds the {} pointers a {}-byte page can hold",
                    header.cell_count, max_cells, self.page_size
                ),
            ));
        }

        debug!(
            page_id,
            offset = header_offset,
            page_type = ?header.page_type,
            cell_count = header.cell_count,
            "read page header"
        );
        Ok(header)
    }

    /// Read the cell pointer array that follows `header`. The cursor must be
    /// positioned just after the header.
    pub fn read_cell_pointers<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        page_id: PageId,
        header: &PageHeader,
    ) -> Result<Vec<u16>> {
        let array_end = Self::header_offset_in_page(page_id)
            + header.size()
            + header.cell_count as usize * CELL_POINTER_SIZE;
        let mut pointers = Vec::with_capacity(header.cell_count as usize);
        for _ in 0..header.cell_count {
            let offset = cursor.position();
            let pointer = cursor.read_u16()?;
            if (pointer as usize) < array_end || pointer as u32 >= self.page_size {
                return Err(DatabaseError::malformed(
                    offset,
                    format!(
                        "cell pointer {pointer} outside page {page_id} content area \
                         ({array_end}..{})",
                        self.page_size
                    ),
                ));
            }
            pointers.push(pointer);
        }
        Ok(pointers)
    }

    /// Number of cells on a table leaf page, read from the header alone.
    pub fn count_cells<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        page_id: PageId,
    ) -> Result<u16> {
        let header = self.read_header(cursor, page_id)?;
        Self::require_leaf_table(page_id, &header)?;
        Ok(header.cell_count)
    }

    /// Decode every row of a table leaf page, in cell pointer order. Each row has
    /// exactly `expected_columns` values.
    pub fn read_leaf_rows<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        page_id: PageId,
        expected_columns: usize,
    ) -> Result<Vec<Row>> {
        let header = self.read_header(cursor, page_id)?;
        Self::require_leaf_table(page_id, &header)?;
        let pointers = self.read_cell_pointers(cursor, page_id, &header)?;

        let page_offset = self.page_offset(page_id);
        let page_end = page_offset + self.page_size as u64;
        let max_local = self.max_local_payload();
        let mut rows = Vec::with_capacity(pointers.len());
        for pointer in pointers {
            let cell_offset = page_offset + pointer as u64;
            cursor.seek(cell_offset)?;
            let payload_len = read_varint(cursor)?;
            let row_id = read_varint(cursor)?;
            if payload_len > max_local {
                return Err(DatabaseError::unsupported(format!(
                    "cell at offset {cell_offset} has a {payload_len}-byte payload \
                     that spills to overflow pages"
                )));
            }
            let record_start = cursor.position();
            if record_start + payload_len > page_end {
                return Err(DatabaseError::malformed(
                    cell_offset,
                    format!("{payload_len}-byte payload runs past the end of page {page_id}"),
                ));
            }
            let values = read_payload_record(cursor, Some(expected_columns), payload_len)?;
            rows.push(Row::with_row_id(row_id, values));
        }
        debug!(page_id, rows = rows.len(), "decoded leaf page");
        Ok(rows)
    }

    fn require_leaf_table(page_id: PageId, header: &PageHeader) -> Result<()> {
        if header.page_type != PageType::LeafTable {
            return Err(DatabaseError::unsupported(format!(
                "page {page_id} is a {:?} page; only single table leaf pages are readable",
                header.page_type
            )));
        }
        Ok(())
    }
}
