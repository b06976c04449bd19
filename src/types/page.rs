use crate::types::{INTERIOR_PAGE_HEADER_SIZE, LEAF_PAGE_HEADER_SIZE, error::DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    InteriorIndex = 2,
    InteriorTable = 5,
    LeafIndex = 10,
    LeafTable = 13,
}

impl PageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(PageType::InteriorIndex),
            5 => Some(PageType::InteriorTable),
            10 => Some(PageType::LeafIndex),
            13 => Some(PageType::LeafTable),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            PageType::InteriorIndex => 2,
            PageType::InteriorTable => 5,
            PageType::LeafIndex => 10,
            PageType::LeafTable => 13,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, PageType::LeafIndex | PageType::LeafTable)
    }

    pub fn header_size(&self) -> usize {
        if self.is_leaf() {
            LEAF_PAGE_HEADER_SIZE
        } else {
            INTERIOR_PAGE_HEADER_SIZE
        }
    }
}

/*
 * B-tree Page Layout on Disk
 * ┌─────────────────────────────────────────────────────────────────┐
 * │  [page 1 only] DATABASE HEADER (100 bytes)                      │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                 PAGE HEADER (8 bytes leaf, 12 interior)          │
 * │  page_type(1) | first_freeblock(2) | cell_count(2) |            │
 * │  cell_content_start(2) | fragmented_free_bytes(1) |             │
 * │  [interior only] right_pointer(4)                               │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                  CELL POINTER ARRAY                             │
 * │  [ptr0(2)] [ptr1(2)] ... offsets relative to page start         │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                    UNALLOCATED SPACE                            │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                   CELL CONTENT AREA                             │
 * │  payload_len(varint) | row_id(varint) | record                  │
 * └─────────────────────────────────────────────────────────────────┘
 * All multi-byte integers are big-endian.
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub first_freeblock: u16,
    pub cell_count: u16,
    /// Zero on disk means 65536.
    pub cell_content_start: u32,
    pub fragmented_free_bytes: u8,
    pub right_pointer: Option<u32>,
}

impl PageHeader {
    pub fn leaf_table(cell_count: u16, cell_content_start: u32) -> Self {
        Self {
            page_type: PageType::LeafTable,
            first_freeblock: 0,
            cell_count,
            cell_content_start,
            fragmented_free_bytes: 0,
            right_pointer: None,
        }
    }

    pub fn size(&self) -> usize {
        self.page_type.header_size()
    }

    /// Parse a header from `bytes`, which must hold at least the 8 common bytes
    /// and, for interior pages, the 4-byte right pointer. `offset` is only used
    /// for error reporting.
    pub fn from_bytes(bytes: &[u8], offset: u64) -> Result<Self, DatabaseError> {
        if bytes.len() < LEAF_PAGE_HEADER_SIZE {
            return Err(DatabaseError::malformed(offset, "page header too short"));
        }
        let page_type = PageType::from_u8(bytes[0]).ok_or_else(|| {
            DatabaseError::malformed(offset, format!("unknown page type tag {}", bytes[0]))
        })?;
        let first_freeblock = u16::from_be_bytes([bytes[1], bytes[2]]);
        let cell_count = u16::from_be_bytes([bytes[3], bytes[4]]);
        let cell_content_start = match u16::from_be_bytes([bytes[5], bytes[6]]) {
            0 => 65536,
            start => start as u32,
        };
        let fragmented_free_bytes = bytes[7];
        let right_pointer = if page_type.is_leaf() {
            None
        } else {
            if bytes.len() < INTERIOR_PAGE_HEADER_SIZE {
                return Err(DatabaseError::malformed(
                    offset,
                    "interior page header too short",
                ));
            }
            Some(u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]))
        };

        Ok(Self {
            page_type,
            first_freeblock,
            cell_count,
            cell_content_start,
            fragmented_free_bytes,
            right_pointer,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.size());
        buffer.push(self.page_type.as_u8());
        buffer.extend_from_slice(&self.first_freeblock.to_be_bytes());
        buffer.extend_from_slice(&self.cell_count.to_be_bytes());
        let content_start = if self.cell_content_start >= 65536 {
            0u16
        } else {
            self.cell_content_start as u16
        };
        buffer.extend_from_slice(&content_start.to_be_bytes());
        buffer.push(self.fragmented_free_bytes);
        if let Some(right_pointer) = self.right_pointer {
            buffer.extend_from_slice(&right_pointer.to_be_bytes());
        }
        buffer
    }
}
