use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::{
    executor::query::QueryEngine,
    storage::{cursor::ByteCursor, header::DatabaseHeader, record::encode_table_cell},
    types::{
        CELL_POINTER_SIZE, HEADER_SIZE, LEAF_PAGE_HEADER_SIZE, PageId,
        error::{DatabaseError, Result},
        page::PageHeader,
        value::Value,
    },
};

/// Builds small database images in the on-disk format: a header, the schema
/// page, and one table leaf page per table.
#[derive(Debug, Clone)]
pub struct DatabaseBuilder {
    page_size: u32,
    schema_entries: Vec<Vec<Value>>,
    table_pages: Vec<Vec<Vec<Value>>>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::with_page_size(4096)
    }

    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size,
            schema_entries: Vec::new(),
            table_pages: Vec::new(),
        }
    }

    /// Add a table whose rows live on the next free page.
    pub fn table(mut self, name: &str, sql: &str, rows: Vec<Vec<Value>>) -> Self {
        let root_page = self.next_page();
        self.schema_entries.push(vec![
            Value::from("table"),
            Value::from(name),
            Value::from(name),
            Value::Integer(root_page as i64),
            Value::from(sql),
        ]);
        self.table_pages.push(rows);
        self
    }

    /// Add a raw schema page entry without allocating a page for it (indexes,
    /// views, odd `type` spellings).
    pub fn schema_entry(mut self, values: Vec<Value>) -> Self {
        self.schema_entries.push(values);
        self
    }

    fn next_page(&self) -> PageId {
        self.table_pages.len() as PageId + 2
    }

    pub fn build_bytes(&self) -> Result<Vec<u8>> {
        let page_count = 1 + self.table_pages.len() as u32;
        let header = DatabaseHeader {
            page_size: self.page_size,
            database_size_pages: page_count,
            ..Default::default()
        };

        let mut image = build_leaf_page(self.page_size, HEADER_SIZE, &self.schema_entries)?;
        image[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        for rows in &self.table_pages {
            image.extend_from_slice(&build_leaf_page(self.page_size, 0, rows)?);
        }
        Ok(image)
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.build_bytes()?)?;
        Ok(())
    }

    /// Query engine over an in-memory copy of the image.
    pub fn open_in_memory(&self) -> Result<QueryEngine<Cursor<Vec<u8>>>> {
        QueryEngine::new(ByteCursor::new(Cursor::new(self.build_bytes()?)))
    }
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lay out one table leaf page. `header_offset` is 100 for page 1, 0 otherwise.
/// Cells are packed against the end of the page; pointers keep row order.
pub fn build_leaf_page(
    page_size: u32,
    header_offset: usize,
    rows: &[Vec<Value>],
) -> Result<Vec<u8>> {
    let page_size = page_size as usize;
    let mut page = vec![0u8; page_size];

    let cells = rows
        .iter()
        .enumerate()
        .map(|(i, values)| encode_table_cell(i as u64 + 1, values))
        .collect::<Result<Vec<_>>>()?;

    let pointer_array_start = header_offset + LEAF_PAGE_HEADER_SIZE;
    let pointer_array_end = pointer_array_start + cells.len() * CELL_POINTER_SIZE;
    let content_len: usize = cells.iter().map(Vec::len).sum();
    if pointer_array_end + content_len > page_size {
        return Err(DatabaseError::unsupported(format!(
            "{} rows ({content_len} bytes) do not fit in one {page_size}-byte page",
            rows.len()
        )));
    }

    let mut content_start = page_size;
    let mut pointers = Vec::with_capacity(cells.len());
    for cell in &cells {
        content_start -= cell.len();
        page[content_start..content_start + cell.len()].copy_from_slice(cell);
        pointers.push(content_start as u16);
    }

    let header = PageHeader::leaf_table(cells.len() as u16, content_start as u32);
    page[header_offset..pointer_array_start].copy_from_slice(&header.to_bytes());
    for (i, pointer) in pointers.iter().enumerate() {
        let at = pointer_array_start + i * CELL_POINTER_SIZE;
        page[at..at + CELL_POINTER_SIZE].copy_from_slice(&pointer.to_be_bytes());
    }
    Ok(page)
}

/// A database file in its own temporary directory, removed on drop.
pub struct TempDatabase {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TempDatabase {
    pub fn create(builder: &DatabaseBuilder) -> Result<Self> {
        Self::with_prefix("lembar", builder)
    }

    pub fn with_prefix(prefix: &str, builder: &DatabaseBuilder) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().join(format!("{prefix}.db"));
        builder.write_to(&path)?;
        Ok(Self { _dir: dir, path })
    }

    pub fn open(&self) -> Result<QueryEngine<fs::File>> {
        QueryEngine::open(&self.path)
    }
}

/// The `apples(id, name, color)` table used throughout the tests.
pub fn apples_database() -> DatabaseBuilder {
    DatabaseBuilder::new().table(
        "apples",
        "CREATE TABLE apples\n(\n\tid integer primary key autoincrement,\n\
         \tname text,\n\tcolor text\n)",
        vec![
            vec![Value::Integer(1), Value::from("Apple"), Value::from("Red")],
            vec![Value::Integer(2), Value::from("Pear"), Value::from("Green")],
        ],
    )
}
