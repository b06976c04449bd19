use std::io::{Read, Seek};

use tracing::{info, warn};

use crate::{
    storage::{cursor::ByteCursor, header::DatabaseHeader, page_reader::PageReader},
    types::{
        PageId, SCHEMA_COLUMN_COUNT, SCHEMA_PAGE_ID,
        error::{DatabaseError, Result},
        row::Row,
        value::Value,
    },
};

/// Leading keywords of table-level constraints inside a CREATE TABLE body.
const TABLE_CONSTRAINT_KEYWORDS: &[&str] = &["constraint", "primary", "unique", "check", "foreign"];

/// One table entry of the schema page.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub root_page: PageId,
    /// Declared column names, lower-cased, in declaration order.
    pub columns: Vec<String>,
    pub sql: String,
    /// Set when the CREATE statement could not be split into columns. The table
    /// stays listable and countable but cannot be projected.
    pub layout_issue: Option<String>,
}

impl TableInfo {
    /// Build from a decoded schema row (type, name, tbl_name, rootpage, sql).
    /// Returns an error only for a row that is not a table entry at all.
    pub fn from_schema_row(row: &Row) -> Result<Self> {
        let text = |index: usize, field: &str| -> Result<String> {
            match row.get_value(index) {
                Some(Value::Text(bytes)) => Ok(String::from_utf8_lossy(bytes).into_owned()),
                other => Err(DatabaseError::unsupported(format!(
                    "schema {field} is not text: {other:?}"
                ))),
            }
        };

        let name = text(2, "tbl_name")?;
        let root_page = match row.get_value(3) {
            Some(Value::Integer(page)) if (1..=PageId::MAX as i64).contains(page) => {
                *page as PageId
            }
            other => {
                return Err(DatabaseError::unsupported(format!(
                    "table '{name}' has invalid root page {other:?}"
                )));
            }
        };
        let sql = text(4, "sql").unwrap_or_default();

        let (columns, layout_issue) = match parse_column_names(&sql) {
            Ok(columns) => (columns, None),
            Err(e) => {
                warn!(table = %name, error = %e, "could not derive columns from CREATE statement");
                (Vec::new(), Some(e.to_string()))
            }
        };

        Ok(Self {
            name,
            root_page,
            columns,
            sql,
            layout_issue,
        })
    }

    /// Declared columns, or UnsupportedLayout if they could not be derived.
    pub fn declared_columns(&self) -> Result<&[String]> {
        match &self.layout_issue {
            None => Ok(&self.columns),
            Some(reason) => Err(DatabaseError::unsupported(format!(
                "table '{}': {reason}",
                self.name
            ))),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.columns.iter().position(|c| *c == wanted)
    }
}

/// Split the column list out of a CREATE TABLE statement.
///
/// Assumes `CREATE TABLE name (def, def, ...)`: the outermost parenthesised
/// list is split on top-level commas and the first token of each definition
/// is the column name. Table constraints are skipped; identifier quotes are
/// stripped; names are lower-cased.
pub fn parse_column_names(sql: &str) -> Result<Vec<String>> {
    let open = sql
        .find('(')
        .ok_or_else(|| DatabaseError::unsupported("CREATE statement has no column list"))?;
    let close = sql
        .rfind(')')
        .filter(|&close| close > open)
        .ok_or_else(|| DatabaseError::unsupported("CREATE statement column list is not closed"))?;
    let body = &sql[open + 1..close];

    let mut definitions = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                definitions.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    definitions.push(&body[start..]);

    let mut columns = Vec::new();
    for definition in definitions {
        let Some(token) = definition.split_whitespace().next() else {
            return Err(DatabaseError::unsupported("empty column definition"));
        };
        let keyword = token
            .split('(')
            .next()
            .unwrap_or(token)
            .to_lowercase();
        if TABLE_CONSTRAINT_KEYWORDS.contains(&keyword.as_str()) {
            continue;
        }
        let name = token.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']' | '\''));
        if name.is_empty() {
            return Err(DatabaseError::unsupported(format!(
                "column definition '{}' has no name",
                definition.trim()
            )));
        }
        columns.push(name.to_lowercase());
    }

    if columns.is_empty() {
        return Err(DatabaseError::unsupported("CREATE statement declares no columns"));
    }
    Ok(columns)
}

/// Table entries decoded from page 1, in cell pointer order.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    pub header: DatabaseHeader,
    tables: Vec<TableInfo>,
}

impl SchemaCatalog {
    /// Read the database header and the schema page.
    pub fn load<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let header = DatabaseHeader::read_from(cursor)?;
        let reader = PageReader::new(header.page_size, header.reserved_space);
        let rows = reader.read_leaf_rows(cursor, SCHEMA_PAGE_ID, SCHEMA_COLUMN_COUNT)?;
        let catalog = Self::from_rows(header, &rows)?;
        info!(
            page_size = catalog.header.page_size,
            tables = catalog.tables.len(),
            "loaded schema catalog"
        );
        Ok(catalog)
    }

    /// Keep rows whose `type` is "table" (case-insensitive).
    pub fn from_rows(header: DatabaseHeader, rows: &[Row]) -> Result<Self> {
        let mut tables = Vec::new();
        for row in rows {
            let is_table = row
                .get_value(0)
                .and_then(Value::as_text)
                .is_some_and(|t| t.eq_ignore_ascii_case(b"table"));
            if is_table {
                tables.push(TableInfo::from_schema_row(row)?);
            }
        }
        Ok(Self { header, tables })
    }

    pub fn page_reader(&self) -> PageReader {
        PageReader::new(self.header.page_size, self.header.reserved_space)
    }

    pub fn page_size(&self) -> u32 {
        self.header.page_size
    }

    /// Case-sensitive exact match on table name.
    pub fn get_table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.get_table(name).is_some()
    }

    /// File offset of a table's root page.
    pub fn root_page_offset(&self, table: &TableInfo) -> u64 {
        self.page_reader().page_offset(table.root_page)
    }
}
