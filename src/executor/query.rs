use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};

use tracing::debug;

use crate::{
    executor::predicate::{BoundPredicate, Projection},
    planner::descriptor::{ColumnSelection, EqualityPredicate, QueryDescriptor, QueryMode},
    storage::{
        cursor::ByteCursor,
        schema::{SchemaCatalog, TableInfo},
    },
    types::error::{DatabaseError, Result},
};

/// One output row: rendered values in requested column order.
pub type ResultRow = Vec<String>;

/// Why a select produced nothing to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// A requested column is not declared by the table.
    NoMatchingColumns,
    /// The table has no rows, or none satisfied the predicate.
    NoMatchingRows,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Rows(Vec<ResultRow>),
    Empty(EmptyReason),
}

impl SelectOutcome {
    pub fn rows(&self) -> &[ResultRow] {
        match self {
            SelectOutcome::Rows(rows) => rows,
            SelectOutcome::Empty(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SelectOutcome::Empty(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    Count(u64),
    Select(SelectOutcome),
}

/// Answers queries against one database image. Owns the cursor; the schema
/// catalog is read once on construction.
pub struct QueryEngine<R> {
    cursor: ByteCursor<R>,
    catalog: SchemaCatalog,
}

impl QueryEngine<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(ByteCursor::open(path)?)
    }
}

impl<R: Read + Seek> QueryEngine<R> {
    pub fn new(mut cursor: ByteCursor<R>) -> Result<Self> {
        let catalog = SchemaCatalog::load(&mut cursor)?;
        Ok(Self { cursor, catalog })
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    fn table(&self, name: &str) -> Result<TableInfo> {
        self.catalog
            .get_table(name)
            .cloned()
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: name.to_string(),
            })
    }

    pub fn execute(&mut self, descriptor: &QueryDescriptor) -> Result<QueryOutput> {
        match descriptor.mode {
            QueryMode::Count => Ok(QueryOutput::Count(self.count(&descriptor.table)?)),
            QueryMode::Select => Ok(QueryOutput::Select(self.select(
                &descriptor.table,
                &descriptor.columns,
                descriptor.predicate.as_ref(),
            )?)),
        }
    }

    /// Row count of a table, taken from its root page header.
    pub fn count(&mut self, table_name: &str) -> Result<u64> {
        let table = self.table(table_name)?;
        let reader = self.catalog.page_reader();
        let cells = reader.count_cells(&mut self.cursor, table.root_page)?;
        debug!(table = %table.name, root_page = table.root_page, cells, "counted rows");
        Ok(cells as u64)
    }

    pub fn select(
        &mut self,
        table_name: &str,
        columns: &ColumnSelection,
        predicate: Option<&EqualityPredicate>,
    ) -> Result<SelectOutcome> {
        let table = self.table(table_name)?;
        let declared = table.declared_columns()?.len();

        let projection = match columns {
            ColumnSelection::All(_) => Projection::all(&table),
            ColumnSelection::Named(names) => match Projection::resolve(names, &table) {
                Some(projection) => projection,
                None => {
                    debug!(
                        table = %table.name,
                        requested = ?names,
                        "requested columns not in schema"
                    );
                    return Ok(SelectOutcome::Empty(EmptyReason::NoMatchingColumns));
                }
            },
        };
        let filter = predicate
            .map(|p| BoundPredicate::bind(p, &table))
            .transpose()?;

        let reader = self.catalog.page_reader();
        let rows = reader.read_leaf_rows(&mut self.cursor, table.root_page, declared)?;

        let results: Vec<ResultRow> = rows
            .iter()
            .filter(|row| filter.as_ref().is_none_or(|f| f.evaluate(row)))
            .map(|row| projection.apply(row))
            .collect();

        debug!(
            table = %table.name,
            scanned = rows.len(),
            matched = results.len(),
            "select finished"
        );
        if results.is_empty() {
            return Ok(SelectOutcome::Empty(EmptyReason::NoMatchingRows));
        }
        Ok(SelectOutcome::Rows(results))
    }
}
