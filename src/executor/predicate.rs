use crate::{
    planner::descriptor::EqualityPredicate,
    storage::schema::TableInfo,
    types::{
        error::{DatabaseError, Result},
        row::Row,
    },
};

/// An equality filter whose column has been resolved against a table's
/// declared column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundPredicate {
    pub column_index: usize,
    pub literal: String,
}

impl BoundPredicate {
    /// Resolve the predicate column. A column the table does not declare is a
    /// caller error, not an empty result.
    pub fn bind(predicate: &EqualityPredicate, table: &TableInfo) -> Result<Self> {
        let column_index =
            table
                .column_index(&predicate.column)
                .ok_or_else(|| DatabaseError::ColumnNotFound {
                    name: predicate.column.clone(),
                    table: table.name.clone(),
                })?;
        Ok(Self {
            column_index,
            literal: predicate.literal.clone(),
        })
    }

    /// Byte-exact comparison of the rendered value against the literal.
    pub fn evaluate(&self, row: &Row) -> bool {
        row.get_value(self.column_index)
            .is_some_and(|value| value.render() == self.literal)
    }
}

/// Projected column positions, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub positions: Vec<usize>,
}

impl Projection {
    pub fn all(table: &TableInfo) -> Self {
        Self {
            positions: (0..table.columns.len()).collect(),
        }
    }

    /// Resolve requested names to declared positions. `None` when any name is
    /// not declared or nothing was requested.
    pub fn resolve(requested: &[String], table: &TableInfo) -> Option<Self> {
        if requested.is_empty() {
            return None;
        }
        let positions = requested
            .iter()
            .map(|name| table.column_index(name))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { positions })
    }

    pub fn apply(&self, row: &Row) -> Vec<String> {
        row.project(&self.positions)
    }
}
