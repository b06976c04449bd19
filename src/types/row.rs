use crate::types::{RowId, value::Value};

/// A decoded record. `values` is positionally aligned with the serial types
/// the record was decoded with.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub row_id: Option<RowId>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            row_id: None,
            values,
        }
    }

    pub fn with_row_id(row_id: RowId, values: Vec<Value>) -> Self {
        Self {
            row_id: Some(row_id),
            values,
        }
    }

    pub fn get_value(&self, column_index: usize) -> Option<&Value> {
        self.values.get(column_index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render the values at `positions`, in the given order. Positions past the
    /// end render as Null would.
    pub fn project(&self, positions: &[usize]) -> Vec<String> {
        positions
            .iter()
            .map(|&i| self.values.get(i).map(Value::render).unwrap_or_default())
            .collect()
    }
}
