use std::collections::HashMap;
use std::sync::Arc;

use crate::types::ParamValue;

/// A single row from a read, with access by column name or index.
///
/// Column names and the name → index map are shared across all rows of a
/// result set.
#[derive(Debug, Clone)]
pub struct DbRow {
    /// The column names for this row.
    pub column_names: Arc<Vec<String>>,
    /// The values for this row, in column order.
    pub values: Vec<ParamValue>,
    pub(crate) index: Arc<HashMap<String, usize>>,
}

impl DbRow {
    #[must_use]
    pub(crate) fn new(
        column_names: Arc<Vec<String>>,
        index: Arc<HashMap<String, usize>>,
        values: Vec<ParamValue>,
    ) -> Self {
        Self {
            column_names,
            values,
            index,
        }
    }

    /// Get the index of a column by name.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.index.get(column_name) {
            return Some(idx);
        }
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&ParamValue> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&ParamValue> {
        self.values.get(index)
    }
}
