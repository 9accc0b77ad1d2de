use std::collections::HashMap;
use std::sync::Arc;

use super::row::DbRow;
use crate::types::ParamValue;

/// Rows returned by a read, sharing one set of column names.
///
/// The name → index map is built once when the column names are set and
/// shared by every row.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the statement.
    pub rows: Vec<DbRow>,
    column_names: Option<Arc<Vec<String>>>,
    index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    #[must_use]
    pub(crate) fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            rows: Vec::with_capacity(capacity),
            column_names: None,
            index: None,
        }
    }

    pub(crate) fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        let index = column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect::<HashMap<_, _>>();
        self.index = Some(Arc::new(index));
        self.column_names = Some(column_names);
    }

    /// Column names of the executed statement, shared by all rows. Present
    /// even when the statement returned no rows.
    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    pub(crate) fn add_row_values(&mut self, values: Vec<ParamValue>) {
        if let (Some(column_names), Some(index)) = (&self.column_names, &self.index) {
            self.rows
                .push(DbRow::new(column_names.clone(), index.clone(), values));
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&DbRow> {
        self.rows.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DbRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a DbRow;
    type IntoIter = std::slice::Iter<'a, DbRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        let mut set = ResultSet::with_capacity(2);
        set.set_column_names(Arc::new(vec!["id".to_string(), "name".to_string()]));
        set.add_row_values(vec![ParamValue::Int(1), ParamValue::Text("one".into())]);
        set.add_row_values(vec![ParamValue::Int(2), ParamValue::Text("two".into())]);
        set
    }

    #[test]
    fn rows_share_column_names_and_index() {
        let set = sample();
        assert_eq!(set.len(), 2);
        let first = set.first().unwrap();
        assert_eq!(first.column_index("name"), Some(1));
        assert_eq!(first.get("id").and_then(ParamValue::as_int), Some(&1));
        assert!(Arc::ptr_eq(&set.rows[0].column_names, &set.rows[1].column_names));
    }

    #[test]
    fn missing_column_is_none() {
        let set = sample();
        assert_eq!(set.first().unwrap().get("absent"), None);
        assert_eq!(set.first().unwrap().get_by_index(9), None);
    }

    #[test]
    fn iteration_preserves_row_order() {
        let set = sample();
        let ids: Vec<_> = set
            .iter()
            .filter_map(|row| row.get("id").and_then(ParamValue::as_int))
            .collect();
        assert_eq!(ids, vec![&1, &2]);
    }
}
