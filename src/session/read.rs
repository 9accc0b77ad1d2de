use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::ToSql;
use rusqlite::types::Value;

use super::SqliteSession;
use crate::config::{OnEmptyRead, ReadOptions};
use crate::error::SqlConduitError;
use crate::params::{BoundParam, BoundParams, ParamArg, bind_params, render_named_args};
use crate::results::{DbRow, ResultSet};
use crate::template::SqlTemplate;
use crate::types::ParamValue;

impl SqliteSession {
    /// Run a row-returning statement and materialize every row.
    ///
    /// Runs in autocommit; reads never open a transaction.
    ///
    /// # Errors
    ///
    /// Binding errors surface before the driver is touched. With the
    /// session's empty-read behavior set to [`OnEmptyRead::Error`], an empty
    /// result raises `SqlConduitError::NoDataFound`.
    pub fn read(&self, sql: &str, params: ParamArg) -> Result<ResultSet, SqlConduitError> {
        self.read_opts(sql, params, ReadOptions::default())
    }

    /// [`read`](Self::read) with per-call options.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read), with the empty-read behavior resolved from
    /// the options.
    pub fn read_opts(
        &self,
        sql: &str,
        params: ParamArg,
        options: ReadOptions,
    ) -> Result<ResultSet, SqlConduitError> {
        let _guard = self.busy_guard()?;
        let template = SqlTemplate::parse(sql)?;
        let bound = bind_params(&template, params, None)?;
        let bindings = read_bindings(&bound)?;

        let set = self.materialize(&template, bindings)?;
        let on_empty = options.resolve_on_empty(self.settings().on_empty_read);
        if set.is_empty() && on_empty == OnEmptyRead::Error {
            return Err(SqlConduitError::NoDataFound);
        }
        Ok(set)
    }

    /// Run a row-returning statement, handing each row to `on_row` while the
    /// statement is live.
    ///
    /// The session stays claimed for the whole iteration, so a `read` or
    /// `store` issued from inside the callback fails with `Busy`. An error
    /// returned by the callback stops iteration and propagates. Returns the
    /// number of rows seen; the session's empty-read behavior applies.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read), plus whatever the callback returns.
    pub fn read_with(
        &self,
        sql: &str,
        params: ParamArg,
        mut on_row: impl FnMut(&DbRow) -> Result<(), SqlConduitError>,
    ) -> Result<usize, SqlConduitError> {
        let _guard = self.busy_guard()?;
        let template = SqlTemplate::parse(sql)?;
        let bound = bind_params(&template, params, None)?;
        let bindings = read_bindings(&bound)?;

        let mut stmt = self
            .conn()
            .prepare(template.sql())
            .map_err(|e| SqlConduitError::statement("prepare statement", &e))?;
        let column_names: Arc<Vec<String>> = Arc::new(
            stmt.column_names()
                .iter()
                .map(ToString::to_string)
                .collect(),
        );
        let index: Arc<HashMap<String, usize>> = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect(),
        );

        let rendered = render_named_args(bindings);
        let refs: Vec<(&str, &dyn ToSql)> = rendered
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();

        let mut rows = stmt
            .query(&refs[..])
            .map_err(|e| SqlConduitError::statement("execute statement", &e))?;
        let mut seen = 0usize;
        while let Some(row) = rows
            .next()
            .map_err(|e| SqlConduitError::statement("step row", &e))?
        {
            let values = row_values(row, column_names.len())?;
            let db_row = DbRow::new(column_names.clone(), index.clone(), values);
            on_row(&db_row)?;
            seen += 1;
        }

        if seen == 0 && self.settings().on_empty_read == OnEmptyRead::Error {
            return Err(SqlConduitError::NoDataFound);
        }
        Ok(seen)
    }

    fn materialize(
        &self,
        template: &SqlTemplate,
        bindings: &[BoundParam],
    ) -> Result<ResultSet, SqlConduitError> {
        let mut stmt = self
            .conn()
            .prepare(template.sql())
            .map_err(|e| SqlConduitError::statement("prepare statement", &e))?;
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(ToString::to_string)
            .collect();
        let column_count = column_names.len();

        let rendered = render_named_args(bindings);
        let refs: Vec<(&str, &dyn ToSql)> = rendered
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();

        let mut set = ResultSet::with_capacity(16);
        set.set_column_names(Arc::new(column_names));

        let mut rows = stmt
            .query(&refs[..])
            .map_err(|e| SqlConduitError::statement("execute statement", &e))?;
        while let Some(row) = rows
            .next()
            .map_err(|e| SqlConduitError::statement("step row", &e))?
        {
            set.add_row_values(row_values(row, column_count)?);
        }
        Ok(set)
    }
}

fn read_bindings(bound: &BoundParams) -> Result<&[BoundParam], SqlConduitError> {
    match bound {
        BoundParams::None => Ok(&[]),
        BoundParams::Single(params) => Ok(params),
        BoundParams::Batch(_) => Err(SqlConduitError::ParameterMismatch(
            "multi-row parameters are not valid for a read".into(),
        )),
    }
}

fn row_values(row: &rusqlite::Row<'_>, count: usize) -> Result<Vec<ParamValue>, SqlConduitError> {
    let mut values = Vec::with_capacity(count);
    for idx in 0..count {
        let value: Value = row
            .get(idx)
            .map_err(|e| SqlConduitError::statement("read column value", &e))?;
        values.push(match value {
            Value::Null => ParamValue::Null,
            Value::Integer(i) => ParamValue::Int(i),
            Value::Real(f) => ParamValue::Float(f),
            Value::Text(s) => ParamValue::Text(s),
            Value::Blob(b) => ParamValue::Blob(b),
        });
    }
    Ok(values)
}
