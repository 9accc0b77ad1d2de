use std::time::Instant;

use rusqlite::ToSql;

use super::result::ExecutionResult;
use crate::error::SqlConduitError;
use crate::params::{BoundParam, render_named_args};
use crate::session::SqliteSession;
use crate::template::SqlTemplate;

/// Execute one statement in its own transaction.
///
/// Begins, prepares, binds by name, executes, captures rows affected and any
/// generated rowid, then commits. Any failure rolls back before the error
/// propagates.
pub(crate) fn execute_single(
    session: &SqliteSession,
    template: &SqlTemplate,
    params: &[BoundParam],
) -> Result<ExecutionResult, SqlConduitError> {
    let started = Instant::now();
    session.begin()?;
    let outcome = run_statement(session, template, params).and_then(|captured| {
        session.commit()?;
        Ok(captured)
    });
    match outcome {
        Ok((rows_affected, last_insert_id)) => Ok(ExecutionResult::single(
            rows_affected,
            last_insert_id,
            started.elapsed(),
        )),
        Err(err) => {
            session.rollback_if_active();
            Err(err)
        }
    }
}

fn run_statement(
    session: &SqliteSession,
    template: &SqlTemplate,
    params: &[BoundParam],
) -> Result<(usize, Option<i64>), SqlConduitError> {
    let conn = session.conn();
    let mut stmt = conn
        .prepare(template.sql())
        .map_err(|e| SqlConduitError::statement("prepare statement", &e))?;

    let rendered = render_named_args(params);
    let refs: Vec<(&str, &dyn ToSql)> = rendered
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect();

    let rowid_before = conn.last_insert_rowid();
    let rows_affected = stmt
        .execute(&refs[..])
        .map_err(|e| SqlConduitError::statement("execute statement", &e))?;
    let last_insert_id = super::captured_rowid(conn, template, rows_affected, rowid_before);

    Ok((rows_affected, last_insert_id))
}
