use rusqlite::Statement;

use super::batch::BatchTally;
use crate::config::CommitMode;
use crate::error::SqlConduitError;
use crate::params::BatchBindings;
use crate::quoting::quote_driver_value;
use crate::session::SqliteSession;
use crate::template::SqlTemplate;
use crate::types::{ParamValue, StorageType, render_value};

/// One commit-granularity policy for a multi-row batch.
///
/// Per-row policies record failed rows into the tally and keep going; the
/// single-commit policy aborts on the first failure. Errors returned from
/// `run` are batch-level (the connection or statement itself is unusable),
/// not row-level.
pub(crate) trait CommitStrategy {
    fn run(
        &self,
        session: &SqliteSession,
        template: &SqlTemplate,
        batch: &BatchBindings,
        tally: &mut BatchTally,
    ) -> Result<(), SqlConduitError>;
}

pub(crate) fn strategy_for(mode: CommitMode) -> &'static dyn CommitStrategy {
    match mode {
        CommitMode::PerRowPrepared => &PerRowPrepared,
        CommitMode::PerRowLiteral => &PerRowLiteral,
        CommitMode::SingleCommit => &SingleCommit,
    }
}

/// Prepare once, then bind each row into the statement's parameter slots and
/// commit it in its own transaction.
struct PerRowPrepared;

/// Render each row as a fully literal statement, no parameter binding at all.
struct PerRowLiteral;

/// All rows in one transaction; the first failure rolls back everything.
struct SingleCommit;

impl CommitStrategy for PerRowPrepared {
    fn run(
        &self,
        session: &SqliteSession,
        template: &SqlTemplate,
        batch: &BatchBindings,
        tally: &mut BatchTally,
    ) -> Result<(), SqlConduitError> {
        let conn = session.conn();
        let mut stmt = conn
            .prepare(template.sql())
            .map_err(|e| SqlConduitError::statement("prepare statement", &e))?;
        let slots = resolve_slots(&stmt, &batch.names)?;

        for (row_index, row) in batch.rows.iter().enumerate() {
            session.begin()?;
            let rowid_before = conn.last_insert_rowid();
            let executed =
                bind_slots(&mut stmt, &slots, batch, row).and_then(|()| stmt.raw_execute());
            match executed {
                Ok(rows_affected) => {
                    let captured =
                        super::captured_rowid(conn, template, rows_affected, rowid_before);
                    match session.commit() {
                        Ok(()) => tally.record_success(rows_affected, captured),
                        // deferred constraints surface at commit; still a row failure
                        Err(commit_err) => {
                            session.rollback_if_active();
                            tally.record_failure(row_index, &commit_err, row);
                        }
                    }
                }
                Err(driver_err) => {
                    session.rollback_if_active();
                    tally.record_driver_failure(row_index, &driver_err, row);
                }
            }
        }
        Ok(())
    }
}

impl CommitStrategy for PerRowLiteral {
    fn run(
        &self,
        session: &SqliteSession,
        template: &SqlTemplate,
        batch: &BatchBindings,
        tally: &mut BatchTally,
    ) -> Result<(), SqlConduitError> {
        let conn = session.conn();
        for (row_index, row) in batch.rows.iter().enumerate() {
            let sql = literal_sql(template, batch, row)?;
            session.begin()?;
            let rowid_before = conn.last_insert_rowid();
            match conn.execute(&sql, []) {
                Ok(rows_affected) => {
                    let captured =
                        super::captured_rowid(conn, template, rows_affected, rowid_before);
                    match session.commit() {
                        Ok(()) => tally.record_success(rows_affected, captured),
                        Err(commit_err) => {
                            session.rollback_if_active();
                            tally.record_failure(row_index, &commit_err, row);
                        }
                    }
                }
                Err(driver_err) => {
                    session.rollback_if_active();
                    tally.record_driver_failure(row_index, &driver_err, row);
                }
            }
        }
        Ok(())
    }
}

impl CommitStrategy for SingleCommit {
    fn run(
        &self,
        session: &SqliteSession,
        template: &SqlTemplate,
        batch: &BatchBindings,
        tally: &mut BatchTally,
    ) -> Result<(), SqlConduitError> {
        let conn = session.conn();
        session.begin()?;
        let outcome = (|| {
            let mut stmt = conn
                .prepare(template.sql())
                .map_err(|e| SqlConduitError::statement("prepare statement", &e))?;
            let slots = resolve_slots(&stmt, &batch.names)?;
            for (row_index, row) in batch.rows.iter().enumerate() {
                let rowid_before = conn.last_insert_rowid();
                let rows_affected = bind_slots(&mut stmt, &slots, batch, row)
                    .and_then(|()| stmt.raw_execute())
                    .map_err(|e| {
                        SqlConduitError::statement(&format!("execute batch row {row_index}"), &e)
                    })?;
                tally.record_success(
                    rows_affected,
                    super::captured_rowid(conn, template, rows_affected, rowid_before),
                );
            }
            session.commit()
        })();
        if let Err(err) = outcome {
            session.rollback_if_active();
            tally.reset();
            return Err(err);
        }
        Ok(())
    }
}

fn resolve_slots(stmt: &Statement<'_>, names: &[String]) -> Result<Vec<usize>, SqlConduitError> {
    let mut slots = Vec::with_capacity(names.len());
    for name in names {
        let key = format!(":{name}");
        let slot = stmt
            .parameter_index(&key)
            .map_err(|e| SqlConduitError::statement("resolve parameter slots", &e))?
            .ok_or_else(|| {
                SqlConduitError::ParameterMismatch(format!(
                    "statement has no placeholder {key}"
                ))
            })?;
        slots.push(slot);
    }
    Ok(slots)
}

fn bind_slots(
    stmt: &mut Statement<'_>,
    slots: &[usize],
    batch: &BatchBindings,
    row: &[ParamValue],
) -> rusqlite::Result<()> {
    for ((slot, name), value) in slots.iter().zip(&batch.names).zip(row) {
        let ty = batch.types.get(name).unwrap_or(StorageType::Text);
        stmt.raw_bind_parameter(*slot, render_value(value, ty))?;
    }
    Ok(())
}

fn literal_sql(
    template: &SqlTemplate,
    batch: &BatchBindings,
    row: &[ParamValue],
) -> Result<String, SqlConduitError> {
    template.substitute(|name| {
        let pos = batch.names.iter().position(|n| n == name).ok_or_else(|| {
            SqlConduitError::ParameterMismatch(format!(
                "no value supplied for placeholder :{name}"
            ))
        })?;
        let ty = batch.types.get(name).unwrap_or(StorageType::Text);
        Ok(quote_driver_value(&render_value(&row[pos], ty)))
    })
}
