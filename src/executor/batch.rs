use std::time::Instant;

use super::result::ExecutionResult;
use super::strategy::strategy_for;
use crate::config::CommitMode;
use crate::error::{FailureRecord, SqlConduitError, driver_codes};
use crate::params::BatchBindings;
use crate::session::SqliteSession;
use crate::template::SqlTemplate;
use crate::types::ParamValue;

/// Run a multi-row binding under the given commit mode.
///
/// Affected-row and rowid bookkeeping covers committed rows only. A batch
/// that recorded any per-row failures raises `MultiStatement` carrying the
/// ordered failure records and the committed-row count.
pub(crate) fn execute_batch(
    session: &SqliteSession,
    template: &SqlTemplate,
    batch: &BatchBindings,
    mode: CommitMode,
    capture_rows: bool,
) -> Result<ExecutionResult, SqlConduitError> {
    let started = Instant::now();
    let total = batch.rows.len();
    let mut tally = BatchTally::new(capture_rows);
    strategy_for(mode).run(session, template, batch, &mut tally)?;
    tally.finish(total, started.elapsed())
}

/// Running bookkeeping shared by the commit strategies.
pub(crate) struct BatchTally {
    rows_affected: usize,
    last_insert_id: Option<i64>,
    failures: Vec<FailureRecord>,
    capture_rows: bool,
}

impl BatchTally {
    pub(crate) fn new(capture_rows: bool) -> Self {
        Self {
            rows_affected: 0,
            last_insert_id: None,
            failures: Vec::new(),
            capture_rows,
        }
    }

    pub(crate) fn record_success(&mut self, rows_affected: usize, last_insert_id: Option<i64>) {
        self.rows_affected += rows_affected;
        if last_insert_id.is_some() {
            self.last_insert_id = last_insert_id;
        }
    }

    /// Record a row that failed with a raw driver error.
    pub(crate) fn record_driver_failure(
        &mut self,
        row_index: usize,
        err: &rusqlite::Error,
        row: &[ParamValue],
    ) {
        let (driver_code, native_code) = driver_codes(err);
        self.push_failure(row_index, err.to_string(), driver_code, native_code, row);
    }

    /// Record a row that failed with an already-wrapped error (e.g. at
    /// commit).
    pub(crate) fn record_failure(
        &mut self,
        row_index: usize,
        err: &SqlConduitError,
        row: &[ParamValue],
    ) {
        self.push_failure(
            row_index,
            err.to_string(),
            err.driver_code().map(str::to_string),
            err.native_code(),
            row,
        );
    }

    fn push_failure(
        &mut self,
        row_index: usize,
        message: String,
        driver_code: Option<String>,
        native_code: Option<i32>,
        row: &[ParamValue],
    ) {
        tracing::warn!("batch row {} failed: {}", row_index, message);
        self.failures.push(FailureRecord {
            row_index,
            driver_code,
            native_code,
            message,
            row_values: self.capture_rows.then(|| row.to_vec()),
        });
    }

    /// Discard all bookkeeping; used when a whole transaction rolls back.
    pub(crate) fn reset(&mut self) {
        self.rows_affected = 0;
        self.last_insert_id = None;
        self.failures.clear();
    }

    fn finish(
        self,
        total_rows: usize,
        elapsed: std::time::Duration,
    ) -> Result<ExecutionResult, SqlConduitError> {
        if self.failures.is_empty() {
            return Ok(ExecutionResult {
                rows_affected: self.rows_affected,
                last_insert_id: self.last_insert_id,
                failed_rows: 0,
                elapsed,
            });
        }

        let failed = self.failures.len();
        let message = if failed == total_rows {
            format!("all {total_rows} rows failed")
        } else {
            format!("{failed} of {total_rows} rows failed")
        };
        // last-seen codes give a quick scent of the dominant failure
        let last = &self.failures[failed - 1];
        Err(SqlConduitError::MultiStatement {
            message,
            driver_code: last.driver_code.clone(),
            native_code: last.native_code,
            rows_affected: self.rows_affected,
            failures: self.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver_err() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::ConstraintViolation,
                extended_code: 1555,
            },
            Some("UNIQUE constraint failed: t.id".into()),
        )
    }

    #[test]
    fn clean_tally_yields_result() {
        let mut tally = BatchTally::new(false);
        tally.record_success(1, Some(7));
        tally.record_success(1, None);
        let result = tally.finish(2, std::time::Duration::ZERO).unwrap();
        assert_eq!(result.rows_affected, 2);
        assert_eq!(result.last_insert_id, Some(7));
        assert_eq!(result.failed_rows, 0);
    }

    #[test]
    fn partial_failure_summarizes_counts_and_codes() {
        let mut tally = BatchTally::new(false);
        tally.record_success(1, None);
        tally.record_driver_failure(1, &driver_err(), &[ParamValue::Int(5)]);
        tally.record_success(1, None);
        let err = tally.finish(3, std::time::Duration::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 rows failed");
        assert_eq!(err.driver_code(), Some("ConstraintViolation"));
        assert_eq!(err.native_code(), Some(1555));
        let failures = err.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].row_index, 1);
        assert_eq!(failures[0].row_values, None);
        match err {
            SqlConduitError::MultiStatement { rows_affected, .. } => assert_eq!(rows_affected, 2),
            other => panic!("expected a multi-statement error, got {other}"),
        }
    }

    #[test]
    fn total_failure_message_and_captured_rows() {
        let mut tally = BatchTally::new(true);
        tally.record_driver_failure(0, &driver_err(), &[ParamValue::Int(1)]);
        tally.record_driver_failure(1, &driver_err(), &[ParamValue::Int(2)]);
        let err = tally.finish(2, std::time::Duration::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "all 2 rows failed");
        let failures = err.failures();
        assert_eq!(failures[1].row_values, Some(vec![ParamValue::Int(2)]));
    }

    #[test]
    fn reset_discards_bookkeeping() {
        let mut tally = BatchTally::new(false);
        tally.record_success(3, Some(9));
        tally.record_driver_failure(0, &driver_err(), &[]);
        tally.reset();
        let result = tally.finish(2, std::time::Duration::ZERO).unwrap();
        assert_eq!(result.rows_affected, 0);
        assert_eq!(result.last_insert_id, None);
    }
}
