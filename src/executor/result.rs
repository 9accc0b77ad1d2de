use std::time::Duration;

/// Outcome of a successful store call.
///
/// Built fresh for every run and returned by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Rows affected by committed work. For a batch under a per-row mode this
    /// counts committed rows only.
    pub rows_affected: usize,
    /// Rowid generated by the statement, when it actually generated one.
    /// For a batch this is the last generated rowid.
    pub last_insert_id: Option<i64>,
    /// Rows that failed and were rolled back individually. A batch that
    /// recorded failures surfaces them through the multi-statement error
    /// instead, so this is zero on any result a caller receives.
    pub failed_rows: usize,
    /// Wall-clock time spent executing.
    pub elapsed: Duration,
}

impl ExecutionResult {
    #[must_use]
    pub(crate) fn single(rows_affected: usize, last_insert_id: Option<i64>, elapsed: Duration) -> Self {
        Self {
            rows_affected,
            last_insert_id,
            failed_rows: 0,
            elapsed,
        }
    }
}
