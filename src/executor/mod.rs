//! Statement execution engine.
//!
//! The single-statement path wraps one statement in its own transaction. The
//! batch path runs a multi-row binding under one of the [`CommitMode`]
//! strategies, tracking per-row failures where the mode allows partial
//! success.
//!
//! [`CommitMode`]: crate::config::CommitMode

mod batch;
mod result;
mod single;
mod strategy;

use rusqlite::Connection;

use crate::template::SqlTemplate;

pub use result::ExecutionResult;

pub(crate) use batch::execute_batch;
pub(crate) use single::execute_single;

/// Rowid to report for one executed statement.
///
/// An `INSERT` or `REPLACE` that changed rows reads the driver rowid
/// directly; watching the driver value move would miss an insert whose new
/// rowid equals the connection's previous one, such as the first rows of two
/// fresh tables. Any other leading keyword (including a `WITH`-prefixed
/// insert) reports a rowid only when the driver value moved, which keeps
/// updates and deletes silent. An upsert resolved by its conflict arm can
/// surface the prior rowid.
pub(crate) fn captured_rowid(
    conn: &Connection,
    template: &SqlTemplate,
    rows_affected: usize,
    rowid_before: i64,
) -> Option<i64> {
    let rowid_after = conn.last_insert_rowid();
    if template.inserts() {
        (rows_affected > 0).then_some(rowid_after)
    } else {
        (rowid_after != rowid_before).then_some(rowid_after)
    }
}
