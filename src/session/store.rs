use super::SqliteSession;
use crate::config::StoreOptions;
use crate::error::SqlConduitError;
use crate::executor::{ExecutionResult, execute_batch, execute_single};
use crate::params::{BoundParams, ParamArg, bind_params};
use crate::template::SqlTemplate;

impl SqliteSession {
    /// Execute a DML statement, or a multi-row batch of it, inside
    /// crate-managed transactions.
    ///
    /// A single-row binding runs as one statement in its own transaction. A
    /// multi-row binding runs under the session's commit mode.
    ///
    /// # Errors
    ///
    /// Binding errors surface before the driver is touched. A failed single
    /// statement raises `Statement`; a batch with failed rows raises
    /// `MultiStatement` carrying the per-row failure records.
    pub fn store(&self, sql: &str, params: ParamArg) -> Result<ExecutionResult, SqlConduitError> {
        self.store_opts(sql, params, StoreOptions::default())
    }

    /// [`store`](Self::store) with per-call options: commit mode, explicit
    /// storage types, failed-row capture.
    ///
    /// # Errors
    ///
    /// As [`store`](Self::store).
    pub fn store_opts(
        &self,
        sql: &str,
        params: ParamArg,
        options: StoreOptions,
    ) -> Result<ExecutionResult, SqlConduitError> {
        let _guard = self.busy_guard()?;
        let template = SqlTemplate::parse(sql)?;
        let bound = bind_params(&template, params, options.param_types())?;
        match bound {
            BoundParams::None => execute_single(self, &template, &[]),
            BoundParams::Single(params) => execute_single(self, &template, &params),
            BoundParams::Batch(batch) => {
                let mode = options.resolve_commit_mode(self.settings().commit_mode);
                let capture =
                    options.resolve_capture_failed_rows(self.settings().capture_failed_rows);
                tracing::debug!("batch store of {} rows, mode {:?}", batch.rows.len(), mode);
                execute_batch(self, &template, &batch, mode, capture)
            }
        }
    }
}
