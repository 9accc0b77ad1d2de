use super::SqliteSession;
use crate::error::SqlConduitError;

impl SqliteSession {
    /// Begin a transaction, transitioning the session into transactional
    /// mode.
    pub(crate) fn begin(&self) -> Result<(), SqlConduitError> {
        if self.in_transaction() {
            return Err(state_error("transaction already in progress"));
        }
        self.conn()
            .execute_batch("BEGIN")
            .map_err(|e| SqlConduitError::statement("begin transaction", &e))?;
        self.set_in_transaction(true);
        Ok(())
    }

    /// Commit the open transaction.
    pub(crate) fn commit(&self) -> Result<(), SqlConduitError> {
        if !self.in_transaction() {
            return Err(state_error("transaction not active"));
        }
        self.conn()
            .execute_batch("COMMIT")
            .map_err(|e| SqlConduitError::statement("commit transaction", &e))?;
        self.set_in_transaction(false);
        Ok(())
    }

    /// Best-effort rollback while another error is already propagating.
    ///
    /// Statement failures can leave the transaction auto-rolled-back, so the
    /// driver's autocommit state decides whether a ROLLBACK is still due. If
    /// the rollback itself fails the flag stays set; the next `begin` then
    /// reports the stuck transaction.
    pub(crate) fn rollback_if_active(&self) {
        if self.conn().is_autocommit() {
            self.set_in_transaction(false);
            return;
        }
        match self.conn().execute_batch("ROLLBACK") {
            Ok(()) => self.set_in_transaction(false),
            Err(e) => tracing::warn!("rollback failed: {}", e),
        }
    }
}

fn state_error(message: &str) -> SqlConduitError {
    SqlConduitError::Statement {
        message: message.to_string(),
        driver_code: None,
        native_code: None,
    }
}
