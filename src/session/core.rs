use std::cell::Cell;
use std::fmt;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use crate::config::{DbSettings, DbSettingsBuilder};
use crate::error::SqlConduitError;
use crate::quoting::quote_driver_value;
use crate::types::{ParamValue, StorageType, render_value};

/// A synchronous session over one open `SQLite` connection.
///
/// Every entry point takes `&self` and blocks until it finishes. A busy flag
/// rejects re-entrant calls (for example a `store` issued from inside a
/// `read_with` callback) immediately with [`SqlConduitError::Busy`] instead
/// of queueing them. The session is single-owner; the underlying connection
/// is not `Sync` and neither is this wrapper.
pub struct SqliteSession {
    conn: Connection,
    settings: DbSettings,
    busy: Cell<bool>,
    in_transaction: Cell<bool>,
}

impl SqliteSession {
    /// Open a session per the settings.
    ///
    /// # Errors
    ///
    /// Returns `SqlConduitError::Connection` if the database cannot be opened
    /// or the busy timeout cannot be applied.
    pub fn open(settings: DbSettings) -> Result<Self, SqlConduitError> {
        let conn = if settings.read_only {
            let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            Connection::open_with_flags(&settings.path, flags)
        } else {
            Connection::open(&settings.path)
        }
        .map_err(|e| {
            SqlConduitError::connection(&format!("open database {}", settings.path), &e)
        })?;

        if let Some(ms) = settings.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))
                .map_err(|e| SqlConduitError::connection("set busy timeout", &e))?;
        }

        tracing::debug!("opened sqlite session at {}", settings.path);
        Ok(Self {
            conn,
            settings,
            busy: Cell::new(false),
            in_transaction: Cell::new(false),
        })
    }

    /// Fluent builder for session settings.
    #[must_use]
    pub fn builder(path: impl Into<String>) -> DbSettingsBuilder {
        DbSettingsBuilder::new(path)
    }

    /// Close the session.
    ///
    /// # Errors
    ///
    /// Returns `SqlConduitError::Connection` if the driver reports a failure
    /// while closing; the connection is dropped either way.
    pub fn close(self) -> Result<(), SqlConduitError> {
        self.conn
            .close()
            .map_err(|(_conn, e)| SqlConduitError::connection("close database", &e))
    }

    #[must_use]
    pub fn settings(&self) -> &DbSettings {
        &self.settings
    }

    /// Whether a crate-managed transaction is currently open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.get()
    }

    /// Rowid generated by the most recent successful insert on this
    /// connection.
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Quote a value as a standalone SQL literal per its storage type.
    #[must_use]
    pub fn quote_value(&self, value: &ParamValue, ty: StorageType) -> String {
        quote_driver_value(&render_value(value, ty))
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn set_in_transaction(&self, active: bool) {
        self.in_transaction.set(active);
    }

    /// Claim the session for one call. Fails with `Busy` when another call
    /// on this session is still executing.
    pub(crate) fn busy_guard(&self) -> Result<BusyGuard<'_>, SqlConduitError> {
        if self.busy.replace(true) {
            return Err(SqlConduitError::Busy(
                "a call is already executing on this session".into(),
            ));
        }
        Ok(BusyGuard { session: self })
    }
}

impl fmt::Debug for SqliteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSession")
            .field("path", &self.settings.path)
            .field("busy", &self.busy.get())
            .field("in_transaction", &self.in_transaction.get())
            .finish()
    }
}

/// Clears the busy flag when the claiming call returns.
pub(crate) struct BusyGuard<'a> {
    session: &'a SqliteSession,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.busy.set(false);
    }
}
