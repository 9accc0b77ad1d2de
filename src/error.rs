use thiserror::Error;

use crate::types::ParamValue;

/// Stable numeric category carried by every error variant.
///
/// Callers that log or route errors by kind should match on the category (or
/// its numeric code) rather than on message text, which is not stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed parameter sets, templates, or settings.
    Configuration = 1,
    /// Opening or closing the underlying connection failed.
    Connectivity = 2,
    /// A single statement failed to prepare, bind, or execute.
    Statement = 3,
    /// A batch finished with one or more failed rows.
    MultiStatement = 4,
    /// A read returned no rows and the caller asked for that to be an error.
    NoData = 5,
    /// A second call arrived while the session was already executing.
    Busy = 6,
}

impl ErrorCategory {
    /// The numeric code for this category.
    #[must_use]
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Detail captured for one failed row within a batch.
///
/// Records accumulate in row execution order and are never deduplicated.
/// `row_values` is populated only when the session (or the call's
/// `StoreOptions`) asks for failed-row capture.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    /// Zero-based index of the row within the submitted batch.
    pub row_index: usize,
    /// Driver primary error-code name, e.g. `ConstraintViolation`.
    pub driver_code: Option<String>,
    /// Driver extended result code, e.g. `1555` for a primary-key conflict.
    pub native_code: Option<i32>,
    /// Plain-text driver message for the failure.
    pub message: String,
    /// The offending row's raw values, when capture is enabled.
    pub row_values: Option<Vec<ParamValue>>,
}

#[derive(Debug, Error)]
pub enum SqlConduitError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing parameters: {0}")]
    MissingParameters(String),

    #[error("Parameter mismatch: {0}")]
    ParameterMismatch(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Statement execution failed: {message}")]
    Statement {
        message: String,
        driver_code: Option<String>,
        native_code: Option<i32>,
    },

    #[error("{message}")]
    MultiStatement {
        message: String,
        /// Last-seen driver code across the failed rows.
        driver_code: Option<String>,
        /// Last-seen native code across the failed rows.
        native_code: Option<i32>,
        /// Rows that committed before and between the failures.
        rows_affected: usize,
        failures: Vec<FailureRecord>,
    },

    #[error("no rows returned")]
    NoDataFound,

    #[error("Connection busy: {0}")]
    Busy(String),
}

impl SqlConduitError {
    /// The stable category for this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            SqlConduitError::Config(_)
            | SqlConduitError::MissingParameters(_)
            | SqlConduitError::ParameterMismatch(_) => ErrorCategory::Configuration,
            SqlConduitError::Connection(_) => ErrorCategory::Connectivity,
            SqlConduitError::Statement { .. } => ErrorCategory::Statement,
            SqlConduitError::MultiStatement { .. } => ErrorCategory::MultiStatement,
            SqlConduitError::NoDataFound => ErrorCategory::NoData,
            SqlConduitError::Busy(_) => ErrorCategory::Busy,
        }
    }

    /// Driver error-code name, for statement and batch failures.
    #[must_use]
    pub fn driver_code(&self) -> Option<&str> {
        match self {
            SqlConduitError::Statement { driver_code, .. }
            | SqlConduitError::MultiStatement { driver_code, .. } => driver_code.as_deref(),
            _ => None,
        }
    }

    /// Driver extended result code, for statement and batch failures.
    #[must_use]
    pub fn native_code(&self) -> Option<i32> {
        match self {
            SqlConduitError::Statement { native_code, .. }
            | SqlConduitError::MultiStatement { native_code, .. } => *native_code,
            _ => None,
        }
    }

    /// Per-row failure records attached to a batch error.
    #[must_use]
    pub fn failures(&self) -> &[FailureRecord] {
        match self {
            SqlConduitError::MultiStatement { failures, .. } => failures,
            _ => &[],
        }
    }

    /// Wrap a driver error raised while preparing, binding, or executing a
    /// statement, keeping its result codes.
    pub(crate) fn statement(context: &str, err: &rusqlite::Error) -> Self {
        let (driver_code, native_code) = driver_codes(err);
        SqlConduitError::Statement {
            message: format!("{context}: {err}"),
            driver_code,
            native_code,
        }
    }

    /// Wrap a driver error raised while opening or closing the connection.
    pub(crate) fn connection(context: &str, err: &rusqlite::Error) -> Self {
        SqlConduitError::Connection(format!("{context}: {err}"))
    }
}

/// Extract (primary code name, extended code) from a driver error, when the
/// error carries them.
pub(crate) fn driver_codes(err: &rusqlite::Error) -> (Option<String>, Option<i32>) {
    match err {
        rusqlite::Error::SqliteFailure(cause, _) => {
            (Some(format!("{:?}", cause.code)), Some(cause.extended_code))
        }
        _ => (None, None),
    }
}
