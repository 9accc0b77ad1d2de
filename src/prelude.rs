//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to open a session and
//! run statements.

pub use crate::config::{
    CommitMode, DbSettings, DbSettingsBuilder, OnEmptyRead, ReadOptions, StoreOptions,
};
pub use crate::error::{ErrorCategory, FailureRecord, SqlConduitError};
pub use crate::executor::ExecutionResult;
pub use crate::params::{NamedParam, ParamArg, ParamTypes};
pub use crate::results::{DbRow, ResultSet};
pub use crate::session::SqliteSession;
pub use crate::template::SqlTemplate;
pub use crate::types::{ParamValue, StorageType};
