//! Synchronous `SQLite` access layer: parameterized statements,
//! transaction-scoped execution, and multi-row batches with selectable
//! commit granularity.
//!
//! A [`SqliteSession`] wraps one open connection. [`read`] runs
//! row-returning statements in autocommit and materializes the rows;
//! [`store`] wraps DML in crate-managed transactions and executes multi-row
//! parameter batches under one of three [`CommitMode`] strategies, tracking
//! per-row failures where the mode allows partial success.
//!
//! Statements name their parameters `:like_this`; parameter shape and count
//! are validated against the statement before anything reaches the driver.
//!
//! ```
//! use sql_conduit::prelude::*;
//!
//! fn main() -> Result<(), SqlConduitError> {
//!     let session = SqliteSession::builder(":memory:").open()?;
//!     session.store(
//!         "create table player (id integer primary key, name text not null)",
//!         ParamArg::None,
//!     )?;
//!     let result = session.store(
//!         "insert into player (name) values (:name)",
//!         ParamArg::value(ParamValue::Text("Ada".into())),
//!     )?;
//!     assert_eq!(result.rows_affected, 1);
//!     assert_eq!(result.last_insert_id, Some(1));
//!
//!     let rows = session.read("select id, name from player", ParamArg::None)?;
//!     assert_eq!(rows.first().and_then(|r| r.get("name")).and_then(ParamValue::as_text), Some("Ada"));
//!     Ok(())
//! }
//! ```
//!
//! [`read`]: SqliteSession::read
//! [`store`]: SqliteSession::store

pub mod config;
pub mod error;
mod executor;
mod inference;
pub mod params;
pub mod prelude;
mod quoting;
pub mod results;
pub mod session;
mod template;
pub mod types;

pub use config::{
    CommitMode, DbSettings, DbSettingsBuilder, OnEmptyRead, ReadOptions, StoreOptions,
};
pub use error::{ErrorCategory, FailureRecord, SqlConduitError};
pub use executor::ExecutionResult;
pub use inference::{infer_param_types, storage_type_for};
pub use params::{NamedParam, ParamArg, ParamTypes};
pub use results::{DbRow, ResultSet};
pub use session::SqliteSession;
pub use template::SqlTemplate;
pub use types::{ParamValue, StorageType};
