//! The session: one open connection plus its execution state.

mod core;
mod read;
mod store;
mod tx;

pub use core::SqliteSession;
