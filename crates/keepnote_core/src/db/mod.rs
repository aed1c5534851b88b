//! Storage bootstrap for the note store.
//!
//! Connections handed out by [`open_db`] / [`open_db_in_memory`] are fully
//! migrated with foreign keys on; repositories refuse anything else (see
//! [`migrations::schema_state`]).

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, DbError, DbResult};
