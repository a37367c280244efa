//! SQLite-backed persistence for Capstream.
//!
//! One store type implements both repository traits from
//! `capstream-domain`. Durability choices follow the usual SQLite service
//! setup: WAL journal mode, NORMAL synchronous, foreign keys enforced, and
//! every multi-row write wrapped in an explicit transaction.

mod sqlite;

pub use sqlite::SqliteStore;
