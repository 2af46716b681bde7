//! Database schema and settings

pub mod init;
pub mod migrations;

pub use init::{get_setting_i64, init_database, init_database_in_memory};
pub use migrations::run_migrations;
