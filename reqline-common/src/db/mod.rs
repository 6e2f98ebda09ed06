//! Database access layer shared across ReqLine components

pub mod init;
pub mod models;

pub use init::{create_schema, get_setting, init_database, set_setting};
