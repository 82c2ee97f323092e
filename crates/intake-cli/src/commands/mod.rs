pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod list;
pub mod schema_cmd;
pub mod sync;
