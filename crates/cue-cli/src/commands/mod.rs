pub mod common;
pub mod config;
pub mod import;
pub mod show;
pub mod status;
pub mod sync;
pub mod watch;
