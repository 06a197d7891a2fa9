//! Database layer for Cue

mod annotation_repository;
mod connection;
mod kv_repository;
mod migrations;
mod store;

pub use annotation_repository::LibSqlAnnotationRepository;
pub use connection::Database;
pub use kv_repository::LibSqlKeyValueRepository;
pub use store::{AnnotationStore, KeyValueStore};
