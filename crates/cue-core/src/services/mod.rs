//! Service layer shared by hosts of the sync engine

mod context;
mod database;

pub use context::AppContext;
pub use database::DatabaseService;
