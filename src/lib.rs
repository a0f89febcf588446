pub mod classify;
pub mod cli;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod reconcile;

pub use db::Database;
pub use error::ImportError;
