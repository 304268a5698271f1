pub mod db;
pub mod models;
pub mod repository;

pub use db::Database;
pub use models::{AuditAction, AuditEntry, DatabaseStats, DriverUpdate};
pub use repository::{AuditLog, DriverRepository};
