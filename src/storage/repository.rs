//! Persistence seams used by the driver service

use crate::drivers::{DriverRecord, DriverStatus};
use crate::error::Result;
use crate::storage::models::{AuditEntry, DriverUpdate};

/// Read and merge-write access to driver records
#[cfg_attr(test, mockall::automock)]
pub trait DriverRepository {
    /// Find a driver by id
    fn get(&self, id: &str) -> Result<Option<DriverRecord>>;

    /// All drivers, optionally filtered by status
    fn list(&self, status: Option<DriverStatus>) -> Result<Vec<DriverRecord>>;

    /// Insert or fully replace a driver
    fn save(&self, driver: &DriverRecord) -> Result<()>;

    /// Merge `update` into an existing driver; fails with `DriverNotFound`
    fn update(&self, id: &str, update: &DriverUpdate) -> Result<()>;
}

/// Append-only operator audit trail
#[cfg_attr(test, mockall::automock)]
pub trait AuditLog {
    fn record(&self, entry: &AuditEntry) -> Result<()>;

    /// Newest first
    fn recent(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>>;
}

impl<T: DriverRepository + ?Sized> DriverRepository for &T {
    fn get(&self, id: &str) -> Result<Option<DriverRecord>> {
        (**self).get(id)
    }

    fn list(&self, status: Option<DriverStatus>) -> Result<Vec<DriverRecord>> {
        (**self).list(status)
    }

    fn save(&self, driver: &DriverRecord) -> Result<()> {
        (**self).save(driver)
    }

    fn update(&self, id: &str, update: &DriverUpdate) -> Result<()> {
        (**self).update(id, update)
    }
}

impl<T: AuditLog + ?Sized> AuditLog for &T {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        (**self).record(entry)
    }

    fn recent(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
        (**self).recent(limit)
    }
}
