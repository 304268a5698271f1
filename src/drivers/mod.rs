pub mod import;
pub mod service;
pub mod types;

pub use import::{parse_driver_documents, DriverImport, ImportFailure};
pub use service::{DriverDetails, DriverService, RideAssignment};
pub use types::{DressCode, DriverRecord, DriverStatus, Vehicle};
