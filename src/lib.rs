pub mod config;
pub mod drivers;
pub mod eligibility;
pub mod error;
pub mod pricing;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{FleetError, Result};
