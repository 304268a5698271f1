use serde::{Deserialize, Serialize};

use crate::error::{FleetError, Result};

/// Default location of the layered configuration file (extension optional).
pub const DEFAULT_CONFIG_PATH: &str = "config/default";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub operator: OperatorConfig,
    pub pricing: PricingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OperatorConfig {
    /// Identity stamped into `updated_by` and the audit log.
    pub actor_id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PricingConfig {
    pub rate_per_km: f64,
    pub minimum_fare: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            rate_per_km: 0.75,
            minimum_fare: 5.0,
        }
    }
}

impl Config {
    /// Load defaults, then the optional file at `path`, then `.env` and
    /// `SHIPDASH_*` env vars.
    pub fn load(path: &str) -> Result<Self> {
        dotenv::dotenv().ok();
        Self::load_with_env(path, Self::environment())
    }

    /// `SHIPDASH_DATABASE__PATH` style overrides.
    pub fn environment() -> config::Environment {
        config::Environment::with_prefix("SHIPDASH")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Same layering as [`Config::load`] with an explicit environment source.
    pub fn load_with_env(path: &str, environment: config::Environment) -> Result<Self> {
        let pricing = PricingConfig::default();
        let config = config::Config::builder()
            .set_default("database.path", "shipdash.db")
            .and_then(|b| b.set_default("operator.actor_id", "cli-operator"))
            .and_then(|b| b.set_default("pricing.rate_per_km", pricing.rate_per_km))
            .and_then(|b| b.set_default("pricing.minimum_fare", pricing.minimum_fare))
            .map_err(|e| FleetError::Config(e.to_string()))?
            .add_source(config::File::with_name(path).required(false))
            .add_source(environment)
            .build()
            .map_err(|e| FleetError::Config(e.to_string()))?;

        let config: Config = config
            .try_deserialize()
            .map_err(|e| FleetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.operator.actor_id.trim().is_empty() {
            return Err(FleetError::Config("operator.actor_id must not be empty".to_string()));
        }
        if !(self.pricing.rate_per_km > 0.0) {
            return Err(FleetError::Config(format!(
                "pricing.rate_per_km must be positive, got {}",
                self.pricing.rate_per_km
            )));
        }
        if !(self.pricing.minimum_fare >= 0.0) {
            return Err(FleetError::Config(format!(
                "pricing.minimum_fare must not be negative, got {}",
                self.pricing.minimum_fare
            )));
        }
        Ok(())
    }

    /// Operator id, preferring an explicit override (e.g. `--actor`).
    pub fn actor(&self, overridden: Option<&str>) -> String {
        overridden
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.operator.actor_id)
            .to_string()
    }
}
