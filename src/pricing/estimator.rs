use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::PricingConfig;
use crate::error::FleetError;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl FromStr for GeoPoint {
    type Err = FleetError;

    /// Parses `"lat,lng"` in decimal degrees.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || FleetError::InvalidCoordinate(s.to_string());

        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;

        if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
            return Err(invalid());
        }
        Ok(GeoPoint { lat, lng })
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceEstimate {
    pub distance_km: f64,
    pub price: f64,
}

pub struct PriceEstimator {
    rate_per_km: f64,
    minimum_fare: f64,
}

impl PriceEstimator {
    pub fn new(config: &PricingConfig) -> Self {
        Self {
            rate_per_km: config.rate_per_km,
            minimum_fare: config.minimum_fare,
        }
    }

    /// Great-circle distance between two points (haversine)
    pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
        let d_lat = (to.lat - from.lat).to_radians();
        let d_lng = (to.lng - from.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Price for a distance, rounded to cents and floored at the minimum fare.
    pub fn price_for_distance(&self, distance_km: f64) -> f64 {
        round_cents(distance_km * self.rate_per_km).max(self.minimum_fare)
    }

    pub fn estimate(&self, from: GeoPoint, to: GeoPoint) -> PriceEstimate {
        let distance_km = Self::haversine_km(from, to);
        PriceEstimate {
            distance_km,
            price: self.price_for_distance(distance_km),
        }
    }
}

impl Default for PriceEstimator {
    fn default() -> Self {
        Self::new(&PricingConfig::default())
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
