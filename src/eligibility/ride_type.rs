use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use crate::error::FleetError;

/// Tier of service a rider can request, as offered to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideType {
    #[serde(rename = "Standard Ride")]
    StandardRide,
    #[serde(rename = "Comfort Ride")]
    ComfortRide,
    #[serde(rename = "Electric Ride")]
    ElectricRide,
    #[serde(rename = "Electric XL Ride")]
    ElectricXlRide,
    #[serde(rename = "Luxury Ride")]
    LuxuryRide,
    #[serde(rename = "Black Ride")]
    BlackRide,
    #[serde(rename = "Women Ride")]
    WomenRide,
}

impl RideType {
    /// All ride types in the order operators see them.
    pub const ALL: [RideType; 7] = [
        RideType::StandardRide,
        RideType::ComfortRide,
        RideType::ElectricRide,
        RideType::ElectricXlRide,
        RideType::LuxuryRide,
        RideType::BlackRide,
        RideType::WomenRide,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RideType::StandardRide => "Standard Ride",
            RideType::ComfortRide => "Comfort Ride",
            RideType::ElectricRide => "Electric Ride",
            RideType::ElectricXlRide => "Electric XL Ride",
            RideType::LuxuryRide => "Luxury Ride",
            RideType::BlackRide => "Black Ride",
            RideType::WomenRide => "Women Ride",
        }
    }

    /// Parse a label, degrading unknown values to `Standard Ride`.
    ///
    /// Kept for callers that still pass free-form labels; the fallback is
    /// logged so typos show up instead of silently downgrading a driver.
    pub fn from_label_lenient(label: &str) -> RideType {
        label.parse().unwrap_or_else(|_| {
            warn!("Unrecognized ride type {:?}, treating as Standard Ride", label);
            RideType::StandardRide
        })
    }
}

impl std::fmt::Display for RideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RideType {
    type Err = FleetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RideType::ALL
            .iter()
            .copied()
            .find(|ride_type| ride_type.label() == s)
            .ok_or_else(|| FleetError::UnknownRideType(s.to_string()))
    }
}

/// Driver-facing vehicle category a driver may serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Standard,
    Comfort,
    #[serde(rename = "Comfort XL")]
    ComfortXl,
    Electric,
    Luxury,
    #[serde(rename = "Black Luxury")]
    BlackLuxury,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Standard,
        Category::Comfort,
        Category::ComfortXl,
        Category::Electric,
        Category::Luxury,
        Category::BlackLuxury,
    ];

    /// Exact label match; tags outside the vehicle categories give `None`.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.label() == label)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Standard => "Standard",
            Category::Comfort => "Comfort",
            Category::ComfortXl => "Comfort XL",
            Category::Electric => "Electric",
            Category::Luxury => "Luxury",
            Category::BlackLuxury => "Black Luxury",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Primary level persisted as the driver's `vehicleType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleLevel {
    Standard,
    Comfort,
    Electric,
    Luxury,
    #[serde(rename = "Black Luxury")]
    BlackLuxury,
}

impl VehicleLevel {
    pub const ALL: [VehicleLevel; 5] = [
        VehicleLevel::Standard,
        VehicleLevel::Comfort,
        VehicleLevel::Electric,
        VehicleLevel::Luxury,
        VehicleLevel::BlackLuxury,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VehicleLevel::Standard => "Standard",
            VehicleLevel::Comfort => "Comfort",
            VehicleLevel::Electric => "Electric",
            VehicleLevel::Luxury => "Luxury",
            VehicleLevel::BlackLuxury => "Black Luxury",
        }
    }
}

impl std::fmt::Display for VehicleLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse_back() {
        for ride_type in RideType::ALL {
            assert_eq!(ride_type.label().parse::<RideType>().unwrap(), ride_type);
        }
        assert!("black ride".parse::<RideType>().is_err());
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        let err = "Rocket Ride".parse::<RideType>().unwrap_err();
        assert!(matches!(err, FleetError::UnknownRideType(ref s) if s == "Rocket Ride"));
        assert!("".parse::<RideType>().is_err());
    }

    #[test]
    fn test_lenient_parse_falls_back_to_standard() {
        assert_eq!(RideType::from_label_lenient("Comfort Ride"), RideType::ComfortRide);
        assert_eq!(RideType::from_label_lenient("Confort Ride"), RideType::StandardRide);
        assert_eq!(RideType::from_label_lenient(""), RideType::StandardRide);
    }

    #[test]
    fn test_category_from_label() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!(Category::from_label("Driver with Pet"), None);
        assert_eq!(Category::from_label("comfort xl"), None);
    }

    #[test]
    fn test_serde_uses_labels() {
        assert_eq!(
            serde_json::to_string(&RideType::ElectricXlRide).unwrap(),
            "\"Electric XL Ride\""
        );
        assert_eq!(serde_json::to_string(&Category::ComfortXl).unwrap(), "\"Comfort XL\"");
        assert_eq!(serde_json::to_string(&VehicleLevel::BlackLuxury).unwrap(), "\"Black Luxury\"");
        let parsed: Category = serde_json::from_str("\"Black Luxury\"").unwrap();
        assert_eq!(parsed, Category::BlackLuxury);
    }
}
