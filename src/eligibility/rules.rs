use tracing::debug;

use crate::drivers::DriverRecord;
use crate::eligibility::{Category, RideType, VehicleLevel};

/// Minimum passenger seats for Comfort XL.
pub const COMFORT_XL_MIN_SEATS: u32 = 7;

/// Capability predicates derived from a driver's vehicle and dress code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleCapabilities {
    pub comfort_xl: bool,
    pub electric: bool,
    pub luxury: bool,
    pub black: bool,
}

impl VehicleCapabilities {
    pub fn from_driver(driver: &DriverRecord) -> Self {
        let vehicle = &driver.vehicle;
        Self {
            comfort_xl: vehicle.seats_total >= COMFORT_XL_MIN_SEATS && vehicle.has_ac,
            electric: vehicle.is_electric,
            luxury: vehicle.luxury_verified,
            black: vehicle.luxury_verified
                && is_black_color(&vehicle.color)
                && driver.dress_code.black,
        }
    }

    /// A vehicle that satisfies every precondition.
    pub fn all() -> Self {
        Self {
            comfort_xl: true,
            electric: true,
            luxury: true,
            black: true,
        }
    }
}

/// `black` or `noir`, ignoring case and surrounding whitespace.
pub fn is_black_color(color: &str) -> bool {
    let color = color.trim().to_lowercase();
    color == "black" || color == "noir"
}

/// Categories a driver may serve when assigned `ride_type`.
///
/// Always starts with `Standard`; every further category is gated on its
/// vehicle capability, so the result never over-promises what the car can do.
pub fn compute_eligible_categories(ride_type: RideType, driver: &DriverRecord) -> Vec<Category> {
    let categories = categories_for(ride_type, VehicleCapabilities::from_driver(driver));
    debug!(
        "Driver {} eligible for {:?} under {}",
        driver.id, categories, ride_type
    );
    categories
}

/// Accumulate categories for already-derived capabilities.
pub fn categories_for(ride_type: RideType, caps: VehicleCapabilities) -> Vec<Category> {
    let mut out = vec![Category::Standard];

    // Tiers build on each other: (comfort, comfort xl, electric, luxury, black)
    let (comfort, xl, electric, luxury, black) = match ride_type {
        RideType::StandardRide => return out,
        RideType::ComfortRide => (true, true, false, false, false),
        RideType::ElectricRide => (true, false, true, false, false),
        RideType::ElectricXlRide => (true, true, true, false, false),
        RideType::LuxuryRide => (true, true, true, true, false),
        RideType::BlackRide => (true, true, true, true, true),
        // Women-only is an eligibility flag, not a vehicle tier
        RideType::WomenRide => (true, true, true, false, false),
    };

    if comfort {
        push_unique(&mut out, Category::Comfort);
    }
    if xl && caps.comfort_xl {
        push_unique(&mut out, Category::ComfortXl);
    }
    if electric && caps.electric {
        push_unique(&mut out, Category::Electric);
    }
    if luxury && caps.luxury {
        push_unique(&mut out, Category::Luxury);
    }
    if black && caps.black {
        push_unique(&mut out, Category::BlackLuxury);
    }

    out
}

fn push_unique(out: &mut Vec<Category>, category: Category) {
    if !out.contains(&category) {
        out.push(category);
    }
}

/// Primary level stored as the driver's `vehicleType`.
///
/// `Women Ride` maps to `Comfort` regardless of whether the vehicle is
/// electric.
pub fn ride_type_to_primary_level(ride_type: RideType) -> VehicleLevel {
    match ride_type {
        RideType::StandardRide => VehicleLevel::Standard,
        RideType::ComfortRide => VehicleLevel::Comfort,
        RideType::ElectricRide | RideType::ElectricXlRide => VehicleLevel::Electric,
        RideType::LuxuryRide => VehicleLevel::Luxury,
        RideType::BlackRide => VehicleLevel::BlackLuxury,
        RideType::WomenRide => VehicleLevel::Comfort,
    }
}

/// String-typed entry point: unknown labels behave like `Standard Ride`.
pub fn eligible_categories_for_label(ride_type: &str, driver: &DriverRecord) -> Vec<Category> {
    compute_eligible_categories(RideType::from_label_lenient(ride_type), driver)
}

/// String-typed entry point: unknown labels map to `Standard`.
pub fn primary_level_for_label(ride_type: &str) -> VehicleLevel {
    ride_type_to_primary_level(RideType::from_label_lenient(ride_type))
}
