use crate::drivers::DriverRecord;
use crate::eligibility::labels::normalize_vehicle_type_label;
use crate::eligibility::rules::{is_black_color, COMFORT_XL_MIN_SEATS};

/// Mismatches between a driver's stored level and what the vehicle supports.
///
/// These never block an assignment; operators see them next to the record.
pub fn requirement_warnings(driver: &DriverRecord) -> Vec<String> {
    let vehicle = &driver.vehicle;
    let level = normalize_vehicle_type_label(driver.vehicle_type.as_deref().unwrap_or(""));
    let black_ok = is_black_color(&vehicle.color) && driver.dress_code.black;

    let mut warnings = Vec::new();

    match level.as_str() {
        "Comfort XL" if vehicle.seats_total < COMFORT_XL_MIN_SEATS || !vehicle.has_ac => {
            warnings.push(format!(
                "Comfort XL requires seatsTotal >= {} and AC.",
                COMFORT_XL_MIN_SEATS
            ));
        }
        "Electric" if !vehicle.is_electric => {
            warnings.push("Electric level requires vehicle.isElectric = true.".to_string());
        }
        "Luxury" if !vehicle.luxury_verified => {
            warnings.push("Luxury level requires vehicle.luxuryVerified = true.".to_string());
        }
        "Black Luxury" if !vehicle.luxury_verified || !black_ok => {
            warnings.push(
                "Black Luxury requires luxuryVerified + black vehicle color \
                 + driver dressCode.black = true."
                    .to_string(),
            );
        }
        _ => {}
    }

    if driver.women_eligible && (driver.gender.as_deref() != Some("F") || !driver.gender_verified) {
        warnings.push("Women eligibility requires gender=F and genderVerified=true.".to_string());
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::Vehicle;

    fn with_level(level: &str, vehicle: Vehicle) -> DriverRecord {
        DriverRecord {
            id: "drv-w".to_string(),
            vehicle_type: Some(level.to_string()),
            vehicle,
            ..Default::default()
        }
    }

    #[test]
    fn test_comfort_xl_with_five_seats_warns() {
        let driver = with_level(
            "VehicleType.comfortXL",
            Vehicle { seats_total: 5, has_ac: true, ..Default::default() },
        );
        let warnings = requirement_warnings(&driver);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Comfort XL"));
    }

    #[test]
    fn test_matching_vehicle_has_no_warnings() {
        let driver = with_level(
            "Comfort XL",
            Vehicle { seats_total: 7, has_ac: true, ..Default::default() },
        );
        assert!(requirement_warnings(&driver).is_empty());

        let driver = with_level("Standard", Vehicle::default());
        assert!(requirement_warnings(&driver).is_empty());
    }

    #[test]
    fn test_electric_and_luxury_levels() {
        let driver = with_level("Electric", Vehicle::default());
        assert_eq!(requirement_warnings(&driver).len(), 1);

        let driver = with_level("Luxury", Vehicle { luxury_verified: true, ..Default::default() });
        assert!(requirement_warnings(&driver).is_empty());
    }

    #[test]
    fn test_black_luxury_needs_dress_code() {
        let mut driver = with_level(
            "Black Luxury",
            Vehicle { luxury_verified: true, color: "noir".to_string(), ..Default::default() },
        );
        assert_eq!(requirement_warnings(&driver).len(), 1);

        driver.dress_code.black = true;
        assert!(requirement_warnings(&driver).is_empty());
    }

    #[test]
    fn test_women_eligibility_requires_verified_gender() {
        let mut driver = with_level("Comfort", Vehicle::default());
        driver.women_eligible = true;
        driver.gender = Some("F".to_string());
        assert_eq!(requirement_warnings(&driver).len(), 1);

        driver.gender_verified = true;
        assert!(requirement_warnings(&driver).is_empty());
    }
}
