pub mod labels;
pub mod ride_type;
pub mod rules;
pub mod warnings;

pub use labels::normalize_vehicle_type_label;
pub use ride_type::{Category, RideType, VehicleLevel};
pub use rules::{
    categories_for, compute_eligible_categories, eligible_categories_for_label, is_black_color,
    primary_level_for_label, ride_type_to_primary_level, VehicleCapabilities,
};
pub use warnings::requirement_warnings;
