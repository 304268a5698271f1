pub mod estimator;

pub use estimator::{GeoPoint, PriceEstimate, PriceEstimator, EARTH_RADIUS_KM};
