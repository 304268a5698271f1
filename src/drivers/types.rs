use chrono::{DateTime, TimeZone, Utc};
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::eligibility::{Category, RideType};

/// Driver record as held by the document store.
///
/// Every field except `id` is optional on the wire and takes its default,
/// whether it is absent, `null` or of an unexpected shape, so partially
/// filled documents coming from the mobile onboarding flow still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriverRecord {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_status")]
    pub status: DriverStatus,
    pub gender: Option<String>,
    #[serde(deserialize_with = "lenient_flag")]
    pub gender_verified: bool,
    #[serde(deserialize_with = "lenient_object")]
    pub vehicle: Vehicle,
    #[serde(deserialize_with = "lenient_object")]
    pub dress_code: DressCode,
    #[serde(deserialize_with = "lenient_ride_type")]
    pub final_allowed_ride_type: Option<RideType>,
    /// Raw level string; may be namespaced (`VehicleType.comfortXL`).
    pub vehicle_type: Option<String>,
    #[serde(deserialize_with = "lenient_categories")]
    pub eligible_categories: Vec<Category>,
    #[serde(deserialize_with = "lenient_flag")]
    pub pet_friendly: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub women_eligible: bool,
    /// Dispatch only matches drivers with this flag set.
    #[serde(deserialize_with = "lenient_flag")]
    pub verified_by_admin: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub is_approved: bool,
    pub approved_by: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub rejected_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vehicle {
    #[serde(deserialize_with = "lenient_seats")]
    pub seats_total: u32,
    #[serde(rename = "hasAC", deserialize_with = "lenient_flag")]
    pub has_ac: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub is_electric: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub luxury_verified: bool,
    #[serde(deserialize_with = "lenient_text")]
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DressCode {
    #[serde(deserialize_with = "lenient_flag")]
    pub black: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    #[default]
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl DriverStatus {
    pub const ALL: [DriverStatus; 4] = [
        DriverStatus::Pending,
        DriverStatus::UnderReview,
        DriverStatus::Approved,
        DriverStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Pending => "pending",
            DriverStatus::UnderReview => "under_review",
            DriverStatus::Approved => "approved",
            DriverStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DriverStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(DriverStatus::Pending),
            "under_review" | "under-review" | "review" => Ok(DriverStatus::UnderReview),
            "approved" => Ok(DriverStatus::Approved),
            "rejected" => Ok(DriverStatus::Rejected),
            other => Err(format!("unknown driver status: {}", other)),
        }
    }
}

impl DriverRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }
}

/// Seats arrive as numbers or numeric strings; anything else counts as zero.
fn lenient_seats<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let seats = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0)
            .map(|f| f as u64)
            .unwrap_or(0),
        _ => 0,
    };
    Ok(u32::try_from(seats).unwrap_or(u32::MAX))
}

/// Only a literal `true` switches a flag on.
fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Nested documents that are `null` or not an object take their default.
fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(de::Error::custom),
        _ => Ok(T::default()),
    }
}

fn lenient_status<'de, D>(deserializer: D) -> std::result::Result<DriverStatus, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(raw) => Ok(raw.parse::<DriverStatus>().unwrap_or_else(|_| {
            warn!("Treating unrecognized driver status {:?} as pending", raw);
            DriverStatus::Pending
        })),
        _ => Ok(DriverStatus::Pending),
    }
}

/// Stored ride types that no longer parse are dropped instead of failing the record.
fn lenient_ride_type<'de, D>(deserializer: D) -> std::result::Result<Option<RideType>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::String(label) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    match label.parse::<RideType>() {
        Ok(ride_type) => Ok(Some(ride_type)),
        Err(_) => {
            warn!("Ignoring unrecognized stored ride type {:?}", label);
            Ok(None)
        }
    }
}

/// Keeps the vehicle categories; other tags such as `Driver with Pet` are dropped.
fn lenient_categories<'de, D>(deserializer: D) -> std::result::Result<Vec<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    let mut categories = Vec::new();
    for item in items {
        match item.as_str().and_then(Category::from_label) {
            Some(category) if !categories.contains(&category) => categories.push(category),
            Some(_) => {}
            None => warn!("Ignoring unrecognized eligible category {}", item),
        }
    }
    Ok(categories)
}

/// RFC 3339 strings, exported `{seconds, nanoseconds}` timestamps, or epoch
/// milliseconds.
fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::String(s) => {
            let parsed = s.parse::<DateTime<Utc>>().ok();
            if parsed.is_none() {
                warn!("Ignoring unreadable timestamp {:?}", s);
            }
            parsed
        }
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::Object(fields) => {
            let seconds = fields.get("seconds").or_else(|| fields.get("_seconds"));
            let nanos = fields
                .get("nanoseconds")
                .or_else(|| fields.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            seconds
                .and_then(Value::as_i64)
                .and_then(|secs| Utc.timestamp_opt(secs, nanos as u32).single())
        }
        other => {
            warn!("Ignoring unreadable timestamp {}", other);
            None
        }
    };
    Ok(parsed)
}
