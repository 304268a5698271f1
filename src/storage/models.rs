use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::drivers::{DriverRecord, DriverStatus};
use crate::eligibility::{Category, RideType};

/// Merge patch for a driver record; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverUpdate {
    pub status: Option<DriverStatus>,
    pub final_allowed_ride_type: Option<RideType>,
    pub vehicle_type: Option<String>,
    pub eligible_categories: Option<Vec<Category>>,
    pub pet_friendly: Option<bool>,
    pub women_eligible: Option<bool>,
    pub verified_by_admin: Option<bool>,
    pub is_approved: Option<bool>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DriverUpdate {
    /// Empty patch carrying the audit stamp for `actor`.
    pub fn stamped(actor: &str) -> Self {
        Self {
            updated_by: Some(actor.to_string()),
            updated_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Apply the patch to an in-memory copy of the record.
    pub fn apply_to(&self, driver: &mut DriverRecord) {
        if let Some(status) = self.status {
            driver.status = status;
        }
        if let Some(ride_type) = self.final_allowed_ride_type {
            driver.final_allowed_ride_type = Some(ride_type);
        }
        if let Some(vehicle_type) = &self.vehicle_type {
            driver.vehicle_type = Some(vehicle_type.clone());
        }
        if let Some(categories) = &self.eligible_categories {
            driver.eligible_categories = categories.clone();
        }
        if let Some(pet_friendly) = self.pet_friendly {
            driver.pet_friendly = pet_friendly;
        }
        if let Some(women_eligible) = self.women_eligible {
            driver.women_eligible = women_eligible;
        }
        if let Some(verified) = self.verified_by_admin {
            driver.verified_by_admin = verified;
        }
        if let Some(approved) = self.is_approved {
            driver.is_approved = approved;
        }
        merge(&mut driver.approved_by, &self.approved_by);
        merge(&mut driver.approved_at, &self.approved_at);
        merge(&mut driver.rejected_by, &self.rejected_by);
        merge(&mut driver.rejected_at, &self.rejected_at);
        merge(&mut driver.reviewed_by, &self.reviewed_by);
        merge(&mut driver.reviewed_at, &self.reviewed_at);
        if let Some(updated_by) = &self.updated_by {
            driver.updated_by = Some(updated_by.clone());
        }
        if let Some(updated_at) = self.updated_at {
            driver.updated_at = Some(updated_at);
        }
    }
}

fn merge<T: Clone>(target: &mut Option<T>, patch: &Option<T>) {
    if patch.is_some() {
        target.clone_from(patch);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    RideTypeAssigned,
    PetFriendlyChanged,
    WomenEligibleChanged,
    DriverApproved,
    DriverRejected,
    DriverEscalated,
    DriverImported,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RideTypeAssigned => "ride_type_assigned",
            AuditAction::PetFriendlyChanged => "pet_friendly_changed",
            AuditAction::WomenEligibleChanged => "women_eligible_changed",
            AuditAction::DriverApproved => "driver_approved",
            AuditAction::DriverRejected => "driver_rejected",
            AuditAction::DriverEscalated => "driver_escalated",
            AuditAction::DriverImported => "driver_imported",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ride_type_assigned" => Ok(AuditAction::RideTypeAssigned),
            "pet_friendly_changed" => Ok(AuditAction::PetFriendlyChanged),
            "women_eligible_changed" => Ok(AuditAction::WomenEligibleChanged),
            "driver_approved" => Ok(AuditAction::DriverApproved),
            "driver_rejected" => Ok(AuditAction::DriverRejected),
            "driver_escalated" => Ok(AuditAction::DriverEscalated),
            "driver_imported" => Ok(AuditAction::DriverImported),
            other => Err(format!("unknown audit action: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub action: AuditAction,
    pub target_id: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

impl AuditEntry {
    pub fn new(
        action: AuditAction,
        target_id: &str,
        actor: &str,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: 0, // assigned by the store
            action,
            target_id: target_id.to_string(),
            actor: actor.to_string(),
            timestamp: Utc::now(),
            details,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatabaseStats {
    pub total_drivers: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Keyed by normalized level label
    pub by_level: BTreeMap<String, usize>,
    pub pet_friendly: usize,
    pub women_eligible: usize,
    pub verified_by_admin: usize,
    pub audit_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touches_set_fields() {
        let mut driver = DriverRecord::new("drv-1");
        driver.women_eligible = true;
        driver.vehicle_type = Some("Luxury".to_string());

        let update = DriverUpdate {
            pet_friendly: Some(true),
            ..DriverUpdate::stamped("ops-1")
        };
        update.apply_to(&mut driver);

        assert!(driver.pet_friendly);
        assert!(driver.women_eligible);
        assert_eq!(driver.vehicle_type.as_deref(), Some("Luxury"));
        assert_eq!(driver.updated_by.as_deref(), Some("ops-1"));
        assert!(driver.updated_at.is_some());
    }

    #[test]
    fn test_audit_action_round_trip() {
        for action in [
            AuditAction::RideTypeAssigned,
            AuditAction::PetFriendlyChanged,
            AuditAction::DriverImported,
        ] {
            assert_eq!(action.as_str().parse::<AuditAction>(), Ok(action));
        }
        assert!("deleted".parse::<AuditAction>().is_err());
    }
}
