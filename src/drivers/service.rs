use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    drivers::types::{DriverRecord, DriverStatus},
    eligibility::{
        compute_eligible_categories, normalize_vehicle_type_label, requirement_warnings,
        ride_type_to_primary_level, Category, RideType, VehicleLevel,
    },
    error::{FleetError, Result},
    storage::{AuditAction, AuditEntry, AuditLog, DriverRepository, DriverUpdate},
};

/// Outcome of assigning a ride type to a driver
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideAssignment {
    pub driver_id: String,
    pub ride_type: RideType,
    pub vehicle_level: VehicleLevel,
    pub eligible_categories: Vec<Category>,
    pub women_eligible: bool,
    pub warnings: Vec<String>,
}

/// Driver as shown in the detail view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDetails {
    pub driver: DriverRecord,
    pub level_label: String,
    pub warnings: Vec<String>,
}

/// Operator-facing driver management on top of a repository and audit log.
///
/// Every mutation is stamped with the acting operator and followed by an
/// audit entry. Audit failures are logged, never surfaced.
pub struct DriverService<R, A> {
    repo: R,
    audit: A,
    actor: String,
}

impl<R: DriverRepository, A: AuditLog> DriverService<R, A> {
    pub fn new(repo: R, audit: A, actor: impl Into<String>) -> Self {
        Self {
            repo,
            audit,
            actor: actor.into(),
        }
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    fn load(&self, driver_id: &str) -> Result<DriverRecord> {
        self.repo
            .get(driver_id)?
            .ok_or_else(|| FleetError::DriverNotFound(driver_id.to_string()))
    }

    /// Compute the patch an assignment would write, without writing it.
    pub fn plan_assignment(
        &self,
        driver: &DriverRecord,
        ride_type: RideType,
    ) -> (DriverUpdate, RideAssignment) {
        let eligible_categories = compute_eligible_categories(ride_type, driver);
        let vehicle_level = ride_type_to_primary_level(ride_type);
        // Women Ride forces the flag on; other ride types leave it as stored
        let women_eligible = ride_type == RideType::WomenRide || driver.women_eligible;

        let update = DriverUpdate {
            final_allowed_ride_type: Some(ride_type),
            vehicle_type: Some(vehicle_level.label().to_string()),
            eligible_categories: Some(eligible_categories.clone()),
            women_eligible: Some(women_eligible),
            ..DriverUpdate::stamped(&self.actor)
        };

        let mut updated = driver.clone();
        update.apply_to(&mut updated);

        let assignment = RideAssignment {
            driver_id: driver.id.clone(),
            ride_type,
            vehicle_level,
            eligible_categories,
            women_eligible,
            warnings: requirement_warnings(&updated),
        };
        (update, assignment)
    }

    pub fn preview_assignment(
        &self,
        driver_id: &str,
        ride_type: RideType,
    ) -> Result<RideAssignment> {
        let driver = self.load(driver_id)?;
        Ok(self.plan_assignment(&driver, ride_type).1)
    }

    /// Run the eligibility engine for `ride_type` and persist the result.
    pub fn assign_ride_type(&self, driver_id: &str, ride_type: RideType) -> Result<RideAssignment> {
        let driver = self.load(driver_id)?;
        let (update, assignment) = self.plan_assignment(&driver, ride_type);

        self.repo.update(driver_id, &update)?;
        info!(
            "Assigned {} to driver {} (level {}, categories {:?})",
            ride_type, driver_id, assignment.vehicle_level, assignment.eligible_categories
        );

        self.audit(
            AuditAction::RideTypeAssigned,
            driver_id,
            json!({
                "rideType": ride_type,
                "vehicleType": assignment.vehicle_level,
                "eligibleCategories": assignment.eligible_categories,
                "womenEligible": assignment.women_eligible,
            }),
        );

        Ok(assignment)
    }

    pub fn set_pet_friendly(&self, driver_id: &str, value: bool) -> Result<DriverRecord> {
        let update = DriverUpdate {
            pet_friendly: Some(value),
            ..DriverUpdate::stamped(&self.actor)
        };
        let driver = self.apply(driver_id, update)?;
        self.audit(AuditAction::PetFriendlyChanged, driver_id, json!({ "petFriendly": value }));
        Ok(driver)
    }

    pub fn set_women_eligible(&self, driver_id: &str, value: bool) -> Result<DriverRecord> {
        let update = DriverUpdate {
            women_eligible: Some(value),
            ..DriverUpdate::stamped(&self.actor)
        };
        let driver = self.apply(driver_id, update)?;
        self.audit(AuditAction::WomenEligibleChanged, driver_id, json!({ "womenEligible": value }));
        Ok(driver)
    }

    /// Approve a driver; the dispatch backend only matches admin-verified drivers.
    pub fn approve(&self, driver_id: &str) -> Result<DriverRecord> {
        let update = DriverUpdate {
            status: Some(DriverStatus::Approved),
            is_approved: Some(true),
            verified_by_admin: Some(true),
            approved_by: Some(self.actor.clone()),
            approved_at: Some(Utc::now()),
            ..DriverUpdate::stamped(&self.actor)
        };
        self.change_status(driver_id, update, AuditAction::DriverApproved)
    }

    pub fn reject(&self, driver_id: &str) -> Result<DriverRecord> {
        let update = DriverUpdate {
            status: Some(DriverStatus::Rejected),
            is_approved: Some(false),
            verified_by_admin: Some(false),
            rejected_by: Some(self.actor.clone()),
            rejected_at: Some(Utc::now()),
            ..DriverUpdate::stamped(&self.actor)
        };
        self.change_status(driver_id, update, AuditAction::DriverRejected)
    }

    /// Send a driver up for manager review.
    pub fn escalate(&self, driver_id: &str) -> Result<DriverRecord> {
        let update = DriverUpdate {
            status: Some(DriverStatus::UnderReview),
            reviewed_by: Some(self.actor.clone()),
            reviewed_at: Some(Utc::now()),
            ..DriverUpdate::stamped(&self.actor)
        };
        self.change_status(driver_id, update, AuditAction::DriverEscalated)
    }

    pub fn driver_details(&self, driver_id: &str) -> Result<DriverDetails> {
        let driver = self.load(driver_id)?;
        let level_label =
            normalize_vehicle_type_label(driver.vehicle_type.as_deref().unwrap_or(""));
        let warnings = requirement_warnings(&driver);
        Ok(DriverDetails {
            driver,
            level_label,
            warnings,
        })
    }

    /// Store an externally supplied driver document as-is.
    pub fn import_driver(&self, driver: &DriverRecord) -> Result<()> {
        if driver.id.trim().is_empty() {
            return Err(FleetError::Other(anyhow::anyhow!("driver document without id")));
        }
        self.repo.save(driver)?;
        self.audit(
            AuditAction::DriverImported,
            &driver.id,
            json!({ "status": driver.status }),
        );
        Ok(())
    }

    fn change_status(
        &self,
        driver_id: &str,
        update: DriverUpdate,
        action: AuditAction,
    ) -> Result<DriverRecord> {
        let driver = self.apply(driver_id, update)?;
        info!("Driver {} is now {}", driver_id, driver.status);
        self.audit(action, driver_id, json!({ "status": driver.status }));
        Ok(driver)
    }

    fn apply(&self, driver_id: &str, update: DriverUpdate) -> Result<DriverRecord> {
        let mut driver = self.load(driver_id)?;
        self.repo.update(driver_id, &update)?;
        update.apply_to(&mut driver);
        Ok(driver)
    }

    fn audit(&self, action: AuditAction, target_id: &str, details: serde_json::Value) {
        let entry = AuditEntry::new(action, target_id, &self.actor, details);
        if let Err(e) = self.audit.record(&entry) {
            warn!("Failed to write audit entry {} for {}: {}", action, target_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{DressCode, Vehicle};
    use crate::storage::repository::{MockAuditLog, MockDriverRepository};

    fn electric_driver() -> DriverRecord {
        DriverRecord {
            id: "drv-1".to_string(),
            vehicle: Vehicle {
                seats_total: 4,
                has_ac: false,
                is_electric: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn repo_with(driver: DriverRecord) -> MockDriverRepository {
        let mut repo = MockDriverRepository::new();
        repo.expect_get()
            .returning(move |id| Ok(if id == driver.id { Some(driver.clone()) } else { None }));
        repo
    }

    fn quiet_audit() -> MockAuditLog {
        let mut audit = MockAuditLog::new();
        audit.expect_record().returning(|_| Ok(()));
        audit
    }

    #[test]
    fn test_women_ride_forces_women_eligible() {
        let mut repo = repo_with(electric_driver());
        repo.expect_update()
            .withf(|id, update| {
                id == "drv-1"
                    && update.women_eligible == Some(true)
                    && update.final_allowed_ride_type == Some(RideType::WomenRide)
                    && update.vehicle_type.as_deref() == Some("Comfort")
                    && update.updated_by.as_deref() == Some("ops-1")
                    && update.updated_at.is_some()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = DriverService::new(repo, quiet_audit(), "ops-1");
        let assignment = service.assign_ride_type("drv-1", RideType::WomenRide).unwrap();

        assert!(assignment.women_eligible);
        assert_eq!(
            assignment.eligible_categories,
            vec![Category::Standard, Category::Comfort, Category::Electric]
        );
        // Literal mapping: electric vehicle still lands on Comfort
        assert_eq!(assignment.vehicle_level, VehicleLevel::Comfort);
        // Gender is unverified, so the forced flag comes with a warning
        assert_eq!(assignment.warnings.len(), 1);
    }

    #[test]
    fn test_other_ride_types_keep_women_flag() {
        let mut driver = electric_driver();
        driver.women_eligible = false;
        let mut repo = repo_with(driver);
        repo.expect_update()
            .withf(|_, update| update.women_eligible == Some(false))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = DriverService::new(repo, quiet_audit(), "ops-1");
        let assignment = service.assign_ride_type("drv-1", RideType::ElectricRide).unwrap();
        assert!(!assignment.women_eligible);
        assert_eq!(assignment.vehicle_level, VehicleLevel::Electric);

        let mut driver = electric_driver();
        driver.women_eligible = true;
        let mut repo = repo_with(driver);
        repo.expect_update()
            .withf(|_, update| update.women_eligible == Some(true))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = DriverService::new(repo, quiet_audit(), "ops-1");
        assert!(service.assign_ride_type("drv-1", RideType::StandardRide).unwrap().women_eligible);
    }

    #[test]
    fn test_missing_driver_writes_nothing() {
        let mut repo = MockDriverRepository::new();
        repo.expect_get().returning(|_| Ok(None));
        repo.expect_update().times(0);
        let mut audit = MockAuditLog::new();
        audit.expect_record().times(0);

        let service = DriverService::new(repo, audit, "ops-1");
        let err = service.assign_ride_type("ghost", RideType::ComfortRide).unwrap_err();
        assert!(matches!(err, FleetError::DriverNotFound(ref id) if id == "ghost"));
        assert!(matches!(service.approve("ghost"), Err(FleetError::DriverNotFound(_))));
    }

    #[test]
    fn test_audit_failure_does_not_fail_assignment() {
        let mut repo = repo_with(electric_driver());
        repo.expect_update().returning(|_, _| Ok(()));
        let mut audit = MockAuditLog::new();
        audit
            .expect_record()
            .times(1)
            .returning(|_| Err(FleetError::Other(anyhow::anyhow!("audit store offline"))));

        let service = DriverService::new(repo, audit, "ops-1");
        assert!(service.assign_ride_type("drv-1", RideType::ComfortRide).is_ok());
    }

    #[test]
    fn test_repository_failure_propagates() {
        let mut repo = repo_with(electric_driver());
        repo.expect_update()
            .returning(|id, _| Err(FleetError::DriverNotFound(id.to_string())));
        let mut audit = MockAuditLog::new();
        audit.expect_record().times(0);

        let service = DriverService::new(repo, audit, "ops-1");
        assert!(service.set_pet_friendly("drv-1", true).is_err());
    }

    #[test]
    fn test_audit_records_actor_and_action() {
        let mut repo = repo_with(electric_driver());
        repo.expect_update().returning(|_, _| Ok(()));
        let mut audit = MockAuditLog::new();
        audit
            .expect_record()
            .withf(|entry| {
                entry.action == AuditAction::RideTypeAssigned
                    && entry.actor == "lead-9"
                    && entry.target_id == "drv-1"
                    && entry.details["rideType"] == "Electric XL Ride"
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = DriverService::new(repo, audit, "lead-9");
        service.assign_ride_type("drv-1", RideType::ElectricXlRide).unwrap();
    }

    #[test]
    fn test_status_changes() {
        let mut repo = repo_with(electric_driver());
        repo.expect_update()
            .withf(|_, update| {
                update.status == Some(DriverStatus::Approved)
                    && update.verified_by_admin == Some(true)
                    && update.is_approved == Some(true)
            })
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_update()
            .withf(|_, update| {
                update.status == Some(DriverStatus::UnderReview)
                    && update.verified_by_admin.is_none()
                    && update.is_approved.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_update()
            .withf(|_, update| {
                update.status == Some(DriverStatus::Rejected)
                    && update.verified_by_admin == Some(false)
                    && update.is_approved == Some(false)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = DriverService::new(repo, quiet_audit(), "ops-1");
        let approved = service.approve("drv-1").unwrap();
        assert!(approved.verified_by_admin);
        assert_eq!(service.escalate("drv-1").unwrap().status, DriverStatus::UnderReview);
        assert!(!service.reject("drv-1").unwrap().verified_by_admin);
    }

    #[test]
    fn test_status_changes_record_attribution() {
        let mut repo = repo_with(electric_driver());
        repo.expect_update().returning(|_, _| Ok(()));
        let service = DriverService::new(repo, quiet_audit(), "lead-4");

        let approved = service.approve("drv-1").unwrap();
        assert!(approved.is_approved);
        assert_eq!(approved.approved_by.as_deref(), Some("lead-4"));
        assert!(approved.approved_at.is_some());
        assert!(approved.rejected_by.is_none());

        let rejected = service.reject("drv-1").unwrap();
        assert!(!rejected.is_approved);
        assert_eq!(rejected.rejected_by.as_deref(), Some("lead-4"));
        assert!(rejected.rejected_at.is_some());

        let escalated = service.escalate("drv-1").unwrap();
        assert_eq!(escalated.reviewed_by.as_deref(), Some("lead-4"));
        assert!(escalated.reviewed_at.is_some());
        assert!(escalated.approved_by.is_none());
    }

    #[test]
    fn test_toggles_only_touch_their_flag() {
        let mut repo = repo_with(electric_driver());
        repo.expect_update()
            .withf(|_, update| {
                update.pet_friendly == Some(true)
                    && update.women_eligible.is_none()
                    && update.eligible_categories.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = DriverService::new(repo, quiet_audit(), "ops-1");
        let driver = service.set_pet_friendly("drv-1", true).unwrap();
        assert!(driver.pet_friendly);
        assert!(!driver.women_eligible);
    }

    #[test]
    fn test_details_normalize_level() {
        let mut driver = electric_driver();
        driver.vehicle_type = Some("VehicleType.blackLuxury".to_string());
        driver.vehicle.luxury_verified = true;
        driver.vehicle.color = "Black".to_string();
        driver.dress_code = DressCode { black: true };
        let service = DriverService::new(repo_with(driver), MockAuditLog::new(), "ops-1");

        let details = service.driver_details("drv-1").unwrap();
        assert_eq!(details.level_label, "Black Luxury");
        assert!(details.warnings.is_empty());
    }

    #[test]
    fn test_plan_assignment_does_not_write() {
        let service = DriverService::new(MockDriverRepository::new(), MockAuditLog::new(), "ops-1");
        let mut driver = electric_driver();
        driver.vehicle.seats_total = 7;
        driver.vehicle.has_ac = true;

        let (update, assignment) = service.plan_assignment(&driver, RideType::ComfortRide);
        assert_eq!(update.vehicle_type.as_deref(), Some("Comfort"));
        assert_eq!(
            assignment.eligible_categories,
            vec![Category::Standard, Category::Comfort, Category::ComfortXl]
        );
    }
}
