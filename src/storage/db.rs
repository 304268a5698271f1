use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OpenFlags, Row};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::{
    drivers::{DressCode, DriverRecord, DriverStatus, Vehicle},
    eligibility::{normalize_vehicle_type_label, Category, RideType},
    error::{FleetError, Result},
    storage::{
        models::{AuditAction, AuditEntry, DatabaseStats, DriverUpdate},
        repository::{AuditLog, DriverRepository},
    },
};

const DRIVER_COLUMNS: &str = "id, name, email, phone, status, gender, gender_verified, \
     seats_total, has_ac, is_electric, luxury_verified, color, dress_black, \
     final_allowed_ride_type, vehicle_type, eligible_categories, pet_friendly, \
     women_eligible, verified_by_admin, is_approved, approved_by, approved_at, \
     rejected_by, rejected_at, reviewed_by, reviewed_at, updated_by, updated_at, created_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open a database that must already exist; never creates a file.
    pub fn open_existing(path: &str) -> Result<Self> {
        if !Path::new(path).is_file() {
            return Err(FleetError::DatabaseMissing(path.to_string()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS drivers (
                id TEXT PRIMARY KEY,
                name TEXT,
                email TEXT,
                phone TEXT,
                status TEXT NOT NULL,
                gender TEXT,
                gender_verified INTEGER NOT NULL DEFAULT 0,
                seats_total INTEGER NOT NULL DEFAULT 0,
                has_ac INTEGER NOT NULL DEFAULT 0,
                is_electric INTEGER NOT NULL DEFAULT 0,
                luxury_verified INTEGER NOT NULL DEFAULT 0,
                color TEXT NOT NULL DEFAULT '',
                dress_black INTEGER NOT NULL DEFAULT 0,
                final_allowed_ride_type TEXT,
                vehicle_type TEXT,
                eligible_categories TEXT NOT NULL DEFAULT '[]',
                pet_friendly INTEGER NOT NULL DEFAULT 0,
                women_eligible INTEGER NOT NULL DEFAULT 0,
                verified_by_admin INTEGER NOT NULL DEFAULT 0,
                is_approved INTEGER NOT NULL DEFAULT 0,
                approved_by TEXT,
                approved_at TEXT,
                rejected_by TEXT,
                rejected_at TEXT,
                reviewed_by TEXT,
                reviewed_at TEXT,
                updated_by TEXT,
                updated_at TEXT,
                created_at TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action TEXT NOT NULL,
                target_id TEXT NOT NULL,
                actor TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                details TEXT NOT NULL
            )",
            [],
        )?;

        // Create index for faster status queries
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_drivers_status ON drivers(status)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_logs(timestamp)",
            [],
        )?;

        Ok(())
    }

    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let mut stats = DatabaseStats::default();

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM drivers GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (status, count) = row?;
            stats.total_drivers += count as usize;
            stats.by_status.insert(status, count as usize);
        }

        // Raw levels may be namespaced; group on the normalized label
        let mut stmt = self
            .conn
            .prepare("SELECT vehicle_type, COUNT(*) FROM drivers GROUP BY vehicle_type")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut by_level: BTreeMap<String, usize> = BTreeMap::new();
        for row in rows {
            let (raw, count) = row?;
            let label = normalize_vehicle_type_label(raw.as_deref().unwrap_or(""));
            *by_level.entry(label).or_default() += count as usize;
        }
        stats.by_level = by_level;

        stats.pet_friendly = self.count("SELECT COUNT(*) FROM drivers WHERE pet_friendly = 1")?;
        stats.women_eligible = self.count("SELECT COUNT(*) FROM drivers WHERE women_eligible = 1")?;
        stats.verified_by_admin =
            self.count("SELECT COUNT(*) FROM drivers WHERE verified_by_admin = 1")?;
        stats.audit_entries = self.count("SELECT COUNT(*) FROM audit_logs")?;

        Ok(stats)
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl DriverRepository for Database {
    fn get(&self, id: &str) -> Result<Option<DriverRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM drivers WHERE id = ?1", DRIVER_COLUMNS))?;

        let mut drivers = stmt.query_map([id], row_to_driver)?;
        Ok(drivers.next().transpose()?)
    }

    fn list(&self, status: Option<DriverStatus>) -> Result<Vec<DriverRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM drivers
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at, id",
            DRIVER_COLUMNS
        ))?;

        let drivers = stmt
            .query_map(params![status.map(|s| s.as_str())], row_to_driver)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(drivers)
    }

    fn save(&self, driver: &DriverRecord) -> Result<()> {
        let categories = serde_json::to_string(&driver.eligible_categories)?;
        let created_at = driver.created_at.unwrap_or_else(Utc::now);

        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO drivers ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                         ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)",
                DRIVER_COLUMNS
            ),
            params![
                driver.id,
                driver.name,
                driver.email,
                driver.phone,
                driver.status.as_str(),
                driver.gender,
                driver.gender_verified,
                driver.vehicle.seats_total,
                driver.vehicle.has_ac,
                driver.vehicle.is_electric,
                driver.vehicle.luxury_verified,
                driver.vehicle.color,
                driver.dress_code.black,
                driver.final_allowed_ride_type.map(|r| r.label()),
                driver.vehicle_type,
                categories,
                driver.pet_friendly,
                driver.women_eligible,
                driver.verified_by_admin,
                driver.is_approved,
                driver.approved_by,
                driver.approved_at.map(|dt| dt.to_rfc3339()),
                driver.rejected_by,
                driver.rejected_at.map(|dt| dt.to_rfc3339()),
                driver.reviewed_by,
                driver.reviewed_at.map(|dt| dt.to_rfc3339()),
                driver.updated_by,
                driver.updated_at.map(|dt| dt.to_rfc3339()),
                created_at.to_rfc3339(),
            ],
        )?;
        debug!("Saved driver {}", driver.id);
        Ok(())
    }

    fn update(&self, id: &str, update: &DriverUpdate) -> Result<()> {
        let categories = update
            .eligible_categories
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let changed = self.conn.execute(
            "UPDATE drivers SET
                status = COALESCE(?1, status),
                final_allowed_ride_type = COALESCE(?2, final_allowed_ride_type),
                vehicle_type = COALESCE(?3, vehicle_type),
                eligible_categories = COALESCE(?4, eligible_categories),
                pet_friendly = COALESCE(?5, pet_friendly),
                women_eligible = COALESCE(?6, women_eligible),
                verified_by_admin = COALESCE(?7, verified_by_admin),
                is_approved = COALESCE(?8, is_approved),
                approved_by = COALESCE(?9, approved_by),
                approved_at = COALESCE(?10, approved_at),
                rejected_by = COALESCE(?11, rejected_by),
                rejected_at = COALESCE(?12, rejected_at),
                reviewed_by = COALESCE(?13, reviewed_by),
                reviewed_at = COALESCE(?14, reviewed_at),
                updated_by = COALESCE(?15, updated_by),
                updated_at = COALESCE(?16, updated_at)
             WHERE id = ?17",
            params![
                update.status.map(|s| s.as_str()),
                update.final_allowed_ride_type.map(|r| r.label()),
                update.vehicle_type,
                categories,
                update.pet_friendly,
                update.women_eligible,
                update.verified_by_admin,
                update.is_approved,
                update.approved_by,
                update.approved_at.map(|dt| dt.to_rfc3339()),
                update.rejected_by,
                update.rejected_at.map(|dt| dt.to_rfc3339()),
                update.reviewed_by,
                update.reviewed_at.map(|dt| dt.to_rfc3339()),
                update.updated_by,
                update.updated_at.map(|dt| dt.to_rfc3339()),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(FleetError::DriverNotFound(id.to_string()));
        }
        Ok(())
    }
}

impl AuditLog for Database {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO audit_logs (action, target_id, actor, timestamp, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.action.as_str(),
                entry.target_id,
                entry.actor,
                entry.timestamp.to_rfc3339(),
                entry.details.to_string(),
            ],
        )?;
        Ok(())
    }

    fn recent(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, action, target_id, actor, timestamp, details
             FROM audit_logs
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )?;

        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let entries = stmt
            .query_map([limit], |row| {
                let action: String = row.get(1)?;
                let details: String = row.get(5)?;
                Ok(AuditEntry {
                    id: row.get(0)?,
                    action: action
                        .parse::<AuditAction>()
                        .map_err(|e| conversion_error(1, e.into()))?,
                    target_id: row.get(2)?,
                    actor: row.get(3)?,
                    timestamp: parse_timestamp(4, row.get(4)?)?,
                    details: serde_json::from_str(&details)
                        .map_err(|e| conversion_error(5, Box::new(e)))?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}

fn row_to_driver(row: &Row<'_>) -> rusqlite::Result<DriverRecord> {
    let status: String = row.get(4)?;
    let ride_type: Option<String> = row.get(13)?;
    let categories: String = row.get(15)?;

    Ok(DriverRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        status: status
            .parse::<DriverStatus>()
            .map_err(|e| conversion_error(4, e.into()))?,
        gender: row.get(5)?,
        gender_verified: row.get(6)?,
        vehicle: Vehicle {
            seats_total: row.get(7)?,
            has_ac: row.get(8)?,
            is_electric: row.get(9)?,
            luxury_verified: row.get(10)?,
            color: row.get(11)?,
        },
        dress_code: DressCode { black: row.get(12)? },
        final_allowed_ride_type: ride_type.and_then(|label| match label.parse::<RideType>() {
            Ok(ride_type) => Some(ride_type),
            Err(_) => {
                warn!("Ignoring unrecognized stored ride type {:?}", label);
                None
            }
        }),
        vehicle_type: row.get(14)?,
        eligible_categories: serde_json::from_str::<Vec<Category>>(&categories)
            .map_err(|e| conversion_error(15, Box::new(e)))?,
        pet_friendly: row.get(16)?,
        women_eligible: row.get(17)?,
        verified_by_admin: row.get(18)?,
        is_approved: row.get(19)?,
        approved_by: row.get(20)?,
        approved_at: optional_timestamp(row, 21)?,
        rejected_by: row.get(22)?,
        rejected_at: optional_timestamp(row, 23)?,
        reviewed_by: row.get(24)?,
        reviewed_at: optional_timestamp(row, 25)?,
        updated_by: row.get(26)?,
        updated_at: optional_timestamp(row, 27)?,
        created_at: optional_timestamp(row, 28)?,
    })
}

fn optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| parse_timestamp(idx, s))
        .transpose()
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|e| conversion_error(idx, Box::new(e)))
}

fn conversion_error(idx: usize, err: Box<dyn std::error::Error + Send + Sync>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_driver(id: &str) -> DriverRecord {
        let mut driver = DriverRecord::new(id);
        driver.name = Some("Karim".to_string());
        driver.vehicle = Vehicle {
            seats_total: 7,
            has_ac: true,
            is_electric: false,
            luxury_verified: true,
            color: "Black".to_string(),
        };
        driver.dress_code.black = true;
        driver.eligible_categories = vec![Category::Standard, Category::Comfort];
        driver
    }

    #[test]
    fn test_save_and_get() {
        let db = Database::open_in_memory().unwrap();
        let driver = sample_driver("drv-1");
        db.save(&driver).unwrap();

        let loaded = db.get("drv-1").unwrap().unwrap();
        assert_eq!(loaded.name.as_deref(), Some("Karim"));
        assert_eq!(loaded.vehicle, driver.vehicle);
        assert!(loaded.dress_code.black);
        assert_eq!(loaded.eligible_categories, driver.eligible_categories);
        assert_eq!(loaded.status, DriverStatus::Pending);

        assert!(db.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_update_merges_fields() {
        let db = Database::open_in_memory().unwrap();
        let mut driver = sample_driver("drv-1");
        driver.women_eligible = true;
        driver.vehicle_type = Some("Luxury".to_string());
        db.save(&driver).unwrap();

        let update = DriverUpdate {
            pet_friendly: Some(true),
            ..DriverUpdate::stamped("ops-1")
        };
        db.update("drv-1", &update).unwrap();

        let loaded = db.get("drv-1").unwrap().unwrap();
        assert!(loaded.pet_friendly);
        assert!(loaded.women_eligible);
        assert_eq!(loaded.vehicle_type.as_deref(), Some("Luxury"));
        assert_eq!(loaded.eligible_categories, driver.eligible_categories);
        assert_eq!(loaded.updated_by.as_deref(), Some("ops-1"));
    }

    #[test]
    fn test_update_persists_review_attribution() {
        let db = Database::open_in_memory().unwrap();
        db.save(&sample_driver("drv-1")).unwrap();

        let update = DriverUpdate {
            status: Some(DriverStatus::Approved),
            is_approved: Some(true),
            approved_by: Some("lead-4".to_string()),
            approved_at: Some(Utc::now()),
            ..DriverUpdate::stamped("lead-4")
        };
        db.update("drv-1", &update).unwrap();

        let loaded = db.get("drv-1").unwrap().unwrap();
        assert!(loaded.is_approved);
        assert_eq!(loaded.approved_by.as_deref(), Some("lead-4"));
        assert!(loaded.approved_at.is_some());
        assert!(loaded.rejected_by.is_none());
        assert!(loaded.reviewed_at.is_none());
    }

    #[test]
    fn test_open_existing_never_creates_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.db");
        let path = path.to_str().unwrap();

        let err = Database::open_existing(path).err().unwrap();
        assert!(matches!(err, FleetError::DatabaseMissing(ref p) if p == path));
        assert!(!dir.path().join("typo.db").exists());

        Database::new(path).unwrap().save(&sample_driver("drv-1")).unwrap();
        let reopened = Database::open_existing(path).unwrap();
        assert!(reopened.get("drv-1").unwrap().is_some());
    }

    #[test]
    fn test_update_missing_driver() {
        let db = Database::open_in_memory().unwrap();
        let err = db.update("ghost", &DriverUpdate::stamped("ops-1")).unwrap_err();
        assert!(matches!(err, FleetError::DriverNotFound(ref id) if id == "ghost"));
    }

    #[test]
    fn test_list_filters_by_status() {
        let db = Database::open_in_memory().unwrap();
        db.save(&sample_driver("a")).unwrap();
        let mut approved = sample_driver("b");
        approved.status = DriverStatus::Approved;
        db.save(&approved).unwrap();

        assert_eq!(db.list(None).unwrap().len(), 2);
        let only_approved = db.list(Some(DriverStatus::Approved)).unwrap();
        assert_eq!(only_approved.len(), 1);
        assert_eq!(only_approved[0].id, "b");
    }

    #[test]
    fn test_audit_log_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let mut first = AuditEntry::new(AuditAction::DriverApproved, "a", "ops-1", json!({}));
        first.timestamp = Utc::now() - chrono::Duration::minutes(5);
        db.record(&first).unwrap();
        db.record(&AuditEntry::new(
            AuditAction::RideTypeAssigned,
            "a",
            "ops-2",
            json!({"rideType": "Comfort Ride"}),
        ))
        .unwrap();

        let entries = db.recent(None).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::RideTypeAssigned);
        assert_eq!(entries[0].details["rideType"], "Comfort Ride");
        assert_eq!(db.recent(Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_stats_group_normalized_levels() {
        let db = Database::open_in_memory().unwrap();
        let mut a = sample_driver("a");
        a.vehicle_type = Some("VehicleType.comfortXL".to_string());
        a.pet_friendly = true;
        let mut b = sample_driver("b");
        b.vehicle_type = Some("Comfort XL".to_string());
        b.status = DriverStatus::Approved;
        let c = sample_driver("c");
        for d in [&a, &b, &c] {
            db.save(d).unwrap();
        }

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_drivers, 3);
        assert_eq!(stats.by_status.get("pending"), Some(&2));
        assert_eq!(stats.by_level.get("Comfort XL"), Some(&2));
        assert_eq!(stats.by_level.get("Standard"), Some(&1));
        assert_eq!(stats.pet_friendly, 1);
    }
}
