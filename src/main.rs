mod cli;

use clap::Parser;
use cli::{Cli, Commands, EligibilityFlag, OutputFormat};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shipdash::{
    config::Config,
    drivers::{self, DriverRecord, DriverService, RideAssignment, Vehicle},
    eligibility::{self, RideType, VehicleCapabilities},
    error::{self, FleetError},
    pricing::{GeoPoint, PriceEstimator},
    storage::{AuditLog, Database, DriverRepository},
    utils,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shipdash=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let actor = config.actor(cli.actor.as_deref());

    let result = match cli.command {
        Commands::Init => {
            info!("Initializing...");
            initialize(&config).await
        }

        Commands::Import { path, dry_run } => {
            info!("Importing drivers from {}", path);
            import_drivers(&config, &actor, &path, dry_run).await
        }

        Commands::List { status, format } => list_drivers(&config, status, format).await,

        Commands::Show { driver_id, format } => {
            show_driver(&config, &actor, &driver_id, format).await
        }

        Commands::Assign { driver_id, ride_type, yes, dry_run } => {
            info!("Assigning {} to driver {}", ride_type, driver_id);
            assign_ride_type(&config, &actor, &driver_id, ride_type, yes, dry_run).await
        }

        Commands::Flag { driver_id, flag, state } => {
            set_flag(&config, &actor, &driver_id, flag, state.enabled()).await
        }

        Commands::Approve { driver_id, yes } => {
            change_status(&config, &actor, &driver_id, StatusChange::Approve, yes).await
        }

        Commands::Reject { driver_id, yes } => {
            change_status(&config, &actor, &driver_id, StatusChange::Reject, yes).await
        }

        Commands::Escalate { driver_id } => {
            change_status(&config, &actor, &driver_id, StatusChange::Escalate, true).await
        }

        Commands::Preview {
            ride_type,
            seats,
            ac,
            electric,
            luxury_verified,
            color,
            black_dress,
        } => {
            let mut driver = DriverRecord::new("preview");
            driver.vehicle = Vehicle {
                seats_total: seats,
                has_ac: ac,
                is_electric: electric,
                luxury_verified,
                color,
            };
            driver.dress_code.black = black_dress;
            preview(&driver, ride_type);
            Ok(())
        }

        Commands::RideTypes => {
            show_ride_types();
            Ok(())
        }

        Commands::Estimate { from, to, format } => estimate_price(&config, from, to, format),

        Commands::Audit { limit } => show_audit(&config, limit).await,

        Commands::Stats { format } => {
            info!("Generating statistics...");
            show_stats(&config, format).await
        }
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn open_service<'a>(db: &'a Database, actor: &str) -> DriverService<&'a Database, &'a Database> {
    DriverService::new(db, db, actor)
}

async fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing ShipDash driver operations...".green());
    let _db = Database::new(&config.database.path)?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());

    let rendered = toml::to_string_pretty(config).map_err(|e| FleetError::Other(e.into()))?;
    println!("\n{}", "Configuration:".cyan());
    for line in rendered.lines() {
        println!("  {}", line);
    }

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to load driver documents", "shipdash import drivers.json".yellow());
    println!("  {} to see the ride type catalogue", "shipdash ride-types".yellow());
    println!(
        "  {} to assign a ride type",
        "shipdash assign <driver-id> \"Comfort Ride\"".yellow()
    );
    Ok(())
}

async fn import_drivers(
    config: &Config,
    actor: &str,
    path: &str,
    dry_run: bool,
) -> error::Result<()> {
    let raw = tokio::fs::read_to_string(path).await?;
    let import = drivers::parse_driver_documents(&raw)?;
    println!(
        "Found {} driver documents ({} unreadable)",
        import.drivers.len() + import.failures.len(),
        import.failures.len()
    );
    for failure in &import.failures {
        println!(
            "  {} #{} {}: {}",
            "✗".red(),
            failure.position,
            failure.id.as_deref().unwrap_or("(no id)"),
            failure.reason
        );
    }

    if dry_run {
        println!("\n{}", "DRY RUN: Nothing will be written".yellow());
        for driver in &import.drivers {
            println!("  {}  {}  {}", driver.id, driver.display_name(), driver.status);
        }
        return Ok(());
    }

    let db = Database::new(&config.database.path)?;
    let service = open_service(&db, actor);

    let progress = ProgressBar::new(import.drivers.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut failed = import.failures.len();
    let mut imported = 0usize;
    for driver in &import.drivers {
        progress.set_message(driver.id.clone());
        match service.import_driver(driver) {
            Ok(()) => imported += 1,
            Err(e) => {
                warn!("Failed to import driver {}: {}", driver.id, e);
                failed += 1;
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    println!("Imported {} drivers ({} failed)", imported.to_string().green(), failed);
    Ok(())
}

async fn list_drivers(
    config: &Config,
    status: Option<drivers::DriverStatus>,
    format: OutputFormat,
) -> error::Result<()> {
    let db = Database::open_existing(&config.database.path)?;
    let records = db.list(status)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No drivers found");
        return Ok(());
    }

    let widths = [22, 20, 13, 14, 18, 40];
    utils::print_table_border(135);
    utils::print_table_row(
        &["Driver", "Name", "Status", "Level", "Ride Type", "Categories"],
        &widths,
    );
    utils::print_table_border(135);
    for driver in &records {
        let level =
            eligibility::normalize_vehicle_type_label(driver.vehicle_type.as_deref().unwrap_or(""));
        let ride_type = driver
            .final_allowed_ride_type
            .map(|r| r.label())
            .unwrap_or("-");
        utils::print_table_row(
            &[
                &utils::format_id(&driver.id),
                driver.display_name(),
                driver.status.as_str(),
                &level,
                ride_type,
                &utils::format_categories(&driver.eligible_categories),
            ],
            &widths,
        );
    }
    utils::print_table_border(135);
    println!("{} drivers", records.len());
    Ok(())
}

async fn show_driver(
    config: &Config,
    actor: &str,
    driver_id: &str,
    format: OutputFormat,
) -> error::Result<()> {
    let db = Database::open_existing(&config.database.path)?;
    let details = open_service(&db, actor).driver_details(driver_id)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    let driver = &details.driver;
    println!("{}", format!("=== Driver {} ===", driver.id).cyan().bold());
    println!("Name:            {}", driver.display_name());
    println!("Status:          {}", driver.status);
    println!("Verified:        {}", utils::format_flag(driver.verified_by_admin));
    println!(
        "Gender:          {} (verified: {})",
        driver.gender.as_deref().unwrap_or("-"),
        utils::format_flag(driver.gender_verified)
    );

    println!("\nVehicle:");
    println!("  Seats:         {}", driver.vehicle.seats_total);
    println!("  AC:            {}", utils::format_flag(driver.vehicle.has_ac));
    println!("  Electric:      {}", utils::format_flag(driver.vehicle.is_electric));
    println!("  Luxury:        {}", utils::format_flag(driver.vehicle.luxury_verified));
    let color = if driver.vehicle.color.is_empty() {
        "-"
    } else {
        driver.vehicle.color.as_str()
    };
    println!("  Color:         {}", color);
    println!("  Black attire:  {}", utils::format_flag(driver.dress_code.black));

    println!("\nEligibility:");
    println!(
        "  Ride type:     {}",
        driver.final_allowed_ride_type.map(|r| r.label()).unwrap_or("-")
    );
    println!("  Level:         {}", details.level_label.cyan());
    println!("  Categories:    {}", utils::format_categories(&driver.eligible_categories));
    println!("  Pet friendly:  {}", utils::format_flag(driver.pet_friendly));
    println!("  Women ride:    {}", utils::format_flag(driver.women_eligible));

    if let Some(by) = &driver.approved_by {
        println!(
            "\nApproved:        {} by {}",
            utils::format_timestamp(driver.approved_at.as_ref()),
            by
        );
    }
    if let Some(by) = &driver.rejected_by {
        println!(
            "\nRejected:        {} by {}",
            utils::format_timestamp(driver.rejected_at.as_ref()),
            by
        );
    }
    if let Some(by) = &driver.reviewed_by {
        println!(
            "\nSent to review:  {} by {}",
            utils::format_timestamp(driver.reviewed_at.as_ref()),
            by
        );
    }

    println!(
        "\nLast update:     {} by {}",
        utils::format_timestamp(driver.updated_at.as_ref()),
        driver.updated_by.as_deref().unwrap_or("-")
    );

    print_warnings(&details.warnings);
    Ok(())
}

async fn assign_ride_type(
    config: &Config,
    actor: &str,
    driver_id: &str,
    ride_type: RideType,
    yes: bool,
    dry_run: bool,
) -> error::Result<()> {
    let db = Database::open_existing(&config.database.path)?;
    let service = open_service(&db, actor);

    let planned = service.preview_assignment(driver_id, ride_type)?;
    print_assignment(&planned);

    if dry_run {
        println!("\n{}", "DRY RUN: Driver record left unchanged".yellow());
        return Ok(());
    }

    if !yes && !utils::confirm_action(&format!("Assign {} to {}?", ride_type, driver_id)) {
        println!("Cancelled");
        return Ok(());
    }

    service.assign_ride_type(driver_id, ride_type)?;
    println!("{}", format!("✓ Ride type assigned: {}", ride_type).green());
    Ok(())
}

async fn set_flag(
    config: &Config,
    actor: &str,
    driver_id: &str,
    flag: EligibilityFlag,
    value: bool,
) -> error::Result<()> {
    let db = Database::open_existing(&config.database.path)?;
    let service = open_service(&db, actor);

    let driver = match flag {
        EligibilityFlag::Pet => service.set_pet_friendly(driver_id, value)?,
        EligibilityFlag::Women => service.set_women_eligible(driver_id, value)?,
    };

    let label = match flag {
        EligibilityFlag::Pet => "Pet friendly",
        EligibilityFlag::Women => "Women eligibility",
    };
    println!("{}", format!("✓ {} set to {} for {}", label, value, driver.id).green());
    print_warnings(&eligibility::requirement_warnings(&driver));
    Ok(())
}

#[derive(Clone, Copy)]
enum StatusChange {
    Approve,
    Reject,
    Escalate,
}

async fn change_status(
    config: &Config,
    actor: &str,
    driver_id: &str,
    change: StatusChange,
    yes: bool,
) -> error::Result<()> {
    let verb = match change {
        StatusChange::Approve => "Approve",
        StatusChange::Reject => "Reject",
        StatusChange::Escalate => "Escalate",
    };
    if !yes && !utils::confirm_action(&format!("{} driver {}?", verb, driver_id)) {
        println!("Cancelled");
        return Ok(());
    }

    let db = Database::open_existing(&config.database.path)?;
    let service = open_service(&db, actor);
    let driver = match change {
        StatusChange::Approve => service.approve(driver_id)?,
        StatusChange::Reject => service.reject(driver_id)?,
        StatusChange::Escalate => service.escalate(driver_id)?,
    };

    println!("{}", format!("✓ Driver {} is now {}", driver.id, driver.status).green());
    Ok(())
}

fn preview(driver: &DriverRecord, ride_type: RideType) {
    let categories = eligibility::compute_eligible_categories(ride_type, driver);
    let level = eligibility::ride_type_to_primary_level(ride_type);

    println!("{}", format!("=== {} ===", ride_type).cyan().bold());
    println!("Primary level:  {}", level);
    println!("Categories:     {}", utils::format_categories(&categories));
    if ride_type == RideType::WomenRide {
        println!("{}", "Women eligibility would be switched on".yellow());
    }
}

fn show_ride_types() {
    let widths = [18, 14, 60];
    utils::print_table_border(96);
    utils::print_table_row(&["Ride Type", "Level", "Reachable Categories"], &widths);
    utils::print_table_border(96);
    for ride_type in RideType::ALL {
        let reachable = eligibility::categories_for(ride_type, VehicleCapabilities::all());
        utils::print_table_row(
            &[
                ride_type.label(),
                eligibility::ride_type_to_primary_level(ride_type).label(),
                &utils::format_categories(&reachable),
            ],
            &widths,
        );
    }
    utils::print_table_border(96);
    println!("Pet friendly and women eligibility are separate flags (see `shipdash flag`).");
}

fn estimate_price(
    config: &Config,
    from: GeoPoint,
    to: GeoPoint,
    format: OutputFormat,
) -> error::Result<()> {
    let estimate = PriceEstimator::new(&config.pricing).estimate(from, to);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    println!("From:      {}", from);
    println!("To:        {}", to);
    println!("Distance:  {}", utils::format_distance(estimate.distance_km));
    println!("Estimate:  {}", utils::format_price(estimate.price));
    Ok(())
}

async fn show_audit(config: &Config, limit: usize) -> error::Result<()> {
    let db = Database::open_existing(&config.database.path)?;
    let entries = db.recent(Some(limit))?;

    if entries.is_empty() {
        println!("No audit entries yet");
        return Ok(());
    }

    let widths = [24, 24, 22, 16, 40];
    utils::print_table_border(134);
    utils::print_table_row(&["Timestamp", "Action", "Driver", "Actor", "Details"], &widths);
    utils::print_table_border(134);
    for entry in &entries {
        utils::print_table_row(
            &[
                &utils::format_timestamp(Some(&entry.timestamp)),
                entry.action.as_str(),
                &utils::format_id(&entry.target_id),
                &entry.actor,
                &entry.details.to_string(),
            ],
            &widths,
        );
    }
    utils::print_table_border(134);
    Ok(())
}

async fn show_stats(config: &Config, format: OutputFormat) -> error::Result<()> {
    let db = Database::open_existing(&config.database.path)?;
    let stats = db.get_stats()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== ShipDash Driver Statistics ===".cyan().bold());
    println!("\nDrivers:          {}", stats.total_drivers);
    for (status, count) in &stats.by_status {
        println!("  {:<16}{}", status, count);
    }

    println!("\nBy level:");
    for (level, count) in &stats.by_level {
        println!("  {:<16}{}", level, count);
    }

    println!("\nFlags:");
    println!("  Pet friendly:   {}", stats.pet_friendly.to_string().green());
    println!("  Women eligible: {}", stats.women_eligible.to_string().green());
    println!("  Admin verified: {}", stats.verified_by_admin.to_string().green());
    println!("\nAudit entries:    {}", stats.audit_entries);
    Ok(())
}

fn print_assignment(assignment: &RideAssignment) {
    let title = format!("=== {} -> {} ===", assignment.driver_id, assignment.ride_type);
    println!("{}", title.cyan().bold());
    println!("Primary level:   {}", assignment.vehicle_level);
    println!(
        "Categories:      {}",
        utils::format_categories(&assignment.eligible_categories)
    );
    println!("Women eligible:  {}", utils::format_flag(assignment.women_eligible));
    print_warnings(&assignment.warnings);
}

fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n{}", "Warnings:".yellow());
    for warning in warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }
}
