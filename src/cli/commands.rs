use clap::{Parser, Subcommand, ValueEnum};

use shipdash::config::DEFAULT_CONFIG_PATH;
use shipdash::drivers::DriverStatus;
use shipdash::eligibility::RideType;
use shipdash::pricing::GeoPoint;

#[derive(Parser)]
#[command(name = "shipdash")]
#[command(about = "Driver eligibility and dispatch operations for the ShipDash admin panel")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Operator id recorded as `updatedBy` (overrides configuration)
    #[arg(long, global = true)]
    pub actor: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database and show configuration
    Init,

    /// Import driver documents from a JSON export
    Import {
        /// JSON file (array, single document, or id-keyed collection)
        path: String,

        /// Parse and report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// List drivers
    List {
        /// Filter by status (pending, under_review, approved, rejected)
        #[arg(short, long)]
        status: Option<DriverStatus>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show a driver with its normalized level and requirement warnings
    Show {
        driver_id: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Assign a ride type and recompute eligible categories
    Assign {
        driver_id: String,

        /// Ride type label, e.g. "Comfort Ride"
        ride_type: RideType,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Show the computed result without saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Toggle an eligibility flag
    Flag {
        driver_id: String,

        #[arg(value_enum)]
        flag: EligibilityFlag,

        #[arg(value_enum)]
        state: FlagState,
    },

    /// Approve a driver for dispatch
    Approve {
        driver_id: String,

        #[arg(short, long)]
        yes: bool,
    },

    /// Reject a driver
    Reject {
        driver_id: String,

        #[arg(short, long)]
        yes: bool,
    },

    /// Send a driver for manager review
    Escalate { driver_id: String },

    /// Run the eligibility rules against ad-hoc vehicle attributes
    Preview {
        ride_type: RideType,

        #[arg(long, default_value_t = 0)]
        seats: u32,

        #[arg(long)]
        ac: bool,

        #[arg(long)]
        electric: bool,

        #[arg(long)]
        luxury_verified: bool,

        #[arg(long, default_value = "")]
        color: String,

        /// Driver certified for black attire
        #[arg(long)]
        black_dress: bool,
    },

    /// List ride types with their primary level and reachable categories
    RideTypes,

    /// Estimate distance and price between two "lat,lng" points
    Estimate {
        #[arg(allow_hyphen_values = true)]
        from: GeoPoint,

        #[arg(allow_hyphen_values = true)]
        to: GeoPoint,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show recent audit entries
    Audit {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show statistics
    Stats {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EligibilityFlag {
    Pet,
    Women,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FlagState {
    On,
    Off,
}

impl FlagState {
    pub fn enabled(self) -> bool {
        self == FlagState::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assign() {
        let cli =
            Cli::try_parse_from(["shipdash", "assign", "drv-1", "Black Ride", "--yes"]).unwrap();
        match cli.command {
            Commands::Assign { driver_id, ride_type, yes, dry_run } => {
                assert_eq!(driver_id, "drv-1");
                assert_eq!(ride_type, RideType::BlackRide);
                assert!(yes);
                assert!(!dry_run);
            }
            _ => panic!("expected assign"),
        }
    }

    #[test]
    fn test_unknown_ride_type_is_rejected() {
        assert!(Cli::try_parse_from(["shipdash", "assign", "drv-1", "Rocket Ride"]).is_err());
    }

    #[test]
    fn test_parse_estimate_with_negative_coordinates() {
        let args = ["shipdash", "estimate", "-33.86,151.21", "40.71,-74.00"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Estimate { from, to, .. } => {
                assert_eq!(from, GeoPoint::new(-33.86, 151.21));
                assert_eq!(to, GeoPoint::new(40.71, -74.0));
            }
            _ => panic!("expected estimate"),
        }
    }

    #[test]
    fn test_global_actor_override() {
        let args = ["shipdash", "flag", "drv-1", "pet", "on", "--actor", "lead-2"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.actor.as_deref(), Some("lead-2"));
        assert!(matches!(
            cli.command,
            Commands::Flag { flag: EligibilityFlag::Pet, state: FlagState::On, .. }
        ));
    }
}
