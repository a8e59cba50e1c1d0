//! Command-line arguments.

use std::path::PathBuf;

use autotrace_core::models::VehicleCategory;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "autotrace")]
#[command(author, version, about = "Track vehicles and their maintenance history", long_about = None)]
pub struct Cli {
    /// API URL to connect to (overrides AUTOTRACE_API_URL and the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session token
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Vehicle management commands
    #[command(subcommand)]
    Vehicles(VehicleCommand),

    /// Vehicle photo commands
    #[command(subcommand)]
    Photos(PhotoCommand),

    /// Maintenance record commands
    #[command(subcommand)]
    Maintenance(MaintenanceCommand),

    /// Per-vehicle maintenance overview
    Dashboard,

    /// Maintenance certificate commands
    #[command(subcommand)]
    Certificate(CertificateCommand),
}

#[derive(Subcommand, Debug)]
pub enum VehicleCommand {
    /// List registered vehicles
    List,

    /// Show a vehicle with photos, history and suggestions
    Show { vehicle: String },

    /// Register a vehicle
    Add {
        #[arg(long)]
        plate: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        manufacturer: String,
        #[arg(long)]
        year: i32,
        #[arg(long, value_enum, default_value = "car")]
        category: CategoryArg,
        /// Average distance driven per month, in km
        #[arg(long)]
        monthly_km: u32,
        /// Odometer reading when the vehicle was registered
        #[arg(long)]
        odometer: Option<u32>,
    },

    /// Delete a vehicle
    Delete { vehicle: String },
}

#[derive(Subcommand, Debug)]
pub enum PhotoCommand {
    /// Upload one or more photos, in order
    Upload {
        vehicle: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Remove a photo
    Delete { vehicle: String, photo: String },
}

#[derive(Subcommand, Debug)]
pub enum MaintenanceCommand {
    /// Record a service, optionally with a receipt
    Add {
        vehicle: String,
        #[arg(long)]
        service_type: String,
        /// Service date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        odometer: u32,
        #[arg(long)]
        workshop: String,
        #[arg(long)]
        notes: Option<String>,
        /// Receipt or invoice to attach
        #[arg(long)]
        document: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CertificateCommand {
    /// Check a certificate id
    Validate { certificate: String },

    /// Download a vehicle's PDF certificate
    Download {
        vehicle: String,
        /// Destination directory (defaults to the cache directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Car,
    Motorcycle,
    Truck,
    Other,
}

impl From<CategoryArg> for VehicleCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Car => VehicleCategory::Car,
            CategoryArg::Motorcycle => VehicleCategory::Motorcycle,
            CategoryArg::Truck => VehicleCategory::Truck,
            CategoryArg::Other => VehicleCategory::Other,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("expected a date like 2024-03-15, got '{}'", value))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-15"),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        );
        assert!(parse_date("15/03/2024").is_err());
    }

    #[test]
    fn test_parse_maintenance_add() {
        let cli = Cli::try_parse_from([
            "autotrace",
            "maintenance",
            "add",
            "v1",
            "--service-type",
            "Oil change",
            "--date",
            "2024-05-02",
            "--odometer",
            "42000",
            "--workshop",
            "Auto Center",
            "--document",
            "receipt.pdf",
        ])
        .unwrap();

        match cli.command {
            Command::Maintenance(MaintenanceCommand::Add {
                vehicle,
                date,
                document,
                ..
            }) => {
                assert_eq!(vehicle, "v1");
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
                assert_eq!(document, Some(PathBuf::from("receipt.pdf")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_photo_upload_requires_files() {
        assert!(Cli::try_parse_from(["autotrace", "photos", "upload", "v1"]).is_err());
    }

    #[test]
    fn test_global_api_url() {
        let cli = Cli::try_parse_from(["autotrace", "whoami", "--api-url", "http://api.test"]).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://api.test"));
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(VehicleCategory::from(CategoryArg::Truck), VehicleCategory::Truck);
    }
}
