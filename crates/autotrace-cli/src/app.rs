use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use autotrace_core::api::{CreateMaintenancePayload, CreateVehiclePayload, LoginPayload, RegisterPayload};
use autotrace_core::config::TOKEN_STORAGE_KEY;
use autotrace_core::models::{User, VehiclePhoto, VehicleWithDetails};
use autotrace_core::utils::{format_date, format_km, format_optional, truncate};
use autotrace_core::{
    workflows, ApiClient, ApiError, AuthStatus, Config, SessionManager, TokenStore, UploadFile,
    UploadReport, Uploader,
};
use tracing::{debug, warn};

use crate::cli::{CertificateCommand, Command, MaintenanceCommand, PhotoCommand, VehicleCommand};

/// Environment variable read instead of prompting for a password
const PASSWORD_ENV: &str = "AUTOTRACE_PASSWORD";

// ============================================================================
// App
// ============================================================================

pub struct App {
    config: Config,
    session: SessionManager,
    uploader: Uploader,
}

impl App {
    pub fn new(api_url: Option<String>) -> Result<Self> {
        let mut config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        }
        .with_env_overrides();
        if let Some(url) = api_url {
            config.apply_api_url(&url);
        }
        debug!(api_base_url = %config.api_base_url, "Config loaded");

        let data_dir = match config.data_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!(error = %e, "No data directory, file token storage disabled");
                None
            }
        };
        let store = TokenStore::with_default_backends(TOKEN_STORAGE_KEY, data_dir.as_deref());

        Self::with_store(config, store)
    }

    /// Wire the session and uploader around an already resolved config.
    fn with_store(config: Config, store: TokenStore) -> Result<Self> {
        let api = ApiClient::from_config(&config)?;
        let session = SessionManager::new(api.clone(), store);
        let uploader = Uploader::new(api);

        Ok(Self {
            config,
            session,
            uploader,
        })
    }

    fn api(&self) -> &ApiClient {
        self.session.api()
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        let status = self.session.bootstrap().await;
        debug!(?status, "Session bootstrapped");

        let needs_session = !matches!(
            command,
            Command::Login { .. } | Command::Register { .. } | Command::Logout
        );
        if needs_session && status != AuthStatus::Authenticated {
            bail!("Not signed in. Run `autotrace login` first.");
        }

        match command {
            Command::Login { email } => self.login(email).await,
            Command::Register { name, email } => self.register(name, email).await,
            Command::Logout => {
                self.session.sign_out();
                println!("Signed out.");
                Ok(())
            }
            Command::Whoami => self.whoami().await,
            Command::Vehicles(cmd) => self.vehicles(cmd).await,
            Command::Photos(cmd) => self.photos(cmd).await,
            Command::Maintenance(cmd) => self.maintenance(cmd).await,
            Command::Dashboard => self.dashboard().await,
            Command::Certificate(cmd) => self.certificate(cmd).await,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    async fn login(&self, email: Option<String>) -> Result<()> {
        let email = match email {
            Some(email) => email,
            None => Self::prompt_email(self.config.last_email.as_deref())?,
        };
        let password = Self::read_password()?;

        let user = self.session.sign_in(&LoginPayload::new(email, password)).await?;
        self.remember_email(&user.email);

        println!("Signed in as {} <{}>", user.name, user.email);
        Ok(())
    }

    async fn register(&self, name: String, email: String) -> Result<()> {
        let password = Self::read_password()?;
        let user = self
            .session
            .sign_up(&RegisterPayload::new(name, email, password))
            .await?;
        self.remember_email(&user.email);

        println!("Account created. Signed in as {} <{}>", user.name, user.email);
        Ok(())
    }

    /// Persist the email for the next login prompt. Re-reads the file so
    /// env and flag overrides are not written back.
    fn remember_email(&self, email: &str) {
        let mut stored = Config::load().unwrap_or_default();
        stored.last_email = Some(email.to_string());
        if let Err(e) = stored.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    async fn whoami(&self) -> Result<()> {
        let user = self.session.refresh_user().await?;
        print_user(&user);
        Ok(())
    }

    fn prompt_email(last_email: Option<&str>) -> Result<String> {
        match last_email {
            Some(last) => print!("Email [{}]: ", last),
            None => print!("Email: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        match (input.is_empty(), last_email) {
            (true, Some(last)) => Ok(last.to_string()),
            _ => Ok(input.to_string()),
        }
    }

    fn read_password() -> Result<String> {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            return Ok(password);
        }
        rpassword::prompt_password("Password: ").context("Failed to read password")
    }

    // =========================================================================
    // Vehicles
    // =========================================================================

    async fn vehicles(&self, command: VehicleCommand) -> Result<()> {
        match command {
            VehicleCommand::List => {
                let vehicles = self.api().list_vehicles().await?;
                if vehicles.is_empty() {
                    println!("No vehicles registered.");
                }
                for vehicle in vehicles {
                    println!(
                        "{:<26} {:<9} {:<32} {}",
                        vehicle.id,
                        vehicle.plate,
                        truncate(&vehicle.display_name(), 32),
                        vehicle.category.label()
                    );
                }
            }
            VehicleCommand::Show { vehicle } => {
                let details = self.api().vehicle_details(&vehicle).await?;
                print_vehicle_details(&details);
            }
            VehicleCommand::Add {
                plate,
                model,
                manufacturer,
                year,
                category,
                monthly_km,
                odometer,
            } => {
                let payload = CreateVehiclePayload {
                    plate,
                    model,
                    manufacturer,
                    year,
                    category: category.into(),
                    average_monthly_km: monthly_km,
                    initial_odometer: odometer,
                }
                .normalized();
                let vehicle = self.api().create_vehicle(&payload).await?;
                println!("Registered {} [{}] as {}", vehicle.display_name(), vehicle.plate, vehicle.id);
            }
            VehicleCommand::Delete { vehicle } => {
                self.api().delete_vehicle(&vehicle).await?;
                println!("Vehicle {} deleted.", vehicle.trim());
            }
        }
        Ok(())
    }

    async fn photos(&self, command: PhotoCommand) -> Result<()> {
        match command {
            PhotoCommand::Upload { vehicle, files } => {
                let files = files
                    .iter()
                    .map(UploadFile::from_path)
                    .collect::<Result<Vec<_>, ApiError>>()?;
                let report =
                    workflows::upload_vehicle_photos(self.api(), &self.uploader, &vehicle, files).await?;

                for line in upload_summary(&report) {
                    println!("{}", line);
                }
                if let Some(failure) = report.failure {
                    eprintln!("Failed to upload {}", failure.file.original_name);
                    return Err(failure.error.into());
                }
            }
            PhotoCommand::Delete { vehicle, photo } => {
                self.api().delete_vehicle_photo(&vehicle, &photo).await?;
                println!("Photo {} removed.", photo.trim());
            }
        }
        Ok(())
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    async fn maintenance(&self, command: MaintenanceCommand) -> Result<()> {
        match command {
            MaintenanceCommand::Add {
                vehicle,
                service_type,
                date,
                odometer,
                workshop,
                notes,
                document,
            } => {
                let payload = CreateMaintenancePayload {
                    service_type: service_type.trim().to_string(),
                    service_date: date,
                    odometer,
                    workshop: workshop.trim().to_string(),
                    notes: notes.filter(|n| !n.trim().is_empty()),
                    document_file_name: None,
                };
                let document = document.map(UploadFile::from_path).transpose()?;

                let record =
                    workflows::create_maintenance(self.api(), &self.uploader, &vehicle, payload, document)
                        .await?;
                println!(
                    "Recorded {} on {} at {}",
                    record.service_type,
                    format_date(&record.service_date),
                    format_km(record.odometer)
                );
                if let Some(url) = record.document_url {
                    println!("Document: {}", url);
                }
            }
        }
        Ok(())
    }

    async fn dashboard(&self) -> Result<()> {
        let items = self.api().dashboard().await?;
        if items.is_empty() {
            println!("No vehicles registered.");
        }
        for item in items {
            let next = item
                .next_maintenance_km
                .map(format_km)
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<10} {:<10} services: {:<3} last: {:<14} next: {}",
                format_optional(item.vehicle_plate.as_deref(), &item.vehicle_id),
                item.status_label(),
                item.total_maintenances,
                item.last_maintenance_date
                    .as_deref()
                    .map(format_date)
                    .unwrap_or_else(|| "never".to_string()),
                next
            );
        }
        Ok(())
    }

    // =========================================================================
    // Certificates
    // =========================================================================

    async fn certificate(&self, command: CertificateCommand) -> Result<()> {
        match command {
            CertificateCommand::Validate { certificate } => {
                let validation = self.api().validate_certificate(&certificate).await?;
                let cert = validation.certificate;
                println!("Certificate {} is valid", cert.id);
                println!("  Vehicle:      {}", cert.vehicle_plate);
                println!("  Generated:    {}", format_date(&cert.generated_at));
                println!("  Services:     {}", cert.maintenance_count);
                println!(
                    "  Last service: {}",
                    cert.last_maintenance_date
                        .as_deref()
                        .map(format_date)
                        .unwrap_or_else(|| "never".to_string())
                );
                if cert.overdue {
                    println!("  Maintenance is overdue");
                }
            }
            CertificateCommand::Download { vehicle, out } => {
                let dir = match out {
                    Some(dir) => dir,
                    None => self.default_download_dir(),
                };
                let path = self.api().download_certificate(&vehicle, &dir).await?;
                println!("Saved {}", path.display());
            }
        }
        Ok(())
    }

    fn default_download_dir(&self) -> PathBuf {
        self.config
            .cache_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
    }
}

// ============================================================================
// Output
// ============================================================================

/// One line per completed or skipped photo, in upload order.
fn upload_summary(report: &UploadReport<VehiclePhoto>) -> Vec<String> {
    let uploaded = report
        .completed
        .iter()
        .map(|done| format!("Uploaded {} -> {}", done.file.original_name, done.output.url));
    let skipped = report
        .skipped
        .iter()
        .map(|file| format!("Skipped {}", file.original_name));
    uploaded.chain(skipped).collect()
}

fn print_user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    println!("  Role:   {}", user.role.label());
    println!("  Member: {}", user.created_at.format("%b %d, %Y"));
}

fn print_vehicle_details(details: &VehicleWithDetails) {
    let vehicle = &details.vehicle;
    println!("{} [{}]", vehicle.display_name(), vehicle.plate);
    println!("  Category:      {}", vehicle.category.label());
    println!("  Monthly usage: {}", format_km(vehicle.average_monthly_km));
    if let Some(odometer) = vehicle.initial_odometer {
        println!("  Initial km:    {}", format_km(odometer));
    }

    let suggestions = &details.suggestions;
    println!();
    println!("Estimated odometer: {}", format_km(suggestions.estimated_current_km));
    match (suggestions.next_maintenance_km, suggestions.km_to_next) {
        (Some(next), Some(remaining)) => {
            println!("Next service at {} ({} to go)", format_km(next), format_km(remaining))
        }
        (Some(next), None) => println!("Next service at {}", format_km(next)),
        _ => println!("No service scheduled"),
    }
    if let Some(due) = suggestions.estimated_due_date.as_deref() {
        println!("Estimated due date: {}", format_date(due));
    }
    if suggestions.overdue {
        println!("Maintenance is OVERDUE");
    }
    for item in &suggestions.checklist {
        println!("  - {}", item);
    }
    for checkpoint in &suggestions.upcoming {
        let flag = if checkpoint.overdue { " (overdue)" } else { "" };
        println!("  At {}{}: {}", format_km(checkpoint.km_mark), flag, checkpoint.checklist.join(", "));
    }

    println!();
    println!("Photos ({})", details.photos.len());
    for photo in &details.photos {
        println!("  {:<26} {}", photo.id, photo.url);
    }

    println!();
    println!("Maintenance history ({})", details.maintenances.len());
    for record in &details.maintenances {
        println!(
            "  {:<14} {:<24} {:>12}  {}",
            format_date(&record.service_date),
            truncate(&record.service_type, 24),
            format_km(record.odometer),
            record.workshop
        );
    }
}
