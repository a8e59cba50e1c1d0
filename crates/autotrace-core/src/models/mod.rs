//! Data models for Autotrace entities.
//!
//! This module contains the wire types exchanged with the API:
//!
//! - `User`: the signed-in account
//! - `Vehicle`, `VehiclePhoto`, `VehicleWithDetails`: registered vehicles
//! - `MaintenanceRecord`, `MaintenanceSuggestions`: service history and
//!   server-computed recommendations
//! - `DashboardSummaryItem`: per-vehicle overview
//! - `Certificate`: maintenance certificates
//! - `PresignedUpload`, `UploadRequest`: direct-to-storage uploads

pub mod certificate;
pub mod dashboard;
pub mod maintenance;
pub mod upload;
pub mod user;
pub mod vehicle;

pub use certificate::{Certificate, CertificateValidation};
pub use dashboard::DashboardSummaryItem;
pub use maintenance::{MaintenanceRecord, MaintenanceSuggestionCheckpoint, MaintenanceSuggestions};
pub use upload::{PresignedUpload, UploadCategory, UploadRequest};
pub use user::{User, UserRole};
pub use vehicle::{Vehicle, VehicleCategory, VehiclePhoto, VehicleWithDetails};
