//! REST API client module for the Autotrace server.
//!
//! `ApiClient` is the single transport: it holds the base URL, timeout,
//! bearer token and 401 hook. The domain operations (auth, vehicles,
//! maintenance, dashboard, certificates, upload slots) are `impl ApiClient`
//! blocks in the sibling modules.

pub mod auth;
pub mod certificates;
pub mod client;
pub mod dashboard;
pub mod error;
pub mod uploads;
pub mod vehicles;

pub use auth::{AuthResponse, LoginPayload, RegisterPayload};
pub use client::{ApiClient, UnauthorizedHandler, DEFAULT_API_BASE_URL, REQUEST_TIMEOUT_SECS};
pub use error::{ApiError, ErrorPayload, Result, GENERIC_ERROR_MESSAGE};
pub use vehicles::{AttachPhotoResponse, CreateMaintenancePayload, CreateVehiclePayload};
