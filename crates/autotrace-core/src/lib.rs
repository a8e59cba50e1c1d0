//! Autotrace client core.
//!
//! Everything a front end needs to talk to the Autotrace vehicle maintenance
//! service: the authenticated HTTP transport, the session manager with its
//! token store, presigned uploads and the domain endpoints.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod upload;
pub mod utils;
pub mod workflows;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthStatus, Session, SessionManager, TokenStore};
pub use config::Config;
pub use upload::{UploadFile, UploadReport, Uploader};
