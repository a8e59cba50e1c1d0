//! Authentication module for managing user sessions and the stored token.
//!
//! This module provides:
//! - `SessionManager`: session state, sign in/up/out, forced sign-out on 401
//! - `TokenStore`: token persistence with a keychain-first backend chain
//! - `KeyringBackend`: OS-level credential storage via keyring

pub mod credentials;
pub mod session;
pub mod token_store;

pub use credentials::KeyringBackend;
pub use session::{AuthStatus, Session, SessionManager};
pub use token_store::{FileBackend, MemoryBackend, TokenBackend, TokenStore};
