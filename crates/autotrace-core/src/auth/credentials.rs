use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use super::token_store::TokenBackend;

/// Keychain service name for stored session tokens
pub const SERVICE_NAME: &str = "autotrace";

/// Session token stored in the OS keychain
/// (macOS Keychain, Windows Credential Manager, Secret Service on Linux).
pub struct KeyringBackend {
    entry: Option<Entry>,
}

impl KeyringBackend {
    pub fn new(account: &str) -> Self {
        let entry = match Entry::new(SERVICE_NAME, account) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "Failed to create keyring entry");
                None
            }
        };
        Self { entry }
    }

    fn entry(&self) -> Result<&Entry> {
        self.entry
            .as_ref()
            .context("Keyring entry is unavailable on this platform")
    }
}

impl TokenBackend for KeyringBackend {
    fn name(&self) -> &'static str {
        "keyring"
    }

    fn is_available(&self) -> bool {
        let Some(entry) = self.entry.as_ref() else {
            return false;
        };
        match entry.get_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => true,
            Err(e) => {
                debug!(error = %e, "Keychain availability check failed");
                false
            }
        }
    }

    fn get(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn delete(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
