//! Persistence for the session token.
//!
//! The store is an ordered chain: one secure backend (the OS keychain) and a
//! list of fallbacks (a local key/value file, then memory). Secure
//! availability is checked once per store and cached.
//!
//! Mirroring rules:
//! - a token read from the secure backend is copied into volatile fallbacks
//!   only (memory); it never lands on disk while the keychain works
//! - a token read from a fallback is never written back to the secure backend
//! - if the secure backend fails mid-session, reads fall through to the
//!   fallback chain, so a token mirrored earlier is still found

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::credentials::KeyringBackend;

/// File name of the local fallback store
const FALLBACK_FILE: &str = "credentials.json";

/// A place a token can live.
pub trait TokenBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the mechanism can be used at all on this machine.
    fn is_available(&self) -> bool;

    /// Whether a stored token outlives the process.
    fn is_persistent(&self) -> bool {
        true
    }

    fn get(&self) -> Result<Option<String>>;

    fn set(&self, token: &str) -> Result<()>;

    fn delete(&self) -> Result<()>;
}

impl<T: TokenBackend + ?Sized> TokenBackend for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn is_persistent(&self) -> bool {
        (**self).is_persistent()
    }

    fn get(&self) -> Result<Option<String>> {
        (**self).get()
    }

    fn set(&self, token: &str) -> Result<()> {
        (**self).set(token)
    }

    fn delete(&self) -> Result<()> {
        (**self).delete()
    }
}

// ============================================================================
// Fallback backends
// ============================================================================

/// Process-local storage. Always available.
#[derive(Default)]
pub struct MemoryBackend {
    token: Mutex<Option<String>>,
}

impl TokenBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn is_persistent(&self) -> bool {
        false
    }

    fn get(&self) -> Result<Option<String>> {
        Ok(self.token.lock().clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

/// Key/value JSON file, the local-storage equivalent on desktop.
pub struct FileBackend {
    path: PathBuf,
    key: String,
}

impl FileBackend {
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            path: dir.join(FALLBACK_FILE),
            key: key.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)
                    .with_context(|| format!("Failed to remove {}", self.path.display()))?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        write_private(&self.path, contents.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

impl TokenBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn is_available(&self) -> bool {
        let Some(parent) = self.path.parent() else {
            return false;
        };
        if let Err(e) = std::fs::create_dir_all(parent) {
            debug!(error = %e, dir = %parent.display(), "Fallback token directory unusable");
            return false;
        }
        !self.path.is_dir()
    }

    fn get(&self) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(&self.key))
    }

    fn set(&self, token: &str) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(self.key.clone(), token.to_string());
        self.write_entries(&entries)
    }

    fn delete(&self) -> Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(&self.key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

// ============================================================================
// Token store
// ============================================================================

pub struct TokenStore {
    secure: Box<dyn TokenBackend>,
    fallbacks: Vec<Box<dyn TokenBackend>>,
    secure_available: OnceLock<bool>,
    first_fallback: OnceLock<usize>,
}

impl TokenStore {
    /// Build a store from a secure backend and an ordered fallback list.
    /// A memory backend is always appended as the last fallback.
    pub fn new(secure: Box<dyn TokenBackend>, mut fallbacks: Vec<Box<dyn TokenBackend>>) -> Self {
        fallbacks.push(Box::new(MemoryBackend::default()));
        Self {
            secure,
            fallbacks,
            secure_available: OnceLock::new(),
            first_fallback: OnceLock::new(),
        }
    }

    /// Keychain first, then `<data_dir>/credentials.json`, then memory.
    pub fn with_default_backends(key: &str, data_dir: Option<&Path>) -> Self {
        let mut fallbacks: Vec<Box<dyn TokenBackend>> = Vec::new();
        if let Some(dir) = data_dir {
            fallbacks.push(Box::new(FileBackend::new(dir, key)));
        }
        Self::new(Box::new(KeyringBackend::new(key)), fallbacks)
    }

    /// A store that never touches disk or the OS keychain.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::default()), Vec::new())
    }

    fn secure_available(&self) -> bool {
        *self.secure_available.get_or_init(|| {
            let available = self.secure.is_available();
            debug!(backend = self.secure.name(), available, "Checked secure token storage");
            available
        })
    }

    fn fallbacks(&self) -> &[Box<dyn TokenBackend>] {
        let start = *self.first_fallback.get_or_init(|| {
            let index = self
                .fallbacks
                .iter()
                .position(|backend| backend.is_available())
                .unwrap_or(self.fallbacks.len() - 1);
            debug!(backend = self.fallbacks[index].name(), "Selected fallback token storage");
            index
        });
        &self.fallbacks[start..]
    }

    fn write_fallback(&self, token: &str) -> Result<()> {
        let mut last_error = None;
        for backend in self.fallbacks() {
            match backend.set(token) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "Fallback token write failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("No fallback token storage available")))
    }

    /// Copy a secure-backend token into the first volatile fallback.
    fn mirror_volatile(&self, token: &str) {
        for backend in self.fallbacks.iter().filter(|backend| !backend.is_persistent()) {
            match backend.set(token) {
                Ok(()) => return,
                Err(e) => warn!(backend = backend.name(), error = %e, "Failed to mirror token"),
            }
        }
    }

    fn read_fallback(&self) -> Option<String> {
        for backend in self.fallbacks() {
            match backend.get() {
                Ok(Some(token)) => return Some(token),
                Ok(None) => {}
                Err(e) => warn!(backend = backend.name(), error = %e, "Fallback token read failed"),
            }
        }
        None
    }

    fn clear_fallback(&self) {
        for backend in self.fallbacks() {
            if let Err(e) = backend.delete() {
                warn!(backend = backend.name(), error = %e, "Fallback token delete failed");
            }
        }
    }

    /// Persist a token. An empty token is the same as [`TokenStore::remove`].
    pub fn save(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            self.remove();
            return Ok(());
        }

        if self.secure_available() {
            self.secure.set(token)
        } else {
            self.write_fallback(token)
        }
    }

    /// Best-effort delete from every mechanism. Never fails.
    pub fn remove(&self) {
        if self.secure_available() {
            if let Err(e) = self.secure.delete() {
                warn!(backend = self.secure.name(), error = %e, "Failed to delete secure token");
            }
        }
        self.clear_fallback();
    }

    pub fn get(&self) -> Option<String> {
        if self.secure_available() {
            match self.secure.get() {
                Ok(Some(token)) => {
                    self.mirror_volatile(&token);
                    return Some(token);
                }
                Ok(None) => return None,
                Err(e) => {
                    warn!(backend = self.secure.name(), error = %e, "Secure token read failed, using fallback");
                }
            }
        }
        self.read_fallback()
    }
}
