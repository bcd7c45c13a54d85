//! Durable storage for the session record.
//!
//! The record lives in a single slot keyed by [`STORAGE_KEY`]. Three backends
//! are provided:
//! - [`KeyringBackend`] - the operating system keyring (default)
//! - [`FileBackend`] - a JSON file in the platform data directory
//! - [`MemoryBackend`] - an in-process slot that is lost on exit

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use keyring::Entry;

use crate::auth::tokens::AuthState;
use crate::config::paths::session_file;
use crate::config::settings::StorageKind;
use crate::error::{Result, StaybookError};

const SERVICE_NAME: &str = "dev.staybook.cli";

/// Fixed namespace identifier of the session slot.
pub const STORAGE_KEY: &str = "auth-storage";

/// A durable key-value slot holding the serialized session record.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialBackend: Send + Sync {
    /// Reads the stored record. Returns `None` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::InvalidCredentials`] if the record cannot be parsed,
    /// or [`StaybookError::CredentialStorage`] if the slot is inaccessible.
    fn load(&self) -> Result<Option<AuthState>>;

    /// Overwrites the slot with `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the slot is inaccessible.
    fn save(&self, state: &AuthState) -> Result<()>;

    /// Empties the slot. No-op if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::CredentialStorage`] if the slot is inaccessible.
    fn delete(&self) -> Result<()>;
}

/// Opens the backend selected in configuration.
pub fn open_backend(kind: StorageKind) -> Result<Box<dyn CredentialBackend>> {
    Ok(match kind {
        StorageKind::Keyring => Box::new(KeyringBackend::new()?),
        StorageKind::File => Box::new(FileBackend::new()?),
        StorageKind::Memory => Box::new(MemoryBackend::default()),
    })
}

fn parse_record(json: &str) -> Result<AuthState> {
    serde_json::from_str(json).map_err(|_| StaybookError::InvalidCredentials)
}

/// Session slot backed by the OS keyring.
///
/// - macOS: Keychain
/// - Linux: Secret Service (GNOME Keyring, `KWallet`)
/// - Windows: Credential Manager
pub struct KeyringBackend {
    entry: Entry,
}

impl KeyringBackend {
    /// Creates a backend bound to the staybook keyring entry.
    ///
    /// # Errors
    ///
    /// Returns [`StaybookError::CredentialStorage`] if the keyring entry cannot be created,
    /// which may occur if the keyring service is unavailable or locked.
    pub fn new() -> Result<Self> {
        let entry = Entry::new(SERVICE_NAME, STORAGE_KEY)?;
        Ok(Self { entry })
    }
}

impl CredentialBackend for KeyringBackend {
    fn load(&self) -> Result<Option<AuthState>> {
        match self.entry.get_password() {
            Ok(json) => parse_record(&json).map(Some),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StaybookError::CredentialStorage(e.to_string())),
        }
    }

    fn save(&self, state: &AuthState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.entry.set_password(&json)?;
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StaybookError::CredentialStorage(e.to_string())),
        }
    }
}

/// Session slot backed by a JSON file.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a backend writing to `<data_dir>/staybook/auth-storage.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::at(session_file(STORAGE_KEY)?))
    }

    /// Creates a backend writing to an explicit path.
    #[must_use]
    pub const fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialBackend for FileBackend {
    fn load(&self) -> Result<Option<AuthState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        parse_record(&contents).map(Some)
    }

    fn save(&self, state: &AuthState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)?;
        restrict_permissions(&self.path)
    }

    fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn restrict_permissions(_path: &std::path::Path) -> Result<()> {
    Ok(())
}

/// Session slot that lives only as long as the process.
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<String>>,
}

impl CredentialBackend for MemoryBackend {
    fn load(&self) -> Result<Option<AuthState>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_deref().map(parse_record).transpose()
    }

    fn save(&self, state: &AuthState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
