//! Per-install device identifier
//!
//! The backend scopes watchers and alerts by an opaque `user_identifier`.
//! It is generated on first use as `device_<unix millis>_<9 base36 chars>`
//! and kept in a one-line file under the data directory.

use rand::Rng;
use std::path::{Path, PathBuf};

use crate::config::resolve_data_path;
use crate::error::{DbError, Result};

const DEVICE_FILE: &str = "device_id";
const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of the identifier sent to the watcher and alert endpoints
pub trait DeviceProvider: Send + Sync {
    /// Existing identifier, created and stored on first call
    fn device_id(&self) -> Result<String>;

    /// Forget the stored identifier; the next `device_id` creates a new one
    fn reset_device_id(&self) -> Result<()>;
}

/// Stores the identifier in a plain text file
pub struct FileDeviceProvider {
    path: PathBuf,
}

impl FileDeviceProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/skyfare/device_id`
    pub fn from_default_location() -> Result<Self> {
        Ok(Self::new(resolve_data_path()?.join(DEVICE_FILE)))
    }

    /// Next to the saved-flights database, so both share a data directory
    pub fn beside(db_path: &Path) -> Result<Self> {
        match db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => Ok(Self::new(dir.join(DEVICE_FILE))),
            None => Self::from_default_location(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DbError::IoError(e).into()),
        }
    }
}

impl DeviceProvider for FileDeviceProvider {
    fn device_id(&self) -> Result<String> {
        if let Some(id) = self.read_existing()? {
            return Ok(id);
        }

        let id = generate_device_id();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }
        std::fs::write(&self.path, format!("{}\n", id)).map_err(DbError::IoError)?;
        tracing::info!("Created device identifier at {}", self.path.display());
        Ok(id)
    }

    fn reset_device_id(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DbError::IoError(e).into()),
        }
    }
}

/// Fixed identifier, for tests and explicit `--device-id` overrides
pub struct StaticDeviceProvider(pub String);

impl DeviceProvider for StaticDeviceProvider {
    fn device_id(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    fn reset_device_id(&self) -> Result<()> {
        Ok(())
    }
}

pub fn generate_device_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("device_{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}
