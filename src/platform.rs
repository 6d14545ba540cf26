//! Operating-system specific wiring of the Oracle native client library.
//!
//! On Linux the library directory has to be visible through
//! `LD_LIBRARY_PATH` before the first connection is made. On macOS and
//! Windows the directory travels on the connection descriptor instead and
//! the client is primed explicitly (see `oracle::client`).

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::error::PlatformError;

/// Dynamic loader search path variable exported on Linux.
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Library directory already exported by this process, if any.
static EXPORTED_LIB_DIR: OnceLock<Mutex<Option<PathBuf>>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl TargetOs {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            TargetOs::Linux
        } else if cfg!(target_os = "macos") {
            TargetOs::MacOs
        } else if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else {
            TargetOs::Other
        }
    }
}

/// Seam over the process environment so DSN construction can be tested
/// without touching real environment variables.
pub trait PlatformAdapter: Send + Sync {
    fn target_os(&self) -> TargetOs;

    /// Makes `dir` visible to the dynamic loader for the rest of the process.
    fn export_library_path(&self, dir: &Path) -> Result<(), PlatformError>;
}

/// Adapter backed by the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePlatform;

impl PlatformAdapter for NativePlatform {
    fn target_os(&self) -> TargetOs {
        TargetOs::current()
    }

    fn export_library_path(&self, dir: &Path) -> Result<(), PlatformError> {
        let lock = EXPORTED_LIB_DIR.get_or_init(|| Mutex::new(None));
        let mut exported = lock.lock().map_err(|e| PlatformError::SetEnv {
            var: LIBRARY_PATH_VAR,
            reason: format!("failed to acquire lock: {}", e),
        })?;

        match exported.as_deref() {
            Some(current) if current == dir => Ok(()),
            Some(current) => Err(PlatformError::LibDirConflict {
                current: current.display().to_string(),
                requested: dir.display().to_string(),
            }),
            None => {
                let value = dir.as_os_str();
                if value.is_empty() || value.to_string_lossy().contains('\0') {
                    return Err(PlatformError::SetEnv {
                        var: LIBRARY_PATH_VAR,
                        reason: format!("invalid library dir [{}]", dir.display()),
                    });
                }
                std::env::set_var(LIBRARY_PATH_VAR, value);
                log::info!("Set {} to: {:?}", LIBRARY_PATH_VAR, dir);
                *exported = Some(dir.to_path_buf());
                Ok(())
            }
        }
    }
}

/// Expands a configured library directory.
///
/// Empty input means "no library dir". A leading `~/` is replaced with the
/// user's home directory.
pub fn expand_lib_dir(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Some(home.join(rest));
        }
    }
    Some(PathBuf::from(raw))
}
