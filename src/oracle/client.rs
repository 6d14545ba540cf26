/// Oracle client library priming
///
/// On macOS and Windows the library directory is carried on the descriptor
/// rather than exported through the environment. The client library is
/// loaded from that directory once per process, before the first connection.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::error::PlatformError;

/// Loaded client library and the directory it came from
struct PrimedClient {
    dir: PathBuf,
    _library: libloading::Library,
}

/// Static reference to the Oracle client library (loaded via libloading)
static ORACLE_CLIENT: OnceLock<Mutex<Option<PrimedClient>>> = OnceLock::new();

/// Oracle client library filename for the build target
#[cfg(target_os = "macos")]
const ORACLE_LIB_NAME: &str = "libclntsh.dylib";

#[cfg(target_os = "windows")]
const ORACLE_LIB_NAME: &str = "oci.dll";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const ORACLE_LIB_NAME: &str = "libclntsh.so";

/// Full path of the client library inside `dir`
pub fn client_library_path(dir: &Path) -> PathBuf {
    dir.join(ORACLE_LIB_NAME)
}

/// Primes (loads) the Oracle client library into memory
///
/// The library stays loaded for the lifetime of the process. Priming the
/// same directory twice is a no-op; priming a different directory fails.
///
/// # Arguments
/// * `dir` - Directory holding the client library
///
/// # Returns
/// `Ok(())` if the library is loaded, or the reason it could not be
pub fn prime_client(dir: &Path) -> Result<(), PlatformError> {
    let mutex = ORACLE_CLIENT.get_or_init(|| Mutex::new(None));
    let mut guard = mutex.lock().map_err(|e| {
        PlatformError::LibraryLoad(format!("failed to acquire lock on oracle client: {}", e))
    })?;

    if let Some(primed) = guard.as_ref() {
        if primed.dir == dir {
            return Ok(());
        }
        return Err(PlatformError::LibDirConflict {
            current: primed.dir.display().to_string(),
            requested: dir.display().to_string(),
        });
    }

    let lib_path = client_library_path(dir);
    if !lib_path.is_file() {
        return Err(PlatformError::LibraryNotFound(lib_path.display().to_string()));
    }

    // RTLD_GLOBAL makes the symbols visible to the driver's own dlopen
    #[cfg(unix)]
    let library = unsafe {
        use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
        let unix_lib = UnixLibrary::open(Some(&lib_path), RTLD_NOW | RTLD_GLOBAL)
            .map_err(|e| PlatformError::LibraryLoad(e.to_string()))?;
        libloading::Library::from(unix_lib)
    };

    #[cfg(not(unix))]
    let library = unsafe {
        libloading::Library::new(&lib_path).map_err(|e| PlatformError::LibraryLoad(e.to_string()))?
    };

    *guard = Some(PrimedClient {
        dir: dir.to_path_buf(),
        _library: library,
    });

    log::info!("Oracle client library loaded from: {:?}", lib_path);
    Ok(())
}

/// Checks if the Oracle client has been primed (loaded)
pub fn is_client_primed() -> bool {
    if let Some(mutex) = ORACLE_CLIENT.get() {
        if let Ok(guard) = mutex.lock() {
            return guard.is_some();
        }
    }
    false
}
