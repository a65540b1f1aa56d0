//! Process-wide environment helpers.
//!
//! Reads and writes of the process environment go through one mutex so tests
//! that set variables cannot race with code that reads them.

use std::env;
use std::ffi::OsStr;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Set an environment variable while holding the global lock.
pub fn set_var<K: AsRef<OsStr>, V: AsRef<OsStr>>(key: K, value: V) {
    let _guard = lock();
    // SAFETY: the mutex serialises access to the unsynchronised std env calls.
    unsafe { env::set_var(key, value) };
}

/// Remove an environment variable while holding the global lock.
pub fn remove_var<K: AsRef<OsStr>>(key: K) {
    let _guard = lock();
    // SAFETY: the mutex serialises access to the unsynchronised std env calls.
    unsafe { env::remove_var(key) };
}

/// Read an environment variable while holding the global lock.
///
/// # Errors
///
/// Returns [`env::VarError`] when the variable is unset or not valid
/// Unicode.
pub fn var<K: AsRef<OsStr>>(key: K) -> Result<String, env::VarError> {
    let _guard = lock();
    env::var(key)
}

/// The first non-empty value among `keys`, in order.
pub fn first_non_empty(keys: &[&str]) -> Option<String> {
    let _guard = lock();
    keys.iter()
        .filter_map(|k| env::var(k).ok())
        .find(|v| !v.trim().is_empty())
}

/// A GitHub token from `LENS_GITHUB_TOKEN`, falling back to `GITHUB_TOKEN`.
#[must_use]
pub fn github_token() -> Option<String> {
    first_non_empty(&["LENS_GITHUB_TOKEN", "GITHUB_TOKEN"])
}
