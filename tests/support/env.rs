//! Environment and directory guards for integration tests.
//!
//! Provides helpers to capture and restore environment variables and to
//! write configuration files for CLI merge tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use lens::environment;
use lens::test_utils::{remove_var, set_var};

/// Apply a sequence of environment assignments, removing keys with `None`.
pub fn apply_env(pairs: &[(&str, Option<&str>)]) {
    for (key, value) in pairs {
        match value {
            Some(val) => set_var(key, val),
            None => remove_var(key),
        }
    }
}

/// RAII guard that restores captured environment variables on drop.
pub struct EnvGuard {
    entries: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    /// Capture `keys`, removing them from the environment for the guard's
    /// lifetime.
    ///
    /// Mutating the process environment is globally visible, so callers must
    /// serialise tests with `#[serial]` and include `LENS_CONFIG_PATH` when
    /// configuration helpers are used.
    pub fn new(keys: &[&str]) -> Self {
        let entries = keys
            .iter()
            .map(|key| {
                let previous = environment::var(key).ok();
                remove_var(key);
                ((*key).to_string(), previous)
            })
            .collect();
        Self { entries }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &mut self.entries {
            match value.take() {
                Some(val) => set_var(&*key, val),
                None => remove_var(&*key),
            }
        }
    }
}

/// Write `content` to a temporary `.lens.toml` and return its directory and path.
pub fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create config dir");
    let path = dir.path().join(".lens.toml");
    fs::write(&path, content).expect("write config");
    (dir, path)
}

/// Write a config file, set `LENS_CONFIG_PATH`, and return the directory and path.
///
/// Callers must create an [`EnvGuard`] that captures `LENS_CONFIG_PATH` before
/// invoking this helper so the variable is removed once the guard drops.
pub fn setup_env_and_config(config_content: &str) -> (TempDir, PathBuf) {
    let (dir, path) = write_config(config_content);
    set_var("LENS_CONFIG_PATH", path.as_os_str());
    (dir, path)
}
