//! Configuration loading helpers.
//!
//! Global options come from the top level of `.lens.toml` (or the file named
//! by `LENS_CONFIG_PATH`) and `LENS_*` variables; sub-command options go
//! through `ortho_config`, which tolerates a missing `reference` by falling
//! back to the command-line value.

use std::path::PathBuf;

use figment::Figment;
use figment::error::{Error as FigmentError, Kind as FigmentKind};
use figment::providers::{Env, Format, Toml};
use ortho_config::{OrthoConfig, OrthoError, load_and_merge_subcommand_for};

use crate::cli_args::GlobalArgs;
use crate::environment;
use crate::error::LensError;

/// File consulted when `LENS_CONFIG_PATH` is unset.
pub const DEFAULT_CONFIG_FILE: &str = ".lens.toml";

/// `LENS_CONFIG_PATH`, or `.lens.toml` in the working directory.
#[must_use]
pub fn config_path() -> PathBuf {
    environment::var("LENS_CONFIG_PATH")
        .ok()
        .filter(|p| !p.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
}

/// Load global options from the config file and environment, then let any
/// flag given on the command line win.
///
/// A missing file is not an error.
///
/// # Errors
///
/// Returns [`LensError::ConfigFile`] when the file cannot be parsed or a value
/// has the wrong type.
pub fn load_global(cli: GlobalArgs) -> Result<GlobalArgs, LensError> {
    let mut merged: GlobalArgs = Figment::new()
        .merge(Toml::file(config_path()))
        .merge(Env::prefixed("LENS_").ignore(&["CONFIG_PATH"]))
        .extract()
        .map_err(Box::new)?;
    merged.merge(cli);
    Ok(merged)
}

fn missing_reference(err: &FigmentError) -> bool {
    // FigmentError yields its causes only by value; clone to inspect without ownership.
    err.clone()
        .into_iter()
        .any(|e| matches!(e.kind, FigmentKind::MissingField(ref f) if f == "reference"))
}

/// Load configuration for a set of sub-command arguments, falling back when
/// `reference` is omitted.
///
/// # Errors
///
/// Returns an [`OrthoError`] if configuration gathering fails for reasons other
/// than a missing reference field.
#[expect(
    clippy::result_large_err,
    reason = "configuration loading errors can be verbose"
)]
pub fn load_with_reference_fallback<T>(cli_args: T) -> Result<T, OrthoError>
where
    T: OrthoConfig + serde::Serialize + Default + clap::CommandFactory + Clone,
{
    match load_and_merge_subcommand_for::<T>(&cli_args) {
        Ok(v) => Ok(v),
        Err(OrthoError::Gathering(e)) if missing_reference(&e) => Ok(cli_args),
        Err(e) => Err(e),
    }
}
