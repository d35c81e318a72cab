//! Settings loading for the CLI.
//!
//! Precedence, lowest first: built-in defaults, the JSON file, then
//! `DEPKIT_*` environment variables (including those loaded from `.env`).

use std::path::Path;

use depkit_core::{ProvisionSettings, SettingsError, validate_settings};
use tracing::debug;

/// Load settings from `path` and the process environment.
pub fn load_settings(path: Option<&Path>) -> Result<ProvisionSettings, SettingsError> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// Load settings from `path` and an arbitrary variable lookup.
pub fn load_settings_with<F>(path: Option<&Path>, lookup: F) -> Result<ProvisionSettings, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading settings file");
            ProvisionSettings::from_file(path)?
        }
        None => ProvisionSettings::default(),
    };
    settings.apply_env_overrides(lookup)?;
    validate_settings(&settings)?;
    Ok(settings)
}
