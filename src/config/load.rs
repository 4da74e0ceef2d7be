use super::{default_global_config_path, ConfigError, Settings};
use std::path::Path;

/// Loads settings from `explicit_path`, or from the global config path when
/// none is given. A missing global file yields defaults; a missing explicit
/// file is an error. Environment overrides are applied before validation.
pub fn load_settings(explicit_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = match explicit_path {
        Some(path) => Settings::from_path(path)?,
        None => {
            let path = default_global_config_path()?;
            if path.is_file() {
                Settings::from_path(&path)?
            } else {
                Settings::default()
            }
        }
    };
    settings.apply_env_overrides()?;
    settings.validate()?;
    Ok(settings)
}
