//! Config file discovery and command-line overrides.

use std::path::{Path, PathBuf};

use regcheck_recon::CheckConfig;

use crate::CliError;

pub const CONFIG_ENV: &str = "REGCHECK_CONFIG";

/// Values from flags that win over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub skip_days: Option<u32>,
    pub save_every: Option<usize>,
}

/// `<config dir>/regcheck/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("regcheck").join("config.toml"))
}

/// Resolve the config path. `explicit` already folds in `REGCHECK_CONFIG`
/// (clap reads the env var for the flag).
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(CliError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }
    match default_config_path() {
        Some(path) if path.is_file() => Ok(path),
        Some(path) => Err(CliError::config(format!(
            "no config file at {}",
            path.display()
        ))
        .with_hint(format!("pass --config or set {CONFIG_ENV}"))),
        None => Err(CliError::config("no config directory on this platform")
            .with_hint(format!("pass --config or set {CONFIG_ENV}"))),
    }
}

/// Load, validate and apply overrides.
pub fn load(explicit: Option<&Path>, overrides: Overrides) -> Result<CheckConfig, CliError> {
    let path = resolve_path(explicit)?;
    let mut config = read(&path)?;
    apply(&mut config, overrides);
    Ok(config)
}

/// Like [`load`], but a missing config falls back to defaults. Used by
/// commands that need no sheet layouts.
pub fn load_or_default(explicit: Option<&Path>) -> Result<CheckConfig, CliError> {
    match resolve_path(explicit) {
        Ok(path) => read(&path),
        Err(_) if explicit.is_none() => Ok(CheckConfig::default()),
        Err(e) => Err(e),
    }
}

fn read(path: &Path) -> Result<CheckConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::config(format!("{}: {e}", path.display())))?;
    let config = CheckConfig::from_toml(&text)
        .map_err(|e| CliError::config(format!("{}: {e}", path.display())))?;

    for (name, settings) in &config.registries {
        if let Some(base) = &settings.base_url {
            url::Url::parse(base).map_err(|e| {
                CliError::config(format!("[registries.{name}] base_url {base:?}: {e}"))
            })?;
        }
    }

    tracing::debug!(path = %path.display(), sheets = config.sheets.len(), "loaded config");
    Ok(config)
}

fn apply(config: &mut CheckConfig, overrides: Overrides) {
    if let Some(days) = overrides.skip_days {
        config.skip_days = days;
    }
    if let Some(every) = overrides.save_every {
        config.numrec_before_save = every;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::EXIT_CONFIG;
    use std::io::Write;

    fn config_file(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_flags_override_file() {
        let f = config_file("skip_days = 30\nnumrec_before_save = 50\n");
        let config = load(
            Some(f.path()),
            Overrides {
                skip_days: Some(0),
                save_every: None,
            },
        )
        .unwrap();
        assert_eq!(config.skip_days, 0);
        assert_eq!(config.numrec_before_save, 50);
    }

    #[test]
    fn test_missing_explicit_path_is_config_error() {
        let err = load(Some(Path::new("/nonexistent/regcheck.toml")), Overrides::default())
            .unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG);
        assert!(load_or_default(Some(Path::new("/nonexistent/regcheck.toml"))).is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let f = config_file("[sheets_config.qbcc]\nstatus_index = 1\nlast_checked_index = 1\n");
        let err = load(Some(f.path()), Overrides::default()).unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG);
        assert!(err.message.contains("are both 1"), "{}", err.message);
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let f = config_file("[registries.surveyors]\nbase_url = \"not a url\"\n");
        let err = load(Some(f.path()), Overrides::default()).unwrap_err();
        assert_eq!(err.code, EXIT_CONFIG);
        assert!(err.message.contains("registries.surveyors"));
    }
}
