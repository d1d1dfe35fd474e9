use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{catalog::Catalog, domain::IdPolicy, error::SettingsError};

pub const DEFAULT_SETTINGS_FILE: &str = "issue_logger.toml";
const ENV_PREFIX: &str = "ISSUE_LOGGER__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub live_log_path: PathBuf,
    pub direct_log_path: PathBuf,
    pub brightness: u8,
    pub id_policy: IdPolicy,
    pub catalog_path: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            live_log_path: "IssueLog.csv".into(),
            direct_log_path: "DirectIssueLog.csv".into(),
            brightness: 100,
            id_policy: IdPolicy::Sequential,
            catalog_path: None,
            poll_interval_ms: 100,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    live_log_path: Option<PathBuf>,
    direct_log_path: Option<PathBuf>,
    brightness: Option<u16>,
    id_policy: Option<IdPolicy>,
    catalog_path: Option<PathBuf>,
    poll_interval_ms: Option<u64>,
    log_filter: Option<String>,
}

impl Settings {
    /// Catalog named by `catalog_path`, or the built-in layout.
    pub fn catalog(&self) -> Result<Catalog, crate::error::CatalogError> {
        match &self.catalog_path {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

/// Defaults, overlaid by `issue_logger.toml` (or `path`) and then by
/// `ISSUE_LOGGER__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let file_path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    match fs::read_to_string(file_path) {
        Ok(raw) => {
            let file_cfg: FileSettings =
                toml::from_str(&raw).map_err(|source| SettingsError::Parse {
                    path: file_path.to_path_buf(),
                    source,
                })?;
            apply_file(&mut settings, file_cfg);
        }
        // an absent default file just means "use defaults"; an explicit path must exist
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && path.is_none() => {}
        Err(source) => {
            return Err(SettingsError::Read {
                path: file_path.to_path_buf(),
                source,
            })
        }
    }

    apply_env(&mut settings, env)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.live_log_path {
        settings.live_log_path = v;
    }
    if let Some(v) = file_cfg.direct_log_path {
        settings.direct_log_path = v;
    }
    if let Some(v) = file_cfg.brightness {
        settings.brightness = clamp_brightness(v.into());
    }
    if let Some(v) = file_cfg.id_policy {
        settings.id_policy = v;
    }
    if let Some(v) = file_cfg.catalog_path {
        settings.catalog_path = Some(v);
    }
    if let Some(v) = file_cfg.poll_interval_ms {
        settings.poll_interval_ms = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
}

fn apply_env(
    settings: &mut Settings,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), SettingsError> {
    let var = |name: &str| env(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.trim().is_empty());

    if let Some(v) = var("LIVE_LOG_PATH") {
        settings.live_log_path = v.into();
    }
    if let Some(v) = var("DIRECT_LOG_PATH") {
        settings.direct_log_path = v.into();
    }
    if let Some(v) = var("BRIGHTNESS") {
        let parsed = v
            .trim()
            .parse::<u64>()
            .map_err(|err| invalid("BRIGHTNESS", err.to_string()))?;
        settings.brightness = clamp_brightness(parsed);
    }
    if let Some(v) = var("ID_POLICY") {
        settings.id_policy = v
            .parse()
            .map_err(|message| invalid("ID_POLICY", message))?;
    }
    if let Some(v) = var("CATALOG_PATH") {
        settings.catalog_path = Some(v.into());
    }
    if let Some(v) = var("POLL_INTERVAL_MS") {
        settings.poll_interval_ms = v
            .trim()
            .parse()
            .map_err(|err: std::num::ParseIntError| invalid("POLL_INTERVAL_MS", err.to_string()))?;
    }
    if let Some(v) = var("LOG_FILTER") {
        settings.log_filter = v;
    }

    Ok(())
}

fn invalid(key: &str, message: String) -> SettingsError {
    SettingsError::InvalidValue {
        key: format!("{ENV_PREFIX}{key}"),
        message,
    }
}

fn clamp_brightness(raw: u64) -> u8 {
    raw.min(100) as u8
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
