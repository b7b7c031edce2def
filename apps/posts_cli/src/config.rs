use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "posts.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub default_user_id: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://jsonplaceholder.typicode.com".into(),
            request_timeout_secs: 30,
            default_user_id: 1,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then the config file, then environment overrides.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let path = resolve_config_path(config_path, Path::new(DEFAULT_CONFIG_FILE));
    load_settings_from(path.as_deref(), &env)
}

/// An explicit path always wins; otherwise the default file is used only if it exists.
pub fn resolve_config_path(explicit: Option<&Path>, default_path: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None if default_path.exists() => Some(default_path.to_path_buf()),
        None => None,
    }
}

/// Applies `env` over the file at `config_path`, or over the defaults when there is none.
pub fn load_settings_from(
    config_path: Option<&Path>,
    env: &HashMap<String, String>,
) -> anyhow::Result<Settings> {
    let mut settings = match config_path {
        Some(path) => read_settings_file(path)?,
        None => Settings::default(),
    };

    if let Some(v) = env.get("POSTS_API_URL") {
        settings.api_base_url = v.clone();
    }
    if let Some(v) = env.get("APP__API_BASE_URL") {
        settings.api_base_url = v.clone();
    }

    if let Some(v) = env.get("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => tracing::warn!("ignoring non-numeric APP__REQUEST_TIMEOUT_SECS={v}"),
        }
    }
    if let Some(v) = env.get("APP__DEFAULT_USER_ID") {
        match v.parse::<i64>() {
            Ok(parsed) => settings.default_user_id = parsed,
            Err(_) => tracing::warn!("ignoring non-numeric APP__DEFAULT_USER_ID={v}"),
        }
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config file '{}'", path.display()))
}

pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Settings::default().api_base_url);
    }

    let url = Url::parse(raw).with_context(|| format!("invalid API base url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("API base url '{raw}' must use http or https");
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
