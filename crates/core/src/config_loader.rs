use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";
pub const ENV_PREFIX: &str = "DIVERGENCE_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration rooted at `path`.
    ///
    /// Layers, later wins: built-in defaults, `path`, `<stem>.<profile>.toml`
    /// next to it, `DIVERGENCE_*` environment variables (nested keys separated
    /// by `__`, e.g. `DIVERGENCE_ANALYSIS__OSCILLATOR_WINDOW`). A JSON file with
    /// the same stem fills in keys not set by any other layer. Missing files
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the
    /// resulting pipeline parameters are invalid.
    pub fn load_from(path: impl AsRef<Path>, profile: Option<&str>) -> Result<AppConfig> {
        let path = path.as_ref();

        let mut figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(path));
        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(profile_path(path, profile)));
        }

        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file(path.with_extension("json")))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        config.analysis.validate()?;

        Ok(config)
    }
}

fn profile_path(path: &Path, profile: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Config");
    path.with_file_name(format!("{stem}.{profile}.toml"))
}
