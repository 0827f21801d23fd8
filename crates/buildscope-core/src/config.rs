//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys come from double underscores, so `APP_ENGINE__MAX_BASETYPES=4`
//! overrides `engine.max_basetypes`.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Tunables of the aggregation engine, read from the `[engine]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub control_dimension: String,
    pub top_level_capacity: usize,
    pub max_basetypes: usize,
    pub blacklisted_basetypes: Vec<String>,
    pub default_selection_size: usize,
    pub display_limit: usize,
    pub fetch_concurrency: usize,
    pub max_message_bytes: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            control_dimension: "secondascendancy".to_string(),
            top_level_capacity: 100,
            max_basetypes: 6,
            blacklisted_basetypes: vec!["Spiked Gloves".to_string()],
            default_selection_size: 6,
            display_limit: 50,
            fetch_concurrency: 1,
            max_message_bytes: 64 * 1024 * 1024,
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> crate::error::Result<()> {
        let positive = [
            ("engine.top_level_capacity", self.top_level_capacity),
            ("engine.max_basetypes", self.max_basetypes),
            ("engine.fetch_concurrency", self.fetch_concurrency),
            ("engine.max_message_bytes", self.max_message_bytes),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(Error::InvalidConfig(format!("{key} must be greater than zero")));
        }
        if self.control_dimension.trim().is_empty() {
            return Err(Error::InvalidConfig("engine.control_dimension must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn is_blacklisted(&self, basetype: &str) -> bool {
        self.blacklisted_basetypes.iter().any(|b| b == basetype)
    }
}

pub struct Config {
    figment: Figment,
    base: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load `config.toml` and the environment overlay from `base`.
    pub fn load_from(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base: base.to_path_buf() };
        config.engine()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Engine settings, falling back to defaults when `[engine]` is absent.
    pub fn engine(&self) -> anyhow::Result<EngineSettings> {
        if self.figment.find_value("engine").is_err() {
            return Ok(EngineSettings::default());
        }
        self.get("engine")
    }

    /// A configured path resolved against the config base directory.
    pub fn path_or(&self, key: &str, default: &str) -> PathBuf {
        let raw: String = self.get(key).unwrap_or_else(|_| default.to_string());
        resolve_with_base(&self.base, raw)
    }

    pub fn fixtures_dir(&self) -> PathBuf {
        self.path_or("data.fixtures_dir", "./fixtures")
    }

    pub fn preferences_file(&self) -> PathBuf {
        self.path_or("data.preferences_file", "./preferences.json")
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
