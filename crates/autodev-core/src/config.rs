use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::env;
use std::path::{Path, PathBuf};

use crate::types::ConfigMap;

pub const KEY_AUTO_DEVICE_LIST: &str = "AUTO_DEVICE_LIST";
pub const KEY_PERF_COUNT: &str = "PERF_COUNT";
pub const AUTO_KEY_PREFIX: &str = "AUTO_";
pub const YES: &str = "YES";
pub const NO: &str = "NO";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_in(Path::new("."))
    }

    /// Same as [`Config::load`], resolving the TOML files against `base`.
    pub fn load_in(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The `[plugin]` table as AUTO plugin config. Keys are upper-cased since
    /// environment overrides arrive lower-cased.
    pub fn plugin_config(&self) -> anyhow::Result<ConfigMap> {
        if !self.figment.contains("plugin") {
            return Ok(ConfigMap::new());
        }
        let raw: ConfigMap = self.get("plugin")?;
        Ok(raw.into_iter().map(|(k, v)| (k.to_ascii_uppercase(), v)).collect())
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let plugin = self.plugin_config()?;
        if let Some(value) = plugin.get(KEY_PERF_COUNT) {
            if value != YES && value != NO {
                anyhow::bail!("[{}] plugin.{} must be {} or {}, got '{}'", env, KEY_PERF_COUNT, YES, NO, value);
            }
        }
        if matches!(env, "prod" | "production") && plugin.get(KEY_AUTO_DEVICE_LIST).is_some_and(|v| v.trim().is_empty()) {
            anyhow::bail!("[{}] plugin.{} is set but empty", env, KEY_AUTO_DEVICE_LIST);
        }
        Ok(())
    }
}

/// Overlay `local` on top of `base`; keys present in both take the local value.
pub fn merge_configs(mut base: ConfigMap, local: &ConfigMap) -> ConfigMap {
    for (k, v) in local {
        base.insert(k.clone(), v.clone());
    }
    base
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
