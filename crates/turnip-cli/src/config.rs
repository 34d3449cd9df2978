//! CLI configuration

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use turnip_resolve::ResolverConfig;

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".turnip")
}

/// Location of `config.toml`
pub fn config_file_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

fn default_graph() -> String {
    "default".to_string()
}

/// Where graph snapshots are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One redb database holding every graph
    #[default]
    Redb,
    /// One pretty-printed JSON file per graph
    Json,
}

impl FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Unknown storage '{}' (expected redb or json)", other),
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redb => f.write_str("redb"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Configuration for the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_graph")]
    pub default_graph: String,

    #[serde(default)]
    pub storage: StorageKind,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_graph: default_graph(),
            storage: StorageKind::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl Config {
    /// Read the config file, falling back to defaults when it is missing or
    /// unreadable
    pub fn load() -> Self {
        let path = config_file_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match Self::parse(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring invalid config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        check_threshold(config.resolver.fuzzy_threshold)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_file_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        &[
            "data_dir",
            "default_graph",
            "storage",
            "resolver.fuzzy_enabled",
            "resolver.fuzzy_threshold",
            "resolver.type_scoped",
            "resolver.min_fuzzy_len",
        ]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "data_dir" => self.data_dir.display().to_string(),
            "default_graph" => self.default_graph.clone(),
            "storage" => self.storage.to_string(),
            "resolver.fuzzy_enabled" => self.resolver.fuzzy_enabled.to_string(),
            "resolver.fuzzy_threshold" => self.resolver.fuzzy_threshold.to_string(),
            "resolver.type_scoped" => self.resolver.type_scoped.to_string(),
            "resolver.min_fuzzy_len" => self.resolver.min_fuzzy_len.to_string(),
            _ => return None,
        };
        Some(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "default_graph" => {
                let name = value.trim();
                if name.is_empty() || name.contains(['/', '\\']) {
                    anyhow::bail!("Invalid graph name: '{}'", value);
                }
                self.default_graph = name.to_string();
            }
            "storage" => self.storage = value.parse()?,
            "resolver.fuzzy_enabled" => self.resolver.fuzzy_enabled = value.parse()?,
            "resolver.fuzzy_threshold" => {
                let threshold: f64 = value.parse()?;
                check_threshold(threshold)?;
                self.resolver.fuzzy_threshold = threshold;
            }
            "resolver.type_scoped" => self.resolver.type_scoped = value.parse()?,
            "resolver.min_fuzzy_len" => self.resolver.min_fuzzy_len = value.parse()?,
            _ => anyhow::bail!(
                "No such setting '{}'; turnip knows: {}",
                key,
                Self::keys().join(", ")
            ),
        }
        Ok(())
    }

    /// Put one key back to its built-in default; returns the restored value
    pub fn reset(&mut self, key: &str) -> anyhow::Result<String> {
        let default = Self::default()
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("No such setting '{}'", key))?;
        self.set(key, &default)?;
        Ok(default)
    }
}

/// Range check on the fuzzy threshold; NaN is out of range
fn check_threshold(threshold: f64) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!(
            "resolver.fuzzy_threshold must be a number from 0 to 1, got {}",
            threshold
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse(
            r#"
default_graph = "work"

[resolver]
fuzzy_threshold = 0.9
"#,
        )
        .unwrap();

        assert_eq!(config.default_graph, "work");
        assert_eq!(config.storage, StorageKind::Redb);
        assert_eq!(config.resolver.fuzzy_threshold, 0.9);
        assert!(config.resolver.fuzzy_enabled);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.set("storage", "json").unwrap();
        config.set("resolver.min_fuzzy_len", "4").unwrap();

        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_get_and_set() {
        let mut config = Config::default();
        for key in Config::keys() {
            assert!(config.get(key).is_some(), "missing getter for {}", key);
        }

        config.set("default_graph", "notes").unwrap();
        assert_eq!(config.get("default_graph").as_deref(), Some("notes"));
        config.set("resolver.fuzzy_enabled", "false").unwrap();
        assert_eq!(config.get("resolver.fuzzy_enabled").as_deref(), Some("false"));

        assert!(config.set("resolver.fuzzy_threshold", "1.5").is_err());
        assert!(config.set("storage", "sqlite").is_err());
        assert!(config.set("default_graph", "../etc").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert!(config.get("colour").is_none());
    }

    #[test]
    fn test_nan_threshold_is_rejected() {
        let mut config = Config::default();
        assert!(config.set("resolver.fuzzy_threshold", "NaN").is_err());
        assert_eq!(config.resolver.fuzzy_threshold, 0.85);

        let err = Config::parse("[resolver]\nfuzzy_threshold = nan\n").unwrap_err();
        assert!(err.to_string().contains("resolver.fuzzy_threshold"));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut config = Config::default();
        config.set("storage", "json").unwrap();
        assert_eq!(config.reset("storage").unwrap(), "redb");
        assert_eq!(config.storage, StorageKind::Redb);
        assert!(config.reset("colour").is_err());
    }
}
