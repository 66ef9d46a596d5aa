// Configuration management for Ocarina
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::Bitrate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub ingest: IngestConfig,
    pub player: PlayerConfig,
}

/// The hosted data store the player reads the catalog from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub anon_key: String,
}

/// The ingest API the admin console talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub api_url: String,
    pub admin_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Preferred stream tier, in wire form ("64k" or "128k").
    pub default_bitrate: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                url: "https://your-project.supabase.co".to_string(),
                anon_key: "your-anon-key".to_string(),
            },
            ingest: IngestConfig {
                api_url: "http://localhost:5000".to_string(),
                admin_key: "your-secret-admin-key".to_string(),
            },
            player: PlayerConfig {
                default_bitrate: Bitrate::Kbps64.wire().to_string(),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("ocarina");

        Ok(config_dir.join("config.toml"))
    }

    /// Parsed form of `player.default_bitrate`; unknown strings fall back
    /// to the standard default tier.
    pub fn default_bitrate(&self) -> Bitrate {
        Bitrate::from_wire(&self.player.default_bitrate).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocarina").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.ingest.api_url, "http://localhost:5000");
        assert_eq!(config.default_bitrate(), Bitrate::Kbps64);
    }

    #[test]
    fn round_trips_edited_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.store.url = "https://catalog.example.com".to_string();
        config.player.default_bitrate = "128k".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.store.url, "https://catalog.example.com");
        assert_eq!(loaded.default_bitrate(), Bitrate::Kbps128);
    }

    #[test]
    fn unknown_bitrate_string_falls_back_to_default() {
        let mut config = Config::default();
        config.player.default_bitrate = "320k".to_string();
        assert_eq!(config.default_bitrate(), Bitrate::Kbps64);
    }
}
