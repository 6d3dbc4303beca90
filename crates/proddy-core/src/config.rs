//! Configuration management for Proddy

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Length of a work period when nothing else is configured
pub const DEFAULT_WORK_MINUTES: u32 = 25;

/// Length of a break when nothing else is configured
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Global Proddy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Work period length (minutes)
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,

    /// Break length (minutes)
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,

    /// Whether timer completions are announced to the user
    #[serde(default = "default_notifications_enabled")]
    pub notifications_enabled: bool,
}

fn default_work_minutes() -> u32 {
    DEFAULT_WORK_MINUTES
}

fn default_break_minutes() -> u32 {
    DEFAULT_BREAK_MINUTES
}

fn default_notifications_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            notifications_enabled: default_notifications_enabled(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;

        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// Reject values the timer engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.work_minutes == 0 {
            bail!("work_minutes must be at least 1");
        }
        if self.break_minutes == 0 {
            bail!("break_minutes must be at least 1");
        }
        Ok(())
    }

    pub fn work_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.work_minutes) * 60)
    }

    pub fn break_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.break_minutes) * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let tmp = TempDir::new()?;
        let config = Config::load(&tmp.path().join("config.json"))?;
        assert_eq!(config, Config::default());
        assert_eq!(config.work_minutes, 25);
        assert_eq!(config.break_minutes, 5);
        assert!(config.notifications_enabled);
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "break_minutes": 10 }"#)?;

        let config = Config::load(&path)?;
        assert_eq!(config.work_minutes, 25);
        assert_eq!(config.break_minutes, 10);
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("nested").join("config.json");
        let config = Config {
            work_minutes: 50,
            break_minutes: 10,
            notifications_enabled: false,
        };
        config.save(&path)?;

        assert_eq!(Config::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_zero_minutes_rejected() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "work_minutes": 0 }"#)?;

        assert!(Config::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.work_duration(), Duration::from_secs(25 * 60));
        assert_eq!(config.break_duration(), Duration::from_secs(5 * 60));
    }
}
