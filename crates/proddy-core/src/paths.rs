//! Standard paths used by Proddy

use std::path::PathBuf;

/// Standard Proddy paths
pub struct Paths {
    /// Data directory (~/.local/share/proddy)
    pub data: PathBuf,
    /// Config directory (~/.config/proddy)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let data = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("proddy");

        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("proddy");

        Self { data, config }
    }

    /// Path of the main configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.json")
    }
}
