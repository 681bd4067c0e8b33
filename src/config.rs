use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Crs;
use crate::pip::DEFAULT_NAME_COLUMN;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub boundaries: BoundaryConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoundaryConfig {
    pub path: Option<PathBuf>,
    pub name_column: String,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            path: None,
            name_column: DEFAULT_NAME_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MatchingConfig {
    /// Metric system for the nearest-region fallback
    pub planar_crs: Crs,
    /// Scan the catalog on the rayon pool
    pub parallel: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            planar_crs: Crs::WebMercator,
            parallel: true,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.boundaries.path.is_none());
        assert_eq!(config.boundaries.name_column, "properties.name");
        assert_eq!(config.matching.planar_crs, Crs::WebMercator);
        assert!(config.matching.parallel);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[boundaries]
path = "data/city_boundaries.csv"
name_column = "name"

[matching]
planar_crs = "EPSG:3857"
parallel = false
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(
            config.boundaries.path.as_deref(),
            Some(Path::new("data/city_boundaries.csv"))
        );
        assert_eq!(config.boundaries.name_column, "name");
        assert!(!config.matching.parallel);
    }

    #[test]
    fn test_rejects_unknown_crs() {
        let parsed: std::result::Result<Config, _> =
            toml::from_str("[matching]\nplanar_crs = \"EPSG:9999\"\n");
        assert!(parsed.is_err());
    }
}
