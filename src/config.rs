//! Layered settings: built-in defaults, then an optional TOML file, then
//! `PRISM_*` environment variables. CLI flags are applied on top by the
//! commands that take them.

use crate::error::Result;
use crate::processors::MissingRasterPolicy;
use crate::utils::constants::{DEFAULT_BASE_URL, DEFAULT_CATALOG_DATE_KEY, DEFAULT_CHECKPOINT_EVERY};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;
use validator::Validate;

pub const DEFAULT_CONFIG_FILE: &str = "prism.toml";
pub const ENV_PREFIX: &str = "PRISM";

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct Settings {
    #[validate(length(min = 1))]
    pub base_url: String,

    pub missing_raster_policy: MissingRasterPolicy,

    /// Dates between extraction checkpoints; 0 writes only at the end
    pub checkpoint_every: usize,

    #[validate(length(min = 6, max = 8))]
    pub catalog_date_key: String,

    /// Show terminal progress bars
    pub progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            missing_raster_policy: MissingRasterPolicy::Skip,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            catalog_date_key: DEFAULT_CATALOG_DATE_KEY.to_string(),
            progress: true,
        }
    }
}

impl Settings {
    /// Load settings from `path` (required when given) or from
    /// `prism.toml` in the working directory when it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Self::from_sources(file, Environment::with_prefix(ENV_PREFIX))
    }

    fn from_sources<S>(file: S, env: Environment) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Settings::default();
        let settings: Settings = Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("missing_raster_policy", defaults.missing_raster_policy.to_string())?
            .set_default("checkpoint_every", defaults.checkpoint_every as u64)?
            .set_default("catalog_date_key", defaults.catalog_date_key)?
            .set_default("progress", defaults.progress)?
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::from_sources(
            File::from(dir.path().join("absent.toml")).required(false),
            Environment::with_prefix("PRISM_TEST_UNSET"),
        )
        .unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prism.toml");
        fs::write(
            &path,
            "missing_raster_policy = \"abort\"\ncheckpoint_every = 10\nprogress = false\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.missing_raster_policy, MissingRasterPolicy::Abort);
        assert_eq!(settings.checkpoint_every, 10);
        assert!(!settings.progress);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prism.toml");
        fs::write(&path, "catalog_date_key = \"1981\"\n").unwrap();
        assert!(Settings::load(Some(&path)).is_err());

        fs::write(&path, "missing_raster_policy = \"retry\"\n").unwrap();
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        assert!(Settings::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
