use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::registry::Registry;

const ENV_PREFIX: &str = "README_STATS";

/// Database locations. Defaults are overridden by `README_STATS_NPM_DB` and
/// `README_STATS_PYPI_DB`.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub npm_db: PathBuf,
    pub pypi_db: PathBuf,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("npm_db", "npm_packages.db")?
            .set_default("pypi_db", "pypi_packages.db")?
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn db_path(&self, registry: Registry) -> &Path {
        match registry {
            Registry::Npm => &self.npm_db,
            Registry::Pypi => &self.pypi_db,
        }
    }
}
