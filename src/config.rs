use crate::error::{LoadError, LoadResult};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Env var pointing at an optional YAML config file.
pub const CONFIG_ENV: &str = "OLIST_LOADER_CONFIG";

/// Everything the loader needs to know about where data comes from and goes to.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// DuckDB database file, or `:memory:`.
    pub database: String,
    /// Destination schema namespace holding the four tables.
    pub schema: String,
    /// Directory holding the source CSVs. Relative paths are resolved
    /// against the directory of the running executable.
    pub csv_dir: PathBuf,
    pub batch_size: usize,
    /// Statements never bind this many values or more.
    pub max_bind_parameters: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            database: "olist.duckdb".into(),
            schema: "olist".into(),
            csv_dir: PathBuf::from("data/raw/olist"),
            batch_size: 10_000,
            max_bind_parameters: 2_100,
        }
    }
}

impl LoaderConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let cfg: LoaderConfig = serde_yaml::from_str(&text)
            .map_err(|e| LoadError::Config(format!("{}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read the file named by `OLIST_LOADER_CONFIG`, or fall back to defaults.
    pub fn from_env() -> LoadResult<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_yaml_file(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> LoadResult<()> {
        if self.batch_size == 0 {
            return Err(LoadError::Config("batch_size must be at least 1".into()));
        }
        if self.max_bind_parameters < 2 {
            return Err(LoadError::Config(
                "max_bind_parameters must be at least 2".into(),
            ));
        }
        Ok(())
    }

    pub fn resolved_csv_dir(&self) -> LoadResult<PathBuf> {
        if self.csv_dir.is_absolute() {
            return Ok(self.csv_dir.clone());
        }
        let exe = env::current_exe()?;
        let base = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(base.join(&self.csv_dir))
    }
}
