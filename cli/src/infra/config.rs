//! YAML configuration loader: base file plus `nest.yaml.d/` drop-ins.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::domain::config::{NestConfig, merge_values, validate_config};

/// Environment variable overriding the base configuration path.
pub const CONFIG_VARIABLE: &str = "NEST_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nest/nest.yaml";

/// Loads `NestConfig` from disk. Missing files mean defaults.
pub struct YamlConfigLoader {
    path: PathBuf,
}

impl YamlConfigLoader {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loader for `$NEST_CONFIG`, or the system path when unset.
    #[must_use]
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_VARIABLE)
            .filter(|v| !v.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        Self::new(path)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory of drop-ins next to the base file, e.g. `nest.yaml.d/`.
    #[must_use]
    pub fn drop_in_dir(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".d");
        self.path.with_file_name(name)
    }

    /// Read, merge and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed, or if
    /// the merged result fails validation.
    pub fn load(&self) -> Result<NestConfig> {
        let mut merged = serde_yaml::to_value(NestConfig::default())
            .context("cannot serialize default config")?;
        for file in self.sources()? {
            debug!(path = %file.display(), "loading config");
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let overlay: serde_yaml::Value = serde_yaml::from_str(&content)
                .with_context(|| format!("cannot parse {}", file.display()))?;
            merge_values(&mut merged, overlay);
        }
        let config: NestConfig = serde_yaml::from_value(merged)
            .with_context(|| format!("invalid configuration in {}", self.path.display()))?;
        validate_config(&config)?;
        Ok(config)
    }

    fn sources(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.path.is_file() {
            files.push(self.path.clone());
        }
        let dir = self.drop_in_dir();
        if dir.is_dir() {
            let mut drop_ins = std::fs::read_dir(&dir)
                .with_context(|| format!("cannot list {}", dir.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .is_some_and(|ext| ext == "yaml" || ext == "yml")
                })
                .collect::<Vec<_>>();
            drop_ins.sort();
            files.extend(drop_ins);
        }
        Ok(files)
    }
}
