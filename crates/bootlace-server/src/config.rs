//! Server configuration

use std::path::PathBuf;

/// Paths and naming conventions for the data directory.
///
/// Defaults mirror the conventional layout: a `mappings.yaml` at the
/// data-directory root, environment overrides under `env_overrides/`,
/// and dynamic boot script templates carrying the `.slc` extension.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Root of the data directory holding mappings and templates
    pub data_dir: PathBuf,
    /// Mappings file name, relative to the data directory
    pub mappings_file: String,
    /// Environment-overrides directory name, relative to the data directory
    pub env_dir: String,
    /// File extension of dynamic boot script templates
    pub template_extension: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            mappings_file: "mappings.yaml".to_string(),
            env_dir: "env_overrides".to_string(),
            template_extension: ".slc".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_mappings_file(mut self, name: impl Into<String>) -> Self {
        self.mappings_file = name.into();
        self
    }

    pub fn with_env_dir(mut self, name: impl Into<String>) -> Self {
        self.env_dir = name.into();
        self
    }

    pub fn with_template_extension(mut self, ext: impl Into<String>) -> Self {
        self.template_extension = ext.into();
        self
    }

    /// Path of the mappings file
    pub fn mappings_path(&self) -> PathBuf {
        self.data_dir.join(&self.mappings_file)
    }
}
