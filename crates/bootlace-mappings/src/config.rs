//! Raw mappings file format
//!
//! The on-disk YAML document: top-level `networkMaps` and `hostnameMaps`
//! lists, each entry pairing a matcher with a script descriptor. These
//! types carry the configuration exactly as written; compilation into
//! matchable bindings happens in [`crate::bindings`].

use crate::error::{MappingError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// The uncompiled mappings document as read from disk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMappings {
    #[serde(default)]
    pub network_maps: Vec<RawNetworkMap>,
    #[serde(default)]
    pub hostname_maps: Vec<RawHostnameMap>,
}

/// A network rule: CIDR string plus script descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct RawNetworkMap {
    pub network: String,
    pub script: RawScript,
}

/// A hostname rule: regular-expression string plus script descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct RawHostnameMap {
    pub hostname: String,
    pub script: RawScript,
}

/// Script descriptor shared by both rule kinds
#[derive(Debug, Clone, Deserialize)]
pub struct RawScript {
    pub name: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

impl RawMappings {
    /// Read and parse the mappings file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&raw)?)
    }
}
