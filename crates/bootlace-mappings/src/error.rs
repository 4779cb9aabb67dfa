//! Error types for mapping configuration handling

use std::path::PathBuf;
use thiserror::Error;

/// Error type for reading and compiling the mappings file
#[derive(Debug, Error)]
pub enum MappingError {
    /// Failed to read the mappings file
    #[error("failed to read mappings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The mappings file is not a valid YAML document
    #[error("failed to parse mappings file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A network rule carries an unparsable CIDR
    #[error("network rule {index} ({network:?}): invalid CIDR: {source}")]
    InvalidCidr {
        index: usize,
        network: String,
        #[source]
        source: ipnetwork::IpNetworkError,
    },

    /// A hostname rule carries an unparsable pattern
    #[error("hostname rule {index} ({pattern:?}): invalid pattern: {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, MappingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MappingError::InvalidCidr {
            index: 2,
            network: "10.0.0.0/99".to_string(),
            source: "10.0.0.0/99".parse::<ipnetwork::IpNetwork>().unwrap_err(),
        };
        let msg = err.to_string();
        assert!(msg.contains("network rule 2"));
        assert!(msg.contains("10.0.0.0/99"));

        let err = MappingError::Io {
            path: PathBuf::from("/nonexistent/mappings.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("/nonexistent/mappings.yaml"));
    }
}
