//! Error types for the boot-state registry

use thiserror::Error;

/// Error type for registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A registry lock was poisoned by a panicking holder
    #[error("registry lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
