//! Mapping configuration compiler
//!
//! Parses the declarative mappings file into compiled, matchable boot
//! script bindings. Network rules match clients by CIDR membership,
//! hostname rules by regular expression; each rule carries the script to
//! serve plus its target environment and parameters.
//!
//! Compilation is all-or-nothing: a single malformed CIDR or pattern
//! fails the whole compile, so a half-built rule set is never published.
//!
//! # Example
//!
//! ```
//! use bootlace_mappings::{BindingSet, RawMappings};
//!
//! let raw: RawMappings = serde_yaml::from_str(
//!     r#"
//! networkMaps:
//!   - network: 10.0.0.0/24
//!     script:
//!       name: ipxe/installer
//! "#,
//! )
//! .unwrap();
//!
//! let bindings = BindingSet::compile(&raw).unwrap();
//! assert_eq!(bindings.network_bindings().len(), 1);
//! ```

pub mod bindings;
pub mod config;
pub mod error;

pub use bindings::{BindingSet, HostnameBinding, NetworkBinding, Script};
pub use config::{RawHostnameMap, RawMappings, RawNetworkMap, RawScript};
pub use error::{MappingError, Result};
