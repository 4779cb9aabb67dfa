//! Boot script template sets
//!
//! A [`TemplateSet`] is one immutable snapshot of every dynamic boot
//! script template found under the data directory, with per-environment
//! overrides: a template at `env_overrides/<env>/ipxe/install.slc`
//! shadows `ipxe/install.slc` when rendering for that environment.
//!
//! Hot reload builds a whole new set and swaps it in; a published set is
//! never mutated, so concurrent renders always see a consistent view.

pub mod error;
mod set;

pub use error::{Result, TemplateError};
pub use set::{discover_environments, TemplateSet};
