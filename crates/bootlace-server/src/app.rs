//! Composition root
//!
//! [`App`] owns the boot-state registry and the atomically swappable
//! mapping/template snapshots. Readers grab an `Arc` snapshot and never
//! lock; only the hot-reload coordinator publishes replacements, and a
//! failed reload leaves the previous snapshot in place.

use crate::config::ServerConfig;
use anyhow::Context;
use arc_swap::ArcSwap;
use bootlace_mappings::{BindingSet, MappingError, RawMappings, Script};
use bootlace_registry::Registry;
use bootlace_templates::{discover_environments, TemplateError, TemplateSet};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::info;

pub struct App {
    config: ServerConfig,
    pub registry: Arc<Registry>,
    bindings: ArcSwap<BindingSet>,
    templates: ArcSwap<TemplateSet>,
    environments: Vec<String>,
}

impl App {
    /// Build the initial state from disk.
    ///
    /// Any compile or parse failure here is fatal: the service must not
    /// start without a working configuration.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let environments = discover_environments(&config.data_dir.join(&config.env_dir));
        info!(environments = ?environments, "environment overrides found");

        let raw = RawMappings::from_file(config.mappings_path())
            .context("reading mappings file")?;
        let bindings = BindingSet::compile(&raw).context("compiling mappings")?;
        info!(
            networks = bindings.network_bindings().len(),
            hostnames = bindings.hostname_bindings().len(),
            "mappings compiled"
        );

        let templates = TemplateSet::parse(
            &config.data_dir,
            &config.env_dir,
            &environments,
            &config.template_extension,
        )
        .context("parsing templates")?;
        info!(templates = templates.len(), "templates parsed");

        Ok(Self {
            config,
            registry: Arc::new(Registry::new()),
            bindings: ArcSwap::from_pointee(bindings),
            templates: ArcSwap::from_pointee(templates),
            environments,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Environment names derived at startup
    pub fn environments(&self) -> &[String] {
        &self.environments
    }

    /// Current binding snapshot. A caller keeps resolving against the
    /// returned set even if a reload publishes a replacement meanwhile.
    pub fn bindings(&self) -> Arc<BindingSet> {
        self.bindings.load_full()
    }

    /// Current template snapshot
    pub fn templates(&self) -> Arc<TemplateSet> {
        self.templates.load_full()
    }

    /// Resolve a client to its boot script, network bindings first
    pub fn resolve(&self, ip: Option<IpAddr>, hostname: Option<&str>) -> Option<Script> {
        self.bindings.load().resolve(ip, hostname).cloned()
    }

    /// Recompile the mappings file and publish the result atomically.
    /// On failure the previously published set stays in place.
    pub fn reload_mappings(&self) -> Result<(), MappingError> {
        let raw = RawMappings::from_file(self.config.mappings_path())?;
        let compiled = BindingSet::compile(&raw)?;
        info!(
            networks = compiled.network_bindings().len(),
            hostnames = compiled.hostname_bindings().len(),
            "mappings recompiled"
        );
        self.bindings.store(Arc::new(compiled));
        Ok(())
    }

    /// Re-parse templates with the startup environment list and publish
    /// atomically. On failure the previous set stays in place.
    pub fn reload_templates(&self) -> Result<(), TemplateError> {
        let parsed = TemplateSet::parse(
            &self.config.data_dir,
            &self.config.env_dir,
            &self.environments,
            &self.config.template_extension,
        )?;
        info!(templates = parsed.len(), "templates reparsed");
        self.templates.store(Arc::new(parsed));
        Ok(())
    }
}
