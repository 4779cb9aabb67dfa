//! Template set parsing and rendering

use crate::error::{Result, TemplateError};
use minijinja::Environment;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Discover environment-override names: every subdirectory of the
/// overrides directory counts as one environment. A missing or
/// unreadable directory yields an empty list, not an error.
pub fn discover_environments(overrides_root: &Path) -> Vec<String> {
    let mut environments = Vec::new();
    if let Ok(entries) = std::fs::read_dir(overrides_root) {
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                environments.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    environments.sort();
    environments
}

/// One immutable snapshot of the parsed boot script templates
#[derive(Debug)]
pub struct TemplateSet {
    env: Environment<'static>,
    names: Vec<String>,
}

impl TemplateSet {
    /// Walk the data directory and parse every template file into a new
    /// set.
    ///
    /// Default templates are keyed by their path relative to the data
    /// directory minus the extension (`ipxe/install`); files under
    /// `<overrides_dir>/<env>/` are keyed `<env>/ipxe/install`. Files
    /// under the overrides directory whose environment is not in
    /// `environments` are skipped.
    ///
    /// All-or-nothing: an unreadable file or a syntax error fails the
    /// whole parse, so a half-built set is never published.
    pub fn parse(
        data_dir: &Path,
        overrides_dir: &str,
        environments: &[String],
        extension: &str,
    ) -> Result<Self> {
        let overrides_root = data_dir.join(overrides_dir);
        let mut env = Environment::new();
        let mut names = Vec::new();

        for entry in WalkDir::new(data_dir).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !entry.file_name().to_string_lossy().ends_with(extension) {
                continue;
            }

            let name = if let Ok(rel) = path.strip_prefix(&overrides_root) {
                // First component of the relative path is the environment
                let rel = template_name(rel, extension);
                match rel.split_once('/') {
                    Some((envname, _)) if environments.iter().any(|e| e == envname) => rel,
                    _ => {
                        debug!(path = %path.display(), "skipping template outside known environments");
                        continue;
                    }
                }
            } else {
                let rel = path.strip_prefix(data_dir).unwrap_or(path);
                template_name(rel, extension)
            };

            let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            env.add_template_owned(name.clone(), source)
                .map_err(TemplateError::Syntax)?;
            debug!(template = %name, "template parsed");
            names.push(name);
        }

        names.sort();
        Ok(Self { env, names })
    }

    /// Render a template by name with the given parameters.
    ///
    /// When an environment is given and an override for it exists, the
    /// override is rendered; otherwise the default template. A name
    /// with no template in either place is [`TemplateError::NotFound`].
    pub fn render(
        &self,
        name: &str,
        environment: Option<&str>,
        params: &HashMap<String, Value>,
    ) -> Result<String> {
        let template = match environment.filter(|e| !e.is_empty()) {
            Some(envname) => {
                let candidate = format!("{envname}/{name}");
                self.env
                    .get_template(&candidate)
                    .or_else(|_| self.env.get_template(name))
            }
            None => self.env.get_template(name),
        }
        .map_err(|_| TemplateError::NotFound(name.to_string()))?;

        template.render(params).map_err(TemplateError::Render)
    }

    /// Template names in this set, sorted
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Relative path to a template key: separators normalized, extension cut
fn template_name(rel: &Path, extension: &str) -> String {
    let name = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    name.strip_suffix(extension).unwrap_or(&name).to_string()
}
