//! Compiled script bindings
//!
//! A `BindingSet` is the immutable product of one successful compile:
//! two ordered binding lists, matched first-entry-wins within each list.
//! Reload builds a brand-new set and swaps it in wholesale; a published
//! set is never mutated, so in-flight readers keep a consistent view.

use crate::config::{RawMappings, RawScript};
use crate::error::{MappingError, Result};
use ipnetwork::IpNetwork;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::net::IpAddr;

/// One boot-script invocation target
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub name: String,
    pub environment: String,
    pub params: HashMap<String, Value>,
}

impl Script {
    fn from_raw(raw: &RawScript) -> Self {
        // Fresh copy of the parameter map so a later edit of the source
        // configuration cannot leak into a published binding.
        let params = raw
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            name: raw.name.clone(),
            environment: raw.environment.clone(),
            params,
        }
    }
}

/// Matches a client by IP membership in a network prefix
#[derive(Debug, Clone)]
pub struct NetworkBinding {
    pub network: IpNetwork,
    pub script: Script,
}

/// Matches a client by hostname pattern
#[derive(Debug, Clone)]
pub struct HostnameBinding {
    pub pattern: Regex,
    pub script: Script,
}

/// The ordered bindings produced by one successful compile
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    network: Vec<NetworkBinding>,
    hostname: Vec<HostnameBinding>,
}

impl BindingSet {
    /// Compile a raw mappings document into a binding set.
    ///
    /// All-or-nothing: any invalid CIDR or hostname pattern fails the
    /// whole compile, identifying the offending rule. Source order is
    /// preserved in both lists because match resolution is
    /// first-entry-wins.
    pub fn compile(raw: &RawMappings) -> Result<Self> {
        let mut network = Vec::with_capacity(raw.network_maps.len());
        for (index, rule) in raw.network_maps.iter().enumerate() {
            let net: IpNetwork =
                rule.network
                    .parse()
                    .map_err(|source| MappingError::InvalidCidr {
                        index,
                        network: rule.network.clone(),
                        source,
                    })?;
            network.push(NetworkBinding {
                network: net,
                script: Script::from_raw(&rule.script),
            });
        }

        let mut hostname = Vec::with_capacity(raw.hostname_maps.len());
        for (index, rule) in raw.hostname_maps.iter().enumerate() {
            let pattern =
                Regex::new(&rule.hostname).map_err(|source| MappingError::InvalidPattern {
                    index,
                    pattern: rule.hostname.clone(),
                    source,
                })?;
            hostname.push(HostnameBinding {
                pattern,
                script: Script::from_raw(&rule.script),
            });
        }

        Ok(Self { network, hostname })
    }

    /// Network bindings in source order
    pub fn network_bindings(&self) -> &[NetworkBinding] {
        &self.network
    }

    /// Hostname bindings in source order
    pub fn hostname_bindings(&self) -> &[HostnameBinding] {
        &self.hostname
    }

    /// First network binding whose prefix contains `ip`
    pub fn match_ip(&self, ip: IpAddr) -> Option<&NetworkBinding> {
        self.network.iter().find(|b| b.network.contains(ip))
    }

    /// First hostname binding whose pattern matches `hostname`
    pub fn match_hostname(&self, hostname: &str) -> Option<&HostnameBinding> {
        self.hostname.iter().find(|b| b.pattern.is_match(hostname))
    }

    /// Resolve a client to its boot script: network bindings first, then
    /// hostname bindings. Callers wanting a different precedence can
    /// consult the two ordered lists directly.
    pub fn resolve(&self, ip: Option<IpAddr>, hostname: Option<&str>) -> Option<&Script> {
        if let Some(ip) = ip {
            if let Some(binding) = self.match_ip(ip) {
                return Some(&binding.script);
            }
        }
        if let Some(hostname) = hostname {
            if let Some(binding) = self.match_hostname(hostname) {
                return Some(&binding.script);
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.network.is_empty() && self.hostname.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RawMappings {
        serde_yaml::from_str(
            r#"
networkMaps:
  - network: 10.0.0.0/8
    script:
      name: ipxe/wide
  - network: 10.0.0.0/24
    script:
      name: ipxe/narrow
      environment: production
      params:
        version: "9.2"
hostnameMaps:
  - hostname: "^sr-.*"
    script:
      name: ipxe/kickstart
  - hostname: ".*"
    script:
      name: ipxe/default
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_compile_preserves_counts_and_order() {
        let bindings = BindingSet::compile(&sample()).unwrap();
        assert_eq!(bindings.network_bindings().len(), 2);
        assert_eq!(bindings.hostname_bindings().len(), 2);
        assert_eq!(bindings.network_bindings()[0].script.name, "ipxe/wide");
        assert_eq!(bindings.network_bindings()[1].script.name, "ipxe/narrow");
        assert_eq!(bindings.hostname_bindings()[0].script.name, "ipxe/kickstart");
    }

    #[test]
    fn test_invalid_cidr_fails_whole_compile() {
        let mut raw = sample();
        raw.network_maps[1].network = "10.0.0.0/99".to_string();

        match BindingSet::compile(&raw) {
            Err(MappingError::InvalidCidr { index, network, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(network, "10.0.0.0/99");
            }
            other => panic!("expected InvalidCidr, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_pattern_fails_whole_compile() {
        let mut raw = sample();
        raw.hostname_maps[0].hostname = "sr-[".to_string();

        match BindingSet::compile(&raw) {
            Err(MappingError::InvalidPattern { index, pattern, .. }) => {
                assert_eq!(index, 0);
                assert_eq!(pattern, "sr-[");
            }
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_first_match_wins_within_each_list() {
        let bindings = BindingSet::compile(&sample()).unwrap();

        // 10.0.0.5 is inside both prefixes; the earlier rule wins
        let ip: IpAddr = "10.0.0.5".parse().unwrap();
        assert_eq!(bindings.match_ip(ip).unwrap().script.name, "ipxe/wide");

        // sr-web01 matches both patterns; the earlier rule wins
        let m = bindings.match_hostname("sr-web01").unwrap();
        assert_eq!(m.script.name, "ipxe/kickstart");
    }

    #[test]
    fn test_resolve_network_before_hostname() {
        let bindings = BindingSet::compile(&sample()).unwrap();
        let ip: IpAddr = "10.1.2.3".parse().unwrap();

        let script = bindings.resolve(Some(ip), Some("sr-web01")).unwrap();
        assert_eq!(script.name, "ipxe/wide");

        // No network match falls through to the hostname rules
        let ip: IpAddr = "172.16.0.1".parse().unwrap();
        let script = bindings.resolve(Some(ip), Some("sr-web01")).unwrap();
        assert_eq!(script.name, "ipxe/kickstart");

        assert!(bindings.resolve(Some(ip), None).is_none());
    }

    #[test]
    fn test_params_are_deep_copied() {
        let mut raw = sample();
        let bindings = BindingSet::compile(&raw).unwrap();

        raw.network_maps[1]
            .script
            .params
            .insert("version".to_string(), json!("tampered"));

        let script = &bindings.network_bindings()[1].script;
        assert_eq!(script.params["version"], "9.2");
        assert_eq!(script.environment, "production");
    }

    #[test]
    fn test_empty_document_compiles_empty() {
        let raw = RawMappings::default();
        let bindings = BindingSet::compile(&raw).unwrap();
        assert!(bindings.is_empty());
        assert!(bindings.match_hostname("anything").is_none());
    }
}
