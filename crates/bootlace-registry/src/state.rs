//! Boot-state types and the registry itself

use crate::error::{RegistryError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Initial dummy target assigned to newly sighted machines
pub const INIT_TARGET: &str = "NOTARGET";

/// Normalize a MAC address to lowercase with colon separators
pub fn normalize_mac(mac: &str) -> String {
    mac.to_lowercase().replace('-', ":")
}

pub(crate) fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Identity of a machine attempting to boot over the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub mac: String,
    pub ip: String,
    pub hostname: String,
}

impl Machine {
    /// Build a machine identity; the MAC is normalized so lookups with
    /// any separator or case convention find the same entry.
    pub fn new(mac: impl AsRef<str>, ip: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            mac: normalize_mac(mac.as_ref()),
            ip: ip.into(),
            hostname: hostname.into(),
        }
    }
}

/// Boot progress of one tracked machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootState {
    pub machine: Machine,
    /// Current boot-stage identifier, [`INIT_TARGET`] until assigned
    pub target: String,
    pub environment: String,
    pub params: HashMap<String, Value>,
    /// Times this machine has been seen since its last reset, starts at 1
    pub retry: u32,
    /// Unix seconds of the most recent access; never decreases
    pub last_access: i64,
}

impl BootState {
    fn fresh(machine: Machine) -> Self {
        Self {
            machine,
            target: INIT_TARGET.to_string(),
            environment: String::new(),
            params: HashMap::new(),
            retry: 1,
            last_access: now_unix(),
        }
    }
}

/// Concurrency-safe store of per-machine boot states, keyed by MAC.
#[derive(Debug, Default)]
pub struct Registry {
    states: RwLock<HashMap<String, BootState>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh state for the machine, overwriting any existing
    /// entry. This is a reset, not a merge: target, retry counter and
    /// parameters all start over.
    pub fn add_or_reset(&self, machine: Machine) -> Result<BootState> {
        let state = BootState::fresh(machine);
        let mut guard = self.write()?;
        guard.insert(state.machine.mac.clone(), state.clone());
        Ok(state)
    }

    /// Current state for a MAC, if tracked
    pub fn lookup(&self, mac: &str) -> Result<Option<BootState>> {
        let guard = self.read()?;
        Ok(guard.get(&normalize_mac(mac)).cloned())
    }

    /// Drop the entry for a MAC; absent entries are a no-op
    pub fn remove(&self, mac: &str) -> Result<()> {
        let mut guard = self.write()?;
        guard.remove(&normalize_mac(mac));
        Ok(())
    }

    /// Run a read-modify-write on one entry under the exclusive lock.
    ///
    /// The closure sees the entry in place; afterwards `last_access` is
    /// refreshed, never decreasing. Returns the updated state, or `None`
    /// when the MAC is not tracked.
    pub fn update<F>(&self, mac: &str, f: F) -> Result<Option<BootState>>
    where
        F: FnOnce(&mut BootState),
    {
        let mut guard = self.write()?;
        match guard.get_mut(&normalize_mac(mac)) {
            Some(state) => {
                f(state);
                state.last_access = state.last_access.max(now_unix());
                Ok(Some(state.clone()))
            }
            None => Ok(None),
        }
    }

    /// All tracked states, sorted by MAC
    pub fn list(&self) -> Result<Vec<BootState>> {
        let guard = self.read()?;
        let mut states: Vec<BootState> = guard.values().cloned().collect();
        states.sort_by(|a, b| a.machine.mac.cmp(&b.machine.mac));
        Ok(states)
    }

    /// Evict every entry whose last access is at or before `cutoff`
    /// (unix seconds). Returns the evicted MACs.
    pub fn expire_older_than(&self, cutoff: i64) -> Result<Vec<String>> {
        let mut guard = self.write()?;
        let expired: Vec<String> = guard
            .iter()
            .filter(|(_, state)| state.last_access <= cutoff)
            .map(|(mac, _)| mac.clone())
            .collect();
        for mac in &expired {
            guard.remove(mac);
        }
        Ok(expired)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, BootState>>> {
        self.states
            .read()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, BootState>>> {
        self.states
            .write()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))
    }
}

#[cfg(test)]
impl Registry {
    /// Test hook: insert a state verbatim, bypassing the freshness rules
    pub(crate) fn insert_raw(&self, state: BootState) {
        self.states
            .write()
            .unwrap()
            .insert(state.machine.mac.clone(), state);
    }
}
