//! # Key Mapping Module
//!
//! User-configurable bindings from the three logical valve ids to physical
//! keyboard keys. Each entry is exactly one case-insensitive character.
//! Bindings are editable at runtime and persisted as JSON next to the
//! working directory.
//!
//! Duplicate keys across valves are a user-configuration mistake rather
//! than an error: the mapping does not reject them, and classification
//! resolves the ambiguity deterministically in valve-id order, lowest
//! first. That resolution rule is part of the contract.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::valves::VALVE_IDS;

const KEY_MAP_FILE: &str = "keymap.json";

/// Keyboard bindings for the three valves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyMapping {
    /// Valve id (1..=3) to lowercase key character.
    valves: BTreeMap<u8, char>,
}

impl Default for KeyMapping {
    fn default() -> Self {
        Self {
            valves: BTreeMap::from([(1, 'a'), (2, 's'), (3, 'd')]),
        }
    }
}

impl KeyMapping {
    /// Load the mapping from the default file.
    pub fn load() -> Result<Self> {
        Self::load_from(KEY_MAP_FILE)
    }

    /// Load the mapping from a specific path, falling back to the defaults
    /// when the file does not exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let mut mapping: Self = serde_json::from_str(&content)?;
        mapping.normalize();
        Ok(mapping)
    }

    /// Save the mapping to the default file.
    pub fn save(&self) -> Result<()> {
        self.save_to(KEY_MAP_FILE)
    }

    /// Save the mapping to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Drops bindings for unknown valve ids, lowercases keys, and fills
    /// any missing valve from the defaults.
    fn normalize(&mut self) {
        let defaults = Self::default();
        self.valves.retain(|valve, _| VALVE_IDS.contains(valve));
        for (_, key) in self.valves.iter_mut() {
            *key = key.to_ascii_lowercase();
        }
        for valve in VALVE_IDS {
            let default_key = defaults.valves[&valve];
            self.valves.entry(valve).or_insert(default_key);
        }
    }

    /// Classifies a raw key against the mapping.
    ///
    /// Case-insensitive. When two valves share a key, the lowest valve id
    /// wins (the map iterates in ascending valve order).
    pub fn classify(&self, key: char) -> Option<u8> {
        let key = key.to_ascii_lowercase();
        self.valves
            .iter()
            .find(|(_, bound)| **bound == key)
            .map(|(valve, _)| *valve)
    }

    /// Replaces the binding of a single valve. Unknown valve ids are
    /// ignored. The new key is stored lowercase; collisions with other
    /// valves are allowed.
    pub fn remap(&mut self, valve: u8, key: char) {
        if !VALVE_IDS.contains(&valve) {
            return;
        }
        self.valves.insert(valve, key.to_ascii_lowercase());
    }

    /// The key currently bound to a valve.
    pub fn key_for(&self, valve: u8) -> Option<char> {
        self.valves.get(&valve).copied()
    }
}
