// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;

use crate::ByteSpan;

/// Computes the 32-bit FNV-1 hash the engine derives ids from. Names are lower-cased
/// before hashing, so `Play_Music` and `play_music` map to the same id.
pub fn fnv1_hash(name: &str) -> u32 {
    let mut hash: u32 = 2166136261;
    for byte in name.to_lowercase().bytes() {
        hash = hash.wrapping_mul(16777619);
        hash ^= u32::from(byte);
    }
    hash
}

/// A table for recovering original names from the hashed ids stored in a bank.
///
/// This is purely a display aid. The codec never consults it, and a missing or
/// incomplete table has no effect on round-trip correctness.
#[derive(Debug, Default)]
pub struct HashList {
    table: HashMap<u32, String>,
}

impl HashList {
    /// Builds a table from a list of known names.
    pub fn from_names<I: IntoIterator<Item = String>>(names: I) -> HashList {
        let mut table = HashMap::new();
        for name in names {
            table.insert(fnv1_hash(&name), name);
        }

        HashList { table }
    }

    /// Parses an existing hashlist file, which is a JSON array of known names.
    pub fn from_existing(buffer: ByteSpan) -> Option<HashList> {
        let names: Vec<String> = serde_json::from_slice(buffer).ok()?;
        Some(HashList::from_names(names))
    }

    /// The original name for `id`, if known.
    pub fn resolve(&self, id: u32) -> Option<&str> {
        self.table.get(&id).map(String::as_str)
    }

    /// A display label for `id`: the original name, or `(?) <id>` when unknown.
    pub fn label(&self, id: u32) -> String {
        match self.resolve(id) {
            Some(name) => name.to_string(),
            None => format!("(?) {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hashes() {
        assert_eq!(fnv1_hash("play_music"), 2932040671);
        assert_eq!(fnv1_hash("stop_all"), 452547817);
        assert_eq!(fnv1_hash("master_bus"), 3677413232);
    }

    #[test]
    fn hashing_is_case_insensitive() {
        assert_eq!(fnv1_hash("Play_Music"), fnv1_hash("play_music"));
    }

    #[test]
    fn resolving() {
        let list = HashList::from_names(vec!["play_music".to_string()]);

        assert_eq!(list.resolve(2932040671), Some("play_music"));
        assert_eq!(list.label(2932040671), "play_music");
        assert_eq!(list.label(1234), "(?) 1234");
    }

    #[test]
    fn parsing() {
        let list = HashList::from_existing(br#"["play_music", "stop_all"]"#).unwrap();

        assert_eq!(list.resolve(452547817), Some("stop_all"));
    }

    #[test]
    fn invalid_input() {
        assert!(HashList::from_existing(b"not json").is_none());
    }
}
