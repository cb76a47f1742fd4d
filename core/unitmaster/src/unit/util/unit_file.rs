// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// unitmaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//! The registry of parsed unit fragments.
//!
//! Scanning unit directories and parsing the file format is the loader's
//! business; it hands finished [`UnitFragment`]s to this store, and the load
//! queue resolves units against it.

use crate::unit::entry::{UeConfigInstall, UeConfigUnit};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// One parsed unit file: the shared sections plus the type-private one.
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct UnitFragment {
    /// the [Unit] section
    pub unit: UeConfigUnit,
    /// the [Install] section
    pub install: UeConfigInstall,
    /// the per-type private section, uninterpreted by the engine
    pub section: HashMap<String, String>,
    /// fragment path followed by drop-in paths
    pub paths: Vec<PathBuf>,
    /// last-modified of the newest contributing file, usec realtime
    pub mtime: u64,
}

#[derive(Default)]
struct UnitFileStoreData {
    fragments: HashMap<String, UnitFragment>,
    aliases: HashMap<String, String>, // alias name -> real name
    masked: HashSet<String>,
}

/// Name-indexed fragment table with alias links and mask marks.
pub struct UnitFileStore {
    data: RefCell<UnitFileStoreData>,
}

impl UnitFileStore {
    pub fn new() -> UnitFileStore {
        UnitFileStore {
            data: RefCell::new(UnitFileStoreData::default()),
        }
    }

    /// Install (or replace) the fragment for a unit name.
    pub fn register_fragment(&self, name: &str, fragment: UnitFragment) {
        self.data
            .borrow_mut()
            .fragments
            .insert(name.to_string(), fragment);
    }

    /// Link an alias to the unit actually carrying the fragment.
    pub fn register_alias(&self, alias: &str, real: &str) {
        self.data
            .borrow_mut()
            .aliases
            .insert(alias.to_string(), real.to_string());
    }

    /// Mark a name as masked.
    pub fn register_masked(&self, name: &str) {
        self.data.borrow_mut().masked.insert(name.to_string());
    }

    pub fn remove_fragment(&self, name: &str) {
        let mut data = self.data.borrow_mut();
        data.fragments.remove(name);
        data.masked.remove(name);
        data.aliases.retain(|_, real| real != name);
    }

    /// The fragment for a name, following one alias link.
    pub fn lookup(&self, name: &str) -> Option<UnitFragment> {
        let data = self.data.borrow();
        if let Some(frag) = data.fragments.get(name) {
            return Some(frag.clone());
        }
        data.aliases
            .get(name)
            .and_then(|real| data.fragments.get(real))
            .cloned()
    }

    /// The real name behind an alias, empty when the name is no alias.
    pub fn real_name(&self, name: &str) -> String {
        self.data
            .borrow()
            .aliases
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// All aliases registered for a real name.
    pub fn aliases_of(&self, real: &str) -> Vec<String> {
        self.data
            .borrow()
            .aliases
            .iter()
            .filter(|(_, r)| r.as_str() == real)
            .map(|(a, _)| a.clone())
            .collect()
    }

    pub fn is_masked(&self, name: &str) -> bool {
        self.data.borrow().masked.contains(name)
    }

    pub fn has_fragment(&self, name: &str) -> bool {
        let data = self.data.borrow();
        data.fragments.contains_key(name) || data.aliases.contains_key(name)
    }

    /// Last-modified of the fragment, for need-daemon-reload checks.
    pub fn fragment_mtime(&self, name: &str) -> Option<u64> {
        self.data.borrow().fragments.get(name).map(|f| f.mtime)
    }

    pub fn entry_clear(&self) {
        let mut data = self.data.borrow_mut();
        data.fragments.clear();
        data.aliases.clear();
        data.masked.clear();
    }
}

impl Default for UnitFileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_follows_alias() {
        let store = UnitFileStore::new();
        let mut frag = UnitFragment::default();
        frag.unit.Description = "demo".to_string();
        store.register_fragment("demo.service", frag);
        store.register_alias("demo-alias.service", "demo.service");

        assert!(store.lookup("demo.service").is_some());
        let via_alias = store.lookup("demo-alias.service").unwrap();
        assert_eq!(via_alias.unit.Description, "demo");
        assert_eq!(store.real_name("demo-alias.service"), "demo.service");
        assert_eq!(store.real_name("demo.service"), "");
        assert_eq!(store.aliases_of("demo.service"), vec!["demo-alias.service"]);
    }

    #[test]
    fn masked_is_tracked() {
        let store = UnitFileStore::new();
        assert!(!store.is_masked("foo.service"));
        store.register_masked("foo.service");
        assert!(store.is_masked("foo.service"));
        store.remove_fragment("foo.service");
        assert!(!store.is_masked("foo.service"));
    }
}
