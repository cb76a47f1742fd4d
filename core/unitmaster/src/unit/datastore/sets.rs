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

use super::super::entry::UnitX;
use crate::utils::table::{Table, TableSubscribe};
use std::rc::Rc;

/// The process-wide name index: every name (id or alias) maps to exactly
/// one unit.
pub(super) struct UnitSets {
    t: Table<String, Rc<UnitX>>,
}

impl UnitSets {
    pub(super) fn new() -> UnitSets {
        UnitSets { t: Table::new() }
    }

    pub(super) fn insert(&self, name: String, unit: Rc<UnitX>) -> Option<Rc<UnitX>> {
        self.t.insert(name, unit)
    }

    pub(super) fn remove(&self, name: &str) -> Option<Rc<UnitX>> {
        self.t.remove(&name.to_string())
    }

    pub(super) fn get(&self, name: &str) -> Option<Rc<UnitX>> {
        self.t.get(&name.to_string())
    }

    pub(super) fn get_all(&self) -> Vec<Rc<UnitX>> {
        let mut units = self.t.get_all();
        units.sort_by_key(|u| u.id());
        units.dedup_by_key(|u| u.id());
        units
    }

    pub(super) fn register(
        &self,
        sub_name: &str,
        subscriber: Rc<dyn TableSubscribe<String, Rc<UnitX>>>,
    ) -> Option<Rc<dyn TableSubscribe<String, Rc<UnitX>>>> {
        self.t.subscribe(sub_name.to_string(), subscriber)
    }

    pub(super) fn entry_clear(&self) {
        self.t.data_clear();
    }

    // repeating protection
    pub(super) fn clear(&self) {
        self.t.clear();
    }
}
