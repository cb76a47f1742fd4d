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

use crate::unit::base::UnitType;
use basic::unit_name::unit_name_to_instance;
use std::cell::RefCell;
use std::collections::HashSet;

/// Identity of a unit: the canonical id, the alias set it belongs to, the
/// instance part and the type. The id is always an element of the names.
pub(super) struct UeBase {
    id: RefCell<String>,
    instance: RefCell<Option<String>>,
    names: RefCell<HashSet<String>>,
    unit_type: UnitType,
}

impl UeBase {
    pub(super) fn new(id: String, unit_type: UnitType) -> UeBase {
        let mut names = HashSet::new();
        names.insert(id.clone());
        let instance = unit_name_to_instance(&id);
        UeBase {
            id: RefCell::new(id),
            instance: RefCell::new(instance),
            names: RefCell::new(names),
            unit_type,
        }
    }

    pub(super) fn id(&self) -> String {
        self.id.borrow().to_string()
    }

    pub(super) fn set_id(&self, id: &str) {
        self.names.borrow_mut().insert(String::from(id));
        *self.instance.borrow_mut() = unit_name_to_instance(id);
        *self.id.borrow_mut() = String::from(id);
    }

    pub(super) fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    pub(super) fn instance(&self) -> Option<String> {
        self.instance.borrow().clone()
    }

    pub(super) fn insert_name(&self, name: &str) {
        self.names.borrow_mut().insert(String::from(name));
    }

    pub(super) fn has_name(&self, name: &str) -> bool {
        self.names.borrow().contains(name)
    }

    pub(super) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.borrow().iter().cloned().collect();
        names.sort();
        names
    }

    pub(super) fn merge_names(&self, other: &UeBase) {
        for name in other.names() {
            self.insert_name(&name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_names() {
        let base = UeBase::new(String::from("foo.service"), UnitType::UnitService);
        assert_eq!(base.id(), "foo.service");
        assert!(base.has_name("foo.service"));

        base.insert_name("bar.service");
        assert!(base.has_name("bar.service"));

        base.set_id("bar.service");
        assert_eq!(base.id(), "bar.service");
        // the old id stays a member of the name set
        assert!(base.has_name("foo.service"));
        assert_eq!(base.names().len(), 2);
    }

    #[test]
    fn base_instance() {
        let base = UeBase::new(String::from("getty@tty1.service"), UnitType::UnitService);
        assert_eq!(base.instance(), Some("tty1".to_string()));
    }
}
