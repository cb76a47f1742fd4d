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

//! Named weak back-edges into a unit.
//!
//! Every [`UnitRef`] is a shared cell the target unit also holds in its
//! refs-by-target list, so a merge can redirect every pointer into the
//! survivor by walking one list instead of chasing owners.

use super::unitx::UnitX;
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) struct UnitRefData {
    pub(crate) source: String,
    pub(crate) target: Option<Rc<UnitX>>,
}

pub(crate) type UnitRefCell = Rc<RefCell<UnitRefData>>;

pub(crate) struct UnitRef {
    data: UnitRefCell,
}

impl UnitRef {
    pub(crate) fn new() -> UnitRef {
        UnitRef {
            data: Rc::new(RefCell::new(UnitRefData {
                source: String::new(),
                target: None,
            })),
        }
    }

    /// Point the reference at a target, registering it on the target's
    /// back-edge list. Any previous target is released first.
    pub(crate) fn set(&self, source: &str, target: &Rc<UnitX>) {
        self.unset();
        {
            let mut data = self.data.borrow_mut();
            data.source = source.to_string();
            data.target = Some(Rc::clone(target));
        }
        target.push_ref_cell(Rc::clone(&self.data));
    }

    pub(crate) fn unset(&self) {
        let target = self.data.borrow().target.clone();
        if let Some(t) = target {
            t.remove_ref_cell(&self.data);
        }
        let mut data = self.data.borrow_mut();
        data.source = String::new();
        data.target = None;
    }

    pub(crate) fn target(&self) -> Option<Rc<UnitX>> {
        self.data.borrow().target.clone()
    }

    #[allow(dead_code)]
    pub(crate) fn is_set(&self) -> bool {
        self.data.borrow().target.is_some()
    }

    #[allow(dead_code)]
    pub(crate) fn source(&self) -> String {
        self.data.borrow().source.clone()
    }
}

impl Drop for UnitRef {
    fn drop(&mut self) {
        self.unset();
    }
}

/// Redirect every reference held on `victim` to `survivor`. O(|refs|).
pub(crate) fn rewrite_refs(victim: &Rc<UnitX>, survivor: &Rc<UnitX>) {
    for cell in victim.take_ref_cells() {
        cell.borrow_mut().target = Some(Rc::clone(survivor));
        survivor.push_ref_cell(cell);
    }
}
