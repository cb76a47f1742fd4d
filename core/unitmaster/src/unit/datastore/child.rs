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
use super::sets::UnitSets;
use crate::utils::table::{TableOp, TableSubscribe};
use nix::unistd::Pid;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// pid -> unit watch map, feeding sigchld dispatch.
pub(super) struct UnitChild {
    sub_name: String, // key for table-subscriber: UnitSets
    sub: Rc<UnitChildSub>,
}

impl UnitChild {
    pub(super) fn new(unitsr: &Rc<UnitSets>) -> UnitChild {
        let uc = UnitChild {
            sub_name: String::from("UnitChild"),
            sub: Rc::new(UnitChildSub::new()),
        };
        uc.register(unitsr);
        uc
    }

    fn register(&self, unitsr: &UnitSets) {
        let subscriber = Rc::clone(&self.sub);
        unitsr.register(&self.sub_name, subscriber);
    }

    pub(super) fn add_watch_pid(&self, unit: Rc<UnitX>, pid: Pid) {
        unit.child_add_pids(pid);
        self.sub.data.borrow_mut().watch_pids.insert(pid, unit);
    }

    pub(super) fn unwatch_pid(&self, unit: &UnitX, pid: Pid) {
        unit.child_remove_pids(pid);
        self.sub.data.borrow_mut().watch_pids.remove(&pid);
    }

    pub(super) fn unwatch_all_pids(&self, unit: &UnitX) {
        self.sub.unwatch_all_pids(unit)
    }

    pub(super) fn get_unit_by_pid(&self, pid: Pid) -> Option<Rc<UnitX>> {
        self.sub.data.borrow().watch_pids.get(&pid).cloned()
    }

    pub(super) fn entry_clear(&self) {
        self.sub.data.borrow_mut().watch_pids.clear();
    }
}

struct UnitChildSub {
    data: RefCell<UnitChildData>,
}

impl TableSubscribe<String, Rc<UnitX>> for UnitChildSub {
    fn notify(&self, op: &TableOp<String, Rc<UnitX>>) {
        match op {
            TableOp::TableInsert(_, _) => {} // do nothing
            TableOp::TableRemove(_, unit) => self.unwatch_all_pids(unit),
        }
    }
}

impl UnitChildSub {
    fn new() -> UnitChildSub {
        UnitChildSub {
            data: RefCell::new(UnitChildData {
                watch_pids: HashMap::new(),
            }),
        }
    }

    fn unwatch_all_pids(&self, unit: &UnitX) {
        let pids = unit.get_pids();
        let mut data = self.data.borrow_mut();
        for pid in pids {
            data.watch_pids.remove(&pid);
        }
        unit.clear_watched_pids();
    }
}

struct UnitChildData {
    watch_pids: HashMap<Pid, Rc<UnitX>>, // key: pid, value: unit
}
