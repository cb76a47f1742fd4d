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

use nix::unistd::Pid;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

/// The pids a unit keeps an eye on, with the generation counters that keep
/// one child-exit or notify event from being dispatched twice.
pub(super) struct UeChild {
    pids: RefCell<HashSet<Pid>>,
    sigchldgen: Cell<u64>,
    notifygen: Cell<u64>,
}

impl UeChild {
    pub(super) fn new() -> UeChild {
        UeChild {
            pids: RefCell::new(HashSet::new()),
            sigchldgen: Cell::new(0),
            notifygen: Cell::new(0),
        }
    }

    pub(super) fn add_pids(&self, pid: Pid) {
        self.pids.borrow_mut().insert(pid);
    }

    pub(super) fn remove_pids(&self, pid: Pid) {
        self.pids.borrow_mut().remove(&pid);
    }

    pub(super) fn get_pids(&self) -> Vec<Pid> {
        self.pids.borrow().iter().copied().collect()
    }

    pub(super) fn has_pids(&self) -> bool {
        !self.pids.borrow().is_empty()
    }

    pub(super) fn clear_pids(&self) {
        self.pids.borrow_mut().clear();
    }

    pub(super) fn sigchldgen(&self) -> u64 {
        self.sigchldgen.get()
    }

    pub(super) fn set_sigchldgen(&self, gen: u64) {
        self.sigchldgen.set(gen);
    }

    #[allow(dead_code)]
    pub(super) fn notifygen(&self) -> u64 {
        self.notifygen.get()
    }

    #[allow(dead_code)]
    pub(super) fn set_notifygen(&self, gen: u64) {
        self.notifygen.set(gen);
    }
}
