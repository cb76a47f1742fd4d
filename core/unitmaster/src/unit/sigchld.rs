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

//! Reap dead children and route the exit to the owning unit. The signal
//! itself arrives through the embedder's signal source; this only drains.

use super::datastore::UnitDb;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::cell::Cell;
use std::rc::Rc;

pub(super) struct Sigchld {
    // associated objects
    db: Rc<UnitDb>,

    // owned objects
    generation: Cell<u64>,
}

impl Sigchld {
    pub(super) fn new(dbr: &Rc<UnitDb>) -> Sigchld {
        Sigchld {
            db: Rc::clone(dbr),
            generation: Cell::new(0),
        }
    }

    /// Reap everything that exited; one unit is dispatched at most once
    /// per sweep, however many of its children died.
    pub(super) fn dispatch_sigchld(&self) {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);

        loop {
            let wait_status = match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(status) => status,
                Err(_) => break,
            };

            let pid = match wait_status {
                WaitStatus::Exited(pid, _) => pid,
                WaitStatus::Signaled(pid, _, _) => pid,
                _ => break,
            };

            log::debug!("Reaped child {}: {:?}", pid, wait_status);

            let unit = match self.db.get_unit_by_pid(pid) {
                None => {
                    log::debug!("Child {} does not belong to any unit", pid);
                    continue;
                }
                Some(v) => v,
            };

            self.db.child_unwatch_pid(&unit, pid);

            if unit.sigchldgen() == generation {
                // this unit saw an event in this sweep already
                continue;
            }
            unit.set_sigchldgen(generation);
            unit.sigchld_events(wait_status);
        }
    }
}
