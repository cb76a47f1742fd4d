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

//! The cooperative queue scheduler. Nine FIFO queues drain in a published
//! order on every manager loop tick, until no queue holds work. Enqueueing
//! always sets the unit's membership flag together with the linkage.

use super::base::{
    UnitDependencyMask, UnitLoadState, UnitRelationAtom, UnitRelations, UnitType,
};
use super::datastore::UnitDb;
use super::entry::{UnitQueueFlags, UnitX};
use super::gc;
use crate::job::{JobConf, JobKind, JobManager};
use crate::unit::entry::JobMode;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub(crate) struct UnitRT {
    data: Rc<UnitRTData>,
}

impl UnitRT {
    pub(crate) fn new(dbr: &Rc<UnitDb>) -> UnitRT {
        UnitRT {
            data: Rc::new(UnitRTData::new(dbr)),
        }
    }

    pub(crate) fn push_load_queue(&self, unit: Rc<UnitX>) {
        self.data.push(UnitQueueFlags::LOAD, unit);
    }

    pub(crate) fn push_target_dep_queue(&self, unit: Rc<UnitX>) {
        self.data.push(UnitQueueFlags::TARGET_DEPS, unit);
    }

    pub(crate) fn push_gc_queue(&self, unit: Rc<UnitX>) {
        self.data.push(UnitQueueFlags::GC, unit);
    }

    pub(crate) fn push_cleanup_queue(&self, unit: Rc<UnitX>) {
        self.data.push(UnitQueueFlags::CLEANUP, unit);
    }

    pub(crate) fn push_cgroup_realize_queue(&self, unit: Rc<UnitX>) {
        self.data.push(UnitQueueFlags::CGROUP_REALIZE, unit);
    }

    pub(crate) fn push_cgroup_empty_queue(&self, unit: Rc<UnitX>) {
        self.data.push(UnitQueueFlags::CGROUP_EMPTY, unit);
    }

    pub(crate) fn push_cgroup_oom_queue(&self, unit: Rc<UnitX>) {
        self.data.push(UnitQueueFlags::CGROUP_OOM, unit);
    }

    pub(crate) fn push_stop_when_unneeded_queue(&self, unit: Rc<UnitX>) {
        self.data.push(UnitQueueFlags::STOP_WHEN_UNNEEDED, unit);
    }

    pub(crate) fn push_dbus_queue(&self, unit: Rc<UnitX>) {
        self.data.push(UnitQueueFlags::DBUS, unit);
    }

    pub(crate) fn pop_cleanup_queue(&self) -> Option<Rc<UnitX>> {
        self.data.pop(UnitQueueFlags::CLEANUP)
    }

    pub(crate) fn pop_dbus_queue(&self) -> Option<Rc<UnitX>> {
        self.data.pop(UnitQueueFlags::DBUS)
    }

    pub(crate) fn dispatch_load_queue(&self) -> bool {
        self.data.dispatch_load_queue()
    }

    pub(crate) fn dispatch_target_dep_queue(&self) -> bool {
        self.data.dispatch_target_dep_queue()
    }

    pub(crate) fn dispatch_gc_queue(&self, jm: &Rc<JobManager>) -> bool {
        self.data.dispatch_gc_queue(self, jm)
    }

    pub(crate) fn dispatch_cgroup_realize_queue(&self) -> bool {
        self.data.dispatch_cgroup_realize_queue()
    }

    pub(crate) fn dispatch_cgroup_empty_queue(&self) -> bool {
        self.data.dispatch_cgroup_empty_queue()
    }

    pub(crate) fn dispatch_cgroup_oom_queue(&self) -> bool {
        self.data.dispatch_cgroup_oom_queue()
    }

    pub(crate) fn dispatch_stop_when_unneeded_queue(&self, jm: &Rc<JobManager>) -> bool {
        self.data.dispatch_stop_when_unneeded_queue(jm)
    }

    pub(crate) fn entry_clear(&self) {
        self.data.entry_clear();
    }
}

struct UnitRTData {
    // associated objects
    db: Rc<UnitDb>,

    // owned objects
    load_queue: RefCell<VecDeque<Rc<UnitX>>>,
    target_dep_queue: RefCell<VecDeque<Rc<UnitX>>>,
    gc_queue: RefCell<VecDeque<Rc<UnitX>>>,
    cleanup_queue: RefCell<VecDeque<Rc<UnitX>>>,
    cgroup_realize_queue: RefCell<VecDeque<Rc<UnitX>>>,
    cgroup_empty_queue: RefCell<VecDeque<Rc<UnitX>>>,
    cgroup_oom_queue: RefCell<VecDeque<Rc<UnitX>>>,
    stop_when_unneeded_queue: RefCell<VecDeque<Rc<UnitX>>>,
    dbus_queue: RefCell<VecDeque<Rc<UnitX>>>,
    gc_marker: Cell<u32>,
}

impl UnitRTData {
    fn new(dbr: &Rc<UnitDb>) -> UnitRTData {
        UnitRTData {
            db: Rc::clone(dbr),
            load_queue: RefCell::new(VecDeque::new()),
            target_dep_queue: RefCell::new(VecDeque::new()),
            gc_queue: RefCell::new(VecDeque::new()),
            cleanup_queue: RefCell::new(VecDeque::new()),
            cgroup_realize_queue: RefCell::new(VecDeque::new()),
            cgroup_empty_queue: RefCell::new(VecDeque::new()),
            cgroup_oom_queue: RefCell::new(VecDeque::new()),
            stop_when_unneeded_queue: RefCell::new(VecDeque::new()),
            dbus_queue: RefCell::new(VecDeque::new()),
            gc_marker: Cell::new(0),
        }
    }

    fn queue_of(&self, flag: UnitQueueFlags) -> &RefCell<VecDeque<Rc<UnitX>>> {
        if flag == UnitQueueFlags::LOAD {
            &self.load_queue
        } else if flag == UnitQueueFlags::TARGET_DEPS {
            &self.target_dep_queue
        } else if flag == UnitQueueFlags::GC {
            &self.gc_queue
        } else if flag == UnitQueueFlags::CLEANUP {
            &self.cleanup_queue
        } else if flag == UnitQueueFlags::CGROUP_REALIZE {
            &self.cgroup_realize_queue
        } else if flag == UnitQueueFlags::CGROUP_EMPTY {
            &self.cgroup_empty_queue
        } else if flag == UnitQueueFlags::CGROUP_OOM {
            &self.cgroup_oom_queue
        } else if flag == UnitQueueFlags::STOP_WHEN_UNNEEDED {
            &self.stop_when_unneeded_queue
        } else if flag == UnitQueueFlags::DBUS {
            &self.dbus_queue
        } else {
            unreachable!("not a queue flag")
        }
    }

    /// flag and linkage are mutated together
    fn push(&self, flag: UnitQueueFlags, unit: Rc<UnitX>) {
        if unit.in_queue(flag) {
            return;
        }
        unit.set_in_queue(flag, true);
        self.queue_of(flag).borrow_mut().push_back(unit);
    }

    fn pop(&self, flag: UnitQueueFlags) -> Option<Rc<UnitX>> {
        let unit = self.queue_of(flag).borrow_mut().pop_front()?;
        unit.set_in_queue(flag, false);
        Some(unit)
    }

    fn dispatch_load_queue(&self) -> bool {
        if self.load_queue.borrow().is_empty() {
            return false;
        }

        log::debug!("Dispatching load queue");
        loop {
            // pop first, the load may push the queue again
            let unit = match self.pop(UnitQueueFlags::LOAD) {
                None => break,
                Some(v) => v,
            };

            if unit.load_state() == UnitLoadState::Merged {
                // became a merge victim while waiting in the queue
                continue;
            }

            log::debug!("Loading unit: {}", unit.id());
            if let Err(e) = unit.load() {
                log::error!("Failed to load unit [{}]: {}", unit.id(), e);
            }

            let real_name = unit.get_real_name();
            if !real_name.is_empty() {
                /* We are loading an alias, merge it into the real unit. */
                log::debug!("Merging {} into {}", unit.id(), real_name);
                match self.db.units_get(&real_name) {
                    None => {
                        /* The real unit is not around, rename this one. */
                        unit.set_id(&real_name);
                        self.db.units_insert(real_name, Rc::clone(&unit));
                    }
                    Some(real) => {
                        if let Ok(survivor) = self.db.unit_merge(&real, &unit) {
                            let victim = if Rc::ptr_eq(&survivor, &unit) {
                                real
                            } else {
                                Rc::clone(&unit)
                            };
                            self.push(UnitQueueFlags::GC, victim);
                        }
                    }
                }
            } else {
                /* We are loading a real unit, remember its aliases. */
                for alias_name in unit.get_all_names() {
                    log::debug!("Adding name {} to {}", alias_name, unit.id());
                    unit.insert_name(&alias_name);
                    self.db.units_insert(alias_name, Rc::clone(&unit));
                }
            }

            if unit.load_state() == UnitLoadState::Loaded {
                self.push(UnitQueueFlags::TARGET_DEPS, Rc::clone(&unit));
            }
        }
        true
    }

    fn dispatch_target_dep_queue(&self) -> bool {
        if self.target_dep_queue.borrow().is_empty() {
            return false;
        }

        log::debug!("Dispatching target dep queue");
        loop {
            let unit = match self.pop(UnitQueueFlags::TARGET_DEPS) {
                None => break,
                Some(v) => v,
            };
            self.dispatch_target_dep_unit(&unit);
        }
        true
    }

    /// Install the default Wants+After pair between a loaded unit and the
    /// targets it is pulled in by.
    fn dispatch_target_dep_unit(&self, unit: &Rc<UnitX>) {
        let atom = UnitRelationAtom::UnitAtomAddDefaultTargetDependencyQueue;
        let b_atom = UnitRelationAtom::UnitAtomBefore;
        let mask = UnitDependencyMask::DEFAULT;
        for dep_target in self.db.dep_gets_atom(unit, atom) {
            if dep_target.unit_type() != UnitType::UnitTarget {
                continue;
            }
            if unit.load_state() != UnitLoadState::Loaded
                || dep_target.load_state() != UnitLoadState::Loaded
            {
                continue;
            }
            if !unit.default_dependencies() || !dep_target.default_dependencies() {
                continue;
            }
            if self.db.dep_is_dep_atom_with(&dep_target, b_atom, unit) {
                continue;
            }

            for relation in [UnitRelations::UnitWants, UnitRelations::UnitAfter] {
                if let Err(e) = self.db.dep_insert(
                    Rc::clone(&dep_target),
                    relation,
                    Rc::clone(unit),
                    true,
                    mask,
                ) {
                    log::error!("Failed to add default target dependency: {:?}", e);
                    return;
                }
            }
        }
    }

    fn dispatch_gc_queue(&self, rt: &UnitRT, jm: &Rc<JobManager>) -> bool {
        if self.gc_queue.borrow().is_empty() {
            return false;
        }

        log::debug!("Dispatching gc queue");
        let marker = self.gc_marker.get().wrapping_add(gc::GC_OFFSET_MAX);
        self.gc_marker.set(marker);

        let mut queued = Vec::new();
        while let Some(unit) = self.pop(UnitQueueFlags::GC) {
            queued.push(unit);
        }

        for unit in gc::gc_sweep(&self.db, jm, &queued, marker) {
            log::debug!("Collecting unit {}", unit.id());
            rt.push_cleanup_queue(unit);
        }
        true
    }

    fn dispatch_cgroup_realize_queue(&self) -> bool {
        if self.cgroup_realize_queue.borrow().is_empty() {
            return false;
        }

        loop {
            let unit = match self.pop(UnitQueueFlags::CGROUP_REALIZE) {
                None => break,
                Some(v) => v,
            };
            if !unit.active_or_activating() {
                continue;
            }
            unit.setup_cgroup_path();
            let cg = unit.cgroup();
            let mask = cg.enabled_mask() | cg.invalidated_mask();
            cg.set_realized(true, mask);
            log::debug!("Realized cgroup for {}: {:?}", unit.id(), unit.cg_path());
        }
        true
    }

    fn dispatch_cgroup_empty_queue(&self) -> bool {
        if self.cgroup_empty_queue.borrow().is_empty() {
            return false;
        }

        loop {
            let unit = match self.pop(UnitQueueFlags::CGROUP_EMPTY) {
                None => break,
                Some(v) => v,
            };
            log::debug!("cgroup of {} ran empty", unit.id());
            unit.notify_cgroup_empty();
        }
        true
    }

    fn dispatch_cgroup_oom_queue(&self) -> bool {
        if self.cgroup_oom_queue.borrow().is_empty() {
            return false;
        }

        loop {
            let unit = match self.pop(UnitQueueFlags::CGROUP_OOM) {
                None => break,
                Some(v) => v,
            };
            log::info!("Process of unit {} was killed by the OOM killer", unit.id());
            unit.notify_cgroup_oom();
        }
        true
    }

    fn dispatch_stop_when_unneeded_queue(&self, jm: &Rc<JobManager>) -> bool {
        if self.stop_when_unneeded_queue.borrow().is_empty() {
            return false;
        }

        log::debug!("Dispatching stop-when-unneeded queue");
        loop {
            let unit = match self.pop(UnitQueueFlags::STOP_WHEN_UNNEEDED) {
                None => break,
                Some(v) => v,
            };

            if !self.unit_is_unneeded(&unit, jm) {
                continue;
            }

            if !unit.test_auto_stop_ratelimit() {
                log::warn!(
                    "Unit {} is unneeded, but the stop was rate limited",
                    unit.id()
                );
                continue;
            }

            log::info!("Unit {} is not needed anymore. Stopping.", unit.id());
            if let Err(e) = jm.exec(&JobConf::new(&unit, JobKind::Stop), JobMode::Replace) {
                log::error!("Failed to enqueue the stop job for {}: {}", unit.id(), e);
            }
        }
        true
    }

    fn unit_is_unneeded(&self, unit: &Rc<UnitX>, jm: &Rc<JobManager>) -> bool {
        if !unit.stop_when_unneeded() {
            return false;
        }

        if !unit.active_state().is_active_or_reloading() {
            return false;
        }

        // a pending job means somebody still has plans for the unit
        if jm.has_job(unit) {
            return false;
        }

        for other in self
            .db
            .dep_gets_atom(unit, UnitRelationAtom::UnitAtomPinsStopWhenUnneeded)
        {
            if other.active_or_activating() || jm.has_start_like_job(&other) {
                return false;
            }
        }

        true
    }

    fn entry_clear(&self) {
        for flag in [
            UnitQueueFlags::LOAD,
            UnitQueueFlags::TARGET_DEPS,
            UnitQueueFlags::GC,
            UnitQueueFlags::CLEANUP,
            UnitQueueFlags::CGROUP_REALIZE,
            UnitQueueFlags::CGROUP_EMPTY,
            UnitQueueFlags::CGROUP_OOM,
            UnitQueueFlags::STOP_WHEN_UNNEEDED,
            UnitQueueFlags::DBUS,
        ] {
            let queue = self.queue_of(flag);
            for unit in queue.borrow_mut().drain(..) {
                unit.set_in_queue(flag, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::test_utils;

    #[test]
    fn queue_flag_coherence() {
        let db = Rc::new(UnitDb::new());
        let rt = UnitRT::new(&db);
        let unit = test_utils::create_unit_for_test_pub("queue.service");

        assert!(!unit.in_queue(UnitQueueFlags::DBUS));
        rt.push_dbus_queue(Rc::clone(&unit));
        assert!(unit.in_queue(UnitQueueFlags::DBUS));

        // re-push is idempotent
        rt.push_dbus_queue(Rc::clone(&unit));
        let popped = rt.pop_dbus_queue().unwrap();
        assert!(Rc::ptr_eq(&popped, &unit));
        assert!(!unit.in_queue(UnitQueueFlags::DBUS));
        assert!(rt.pop_dbus_queue().is_none());
    }

    #[test]
    fn entry_clear_resets_flags() {
        let db = Rc::new(UnitDb::new());
        let rt = UnitRT::new(&db);

        let unit = test_utils::create_unit_for_test_pub("work.service");
        rt.push_gc_queue(Rc::clone(&unit));
        assert!(unit.in_queue(UnitQueueFlags::GC));
        rt.entry_clear();
        assert!(!unit.in_queue(UnitQueueFlags::GC));
    }
}
