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

//! The manager façade: the public operations, the queue dispatch loop and
//! the notifier that turns state transitions into their side effects.

use super::base::{
    unit_name_to_type, KillWho, UnitActiveState, UnitDependencyMask, UnitLoadState,
    UnitNotifyFlags, UnitRelationAtom, UnitRelations, UnitType, UnitWriteFlags,
};
use super::bus::{BusSink, UnitBus};
use super::data::{DataManager, UnitState};
use super::datastore::UnitDb;
use super::entry::{JobMode, StartLimitResult, UnitEmergencyAction, UnitX};
use super::runtime::UnitRT;
use super::sigchld::Sigchld;
use super::sub::{unit_vtable, SubUnitRegistry, UmIf};
use super::types::{self, SLICE_ROOT};
use super::uload::UnitLoad;
use super::util::{UnitFileStore, UnitFragment};
use crate::error::*;
use crate::job::{JobConf, JobKind, JobManager, JobResult};
use crate::manager::State;
use crate::serialize::{FdSet, Record, Serializer};
use crate::utils::table::{TableOp, TableSubscribe};
use event::Events;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::rc::Rc;

/// The entry the embedding process holds: wires the data tables to the
/// manager and forwards the public operations.
pub struct UnitManagerX {
    dm: Rc<DataManager>,
    sub_name: String, // key for table-subscriber
    data: Rc<UnitManager>,
}

impl Drop for UnitManagerX {
    fn drop(&mut self) {
        log::debug!("UnitManagerX drop, clear.");
        // repeating protection
        self.dm.clear();
    }
}

impl UnitManagerX {
    pub fn new(eventr: &Rc<Events>, state: Rc<RefCell<State>>) -> UnitManagerX {
        let _dm = Rc::new(DataManager::new());
        let umx = UnitManagerX {
            dm: Rc::clone(&_dm),
            sub_name: String::from("UnitManagerX"),
            data: UnitManager::new(eventr, &_dm, state),
        };
        umx.register(&_dm);
        umx
    }

    fn register(&self, dm: &DataManager) {
        let subscriber = Rc::clone(&self.data);
        let ret = dm.register_unit_state(&self.sub_name, subscriber.clone());
        assert!(ret.is_none());

        let ret = dm.register_start_limit_result(&self.sub_name, subscriber.clone());
        assert!(ret.is_none());

        let ret = dm.register_job_result(&self.sub_name, subscriber);
        assert!(ret.is_none());
    }

    /// Register per-type modules or replace the in-tree ones.
    pub fn sub_registry(&self) -> Rc<SubUnitRegistry> {
        Rc::clone(&self.data.registry)
    }

    /// Where the external loader parks parsed fragments.
    pub fn file_store(&self) -> Rc<UnitFileStore> {
        Rc::clone(&self.data.file)
    }

    /// Attach the bus transport.
    pub fn set_bus_sink(&self, sink: Rc<dyn BusSink>) {
        self.data.bus.set_sink(sink);
    }

    /// Resolve a unit against the fragment store without acting on it.
    pub fn load_unit(&self, name: &str) -> Result<()> {
        self.data.load_unitx(name).map(|_| ())
    }

    /// Attach an additional name to a unit.
    pub fn unit_add_name(&self, name: &str, added: &str) -> Result<()> {
        let unit = self.data.lookup(name)?;
        self.data.db.unit_add_name(&unit, added)
    }

    /// Make one of a unit's names its id.
    pub fn unit_choose_id(&self, name: &str, new_id: &str) -> Result<()> {
        let unit = self.data.lookup(name)?;
        self.data.db.unit_choose_id(&unit, new_id)
    }

    pub fn start_unit(&self, name: &str, is_manual: bool) -> Result<u64> {
        self.data.start_unit(name, is_manual)
    }

    pub fn stop_unit(&self, name: &str, is_manual: bool) -> Result<u64> {
        self.data.stop_unit(name, is_manual)
    }

    pub fn reload_unit(&self, name: &str) -> Result<u64> {
        self.data.reload_unit(name)
    }

    pub fn restart_unit(&self, name: &str, is_manual: bool) -> Result<u64> {
        self.data.restart_unit(name, is_manual)
    }

    pub fn try_restart_unit(&self, name: &str) -> Result<u64> {
        self.data.try_restart_unit(name)
    }

    pub fn isolate_unit(&self, name: &str) -> Result<u64> {
        self.data.isolate_unit(name)
    }

    pub fn kill_unit(&self, name: &str, who: KillWho, signal: i32) -> Result<()> {
        self.data.kill_unit(name, who, signal)
    }

    pub fn clean_unit(&self, name: &str) -> Result<()> {
        self.data.clean_unit(name)
    }

    pub fn can_clean_unit(&self, name: &str) -> Result<bool> {
        self.data.can_clean_unit(name)
    }

    pub fn reset_failed(&self, name: &str) -> Result<()> {
        self.data.reset_failed(name)
    }

    pub fn set_property(&self, name: &str, key: &str, value: &str) -> Result<()> {
        self.data.set_property(name, key, value)
    }

    pub fn start_transient_unit(
        &self,
        name: &str,
        properties: &[(String, String)],
    ) -> Result<u64> {
        self.data.start_transient_unit(name, properties)
    }

    pub fn unit_add_dependency(
        &self,
        name: &str,
        relation: UnitRelations,
        target: &str,
        add_ref: bool,
        mask: UnitDependencyMask,
    ) -> Result<()> {
        UmIf::unit_add_dependency(self.data.as_ref(), name, relation, target, add_ref, mask)
    }

    /// Flush every edge the unit asserted with the given provenance.
    pub fn unit_remove_dependencies(&self, name: &str, mask: UnitDependencyMask) -> Result<()> {
        self.data.unit_remove_dependencies(name, mask)
    }

    /// Drain every queue until fixpoint, in the published order.
    pub fn dispatch_queues(&self) {
        self.data.dispatch_queues()
    }

    pub fn dispatch_sigchld(&self) {
        self.data.sigchld.dispatch_sigchld();
        self.data.dispatch_queues();
    }

    /// Keep an eye on a pid on behalf of a unit; its exit is routed back
    /// through sigchld dispatch.
    pub fn child_watch_pid(&self, name: &str, pid: nix::unistd::Pid) -> Result<()> {
        let unit = self.data.lookup(name)?;
        self.data.db.child_add_watch_pid(unit, pid);
        Ok(())
    }

    pub fn child_unwatch_pid(&self, name: &str, pid: nix::unistd::Pid) -> Result<()> {
        let unit = self.data.lookup(name)?;
        self.data.db.child_unwatch_pid(&unit, pid);
        Ok(())
    }

    pub fn child_unwatch_all_pids(&self, name: &str) -> Result<()> {
        let unit = self.data.lookup(name)?;
        self.data.db.child_unwatch_all_pids(&unit);
        Ok(())
    }

    /// Pin a uid/gid pair on behalf of a unit; the manager-wide counter
    /// tells the IPC cleanup when the last user of an id is gone.
    pub fn unit_ref_uid_gid(&self, name: &str, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        let unit = self.data.lookup(name)?;
        self.data.unit_ref_uid_gid(&unit, uid, gid);
        Ok(())
    }

    pub fn unit_unref_uid_gid(&self, name: &str) -> Result<()> {
        let unit = self.data.lookup(name)?;
        self.data.unit_unref_uid_gid(&unit);
        Ok(())
    }

    /// Complete an installed job from the outside, e.g. from the
    /// transaction engine.
    pub fn job_complete(&self, id: u64, result: JobResult) -> Result<()> {
        self.data.jm.complete(id, result)
    }

    /// Fail an installed job with the given failure kind.
    pub fn job_fail(&self, id: u64, kind: JobResult) -> Result<()> {
        self.data.jm.fail(id, kind)
    }

    /// Drop the job installed for a unit, if any.
    pub fn cancel_unit_job(&self, name: &str) {
        self.data.jm.cancel_unit(name)
    }

    /// Number of jobs currently installed.
    pub fn n_jobs(&self) -> usize {
        self.data.jm.jobs_len()
    }

    pub fn enumerate_perpetual(&self) {
        self.data.enumerate_perpetual()
    }

    pub fn serialize(&self) -> Result<(Vec<u8>, FdSet)> {
        self.data.serialize()
    }

    pub fn deserialize(&self, reader: &mut dyn BufRead, fds: &mut FdSet) -> Result<()> {
        self.data.deserialize(reader, fds)
    }

    pub fn coldplug(&self) {
        self.data.coldplug()
    }

    pub fn catchup(&self) {
        self.data.catchup()
    }

    pub fn distribute_fds(&self, fds: &mut FdSet) {
        self.data.distribute_fds(fds)
    }

    pub fn entry_clear(&self) {
        self.dm.entry_clear();
        self.data.entry_clear();
    }

    /// External cgroup events route in through these.
    pub fn notify_cgroup_empty(&self, name: &str) -> Result<()> {
        self.data.push_cgroup_event(name, false)
    }

    pub fn notify_cgroup_oom(&self, name: &str) -> Result<()> {
        self.data.push_cgroup_event(name, true)
    }

    pub fn get_unit_status(&self, name: &str) -> Result<String> {
        self.data.get_unit_status(name)
    }

    pub fn get_all_units(&self) -> Vec<String> {
        self.data.get_all_units()
    }

    /* observers, mainly for frontends and tests */

    pub fn unit_exists(&self, name: &str) -> bool {
        self.data.db.units_get(name).is_some()
    }

    pub fn unit_active_state(&self, name: &str) -> Result<UnitActiveState> {
        let unit = self.data.lookup(name)?;
        Ok(unit.active_state())
    }

    pub fn unit_load_state(&self, name: &str) -> Result<UnitLoadState> {
        let unit = self.data.db.units_get(name).ok_or(Error::NotFound {
            what: name.to_string(),
        })?;
        Ok(unit.load_state())
    }

    pub fn unit_names(&self, name: &str) -> Result<Vec<String>> {
        let unit = self.data.lookup(name)?;
        Ok(unit.names())
    }

    pub fn unit_invocation_id(&self, name: &str) -> Result<String> {
        let unit = self.data.lookup(name)?;
        Ok(unit.invocation_id().to_string())
    }

    pub fn unit_has_job(&self, name: &str) -> bool {
        match self.data.db.units_get(name) {
            None => false,
            Some(u) => self.data.jm.has_job(&u),
        }
    }

    pub fn unit_has_stop_job(&self, name: &str) -> bool {
        UmIf::has_stop_job(self.data.as_ref(), name)
    }

    pub fn unit_has_dependency(
        &self,
        name: &str,
        atom: UnitRelationAtom,
        target: &str,
    ) -> bool {
        UmIf::unit_has_dependency(self.data.as_ref(), name, atom, target)
    }

    /// The provenance recorded on an edge, as (origin, destination) masks.
    pub fn unit_dependency_masks(
        &self,
        name: &str,
        relation: UnitRelations,
        target: &str,
    ) -> Option<(UnitDependencyMask, UnitDependencyMask)> {
        let s_unit = self.data.db.units_get(name)?;
        let t_unit = self.data.db.units_get(target)?;
        self.data
            .db
            .dep_get_info(&s_unit, relation, &t_unit)
            .map(|info| (info.origin_mask(), info.destination_mask()))
    }

    pub fn unit_add_two_dependencies(
        &self,
        name: &str,
        ra: UnitRelations,
        rb: UnitRelations,
        target: &str,
        add_ref: bool,
        mask: UnitDependencyMask,
    ) -> Result<()> {
        UmIf::unit_add_two_dependencies(self.data.as_ref(), name, ra, rb, target, add_ref, mask)
    }
}

/// the struct for managing the unit instances
pub struct UnitManager {
    // associated objects
    events: Rc<Events>,
    state: Rc<RefCell<State>>,

    // owned objects
    db: Rc<UnitDb>,
    rt: Rc<UnitRT>,
    load: UnitLoad,
    jm: Rc<JobManager>,
    bus: UnitBus,
    sigchld: Sigchld,
    registry: Rc<SubUnitRegistry>,
    file: Rc<UnitFileStore>,
    uid_refs: RefCell<HashMap<u32, u32>>, // key: uid, value: refcount
    gid_refs: RefCell<HashMap<u32, u32>>,
}

impl UnitManager {
    fn new(
        eventr: &Rc<Events>,
        dmr: &Rc<DataManager>,
        state: Rc<RefCell<State>>,
    ) -> Rc<UnitManager> {
        let db = Rc::new(UnitDb::new());
        let rt = Rc::new(UnitRT::new(&db));
        let jm = Rc::new(JobManager::new(eventr, dmr, &db));
        let file = Rc::new(UnitFileStore::new());
        let registry = Rc::new(SubUnitRegistry::new());
        types::install_default_types(&registry);
        let load = UnitLoad::new(dmr, &db, &rt, &file, &registry);

        let um = Rc::new(UnitManager {
            events: Rc::clone(eventr),
            state,
            db: Rc::clone(&db),
            rt,
            load,
            jm,
            bus: UnitBus::new(),
            sigchld: Sigchld::new(&db),
            registry,
            file,
            uid_refs: RefCell::new(HashMap::new()),
            gid_refs: RefCell::new(HashMap::new()),
        });
        um.load.set_um(Rc::clone(&um) as Rc<dyn UmIf>);
        um
    }

    #[allow(dead_code)]
    pub(crate) fn events(&self) -> Rc<Events> {
        Rc::clone(&self.events)
    }

    fn lookup(&self, name: &str) -> Result<Rc<UnitX>> {
        let unit = self.db.units_get(name).ok_or(Error::NotFound {
            what: name.to_string(),
        })?;
        Ok(self.db.unit_follow_merge(&unit))
    }

    fn load_unitx(&self, name: &str) -> Result<Rc<UnitX>> {
        self.load.load_unit(name).ok_or(Error::NotFound {
            what: name.to_string(),
        })
    }

    fn start_unit(&self, name: &str, is_manual: bool) -> Result<u64> {
        let unit = self.load_unitx(name)?;
        unit.validate_load_state()?;

        if is_manual && unit.refuse_manual_start() {
            return Err(Error::ManualStartRefused {
                unit: unit.id(),
            });
        }

        let id = self.jm.exec(&JobConf::new(&unit, JobKind::Start), JobMode::Replace)?;
        self.rt.push_dbus_queue(unit);
        Ok(id)
    }

    fn stop_unit(&self, name: &str, is_manual: bool) -> Result<u64> {
        let unit = self.lookup(name)?;

        if is_manual && unit.refuse_manual_stop() {
            return Err(Error::ManualStopRefused {
                unit: unit.id(),
            });
        }

        let id = self.jm.exec(&JobConf::new(&unit, JobKind::Stop), JobMode::Replace)?;
        self.rt.push_dbus_queue(unit);
        Ok(id)
    }

    fn reload_unit(&self, name: &str) -> Result<u64> {
        let unit = self.lookup(name)?;
        let id = self.jm.exec(&JobConf::new(&unit, JobKind::Reload), JobMode::Replace)?;
        self.rt.push_dbus_queue(Rc::clone(&unit));
        self.propagate_reload(&unit);
        Ok(id)
    }

    /// Walk the PropagatesReloadTo closure, cycle-safe.
    fn propagate_reload(&self, unit: &Rc<UnitX>) {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(unit.id());
        let mut pending = self
            .db
            .dep_gets_unit(unit, UnitRelations::UnitPropagatesReloadTo);

        while let Some(other) = pending.pop() {
            if !visited.insert(other.id()) {
                log::warn!(
                    "Reload propagation hit {} again, breaking the cycle",
                    other.id()
                );
                continue;
            }

            log::debug!("Propagating reload from {} to {}", unit.id(), other.id());
            if let Err(e) = self
                .jm
                .exec(&JobConf::new(&other, JobKind::Reload), JobMode::Replace)
            {
                log::debug!("Failed to propagate reload to {}: {}", other.id(), e);
            }
            pending.append(
                &mut self
                    .db
                    .dep_gets_unit(&other, UnitRelations::UnitPropagatesReloadTo),
            );
        }
    }

    fn restart_unit(&self, name: &str, is_manual: bool) -> Result<u64> {
        let unit = self.load_unitx(name)?;
        unit.validate_load_state()?;

        if is_manual && (unit.refuse_manual_start() || unit.refuse_manual_stop()) {
            return Err(Error::ManualStartRefused {
                unit: unit.id(),
            });
        }

        let id = self
            .jm
            .exec(&JobConf::new(&unit, JobKind::Restart), JobMode::Replace)?;
        self.rt.push_dbus_queue(unit);
        Ok(id)
    }

    /// Restart the unit only when it is running; 0 means nothing to do.
    fn try_restart_unit(&self, name: &str) -> Result<u64> {
        let unit = self.lookup(name)?;
        if !unit.active_or_activating() {
            return Ok(0);
        }
        self.jm
            .exec(&JobConf::new(&unit, JobKind::Restart), JobMode::Replace)
    }

    fn isolate_unit(&self, name: &str) -> Result<u64> {
        let unit = self.load_unitx(name)?;
        unit.validate_load_state()?;

        if !unit.allow_isolate() {
            return Err(Error::IsolateRefused {
                unit: unit.id(),
            });
        }

        let id = self.jm.exec(&JobConf::new(&unit, JobKind::Start), JobMode::Isolate)?;
        self.rt.push_dbus_queue(unit);
        Ok(id)
    }

    fn kill_unit(&self, name: &str, who: KillWho, signal: i32) -> Result<()> {
        let unit = self.lookup(name)?;
        unit.kill(who, signal)
    }

    fn clean_unit(&self, name: &str) -> Result<()> {
        let unit = self.lookup(name)?;
        if !unit.can_clean() {
            return Err(Error::JobNotApplicable {
                kind: "clean".to_string(),
                unit: unit.id(),
            });
        }
        unit.clean()
    }

    fn can_clean_unit(&self, name: &str) -> Result<bool> {
        let unit = self.lookup(name)?;
        Ok(unit.can_clean())
    }

    fn reset_failed(&self, name: &str) -> Result<()> {
        let unit = self.lookup(name)?;
        unit.reset_failed();
        self.rt.push_dbus_queue(unit);
        Ok(())
    }

    fn set_property(&self, name: &str, key: &str, value: &str) -> Result<()> {
        let unit = self.lookup(name)?;
        unit.set_property(key, value, UnitWriteFlags::RUNTIME)?;
        self.rt.push_dbus_queue(unit);
        Ok(())
    }

    fn start_transient_unit(
        &self,
        name: &str,
        properties: &[(String, String)],
    ) -> Result<u64> {
        let unit_type = unit_name_to_type(name);
        if unit_type == UnitType::UnitTypeInvalid {
            return Err(Error::InvalidName {
                name: name.to_string(),
            });
        }
        if !unit_vtable(unit_type).can_transient {
            return Err(Error::TransientNotAllowed);
        }

        if let Some(existing) = self.db.units_get(name) {
            if !existing.active_state().is_inactive_or_failed() {
                return Err(Error::UnitActionEBusy);
            }
        }

        // a transient unit gets a synthetic fragment built from the
        // submitted properties
        let mut frag = UnitFragment {
            mtime: basic::time_util::now_realtime(),
            ..UnitFragment::default()
        };
        for (key, value) in properties {
            if frag.unit.set_property(key, value).is_err()
                && frag.install.set_property(key, value).is_err()
            {
                frag.section.insert(key.clone(), value.clone());
            }
        }
        self.file.register_fragment(name, frag);

        let unit = self.load_unitx(name)?;
        unit.make_transient()?;
        unit.validate_load_state()?;

        log::info!("Starting transient unit {}", name);
        self.jm.exec(&JobConf::new(&unit, JobKind::Start), JobMode::Replace)
    }

    fn unit_remove_dependencies(&self, name: &str, mask: UnitDependencyMask) -> Result<()> {
        let unit = self.lookup(name)?;
        self.db.dep_remove_dependencies(&unit, mask);
        Ok(())
    }

    fn push_cgroup_event(&self, name: &str, oom: bool) -> Result<()> {
        let unit = self.lookup(name)?;
        if oom {
            self.rt.push_cgroup_oom_queue(unit);
        } else {
            self.rt.push_cgroup_empty_queue(unit);
        }
        Ok(())
    }

    fn get_unit_status(&self, name: &str) -> Result<String> {
        let unit = self.lookup(name)?;
        Ok(unit.dump())
    }

    fn get_all_units(&self) -> Vec<String> {
        self.db
            .units_get_all(None)
            .iter()
            .map(|u| u.id())
            .collect()
    }

    /// One event-loop tick worth of queue work: the published order, run
    /// to quiescence because dispatching one queue may feed another.
    fn dispatch_queues(&self) {
        loop {
            let mut busy = false;
            busy |= self.rt.dispatch_load_queue();
            busy |= self.rt.dispatch_target_dep_queue();
            busy |= self.rt.dispatch_gc_queue(&self.jm);
            busy |= self.dispatch_cleanup_queue();
            busy |= self.rt.dispatch_cgroup_realize_queue();
            busy |= self.rt.dispatch_cgroup_empty_queue();
            busy |= self.rt.dispatch_cgroup_oom_queue();
            busy |= self.rt.dispatch_stop_when_unneeded_queue(&self.jm);
            busy |= self.bus.dispatch_dbus_queue(&self.rt);
            busy |= self.jm.dispatch_run_queue();
            if !busy {
                break;
            }
        }
    }

    /// Free everything the collector handed over.
    fn dispatch_cleanup_queue(&self) -> bool {
        let mut did_work = false;
        while let Some(unit) = self.rt.pop_cleanup_queue() {
            did_work = true;

            if self.jm.has_job(&unit) {
                // resurrected between sweep and cleanup
                continue;
            }

            log::debug!("Releasing unit {}", unit.id());
            unit.release_resources();
            if unit.transient() {
                unit.remove_transient();
            }
            self.db.dep_remove_unit(&unit);
            self.db.child_unwatch_all_pids(&unit);
            self.unit_unref_uid_gid(&unit);
            self.bus.announce_removed(&unit);

            for name in unit.names() {
                if let Some(mapped) = self.db.units_get(&name) {
                    if Rc::ptr_eq(&mapped, &unit) {
                        self.db.unit_remove(&name);
                    }
                }
            }
            unit.sub_done();
        }
        did_work
    }

    fn enumerate_perpetual(&self) {
        if !self.registry.supported(UnitType::UnitSlice) {
            return;
        }
        if self.db.units_get(SLICE_ROOT).is_some() {
            return;
        }

        let unit = match self.load.try_new_unit(SLICE_ROOT) {
            Some(u) => u,
            None => return,
        };
        log::debug!("Enumerating perpetual unit {}", SLICE_ROOT);
        unit.set_perpetual();
        unit.set_load_state(UnitLoadState::Loaded);
        self.db.units_insert(SLICE_ROOT.to_string(), Rc::clone(&unit));
        unit.coldplug();
        self.rt.push_dbus_queue(unit);
    }

    fn serialize(&self) -> Result<(Vec<u8>, FdSet)> {
        let mut buf = Vec::new();
        let mut fds = FdSet::new();
        {
            let mut ser = Serializer::new(&mut buf, &mut fds);
            ser.item_u64("serialization-version", 1)?;
            ser.item_u64(
                "manager-timestamp",
                basic::time_util::now_realtime(),
            )?;
            ser.end_record()?;

            for unit in self.db.units_get_all(None) {
                if unit.load_state() == UnitLoadState::Merged {
                    // the survivor carries the merged names
                    continue;
                }
                ser.item("unit", &unit.id())?;
                unit.serialize(&mut ser)?;
                ser.end_record()?;
            }
        }
        Ok((buf, fds))
    }

    fn deserialize(&self, reader: &mut dyn BufRead, fds: &mut FdSet) -> Result<()> {
        // manager record first; unknown keys are fine
        let manager_record = Record::read(reader)?;
        if manager_record.is_none() {
            return Ok(());
        }

        while let Some(record) = Record::read(reader)? {
            let name = match record.get("unit") {
                Some(n) => n.to_string(),
                None => continue,
            };
            let unit = match self.load.prepare_unit(&name) {
                Some(u) => u,
                None => {
                    log::warn!("Cannot recreate unit {} from serialization", name);
                    continue;
                }
            };
            unit.deserialize(&record, fds);
        }

        self.rt.dispatch_load_queue();
        self.rt.dispatch_target_dep_queue();
        Ok(())
    }

    fn coldplug(&self) {
        for unit in self.db.units_get_all(None) {
            unit.coldplug();
        }
    }

    fn catchup(&self) {
        for unit in self.db.units_get_all(None) {
            unit.catchup();
        }
    }

    fn distribute_fds(&self, fds: &mut FdSet) {
        for unit in self.db.units_get_all(None) {
            unit.distribute_fds(fds);
        }
    }

    fn entry_clear(&self) {
        // the fragment store stays: it is the loader's input, not our state
        self.jm.entry_clear();
        self.rt.entry_clear();
        self.db.entry_clear();
    }

    /* uid/gid reference counting; the counter drives external IPC cleanup */

    pub(crate) fn unit_ref_uid_gid(&self, unit: &UnitX, uid: Option<u32>, gid: Option<u32>) {
        if let Some(uid) = uid {
            *self.uid_refs.borrow_mut().entry(uid).or_insert(0) += 1;
        }
        if let Some(gid) = gid {
            *self.gid_refs.borrow_mut().entry(gid).or_insert(0) += 1;
        }
        unit.set_ref_uid_gid(uid, gid);
    }

    pub(crate) fn unit_unref_uid_gid(&self, unit: &UnitX) {
        if let Some(uid) = unit.ref_uid() {
            let mut refs = self.uid_refs.borrow_mut();
            if let Some(count) = refs.get_mut(&uid) {
                *count -= 1;
                if *count == 0 {
                    refs.remove(&uid);
                    log::debug!("Last reference to uid {} dropped", uid);
                }
            }
        }
        if let Some(gid) = unit.ref_gid() {
            let mut refs = self.gid_refs.borrow_mut();
            if let Some(count) = refs.get_mut(&gid) {
                *count -= 1;
                if *count == 0 {
                    refs.remove(&gid);
                    log::debug!("Last reference to gid {} dropped", gid);
                }
            }
        }
        unit.set_ref_uid_gid(None, None);
    }

    /* the notifier */

    fn unit_notify(&self, id: &str, state: &UnitState) {
        let unit = match self.db.units_get(id) {
            None => return,
            Some(v) => v,
        };
        let (os, ns, flags) = (state.os, state.ns, state.flags);

        if os != ns {
            if flags.contains(UnitNotifyFlags::SKIP_CONDITION) {
                // a failed condition check is not an error
                log::debug!(
                    "unit: {}, invocation: {}, skipped, changed {} -> {}",
                    unit.id(),
                    unit.invocation_id(),
                    os,
                    ns
                );
            } else {
                log::info!(
                    "unit: {}, invocation: {}, changed {} -> {}",
                    unit.id(),
                    unit.invocation_id(),
                    os,
                    ns
                );
            }
        }

        // let the installed job observe the transition
        self.jm.try_finish(&unit, os, ns, flags);

        // tell everybody who triggers the unit
        for triggerer in self
            .db
            .dep_gets_unit(&unit, UnitRelations::UnitTriggeredBy)
        {
            triggerer.trigger(&unit);
        }

        // cgroups materialize when activation begins
        if !os.is_active_or_activating() && ns.is_active_or_activating() {
            self.rt.push_cgroup_realize_queue(Rc::clone(&unit));
        }

        // leaving the active side: things may have become unneeded
        if os.is_active_or_reloading() && !ns.is_active_or_reloading() {
            self.rt.push_stop_when_unneeded_queue(Rc::clone(&unit));
            for dep in self
                .db
                .dep_gets_atom(&unit, UnitRelationAtom::UnitAtomAddStopWhenUnneededQueue)
            {
                self.rt.push_stop_when_unneeded_queue(dep);
            }
        }

        // once-only types never auto-restart, their failure is final
        let will_restart = flags.contains(UnitNotifyFlags::WILL_AUTO_RESTART)
            && !unit_vtable(unit.unit_type()).once_only;

        if ns == UnitActiveState::Failed && !will_restart {
            self.start_dependent_units(&unit, UnitRelations::UnitOnFailure);
            let action = unit.get_failure_action();
            if !action.is_none() {
                let status = unit
                    .failure_action_exit_status()
                    .unwrap_or_else(|| unit.exit_status());
                self.execute_emergency_action(&unit, action, status, "unit failed");
            }
        }

        if ns == UnitActiveState::InActive
            && !os.is_inactive_or_failed()
            && !will_restart
            && !flags.contains(UnitNotifyFlags::SKIP_CONDITION)
        {
            self.start_dependent_units(&unit, UnitRelations::UnitOnSuccess);
            let action = unit.get_success_action();
            if !action.is_none() {
                let status = unit.success_action_exit_status().unwrap_or(0);
                self.execute_emergency_action(&unit, action, status, "unit succeeded");
            }
        }

        self.rt.push_dbus_queue(Rc::clone(&unit));
        self.rt.push_gc_queue(unit);
    }

    fn start_dependent_units(&self, unit: &Rc<UnitX>, relation: UnitRelations) {
        for other in self.db.dep_gets_unit(unit, relation) {
            log::info!(
                "Triggering {} dependency of {}: {}",
                relation,
                unit.id(),
                other.id()
            );
            if let Err(e) = self
                .jm
                .exec(&JobConf::new(&other, JobKind::Start), JobMode::Replace)
            {
                log::error!("Failed to enqueue start job for {}: {}", other.id(), e);
            }
        }
    }

    fn execute_emergency_action(
        &self,
        unit: &Rc<UnitX>,
        action: UnitEmergencyAction,
        exit_status: i32,
        reason: &str,
    ) {
        let reboot_arg = unit.reboot_arg();
        match action {
            UnitEmergencyAction::None => {}
            UnitEmergencyAction::Reboot
            | UnitEmergencyAction::RebootForce
            | UnitEmergencyAction::RebootImmediate => {
                log::error!(
                    "Rebooting ({}), triggered by {} (argument: '{}')",
                    reason,
                    unit.id(),
                    reboot_arg
                );
                *self.state.borrow_mut() = State::Reboot;
            }
            UnitEmergencyAction::Poweroff
            | UnitEmergencyAction::PoweroffForce
            | UnitEmergencyAction::PoweroffImmediate => {
                log::error!("Powering off ({}), triggered by {}", reason, unit.id());
                *self.state.borrow_mut() = State::PowerOff;
            }
            UnitEmergencyAction::Exit | UnitEmergencyAction::ExitForce => {
                log::error!(
                    "Exiting with status {} ({}), triggered by {}",
                    exit_status,
                    reason,
                    unit.id()
                );
                *self.state.borrow_mut() = State::Exit;
            }
        }
    }
}

impl TableSubscribe<String, UnitState> for UnitManager {
    fn notify(&self, op: &TableOp<String, UnitState>) {
        match op {
            TableOp::TableInsert(name, config) => self.unit_notify(name, config),
            TableOp::TableRemove(_, _) => {}
        }
    }
}

impl TableSubscribe<String, StartLimitResult> for UnitManager {
    fn notify(&self, op: &TableOp<String, StartLimitResult>) {
        if let TableOp::TableInsert(name, StartLimitResult::StartLimitHit) = op {
            let unit = match self.db.units_get(name) {
                None => return,
                Some(v) => v,
            };
            log::warn!("Start of {} was rate limited", unit.id());
            let action = unit.get_start_limit_action();
            if !action.is_none() {
                let status = unit.failure_action_exit_status().unwrap_or(1);
                self.execute_emergency_action(&unit, action, status, "start limit hit");
            }
        }
    }
}

impl TableSubscribe<String, JobResult> for UnitManager {
    fn notify(&self, op: &TableOp<String, JobResult>) {
        if let TableOp::TableInsert(name, JobResult::TimeOut) = op {
            let unit = match self.db.units_get(name) {
                None => return,
                Some(v) => v,
            };
            self.jm.timeout_unit(name);
            let action = unit.get_job_timeout_action();
            if !action.is_none() {
                self.execute_emergency_action(&unit, action, 1, "job timed out");
            }
        }
    }
}

impl UmIf for UnitManager {
    fn unit_add_dependency(
        &self,
        unit_name: &str,
        relation: UnitRelations,
        target_name: &str,
        add_ref: bool,
        mask: UnitDependencyMask,
    ) -> Result<()> {
        let s_unit = self.load_unitx(unit_name)?;
        let t_unit = self.load_unitx(target_name)?;

        self.db.dep_insert(s_unit, relation, t_unit, add_ref, mask)
    }

    fn unit_has_dependency(
        &self,
        s_u_name: &str,
        atom: UnitRelationAtom,
        t_u_name: &str,
    ) -> bool {
        let s_unit = match self.db.units_get(s_u_name) {
            Some(unit) => unit,
            None => return false,
        };

        if t_u_name.is_empty() {
            return !self.db.dep_gets_atom(&s_unit, atom).is_empty();
        }

        let t_unit = match self.db.units_get(t_u_name) {
            Some(unit) => unit,
            None => return false,
        };

        self.db.dep_is_dep_atom_with(&s_unit, atom, &t_unit)
    }

    fn get_dependency_list(&self, unit_name: &str, atom: UnitRelationAtom) -> Vec<String> {
        let unit = match self.db.units_get(unit_name) {
            Some(unit) => unit,
            None => return Vec::new(),
        };
        self.db
            .dep_gets_atom(&unit, atom)
            .iter()
            .map(|u| u.id())
            .collect()
    }

    fn has_stop_job(&self, unit_name: &str) -> bool {
        match self.db.units_get(unit_name) {
            None => false,
            Some(u) => self.jm.has_stop_job(&u),
        }
    }

    fn relation_active_or_pending(&self, unit_name: &str) -> bool {
        for dep in self.db.dep_gets(unit_name, UnitRelations::UnitTriggers) {
            if dep.active_or_activating() {
                return true;
            }
        }
        false
    }

    fn unit_start_by_job(&self, unit_name: &str) -> Result<()> {
        self.start_unit(unit_name, false).map(|_| ())
    }
}
