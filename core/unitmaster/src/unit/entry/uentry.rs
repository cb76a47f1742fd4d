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

use super::base::UeBase;
use super::bus::UeBus;
use super::cgroup::UeCgroup;
use super::child::UeChild;
use super::condition::{assert_keys::*, condition_keys::*, UeCondition};
use super::config::{UeConfig, UnitEmergencyAction};
use super::load::UeLoad;
use super::ratelimit::{RateLimit, StartLimit, StartLimitResult};
use super::refs::{UnitRef, UnitRefCell};
use super::unitx::UnitX;
use crate::error::*;
use crate::serialize::{FdSet, Record, Serializer};
use crate::unit::base::{
    CollectMode, KillWho, UnitActiveState, UnitDependencyMask, UnitLoadState, UnitNotifyFlags,
    UnitType, UnitWriteFlags,
};
use crate::unit::data::{DataManager, UnitState};
use crate::unit::sub::{unit_vtable, SubUnit, UnitBase};
use crate::unit::util::UnitFileStore;
use basic::id128::Id128;
use basic::time_util::{DualTimestamp, UnitTimeStamp};
use bitflags::bitflags;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;

bitflags! {
    /// Which of the manager queues the unit is currently linked on. The
    /// flag and the queue linkage are always mutated together.
    pub(crate) struct UnitQueueFlags: u16 {
        const LOAD               = 1 << 0;
        const TARGET_DEPS        = 1 << 1;
        const GC                 = 1 << 2;
        const CLEANUP            = 1 << 3;
        const CGROUP_REALIZE     = 1 << 4;
        const CGROUP_EMPTY       = 1 << 5;
        const CGROUP_OOM         = 1 << 6;
        const STOP_WHEN_UNNEEDED = 1 << 7;
        const DBUS               = 1 << 8;
    }
}

///
pub struct Unit {
    // associated objects
    dm: Rc<DataManager>,

    // owned objects
    base: Rc<UeBase>,

    config: Rc<UeConfig>,
    load: UeLoad,
    child: UeChild,
    cgroup: UeCgroup,
    conditions: Rc<UeCondition>,
    start_limit: StartLimit,
    auto_stop_ratelimit: RefCell<RateLimit>,
    sub: Box<dyn SubUnit>,
    merged_into: RefCell<Option<Rc<UnitX>>>,
    slice: UnitRef,
    refs_by_target: RefCell<Vec<UnitRefCell>>,
    requires_mounts_for: RefCell<HashMap<PathBuf, UnitDependencyMask>>,
    queue_flags: Cell<UnitQueueFlags>,
    gc_marker: Cell<u32>,
    invocation_id: RefCell<Id128>,
    timestamp: Rc<RefCell<UnitTimeStamp>>,
    perpetual: Cell<bool>,
    coldplugged: Cell<bool>,
    sent_dbus_new_signal: Cell<bool>,
    ref_uid: Cell<i64>,
    ref_gid: Cell<i64>,
    bus: UeBus,
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.base.unit_type() == other.base.unit_type() && self.base.id() == other.base.id()
    }
}

impl Eq for Unit {}

impl PartialOrd for Unit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Unit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.base.id().cmp(&other.base.id())
    }
}

impl Hash for Unit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.id().hash(state);
    }
}

impl UnitBase for Unit {
    fn id(&self) -> String {
        self.id()
    }

    fn unit_type(&self) -> UnitType {
        self.unit_type()
    }

    fn test_start_limit(&self) -> bool {
        self.test_start_limit()
    }

    fn reset_start_limit(&self) {
        self.reset_start_limit()
    }

    fn notify(
        &self,
        original_state: UnitActiveState,
        new_state: UnitActiveState,
        flags: UnitNotifyFlags,
    ) {
        self.notify(original_state, new_state, flags);
    }

    fn default_dependencies(&self) -> bool {
        self.default_dependencies()
    }

    fn ignore_on_isolate(&self) -> bool {
        self.ignore_on_isolate()
    }

    fn transient(&self) -> bool {
        self.load.transient()
    }

    fn cg_path(&self) -> PathBuf {
        self.cg_path()
    }

    fn get_unit_timestamp(&self) -> Rc<RefCell<UnitTimeStamp>> {
        Rc::clone(&self.timestamp)
    }
}

impl Unit {
    pub(super) fn new(
        unit_type: UnitType,
        name: &str,
        dmr: &Rc<DataManager>,
        filer: &Rc<UnitFileStore>,
        sub: Box<dyn SubUnit>,
    ) -> Rc<Unit> {
        let _base = Rc::new(UeBase::new(String::from(name), unit_type));
        let _config = Rc::new(UeConfig::new());
        let _u = Rc::new(Unit {
            dm: Rc::clone(dmr),
            base: Rc::clone(&_base),
            config: Rc::clone(&_config),
            load: UeLoad::new(dmr, filer, &_base, &_config),
            child: UeChild::new(),
            cgroup: UeCgroup::new(),
            conditions: UeCondition::new(),
            start_limit: StartLimit::new(),
            auto_stop_ratelimit: RefCell::new(RateLimit::new(
                10 * basic::time_util::USEC_PER_SEC,
                16,
            )),
            sub,
            merged_into: RefCell::new(None),
            slice: UnitRef::new(),
            refs_by_target: RefCell::new(Vec::new()),
            requires_mounts_for: RefCell::new(HashMap::new()),
            queue_flags: Cell::new(UnitQueueFlags::empty()),
            gc_marker: Cell::new(0),
            invocation_id: RefCell::new(Id128::default()),
            timestamp: Rc::new(RefCell::new(UnitTimeStamp::default())),
            perpetual: Cell::new(false),
            coldplugged: Cell::new(false),
            sent_dbus_new_signal: Cell::new(false),
            ref_uid: Cell::new(-1),
            ref_gid: Cell::new(-1),
            bus: UeBus::new(&_config),
        });
        let owner = Rc::clone(&_u);
        _u.sub.attach_unit(owner);
        _u
    }

    fn conditions(&self) -> Rc<UeCondition> {
        if !self.conditions.initialized() {
            let config_data = self.config.config_data();
            let data = config_data.borrow();
            let table = [
                (CONDITION_PATH_EXISTS, &data.Unit.ConditionPathExists),
                (CONDITION_PATH_IS_DIRECTORY, &data.Unit.ConditionPathIsDirectory),
                (
                    CONDITION_PATH_IS_SYMBOLIC_LINK,
                    &data.Unit.ConditionPathIsSymbolicLink,
                ),
                (
                    CONDITION_DIRECTORY_NOT_EMPTY,
                    &data.Unit.ConditionDirectoryNotEmpty,
                ),
                (CONDITION_FILE_NOT_EMPTY, &data.Unit.ConditionFileNotEmpty),
                (
                    CONDITION_FILE_IS_EXECUTABLE,
                    &data.Unit.ConditionFileIsExecutable,
                ),
            ];
            for (key, params) in table {
                if !params.is_empty() {
                    self.conditions.add_condition(key, params.clone());
                }
            }
            if !data.Unit.AssertPathExists.is_empty() {
                self.conditions
                    .add_assert(ASSERT_PATH_EXISTS, data.Unit.AssertPathExists.clone());
            }
            self.conditions.set_initialized();
        }
        Rc::clone(&self.conditions)
    }

    ///
    pub fn notify(
        &self,
        original_state: UnitActiveState,
        new_state: UnitActiveState,
        flags: UnitNotifyFlags,
    ) {
        if original_state != new_state {
            log::debug!(
                "unit {} active state change from: {} to {}",
                self.id(),
                original_state,
                new_state
            );
        }

        {
            let mut unit_timestamp = self.timestamp.borrow_mut();

            unit_timestamp.state_change_timestamp = DualTimestamp::now();

            if original_state.is_inactive_or_failed() && !new_state.is_inactive_or_failed() {
                unit_timestamp.inactive_exit_timestamp = unit_timestamp.state_change_timestamp;
            } else if !original_state.is_inactive_or_failed()
                && new_state.is_inactive_or_failed()
            {
                unit_timestamp.inactive_enter_timestamp = unit_timestamp.state_change_timestamp;
            }

            if !original_state.is_active_or_reloading() && new_state.is_active_or_reloading() {
                unit_timestamp.active_enter_timestamp = unit_timestamp.state_change_timestamp;
            } else if original_state.is_active_or_reloading()
                && !new_state.is_active_or_reloading()
            {
                unit_timestamp.active_exit_timestamp = unit_timestamp.state_change_timestamp;
            }

            if flags.contains(UnitNotifyFlags::SKIP_CONDITION) {
                unit_timestamp.condition_timestamp = unit_timestamp.state_change_timestamp;
            }
        }

        if !original_state.is_active_or_reloading() && new_state.is_active_or_reloading() {
            let id = Id128::random();
            log::debug!("unit {} got invocation id {}", self.id(), id);
            *self.invocation_id.borrow_mut() = id;
        }

        let u_state = UnitState::new(original_state, new_state, flags);
        self.dm.insert_unit_state(self.id(), u_state);
    }

    ///
    pub fn id(&self) -> String {
        self.base.id()
    }

    ///
    pub fn set_id(&self, id: &str) {
        self.base.set_id(id)
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.base.names()
    }

    pub(crate) fn insert_name(&self, name: &str) {
        self.base.insert_name(name)
    }

    pub(crate) fn has_name(&self, name: &str) -> bool {
        self.base.has_name(name)
    }

    pub(crate) fn merge_names_from(&self, other: &Unit) {
        self.base.merge_names(&other.base)
    }

    /// the instance part of an "@" name
    pub fn instance(&self) -> Option<String> {
        self.base.instance()
    }

    /// return description
    pub fn get_description(&self) -> Option<String> {
        self.load.get_description()
    }

    /// return documentation
    pub fn get_documentation(&self) -> Option<String> {
        self.load.get_documentation()
    }

    /// return the cgroup path of the unit
    pub fn cg_path(&self) -> PathBuf {
        self.cgroup.cg_path()
    }

    pub(crate) fn cgroup(&self) -> &UeCgroup {
        &self.cgroup
    }

    pub(crate) fn setup_cgroup_path(&self) {
        self.cgroup.setup_cg_path(&self.id());
    }

    ///
    pub fn default_dependencies(&self) -> bool {
        self.config.config_data().borrow().Unit.DefaultDependencies
    }

    ///
    pub fn ignore_on_isolate(&self) -> bool {
        self.config.config_data().borrow().Unit.IgnoreOnIsolate
    }

    ///
    pub fn set_ignore_on_isolate(&self, ignore_on_isolate: bool) {
        self.config.config_data().borrow_mut().Unit.IgnoreOnIsolate = ignore_on_isolate;
    }

    ///
    pub fn allow_isolate(&self) -> bool {
        self.config.config_data().borrow().Unit.AllowIsolate
    }

    ///
    pub fn refuse_manual_start(&self) -> bool {
        self.config.config_data().borrow().Unit.RefuseManualStart
    }

    ///
    pub fn refuse_manual_stop(&self) -> bool {
        self.config.config_data().borrow().Unit.RefuseManualStop
    }

    ///
    pub fn stop_when_unneeded(&self) -> bool {
        self.config.config_data().borrow().Unit.StopWhenUnneeded
    }

    ///
    pub fn collect_mode(&self) -> CollectMode {
        let raw = self.config.config_data().borrow().Unit.CollectMode.clone();
        CollectMode::from_str(&raw).unwrap_or_default()
    }

    ///
    pub fn get_success_action(&self) -> UnitEmergencyAction {
        self.config.config_data().borrow().Unit.SuccessAction
    }

    ///
    pub fn get_failure_action(&self) -> UnitEmergencyAction {
        self.config.config_data().borrow().Unit.FailureAction
    }

    ///
    pub fn get_start_limit_action(&self) -> UnitEmergencyAction {
        self.config.config_data().borrow().Unit.StartLimitAction
    }

    pub(crate) fn get_job_timeout_action(&self) -> UnitEmergencyAction {
        self.config.config_data().borrow().Unit.JobTimeoutAction
    }

    pub(crate) fn job_timeout(&self) -> u64 {
        self.config.config_data().borrow().Unit.JobTimeoutSec
    }

    pub(crate) fn success_action_exit_status(&self) -> Option<i32> {
        self.config
            .config_data()
            .borrow()
            .Unit
            .SuccessActionExitStatus
    }

    pub(crate) fn failure_action_exit_status(&self) -> Option<i32> {
        self.config
            .config_data()
            .borrow()
            .Unit
            .FailureActionExitStatus
    }

    pub(crate) fn reboot_arg(&self) -> String {
        self.config.config_data().borrow().Unit.RebootArgument.clone()
    }

    ///
    pub fn current_active_state(&self) -> UnitActiveState {
        self.sub.current_active_state()
    }

    ///
    pub fn get_subunit_state(&self) -> String {
        self.sub.get_subunit_state()
    }

    /// test start rate, if started more than burst times in the interval, refuse
    pub fn test_start_limit(&self) -> bool {
        let interval = self.config.config_data().borrow().Unit.StartLimitInterval;
        let burst = self.config.config_data().borrow().Unit.StartLimitBurst;
        if interval > 0 && burst > 0 {
            self.start_limit.init_from_config(interval, burst);
        }

        if self.start_limit.ratelimit_below() {
            self.start_limit.set_hit(false);
            self.dm
                .insert_start_limit_result(self.id(), StartLimitResult::StartLimitNotHit);
            return true;
        }

        self.start_limit.set_hit(true);
        self.dm
            .insert_start_limit_result(self.id(), StartLimitResult::StartLimitHit);
        false
    }

    pub(crate) fn reset_start_limit(&self) {
        self.start_limit.reset_limit()
    }

    /// keep the unneeded/bound stop logic from looping endlessly
    pub(crate) fn test_auto_stop_ratelimit(&self) -> bool {
        self.auto_stop_ratelimit.borrow_mut().ratelimit_below()
    }

    pub(crate) fn trigger(&self, other: &Self) {
        let other_unit_id = other.id();
        self.sub.trigger(&other_unit_id);
    }

    pub(crate) fn in_queue(&self, flag: UnitQueueFlags) -> bool {
        self.queue_flags.get().contains(flag)
    }

    pub(crate) fn set_in_queue(&self, flag: UnitQueueFlags, t: bool) {
        let mut flags = self.queue_flags.get();
        if t {
            flags.insert(flag);
        } else {
            flags.remove(flag);
        }
        self.queue_flags.set(flags);
    }

    pub(crate) fn gc_marker(&self) -> u32 {
        self.gc_marker.get()
    }

    pub(crate) fn set_gc_marker(&self, marker: u32) {
        self.gc_marker.set(marker);
    }

    pub(crate) fn get_real_name(&self) -> String {
        self.load.get_real_name()
    }

    pub(crate) fn get_all_names(&self) -> Vec<String> {
        self.load.get_all_names()
    }

    pub(crate) fn set_merge_into(&self, unit: Option<Rc<UnitX>>) {
        *self.merged_into.borrow_mut() = unit;
    }

    pub(crate) fn merged_into(&self) -> Option<Rc<UnitX>> {
        self.merged_into.borrow().clone()
    }

    pub(crate) fn push_ref_cell(&self, cell: UnitRefCell) {
        self.refs_by_target.borrow_mut().push(cell);
    }

    pub(crate) fn remove_ref_cell(&self, cell: &UnitRefCell) {
        self.refs_by_target
            .borrow_mut()
            .retain(|c| !Rc::ptr_eq(c, cell));
    }

    pub(crate) fn take_ref_cells(&self) -> Vec<UnitRefCell> {
        self.refs_by_target.borrow_mut().drain(..).collect()
    }

    /// something still points at the unit through a named reference
    pub(crate) fn pinned(&self) -> bool {
        !self.refs_by_target.borrow().is_empty()
    }

    pub(crate) fn slice_ref(&self) -> &UnitRef {
        &self.slice
    }

    pub(crate) fn set_slice(&self, slice: &Rc<UnitX>) {
        self.slice.set(&self.id(), slice);
    }

    pub(crate) fn add_requires_mounts_for(&self, path: PathBuf, mask: UnitDependencyMask) {
        let mut map = self.requires_mounts_for.borrow_mut();
        let entry = map.entry(path).or_insert_with(UnitDependencyMask::empty);
        entry.insert(mask);
    }

    /// the paths the unit needs mounted, with the provenance per path
    pub fn requires_mounts_for(&self) -> Vec<(PathBuf, UnitDependencyMask)> {
        self.requires_mounts_for
            .borrow()
            .iter()
            .map(|(p, m)| (p.clone(), *m))
            .collect()
    }

    pub(crate) fn flush_requires_mounts_for(&self, mask: UnitDependencyMask) {
        let mut map = self.requires_mounts_for.borrow_mut();
        for value in map.values_mut() {
            value.remove(mask);
        }
        map.retain(|_, m| !m.is_empty());
    }

    pub(crate) fn load_unit(&self) -> Result<()> {
        match self.load.load_unit_confs() {
            Ok(section) => {
                log::debug!("Begin exec sub class load for {}", self.id());
                if let Err(err) = self.sub.load(&section) {
                    match err {
                        Error::BadSetting { .. } => {
                            self.load.set_load_state(UnitLoadState::BadSetting)
                        }
                        _ => self.load.set_load_state(UnitLoadState::Error),
                    }
                    self.load.set_load_error(Some(err.to_string()));
                    return Err(err);
                }

                self.load.set_load_state(UnitLoadState::Loaded);
                self.load.set_load_error(None);
                Ok(())
            }
            Err(Error::Masked) => {
                self.load.set_load_state(UnitLoadState::Masked);
                Err(Error::Masked)
            }
            Err(e) => {
                self.load.set_load_state(UnitLoadState::NotFound);
                Err(e)
            }
        }
    }

    /// Stub or Merged is a temporary state which represents an incomplete load
    pub fn load_complete(&self) -> bool {
        self.load_state() != UnitLoadState::Stub && self.load_state() != UnitLoadState::Merged
    }

    ///
    pub(crate) fn validate_load_state(&self) -> Result<()> {
        match self.load_state() {
            UnitLoadState::Stub | UnitLoadState::Merged => Err(Error::LoadError {
                msg: format!("unexpected load state of unit: {}", self.id()),
            }),
            UnitLoadState::Loaded => Ok(()),
            UnitLoadState::NotFound => Err(Error::LoadError {
                msg: format!("unit file is not found: {}", self.id()),
            }),
            UnitLoadState::Error => Err(Error::LoadError {
                msg: format!("load unit file failed, adjust the unit file: {}", self.id()),
            }),
            UnitLoadState::BadSetting => Err(Error::LoadError {
                msg: format!("unit file {} has bad setting", self.id()),
            }),
            UnitLoadState::Masked => Err(Error::Masked),
        }
    }

    pub(crate) fn get_perpetual(&self) -> bool {
        self.perpetual.get() || self.sub.get_perpetual()
    }

    pub(crate) fn set_perpetual(&self) {
        self.perpetual.set(true);
    }

    ///
    pub fn start(&self) -> Result<()> {
        let active_state = self.current_active_state();
        if active_state.is_active_or_reloading() {
            log::debug!(
                "The unit {} is already active or reloading, skipping.",
                self.id()
            );
            return Err(Error::UnitActionEAlready);
        }

        if active_state == UnitActiveState::Maintenance {
            log::error!("Failed to start {}: unit is in maintenance", self.id());
            return Err(Error::UnitActionEAgain);
        }

        if self.load_state() != UnitLoadState::Loaded {
            log::error!("Failed to start {}: unit hasn't been loaded.", self.id());
            return Err(Error::UnitActionEInval);
        }

        if active_state != UnitActiveState::Activating {
            let conditions = self.conditions();

            self.timestamp.borrow_mut().condition_timestamp = DualTimestamp::now();
            if !conditions.conditions_test() {
                log::info!("The condition check failed, not starting {}.", self.id());
                return Err(Error::UnitActionEComm);
            }

            self.timestamp.borrow_mut().assert_timestamp = DualTimestamp::now();
            if !conditions.asserts_test() {
                log::info!("The assert check failed, not starting {}.", self.id());
                return Err(Error::UnitActionEProto);
            }
        }

        self.sub.start()
    }

    ///
    pub fn stop(&self, force: bool) -> Result<()> {
        if !force {
            let active_state = self.current_active_state();
            if active_state.is_inactive_or_failed() {
                log::debug!(
                    "The unit {} is already inactive or dead, skipping.",
                    self.id()
                );
                return Err(Error::UnitActionEAlready);
            }
        }

        self.sub.stop(force)
    }

    /// reload the unit
    pub fn reload(&self) -> Result<()> {
        if !self.sub.can_reload() {
            log::info!("Unit {} can not be reloaded", self.id());
            return Err(Error::UnitActionEBadR);
        }

        let active_state = self.current_active_state();
        if active_state == UnitActiveState::Reloading {
            log::info!("Unit {} is already reloading", self.id());
            return Err(Error::UnitActionEAgain);
        }

        if active_state != UnitActiveState::Active {
            log::info!("Unit {} is not active, no need to reload", self.id());
            return Err(Error::UnitActionENoExec);
        }

        log::info!("Reloading {}", self.id());
        match self.sub.reload() {
            Ok(_) => Ok(()),
            Err(e) => match e {
                Error::UnitActionEOpNotSupp => {
                    self.notify(active_state, active_state, UnitNotifyFlags::empty());
                    Ok(())
                }
                _ => Err(e),
            },
        }
    }

    ///
    pub fn kill(&self, who: KillWho, signal: i32) -> Result<()> {
        self.sub.kill(who, signal)
    }

    ///
    pub fn clean(&self) -> Result<()> {
        let state = self.current_active_state();
        if !state.is_inactive_or_failed() {
            return Err(Error::UnitActionEBusy);
        }
        self.sub.clean()
    }

    ///
    pub fn can_clean(&self) -> bool {
        self.sub.can_clean()
    }

    ///
    pub fn can_reload(&self) -> bool {
        self.sub.can_reload()
    }

    pub(crate) fn reset_failed(&self) {
        self.sub.reset_failed();
        self.reset_start_limit();
    }

    pub(crate) fn sigchld_events(&self, wait_status: WaitStatus) {
        self.sub.sigchld_events(wait_status)
    }

    pub(crate) fn sigchldgen(&self) -> u64 {
        self.child.sigchldgen()
    }

    pub(crate) fn set_sigchldgen(&self, gen: u64) {
        self.child.set_sigchldgen(gen)
    }

    pub fn load_state(&self) -> UnitLoadState {
        self.load.load_state()
    }

    pub fn set_load_state(&self, state: UnitLoadState) {
        self.load.set_load_state(state)
    }

    /// what went wrong the last time loading was attempted
    pub fn load_error(&self) -> Option<String> {
        self.load.load_error()
    }

    pub fn load_paths(&self) -> Vec<PathBuf> {
        self.load.paths()
    }

    /// a newer fragment exists than what is loaded in
    pub fn need_daemon_reload(&self) -> bool {
        self.load.need_daemon_reload()
    }

    pub(crate) fn transient(&self) -> bool {
        self.load.transient()
    }

    pub(crate) fn make_transient(&self) -> Result<()> {
        if !unit_vtable(self.unit_type()).can_transient {
            return Err(Error::TransientNotAllowed);
        }
        self.load.make_transient();
        Ok(())
    }

    pub(crate) fn remove_transient(&self) {
        self.load.remove_transient()
    }

    pub(crate) fn child_add_pids(&self, pid: Pid) {
        self.child.add_pids(pid);
    }

    pub(crate) fn child_remove_pids(&self, pid: Pid) {
        self.child.remove_pids(pid);
    }

    pub(crate) fn get_pids(&self) -> Vec<Pid> {
        self.child.get_pids()
    }

    pub(crate) fn clear_watched_pids(&self) {
        self.child.clear_pids()
    }

    pub(crate) fn unit_type(&self) -> UnitType {
        self.base.unit_type()
    }

    /// descriptors the unit wants carried across reexec
    pub fn collect_fds(&self) -> Vec<i32> {
        self.sub.collect_fds()
    }

    pub fn notify_message(
        &self,
        messages: &HashMap<&str, &str>,
        fds: Vec<i32>,
    ) -> Result<()> {
        self.sub.notify_message(messages, fds)
    }

    pub(crate) fn notify_cgroup_empty(&self) {
        self.sub.notify_cgroup_empty()
    }

    pub(crate) fn notify_cgroup_oom(&self) {
        self.sub.notify_cgroup_oom()
    }

    pub(crate) fn release_resources(&self) {
        self.sub.release_resources()
    }

    /// the unit is about to be restarted automatically
    pub fn will_restart(&self) -> bool {
        self.sub.will_restart()
    }

    /// id of the unit this one follows for state purposes
    pub fn following(&self) -> Option<String> {
        self.sub.following()
    }

    /// the set of units following each other with this one
    pub fn following_set(&self) -> Vec<String> {
        self.sub.following_set()
    }

    /// attributable one-liners for the per-type code to report outcomes
    pub fn log_success(&self) {
        log::info!("unit: {}, invocation: {}, succeeded.", self.id(), self.invocation_id());
    }

    pub fn log_failure(&self, result: &str) {
        log::warn!(
            "unit: {}, invocation: {}, failed with result '{}'.",
            self.id(),
            self.invocation_id(),
            result
        );
    }

    /// for checks that make a unit "done" rather than succeeded or failed
    pub fn log_skip(&self, result: &str) {
        log::info!(
            "unit: {}, invocation: {}, skipped ({}).",
            self.id(),
            self.invocation_id(),
            result
        );
    }

    pub(crate) fn exit_status(&self) -> i32 {
        self.sub.exit_status()
    }

    pub(crate) fn sub_done(&self) {
        self.sub.done()
    }

    pub fn get_unit_timestamp(&self) -> Rc<RefCell<UnitTimeStamp>> {
        Rc::clone(&self.timestamp)
    }

    pub(crate) fn invocation_id(&self) -> Id128 {
        *self.invocation_id.borrow()
    }

    pub(crate) fn set_invocation_id(&self, id: Id128) {
        *self.invocation_id.borrow_mut() = id;
    }

    /// cached verdict of the last condition check
    pub fn condition_result(&self) -> bool {
        self.conditions.condition_result()
    }

    /// cached verdict of the last assert check
    pub fn assert_result(&self) -> bool {
        self.conditions.assert_result()
    }

    pub(crate) fn sent_dbus_new_signal(&self) -> bool {
        self.sent_dbus_new_signal.get()
    }

    pub(crate) fn set_sent_dbus_new_signal(&self, sent: bool) {
        self.sent_dbus_new_signal.set(sent)
    }

    pub(crate) fn ref_uid(&self) -> Option<u32> {
        let uid = self.ref_uid.get();
        (uid >= 0).then(|| uid as u32)
    }

    pub(crate) fn ref_gid(&self) -> Option<u32> {
        let gid = self.ref_gid.get();
        (gid >= 0).then(|| gid as u32)
    }

    pub(crate) fn set_ref_uid_gid(&self, uid: Option<u32>, gid: Option<u32>) {
        self.ref_uid.set(uid.map(i64::from).unwrap_or(-1));
        self.ref_gid.set(gid.map(i64::from).unwrap_or(-1));
    }

    pub(crate) fn set_sub_property(
        &self,
        key: &str,
        value: &str,
        flags: UnitWriteFlags,
    ) -> Result<()> {
        self.sub.unit_set_property(key, value, flags)
    }

    pub(crate) fn set_property(&self, key: &str, value: &str, flags: UnitWriteFlags) -> Result<()> {
        match self.bus.set_property(key, value, flags) {
            Err(Error::NotFound { .. }) => self.set_sub_property(key, value, flags),
            other => other,
        }
    }

    /// Everything worth keeping across a reload that other sources cannot
    /// restore.
    pub(crate) fn serialize(&self, ser: &mut Serializer) -> Result<()> {
        ser.item("load-state", &self.load_state().to_string())?;
        if !self.invocation_id().is_null() {
            ser.item("invocation-id", &self.invocation_id().to_string())?;
        }

        {
            let ts = self.timestamp.borrow();
            ser.item_dual_ts("state-change-timestamp", &ts.state_change_timestamp)?;
            ser.item_dual_ts("inactive-exit-timestamp", &ts.inactive_exit_timestamp)?;
            ser.item_dual_ts("active-enter-timestamp", &ts.active_enter_timestamp)?;
            ser.item_dual_ts("active-exit-timestamp", &ts.active_exit_timestamp)?;
            ser.item_dual_ts("inactive-enter-timestamp", &ts.inactive_enter_timestamp)?;
            ser.item_dual_ts("condition-timestamp", &ts.condition_timestamp)?;
            ser.item_dual_ts("assert-timestamp", &ts.assert_timestamp)?;
        }

        ser.item_bool("condition-result", self.conditions.condition_result())?;
        ser.item_bool("assert-result", self.conditions.assert_result())?;

        let (begin, num) = self.start_limit.state();
        ser.item("start-limit-state", &format!("{} {}", begin, num))?;
        let (begin, num) = self.auto_stop_ratelimit.borrow().state();
        ser.item("auto-stop-ratelimit-state", &format!("{} {}", begin, num))?;

        if let Some(uid) = self.ref_uid() {
            ser.item_u64("ref-uid", uid as u64)?;
        }
        if let Some(gid) = self.ref_gid() {
            ser.item_u64("ref-gid", gid as u64)?;
        }

        let cg_path = self.cg_path();
        if !cg_path.as_os_str().is_empty() {
            ser.item("cgroup-path", &cg_path.to_string_lossy())?;
        }

        if self.transient() {
            ser.item_bool("transient", true)?;
        }

        self.sub.serialize(ser)
    }

    /// Restore the record written by [`Unit::serialize`]. The state is only
    /// recorded here; coldplug puts it into effect.
    pub(crate) fn deserialize(&self, record: &Record, fds: &mut FdSet) {
        let mut condition_result = self.conditions.condition_result();
        let mut assert_result = self.conditions.assert_result();

        for (key, value) in record.items() {
            match key.as_str() {
                "unit" => {}
                "load-state" => {
                    if let Ok(state) = UnitLoadState::from_str(value) {
                        self.load.set_load_state(state);
                    }
                }
                "invocation-id" => {
                    if let Ok(id) = value.parse::<Id128>() {
                        self.set_invocation_id(id);
                    }
                }
                "state-change-timestamp" => {
                    if let Some(ts) = record.get_dual_ts(key) {
                        self.timestamp.borrow_mut().state_change_timestamp = ts;
                    }
                }
                "inactive-exit-timestamp" => {
                    if let Some(ts) = record.get_dual_ts(key) {
                        self.timestamp.borrow_mut().inactive_exit_timestamp = ts;
                    }
                }
                "active-enter-timestamp" => {
                    if let Some(ts) = record.get_dual_ts(key) {
                        self.timestamp.borrow_mut().active_enter_timestamp = ts;
                    }
                }
                "active-exit-timestamp" => {
                    if let Some(ts) = record.get_dual_ts(key) {
                        self.timestamp.borrow_mut().active_exit_timestamp = ts;
                    }
                }
                "inactive-enter-timestamp" => {
                    if let Some(ts) = record.get_dual_ts(key) {
                        self.timestamp.borrow_mut().inactive_enter_timestamp = ts;
                    }
                }
                "condition-timestamp" => {
                    if let Some(ts) = record.get_dual_ts(key) {
                        self.timestamp.borrow_mut().condition_timestamp = ts;
                    }
                }
                "assert-timestamp" => {
                    if let Some(ts) = record.get_dual_ts(key) {
                        self.timestamp.borrow_mut().assert_timestamp = ts;
                    }
                }
                "condition-result" => {
                    if let Some(b) = record.get_bool(key) {
                        condition_result = b;
                    }
                }
                "assert-result" => {
                    if let Some(b) = record.get_bool(key) {
                        assert_result = b;
                    }
                }
                "start-limit-state" => {
                    if let Some((begin, num)) = parse_ratelimit_state(value) {
                        self.start_limit.set_state(begin, num);
                    }
                }
                "auto-stop-ratelimit-state" => {
                    if let Some((begin, num)) = parse_ratelimit_state(value) {
                        self.auto_stop_ratelimit.borrow_mut().set_state(begin, num);
                    }
                }
                "ref-uid" => {
                    if let Ok(uid) = value.parse::<u32>() {
                        self.ref_uid.set(uid as i64);
                    }
                }
                "ref-gid" => {
                    if let Ok(gid) = value.parse::<u32>() {
                        self.ref_gid.set(gid as i64);
                    }
                }
                "cgroup-path" => {
                    self.cgroup.set_cg_path(std::path::Path::new(value));
                }
                "transient" => {
                    if record.get_bool(key) == Some(true) {
                        self.load.make_transient();
                    }
                }
                _ => {
                    if let Err(e) = self.sub.deserialize_item(key, value, fds) {
                        log::debug!("Skipping unknown serialization key {}: {}", key, e);
                    }
                }
            }
        }

        self.conditions.set_results(condition_result, assert_result);
    }

    /// Put deserialized state into effect.
    pub(crate) fn coldplug(&self) {
        if self.coldplugged.get() {
            return;
        }
        self.coldplugged.set(true);
        self.sub.coldplug();
    }

    /// Catch up with state changes that happened while we were away.
    pub(crate) fn catchup(&self) {
        self.sub.catchup();
    }

    pub(crate) fn distribute_fds(&self, fds: &mut FdSet) {
        self.sub.distribute_fds(fds)
    }

    /// Unit-local part of the collection decision; the job check lives at
    /// the sweep site.
    pub(crate) fn may_gc(&self) -> bool {
        if self.get_perpetual() {
            return false;
        }

        if self.pinned() {
            return false;
        }

        if self.child.has_pids() {
            return false;
        }

        let state = self.current_active_state();
        let collectable = match self.collect_mode() {
            CollectMode::Inactive => state == UnitActiveState::InActive,
            CollectMode::InactiveOrFailed => state.is_inactive_or_failed(),
        };
        if !collectable {
            return false;
        }

        self.sub.may_gc()
    }

    ///
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("-> Unit {}:\n", self.id()));
        if let Some(desc) = self.get_description() {
            out.push_str(&format!("\tDescription: {}\n", desc));
        }
        out.push_str(&format!("\tLoad State: {}\n", self.load_state()));
        out.push_str(&format!(
            "\tActive State: {} ({})\n",
            self.current_active_state(),
            self.get_subunit_state()
        ));
        out.push_str(&format!("\tNames: {}\n", self.names().join(" ")));
        if !self.invocation_id().is_null() {
            out.push_str(&format!("\tInvocation ID: {}\n", self.invocation_id()));
        }
        let sub = self.sub.dump();
        if !sub.is_empty() {
            out.push_str(&sub);
        }
        out
    }
}

fn parse_ratelimit_state(value: &str) -> Option<(u64, u32)> {
    let (begin, num) = value.split_once(' ')?;
    Some((begin.parse().ok()?, num.parse().ok()?))
}
