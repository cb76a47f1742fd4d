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

//! The dispatch surface between the engine and the per-type modules.
//!
//! [`SubUnit`] is the only dynamic dispatch in the engine; everything else a
//! type declares about itself lives in the static [`UnitVTable`] capability
//! row. Modules register a constructor with the [`SubUnitRegistry`].

use super::base::{
    KillWho, UnitActiveState, UnitDependencyMask, UnitNotifyFlags, UnitRelationAtom,
    UnitRelations, UnitType, UnitWriteFlags,
};
use crate::error::*;
use crate::serialize::{FdSet, Serializer};
use basic::time_util::UnitTimeStamp;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// What a per-type module may ask of the unit that owns it.
pub trait UnitBase {
    ///
    fn id(&self) -> String;
    ///
    fn unit_type(&self) -> UnitType;
    /// consume a start-rate token; false when the limit is hit
    fn test_start_limit(&self) -> bool;
    ///
    fn reset_start_limit(&self);
    /// report a substate transition to the engine
    fn notify(&self, os: UnitActiveState, ns: UnitActiveState, flags: UnitNotifyFlags);
    ///
    fn default_dependencies(&self) -> bool;
    ///
    fn ignore_on_isolate(&self) -> bool;
    ///
    fn transient(&self) -> bool;
    ///
    fn cg_path(&self) -> PathBuf;
    ///
    fn get_unit_timestamp(&self) -> Rc<RefCell<UnitTimeStamp>>;
}

/// What a per-type module may ask of the manager.
pub trait UmIf {
    /// add a dependency between two units, loading them as needed
    fn unit_add_dependency(
        &self,
        _unit_name: &str,
        _relation: UnitRelations,
        _target_name: &str,
        _add_ref: bool,
        _mask: UnitDependencyMask,
    ) -> Result<()> {
        Err(Error::UnitActionEOpNotSupp)
    }

    /// add a dependency kind pair in one go
    fn unit_add_two_dependencies(
        &self,
        unit_name: &str,
        ra: UnitRelations,
        rb: UnitRelations,
        target_name: &str,
        add_ref: bool,
        mask: UnitDependencyMask,
    ) -> Result<()> {
        self.unit_add_dependency(unit_name, ra, target_name, add_ref, mask)?;
        self.unit_add_dependency(unit_name, rb, target_name, add_ref, mask)
    }

    /// whether the two units are related through the given atom
    fn unit_has_dependency(
        &self,
        _s_u_name: &str,
        _atom: UnitRelationAtom,
        _t_u_name: &str,
    ) -> bool {
        false
    }

    /// ids of the units the given unit relates to through the atom
    fn get_dependency_list(&self, _unit_name: &str, _atom: UnitRelationAtom) -> Vec<String> {
        Vec::new()
    }

    /// whether a stop job is pending for the unit
    fn has_stop_job(&self, _unit_name: &str) -> bool {
        false
    }

    /// whether any unit triggered by this one is active or pending
    fn relation_active_or_pending(&self, _unit_name: &str) -> bool {
        false
    }

    /// submit a start job on behalf of a unit
    fn unit_start_by_job(&self, _unit_name: &str) -> Result<()> {
        Err(Error::UnitActionEOpNotSupp)
    }
}

/// The per-type callbacks. Defaults are provided for everything a simple
/// type does not care about.
pub trait SubUnit {
    ///
    fn init(&self) {}

    ///
    fn done(&self) {}

    /// digest the private configuration section
    fn load(&self, section: &HashMap<String, String>) -> Result<()>;

    /// put deserialized state into effect, without side effects
    fn coldplug(&self) {}

    /// catch up with external state changes missed across a reload
    fn catchup(&self) {}

    /// append human-readable private state to a dump
    fn dump(&self) -> String {
        String::new()
    }

    /// Start a Unit.
    /// Each Sub Unit need to implement its own start function.
    fn start(&self) -> Result<()> {
        Ok(())
    }

    // process reentrant with force
    ///
    fn stop(&self, _force: bool) -> Result<()> {
        Ok(())
    }

    /// return UnitActionEOpNotSupp for default, if the sub unit not realizing the method
    fn reload(&self) -> Result<()> {
        Err(Error::UnitActionEOpNotSupp)
    }

    ///
    fn can_reload(&self) -> bool {
        false
    }

    ///
    fn kill(&self, _who: KillWho, _signal: i32) -> Result<()> {
        Err(Error::UnitActionEOpNotSupp)
    }

    /// clear out runtime/state/cache data owned by the unit
    fn clean(&self) -> Result<()> {
        Err(Error::UnitActionEOpNotSupp)
    }

    ///
    fn can_clean(&self) -> bool {
        false
    }

    /// write away state that cannot be restored from other sources
    fn serialize(&self, _ser: &mut Serializer) -> Result<()> {
        Ok(())
    }

    /// restore one item from the serialization
    fn deserialize_item(&self, _key: &str, _value: &str, _fds: &mut FdSet) -> Result<()> {
        Ok(())
    }

    /// match up descriptors from the fd set with what the unit needs
    fn distribute_fds(&self, _fds: &mut FdSet) {}

    /// Get the unit state.
    ///
    /// Every sub unit can define self states and map to [`UnitActiveState`].
    fn current_active_state(&self) -> UnitActiveState;

    /// the substate as string, i.e. (mounted for .mount, running for .service)
    fn get_subunit_state(&self) -> String;

    /// whether the unit is about to be restarted automatically
    fn will_restart(&self) -> bool {
        false
    }

    /// false blocks collection even when nothing references the unit
    fn may_gc(&self) -> bool {
        true
    }

    ///
    fn release_resources(&self) {}

    ///
    fn sigchld_events(&self, _wait_status: WaitStatus) {}

    ///
    fn reset_failed(&self) {}

    ///
    fn notify_cgroup_empty(&self) {}

    ///
    fn notify_cgroup_oom(&self) {}

    ///
    fn notify_message(&self, _messages: &HashMap<&str, &str>, _fds: Vec<i32>) -> Result<()> {
        Ok(())
    }

    /// id of the unit this one follows for state purposes, if any
    fn following(&self) -> Option<String> {
        None
    }

    /// the set of units following each other with this one
    fn following_set(&self) -> Vec<String> {
        Vec::new()
    }

    /// a unit this one triggers changed state or gained/lost a job
    fn trigger(&self, _other: &str) {}

    ///
    fn trigger_notify(&self) {}

    ///
    fn time_change(&self) {}

    ///
    fn timezone_change(&self) {}

    /// the next timeout of the unit, usec monotonic
    fn get_timeout(&self) -> Option<u64> {
        None
    }

    ///
    fn main_pid(&self) -> Option<Pid> {
        None
    }

    ///
    fn control_pid(&self) -> Option<Pid> {
        None
    }

    ///
    fn needs_console(&self) -> bool {
        false
    }

    /// exit status to propagate for FailureAction=exit/SuccessAction=exit
    fn exit_status(&self) -> i32 {
        0
    }

    /// always running, cannot be stopped
    fn get_perpetual(&self) -> bool {
        false
    }

    ///
    fn collect_fds(&self) -> Vec<i32> {
        Vec::new()
    }

    ///
    fn unit_set_property(&self, key: &str, _value: &str, _flags: UnitWriteFlags) -> Result<()> {
        Err(Error::NotFound {
            what: format!("set property: {}", key),
        })
    }

    ///
    fn attach_unit(&self, unit: Rc<dyn UnitBase>);

    ///
    fn attach_um(&self, _um: Rc<dyn UmIf>) {}
}

/// The static capability row of a unit type.
pub struct UnitVTable {
    /// name of the configuration section with the type's private settings
    pub private_section: &'static str,
    /// configuration sections this type understands
    pub sections: &'static [&'static str],
    /// transient units of this type are OK
    pub can_transient: bool,
    /// cgroup delegation is permissible
    pub can_delegate: bool,
    /// startable only once, never again
    pub once_only: bool,
    /// queued jobs should be collected when nothing needs them anymore
    pub gc_jobs: bool,
}

static VTABLE_SERVICE: UnitVTable = UnitVTable {
    private_section: "Service",
    sections: &["Unit", "Service", "Install"],
    can_transient: true,
    can_delegate: true,
    once_only: false,
    gc_jobs: false,
};

static VTABLE_SOCKET: UnitVTable = UnitVTable {
    private_section: "Socket",
    sections: &["Unit", "Socket", "Install"],
    can_transient: false,
    can_delegate: false,
    once_only: false,
    gc_jobs: false,
};

static VTABLE_TARGET: UnitVTable = UnitVTable {
    private_section: "Target",
    sections: &["Unit", "Target", "Install"],
    can_transient: false,
    can_delegate: false,
    once_only: false,
    gc_jobs: false,
};

static VTABLE_DEVICE: UnitVTable = UnitVTable {
    private_section: "Device",
    sections: &["Unit", "Device"],
    can_transient: false,
    can_delegate: false,
    once_only: false,
    gc_jobs: true,
};

static VTABLE_MOUNT: UnitVTable = UnitVTable {
    private_section: "Mount",
    sections: &["Unit", "Mount", "Install"],
    can_transient: false,
    can_delegate: false,
    once_only: false,
    gc_jobs: false,
};

static VTABLE_AUTOMOUNT: UnitVTable = UnitVTable {
    private_section: "Automount",
    sections: &["Unit", "Automount", "Install"],
    can_transient: false,
    can_delegate: false,
    once_only: false,
    gc_jobs: false,
};

static VTABLE_SWAP: UnitVTable = UnitVTable {
    private_section: "Swap",
    sections: &["Unit", "Swap", "Install"],
    can_transient: false,
    can_delegate: false,
    once_only: false,
    gc_jobs: false,
};

static VTABLE_TIMER: UnitVTable = UnitVTable {
    private_section: "Timer",
    sections: &["Unit", "Timer", "Install"],
    can_transient: true,
    can_delegate: false,
    once_only: false,
    gc_jobs: false,
};

static VTABLE_PATH: UnitVTable = UnitVTable {
    private_section: "Path",
    sections: &["Unit", "Path", "Install"],
    can_transient: true,
    can_delegate: false,
    once_only: false,
    gc_jobs: false,
};

static VTABLE_SLICE: UnitVTable = UnitVTable {
    private_section: "Slice",
    sections: &["Unit", "Slice", "Install"],
    can_transient: true,
    can_delegate: false,
    once_only: false,
    gc_jobs: false,
};

static VTABLE_SCOPE: UnitVTable = UnitVTable {
    private_section: "Scope",
    sections: &["Unit", "Scope"],
    can_transient: true,
    can_delegate: true,
    once_only: true,
    gc_jobs: true,
};

/// The capability row for a unit type.
pub fn unit_vtable(unit_type: UnitType) -> &'static UnitVTable {
    match unit_type {
        UnitType::UnitService => &VTABLE_SERVICE,
        UnitType::UnitSocket => &VTABLE_SOCKET,
        UnitType::UnitTarget => &VTABLE_TARGET,
        UnitType::UnitDevice => &VTABLE_DEVICE,
        UnitType::UnitMount => &VTABLE_MOUNT,
        UnitType::UnitAutomount => &VTABLE_AUTOMOUNT,
        UnitType::UnitSwap => &VTABLE_SWAP,
        UnitType::UnitTimer => &VTABLE_TIMER,
        UnitType::UnitPath => &VTABLE_PATH,
        UnitType::UnitSlice => &VTABLE_SLICE,
        UnitType::UnitScope => &VTABLE_SCOPE,
        UnitType::UnitTypeInvalid => &VTABLE_SERVICE,
    }
}

/// Constructor a per-type module registers for its unit type.
pub type SubUnitCreator = fn() -> Box<dyn SubUnit>;

/// Maps unit types to the modules backing them. Types without a registered
/// module are modeled but not operable in this process.
pub struct SubUnitRegistry {
    creators: RefCell<HashMap<UnitType, SubUnitCreator>>,
}

impl SubUnitRegistry {
    pub fn new() -> SubUnitRegistry {
        SubUnitRegistry {
            creators: RefCell::new(HashMap::new()),
        }
    }

    /// Register the constructor for a unit type, replacing any previous one.
    pub fn register(&self, unit_type: UnitType, creator: SubUnitCreator) {
        self.creators.borrow_mut().insert(unit_type, creator);
    }

    /// Whether the type is backed by a module in this process.
    pub fn supported(&self, unit_type: UnitType) -> bool {
        self.creators.borrow().contains_key(&unit_type)
    }

    /// Create the per-type half of a new unit.
    pub fn create(&self, unit_type: UnitType) -> Result<Box<dyn SubUnit>> {
        let creator = *self
            .creators
            .borrow()
            .get(&unit_type)
            .ok_or(Error::NotFound {
                what: format!("sub unit module for type '{}'", unit_type),
            })?;
        Ok(creator())
    }
}

impl Default for SubUnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
