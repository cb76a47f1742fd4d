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

//! The scope unit: a transient wrapper around externally created
//! processes. It runs until its cgroup runs empty and can be started only
//! once.

use super::comm::UnitTypeComm;
use crate::error::*;
use crate::serialize::{FdSet, Serializer};
use crate::unit::base::{UnitActiveState, UnitNotifyFlags};
use crate::unit::sub::{SubUnit, UmIf, UnitBase};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum ScopeState {
    Dead,
    Running,
    Abandoned,
    Failed,
}

impl ScopeState {
    fn to_unit_state(self) -> UnitActiveState {
        match self {
            ScopeState::Dead => UnitActiveState::InActive,
            ScopeState::Running | ScopeState::Abandoned => UnitActiveState::Active,
            ScopeState::Failed => UnitActiveState::Failed,
        }
    }
}

impl std::fmt::Display for ScopeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeState::Dead => write!(f, "dead"),
            ScopeState::Running => write!(f, "running"),
            ScopeState::Abandoned => write!(f, "abandoned"),
            ScopeState::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ScopeState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dead" => Ok(ScopeState::Dead),
            "running" => Ok(ScopeState::Running),
            "abandoned" => Ok(ScopeState::Abandoned),
            "failed" => Ok(ScopeState::Failed),
            other => Err(Error::NotFound {
                what: format!("scope state: {}", other),
            }),
        }
    }
}

pub(super) struct ScopeUnit {
    comm: Rc<UnitTypeComm>,
    state: RefCell<ScopeState>,
    deserialized_state: RefCell<Option<ScopeState>>,
}

impl ScopeUnit {
    fn new() -> ScopeUnit {
        ScopeUnit {
            comm: UnitTypeComm::new(),
            state: RefCell::new(ScopeState::Dead),
            deserialized_state: RefCell::new(None),
        }
    }

    fn set_state(&self, new_state: ScopeState, notify: bool) {
        let old_state = *self.state.borrow();
        self.state.replace(new_state);

        if notify && new_state != old_state {
            if let Some(unit) = self.comm.owner() {
                log::debug!(
                    "{} scope state [{}] -> [{}]",
                    unit.id(),
                    old_state,
                    new_state
                );
                unit.notify(
                    old_state.to_unit_state(),
                    new_state.to_unit_state(),
                    UnitNotifyFlags::empty(),
                );
            }
        }
    }
}

impl SubUnit for ScopeUnit {
    fn load(&self, _section: &HashMap<String, String>) -> Result<()> {
        Ok(())
    }

    fn start(&self) -> Result<()> {
        if *self.state.borrow() != ScopeState::Dead {
            return Err(Error::UnitActionEAgain);
        }

        if let Some(owner) = self.comm.owner() {
            if !owner.test_start_limit() {
                self.set_state(ScopeState::Failed, true);
                return Err(Error::UnitActionEFailed);
            }
        }

        self.set_state(ScopeState::Running, true);
        Ok(())
    }

    fn stop(&self, _force: bool) -> Result<()> {
        if matches!(*self.state.borrow(), ScopeState::Dead) {
            return Err(Error::UnitActionEAgain);
        }
        self.set_state(ScopeState::Dead, true);
        Ok(())
    }

    fn current_active_state(&self) -> UnitActiveState {
        self.state.borrow().to_unit_state()
    }

    fn get_subunit_state(&self) -> String {
        self.state.borrow().to_string()
    }

    /// the external processes are gone, the scope is done
    fn notify_cgroup_empty(&self) {
        if matches!(
            *self.state.borrow(),
            ScopeState::Running | ScopeState::Abandoned
        ) {
            self.set_state(ScopeState::Dead, true);
        }
    }

    fn reset_failed(&self) {
        if *self.state.borrow() == ScopeState::Failed {
            self.set_state(ScopeState::Dead, false);
        }
    }

    fn serialize(&self, ser: &mut Serializer) -> Result<()> {
        ser.item("scope-state", &self.state.borrow().to_string())
    }

    fn deserialize_item(&self, key: &str, value: &str, _fds: &mut FdSet) -> Result<()> {
        if key == "scope-state" {
            *self.deserialized_state.borrow_mut() = ScopeState::from_str(value).ok();
        }
        Ok(())
    }

    fn coldplug(&self) {
        if let Some(state) = self.deserialized_state.borrow_mut().take() {
            self.set_state(state, false);
        }
    }

    fn attach_unit(&self, unit: Rc<dyn UnitBase>) {
        self.comm.attach_unit(unit);
    }

    fn attach_um(&self, um: Rc<dyn UmIf>) {
        self.comm.attach_um(um);
    }
}

pub(super) fn scope_new() -> Box<dyn SubUnit> {
    Box::new(ScopeUnit::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_lifecycle() {
        let scope = ScopeUnit::new();
        assert_eq!(scope.current_active_state(), UnitActiveState::InActive);

        scope.start().unwrap();
        assert_eq!(scope.current_active_state(), UnitActiveState::Active);
        assert!(scope.start().is_err());

        scope.notify_cgroup_empty();
        assert_eq!(scope.current_active_state(), UnitActiveState::InActive);
    }

    #[test]
    fn test_scope_reset_failed() {
        let scope = ScopeUnit::new();
        scope.set_state(ScopeState::Failed, false);
        assert_eq!(scope.current_active_state(), UnitActiveState::Failed);
        scope.reset_failed();
        assert_eq!(scope.current_active_state(), UnitActiveState::InActive);
    }
}
