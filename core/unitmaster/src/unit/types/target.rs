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

//! The target unit: a pure synchronization point in the dependency graph.

use super::comm::UnitTypeComm;
use crate::error::*;
use crate::serialize::{FdSet, Serializer};
use crate::unit::base::{UnitActiveState, UnitNotifyFlags};
use crate::unit::sub::{SubUnit, UmIf, UnitBase};
use basic::IN_SET;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum TargetState {
    Dead,
    Active,
    StateMax,
}

impl TargetState {
    fn to_unit_state(self) -> UnitActiveState {
        match self {
            TargetState::Dead | TargetState::StateMax => UnitActiveState::InActive,
            TargetState::Active => UnitActiveState::Active,
        }
    }
}

impl std::fmt::Display for TargetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetState::Dead | TargetState::StateMax => write!(f, "dead"),
            TargetState::Active => write!(f, "active"),
        }
    }
}

impl FromStr for TargetState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dead" => Ok(TargetState::Dead),
            "active" => Ok(TargetState::Active),
            other => Err(Error::NotFound {
                what: format!("target state: {}", other),
            }),
        }
    }
}

struct TargetMng {
    comm: Rc<UnitTypeComm>,
    state: RefCell<TargetState>,
}

impl TargetMng {
    fn new(_comm: &Rc<UnitTypeComm>) -> Self {
        TargetMng {
            comm: Rc::clone(_comm),
            state: RefCell::new(TargetState::StateMax),
        }
    }

    fn start_check(&self) -> Result<()> {
        if IN_SET!(self.state(), TargetState::Active) {
            return Err(Error::UnitActionEAgain);
        }
        Ok(())
    }

    fn start_action(&self, notify: bool) {
        self.set_state(TargetState::Active, notify);
    }

    fn stop_check(&self) -> Result<()> {
        if IN_SET!(self.state(), TargetState::Dead) {
            return Err(Error::UnitActionEAgain);
        }
        Ok(())
    }

    fn stop_action(&self, notify: bool) {
        self.set_state(TargetState::Dead, notify);
    }

    fn set_state(&self, new_state: TargetState, notify: bool) {
        let old_state = self.state();
        self.state.replace(new_state);

        if notify {
            self.state_notify(new_state, old_state);
        }
    }

    fn state_notify(&self, new_state: TargetState, old_state: TargetState) {
        if let Some(unit) = self.comm.owner() {
            if new_state != old_state {
                log::debug!(
                    "{} original state[{:?}] -> new state[{:?}]",
                    unit.id(),
                    old_state,
                    new_state,
                );
            }
            unit.notify(
                old_state.to_unit_state(),
                new_state.to_unit_state(),
                UnitNotifyFlags::empty(),
            );
        }
    }

    fn state(&self) -> TargetState {
        *self.state.borrow()
    }
}

pub(super) struct TargetUnit {
    comm: Rc<UnitTypeComm>,
    mng: TargetMng,
    deserialized_state: RefCell<Option<TargetState>>,
}

impl TargetUnit {
    fn new() -> TargetUnit {
        let comm = UnitTypeComm::new();
        TargetUnit {
            mng: TargetMng::new(&comm),
            comm,
            deserialized_state: RefCell::new(None),
        }
    }
}

impl SubUnit for TargetUnit {
    fn load(&self, _section: &HashMap<String, String>) -> Result<()> {
        // targets carry no private settings
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.mng.start_check()?;
        self.mng.start_action(true);
        Ok(())
    }

    fn stop(&self, _force: bool) -> Result<()> {
        self.mng.stop_check()?;
        self.mng.stop_action(true);
        Ok(())
    }

    fn current_active_state(&self) -> UnitActiveState {
        self.mng.state().to_unit_state()
    }

    fn get_subunit_state(&self) -> String {
        self.mng.state().to_string()
    }

    fn serialize(&self, ser: &mut Serializer) -> Result<()> {
        ser.item("target-state", &self.mng.state().to_string())
    }

    fn deserialize_item(&self, key: &str, value: &str, _fds: &mut FdSet) -> Result<()> {
        if key == "target-state" {
            *self.deserialized_state.borrow_mut() = TargetState::from_str(value).ok();
        }
        Ok(())
    }

    fn coldplug(&self) {
        if let Some(state) = self.deserialized_state.borrow_mut().take() {
            self.mng.set_state(state, false);
        }
    }

    fn reset_failed(&self) {}

    fn attach_unit(&self, unit: Rc<dyn UnitBase>) {
        self.comm.attach_unit(unit);
    }

    fn attach_um(&self, um: Rc<dyn UmIf>) {
        self.comm.attach_um(um);
    }
}

pub(super) fn target_new() -> Box<dyn SubUnit> {
    Box::new(TargetUnit::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_start_stop() {
        let target = TargetUnit::new();
        assert_eq!(target.current_active_state(), UnitActiveState::InActive);

        target.start().unwrap();
        assert_eq!(target.current_active_state(), UnitActiveState::Active);
        // starting twice is refused by the state machine
        assert!(target.start().is_err());

        target.stop(false).unwrap();
        assert_eq!(target.current_active_state(), UnitActiveState::InActive);
        assert!(target.stop(false).is_err());
    }

    #[test]
    fn test_target_coldplug() {
        let target = TargetUnit::new();
        let mut fds = crate::serialize::FdSet::new();
        target
            .deserialize_item("target-state", "active", &mut fds)
            .unwrap();
        assert_eq!(target.current_active_state(), UnitActiveState::InActive);
        target.coldplug();
        assert_eq!(target.current_active_state(), UnitActiveState::Active);
    }
}
