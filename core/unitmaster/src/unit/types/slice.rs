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

//! The slice unit: a node of the cgroup hierarchy. The root slice is
//! perpetual and enumerated at startup.

use super::comm::UnitTypeComm;
use crate::error::*;
use crate::serialize::{FdSet, Serializer};
use crate::unit::base::{UnitActiveState, UnitNotifyFlags};
use crate::unit::sub::{SubUnit, UmIf, UnitBase};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

/// id of the root of the slice hierarchy
pub(crate) const SLICE_ROOT: &str = "-.slice";

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum SliceState {
    Dead,
    Active,
}

impl SliceState {
    fn to_unit_state(self) -> UnitActiveState {
        match self {
            SliceState::Dead => UnitActiveState::InActive,
            SliceState::Active => UnitActiveState::Active,
        }
    }
}

impl std::fmt::Display for SliceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SliceState::Dead => write!(f, "dead"),
            SliceState::Active => write!(f, "active"),
        }
    }
}

impl FromStr for SliceState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dead" => Ok(SliceState::Dead),
            "active" => Ok(SliceState::Active),
            other => Err(Error::NotFound {
                what: format!("slice state: {}", other),
            }),
        }
    }
}

pub(super) struct SliceUnit {
    comm: Rc<UnitTypeComm>,
    state: RefCell<SliceState>,
    deserialized_state: RefCell<Option<SliceState>>,
}

impl SliceUnit {
    fn new() -> SliceUnit {
        SliceUnit {
            comm: UnitTypeComm::new(),
            state: RefCell::new(SliceState::Dead),
            deserialized_state: RefCell::new(None),
        }
    }

    fn set_state(&self, new_state: SliceState, notify: bool) {
        let old_state = *self.state.borrow();
        self.state.replace(new_state);

        if notify && new_state != old_state {
            if let Some(unit) = self.comm.owner() {
                unit.notify(
                    old_state.to_unit_state(),
                    new_state.to_unit_state(),
                    UnitNotifyFlags::empty(),
                );
            }
        }
    }
}

impl SubUnit for SliceUnit {
    fn load(&self, _section: &HashMap<String, String>) -> Result<()> {
        Ok(())
    }

    fn start(&self) -> Result<()> {
        if *self.state.borrow() == SliceState::Active {
            return Err(Error::UnitActionEAgain);
        }
        self.set_state(SliceState::Active, true);
        Ok(())
    }

    fn stop(&self, _force: bool) -> Result<()> {
        if *self.state.borrow() == SliceState::Dead {
            return Err(Error::UnitActionEAgain);
        }
        self.set_state(SliceState::Dead, true);
        Ok(())
    }

    fn current_active_state(&self) -> UnitActiveState {
        self.state.borrow().to_unit_state()
    }

    fn get_subunit_state(&self) -> String {
        self.state.borrow().to_string()
    }

    fn get_perpetual(&self) -> bool {
        self.comm
            .owner()
            .map(|owner| owner.id() == SLICE_ROOT)
            .unwrap_or(false)
    }

    fn serialize(&self, ser: &mut Serializer) -> Result<()> {
        ser.item("slice-state", &self.state.borrow().to_string())
    }

    fn deserialize_item(&self, key: &str, value: &str, _fds: &mut FdSet) -> Result<()> {
        if key == "slice-state" {
            *self.deserialized_state.borrow_mut() = SliceState::from_str(value).ok();
        }
        Ok(())
    }

    fn coldplug(&self) {
        if let Some(state) = self.deserialized_state.borrow_mut().take() {
            self.set_state(state, false);
        } else if self.get_perpetual() {
            self.set_state(SliceState::Active, false);
        }
    }

    fn attach_unit(&self, unit: Rc<dyn UnitBase>) {
        self.comm.attach_unit(unit);
    }

    fn attach_um(&self, um: Rc<dyn UmIf>) {
        self.comm.attach_um(um);
    }
}

pub(super) fn slice_new() -> Box<dyn SubUnit> {
    Box::new(SliceUnit::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_states() {
        let slice = SliceUnit::new();
        assert_eq!(slice.current_active_state(), UnitActiveState::InActive);
        slice.start().unwrap();
        assert_eq!(slice.current_active_state(), UnitActiveState::Active);
        slice.stop(false).unwrap();
        assert_eq!(slice.current_active_state(), UnitActiveState::InActive);
    }

    #[test]
    fn test_slice_not_perpetual_without_owner() {
        let slice = SliceUnit::new();
        assert!(!slice.get_perpetual());
    }
}
