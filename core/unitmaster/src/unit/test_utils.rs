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

//! Helpers for the in-crate tests: a controllable stand-in sub unit and a
//! plain unit factory.

use super::base::{unit_name_to_type, UnitActiveState, UnitNotifyFlags};
use super::data::DataManager;
use super::entry::UnitX;
use super::sub::{SubUnit, UnitBase};
use super::util::UnitFileStore;
use crate::error::*;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// A service-shaped stand-in: starts and stops synchronously, honors the
/// start rate limit, and lets tests force arbitrary states.
pub(crate) struct TestSubUnit {
    state: Cell<UnitActiveState>,
    owner: RefCell<Weak<dyn UnitBase>>,
}

impl TestSubUnit {
    pub(crate) fn new() -> TestSubUnit {
        TestSubUnit {
            state: Cell::new(UnitActiveState::InActive),
            owner: RefCell::new(Weak::<NoOwner>::new()),
        }
    }

    fn owner(&self) -> Option<Rc<dyn UnitBase>> {
        self.owner.borrow().upgrade()
    }

    pub(crate) fn set_state(&self, new_state: UnitActiveState) {
        let old_state = self.state.get();
        self.state.set(new_state);
        if let Some(owner) = self.owner() {
            owner.notify(old_state, new_state, UnitNotifyFlags::empty());
        }
    }
}

impl SubUnit for TestSubUnit {
    fn load(&self, _section: &HashMap<String, String>) -> Result<()> {
        Ok(())
    }

    fn start(&self) -> Result<()> {
        if let Some(owner) = self.owner() {
            if !owner.test_start_limit() {
                self.set_state(UnitActiveState::Failed);
                return Err(Error::UnitActionEFailed);
            }
        }
        self.set_state(UnitActiveState::Activating);
        self.set_state(UnitActiveState::Active);
        Ok(())
    }

    fn stop(&self, _force: bool) -> Result<()> {
        self.set_state(UnitActiveState::InActive);
        Ok(())
    }

    fn current_active_state(&self) -> UnitActiveState {
        self.state.get()
    }

    fn get_subunit_state(&self) -> String {
        self.state.get().to_string()
    }

    fn reset_failed(&self) {
        if self.state.get() == UnitActiveState::Failed {
            self.state.set(UnitActiveState::InActive);
        }
    }

    fn attach_unit(&self, unit: Rc<dyn UnitBase>) {
        *self.owner.borrow_mut() = Rc::downgrade(&unit);
    }
}

pub(crate) fn test_sub_new() -> Box<dyn SubUnit> {
    Box::new(TestSubUnit::new())
}

/// A standalone unit for datastore/runtime tests; each one gets its own
/// data manager and fragment store.
pub(crate) fn create_unit_for_test_pub(name: &str) -> Rc<UnitX> {
    let dm = Rc::new(DataManager::new());
    let file = Rc::new(UnitFileStore::new());
    let unit_type = unit_name_to_type(name);
    Rc::new(UnitX::new(&dm, &file, unit_type, name, test_sub_new()))
}

struct NoOwner;
impl UnitBase for NoOwner {
    fn id(&self) -> String {
        String::new()
    }
    fn unit_type(&self) -> super::base::UnitType {
        super::base::UnitType::UnitTypeInvalid
    }
    fn test_start_limit(&self) -> bool {
        true
    }
    fn reset_start_limit(&self) {}
    fn notify(
        &self,
        _os: UnitActiveState,
        _ns: UnitActiveState,
        _flags: UnitNotifyFlags,
    ) {
    }
    fn default_dependencies(&self) -> bool {
        true
    }
    fn ignore_on_isolate(&self) -> bool {
        false
    }
    fn transient(&self) -> bool {
        false
    }
    fn cg_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::new()
    }
    fn get_unit_timestamp(
        &self,
    ) -> Rc<RefCell<basic::time_util::UnitTimeStamp>> {
        Rc::new(RefCell::new(basic::time_util::UnitTimeStamp::default()))
    }
}
