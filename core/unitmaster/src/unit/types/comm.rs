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

use crate::unit::sub::{UmIf, UnitBase};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// The owner and manager back-pointers every per-type module keeps.
pub(crate) struct UnitTypeComm {
    owner: RefCell<Weak<dyn UnitBase>>,
    um: RefCell<Option<Rc<dyn UmIf>>>,
}

impl UnitTypeComm {
    pub(crate) fn new() -> Rc<UnitTypeComm> {
        Rc::new(UnitTypeComm {
            owner: RefCell::new(Weak::<DummyOwner>::new()),
            um: RefCell::new(None),
        })
    }

    pub(crate) fn attach_unit(&self, unit: Rc<dyn UnitBase>) {
        *self.owner.borrow_mut() = Rc::downgrade(&unit);
    }

    pub(crate) fn attach_um(&self, um: Rc<dyn UmIf>) {
        *self.um.borrow_mut() = Some(um);
    }

    pub(crate) fn owner(&self) -> Option<Rc<dyn UnitBase>> {
        self.owner.borrow().upgrade()
    }

    #[allow(dead_code)]
    pub(crate) fn um(&self) -> Option<Rc<dyn UmIf>> {
        self.um.borrow().clone()
    }
}

struct DummyOwner;
impl UnitBase for DummyOwner {
    fn id(&self) -> String {
        String::new()
    }
    fn unit_type(&self) -> crate::unit::base::UnitType {
        crate::unit::base::UnitType::UnitTypeInvalid
    }
    fn test_start_limit(&self) -> bool {
        true
    }
    fn reset_start_limit(&self) {}
    fn notify(
        &self,
        _os: crate::unit::base::UnitActiveState,
        _ns: crate::unit::base::UnitActiveState,
        _flags: crate::unit::base::UnitNotifyFlags,
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
    ) -> Rc<std::cell::RefCell<basic::time_util::UnitTimeStamp>> {
        Rc::new(std::cell::RefCell::new(
            basic::time_util::UnitTimeStamp::default(),
        ))
    }
}
