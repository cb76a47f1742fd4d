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

use super::uentry::Unit;
use crate::error::*;
use crate::unit::base::{UnitActiveState, UnitRelations, UnitType};
use crate::unit::data::DataManager;
use crate::unit::sub::SubUnit;
use crate::unit::util::UnitFileStore;
use basic::IN_SET;
use std::ops::Deref;
use std::rc::Rc;

/// The handle the engine passes around; only [`UnitX`] is visible outside
/// the entry module, the [`Unit`] itself stays isolated behind it.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct UnitX(Rc<Unit>);

impl UnitX {
    pub(in crate::unit) fn new(
        dmr: &Rc<DataManager>,
        filer: &Rc<UnitFileStore>,
        unit_type: UnitType,
        name: &str,
        subclass: Box<dyn SubUnit>,
    ) -> UnitX {
        let unit = Unit::new(unit_type, name, dmr, filer, subclass);
        UnitX(unit)
    }

    pub(crate) fn load(&self) -> Result<()> {
        self.0.load_unit()
    }

    pub(crate) fn start(&self) -> Result<()> {
        log::debug!("unitx start the unit {}", self.id());
        self.0.start()
    }

    pub(crate) fn stop(&self, force: bool) -> Result<()> {
        self.0.stop(force)
    }

    pub(crate) fn reload(&self) -> Result<()> {
        self.0.reload()
    }

    pub(crate) fn active_state(&self) -> UnitActiveState {
        self.0.current_active_state()
    }

    pub(crate) fn active_or_activating(&self) -> bool {
        IN_SET!(
            self.0.current_active_state(),
            UnitActiveState::Active,
            UnitActiveState::Activating,
            UnitActiveState::Reloading
        )
    }

    pub(crate) fn dep_check(&self, _relation: UnitRelations, _other: &UnitX) -> Result<()> {
        // unit_add_dependency: check input; self-edges are dropped silently
        // by the graph, so nothing to refuse here yet
        Ok(())
    }

    pub(in crate::unit) fn id(&self) -> String {
        self.0.id()
    }
}

impl Deref for UnitX {
    type Target = Rc<Unit>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
