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
use super::config::UeConfig;
use crate::error::*;
use crate::unit::base::{UnitLoadState, UnitRelations};
use crate::unit::data::{DataManager, UnitDepConf};
use crate::unit::util::UnitFileStore;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

pub(super) struct UeLoad {
    // associated objects
    dm: Rc<DataManager>,
    file: Rc<UnitFileStore>,
    base: Rc<UeBase>,
    config: Rc<UeConfig>,

    // owned objects
    /* constant after loading */
    transient: Cell<bool>,
    paths: RefCell<Vec<PathBuf>>,
    fragment_mtime: Cell<u64>,
    /* changes with stages */
    load_state: RefCell<UnitLoadState>,
    load_error: RefCell<Option<String>>,
}

impl UeLoad {
    pub(super) fn new(
        dmr: &Rc<DataManager>,
        filer: &Rc<UnitFileStore>,
        baser: &Rc<UeBase>,
        config: &Rc<UeConfig>,
    ) -> UeLoad {
        UeLoad {
            dm: Rc::clone(dmr),
            file: Rc::clone(filer),
            base: Rc::clone(baser),
            config: Rc::clone(config),
            transient: Cell::new(false),
            paths: RefCell::new(Vec::new()),
            fragment_mtime: Cell::new(0),
            load_state: RefCell::new(UnitLoadState::Stub),
            load_error: RefCell::new(None),
        }
    }

    pub(super) fn get_description(&self) -> Option<String> {
        let res = String::from(&self.config.config_data().borrow().Unit.Description);
        if res.is_empty() {
            None
        } else {
            Some(res)
        }
    }

    pub(super) fn get_documentation(&self) -> Option<String> {
        let res = String::from(&self.config.config_data().borrow().Unit.Documentation);
        if res.is_empty() {
            None
        } else {
            Some(res)
        }
    }

    pub(super) fn set_load_state(&self, load_state: UnitLoadState) {
        *self.load_state.borrow_mut() = load_state;
    }

    pub(super) fn load_state(&self) -> UnitLoadState {
        *self.load_state.borrow()
    }

    pub(super) fn set_load_error(&self, err: Option<String>) {
        *self.load_error.borrow_mut() = err;
    }

    pub(super) fn load_error(&self) -> Option<String> {
        self.load_error.borrow().clone()
    }

    pub(super) fn get_real_name(&self) -> String {
        self.file.real_name(&self.base.id())
    }

    pub(super) fn get_all_names(&self) -> Vec<String> {
        self.file.aliases_of(&self.base.id())
    }

    pub(super) fn paths(&self) -> Vec<PathBuf> {
        self.paths.borrow().clone()
    }

    pub(super) fn transient(&self) -> bool {
        self.transient.get()
    }

    pub(super) fn make_transient(&self) {
        self.transient.set(true);
    }

    pub(super) fn remove_transient(&self) {
        if !self.transient.get() {
            return;
        }
        self.file.remove_fragment(&self.base.id());
    }

    /// A newer fragment exists than what is loaded in.
    pub(super) fn need_daemon_reload(&self) -> bool {
        match self.file.fragment_mtime(&self.base.id()) {
            Some(mtime) => mtime > self.fragment_mtime.get(),
            None => false,
        }
    }

    /// Resolve the fragment from the store and publish the dependency
    /// configuration. Returns the private section for the per-type load.
    pub(super) fn load_unit_confs(&self) -> Result<HashMap<String, String>> {
        let id = self.base.id();

        if self.file.is_masked(&id) {
            return Err(Error::Masked);
        }

        let frag = self.file.lookup(&id).ok_or(Error::NotFound {
            what: format!("fragment for unit {}", id),
        })?;

        self.config.load_fragment(&frag.unit, &frag.install);
        self.parse();
        *self.paths.borrow_mut() = frag.paths.clone();
        self.fragment_mtime.set(frag.mtime);
        Ok(frag.section)
    }

    fn parse(&self) {
        let mut ud_conf = UnitDepConf::new();
        let config_data = self.config.config_data();
        let data = config_data.borrow();

        let ud_conf_insert_table = [
            (UnitRelations::UnitWants, data.Unit.Wants.clone()),
            (UnitRelations::UnitRequires, data.Unit.Requires.clone()),
            (UnitRelations::UnitBindsTo, data.Unit.BindsTo.clone()),
            (UnitRelations::UnitRequisite, data.Unit.Requisite.clone()),
            (UnitRelations::UnitPartOf, data.Unit.PartOf.clone()),
            (UnitRelations::UnitUpHolds, data.Unit.Upholds.clone()),
            (UnitRelations::UnitOnFailure, data.Unit.OnFailure.clone()),
            (UnitRelations::UnitOnSuccess, data.Unit.OnSuccess.clone()),
            (UnitRelations::UnitBefore, data.Unit.Before.clone()),
            (UnitRelations::UnitAfter, data.Unit.After.clone()),
            (UnitRelations::UnitConflicts, data.Unit.Conflicts.clone()),
            (
                UnitRelations::UnitPropagatesReloadTo,
                data.Unit.PropagatesReloadTo.clone(),
            ),
        ];

        for (relation, names) in ud_conf_insert_table {
            ud_conf.deps.insert(relation, names);
        }
        ud_conf.mounts_for = data.Unit.RequiresMountsFor.clone();
        ud_conf.slice = data.Unit.Slice.clone();

        self.dm.insert_ud_config(self.base.id(), ud_conf);
    }
}
