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

use super::base::{unit_name_to_type, UnitDependencyMask, UnitLoadState, UnitRelations, UnitType};
use super::data::{DataManager, UnitDepConf};
use super::datastore::UnitDb;
use super::entry::UnitX;
use super::runtime::UnitRT;
use super::sub::{SubUnitRegistry, UmIf};
use super::types::SLICE_ROOT;
use super::util::UnitFileStore;
use crate::utils::table::{TableOp, TableSubscribe};
use basic::unit_name::{unit_name_is_valid, unit_name_path_escape, UnitNameFlags};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

pub(super) struct UnitLoad {
    sub_name: String, // key for table-subscriber: UnitDepConf
    data: Rc<UnitLoadData>,
}

impl UnitLoad {
    pub(super) fn new(
        dmr: &Rc<DataManager>,
        dbr: &Rc<UnitDb>,
        rtr: &Rc<UnitRT>,
        filer: &Rc<UnitFileStore>,
        registryr: &Rc<SubUnitRegistry>,
    ) -> UnitLoad {
        let load = UnitLoad {
            sub_name: String::from("UnitLoad"),
            data: Rc::new(UnitLoadData::new(dmr, dbr, rtr, filer, registryr)),
        };
        load.register(dmr);
        load
    }

    pub(super) fn load_unit(&self, name: &str) -> Option<Rc<UnitX>> {
        self.data.load_unit(name)
    }

    pub(super) fn prepare_unit(&self, name: &str) -> Option<Rc<UnitX>> {
        self.data.prepare_unit(name)
    }

    pub(super) fn try_new_unit(&self, name: &str) -> Option<Rc<UnitX>> {
        self.data.try_new_unit(name)
    }

    pub(super) fn set_um(&self, um: Rc<dyn UmIf>) {
        self.data.set_um(um);
    }

    fn register(&self, dm: &DataManager) {
        let subscriber = Rc::clone(&self.data);
        let ret = dm.register_ud_config(&self.sub_name, subscriber);
        assert!(ret.is_none())
    }
}

struct UnitLoadData {
    // associated objects
    dm: Rc<DataManager>,
    db: Rc<UnitDb>,
    rt: Rc<UnitRT>,
    file: Rc<UnitFileStore>,
    registry: Rc<SubUnitRegistry>,
    um: RefCell<Weak<dyn UmIf>>,
}

impl UnitLoadData {
    fn new(
        dmr: &Rc<DataManager>,
        dbr: &Rc<UnitDb>,
        rtr: &Rc<UnitRT>,
        filer: &Rc<UnitFileStore>,
        registryr: &Rc<SubUnitRegistry>,
    ) -> UnitLoadData {
        UnitLoadData {
            dm: Rc::clone(dmr),
            db: Rc::clone(dbr),
            rt: Rc::clone(rtr),
            file: Rc::clone(filer),
            registry: Rc::clone(registryr),
            um: RefCell::new(Weak::<DummyUm>::new()),
        }
    }

    fn set_um(&self, um: Rc<dyn UmIf>) {
        *self.um.borrow_mut() = Rc::downgrade(&um);
    }

    fn prepare_unit(&self, name: &str) -> Option<Rc<UnitX>> {
        if !unit_name_is_valid(name, UnitNameFlags::PLAIN | UnitNameFlags::INSTANCE) {
            return None;
        }

        if let Some(u) = self.db.units_get(name) {
            if u.load_state() != UnitLoadState::NotFound {
                return Some(u);
            }
            self.rt.push_load_queue(Rc::clone(&u));
            return Some(u);
        }

        match self.try_new_unit(name) {
            Some(unit) => {
                self.db.units_insert(name.to_string(), Rc::clone(&unit));
                self.rt.push_load_queue(Rc::clone(&unit));
                Some(unit)
            }
            None => {
                log::error!("Failed to create unit object for {}", name);
                None
            }
        }
    }

    fn push_dep_unit_into_load_queue(&self, name: &str) -> Option<Rc<UnitX>> {
        if let Some(unit) = self.db.units_get(name) {
            return Some(unit);
        }

        self.prepare_unit(name)
    }

    fn load_unit(&self, name: &str) -> Option<Rc<UnitX>> {
        let unit = self.prepare_unit(name)?;
        self.rt.dispatch_load_queue();
        self.rt.dispatch_target_dep_queue();
        Some(self.db.unit_follow_merge(&unit))
    }

    fn try_new_unit(&self, name: &str) -> Option<Rc<UnitX>> {
        let unit_type = unit_name_to_type(name);
        if unit_type == UnitType::UnitTypeInvalid {
            return None;
        }

        if !self.registry.supported(unit_type) {
            log::debug!(
                "Unit type {} is not backed by a module in this process",
                unit_type
            );
            return None;
        }

        log::debug!("Creating SubUnit for {:?}: {}", unit_type, name);
        let subclass = match self.registry.create(unit_type) {
            Ok(sub) => sub,
            Err(e) => {
                log::error!("Failed to create sub unit object: {}", e);
                return None;
            }
        };

        if let Some(um) = self.um.borrow().upgrade() {
            subclass.attach_um(um);
        }

        Some(Rc::new(UnitX::new(
            &self.dm,
            &self.file,
            unit_type,
            name,
            subclass,
        )))
    }
}

impl TableSubscribe<String, UnitDepConf> for UnitLoadData {
    fn notify(&self, op: &TableOp<String, UnitDepConf>) {
        match op {
            TableOp::TableInsert(name, config) => self.insert_udconf(name, config),
            TableOp::TableRemove(_, _) => {}
        }
    }
}

impl UnitLoadData {
    fn insert_udconf(&self, name: &str, config: &UnitDepConf) {
        let unit = match self.db.units_get(name) {
            Some(u) => u,
            None => {
                log::error!("Unit {} not found while installing its dependencies", name);
                return;
            }
        };

        // dependency edges asserted by the fragment carry the file mask
        for (relation, list) in config.deps.iter() {
            for o_name in list {
                let tmp_unit = match self.push_dep_unit_into_load_queue(o_name) {
                    Some(o_unit) => o_unit,
                    None => {
                        log::error!("Failed to create the dependency unit {}", o_name);
                        continue;
                    }
                };

                if let Err(e) = self.db.dep_insert(
                    Rc::clone(&unit),
                    *relation,
                    tmp_unit,
                    true,
                    UnitDependencyMask::FILE,
                ) {
                    log::debug!(
                        "Failed to add dependency {} -> {}: {}",
                        unit.id(),
                        o_name,
                        e
                    );
                    return;
                }
            }
        }

        // every non-slice unit sits in a slice: the configured one, or the
        // root slice when nothing was asked for
        self.attach_slice(&unit, &config.slice);

        // RequiresMountsFor= paths bind to the mount units covering them
        for path in config.mounts_for.iter() {
            unit.add_requires_mounts_for(PathBuf::from(path), UnitDependencyMask::PATH);

            let mount_name = format!("{}.mount", unit_name_path_escape(path));
            if mount_name == format!("{}.mount", unit_name_path_escape("/")) {
                // the root mount is always there
                continue;
            }
            let mount_unit = match self.push_dep_unit_into_load_queue(&mount_name) {
                Some(m) => m,
                None => continue,
            };
            for relation in [UnitRelations::UnitRequires, UnitRelations::UnitAfter] {
                if let Err(e) = self.db.dep_insert(
                    Rc::clone(&unit),
                    relation,
                    Rc::clone(&mount_unit),
                    true,
                    UnitDependencyMask::PATH,
                ) {
                    log::debug!(
                        "Failed to add mount dependency {} -> {}: {}",
                        unit.id(),
                        mount_name,
                        e
                    );
                }
            }
        }
    }
}

impl UnitLoadData {
    fn attach_slice(&self, unit: &Rc<UnitX>, configured: &str) {
        if unit.unit_type() == UnitType::UnitSlice {
            return;
        }

        let (slice_name, mask) = if configured.is_empty() {
            (SLICE_ROOT.to_string(), UnitDependencyMask::IMPLICIT)
        } else {
            (configured.to_string(), UnitDependencyMask::FILE)
        };

        let slice = match self.db.units_get(&slice_name) {
            Some(s) => s,
            None if configured.is_empty() => return, // no root slice around
            None => match self.push_dep_unit_into_load_queue(&slice_name) {
                Some(s) => s,
                None => return,
            },
        };

        unit.set_slice(&slice);
        if let Err(e) = self.db.dep_insert(
            Rc::clone(unit),
            UnitRelations::UnitInSlice,
            slice,
            false,
            mask,
        ) {
            log::debug!("Failed to add slice dependency for {}: {}", unit.id(), e);
        }
    }
}

/// placeholder for the not-yet-attached manager back-pointer
struct DummyUm;
impl UmIf for DummyUm {}
