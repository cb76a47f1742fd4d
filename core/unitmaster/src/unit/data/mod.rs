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

//! Tables decoupling producers inside the engine from the manager that
//! reacts to them: dependency configs from the loader, state transitions
//! from per-type code, rate-limit hits and job results.

mod dep_conf;
mod state;

pub(crate) use dep_conf::UnitDepConf;
pub(crate) use state::UnitState;

use crate::job::JobResult;
use crate::unit::entry::StartLimitResult;
use crate::utils::table::{Table, TableSubscribe};
use std::rc::Rc;

#[allow(clippy::type_complexity)]
pub struct DataManager {
    tables: (
        Table<String, UnitDepConf>,      // [0]unit-dep-config
        Table<String, UnitState>,        // [1]unit-state
        Table<String, StartLimitResult>, // [2]unit-start-limit-hit
        Table<String, JobResult>,        // [3]unit-job-result
    ),
}

impl Drop for DataManager {
    fn drop(&mut self) {
        log::debug!("DataManager drop, clear.");
        // repeating protection
        self.clear();
    }
}

impl DataManager {
    pub fn new() -> DataManager {
        DataManager {
            tables: (Table::new(), Table::new(), Table::new(), Table::new()),
        }
    }

    pub(crate) fn insert_ud_config(
        &self,
        u_name: String,
        ud_config: UnitDepConf,
    ) -> Option<UnitDepConf> {
        self.tables.0.insert(u_name, ud_config)
    }

    pub(crate) fn register_ud_config(
        &self,
        name: &str,
        subscriber: Rc<dyn TableSubscribe<String, UnitDepConf>>,
    ) -> Option<Rc<dyn TableSubscribe<String, UnitDepConf>>> {
        self.tables.0.subscribe(name.to_string(), subscriber)
    }

    pub(crate) fn insert_unit_state(
        &self,
        u_name: String,
        u_state: UnitState,
    ) -> Option<UnitState> {
        self.tables.1.insert(u_name, u_state)
    }

    pub(crate) fn register_unit_state(
        &self,
        name: &str,
        subscriber: Rc<dyn TableSubscribe<String, UnitState>>,
    ) -> Option<Rc<dyn TableSubscribe<String, UnitState>>> {
        self.tables.1.subscribe(name.to_string(), subscriber)
    }

    pub(crate) fn insert_start_limit_result(
        &self,
        u_name: String,
        start_limit_res: StartLimitResult,
    ) -> Option<StartLimitResult> {
        self.tables.2.insert(u_name, start_limit_res)
    }

    pub(crate) fn register_start_limit_result(
        &self,
        name: &str,
        subscriber: Rc<dyn TableSubscribe<String, StartLimitResult>>,
    ) -> Option<Rc<dyn TableSubscribe<String, StartLimitResult>>> {
        self.tables.2.subscribe(name.to_string(), subscriber)
    }

    pub(crate) fn insert_job_result(
        &self,
        u_name: String,
        job_result: JobResult,
    ) -> Option<JobResult> {
        self.tables.3.insert(u_name, job_result)
    }

    pub(crate) fn register_job_result(
        &self,
        name: &str,
        subscriber: Rc<dyn TableSubscribe<String, JobResult>>,
    ) -> Option<Rc<dyn TableSubscribe<String, JobResult>>> {
        self.tables.3.subscribe(name.to_string(), subscriber)
    }

    pub(crate) fn entry_clear(&self) {
        self.tables.0.data_clear();
        self.tables.1.data_clear();
        self.tables.2.data_clear();
        self.tables.3.data_clear();
    }

    // repeating protection
    pub(crate) fn clear(&self) {
        self.tables.0.clear();
        self.tables.1.clear();
        self.tables.2.clear();
        self.tables.3.clear();
    }
}

impl Default for DataManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::base::{UnitActiveState, UnitNotifyFlags};
    use std::cell::RefCell;
    use crate::utils::table::TableOp;

    #[test]
    fn dm_unit_state_notifies() {
        let dm = DataManager::new();
        let sub = Rc::new(StateSpy::new());
        dm.register_unit_state("spy", sub.clone());

        dm.insert_unit_state(
            "test.service".to_string(),
            UnitState::new(
                UnitActiveState::InActive,
                UnitActiveState::Active,
                UnitNotifyFlags::empty(),
            ),
        );
        assert_eq!(sub.last.borrow().as_deref(), Some("test.service"));
    }

    struct StateSpy {
        last: RefCell<Option<String>>,
    }

    impl StateSpy {
        fn new() -> StateSpy {
            StateSpy {
                last: RefCell::new(None),
            }
        }
    }

    impl TableSubscribe<String, UnitState> for StateSpy {
        fn notify(&self, op: &TableOp<String, UnitState>) {
            if let TableOp::TableInsert(name, _) = op {
                *self.last.borrow_mut() = Some((*name).clone());
            }
        }
    }
}
