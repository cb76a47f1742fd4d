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

use super::entry::Job;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// All installed jobs: by id, by unit, plus the run queue. A unit carries
/// at most one installed job, and only queued jobs are in the run queue.
pub(super) struct JobTable {
    data: RefCell<JobTableData>,
}

struct JobTableData {
    jobs: HashMap<u64, Rc<Job>>,      // key: job-id
    by_unit: HashMap<String, u64>,    // key: unit-id
    run_queue: VecDeque<u64>,
}

impl JobTable {
    pub(super) fn new() -> JobTable {
        JobTable {
            data: RefCell::new(JobTableData {
                jobs: HashMap::new(),
                by_unit: HashMap::new(),
                run_queue: VecDeque::new(),
            }),
        }
    }

    pub(super) fn insert(&self, job: Rc<Job>) {
        let mut data = self.data.borrow_mut();
        data.by_unit.insert(job.unit().id(), job.id());
        data.jobs.insert(job.id(), job);
    }

    pub(super) fn remove(&self, id: u64) -> Option<Rc<Job>> {
        let mut data = self.data.borrow_mut();
        let job = data.jobs.remove(&id)?;
        if data.by_unit.get(&job.unit().id()) == Some(&id) {
            data.by_unit.remove(&job.unit().id());
        }
        data.run_queue.retain(|queued| *queued != id);
        Some(job)
    }

    pub(super) fn get(&self, id: u64) -> Option<Rc<Job>> {
        self.data.borrow().jobs.get(&id).cloned()
    }

    pub(super) fn get_by_unit(&self, unit_id: &str) -> Option<Rc<Job>> {
        let data = self.data.borrow();
        let id = data.by_unit.get(unit_id)?;
        data.jobs.get(id).cloned()
    }

    pub(super) fn push_run(&self, id: u64) {
        self.data.borrow_mut().run_queue.push_back(id);
    }

    pub(super) fn pop_run(&self) -> Option<Rc<Job>> {
        let mut data = self.data.borrow_mut();
        loop {
            let id = data.run_queue.pop_front()?;
            if let Some(job) = data.jobs.get(&id) {
                return Some(Rc::clone(job));
            }
        }
    }

    pub(super) fn run_queue_len(&self) -> usize {
        self.data.borrow().run_queue.len()
    }

    pub(super) fn len(&self) -> usize {
        self.data.borrow().jobs.len()
    }

    pub(super) fn entry_clear(&self) {
        let mut data = self.data.borrow_mut();
        data.jobs.clear();
        data.by_unit.clear();
        data.run_queue.clear();
    }
}
