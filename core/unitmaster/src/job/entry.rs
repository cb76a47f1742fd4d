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

use crate::unit::data::DataManager;
use crate::unit::UnitX;
use basic::time_util::USEC_PER_SEC;
use event::{EventType, Events, Source};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// What a job does to its unit.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum JobKind {
    Start,
    Stop,
    Reload,
    Restart,
    Verify,
    Nop,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobKind::Start => "start",
            JobKind::Stop => "stop",
            JobKind::Reload => "reload",
            JobKind::Restart => "restart",
            JobKind::Verify => "verify",
            JobKind::Nop => "nop",
        };
        write!(f, "{}", s)
    }
}

/// How a job ended.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JobResult {
    Done,
    Cancelled,
    TimeOut,
    Failed,
    Dependency,
    Skipped,
    Invalid,
    Assert,
    UnSupported,
    Collected,
    Once,
    Merged,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum JobStage {
    Wait,
    Running,
    End(JobResult),
}

#[derive(Clone)]
pub(crate) struct JobConf {
    unit: Rc<UnitX>,
    kind: JobKind,
}

impl JobConf {
    pub(crate) fn new(unitr: &Rc<UnitX>, kind: JobKind) -> JobConf {
        JobConf {
            unit: Rc::clone(unitr),
            kind,
        }
    }

    pub(crate) fn get_unit(&self) -> &Rc<UnitX> {
        &self.unit
    }

    pub(crate) fn get_kind(&self) -> JobKind {
        self.kind
    }
}

pub(crate) struct Job {
    id: u64,
    unit: Rc<UnitX>,
    kind: JobKind,
    stage: RefCell<JobStage>,
    timer: RefCell<Option<Rc<JobTimer>>>,
}

impl Job {
    pub(super) fn new(id: u64, unit: Rc<UnitX>, kind: JobKind) -> Job {
        Job {
            id,
            unit,
            kind,
            stage: RefCell::new(JobStage::Wait),
            timer: RefCell::new(None),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn unit(&self) -> &Rc<UnitX> {
        &self.unit
    }

    pub(crate) fn kind(&self) -> JobKind {
        self.kind
    }

    pub(crate) fn stage(&self) -> JobStage {
        *self.stage.borrow()
    }

    pub(crate) fn set_stage(&self, stage: JobStage) {
        *self.stage.borrow_mut() = stage;
    }

    pub(super) fn attach_timer(&self, timer: Rc<JobTimer>) {
        *self.timer.borrow_mut() = Some(timer);
    }

    pub(super) fn take_timer(&self) -> Option<Rc<JobTimer>> {
        self.timer.borrow_mut().take()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("unit", &self.unit.id())
            .field("kind", &self.kind)
            .field("stage", &self.stage())
            .finish()
    }
}

/// Expires a running job through the monotonic timer of the event loop.
pub(super) struct JobTimer {
    time_usec: Cell<u64>,
    job: RefCell<Weak<Job>>,
    dm: Rc<DataManager>,
}

impl JobTimer {
    pub(super) fn new(timeout_sec: u64, dm: &Rc<DataManager>) -> JobTimer {
        JobTimer {
            time_usec: Cell::new(timeout_sec * USEC_PER_SEC),
            job: RefCell::new(Weak::new()),
            dm: Rc::clone(dm),
        }
    }

    pub(super) fn attach_job(&self, job: &Rc<Job>) {
        *self.job.borrow_mut() = Rc::downgrade(job);
    }

    fn job(&self) -> Option<Rc<Job>> {
        self.job.borrow().upgrade()
    }

    fn do_dispatch(&self) -> i32 {
        let job = match self.job() {
            None => {
                log::debug!("The job has already been removed, skipping.");
                return 0;
            }
            Some(v) => v,
        };
        let unit_id = job.unit().id();
        log::info!("Job {} of unit {} timed out", job.kind(), unit_id);
        self.dm.insert_job_result(unit_id, JobResult::TimeOut);
        0
    }
}

impl Source for JobTimer {
    fn event_type(&self) -> EventType {
        EventType::TimerMonotonic
    }

    fn time_relative(&self) -> u64 {
        self.time_usec.get()
    }

    fn dispatch(&self, _: &Events) -> i32 {
        self.do_dispatch()
    }

    fn token(&self) -> u64 {
        let data: u64 = unsafe { std::mem::transmute(self) };
        data
    }

    fn priority(&self) -> i8 {
        0i8
    }

    fn description(&self) -> String {
        String::from("JobTimer")
    }
}
