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

use super::entry::{Job, JobConf, JobKind, JobResult, JobStage, JobTimer};
use super::table::JobTable;
use crate::error::*;
use crate::unit::base::{UnitActiveState, UnitNotifyFlags};
use crate::unit::data::DataManager;
use crate::unit::datastore::UnitDb;
use crate::unit::entry::JobMode;
use crate::unit::sub::unit_vtable;
use crate::unit::UnitX;
use event::{EventState, Events};
use std::cell::Cell;
use std::rc::Rc;

pub(crate) struct JobManager {
    // associated objects
    events: Rc<Events>,
    dm: Rc<DataManager>,
    db: Rc<UnitDb>,

    // owned objects
    table: JobTable,
    ids: Cell<u64>,
}

impl JobManager {
    pub(crate) fn new(
        eventsr: &Rc<Events>,
        dmr: &Rc<DataManager>,
        dbr: &Rc<UnitDb>,
    ) -> JobManager {
        JobManager {
            events: Rc::clone(eventsr),
            dm: Rc::clone(dmr),
            db: Rc::clone(dbr),
            table: JobTable::new(),
            ids: Cell::new(0),
        }
    }

    /// Install a job for a unit, resolving conflicts per mode. Returns the
    /// job id.
    pub(crate) fn exec(&self, config: &JobConf, mode: JobMode) -> Result<u64> {
        let unit = config.get_unit();
        let kind = config.get_kind();

        self.job_is_applicable(unit, kind)?;

        if let Some(existing) = self.table.get_by_unit(&unit.id()) {
            if existing.kind() == kind && existing.stage() == JobStage::Wait {
                log::debug!(
                    "Merging {} request into pending job {} for {}",
                    kind,
                    existing.id(),
                    unit.id()
                );
                return Ok(existing.id());
            }

            if mode == JobMode::Fail {
                return Err(Error::JobConflict);
            }

            self.finish_job(&existing, JobResult::Cancelled);
        }

        if mode == JobMode::Isolate {
            self.install_isolate_stops(unit)?;
        }

        let id = self.next_id();
        let job = Rc::new(Job::new(id, Rc::clone(unit), kind));
        self.arm_timer(&job);
        self.table.insert(Rc::clone(&job));
        self.table.push_run(id);
        log::debug!("Installed new job {}/{} as {}", unit.id(), kind, id);
        Ok(id)
    }

    /// Pop and run queued jobs until the run queue is empty.
    pub(crate) fn dispatch_run_queue(&self) -> bool {
        if self.table.run_queue_len() == 0 {
            return false;
        }

        while let Some(job) = self.table.pop_run() {
            if job.stage() != JobStage::Wait {
                continue;
            }
            job.set_stage(JobStage::Running);
            self.run_job(&job);
        }
        true
    }

    fn run_job(&self, job: &Rc<Job>) {
        let unit = Rc::clone(job.unit());
        let ret = match job.kind() {
            JobKind::Start => unit.start(),
            JobKind::Stop => unit.stop(false),
            JobKind::Reload => unit.reload(),
            JobKind::Restart => {
                // the per-type stop is synchronous enough for a retry start
                let _ = unit.stop(true);
                unit.start()
            }
            JobKind::Verify => {
                let result = if unit.active_state().is_active_or_reloading() {
                    JobResult::Done
                } else {
                    JobResult::Failed
                };
                self.finish_job(job, result);
                return;
            }
            JobKind::Nop => {
                self.finish_job(job, JobResult::Done);
                return;
            }
        };

        // the transition may have finished the job synchronously already
        if self.table.get(job.id()).is_none() {
            return;
        }

        match ret {
            Ok(_) => {}
            Err(Error::UnitActionEAlready) => self.finish_job(job, JobResult::Done),
            Err(Error::UnitActionEComm) => self.finish_job(job, JobResult::Skipped),
            Err(Error::UnitActionEProto) => self.finish_job(job, JobResult::Assert),
            Err(Error::UnitActionEOpNotSupp) => self.finish_job(job, JobResult::UnSupported),
            Err(e) => {
                log::error!("Running job {} for {} failed: {}", job.id(), unit.id(), e);
                self.finish_job(job, JobResult::Failed);
            }
        }
    }

    /// The notifier feeds every state transition through here; a running
    /// job completes or fails according to the transition matrix.
    pub(crate) fn try_finish(
        &self,
        unit: &Rc<UnitX>,
        os: UnitActiveState,
        ns: UnitActiveState,
        flags: UnitNotifyFlags,
    ) {
        let job = match self.table.get_by_unit(&unit.id()) {
            None => return,
            Some(v) => v,
        };

        if job.stage() != JobStage::Running {
            return;
        }

        let result = match job.kind() {
            JobKind::Start | JobKind::Restart => match ns {
                UnitActiveState::Active => Some(JobResult::Done),
                UnitActiveState::Failed => Some(JobResult::Failed),
                UnitActiveState::InActive if os == UnitActiveState::Activating => {
                    if flags.contains(UnitNotifyFlags::WILL_AUTO_RESTART) {
                        None
                    } else {
                        Some(JobResult::Failed)
                    }
                }
                _ => None,
            },
            JobKind::Stop => {
                if ns.is_inactive_or_failed() {
                    Some(JobResult::Done)
                } else {
                    None
                }
            }
            JobKind::Reload => {
                if os == UnitActiveState::Reloading && ns != UnitActiveState::Reloading {
                    if flags.contains(UnitNotifyFlags::RELOAD_FAILURE) {
                        Some(JobResult::Failed)
                    } else {
                        Some(JobResult::Done)
                    }
                } else if os == ns && ns == UnitActiveState::Active {
                    // a type without a real reload reports completion in place
                    Some(JobResult::Done)
                } else {
                    None
                }
            }
            JobKind::Verify | JobKind::Nop => Some(JobResult::Done),
        };

        if let Some(result) = result {
            self.finish_job(&job, result);
        }
    }

    /// Complete an installed job with the given result.
    pub(crate) fn complete(&self, id: u64, result: JobResult) -> Result<()> {
        let job = self.table.get(id).ok_or(Error::NotFound {
            what: format!("job {}", id),
        })?;
        self.finish_job(&job, result);
        Ok(())
    }

    /// Fail an installed job with the given failure kind.
    pub(crate) fn fail(&self, id: u64, kind: JobResult) -> Result<()> {
        self.complete(id, kind)
    }

    /// Expire the job installed for a unit; called when its timer fired.
    pub(crate) fn timeout_unit(&self, unit_id: &str) {
        if let Some(job) = self.table.get_by_unit(unit_id) {
            self.finish_job(&job, JobResult::TimeOut);
        }
    }

    /// Drop the job installed for a unit, if any.
    pub(crate) fn cancel_unit(&self, unit_id: &str) {
        if let Some(job) = self.table.get_by_unit(unit_id) {
            self.finish_job(&job, JobResult::Cancelled);
        }
    }

    pub(crate) fn has_job(&self, unit: &Rc<UnitX>) -> bool {
        self.table.get_by_unit(&unit.id()).is_some()
    }

    pub(crate) fn has_start_like_job(&self, unit: &Rc<UnitX>) -> bool {
        match self.table.get_by_unit(&unit.id()) {
            None => false,
            Some(job) => matches!(job.kind(), JobKind::Start | JobKind::Restart),
        }
    }

    pub(crate) fn has_stop_job(&self, unit: &Rc<UnitX>) -> bool {
        match self.table.get_by_unit(&unit.id()) {
            None => false,
            Some(job) => job.kind() == JobKind::Stop,
        }
    }

    pub(crate) fn jobs_len(&self) -> usize {
        self.table.len()
    }

    pub(crate) fn entry_clear(&self) {
        self.table.entry_clear();
    }

    fn finish_job(&self, job: &Rc<Job>, result: JobResult) {
        job.set_stage(JobStage::End(result));
        if let Some(timer) = job.take_timer() {
            let _ = self.events.del_source(timer);
        }
        self.table.remove(job.id());
        log::debug!(
            "Job {} of unit {} finished, result: {:?}",
            job.id(),
            job.unit().id(),
            result
        );
    }

    fn arm_timer(&self, job: &Rc<Job>) {
        let timeout = job.unit().job_timeout();
        if timeout == 0 {
            return;
        }

        let timer = Rc::new(JobTimer::new(timeout, &self.dm));
        timer.attach_job(job);
        if self.events.add_source(Rc::clone(&timer) as Rc<dyn event::Source>).is_ok() {
            let _ = self
                .events
                .set_enabled(Rc::clone(&timer) as Rc<dyn event::Source>, EventState::OneShot);
        }
        job.attach_timer(timer);
    }

    fn next_id(&self) -> u64 {
        let id = self.ids.get().wrapping_add(1);
        self.ids.set(id);
        id
    }

    fn job_is_applicable(&self, unit: &Rc<UnitX>, kind: JobKind) -> Result<()> {
        match kind {
            JobKind::Reload => {
                if !unit.can_reload() {
                    return Err(Error::JobNotApplicable {
                        kind: kind.to_string(),
                        unit: unit.id(),
                    });
                }
            }
            JobKind::Stop => {
                if unit.get_perpetual() {
                    return Err(Error::JobNotApplicable {
                        kind: kind.to_string(),
                        unit: unit.id(),
                    });
                }
            }
            JobKind::Start | JobKind::Restart => {
                // once-only types never go back to the starting gate
                if unit_vtable(unit.unit_type()).once_only
                    && unit
                        .get_unit_timestamp()
                        .borrow()
                        .active_enter_timestamp
                        .is_set()
                    && !unit.active_or_activating()
                {
                    return Err(Error::JobNotApplicable {
                        kind: kind.to_string(),
                        unit: unit.id(),
                    });
                }
            }
            JobKind::Verify | JobKind::Nop => {}
        }
        Ok(())
    }

    fn install_isolate_stops(&self, target: &Rc<UnitX>) -> Result<()> {
        for other in self.db.units_get_all(None) {
            if Rc::ptr_eq(&other, target) {
                continue;
            }
            if other.ignore_on_isolate() {
                continue;
            }
            if !other.active_or_activating() {
                continue;
            }
            if other.get_perpetual() {
                continue;
            }
            log::debug!("Isolating: stopping {}", other.id());
            self.exec(&JobConf::new(&other, JobKind::Stop), JobMode::Replace)?;
        }
        Ok(())
    }
}
