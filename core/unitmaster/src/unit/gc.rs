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

//! Mark/sweep over the gc queue.
//!
//! Each sweep advances the marker by a fixed stride, so units colored in
//! earlier sweeps are implicitly white again. A unit survives when a unit
//! that may not be collected reaches it along the strong inbound edges.

use super::base::UnitRelationAtom;
use super::datastore::UnitDb;
use super::entry::{UnitQueueFlags, UnitX};
use crate::job::JobManager;
use std::rc::Rc;

const GC_OFFSET_IN_PATH: u32 = 1; // currently being traversed
const GC_OFFSET_UNSURE: u32 = 2; // nothing learned, collect
const GC_OFFSET_BAD: u32 = 3; // definitely collectable
const GC_OFFSET_GOOD: u32 = 4; // definitely pinned
pub(super) const GC_OFFSET_MAX: u32 = 4;

/// Everything that keeps a unit out of the collector's hands.
fn unit_collectable(jm: &JobManager, unit: &Rc<UnitX>) -> bool {
    if jm.has_job(unit) {
        return false;
    }
    unit.may_gc()
}

fn unit_gc_sweep(db: &Rc<UnitDb>, jm: &Rc<JobManager>, unit: &Rc<UnitX>, gc_marker: u32) {
    let marker = unit.gc_marker();
    if marker == gc_marker + GC_OFFSET_GOOD
        || marker == gc_marker + GC_OFFSET_BAD
        || marker == gc_marker + GC_OFFSET_UNSURE
        || marker == gc_marker + GC_OFFSET_IN_PATH
    {
        return;
    }

    if unit.in_queue(UnitQueueFlags::CLEANUP) {
        unit.set_gc_marker(gc_marker + GC_OFFSET_BAD);
        return;
    }

    if !unit_collectable(jm, unit) {
        unit.set_gc_marker(gc_marker + GC_OFFSET_GOOD);
        return;
    }

    unit.set_gc_marker(gc_marker + GC_OFFSET_IN_PATH);

    let mut is_bad = true;
    for other in db.dep_gets_atom(unit, UnitRelationAtom::UnitAtomPinsGc) {
        unit_gc_sweep(db, jm, &other, gc_marker);

        if other.gc_marker() == gc_marker + GC_OFFSET_GOOD {
            unit.set_gc_marker(gc_marker + GC_OFFSET_GOOD);
            return;
        }

        if other.gc_marker() != gc_marker + GC_OFFSET_BAD {
            is_bad = false;
        }
    }

    if is_bad {
        unit.set_gc_marker(gc_marker + GC_OFFSET_BAD);
    } else {
        unit.set_gc_marker(gc_marker + GC_OFFSET_UNSURE);
    }
}

/// One sweep over the queued units; the returned ones go to cleanup.
pub(super) fn gc_sweep(
    db: &Rc<UnitDb>,
    jm: &Rc<JobManager>,
    queued: &[Rc<UnitX>],
    gc_marker: u32,
) -> Vec<Rc<UnitX>> {
    for unit in queued {
        unit_gc_sweep(db, jm, unit, gc_marker);
    }

    let mut swept = Vec::new();
    for unit in queued {
        let marker = unit.gc_marker();
        if marker == gc_marker + GC_OFFSET_BAD || marker == gc_marker + GC_OFFSET_UNSURE {
            swept.push(Rc::clone(unit));
        }
    }
    swept
}
