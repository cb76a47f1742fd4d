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

//! Deadline bookkeeping for timer sources, one min-heap per clock.

use crate::{EventType, Source};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::mem::MaybeUninit;
use std::rc::Rc;

const USEC_PER_SEC: u64 = 1_000_000;
const NSEC_PER_USEC: u64 = 1_000;

#[derive(Debug)]
pub(crate) struct TimerEntry {
    next: u64,
    source: Rc<dyn Source>,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.next == other.next && self.source.token() == other.source.token()
    }
}

impl Eq for TimerEntry {}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, flip to get the earliest deadline on top
        self.next.cmp(&other.next).reverse()
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub(crate) struct Timer {
    heaps: HashMap<EventType, BinaryHeap<TimerEntry>>,
}

impl Timer {
    pub(crate) fn new() -> Timer {
        Timer {
            heaps: HashMap::new(),
        }
    }

    pub(crate) fn clockid(et: &EventType) -> libc::clockid_t {
        match et {
            EventType::TimerRealtime => libc::CLOCK_REALTIME,
            _ => libc::CLOCK_MONOTONIC,
        }
    }

    pub(crate) fn now(et: &EventType) -> u64 {
        let mut ts = MaybeUninit::<libc::timespec>::zeroed();
        if unsafe { libc::clock_gettime(Self::clockid(et), ts.as_mut_ptr()) } < 0 {
            return u64::MAX;
        }
        let ts = unsafe { ts.assume_init() };
        (ts.tv_sec as u64) * USEC_PER_SEC + (ts.tv_nsec as u64) / NSEC_PER_USEC
    }

    pub(crate) fn push(&mut self, source: Rc<dyn Source>) {
        let et = source.event_type();
        let next = if source.time_relative() != u64::MAX {
            Self::now(&et).saturating_add(source.time_relative())
        } else {
            source.time()
        };
        self.heaps
            .entry(et)
            .or_insert_with(BinaryHeap::new)
            .push(TimerEntry { next, source });
    }

    pub(crate) fn next(&self, et: &EventType) -> Option<u64> {
        self.heaps.get(et).and_then(|h| h.peek()).map(|e| e.next)
    }

    pub(crate) fn pop_ready(&mut self, et: &EventType, now: u64) -> Vec<Rc<dyn Source>> {
        let mut ready = Vec::new();
        if let Some(heap) = self.heaps.get_mut(et) {
            while let Some(top) = heap.peek() {
                if top.next > now {
                    break;
                }
                ready.push(heap.pop().unwrap().source);
            }
        }
        ready
    }

    pub(crate) fn remove(&mut self, et: &EventType, token: u64) {
        if let Some(heap) = self.heaps.get_mut(et) {
            let entries: Vec<TimerEntry> =
                heap.drain().filter(|e| e.source.token() != token).collect();
            heap.extend(entries);
        }
    }

    pub(crate) fn is_empty(&self, et: &EventType) -> bool {
        self.heaps.get(et).map(|h| h.is_empty()).unwrap_or(true)
    }
}
