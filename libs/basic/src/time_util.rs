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

//! Clock access in microseconds and the per-unit timestamp record.
#![allow(missing_docs)]

use libc::{clockid_t, CLOCK_MONOTONIC, CLOCK_REALTIME};
use std::mem::MaybeUninit;

/// USec infinity
pub const USEC_INFINITY: u64 = u64::MAX;

/// USec per Sec
pub const USEC_PER_SEC: u64 = 1_000_000;
/// USec per MSec
pub const USEC_PER_MSEC: u64 = 1_000;
/// NSec per USec
pub const NSEC_PER_USEC: u64 = 1_000;

/// Read the given clock, in microseconds.
pub fn now_clockid(c: clockid_t) -> u64 {
    let mut ts = MaybeUninit::<libc::timespec>::zeroed();
    let r = unsafe { libc::clock_gettime(c, ts.as_mut_ptr()) };
    if r < 0 {
        return USEC_INFINITY;
    }
    let ts = unsafe { ts.assume_init() };
    (ts.tv_sec as u64) * USEC_PER_SEC + (ts.tv_nsec as u64) / NSEC_PER_USEC
}

pub fn now_realtime() -> u64 {
    now_clockid(CLOCK_REALTIME)
}

pub fn now_monotonic() -> u64 {
    now_clockid(CLOCK_MONOTONIC)
}

/// A wallclock/monotonic timestamp pair taken at the same instant.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DualTimestamp {
    pub realtime: u64,
    pub monotonic: u64,
}

impl DualTimestamp {
    pub fn now() -> DualTimestamp {
        DualTimestamp {
            realtime: now_realtime(),
            monotonic: now_monotonic(),
        }
    }

    pub fn is_set(&self) -> bool {
        self.monotonic > 0
    }
}

/// The timestamps a unit maintains across its state transitions.
#[derive(Default, Clone, Copy, Debug)]
pub struct UnitTimeStamp {
    pub state_change_timestamp: DualTimestamp,
    pub inactive_exit_timestamp: DualTimestamp,
    pub active_enter_timestamp: DualTimestamp,
    pub active_exit_timestamp: DualTimestamp,
    pub inactive_enter_timestamp: DualTimestamp,
    pub condition_timestamp: DualTimestamp,
    pub assert_timestamp: DualTimestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_clockid() {
        let a = now_monotonic();
        let b = now_monotonic();
        assert!(a <= b);
        assert_ne!(a, USEC_INFINITY);
    }

    #[test]
    fn test_dual_timestamp() {
        let ts = DualTimestamp::default();
        assert!(!ts.is_set());
        let ts = DualTimestamp::now();
        assert!(ts.is_set());
    }
}
