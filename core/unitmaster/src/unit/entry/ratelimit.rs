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

use basic::time_util::{now_monotonic, USEC_PER_SEC};
use std::cell::{Cell, RefCell};

/// Token bucket on the monotonic clock. Current tokens and the interval
/// begin survive reexec through the serialization stream.
pub(crate) struct RateLimit {
    interval: u64, // usec
    burst: u32,
    begin: u64, // usec monotonic, 0 when no interval is open
    num: u32,
}

impl RateLimit {
    pub(crate) fn new(interval: u64, burst: u32) -> RateLimit {
        RateLimit {
            interval,
            burst,
            begin: 0,
            num: 0,
        }
    }

    pub(crate) fn init_from_config(&mut self, interval_sec: u64, burst: u32) {
        self.interval = interval_sec * USEC_PER_SEC;
        self.burst = burst;
    }

    /// Take a token. False when the bucket is exhausted for this interval.
    pub(crate) fn ratelimit_below(&mut self) -> bool {
        if !self.ratelimit_enabled() {
            return true;
        }

        let now = now_monotonic();
        if self.begin == 0 || now.saturating_sub(self.begin) > self.interval {
            self.begin = now;
            self.num = 1;
            return true;
        }

        if self.num < self.burst {
            self.num += 1;
            return true;
        }

        false
    }

    pub(crate) fn reset_ratelimit(&mut self) {
        self.begin = 0;
        self.num = 0;
    }

    fn ratelimit_enabled(&self) -> bool {
        self.interval > 0 && self.burst > 0
    }

    pub(crate) fn state(&self) -> (u64, u32) {
        (self.begin, self.num)
    }

    pub(crate) fn set_state(&mut self, begin: u64, num: u32) {
        self.begin = begin;
        self.num = num;
    }
}

/// Whether the last start attempt tripped the limit.
#[derive(PartialEq, Eq, Clone, Debug)]
pub(crate) enum StartLimitResult {
    StartLimitNotHit,
    StartLimitHit,
}

pub(crate) struct StartLimit {
    hit: Cell<bool>,
    start_limit: RefCell<RateLimit>,
}

impl StartLimit {
    pub(crate) fn new() -> Self {
        StartLimit {
            hit: Cell::new(false),
            start_limit: RefCell::new(RateLimit::new(0, 0)),
        }
    }

    pub(crate) fn set_hit(&self, hit: bool) {
        self.hit.set(hit)
    }

    #[allow(dead_code)]
    pub(crate) fn hit(&self) -> bool {
        self.hit.get()
    }

    pub(crate) fn ratelimit_below(&self) -> bool {
        self.start_limit.borrow_mut().ratelimit_below()
    }

    pub(crate) fn reset_limit(&self) {
        self.start_limit.borrow_mut().reset_ratelimit()
    }

    pub(crate) fn init_from_config(&self, interval_sec: u64, burst: u32) {
        self.start_limit
            .borrow_mut()
            .init_from_config(interval_sec, burst);
    }

    pub(crate) fn state(&self) -> (u64, u32) {
        self.start_limit.borrow().state()
    }

    pub(crate) fn set_state(&self, begin: u64, num: u32) {
        self.start_limit.borrow_mut().set_state(begin, num)
    }
}

#[cfg(test)]
mod tests {
    use super::RateLimit;

    #[test]
    fn test_ratelimit() {
        let mut tmp = RateLimit::new(0, 0);
        assert!(tmp.ratelimit_below());

        let mut tmp2 = RateLimit::new(3_000_000, 2);
        assert!(tmp2.ratelimit_below());
        assert!(tmp2.ratelimit_below());
        assert!(!tmp2.ratelimit_below());

        tmp2.reset_ratelimit();
        assert!(tmp2.ratelimit_below());
    }

    #[test]
    fn test_state_round_trip() {
        let mut rl = RateLimit::new(5_000_000, 3);
        assert!(rl.ratelimit_below());
        assert!(rl.ratelimit_below());
        let (begin, num) = rl.state();
        assert!(begin > 0);
        assert_eq!(num, 2);

        let mut other = RateLimit::new(5_000_000, 3);
        other.set_state(begin, num);
        assert!(other.ratelimit_below());
        assert!(!other.ratelimit_below());
    }
}
