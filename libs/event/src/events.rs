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

//! The event dispatcher.

use crate::timer::Timer;
use crate::{syscall, EventState, EventType, Poll, Result, Source};
use std::cell::RefCell;
use std::collections::{BinaryHeap, HashMap};
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;
use std::rc::Rc;

/* Tokens the timerfds are registered under; sources never use these. */
const TOKEN_TIMER_REALTIME: u64 = u64::MAX - 1;
const TOKEN_TIMER_MONOTONIC: u64 = u64::MAX - 2;

/// An event scheduling framework based on epoll.
#[derive(Debug)]
pub struct Events {
    data: RefCell<EventsData>,
}

impl Drop for Events {
    fn drop(&mut self) {
        // repeating protection
        self.clear();
    }
}

impl Events {
    /// create event
    pub fn new() -> Result<Events> {
        Ok(Events {
            data: RefCell::new(EventsData::new()?),
        })
    }

    /// for all: add source which implement Source trait
    pub fn add_source(&self, source: Rc<dyn Source>) -> Result<i32> {
        self.data.borrow_mut().add_source(source)
    }

    /// for all: check if the source exists
    pub fn has_source(&self, source: Rc<dyn Source>) -> bool {
        self.data.borrow().has_source(source)
    }

    /// for all: delete source
    pub fn del_source(&self, source: Rc<dyn Source>) -> Result<i32> {
        self.data.borrow_mut().del_source(source)
    }

    /// for all: set the source enabled state
    pub fn set_enabled(&self, source: Rc<dyn Source>, state: EventState) -> Result<i32> {
        self.data.borrow_mut().set_enabled(source, state)
    }

    /// for all: exit event loop
    pub fn set_exit(&self) {
        self.data.borrow_mut().set_exit()
    }

    /// for all: Scheduling once, processing an event
    pub fn run(&self, timeout: i32) -> Result<i32> {
        if self.data.borrow().exit() {
            return Ok(0);
        }

        if !self.data.borrow_mut().prepare() {
            self.data.borrow_mut().wait(timeout);
        }

        self.dispatch()?;
        Ok(0)
    }

    /// for all: Process the event in a loop until exiting actively
    pub fn rloop(&self) -> Result<i32> {
        loop {
            if self.data.borrow().exit() {
                break;
            }
            self.run(-1i32)?;
        }

        let exits = self.data.borrow().exit_pending();
        for source in exits {
            source.dispatch(self);
        }
        Ok(0)
    }

    /// private: Fetch the highest priority event processing on the pending queue
    fn dispatch(&self) -> Result<i32> {
        if self.data.borrow().exit() {
            return Ok(0);
        }

        let first = self.data.borrow_mut().pending_pop();
        let top = match first {
            None => return Ok(0),
            Some(v) => v,
        };

        let state = match self.data.borrow().source_state(top.token()) {
            None => return Ok(0),
            Some(v) => v.state,
        };

        /* If a non-post event source raised, mark all post event sources as pending. */
        if state != EventState::Off && top.event_type() != EventType::Post {
            self.data.borrow_mut().pending_posts();
        }

        match state {
            EventState::Off => {}
            EventState::On => {
                top.dispatch(self);
                if top.event_type() == EventType::Defer {
                    self.data.borrow_mut().pending_push(top.clone());
                }
            }
            EventState::OneShot => {
                self.data
                    .borrow_mut()
                    .set_enabled(top.clone(), EventState::Off)?;
                top.dispatch(self);
            }
        }
        Ok(0)
    }

    /// for test: clear all events to release resource
    /// repeating protection
    pub fn clear(&self) {
        self.data.borrow_mut().clear();
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct State {
    pub(crate) state: EventState,
    in_pending: bool,
}

impl Default for State {
    fn default() -> State {
        State {
            state: EventState::Off,
            in_pending: false,
        }
    }
}

#[derive(Debug)]
struct EventsData {
    poller: Poll,
    exit: bool,
    sources: HashMap<u64, Rc<dyn Source>>,
    defer_sources: HashMap<u64, Rc<dyn Source>>,
    post_sources: HashMap<u64, Rc<dyn Source>>,
    exit_sources: HashMap<u64, Rc<dyn Source>>,
    pending: BinaryHeap<Rc<dyn Source>>,
    state: HashMap<u64, State>,
    timerfd: HashMap<EventType, RawFd>,
    timer: Timer,
}

impl EventsData {
    fn new() -> Result<EventsData> {
        Ok(EventsData {
            poller: Poll::new()?,
            exit: false,
            sources: HashMap::new(),
            defer_sources: HashMap::new(),
            post_sources: HashMap::new(),
            exit_sources: HashMap::new(),
            pending: BinaryHeap::new(),
            state: HashMap::new(),
            timerfd: HashMap::new(),
            timer: Timer::new(),
        })
    }

    fn add_source(&mut self, source: Rc<dyn Source>) -> Result<i32> {
        let token = source.token();
        match source.event_type() {
            EventType::Io | EventType::TimerRealtime | EventType::TimerMonotonic => {
                self.sources.insert(token, source);
            }
            EventType::Defer => {
                self.defer_sources.insert(token, source);
            }
            EventType::Post => {
                self.post_sources.insert(token, source);
            }
            EventType::Exit => {
                self.exit_sources.insert(token, source);
            }
        }

        self.state.insert(token, State::default());
        Ok(0)
    }

    fn has_source(&self, source: Rc<dyn Source>) -> bool {
        self.state.contains_key(&source.token())
    }

    fn del_source(&mut self, source: Rc<dyn Source>) -> Result<i32> {
        self.source_offline(&source)?;

        let token = source.token();
        match source.event_type() {
            EventType::Io | EventType::TimerRealtime | EventType::TimerMonotonic => {
                self.sources.remove(&token);
            }
            EventType::Defer => {
                self.defer_sources.remove(&token);
            }
            EventType::Post => {
                self.post_sources.remove(&token);
            }
            EventType::Exit => {
                self.exit_sources.remove(&token);
            }
        }

        self.state.remove(&token);
        Ok(0)
    }

    fn set_enabled(&mut self, source: Rc<dyn Source>, state: EventState) -> Result<i32> {
        let token = source.token();
        if let Some(current) = self.state.get(&token) {
            if current.state == state {
                return Ok(0);
            }
        }

        match state {
            EventState::On | EventState::OneShot => {
                self.source_online(&source)?;
            }
            EventState::Off => {
                self.source_offline(&source)?;
            }
        }

        if let Some(current) = self.state.get_mut(&token) {
            current.state = state;
        }

        Ok(0)
    }

    /// when set to on, register events to the listening queue
    fn source_online(&mut self, source: &Rc<dyn Source>) -> Result<i32> {
        let et = source.event_type();
        let token = source.token();

        match et {
            EventType::Io => {
                let mut event = libc::epoll_event {
                    events: source.epoll_event(),
                    u64: token,
                };
                self.poller.register(source.fd(), &mut event)?;
            }
            EventType::TimerRealtime | EventType::TimerMonotonic => {
                if !self.timerfd.contains_key(&et) {
                    let fd = syscall!(timerfd_create(
                        Timer::clockid(&et),
                        libc::TFD_NONBLOCK | libc::TFD_CLOEXEC
                    ))?;
                    let mut event = libc::epoll_event {
                        events: libc::EPOLLIN as u32,
                        u64: timer_token(&et),
                    };
                    self.poller.register(fd, &mut event)?;
                    self.timerfd.insert(et, fd);
                }
                self.timer.push(source.clone());
            }
            EventType::Defer => {
                self.pending_push(source.clone());
            }
            EventType::Post | EventType::Exit => {}
        }

        Ok(0)
    }

    /// move the event out of the listening queue
    fn source_offline(&mut self, source: &Rc<dyn Source>) -> Result<i32> {
        // unneed unregister when source is already Offline
        match self.state.get(&source.token()) {
            Some(current) => {
                if current.state == EventState::Off {
                    return Ok(0);
                }
            }
            None => return Ok(0),
        }

        let et = source.event_type();
        match et {
            EventType::Io => {
                self.poller.unregister(source.fd())?;
            }
            EventType::TimerRealtime | EventType::TimerMonotonic => {
                self.timer.remove(&et, source.token());
                if self.timer.is_empty(&et) {
                    if let Some(fd) = self.timerfd.remove(&et) {
                        let _ = self.poller.unregister(fd);
                        let _ = syscall!(close(fd));
                    }
                }
            }
            EventType::Defer | EventType::Post | EventType::Exit => {}
        }

        Ok(0)
    }

    /// Wait for events through the poller and queue whatever became ready.
    fn wait(&mut self, timeout: i32) -> bool {
        let events = match self.poller.poll(timeout) {
            Ok(v) => v,
            Err(_) => return false,
        };

        for event in events.iter() {
            let token = event.u64;
            match self.sources.get(&token).cloned() {
                Some(source) => self.pending_push(source),
                None if token == TOKEN_TIMER_REALTIME => {
                    self.flush_timer(&EventType::TimerRealtime)
                }
                None if token == TOKEN_TIMER_MONOTONIC => {
                    self.flush_timer(&EventType::TimerMonotonic)
                }
                None => {}
            }
        }

        self.collect_ready_timers();

        !self.pending.is_empty()
    }

    fn prepare(&mut self) -> bool {
        let mut ret = self.collect_ready_timers();

        for et in [EventType::TimerRealtime, EventType::TimerMonotonic] {
            let next = match self.timer.next(&et) {
                None => continue,
                Some(v) => v,
            };
            if let Some(fd) = self.timerfd.get(&et) {
                let new_value = libc::itimerspec {
                    it_interval: libc::timespec {
                        tv_sec: 0,
                        tv_nsec: 0,
                    },
                    it_value: libc::timespec {
                        tv_sec: (next / 1_000_000) as libc::time_t,
                        tv_nsec: ((next % 1_000_000) * 1_000) as libc::c_long,
                    },
                };
                let mut old_value = MaybeUninit::<libc::itimerspec>::zeroed();
                unsafe {
                    libc::timerfd_settime(
                        *fd,
                        libc::TFD_TIMER_ABSTIME,
                        &new_value,
                        old_value.as_mut_ptr(),
                    );
                }
            }
        }

        if !self.pending.is_empty() {
            ret = true;
        }

        ret
    }

    fn collect_ready_timers(&mut self) -> bool {
        let mut ret = false;
        for et in [EventType::TimerRealtime, EventType::TimerMonotonic] {
            let now = Timer::now(&et);
            for source in self.timer.pop_ready(&et, now) {
                self.pending_push(source);
                ret = true;
            }
        }
        ret
    }

    fn flush_timer(&mut self, et: &EventType) {
        if let Some(fd) = self.timerfd.get(et) {
            let mut buf = [0u8; 8];
            unsafe {
                libc::read(*fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len());
            }
        }
    }

    fn pending_pop(&mut self) -> Option<Rc<dyn Source>> {
        let top = self.pending.pop()?;
        if let Some(state) = self.state.get_mut(&top.token()) {
            state.in_pending = false;
        }
        Some(top)
    }

    fn pending_push(&mut self, source: Rc<dyn Source>) {
        if let Some(current) = self.state.get_mut(&source.token()) {
            if !current.in_pending {
                current.in_pending = true;
                self.pending.push(source);
            }
        }
    }

    fn pending_posts(&mut self) {
        let posts: Vec<Rc<dyn Source>> = self
            .post_sources
            .values()
            .filter(|s| {
                self.state
                    .get(&s.token())
                    .map(|st| st.state != EventState::Off)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        for source in posts {
            self.pending_push(source);
        }
    }

    fn exit_pending(&self) -> Vec<Rc<dyn Source>> {
        self.exit_sources
            .values()
            .filter(|s| {
                self.state
                    .get(&s.token())
                    .map(|st| st.state != EventState::Off)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn source_state(&self, token: u64) -> Option<State> {
        self.state.get(&token).copied()
    }

    fn set_exit(&mut self) {
        self.exit = true;
    }

    fn exit(&self) -> bool {
        self.exit
    }

    fn clear(&mut self) {
        self.sources.clear();
        self.defer_sources.clear();
        self.post_sources.clear();
        self.exit_sources.clear();
        self.pending.clear();
        self.state.clear();
        for (_, fd) in self.timerfd.drain() {
            let _ = syscall!(close(fd));
        }
    }
}

fn timer_token(et: &EventType) -> u64 {
    match et {
        EventType::TimerRealtime => TOKEN_TIMER_REALTIME,
        _ => TOKEN_TIMER_MONOTONIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter {
        count: Cell<u32>,
        et: EventType,
    }

    impl Counter {
        fn new(et: EventType) -> Counter {
            Counter {
                count: Cell::new(0),
                et,
            }
        }
    }

    impl Source for Counter {
        fn event_type(&self) -> EventType {
            self.et
        }

        fn time_relative(&self) -> u64 {
            0
        }

        fn token(&self) -> u64 {
            let data: u64 = unsafe { std::mem::transmute(self) };
            data
        }

        fn priority(&self) -> i8 {
            0i8
        }

        fn dispatch(&self, _: &Events) -> i32 {
            self.count.set(self.count.get() + 1);
            0
        }
    }

    #[test]
    fn test_defer_source() {
        let events = Events::new().unwrap();
        let source = Rc::new(Counter::new(EventType::Defer));
        events.add_source(source.clone()).unwrap();
        events.set_enabled(source.clone(), EventState::On).unwrap();

        events.run(0).unwrap();
        events.run(0).unwrap();
        assert!(source.count.get() >= 2);

        events.del_source(source).unwrap();
        events.clear();
    }

    #[test]
    fn test_oneshot_source() {
        let events = Events::new().unwrap();
        let source = Rc::new(Counter::new(EventType::Defer));
        events.add_source(source.clone()).unwrap();
        events
            .set_enabled(source.clone(), EventState::OneShot)
            .unwrap();

        events.run(0).unwrap();
        events.run(0).unwrap();
        assert_eq!(source.count.get(), 1);
        events.clear();
    }

    #[test]
    fn test_monotonic_timer() {
        let events = Events::new().unwrap();
        let source = Rc::new(Counter::new(EventType::TimerMonotonic));
        events.add_source(source.clone()).unwrap();
        events.set_enabled(source.clone(), EventState::On).unwrap();

        // deadline is zero usec away, the first iteration must fire it
        events.run(100).unwrap();
        assert_eq!(source.count.get(), 1);
        events.clear();
    }
}
