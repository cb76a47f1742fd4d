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

//! An event scheduling framework based on epoll.
//!
//! Callers implement [`Source`] and register it with [`Events`]; one thread
//! drives [`Events::run`] (or [`Events::rloop`]) and sources are dispatched
//! by priority.

pub mod error;
mod events;
mod poll;
mod source;
mod timer;

pub use error::{Error, Result};
pub use events::Events;
pub(crate) use poll::Poll;
pub use source::Source;

/// Scheduling state of a registered source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    /// dispatched whenever ready
    On,
    /// registered but not dispatched
    Off,
    /// dispatched once, then set to Off
    OneShot,
}

/// The kind of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// readiness of a file descriptor
    Io,
    /// wallclock timer
    TimerRealtime,
    /// monotonic timer
    TimerMonotonic,
    /// dispatched on every loop iteration
    Defer,
    /// dispatched after any other source was dispatched
    Post,
    /// dispatched once when the loop exits
    Exit,
}
