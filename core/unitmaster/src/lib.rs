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

//! The unit engine of a system-and-service manager.
//!
//! The engine models units (services, sockets, targets, mounts, timers,
//! slices, scopes, ...), maintains the typed dependency graph between them,
//! drives each unit through its lifecycle state machine and coordinates
//! activation and deactivation through queued work items on a single event
//! loop.
//!
//! Per-type execution (process spawning, cgroup plumbing, bus transport,
//! unit file parsing) is delegated to external components which plug into
//! the engine through the [`unit::SubUnit`] trait and the
//! [`unit::SubUnitRegistry`].

pub mod error;
pub mod job;
pub mod manager;
pub mod serialize;
pub mod unit;

pub(crate) mod utils;
