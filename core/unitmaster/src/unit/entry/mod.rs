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

//! # General description
//! Unit is the abstraction of every object the manager drives. A unit goes
//! through two major stages:
//! 1. Load stage: resolve the parsed fragment into a concrete unit object.
//! 2. Execution stage: drive the per-type state machine through start,
//!    stop, reload and the notifications they produce.
//!
//! The module splits the state container into focused pieces:
//! - `base`: identity (id, names, instance, type)
//! - `config`: the [Unit]/[Install] snapshot and property writes
//! - `load`: load pipeline state
//! - `condition`: start conditions and asserts
//! - `ratelimit`: the start limit and the auto-stop limit
//! - `cgroup`: the opaque cgroup attachment
//! - `child`: watched pids
//! - `refs`: named weak back-edges, rewritten on merge
//! - `uentry`/`unitx`: the unit object and the engine-facing handle

pub use config::{JobMode, UeConfigInstall, UeConfigUnit, UnitEmergencyAction};
pub(crate) use ratelimit::StartLimitResult;
pub(crate) use refs::{rewrite_refs, UnitRef};
pub use uentry::Unit;
pub(crate) use uentry::UnitQueueFlags;
pub(crate) use unitx::UnitX;

// dependency:
// base -> {config | condition | ratelimit | cgroup | child} ->
// {load | refs | bus} -> uentry -> unitx
mod base;
mod bus;
mod cgroup;
mod child;
mod condition;
mod config;
mod load;
mod ratelimit;
mod refs;
mod uentry;
mod unitx;
