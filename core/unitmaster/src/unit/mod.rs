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
//! Unit is the abstraction of every object the manager drives. All objects
//! map to a unit; a unit is divided into two major stages:
//! 1. Load stage: resolve the parsed fragment into a concrete unit object.
//! 2. Execution stage: drive the per-type state machine and coordinate the
//!    resulting transitions through the queues.
//!
//! The type-specific halves plug in through [`SubUnit`]; everything the
//! engine itself does is expressed over [`base`] vocabulary, the
//! [`entry`] state container, the datastore (names, graph, pids), the
//! queue runtime and the manager façade.

pub mod base;

pub use bus::BusSink;
pub use entry::{JobMode, UeConfigInstall, UeConfigUnit, Unit, UnitEmergencyAction};
pub use manager::{UnitManager, UnitManagerX};
pub use sub::{
    unit_vtable, SubUnit, SubUnitCreator, SubUnitRegistry, UmIf, UnitBase, UnitVTable,
};
pub use util::{UnitFileStore, UnitFragment};

pub(crate) use entry::UnitX;

mod bus;
pub(crate) mod data;
pub(crate) mod datastore;
pub(crate) mod entry;
mod gc;
mod manager;
mod runtime;
mod sigchld;
pub(crate) mod sub;
mod types;
mod uload;
pub(crate) mod util;

#[cfg(test)]
pub(crate) mod test_utils;
