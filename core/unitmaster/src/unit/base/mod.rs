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

//! Base vocabulary of the unit engine: types, states, relations, provenance.

mod kill;
mod mask;
mod relation;
mod relation_atom;
mod state;
mod types;

pub use kill::{KillOperation, KillWho};
pub use mask::{UnitDepInfo, UnitDependencyMask};
pub use relation::{unit_relation_to_inverse, UnitRelations};
pub use relation_atom::{unit_relation_from_unique_atom, unit_relation_to_atom, UnitRelationAtom};
pub use state::{
    unit_write_flags_noop, CollectMode, UnitActiveState, UnitLoadState, UnitNotifyFlags,
    UnitWriteFlags,
};
pub use types::{unit_name_to_type, UnitType};
