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

//! The process-free unit types the engine carries in-tree: target, slice
//! and scope. Types that spawn processes or talk to the kernel (service,
//! socket, mount, ...) live in external modules and register themselves.

mod comm;
mod scope;
mod slice;
mod target;

use super::base::UnitType;
use super::sub::SubUnitRegistry;

pub(crate) use slice::SLICE_ROOT;

/// Register the in-tree types.
pub(crate) fn install_default_types(registry: &SubUnitRegistry) {
    registry.register(UnitType::UnitTarget, target::target_new);
    registry.register(UnitType::UnitSlice, slice::slice_new);
    registry.register(UnitType::UnitScope, scope::scope_new);
}
