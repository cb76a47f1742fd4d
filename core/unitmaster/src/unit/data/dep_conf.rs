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

use crate::unit::base::UnitRelations;
use std::collections::HashMap;

/// The dependency names one fragment asserts, keyed by relation kind.
#[derive(Debug, Clone, Default)]
pub(crate) struct UnitDepConf {
    pub(crate) deps: HashMap<UnitRelations, Vec<String>>,
    /// RequiresMountsFor= paths
    pub(crate) mounts_for: Vec<String>,
    /// Slice= the unit asked for, empty for the default
    pub(crate) slice: String,
}

impl UnitDepConf {
    pub(crate) fn new() -> UnitDepConf {
        UnitDepConf::default()
    }
}
