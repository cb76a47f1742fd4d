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

use super::config::UeConfig;
use crate::error::*;
use crate::unit::base::UnitWriteFlags;
use std::rc::Rc;

/// Property writes arriving over the bus, routed into the config snapshot.
pub(super) struct UeBus {
    config: Rc<UeConfig>,
}

impl UeBus {
    pub(super) fn new(configr: &Rc<UeConfig>) -> UeBus {
        UeBus {
            config: Rc::clone(configr),
        }
    }

    pub(super) fn set_property(&self, key: &str, value: &str, flags: UnitWriteFlags) -> Result<()> {
        self.config.set_property(key, value, flags)
    }
}
