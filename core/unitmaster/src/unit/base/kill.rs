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

use std::str::FromStr;

/// Which processes of a unit a kill request addresses.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum KillWho {
    /// the main process only
    Main,
    /// the control process only
    Control,
    /// everything in the unit's control group
    All,
}

impl FromStr for KillWho {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(KillWho::Main),
            "control" => Ok(KillWho::Control),
            "all" => Ok(KillWho::All),
            other => Err(crate::error::Error::NotFound {
                what: format!("kill who: {}", other),
            }),
        }
    }
}

/// The escalation stage a kill happens at.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum KillOperation {
    /// plain SIGTERM
    Terminate,
    /// SIGTERM, logged loudly
    TerminateAndLog,
    /// SIGKILL
    Kill,
    /// watchdog expired
    Watchdog,
}

impl KillOperation {
    ///
    pub fn to_signal(&self) -> libc::c_int {
        match self {
            KillOperation::Terminate | KillOperation::TerminateAndLog => libc::SIGTERM,
            KillOperation::Kill | KillOperation::Watchdog => libc::SIGKILL,
        }
    }
}
