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

//! Error definition of the event crate.

use snafu::prelude::*;

/// Errors of the event loop.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// a raw system call failed
    #[snafu(display("Syscall {} failed, errno {}, ret {}", syscall, errno, ret))]
    Syscall {
        /// name of the call
        syscall: &'static str,
        /// errno at failure time
        errno: i32,
        /// raw return value
        ret: i32,
    },

    /// anything else
    #[snafu(display("Error: {}", word))]
    Other {
        /// description
        word: &'static str,
    },
}

/// Result alias of the event crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
