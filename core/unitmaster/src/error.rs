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

//! Error define. The unit components and the engine core share one Error in
//! terms of logic and functionality to avoid frequent conversions.

/// Reuse the Errno from the nix library.
pub use nix::errno::Errno;
use snafu::prelude::*;
#[allow(unused_imports)]
pub use snafu::ResultExt;

/// unitmaster Error
#[allow(missing_docs)]
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Invalid unit name: {}", name))]
    InvalidName {
        name: String,
    },

    #[snafu(display("Name '{}' is already owned by another unit", name))]
    NameConflict {
        name: String,
    },

    #[snafu(display("NotFound(unitmaster): '{}'.", what))]
    NotFound {
        what: String,
    },

    #[snafu(display("Unit file is masked"))]
    Masked,

    #[snafu(display("Bad setting: {}", msg))]
    BadSetting {
        msg: String,
    },

    #[snafu(display("Load error: {}", msg))]
    LoadError {
        msg: String,
    },

    #[snafu(display("Conflicts with a pending job"))]
    JobConflict,

    #[snafu(display("Job '{}' is not applicable to unit {}", kind, unit))]
    JobNotApplicable {
        kind: String,
        unit: String,
    },

    #[snafu(display("Manual start of {} is refused", unit))]
    ManualStartRefused {
        unit: String,
    },

    #[snafu(display("Manual stop of {} is refused", unit))]
    ManualStopRefused {
        unit: String,
    },

    #[snafu(display("Unit {} does not allow being isolated", unit))]
    IsolateRefused {
        unit: String,
    },

    #[snafu(display("Start request was rate limited"))]
    RateLimited,

    #[snafu(display("Unit type does not allow transient units"))]
    TransientNotAllowed,

    #[snafu(display("Timeout(unitmaster)"))]
    Timeout,

    #[snafu(display("Cancelled(unitmaster)"))]
    Cancelled,

    #[snafu(display("IoError(unitmaster)"))]
    Io {
        source: std::io::Error,
    },

    #[snafu(display("NixError(unitmaster)"))]
    Nix {
        source: nix::Error,
    },

    #[snafu(display("EventError(unitmaster)"))]
    Event {
        source: event::Error,
    },

    #[snafu(display("InvalidData(unitmaster)"))]
    InvalidData,

    #[snafu(display("OtherError(unitmaster): '{}'.", msg))]
    Other {
        msg: String,
    },

    /// UnitAction errors, surfaced by per-type code towards the engine
    #[snafu(display("EAgain(UnitActionError)"))]
    UnitActionEAgain,
    #[snafu(display("EAlready(UnitActionError)"))]
    UnitActionEAlready,
    #[snafu(display("EComm(UnitActionError)"))]
    UnitActionEComm,
    #[snafu(display("EBadR(UnitActionError)"))]
    UnitActionEBadR,
    #[snafu(display("ENoExec(UnitActionError)"))]
    UnitActionENoExec,
    #[snafu(display("EProto(UnitActionError)"))]
    UnitActionEProto,
    #[snafu(display("EOpNotSupp(UnitActionError)"))]
    UnitActionEOpNotSupp,
    #[snafu(display("EFailed(UnitActionError)"))]
    UnitActionEFailed,
    #[snafu(display("EInval(UnitActionError)"))]
    UnitActionEInval,
    #[snafu(display("EBusy(UnitActionError)"))]
    UnitActionEBusy,
    #[snafu(display("ENoent(UnitActionError)"))]
    UnitActionENoent,
}

/// new Result
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other { msg }
    }
}

impl From<nix::Error> for Error {
    fn from(source: nix::Error) -> Self {
        Error::Nix { source }
    }
}
