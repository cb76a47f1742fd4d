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

use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

/// The high-level unit state, derived from the per-type substate and the
/// job state.
#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum UnitActiveState {
    /// unit is activated
    Active,
    /// unit is in reloading
    Reloading,
    /// unit is not active
    InActive,
    /// unit action has failed
    Failed,
    /// unit is in starting
    Activating,
    /// unit is in stopping
    DeActivating,
    /// unit is in maintenance
    Maintenance,
}

impl UnitActiveState {
    ///
    pub fn is_active_or_reloading(&self) -> bool {
        matches!(self, UnitActiveState::Active | UnitActiveState::Reloading)
    }

    ///
    pub fn is_inactive_or_failed(&self) -> bool {
        matches!(self, UnitActiveState::InActive | UnitActiveState::Failed)
    }

    ///
    pub fn is_active_or_activating(&self) -> bool {
        matches!(
            self,
            UnitActiveState::Active | UnitActiveState::Activating | UnitActiveState::Reloading
        )
    }

    ///
    pub fn is_inactive_or_deactivating(&self) -> bool {
        matches!(
            self,
            UnitActiveState::InActive | UnitActiveState::Failed | UnitActiveState::DeActivating
        )
    }
}

impl fmt::Display for UnitActiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitActiveState::Active => write!(f, "active"),
            UnitActiveState::Reloading => write!(f, "reloading"),
            UnitActiveState::InActive => write!(f, "inactive"),
            UnitActiveState::Failed => write!(f, "failed"),
            UnitActiveState::Activating => write!(f, "activating"),
            UnitActiveState::DeActivating => write!(f, "deactivating"),
            UnitActiveState::Maintenance => write!(f, "maintenance"),
        }
    }
}

impl FromStr for UnitActiveState {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UnitActiveState::Active),
            "reloading" => Ok(UnitActiveState::Reloading),
            "inactive" => Ok(UnitActiveState::InActive),
            "failed" => Ok(UnitActiveState::Failed),
            "activating" => Ok(UnitActiveState::Activating),
            "deactivating" => Ok(UnitActiveState::DeActivating),
            "maintenance" => Ok(UnitActiveState::Maintenance),
            other => Err(crate::error::Error::NotFound {
                what: format!("active state: {}", other),
            }),
        }
    }
}

bitflags! {
    /// Qualifiers a per-type module attaches to a state notification.
    pub struct UnitNotifyFlags: u8 {
        /// downgrade the reload outcome
        const RELOAD_FAILURE = 1 << 0;
        /// the unit will be restarted automatically, keep failure actions quiet
        const WILL_AUTO_RESTART = 1 << 1;
        /// the transition comes from a failed condition check, not an error
        const SKIP_CONDITION = 1 << 2;
    }
}

/// How far a unit got through the load pipeline.
#[allow(clippy::enum_variant_names)]
#[derive(PartialEq, Debug, Eq, Copy, Clone)]
pub enum UnitLoadState {
    Stub = 0,
    Loaded,
    NotFound,
    Error,
    BadSetting,
    Merged,
    Masked,
}

impl fmt::Display for UnitLoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitLoadState::Stub => write!(f, "stub"),
            UnitLoadState::Loaded => write!(f, "loaded"),
            UnitLoadState::NotFound => write!(f, "not-found"),
            UnitLoadState::Error => write!(f, "error"),
            UnitLoadState::BadSetting => write!(f, "bad-setting"),
            UnitLoadState::Merged => write!(f, "merged"),
            UnitLoadState::Masked => write!(f, "masked"),
        }
    }
}

impl FromStr for UnitLoadState {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stub" => Ok(UnitLoadState::Stub),
            "loaded" => Ok(UnitLoadState::Loaded),
            "not-found" => Ok(UnitLoadState::NotFound),
            "error" => Ok(UnitLoadState::Error),
            "bad-setting" => Ok(UnitLoadState::BadSetting),
            "merged" => Ok(UnitLoadState::Merged),
            "masked" => Ok(UnitLoadState::Masked),
            other => Err(crate::error::Error::NotFound {
                what: format!("load state: {}", other),
            }),
        }
    }
}

/// From which states the garbage collector may take a unit.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum CollectMode {
    /// collect only inactive units
    Inactive,
    /// also collect failed units
    InactiveOrFailed,
}

impl Default for CollectMode {
    fn default() -> Self {
        CollectMode::Inactive
    }
}

impl fmt::Display for CollectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectMode::Inactive => write!(f, "inactive"),
            CollectMode::InactiveOrFailed => write!(f, "inactive-or-failed"),
        }
    }
}

impl FromStr for CollectMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inactive" => Ok(CollectMode::Inactive),
            "inactive-or-failed" => Ok(CollectMode::InactiveOrFailed),
            other => Err(crate::error::Error::NotFound {
                what: format!("collect mode: {}", other),
            }),
        }
    }
}

bitflags! {
    /// Flags used when writing property changes back to configuration.
    pub struct UnitWriteFlags: u8 {
        /// write a runtime drop-in, below /run
        const RUNTIME = 1 << 0;
        /// write a persistent drop-in, below /etc
        const PERSISTENT = 1 << 1;
        /// place the item in the per-type private section instead of [Unit]
        const PRIVATE = 1 << 2;
        /// apply specifier escaping before writing
        const ESCAPE_SPECIFIERS = 1 << 3;
        /// apply C escaping before writing
        const ESCAPE_C = 1 << 4;
    }
}

/// Neither persistent nor runtime storage requested: a check-only call.
pub fn unit_write_flags_noop(flags: UnitWriteFlags) -> bool {
    !flags.intersects(UnitWriteFlags::RUNTIME | UnitWriteFlags::PERSISTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_helpers() {
        assert!(UnitActiveState::Active.is_active_or_reloading());
        assert!(UnitActiveState::Reloading.is_active_or_reloading());
        assert!(!UnitActiveState::Activating.is_active_or_reloading());
        assert!(UnitActiveState::Failed.is_inactive_or_failed());
        assert!(UnitActiveState::Activating.is_active_or_activating());
        assert!(UnitActiveState::DeActivating.is_inactive_or_deactivating());
    }

    #[test]
    fn state_strings_round_trip() {
        for st in [
            UnitActiveState::Active,
            UnitActiveState::Failed,
            UnitActiveState::DeActivating,
        ] {
            assert_eq!(st.to_string().parse::<UnitActiveState>().unwrap(), st);
        }
        for ls in [UnitLoadState::Loaded, UnitLoadState::BadSetting] {
            assert_eq!(ls.to_string().parse::<UnitLoadState>().unwrap(), ls);
        }
    }

    #[test]
    fn write_flags_noop() {
        assert!(unit_write_flags_noop(UnitWriteFlags::PRIVATE));
        assert!(!unit_write_flags_noop(UnitWriteFlags::RUNTIME));
        assert!(!unit_write_flags_noop(
            UnitWriteFlags::PERSISTENT | UnitWriteFlags::PRIVATE
        ));
    }
}
