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

use basic::unit_name::unit_name_suffix;
use std::fmt;
use std::str::FromStr;

/// All unit types the engine models. Whether a type is backed by an
/// in-process module is a property of the [`crate::unit::SubUnitRegistry`].
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum UnitType {
    UnitService = 0,
    UnitSocket,
    UnitTarget,
    UnitDevice,
    UnitMount,
    UnitAutomount,
    UnitSwap,
    UnitTimer,
    UnitPath,
    UnitSlice,
    UnitScope,
    UnitTypeInvalid,
}

impl UnitType {
    ///
    pub fn iterator() -> impl Iterator<Item = UnitType> {
        [
            UnitType::UnitService,
            UnitType::UnitSocket,
            UnitType::UnitTarget,
            UnitType::UnitDevice,
            UnitType::UnitMount,
            UnitType::UnitAutomount,
            UnitType::UnitSwap,
            UnitType::UnitTimer,
            UnitType::UnitPath,
            UnitType::UnitSlice,
            UnitType::UnitScope,
        ]
        .iter()
        .copied()
    }
}

impl FromStr for UnitType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ret = match s {
            "service" => UnitType::UnitService,
            "socket" => UnitType::UnitSocket,
            "target" => UnitType::UnitTarget,
            "device" => UnitType::UnitDevice,
            "mount" => UnitType::UnitMount,
            "automount" => UnitType::UnitAutomount,
            "swap" => UnitType::UnitSwap,
            "timer" => UnitType::UnitTimer,
            "path" => UnitType::UnitPath,
            "slice" => UnitType::UnitSlice,
            "scope" => UnitType::UnitScope,
            _ => UnitType::UnitTypeInvalid,
        };
        Ok(ret)
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitType::UnitService => "service",
            UnitType::UnitSocket => "socket",
            UnitType::UnitTarget => "target",
            UnitType::UnitDevice => "device",
            UnitType::UnitMount => "mount",
            UnitType::UnitAutomount => "automount",
            UnitType::UnitSwap => "swap",
            UnitType::UnitTimer => "timer",
            UnitType::UnitPath => "path",
            UnitType::UnitSlice => "slice",
            UnitType::UnitScope => "scope",
            UnitType::UnitTypeInvalid => "",
        };
        write!(f, "{}", s)
    }
}

/// Derive the unit type from the name suffix.
pub fn unit_name_to_type(unit_name: &str) -> UnitType {
    let suffix = unit_name_suffix(unit_name);
    if suffix.is_empty() {
        return UnitType::UnitTypeInvalid;
    }
    UnitType::from_str(suffix).unwrap_or(UnitType::UnitTypeInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_to_type() {
        assert_eq!(unit_name_to_type("foo.service"), UnitType::UnitService);
        assert_eq!(unit_name_to_type("-.slice"), UnitType::UnitSlice);
        assert_eq!(unit_name_to_type("foo.mount"), UnitType::UnitMount);
        assert_eq!(unit_name_to_type("foo"), UnitType::UnitTypeInvalid);
        assert_eq!(unit_name_to_type("foo.wrong"), UnitType::UnitTypeInvalid);
    }

    #[test]
    fn type_strings() {
        for t in UnitType::iterator() {
            let s = t.to_string();
            assert_eq!(s.parse::<UnitType>().unwrap(), t);
        }
    }
}
