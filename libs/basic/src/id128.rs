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

//! 128-bit ids, formatted as 32 lowercase hex characters.

use nix::errno::Errno;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// A 128-bit id in the UUID v4 value space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Id128(u128);

impl Id128 {
    /// Mint a fresh random id.
    pub fn random() -> Id128 {
        let mut v: u128 = rand::thread_rng().gen();
        // stamp UUID version 4 and RFC 4122 variant bits
        v &= !(0xf000u128 << 64);
        v |= 0x4000u128 << 64;
        v &= !(0xc0u128 << 56);
        v |= 0x80u128 << 56;
        Id128(v)
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub fn to_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for Id128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for Id128 {
    type Err = Errno;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(Errno::EINVAL);
        }
        u128::from_str_radix(s, 16).map(Id128).map_err(|_| Errno::EINVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random() {
        let a = Id128::random();
        let b = Id128::random();
        assert!(!a.is_null());
        assert_ne!(a, b);
    }

    #[test]
    fn test_format_parse() {
        let a = Id128::random();
        let s = a.to_string();
        assert_eq!(s.len(), 32);
        let back: Id128 = s.parse().unwrap();
        assert_eq!(a, back);

        assert!("xyz".parse::<Id128>().is_err());
        assert!("12345678-9012-3456-7890-abcdef123456".parse::<Id128>().is_err());
    }
}
