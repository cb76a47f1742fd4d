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

//! Edge provenance: which configuration source asserted a dependency.

use bitflags::bitflags;

bitflags! {
    /// The reason a dependency was created. One edge can carry several
    /// reasons, so reloading a single source can flush only its own bits.
    pub struct UnitDependencyMask: u16 {
        /// configured directly by the unit file or a drop-in
        const FILE = 1 << 0;
        /// unconditional implicit dependency
        const IMPLICIT = 1 << 1;
        /// effected by DefaultDependencies=yes
        const DEFAULT = 1 << 2;
        /// created from udev rules
        const UDEV = 1 << 3;
        /// created because of a RequiresMountsFor= path
        const PATH = 1 << 4;
        /// from /proc/self/mountinfo, no other source
        const MOUNTINFO_IMPLICIT = 1 << 5;
        /// from /proc/self/mountinfo, conditionalized by DefaultDependencies=
        const MOUNTINFO_DEFAULT = 1 << 6;
        /// from /proc/swaps
        const PROC_SWAP = 1 << 7;
    }
}

/// The value stored per edge: the origin-side and destination-side
/// provenance masks packed into a single word-sized value, so the
/// dependency mapping can keep it inline.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct UnitDepInfo(u32);

impl UnitDepInfo {
    pub fn new(origin: UnitDependencyMask, destination: UnitDependencyMask) -> UnitDepInfo {
        UnitDepInfo((origin.bits() as u32) | ((destination.bits() as u32) << 16))
    }

    pub fn origin_mask(&self) -> UnitDependencyMask {
        UnitDependencyMask::from_bits_truncate(self.0 as u16)
    }

    pub fn destination_mask(&self) -> UnitDependencyMask {
        UnitDependencyMask::from_bits_truncate((self.0 >> 16) as u16)
    }

    pub fn set_origin_mask(&mut self, mask: UnitDependencyMask) {
        self.0 = (self.0 & 0xffff_0000) | mask.bits() as u32;
    }

    pub fn set_destination_mask(&mut self, mask: UnitDependencyMask) {
        self.0 = (self.0 & 0x0000_ffff) | ((mask.bits() as u32) << 16);
    }

    /// OR-combine another edge value into this one, per side.
    pub fn merge(&mut self, other: UnitDepInfo) {
        self.0 |= other.0;
    }

    /// The mirrored value for the inverse direction of the edge.
    pub fn inverse(&self) -> UnitDepInfo {
        UnitDepInfo::new(self.destination_mask(), self.origin_mask())
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn as_word(&self) -> u32 {
        self.0
    }

    pub fn from_word(word: u32) -> UnitDepInfo {
        UnitDepInfo(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack() {
        let info = UnitDepInfo::new(
            UnitDependencyMask::FILE | UnitDependencyMask::DEFAULT,
            UnitDependencyMask::UDEV,
        );
        assert_eq!(
            info.origin_mask(),
            UnitDependencyMask::FILE | UnitDependencyMask::DEFAULT
        );
        assert_eq!(info.destination_mask(), UnitDependencyMask::UDEV);
        assert_eq!(UnitDepInfo::from_word(info.as_word()), info);
    }

    #[test]
    fn merge_ors_both_sides() {
        let mut a = UnitDepInfo::new(UnitDependencyMask::FILE, UnitDependencyMask::empty());
        let b = UnitDepInfo::new(UnitDependencyMask::IMPLICIT, UnitDependencyMask::PATH);
        a.merge(b);
        assert_eq!(
            a.origin_mask(),
            UnitDependencyMask::FILE | UnitDependencyMask::IMPLICIT
        );
        assert_eq!(a.destination_mask(), UnitDependencyMask::PATH);
    }

    #[test]
    fn inverse_swaps_sides() {
        let info = UnitDepInfo::new(UnitDependencyMask::FILE, UnitDependencyMask::empty());
        let inv = info.inverse();
        assert_eq!(inv.origin_mask(), UnitDependencyMask::empty());
        assert_eq!(inv.destination_mask(), UnitDependencyMask::FILE);
        assert_eq!(inv.inverse(), info);
    }
}
