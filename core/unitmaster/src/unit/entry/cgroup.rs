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

//! The opaque cgroup attachment of a unit. Realizing the hierarchy is the
//! cgroup component's business; the engine only tracks path and masks.

use bitflags::bitflags;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

bitflags! {
    /// Which controllers a realization covers.
    pub struct CGroupMask: u32 {
        const CPU = 1 << 0;
        const MEMORY = 1 << 1;
        const IO = 1 << 2;
        const PIDS = 1 << 3;
    }
}

struct UeCgroupData {
    cg_path: PathBuf,
    realized: bool,
    realized_mask: CGroupMask,
    enabled_mask: CGroupMask,
    invalidated_mask: CGroupMask,
    members_mask: CGroupMask,
}

pub(crate) struct UeCgroup {
    data: RefCell<UeCgroupData>,
}

impl UeCgroup {
    pub(super) fn new() -> UeCgroup {
        UeCgroup {
            data: RefCell::new(UeCgroupData {
                cg_path: PathBuf::new(),
                realized: false,
                realized_mask: CGroupMask::empty(),
                enabled_mask: CGroupMask::empty(),
                invalidated_mask: CGroupMask::empty(),
                members_mask: CGroupMask::empty(),
            }),
        }
    }

    /// Derive the cgroup path from the unit id, below the manager root.
    pub(super) fn setup_cg_path(&self, id: &str) {
        let escaped = id.replace('/', "-");
        self.data.borrow_mut().cg_path = PathBuf::from(format!("unitmaster.slice/{}", escaped));
    }

    pub(super) fn set_cg_path(&self, path: &Path) {
        self.data.borrow_mut().cg_path = path.to_path_buf();
    }

    pub(crate) fn cg_path(&self) -> PathBuf {
        self.data.borrow().cg_path.clone()
    }

    pub(crate) fn set_realized(&self, realized: bool, mask: CGroupMask) {
        let mut data = self.data.borrow_mut();
        data.realized = realized;
        data.realized_mask = mask;
        data.invalidated_mask = CGroupMask::empty();
    }

    #[allow(dead_code)]
    pub(crate) fn realized(&self) -> bool {
        self.data.borrow().realized
    }

    #[allow(dead_code)]
    pub(crate) fn realized_mask(&self) -> CGroupMask {
        self.data.borrow().realized_mask
    }

    #[allow(dead_code)]
    pub(crate) fn set_enabled_mask(&self, mask: CGroupMask) {
        self.data.borrow_mut().enabled_mask = mask;
    }

    pub(crate) fn enabled_mask(&self) -> CGroupMask {
        self.data.borrow().enabled_mask
    }

    /// Mark controllers that need re-realization.
    #[allow(dead_code)]
    pub(crate) fn invalidate(&self, mask: CGroupMask) {
        self.data.borrow_mut().invalidated_mask |= mask;
    }

    pub(crate) fn invalidated_mask(&self) -> CGroupMask {
        self.data.borrow().invalidated_mask
    }

    #[allow(dead_code)]
    pub(crate) fn set_members_mask(&self, mask: CGroupMask) {
        self.data.borrow_mut().members_mask = mask;
    }

    #[allow(dead_code)]
    pub(crate) fn members_mask(&self) -> CGroupMask {
        self.data.borrow().members_mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_setup() {
        let cg = UeCgroup::new();
        assert!(cg.cg_path().as_os_str().is_empty());
        cg.setup_cg_path("foo.service");
        assert_eq!(
            cg.cg_path(),
            PathBuf::from("unitmaster.slice/foo.service")
        );
    }

    #[test]
    fn invalidation_accumulates() {
        let cg = UeCgroup::new();
        cg.invalidate(CGroupMask::CPU);
        cg.invalidate(CGroupMask::MEMORY);
        assert_eq!(cg.invalidated_mask(), CGroupMask::CPU | CGroupMask::MEMORY);
        cg.set_realized(true, CGroupMask::CPU | CGroupMask::MEMORY);
        assert!(cg.realized());
        assert!(cg.invalidated_mask().is_empty());
    }
}
