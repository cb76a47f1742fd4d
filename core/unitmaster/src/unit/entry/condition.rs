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

//! Start conditions and asserts. A failing condition skips the start
//! quietly; a failing assert fails it.

use std::cell::{Cell, RefCell};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::rc::Rc;

pub(crate) mod condition_keys {
    pub(crate) const CONDITION_PATH_EXISTS: &str = "ConditionPathExists";
    pub(crate) const CONDITION_PATH_IS_DIRECTORY: &str = "ConditionPathIsDirectory";
    pub(crate) const CONDITION_PATH_IS_SYMBOLIC_LINK: &str = "ConditionPathIsSymbolicLink";
    pub(crate) const CONDITION_DIRECTORY_NOT_EMPTY: &str = "ConditionDirectoryNotEmpty";
    pub(crate) const CONDITION_FILE_NOT_EMPTY: &str = "ConditionFileNotEmpty";
    pub(crate) const CONDITION_FILE_IS_EXECUTABLE: &str = "ConditionFileIsExecutable";
}

pub(crate) mod assert_keys {
    pub(crate) const ASSERT_PATH_EXISTS: &str = "AssertPathExists";
}

struct Condition {
    key: String,
    params: String,
}

impl Condition {
    fn new(key: &str, params: String) -> Condition {
        Condition {
            key: key.to_string(),
            params,
        }
    }

    fn test(&self) -> bool {
        // a leading '!' negates the test
        let (negate, param) = match self.params.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, self.params.as_str()),
        };

        let path = Path::new(param);
        let result = match self.key.as_str() {
            condition_keys::CONDITION_PATH_EXISTS | assert_keys::ASSERT_PATH_EXISTS => {
                path.exists()
            }
            condition_keys::CONDITION_PATH_IS_DIRECTORY => path.is_dir(),
            condition_keys::CONDITION_PATH_IS_SYMBOLIC_LINK => path
                .symlink_metadata()
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false),
            condition_keys::CONDITION_DIRECTORY_NOT_EMPTY => path
                .read_dir()
                .map(|mut d| d.next().is_some())
                .unwrap_or(false),
            condition_keys::CONDITION_FILE_NOT_EMPTY => path
                .metadata()
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false),
            condition_keys::CONDITION_FILE_IS_EXECUTABLE => path
                .metadata()
                .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
                .unwrap_or(false),
            _ => {
                log::debug!("Unknown condition key {}, assuming true", self.key);
                true
            }
        };

        result != negate
    }
}

/// The ordered condition and assert lists of one unit, with cached results.
pub(crate) struct UeCondition {
    initialized: Cell<bool>,
    conditions: RefCell<Vec<Condition>>,
    asserts: RefCell<Vec<Condition>>,
    condition_result: Cell<bool>,
    assert_result: Cell<bool>,
}

impl UeCondition {
    pub(crate) fn new() -> Rc<UeCondition> {
        Rc::new(UeCondition {
            initialized: Cell::new(false),
            conditions: RefCell::new(Vec::new()),
            asserts: RefCell::new(Vec::new()),
            condition_result: Cell::new(true),
            assert_result: Cell::new(true),
        })
    }

    pub(crate) fn initialized(&self) -> bool {
        self.initialized.get()
    }

    pub(crate) fn set_initialized(&self) {
        self.initialized.set(true);
    }

    pub(crate) fn add_condition(&self, key: &str, params: String) {
        if params.is_empty() {
            return;
        }
        self.conditions.borrow_mut().push(Condition::new(key, params));
    }

    pub(crate) fn add_assert(&self, key: &str, params: String) {
        if params.is_empty() {
            return;
        }
        self.asserts.borrow_mut().push(Condition::new(key, params));
    }

    /// Run the condition list, caching the verdict.
    pub(crate) fn conditions_test(&self) -> bool {
        let result = self.conditions.borrow().iter().all(|c| c.test());
        self.condition_result.set(result);
        result
    }

    /// Run the assert list, caching the verdict.
    pub(crate) fn asserts_test(&self) -> bool {
        let result = self.asserts.borrow().iter().all(|c| c.test());
        self.assert_result.set(result);
        result
    }

    pub(crate) fn condition_result(&self) -> bool {
        self.condition_result.get()
    }

    pub(crate) fn assert_result(&self) -> bool {
        self.assert_result.get()
    }

    /// Reinstall cached verdicts from a deserialized record.
    pub(crate) fn set_results(&self, condition: bool, assert: bool) {
        self.condition_result.set(condition);
        self.assert_result.set(assert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_exists_condition() {
        let cond = UeCondition::new();
        cond.add_condition(condition_keys::CONDITION_PATH_EXISTS, "/".to_string());
        assert!(cond.conditions_test());
        assert!(cond.condition_result());

        cond.add_condition(
            condition_keys::CONDITION_PATH_EXISTS,
            "/nonexistent-unitmaster-test".to_string(),
        );
        assert!(!cond.conditions_test());
        assert!(!cond.condition_result());
    }

    #[test]
    fn negated_condition() {
        let cond = UeCondition::new();
        cond.add_condition(
            condition_keys::CONDITION_PATH_EXISTS,
            "!/nonexistent-unitmaster-test".to_string(),
        );
        assert!(cond.conditions_test());
    }

    #[test]
    fn empty_params_add_nothing() {
        let cond = UeCondition::new();
        cond.add_condition(condition_keys::CONDITION_PATH_EXISTS, String::new());
        assert!(cond.conditions_test());
        assert_eq!(cond.conditions.borrow().len(), 0);
    }

    #[test]
    fn assert_path() {
        let cond = UeCondition::new();
        cond.add_assert(assert_keys::ASSERT_PATH_EXISTS, "/".to_string());
        assert!(cond.asserts_test());
        assert!(cond.assert_result());
    }
}
