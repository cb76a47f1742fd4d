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

//! Interfaces related to the unit name.

use bitflags::bitflags;
use nix::errno::Errno;

const UNIT_NAME_MAX: usize = 255;
const VALID_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789:-_.\\@";

bitflags! {
    /// Which shapes of unit names are acceptable.
    pub struct UnitNameFlags: u8 {
        /// "foo.service"
        const PLAIN = 1 << 0;
        /// "foo@bar.service"
        const INSTANCE = 1 << 1;
        /// "foo@.service"
        const TEMPLATE = 1 << 2;
        /// any of the above
        const ANY = (1 << 0) | (1 << 1) | (1 << 2);
    }
}

/// Check whether the given string is a well-formed unit name of one of the
/// requested shapes.
pub fn unit_name_is_valid(name: &str, flags: UnitNameFlags) -> bool {
    if name.is_empty() || name.len() > UNIT_NAME_MAX {
        return false;
    }

    let dot = match name.rfind('.') {
        None => return false,
        Some(d) => d,
    };
    if dot == 0 || name[dot + 1..].is_empty() {
        return false;
    }

    if name.chars().any(|c| !VALID_CHARS.contains(c)) {
        return false;
    }

    match name.find('@') {
        None => flags.contains(UnitNameFlags::PLAIN),
        Some(at) => {
            if at == 0 {
                return false;
            }
            let instance = &name[at + 1..dot];
            if instance.is_empty() {
                flags.contains(UnitNameFlags::TEMPLATE)
            } else {
                flags.contains(UnitNameFlags::INSTANCE)
            }
        }
    }
}

/// "foo@bar.service" => "foo"
pub fn unit_name_to_prefix(name: &str) -> String {
    let end = name.find('@').or_else(|| name.rfind('.')).unwrap_or(0);
    name[..end].to_string()
}

/// "foo@bar.service" => Some("bar"), "foo.service" => None
pub fn unit_name_to_instance(name: &str) -> Option<String> {
    let at = name.find('@')?;
    let dot = name[at + 1..].rfind('.')? + at + 1;
    Some(name[at + 1..dot].to_string())
}

/// "foo.service" => "service"
pub fn unit_name_suffix(name: &str) -> &str {
    match name.rfind('.') {
        None => "",
        Some(d) => &name[d + 1..],
    }
}

/// Replace the type suffix of a valid unit name.
pub fn unit_name_change_suffix(name: &str, suffix: &str) -> Result<String, Errno> {
    let dot = name.rfind('.').ok_or(Errno::EINVAL)?;
    Ok(format!("{}.{}", &name[..dot], suffix))
}

/// Escape a filesystem path into the unit name prefix encoding:
/// "/" becomes "-", "/home/user" becomes "home-user".
pub fn unit_name_path_escape(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return "-".to_string();
    }
    trimmed.replace('-', "\\x2d").replace('/', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_name_is_valid() {
        assert!(unit_name_is_valid("foo.service", UnitNameFlags::PLAIN));
        assert!(unit_name_is_valid("foo-bar.target", UnitNameFlags::ANY));
        assert!(unit_name_is_valid("-.slice", UnitNameFlags::PLAIN));
        assert!(unit_name_is_valid("getty@tty1.service", UnitNameFlags::INSTANCE));
        assert!(unit_name_is_valid("getty@.service", UnitNameFlags::TEMPLATE));

        assert!(!unit_name_is_valid("", UnitNameFlags::ANY));
        assert!(!unit_name_is_valid("foo", UnitNameFlags::ANY));
        assert!(!unit_name_is_valid(".service", UnitNameFlags::ANY));
        assert!(!unit_name_is_valid("foo bar.service", UnitNameFlags::ANY));
        assert!(!unit_name_is_valid("getty@tty1.service", UnitNameFlags::PLAIN));
        assert!(!unit_name_is_valid("getty@.service", UnitNameFlags::INSTANCE));
    }

    #[test]
    fn test_unit_name_parts() {
        assert_eq!(unit_name_to_prefix("foo.service"), "foo");
        assert_eq!(unit_name_to_prefix("getty@tty1.service"), "getty");
        assert_eq!(
            unit_name_to_instance("getty@tty1.service"),
            Some("tty1".to_string())
        );
        assert_eq!(unit_name_to_instance("foo.service"), None);
        assert_eq!(unit_name_suffix("foo.service"), "service");
        assert_eq!(
            unit_name_change_suffix("foo.service", "socket").unwrap(),
            "foo.socket"
        );
    }

    #[test]
    fn test_unit_name_path_escape() {
        assert_eq!(unit_name_path_escape("/"), "-");
        assert_eq!(unit_name_path_escape("/home"), "home");
        assert_eq!(unit_name_path_escape("/home/user"), "home-user");
        assert_eq!(unit_name_path_escape("/opt/my-app"), "opt-my\\x2dapp");
    }
}
