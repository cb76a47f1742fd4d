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
//
#![allow(non_snake_case)]

use crate::error::*;
use crate::unit::base::{unit_write_flags_noop, UnitWriteFlags};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// What to do when a unit fails or succeeds, or a limit trips.
#[allow(missing_docs)]
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitEmergencyAction {
    #[serde(alias = "none")]
    None,
    #[serde(alias = "reboot")]
    Reboot,
    #[serde(alias = "reboot-force")]
    RebootForce,
    #[serde(alias = "reboot-immediate")]
    RebootImmediate,
    #[serde(alias = "poweroff")]
    Poweroff,
    #[serde(alias = "poweroff-force")]
    PoweroffForce,
    #[serde(alias = "poweroff-immediate")]
    PoweroffImmediate,
    #[serde(alias = "exit")]
    Exit,
    #[serde(alias = "exit-force")]
    ExitForce,
}

impl Default for UnitEmergencyAction {
    fn default() -> Self {
        Self::None
    }
}

impl From<String> for UnitEmergencyAction {
    fn from(action: String) -> Self {
        match action.as_ref() {
            "none" => UnitEmergencyAction::None,
            "reboot" => UnitEmergencyAction::Reboot,
            "reboot-force" => UnitEmergencyAction::RebootForce,
            "reboot-immediate" => UnitEmergencyAction::RebootImmediate,
            "poweroff" => UnitEmergencyAction::Poweroff,
            "poweroff-force" => UnitEmergencyAction::PoweroffForce,
            "poweroff-immediate" => UnitEmergencyAction::PoweroffImmediate,
            "exit" => UnitEmergencyAction::Exit,
            "exit-force" => UnitEmergencyAction::ExitForce,
            _ => UnitEmergencyAction::None,
        }
    }
}

impl fmt::Display for UnitEmergencyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitEmergencyAction::None => "none",
            UnitEmergencyAction::Reboot => "reboot",
            UnitEmergencyAction::RebootForce => "reboot-force",
            UnitEmergencyAction::RebootImmediate => "reboot-immediate",
            UnitEmergencyAction::Poweroff => "poweroff",
            UnitEmergencyAction::PoweroffForce => "poweroff-force",
            UnitEmergencyAction::PoweroffImmediate => "poweroff-immediate",
            UnitEmergencyAction::Exit => "exit",
            UnitEmergencyAction::ExitForce => "exit-force",
        };
        write!(f, "{}", s)
    }
}

impl UnitEmergencyAction {
    pub(crate) fn is_none(&self) -> bool {
        matches!(self, UnitEmergencyAction::None)
    }
}

/// How a new job interacts with jobs already queued.
#[allow(missing_docs)]
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobMode {
    #[serde(alias = "fail")]
    Fail,
    #[serde(alias = "replace")]
    Replace,
    #[serde(alias = "replace_irreversible")]
    ReplaceIrreversible,
    #[serde(alias = "isolate")]
    Isolate,
    #[serde(alias = "flush")]
    Flush,
    #[serde(alias = "ignore_dependencies")]
    IgnoreDependencies,
    #[serde(alias = "ignore_requirements")]
    IgnoreRequirements,
    #[serde(alias = "trigger")]
    Trigger,
}

impl Default for JobMode {
    fn default() -> Self {
        Self::Replace
    }
}

impl FromStr for JobMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(JobMode::Fail),
            "replace" => Ok(JobMode::Replace),
            "replace_irreversible" => Ok(JobMode::ReplaceIrreversible),
            "isolate" => Ok(JobMode::Isolate),
            "flush" => Ok(JobMode::Flush),
            "ignore_dependencies" => Ok(JobMode::IgnoreDependencies),
            "ignore_requirements" => Ok(JobMode::IgnoreRequirements),
            "trigger" => Ok(JobMode::Trigger),
            &_ => Ok(JobMode::Replace),
        }
    }
}

/// The [Unit] section of a fragment, as handed over by the loader.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct UeConfigUnit {
    pub Description: String,
    pub Documentation: String,
    //When set to true, the unit will not be stopped when isolating another unit.
    pub IgnoreOnIsolate: bool,
    pub AllowIsolate: bool,
    pub DefaultDependencies: bool,
    pub RefuseManualStart: bool,
    pub RefuseManualStop: bool,
    pub StopWhenUnneeded: bool,
    pub CollectMode: String,
    pub OnFailureJobMode: JobMode,
    pub OnSuccessJobMode: JobMode,
    pub Wants: Vec<String>,
    pub Requires: Vec<String>,
    pub BindsTo: Vec<String>,
    pub Requisite: Vec<String>,
    pub PartOf: Vec<String>,
    pub Upholds: Vec<String>,
    pub OnFailure: Vec<String>,
    pub OnSuccess: Vec<String>,
    pub Before: Vec<String>,
    pub After: Vec<String>,
    pub Conflicts: Vec<String>,
    pub PropagatesReloadTo: Vec<String>,
    pub RequiresMountsFor: Vec<String>,
    pub Slice: String,

    /* Conditions */
    pub ConditionPathExists: String,
    pub ConditionPathIsDirectory: String,
    pub ConditionPathIsSymbolicLink: String,
    pub ConditionDirectoryNotEmpty: String,
    pub ConditionFileNotEmpty: String,
    pub ConditionFileIsExecutable: String,

    /* Asserts */
    pub AssertPathExists: String,

    pub StartLimitInterval: u64,
    pub StartLimitBurst: u32,
    pub SuccessAction: UnitEmergencyAction,
    pub FailureAction: UnitEmergencyAction,
    pub StartLimitAction: UnitEmergencyAction,
    pub SuccessActionExitStatus: Option<i32>,
    pub FailureActionExitStatus: Option<i32>,
    pub RebootArgument: String,
    pub JobTimeoutSec: u64,
    pub JobTimeoutAction: UnitEmergencyAction,
}

impl Default for UeConfigUnit {
    fn default() -> Self {
        UeConfigUnit {
            Description: String::new(),
            Documentation: String::new(),
            IgnoreOnIsolate: false,
            AllowIsolate: false,
            DefaultDependencies: true,
            RefuseManualStart: false,
            RefuseManualStop: false,
            StopWhenUnneeded: false,
            CollectMode: String::new(),
            OnFailureJobMode: JobMode::Replace,
            OnSuccessJobMode: JobMode::Replace,
            Wants: Vec::new(),
            Requires: Vec::new(),
            BindsTo: Vec::new(),
            Requisite: Vec::new(),
            PartOf: Vec::new(),
            Upholds: Vec::new(),
            OnFailure: Vec::new(),
            OnSuccess: Vec::new(),
            Before: Vec::new(),
            After: Vec::new(),
            Conflicts: Vec::new(),
            PropagatesReloadTo: Vec::new(),
            RequiresMountsFor: Vec::new(),
            Slice: String::new(),
            ConditionPathExists: String::new(),
            ConditionPathIsDirectory: String::new(),
            ConditionPathIsSymbolicLink: String::new(),
            ConditionDirectoryNotEmpty: String::new(),
            ConditionFileNotEmpty: String::new(),
            ConditionFileIsExecutable: String::new(),
            AssertPathExists: String::new(),
            StartLimitInterval: 10,
            StartLimitBurst: 5,
            SuccessAction: UnitEmergencyAction::None,
            FailureAction: UnitEmergencyAction::None,
            StartLimitAction: UnitEmergencyAction::None,
            SuccessActionExitStatus: None,
            FailureActionExitStatus: None,
            RebootArgument: String::new(),
            JobTimeoutSec: 0,
            JobTimeoutAction: UnitEmergencyAction::None,
        }
    }
}

fn parse_boolean(value: &str) -> Result<bool> {
    match value {
        "1" | "yes" | "y" | "true" | "t" | "on" => Ok(true),
        "0" | "no" | "n" | "false" | "f" | "off" => Ok(false),
        _ => Err(Error::BadSetting {
            msg: format!("invalid boolean: {}", value),
        }),
    }
}

fn vec_str_2_string(str: &str) -> Vec<String> {
    str.split_whitespace().map(|s| s.to_string()).collect()
}

impl UeConfigUnit {
    pub fn set_property(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "Description" => self.Description = value.to_string(),
            "Documentation" => self.Documentation = value.to_string(),
            "IgnoreOnIsolate" => self.IgnoreOnIsolate = parse_boolean(value)?,
            "AllowIsolate" => self.AllowIsolate = parse_boolean(value)?,
            "DefaultDependencies" => self.DefaultDependencies = parse_boolean(value)?,
            "RefuseManualStart" => self.RefuseManualStart = parse_boolean(value)?,
            "RefuseManualStop" => self.RefuseManualStop = parse_boolean(value)?,
            "StopWhenUnneeded" => self.StopWhenUnneeded = parse_boolean(value)?,
            "CollectMode" => {
                value.parse::<crate::unit::base::CollectMode>().map_err(|_| {
                    Error::BadSetting {
                        msg: format!("invalid collect mode: {}", value),
                    }
                })?;
                self.CollectMode = value.to_string();
            }
            "OnFailureJobMode" => self.OnFailureJobMode = JobMode::from_str(value)?,
            "OnSuccessJobMode" => self.OnSuccessJobMode = JobMode::from_str(value)?,
            "Wants" => self.Wants = vec_str_2_string(value),
            "Requires" => self.Requires = vec_str_2_string(value),
            "BindsTo" => self.BindsTo = vec_str_2_string(value),
            "Requisite" => self.Requisite = vec_str_2_string(value),
            "PartOf" => self.PartOf = vec_str_2_string(value),
            "Upholds" => self.Upholds = vec_str_2_string(value),
            "OnFailure" => self.OnFailure = vec_str_2_string(value),
            "OnSuccess" => self.OnSuccess = vec_str_2_string(value),
            "Before" => self.Before = vec_str_2_string(value),
            "After" => self.After = vec_str_2_string(value),
            "Conflicts" => self.Conflicts = vec_str_2_string(value),
            "PropagatesReloadTo" => self.PropagatesReloadTo = vec_str_2_string(value),
            "RequiresMountsFor" => self.RequiresMountsFor = vec_str_2_string(value),
            "Slice" => self.Slice = value.to_string(),

            /* Conditions */
            "ConditionPathExists" => self.ConditionPathExists = value.to_string(),
            "ConditionPathIsDirectory" => self.ConditionPathIsDirectory = value.to_string(),
            "ConditionPathIsSymbolicLink" => self.ConditionPathIsSymbolicLink = value.to_string(),
            "ConditionDirectoryNotEmpty" => self.ConditionDirectoryNotEmpty = value.to_string(),
            "ConditionFileNotEmpty" => self.ConditionFileNotEmpty = value.to_string(),
            "ConditionFileIsExecutable" => self.ConditionFileIsExecutable = value.to_string(),

            /* Asserts */
            "AssertPathExists" => self.AssertPathExists = value.to_string(),

            "StartLimitInterval" | "StartLimitIntervalSec" => {
                self.StartLimitInterval = value.parse::<u64>().map_err(|_| Error::BadSetting {
                    msg: format!("invalid StartLimitInterval: {}", value),
                })?
            }
            "StartLimitBurst" => {
                self.StartLimitBurst = value.parse::<u32>().map_err(|_| Error::BadSetting {
                    msg: format!("invalid StartLimitBurst: {}", value),
                })?
            }
            "SuccessAction" => self.SuccessAction = UnitEmergencyAction::from(value.to_string()),
            "FailureAction" => self.FailureAction = UnitEmergencyAction::from(value.to_string()),
            "StartLimitAction" => {
                self.StartLimitAction = UnitEmergencyAction::from(value.to_string())
            }
            "SuccessActionExitStatus" => {
                self.SuccessActionExitStatus = Some(value.parse::<i32>().map_err(|_| {
                    Error::BadSetting {
                        msg: format!("invalid exit status: {}", value),
                    }
                })?)
            }
            "FailureActionExitStatus" => {
                self.FailureActionExitStatus = Some(value.parse::<i32>().map_err(|_| {
                    Error::BadSetting {
                        msg: format!("invalid exit status: {}", value),
                    }
                })?)
            }
            "RebootArgument" => self.RebootArgument = value.to_string(),
            "JobTimeoutSec" => {
                self.JobTimeoutSec = value.parse::<u64>().map_err(|_| Error::BadSetting {
                    msg: format!("invalid JobTimeoutSec: {}", value),
                })?
            }
            "JobTimeoutAction" => {
                self.JobTimeoutAction = UnitEmergencyAction::from(value.to_string())
            }
            str_key => {
                return Err(Error::NotFound {
                    what: format!("set property:{}", str_key),
                })
            }
        };
        Ok(())
    }
}

/// The [Install] section of a fragment.
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct UeConfigInstall {
    pub Alias: Vec<String>,
    pub WantedBy: Vec<String>,
    pub RequiredBy: Vec<String>,
    pub Also: Vec<String>,
}

impl UeConfigInstall {
    pub fn set_property(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "Alias" => self.Alias = vec_str_2_string(value),
            "WantedBy" => self.WantedBy = vec_str_2_string(value),
            "RequiredBy" => self.RequiredBy = vec_str_2_string(value),
            "Also" => self.Also = vec_str_2_string(value),
            str_key => {
                return Err(Error::NotFound {
                    what: format!("set property:{}", str_key),
                })
            }
        };
        Ok(())
    }
}

#[derive(Default, Clone, Debug)]
pub(crate) struct UeConfigData {
    pub Unit: UeConfigUnit,
    pub Install: UeConfigInstall,
}

pub(crate) struct UeConfig {
    data: Rc<RefCell<UeConfigData>>,
}

impl UeConfig {
    pub(super) fn new() -> UeConfig {
        UeConfig {
            data: Rc::new(RefCell::new(UeConfigData::default())),
        }
    }

    pub(crate) fn config_data(&self) -> Rc<RefCell<UeConfigData>> {
        self.data.clone()
    }

    pub(crate) fn load_fragment(&self, unit: &UeConfigUnit, install: &UeConfigInstall) {
        let mut data = self.data.borrow_mut();
        data.Unit = unit.clone();
        data.Install = install.clone();
    }

    /// Route a property write into the snapshot. A check-only invocation
    /// validates the value but stores nothing.
    pub(crate) fn set_property(
        &self,
        key: &str,
        value: &str,
        flags: UnitWriteFlags,
    ) -> Result<()> {
        if unit_write_flags_noop(flags) {
            let mut scratch = self.data.borrow().clone();
            return scratch
                .Unit
                .set_property(key, value)
                .or_else(|_| scratch.Install.set_property(key, value));
        }

        let mut data = self.data.borrow_mut();
        match data.Unit.set_property(key, value) {
            Err(Error::NotFound { .. }) => data.Install.set_property(key, value),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = UeConfigUnit::default();
        assert!(c.DefaultDependencies);
        assert_eq!(c.StartLimitInterval, 10);
        assert_eq!(c.StartLimitBurst, 5);
        assert!(c.FailureAction.is_none());
    }

    #[test]
    fn set_property_parses() {
        let mut c = UeConfigUnit::default();
        c.set_property("StopWhenUnneeded", "yes").unwrap();
        assert!(c.StopWhenUnneeded);
        c.set_property("Wants", "a.service b.service").unwrap();
        assert_eq!(c.Wants.len(), 2);
        c.set_property("FailureAction", "reboot-force").unwrap();
        assert_eq!(c.FailureAction, UnitEmergencyAction::RebootForce);
        c.set_property("CollectMode", "inactive-or-failed").unwrap();
        assert!(c.set_property("CollectMode", "whatever").is_err());
        assert!(c.set_property("NoSuchKey", "1").is_err());
    }

    #[test]
    fn check_only_write_does_not_store() {
        let conf = UeConfig::new();
        conf.set_property("Description", "hello", UnitWriteFlags::empty())
            .unwrap();
        assert_eq!(conf.config_data().borrow().Unit.Description, "");

        conf.set_property("Description", "hello", UnitWriteFlags::RUNTIME)
            .unwrap();
        assert_eq!(conf.config_data().borrow().Unit.Description, "hello");
    }
}
