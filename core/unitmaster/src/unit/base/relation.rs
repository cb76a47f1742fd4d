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

use std::fmt;
use std::str::FromStr;

/// The typed relations between two units. Every kind has an inverse kind
/// the engine maintains automatically.
#[allow(missing_docs)]
#[derive(Hash, PartialEq, Eq, Copy, Clone, Debug)]
pub enum UnitRelations {
    UnitRequires,
    UnitRequisite,
    UnitWants,
    UnitBindsTo,
    UnitPartOf,
    UnitUpHolds,

    UnitRequiresBy,
    UnitRequisiteOf,
    UnitWantsBy,
    UnitBoundBy,
    UnitConsistsOf,
    UnitUpHeldBy,

    UnitConflicts,
    UnitConflictedBy,

    UnitBefore,
    UnitAfter,

    UnitOnSuccess,
    UnitOnSuccessOf,
    UnitOnFailure,
    UnitOnFailureOf,

    UnitTriggers,
    UnitTriggeredBy,

    UnitPropagatesReloadTo,
    UnitReloadPropagatedFrom,

    UnitPropagatesStopTo,
    UnitStopPropagatedFrom,

    UnitJoinsNameSpaceOf,

    UnitReferences,
    UnitReferencedBy,

    UnitInSlice,
    UnitSliceOf,
}

pub fn unit_relation_to_inverse(relation: UnitRelations) -> UnitRelations {
    match relation {
        UnitRelations::UnitRequires => UnitRelations::UnitRequiresBy,
        UnitRelations::UnitRequisite => UnitRelations::UnitRequisiteOf,
        UnitRelations::UnitWants => UnitRelations::UnitWantsBy,
        UnitRelations::UnitBindsTo => UnitRelations::UnitBoundBy,
        UnitRelations::UnitPartOf => UnitRelations::UnitConsistsOf,
        UnitRelations::UnitUpHolds => UnitRelations::UnitUpHeldBy,
        UnitRelations::UnitRequiresBy => UnitRelations::UnitRequires,
        UnitRelations::UnitRequisiteOf => UnitRelations::UnitRequisite,
        UnitRelations::UnitWantsBy => UnitRelations::UnitWants,
        UnitRelations::UnitBoundBy => UnitRelations::UnitBindsTo,
        UnitRelations::UnitConsistsOf => UnitRelations::UnitPartOf,
        UnitRelations::UnitUpHeldBy => UnitRelations::UnitUpHolds,
        UnitRelations::UnitConflicts => UnitRelations::UnitConflictedBy,
        UnitRelations::UnitConflictedBy => UnitRelations::UnitConflicts,
        UnitRelations::UnitBefore => UnitRelations::UnitAfter,
        UnitRelations::UnitAfter => UnitRelations::UnitBefore,
        UnitRelations::UnitOnSuccess => UnitRelations::UnitOnSuccessOf,
        UnitRelations::UnitOnSuccessOf => UnitRelations::UnitOnSuccess,
        UnitRelations::UnitOnFailure => UnitRelations::UnitOnFailureOf,
        UnitRelations::UnitOnFailureOf => UnitRelations::UnitOnFailure,
        UnitRelations::UnitTriggers => UnitRelations::UnitTriggeredBy,
        UnitRelations::UnitTriggeredBy => UnitRelations::UnitTriggers,
        UnitRelations::UnitPropagatesReloadTo => UnitRelations::UnitReloadPropagatedFrom,
        UnitRelations::UnitReloadPropagatedFrom => UnitRelations::UnitPropagatesReloadTo,
        UnitRelations::UnitPropagatesStopTo => UnitRelations::UnitStopPropagatedFrom,
        UnitRelations::UnitStopPropagatedFrom => UnitRelations::UnitPropagatesStopTo,
        UnitRelations::UnitJoinsNameSpaceOf => UnitRelations::UnitJoinsNameSpaceOf,
        UnitRelations::UnitReferences => UnitRelations::UnitReferencedBy,
        UnitRelations::UnitReferencedBy => UnitRelations::UnitReferences,
        UnitRelations::UnitInSlice => UnitRelations::UnitSliceOf,
        UnitRelations::UnitSliceOf => UnitRelations::UnitInSlice,
    }
}

impl fmt::Display for UnitRelations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitRelations::UnitRequires => "Requires",
            UnitRelations::UnitRequisite => "Requisite",
            UnitRelations::UnitWants => "Wants",
            UnitRelations::UnitBindsTo => "BindsTo",
            UnitRelations::UnitPartOf => "PartOf",
            UnitRelations::UnitUpHolds => "Upholds",
            UnitRelations::UnitRequiresBy => "RequiredBy",
            UnitRelations::UnitRequisiteOf => "RequisiteOf",
            UnitRelations::UnitWantsBy => "WantedBy",
            UnitRelations::UnitBoundBy => "BoundBy",
            UnitRelations::UnitConsistsOf => "ConsistsOf",
            UnitRelations::UnitUpHeldBy => "UpheldBy",
            UnitRelations::UnitConflicts => "Conflicts",
            UnitRelations::UnitConflictedBy => "ConflictedBy",
            UnitRelations::UnitBefore => "Before",
            UnitRelations::UnitAfter => "After",
            UnitRelations::UnitOnSuccess => "OnSuccess",
            UnitRelations::UnitOnSuccessOf => "OnSuccessOf",
            UnitRelations::UnitOnFailure => "OnFailure",
            UnitRelations::UnitOnFailureOf => "OnFailureOf",
            UnitRelations::UnitTriggers => "Triggers",
            UnitRelations::UnitTriggeredBy => "TriggeredBy",
            UnitRelations::UnitPropagatesReloadTo => "PropagatesReloadTo",
            UnitRelations::UnitReloadPropagatedFrom => "ReloadPropagatedFrom",
            UnitRelations::UnitPropagatesStopTo => "PropagatesStopTo",
            UnitRelations::UnitStopPropagatedFrom => "StopPropagatedFrom",
            UnitRelations::UnitJoinsNameSpaceOf => "JoinsNamespaceOf",
            UnitRelations::UnitReferences => "References",
            UnitRelations::UnitReferencedBy => "ReferencedBy",
            UnitRelations::UnitInSlice => "InSlice",
            UnitRelations::UnitSliceOf => "SliceOf",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for UnitRelations {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let r = match s {
            "Requires" => UnitRelations::UnitRequires,
            "Requisite" => UnitRelations::UnitRequisite,
            "Wants" => UnitRelations::UnitWants,
            "BindsTo" => UnitRelations::UnitBindsTo,
            "PartOf" => UnitRelations::UnitPartOf,
            "Upholds" => UnitRelations::UnitUpHolds,
            "RequiredBy" => UnitRelations::UnitRequiresBy,
            "RequisiteOf" => UnitRelations::UnitRequisiteOf,
            "WantedBy" => UnitRelations::UnitWantsBy,
            "BoundBy" => UnitRelations::UnitBoundBy,
            "ConsistsOf" => UnitRelations::UnitConsistsOf,
            "UpheldBy" => UnitRelations::UnitUpHeldBy,
            "Conflicts" => UnitRelations::UnitConflicts,
            "ConflictedBy" => UnitRelations::UnitConflictedBy,
            "Before" => UnitRelations::UnitBefore,
            "After" => UnitRelations::UnitAfter,
            "OnSuccess" => UnitRelations::UnitOnSuccess,
            "OnSuccessOf" => UnitRelations::UnitOnSuccessOf,
            "OnFailure" => UnitRelations::UnitOnFailure,
            "OnFailureOf" => UnitRelations::UnitOnFailureOf,
            "Triggers" => UnitRelations::UnitTriggers,
            "TriggeredBy" => UnitRelations::UnitTriggeredBy,
            "PropagatesReloadTo" => UnitRelations::UnitPropagatesReloadTo,
            "ReloadPropagatedFrom" => UnitRelations::UnitReloadPropagatedFrom,
            "PropagatesStopTo" => UnitRelations::UnitPropagatesStopTo,
            "StopPropagatedFrom" => UnitRelations::UnitStopPropagatedFrom,
            "JoinsNamespaceOf" => UnitRelations::UnitJoinsNameSpaceOf,
            "References" => UnitRelations::UnitReferences,
            "ReferencedBy" => UnitRelations::UnitReferencedBy,
            "InSlice" => UnitRelations::UnitInSlice,
            "SliceOf" => UnitRelations::UnitSliceOf,
            other => {
                return Err(crate::error::Error::NotFound {
                    what: format!("unit relation: {}", other),
                })
            }
        };
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_is_an_involution() {
        let all = [
            UnitRelations::UnitRequires,
            UnitRelations::UnitRequisite,
            UnitRelations::UnitWants,
            UnitRelations::UnitBindsTo,
            UnitRelations::UnitPartOf,
            UnitRelations::UnitUpHolds,
            UnitRelations::UnitConflicts,
            UnitRelations::UnitBefore,
            UnitRelations::UnitOnSuccess,
            UnitRelations::UnitOnFailure,
            UnitRelations::UnitTriggers,
            UnitRelations::UnitPropagatesReloadTo,
            UnitRelations::UnitPropagatesStopTo,
            UnitRelations::UnitJoinsNameSpaceOf,
            UnitRelations::UnitReferences,
            UnitRelations::UnitInSlice,
        ];
        for r in all {
            let inv = unit_relation_to_inverse(r);
            assert_eq!(unit_relation_to_inverse(inv), r);
        }
    }

    #[test]
    fn display_from_str_round_trip() {
        for r in [
            UnitRelations::UnitWants,
            UnitRelations::UnitWantsBy,
            UnitRelations::UnitJoinsNameSpaceOf,
            UnitRelations::UnitSliceOf,
        ] {
            let s = r.to_string();
            assert_eq!(s.parse::<UnitRelations>().unwrap(), r);
        }
    }
}
