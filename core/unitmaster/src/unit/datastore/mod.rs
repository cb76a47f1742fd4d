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

use super::base::{UnitDepInfo, UnitDependencyMask, UnitRelationAtom, UnitRelations};
use super::entry::{rewrite_refs, UnitX};
use crate::error::*;
use crate::unit::base::{unit_name_to_type, UnitLoadState};
use basic::unit_name::{unit_name_is_valid, UnitNameFlags};
use child::UnitChild;
use deps::UnitDep;
use nix::unistd::Pid;
use sets::UnitSets;
use std::rc::Rc;

pub(crate) struct UnitDb {
    units: Rc<UnitSets>,
    dep: UnitDep,
    child: UnitChild,
}

impl Drop for UnitDb {
    fn drop(&mut self) {
        log::debug!("UnitDb drop, clear.");
        // repeating protection
        self.clear();
    }
}

impl UnitDb {
    pub fn new() -> UnitDb {
        let _units = Rc::new(UnitSets::new());
        UnitDb {
            units: Rc::clone(&_units),
            dep: UnitDep::new(&_units),
            child: UnitChild::new(&_units),
        }
    }

    pub fn units_insert(&self, name: String, unit: Rc<UnitX>) -> Option<Rc<UnitX>> {
        self.units.insert(name, unit)
    }

    pub fn unit_remove(&self, name: &str) {
        self.units.remove(name);
    }

    pub fn units_get(&self, name: &str) -> Option<Rc<UnitX>> {
        self.units.get(name)
    }

    pub fn units_get_all(&self, unit_type: Option<super::base::UnitType>) -> Vec<Rc<UnitX>> {
        let mut units = self.units.get_all();
        units.retain(|ur| {
            if let Some(ut) = unit_type {
                ur.unit_type() == ut
            } else {
                true
            }
        });
        units
    }

    /// Attach an additional name to a unit. Fails when the name is invalid
    /// or already owned by another unit.
    pub fn unit_add_name(&self, unit: &Rc<UnitX>, name: &str) -> Result<()> {
        if !unit_name_is_valid(name, UnitNameFlags::PLAIN | UnitNameFlags::INSTANCE) {
            return Err(Error::InvalidName {
                name: name.to_string(),
            });
        }

        if unit_name_to_type(name) != unit.unit_type() {
            return Err(Error::InvalidName {
                name: name.to_string(),
            });
        }

        if let Some(owner) = self.units.get(name) {
            if !Rc::ptr_eq(&owner, unit) {
                return Err(Error::NameConflict {
                    name: name.to_string(),
                });
            }
            return Ok(());
        }

        unit.insert_name(name);
        self.units.insert(name.to_string(), Rc::clone(unit));
        Ok(())
    }

    /// Make one of the unit's names its id.
    pub fn unit_choose_id(&self, unit: &Rc<UnitX>, name: &str) -> Result<()> {
        if !unit.has_name(name) {
            return Err(Error::NotFound {
                what: format!("name {} on unit {}", name, unit.id()),
            });
        }

        log::debug!("unit {}: choosing id {}", unit.id(), name);
        unit.set_id(name);
        Ok(())
    }

    /// Merge `other` into `u`, unidirectionally. The survivor is picked by
    /// load-state priority, then by the smaller id; it is returned. The
    /// loser keeps only `merged_into` and waits for collection.
    pub fn unit_merge(&self, u: &Rc<UnitX>, other: &Rc<UnitX>) -> Result<Rc<UnitX>> {
        if Rc::ptr_eq(u, other) {
            return Ok(Rc::clone(u));
        }

        if u.unit_type() != other.unit_type() {
            return Err(Error::UnitActionEInval);
        }

        let (survivor, victim) = if merge_rank(other) > merge_rank(u)
            || (merge_rank(other) == merge_rank(u) && other.id() < u.id())
        {
            (Rc::clone(other), Rc::clone(u))
        } else {
            (Rc::clone(u), Rc::clone(other))
        };

        log::debug!("Merging unit {} into {}", victim.id(), survivor.id());

        // union the dependency maps, OR-combining the provenance per peer
        for (relation, dest, info) in self.dep.gets_with_info(&victim) {
            self.dep.remove(&victim, relation, &dest);
            if Rc::ptr_eq(&dest, &survivor) {
                continue;
            }
            self.dep_insert_with_info(Rc::clone(&survivor), relation, dest, info)?;
        }

        // every reference into the loser now points at the survivor
        rewrite_refs(&victim, &survivor);

        // union the name sets; all lookups resolve to the survivor
        survivor.merge_names_from(&victim);
        for name in victim.names() {
            self.units.insert(name, Rc::clone(&survivor));
        }

        victim.set_load_state(UnitLoadState::Merged);
        victim.set_merge_into(Some(Rc::clone(&survivor)));
        victim.slice_ref().unset();

        Ok(survivor)
    }

    /// Chase `merged_into` to the terminal survivor.
    pub fn unit_follow_merge(&self, unit: &Rc<UnitX>) -> Rc<UnitX> {
        let mut u = Rc::clone(unit);
        while u.load_state() == UnitLoadState::Merged {
            match u.merged_into() {
                None => break,
                Some(v) => u = v,
            }
        }
        u
    }

    pub fn dep_insert(
        &self,
        source: Rc<UnitX>,
        relation: UnitRelations,
        dest: Rc<UnitX>,
        reference: bool,
        source_mask: UnitDependencyMask,
    ) -> Result<()> {
        self.dep
            .insert(source, relation, dest, reference, source_mask)
    }

    fn dep_insert_with_info(
        &self,
        source: Rc<UnitX>,
        relation: UnitRelations,
        dest: Rc<UnitX>,
        info: UnitDepInfo,
    ) -> Result<()> {
        // re-assert both halves of the provenance on the merged edge
        self.dep.insert(
            Rc::clone(&source),
            relation,
            Rc::clone(&dest),
            false,
            info.origin_mask(),
        )?;
        let inverse = super::base::unit_relation_to_inverse(relation);
        self.dep
            .insert(dest, inverse, source, false, info.destination_mask())
    }

    pub fn dep_remove_unit(&self, source: &UnitX) {
        self.dep.remove_unit(source)
    }

    pub fn dep_remove_dependencies(&self, source: &UnitX, mask: UnitDependencyMask) {
        self.dep.remove_dependencies(source, mask);
        source.flush_requires_mounts_for(mask);
    }

    pub fn dep_gets(&self, name: &str, relation: UnitRelations) -> Vec<Rc<UnitX>> {
        let unitx = self.units_get(name);

        if unitx.is_none() {
            return Vec::new();
        }

        self.dep.gets(&unitx.unwrap(), relation)
    }

    pub fn dep_gets_unit(&self, unit: &UnitX, relation: UnitRelations) -> Vec<Rc<UnitX>> {
        self.dep.gets(unit, relation)
    }

    pub fn dep_gets_atom(&self, source: &UnitX, atom: UnitRelationAtom) -> Vec<Rc<UnitX>> {
        self.dep.gets_atom(source, atom)
    }

    pub fn dep_get_info(
        &self,
        source: &UnitX,
        relation: UnitRelations,
        dest: &UnitX,
    ) -> Option<UnitDepInfo> {
        self.dep.get_info(source, relation, dest)
    }

    #[allow(dead_code)]
    pub fn dep_is_dep_with(
        &self,
        source: &UnitX,
        relation: UnitRelations,
        dest: &UnitX,
    ) -> bool {
        self.dep.is_dep_with(source, relation, dest)
    }

    pub fn dep_is_dep_atom_with(
        &self,
        source: &UnitX,
        atom: UnitRelationAtom,
        dest: &UnitX,
    ) -> bool {
        self.dep.is_dep_atom_with(source, atom, dest)
    }

    pub fn child_add_watch_pid(&self, unit: Rc<UnitX>, pid: Pid) {
        self.child.add_watch_pid(unit, pid)
    }

    pub fn child_unwatch_pid(&self, unit: &UnitX, pid: Pid) {
        self.child.unwatch_pid(unit, pid)
    }

    pub fn child_unwatch_all_pids(&self, unit: &UnitX) {
        self.child.unwatch_all_pids(unit)
    }

    pub fn get_unit_by_pid(&self, pid: Pid) -> Option<Rc<UnitX>> {
        self.child.get_unit_by_pid(pid)
    }

    pub fn entry_clear(&self) {
        self.child.entry_clear();
        self.dep.entry_clear();
        self.units.entry_clear();
    }

    // repeating protection
    pub fn clear(&self) {
        self.child.entry_clear();
        self.dep.entry_clear();
        self.units.clear();
    }
}

/// Load-state priority for survivor election: loaded > merged > stub >
/// everything else.
fn merge_rank(unit: &UnitX) -> u8 {
    match unit.load_state() {
        UnitLoadState::Loaded => 3,
        UnitLoadState::Merged => 2,
        UnitLoadState::Stub => 1,
        _ => 0,
    }
}

// dependency: unit_sets -> {unit_dep | unit_child}
mod child;
mod deps;
mod sets;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::entry::UnitRef;
    use crate::unit::test_utils;

    fn db_with_units(names: &[&str]) -> (UnitDb, Vec<Rc<UnitX>>) {
        let db = UnitDb::new();
        let mut units = Vec::new();
        for name in names {
            let unit = test_utils::create_unit_for_test_pub(name);
            db.units_insert(name.to_string(), Rc::clone(&unit));
            units.push(unit);
        }
        (db, units)
    }

    #[test]
    fn name_uniqueness() {
        let (db, units) = db_with_units(&["test1.service", "test2.service"]);

        db.unit_add_name(&units[0], "alias.service").unwrap();
        assert!(db.units_get("alias.service").is_some());

        // another unit cannot take the same name
        let r = db.unit_add_name(&units[1], "alias.service");
        assert!(matches!(r, Err(Error::NameConflict { .. })));

        // invalid names and foreign suffixes are refused
        assert!(db.unit_add_name(&units[0], "no-suffix").is_err());
        assert!(db.unit_add_name(&units[0], "alias.target").is_err());
    }

    #[test]
    fn add_name_and_choose_id() {
        let (db, units) = db_with_units(&["a.service"]);
        let u = &units[0];

        db.unit_add_name(u, "a-alias.service").unwrap();
        db.unit_choose_id(u, "a-alias.service").unwrap();

        assert_eq!(u.id(), "a-alias.service");
        let by_old = db.units_get("a.service").unwrap();
        let by_new = db.units_get("a-alias.service").unwrap();
        assert!(Rc::ptr_eq(&by_old, &by_new));

        assert!(db.unit_choose_id(u, "unknown.service").is_err());
    }

    #[test]
    fn dep_symmetry_and_provenance() {
        let (db, units) = db_with_units(&["a.service", "b.service"]);
        let (a, b) = (&units[0], &units[1]);

        db.dep_insert(
            Rc::clone(a),
            UnitRelations::UnitWants,
            Rc::clone(b),
            false,
            UnitDependencyMask::FILE,
        )
        .unwrap();

        assert!(db.dep_is_dep_with(a, UnitRelations::UnitWants, b));
        assert!(db.dep_is_dep_with(b, UnitRelations::UnitWantsBy, a));

        let forward = db.dep_get_info(a, UnitRelations::UnitWants, b).unwrap();
        let backward = db.dep_get_info(b, UnitRelations::UnitWantsBy, a).unwrap();
        assert_eq!(forward.origin_mask(), UnitDependencyMask::FILE);
        assert_eq!(forward.destination_mask(), UnitDependencyMask::empty());
        assert_eq!(backward, forward.inverse());

        // adding again with another reason OR-merges
        db.dep_insert(
            Rc::clone(a),
            UnitRelations::UnitWants,
            Rc::clone(b),
            false,
            UnitDependencyMask::DEFAULT,
        )
        .unwrap();
        let forward = db.dep_get_info(a, UnitRelations::UnitWants, b).unwrap();
        assert_eq!(
            forward.origin_mask(),
            UnitDependencyMask::FILE | UnitDependencyMask::DEFAULT
        );
    }

    #[test]
    fn provenance_flush() {
        let (db, units) = db_with_units(&["a.service", "b.service", "c.service"]);
        let (a, b, c) = (&units[0], &units[1], &units[2]);

        db.dep_insert(
            Rc::clone(a),
            UnitRelations::UnitWants,
            Rc::clone(b),
            false,
            UnitDependencyMask::FILE,
        )
        .unwrap();
        // c asserts an edge onto a; flushing a's FILE bits must not touch it
        db.dep_insert(
            Rc::clone(c),
            UnitRelations::UnitWants,
            Rc::clone(a),
            false,
            UnitDependencyMask::FILE,
        )
        .unwrap();

        db.dep_remove_dependencies(a, UnitDependencyMask::FILE);

        assert!(!db.dep_is_dep_with(a, UnitRelations::UnitWants, b));
        assert!(!db.dep_is_dep_with(b, UnitRelations::UnitWantsBy, a));
        assert!(db.dep_is_dep_with(c, UnitRelations::UnitWants, a));
        assert!(db.dep_is_dep_with(a, UnitRelations::UnitWantsBy, c));
    }

    #[test]
    fn partial_provenance_flush_keeps_edge() {
        let (db, units) = db_with_units(&["a.service", "b.service"]);
        let (a, b) = (&units[0], &units[1]);

        db.dep_insert(
            Rc::clone(a),
            UnitRelations::UnitWants,
            Rc::clone(b),
            false,
            UnitDependencyMask::FILE | UnitDependencyMask::UDEV,
        )
        .unwrap();

        db.dep_remove_dependencies(a, UnitDependencyMask::FILE);
        let info = db.dep_get_info(a, UnitRelations::UnitWants, b).unwrap();
        assert_eq!(info.origin_mask(), UnitDependencyMask::UDEV);
        // the inverse edge mirrors the flush
        let inv = db.dep_get_info(b, UnitRelations::UnitWantsBy, a).unwrap();
        assert_eq!(inv.destination_mask(), UnitDependencyMask::UDEV);
    }

    #[test]
    fn merge_rewrites_refs_and_names() {
        let (db, units) = db_with_units(&["a.service", "b.service", "x.service"]);
        let (a, b, x) = (&units[0], &units[1], &units[2]);

        a.set_load_state(UnitLoadState::Loaded);

        // x holds a reference to b
        let r = UnitRef::new();
        r.set(&x.id(), b);

        // b has an edge that must survive the merge
        db.dep_insert(
            Rc::clone(b),
            UnitRelations::UnitWants,
            Rc::clone(x),
            false,
            UnitDependencyMask::FILE,
        )
        .unwrap();

        let survivor = db.unit_merge(a, b).unwrap();
        assert!(Rc::ptr_eq(&survivor, a));

        assert_eq!(b.load_state(), UnitLoadState::Merged);
        assert!(Rc::ptr_eq(&b.merged_into().unwrap(), a));
        assert!(Rc::ptr_eq(&r.target().unwrap(), a));

        // lookups by any of b's former names reach a
        let looked = db.units_get("b.service").unwrap();
        assert!(Rc::ptr_eq(&db.unit_follow_merge(&looked), &looked));
        assert!(a.has_name("b.service"));

        // the dependency moved over, with its provenance
        assert!(db.dep_is_dep_with(a, UnitRelations::UnitWants, x));
        let info = db.dep_get_info(a, UnitRelations::UnitWants, x).unwrap();
        assert_eq!(info.origin_mask(), UnitDependencyMask::FILE);
        assert!(!db.dep_is_dep_with(b, UnitRelations::UnitWants, x));
    }

    #[test]
    fn merge_is_idempotent_on_self() {
        let (db, units) = db_with_units(&["a.service"]);
        let a = &units[0];
        let s = db.unit_merge(a, a).unwrap();
        assert!(Rc::ptr_eq(&s, a));
        assert_ne!(a.load_state(), UnitLoadState::Merged);
    }

    #[test]
    fn follow_merge_chases_chain() {
        let (db, units) = db_with_units(&["a.service", "b.service", "c.service"]);
        let (a, b, c) = (&units[0], &units[1], &units[2]);
        a.set_load_state(UnitLoadState::Loaded);

        db.unit_merge(a, b).unwrap();
        db.unit_merge(a, c).unwrap();

        assert!(Rc::ptr_eq(&db.unit_follow_merge(b), a));
        assert!(Rc::ptr_eq(&db.unit_follow_merge(c), a));
    }
}
