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

//! The typed dependency graph. Every edge is kept in both directions with
//! the inverse kind, and carries the provenance of both endpoints.

use super::super::base::{
    unit_relation_from_unique_atom, unit_relation_to_inverse, UnitDepInfo, UnitDependencyMask,
    UnitRelationAtom, UnitRelations,
};
use super::super::entry::UnitX;
use super::sets::UnitSets;
use crate::error::*;
use crate::utils::table::{TableOp, TableSubscribe};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub(super) struct UnitDep {
    sub_name: String, // key for table-subscriber: UnitSets
    sub: Rc<UnitDepSub>,
}

impl UnitDep {
    pub(super) fn new(unitsr: &Rc<UnitSets>) -> UnitDep {
        let ud = UnitDep {
            sub_name: String::from("UnitDep"),
            sub: Rc::new(UnitDepSub::new()),
        };
        ud.register(unitsr);
        ud
    }

    fn register(&self, unitsr: &UnitSets) {
        let subscriber = Rc::clone(&self.sub);
        unitsr.register(&self.sub_name, subscriber);
    }

    pub(super) fn insert(
        &self,
        source: Rc<UnitX>,
        relation: UnitRelations,
        dest: Rc<UnitX>,
        reference: bool,
        source_mask: UnitDependencyMask,
    ) -> Result<()> {
        source.dep_check(relation, &dest)?;
        self.sub
            .data
            .borrow_mut()
            .insert(source, relation, dest, reference, source_mask);
        Ok(())
    }

    pub(super) fn remove(&self, source: &UnitX, relation: UnitRelations, dest: &UnitX) {
        self.sub.data.borrow_mut().remove(source, relation, dest)
    }

    pub(super) fn remove_unit(&self, source: &UnitX) {
        self.sub.data.borrow_mut().remove_unit(source)
    }

    /// Flush the given provenance bits out of every edge the unit asserted;
    /// edges whose masks run empty disappear on both sides.
    pub(super) fn remove_dependencies(&self, source: &UnitX, mask: UnitDependencyMask) {
        self.sub.data.borrow_mut().remove_dependencies(source, mask)
    }

    pub(super) fn gets(&self, source: &UnitX, relation: UnitRelations) -> Vec<Rc<UnitX>> {
        self.sub.data.borrow().gets(source, relation)
    }

    pub(super) fn gets_atom(&self, source: &UnitX, atom: UnitRelationAtom) -> Vec<Rc<UnitX>> {
        let mut dests = Vec::new();
        for relation in unit_relation_from_unique_atom(atom).iter() {
            dests.append(&mut self.gets(source, *relation));
        }
        dests
    }

    pub(super) fn gets_with_info(
        &self,
        source: &UnitX,
    ) -> Vec<(UnitRelations, Rc<UnitX>, UnitDepInfo)> {
        self.sub.data.borrow().gets_with_info(source)
    }

    pub(super) fn get_info(
        &self,
        source: &UnitX,
        relation: UnitRelations,
        dest: &UnitX,
    ) -> Option<UnitDepInfo> {
        self.sub.data.borrow().get_info(source, relation, dest)
    }

    pub(super) fn is_dep_with(
        &self,
        source: &UnitX,
        relation: UnitRelations,
        dest: &UnitX,
    ) -> bool {
        self.sub.data.borrow().is_dep_with(source, relation, dest)
    }

    pub(super) fn is_dep_atom_with(
        &self,
        source: &UnitX,
        atom: UnitRelationAtom,
        dest: &UnitX,
    ) -> bool {
        for relation in unit_relation_from_unique_atom(atom).iter() {
            if self.is_dep_with(source, *relation, dest) {
                // something hits
                return true;
            }
        }
        false
    }

    pub(super) fn entry_clear(&self) {
        self.sub.data.borrow_mut().clear();
    }
}

struct UnitDepSub {
    data: RefCell<UnitDepData>,
}

impl TableSubscribe<String, Rc<UnitX>> for UnitDepSub {
    fn notify(&self, op: &TableOp<String, Rc<UnitX>>) {
        match op {
            TableOp::TableInsert(_, _) => {} // do nothing
            TableOp::TableRemove(_, unit) => self.data.borrow_mut().remove_unit(unit),
        }
    }
}

impl UnitDepSub {
    fn new() -> UnitDepSub {
        UnitDepSub {
            data: RefCell::new(UnitDepData::new()),
        }
    }
}

#[allow(clippy::type_complexity)]
struct UnitDepData {
    // key: unit-source + UnitRelations, value: (unit-destination : provenance)-list
    t: HashMap<Rc<UnitX>, HashMap<UnitRelations, HashMap<Rc<UnitX>, UnitDepInfo>>>,
}

impl UnitDepData {
    fn new() -> UnitDepData {
        UnitDepData { t: HashMap::new() }
    }

    fn clear(&mut self) {
        self.t.clear();
    }

    fn insert(
        &mut self,
        source: Rc<UnitX>,
        relation: UnitRelations,
        dest: Rc<UnitX>,
        reference: bool,
        source_mask: UnitDependencyMask,
    ) {
        // check input
        if source.as_ref() == dest.as_ref() {
            return;
        }

        let info = UnitDepInfo::new(source_mask, UnitDependencyMask::empty());
        let relation_inverse = unit_relation_to_inverse(relation);

        // insert in two-directions way, OR-merging the provenance
        self.insert_one_way(Rc::clone(&source), relation, Rc::clone(&dest), info);
        self.insert_one_way(
            Rc::clone(&dest),
            relation_inverse,
            Rc::clone(&source),
            info.inverse(),
        );

        // process reference in two-directions way
        if reference {
            let ref_relation = UnitRelations::UnitReferences;
            let ref_relation_inverse = unit_relation_to_inverse(ref_relation);
            self.insert_one_way(Rc::clone(&source), ref_relation, Rc::clone(&dest), info);
            self.insert_one_way(
                Rc::clone(&dest),
                ref_relation_inverse,
                Rc::clone(&source),
                info.inverse(),
            );
        }
    }

    fn remove(&mut self, source: &UnitX, relation: UnitRelations, dest: &UnitX) {
        // remove in two-directions way
        let relation_inverse = unit_relation_to_inverse(relation);
        self.remove_one_way(source, relation, dest);
        self.remove_one_way(dest, relation_inverse, source);
    }

    fn remove_unit(&mut self, source: &UnitX) {
        if let Some(sv) = self.t.get(source) {
            let mut removes = Vec::new();
            for (relation, dv) in sv.iter() {
                for (dest, _) in dv.iter() {
                    removes.push((*relation, Rc::clone(dest)));
                }
            }

            for (relation, dest) in removes.iter() {
                self.remove(source, *relation, dest);
            }
        }
    }

    fn remove_dependencies(&mut self, source: &UnitX, mask: UnitDependencyMask) {
        let edges = match self.t.get(source) {
            None => return,
            Some(sv) => {
                let mut edges = Vec::new();
                for (relation, dv) in sv.iter() {
                    for (dest, info) in dv.iter() {
                        edges.push((*relation, Rc::clone(dest), *info));
                    }
                }
                edges
            }
        };

        for (relation, dest, info) in edges {
            let mut origin = info.origin_mask();
            if !origin.intersects(mask) {
                continue;
            }
            origin.remove(mask);

            if origin.is_empty() && info.destination_mask().is_empty() {
                self.remove(source, relation, &dest);
                continue;
            }

            let mut updated = info;
            updated.set_origin_mask(origin);
            self.set_info(source, relation, &dest, updated);
            let inverse = unit_relation_to_inverse(relation);
            self.set_info(&dest, inverse, source, updated.inverse());
        }
    }

    fn gets(&self, source: &UnitX, relation: UnitRelations) -> Vec<Rc<UnitX>> {
        let mut dests = Vec::new();

        if let Some(sv) = self.t.get(source) {
            if let Some(dv) = sv.get(&relation) {
                dests.append(
                    &mut dv
                        .iter()
                        .map(|(destr, _)| Rc::clone(destr))
                        .collect::<Vec<_>>(),
                );
            }
        }

        dests
    }

    fn gets_with_info(&self, source: &UnitX) -> Vec<(UnitRelations, Rc<UnitX>, UnitDepInfo)> {
        let mut edges = Vec::new();
        if let Some(sv) = self.t.get(source) {
            for (relation, dv) in sv.iter() {
                for (dest, info) in dv.iter() {
                    edges.push((*relation, Rc::clone(dest), *info));
                }
            }
        }
        edges
    }

    fn get_info(
        &self,
        source: &UnitX,
        relation: UnitRelations,
        dest: &UnitX,
    ) -> Option<UnitDepInfo> {
        self.t
            .get(source)
            .and_then(|sv| sv.get(&relation))
            .and_then(|dv| dv.get(dest))
            .copied()
    }

    fn is_dep_with(&self, source: &UnitX, relation: UnitRelations, dest: &UnitX) -> bool {
        if let Some(sv) = self.t.get(source) {
            if let Some(dv) = sv.get(&relation) {
                return dv.contains_key(dest);
            }
        }

        false
    }

    fn insert_one_way(
        &mut self,
        source: Rc<UnitX>,
        relation: UnitRelations,
        dest: Rc<UnitX>,
        info: UnitDepInfo,
    ) {
        let dv = self
            .t
            .entry(source)
            .or_insert_with(HashMap::new)
            .entry(relation)
            .or_insert_with(HashMap::new);
        dv.entry(dest)
            .and_modify(|existing| existing.merge(info))
            .or_insert(info);
    }

    fn remove_one_way(&mut self, source: &UnitX, relation: UnitRelations, dest: &UnitX) {
        let sv = match self.t.get_mut(source) {
            None => return,
            Some(v) => v,
        };
        let map = match sv.get_mut(&relation) {
            None => return,
            Some(v) => v,
        };
        /* remove the 3-level map from bottom to top. */
        map.remove(dest);
        if map.is_empty() {
            sv.remove(&relation);
        }
        if sv.is_empty() {
            self.t.remove(source); // release the key 'Rc<UnitX>'
        }
    }

    fn set_info(
        &mut self,
        source: &UnitX,
        relation: UnitRelations,
        dest: &UnitX,
        info: UnitDepInfo,
    ) {
        if let Some(sv) = self.t.get_mut(source) {
            if let Some(dv) = sv.get_mut(&relation) {
                if let Some(existing) = dv.get_mut(dest) {
                    *existing = info;
                }
            }
        }
    }
}
