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

//! End-to-end scenarios driven through the public manager API, with a
//! stand-in service module registered the way an external per-type
//! component would register itself.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;

use unitmaster::error::{Error, Result};
use unitmaster::manager::{Manager, State};
use unitmaster::unit::base::{
    UnitActiveState, UnitDependencyMask, UnitNotifyFlags, UnitRelationAtom, UnitRelations,
    UnitType,
};
use unitmaster::unit::{SubUnit, UnitBase, UnitFragment};

/// A service module double: synchronous start/stop, start-limit aware,
/// substate carried across serialization. `StubFailStart=yes` in the
/// private section makes every start fail.
struct StubService {
    state: Cell<UnitActiveState>,
    fail_start: Cell<bool>,
    owner: RefCell<Option<Rc<dyn UnitBase>>>,
    deserialized: Cell<Option<UnitActiveState>>,
}

impl StubService {
    fn new() -> StubService {
        StubService {
            state: Cell::new(UnitActiveState::InActive),
            fail_start: Cell::new(false),
            owner: RefCell::new(None),
            deserialized: Cell::new(None),
        }
    }

    fn set_state(&self, new_state: UnitActiveState) {
        let old_state = self.state.get();
        self.state.set(new_state);
        if let Some(owner) = self.owner.borrow().as_ref() {
            owner.notify(old_state, new_state, UnitNotifyFlags::empty());
        }
    }
}

impl SubUnit for StubService {
    fn load(&self, section: &HashMap<String, String>) -> Result<()> {
        if section.get("StubFailStart").map(|v| v.as_str()) == Some("yes") {
            self.fail_start.set(true);
        }
        Ok(())
    }

    fn start(&self) -> Result<()> {
        if let Some(owner) = self.owner.borrow().as_ref() {
            if !owner.test_start_limit() {
                self.set_state(UnitActiveState::Failed);
                return Err(Error::UnitActionEFailed);
            }
        }
        if self.fail_start.get() {
            self.set_state(UnitActiveState::Failed);
            return Err(Error::UnitActionEFailed);
        }
        self.set_state(UnitActiveState::Activating);
        self.set_state(UnitActiveState::Active);
        Ok(())
    }

    fn stop(&self, _force: bool) -> Result<()> {
        self.set_state(UnitActiveState::InActive);
        Ok(())
    }

    fn current_active_state(&self) -> UnitActiveState {
        self.state.get()
    }

    fn get_subunit_state(&self) -> String {
        self.state.get().to_string()
    }

    fn reset_failed(&self) {
        if self.state.get() == UnitActiveState::Failed {
            self.state.set(UnitActiveState::InActive);
        }
    }

    fn serialize(&self, ser: &mut unitmaster::serialize::Serializer) -> Result<()> {
        ser.item("service-state", &self.state.get().to_string())
    }

    fn deserialize_item(
        &self,
        key: &str,
        value: &str,
        _fds: &mut unitmaster::serialize::FdSet,
    ) -> Result<()> {
        if key == "service-state" {
            self.deserialized.set(value.parse().ok());
        }
        Ok(())
    }

    fn coldplug(&self) {
        if let Some(state) = self.deserialized.take() {
            self.state.set(state);
        }
    }

    fn attach_unit(&self, unit: Rc<dyn UnitBase>) {
        *self.owner.borrow_mut() = Some(unit);
    }
}

fn stub_service_new() -> Box<dyn SubUnit> {
    Box::new(StubService::new())
}

fn new_manager() -> Manager {
    let manager = Manager::new().unwrap();
    manager
        .um()
        .sub_registry()
        .register(UnitType::UnitService, stub_service_new);
    manager.startup();
    manager
}

fn register_service(manager: &Manager, name: &str, props: &[(&str, &str)]) {
    register_service_with_section(manager, name, props, &[]);
}

fn register_service_with_section(
    manager: &Manager,
    name: &str,
    props: &[(&str, &str)],
    section: &[(&str, &str)],
) {
    let mut frag = UnitFragment {
        mtime: 1,
        ..UnitFragment::default()
    };
    for (key, value) in props {
        frag.unit.set_property(key, value).unwrap();
    }
    for (key, value) in section {
        frag.section.insert(key.to_string(), value.to_string());
    }
    manager.um().file_store().register_fragment(name, frag);
}

/// Give long-lived test units an active holder, so the garbage collector
/// does not take them between the steps of a scenario.
fn pin_units(manager: &Manager, names: &[&str]) {
    register_service(manager, "world.target", &[]);
    let um = manager.um();
    um.load_unit("world.target").unwrap();
    um.start_unit("world.target", false).unwrap();
    um.dispatch_queues();
    for name in names {
        um.unit_add_dependency(
            "world.target",
            UnitRelations::UnitReferences,
            name,
            false,
            UnitDependencyMask::IMPLICIT,
        )
        .unwrap();
    }
}

#[test]
fn add_name_and_choose_id() {
    let manager = new_manager();
    register_service(&manager, "a.service", &[]);

    let um = manager.um();
    um.load_unit("a.service").unwrap();
    um.unit_add_name("a.service", "a-alias.service").unwrap();
    um.unit_choose_id("a.service", "a-alias.service").unwrap();

    let names = um.unit_names("a-alias.service").unwrap();
    assert!(names.contains(&"a.service".to_string()));
    assert!(names.contains(&"a-alias.service".to_string()));
    // both names resolve to the very same unit
    assert_eq!(um.unit_names("a.service").unwrap(), names);

    // a foreign unit cannot steal the name
    register_service(&manager, "b.service", &[]);
    um.load_unit("b.service").unwrap();
    assert!(um.unit_add_name("b.service", "a-alias.service").is_err());
    // malformed names are refused up front
    assert!(um.unit_add_name("a.service", "no-suffix").is_err());
}

#[test]
fn symmetric_edge_with_provenance_flush() {
    let manager = new_manager();
    register_service(&manager, "a.service", &[]);
    register_service(&manager, "b.service", &[]);

    let um = manager.um();
    um.load_unit("a.service").unwrap();
    um.load_unit("b.service").unwrap();

    um.unit_add_dependency(
        "a.service",
        UnitRelations::UnitWants,
        "b.service",
        false,
        UnitDependencyMask::FILE,
    )
    .unwrap();

    // forward and inverse direction both exist
    assert!(um.unit_has_dependency(
        "a.service",
        UnitRelationAtom::UnitAtomPullInStartIgnored,
        "b.service"
    ));
    assert!(um.unit_has_dependency(
        "b.service",
        UnitRelationAtom::UnitAtomPinsStopWhenUnneeded,
        "a.service"
    ));

    // the edge carries the file provenance on the asserting side, mirrored
    // on the inverse direction
    let (origin, destination) = um
        .unit_dependency_masks("a.service", UnitRelations::UnitWants, "b.service")
        .unwrap();
    assert_eq!(origin, UnitDependencyMask::FILE);
    assert_eq!(destination, UnitDependencyMask::empty());
    let (origin, destination) = um
        .unit_dependency_masks("b.service", UnitRelations::UnitWantsBy, "a.service")
        .unwrap();
    assert_eq!(origin, UnitDependencyMask::empty());
    assert_eq!(destination, UnitDependencyMask::FILE);

    // flushing the file provenance removes both sides
    um.unit_remove_dependencies("a.service", UnitDependencyMask::FILE)
        .unwrap();
    assert!(!um.unit_has_dependency(
        "a.service",
        UnitRelationAtom::UnitAtomPullInStartIgnored,
        "b.service"
    ));
    assert!(!um.unit_has_dependency(
        "b.service",
        UnitRelationAtom::UnitAtomPinsStopWhenUnneeded,
        "a.service"
    ));
}

#[test]
fn alias_names_resolve_to_one_unit() {
    let manager = new_manager();
    register_service(&manager, "real.service", &[]);
    manager
        .um()
        .file_store()
        .register_alias("extra.service", "real.service");

    let um = manager.um();
    um.load_unit("real.service").unwrap();

    // loading the carrier registered the alias name alongside
    let names = um.unit_names("extra.service").unwrap();
    assert!(names.contains(&"real.service".to_string()));
    assert!(names.contains(&"extra.service".to_string()));
    assert_eq!(um.unit_names("real.service").unwrap(), names);
}

#[test]
fn alias_discovered_at_reload_merges_units() {
    let manager = new_manager();
    register_service(&manager, "real.service", &[]);
    register_service(&manager, "other.service", &[]);

    let um = manager.um();
    um.load_unit("real.service").unwrap();
    um.load_unit("other.service").unwrap();

    // the loader discovers that other.service is really an alias
    um.file_store().remove_fragment("other.service");
    um.file_store().register_alias("other.service", "real.service");
    manager.reload().unwrap();
    um.dispatch_queues();

    // one unit remains, carrying both names, and both lookups agree
    let names = um.unit_names("other.service").unwrap();
    assert!(names.contains(&"real.service".to_string()));
    assert!(names.contains(&"other.service".to_string()));
    assert_eq!(um.unit_names("real.service").unwrap(), names);
    assert_eq!(
        um.unit_load_state("other.service").unwrap().to_string(),
        "loaded"
    );
    assert_eq!(
        um.unit_load_state("real.service").unwrap().to_string(),
        "loaded"
    );
}

#[test]
fn stop_when_unneeded() {
    let manager = new_manager();
    register_service(&manager, "needed.service", &[("StopWhenUnneeded", "yes")]);
    register_service(
        &manager,
        "consumer.service",
        &[("Requires", "needed.service"), ("After", "needed.service")],
    );
    let um = manager.um();
    um.load_unit("needed.service").unwrap();
    um.load_unit("consumer.service").unwrap();
    pin_units(&manager, &["needed.service", "consumer.service"]);

    um.start_unit("needed.service", false).unwrap();
    um.dispatch_queues();
    um.start_unit("consumer.service", false).unwrap();
    um.dispatch_queues();

    assert_eq!(
        um.unit_active_state("needed.service").unwrap(),
        UnitActiveState::Active
    );

    // stopping the last unit that needs it takes it down within one drain
    um.stop_unit("consumer.service", false).unwrap();
    um.dispatch_queues();

    assert_eq!(
        um.unit_active_state("consumer.service").unwrap(),
        UnitActiveState::InActive
    );
    assert_eq!(
        um.unit_active_state("needed.service").unwrap(),
        UnitActiveState::InActive
    );
}

#[test]
fn gc_honors_collect_mode() {
    let manager = new_manager();
    register_service_with_section(
        &manager,
        "collected.service",
        &[("CollectMode", "inactive-or-failed")],
        &[("StubFailStart", "yes")],
    );
    register_service_with_section(
        &manager,
        "retained.service",
        &[],
        &[("StubFailStart", "yes")],
    );

    let um = manager.um();
    for name in ["collected.service", "retained.service"] {
        um.start_unit(name, false).unwrap();
        um.dispatch_queues();
    }

    // the failed unit with inactive-or-failed was swept away
    assert!(!um.unit_exists("collected.service"));
    // the failed unit with the default mode is retained
    assert!(um.unit_exists("retained.service"));
    assert_eq!(
        um.unit_active_state("retained.service").unwrap(),
        UnitActiveState::Failed
    );
}

#[test]
fn start_limit_trip_fires_action() {
    let manager = new_manager();
    register_service(
        &manager,
        "limit.service",
        &[
            ("StartLimitBurst", "5"),
            ("StartLimitInterval", "1000"),
            ("StartLimitAction", "exit"),
        ],
    );
    let um = manager.um();
    um.load_unit("limit.service").unwrap();
    pin_units(&manager, &["limit.service"]);

    for _ in 0..5 {
        um.start_unit("limit.service", false).unwrap();
        um.dispatch_queues();
        assert_eq!(
            um.unit_active_state("limit.service").unwrap(),
            UnitActiveState::Active
        );
        um.stop_unit("limit.service", false).unwrap();
        um.dispatch_queues();
    }

    // the sixth activation within the interval trips the limit
    um.start_unit("limit.service", false).unwrap();
    um.dispatch_queues();

    assert_eq!(
        um.unit_active_state("limit.service").unwrap(),
        UnitActiveState::Failed
    );
    assert_eq!(manager.get_state(), State::Exit);
}

#[test]
fn manual_start_refused() {
    let manager = new_manager();
    register_service(&manager, "auto.service", &[("RefuseManualStart", "yes")]);

    let um = manager.um();
    assert!(matches!(
        um.start_unit("auto.service", true),
        Err(Error::ManualStartRefused { .. })
    ));
    // indirect starts stay allowed
    um.start_unit("auto.service", false).unwrap();
    um.dispatch_queues();
    assert_eq!(
        um.unit_active_state("auto.service").unwrap(),
        UnitActiveState::Active
    );
}

#[test]
fn isolate_refused_and_allowed() {
    let manager = new_manager();
    register_service(&manager, "iso.service", &[("AllowIsolate", "yes")]);
    register_service(&manager, "other.service", &[]);
    register_service(&manager, "kept.service", &[("IgnoreOnIsolate", "yes")]);
    register_service(&manager, "plain.service", &[]);

    let um = manager.um();
    um.start_unit("other.service", false).unwrap();
    um.start_unit("kept.service", false).unwrap();
    um.dispatch_queues();

    // a unit without AllowIsolate= cannot be isolated
    assert!(matches!(
        um.isolate_unit("plain.service"),
        Err(Error::IsolateRefused { .. })
    ));

    um.isolate_unit("iso.service").unwrap();
    um.dispatch_queues();

    assert_eq!(
        um.unit_active_state("iso.service").unwrap(),
        UnitActiveState::Active
    );
    // everything else stopped, except the ignore-on-isolate unit
    assert_eq!(
        um.unit_active_state("kept.service").unwrap(),
        UnitActiveState::Active
    );
    assert!(
        !um.unit_exists("other.service")
            || um.unit_active_state("other.service").unwrap() == UnitActiveState::InActive
    );
}

#[test]
fn serialize_round_trip() {
    let manager = new_manager();
    register_service(&manager, "keep.service", &[("Description", "round trip")]);
    register_service(&manager, "idle.service", &[]);

    let um = manager.um();
    um.start_unit("keep.service", false).unwrap();
    um.load_unit("idle.service").unwrap();
    um.dispatch_queues();

    let invocation = um.unit_invocation_id("keep.service").unwrap();
    let (stream, mut fds) = um.serialize().unwrap();

    // a fresh manager with the same modules and fragments takes over
    let successor = new_manager();
    register_service(&successor, "keep.service", &[("Description", "round trip")]);
    register_service(&successor, "idle.service", &[]);

    let um2 = successor.um();
    let mut cursor = Cursor::new(stream);
    um2.deserialize(&mut cursor, &mut fds).unwrap();
    um2.coldplug();
    um2.catchup();
    um2.dispatch_queues();

    assert_eq!(
        um2.unit_active_state("keep.service").unwrap(),
        UnitActiveState::Active
    );
    assert_eq!(
        um2.unit_active_state("idle.service").unwrap(),
        UnitActiveState::InActive
    );
    assert_eq!(um2.unit_invocation_id("keep.service").unwrap(), invocation);
    assert_eq!(
        um2.unit_load_state("keep.service").unwrap().to_string(),
        "loaded"
    );
}

#[test]
fn daemon_reload_preserves_state() {
    let manager = new_manager();
    register_service(&manager, "survivor.service", &[]);

    let um = manager.um();
    um.start_unit("survivor.service", false).unwrap();
    um.dispatch_queues();
    let invocation = um.unit_invocation_id("survivor.service").unwrap();

    manager.reload().unwrap();

    assert_eq!(manager.get_state(), State::Ok);
    assert_eq!(
        um.unit_active_state("survivor.service").unwrap(),
        UnitActiveState::Active
    );
    assert_eq!(
        um.unit_invocation_id("survivor.service").unwrap(),
        invocation
    );
}

#[test]
fn transient_scope_lifecycle() {
    let manager = new_manager();
    let um = manager.um();

    let props = vec![("Description".to_string(), "a scope".to_string())];
    um.start_transient_unit("run-r2.scope", &props).unwrap();
    um.dispatch_queues();

    assert_eq!(
        um.unit_active_state("run-r2.scope").unwrap(),
        UnitActiveState::Active
    );

    // the cgroup running empty finishes the scope, and a finished
    // transient scope is collected together with its synthetic fragment
    um.notify_cgroup_empty("run-r2.scope").unwrap();
    um.dispatch_queues();
    assert!(!um.unit_exists("run-r2.scope"));
    assert!(um.start_unit("run-r2.scope", false).is_err());

    // targets do not take transient units at all
    assert!(matches!(
        um.start_transient_unit("ad-hoc.target", &[]),
        Err(Error::TransientNotAllowed)
    ));

    // device units have no module in this process
    assert!(um.start_unit("disk.device", false).is_err());
}

#[test]
fn unused_inactive_unit_is_collected() {
    let manager = new_manager();
    register_service(&manager, "short.service", &[]);

    let um = manager.um();
    um.start_unit("short.service", false).unwrap();
    um.dispatch_queues();
    um.stop_unit("short.service", false).unwrap();
    um.dispatch_queues();

    // nothing references it and it is inactive: the sweep takes it
    assert!(!um.unit_exists("short.service"));
}
