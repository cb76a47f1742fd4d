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

//! The D-Bus queue drain. The transport is an external collaborator; it
//! plugs in as a [`BusSink`] and receives the coalesced signals.

use super::entry::UnitX;
use super::runtime::UnitRT;
use std::cell::RefCell;
use std::rc::Rc;

/// Where UnitNew/UnitRemoved/PropertiesChanged signals go.
pub trait BusSink {
    ///
    fn unit_new(&self, _id: &str) {}
    ///
    fn unit_removed(&self, _id: &str) {}
    ///
    fn properties_changed(&self, _id: &str) {}
}

pub(super) struct UnitBus {
    sink: RefCell<Option<Rc<dyn BusSink>>>,
}

impl UnitBus {
    pub(super) fn new() -> UnitBus {
        UnitBus {
            sink: RefCell::new(None),
        }
    }

    pub(super) fn set_sink(&self, sink: Rc<dyn BusSink>) {
        *self.sink.borrow_mut() = Some(sink);
    }

    /// Emit the queued signals: first contact gets UnitNew, everything
    /// afterwards PropertiesChanged.
    pub(super) fn dispatch_dbus_queue(&self, rt: &UnitRT) -> bool {
        let mut did_work = false;
        while let Some(unit) = rt.pop_dbus_queue() {
            did_work = true;
            if !unit.sent_dbus_new_signal() {
                unit.set_sent_dbus_new_signal(true);
                log::debug!("Sending UnitNew signal for {}", unit.id());
                if let Some(sink) = self.sink.borrow().as_ref() {
                    sink.unit_new(&unit.id());
                }
            } else {
                log::debug!("Sending PropertiesChanged signal for {}", unit.id());
                if let Some(sink) = self.sink.borrow().as_ref() {
                    sink.properties_changed(&unit.id());
                }
            }
        }
        did_work
    }

    pub(super) fn announce_removed(&self, unit: &UnitX) {
        log::debug!("Sending UnitRemoved signal for {}", unit.id());
        if let Some(sink) = self.sink.borrow().as_ref() {
            sink.unit_removed(&unit.id());
        }
    }
}
