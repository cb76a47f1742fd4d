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

//! The outermost loop: owns the event loop and the unit manager, drains
//! the queues before every wait, and carries state across daemon-reload.

use crate::error::*;
use crate::unit::UnitManagerX;
use event::Events;
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

/// What the main loop should do next.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    ///
    Init,
    /// keep going
    Ok,
    /// daemon-reload was requested
    ReLoad,
    /// re-execution was requested
    ReExecute,
    ///
    Reboot,
    ///
    PowerOff,
    ///
    Exit,
    ///
    SwitchRoot,
}

/// The manager of the unit engine.
pub struct Manager {
    events: Rc<Events>,
    state: Rc<RefCell<State>>,
    um: UnitManagerX,
}

impl Manager {
    pub fn new() -> Result<Manager> {
        let events = Rc::new(Events::new().context(EventSnafu)?);
        let state = Rc::new(RefCell::new(State::Init));
        let um = UnitManagerX::new(&events, Rc::clone(&state));
        Ok(Manager { events, state, um })
    }

    pub fn um(&self) -> &UnitManagerX {
        &self.um
    }

    pub fn events(&self) -> Rc<Events> {
        Rc::clone(&self.events)
    }

    pub fn get_state(&self) -> State {
        *self.state.borrow()
    }

    pub fn set_state(&self, state: State) {
        *self.state.borrow_mut() = state;
    }

    /// Put the perpetual units in place and open for business.
    pub fn startup(&self) {
        self.um.enumerate_perpetual();
        self.um.dispatch_queues();
        self.set_state(State::Ok);
    }

    /// Drive the engine until something other than normal operation is
    /// requested. Queues drain before every wait on the event loop.
    pub fn rloop(&self) -> Result<State> {
        loop {
            self.um.dispatch_queues();

            match self.get_state() {
                State::Ok => {}
                state => return Ok(state),
            }

            self.events.run(-1).context(EventSnafu)?;
        }
    }

    /// Daemon-reload: push the observable state through the serialization
    /// stream and reinstall it, as a reexec would.
    pub fn reload(&self) -> Result<()> {
        log::info!("Reloading the manager");
        let (stream, mut fds) = self.um.serialize()?;

        self.um.entry_clear();
        self.um.enumerate_perpetual();

        let mut cursor = Cursor::new(stream);
        self.um.deserialize(&mut cursor, &mut fds)?;
        self.um.coldplug();
        self.um.distribute_fds(&mut fds);
        self.um.catchup();
        self.um.dispatch_queues();

        self.set_state(State::Ok);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_startup_state() {
        let manager = Manager::new().unwrap();
        assert_eq!(manager.get_state(), State::Init);
        manager.startup();
        assert_eq!(manager.get_state(), State::Ok);
        // the perpetual root slice is in place and running
        assert!(manager.um().unit_exists("-.slice"));
        assert_eq!(
            manager
                .um()
                .unit_active_state("-.slice")
                .unwrap()
                .to_string(),
            "active"
        );
    }
}
