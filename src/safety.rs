//! Safety interlocks of the cell: emergency stop, light curtain and door.
//!
//! The machine stores three sensor flags and a latch that records an incident that has
//! not yet been acknowledged. The externally visible [`SafetyState`] is a priority
//! projection of these: an emergency stop masks everything else, a broken light curtain
//! masks an open door, and once all sensors are clear the cell still reports
//! `ResetRequired` until [`SafetyMachine::reset`] acknowledges the incident.
//!
//! Only [`SafetyMachine::is_safe`] gates motion. A cell in `ResetRequired` is safe to move
//! but reports the pending acknowledgement.

use std::fmt;
use std::time::SystemTime;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyState {
    Normal,
    EmergencyStop,
    LightCurtainBreak,
    DoorOpen,
    ResetRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyEventKind {
    EmergencyStop,
    EmergencyStopReset,
    LightCurtainBreak,
    LightCurtainReset,
    DoorOpen,
    DoorClosed,
    SystemReset,
}

impl SafetyEventKind {
    pub fn tag(&self) -> &'static str {
        match self {
            SafetyEventKind::EmergencyStop => "emergency_stop",
            SafetyEventKind::EmergencyStopReset => "emergency_stop_reset",
            SafetyEventKind::LightCurtainBreak => "light_curtain_break",
            SafetyEventKind::LightCurtainReset => "light_curtain_reset",
            SafetyEventKind::DoorOpen => "door_open",
            SafetyEventKind::DoorClosed => "door_closed",
            SafetyEventKind::SystemReset => "system_reset",
        }
    }
}

impl fmt::Display for SafetyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SafetyEvent {
    pub kind: SafetyEventKind,
    pub timestamp: SystemTime,
}

/// Snapshot of the interlocks, as shown to an operator.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyStatus {
    pub state: SafetyState,
    pub is_safe: bool,
    pub emergency_stop_active: bool,
    pub light_curtain_intact: bool,
    pub door_closed: bool,
    pub last_event_time: Option<SystemTime>,
}

#[derive(Debug, Clone)]
pub struct SafetyMachine {
    emergency_stop_active: bool,
    light_curtain_intact: bool,
    door_closed: bool,
    reset_pending: bool,
    events: Vec<SafetyEvent>,
}

impl Default for SafetyMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyMachine {
    /// All sensors clear, nothing to acknowledge.
    pub fn new() -> Self {
        SafetyMachine {
            emergency_stop_active: false,
            light_curtain_intact: true,
            door_closed: true,
            reset_pending: false,
            events: Vec::new(),
        }
    }

    fn log(&mut self, kind: SafetyEventKind) {
        self.events.push(SafetyEvent {
            kind,
            timestamp: SystemTime::now(),
        });
    }

    pub fn emergency_stop_active(&self) -> bool {
        self.emergency_stop_active
    }

    pub fn light_curtain_intact(&self) -> bool {
        self.light_curtain_intact
    }

    pub fn door_closed(&self) -> bool {
        self.door_closed
    }

    pub fn trigger_emergency_stop(&mut self) {
        warn!("Emergency stop triggered");
        self.emergency_stop_active = true;
        self.reset_pending = true;
        self.log(SafetyEventKind::EmergencyStop);
    }

    pub fn trigger_light_curtain_break(&mut self) {
        warn!("Light curtain broken");
        self.light_curtain_intact = false;
        self.reset_pending = true;
        self.log(SafetyEventKind::LightCurtainBreak);
    }

    pub fn trigger_door_open(&mut self) {
        warn!("Safety door opened");
        self.door_closed = false;
        self.reset_pending = true;
        self.log(SafetyEventKind::DoorOpen);
    }

    /// Releases the emergency stop button. The incident still needs a system reset.
    pub fn reset_emergency_stop(&mut self) {
        self.emergency_stop_active = false;
        self.log(SafetyEventKind::EmergencyStopReset);
    }

    pub fn reset_light_curtain(&mut self) {
        self.light_curtain_intact = true;
        self.log(SafetyEventKind::LightCurtainReset);
    }

    pub fn reset_door(&mut self) {
        self.door_closed = true;
        self.log(SafetyEventKind::DoorClosed);
    }

    /// Acknowledges incidents, restoring light curtain and door. Refused, with no change
    /// and no event, while the emergency stop is active.
    pub fn reset(&mut self) -> bool {
        if self.emergency_stop_active {
            warn!("System reset refused, emergency stop is active");
            return false;
        }
        self.light_curtain_intact = true;
        self.door_closed = true;
        self.reset_pending = false;
        self.log(SafetyEventKind::SystemReset);
        info!("Safety system reset");
        true
    }

    pub fn state(&self) -> SafetyState {
        if self.emergency_stop_active {
            SafetyState::EmergencyStop
        } else if !self.light_curtain_intact {
            SafetyState::LightCurtainBreak
        } else if !self.door_closed {
            SafetyState::DoorOpen
        } else if self.reset_pending {
            SafetyState::ResetRequired
        } else {
            SafetyState::Normal
        }
    }

    /// The single predicate consulted before any motion.
    pub fn is_safe(&self) -> bool {
        !self.emergency_stop_active && self.light_curtain_intact && self.door_closed
    }

    /// All events, or the last `limit` of them.
    pub fn events(&self, limit: Option<usize>) -> &[SafetyEvent] {
        match limit {
            Some(limit) => &self.events[self.events.len().saturating_sub(limit)..],
            None => &self.events,
        }
    }

    pub fn last_event_time(&self) -> Option<SystemTime> {
        self.events.last().map(|e| e.timestamp)
    }

    pub fn status(&self) -> SafetyStatus {
        SafetyStatus {
            state: self.state(),
            is_safe: self.is_safe(),
            emergency_stop_active: self.emergency_stop_active,
            light_curtain_intact: self.light_curtain_intact,
            door_closed: self.door_closed,
            last_event_time: self.last_event_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(machine: &SafetyMachine) -> Vec<SafetyEventKind> {
        machine.events(None).iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_initial_state() {
        let machine = SafetyMachine::new();
        assert_eq!(machine.state(), SafetyState::Normal);
        assert!(machine.is_safe());
        assert!(machine.events(None).is_empty());
        assert!(machine.last_event_time().is_none());
    }

    #[test]
    fn test_priority() {
        let mut machine = SafetyMachine::new();
        machine.trigger_door_open();
        assert_eq!(machine.state(), SafetyState::DoorOpen);
        machine.trigger_light_curtain_break();
        assert_eq!(machine.state(), SafetyState::LightCurtainBreak);
        machine.trigger_emergency_stop();
        assert_eq!(machine.state(), SafetyState::EmergencyStop);
        assert!(!machine.is_safe());
    }

    #[test]
    fn test_sensor_resets_do_not_release_emergency_stop() {
        let mut machine = SafetyMachine::new();
        machine.trigger_emergency_stop();
        machine.trigger_door_open();
        machine.reset_door();
        machine.reset_light_curtain();
        assert!(machine.emergency_stop_active());
        assert_eq!(machine.state(), SafetyState::EmergencyStop);
    }

    #[test]
    fn test_door_cycle() {
        let mut machine = SafetyMachine::new();
        machine.trigger_door_open();
        assert!(!machine.is_safe());
        machine.reset_door();
        assert!(machine.is_safe());
        assert_eq!(machine.state(), SafetyState::ResetRequired);
        assert!(machine.reset());
        assert_eq!(machine.state(), SafetyState::Normal);
        assert_eq!(
            kinds(&machine),
            vec![SafetyEventKind::DoorOpen, SafetyEventKind::DoorClosed, SafetyEventKind::SystemReset]
        );
    }

    #[test]
    fn test_events_limit() {
        let mut machine = SafetyMachine::new();
        machine.trigger_door_open();
        machine.trigger_light_curtain_break();
        machine.trigger_emergency_stop();
        let last = machine.events(Some(2));
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].kind, SafetyEventKind::LightCurtainBreak);
        assert_eq!(last[1].kind, SafetyEventKind::EmergencyStop);
        assert_eq!(machine.events(Some(10)).len(), 3);
        assert!(machine.events(Some(0)).is_empty());
    }

    #[test]
    fn test_status_snapshot() {
        let mut machine = SafetyMachine::new();
        machine.trigger_light_curtain_break();
        let status = machine.status();
        assert_eq!(status.state, SafetyState::LightCurtainBreak);
        assert!(!status.is_safe);
        assert!(!status.light_curtain_intact);
        assert!(status.door_closed);
        assert!(status.last_event_time.is_some());
    }
}
