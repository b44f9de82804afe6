//! Canonical machine model state
//!
//! Live state owned by the (external) G-code interpreter and planner. The
//! registry only reads it, apart from a handful of actions that request a
//! state change.

use heapless::String;

use super::axis::AXES;
use super::Cell;

/// Maximum length of a queued G-code block
pub const GCODE_BLOCK_LEN: usize = 64;

/// Machine states (`macs`)
pub mod machine_state {
    pub const INITIALIZING: u8 = 0;
    pub const READY: u8 = 1;
    pub const ALARM: u8 = 2;
    pub const PROGRAM_STOP: u8 = 3;
    pub const PROGRAM_END: u8 = 4;
    pub const CYCLE: u8 = 5;
    pub const INTERLOCK: u8 = 6;
    pub const SHUTDOWN: u8 = 7;
    pub const PANIC: u8 = 8;
}

/// Cycle states (`cycs`)
pub mod cycle_state {
    pub const OFF: u8 = 0;
    pub const MACHINING: u8 = 1;
    pub const HOMING: u8 = 2;
    pub const PROBE: u8 = 3;
    pub const JOG: u8 = 4;
}

/// Motion states (`mots`)
pub mod motion_state {
    pub const STOP: u8 = 0;
    pub const PLANNING: u8 = 1;
    pub const RUN: u8 = 2;
}

/// Combined states reported as `stat`
pub mod combined_state {
    pub const INITIALIZING: u8 = 0;
    pub const READY: u8 = 1;
    pub const ALARM: u8 = 2;
    pub const PROGRAM_STOP: u8 = 3;
    pub const PROGRAM_END: u8 = 4;
    pub const RUN: u8 = 5;
    pub const HOLD: u8 = 6;
    pub const PROBE: u8 = 7;
    pub const CYCLE: u8 = 8;
    pub const HOMING: u8 = 9;
    pub const JOG: u8 = 10;
    pub const INTERLOCK: u8 = 11;
    pub const SHUTDOWN: u8 = 12;
    pub const PANIC: u8 = 13;
}

/// Inches is 0 to match G20/G21 ordering
pub const UNITS_INCHES: u8 = 0;
pub const UNITS_MM: u8 = 1;

/// Addressable model fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelField {
    LineNumber,
    Velocity,
    Feed,
    MachineState,
    CycleState,
    MotionState,
    HoldState,
    Units,
    CoordSystem,
    MotionMode,
    Plane,
    PathControl,
    DistanceMode,
    ArcDistanceMode,
    FeedRateMode,
    Tool,
    OriginOffsetEnable,
    HomingState,
    ProbeState,
    MachinePosition(u8),
    Homed(u8),
    ProbeResult(u8),
    Tick,
    PlannerFree,
    QueuedIn,
    QueuedOut,
}

/// A jog request staged by `jogx`..`joga`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JogRequest {
    pub axis: u8,
    /// Destination in canonical units
    pub destination: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    pub linenum: u32,
    pub velocity: f32,
    pub feed: f32,
    pub machine_state: u8,
    pub cycle_state: u8,
    pub motion_state: u8,
    pub hold_state: u8,
    /// Active G20/G21 mode, see `UNITS_INCHES` / `UNITS_MM`
    pub units_mode: u8,
    /// 0 = machine coordinates, 1..=6 = G54..G59
    pub coord_system: u8,
    pub motion_mode: u8,
    pub plane: u8,
    pub path_control: u8,
    pub distance_mode: u8,
    pub arc_distance_mode: u8,
    pub feed_rate_mode: u8,
    pub tool: u8,
    pub origin_offset_enable: u8,
    pub homing_state: u8,
    pub homed: [u8; AXES],
    pub probe_state: u8,
    pub probe_results: [f32; AXES],
    /// Machine position in canonical units
    pub position: [f32; AXES],
    pub tick: u32,
    pub planner_free: u32,
    pub queued_in: u32,
    pub queued_out: u32,
    pub jog: Option<JogRequest>,
    /// Block submitted through `gc`, consumed by the interpreter
    pub pending_gcode: String<GCODE_BLOCK_LEN>,
    pub queue_flush_requested: bool,
}

impl Default for ModelState {
    fn default() -> Self {
        Self {
            linenum: 0,
            velocity: 0.0,
            feed: 0.0,
            machine_state: machine_state::READY,
            cycle_state: cycle_state::OFF,
            motion_state: motion_state::STOP,
            hold_state: 0,
            units_mode: UNITS_MM,
            coord_system: 1,
            motion_mode: 0,
            plane: 0,
            path_control: 2,
            distance_mode: 0,
            arc_distance_mode: 1,
            feed_rate_mode: 1,
            tool: 0,
            origin_offset_enable: 0,
            homing_state: 0,
            homed: [0; AXES],
            probe_state: 0,
            probe_results: [0.0; AXES],
            position: [0.0; AXES],
            tick: 0,
            planner_free: 28,
            queued_in: 0,
            queued_out: 0,
            jog: None,
            pending_gcode: String::new(),
            queue_flush_requested: false,
        }
    }
}

impl ModelState {
    /// Typed reference to one field, None for an out-of-range axis
    pub fn cell(&mut self, field: ModelField) -> Option<Cell<'_>> {
        let cell = match field {
            ModelField::LineNumber => Cell::Word(&mut self.linenum),
            ModelField::Velocity => Cell::Float(&mut self.velocity),
            ModelField::Feed => Cell::Float(&mut self.feed),
            ModelField::MachineState => Cell::Byte(&mut self.machine_state),
            ModelField::CycleState => Cell::Byte(&mut self.cycle_state),
            ModelField::MotionState => Cell::Byte(&mut self.motion_state),
            ModelField::HoldState => Cell::Byte(&mut self.hold_state),
            ModelField::Units => Cell::Byte(&mut self.units_mode),
            ModelField::CoordSystem => Cell::Byte(&mut self.coord_system),
            ModelField::MotionMode => Cell::Byte(&mut self.motion_mode),
            ModelField::Plane => Cell::Byte(&mut self.plane),
            ModelField::PathControl => Cell::Byte(&mut self.path_control),
            ModelField::DistanceMode => Cell::Byte(&mut self.distance_mode),
            ModelField::ArcDistanceMode => Cell::Byte(&mut self.arc_distance_mode),
            ModelField::FeedRateMode => Cell::Byte(&mut self.feed_rate_mode),
            ModelField::Tool => Cell::Byte(&mut self.tool),
            ModelField::OriginOffsetEnable => Cell::Byte(&mut self.origin_offset_enable),
            ModelField::HomingState => Cell::Byte(&mut self.homing_state),
            ModelField::ProbeState => Cell::Byte(&mut self.probe_state),
            ModelField::MachinePosition(axis) => {
                Cell::Float(self.position.get_mut(axis as usize)?)
            }
            ModelField::Homed(axis) => Cell::Byte(self.homed.get_mut(axis as usize)?),
            ModelField::ProbeResult(axis) => {
                Cell::Float(self.probe_results.get_mut(axis as usize)?)
            }
            ModelField::Tick => Cell::Word(&mut self.tick),
            ModelField::PlannerFree => Cell::Word(&mut self.planner_free),
            ModelField::QueuedIn => Cell::Word(&mut self.queued_in),
            ModelField::QueuedOut => Cell::Word(&mut self.queued_out),
        };
        Some(cell)
    }

    /// Single state value summarizing machine, cycle and motion state
    pub fn combined_state(&self) -> u8 {
        match self.machine_state {
            machine_state::CYCLE => match self.cycle_state {
                cycle_state::HOMING => combined_state::HOMING,
                cycle_state::PROBE => combined_state::PROBE,
                cycle_state::JOG => combined_state::JOG,
                _ if self.hold_state != 0 => combined_state::HOLD,
                _ if self.motion_state == motion_state::RUN => combined_state::RUN,
                _ => combined_state::CYCLE,
            },
            machine_state::INTERLOCK => combined_state::INTERLOCK,
            machine_state::SHUTDOWN => combined_state::SHUTDOWN,
            machine_state::PANIC => combined_state::PANIC,
            other => other,
        }
    }

    pub fn is_inches(&self) -> bool {
        self.units_mode == UNITS_INCHES
    }

    /// Enter the alarm state unless already in a harder stop
    pub fn alarm(&mut self) {
        if !matches!(
            self.machine_state,
            machine_state::SHUTDOWN | machine_state::PANIC
        ) {
            self.machine_state = machine_state::ALARM;
        }
    }

    pub fn shutdown(&mut self) {
        if self.machine_state != machine_state::PANIC {
            self.machine_state = machine_state::SHUTDOWN;
        }
    }

    pub fn panic(&mut self) {
        self.machine_state = machine_state::PANIC;
    }

    /// Leave alarm or shutdown; panic needs a reset
    pub fn clear(&mut self) -> bool {
        match self.machine_state {
            machine_state::ALARM | machine_state::SHUTDOWN => {
                self.machine_state = machine_state::PROGRAM_STOP;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_state_cycle() {
        let mut model = ModelState::default();
        assert_eq!(model.combined_state(), combined_state::READY);

        model.machine_state = machine_state::CYCLE;
        model.motion_state = motion_state::RUN;
        assert_eq!(model.combined_state(), combined_state::RUN);

        model.hold_state = 1;
        assert_eq!(model.combined_state(), combined_state::HOLD);

        model.cycle_state = cycle_state::HOMING;
        assert_eq!(model.combined_state(), combined_state::HOMING);
    }

    #[test]
    fn test_alarm_does_not_override_panic() {
        let mut model = ModelState::default();
        model.panic();
        model.alarm();
        assert_eq!(model.machine_state, machine_state::PANIC);
        assert!(!model.clear());
    }

    #[test]
    fn test_clear_alarm() {
        let mut model = ModelState::default();
        model.alarm();
        assert_eq!(model.combined_state(), combined_state::ALARM);
        assert!(model.clear());
        assert_eq!(model.machine_state, machine_state::PROGRAM_STOP);
    }

    #[test]
    fn test_axis_cell_out_of_range() {
        let mut model = ModelState::default();
        assert!(model.cell(ModelField::MachinePosition(6)).is_none());
        assert!(model.cell(ModelField::Homed(5)).is_some());
    }
}
