//! Axis settings
//!
//! Per-axis kinematic limits and homing configuration. Linear axes (X, Y, Z)
//! are stored in millimeters; rotary axes (A, B, C) in degrees.

use super::Cell;

/// Number of axes
pub const AXES: usize = 6;

/// Axis letters in table order
pub const AXIS_LETTERS: [&str; AXES] = ["x", "y", "z", "a", "b", "c"];

/// Index of the first rotary axis
pub const AXIS_A: usize = 3;

/// Highest axis mode accepted by a linear axis (0=disabled, 1=standard, 2=inhibited)
pub const AXIS_MODE_MAX_LINEAR: u8 = 2;

/// Highest axis mode accepted by a rotary axis (adds 3=radius)
pub const AXIS_MODE_MAX_ROTARY: u8 = 3;

/// Entered jerk values above this are taken to be unscaled and divided down
pub const JERK_MULTIPLIER: f32 = 1_000_000.0;

const DEFAULT_LINEAR_VELOCITY_MAX: f32 = 16_000.0;
const DEFAULT_Z_VELOCITY_MAX: f32 = 1_200.0;
const DEFAULT_LINEAR_JERK_MAX: f32 = 5_000.0;
const DEFAULT_Z_JERK_MAX: f32 = 500.0;
const DEFAULT_LINEAR_TRAVEL_MAX: [f32; 3] = [150.0, 75.0, 0.0];
const DEFAULT_LINEAR_TRAVEL_MIN: [f32; 3] = [0.0, 0.0, -95.0];
const DEFAULT_HOMING_INPUTS: [u8; AXES] = [1, 3, 6, 0, 0, 0];
const DEFAULT_SEARCH_VELOCITY: f32 = 3_000.0;
const DEFAULT_LATCH_VELOCITY: f32 = 100.0;
const DEFAULT_LATCH_BACKOFF: f32 = 4.0;
const DEFAULT_ZERO_BACKOFF: f32 = 2.0;

const DEFAULT_ROTARY_VELOCITY_MAX: f32 = 172_800.0;
const DEFAULT_ROTARY_FEEDRATE_MAX: f32 = 48_000.0;
const DEFAULT_ROTARY_JERK_MAX: f32 = 48_000.0;
const DEFAULT_ROTARY_RADIUS: f32 = 5.3052;
const DEFAULT_ROTARY_SEARCH_VELOCITY: f32 = 600.0;
const DEFAULT_ROTARY_LATCH_VELOCITY: f32 = 100.0;
const DEFAULT_ROTARY_LATCH_BACKOFF: f32 = 5.0;

/// True for A, B and C
pub fn is_rotary(axis: usize) -> bool {
    axis >= AXIS_A
}

/// Addressable axis fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisField {
    Mode,
    VelocityMax,
    FeedrateMax,
    TravelMin,
    TravelMax,
    JerkMax,
    JerkHigh,
    Radius,
    HomingInput,
    HomingDir,
    SearchVelocity,
    LatchVelocity,
    LatchBackoff,
    ZeroBackoff,
}

/// Settings for one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSettings {
    pub axis_mode: u8,
    pub velocity_max: f32,
    pub feedrate_max: f32,
    pub travel_min: f32,
    pub travel_max: f32,
    /// Maximum jerk in millions of units/min^3
    pub jerk_max: f32,
    /// Jerk used for homing and feedhold
    pub jerk_high: f32,
    /// Radius used to convert linear feed to rotary motion in radius mode
    pub radius: f32,
    /// Input channel used for homing, 0 = none
    pub homing_input: u8,
    /// 0 = search toward minimum, 1 = toward maximum
    pub homing_dir: u8,
    pub search_velocity: f32,
    pub latch_velocity: f32,
    pub latch_backoff: f32,
    pub zero_backoff: f32,
}

impl AxisSettings {
    /// Factory settings for an axis index
    pub fn for_axis(axis: usize) -> Self {
        if is_rotary(axis) {
            Self::rotary(axis)
        } else {
            Self::linear(axis)
        }
    }

    fn linear(axis: usize) -> Self {
        let (velocity, jerk) = if axis == 2 {
            (DEFAULT_Z_VELOCITY_MAX, DEFAULT_Z_JERK_MAX)
        } else {
            (DEFAULT_LINEAR_VELOCITY_MAX, DEFAULT_LINEAR_JERK_MAX)
        };
        Self {
            axis_mode: 1,
            velocity_max: velocity,
            feedrate_max: velocity,
            travel_min: DEFAULT_LINEAR_TRAVEL_MIN[axis],
            travel_max: DEFAULT_LINEAR_TRAVEL_MAX[axis],
            jerk_max: jerk,
            jerk_high: jerk * 2.0,
            radius: 0.0,
            homing_input: DEFAULT_HOMING_INPUTS[axis],
            homing_dir: if axis == 2 { 1 } else { 0 },
            search_velocity: DEFAULT_SEARCH_VELOCITY.min(velocity),
            latch_velocity: DEFAULT_LATCH_VELOCITY,
            latch_backoff: DEFAULT_LATCH_BACKOFF,
            zero_backoff: DEFAULT_ZERO_BACKOFF,
        }
    }

    fn rotary(axis: usize) -> Self {
        Self {
            // only A is enabled out of the box
            axis_mode: if axis == AXIS_A { 1 } else { 0 },
            velocity_max: DEFAULT_ROTARY_VELOCITY_MAX,
            feedrate_max: DEFAULT_ROTARY_FEEDRATE_MAX,
            travel_min: -1.0,
            travel_max: -1.0,
            jerk_max: DEFAULT_ROTARY_JERK_MAX,
            jerk_high: DEFAULT_ROTARY_JERK_MAX,
            radius: DEFAULT_ROTARY_RADIUS,
            homing_input: DEFAULT_HOMING_INPUTS[axis],
            homing_dir: 0,
            search_velocity: DEFAULT_ROTARY_SEARCH_VELOCITY,
            latch_velocity: DEFAULT_ROTARY_LATCH_VELOCITY,
            latch_backoff: DEFAULT_ROTARY_LATCH_BACKOFF,
            zero_backoff: DEFAULT_ZERO_BACKOFF,
        }
    }

    /// Typed reference to one field
    pub fn cell(&mut self, field: AxisField) -> Cell<'_> {
        match field {
            AxisField::Mode => Cell::Byte(&mut self.axis_mode),
            AxisField::VelocityMax => Cell::Float(&mut self.velocity_max),
            AxisField::FeedrateMax => Cell::Float(&mut self.feedrate_max),
            AxisField::TravelMin => Cell::Float(&mut self.travel_min),
            AxisField::TravelMax => Cell::Float(&mut self.travel_max),
            AxisField::JerkMax => Cell::Float(&mut self.jerk_max),
            AxisField::JerkHigh => Cell::Float(&mut self.jerk_high),
            AxisField::Radius => Cell::Float(&mut self.radius),
            AxisField::HomingInput => Cell::Byte(&mut self.homing_input),
            AxisField::HomingDir => Cell::Byte(&mut self.homing_dir),
            AxisField::SearchVelocity => Cell::Float(&mut self.search_velocity),
            AxisField::LatchVelocity => Cell::Float(&mut self.latch_velocity),
            AxisField::LatchBackoff => Cell::Float(&mut self.latch_backoff),
            AxisField::ZeroBackoff => Cell::Float(&mut self.zero_backoff),
        }
    }

    /// Validate settings
    ///
    /// # Returns
    ///
    /// true if mode and limits are consistent
    pub fn is_valid(&self, axis: usize) -> bool {
        let max_mode = if is_rotary(axis) {
            AXIS_MODE_MAX_ROTARY
        } else {
            AXIS_MODE_MAX_LINEAR
        };
        if self.axis_mode > max_mode {
            return false;
        }
        self.velocity_max > 0.0 && self.feedrate_max > 0.0 && self.jerk_max > 0.0
    }
}
