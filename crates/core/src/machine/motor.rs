//! Motor settings
//!
//! Electrical and mechanical configuration for each stepper channel. The
//! steps-per-unit factor used by the step generator is derived from step
//! angle, travel per revolution and microstepping, and is recomputed
//! whenever one of those changes.

use super::Cell;

/// Motor channels addressable by the table
pub const MOTORS: usize = 6;

/// Microstep settings the drivers support natively
pub const STANDARD_MICROSTEPS: [u8; 8] = [1, 2, 4, 8, 16, 32, 64, 128];

/// Highest power mode (0=disabled, 1=always on, 2=on in cycle, 3=on when moving)
pub const POWER_MODE_MAX: u8 = 3;

const DEFAULT_STEP_ANGLE: f32 = 1.8;
const DEFAULT_TRAVEL_PER_REV: f32 = 1.25;
const DEFAULT_ROTARY_TRAVEL_PER_REV: f32 = 360.0;
const DEFAULT_MICROSTEPS: u8 = 8;
const DEFAULT_POWER_MODE: u8 = 2;
const DEFAULT_POWER_LEVEL: f32 = 0.375;

/// Addressable motor fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorField {
    Map,
    StepAngle,
    TravelPerRev,
    Microsteps,
    Polarity,
    PowerMode,
    PowerLevel,
}

/// Settings for one motor channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorSettings {
    /// Axis this motor drives (0=X .. 5=C)
    pub motor_map: u8,
    /// Degrees per whole step
    pub step_angle: f32,
    /// Linear travel (mm) or rotation (deg) per motor revolution
    pub travel_rev: f32,
    pub microsteps: u8,
    /// 0 = normal, 1 = reversed
    pub polarity: u8,
    pub power_mode: u8,
    /// Fraction of full current, 0.0 - 1.0
    pub power_level: f32,
    /// Derived: microsteps per mm or degree
    pub steps_per_unit: f32,
    /// Live enable state
    pub enabled: bool,
}

impl MotorSettings {
    /// Factory settings for a zero-based motor index
    pub fn for_motor(motor: usize) -> Self {
        let map = motor.min(5) as u8;
        let travel = if map >= 3 {
            DEFAULT_ROTARY_TRAVEL_PER_REV
        } else {
            DEFAULT_TRAVEL_PER_REV
        };
        let mut settings = Self {
            motor_map: map,
            step_angle: DEFAULT_STEP_ANGLE,
            travel_rev: travel,
            microsteps: DEFAULT_MICROSTEPS,
            polarity: 0,
            power_mode: DEFAULT_POWER_MODE,
            power_level: DEFAULT_POWER_LEVEL,
            steps_per_unit: 0.0,
            enabled: false,
        };
        settings.recompute_steps_per_unit();
        settings
    }

    /// Recompute the derived steps-per-unit factor
    ///
    /// Leaves the previous value in place if any input is zero.
    pub fn recompute_steps_per_unit(&mut self) {
        let denominator = self.travel_rev * self.step_angle;
        if denominator > 0.0 && self.microsteps > 0 {
            self.steps_per_unit = (360.0 * self.microsteps as f32) / denominator;
        }
    }

    /// Typed reference to one field
    pub fn cell(&mut self, field: MotorField) -> Cell<'_> {
        match field {
            MotorField::Map => Cell::Byte(&mut self.motor_map),
            MotorField::StepAngle => Cell::Float(&mut self.step_angle),
            MotorField::TravelPerRev => Cell::Float(&mut self.travel_rev),
            MotorField::Microsteps => Cell::Byte(&mut self.microsteps),
            MotorField::Polarity => Cell::Byte(&mut self.polarity),
            MotorField::PowerMode => Cell::Byte(&mut self.power_mode),
            MotorField::PowerLevel => Cell::Float(&mut self.power_level),
        }
    }
}
