//! Backing storage for every registry parameter
//!
//! Each subsystem owns a plain settings struct. The registry never holds
//! references into them; a descriptor names a [`Target`] and the registry asks
//! [`Machine::cell`] for a typed reference when a get or set runs.

pub mod axis;
pub mod diagnostics;
pub mod io;
pub mod model;
pub mod motor;
pub mod offsets;
pub mod pwm;
pub mod report;
pub mod system;

use crate::nv::NvValue;
use crate::status::Status;
use crate::units::UnitsMode;

use axis::{AxisField, AxisSettings, AXES};
use diagnostics::{DiagField, Diagnostics};
use io::{DigitalInput, InputField, INPUTS};
use model::{ModelField, ModelState};
use motor::{MotorField, MotorSettings, MOTORS};
use offsets::{Offsets, COORD_SYSTEMS};
use pwm::{PwmChannel, PwmField};
use report::{StatusReportSettings, UserData, JOB_ID_WORDS};
use system::{
    CommField, CommSettings, CoolantField, CoolantSettings, SpindleField, SpindleSettings,
    SystemField, SystemSettings,
};

/// Typed mutable reference to one backing value
#[derive(Debug)]
pub enum Cell<'a> {
    Float(&'a mut f32),
    Byte(&'a mut u8),
    Int8(&'a mut i8),
    /// Unsigned 32-bit counter or index
    Word(&'a mut u32),
    /// Opaque 32-bit blob (user data, job id)
    Data(&'a mut u32),
}

impl Cell<'_> {
    /// Current value in transport form
    pub fn read(&self) -> NvValue {
        match self {
            Cell::Float(v) => NvValue::Float(**v),
            Cell::Byte(v) => NvValue::Int(**v as i64),
            Cell::Int8(v) => NvValue::Int(**v as i64),
            Cell::Word(v) => NvValue::Int(**v as i64),
            Cell::Data(v) => NvValue::Data(**v),
        }
    }

    /// Store `value`, checking it fits the cell
    ///
    /// Nothing is written unless the whole value is accepted.
    pub fn write(&mut self, value: &NvValue) -> Status {
        match self {
            Cell::Float(target) => match value.as_f32() {
                Some(v) => **target = v,
                None => return Status::ValueTypeError,
            },
            Cell::Byte(target) => match integer_in(value, 0, u8::MAX as i64) {
                Ok(v) => **target = v as u8,
                Err(status) => return status,
            },
            Cell::Int8(target) => match integer_in(value, i8::MIN as i64, i8::MAX as i64) {
                Ok(v) => **target = v as i8,
                Err(status) => return status,
            },
            Cell::Word(target) => match integer_in(value, 0, u32::MAX as i64) {
                Ok(v) => **target = v as u32,
                Err(status) => return status,
            },
            Cell::Data(target) => match value {
                NvValue::Data(bits) => **target = *bits,
                other => match integer_in(other, 0, u32::MAX as i64) {
                    Ok(v) => **target = v as u32,
                    Err(status) => return status,
                },
            },
        }
        Status::Ok
    }
}

impl<'a> Cell<'a> {
    /// Float reference, if the cell holds one
    pub fn into_float(self) -> Option<&'a mut f32> {
        match self {
            Cell::Float(v) => Some(v),
            _ => None,
        }
    }
}

fn integer_in(value: &NvValue, min: i64, max: i64) -> Result<i64, Status> {
    let v = value.as_i64().ok_or(Status::ValueTypeError)?;
    if v < min || v > max {
        return Err(Status::InputValueUnsupported);
    }
    Ok(v)
}

/// Location of a parameter's backing value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// No storage; pure actions and computed read-outs
    Null,
    System(SystemField),
    Spindle(SpindleField),
    Coolant(CoolantField),
    Comm(CommField),
    Model(ModelField),
    Motor(u8, MotorField),
    Axis(u8, AxisField),
    Input(u8, InputField),
    Pwm(PwmField),
    /// Work offset, indexed (coordinate system, axis)
    CoordOffset(u8, u8),
    OriginOffset(u8),
    G28(u8),
    G30(u8),
    JobId(u8),
    /// User data word, indexed (group, word)
    UserData(u8, u8),
    StatusSlot(u8),
    Diagnostic(DiagField, u8),
}

/// All backing storage reachable from the registry
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub system: SystemSettings,
    pub spindle: SpindleSettings,
    pub coolant: CoolantSettings,
    pub comm: CommSettings,
    pub model: ModelState,
    pub motors: [MotorSettings; MOTORS],
    pub axes: [AxisSettings; AXES],
    pub inputs: [DigitalInput; INPUTS],
    pub pwm: PwmChannel,
    pub offsets: Offsets,
    pub status_report: StatusReportSettings,
    pub user_data: UserData,
    pub job_id: [u32; JOB_ID_WORDS],
    pub diagnostics: Diagnostics,
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            system: SystemSettings::default(),
            spindle: SpindleSettings::default(),
            coolant: CoolantSettings::default(),
            comm: CommSettings::default(),
            model: ModelState::default(),
            motors: core::array::from_fn(MotorSettings::for_motor),
            axes: core::array::from_fn(AxisSettings::for_axis),
            inputs: core::array::from_fn(DigitalInput::for_channel),
            pwm: PwmChannel::default(),
            offsets: Offsets::default(),
            status_report: StatusReportSettings::default(),
            user_data: [[0; report::USER_DATA_WORDS]; report::USER_DATA_GROUPS],
            job_id: [0; JOB_ID_WORDS],
            diagnostics: Diagnostics::default(),
        }
    }
}

impl Machine {
    /// Typed reference to the value behind `target`
    ///
    /// Returns None for [`Target::Null`] and for out-of-range channels.
    pub fn cell(&mut self, target: Target) -> Option<Cell<'_>> {
        let cell = match target {
            Target::Null => return None,
            Target::System(field) => self.system.cell(field),
            Target::Spindle(field) => self.spindle.cell(field),
            Target::Coolant(field) => self.coolant.cell(field),
            Target::Comm(field) => self.comm.cell(field),
            Target::Model(field) => return self.model.cell(field),
            Target::Motor(motor, field) => self.motors.get_mut(motor as usize)?.cell(field),
            Target::Axis(axis, field) => self.axes.get_mut(axis as usize)?.cell(field),
            Target::Input(channel, field) => self.inputs.get_mut(channel as usize)?.cell(field),
            Target::Pwm(field) => self.pwm.cell(field),
            Target::CoordOffset(system, axis) => Cell::Float(
                self.offsets
                    .coord
                    .get_mut(system as usize)?
                    .get_mut(axis as usize)?,
            ),
            Target::OriginOffset(axis) => Cell::Float(self.offsets.origin.get_mut(axis as usize)?),
            Target::G28(axis) => Cell::Float(self.offsets.g28.get_mut(axis as usize)?),
            Target::G30(axis) => Cell::Float(self.offsets.g30.get_mut(axis as usize)?),
            Target::JobId(word) => Cell::Data(self.job_id.get_mut(word as usize)?),
            Target::UserData(group, word) => Cell::Data(
                self.user_data
                    .get_mut(group as usize)?
                    .get_mut(word as usize)?,
            ),
            Target::StatusSlot(slot) => {
                Cell::Word(self.status_report.slots.get_mut(slot as usize)?)
            }
            Target::Diagnostic(field, channel) => {
                Cell::Float(self.diagnostics.value_mut(field, channel as usize)?)
            }
        };
        Some(cell)
    }

    /// Read the value behind `target` without mutating it
    pub fn read(&mut self, target: Target) -> Option<NvValue> {
        self.cell(target).map(|cell| cell.read())
    }

    /// Active G20/G21 mode of the model
    pub fn units_mode(&self) -> UnitsMode {
        if self.model.is_inches() {
            UnitsMode::Inches
        } else {
            UnitsMode::Millimeters
        }
    }

    /// Active work offset of one axis, including G92 when enabled
    pub fn work_offset(&self, axis: usize) -> f32 {
        let coord = self.model.coord_system as usize;
        let mut offset = if (1..=COORD_SYSTEMS).contains(&coord) {
            self.offsets.coord[coord - 1].get(axis).copied().unwrap_or(0.0)
        } else {
            0.0
        };
        if self.model.origin_offset_enable != 0 {
            offset += self.offsets.origin.get(axis).copied().unwrap_or(0.0);
        }
        offset
    }

    /// Position of one axis in work coordinates
    pub fn work_position(&self, axis: usize) -> f32 {
        let machine = self.model.position.get(axis).copied().unwrap_or(0.0);
        machine - self.work_offset(axis)
    }
}
