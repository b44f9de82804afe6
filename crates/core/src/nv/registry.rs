//! Registry: boundaries, token resolution and get/set dispatch

use core::fmt::Write;

use heapless::String;

use super::descriptor::{Action, Descriptor, EntryKind, GetOp, NvFlags, SetOp};
use super::groups::{self, group_is_prefixed};
use super::object::{add_conditional_message, truncated, MessageQueue, NvList, NvObj, NvValue};
use super::print::Responder;
use super::table::{self, Table};
use super::{Index, TableError, GROUP_LEN, NV_STRING_LEN, TOKEN_LEN, TOKEN_SIGNIFICANT};
use crate::capabilities::Capabilities;
use crate::machine::axis::{is_rotary, AXIS_MODE_MAX_LINEAR, AXIS_MODE_MAX_ROTARY, JERK_MULTIPLIER};
use crate::machine::io::{IO_ACTION_MAX, IO_FUNCTION_MAX, IO_MODE_DISABLED, IO_MODE_MAX};
use crate::machine::model::{JogRequest, UNITS_MM};
use crate::machine::motor::{MotorField, POWER_MODE_MAX, STANDARD_MICROSTEPS};
use crate::machine::pwm::PwmChannel;
use crate::machine::report::{DEFAULT_STATUS_TOKENS, SLOT_UNUSED, STATUS_REPORT_LEN};
use crate::machine::system::{
    BAUD_RATES, FLOW_CONTROL_MAX, HARDWARE_VERSION_MAX, JSON_VERBOSITY_MAX,
    JUNCTION_AGGRESSION_MAX, JUNCTION_AGGRESSION_MIN, MOTOR_TIMEOUT_MAX, MOTOR_TIMEOUT_MIN,
    OVERRIDE_MAX, OVERRIDE_MIN, STATUS_INTERVAL_MIN_MS,
};
use crate::machine::{Machine, Target};
use crate::status::Status;
use crate::units::{round_to, set_flu, UnitsMode, MM_PER_INCH};

/// Partition an index falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Single,
    Group,
    UberGroup,
}

/// Partition boundaries derived from the table
///
/// Singles occupy `0..start_of_groups`, with the status report slot run at
/// `end_of_singles..start_of_groups`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries {
    /// Entries in the table
    pub max: Index,
    /// First status report slot
    pub end_of_singles: Index,
    pub start_of_groups: Index,
    pub start_of_uber_groups: Index,
    pub status_report_len: Index,
}

impl Boundaries {
    /// Derive boundaries from entry kinds
    ///
    /// # Errors
    ///
    /// `PartitionOrder` when kinds appear out of order, `StatusReportRun` when
    /// the slot run is split or not exactly [`STATUS_REPORT_LEN`] long.
    pub fn from_table(table: &[Descriptor]) -> Result<Self, TableError> {
        let mut counts = [0 as Index; 4];
        let mut previous = 0;
        for (i, desc) in table.iter().enumerate() {
            let current = rank(desc.kind);
            if current < previous {
                return Err(if previous == rank(EntryKind::StatusSlot) {
                    TableError::StatusReportRun
                } else {
                    TableError::PartitionOrder(i as Index)
                });
            }
            previous = current;
            counts[current] += 1;
        }
        if counts[1] as usize != STATUS_REPORT_LEN {
            return Err(TableError::StatusReportRun);
        }
        let start_of_groups = counts[0] + counts[1];
        Ok(Self {
            max: table.len() as Index,
            end_of_singles: counts[0],
            start_of_groups,
            start_of_uber_groups: start_of_groups + counts[2],
            status_report_len: counts[1],
        })
    }

    pub fn is_single(&self, index: Index) -> bool {
        index < self.start_of_groups
    }

    pub fn is_group(&self, index: Index) -> bool {
        index >= self.start_of_groups && index < self.start_of_uber_groups
    }

    pub fn is_uber_group(&self, index: Index) -> bool {
        index >= self.start_of_uber_groups && index < self.max
    }

    /// True below the first group marker
    pub fn lt_groups(&self, index: Index) -> bool {
        index < self.start_of_groups
    }

    /// Partition of an in-range index; out-of-range indices classify as uber-groups
    pub fn classify(&self, index: Index) -> Partition {
        if self.is_single(index) {
            Partition::Single
        } else if self.is_group(index) {
            Partition::Group
        } else {
            Partition::UberGroup
        }
    }

    /// Slots available to persistence; a slot number is a single's index
    pub fn persisted_slot_count(&self) -> Index {
        self.start_of_groups
    }

    pub fn group_count(&self) -> Index {
        self.start_of_uber_groups - self.start_of_groups
    }

    pub fn uber_group_count(&self) -> Index {
        self.max - self.start_of_uber_groups
    }
}

fn rank(kind: EntryKind) -> usize {
    match kind {
        EntryKind::Single => 0,
        EntryKind::StatusSlot => 1,
        EntryKind::Group => 2,
        EntryKind::UberGroup => 3,
    }
}

/// Characters of `token` that take part in resolution
fn significant(token: &str) -> &str {
    token.get(..TOKEN_SIGNIFICANT).unwrap_or(token)
}

fn number(nv: &NvObj) -> Result<f32, Status> {
    nv.value.as_f32().ok_or(Status::ValueTypeError)
}

fn integer(nv: &NvObj) -> Result<i64, Status> {
    nv.value.as_i64().ok_or(Status::ValueTypeError)
}

fn integer_within(nv: &NvObj, min: i64, max: i64) -> Result<i64, Status> {
    let value = integer(nv)?;
    if value < min || value > max {
        return Err(Status::InputValueUnsupported);
    }
    Ok(value)
}

fn number_within(nv: &NvObj, min: f32, max: f32) -> Result<f32, Status> {
    let value = number(nv)?;
    if !(min..=max).contains(&value) {
        return Err(Status::InputValueUnsupported);
    }
    Ok(value)
}

/// Scale a length given in the active unit mode to millimeters
fn to_canonical(desc: &Descriptor, units: UnitsMode, value: f32) -> f32 {
    if desc.flags.contains(NvFlags::CONVERT) && units.is_inches() {
        value * MM_PER_INCH
    } else {
        value
    }
}

/// The parameter registry
///
/// Owns the descriptor table for one capability set. Immutable once built;
/// every operation takes the backing [`Machine`] explicitly.
#[derive(Debug, Clone)]
pub struct Registry {
    table: Table,
    bounds: Boundaries,
    caps: Capabilities,
}

impl Registry {
    /// Build and validate the table for `caps`
    ///
    /// # Errors
    ///
    /// Any [`TableError`] found while building or checking the table.
    pub fn new(caps: Capabilities) -> Result<Self, TableError> {
        let table = table::build(&caps)?;
        let bounds = Boundaries::from_table(&table)?;
        let registry = Self {
            table,
            bounds,
            caps,
        };
        registry.validate()?;
        Ok(registry)
    }

    /// Check token uniqueness and group structure
    fn validate(&self) -> Result<(), TableError> {
        let (start, end) = (self.bounds.start_of_groups, self.bounds.start_of_uber_groups);
        let groups = &self.table[start as usize..end as usize];
        for (i, desc) in self.table.iter().enumerate() {
            let index = i as Index;
            let marker = matches!(desc.kind, EntryKind::Group | EntryKind::UberGroup);
            if marker && !desc.group.is_empty() {
                return Err(TableError::NestedGroup(index));
            }
            let known = groups.iter().any(|g| g.token.as_str() == desc.group.as_str());
            if !desc.group.is_empty() && !known {
                return Err(TableError::MissingGroup(index));
            }
            for earlier in &self.table[..i] {
                if earlier.token == desc.token {
                    return Err(TableError::DuplicateToken(index));
                }
                if significant(&earlier.token) == significant(&desc.token) {
                    return Err(TableError::Shadowed(index));
                }
            }
        }
        Ok(())
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.bounds
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn descriptor(&self, index: Index) -> Option<&Descriptor> {
        self.table.get(index as usize)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = (Index, &Descriptor)> {
        self.table.iter().enumerate().map(|(i, d)| (i as Index, d))
    }

    /// Resolve `(group, token)` to a table index
    ///
    /// A prefixed group is prepended to the token, so `("g54", "x")` finds
    /// `g54x`. Only the first [`TOKEN_SIGNIFICANT`] characters are compared.
    pub fn index_of(&self, group: &str, token: &str) -> Option<Index> {
        let mut key: String<{ GROUP_LEN + TOKEN_LEN }> = String::new();
        if !group.is_empty() && group_is_prefixed(group) {
            key.push_str(group).ok()?;
        }
        key.push_str(token).ok()?;
        let key = significant(&key);
        self.table
            .iter()
            .position(|desc| significant(&desc.token) == key)
            .map(|i| i as Index)
    }

    /// Fresh object for the entry at `index`
    pub fn object(&self, index: Index) -> NvObj {
        let mut nv = NvObj::new();
        if let Some(desc) = self.descriptor(index) {
            nv.index = Some(index);
            nv.token = desc.token.clone();
            nv.group = desc.group.clone();
            nv.precision = desc.precision;
        }
        nv
    }

    /// Fill in the object's index from its group and token
    pub fn resolve(&self, nv: &mut NvObj) -> Option<Index> {
        if nv.index.is_none() {
            nv.index = self.index_of(&nv.group, &nv.token);
        }
        nv.index
    }

    /// Read the entry named by the list's first object
    ///
    /// Groups and the status report expand into the list. Uber-groups render
    /// each member group through `responder` as they go, leaving the list
    /// untouched.
    pub fn get(
        &self,
        list: &mut NvList,
        machine: &mut Machine,
        responder: &mut dyn Responder,
    ) -> Status {
        let Some(index) = list.first_mut().and_then(|nv| self.resolve(nv)) else {
            return Status::UnrecognizedName;
        };
        let Some(desc) = self.descriptor(index) else {
            return Status::UnrecognizedName;
        };
        match desc.get {
            GetOp::Uber(uber) => groups::do_uber(self, uber, machine, responder),
            GetOp::Group => groups::get_group(self, list, machine),
            GetOp::StatusReport => self.get_status_report(list, machine),
            _ => match list.first_mut() {
                Some(nv) => self.get_nv(nv, machine),
                None => Status::InternalError,
            },
        }
    }

    /// Read one single-valued entry into `nv`
    pub fn get_nv(&self, nv: &mut NvObj, machine: &mut Machine) -> Status {
        let Some(desc) = self.resolve(nv).and_then(|i| self.descriptor(i)) else {
            return Status::UnrecognizedName;
        };
        nv.precision = desc.precision;
        nv.value = match desc.get {
            GetOp::Nul => NvValue::Null,
            GetOp::Value => match machine.read(desc.target) {
                Some(value) => value,
                None => return Status::InternalError,
            },
            GetOp::Group | GetOp::Uber(_) | GetOp::StatusReport => NvValue::Parent,
            GetOp::CombinedState => NvValue::Int(machine.model.combined_state() as i64),
            GetOp::WorkPosition(axis) => NvValue::Float(machine.work_position(axis as usize)),
            GetOp::WorkOffset(axis) => NvValue::Float(machine.work_offset(axis as usize)),
            GetOp::MotorPower(motor) => match machine.motors.get(motor as usize) {
                Some(m) => NvValue::Int(m.enabled as i64),
                None => return Status::InternalError,
            },
            GetOp::BuildString => {
                let mut text: String<NV_STRING_LEN> = String::new();
                if write!(text, "{:.2}", machine.system.fw_build).is_err() {
                    return Status::BufferFull;
                }
                NvValue::Str(text)
            }
            GetOp::DeviceId => NvValue::Str(truncated(machine.system.device_id)),
            GetOp::GcodeBlock => NvValue::Str(truncated(&machine.model.pending_gcode)),
            GetOp::Action(action) => {
                self.run_action(action, machine);
                NvValue::Null
            }
        };
        Status::Ok
    }

    /// Write the entry named by the list's first object
    ///
    /// Group writes apply each child in turn and stop at the first failure.
    pub fn set(&self, list: &mut NvList, machine: &mut Machine) -> Status {
        let Some(index) = list.first_mut().and_then(|nv| self.resolve(nv)) else {
            return Status::UnrecognizedName;
        };
        let Some(desc) = self.descriptor(index) else {
            return Status::UnrecognizedName;
        };
        match desc.set {
            SetOp::Group => groups::set_group(self, list, machine),
            SetOp::StatusReport => self.set_status_report(list, machine),
            _ => {
                let NvList { objects, messages } = list;
                match objects.first_mut() {
                    Some(nv) => self.set_nv(nv, machine, messages),
                    None => Status::InternalError,
                }
            }
        }
    }

    /// Validate and write one single-valued entry
    ///
    /// On success `nv` holds the stored value in canonical units. On failure
    /// nothing is written.
    pub fn set_nv(
        &self,
        nv: &mut NvObj,
        machine: &mut Machine,
        messages: &mut MessageQueue,
    ) -> Status {
        let Some(desc) = self.resolve(nv).and_then(|i| self.descriptor(i)) else {
            return Status::UnrecognizedName;
        };
        match self.apply(desc, nv, machine, messages) {
            Ok(status) => status,
            Err(status) => status,
        }
    }

    fn apply(
        &self,
        desc: &Descriptor,
        nv: &mut NvObj,
        machine: &mut Machine,
        messages: &mut MessageQueue,
    ) -> Result<Status, Status> {
        let units = machine.units_mode();
        match desc.set {
            SetOp::Nul => Err(Status::ParameterIsReadOnly),
            SetOp::Group | SetOp::StatusReport => Err(Status::InternalError),
            SetOp::Value => commit(desc, nv, machine),
            SetOp::FloatUnits => {
                let target = machine
                    .cell(desc.target)
                    .and_then(|cell| cell.into_float())
                    .ok_or(Status::InternalError)?;
                match set_flu(nv, desc, units, target) {
                    Status::Ok => Ok(Status::Ok),
                    status => Err(status),
                }
            }
            SetOp::Bool01 => {
                integer_within(nv, 0, 1)?;
                commit(desc, nv, machine)
            }
            SetOp::Range012 => {
                integer_within(nv, 0, 2)?;
                commit(desc, nv, machine)
            }
            SetOp::Range0123 => {
                integer_within(nv, 0, 3)?;
                commit(desc, nv, machine)
            }
            SetOp::AxisMode => {
                let Target::Axis(axis, _) = desc.target else {
                    return Err(Status::InternalError);
                };
                let max = if is_rotary(axis as usize) {
                    AXIS_MODE_MAX_ROTARY
                } else {
                    AXIS_MODE_MAX_LINEAR
                };
                integer_within(nv, 0, max as i64)?;
                commit(desc, nv, machine)
            }
            SetOp::Velocity => {
                let value = number(nv)?;
                if !value.is_finite() || value <= 0.0 {
                    return Err(Status::InputValueUnsupported);
                }
                store_float(desc, nv, machine, to_canonical(desc, units, value))
            }
            SetOp::Jerk => {
                let mut value = number(nv)?;
                if !value.is_finite() || value <= 0.0 {
                    return Err(Status::InputValueUnsupported);
                }
                // raw jerk is entered in millions
                if value > JERK_MULTIPLIER {
                    value /= JERK_MULTIPLIER;
                }
                store_float(desc, nv, machine, to_canonical(desc, units, value))
            }
            SetOp::HomingInput => {
                integer_within(nv, 0, self.caps.input_channels as i64)?;
                commit(desc, nv, machine)
            }
            SetOp::StepAngle | SetOp::PowerLevel | SetOp::TravelPerRev | SetOp::Microsteps => {
                self.set_motor(desc, nv, machine, messages, units)
            }
            SetOp::PowerMode => {
                integer_within(nv, 0, POWER_MODE_MAX as i64)?;
                let status = commit(desc, nv, machine)?;
                if let Target::Motor(motor, _) = desc.target {
                    if let Some(m) = machine.motors.get_mut(motor as usize) {
                        if m.power_mode == 0 {
                            m.enabled = false;
                        }
                    }
                }
                Ok(status)
            }
            SetOp::InputMode => {
                integer_within(nv, IO_MODE_DISABLED as i64, IO_MODE_MAX as i64)?;
                commit(desc, nv, machine)
            }
            SetOp::InputAction => {
                integer_within(nv, 0, IO_ACTION_MAX as i64)?;
                commit(desc, nv, machine)
            }
            SetOp::InputFunction => {
                integer_within(nv, 0, IO_FUNCTION_MAX as i64)?;
                commit(desc, nv, machine)
            }
            SetOp::JunctionAggression => {
                let value = number_within(nv, JUNCTION_AGGRESSION_MIN, JUNCTION_AGGRESSION_MAX)?;
                store_float(desc, nv, machine, value)
            }
            SetOp::MotorTimeout => {
                let value = number_within(nv, MOTOR_TIMEOUT_MIN, MOTOR_TIMEOUT_MAX)?;
                store_float(desc, nv, machine, value)
            }
            SetOp::OverrideFactor => {
                let value = number_within(nv, OVERRIDE_MIN, OVERRIDE_MAX)?;
                store_float(desc, nv, machine, value)
            }
            SetOp::JsonVerbosity => {
                integer_within(nv, 0, JSON_VERBOSITY_MAX as i64)?;
                commit(desc, nv, machine)
            }
            SetOp::StatusInterval => {
                let value = integer(nv)?.max(STATUS_INTERVAL_MIN_MS as i64);
                nv.value = NvValue::Int(value);
                commit(desc, nv, machine)
            }
            SetOp::FlowControl => {
                integer_within(nv, 0, FLOW_CONTROL_MAX as i64)?;
                commit(desc, nv, machine)
            }
            SetOp::Baud => {
                let rate = match integer_within(nv, 1, BAUD_RATES.len() as i64 - 1) {
                    Ok(rate) => rate as usize,
                    Err(Status::InputValueUnsupported) => {
                        add_conditional_message(
                            messages,
                            "*** WARNING *** Unsupported baud rate specified",
                        );
                        return Err(Status::InputValueUnsupported);
                    }
                    Err(status) => return Err(status),
                };
                let status = commit(desc, nv, machine)?;
                machine.comm.baud_change_pending = true;
                let mut notice: String<64> = String::new();
                let bps = BAUD_RATES[rate];
                if write!(notice, "*** NOTICE *** Resetting baud rate to {}", bps).is_ok() {
                    add_conditional_message(messages, &notice);
                }
                Ok(status)
            }
            SetOp::HardwareVersion => {
                let value = number_within(nv, 0.0, HARDWARE_VERSION_MAX)?;
                store_float(desc, nv, machine, value)
            }
            SetOp::Pwm => {
                let Target::Pwm(field) = desc.target else {
                    return Err(Status::InternalError);
                };
                let max = if PwmChannel::is_phase(field) { 1.0 } else { f32::MAX };
                let value = number_within(nv, 0.0, max)?;
                store_float(desc, nv, machine, value)
            }
            SetOp::SpindleDirection => {
                integer_within(nv, 0, 1)?;
                commit(desc, nv, machine)
            }
            SetOp::GcodeBlock => {
                let NvValue::Str(block) = &nv.value else {
                    return Err(Status::ValueTypeError);
                };
                let pending = &mut machine.model.pending_gcode;
                pending.clear();
                pending.push_str(block).map_err(|_| Status::BufferFull)?;
                Ok(Status::Ok)
            }
            SetOp::Jog(axis) => {
                let mut destination = number(nv)?;
                if !is_rotary(axis as usize) && units.is_inches() {
                    destination *= MM_PER_INCH;
                }
                machine.model.jog = Some(JogRequest { axis, destination });
                nv.value = NvValue::Float(destination);
                Ok(Status::Ok)
            }
            SetOp::Defaults => {
                if !nv.value.is_true() {
                    return Ok(Status::Noop);
                }
                Ok(self.set_defaults(machine))
            }
            SetOp::Action(action) => {
                self.run_action(action, machine);
                nv.value = NvValue::Null;
                Ok(Status::Ok)
            }
        }
    }

    /// Motor scaling inputs; steps per unit follows every change
    fn set_motor(
        &self,
        desc: &Descriptor,
        nv: &mut NvObj,
        machine: &mut Machine,
        messages: &mut MessageQueue,
        units: UnitsMode,
    ) -> Result<Status, Status> {
        let Target::Motor(motor, field) = desc.target else {
            return Err(Status::InternalError);
        };
        let status = match field {
            MotorField::StepAngle => {
                let value = number(nv)?;
                if !value.is_finite() || value <= 0.0 {
                    return Err(Status::InputValueUnsupported);
                }
                store_float(desc, nv, machine, value)?
            }
            MotorField::TravelPerRev => {
                let value = number(nv)?;
                if !value.is_finite() || value <= 0.0 {
                    return Err(Status::InputValueUnsupported);
                }
                store_float(desc, nv, machine, to_canonical(desc, units, value))?
            }
            MotorField::Microsteps => {
                let value = integer_within(nv, 1, u8::MAX as i64)?;
                if !STANDARD_MICROSTEPS.contains(&(value as u8)) {
                    add_conditional_message(
                        messages,
                        "*** WARNING *** Setting non-standard microstep value",
                    );
                }
                commit(desc, nv, machine)?
            }
            MotorField::PowerLevel => {
                let value = number_within(nv, 0.0, 1.0)?;
                store_float(desc, nv, machine, value)?
            }
            _ => return Err(Status::InternalError),
        };
        if let Some(m) = machine.motors.get_mut(motor as usize) {
            m.recompute_steps_per_unit();
        }
        Ok(status)
    }

    fn run_action(&self, action: Action, machine: &mut Machine) {
        match action {
            Action::Alarm => machine.model.alarm(),
            Action::Panic => machine.model.panic(),
            Action::Shutdown => machine.model.shutdown(),
            Action::Clear => {
                machine.model.clear();
            }
            Action::MotorsEnable => {
                for motor in machine.motors.iter_mut().take(self.caps.motors as usize) {
                    motor.enabled = motor.power_mode != 0;
                }
            }
            Action::MotorsDisable => {
                for motor in machine.motors.iter_mut() {
                    motor.enabled = false;
                }
            }
            Action::QueueFlush => machine.model.queue_flush_requested = true,
            Action::ClearCounters => machine.diagnostics.clear_counters(),
            Action::DumpModel => machine.diagnostics.dump_requested = true,
            Action::Bootloader => machine.system.bootloader_requested = true,
        }
    }

    /// Expand the configured status report members
    fn get_status_report(&self, list: &mut NvList, machine: &mut Machine) -> Status {
        let Some(parent) = list.first_mut() else {
            return Status::InternalError;
        };
        parent.value = NvValue::Parent;
        list.truncate_children();
        let members = machine.status_report.slots;
        for index in members.iter().copied().filter(|&s| s != SLOT_UNUSED) {
            let mut nv = self.object(index as Index);
            nv.depth = 1;
            let status = self.get_nv(&mut nv, machine);
            if status.is_error() {
                return status;
            }
            if list.push(nv).is_err() {
                return Status::BufferFull;
            }
        }
        Status::Ok
    }

    /// Replace the status report members with the list's true children
    fn set_status_report(&self, list: &mut NvList, machine: &mut Machine) -> Status {
        let mut chosen: heapless::Vec<u32, STATUS_REPORT_LEN> = heapless::Vec::new();
        for child in list.objects.iter_mut().skip(1) {
            let Some(index) = self.index_of("", &child.token) else {
                return Status::UnrecognizedName;
            };
            child.index = Some(index);
            let reportable = self
                .descriptor(index)
                .is_some_and(|d| d.flags.contains(NvFlags::STATUS_REPORT));
            if !reportable {
                return Status::InputValueUnsupported;
            }
            if child.value.is_true() && chosen.push(index as u32).is_err() {
                return Status::BufferFull;
            }
        }
        machine.status_report.clear();
        for index in chosen {
            machine.status_report.push(index);
        }
        Status::Ok
    }

    /// Write `nv` holding a value already in canonical units
    ///
    /// Setters run with the unit mode forced to millimeters. Entries without a
    /// setter are written straight to their cell, so read-only values such as
    /// the firmware build can be restored too. Jerk is stored as given,
    /// skipping the scaling applied to entered values.
    pub fn set_canonical(
        &self,
        nv: &mut NvObj,
        machine: &mut Machine,
        messages: &mut MessageQueue,
    ) -> Status {
        let Some(desc) = self.resolve(nv).and_then(|i| self.descriptor(i)) else {
            return Status::UnrecognizedName;
        };
        let saved_units = machine.model.units_mode;
        machine.model.units_mode = UNITS_MM;
        let status = match desc.set {
            SetOp::Nul => match machine.cell(desc.target) {
                Some(mut cell) => cell.write(&nv.value),
                None => Status::InternalError,
            },
            // stored jerk is already scaled
            SetOp::Jerk => match nv.value.as_f32() {
                Some(value) if value.is_finite() && value > 0.0 => {
                    match store_float(desc, nv, machine, value) {
                        Ok(status) | Err(status) => status,
                    }
                }
                _ => Status::InputValueUnsupported,
            },
            _ => self.set_nv(nv, machine, messages),
        };
        machine.model.units_mode = saved_units;
        status
    }

    /// Restore every initialized entry to its default
    ///
    /// Defaults are canonical, so setters run with the unit mode forced to
    /// millimeters. The status report is reset to its default members.
    /// Returns the first failing status, if any.
    pub fn set_defaults(&self, machine: &mut Machine) -> Status {
        let mut messages = MessageQueue::new();
        let mut result = Status::Ok;
        for (index, desc) in self.descriptors() {
            if !desc.is_initialized() {
                continue;
            }
            let mut nv = self.object(index);
            nv.value = NvValue::Float(desc.default);
            let status = self.set_canonical(&mut nv, machine, &mut messages);
            if status.is_error() && result == Status::Ok {
                result = status;
            }
        }

        machine.status_report.clear();
        for token in DEFAULT_STATUS_TOKENS {
            if let Some(index) = self.index_of("", token) {
                machine.status_report.push(index as u32);
            }
        }
        result
    }

    /// True when the entry at `index` holds its factory default
    ///
    /// Values are compared at display precision, so a default that went
    /// through an inch round trip still matches. Entries without a default
    /// always compare equal.
    pub fn is_factory_default(&self, index: Index, machine: &mut Machine) -> bool {
        let Some(desc) = self.descriptor(index) else {
            return false;
        };
        if !desc.is_initialized() {
            return true;
        }
        match machine.read(desc.target).and_then(|v| v.as_f32()) {
            Some(value) => {
                round_to(value, desc.precision) == round_to(desc.default, desc.precision)
            }
            None => true,
        }
    }
}

/// Write `nv.value` through the cell and echo back what was stored
fn commit(desc: &Descriptor, nv: &mut NvObj, machine: &mut Machine) -> Result<Status, Status> {
    let mut cell = machine.cell(desc.target).ok_or(Status::InternalError)?;
    match cell.write(&nv.value) {
        Status::Ok => {
            nv.value = cell.read();
            nv.precision = desc.precision;
            Ok(Status::Ok)
        }
        status => Err(status),
    }
}

fn store_float(
    desc: &Descriptor,
    nv: &mut NvObj,
    machine: &mut Machine,
    value: f32,
) -> Result<Status, Status> {
    let target = machine
        .cell(desc.target)
        .and_then(|cell| cell.into_float())
        .ok_or(Status::InternalError)?;
    *target = value;
    nv.value = NvValue::Float(value);
    nv.precision = desc.precision;
    Ok(Status::Ok)
}
