//! Parameter descriptors
//!
//! One immutable record per table entry. The get, set and print behavior of an
//! entry is a tagged variant chosen when the table is built; the registry
//! dispatches on it with a `match`.

use bitflags::bitflags;

use super::object::{truncated, Group, Token};
use super::{TableError, GROUP_LEN, TOKEN_LEN};
use crate::machine::Target;
use crate::units::UnitsMode;

bitflags! {
    /// Capability bits of a table entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NvFlags: u8 {
        /// Seeded from the default on first run and by `$defa`
        const INITIALIZE = 0b0000_0001;
        /// Written to flash when set
        const PERSIST = 0b0000_0010;
        /// Group prefix is kept on the token when listed as a group member
        const NOSTRIP = 0b0000_0100;
        /// Value is a length subject to inch conversion
        const CONVERT = 0b0000_1000;
        /// May be selected as a status report member
        const STATUS_REPORT = 0b0001_0000;
    }
}

impl NvFlags {
    pub const F0: Self = Self::empty();
    pub const FI: Self = Self::INITIALIZE;
    pub const FP: Self = Self::PERSIST;
    pub const FN: Self = Self::NOSTRIP;
    pub const FIC: Self = Self::INITIALIZE.union(Self::CONVERT);
    pub const FIP: Self = Self::INITIALIZE.union(Self::PERSIST);
    pub const FIPC: Self = Self::FIP.union(Self::CONVERT);
    pub const FIPN: Self = Self::FIP.union(Self::NOSTRIP);
    pub const FIPNC: Self = Self::FIPN.union(Self::CONVERT);
    /// Read-only status value
    pub const FS: Self = Self::STATUS_REPORT;
}

/// Partition an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Single,
    /// Member of the persisted status report slot run (tail of the singles)
    StatusSlot,
    Group,
    UberGroup,
}

/// Display-only aggregations of groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UberGroup {
    Motors,
    Axes,
    Offsets,
    Inputs,
    All,
}

/// Side effects triggered by reading or writing an action entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Alarm,
    Panic,
    Shutdown,
    Clear,
    MotorsEnable,
    MotorsDisable,
    QueueFlush,
    ClearCounters,
    DumpModel,
    Bootloader,
}

/// How a value is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOp {
    /// Nothing to read
    Nul,
    /// Read the target cell
    Value,
    /// Expand the group named by the token
    Group,
    Uber(UberGroup),
    CombinedState,
    WorkPosition(u8),
    WorkOffset(u8),
    /// Live enable state of a motor
    MotorPower(u8),
    /// Expand the configured status report members
    StatusReport,
    /// Firmware build as text
    BuildString,
    DeviceId,
    /// Pending G-code block
    GcodeBlock,
    /// Reading performs the action too
    Action(Action),
}

/// How a value is validated and written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// Read-only
    Nul,
    /// Write the target cell within its type's range
    Value,
    /// Float in external units
    FloatUnits,
    Bool01,
    Range012,
    Range0123,
    Group,
    StatusReport,
    AxisMode,
    /// Positive velocity, converted when flagged
    Velocity,
    /// Jerk in millions; raw entries above the multiplier are scaled down
    Jerk,
    HomingInput,
    /// Motor scaling inputs; steps per unit is recomputed
    StepAngle,
    TravelPerRev,
    Microsteps,
    PowerMode,
    PowerLevel,
    InputMode,
    InputAction,
    InputFunction,
    JunctionAggression,
    MotorTimeout,
    OverrideFactor,
    JsonVerbosity,
    StatusInterval,
    FlowControl,
    Baud,
    HardwareVersion,
    Pwm,
    SpindleDirection,
    GcodeBlock,
    Jog(u8),
    Defaults,
    Action(Action),
}

/// How a value is shown in text mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintOp {
    Nul,
    Int,
    Float,
    Str,
    Data,
    /// Integer followed by the name of its setting
    Choice(&'static [&'static str]),
}

/// Engineering unit shown after a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitsLabel {
    None,
    Length,
    Velocity,
    Jerk,
    Degrees,
    DegreesPerMin,
    DegreesJerk,
    Seconds,
    Milliseconds,
    Hertz,
    Rpm,
    Steps,
}

impl UnitsLabel {
    /// Label text for the active unit mode
    pub fn text(self, units: UnitsMode) -> &'static str {
        let inches = units.is_inches();
        match self {
            UnitsLabel::None => "",
            UnitsLabel::Length if inches => "in",
            UnitsLabel::Length => "mm",
            UnitsLabel::Velocity if inches => "in/min",
            UnitsLabel::Velocity => "mm/min",
            UnitsLabel::Jerk if inches => "in/min^3",
            UnitsLabel::Jerk => "mm/min^3",
            UnitsLabel::Degrees => "deg",
            UnitsLabel::DegreesPerMin => "deg/min",
            UnitsLabel::DegreesJerk => "deg/min^3",
            UnitsLabel::Seconds => "sec",
            UnitsLabel::Milliseconds => "ms",
            UnitsLabel::Hertz => "Hz",
            UnitsLabel::Rpm => "rpm",
            UnitsLabel::Steps => "steps",
        }
    }
}

/// One table entry
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Owning group, empty when ungrouped
    pub group: Group,
    pub token: Token,
    pub flags: NvFlags,
    /// Display digits for floats
    pub precision: u8,
    pub print: PrintOp,
    pub get: GetOp,
    pub set: SetOp,
    pub target: Target,
    pub default: f32,
    pub label: &'static str,
    pub units: UnitsLabel,
    pub kind: EntryKind,
}

impl Descriptor {
    /// Bare entry with no behavior
    ///
    /// # Errors
    ///
    /// `TokenTooLong` / `GroupTooLong` when the names exceed the table limits.
    pub fn new(group: &str, token: &str, kind: EntryKind) -> Result<Self, TableError> {
        if token.is_empty() || token.len() > TOKEN_LEN {
            return Err(TableError::TokenTooLong);
        }
        if group.len() > GROUP_LEN {
            return Err(TableError::GroupTooLong);
        }
        Ok(Self {
            group: truncated(group),
            token: truncated(token),
            flags: NvFlags::F0,
            precision: 0,
            print: PrintOp::Nul,
            get: GetOp::Nul,
            set: SetOp::Nul,
            target: Target::Null,
            default: 0.0,
            label: "",
            units: UnitsLabel::None,
            kind,
        })
    }

    /// Float parameter read and written through its target
    pub fn float(
        group: &str,
        token: &str,
        flags: NvFlags,
        precision: u8,
        label: &'static str,
    ) -> Result<Self, TableError> {
        let mut desc = Self::new(group, token, EntryKind::Single)?;
        desc.flags = flags;
        desc.precision = precision;
        desc.print = PrintOp::Float;
        desc.get = GetOp::Value;
        desc.set = SetOp::Value;
        desc.label = label;
        Ok(desc)
    }

    /// Integer parameter read and written through its target
    pub fn int(
        group: &str,
        token: &str,
        flags: NvFlags,
        label: &'static str,
    ) -> Result<Self, TableError> {
        let mut desc = Self::new(group, token, EntryKind::Single)?;
        desc.flags = flags;
        desc.print = PrintOp::Int;
        desc.get = GetOp::Value;
        desc.set = SetOp::Value;
        desc.label = label;
        Ok(desc)
    }

    /// Entry that performs `action` when read or written
    pub fn action(token: &str, action: Action, label: &'static str) -> Result<Self, TableError> {
        let mut desc = Self::new("", token, EntryKind::Single)?;
        desc.get = GetOp::Action(action);
        desc.set = SetOp::Action(action);
        desc.label = label;
        Ok(desc)
    }

    pub fn group_marker(token: &str) -> Result<Self, TableError> {
        let mut desc = Self::new("", token, EntryKind::Group)?;
        desc.get = GetOp::Group;
        desc.set = SetOp::Group;
        Ok(desc)
    }

    pub fn uber_group(token: &str, uber: UberGroup) -> Result<Self, TableError> {
        let mut desc = Self::new("", token, EntryKind::UberGroup)?;
        desc.get = GetOp::Uber(uber);
        Ok(desc)
    }

    /// Persisted status report slot
    pub fn status_slot(token: &str, slot: u8) -> Result<Self, TableError> {
        let mut desc = Self::new("", token, EntryKind::StatusSlot)?;
        desc.flags = NvFlags::FP;
        desc.print = PrintOp::Int;
        desc.get = GetOp::Value;
        desc.set = SetOp::Value;
        desc.target = Target::StatusSlot(slot);
        Ok(desc)
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_default(mut self, default: f32) -> Self {
        self.default = default;
        self
    }

    pub fn with_get(mut self, get: GetOp) -> Self {
        self.get = get;
        self
    }

    pub fn with_set(mut self, set: SetOp) -> Self {
        self.set = set;
        self
    }

    pub fn with_print(mut self, print: PrintOp) -> Self {
        self.print = print;
        self
    }

    pub fn with_units(mut self, units: UnitsLabel) -> Self {
        self.units = units;
        self
    }

    pub fn with_flags(mut self, flags: NvFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_persistent(&self) -> bool {
        self.flags.contains(NvFlags::PERSIST)
    }

    pub fn is_initialized(&self) -> bool {
        self.flags.contains(NvFlags::INITIALIZE)
    }

    /// Token with the group prefix removed, when it carries one
    pub fn stripped_token(&self) -> &str {
        self.token
            .strip_prefix(self.group.as_str())
            .filter(|rest| !rest.is_empty())
            .unwrap_or(self.token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_sets() {
        assert!(NvFlags::FIPNC.contains(NvFlags::NOSTRIP | NvFlags::CONVERT));
        assert!(!NvFlags::FIP.contains(NvFlags::CONVERT));
        assert!(NvFlags::FIC.contains(NvFlags::INITIALIZE));
        assert!(!NvFlags::FIC.contains(NvFlags::PERSIST));
    }

    #[test]
    fn test_token_length_limits() {
        assert_eq!(
            Descriptor::new("", "toolong", EntryKind::Single).err(),
            Some(TableError::TokenTooLong)
        );
        assert_eq!(
            Descriptor::new("group", "g", EntryKind::Single).err(),
            Some(TableError::GroupTooLong)
        );
        assert!(Descriptor::new("g54", "g54x", EntryKind::Single).is_ok());
    }

    #[test]
    fn test_stripped_token() {
        let desc = Descriptor::float("g54", "g54x", NvFlags::FIPC, 3, "x offset").unwrap();
        assert_eq!(desc.stripped_token(), "x");

        let sys = Descriptor::float("sys", "ja", NvFlags::FIPN, 2, "junction").unwrap();
        assert_eq!(sys.stripped_token(), "ja");
    }

    #[test]
    fn test_units_label_switches() {
        assert_eq!(UnitsLabel::Velocity.text(UnitsMode::Inches), "in/min");
        assert_eq!(UnitsLabel::Velocity.text(UnitsMode::Millimeters), "mm/min");
        assert_eq!(UnitsLabel::Degrees.text(UnitsMode::Inches), "deg");
    }
}
