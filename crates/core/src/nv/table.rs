//! Table construction
//!
//! The table is generated for a [`Capabilities`] set: per-motor, per-axis and
//! per-channel entries are replicated from one template each, and optional
//! sections are added or left out. Entry order is significant and follows
//! the partition layout described in the [module docs](super).
//!
//! Factory defaults are not repeated here. Every initialized entry takes its
//! default from the matching field of a factory [`Machine`].

use core::fmt::{self, Write};

use heapless::{String, Vec};

use super::descriptor::{
    Action, Descriptor, EntryKind, GetOp, NvFlags, PrintOp, SetOp, UberGroup, UnitsLabel,
};
use super::{TableError, MAX_ENTRIES};
use crate::capabilities::Capabilities;
use crate::machine::axis::{is_rotary, AxisField, AXIS_A, AXIS_LETTERS};
use crate::machine::diagnostics::DiagField;
use crate::machine::io::InputField;
use crate::machine::model::ModelField;
use crate::machine::motor::MotorField;
use crate::machine::offsets::COORD_SYSTEM_TOKENS;
use crate::machine::pwm::PwmField;
use crate::machine::report::{STATUS_REPORT_LEN, USER_DATA_WORDS};
use crate::machine::system::{
    CommField, CoolantField, SpindleField, SystemField, BAUD_RATES,
};
use crate::machine::{Machine, Target};

/// The descriptor table
pub type Table = Vec<Descriptor, MAX_ENTRIES>;

/// Stored positions listed after the work offsets
pub const STORED_POSITION_TOKENS: [&str; 3] = ["g92", "g28", "g30"];

/// User data group tokens
pub const USER_DATA_TOKENS: [&str; 4] = ["uda", "udb", "udc", "udd"];

/// Readout groups listed after the offsets
const READOUT_GROUPS: [&str; 8] = ["mpo", "pos", "ofs", "hom", "prb", "pwr", "jog", "jid"];

const OFF_ON: &[&str] = &["off", "on"];
const AXIS_MODES: &[&str] = &["disabled", "standard", "inhibited", "radius"];
const AXIS_NAMES: &[&str] = &["X", "Y", "Z", "A", "B", "C"];
const UNITS: &[&str] = &["inches", "mm"];
const COORD_SYSTEMS: &[&str] = &["g53", "g54", "g55", "g56", "g57", "g58", "g59"];
const COMBINED_STATES: &[&str] = &[
    "initializing", "ready", "alarm", "stop", "end", "run", "hold", "probe", "cycle", "homing",
    "jog", "interlock", "shutdown", "panic",
];
const MACHINE_STATES: &[&str] = &[
    "initializing", "ready", "alarm", "stop", "end", "cycle", "interlock", "shutdown", "panic",
];
const CYCLE_STATES: &[&str] = &["off", "machining", "homing", "probe", "jog"];
const MOTION_STATES: &[&str] = &["stop", "planning", "run"];
const HOLD_STATES: &[&str] = &["off", "sync", "plan", "decel", "hold", "end hold"];
const MOTION_MODES: &[&str] = &["G0", "G1", "G2", "G3", "G80"];
const PLANES: &[&str] = &["G17", "G18", "G19"];
const PATH_MODES: &[&str] = &["G61", "G61.1", "G64"];
const DISTANCE_MODES: &[&str] = &["G90", "G91"];
const ARC_DISTANCE_MODES: &[&str] = &["G90.1", "G91.1"];
const FEED_RATE_MODES: &[&str] = &["G93", "G94", "G95"];
const POLARITIES: &[&str] = &["normal", "reversed"];
const ACTIVE_LEVELS: &[&str] = &["active low", "active high"];
const POWER_MODES: &[&str] = &["disabled", "always on", "in cycle", "when moving"];
const HOMING_DIRECTIONS: &[&str] = &["search to minimum", "search to maximum"];
const INPUT_ACTIONS: &[&str] = &["none", "stop", "fast stop", "halt", "panic", "reset"];
const INPUT_FUNCTIONS: &[&str] = &["none", "limit", "interlock", "shutdown", "probe"];
const SPINDLE_DIRECTIONS: &[&str] = &["cw", "ccw"];
const TEXT_VERBOSITY: &[&str] = &["silent", "verbose"];
const COMM_MODES: &[&str] = &["text", "JSON"];
const JSON_VERBOSITY: &[&str] = &["silent", "footer", "messages", "configs", "linenum", "verbose"];
const JSON_SYNTAX: &[&str] = &["relaxed", "strict"];
const QUEUE_VERBOSITY: &[&str] = &["off", "single", "triple", "verbose"];
const STATUS_VERBOSITY: &[&str] = &["off", "filtered", "verbose"];
const FLOW_CONTROL: &[&str] = &["off", "XON/XOFF", "RTS/CTS"];
const MOTOR_STEP_FIELDS: [(DiagField, &str); 6] = [
    (DiagField::TargetSteps, "target steps"),
    (DiagField::PositionSteps, "position steps"),
    (DiagField::CommandedSteps, "commanded steps"),
    (DiagField::EncoderSteps, "encoder steps"),
    (DiagField::CorrectedSteps, "corrected steps"),
    (DiagField::FollowingError, "following error"),
];

type Name = String<8>;

fn name(args: fmt::Arguments<'_>) -> Result<Name, TableError> {
    let mut out = Name::new();
    out.write_fmt(args).map_err(|_| TableError::TokenTooLong)?;
    Ok(out)
}

struct Builder {
    table: Table,
    factory: Machine,
}

impl Builder {
    fn new() -> Self {
        Self {
            table: Vec::new(),
            factory: Machine::default(),
        }
    }

    fn push(&mut self, desc: Descriptor) -> Result<(), TableError> {
        let factory = if desc.is_initialized() {
            self.factory.read(desc.target).and_then(|v| v.as_f32())
        } else {
            None
        };
        let desc = match factory {
            Some(value) => desc.with_default(value),
            None => desc,
        };
        self.table
            .push(desc)
            .map_err(|_| TableError::TooManyEntries)
    }
}

/// Build the table for `caps`
///
/// # Errors
///
/// Fails on unsupported capabilities or when an entry breaks a length limit.
pub fn build(caps: &Capabilities) -> Result<Table, TableError> {
    caps.validate()?;
    let mut b = Builder::new();

    system_info(&mut b)?;
    model_readouts(&mut b)?;
    positions(&mut b)?;
    homing_probe_jog(&mut b)?;
    motor_power(&mut b, caps)?;
    motors(&mut b, caps)?;
    axes(&mut b, caps)?;
    inputs(&mut b, caps)?;
    pwm(&mut b)?;
    offsets(&mut b)?;
    job_id(&mut b)?;
    system_settings(&mut b)?;
    spindle_and_coolant(&mut b)?;
    communications(&mut b, caps)?;
    gcode_defaults(&mut b)?;
    reports_and_actions(&mut b, caps)?;
    if caps.user_data {
        user_data(&mut b)?;
    }
    if caps.diagnostics {
        diagnostics(&mut b, caps)?;
    }
    status_slots(&mut b)?;
    group_markers(&mut b, caps)?;
    uber_group_markers(&mut b)?;

    Ok(b.table)
}

fn system_info(b: &mut Builder) -> Result<(), TableError> {
    b.push(
        Descriptor::float("sys", "fb", NvFlags::FIPN, 2, "firmware build")?
            .with_target(Target::System(SystemField::FirmwareBuild))
            .with_set(SetOp::Nul),
    )?;
    let mut fbs = Descriptor::new("sys", "fbs", EntryKind::Single)?
        .with_flags(NvFlags::FN)
        .with_get(GetOp::BuildString)
        .with_print(PrintOp::Str);
    fbs.label = "firmware build";
    b.push(fbs)?;
    b.push(
        Descriptor::float("sys", "fv", NvFlags::FIPN, 2, "firmware version")?
            .with_target(Target::System(SystemField::FirmwareVersion))
            .with_set(SetOp::Nul),
    )?;
    b.push(
        Descriptor::float("sys", "hp", NvFlags::FIPN, 0, "hardware platform")?
            .with_target(Target::System(SystemField::HardwarePlatform)),
    )?;
    b.push(
        Descriptor::float("sys", "hv", NvFlags::FIPN, 0, "hardware version")?
            .with_target(Target::System(SystemField::HardwareVersion))
            .with_set(SetOp::HardwareVersion),
    )?;
    let mut id = Descriptor::new("sys", "id", EntryKind::Single)?
        .with_flags(NvFlags::FN)
        .with_get(GetOp::DeviceId)
        .with_print(PrintOp::Str);
    id.label = "board id";
    b.push(id)
}

/// Read-only integer view of a model field
fn model_state(
    token: &str,
    label: &'static str,
    field: ModelField,
    choices: &'static [&'static str],
) -> Result<Descriptor, TableError> {
    Ok(Descriptor::int("", token, NvFlags::FS, label)?
        .with_target(Target::Model(field))
        .with_set(SetOp::Nul)
        .with_print(PrintOp::Choice(choices)))
}

fn model_readouts(b: &mut Builder) -> Result<(), TableError> {
    b.push(
        Descriptor::int("", "stat", NvFlags::FS, "machine state")?
            .with_get(GetOp::CombinedState)
            .with_set(SetOp::Nul)
            .with_print(PrintOp::Choice(COMBINED_STATES)),
    )?;
    b.push(
        Descriptor::int("", "n", NvFlags::FI, "model line number")?
            .with_target(Target::Model(ModelField::LineNumber)),
    )?;
    b.push(
        Descriptor::int("", "line", NvFlags::FI | NvFlags::FS, "line number")?
            .with_target(Target::Model(ModelField::LineNumber)),
    )?;
    b.push(
        Descriptor::float("", "vel", NvFlags::FS | NvFlags::CONVERT, 2, "velocity")?
            .with_target(Target::Model(ModelField::Velocity))
            .with_set(SetOp::Nul)
            .with_units(UnitsLabel::Velocity),
    )?;
    b.push(
        Descriptor::float("", "feed", NvFlags::FS | NvFlags::CONVERT, 2, "feed rate")?
            .with_target(Target::Model(ModelField::Feed))
            .with_set(SetOp::Nul)
            .with_units(UnitsLabel::Velocity),
    )?;
    b.push(model_state("macs", "raw machine state", ModelField::MachineState, MACHINE_STATES)?)?;
    b.push(model_state("cycs", "cycle state", ModelField::CycleState, CYCLE_STATES)?)?;
    b.push(model_state("mots", "motion state", ModelField::MotionState, MOTION_STATES)?)?;
    b.push(model_state("hold", "feedhold state", ModelField::HoldState, HOLD_STATES)?)?;
    b.push(model_state("unit", "units", ModelField::Units, UNITS)?)?;
    b.push(model_state("coor", "coordinate system", ModelField::CoordSystem, COORD_SYSTEMS)?)?;
    b.push(model_state("momo", "motion mode", ModelField::MotionMode, MOTION_MODES)?)?;
    b.push(model_state("plan", "plane", ModelField::Plane, PLANES)?)?;
    b.push(model_state("path", "path mode", ModelField::PathControl, PATH_MODES)?)?;
    b.push(model_state("dist", "distance mode", ModelField::DistanceMode, DISTANCE_MODES)?)?;
    b.push(model_state(
        "admo",
        "arc distance mode",
        ModelField::ArcDistanceMode,
        ARC_DISTANCE_MODES,
    )?)?;
    b.push(model_state("frmo", "feed rate mode", ModelField::FeedRateMode, FEED_RATE_MODES)?)?;
    b.push(
        Descriptor::int("", "tool", NvFlags::FS, "tool")?
            .with_target(Target::Model(ModelField::Tool))
            .with_set(SetOp::Nul),
    )?;
    b.push(model_state("g92e", "G92 offsets", ModelField::OriginOffsetEnable, OFF_ON)?)
}

/// Length flags and units for an axis; rotary axes are never converted
fn axis_units(axis: usize) -> (NvFlags, UnitsLabel) {
    if is_rotary(axis) {
        (NvFlags::empty(), UnitsLabel::Degrees)
    } else {
        (NvFlags::CONVERT, UnitsLabel::Length)
    }
}

fn positions(b: &mut Builder) -> Result<(), TableError> {
    for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
        let (convert, units) = axis_units(axis);
        let tok = name(format_args!("mpo{}", letter))?;
        b.push(
            Descriptor::float("mpo", &tok, NvFlags::FS | convert, 3, "machine position")?
                .with_target(Target::Model(ModelField::MachinePosition(axis as u8)))
                .with_set(SetOp::Nul)
                .with_units(units),
        )?;
    }
    for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
        let (convert, units) = axis_units(axis);
        let tok = name(format_args!("pos{}", letter))?;
        b.push(
            Descriptor::float("pos", &tok, NvFlags::FS | convert, 3, "work position")?
                .with_get(GetOp::WorkPosition(axis as u8))
                .with_set(SetOp::Nul)
                .with_units(units),
        )?;
    }
    for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
        let (convert, units) = axis_units(axis);
        let tok = name(format_args!("ofs{}", letter))?;
        b.push(
            Descriptor::float("ofs", &tok, NvFlags::FS | convert, 3, "work offset")?
                .with_get(GetOp::WorkOffset(axis as u8))
                .with_set(SetOp::Nul)
                .with_units(units),
        )?;
    }
    Ok(())
}

fn homing_probe_jog(b: &mut Builder) -> Result<(), TableError> {
    b.push(
        Descriptor::int("hom", "home", NvFlags::FS, "homing state")?
            .with_target(Target::Model(ModelField::HomingState))
            .with_set(SetOp::Bool01)
            .with_print(PrintOp::Choice(OFF_ON)),
    )?;
    for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
        let tok = name(format_args!("hom{}", letter))?;
        b.push(
            Descriptor::int("hom", &tok, NvFlags::F0, "axis homed")?
                .with_target(Target::Model(ModelField::Homed(axis as u8)))
                .with_set(SetOp::Bool01)
                .with_print(PrintOp::Choice(OFF_ON)),
        )?;
    }

    b.push(
        Descriptor::int("prb", "prbe", NvFlags::FS, "probe state")?
            .with_target(Target::Model(ModelField::ProbeState))
            .with_set(SetOp::Nul),
    )?;
    for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
        let (convert, units) = axis_units(axis);
        let tok = name(format_args!("prb{}", letter))?;
        b.push(
            Descriptor::float("prb", &tok, NvFlags::FS | convert, 3, "probe result")?
                .with_target(Target::Model(ModelField::ProbeResult(axis as u8)))
                .with_set(SetOp::Nul)
                .with_units(units),
        )?;
    }

    // jogging is limited to X, Y, Z and A
    for (axis, letter) in AXIS_LETTERS.iter().enumerate().take(AXIS_A + 1) {
        let tok = name(format_args!("jog{}", letter))?;
        let mut jog =
            Descriptor::new("jog", &tok, EntryKind::Single)?.with_set(SetOp::Jog(axis as u8));
        jog.label = "jog to";
        b.push(jog)?;
    }
    Ok(())
}

fn motor_power(b: &mut Builder, caps: &Capabilities) -> Result<(), TableError> {
    for motor in 0..caps.motors {
        let tok = name(format_args!("pwr{}", motor + 1))?;
        b.push(
            Descriptor::int("pwr", &tok, NvFlags::FS, "motor power")?
                .with_get(GetOp::MotorPower(motor))
                .with_set(SetOp::Nul)
                .with_print(PrintOp::Choice(OFF_ON)),
        )?;
    }
    Ok(())
}

fn motors(b: &mut Builder, caps: &Capabilities) -> Result<(), TableError> {
    for motor in 0..caps.motors {
        let group = name(format_args!("{}", motor + 1))?;
        let token = |suffix: &str| name(format_args!("{}{}", motor + 1, suffix));
        let target = |field| Target::Motor(motor, field);

        b.push(
            Descriptor::int(&group, &token("ma")?, NvFlags::FIP, "map to axis")?
                .with_target(target(MotorField::Map))
                .with_print(PrintOp::Choice(AXIS_NAMES)),
        )?;
        b.push(
            Descriptor::float(&group, &token("sa")?, NvFlags::FIP, 3, "step angle")?
                .with_target(target(MotorField::StepAngle))
                .with_set(SetOp::StepAngle)
                .with_units(UnitsLabel::Degrees),
        )?;
        b.push(
            Descriptor::float(&group, &token("tr")?, NvFlags::FIPC, 4, "travel per revolution")?
                .with_target(target(MotorField::TravelPerRev))
                .with_set(SetOp::TravelPerRev)
                .with_units(UnitsLabel::Length),
        )?;
        b.push(
            Descriptor::int(&group, &token("mi")?, NvFlags::FIP, "microsteps")?
                .with_target(target(MotorField::Microsteps))
                .with_set(SetOp::Microsteps),
        )?;
        b.push(
            Descriptor::int(&group, &token("po")?, NvFlags::FIP, "polarity")?
                .with_target(target(MotorField::Polarity))
                .with_set(SetOp::Bool01)
                .with_print(PrintOp::Choice(POLARITIES)),
        )?;
        b.push(
            Descriptor::int(&group, &token("pm")?, NvFlags::FIP, "power management")?
                .with_target(target(MotorField::PowerMode))
                .with_set(SetOp::PowerMode)
                .with_print(PrintOp::Choice(POWER_MODES)),
        )?;
        if caps.is_arm() {
            b.push(
                Descriptor::float(&group, &token("pl")?, NvFlags::FIP, 3, "power level")?
                    .with_target(target(MotorField::PowerLevel))
                    .with_set(SetOp::PowerLevel),
            )?;
        }
    }
    Ok(())
}

fn axes(b: &mut Builder, caps: &Capabilities) -> Result<(), TableError> {
    for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
        let rotary = is_rotary(axis);
        // B and C carry homing settings only on ARM
        let extended = axis <= AXIS_A || caps.is_arm();
        let a = axis as u8;
        let token = |suffix: &str| name(format_args!("{}{}", letter, suffix));
        let target = |field| Target::Axis(a, field);

        let (flags, length_set, length, velocity, jerk) = if rotary {
            (
                NvFlags::FIP,
                SetOp::Value,
                UnitsLabel::Degrees,
                UnitsLabel::DegreesPerMin,
                UnitsLabel::DegreesJerk,
            )
        } else {
            (
                NvFlags::FIPC,
                SetOp::FloatUnits,
                UnitsLabel::Length,
                UnitsLabel::Velocity,
                UnitsLabel::Jerk,
            )
        };

        b.push(
            Descriptor::int(letter, &token("am")?, NvFlags::FIP, "axis mode")?
                .with_target(target(AxisField::Mode))
                .with_set(SetOp::AxisMode)
                .with_print(PrintOp::Choice(AXIS_MODES)),
        )?;
        b.push(
            Descriptor::float(letter, &token("vm")?, flags, 0, "velocity maximum")?
                .with_target(target(AxisField::VelocityMax))
                .with_set(SetOp::Velocity)
                .with_units(velocity),
        )?;
        b.push(
            Descriptor::float(letter, &token("fr")?, flags, 0, "feedrate maximum")?
                .with_target(target(AxisField::FeedrateMax))
                .with_set(SetOp::Velocity)
                .with_units(velocity),
        )?;
        b.push(
            Descriptor::float(letter, &token("tn")?, flags, 3, "travel minimum")?
                .with_target(target(AxisField::TravelMin))
                .with_set(length_set)
                .with_units(length),
        )?;
        b.push(
            Descriptor::float(letter, &token("tm")?, flags, 3, "travel maximum")?
                .with_target(target(AxisField::TravelMax))
                .with_set(length_set)
                .with_units(length),
        )?;
        b.push(
            Descriptor::float(letter, &token("jm")?, flags, 0, "jerk maximum")?
                .with_target(target(AxisField::JerkMax))
                .with_set(SetOp::Jerk)
                .with_units(jerk),
        )?;
        b.push(
            Descriptor::float(letter, &token("jh")?, flags, 0, "jerk homing")?
                .with_target(target(AxisField::JerkHigh))
                .with_set(SetOp::Jerk)
                .with_units(jerk),
        )?;
        if rotary {
            b.push(
                Descriptor::float(letter, &token("ra")?, NvFlags::FIPC, 3, "radius value")?
                    .with_target(target(AxisField::Radius))
                    .with_set(SetOp::FloatUnits)
                    .with_units(UnitsLabel::Length),
            )?;
        }
        if !extended {
            continue;
        }
        b.push(
            Descriptor::int(letter, &token("hi")?, NvFlags::FIP, "homing input")?
                .with_target(target(AxisField::HomingInput))
                .with_set(SetOp::HomingInput),
        )?;
        b.push(
            Descriptor::int(letter, &token("hd")?, NvFlags::FIP, "homing direction")?
                .with_target(target(AxisField::HomingDir))
                .with_set(SetOp::Bool01)
                .with_print(PrintOp::Choice(HOMING_DIRECTIONS)),
        )?;
        b.push(
            Descriptor::float(letter, &token("sv")?, flags, 0, "search velocity")?
                .with_target(target(AxisField::SearchVelocity))
                .with_set(length_set)
                .with_units(velocity),
        )?;
        b.push(
            Descriptor::float(letter, &token("lv")?, flags, 2, "latch velocity")?
                .with_target(target(AxisField::LatchVelocity))
                .with_set(length_set)
                .with_units(velocity),
        )?;
        b.push(
            Descriptor::float(letter, &token("lb")?, flags, 3, "latch backoff")?
                .with_target(target(AxisField::LatchBackoff))
                .with_set(length_set)
                .with_units(length),
        )?;
        b.push(
            Descriptor::float(letter, &token("zb")?, flags, 3, "zero backoff")?
                .with_target(target(AxisField::ZeroBackoff))
                .with_set(length_set)
                .with_units(length),
        )?;
    }
    Ok(())
}

fn inputs(b: &mut Builder, caps: &Capabilities) -> Result<(), TableError> {
    for channel in 0..caps.input_channels {
        let group = name(format_args!("di{}", channel + 1))?;
        let token = |suffix: &str| name(format_args!("di{}{}", channel + 1, suffix));
        let target = |field| Target::Input(channel, field);

        b.push(
            Descriptor::int(&group, &token("mo")?, NvFlags::FIP, "input mode")?
                .with_target(target(InputField::Mode))
                .with_set(SetOp::InputMode)
                .with_print(PrintOp::Choice(ACTIVE_LEVELS)),
        )?;
        b.push(
            Descriptor::int(&group, &token("ac")?, NvFlags::FIP, "input action")?
                .with_target(target(InputField::Action))
                .with_set(SetOp::InputAction)
                .with_print(PrintOp::Choice(INPUT_ACTIONS)),
        )?;
        b.push(
            Descriptor::int(&group, &token("fn")?, NvFlags::FIP, "input function")?
                .with_target(target(InputField::Function))
                .with_set(SetOp::InputFunction)
                .with_print(PrintOp::Choice(INPUT_FUNCTIONS)),
        )?;
    }
    for channel in 0..caps.input_channels {
        let tok = name(format_args!("in{}", channel + 1))?;
        b.push(
            Descriptor::int("in", &tok, NvFlags::FS, "input state")?
                .with_target(Target::Input(channel, InputField::State))
                .with_set(SetOp::Nul),
        )?;
    }
    Ok(())
}

fn pwm(b: &mut Builder) -> Result<(), TableError> {
    const FIELDS: [(&str, PwmField, u8, &str, UnitsLabel); 10] = [
        ("p1frq", PwmField::Frequency, 0, "pwm frequency", UnitsLabel::Hertz),
        ("p1csl", PwmField::CwSpeedLo, 0, "pwm cw speed lo", UnitsLabel::Rpm),
        ("p1csh", PwmField::CwSpeedHi, 0, "pwm cw speed hi", UnitsLabel::Rpm),
        ("p1cpl", PwmField::CwPhaseLo, 3, "pwm cw phase lo", UnitsLabel::None),
        ("p1cph", PwmField::CwPhaseHi, 3, "pwm cw phase hi", UnitsLabel::None),
        ("p1wsl", PwmField::CcwSpeedLo, 0, "pwm ccw speed lo", UnitsLabel::Rpm),
        ("p1wsh", PwmField::CcwSpeedHi, 0, "pwm ccw speed hi", UnitsLabel::Rpm),
        ("p1wpl", PwmField::CcwPhaseLo, 3, "pwm ccw phase lo", UnitsLabel::None),
        ("p1wph", PwmField::CcwPhaseHi, 3, "pwm ccw phase hi", UnitsLabel::None),
        ("p1pof", PwmField::PhaseOff, 3, "pwm phase off", UnitsLabel::None),
    ];
    for (token, field, precision, label, units) in FIELDS {
        b.push(
            Descriptor::float("p1", token, NvFlags::FIP, precision, label)?
                .with_target(Target::Pwm(field))
                .with_set(SetOp::Pwm)
                .with_units(units),
        )?;
    }
    Ok(())
}

fn offsets(b: &mut Builder) -> Result<(), TableError> {
    for (system, group) in COORD_SYSTEM_TOKENS.iter().enumerate() {
        for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
            let (convert, units) = axis_units(axis);
            let set = if is_rotary(axis) { SetOp::Value } else { SetOp::FloatUnits };
            let tok = name(format_args!("{}{}", group, letter))?;
            b.push(
                Descriptor::float(group, &tok, NvFlags::FIP | convert, 3, "work offset")?
                    .with_target(Target::CoordOffset(system as u8, axis as u8))
                    .with_set(set)
                    .with_units(units),
            )?;
        }
    }
    for group in STORED_POSITION_TOKENS {
        for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
            let (convert, units) = axis_units(axis);
            let a = axis as u8;
            let (target, label) = match group {
                "g92" => (Target::OriginOffset(a), "origin offset"),
                "g28" => (Target::G28(a), "g28 position"),
                _ => (Target::G30(a), "g30 position"),
            };
            let tok = name(format_args!("{}{}", group, letter))?;
            b.push(
                Descriptor::float(group, &tok, NvFlags::FI | convert, 3, label)?
                    .with_target(target)
                    .with_set(SetOp::Nul)
                    .with_units(units),
            )?;
        }
    }
    Ok(())
}

fn job_id(b: &mut Builder) -> Result<(), TableError> {
    for (word, letter) in ["a", "b", "c", "d"].iter().enumerate() {
        b.push(
            Descriptor::int("jid", &name(format_args!("jid{}", letter))?, NvFlags::F0, "job id")?
                .with_target(Target::JobId(word as u8))
                .with_print(PrintOp::Data),
        )?;
    }
    Ok(())
}

/// `sys` member backed by a byte switch
fn sys_switch(
    token: &str,
    label: &'static str,
    target: Target,
    choices: &'static [&'static str],
) -> Result<Descriptor, TableError> {
    Ok(Descriptor::int("sys", token, NvFlags::FIPN, label)?
        .with_target(target)
        .with_set(SetOp::Bool01)
        .with_print(PrintOp::Choice(choices)))
}

fn system_settings(b: &mut Builder) -> Result<(), TableError> {
    let sys = Target::System;
    b.push(
        Descriptor::float("sys", "ja", NvFlags::FIPN, 2, "junction aggression")?
            .with_target(sys(SystemField::JunctionAggression))
            .with_set(SetOp::JunctionAggression),
    )?;
    b.push(
        Descriptor::float("sys", "ct", NvFlags::FIPNC, 4, "chordal tolerance")?
            .with_target(sys(SystemField::ChordalTolerance))
            .with_set(SetOp::FloatUnits)
            .with_units(UnitsLabel::Length),
    )?;
    b.push(sys_switch("sl", "soft limit enable", sys(SystemField::SoftLimitEnable), OFF_ON)?)?;
    b.push(sys_switch("lim", "hard limit enable", sys(SystemField::HardLimitEnable), OFF_ON)?)?;
    b.push(sys_switch(
        "saf",
        "safety interlock enable",
        sys(SystemField::SafetyInterlockEnable),
        OFF_ON,
    )?)?;
    b.push(
        Descriptor::float("sys", "mt", NvFlags::FIPN, 2, "motor idle timeout")?
            .with_target(sys(SystemField::MotorPowerTimeout))
            .with_set(SetOp::MotorTimeout)
            .with_units(UnitsLabel::Seconds),
    )?;
    b.push(sys_switch("m48e", "overrides enable", sys(SystemField::M48Enable), OFF_ON)?)?;
    b.push(sys_switch(
        "mfoe",
        "feed override enable",
        sys(SystemField::FeedOverrideEnable),
        OFF_ON,
    )?)?;
    b.push(
        Descriptor::float("sys", "mfo", NvFlags::FIPN, 3, "feed override factor")?
            .with_target(sys(SystemField::FeedOverrideFactor))
            .with_set(SetOp::OverrideFactor),
    )?;
    b.push(sys_switch(
        "mtoe",
        "traverse override enable",
        sys(SystemField::TraverseOverrideEnable),
        OFF_ON,
    )?)?;
    b.push(
        Descriptor::float("sys", "mto", NvFlags::FIPN, 3, "traverse override factor")?
            .with_target(sys(SystemField::TraverseOverrideFactor))
            .with_set(SetOp::OverrideFactor),
    )
}

fn spindle_and_coolant(b: &mut Builder) -> Result<(), TableError> {
    let spindle = Target::Spindle;
    let coolant = Target::Coolant;
    b.push(sys_switch(
        "spep",
        "spindle enable polarity",
        spindle(SpindleField::EnablePolarity),
        ACTIVE_LEVELS,
    )?)?;
    b.push(sys_switch(
        "spdp",
        "spindle direction polarity",
        spindle(SpindleField::DirPolarity),
        ACTIVE_LEVELS,
    )?)?;
    b.push(sys_switch(
        "spph",
        "spindle pause on hold",
        spindle(SpindleField::PauseOnHold),
        OFF_ON,
    )?)?;
    b.push(
        Descriptor::float("sys", "spdw", NvFlags::FIPN, 2, "spindle dwell time")?
            .with_target(spindle(SpindleField::DwellSeconds))
            .with_units(UnitsLabel::Seconds),
    )?;
    b.push(sys_switch(
        "ssoe",
        "spindle override enable",
        spindle(SpindleField::OverrideEnable),
        OFF_ON,
    )?)?;
    b.push(
        Descriptor::float("sys", "sso", NvFlags::FIPN, 3, "spindle override factor")?
            .with_target(spindle(SpindleField::OverrideFactor))
            .with_set(SetOp::OverrideFactor),
    )?;
    b.push(
        Descriptor::int("", "spe", NvFlags::FS, "spindle enable")?
            .with_target(spindle(SpindleField::Enable))
            .with_set(SetOp::Nul)
            .with_print(PrintOp::Choice(OFF_ON)),
    )?;
    b.push(
        Descriptor::int("", "spd", NvFlags::FS, "spindle direction")?
            .with_target(spindle(SpindleField::Direction))
            .with_set(SetOp::SpindleDirection)
            .with_print(PrintOp::Choice(SPINDLE_DIRECTIONS)),
    )?;
    b.push(
        Descriptor::float("", "sps", NvFlags::FS, 0, "spindle speed")?
            .with_target(spindle(SpindleField::Speed))
            .with_set(SetOp::Nul)
            .with_units(UnitsLabel::Rpm),
    )?;

    b.push(sys_switch(
        "cofp",
        "coolant flood polarity",
        coolant(CoolantField::FloodPolarity),
        ACTIVE_LEVELS,
    )?)?;
    b.push(sys_switch(
        "comp",
        "coolant mist polarity",
        coolant(CoolantField::MistPolarity),
        ACTIVE_LEVELS,
    )?)?;
    b.push(sys_switch(
        "coph",
        "coolant pause on hold",
        coolant(CoolantField::PauseOnHold),
        OFF_ON,
    )?)?;
    b.push(
        Descriptor::int("", "com", NvFlags::FS, "mist coolant")?
            .with_target(coolant(CoolantField::MistEnable))
            .with_set(SetOp::Nul)
            .with_print(PrintOp::Choice(OFF_ON)),
    )?;
    b.push(
        Descriptor::int("", "cof", NvFlags::FS, "flood coolant")?
            .with_target(coolant(CoolantField::FloodEnable))
            .with_set(SetOp::Nul)
            .with_print(PrintOp::Choice(OFF_ON)),
    )
}

fn communications(b: &mut Builder, caps: &Capabilities) -> Result<(), TableError> {
    let comm = Target::Comm;
    b.push(sys_switch("tv", "text verbosity", comm(CommField::TextVerbosity), TEXT_VERBOSITY)?)?;
    b.push(sys_switch("ej", "enable json mode", comm(CommField::CommMode), COMM_MODES)?)?;
    b.push(
        Descriptor::int("sys", "jv", NvFlags::FIPN, "json verbosity")?
            .with_target(comm(CommField::JsonVerbosity))
            .with_set(SetOp::JsonVerbosity)
            .with_print(PrintOp::Choice(JSON_VERBOSITY)),
    )?;
    b.push(sys_switch("js", "json serialize style", comm(CommField::JsonSyntax), JSON_SYNTAX)?)?;
    b.push(
        Descriptor::int("sys", "qv", NvFlags::FIPN, "queue report verbosity")?
            .with_target(comm(CommField::QueueReportVerbosity))
            .with_set(SetOp::Range0123)
            .with_print(PrintOp::Choice(QUEUE_VERBOSITY)),
    )?;
    b.push(
        Descriptor::int("sys", "sv", NvFlags::FIPN, "status report verbosity")?
            .with_target(comm(CommField::StatusReportVerbosity))
            .with_set(SetOp::Range012)
            .with_print(PrintOp::Choice(STATUS_VERBOSITY)),
    )?;
    b.push(
        Descriptor::int("sys", "si", NvFlags::FIPN, "status report interval")?
            .with_target(comm(CommField::StatusReportInterval))
            .with_set(SetOp::StatusInterval)
            .with_units(UnitsLabel::Milliseconds),
    )?;
    if caps.is_avr() {
        b.push(sys_switch("ec", "expand LF to CRLF on TX", comm(CommField::ExpandCr), OFF_ON)?)?;
        b.push(sys_switch("ee", "enable echo", comm(CommField::EnableEcho), OFF_ON)?)?;
        b.push(
            Descriptor::int("sys", "ex", NvFlags::FIPN, "enable flow control")?
                .with_target(comm(CommField::FlowControl))
                .with_set(SetOp::FlowControl)
                .with_print(PrintOp::Choice(FLOW_CONTROL)),
        )?;
        b.push(
            Descriptor::int("sys", "baud", NvFlags::FN, "USB baud rate")?
                .with_target(comm(CommField::Baud))
                .with_set(SetOp::Baud)
                .with_print(PrintOp::Choice(&BAUD_RATES)),
        )?;
    }
    Ok(())
}

fn gcode_defaults(b: &mut Builder) -> Result<(), TableError> {
    let sys = Target::System;
    b.push(
        Descriptor::int("sys", "gpl", NvFlags::FIPN, "default gcode plane")?
            .with_target(sys(SystemField::DefaultPlane))
            .with_set(SetOp::Range012)
            .with_print(PrintOp::Choice(PLANES)),
    )?;
    b.push(sys_switch("gun", "default gcode units mode", sys(SystemField::DefaultUnits), UNITS)?)?;
    b.push(
        Descriptor::int("sys", "gco", NvFlags::FIPN, "default gcode coord system")?
            .with_target(sys(SystemField::DefaultCoordSystem))
            .with_print(PrintOp::Choice(COORD_SYSTEMS)),
    )?;
    b.push(
        Descriptor::int("sys", "gpa", NvFlags::FIPN, "default gcode path control")?
            .with_target(sys(SystemField::DefaultPathControl))
            .with_set(SetOp::Range012)
            .with_print(PrintOp::Choice(PATH_MODES)),
    )?;
    b.push(sys_switch(
        "gdi",
        "default gcode distance mode",
        sys(SystemField::DefaultDistanceMode),
        DISTANCE_MODES,
    )?)?;

    let mut gc = Descriptor::new("", "gc", EntryKind::Single)?
        .with_get(GetOp::GcodeBlock)
        .with_set(SetOp::GcodeBlock)
        .with_print(PrintOp::Str);
    gc.label = "gcode block";
    b.push(gc)
}

fn reports_and_actions(b: &mut Builder, caps: &Capabilities) -> Result<(), TableError> {
    let mut sr = Descriptor::new("", "sr", EntryKind::Single)?
        .with_get(GetOp::StatusReport)
        .with_set(SetOp::StatusReport);
    sr.label = "status report";
    b.push(sr)?;

    for (token, label, field) in [
        ("qr", "planner buffers free", ModelField::PlannerFree),
        ("qi", "buffers queued in", ModelField::QueuedIn),
        ("qo", "buffers queued out", ModelField::QueuedOut),
    ] {
        b.push(
            Descriptor::int("", token, NvFlags::FS, label)?
                .with_target(Target::Model(field))
                .with_set(SetOp::Nul),
        )?;
    }
    b.push(Descriptor::action("qf", Action::QueueFlush, "queue flush")?.with_get(GetOp::Nul))?;
    b.push(
        Descriptor::int("", "rx", NvFlags::F0, "rx buffer free")?
            .with_target(Target::Comm(CommField::RxFree))
            .with_set(SetOp::Nul),
    )?;
    b.push(Descriptor::new("", "msg", EntryKind::Single)?)?;
    b.push(Descriptor::action("alarm", Action::Alarm, "alarm")?)?;
    b.push(Descriptor::action("panic", Action::Panic, "panic")?)?;
    b.push(Descriptor::action("shutd", Action::Shutdown, "shutdown")?)?;
    b.push(Descriptor::action("clear", Action::Clear, "clear alarm")?)?;
    b.push(Descriptor::action("clr", Action::Clear, "clear alarm")?)?;
    b.push(
        Descriptor::int("", "tick", NvFlags::F0, "system tick")?
            .with_target(Target::Model(ModelField::Tick))
            .with_set(SetOp::Nul)
            .with_units(UnitsLabel::Milliseconds),
    )?;
    b.push(Descriptor::action("me", Action::MotorsEnable, "enable motors")?)?;
    b.push(Descriptor::action("md", Action::MotorsDisable, "disable motors")?)?;

    let mut defa = Descriptor::new("", "defa", EntryKind::Single)?.with_set(SetOp::Defaults);
    defa.label = "restore factory defaults";
    b.push(defa)?;

    let loader = if caps.is_arm() { "flash" } else { "boot" };
    b.push(
        Descriptor::action(loader, Action::Bootloader, "enter bootloader")?.with_get(GetOp::Nul),
    )
}

fn user_data(b: &mut Builder) -> Result<(), TableError> {
    for (group_index, group) in USER_DATA_TOKENS.iter().enumerate() {
        for word in 0..USER_DATA_WORDS {
            let tok = name(format_args!("{}{}", group, word))?;
            b.push(
                Descriptor::int(group, &tok, NvFlags::FIP, "user data")?
                    .with_target(Target::UserData(group_index as u8, word as u8))
                    .with_print(PrintOp::Data),
            )?;
        }
    }
    Ok(())
}

fn diagnostics(b: &mut Builder, caps: &Capabilities) -> Result<(), TableError> {
    b.push(Descriptor::action("clc", Action::ClearCounters, "clear step counters")?)?;
    b.push(Descriptor::action("_dam", Action::DumpModel, "dump model")?)?;

    for (field, label) in [
        (DiagField::Target, "runtime target"),
        (DiagField::RuntimeTarget, "block target"),
    ] {
        let group = field.group();
        for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
            let tok = name(format_args!("{}{}", group, letter))?;
            b.push(
                Descriptor::float(group, &tok, NvFlags::F0, 2, label)?
                    .with_target(Target::Diagnostic(field, axis as u8))
                    .with_set(SetOp::Nul),
            )?;
        }
    }
    for motor in 0..caps.motors {
        for (field, label) in MOTOR_STEP_FIELDS {
            let group = field.group();
            let tok = name(format_args!("{}{}", group, motor + 1))?;
            b.push(
                Descriptor::float(group, &tok, NvFlags::F0, 2, label)?
                    .with_target(Target::Diagnostic(field, motor))
                    .with_set(SetOp::Nul)
                    .with_units(UnitsLabel::Steps),
            )?;
        }
    }
    Ok(())
}

fn status_slots(b: &mut Builder) -> Result<(), TableError> {
    for slot in 0..STATUS_REPORT_LEN {
        b.push(Descriptor::status_slot(
            &name(format_args!("se{:02}", slot))?,
            slot as u8,
        )?)?;
    }
    Ok(())
}

fn group_markers(b: &mut Builder, caps: &Capabilities) -> Result<(), TableError> {
    b.push(Descriptor::group_marker("sys")?)?;
    b.push(Descriptor::group_marker("p1")?)?;
    for motor in 0..caps.motors {
        b.push(Descriptor::group_marker(&name(format_args!("{}", motor + 1))?)?)?;
    }
    for letter in AXIS_LETTERS {
        b.push(Descriptor::group_marker(letter)?)?;
    }
    b.push(Descriptor::group_marker("in")?)?;
    for channel in 0..caps.input_channels {
        b.push(Descriptor::group_marker(&name(format_args!("di{}", channel + 1))?)?)?;
    }
    for group in COORD_SYSTEM_TOKENS.iter().chain(STORED_POSITION_TOKENS.iter()) {
        b.push(Descriptor::group_marker(group)?)?;
    }
    for group in READOUT_GROUPS {
        b.push(Descriptor::group_marker(group)?)?;
    }
    if caps.user_data {
        for group in USER_DATA_TOKENS {
            b.push(Descriptor::group_marker(group)?)?;
        }
    }
    if caps.diagnostics {
        for field in DiagField::ALL {
            b.push(Descriptor::group_marker(field.group())?)?;
        }
    }
    Ok(())
}

fn uber_group_markers(b: &mut Builder) -> Result<(), TableError> {
    b.push(Descriptor::uber_group("m", UberGroup::Motors)?)?;
    b.push(Descriptor::uber_group("q", UberGroup::Axes)?)?;
    b.push(Descriptor::uber_group("o", UberGroup::Offsets)?)?;
    b.push(Descriptor::uber_group("di", UberGroup::Inputs)?)?;
    b.push(Descriptor::uber_group("$", UberGroup::All)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Platform;

    fn find<'a>(table: &'a Table, token: &str) -> Option<&'a Descriptor> {
        table.iter().find(|d| d.token.as_str() == token)
    }

    #[test]
    fn test_default_table_builds() {
        let table = build(&Capabilities::default()).unwrap();
        assert_eq!(table.first().unwrap().token.as_str(), "fb");
        assert_eq!(table.last().unwrap().token.as_str(), "$");
    }

    #[test]
    fn test_largest_table_fits() {
        let caps = Capabilities::default()
            .with_motors(6)
            .with_input_channels(9)
            .with_user_data(true)
            .with_diagnostics(true);
        let table = build(&caps).unwrap();
        assert!(find(&table, "6pl").is_some());
        assert!(find(&table, "di9fn").is_some());
        assert!(find(&table, "udd3").is_some());
        assert!(find(&table, "_fe6").is_some());
    }

    #[test]
    fn test_defaults_from_factory() {
        let table = build(&Capabilities::default()).unwrap();
        assert_eq!(find(&table, "xvm").unwrap().default, 16_000.0);
        assert_eq!(find(&table, "1mi").unwrap().default, 8.0);
        assert_eq!(find(&table, "si").unwrap().default, 250.0);
        // not initialized
        assert_eq!(find(&table, "posx").unwrap().default, 0.0);
    }

    #[test]
    fn test_platform_specific_entries() {
        let arm = build(&Capabilities::default()).unwrap();
        assert!(find(&arm, "1pl").is_some());
        assert!(find(&arm, "bhi").is_some());
        assert!(find(&arm, "flash").is_some());
        assert!(find(&arm, "baud").is_none());

        let avr = build(&Capabilities::default().with_platform(Platform::Avr)).unwrap();
        assert!(find(&avr, "1pl").is_none());
        assert!(find(&avr, "bhi").is_none());
        assert!(find(&avr, "bra").is_some());
        assert!(find(&avr, "boot").is_some());
        assert!(find(&avr, "baud").is_some());
    }

    #[test]
    fn test_rotary_offsets_not_converted() {
        let table = build(&Capabilities::default()).unwrap();
        assert!(find(&table, "g54x").unwrap().flags.contains(NvFlags::CONVERT));
        assert!(!find(&table, "g54a").unwrap().flags.contains(NvFlags::CONVERT));
        assert_eq!(find(&table, "g54a").unwrap().set, SetOp::Value);
    }

    #[test]
    fn test_corrected_steps_tokens() {
        let caps = Capabilities::default().with_diagnostics(true);
        let table = build(&caps).unwrap();
        let xs = find(&table, "_xs2").unwrap();
        assert_eq!(xs.target, Target::Diagnostic(DiagField::CorrectedSteps, 1));
    }

    #[test]
    fn test_invalid_capabilities() {
        let caps = Capabilities::default().with_motors(7);
        assert!(matches!(build(&caps), Err(TableError::Capabilities(_))));
    }
}
