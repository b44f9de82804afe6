//! System, spindle, coolant and communication settings
//!
//! These back the `sys` group. Defaults follow the `DEFAULT_*` constant
//! convention used throughout the machine model.

use super::Cell;

/// Firmware build number reported as `fb` and stamped into persisted blocks
pub const FIRMWARE_BUILD: f32 = 101.04;

/// Firmware version reported as `fv`
pub const FIRMWARE_VERSION: f32 = 0.97;

/// Hardware platform identifier reported as `hp`
pub const HARDWARE_PLATFORM: f32 = 3.0;

/// Highest hardware revision accepted by `hv`
pub const HARDWARE_VERSION_MAX: f32 = 9.0;

const DEFAULT_HARDWARE_VERSION: f32 = 8.0;
const DEFAULT_JUNCTION_AGGRESSION: f32 = 0.75;
const DEFAULT_CHORDAL_TOLERANCE: f32 = 0.01;
const DEFAULT_MOTOR_POWER_TIMEOUT: f32 = 2.0;
const DEFAULT_OVERRIDE_FACTOR: f32 = 1.0;
const DEFAULT_SPINDLE_DWELL: f32 = 1.0;
const DEFAULT_STATUS_INTERVAL_MS: u32 = 250;
const DEFAULT_JSON_VERBOSITY: u8 = 4;
const DEFAULT_STATUS_VERBOSITY: u8 = 1;
const DEFAULT_TEXT_VERBOSITY: u8 = 1;
const DEFAULT_BAUD: u8 = 5;
const DEFAULT_UNITS_MM: u8 = 1;
const DEFAULT_PATH_CONTINUOUS: u8 = 2;
const DEFAULT_COORD_G54: u8 = 1;

/// Lowest accepted junction aggression
pub const JUNCTION_AGGRESSION_MIN: f32 = 0.001;
/// Highest accepted junction aggression
pub const JUNCTION_AGGRESSION_MAX: f32 = 10.0;
/// Shortest motor power timeout in seconds
pub const MOTOR_TIMEOUT_MIN: f32 = 0.1;
/// Longest motor power timeout in seconds
pub const MOTOR_TIMEOUT_MAX: f32 = 4_294_967.0;
/// Lowest feed, traverse and spindle override factor
pub const OVERRIDE_MIN: f32 = 0.05;
/// Highest feed, traverse and spindle override factor
pub const OVERRIDE_MAX: f32 = 2.0;
/// Status reports are never sent more often than this
pub const STATUS_INTERVAL_MIN_MS: u32 = 100;
/// Highest JSON verbosity (silent .. verbose)
pub const JSON_VERBOSITY_MAX: u8 = 5;
/// Highest flow control setting (off, XON/XOFF, RTS/CTS)
pub const FLOW_CONTROL_MAX: u8 = 2;

/// Baud rate names by setting, index 0 is unused
pub const BAUD_RATES: [&str; 7] = ["0", "9600", "19200", "38400", "57600", "115200", "230400"];

/// Addressable `sys` fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemField {
    FirmwareBuild,
    FirmwareVersion,
    HardwarePlatform,
    HardwareVersion,
    JunctionAggression,
    ChordalTolerance,
    SoftLimitEnable,
    HardLimitEnable,
    SafetyInterlockEnable,
    MotorPowerTimeout,
    M48Enable,
    FeedOverrideEnable,
    FeedOverrideFactor,
    TraverseOverrideEnable,
    TraverseOverrideFactor,
    DefaultPlane,
    DefaultUnits,
    DefaultCoordSystem,
    DefaultPathControl,
    DefaultDistanceMode,
}

/// General system settings
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSettings {
    pub fw_build: f32,
    pub fw_version: f32,
    pub hw_platform: f32,
    pub hw_version: f32,
    pub junction_aggression: f32,
    pub chordal_tolerance: f32,
    pub soft_limit_enable: u8,
    pub hard_limit_enable: u8,
    pub safety_interlock_enable: u8,
    pub motor_power_timeout: f32,
    pub m48_enable: u8,
    pub mfo_enable: u8,
    pub mfo_factor: f32,
    pub mto_enable: u8,
    pub mto_factor: f32,
    pub default_plane: u8,
    pub default_units: u8,
    pub default_coord_system: u8,
    pub default_path_control: u8,
    pub default_distance_mode: u8,
    /// Board signature reported as `id`
    pub device_id: &'static str,
    /// Set by `flash`/`boot`; the platform layer jumps to the loader
    pub bootloader_requested: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            fw_build: FIRMWARE_BUILD,
            fw_version: FIRMWARE_VERSION,
            hw_platform: HARDWARE_PLATFORM,
            hw_version: DEFAULT_HARDWARE_VERSION,
            junction_aggression: DEFAULT_JUNCTION_AGGRESSION,
            chordal_tolerance: DEFAULT_CHORDAL_TOLERANCE,
            soft_limit_enable: 0,
            hard_limit_enable: 0,
            safety_interlock_enable: 1,
            motor_power_timeout: DEFAULT_MOTOR_POWER_TIMEOUT,
            m48_enable: 1,
            mfo_enable: 0,
            mfo_factor: DEFAULT_OVERRIDE_FACTOR,
            mto_enable: 0,
            mto_factor: DEFAULT_OVERRIDE_FACTOR,
            default_plane: 0,
            default_units: DEFAULT_UNITS_MM,
            default_coord_system: DEFAULT_COORD_G54,
            default_path_control: DEFAULT_PATH_CONTINUOUS,
            default_distance_mode: 0,
            device_id: "0000-0000-0000",
            bootloader_requested: false,
        }
    }
}

impl SystemSettings {
    pub fn cell(&mut self, field: SystemField) -> Cell<'_> {
        match field {
            SystemField::FirmwareBuild => Cell::Float(&mut self.fw_build),
            SystemField::FirmwareVersion => Cell::Float(&mut self.fw_version),
            SystemField::HardwarePlatform => Cell::Float(&mut self.hw_platform),
            SystemField::HardwareVersion => Cell::Float(&mut self.hw_version),
            SystemField::JunctionAggression => Cell::Float(&mut self.junction_aggression),
            SystemField::ChordalTolerance => Cell::Float(&mut self.chordal_tolerance),
            SystemField::SoftLimitEnable => Cell::Byte(&mut self.soft_limit_enable),
            SystemField::HardLimitEnable => Cell::Byte(&mut self.hard_limit_enable),
            SystemField::SafetyInterlockEnable => Cell::Byte(&mut self.safety_interlock_enable),
            SystemField::MotorPowerTimeout => Cell::Float(&mut self.motor_power_timeout),
            SystemField::M48Enable => Cell::Byte(&mut self.m48_enable),
            SystemField::FeedOverrideEnable => Cell::Byte(&mut self.mfo_enable),
            SystemField::FeedOverrideFactor => Cell::Float(&mut self.mfo_factor),
            SystemField::TraverseOverrideEnable => Cell::Byte(&mut self.mto_enable),
            SystemField::TraverseOverrideFactor => Cell::Float(&mut self.mto_factor),
            SystemField::DefaultPlane => Cell::Byte(&mut self.default_plane),
            SystemField::DefaultUnits => Cell::Byte(&mut self.default_units),
            SystemField::DefaultCoordSystem => Cell::Byte(&mut self.default_coord_system),
            SystemField::DefaultPathControl => Cell::Byte(&mut self.default_path_control),
            SystemField::DefaultDistanceMode => Cell::Byte(&mut self.default_distance_mode),
        }
    }
}

/// Addressable spindle fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpindleField {
    EnablePolarity,
    DirPolarity,
    PauseOnHold,
    DwellSeconds,
    OverrideEnable,
    OverrideFactor,
    Enable,
    Direction,
    Speed,
}

/// Spindle configuration and live state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpindleSettings {
    pub enable_polarity: u8,
    pub dir_polarity: u8,
    pub pause_on_hold: u8,
    pub dwell_seconds: f32,
    pub sso_enable: u8,
    pub sso_factor: f32,
    pub enable: u8,
    /// 0 = clockwise, 1 = counter-clockwise
    pub direction: u8,
    pub speed: f32,
}

impl Default for SpindleSettings {
    fn default() -> Self {
        Self {
            enable_polarity: 1,
            dir_polarity: 0,
            pause_on_hold: 1,
            dwell_seconds: DEFAULT_SPINDLE_DWELL,
            sso_enable: 0,
            sso_factor: DEFAULT_OVERRIDE_FACTOR,
            enable: 0,
            direction: 0,
            speed: 0.0,
        }
    }
}

impl SpindleSettings {
    pub fn cell(&mut self, field: SpindleField) -> Cell<'_> {
        match field {
            SpindleField::EnablePolarity => Cell::Byte(&mut self.enable_polarity),
            SpindleField::DirPolarity => Cell::Byte(&mut self.dir_polarity),
            SpindleField::PauseOnHold => Cell::Byte(&mut self.pause_on_hold),
            SpindleField::DwellSeconds => Cell::Float(&mut self.dwell_seconds),
            SpindleField::OverrideEnable => Cell::Byte(&mut self.sso_enable),
            SpindleField::OverrideFactor => Cell::Float(&mut self.sso_factor),
            SpindleField::Enable => Cell::Byte(&mut self.enable),
            SpindleField::Direction => Cell::Byte(&mut self.direction),
            SpindleField::Speed => Cell::Float(&mut self.speed),
        }
    }
}

/// Addressable coolant fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoolantField {
    FloodPolarity,
    MistPolarity,
    PauseOnHold,
    MistEnable,
    FloodEnable,
}

/// Coolant configuration and live state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoolantSettings {
    pub flood_polarity: u8,
    pub mist_polarity: u8,
    pub pause_on_hold: u8,
    pub mist_enable: u8,
    pub flood_enable: u8,
}

impl Default for CoolantSettings {
    fn default() -> Self {
        Self {
            flood_polarity: 1,
            mist_polarity: 1,
            pause_on_hold: 1,
            mist_enable: 0,
            flood_enable: 0,
        }
    }
}

impl CoolantSettings {
    pub fn cell(&mut self, field: CoolantField) -> Cell<'_> {
        match field {
            CoolantField::FloodPolarity => Cell::Byte(&mut self.flood_polarity),
            CoolantField::MistPolarity => Cell::Byte(&mut self.mist_polarity),
            CoolantField::PauseOnHold => Cell::Byte(&mut self.pause_on_hold),
            CoolantField::MistEnable => Cell::Byte(&mut self.mist_enable),
            CoolantField::FloodEnable => Cell::Byte(&mut self.flood_enable),
        }
    }
}

/// Addressable communication fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommField {
    TextVerbosity,
    CommMode,
    JsonVerbosity,
    JsonSyntax,
    QueueReportVerbosity,
    StatusReportVerbosity,
    StatusReportInterval,
    ExpandCr,
    EnableEcho,
    FlowControl,
    Baud,
    RxFree,
}

/// Communication and reporting settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommSettings {
    pub text_verbosity: u8,
    /// 0 = text mode, 1 = JSON mode
    pub comm_mode: u8,
    pub json_verbosity: u8,
    /// 0 = relaxed, 1 = strict
    pub json_syntax: u8,
    pub queue_report_verbosity: u8,
    pub status_report_verbosity: u8,
    pub status_report_interval: u32,
    pub expand_cr: u8,
    pub enable_echo: u8,
    pub flow_control: u8,
    pub baud: u8,
    /// Set when `baud` changed; the serial driver applies it once TX drains
    pub baud_change_pending: bool,
    /// Free bytes in the receive buffer
    pub rx_free: u32,
}

impl Default for CommSettings {
    fn default() -> Self {
        Self {
            text_verbosity: DEFAULT_TEXT_VERBOSITY,
            comm_mode: 1,
            json_verbosity: DEFAULT_JSON_VERBOSITY,
            json_syntax: 0,
            queue_report_verbosity: 0,
            status_report_verbosity: DEFAULT_STATUS_VERBOSITY,
            status_report_interval: DEFAULT_STATUS_INTERVAL_MS,
            expand_cr: 0,
            enable_echo: 0,
            flow_control: 1,
            baud: DEFAULT_BAUD,
            baud_change_pending: false,
            rx_free: 254,
        }
    }
}

impl CommSettings {
    pub fn cell(&mut self, field: CommField) -> Cell<'_> {
        match field {
            CommField::TextVerbosity => Cell::Byte(&mut self.text_verbosity),
            CommField::CommMode => Cell::Byte(&mut self.comm_mode),
            CommField::JsonVerbosity => Cell::Byte(&mut self.json_verbosity),
            CommField::JsonSyntax => Cell::Byte(&mut self.json_syntax),
            CommField::QueueReportVerbosity => Cell::Byte(&mut self.queue_report_verbosity),
            CommField::StatusReportVerbosity => Cell::Byte(&mut self.status_report_verbosity),
            CommField::StatusReportInterval => Cell::Word(&mut self.status_report_interval),
            CommField::ExpandCr => Cell::Byte(&mut self.expand_cr),
            CommField::EnableEcho => Cell::Byte(&mut self.enable_echo),
            CommField::FlowControl => Cell::Byte(&mut self.flow_control),
            CommField::Baud => Cell::Byte(&mut self.baud),
            CommField::RxFree => Cell::Word(&mut self.rx_free),
        }
    }

    /// Consume a pending baud change, returning the new setting
    ///
    /// Called by the serial driver once the notice has been transmitted.
    pub fn take_baud_change(&mut self) -> Option<u8> {
        if !self.baud_change_pending {
            return None;
        }
        self.baud_change_pending = false;
        Some(self.baud)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baud_change_consumed_once() {
        let mut comm = CommSettings::default();
        assert_eq!(comm.take_baud_change(), None);

        comm.baud = 6;
        comm.baud_change_pending = true;
        assert_eq!(comm.take_baud_change(), Some(6));
        assert_eq!(comm.take_baud_change(), None);
    }

    #[test]
    fn test_system_defaults_within_limits() {
        let sys = SystemSettings::default();
        assert!(sys.junction_aggression >= JUNCTION_AGGRESSION_MIN);
        assert!(sys.junction_aggression <= JUNCTION_AGGRESSION_MAX);
        assert!(sys.motor_power_timeout >= MOTOR_TIMEOUT_MIN);
        assert!(sys.mfo_factor >= OVERRIDE_MIN && sys.mfo_factor <= OVERRIDE_MAX);
    }
}
