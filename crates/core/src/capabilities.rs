//! Machine capability descriptor
//!
//! Describes the hardware feature set the parameter table is built for.
//! The table shape (and every boundary derived from it) is a function of
//! these values, so they are fixed for the lifetime of a registry.

/// Minimum number of motors a board can carry
pub const MIN_MOTORS: u8 = 2;

/// Maximum number of motors a board can carry
pub const MAX_MOTORS: u8 = 6;

/// Minimum number of digital input channels
pub const MIN_INPUT_CHANNELS: u8 = 8;

/// Maximum number of digital input channels
pub const MAX_INPUT_CHANNELS: u8 = 9;

/// Default motor count
const DEFAULT_MOTORS: u8 = 4;

/// Default digital input channel count
const DEFAULT_INPUT_CHANNELS: u8 = 8;

/// Target processor family
///
/// A handful of entries only exist on one family (serial line settings on
/// the small 8-bit boards, power levels and extended B/C homing on ARM).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// 32-bit ARM boards
    Arm,
    /// 8-bit AVR boards with a USB serial bridge
    Avr,
}

/// Errors from capability validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityError {
    /// Motor count outside 2..=6
    MotorCount(u8),
    /// Input channel count outside 8..=9
    InputChannels(u8),
}

impl core::fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CapabilityError::MotorCount(n) => {
                write!(f, "motor count {} outside {}..={}", n, MIN_MOTORS, MAX_MOTORS)
            }
            CapabilityError::InputChannels(n) => write!(
                f,
                "input channel count {} outside {}..={}",
                n, MIN_INPUT_CHANNELS, MAX_INPUT_CHANNELS
            ),
        }
    }
}

/// Feature set a parameter table is constructed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Physical motors present (2-6)
    pub motors: u8,
    /// Digital input channels present (8 or 9)
    pub input_channels: u8,
    /// Include the four user-data groups (uda..udd)
    pub user_data: bool,
    /// Include diagnostic readouts and their groups
    pub diagnostics: bool,
    /// Processor family
    pub platform: Platform,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            motors: DEFAULT_MOTORS,
            input_channels: DEFAULT_INPUT_CHANNELS,
            user_data: false,
            diagnostics: false,
            platform: Platform::Arm,
        }
    }
}

impl Capabilities {
    /// Check counts against supported hardware
    pub fn validate(&self) -> Result<(), CapabilityError> {
        if !(MIN_MOTORS..=MAX_MOTORS).contains(&self.motors) {
            return Err(CapabilityError::MotorCount(self.motors));
        }
        if !(MIN_INPUT_CHANNELS..=MAX_INPUT_CHANNELS).contains(&self.input_channels) {
            return Err(CapabilityError::InputChannels(self.input_channels));
        }
        Ok(())
    }

    /// Builder-style motor count override
    pub fn with_motors(mut self, motors: u8) -> Self {
        self.motors = motors;
        self
    }

    /// Builder-style input channel override
    pub fn with_input_channels(mut self, channels: u8) -> Self {
        self.input_channels = channels;
        self
    }

    /// Builder-style user data toggle
    pub fn with_user_data(mut self, enabled: bool) -> Self {
        self.user_data = enabled;
        self
    }

    /// Builder-style diagnostics toggle
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Builder-style platform override
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn is_arm(&self) -> bool {
        self.platform == Platform::Arm
    }

    pub fn is_avr(&self) -> bool {
        self.platform == Platform::Avr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Capabilities::default().validate().is_ok());
    }

    #[test]
    fn test_motor_bounds() {
        assert_eq!(
            Capabilities::default().with_motors(1).validate(),
            Err(CapabilityError::MotorCount(1))
        );
        assert_eq!(
            Capabilities::default().with_motors(7).validate(),
            Err(CapabilityError::MotorCount(7))
        );
        assert!(Capabilities::default().with_motors(6).validate().is_ok());
        assert!(Capabilities::default().with_motors(2).validate().is_ok());
    }

    #[test]
    fn test_input_channel_bounds() {
        assert!(Capabilities::default()
            .with_input_channels(9)
            .validate()
            .is_ok());
        assert_eq!(
            Capabilities::default().with_input_channels(10).validate(),
            Err(CapabilityError::InputChannels(10))
        );
    }
}
