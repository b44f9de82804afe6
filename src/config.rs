//! Build-time capability configuration
//!
//! `build.rs` forwards the `GANTRY_*` environment variables (or their
//! defaults) as compile-time strings. They are parsed here into the
//! [`Capabilities`] the registry table is built for.

use gantry_core::{Capabilities, CapabilityError, Platform};

use crate::log_warn;

/// Capability set selected when the firmware was built
///
/// Values that fail to parse fall back to the core defaults; counts that
/// parse but fall outside the supported hardware are rejected.
pub fn build_capabilities() -> Result<Capabilities, CapabilityError> {
    capabilities_from(
        env!("GANTRY_MOTORS"),
        env!("GANTRY_INPUTS"),
        env!("GANTRY_USER_DATA"),
        env!("GANTRY_DIAGNOSTICS"),
        env!("GANTRY_PLATFORM"),
    )
}

/// Parse a capability set from its textual settings
pub fn capabilities_from(
    motors: &str,
    inputs: &str,
    user_data: &str,
    diagnostics: &str,
    platform: &str,
) -> Result<Capabilities, CapabilityError> {
    let defaults = Capabilities::default();

    let motors = motors.trim().parse::<u8>().unwrap_or_else(|_| {
        log_warn!("Unparsable motor count, using {}", defaults.motors);
        defaults.motors
    });
    let input_channels = inputs.trim().parse::<u8>().unwrap_or_else(|_| {
        log_warn!("Unparsable input count, using {}", defaults.input_channels);
        defaults.input_channels
    });
    let user_data = user_data.trim().parse::<bool>().unwrap_or(defaults.user_data);
    let diagnostics = diagnostics
        .trim()
        .parse::<bool>()
        .unwrap_or(defaults.diagnostics);
    let platform = parse_platform(platform).unwrap_or(defaults.platform);

    let caps = defaults
        .with_motors(motors)
        .with_input_channels(input_channels)
        .with_user_data(user_data)
        .with_diagnostics(diagnostics)
        .with_platform(platform);
    caps.validate()?;
    Ok(caps)
}

fn parse_platform(text: &str) -> Option<Platform> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("arm") {
        Some(Platform::Arm)
    } else if text.eq_ignore_ascii_case("avr") {
        Some(Platform::Avr)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_capabilities() {
        let caps = build_capabilities().unwrap();
        let motors = env!("GANTRY_MOTORS").trim().parse().unwrap_or(Capabilities::default().motors);
        assert_eq!(caps.motors, motors);
        assert!(gantry_core::Registry::new(caps).is_ok());
    }

    #[test]
    fn test_build_script_defaults() {
        let caps = capabilities_from("4", "8", "false", "false", "arm").unwrap();
        assert_eq!(caps, Capabilities::default());
    }

    #[test]
    fn test_parse_full_set() {
        let caps = capabilities_from("6", "9", "true", "true", "AVR").unwrap();
        assert_eq!(caps.motors, 6);
        assert_eq!(caps.input_channels, 9);
        assert!(caps.user_data);
        assert!(caps.diagnostics);
        assert_eq!(caps.platform, Platform::Avr);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let caps = capabilities_from("four", "", "maybe", "", "risc-v").unwrap();
        assert_eq!(caps, Capabilities::default());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(
            capabilities_from("7", "8", "false", "false", "arm"),
            Err(CapabilityError::MotorCount(7))
        );
        assert_eq!(
            capabilities_from("4", "12", "false", "false", "arm"),
            Err(CapabilityError::InputChannels(12))
        );
    }
}
