//! PWM channel settings (spindle speed output)

use super::Cell;

const DEFAULT_FREQUENCY: f32 = 100.0;
const DEFAULT_SPEED_LO: f32 = 1_000.0;
const DEFAULT_SPEED_HI: f32 = 2_000.0;
const DEFAULT_PHASE_LO: f32 = 0.125;
const DEFAULT_PHASE_HI: f32 = 0.2;
const DEFAULT_PHASE_OFF: f32 = 0.1;

/// Addressable PWM fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmField {
    Frequency,
    CwSpeedLo,
    CwSpeedHi,
    CwPhaseLo,
    CwPhaseHi,
    CcwSpeedLo,
    CcwSpeedHi,
    CcwPhaseLo,
    CcwPhaseHi,
    PhaseOff,
}

/// Speed-to-duty-cycle mapping for one PWM output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PwmChannel {
    /// Output frequency in Hz
    pub frequency: f32,
    pub cw_speed_lo: f32,
    pub cw_speed_hi: f32,
    pub cw_phase_lo: f32,
    pub cw_phase_hi: f32,
    pub ccw_speed_lo: f32,
    pub ccw_speed_hi: f32,
    pub ccw_phase_lo: f32,
    pub ccw_phase_hi: f32,
    /// Duty cycle when the spindle is off
    pub phase_off: f32,
}

impl Default for PwmChannel {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            cw_speed_lo: DEFAULT_SPEED_LO,
            cw_speed_hi: DEFAULT_SPEED_HI,
            cw_phase_lo: DEFAULT_PHASE_LO,
            cw_phase_hi: DEFAULT_PHASE_HI,
            ccw_speed_lo: 0.0,
            ccw_speed_hi: 0.0,
            ccw_phase_lo: DEFAULT_PHASE_LO,
            ccw_phase_hi: DEFAULT_PHASE_HI,
            phase_off: DEFAULT_PHASE_OFF,
        }
    }
}

impl PwmChannel {
    pub fn cell(&mut self, field: PwmField) -> Cell<'_> {
        let value = match field {
            PwmField::Frequency => &mut self.frequency,
            PwmField::CwSpeedLo => &mut self.cw_speed_lo,
            PwmField::CwSpeedHi => &mut self.cw_speed_hi,
            PwmField::CwPhaseLo => &mut self.cw_phase_lo,
            PwmField::CwPhaseHi => &mut self.cw_phase_hi,
            PwmField::CcwSpeedLo => &mut self.ccw_speed_lo,
            PwmField::CcwSpeedHi => &mut self.ccw_speed_hi,
            PwmField::CcwPhaseLo => &mut self.ccw_phase_lo,
            PwmField::CcwPhaseHi => &mut self.ccw_phase_hi,
            PwmField::PhaseOff => &mut self.phase_off,
        };
        Cell::Float(value)
    }

    /// Phase fields are duty cycles and must stay within 0..=1
    pub fn is_phase(field: PwmField) -> bool {
        matches!(
            field,
            PwmField::CwPhaseLo
                | PwmField::CwPhaseHi
                | PwmField::CcwPhaseLo
                | PwmField::CcwPhaseHi
                | PwmField::PhaseOff
        )
    }
}
