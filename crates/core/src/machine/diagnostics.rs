//! Runtime diagnostics
//!
//! Planner targets and per-motor step counters exposed read-only through the
//! `_te`, `_tr`, `_ts`, `_ps`, `_cs`, `_es`, `_xs` and `_fe` groups.

use super::axis::AXES;
use super::motor::MOTORS;

/// Diagnostic groups, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagField {
    /// Runtime target per axis
    Target,
    /// Target of the running block per axis
    RuntimeTarget,
    TargetSteps,
    PositionSteps,
    CommandedSteps,
    EncoderSteps,
    CorrectedSteps,
    FollowingError,
}

impl DiagField {
    /// Per-axis fields; the rest are per motor
    pub fn is_per_axis(self) -> bool {
        matches!(self, DiagField::Target | DiagField::RuntimeTarget)
    }

    /// Group token, also the prefix of every member token
    pub fn group(self) -> &'static str {
        match self {
            DiagField::Target => "_te",
            DiagField::RuntimeTarget => "_tr",
            DiagField::TargetSteps => "_ts",
            DiagField::PositionSteps => "_ps",
            DiagField::CommandedSteps => "_cs",
            DiagField::EncoderSteps => "_es",
            DiagField::CorrectedSteps => "_xs",
            DiagField::FollowingError => "_fe",
        }
    }

    pub const ALL: [DiagField; 8] = [
        DiagField::Target,
        DiagField::RuntimeTarget,
        DiagField::TargetSteps,
        DiagField::PositionSteps,
        DiagField::CommandedSteps,
        DiagField::EncoderSteps,
        DiagField::CorrectedSteps,
        DiagField::FollowingError,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Diagnostics {
    pub target: [f32; AXES],
    pub runtime_target: [f32; AXES],
    pub target_steps: [f32; MOTORS],
    pub position_steps: [f32; MOTORS],
    pub commanded_steps: [f32; MOTORS],
    pub encoder_steps: [f32; MOTORS],
    pub corrected_steps: [f32; MOTORS],
    pub following_error: [f32; MOTORS],
    /// Set by `_dam`; the host side dumps the model and clears it
    pub dump_requested: bool,
}

impl Diagnostics {
    /// Reference to one value, None when `channel` is out of range
    pub fn value_mut(&mut self, field: DiagField, channel: usize) -> Option<&mut f32> {
        let row = match field {
            DiagField::Target => &mut self.target,
            DiagField::RuntimeTarget => &mut self.runtime_target,
            DiagField::TargetSteps => &mut self.target_steps,
            DiagField::PositionSteps => &mut self.position_steps,
            DiagField::CommandedSteps => &mut self.commanded_steps,
            DiagField::EncoderSteps => &mut self.encoder_steps,
            DiagField::CorrectedSteps => &mut self.corrected_steps,
            DiagField::FollowingError => &mut self.following_error,
        };
        row.get_mut(channel)
    }

    /// Zero the step counters (`clc`)
    pub fn clear_counters(&mut self) {
        self.target_steps = [0.0; MOTORS];
        self.position_steps = [0.0; MOTORS];
        self.commanded_steps = [0.0; MOTORS];
        self.encoder_steps = [0.0; MOTORS];
        self.corrected_steps = [0.0; MOTORS];
        self.following_error = [0.0; MOTORS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_counters_keeps_targets() {
        let mut diag = Diagnostics::default();
        diag.target[0] = 10.0;
        diag.encoder_steps[2] = 400.0;
        diag.clear_counters();
        assert_eq!(diag.target[0], 10.0);
        assert_eq!(diag.encoder_steps[2], 0.0);
    }

    #[test]
    fn test_value_out_of_range() {
        let mut diag = Diagnostics::default();
        assert!(diag.value_mut(DiagField::FollowingError, MOTORS).is_none());
        assert!(diag.value_mut(DiagField::Target, AXES - 1).is_some());
    }

    #[test]
    fn test_corrected_steps_group() {
        assert_eq!(DiagField::CorrectedSteps.group(), "_xs");
        assert!(!DiagField::CorrectedSteps.is_per_axis());
    }
}
