//! Coordinate system offsets and stored positions

use super::axis::AXES;

/// Number of work coordinate systems (G54-G59)
pub const COORD_SYSTEMS: usize = 6;

/// Group tokens of the work coordinate systems
pub const COORD_SYSTEM_TOKENS: [&str; COORD_SYSTEMS] = ["g54", "g55", "g56", "g57", "g58", "g59"];

/// Work offsets and stored positions, all in canonical units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offsets {
    /// G54-G59 offsets, indexed [system][axis]
    pub coord: [[f32; AXES]; COORD_SYSTEMS],
    /// G92 origin offset
    pub origin: [f32; AXES],
    /// G28 stored position
    pub g28: [f32; AXES],
    /// G30 stored position
    pub g30: [f32; AXES],
}
