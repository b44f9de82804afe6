//! Status report configuration, user data and job id words

/// Persisted status report slots
pub const STATUS_REPORT_LEN: usize = 40;

/// Tokens reported by default, in order
pub const DEFAULT_STATUS_TOKENS: [&str; 13] = [
    "line", "posx", "posy", "posz", "posa", "feed", "vel", "unit", "coor", "dist", "frmo", "momo",
    "stat",
];

/// User data groups (uda..udd)
pub const USER_DATA_GROUPS: usize = 4;

/// Words per user data group
pub const USER_DATA_WORDS: usize = 4;

/// Words in the job id
pub const JOB_ID_WORDS: usize = 4;

/// Marks an unused status report slot
pub const SLOT_UNUSED: u32 = 0;

/// Status report member list
///
/// Each slot holds the table index of a reported token. Index 0 is the
/// firmware build and never a sensible report member, so it doubles as the
/// unused marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReportSettings {
    pub slots: [u32; STATUS_REPORT_LEN],
}

impl Default for StatusReportSettings {
    fn default() -> Self {
        Self {
            slots: [SLOT_UNUSED; STATUS_REPORT_LEN],
        }
    }
}

impl StatusReportSettings {
    /// Used slots in report order
    pub fn members(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.iter().copied().filter(|&s| s != SLOT_UNUSED)
    }

    pub fn clear(&mut self) {
        self.slots = [SLOT_UNUSED; STATUS_REPORT_LEN];
    }

    /// Append a member, returning false when all slots are taken
    pub fn push(&mut self, index: u32) -> bool {
        match self.slots.iter_mut().find(|s| **s == SLOT_UNUSED) {
            Some(slot) => {
                *slot = index;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, index: u32) -> bool {
        index != SLOT_UNUSED && self.slots.contains(&index)
    }
}

/// Opaque words a host may store on the controller
pub type UserData = [[u32; USER_DATA_WORDS]; USER_DATA_GROUPS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_fills_in_order() {
        let mut sr = StatusReportSettings::default();
        assert!(sr.push(7));
        assert!(sr.push(9));
        let members: heapless::Vec<u32, STATUS_REPORT_LEN> = sr.members().collect();
        assert_eq!(members.as_slice(), &[7, 9]);
    }

    #[test]
    fn test_push_full() {
        let mut sr = StatusReportSettings::default();
        for i in 1..=STATUS_REPORT_LEN as u32 {
            assert!(sr.push(i));
        }
        assert!(!sr.push(99));
        sr.clear();
        assert_eq!(sr.members().count(), 0);
    }

    #[test]
    fn test_unused_marker_never_member() {
        let sr = StatusReportSettings::default();
        assert!(!sr.contains(SLOT_UNUSED));
    }
}
