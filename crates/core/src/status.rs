//! Status codes returned by registry operations
//!
//! Every get, set and group operation reports its outcome through [`Status`].
//! Failures never unwind: a setter that rejects its input leaves backing
//! storage untouched and returns an error status instead.

/// Outcome of a registry operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Operation completed normally
    Ok,
    /// Nothing to do (e.g. a set with no actionable change)
    Noop,
    /// List iteration reached its terminating sentinel
    Complete,
    /// List iteration stopped at the object limit before reaching the sentinel
    Truncated,
    /// Value outside the range accepted by the operation
    InputValueUnsupported,
    /// Token does not resolve to any table entry
    UnrecognizedName,
    /// Value has the wrong type for the target (e.g. string into a float)
    ValueTypeError,
    /// A bounded list or string ran out of room
    BufferFull,
    /// Entry has no setter
    ParameterIsReadOnly,
    /// Entry is inconsistent with the machine it targets
    InternalError,
}

impl Status {
    /// True for outcomes that represent a failure
    pub fn is_error(self) -> bool {
        !matches!(self, Status::Ok | Status::Noop | Status::Complete)
    }

    /// Numeric code reported alongside responses
    pub fn code(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Noop => 3,
            Status::Complete => 4,
            Status::Truncated => 5,
            Status::InternalError => 8,
            Status::BufferFull => 20,
            Status::UnrecognizedName => 100,
            Status::ValueTypeError => 103,
            Status::InputValueUnsupported => 106,
            Status::ParameterIsReadOnly => 107,
        }
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::Noop => write!(f, "no operation performed"),
            Status::Complete => write!(f, "complete"),
            Status::Truncated => write!(f, "list truncated at object limit"),
            Status::InputValueUnsupported => write!(f, "unsupported input value"),
            Status::UnrecognizedName => write!(f, "unrecognized name"),
            Status::ValueTypeError => write!(f, "value type error"),
            Status::BufferFull => write!(f, "buffer full"),
            Status::ParameterIsReadOnly => write!(f, "parameter is read-only"),
            Status::InternalError => write!(f, "internal error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(!Status::Ok.is_error());
        assert!(!Status::Noop.is_error());
        assert!(!Status::Complete.is_error());
        assert!(Status::Truncated.is_error());
        assert!(Status::InputValueUnsupported.is_error());
        assert!(Status::UnrecognizedName.is_error());
    }

    #[test]
    fn test_codes_are_distinct() {
        let all = [
            Status::Ok,
            Status::Noop,
            Status::Complete,
            Status::Truncated,
            Status::InputValueUnsupported,
            Status::UnrecognizedName,
            Status::ValueTypeError,
            Status::BufferFull,
            Status::ParameterIsReadOnly,
            Status::InternalError,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a.code(), b.code());
            }
        }
    }
}
