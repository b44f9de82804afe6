//! Inch / millimeter conversion
//!
//! Backing storage is always canonical millimeters (degrees for rotary axes).
//! Values are converted on the way in by [`set_flu`] and on the way out, for
//! display only, by [`preprocess_float`].

use crate::nv::{Descriptor, NvFlags, NvObj, NvValue};
use crate::status::Status;

pub const MM_PER_INCH: f32 = 25.4;
pub const INCHES_PER_MM: f32 = 1.0 / MM_PER_INCH;

/// External unit mode (G20 / G21)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitsMode {
    Inches,
    Millimeters,
}

impl UnitsMode {
    pub fn is_inches(self) -> bool {
        self == UnitsMode::Inches
    }
}

/// Store a float given in external units
///
/// Converts to millimeters when `units` is inches, writes `target`, and
/// leaves the canonical value in `nv` so echo and persistence see what was
/// stored. The conversion is applied to whatever it is handed; rotary axes
/// must not be routed here.
pub fn set_flu(nv: &mut NvObj, desc: &Descriptor, units: UnitsMode, target: &mut f32) -> Status {
    let Some(mut value) = nv.value.as_f32() else {
        return Status::ValueTypeError;
    };
    if units.is_inches() {
        value *= MM_PER_INCH;
    }
    *target = value;
    nv.value = NvValue::Float(value);
    nv.precision = desc.precision;
    Status::Ok
}

/// Convert a canonical value for display
///
/// Only touches floats of descriptors flagged [`NvFlags::CONVERT`]. NaN and
/// infinities pass through unchanged.
pub fn preprocess_float(nv: &mut NvObj, desc: &Descriptor, units: UnitsMode) {
    let NvValue::Float(value) = nv.value else {
        return;
    };
    if value.is_nan() || value.is_infinite() {
        return;
    }
    if desc.flags.contains(NvFlags::CONVERT) && units.is_inches() {
        nv.value = NvValue::Float(value * INCHES_PER_MM);
    }
}

/// Round to the display precision
pub fn round_to(value: f32, precision: u8) -> f32 {
    let scale = libm::powf(10.0, precision as f32);
    libm::roundf(value * scale) / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nv::Descriptor;

    fn converting() -> Descriptor {
        Descriptor::float("x", "xtm", NvFlags::FIPC, 3, "travel maximum").unwrap()
    }

    fn plain() -> Descriptor {
        Descriptor::float("a", "atm", NvFlags::FIP, 3, "travel maximum").unwrap()
    }

    #[test]
    fn test_set_flu_inches() {
        let desc = converting();
        let mut nv = NvObj::with_token("xtm");
        nv.value = NvValue::Float(1.0);
        let mut target = 0.0;

        assert_eq!(set_flu(&mut nv, &desc, UnitsMode::Inches, &mut target), Status::Ok);
        assert!((target - 25.4).abs() < 1e-5);
        assert!((nv.value.as_f32().unwrap() - 25.4).abs() < 1e-5);
        assert_eq!(nv.precision, 3);
    }

    #[test]
    fn test_set_flu_mm_identity() {
        let desc = converting();
        let mut nv = NvObj::with_token("xtm");
        nv.value = NvValue::Int(42);
        let mut target = 0.0;

        assert_eq!(set_flu(&mut nv, &desc, UnitsMode::Millimeters, &mut target), Status::Ok);
        assert_eq!(target, 42.0);
        assert_eq!(nv.value, NvValue::Float(42.0));
    }

    #[test]
    fn test_set_flu_rejects_string() {
        let desc = converting();
        let mut nv = NvObj::with_token("xtm");
        nv.value = NvValue::Str(heapless::String::try_from("abc").unwrap());
        let mut target = 7.0;

        assert_eq!(
            set_flu(&mut nv, &desc, UnitsMode::Inches, &mut target),
            Status::ValueTypeError
        );
        assert_eq!(target, 7.0);
    }

    #[test]
    fn test_preprocess_non_finite_passthrough() {
        let desc = converting();
        for units in [UnitsMode::Inches, UnitsMode::Millimeters] {
            let mut nv = NvObj::new();
            nv.value = NvValue::Float(f32::NAN);
            preprocess_float(&mut nv, &desc, units);
            assert!(nv.value.as_f32().unwrap().is_nan());

            nv.value = NvValue::Float(f32::NEG_INFINITY);
            preprocess_float(&mut nv, &desc, units);
            assert_eq!(nv.value, NvValue::Float(f32::NEG_INFINITY));
        }
    }

    #[test]
    fn test_preprocess_respects_flag() {
        let mut nv = NvObj::new();
        nv.value = NvValue::Float(25.4);
        preprocess_float(&mut nv, &converting(), UnitsMode::Inches);
        assert!((nv.value.as_f32().unwrap() - 1.0).abs() < 1e-6);

        nv.value = NvValue::Float(25.4);
        preprocess_float(&mut nv, &plain(), UnitsMode::Inches);
        assert_eq!(nv.value, NvValue::Float(25.4));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
