//! Text rendering and the responder seam
//!
//! Wire framing belongs to the caller. The registry hands finished lists to a
//! [`Responder`]; [`TextResponder`] is the plain text renderer used by the
//! command line and the tests.

use core::fmt;

use super::descriptor::{Descriptor, PrintOp};
use super::object::{NvList, NvObj, NvValue};
use super::registry::Registry;
use crate::status::Status;
use crate::units::{preprocess_float, UnitsMode};

/// Text layout requested for a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    NoPrint,
    /// `token:value` pairs on one line
    InlinePairs,
    /// Bare values on one line
    InlineValues,
    /// One labelled line per value
    MultilineFormatted,
}

/// JSON envelope requested for a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    /// Wrapped in a response with footer
    Response,
    /// Bare object
    ObjectOnly,
}

/// A finished list ready to render
pub struct Response<'a> {
    pub status: Status,
    pub list: &'a NvList,
    pub registry: &'a Registry,
    pub units: UnitsMode,
    pub text_format: TextFormat,
    pub json_format: JsonFormat,
}

/// Consumer of rendered responses
pub trait Responder {
    fn respond(&mut self, response: &Response<'_>);
}

/// Write the bare value of `nv` as it should be displayed
fn write_value(
    desc: &Descriptor,
    nv: &NvObj,
    units: UnitsMode,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    match (&desc.print, &nv.value) {
        (PrintOp::Nul, _) | (_, NvValue::Null) | (_, NvValue::Parent) => Ok(()),
        (PrintOp::Float, NvValue::Float(_)) => {
            let mut shown = nv.clone();
            preprocess_float(&mut shown, desc, units);
            match shown.value {
                NvValue::Float(v) => write!(out, "{:.*}", desc.precision as usize, v),
                _ => Ok(()),
            }
        }
        (PrintOp::Data, value) => match value.as_i64() {
            Some(bits) => write!(out, "0x{:08x}", bits as u32),
            None => Ok(()),
        },
        (_, NvValue::Str(text)) => out.write_str(text),
        (PrintOp::Choice(names), value) => match value.as_i64() {
            Some(v) => {
                write!(out, "{}", v)?;
                match usize::try_from(v).ok().and_then(|i| names.get(i)) {
                    Some(name) => write!(out, " [{}]", name),
                    None => Ok(()),
                }
            }
            None => Ok(()),
        },
        (_, value) => match value {
            NvValue::Float(v) => write!(out, "{:.*}", desc.precision as usize, v),
            NvValue::Int(v) => write!(out, "{}", v),
            NvValue::Data(v) => write!(out, "{}", v),
            _ => Ok(()),
        },
    }
}

/// Write one labelled line for `nv`
///
/// `[token] label value units`. Entries without a printer and group
/// parents write nothing.
pub fn print_nv(
    desc: &Descriptor,
    nv: &NvObj,
    units: UnitsMode,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    if desc.print == PrintOp::Nul || nv.is_parent() {
        return Ok(());
    }
    write!(out, "[{}]", desc.token)?;
    if !desc.label.is_empty() {
        write!(out, " {}", desc.label)?;
    }
    out.write_char(' ')?;
    write_value(desc, nv, units, out)?;
    let label = desc.units.text(units);
    if !label.is_empty() {
        write!(out, " {}", label)?;
    }
    out.write_char('\n')
}

/// Write every object of `list` in the requested layout
pub fn print_list(
    registry: &Registry,
    list: &NvList,
    units: UnitsMode,
    format: TextFormat,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    let printable = list.iter().filter_map(|nv| {
        let desc = registry.descriptor(nv.index?)?;
        (!nv.is_parent() && desc.print != PrintOp::Nul).then_some((desc, nv))
    });
    match format {
        TextFormat::NoPrint => Ok(()),
        TextFormat::MultilineFormatted => {
            for (desc, nv) in printable {
                print_nv(desc, nv, units, out)?;
            }
            Ok(())
        }
        TextFormat::InlinePairs | TextFormat::InlineValues => {
            for (n, (desc, nv)) in printable.enumerate() {
                if n > 0 {
                    out.write_str(",")?;
                }
                if format == TextFormat::InlinePairs {
                    write!(out, "{}:", nv.token)?;
                }
                write_value(desc, nv, units, out)?;
            }
            out.write_char('\n')
        }
    }
}

/// Plain text responder over any [`fmt::Write`] sink
pub struct TextResponder<W: fmt::Write> {
    out: W,
}

impl<W: fmt::Write> TextResponder<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: fmt::Write> Responder for TextResponder<W> {
    fn respond(&mut self, response: &Response<'_>) {
        // a rejected value is not echoed; a truncated list still is
        if !response.status.is_error() || response.status == Status::Truncated {
            // a sink that refuses output has nowhere to report it
            let _ = print_list(
                response.registry,
                response.list,
                response.units,
                response.text_format,
                &mut self.out,
            );
        }
        for message in response.list.messages.iter() {
            let _ = writeln!(self.out, "{}", message);
        }
        if response.status.is_error() {
            let token = response.list.first().map(|nv| nv.token.as_str()).unwrap_or("");
            let _ = writeln!(
                self.out,
                "{}: {} ({})",
                token,
                response.status,
                response.status.code()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::String;

    use super::*;
    use crate::capabilities::Capabilities;
    use crate::machine::model::UNITS_INCHES;
    use crate::machine::Machine;
    use crate::nv::groups::get_group;

    fn registry() -> Registry {
        Registry::new(Capabilities::default()).unwrap()
    }

    fn line(reg: &Registry, m: &mut Machine, token: &str) -> String {
        let index = reg.index_of("", token).unwrap();
        let mut nv = reg.object(index);
        assert_eq!(reg.get_nv(&mut nv, m), Status::Ok);
        let mut out = String::new();
        print_nv(reg.descriptor(index).unwrap(), &nv, m.units_mode(), &mut out).unwrap();
        out
    }

    #[test]
    fn test_float_line_mm() {
        let reg = registry();
        let mut m = Machine::default();
        assert_eq!(line(&reg, &mut m, "xtm"), "[xtm] travel maximum 150.000 mm\n");
    }

    #[test]
    fn test_float_line_inches() {
        let reg = registry();
        let mut m = Machine::default();
        m.model.units_mode = UNITS_INCHES;
        m.axes[0].travel_max = 254.0;
        assert_eq!(line(&reg, &mut m, "xtm"), "[xtm] travel maximum 10.000 in\n");
        // storage is untouched by display conversion
        assert_eq!(m.axes[0].travel_max, 254.0);
    }

    #[test]
    fn test_choice_line() {
        let reg = registry();
        let mut m = Machine::default();
        assert_eq!(line(&reg, &mut m, "1po"), "[1po] polarity 0 [normal]\n");
        assert_eq!(line(&reg, &mut m, "unit"), "[unit] units 1 [mm]\n");
    }

    #[test]
    fn test_rotary_units_label() {
        let reg = registry();
        let mut m = Machine::default();
        m.model.units_mode = UNITS_INCHES;
        assert_eq!(line(&reg, &mut m, "avm"), "[avm] velocity maximum 172800 deg/min\n");
    }

    #[test]
    fn test_text_responder_group() {
        let reg = registry();
        let mut m = Machine::default();
        let mut list = NvList::with_token("", "p1");
        list.first_mut().unwrap().index = reg.index_of("", "p1");
        let status = get_group(&reg, &mut list, &mut m);
        let mut responder = TextResponder::new(String::new());
        responder.respond(&Response {
            status,
            list: &list,
            registry: &reg,
            units: m.units_mode(),
            text_format: TextFormat::MultilineFormatted,
            json_format: JsonFormat::Response,
        });
        let text = responder.into_inner();
        assert_eq!(text.lines().count(), 10);
        assert!(text.starts_with("[p1frq] pwm frequency 100 Hz\n"));
    }

    #[test]
    fn test_inline_pairs() {
        let reg = registry();
        let mut m = Machine::default();
        let mut list = NvList::with_token("", "g54");
        list.first_mut().unwrap().index = reg.index_of("", "g54");
        get_group(&reg, &mut list, &mut m);
        let mut out = String::new();
        print_list(&reg, &list, m.units_mode(), TextFormat::InlinePairs, &mut out).unwrap();
        assert_eq!(out, "x:0.000,y:0.000,z:0.000,a:0.000,b:0.000,c:0.000\n");
    }

    #[test]
    fn test_error_status_reported() {
        let reg = registry();
        let list = NvList::with_token("", "bogus");
        let mut responder = TextResponder::new(String::new());
        responder.respond(&Response {
            status: Status::UnrecognizedName,
            list: &list,
            registry: &reg,
            units: UnitsMode::Millimeters,
            text_format: TextFormat::MultilineFormatted,
            json_format: JsonFormat::Response,
        });
        assert_eq!(responder.get_ref().as_str(), "bogus: unrecognized name (100)\n");
    }
}
