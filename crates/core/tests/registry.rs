//! Registry behavior through the public API

use gantry_core::machine::model::UNITS_INCHES;
use gantry_core::nv::print::print_list;
use gantry_core::nv::{
    do_group_list, group_is_prefixed, EntryKind, NvList, NvObj, NvValue, Partition, Registry,
    Responder, Response, TextFormat,
};
use gantry_core::units::{preprocess_float, set_flu};
use gantry_core::{Capabilities, Machine, Status, UnitsMode};

/// Token of each rendered group, in order
#[derive(Default)]
struct GroupLog {
    groups: Vec<String>,
}

impl Responder for GroupLog {
    fn respond(&mut self, response: &Response<'_>) {
        if let Some(parent) = response.list.first() {
            self.groups.push(parent.token.as_str().to_string());
        }
    }
}

fn registry() -> Registry {
    Registry::new(Capabilities::default()).unwrap()
}

#[test]
fn test_every_token_resolves_to_its_partition() {
    let registry = registry();
    let bounds = *registry.boundaries();

    for (index, desc) in registry.descriptors() {
        assert_eq!(registry.index_of("", &desc.token), Some(index), "{}", desc.token);

        let expected = match desc.kind {
            EntryKind::Single | EntryKind::StatusSlot => Partition::Single,
            EntryKind::Group => Partition::Group,
            EntryKind::UberGroup => Partition::UberGroup,
        };
        assert_eq!(bounds.classify(index), expected, "{}", desc.token);
        assert_eq!(bounds.is_single(index), expected == Partition::Single);
        assert_eq!(bounds.is_group(index), expected == Partition::Group);
    }
}

#[test]
fn test_set_flu_converts_inches() {
    let registry = registry();
    let desc = registry.descriptor(registry.index_of("", "xtm").unwrap()).unwrap();

    let mut nv = NvObj::with_token("xtm");
    nv.value = NvValue::Float(1.0);
    let mut stored = 0.0;
    assert_eq!(set_flu(&mut nv, desc, UnitsMode::Inches, &mut stored), Status::Ok);
    assert!((stored - 25.4).abs() < 1e-4);
    assert!((nv.value.as_f32().unwrap() - 25.4).abs() < 1e-4);

    nv.value = NvValue::Float(12.5);
    assert_eq!(set_flu(&mut nv, desc, UnitsMode::Millimeters, &mut stored), Status::Ok);
    assert_eq!(stored, 12.5);
    assert_eq!(nv.value, NvValue::Float(12.5));
}

#[test]
fn test_preprocess_float_passes_illegal_values() {
    let registry = registry();
    let desc = registry.descriptor(registry.index_of("", "xtm").unwrap()).unwrap();

    for units in [UnitsMode::Inches, UnitsMode::Millimeters] {
        let mut nv = NvObj::with_token("xtm");
        nv.value = NvValue::Float(f32::INFINITY);
        preprocess_float(&mut nv, desc, units);
        assert_eq!(nv.value, NvValue::Float(f32::INFINITY));

        nv.value = NvValue::Float(f32::NAN);
        preprocess_float(&mut nv, desc, units);
        assert!(nv.value.as_f32().unwrap().is_nan());
    }
}

#[test]
fn test_axis_list_renders_six_groups() {
    let registry = registry();
    let mut machine = Machine::default();
    let mut log = GroupLog::default();

    let status = do_group_list(
        &registry,
        &["x", "y", "z", "a", "b", "c", ""],
        &mut machine,
        &mut log,
    );
    assert_eq!(status, Status::Complete);
    assert_eq!(log.groups, ["x", "y", "z", "a", "b", "c"]);
}

#[test]
fn test_all_renders_in_order_once() {
    let registry = registry();
    let mut machine = Machine::default();
    let mut log = GroupLog::default();

    let mut list = NvList::with_token("", "$");
    assert_eq!(registry.get(&mut list, &mut machine, &mut log), Status::Complete);

    let expected = [
        "sys", "p1", "1", "2", "3", "4", "x", "y", "z", "a", "b", "c", "g54", "g55", "g56", "g57",
        "g58", "g59", "g92", "g28", "g30",
    ];
    assert_eq!(log.groups, expected);
}

#[test]
fn test_group_prefix_exceptions() {
    let registry = registry();
    assert!(!group_is_prefixed("sr"));
    assert!(!group_is_prefixed("sys"));

    let bounds = registry.boundaries();
    for (_, desc) in registry
        .descriptors()
        .skip(bounds.start_of_groups as usize)
        .take(bounds.group_count() as usize)
    {
        let name = desc.token.as_str();
        if name != "sr" && name != "sys" {
            assert!(group_is_prefixed(name), "{}", name);
        }
    }
}

#[test]
fn test_motor_count_moves_only_motor_groups() {
    let four = registry();
    let six = Registry::new(Capabilities::default().with_motors(6)).unwrap();
    let (b4, b6) = (four.boundaries(), six.boundaries());

    assert_eq!(b6.group_count(), b4.group_count() + 2);
    assert_eq!(b6.uber_group_count(), b4.uber_group_count());
    assert_eq!(b6.status_report_len, b4.status_report_len);

    let mut machine = Machine::default();
    let mut log = GroupLog::default();
    let mut list = NvList::with_token("", "m");
    six.get(&mut list, &mut machine, &mut log);
    assert_eq!(log.groups, ["1", "2", "3", "4", "5", "6"]);

    let mut log = GroupLog::default();
    let mut list = NvList::with_token("", "q");
    six.get(&mut list, &mut machine, &mut log);
    assert_eq!(log.groups, ["x", "y", "z", "a", "b", "c"]);
}

#[test]
fn test_inch_echo_after_set() {
    let registry = registry();
    let mut machine = Machine::default();
    machine.model.units_mode = UNITS_INCHES;

    let mut list = NvList::with_token("", "xtm");
    if let Some(nv) = list.first_mut() {
        nv.value = NvValue::Float(2.0);
    }
    assert_eq!(registry.set(&mut list, &mut machine), Status::Ok);
    assert!((machine.axes[0].travel_max - 50.8).abs() < 1e-3);

    let mut list = NvList::with_token("", "xtm");
    assert_eq!(registry.get(&mut list, &mut machine, &mut GroupLog::default()), Status::Ok);
    assert!((list.first().unwrap().value.as_f32().unwrap() - 50.8).abs() < 1e-3);

    let mut out = String::new();
    let units = machine.units_mode();
    print_list(&registry, &list, units, TextFormat::MultilineFormatted, &mut out).unwrap();
    assert_eq!(out, "[xtm] travel maximum 2.000 in\n");
}
