//! End-to-end command handling over mock Flash
//!
//! Run with `cargo test --features mock`.

#![cfg(feature = "mock")]

use gantry::core::parameters::{DefaultsReason, LoadOutcome, NvStore};
use gantry::gantry_core::machine::model::UNITS_INCHES;
use gantry::gantry_core::nv::TextResponder;
use gantry::gantry_core::{Capabilities, Status};
use gantry::platform::mock::MockFlash;
use gantry::Controller;

fn boot(flash: MockFlash, caps: Capabilities) -> (Controller<MockFlash>, LoadOutcome) {
    let mut controller = Controller::new(caps, NvStore::new(flash)).unwrap();
    let outcome = controller.init().unwrap();
    (controller, outcome)
}

fn run(controller: &mut Controller<MockFlash>, line: &str) -> (Status, String) {
    let mut out = TextResponder::new(String::new());
    let status = controller.handle_text(line, &mut out);
    (status, out.into_inner())
}

#[test]
fn test_settings_survive_power_cycle() {
    let (mut c, outcome) = boot(MockFlash::new(), Capabilities::default());
    assert_eq!(outcome, LoadOutcome::Defaults(DefaultsReason::NoValidBlock));

    assert_eq!(run(&mut c, "$ytm=400").0, Status::Ok);
    assert_eq!(run(&mut c, "$2po=1").0, Status::Ok);
    assert_eq!(run(&mut c, "$g55x=12.5").0, Status::Ok);

    let flash = c.store_mut().flash_mut().clone();
    let (mut c, outcome) = boot(flash, Capabilities::default());
    assert!(matches!(outcome, LoadOutcome::Loaded { skipped: 0, .. }));

    assert_eq!(run(&mut c, "$ytm").1, "[ytm] travel maximum 400.000 mm\n");
    assert_eq!(run(&mut c, "$2po").1, "[2po] polarity 1 [reversed]\n");
    assert_eq!(c.machine().offsets.coord[1][0], 12.5);
}

#[test]
fn test_inch_mode_round_trip() {
    let (mut c, _) = boot(MockFlash::new(), Capabilities::default());
    c.machine_mut().model.units_mode = UNITS_INCHES;

    assert_eq!(run(&mut c, "$zvm=100").1, "[zvm] velocity maximum 100 in/min\n");
    assert!((c.machine().axes[2].velocity_max - 2540.0).abs() < 0.01);

    // rotary axes are never converted
    assert_eq!(run(&mut c, "$avm=3600").1, "[avm] velocity maximum 3600 deg/min\n");
    assert_eq!(c.machine().axes[3].velocity_max, 3600.0);
}

#[test]
fn test_motor_count_follows_capabilities() {
    let caps = Capabilities::default().with_motors(6);
    let (mut c, _) = boot(MockFlash::new(), caps);

    let (status, out) = run(&mut c, "$m");
    assert_eq!(status, Status::Complete);
    assert!(out.contains("[6ma]"));

    let (mut c, _) = boot(MockFlash::new(), Capabilities::default().with_motors(2));
    assert_eq!(run(&mut c, "$3ma").0, Status::UnrecognizedName);
}

#[test]
fn test_factory_reset_is_persisted() {
    let (mut c, _) = boot(MockFlash::new(), Capabilities::default());
    run(&mut c, "$xjm=20");
    assert_eq!(run(&mut c, "$defa=1").0, Status::Ok);

    let flash = c.store_mut().flash_mut().clone();
    let (c, _) = boot(flash, Capabilities::default());
    assert!(c.registry().is_factory_default(
        c.registry().index_of("", "xjm").unwrap(),
        &mut c.machine().clone()
    ));
}
