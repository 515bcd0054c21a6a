//! Relay boards sharing a project: key prefixes and bus selection.

use std::path::Path;
use std::rc::Rc;

use gb_app::{RuntimeEnv, compile_project, load_project};
use gb_core::{FieldKind, ManualClock, TrackingSleeper, Value};
use gb_project::{BusDef, DeviceDef, DeviceKind, FieldDef, Project};
use gb_results::{MemorySink, SinkSpec};
use gb_wire::Bus;

fn tent() -> Project {
    load_project(Path::new("../../demos/oyster-tent.yaml")).expect("demo project should load")
}

fn sim_env(log: &MemorySink) -> RuntimeEnv {
    let clock = ManualClock::new(0.0);
    let sleeper = TrackingSleeper::with_clock(clock.clone());
    RuntimeEnv::new(Rc::new(clock), Rc::new(sleeper)).with_sink(SinkSpec::Memory(log.clone()))
}

fn with_second_board(mut project: Project) -> Project {
    project.devices.push(DeviceDef {
        id: "relay_b".to_string(),
        kind: DeviceKind::QuadRelay {
            bus: BusDef::emulated("main"),
            address: 0x6D,
            jumper: true,
        },
    });
    let relays = project
        .fields
        .iter_mut()
        .find(|f| f.field == FieldKind::Relays)
        .expect("demo samples its relay board");
    relays.name = Some("relays_a".to_string());
    project.fields.push(FieldDef {
        field: FieldKind::Relays,
        device: "relay_b".to_string(),
        name: Some("relays_b".to_string()),
    });
    project
}

#[test]
fn two_boards_keep_separate_keys() {
    let project = with_second_board(tent());
    let log = MemorySink::new();
    let mut compiled = compile_project(&project, &sim_env(&log)).expect("project should compile");

    // Close relay 2 on the jumpered board only.
    compiled.boards["relay_b"]
        .borrow_mut()
        .write_block(0x6C, 0x02, &[])
        .expect("board acks its own address");

    let report = compiled.growbox.cycle().expect("cycle should succeed");
    let reading = &report.reading;
    assert_eq!(reading.len(), 5 + 8, "{reading:?}");
    assert_eq!(reading.get("relays_a.relay2"), Some(&Value::Int(0)));
    assert_eq!(reading.get("relays_b.relay2"), Some(&Value::Int(1)));
    assert!(!reading.contains_key("relay2"));
    assert_eq!(log.last().expect("row logged"), *reading);

    assert!(!Rc::ptr_eq(&compiled.boards["relay"], &compiled.boards["relay_b"]));
}

#[test]
fn boards_at_one_address_share_the_emulation() {
    let mut project = with_second_board(tent());
    let DeviceKind::QuadRelay { jumper, .. } = &mut project.devices[3].kind else {
        panic!("second board should be a quad relay");
    };
    *jumper = false;
    let compiled = compile_project(&project, &sim_env(&MemorySink::new()))
        .expect("project should compile");
    assert!(Rc::ptr_eq(&compiled.boards["relay"], &compiled.boards["relay_b"]));
}

#[test]
fn unopenable_i2c_bus_fails_compilation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("i2c-7");
    let mut project = tent();
    let DeviceKind::QuadRelay { bus, .. } = &mut project.devices[2].kind else {
        panic!("demo relay should be a quad relay");
    };
    *bus = BusDef::i2c(&missing);

    let err = compile_project(&project, &sim_env(&MemorySink::new()))
        .expect_err("no i2c adapter at that path");
    assert!(err.is_configuration(), "{err}");
    let message = err.to_string();
    assert!(message.contains("relay"), "{message}");
    assert!(message.contains("i2c-7"), "{message}");
}
