use gb_core::{FieldKind, Value};
use gb_project::schema::*;
use gb_project::{load_yaml, parse_yaml, reading_keys, save_yaml, validate_project};

const TENT: &str = "
version: 1
name: tent
devices:
  - id: env
    kind: { type: simulated_sensor, values: { humidity: 80, co2: 2500.5 } }
  - id: relay
    kind: { type: quad_relay, bus: main }
fields:
  - { field: humidity, device: env }
  - { field: co2, device: env }
actuators:
  mister: { relay: relay, channel: 1 }
  fans: { upper: { relay: relay, channel: 2 }, lower: { relay: relay, channel: 3 } }
";

#[test]
fn defaults_fill_in() {
    let project = parse_yaml(TENT).unwrap();
    assert_eq!(project.cadence_s, DEFAULT_CADENCE_S);
    assert_eq!(project.retry_attempts, 3);
    assert_eq!(project.supervisor, SupervisorDef::default());
    assert!(project.log.is_none());

    let relay = project.device("relay").unwrap();
    assert_eq!(
        relay.kind,
        DeviceKind::QuadRelay {
            bus: BusDef::emulated("main"),
            address: 0x6D,
            jumper: false
        }
    );

    let env = project.device("env").unwrap();
    let DeviceKind::SimulatedSensor { values } = &env.kind else {
        panic!("env should be simulated");
    };
    assert_eq!(values[&FieldKind::Humidity], Value::Int(80));
    assert_eq!(values[&FieldKind::Co2], Value::Float(2500.5));

    let mister = project.actuators.mister.as_ref().unwrap();
    assert_eq!(mister.humidify_s, 10.0);
    assert_eq!(project.actuators.fans.as_ref().unwrap().exchange_s, 60.0);
}

#[test]
fn roundtrip_yaml_file() {
    let project = parse_yaml(TENT).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tent.yaml");

    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(project, loaded);
}

#[test]
fn misspelled_field_fails_at_load() {
    let yaml = TENT.replace("{ field: co2,", "{ field: c02,");
    assert!(parse_yaml(&yaml).is_err());
}

#[test]
fn unknown_device_reference() {
    let yaml = TENT.replace("{ field: co2, device: env }", "{ field: co2, device: air }");
    let err = parse_yaml(&yaml).unwrap_err();
    assert!(err.to_string().contains("Missing reference: air"), "{err}");
}

#[test]
fn relay_channel_out_of_range() {
    let yaml = TENT.replace("channel: 3", "channel: 5");
    assert!(parse_yaml(&yaml).is_err());
}

#[test]
fn shared_relay_channel_rejected() {
    let yaml = TENT.replace("channel: 3", "channel: 1");
    let err = parse_yaml(&yaml).unwrap_err();
    assert!(err.to_string().contains("Duplicate ID: relay:1"), "{err}");
}

#[test]
fn actuator_must_use_a_relay() {
    let yaml = TENT.replace("mister: { relay: relay,", "mister: { relay: env,");
    assert!(parse_yaml(&yaml).is_err());
}

#[test]
fn profile_thresholds_are_checked() {
    let mut project = parse_yaml(TENT).unwrap();
    let threshold = ThresholdDef {
        minval: Some(95.0),
        maxval: Some(100.0),
        polarity: PolarityDef::Inside,
    };
    project.profile.thresholds.insert("humidity".into(), threshold);
    validate_project(&project).unwrap();

    project.profile.thresholds.insert("lux".into(), threshold);
    let err = validate_project(&project).unwrap_err();
    assert!(matches!(err, gb_project::ValidationError::MissingReference { .. }));

    project.profile.thresholds.remove("lux");
    project.profile.thresholds.insert(
        "co2".into(),
        ThresholdDef {
            minval: None,
            maxval: None,
            polarity: PolarityDef::Outside,
        },
    );
    assert!(validate_project(&project).is_err());

    project.profile.thresholds.remove("co2");
    project.profile.thresholds.insert("temperature".into(), threshold);
    let err = validate_project(&project).unwrap_err();
    assert!(matches!(err, gb_project::ValidationError::Unsupported { .. }));
}

#[test]
fn zero_address_rejected() {
    let yaml = TENT.replace("{ type: quad_relay, bus: main }", "{ type: quad_relay, bus: main, address: 0 }");
    assert!(parse_yaml(&yaml).is_err());
}

#[test]
fn i2c_bus_long_form() {
    let yaml = TENT.replace(
        "{ type: quad_relay, bus: main }",
        "{ type: quad_relay, bus: { type: i2c, path: /dev/i2c-1 }, jumper: true }",
    );
    let project = parse_yaml(&yaml).unwrap();
    let DeviceKind::QuadRelay { bus, jumper, .. } = &project.device("relay").unwrap().kind else {
        panic!("relay should be a quad relay");
    };
    assert_eq!(*bus, BusDef::i2c("/dev/i2c-1"));
    assert_eq!(bus.kind().to_string(), "i2c:/dev/i2c-1");
    assert!(*jumper);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hw.yaml");
    save_yaml(&path, &project).unwrap();
    assert_eq!(load_yaml(&path).unwrap(), project);
}

#[test]
fn emulated_bus_long_form_matches_short() {
    let yaml = TENT.replace(
        "{ type: quad_relay, bus: main }",
        "{ type: quad_relay, bus: { type: emulated, name: main } }",
    );
    let project = parse_yaml(&yaml).unwrap();
    let DeviceKind::QuadRelay { bus, .. } = &project.device("relay").unwrap().kind else {
        panic!("relay should be a quad relay");
    };
    assert_eq!(bus.kind(), BusDef::emulated("main").kind());
}

#[test]
fn empty_i2c_path_rejected() {
    let yaml = TENT.replace(
        "{ type: quad_relay, bus: main }",
        "{ type: quad_relay, bus: { type: i2c, path: \"\" } }",
    );
    let err = parse_yaml(&yaml).unwrap_err();
    assert!(err.to_string().contains("bus.path"), "{err}");
}

#[test]
fn unknown_bus_type_rejected() {
    let yaml = TENT.replace(
        "{ type: quad_relay, bus: main }",
        "{ type: quad_relay, bus: { type: spi, path: /dev/spidev0.0 } }",
    );
    assert!(parse_yaml(&yaml).is_err());
}

const TWO_BOARDS: &str = "
version: 1
name: two boards
devices:
  - id: a
    kind: { type: quad_relay, bus: main }
  - id: b
    kind: { type: quad_relay, bus: main, jumper: true }
fields:
  - { field: relays, device: a, name: relays_a }
  - { field: relays, device: b, name: relays_b }
";

#[test]
fn renamed_relay_fields_get_prefixed_keys() {
    let project = parse_yaml(TWO_BOARDS).unwrap();
    assert_eq!(
        reading_keys(&project, &project.fields[0]),
        vec!["relays_a.relay1", "relays_a.relay2", "relays_a.relay3", "relays_a.relay4"]
    );
    assert_eq!(reading_keys(&project, &project.fields[1])[3], "relays_b.relay4");
}

#[test]
fn relay_keys_colliding_with_a_column_rejected() {
    let yaml = TWO_BOARDS.replace(
        "  - { field: relays, device: b, name: relays_b }",
        "  - { field: relays, device: b }\n  - { field: humidity, device: env, name: relay2 }",
    ).replace(
        "devices:\n",
        "devices:\n  - id: env\n    kind: { type: simulated_sensor, values: { humidity: 80 } }\n",
    );
    let err = parse_yaml(&yaml).unwrap_err();
    assert!(err.to_string().contains("Duplicate ID: relay2"), "{err}");
}
