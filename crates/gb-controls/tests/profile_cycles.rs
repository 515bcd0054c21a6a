//! Profile evaluation over a sequence of readings.

use gb_controls::{Actuation, ActuationError, Command, Profile, ProfileConfig, RecordingActuation};
use gb_core::{FieldKind, Reading, Value};

fn reading(humidity: f64, co2: i64) -> Reading {
    let mut r = Reading::new();
    r.insert("humidity", humidity);
    r.insert(FieldKind::Co2.as_str(), Value::Int(co2));
    r
}

#[test]
fn yaml_profile_over_an_hour() {
    let yaml = "
humidity: { minval: 85, maxval: 95 }
co2: { minval: 1500, polarity: outside }
air_exchange_s: 900
";
    let config: ProfileConfig = serde_yaml::from_str(yaml).unwrap();
    let mut profile = Profile::configure(&config, 0.0).unwrap();
    let mut act = RecordingActuation::new();

    let mut exchanges = 0;
    for minute in 1..=60 {
        let now = f64::from(minute) * 60.0;
        let eval = profile.evaluate(&reading(90.0, 800), now, &mut act).unwrap();
        if eval.air_exchange {
            exchanges += 1;
        }
    }
    assert_eq!(exchanges, 4);
    assert!(act.commands.iter().all(|c| matches!(c, Command::MisterOff | Command::FanExchange)));

    act.commands.clear();
    profile.evaluate(&reading(96.0, 1600), 3601.0, &mut act).unwrap();
    assert_eq!(act.commands, vec![Command::FanExchange, Command::FanExchange]);
}

#[test]
fn unknown_profile_keys_fail_to_parse() {
    let err = serde_yaml::from_str::<ProfileConfig>("temperature: { minval: 20 }\n");
    assert!(err.is_err());
}

struct Broken;

impl Actuation for Broken {
    fn actuate(&mut self, command: Command) -> Result<(), ActuationError> {
        Err(ActuationError::Failed {
            command,
            reason: "relay did not answer".into(),
        })
    }
}

#[test]
fn actuation_failure_aborts_evaluation() {
    let mut profile = Profile::configure(&ProfileConfig::default(), 0.0).unwrap();
    let err = profile
        .evaluate(&reading(50.0, 400), 1.0, &mut Broken)
        .unwrap_err();
    assert!(!err.is_configuration());
    assert!(err.to_string().contains("humidify failed"));
}
