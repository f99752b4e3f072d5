//! Integration test: configuration loading and construction-time failures.

use std::io::Write;
use std::path::PathBuf;

use tagdrive_common::config::{ConfigError, ConfigLoader};
use tagdrive_common::drive::config::{ControllerType, DriveConfig, TriggerAction};
use tagdrive_control::cycle::{CycleError, CycleRunner};
use tagdrive_control::drivetrain::differential::Drivetrain;
use tempfile::NamedTempFile;

const DRIVETRAIN: &str = r#"
[drivetrain]
front_left_id = 1
front_right_id = 2
back_left_id = 3
back_right_id = 4
controller_type = "SPARK_MAX"
"#;

fn shipped_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../config/drive.toml")
}

#[test]
fn shipped_config_loads_and_validates() {
    let cfg = DriveConfig::load(&shipped_config()).unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.drivetrain.controller_type, ControllerType::TalonFx);
    assert_eq!(cfg.control.trigger_action, TriggerAction::FollowTag { distance: None });
    assert_eq!(cfg.vision.filter_window, 10);
    assert_eq!(cfg.tunables.turn_to_angle.kp, 0.025);
    assert_eq!(cfg.tunables.drive_from_tag.setpoint, 0.3);
}

#[test]
fn config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{DRIVETRAIN}").unwrap();
    writeln!(file, "[control]\ntrigger_action = {{ kind = \"turn_to_angle\", angle = 90.0 }}").unwrap();
    let cfg = DriveConfig::load(file.path()).unwrap();
    assert_eq!(
        cfg.control.trigger_action,
        TriggerAction::TurnToAngle { angle: Some(90.0) }
    );
    let dt = Drivetrain::from_config(&cfg.drivetrain);
    assert_eq!(dt.left().front.kind(), ControllerType::SparkMax);
    assert!(dt.right().inverted());
}

#[test]
fn unknown_controller_type_fails_at_parse_time() {
    let toml = DRIVETRAIN.replace("SPARK_MAX", "TALON_SRX");
    let err = DriveConfig::from_toml(&toml).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn missing_drivetrain_section_is_rejected() {
    let err = DriveConfig::from_toml("[vision]\nfilter_window = 5\n").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn runner_refuses_invalid_config() {
    let toml = format!("{DRIVETRAIN}\n[vision]\nfilter_window = 65\n");
    let cfg = DriveConfig::from_toml(&toml).unwrap();
    let err = CycleRunner::new(&cfg).unwrap_err();
    assert!(matches!(err, CycleError::Config(ConfigError::ValidationError(_))));
}

#[test]
fn duplicate_can_ids_are_rejected() {
    let toml = DRIVETRAIN.replace("back_right_id = 4", "back_right_id = 1");
    let cfg = DriveConfig::from_toml(&toml).unwrap();
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::ValidationError(_))
    ));
}
