//! Unit tests for settings and logging setup

use strelitzia::config::EngineSettings;
use strelitzia::logging::{init_logging, try_init_logging, LogFormat};
use strelitzia::ConfigError;

fn from_pairs(pairs: &[(&str, &str)]) -> Result<EngineSettings, ConfigError> {
    EngineSettings::from_lookup(|key| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
}

#[test]
fn test_defaults_without_overrides() {
    let settings = from_pairs(&[]).unwrap();
    assert_eq!(settings, EngineSettings::default());
    assert_eq!(settings.structure.swing_width, 3);
    assert_eq!(settings.aggregation.neutral_band, 5.0);
    assert_eq!(settings.min_window, 20);
    assert!(settings.parallel_detectors);
}

#[test]
fn test_overrides_apply() {
    let settings = from_pairs(&[
        ("STRELITZIA_SWING_WIDTH", "5"),
        ("STRELITZIA_NEUTRAL_BAND", " 7.5 "),
        ("STRELITZIA_MIN_SIGNAL_STRENGTH", "0.1"),
        ("STRELITZIA_MIN_WINDOW", "50"),
        ("STRELITZIA_PARALLEL", "false"),
        ("STRELITZIA_BREAK_TOLERANCE_PCT", "0.001"),
    ])
    .unwrap();
    assert_eq!(settings.structure.swing_width, 5);
    assert_eq!(settings.aggregation.neutral_band, 7.5);
    assert_eq!(settings.aggregation.min_signal_strength, 0.1);
    assert_eq!(settings.min_window, 50);
    assert!(!settings.parallel_detectors);
    assert_eq!(settings.structure.break_tolerance_pct, 0.001);
}

#[test]
fn test_invalid_values_rejected() {
    for (key, value) in [
        ("STRELITZIA_SWING_WIDTH", "0"),
        ("STRELITZIA_SWING_WIDTH", "three"),
        ("STRELITZIA_NEUTRAL_BAND", "-1"),
        ("STRELITZIA_MIN_SIGNAL_STRENGTH", "2"),
        ("STRELITZIA_EQUAL_TOLERANCE_PCT", "NaN"),
        ("STRELITZIA_PARALLEL", "sometimes"),
    ] {
        let err = from_pairs(&[(key, value)]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidSetting { .. }),
            "{}={} gave {:?}",
            key,
            value,
            err
        );
    }
}

#[test]
fn test_log_format_follows_environment() {
    assert_eq!(LogFormat::for_environment("production"), LogFormat::Json);
    assert_eq!(LogFormat::for_environment("prod"), LogFormat::Json);
    assert_eq!(LogFormat::for_environment("sandbox"), LogFormat::Pretty);
    assert_eq!(LogFormat::for_environment(""), LogFormat::Pretty);
}

#[test]
fn test_logging_initializes_once() {
    let _ = try_init_logging(LogFormat::Pretty, "warn");
    assert!(try_init_logging(LogFormat::Json, "info").is_err());
    init_logging();
}
