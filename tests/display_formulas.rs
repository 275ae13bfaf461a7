//! Integration tests for the formulas of a display

mod common;

use common::assert_number;
use displaykit::config::EngineConfig;
use displaykit::formula::{is_formula_pv, DisplayFormulas};
use displaykit::{AcquisitionStatus, DataSourceStatus, Dialect, Value};

fn widgets() -> Vec<&'static str> {
    vec![
        "/YSS/SIMULATOR/BatteryVoltage1",
        "=parameterValue('/YSS/SIMULATOR/BatteryVoltage1') * 1000",
        "=parameterValue('/YSS/SIMULATOR/BatteryVoltage1') * 1000",
        "=parameterAcquisitionStatus('/YSS/SIMULATOR/BatteryVoltage1') == 'EXPIRED' ? 'STALE' : 'LIVE'",
        "=/YSS/SIMULATOR/Alpha",
    ]
}

#[test]
fn test_display_subscribes_to_formula_inputs() {
    let mut display = DisplayFormulas::default();
    for pv_name in widgets().into_iter().filter(|pv| is_formula_pv(pv)) {
        if let Err(e) = display.register(pv_name) {
            // Bare paths are not valid formula syntax
            assert!(e.is_syntax(), "{}", e);
        }
    }
    assert_eq!(display.len(), 2);
    assert_eq!(display.parameter_ids(), ["/YSS/SIMULATOR/BatteryVoltage1"]);
}

#[test]
fn test_delivery_updates_each_formula_once() {
    let mut display = DisplayFormulas::default();
    display
        .register("=parameterValue('/YSS/SIMULATOR/BatteryVoltage1') * 1000")
        .unwrap();
    display
        .register(
            "=parameterAcquisitionStatus('/YSS/SIMULATOR/BatteryVoltage1') == 'EXPIRED' ? 'STALE' : 'LIVE'",
        )
        .unwrap();

    let results = display.process_delivery(&[(
        "/YSS/SIMULATOR/BatteryVoltage1".to_string(),
        DataSourceStatus::with_status(1.2, AcquisitionStatus::Acquired),
    )]);
    assert_eq!(results.len(), 2);
    assert_number(&results[0].1, 1200.0);
    assert_eq!(results[1].1, Value::String("LIVE".to_string()));

    let results = display.process_delivery(&[
        (
            "/YSS/SIMULATOR/BatteryVoltage1".to_string(),
            DataSourceStatus::with_status(1.3, AcquisitionStatus::Acquired),
        ),
        (
            "/YSS/SIMULATOR/BatteryVoltage1".to_string(),
            DataSourceStatus::with_status(1.3, AcquisitionStatus::Expired),
        ),
    ]);
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].1, Value::String("STALE".to_string()));
}

#[test]
fn test_failing_formula_does_not_affect_siblings() {
    let mut display = DisplayFormulas::default();
    display.register("=X > 0 ? explode(X) : X").unwrap();
    display.register("=X + 1").unwrap();

    let results = display.process_delivery(&[("X".to_string(), DataSourceStatus::new(2.0))]);
    assert_eq!(results[0].1, Value::Undefined);
    assert_eq!(results[1].1, Value::Number(3.0));
}

#[test]
fn test_oversized_formula_is_rejected_without_affecting_siblings() {
    let mut display = DisplayFormulas::default();
    let oversized = format!("=X{}", " + X".repeat(20_000));
    assert!(display.register(&oversized).unwrap_err().is_syntax());
    display.register("=X * 2").unwrap();

    let results = display.process_delivery(&[("X".to_string(), DataSourceStatus::new(4.0))]);
    assert_eq!(results, vec![("=X * 2".to_string(), Value::Number(8.0))]);
}

#[test]
fn test_display_from_engine_config() {
    let mut config = EngineConfig::default();
    config.formula.dialect = Dialect::Legacy;
    let mut display = DisplayFormulas::new(config.formula.parse_options());

    display.register("=ratio = num / den; ratio * 100").unwrap();
    display.register_mapping("num", "/A/num");
    display.register_mapping("den", "/A/den");
    assert_eq!(display.parameter_ids(), ["/A/num", "/A/den"]);

    let results = display.process_delivery(&[
        ("/A/num".to_string(), DataSourceStatus::new(1.0)),
        ("/A/den".to_string(), DataSourceStatus::new(4.0)),
    ]);
    assert_eq!(results, vec![("=ratio = num / den; ratio * 100".to_string(), Value::Number(25.0))]);
}
