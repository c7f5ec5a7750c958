mod common;

use common::{init_logger, meta_frame, test_frame};
use iamframe::{Criteria, MetaValue, Observation, ScenarioKey};

fn upper(up: f64) -> Criteria {
    Criteria {
        up: Some(up),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_all_pass() {
    let mut frame = test_frame();
    assert_eq!(frame.validate(&[("Primary Energy", upper(10.0))], false), None);
    assert_eq!(frame.meta().exclude(), vec![false]);
}

#[test]
fn validate_boundary_value_passes() {
    let mut frame = test_frame();
    assert_eq!(frame.validate(&[("Primary Energy", upper(6.0))], false), None);
}

#[test]
fn validate_upper_bound() {
    let mut frame = test_frame();
    let violations = frame
        .validate(&[("Primary Energy", upper(5.0))], false)
        .unwrap();
    assert_eq!(
        violations,
        vec![Observation {
            model: "a_model".to_string(),
            scenario: "a_scenario".to_string(),
            region: "World".to_string(),
            variable: "Primary Energy".to_string(),
            unit: "EJ/y".to_string(),
            year: 2010,
            value: 6.0,
        }]
    );
}

#[test]
fn validate_lower_bound() {
    let mut frame = test_frame();
    let criteria = [(
        "Primary Energy",
        Criteria {
            lo: Some(2.0),
            ..Default::default()
        },
    )];
    let violations = frame.validate(&criteria, false).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].year, 2005);
    assert_eq!(violations[0].value, 1.0);
}

#[test]
fn validate_year_restriction() {
    let mut frame = test_frame();
    let criteria = [(
        "Primary Energy",
        Criteria {
            up: Some(5.0),
            year: Some(2005),
            ..Default::default()
        },
    )];
    assert_eq!(frame.validate(&criteria, false), None);

    let criteria = [(
        "Primary Energy",
        Criteria {
            up: Some(5.0),
            year: Some(2010),
            ..Default::default()
        },
    )];
    assert_eq!(frame.validate(&criteria, false).unwrap().len(), 1);
}

#[test]
fn validate_unknown_variable_passes() {
    let mut frame = test_frame();
    assert_eq!(frame.validate(&[("Secondary Energy", upper(0.0))], false), None);
}

#[test]
fn validate_reports_in_criteria_then_data_order() {
    let mut frame = test_frame();
    let violations = frame
        .validate(
            &[("Primary Energy|Coal", upper(2.0)), ("Primary Energy", upper(5.0))],
            false,
        )
        .unwrap();
    let rows: Vec<(&str, i32)> = violations
        .iter()
        .map(|o| (o.variable.as_str(), o.year))
        .collect();
    assert_eq!(rows, vec![("Primary Energy|Coal", 2010), ("Primary Energy", 2010)]);
}

#[test]
fn validate_exclude_on_fail() {
    init_logger();
    let mut frame = meta_frame();
    // only a_scenario2 exceeds the bound (7.0 in 2010)
    let violations = frame
        .validate(&[("Primary Energy", upper(6.5))], true)
        .unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(frame.meta().exclude(), vec![false, true]);
}

// ---------------------------------------------------------------------------
// require_variable
// ---------------------------------------------------------------------------

#[test]
fn require_variable_reports_missing_scenarios() {
    let mut frame = meta_frame();
    let missing = frame
        .require_variable("Primary Energy|Coal", None, None, false)
        .unwrap();
    assert_eq!(missing, vec![ScenarioKey::new("a_model", "a_scenario2")]);
    assert_eq!(frame.meta().exclude(), vec![false, false]);
}

#[test]
fn require_variable_all_present() {
    let mut frame = meta_frame();
    assert_eq!(frame.require_variable("Primary Energy", None, None, false), None);
}

#[test]
fn require_variable_with_unit_and_year() {
    let mut frame = test_frame();
    assert_eq!(
        frame.require_variable("Primary Energy", Some("EJ/y"), Some(2005), false),
        None
    );
    assert!(frame
        .require_variable("Primary Energy", Some("Mtoe"), None, false)
        .is_some());
    assert!(frame
        .require_variable("Primary Energy", None, Some(2020), false)
        .is_some());
}

#[test]
fn require_variable_exclude_on_fail() {
    init_logger();
    let mut frame = meta_frame();
    let missing = frame.require_variable("Primary Energy|Coal", None, None, true);
    assert!(missing.is_some());
    assert_eq!(frame.meta().exclude(), vec![false, true]);
}

// ---------------------------------------------------------------------------
// categorize
// ---------------------------------------------------------------------------

#[test]
fn categorize_assigns_label() {
    let mut frame = meta_frame();
    frame.categorize("category", "foo", &[("Primary Energy", upper(6.5))]);

    let index = frame.meta().index().to_vec();
    assert_eq!(
        frame.meta().value(&index[0], "category"),
        Some(&MetaValue::String("foo".to_string()))
    );
    // a_scenario2 violates the bound and stays unset
    assert_eq!(frame.meta().value(&index[1], "category"), Some(&MetaValue::Null));
}

#[test]
fn categorize_no_match_leaves_column_absent() {
    let mut frame = meta_frame();
    frame.categorize("category", "foo", &[("Primary Energy", upper(0.1))]);
    assert!(!frame.meta().has_column("category"));
}

#[test]
fn categorize_unknown_variable_leaves_column_absent() {
    let mut frame = meta_frame();
    frame.categorize("category", "foo", &[("Secondary Energy", upper(10.0))]);
    assert!(!frame.meta().has_column("category"));
}
