#![allow(dead_code)]

use iamframe::{IamFrame, MetaValue, RawTable};

/// Wide-format row for the canonical two-year fixture tables.
pub fn wide_row(
    model: &str,
    scenario: &str,
    region: &str,
    variable: &str,
    unit: &str,
    v2005: f64,
    v2010: f64,
) -> Vec<MetaValue> {
    vec![
        model.into(),
        scenario.into(),
        region.into(),
        variable.into(),
        unit.into(),
        MetaValue::Float(v2005),
        MetaValue::Float(v2010),
    ]
}

pub fn wide_columns() -> Vec<&'static str> {
    vec!["model", "scenario", "region", "variable", "unit", "2005", "2010"]
}

/// One model, one scenario: Primary Energy and Primary Energy|Coal.
pub fn test_table() -> RawTable {
    let mut table = RawTable::new(wide_columns());
    table.push_row(wide_row(
        "a_model", "a_scenario", "World", "Primary Energy", "EJ/y", 1.0, 6.0,
    ));
    table.push_row(wide_row(
        "a_model", "a_scenario", "World", "Primary Energy|Coal", "EJ/y", 0.5, 3.0,
    ));
    table
}

pub fn test_frame() -> IamFrame {
    IamFrame::from_table(&test_table()).unwrap()
}

/// Adds a second scenario that only reports the top-level variable.
pub fn meta_frame() -> IamFrame {
    let mut table = test_table();
    table.push_row(wide_row(
        "a_model", "a_scenario2", "World", "Primary Energy", "EJ/y", 2.0, 7.0,
    ));
    IamFrame::from_table(&table).unwrap()
}

/// Values of the data rows, in row order.
pub fn values(frame: &IamFrame) -> Vec<f64> {
    frame.data().iter().map(|o| o.value).collect()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
