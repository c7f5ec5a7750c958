use std::fs;
use std::path::PathBuf;

use iamframe::{load_file, IamFrame, MetaValue};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("iamframe-{}-{name}", std::process::id()))
}

#[test]
fn load_wide_csv_file() {
    let path = temp_path("wide.csv");
    fs::write(
        &path,
        "model,scenario,region,variable,unit,2005,2010\n\
         a_model,a_scenario,World,Primary Energy,EJ/y,1.0,6.0\n\
         a_model,a_scenario,World,Primary Energy|Coal,EJ/y,0.5,3.0\n",
    )
    .unwrap();

    let frame = IamFrame::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(frame.len(), 4);
    assert_eq!(frame.years(), vec![2005, 2010]);
    assert_eq!(
        frame.variables(),
        vec!["Primary Energy", "Primary Energy|Coal"]
    );
    let values: Vec<f64> = frame.data().iter().map(|o| o.value).collect();
    assert_eq!(values, vec![1.0, 6.0, 0.5, 3.0]);
}

#[test]
fn empty_csv_cells_produce_no_observation() {
    let path = temp_path("gaps.csv");
    fs::write(
        &path,
        "model,scenario,region,variable,unit,2005,2010\n\
         a_model,a_scenario,World,Primary Energy,EJ/y,1.0,\n",
    )
    .unwrap();

    let frame = IamFrame::from_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(frame.len(), 1);
    assert_eq!(frame.data()[0].year, 2005);
}

#[test]
fn load_long_json_file() {
    let path = temp_path("long.json");
    fs::write(
        &path,
        r#"[
            {"model": "a_model", "scenario": "a_scenario", "region": "World",
             "variable": "Primary Energy", "unit": "EJ/y", "year": 2005, "value": 1.0},
            {"model": "a_model", "scenario": "a_scenario", "region": "World",
             "variable": "Primary Energy", "unit": "EJ/y", "year": 2010, "value": 6.0}
        ]"#,
    )
    .unwrap();

    let table = load_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.cell(0, "year"), &MetaValue::Integer(2005));
    assert_eq!(table.cell(1, "value"), &MetaValue::Float(6.0));

    let frame = IamFrame::from_table(&table).unwrap();
    assert_eq!(frame.len(), 2);
    assert_eq!(frame.models(), vec!["a_model"]);
}

#[test]
fn unsupported_extension_fails() {
    let path = temp_path("table.txt");
    fs::write(&path, "not a table").unwrap();
    let result = load_file(&path);
    fs::remove_file(&path).unwrap();
    assert!(result.is_err());
}
