mod common;

use common::{init_logger, meta_frame, wide_columns, wide_row};
use iamframe::{AggregateOptions, IamFrame, RawTable, Tolerance};

fn consistent_frame() -> IamFrame {
    let mut table = RawTable::new(wide_columns());
    table.push_row(wide_row(
        "a_model", "a_scenario", "World", "Primary Energy", "EJ/y", 1.0, 6.0,
    ));
    table.push_row(wide_row(
        "a_model", "a_scenario", "World", "Primary Energy|Coal", "EJ/y", 0.5, 4.0,
    ));
    table.push_row(wide_row(
        "a_model", "a_scenario", "World", "Primary Energy|Gas", "EJ/y", 0.5, 2.0,
    ));
    IamFrame::from_table(&table).unwrap()
}

/// Emissions|CO2 with World = REUROPE + RASIA and REUROPE = Germany + UK.
fn regional_frame() -> IamFrame {
    let mut table = RawTable::new(wide_columns());
    let rows = [
        ("World", 12.0, 24.0),
        ("REUROPE", 5.0, 10.0),
        ("RASIA", 7.0, 14.0),
        ("Germany", 3.0, 6.0),
        ("UK", 2.0, 4.0),
    ];
    for (region, v2005, v2010) in rows {
        table.push_row(wide_row(
            "a_model",
            "a_scenario",
            region,
            "Emissions|CO2",
            "Mt CO2",
            v2005,
            v2010,
        ));
    }
    IamFrame::from_table(&table).unwrap()
}

// ---------------------------------------------------------------------------
// hierarchical consistency
// ---------------------------------------------------------------------------

#[test]
fn check_aggregate_passes() {
    let mut frame = consistent_frame();
    assert_eq!(
        frame.check_aggregate("Primary Energy", &AggregateOptions::default()),
        None
    );
}

#[test]
fn check_aggregate_reports_mismatches() {
    init_logger();
    let mut frame = meta_frame();
    let mismatches = frame
        .check_aggregate("Primary Energy", &AggregateOptions::default())
        .unwrap();

    // a_scenario2 reports no children and is skipped by the inner join
    assert_eq!(mismatches.len(), 2);
    let first = &mismatches[0];
    assert_eq!(first.variable, "Primary Energy");
    assert_eq!(first.model, "a_model");
    assert_eq!(first.scenario, "a_scenario");
    assert_eq!(first.region, "World");
    assert_eq!(first.year, 2005);
    assert_eq!(first.reported, 1.0);
    assert_eq!(first.computed, 0.5);
    assert_eq!(mismatches[1].year, 2010);
    assert_eq!(mismatches[1].computed, 3.0);
}

#[test]
fn check_aggregate_year_restriction() {
    let mut frame = meta_frame();
    let opts = AggregateOptions {
        year: Some(2005),
        ..Default::default()
    };
    let mismatches = frame.check_aggregate("Primary Energy", &opts).unwrap();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].year, 2005);
}

#[test]
fn check_aggregate_without_children_skips() {
    let mut frame = meta_frame();
    assert_eq!(
        frame.check_aggregate("Primary Energy|Coal", &AggregateOptions::default()),
        None
    );
}

#[test]
fn check_aggregate_tolerance() {
    let mut frame = meta_frame();
    // a loose relative tolerance accepts 1.0 vs 0.5 and 6.0 vs 3.0
    let opts = AggregateOptions {
        tolerance: Tolerance {
            rtol: 1.0,
            atol: 1e-8,
        },
        ..Default::default()
    };
    assert_eq!(frame.check_aggregate("Primary Energy", &opts), None);
}

#[test]
fn check_aggregate_exclude_on_fail() {
    let mut frame = meta_frame();
    let opts = AggregateOptions {
        exclude_on_fail: true,
        ..Default::default()
    };
    assert!(frame.check_aggregate("Primary Energy", &opts).is_some());
    assert_eq!(frame.meta().exclude(), vec![true, false]);
}

// ---------------------------------------------------------------------------
// regional consistency
// ---------------------------------------------------------------------------

#[test]
fn check_aggregate_regions_inferred_components() {
    let mut table = RawTable::new(wide_columns());
    for (region, v2005, v2010) in [("World", 12.0, 24.0), ("REUROPE", 5.0, 10.0), ("RASIA", 7.0, 14.0)]
    {
        table.push_row(wide_row(
            "a_model",
            "a_scenario",
            region,
            "Emissions|CO2",
            "Mt CO2",
            v2005,
            v2010,
        ));
    }
    let mut frame = IamFrame::from_table(&table).unwrap();
    assert_eq!(
        frame.check_aggregate_regions("Emissions|CO2", "World", None, &AggregateOptions::default()),
        None
    );
}

#[test]
fn check_aggregate_regions_overlap_is_not_deduplicated() {
    init_logger();
    // country rows overlap their continent, so the inferred component sum
    // double-counts Germany and UK
    let mut frame = regional_frame();
    let mismatches = frame
        .check_aggregate_regions("Emissions|CO2", "World", None, &AggregateOptions::default())
        .unwrap();
    assert_eq!(mismatches.len(), 2);
    assert_eq!(mismatches[0].region, "World");
    assert_eq!(mismatches[0].reported, 12.0);
    assert_eq!(mismatches[0].computed, 17.0);
    assert_eq!(mismatches[1].computed, 34.0);
}

#[test]
fn check_aggregate_regions_explicit_components() {
    let mut frame = regional_frame();
    assert_eq!(
        frame.check_aggregate_regions(
            "Emissions|CO2",
            "World",
            Some(&["REUROPE", "RASIA"]),
            &AggregateOptions::default(),
        ),
        None
    );
}

#[test]
fn check_aggregate_regions_subregion_target() {
    let mut frame = regional_frame();
    assert_eq!(
        frame.check_aggregate_regions(
            "Emissions|CO2",
            "REUROPE",
            Some(&["Germany", "UK"]),
            &AggregateOptions::default(),
        ),
        None
    );
}

#[test]
fn check_aggregate_regions_missing_target_skips() {
    let mut frame = regional_frame();
    assert_eq!(
        frame.check_aggregate_regions(
            "Emissions|CO2",
            "Mars",
            None,
            &AggregateOptions::default(),
        ),
        None
    );
}

#[test]
fn check_aggregate_regions_exclude_on_fail() {
    let mut frame = regional_frame();
    let opts = AggregateOptions {
        exclude_on_fail: true,
        ..Default::default()
    };
    assert!(frame
        .check_aggregate_regions("Emissions|CO2", "World", None, &opts)
        .is_some());
    assert_eq!(frame.meta().exclude(), vec![true]);
}
