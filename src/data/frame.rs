use std::collections::{BTreeMap, BTreeSet};

use log::info;

use crate::data::meta::Meta;
use crate::data::model::{MetaValue, Observation, RawTable, ScenarioKey, INDEX_COLS};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// IamFrame – the discrete-year scenario dataset
// ---------------------------------------------------------------------------

/// Long-format scenario timeseries (representation A: integer year axis)
/// plus the per-scenario meta table.
#[derive(Debug, Clone)]
pub struct IamFrame {
    pub(crate) data: Vec<Observation>,
    pub(crate) meta: Meta,
}

impl IamFrame {
    /// Build a frame from a raw table, in either long format (`year` and
    /// `value` columns) or wide format (one column per year).
    ///
    /// Year labels and cells must be integer-castable; float years with a
    /// zero fraction are accepted. A `time` column signals the wrong
    /// representation and is rejected.
    pub fn from_table(table: &RawTable) -> Result<Self, DataError> {
        let missing = table.missing_columns(&INDEX_COLS);
        if !missing.is_empty() {
            return Err(DataError::MissingColumns(missing));
        }

        let long = table.column_index("year").is_some() && table.column_index("value").is_some();
        if !long && table.column_index("time").is_some() {
            return Err(DataError::TimeAxisNotAllowed);
        }

        let data = if long {
            Self::observations_from_long(table)?
        } else {
            Self::observations_from_wide(table)?
        };
        Self::from_observations(data, None)
    }

    /// Load a frame from a delimited or tabular file (see
    /// [`crate::data::loader::load_file`] for the supported formats).
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let table = crate::data::loader::load_file(path)?;
        Ok(Self::from_table(&table)?)
    }

    fn observations_from_long(table: &RawTable) -> Result<Vec<Observation>, DataError> {
        let mut invalid = Vec::new();
        let mut data = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let year = match cast_year_value(table.cell(row, "year")) {
                Some(y) => y,
                None => {
                    invalid.push(table.cell(row, "year").to_string());
                    continue;
                }
            };
            let value = match table.numeric_cell(row, "value")? {
                Some(v) => v,
                None => continue, // null value cells produce no observation
            };
            data.push(Observation {
                model: table.string_cell(row, "model"),
                scenario: table.string_cell(row, "scenario"),
                region: table.string_cell(row, "region"),
                variable: table.string_cell(row, "variable"),
                unit: table.string_cell(row, "unit"),
                year,
                value,
            });
        }
        if !invalid.is_empty() {
            invalid.dedup();
            return Err(DataError::InvalidYearLabels(invalid));
        }
        Ok(data)
    }

    fn observations_from_wide(table: &RawTable) -> Result<Vec<Observation>, DataError> {
        let year_cols: Vec<&String> = table
            .columns()
            .iter()
            .filter(|c| !INDEX_COLS.contains(&c.as_str()))
            .collect();

        let mut years = Vec::with_capacity(year_cols.len());
        let mut invalid = Vec::new();
        for col in &year_cols {
            match cast_year_label(col) {
                Some(y) => years.push((col.as_str(), y)),
                None => invalid.push(col.to_string()),
            }
        }
        if !invalid.is_empty() {
            return Err(DataError::InvalidYearLabels(invalid));
        }

        let mut data = Vec::new();
        for row in 0..table.len() {
            for (col, year) in &years {
                let value = match table.numeric_cell(row, col)? {
                    Some(v) => v,
                    None => continue,
                };
                data.push(Observation {
                    model: table.string_cell(row, "model"),
                    scenario: table.string_cell(row, "scenario"),
                    region: table.string_cell(row, "region"),
                    variable: table.string_cell(row, "variable"),
                    unit: table.string_cell(row, "unit"),
                    year: *year,
                    value,
                });
            }
        }
        Ok(data)
    }

    /// Build from parsed rows; checks row uniqueness and aligns meta.
    /// With `meta: None` a fresh meta table is derived from the data keys.
    pub(crate) fn from_observations(
        data: Vec<Observation>,
        meta: Option<Meta>,
    ) -> Result<Self, DataError> {
        let mut seen = BTreeSet::new();
        for obs in &data {
            if !seen.insert(obs.index()) {
                return Err(DataError::DuplicateRows(format!(
                    "{} / {} / {} / {} / {} / {}",
                    obs.model, obs.scenario, obs.region, obs.variable, obs.unit, obs.year
                )));
            }
        }
        let meta = match meta {
            Some(meta) => meta,
            None => Meta::new(data.iter().map(Observation::key)),
        };
        Ok(Self { data, meta })
    }

    // -- accessors ---------------------------------------------------------

    pub fn data(&self) -> &[Observation] {
        &self.data
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn models(&self) -> Vec<String> {
        unique_in_order(self.data.iter().map(|o| o.model.clone()))
    }

    pub fn scenarios(&self) -> Vec<String> {
        unique_in_order(self.data.iter().map(|o| o.scenario.clone()))
    }

    pub fn regions(&self) -> Vec<String> {
        unique_in_order(self.data.iter().map(|o| o.region.clone()))
    }

    pub fn variables(&self) -> Vec<String> {
        unique_in_order(self.data.iter().map(|o| o.variable.clone()))
    }

    pub fn variables_with_units(&self) -> Vec<(String, String)> {
        unique_in_order(self.data.iter().map(|o| (o.variable.clone(), o.unit.clone())))
    }

    /// Sorted unique years.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.data.iter().map(|o| o.year).collect();
        set.into_iter().collect()
    }

    // -- lifecycle operations ---------------------------------------------

    /// Concatenate two frames into a new one. Overlapping (model, scenario)
    /// keys are rejected and both inputs are left unmodified.
    pub fn append(&self, other: &IamFrame) -> Result<IamFrame, DataError> {
        let overlap: Vec<ScenarioKey> = other
            .meta
            .index()
            .iter()
            .filter(|k| self.meta.contains(k))
            .cloned()
            .collect();
        if !overlap.is_empty() {
            return Err(DataError::DuplicateScenarios(overlap));
        }
        let mut data = self.data.clone();
        data.extend(other.data.iter().cloned());
        Self::from_observations(data, Some(self.meta.concat(&other.meta)))
    }

    /// Relabel values of index columns through `mapping`
    /// (column name -> old value -> new value), returning a new frame.
    ///
    /// Renames on model/scenario must keep the meta index unique. Data rows
    /// that collapse onto the same index are merged by summing their values.
    pub fn rename(
        &self,
        mapping: &BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<IamFrame, DataError> {
        for column in mapping.keys() {
            if !INDEX_COLS.contains(&column.as_str()) {
                return Err(DataError::UnknownRenameColumn(column.clone()));
            }
        }
        let relabel = |column: &str, value: &str| -> String {
            mapping
                .get(column)
                .and_then(|m| m.get(value))
                .cloned()
                .unwrap_or_else(|| value.to_string())
        };

        let meta = self
            .meta
            .relabel(|key| {
                ScenarioKey::new(
                    relabel("model", &key.model),
                    relabel("scenario", &key.scenario),
                )
            })
            .ok_or(DataError::NonUniqueRenameIndex)?;

        // merge rows that collapse onto the same index by summing
        let mut merged: Vec<Observation> = Vec::with_capacity(self.data.len());
        let mut by_index: BTreeMap<(String, String, String, String, String, i32), usize> =
            BTreeMap::new();
        for obs in &self.data {
            let renamed = Observation {
                model: relabel("model", &obs.model),
                scenario: relabel("scenario", &obs.scenario),
                region: relabel("region", &obs.region),
                variable: relabel("variable", &obs.variable),
                unit: relabel("unit", &obs.unit),
                year: obs.year,
                value: obs.value,
            };
            match by_index.get(&renamed.index()) {
                Some(&pos) => merged[pos].value += renamed.value,
                None => {
                    by_index.insert(renamed.index(), merged.len());
                    merged.push(renamed);
                }
            }
        }
        Ok(IamFrame { data: merged, meta })
    }

    /// Convert units via `map: unit -> (new unit, factor)`; values are
    /// scaled by the factor. Returns a new frame.
    pub fn convert_unit(&self, map: &BTreeMap<String, (String, f64)>) -> IamFrame {
        let data = self
            .data
            .iter()
            .map(|obs| match map.get(&obs.unit) {
                Some((unit, factor)) => Observation {
                    unit: unit.clone(),
                    value: obs.value * factor,
                    ..obs.clone()
                },
                None => obs.clone(),
            })
            .collect();
        IamFrame {
            data,
            meta: self.meta.clone(),
        }
    }

    /// Insert linearly interpolated rows for `year` into every timeseries
    /// group that misses it and has bracketing years. In place, idempotent.
    pub fn interpolate(&mut self, year: i32) {
        let mut groups: BTreeMap<(String, String, String, String, String), Vec<(i32, f64)>> =
            BTreeMap::new();
        for obs in &self.data {
            groups
                .entry((
                    obs.model.clone(),
                    obs.scenario.clone(),
                    obs.region.clone(),
                    obs.variable.clone(),
                    obs.unit.clone(),
                ))
                .or_default()
                .push((obs.year, obs.value));
        }

        let mut inserted = 0usize;
        for ((model, scenario, region, variable, unit), series) in groups {
            if series.iter().any(|(y, _)| *y == year) {
                continue;
            }
            if let Some(value) = crate::timeseries::fill_series(&series, year) {
                self.data.push(Observation {
                    model,
                    scenario,
                    region,
                    variable,
                    unit,
                    year,
                    value,
                });
                inserted += 1;
            }
        }
        if inserted > 0 {
            info!("interpolated {inserted} timeseries at year {year}");
        }
    }

    // -- output surfaces ---------------------------------------------------

    /// The data as a long-format raw table.
    pub fn to_table(&self) -> RawTable {
        let mut table = RawTable::new(["model", "scenario", "region", "variable", "unit", "year", "value"]);
        for obs in &self.data {
            table.push_row(vec![
                MetaValue::String(obs.model.clone()),
                MetaValue::String(obs.scenario.clone()),
                MetaValue::String(obs.region.clone()),
                MetaValue::String(obs.variable.clone()),
                MetaValue::String(obs.unit.clone()),
                MetaValue::Integer(obs.year as i64),
                MetaValue::Float(obs.value),
            ]);
        }
        table
    }

    /// The data pivoted wide: index columns plus one column per year
    /// (sorted), Null where a timeseries has no value for a year.
    pub fn timeseries(&self) -> RawTable {
        let years = self.years();
        let mut columns: Vec<String> = INDEX_COLS.iter().map(|c| c.to_string()).collect();
        columns.extend(years.iter().map(|y| y.to_string()));

        let mut order: Vec<(String, String, String, String, String)> = Vec::new();
        let mut cells: BTreeMap<(String, String, String, String, String), BTreeMap<i32, f64>> =
            BTreeMap::new();
        for obs in &self.data {
            let key = (
                obs.model.clone(),
                obs.scenario.clone(),
                obs.region.clone(),
                obs.variable.clone(),
                obs.unit.clone(),
            );
            if !cells.contains_key(&key) {
                order.push(key.clone());
            }
            cells.entry(key).or_default().insert(obs.year, obs.value);
        }

        let mut table = RawTable::new(columns);
        for key in order {
            let values = &cells[&key];
            let (model, scenario, region, variable, unit) = key;
            let mut row = vec![
                MetaValue::String(model),
                MetaValue::String(scenario),
                MetaValue::String(region),
                MetaValue::String(variable),
                MetaValue::String(unit),
            ];
            for year in &years {
                row.push(match values.get(year) {
                    Some(v) => MetaValue::Float(*v),
                    None => MetaValue::Null,
                });
            }
            table.push_row(row);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn unique_in_order<T: Ord + Clone>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

/// Integer year from a cell; floats are accepted only with zero fraction.
fn cast_year_value(value: &MetaValue) -> Option<i32> {
    match value {
        MetaValue::Integer(i) => i32::try_from(*i).ok(),
        MetaValue::Float(f) => cast_year_float(*f),
        MetaValue::String(s) => cast_year_label(s),
        _ => None,
    }
}

/// Integer year from a column label, e.g. "2005" or "2005.0".
fn cast_year_label(label: &str) -> Option<i32> {
    if let Ok(y) = label.parse::<i32>() {
        return Some(y);
    }
    label.parse::<f64>().ok().and_then(cast_year_float)
}

/// `as i32` saturates, so the range must be checked before casting.
fn cast_year_float(f: f64) -> Option<i32> {
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}
