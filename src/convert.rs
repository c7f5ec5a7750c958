use std::collections::{BTreeMap, BTreeSet};

use crate::data::frame::IamFrame;
use crate::data::meta::Meta;
use crate::data::model::{
    MetaValue, Observation, RawTable, ScenarioKey, TimeObservation, INDEX_COLS,
};
use crate::error::{ConvertError, DataError};

/// Separator used when fusing model into the scenario field.
pub const SCENARIO_SEP: &str = "|";
/// Sentinel model name of the continuous-time representation.
pub const MODEL_PLACEHOLDER: &str = "N/A";
/// Namespace prefix for variables carrying a model name.
pub const DIAGNOSTICS_PREFIX: &str = "Diagnostics|";

// ---------------------------------------------------------------------------
// TimeFrame – the continuous-time scenario dataset
// ---------------------------------------------------------------------------

/// Long-format scenario timeseries (representation B: float time axis,
/// scenario identity fused as `"{scenario}|{model}"`) plus the meta table.
#[derive(Debug, Clone)]
pub struct TimeFrame {
    pub(crate) data: Vec<TimeObservation>,
    pub(crate) meta: Meta,
}

impl TimeFrame {
    /// Build from a raw long-format table with columns model, scenario,
    /// region, variable, unit, time, value. A `year` column is accepted in
    /// place of `time` and cast to float.
    pub fn from_table(table: &RawTable) -> Result<Self, ConvertError> {
        let mut required: Vec<&str> = INDEX_COLS.to_vec();
        required.push("value");
        let mut missing = table.missing_columns(&required);
        let time_col = if table.column_index("time").is_some() {
            "time"
        } else if table.column_index("year").is_some() {
            "year"
        } else {
            missing.push("time".to_string());
            "time"
        };
        if !missing.is_empty() {
            missing.sort();
            return Err(ConvertError::MissingColumns(missing));
        }

        let mut data = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let time = match table.numeric_cell(row, time_col).map_err(wrap_to_time)? {
                Some(t) => t,
                None => continue,
            };
            let value = match table.numeric_cell(row, "value").map_err(wrap_to_time)? {
                Some(v) => v,
                None => continue,
            };
            data.push(TimeObservation {
                model: table.string_cell(row, "model"),
                scenario: table.string_cell(row, "scenario"),
                region: table.string_cell(row, "region"),
                variable: table.string_cell(row, "variable"),
                unit: table.string_cell(row, "unit"),
                time,
                value,
            });
        }
        Self::from_observations(data, None).map_err(wrap_to_time)
    }

    pub(crate) fn from_observations(
        data: Vec<TimeObservation>,
        meta: Option<Meta>,
    ) -> Result<Self, DataError> {
        let mut seen = BTreeSet::new();
        for obs in &data {
            let index = (
                obs.model.clone(),
                obs.scenario.clone(),
                obs.region.clone(),
                obs.variable.clone(),
                obs.unit.clone(),
                obs.time.to_bits(),
            );
            if !seen.insert(index) {
                return Err(DataError::DuplicateRows(format!(
                    "{} / {} / {} / {} / {} / {}",
                    obs.model, obs.scenario, obs.region, obs.variable, obs.unit, obs.time
                )));
            }
        }
        let meta = match meta {
            Some(meta) => meta,
            None => Meta::new(data.iter().map(TimeObservation::key)),
        };
        Ok(Self { data, meta })
    }

    pub fn data(&self) -> &[TimeObservation] {
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

    /// The data as a long-format raw table.
    pub fn to_table(&self) -> RawTable {
        let mut table = RawTable::new([
            "model", "scenario", "region", "variable", "unit", "time", "value",
        ]);
        for obs in &self.data {
            table.push_row(vec![
                MetaValue::String(obs.model.clone()),
                MetaValue::String(obs.scenario.clone()),
                MetaValue::String(obs.region.clone()),
                MetaValue::String(obs.variable.clone()),
                MetaValue::String(obs.unit.clone()),
                MetaValue::Float(obs.time),
                MetaValue::Float(obs.value),
            ]);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// A -> B
// ---------------------------------------------------------------------------

impl IamFrame {
    /// Convert to the continuous-time representation.
    ///
    /// The model is fused into the scenario field (`"{scenario}|{model}"`)
    /// and replaced by the placeholder; a `Diagnostics|{model}|…` variable
    /// prefix moves back into the model field; years become float times.
    pub fn to_time_frame(&self) -> Result<TimeFrame, ConvertError> {
        let mut key_map: BTreeMap<ScenarioKey, BTreeSet<ScenarioKey>> = BTreeMap::new();
        let data: Vec<TimeObservation> = self
            .data
            .iter()
            .map(|obs| {
                let (model, scenario, variable) =
                    identity_a_to_b(&obs.model, &obs.scenario, &obs.variable);
                let converted = TimeObservation {
                    model,
                    scenario,
                    region: obs.region.clone(),
                    variable,
                    unit: obs.unit.clone(),
                    time: obs.year as f64,
                    value: obs.value,
                };
                key_map
                    .entry(obs.key())
                    .or_default()
                    .insert(converted.key());
                converted
            })
            .collect();

        let meta = carry_meta(&self.meta, &key_map, data.iter().map(TimeObservation::key), |key| {
            let (model, scenario, _) = identity_a_to_b(&key.model, &key.scenario, "");
            ScenarioKey::new(model, scenario)
        });
        TimeFrame::from_observations(data, Some(meta)).map_err(wrap_to_time)
    }
}

// ---------------------------------------------------------------------------
// B -> A
// ---------------------------------------------------------------------------

impl TimeFrame {
    /// Convert to the discrete-year representation.
    ///
    /// Times must be integral (never silently floored); a real model name
    /// moves into the `Diagnostics|{model}|…` variable prefix; a fused
    /// scenario field is split on its LAST separator back into scenario and
    /// model.
    pub fn to_iam_frame(&self) -> Result<IamFrame, ConvertError> {
        // `as i32` saturates, so out-of-range times must fail here too
        let non_integral: Vec<f64> = self
            .data
            .iter()
            .map(|o| o.time)
            .filter(|t| t.fract() != 0.0 || *t < i32::MIN as f64 || *t > i32::MAX as f64)
            .collect();
        if !non_integral.is_empty() {
            return Err(ConvertError::NonIntegralTime(non_integral));
        }

        let mut key_map: BTreeMap<ScenarioKey, BTreeSet<ScenarioKey>> = BTreeMap::new();
        let data: Vec<Observation> = self
            .data
            .iter()
            .map(|obs| {
                let (model, scenario, variable) =
                    identity_b_to_a(&obs.model, &obs.scenario, &obs.variable);
                let converted = Observation {
                    model,
                    scenario,
                    region: obs.region.clone(),
                    variable,
                    unit: obs.unit.clone(),
                    year: obs.time as i32,
                    value: obs.value,
                };
                key_map
                    .entry(obs.key())
                    .or_default()
                    .insert(converted.key());
                converted
            })
            .collect();

        let meta = carry_meta(&self.meta, &key_map, data.iter().map(Observation::key), |key| {
            let (model, scenario, _) = identity_b_to_a(&key.model, &key.scenario, "");
            ScenarioKey::new(model, scenario)
        });
        IamFrame::from_observations(data, Some(meta)).map_err(wrap_to_iam)
    }
}

// ---------------------------------------------------------------------------
// identity rules and meta carry-over
// ---------------------------------------------------------------------------

fn identity_a_to_b(model: &str, scenario: &str, variable: &str) -> (String, String, String) {
    let mut model = model.to_string();
    let mut scenario = scenario.to_string();
    let mut variable = variable.to_string();
    if model != MODEL_PLACEHOLDER {
        scenario = format!("{scenario}{SCENARIO_SEP}{model}");
        model = MODEL_PLACEHOLDER.to_string();
    }
    let diagnostics = variable
        .strip_prefix(DIAGNOSTICS_PREFIX)
        .and_then(|rest| rest.split_once(SCENARIO_SEP))
        .map(|(m, v)| (m.to_string(), v.to_string()));
    if let Some((m, v)) = diagnostics {
        model = m;
        variable = v;
    }
    (model, scenario, variable)
}

fn identity_b_to_a(model: &str, scenario: &str, variable: &str) -> (String, String, String) {
    let mut model = model.to_string();
    let mut scenario = scenario.to_string();
    let mut variable = variable.to_string();
    if model != MODEL_PLACEHOLDER {
        variable = format!("{DIAGNOSTICS_PREFIX}{model}{SCENARIO_SEP}{variable}");
        model = MODEL_PLACEHOLDER.to_string();
    }
    // split on the LAST separator, tolerating separators inside the name
    let fused = scenario
        .rsplit_once(SCENARIO_SEP)
        .map(|(scen, m)| (scen.to_string(), m.to_string()));
    if let Some((scen, m)) = fused {
        scenario = scen;
        model = m;
    }
    (model, scenario, variable)
}

/// Rebuild the meta table for converted data: the index follows the
/// converted data keys, column values follow the recorded old-key to
/// new-key correspondence, and meta-only keys are transformed by the
/// key-level rule alone.
fn carry_meta(
    old: &Meta,
    key_map: &BTreeMap<ScenarioKey, BTreeSet<ScenarioKey>>,
    data_keys: impl Iterator<Item = ScenarioKey>,
    key_rule: impl Fn(&ScenarioKey) -> ScenarioKey,
) -> Meta {
    let mut index: Vec<ScenarioKey> = Vec::new();
    let mut seen = BTreeSet::new();
    for key in data_keys {
        if seen.insert(key.clone()) {
            index.push(key);
        }
    }
    for key in old.index() {
        if key_map.contains_key(key) {
            continue;
        }
        let mapped = key_rule(key);
        if seen.insert(mapped.clone()) {
            index.push(mapped);
        }
    }

    let mut meta = Meta::new(index);
    let columns: Vec<String> = old.column_names().map(str::to_string).collect();
    for old_key in old.index() {
        let targets: Vec<ScenarioKey> = match key_map.get(old_key) {
            Some(new_keys) => new_keys.iter().cloned().collect(),
            None => vec![key_rule(old_key)],
        };
        for name in &columns {
            if let Some(value) = old.value(old_key, name) {
                for target in &targets {
                    meta.set_value(target, name, value.clone());
                }
            }
        }
    }
    meta
}

fn wrap_to_time(source: DataError) -> ConvertError {
    ConvertError::Internal {
        context: "cannot convert to a continuous-time frame".to_string(),
        source,
    }
}

fn wrap_to_iam(source: DataError) -> ConvertError {
    ConvertError::Internal {
        context: "cannot convert to a year-indexed frame".to_string(),
        source,
    }
}
