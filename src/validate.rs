use std::collections::BTreeSet;

use log::info;
use serde::{Deserialize, Serialize};

use crate::data::frame::IamFrame;
use crate::data::model::{Observation, ScenarioKey};

// ---------------------------------------------------------------------------
// Criteria – per-variable validation bounds
// ---------------------------------------------------------------------------

/// Numeric range criteria for one variable. Omitted bounds default to
/// ±infinity; `year` restricts the check to a single year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    pub up: Option<f64>,
    pub lo: Option<f64>,
    pub year: Option<i32>,
}

impl Criteria {
    /// Strictly outside [lo, up]; values exactly at a bound pass.
    fn violated_by(&self, obs: &Observation) -> bool {
        if let Some(year) = self.year {
            if obs.year != year {
                return false;
            }
        }
        let up = self.up.unwrap_or(f64::INFINITY);
        let lo = self.lo.unwrap_or(f64::NEG_INFINITY);
        obs.value > up || obs.value < lo
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl IamFrame {
    /// Check data rows against per-variable criteria.
    ///
    /// Returns the violating rows (criteria order, then data order) or
    /// `None` when every row passes. Variables with no data rows pass by
    /// default. With `exclude_on_fail`, every (model, scenario) that has at
    /// least one violating row is flagged in the meta `exclude` column.
    pub fn validate<S: AsRef<str>>(
        &mut self,
        criteria: &[(S, Criteria)],
        exclude_on_fail: bool,
    ) -> Option<Vec<Observation>> {
        let mut violations: Vec<Observation> = Vec::new();
        for (variable, criterion) in criteria {
            violations.extend(
                self.data
                    .iter()
                    .filter(|obs| obs.variable == variable.as_ref() && criterion.violated_by(obs))
                    .cloned(),
            );
        }
        if violations.is_empty() {
            return None;
        }

        info!(
            "{} of {} data points do not satisfy the criteria",
            violations.len(),
            self.data.len()
        );
        if exclude_on_fail {
            self.exclude_on_fail(violations.iter().map(Observation::key));
        }
        Some(violations)
    }

    /// Scenario keys (present in data) that have no row for `variable`,
    /// optionally restricted by unit and year. `None` when all have it.
    pub fn require_variable(
        &mut self,
        variable: &str,
        unit: Option<&str>,
        year: Option<i32>,
        exclude_on_fail: bool,
    ) -> Option<Vec<ScenarioKey>> {
        let having: BTreeSet<ScenarioKey> = self
            .data
            .iter()
            .filter(|obs| {
                obs.variable == variable
                    && unit.map_or(true, |u| obs.unit == u)
                    && year.map_or(true, |y| obs.year == y)
            })
            .map(Observation::key)
            .collect();

        let data_keys: BTreeSet<ScenarioKey> = self.data.iter().map(Observation::key).collect();
        let missing: Vec<ScenarioKey> = self
            .meta
            .index()
            .iter()
            .filter(|k| data_keys.contains(k) && !having.contains(k))
            .cloned()
            .collect();
        if missing.is_empty() {
            return None;
        }

        info!(
            "{} scenarios do not include required variable `{variable}`",
            missing.len()
        );
        if exclude_on_fail {
            self.exclude_on_fail(missing.iter().cloned());
        }
        Some(missing)
    }

    /// Flag the given scenario keys in the meta `exclude` column.
    pub(crate) fn exclude_on_fail(&mut self, keys: impl Iterator<Item = ScenarioKey>) {
        let unique: BTreeSet<ScenarioKey> = keys.collect();
        for key in &unique {
            self.meta.set_exclude(key);
        }
        if !unique.is_empty() {
            info!("{} scenarios marked as excluded", unique.len());
        }
    }
}
