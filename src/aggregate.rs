use std::collections::{BTreeMap, BTreeSet};

use log::info;
use serde::{Deserialize, Serialize};

use crate::data::frame::IamFrame;
use crate::data::model::{hierarchy_depth, Observation, ScenarioKey, HIERARCHY_SEP};

// ---------------------------------------------------------------------------
// Tolerance and options
// ---------------------------------------------------------------------------

/// Closeness test in the numpy `isclose` form:
/// |reported − computed| ≤ atol + rtol · |computed|.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

impl Tolerance {
    pub fn close(&self, reported: f64, computed: f64) -> bool {
        (reported - computed).abs() <= self.atol + self.rtol * computed.abs()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    /// Restrict the check to one year.
    pub year: Option<i32>,
    pub tolerance: Tolerance,
    /// Flag failing (model, scenario) keys in the meta `exclude` column.
    pub exclude_on_fail: bool,
}

/// One row whose reported value disagrees with the recomputed aggregate.
///
/// For the hierarchical check `variable` is the parent and `region` the
/// row's own region; for the regional check `region` is the target region.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateMismatch {
    pub variable: String,
    pub model: String,
    pub scenario: String,
    pub region: String,
    pub year: i32,
    pub reported: f64,
    pub computed: f64,
}

// ---------------------------------------------------------------------------
// Reconstruct-and-compare checks
// ---------------------------------------------------------------------------

impl IamFrame {
    /// Check that a variable equals the sum of its direct children
    /// (one hierarchy level below) per (model, scenario, region, year).
    ///
    /// Skips (returns `None`) when the variable has no children; otherwise
    /// returns the rows outside tolerance, or `None` when all agree.
    pub fn check_aggregate(
        &mut self,
        variable: &str,
        opts: &AggregateOptions,
    ) -> Option<Vec<AggregateMismatch>> {
        let child_depth = hierarchy_depth(variable) + 1;
        let prefix = format!("{variable}{HIERARCHY_SEP}");
        let children: BTreeSet<&str> = self
            .data
            .iter()
            .filter(|o| o.variable.starts_with(&prefix) && hierarchy_depth(&o.variable) == child_depth)
            .map(|o| o.variable.as_str())
            .collect();
        if children.is_empty() {
            info!("cannot check aggregate for `{variable}` because it has no children");
            return None;
        }

        // units are dropped during aggregation
        let mut computed: BTreeMap<(String, String, String, i32), f64> = BTreeMap::new();
        for obs in &self.data {
            if !children.contains(obs.variable.as_str()) {
                continue;
            }
            if opts.year.is_some_and(|y| obs.year != y) {
                continue;
            }
            *computed
                .entry((
                    obs.model.clone(),
                    obs.scenario.clone(),
                    obs.region.clone(),
                    obs.year,
                ))
                .or_default() += obs.value;
        }

        let mismatches: Vec<AggregateMismatch> = self
            .data
            .iter()
            .filter(|o| o.variable == variable && !opts.year.is_some_and(|y| o.year != y))
            .filter_map(|obs| {
                let key = (
                    obs.model.clone(),
                    obs.scenario.clone(),
                    obs.region.clone(),
                    obs.year,
                );
                // inner join: skip keys with no child data
                let sum = *computed.get(&key)?;
                if opts.tolerance.close(obs.value, sum) {
                    None
                } else {
                    Some(AggregateMismatch {
                        variable: variable.to_string(),
                        model: obs.model.clone(),
                        scenario: obs.scenario.clone(),
                        region: obs.region.clone(),
                        year: obs.year,
                        reported: obs.value,
                        computed: sum,
                    })
                }
            })
            .collect();

        self.finish_check(variable, mismatches, opts)
    }

    /// Check that a variable's value in `region` equals the sum over the
    /// component sub-regions per (model, scenario, year).
    ///
    /// Components default to every region with data for the variable except
    /// the target. Overlapping components are never deduplicated; the
    /// resulting mismatch is intentional and the caller must pass a
    /// disjoint `components` list to avoid it.
    pub fn check_aggregate_regions(
        &mut self,
        variable: &str,
        region: &str,
        components: Option<&[&str]>,
        opts: &AggregateOptions,
    ) -> Option<Vec<AggregateMismatch>> {
        let rows: Vec<&Observation> = self
            .data
            .iter()
            .filter(|o| o.variable == variable && !opts.year.is_some_and(|y| o.year != y))
            .collect();

        if !rows.iter().any(|o| o.region == region) {
            info!("variable `{variable}` does not exist in region `{region}`");
            return None;
        }

        let components: BTreeSet<String> = match components {
            Some(list) => list.iter().map(|c| c.to_string()).collect(),
            None => rows
                .iter()
                .filter(|o| o.region != region)
                .map(|o| o.region.clone())
                .collect(),
        };
        if components.is_empty() {
            info!("no component regions to aggregate `{variable}` for `{region}`");
            return None;
        }

        let mut computed: BTreeMap<(String, String, i32), f64> = BTreeMap::new();
        for obs in &rows {
            if components.contains(&obs.region) {
                *computed
                    .entry((obs.model.clone(), obs.scenario.clone(), obs.year))
                    .or_default() += obs.value;
            }
        }

        let mismatches: Vec<AggregateMismatch> = rows
            .iter()
            .filter(|o| o.region == region)
            .filter_map(|obs| {
                let key = (obs.model.clone(), obs.scenario.clone(), obs.year);
                let sum = *computed.get(&key)?;
                if opts.tolerance.close(obs.value, sum) {
                    None
                } else {
                    Some(AggregateMismatch {
                        variable: variable.to_string(),
                        model: obs.model.clone(),
                        scenario: obs.scenario.clone(),
                        region: region.to_string(),
                        year: obs.year,
                        reported: obs.value,
                        computed: sum,
                    })
                }
            })
            .collect();

        self.finish_check(variable, mismatches, opts)
    }

    fn finish_check(
        &mut self,
        variable: &str,
        mismatches: Vec<AggregateMismatch>,
        opts: &AggregateOptions,
    ) -> Option<Vec<AggregateMismatch>> {
        if mismatches.is_empty() {
            return None;
        }
        info!(
            "`{variable}` - {} of {} rows are not aggregates of their components",
            mismatches.len(),
            self.data.len()
        );
        if opts.exclude_on_fail {
            self.exclude_on_fail(
                mismatches
                    .iter()
                    .map(|m| ScenarioKey::new(m.model.clone(), m.scenario.clone())),
            );
        }
        Some(mismatches)
    }
}
