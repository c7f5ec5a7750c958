use std::collections::BTreeSet;

use log::info;

use crate::data::frame::IamFrame;
use crate::data::model::{MetaValue, Observation, ScenarioKey};
use crate::validate::Criteria;

impl IamFrame {
    /// Assign `label` to the meta column `name` for every scenario that
    /// passes all `criteria`.
    ///
    /// A scenario qualifies when it has at least one data row for one of
    /// the criteria variables and none of its rows violate the bounds.
    /// Scenarios without data for the variables stay unset. The column is
    /// only created when at least one scenario qualifies.
    pub fn categorize<S: AsRef<str>>(
        &mut self,
        name: &str,
        label: &str,
        criteria: &[(S, Criteria)],
    ) {
        let failing: BTreeSet<ScenarioKey> = self
            .validate(criteria, false)
            .map(|rows| rows.iter().map(Observation::key).collect())
            .unwrap_or_default();

        let variables: BTreeSet<&str> = criteria.iter().map(|(v, _)| v.as_ref()).collect();
        let candidates: BTreeSet<ScenarioKey> = self
            .data
            .iter()
            .filter(|o| variables.contains(o.variable.as_str()))
            .map(Observation::key)
            .collect();

        let passing: Vec<ScenarioKey> = candidates
            .into_iter()
            .filter(|k| !failing.contains(k))
            .collect();
        if passing.is_empty() {
            info!("No scenarios satisfy the criteria");
            return;
        }

        for key in &passing {
            self.meta
                .set_value(key, name, MetaValue::String(label.to_string()));
        }
        info!("{} scenarios categorized as `{name}: {label}`", passing.len());
    }
}
