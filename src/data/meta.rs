use std::collections::{BTreeMap, BTreeSet};

use crate::data::model::{MetaValue, RawTable, ScenarioKey};
use crate::error::{DataError, MetaError};

/// Built-in meta column flagging scenarios that failed validation.
pub const EXCLUDE_COL: &str = "exclude";

// ---------------------------------------------------------------------------
// Meta – the per-scenario annotation table
// ---------------------------------------------------------------------------

/// Annotation table keyed by (model, scenario), independent of the time axis.
///
/// Columns are added dynamically; the `exclude` column always exists and
/// defaults to `false`. Column vectors are kept parallel to `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    index: Vec<ScenarioKey>,
    columns: BTreeMap<String, Vec<MetaValue>>,
}

impl Meta {
    /// One row per unique key, in order of first appearance, exclude=false.
    pub fn new(keys: impl IntoIterator<Item = ScenarioKey>) -> Self {
        let mut index = Vec::new();
        let mut seen = BTreeSet::new();
        for key in keys {
            if seen.insert(key.clone()) {
                index.push(key);
            }
        }
        let exclude = vec![MetaValue::Bool(false); index.len()];
        let mut columns = BTreeMap::new();
        columns.insert(EXCLUDE_COL.to_string(), exclude);
        Self { index, columns }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[ScenarioKey] {
        &self.index
    }

    pub fn contains(&self, key: &ScenarioKey) -> bool {
        self.position(key).is_some()
    }

    pub fn position(&self, key: &ScenarioKey) -> Option<usize> {
        self.index.iter().position(|k| k == key)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// The column's values in index order, `None` when it was never created.
    pub fn column(&self, name: &str) -> Option<&[MetaValue]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Value at (key, column); `None` when key or column is absent.
    pub fn value(&self, key: &ScenarioKey, name: &str) -> Option<&MetaValue> {
        let pos = self.position(key)?;
        self.columns.get(name).map(|col| &col[pos])
    }

    /// The exclude flags in index order.
    pub fn exclude(&self) -> Vec<bool> {
        self.columns[EXCLUDE_COL]
            .iter()
            .map(|v| matches!(v, MetaValue::Bool(true)))
            .collect()
    }

    /// Mark one scenario as excluded; unknown keys are ignored.
    pub fn set_exclude(&mut self, key: &ScenarioKey) {
        if let Some(pos) = self.position(key) {
            self.columns.get_mut(EXCLUDE_COL).unwrap()[pos] = MetaValue::Bool(true);
        }
    }

    fn ensure_column(&mut self, name: &str) -> &mut Vec<MetaValue> {
        let len = self.index.len();
        self.columns
            .entry(name.to_string())
            .or_insert_with(|| vec![MetaValue::Null; len])
    }

    /// Set one cell, creating the column (Null-filled) on first use.
    /// Unknown keys are ignored.
    pub fn set_value(&mut self, key: &ScenarioKey, name: &str, value: MetaValue) {
        if let Some(pos) = self.position(key) {
            self.ensure_column(name)[pos] = value;
        }
    }

    // -- set_meta operation variants --

    /// Broadcast a scalar to all rows.
    pub fn set_scalar(&mut self, name: &str, value: MetaValue) {
        let len = self.index.len();
        *self.ensure_column(name) = vec![value; len];
    }

    /// Broadcast a scalar to a subset of keys; rows outside the subset keep
    /// their previous value (or default to Null for a new column).
    pub fn set_scalar_at(
        &mut self,
        name: &str,
        value: MetaValue,
        keys: &[ScenarioKey],
    ) -> Result<(), MetaError> {
        let unknown: Vec<ScenarioKey> = keys
            .iter()
            .filter(|k| !self.contains(k))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(MetaError::UnknownKey(unknown));
        }
        let positions: Vec<usize> = keys.iter().map(|k| self.position(k).unwrap()).collect();
        let col = self.ensure_column(name);
        for pos in positions {
            col[pos] = value.clone();
        }
        Ok(())
    }

    /// Positional assignment in index order; length must match exactly.
    pub fn set_list(&mut self, name: &str, values: Vec<MetaValue>) -> Result<(), MetaError> {
        if values.len() != self.index.len() {
            return Err(MetaError::LengthMismatch {
                expected: self.index.len(),
                given: values.len(),
            });
        }
        self.columns.insert(name.to_string(), values);
        Ok(())
    }

    /// Keyed assignment; the series index must be a unique subset of the
    /// meta index. Rows not covered are set to Null for a new column and
    /// left untouched for an existing one.
    pub fn set_series(
        &mut self,
        series: &MetaSeries,
        name: Option<&str>,
    ) -> Result<(), MetaError> {
        let name = match name.or(series.name.as_deref()) {
            Some(n) => n.to_string(),
            None => return Err(MetaError::MissingName),
        };

        let mut seen = BTreeSet::new();
        let duplicates: Vec<ScenarioKey> = series
            .entries
            .iter()
            .filter(|(k, _)| !seen.insert(k.clone()))
            .map(|(k, _)| k.clone())
            .collect();
        if !duplicates.is_empty() {
            return Err(MetaError::DuplicateKey(duplicates));
        }

        let unknown: Vec<ScenarioKey> = series
            .entries
            .iter()
            .filter(|(k, _)| !self.contains(k))
            .map(|(k, _)| k.clone())
            .collect();
        if !unknown.is_empty() {
            return Err(MetaError::UnknownKey(unknown));
        }

        for (key, value) in &series.entries {
            self.set_value(key, &name, value.clone());
        }
        Ok(())
    }

    // -- realignment under frame operations --

    /// Restrict to the keys in `keep`, preserving index order and columns.
    pub fn restrict(&self, keep: &BTreeSet<ScenarioKey>) -> Meta {
        let positions: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, k)| keep.contains(k))
            .map(|(i, _)| i)
            .collect();
        let index = positions.iter().map(|&i| self.index[i].clone()).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| {
                let values = positions.iter().map(|&i| col[i].clone()).collect();
                (name.clone(), values)
            })
            .collect();
        Meta { index, columns }
    }

    /// Concatenate two metas with disjoint indices; the column set is the
    /// union, missing cells become Null. Key overlap is checked upstream.
    pub fn concat(&self, other: &Meta) -> Meta {
        let mut index = self.index.clone();
        index.extend(other.index.iter().cloned());

        let names: BTreeSet<&String> = self.columns.keys().chain(other.columns.keys()).collect();
        let columns = names
            .into_iter()
            .map(|name| {
                let mut values = self
                    .columns
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| vec![MetaValue::Null; self.index.len()]);
                values.extend(
                    other
                        .columns
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| vec![MetaValue::Null; other.index.len()]),
                );
                (name.clone(), values)
            })
            .collect();
        Meta { index, columns }
    }

    /// Relabel keys through `map`, keeping row order and column values.
    /// Returns `None` when the relabeled index is no longer unique.
    pub fn relabel<F>(&self, map: F) -> Option<Meta>
    where
        F: Fn(&ScenarioKey) -> ScenarioKey,
    {
        let index: Vec<ScenarioKey> = self.index.iter().map(|k| map(k)).collect();
        let unique: BTreeSet<&ScenarioKey> = index.iter().collect();
        if unique.len() != index.len() {
            return None;
        }
        Some(Meta {
            index,
            columns: self.columns.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// MetaSeries – a keyed assignment input
// ---------------------------------------------------------------------------

/// A (possibly named) series of key -> value entries for `set_meta`.
#[derive(Debug, Clone, Default)]
pub struct MetaSeries {
    pub name: Option<String>,
    pub entries: Vec<(ScenarioKey, MetaValue)>,
}

impl MetaSeries {
    pub fn new(entries: Vec<(ScenarioKey, MetaValue)>) -> Self {
        Self {
            name: None,
            entries,
        }
    }

    pub fn named(name: impl Into<String>, entries: Vec<(ScenarioKey, MetaValue)>) -> Self {
        Self {
            name: Some(name.into()),
            entries,
        }
    }
}

/// Extract the unique (model, scenario) keys of a raw table, in row order.
/// Extra dimensions (e.g. region) are ignored.
pub fn keys_from_table(table: &RawTable) -> Result<Vec<ScenarioKey>, DataError> {
    let missing = table.missing_columns(&["model", "scenario"]);
    if !missing.is_empty() {
        return Err(DataError::MissingColumns(missing));
    }
    let mut keys = Vec::new();
    let mut seen = BTreeSet::new();
    for row in 0..table.len() {
        let key = ScenarioKey::new(
            table.string_cell(row, "model"),
            table.string_cell(row, "scenario"),
        );
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }
    Ok(keys)
}
