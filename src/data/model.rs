use std::fmt;

use crate::error::DataError;

/// Index columns shared by both schema representations.
pub const INDEX_COLS: [&str; 5] = ["model", "scenario", "region", "variable", "unit"];

/// Delimiter of the variable hierarchy ("Primary Energy|Coal").
pub const HIERARCHY_SEP: char = '|';

// ---------------------------------------------------------------------------
// MetaValue – a single cell in a table column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value for meta columns and raw input tables.
/// Using `BTreeMap` / `BTreeSet` downstream so `MetaValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put MetaValue in BTreeSet --

impl Eq for MetaValue {}

impl PartialOrd for MetaValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetaValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetaValue::*;
        fn discriminant(v: &MetaValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for MetaValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetaValue::String(s) => s.hash(state),
            MetaValue::Integer(i) => i.hash(state),
            MetaValue::Float(f) => f.to_bits().hash(state),
            MetaValue::Bool(b) => b.hash(state),
            MetaValue::Null => {}
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::String(s) => write!(f, "{s}"),
            MetaValue::Integer(i) => write!(f, "{i}"),
            MetaValue::Float(v) => write!(f, "{v}"),
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetaValue {
    /// Try to interpret the value as an `f64` for numeric comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Float(v) => Some(*v),
            MetaValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetaValue::Null)
    }

    /// String content, if this is a string cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        MetaValue::Integer(i)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// ScenarioKey – the meta-table index
// ---------------------------------------------------------------------------

/// The (model, scenario) pair that keys the meta table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScenarioKey {
    pub model: String,
    pub scenario: String,
}

impl ScenarioKey {
    pub fn new(model: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            scenario: scenario.into(),
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.model, self.scenario)
    }
}

// ---------------------------------------------------------------------------
// Observation – one long-format data row
// ---------------------------------------------------------------------------

/// One row of the discrete-year representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub model: String,
    pub scenario: String,
    pub region: String,
    pub variable: String,
    pub unit: String,
    pub year: i32,
    pub value: f64,
}

impl Observation {
    pub fn key(&self) -> ScenarioKey {
        ScenarioKey::new(self.model.clone(), self.scenario.clone())
    }

    /// The full uniqueness key of the row (everything but the value).
    pub fn index(&self) -> (String, String, String, String, String, i32) {
        (
            self.model.clone(),
            self.scenario.clone(),
            self.region.clone(),
            self.variable.clone(),
            self.unit.clone(),
            self.year,
        )
    }
}

/// One row of the continuous-time representation.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeObservation {
    pub model: String,
    pub scenario: String,
    pub region: String,
    pub variable: String,
    pub unit: String,
    pub time: f64,
    pub value: f64,
}

impl TimeObservation {
    pub fn key(&self) -> ScenarioKey {
        ScenarioKey::new(self.model.clone(), self.scenario.clone())
    }
}

/// Hierarchy depth of a variable name: number of delimiters.
/// "Primary Energy" is depth 0, "Primary Energy|Coal" depth 1.
pub fn hierarchy_depth(variable: &str) -> usize {
    variable.matches(HIERARCHY_SEP).count()
}

// ---------------------------------------------------------------------------
// RawTable – the neutral construction input
// ---------------------------------------------------------------------------

/// A named-column table of dynamically-typed cells, as produced by the file
/// loaders or assembled in memory. Frames are constructed from this.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<MetaValue>>,
}

impl RawTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; the cell count must match the column count.
    pub fn push_row(&mut self, row: Vec<MetaValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<MetaValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The cell at (row, column name), `Null` when the column is absent.
    pub fn cell(&self, row: usize, name: &str) -> &MetaValue {
        self.column_index(name)
            .map(|i| &self.rows[row][i])
            .unwrap_or(&MetaValue::Null)
    }

    /// Names from `required` that this table does not carry.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| self.column_index(c).is_none())
            .map(|c| c.to_string())
            .collect()
    }

    /// Cell rendered as a string, for the index columns.
    pub(crate) fn string_cell(&self, row: usize, name: &str) -> String {
        match self.cell(row, name) {
            MetaValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Numeric content of a cell, or an error naming column and value.
    pub(crate) fn numeric_cell(&self, row: usize, name: &str) -> Result<Option<f64>, DataError> {
        match self.cell(row, name) {
            MetaValue::Null => Ok(None),
            v => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| DataError::NonNumericValue {
                    column: name.to_string(),
                    value: v.to_string(),
                }),
        }
    }
}
