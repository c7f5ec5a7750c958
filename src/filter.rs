use std::collections::BTreeSet;

use regex::Regex;

use crate::data::frame::IamFrame;
use crate::data::model::{hierarchy_depth, MetaValue, Observation, ScenarioKey};
use crate::error::FilterError;

/// Data-table columns that can appear in a filter entry; anything else is
/// resolved against the meta-column names.
const DATA_COLS: [&str; 6] = ["model", "scenario", "region", "variable", "unit", "year"];

// ---------------------------------------------------------------------------
// DepthFilter – variable hierarchy depth constraint
// ---------------------------------------------------------------------------

/// Hierarchy depth constraint: `"N"` exact, `"N-"` at most, `"N+"` at least.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFilter {
    Exact(usize),
    AtMost(usize),
    AtLeast(usize),
}

impl DepthFilter {
    pub fn parse(expr: &str) -> Result<Self, FilterError> {
        let malformed = || FilterError::InvalidLevel(expr.to_string());
        if let Some(n) = expr.strip_suffix('-') {
            return n.parse().map(DepthFilter::AtMost).map_err(|_| malformed());
        }
        if let Some(n) = expr.strip_suffix('+') {
            return n.parse().map(DepthFilter::AtLeast).map_err(|_| malformed());
        }
        expr.parse().map(DepthFilter::Exact).map_err(|_| malformed())
    }

    pub fn matches(&self, depth: usize) -> bool {
        match self {
            DepthFilter::Exact(n) => depth == *n,
            DepthFilter::AtMost(n) => depth <= *n,
            DepthFilter::AtLeast(n) => depth >= *n,
        }
    }
}

// ---------------------------------------------------------------------------
// Filter – the predicate structure
// ---------------------------------------------------------------------------

/// Pattern values of one filter entry (OR-combined).
#[derive(Debug, Clone)]
pub struct Patterns(Vec<MetaValue>);

impl From<&str> for Patterns {
    fn from(s: &str) -> Self {
        Patterns(vec![MetaValue::from(s)])
    }
}

impl From<String> for Patterns {
    fn from(s: String) -> Self {
        Patterns(vec![MetaValue::from(s)])
    }
}

impl From<i64> for Patterns {
    fn from(i: i64) -> Self {
        Patterns(vec![MetaValue::Integer(i)])
    }
}

impl From<i32> for Patterns {
    fn from(i: i32) -> Self {
        Patterns(vec![MetaValue::Integer(i as i64)])
    }
}

impl From<f64> for Patterns {
    fn from(v: f64) -> Self {
        Patterns(vec![MetaValue::Float(v)])
    }
}

impl From<bool> for Patterns {
    fn from(b: bool) -> Self {
        Patterns(vec![MetaValue::Bool(b)])
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for Patterns {
    fn from(values: Vec<T>) -> Self {
        Patterns(values.into_iter().map(Into::into).collect())
    }
}

/// Conjunctive row predicate over data index columns and meta columns.
///
/// Each entry is (column, pattern values): a row matches an entry when its
/// value matches ANY of the patterns, and matches the filter when it
/// matches ALL entries (plus the depth constraint).
#[derive(Debug, Clone, Default)]
pub struct Filter {
    entries: Vec<(String, Patterns)>,
    level: Option<DepthFilter>,
    regexp: bool,
    invert: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain an arbitrary column (data index column or meta column).
    pub fn column(mut self, name: &str, patterns: impl Into<Patterns>) -> Self {
        self.entries.push((name.to_string(), patterns.into()));
        self
    }

    pub fn model(self, patterns: impl Into<Patterns>) -> Self {
        self.column("model", patterns)
    }

    pub fn scenario(self, patterns: impl Into<Patterns>) -> Self {
        self.column("scenario", patterns)
    }

    pub fn region(self, patterns: impl Into<Patterns>) -> Self {
        self.column("region", patterns)
    }

    pub fn variable(self, patterns: impl Into<Patterns>) -> Self {
        self.column("variable", patterns)
    }

    pub fn unit(self, patterns: impl Into<Patterns>) -> Self {
        self.column("unit", patterns)
    }

    pub fn year(self, patterns: impl Into<Patterns>) -> Self {
        self.column("year", patterns)
    }

    /// Variable hierarchy depth constraint, e.g. `"1"`, `"0-"`, `"1+"`.
    /// Malformed expressions (e.g. `"1/"`) fail here.
    pub fn level(mut self, expr: &str) -> Result<Self, FilterError> {
        self.level = Some(DepthFilter::parse(expr)?);
        Ok(self)
    }

    /// Switch string matching from glob to regular-expression search
    /// (anchored at the start of the field).
    pub fn regexp(mut self, on: bool) -> Self {
        self.regexp = on;
        self
    }

    /// `keep(false)` inverts the selection: rows NOT matching are returned.
    pub fn keep(mut self, keep: bool) -> Self {
        self.invert = !keep;
        self
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

enum Matcher {
    Pattern(Regex),
    Value(MetaValue),
}

impl Matcher {
    fn compile(pattern: &MetaValue, regexp: bool) -> Result<Self, FilterError> {
        match pattern {
            MetaValue::String(s) => {
                let expr = if regexp {
                    // re.match semantics: anchored at the start only
                    format!("^(?:{s})")
                } else {
                    glob_to_regex(s)
                };
                let re = Regex::new(&expr).map_err(|source| FilterError::BadPattern {
                    pattern: s.clone(),
                    source,
                })?;
                Ok(Matcher::Pattern(re))
            }
            other => Ok(Matcher::Value(other.clone())),
        }
    }

    fn matches_str(&self, value: &str) -> bool {
        match self {
            Matcher::Pattern(re) => re.is_match(value),
            Matcher::Value(v) => v.as_str() == Some(value),
        }
    }

    fn matches_year(&self, year: i32) -> bool {
        match self {
            Matcher::Pattern(_) => false,
            Matcher::Value(v) => v.as_f64() == Some(year as f64),
        }
    }

    fn matches_meta(&self, value: &MetaValue) -> bool {
        match (self, value) {
            (Matcher::Pattern(re), MetaValue::String(s)) => re.is_match(s),
            (Matcher::Pattern(_), _) => false,
            (Matcher::Value(MetaValue::Bool(p)), MetaValue::Bool(v)) => p == v,
            (Matcher::Value(p), v) => match (p.as_f64(), v.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => p == v,
            },
        }
    }
}

/// Translate a glob pattern to an anchored regex: a bare string matches the
/// whole field; `*` and `?` are wildcards.
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c if regex_syntax_char(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

fn regex_syntax_char(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '#' | '&' | '~' | '-'
    )
}

enum CompiledEntry {
    Data { column: String, matchers: Vec<Matcher> },
    // meta entries resolve to the set of scenario keys whose value matches
    Meta { allowed: BTreeSet<ScenarioKey> },
}

impl CompiledEntry {
    fn matches(&self, obs: &Observation) -> bool {
        match self {
            CompiledEntry::Data { column, matchers } => match column.as_str() {
                "model" => matchers.iter().any(|m| m.matches_str(&obs.model)),
                "scenario" => matchers.iter().any(|m| m.matches_str(&obs.scenario)),
                "region" => matchers.iter().any(|m| m.matches_str(&obs.region)),
                "variable" => matchers.iter().any(|m| m.matches_str(&obs.variable)),
                "unit" => matchers.iter().any(|m| m.matches_str(&obs.unit)),
                "year" => matchers.iter().any(|m| m.matches_year(obs.year)),
                _ => false,
            },
            CompiledEntry::Meta { allowed } => allowed.contains(&obs.key()),
        }
    }
}

impl IamFrame {
    /// Apply a filter, returning a new frame with the matching rows and the
    /// meta table restricted to the surviving (model, scenario) keys.
    ///
    /// Pure: the source frame is never modified, rows are never duplicated.
    pub fn filter(&self, filter: &Filter) -> Result<IamFrame, FilterError> {
        let selected = self.matching_rows(filter)?;
        let data: Vec<Observation> = self
            .data
            .iter()
            .zip(&selected)
            .filter(|(_, keep)| **keep)
            .map(|(obs, _)| obs.clone())
            .collect();
        let keys: BTreeSet<ScenarioKey> = data.iter().map(Observation::key).collect();
        let meta = self.meta.restrict(&keys);
        Ok(IamFrame { data, meta })
    }

    /// Per-row match flags, with `keep(false)` inversion applied.
    pub fn matching_rows(&self, filter: &Filter) -> Result<Vec<bool>, FilterError> {
        let mut compiled = Vec::with_capacity(filter.entries.len());
        for (column, patterns) in &filter.entries {
            let matchers: Vec<Matcher> = patterns
                .0
                .iter()
                .map(|p| Matcher::compile(p, filter.regexp))
                .collect::<Result<_, _>>()?;

            if DATA_COLS.contains(&column.as_str()) {
                compiled.push(CompiledEntry::Data {
                    column: column.clone(),
                    matchers,
                });
            } else if self.meta.has_column(column) {
                let values = self.meta.column(column).unwrap();
                let allowed = self
                    .meta
                    .index()
                    .iter()
                    .zip(values)
                    .filter(|(_, v)| matchers.iter().any(|m| m.matches_meta(v)))
                    .map(|(k, _)| k.clone())
                    .collect();
                compiled.push(CompiledEntry::Meta { allowed });
            } else {
                return Err(FilterError::UnknownColumn(column.clone()));
            }
        }

        let flags = self
            .data
            .iter()
            .map(|obs| {
                let mut hit = compiled.iter().all(|entry| entry.matches(obs));
                if let Some(level) = &filter.level {
                    hit = hit && level.matches(hierarchy_depth(&obs.variable));
                }
                hit != filter.invert
            })
            .collect();
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_parsing() {
        assert_eq!(DepthFilter::parse("1").unwrap(), DepthFilter::Exact(1));
        assert_eq!(DepthFilter::parse("0-").unwrap(), DepthFilter::AtMost(0));
        assert_eq!(DepthFilter::parse("2+").unwrap(), DepthFilter::AtLeast(2));
        assert!(matches!(
            DepthFilter::parse("1/"),
            Err(FilterError::InvalidLevel(_))
        ));
        assert!(matches!(
            DepthFilter::parse("-1"),
            Err(FilterError::InvalidLevel(_))
        ));
    }

    #[test]
    fn glob_translation() {
        assert_eq!(glob_to_regex("Primary Energy"), "^Primary Energy$");
        assert_eq!(glob_to_regex("Primary Energy|*"), r"^Primary Energy\|.*$");
        let re = Regex::new(&glob_to_regex("Primary Energy|*")).unwrap();
        assert!(re.is_match("Primary Energy|Coal"));
        assert!(!re.is_match("Primary Energy"));
    }

    #[test]
    fn bare_glob_matches_whole_field_only() {
        let re = Regex::new(&glob_to_regex("Primary Energy")).unwrap();
        assert!(re.is_match("Primary Energy"));
        assert!(!re.is_match("Primary Energy|Coal"));
    }
}
