use thiserror::Error;

use crate::data::model::ScenarioKey;

/// Errors raised while constructing or mutating a frame.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("missing required columns `{0:?}`!")]
    MissingColumns(Vec<String>),
    #[error("invalid values `{0:?}` in year column, must be castable to integer")]
    InvalidYearLabels(Vec<String>),
    #[error("found a `time` column, expected a discrete `year` axis")]
    TimeAxisNotAllowed,
    #[error("duplicate rows for `{0}`")]
    DuplicateRows(String),
    #[error("duplicate (model, scenario) pairs between frames: `{0:?}`")]
    DuplicateScenarios(Vec<ScenarioKey>),
    #[error("cannot rename on column `{0}`")]
    UnknownRenameColumn(String),
    #[error("renaming yields non-unique (model, scenario) index")]
    NonUniqueRenameIndex,
    #[error("value `{value}` in column `{column}` is not numeric")]
    NonNumericValue { column: String, value: String },
}

/// Errors raised by the filter engine.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("filter by `{0}` not supported")]
    UnknownColumn(String),
    #[error("depth expression `{0}` is malformed, expected N, N- or N+")]
    InvalidLevel(String),
    #[error("invalid pattern `{pattern}`: {source}")]
    BadPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Errors raised by meta-table assignment.
#[derive(Error, Debug)]
pub enum MetaError {
    #[error("{given} values given for {expected} meta rows")]
    LengthMismatch { expected: usize, given: usize },
    #[error("duplicate (model, scenario) keys in assignment: `{0:?}`")]
    DuplicateKey(Vec<ScenarioKey>),
    #[error("(model, scenario) keys not in meta index: `{0:?}`")]
    UnknownKey(Vec<ScenarioKey>),
    #[error("unnamed assignment, a column name is required")]
    MissingName,
}

/// Single error kind for the A <-> B schema conversion boundary.
///
/// Every failure inside a conversion surfaces as one of these variants; the
/// underlying cause is preserved as a source chain, never leaked as its raw
/// error type.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("missing required columns `{0:?}`!")]
    MissingColumns(Vec<String>),
    #[error("non-integral time values `{0:?}` cannot map to a year axis")]
    NonIntegralTime(Vec<f64>),
    #[error("{context}: {source}")]
    Internal {
        context: String,
        #[source]
        source: DataError,
    },
}
