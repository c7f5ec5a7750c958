//! In-memory analysis of integrated-assessment-model scenario timeseries.
//!
//! The core type is [`IamFrame`]: long-format (model, scenario, region,
//! variable, unit, year, value) rows plus a per-scenario [`Meta`] table.
//! On top of it sit a filter engine (glob/regex matching, hierarchy depth),
//! range validation with exclusion flagging, aggregation-consistency checks,
//! scenario categorization, and a bidirectional converter to the
//! continuous-time representation ([`TimeFrame`]).

pub mod aggregate;
pub mod categorize;
pub mod convert;
pub mod data;
pub mod error;
pub mod filter;
pub mod timeseries;
pub mod validate;

pub use crate::aggregate::{AggregateMismatch, AggregateOptions, Tolerance};
pub use crate::convert::{TimeFrame, DIAGNOSTICS_PREFIX, MODEL_PLACEHOLDER, SCENARIO_SEP};
pub use crate::data::frame::IamFrame;
pub use crate::data::loader::load_file;
pub use crate::data::meta::{keys_from_table, Meta, MetaSeries, EXCLUDE_COL};
pub use crate::data::model::{
    hierarchy_depth, MetaValue, Observation, RawTable, ScenarioKey, TimeObservation,
};
pub use crate::error::{ConvertError, DataError, FilterError, MetaError};
pub use crate::filter::{DepthFilter, Filter, Patterns};
pub use crate::validate::Criteria;
