//! Compound weather-extreme probability engine.
//!
//! Takes a multi-year daily climate series and a named condition and
//! estimates how often that condition occurred on a calendar date.

pub mod conditions;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod probability;
pub mod series;
pub mod variable;

pub use conditions::{
    catalog, condition, event_sensitivity, Catalog, CombinationPolicy, ConditionDefinition,
    ConditionMetadata, EventTypeProfile, CONDITIONS, EVENT_TYPES,
};
pub use error::ExtremesError;
pub use evaluator::{composite_score, evaluate, YearObservation};
pub use filter::filter_by_date;
pub use probability::{calculate_probability, percentage, MatchVerdict, ProbabilityResult};
pub use series::{ClimateSeries, DailySeries, DATE_KEY_FORMAT};
pub use variable::ClimateVariable;
