//! Location, event and grid analyses built on the extremes engine.

pub mod error;
pub mod event;
pub mod query;
pub mod summary;
pub mod sweep;

pub use error::{AnalysisError, PointEvaluationError};
pub use event::{EventAnalysis, EventSpec, WeatherContext};
pub use query::{
    parse_month, target_date_label, AnalysisMetadata, Analyzer, Coordinates, DefaultAnalyzer,
    LocationInfo, PointAnalysis, SweepSettings, MONTH_NAMES,
};
pub use summary::{AnalysisSummary, ConfidenceLevel, EventRisk, RiskLevel};
pub use sweep::{generate_grid, PointResult, SweepReport, SweepRequest, MAX_GRID_POINTS};
