//! Geospatial sweep: compare a condition's probability across a grid.
//!
//! Every grid point runs its own fetch and aggregation at month granularity.
//! A failing point is logged and counted, never fatal to the sweep.

use crate::error::{AnalysisError, PointEvaluationError};
use crate::query::{validate_coordinates, validate_month, Analyzer, Coordinates};
use climesense_extremes::{calculate_probability, condition, ClimateVariable};
use climesense_sources::{ClimateProvider, Geocoder};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub const DEFAULT_STEP: f64 = 0.5;
pub const DEFAULT_RANGE: f64 = 1.0;
const MAX_STEP: f64 = 5.0;
const MAX_RANGE: f64 = 10.0;
pub const MAX_GRID_POINTS: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepRequest {
    pub center_lat: f64,
    pub center_lon: f64,
    pub center_name: Option<String>,
    pub month: u32,
    pub condition: String,
    pub step: f64,
    pub range: f64,
}

impl SweepRequest {
    pub fn new(center_lat: f64, center_lon: f64, month: u32, condition: impl Into<String>) -> Self {
        Self {
            center_lat,
            center_lon,
            center_name: None,
            month,
            condition: condition.into(),
            step: DEFAULT_STEP,
            range: DEFAULT_RANGE,
        }
    }

    pub fn with_grid(mut self, step: f64, range: f64) -> Self {
        self.step = step;
        self.range = range;
        self
    }

    /// # Errors
    /// `UnknownCondition` for unregistered keys, `InvalidRequest` for bounds.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        condition(&self.condition)?;
        validate_month(self.month)?;
        validate_coordinates(self.center_lat, self.center_lon)?;
        if !(self.step > 0.0 && self.step <= MAX_STEP) {
            return Err(AnalysisError::invalid("Step must be between 0 and 5 degrees"));
        }
        if !(self.range > 0.0 && self.range <= MAX_RANGE) {
            return Err(AnalysisError::invalid("Range must be between 0 and 10 degrees"));
        }
        match grid_size(self.range, self.step) {
            Some(points) if points <= MAX_GRID_POINTS => Ok(()),
            _ => Err(AnalysisError::invalid(format!(
                "Grid exceeds {} points; use a larger step or smaller range",
                MAX_GRID_POINTS
            ))),
        }
    }
}

/// Offsets per axis (`steps` each way of the center), or `None` when the
/// count overflows.
fn grid_steps(range: f64, step: f64) -> Option<usize> {
    let steps = (range / step).floor();
    if !steps.is_finite() || steps < 0.0 || steps > (usize::MAX / 4) as f64 {
        return None;
    }
    Some(steps as usize)
}

/// Number of grid points before off-globe points are dropped.
fn grid_size(range: f64, step: f64) -> Option<usize> {
    let side = grid_steps(range, step)?.checked_mul(2)?.checked_add(1)?;
    side.checked_mul(side)
}

/// Square grid of `(lat, lon)` around the center, latitude-major.
///
/// Offsets are every integer multiple of `step` within `range`; points off
/// the globe are dropped. Grids larger than [`MAX_GRID_POINTS`] come back
/// empty.
pub fn generate_grid(center_lat: f64, center_lon: f64, range: f64, step: f64) -> Vec<(f64, f64)> {
    if !(step > 0.0) || !(range >= 0.0) {
        return Vec::new();
    }
    let (Some(steps), Some(size)) = (grid_steps(range, step), grid_size(range, step)) else {
        return Vec::new();
    };
    if size > MAX_GRID_POINTS {
        return Vec::new();
    }
    let steps = steps as i64;

    let mut points = Vec::with_capacity(size);
    for i in -steps..=steps {
        for j in -steps..=steps {
            let lat = center_lat + i as f64 * step;
            let lon = center_lon + j as f64 * step;
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
                points.push((lat, lon));
            }
        }
    }
    points
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round_ties_even() / 10_000.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointResult {
    pub lat: f64,
    pub lon: f64,
    pub location: String,
    pub probability: f64,
    pub weather_condition: String,
    pub variables: Vec<ClimateVariable>,
    pub years_total: usize,
    pub years_matching: usize,
    pub data_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub center_location: String,
    pub center_coordinates: Coordinates,
    pub condition: String,
    pub condition_description: String,
    pub month: u32,
    pub range: f64,
    pub step: f64,
    pub total_points_analyzed: usize,
    pub successful_analyses: usize,
    pub failed_analyses: usize,
    /// Highest probability first
    pub results: Vec<PointResult>,
}

impl<P, S, G> Analyzer<P, S, G>
where
    P: ClimateProvider + 'static,
    S: ClimateProvider + 'static,
    G: Geocoder + 'static,
{
    async fn evaluate_point(
        &self,
        latitude: f64,
        longitude: f64,
        month: u32,
        condition_key: &str,
    ) -> Result<PointResult, PointEvaluationError> {
        let failed = |source: AnalysisError| PointEvaluationError {
            latitude,
            longitude,
            source,
        };

        let sourced = self
            .fetcher
            .fetch_with_fallback(latitude, longitude, month, None, self.years_back)
            .await
            .map_err(|e| failed(e.into()))?;
        let result = calculate_probability(&sourced.series, month, None, condition_key, None)
            .map_err(|e| failed(e.into()))?;

        let label = if self.sweep.label_points {
            self.geocoder.reverse_geocode(latitude, longitude).await
        } else {
            None
        };

        Ok(PointResult {
            lat: round4(latitude),
            lon: round4(longitude),
            location: label.unwrap_or_else(|| format!("({:.2}, {:.2})", latitude, longitude)),
            probability: result.probability,
            weather_condition: condition_key.to_string(),
            variables: result.condition.variables,
            years_total: result.years_total,
            years_matching: result.years_matching,
            data_source: sourced.source.to_uppercase(),
        })
    }

    /// Run the sweep described by `request` on a bounded worker pool.
    ///
    /// Results come back sorted by probability descending; ties keep grid order.
    ///
    /// # Errors
    /// Only request validation fails the sweep. Per-point failures are
    /// reported through `failed_analyses`.
    pub async fn sweep(self: Arc<Self>, request: SweepRequest) -> Result<SweepReport, AnalysisError> {
        request.validate()?;
        let cfg = condition(&request.condition)?;

        let grid = generate_grid(request.center_lat, request.center_lon, request.range, request.step);
        info!(
            condition = cfg.key,
            month = request.month,
            points = grid.len(),
            "Starting geospatial sweep"
        );

        let permits = Arc::new(Semaphore::new(self.sweep.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (index, (lat, lon)) in grid.iter().copied().enumerate() {
            let analyzer = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            let month = request.month;
            let condition_key = request.condition.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let outcome = analyzer.evaluate_point(lat, lon, month, &condition_key).await;
                (index, outcome)
            });
        }

        let mut succeeded = Vec::with_capacity(grid.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(point))) => succeeded.push((index, point)),
                Ok((_, Err(e))) => warn!("{}", e),
                Err(e) => warn!("Sweep point task aborted: {}", e),
            }
        }

        // Completion order is arbitrary; restore grid order before the stable sort.
        succeeded.sort_by_key(|(index, _)| *index);
        let mut results: Vec<PointResult> = succeeded.into_iter().map(|(_, point)| point).collect();
        results.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        let failed = grid.len() - results.len();
        info!(
            successful = results.len(),
            failed, "Geospatial sweep finished"
        );

        Ok(SweepReport {
            center_location: request.center_name.clone().unwrap_or_else(|| {
                format!("({:.2}, {:.2})", request.center_lat, request.center_lon)
            }),
            center_coordinates: Coordinates {
                lat: request.center_lat,
                lon: request.center_lon,
            },
            condition: cfg.key.to_string(),
            condition_description: cfg.description.to_string(),
            month: request.month,
            range: request.range,
            step: request.step,
            total_points_analyzed: grid.len(),
            successful_analyses: results.len(),
            failed_analyses: failed,
            results,
        })
    }

    /// Geocode `place` and sweep around it.
    pub async fn sweep_place(
        self: Arc<Self>,
        place: &str,
        month: u32,
        condition_key: &str,
        step: f64,
        range: f64,
    ) -> Result<SweepReport, AnalysisError> {
        condition(condition_key)?;
        let center = self.locate(place).await?;

        let request = SweepRequest {
            center_name: Some(center.display_name.unwrap_or_else(|| place.to_string())),
            ..SweepRequest::new(center.lat, center.lon, month, condition_key).with_grid(step, range)
        };
        self.sweep(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_is_lat_major() {
        let grid = generate_grid(10.0, 20.0, 1.0, 1.0);
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0], (9.0, 19.0));
        assert_eq!(grid[1], (9.0, 20.0));
        assert_eq!(grid[4], (10.0, 20.0));
        assert_eq!(grid[8], (11.0, 21.0));
    }

    #[test]
    fn test_grid_floors_step_count() {
        // 1.0 / 0.4 = 2.5 -> two steps each way
        assert_eq!(generate_grid(0.0, 0.0, 1.0, 0.4).len(), 25);
        assert_eq!(generate_grid(0.0, 0.0, 0.5, 1.0), vec![(0.0, 0.0)]);
    }

    #[test]
    fn test_grid_drops_points_off_the_globe() {
        let grid = generate_grid(90.0, 180.0, 1.0, 1.0);
        assert_eq!(grid, vec![(89.0, 179.0), (89.0, 180.0), (90.0, 179.0), (90.0, 180.0)]);
    }

    #[test]
    fn test_request_validation() {
        assert!(SweepRequest::new(5.6, -0.2, 6, "very_hot").validate().is_ok());
        assert!(matches!(
            SweepRequest::new(5.6, -0.2, 6, "very_dry").validate(),
            Err(AnalysisError::UnknownCondition(_))
        ));
        assert!(SweepRequest::new(5.6, -0.2, 13, "very_hot").validate().is_err());
        for (step, range) in [(0.0, 1.0), (5.1, 1.0), (0.5, 0.0), (0.5, 10.5)] {
            assert!(
                matches!(
                    SweepRequest::new(5.6, -0.2, 6, "very_hot").with_grid(step, range).validate(),
                    Err(AnalysisError::InvalidRequest(_))
                ),
                "step {} range {}",
                step,
                range
            );
        }
        assert!(SweepRequest::new(5.6, -0.2, 6, "very_hot")
            .with_grid(5.0, 10.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_tiny_step_is_rejected_not_allocated() {
        for step in [1e-9, 1e-4, 0.05] {
            let err = SweepRequest::new(0.0, 0.0, 6, "very_wet")
                .with_grid(step, 10.0)
                .validate()
                .unwrap_err();
            assert!(err.to_string().contains("Grid exceeds 10000 points"), "step {}", step);
            assert!(generate_grid(0.0, 0.0, 10.0, step).is_empty());
        }
        // 40 steps each way is 81 x 81
        assert!(SweepRequest::new(0.0, 0.0, 6, "very_wet")
            .with_grid(0.25, 10.0)
            .validate()
            .is_ok());
        assert_eq!(grid_size(10.0, 0.125), Some(161 * 161));
        assert_eq!(grid_size(10.0, 1e-300), None);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(5.556_049), 5.556);
        assert_eq!(round4(-0.196_96), -0.197);
    }
}
