//! Grid sampling of a fixture set and field statistics.
//!
//! The evaluator tiles the growing area into equal cells no larger than the
//! requested resolution and sums every enabled fixture's contribution at each
//! cell centre. Fixtures are visited in slice order for every cell, so
//! identical inputs produce bit-identical value arrays whether or not a cache
//! is used.

use serde::Serialize;

use crate::algorithms::illuminance;
use crate::cache::ContributionCache;
use crate::core::{GrowArea, LightSource, Point};
use crate::error::{LightingError, LightingResult};

/// Sampling geometry: an area tiled into `rows × columns` cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSpec {
    area: GrowArea,
    resolution: f64,
    columns: usize,
    rows: usize,
}

impl GridSpec {
    /// Tiles `area` with cells at most `resolution` on a side.
    ///
    /// Errors with `ConfigurationError` for a non-positive area or resolution.
    pub fn new(area: GrowArea, resolution: f64) -> LightingResult<Self> {
        area.validate()?;
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(LightingError::configuration(format!(
                "grid resolution must be positive, got {}",
                resolution
            )));
        }
        let columns = ((area.width / resolution).ceil() as usize).max(1);
        let rows = ((area.length / resolution).ceil() as usize).max(1);
        Ok(Self {
            area,
            resolution,
            columns,
            rows,
        })
    }

    pub fn area(&self) -> GrowArea {
        self.area
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.columns
    }

    pub fn cell_width(&self) -> f64 {
        self.area.width / self.columns as f64
    }

    pub fn cell_length(&self) -> f64 {
        self.area.length / self.rows as f64
    }

    pub fn cell_center(&self, row: usize, column: usize) -> Point {
        Point::new(
            (column as f64 + 0.5) * self.cell_width(),
            (row as f64 + 0.5) * self.cell_length(),
        )
    }

    /// Cell centres in row-major order.
    pub fn cell_centers(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.columns).map(move |column| self.cell_center(row, column))
        })
    }
}

/// Largest `f64` below 1.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Summary of a field, recomputed from scratch on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FieldStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// min / mean, in [0, 1] for non-negative fields.
    pub uniformity: f64,
    /// Sample standard deviation / mean.
    pub coefficient_of_variation: f64,
    pub cell_count: usize,
}

impl FieldStatistics {
    /// Single pass over `values` (Welford), sample variance with N−1.
    ///
    /// A constant field has uniformity 1 and CV 0. A field with a
    /// non-positive mean reports uniformity 1 and CV 0. Any other field stays
    /// strictly below 1 even when the mean rounds down to `min`.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut mean = 0.0;
        let mut m2 = 0.0;
        for (i, &value) in values.iter().enumerate() {
            min = min.min(value);
            max = max.max(value);
            let delta = value - mean;
            mean += delta / (i + 1) as f64;
            m2 += delta * (value - mean);
        }

        let n = values.len();
        let variance = if n > 1 { (m2 / (n - 1) as f64).max(0.0) } else { 0.0 };

        let (uniformity, coefficient_of_variation) = if min == max || mean <= 0.0 {
            (1.0, 0.0)
        } else {
            ((min / mean).clamp(0.0, BELOW_ONE), variance.sqrt() / mean)
        };

        Self {
            min,
            max,
            mean,
            uniformity,
            coefficient_of_variation,
            cell_count: n,
        }
    }
}

/// Sampled PPFD over a grid, row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridField {
    spec: GridSpec,
    values: Vec<f64>,
    statistics: FieldStatistics,
}

impl GridField {
    fn new(spec: GridSpec, values: Vec<f64>) -> Self {
        let statistics = FieldStatistics::from_values(&values);
        Self {
            spec,
            values,
            statistics,
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn rows(&self) -> usize {
        self.spec.rows
    }

    pub fn columns(&self) -> usize {
        self.spec.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn statistics(&self) -> &FieldStatistics {
        &self.statistics
    }

    pub fn cell_center(&self, row: usize, column: usize) -> Point {
        self.spec.cell_center(row, column)
    }

    pub fn value_at(&self, row: usize, column: usize) -> Option<f64> {
        if row >= self.spec.rows || column >= self.spec.columns {
            return None;
        }
        self.values.get(row * self.spec.columns + column).copied()
    }

    /// Percentage of cells at or above `threshold`.
    pub fn coverage_above(&self, threshold: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let covered = self.values.iter().filter(|&&v| v >= threshold).count();
        covered as f64 / self.values.len() as f64 * 100.0
    }

    /// Rows of values, for heatmap rendering.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values
            .chunks(self.spec.columns)
            .map(<[f64]>::to_vec)
            .collect()
    }
}

/// Sums fixture contributions over a [`GridSpec`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridEvaluator {
    spec: GridSpec,
}

impl GridEvaluator {
    pub fn new(area: GrowArea, resolution: f64) -> LightingResult<Self> {
        Ok(Self {
            spec: GridSpec::new(area, resolution)?,
        })
    }

    pub fn from_spec(spec: GridSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Evaluates every enabled source directly.
    ///
    /// With no enabled sources the field is dark rather than an error.
    pub fn evaluate(&self, sources: &[LightSource]) -> GridField {
        let enabled: Vec<&LightSource> = sources.iter().filter(|s| s.enabled).collect();
        let values: Vec<f64> = self
            .spec
            .cell_centers()
            .map(|point| {
                enabled
                    .iter()
                    .map(|source| illuminance::contribution(source, point))
                    .sum()
            })
            .collect();

        log::debug!(
            "evaluated {} cells x {} fixtures ({} disabled)",
            values.len(),
            enabled.len(),
            sources.len() - enabled.len()
        );
        GridField::new(self.spec, values)
    }

    /// Evaluates through `cache`, storing every computed contribution.
    pub fn evaluate_cached<C>(&self, sources: &[LightSource], cache: &mut C) -> GridField
    where
        C: ContributionCache + ?Sized,
    {
        let before = cache.stats();
        let values: Vec<f64> = self
            .spec
            .cell_centers()
            .map(|point| {
                sources
                    .iter()
                    .filter(|s| s.enabled)
                    .map(|source| cache.get_or_compute(source, point))
                    .sum()
            })
            .collect();

        let after = cache.stats();
        log::debug!(
            "evaluated {} cells x {} fixtures, cache hits {} misses {}",
            values.len(),
            sources.iter().filter(|s| s.enabled).count(),
            after.hits.saturating_sub(before.hits),
            after.misses.saturating_sub(before.misses)
        );
        GridField::new(self.spec, values)
    }
}
