//! Python bindings (feature `python`).
//!
//! Thin wrappers over the parser, grid evaluator and layout optimizer for the
//! design front end. Inputs are plain tuples and numbers; results are
//! read-only classes.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::{DesignConfig, OptimizerSettings, PlannerConfig};
use crate::core::{GrowArea, LightSource, Point};
use crate::error::LightingError;
use crate::parsing::parse_ies;
use crate::services::{GridEvaluator, LayoutCandidate, LayoutOptimizer, LayoutRequest};

impl From<LightingError> for PyErr {
    fn from(err: LightingError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

/// Derived quantities of a parsed IES file.
#[pyclass(module = "ppfd_rust", get_all)]
#[derive(Debug, Clone)]
pub struct PhotometrySummary {
    pub id: String,
    pub vertical_count: usize,
    pub horizontal_count: usize,
    pub max_candela: f64,
    pub total_lumens: f64,
    pub efficacy: f64,
    pub beam_angle: f64,
    pub field_angle: f64,
}

/// Sampled field and its statistics.
#[pyclass(module = "ppfd_rust", get_all)]
#[derive(Debug, Clone)]
pub struct FieldResult {
    pub rows: usize,
    pub columns: usize,
    pub values: Vec<Vec<f64>>,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub uniformity: f64,
    pub coefficient_of_variation: f64,
}

/// One ranked layout proposal.
#[pyclass(module = "ppfd_rust", get_all)]
#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub origin: String,
    pub fixture_count: usize,
    pub rows: usize,
    pub columns: usize,
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub mounting_height: f64,
    pub mean_ppfd: f64,
    pub uniformity: f64,
    pub fit_score: f64,
    pub within_tolerance: bool,
    pub positions: Vec<(f64, f64)>,
}

impl From<&LayoutCandidate> for LayoutResult {
    fn from(candidate: &LayoutCandidate) -> Self {
        Self {
            origin: candidate.origin.label().to_string(),
            fixture_count: candidate.fixture_count,
            rows: candidate.rows,
            columns: candidate.columns,
            spacing_x: candidate.spacing_x,
            spacing_y: candidate.spacing_y,
            mounting_height: candidate.mounting_height,
            mean_ppfd: candidate.statistics.mean,
            uniformity: candidate.statistics.uniformity,
            fit_score: candidate.fit_score,
            within_tolerance: candidate.within_tolerance,
            positions: candidate
                .fixtures
                .iter()
                .map(|f| (f.position.x, f.position.y))
                .collect(),
        }
    }
}

/// Parse IES LM-63 text and summarize it.
#[pyfunction]
pub fn parse_ies_summary(text: &str) -> PyResult<PhotometrySummary> {
    let file = parse_ies(text)?;
    Ok(PhotometrySummary {
        id: file.id().to_hex(),
        vertical_count: file.vertical_angles().len(),
        horizontal_count: file.horizontal_angles().len(),
        max_candela: file.max_candela(),
        total_lumens: file.total_lumens(),
        efficacy: file.efficacy(),
        beam_angle: file.beam_angle(),
        field_angle: file.field_angle(),
    })
}

/// Evaluate point fixtures given as `(x, y, mounting_height, ppf)` tuples.
#[pyfunction]
#[pyo3(signature = (width, length, resolution, fixtures, beam_angle = 120.0))]
pub fn evaluate_field(
    width: f64,
    length: f64,
    resolution: f64,
    fixtures: Vec<(f64, f64, f64, f64)>,
    beam_angle: f64,
) -> PyResult<FieldResult> {
    let evaluator = GridEvaluator::new(GrowArea::new(width, length), resolution)?;
    let sources: Vec<LightSource> = fixtures
        .into_iter()
        .zip(1u32..)
        .map(|((x, y, height, ppf), id)| {
            LightSource::new(id, Point::new(x, y), height, ppf).with_beam_angle(beam_angle)
        })
        .collect();

    let field = evaluator.evaluate(&sources);
    let stats = field.statistics();
    Ok(FieldResult {
        rows: field.rows(),
        columns: field.columns(),
        values: field.to_rows(),
        min: stats.min,
        max: stats.max,
        mean: stats.mean,
        uniformity: stats.uniformity,
        coefficient_of_variation: stats.coefficient_of_variation,
    })
}

/// Rank layouts for a point fixture of `ppf` μmol/s.
///
/// `config_json` may carry a planner configuration; its design target is
/// overridden by `target_ppfd`.
#[pyfunction]
#[pyo3(signature = (width, length, target_ppfd, ppf, mounting_height, config_json = None))]
pub fn optimize_layout(
    width: f64,
    length: f64,
    target_ppfd: f64,
    ppf: f64,
    mounting_height: f64,
    config_json: Option<&str>,
) -> PyResult<Vec<LayoutResult>> {
    let (design, settings) = match config_json {
        Some(json) => {
            let config = PlannerConfig::from_json_str(json)?;
            (config.design, config.optimizer)
        }
        None => (DesignConfig::default(), OptimizerSettings::default()),
    };
    let design = DesignConfig {
        target_ppfd: Some(target_ppfd),
        mounting_height,
        ..design
    }
    .resolve()?;

    let template = LightSource::new(0, Point::default(), mounting_height, ppf);
    let request = LayoutRequest::from_design(&design, GrowArea::new(width, length), template);
    let candidates = LayoutOptimizer::new(settings)?.optimize(&request)?;
    Ok(candidates.iter().map(LayoutResult::from).collect())
}

/// Register functions and classes with the Python module.
pub fn register_functions(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(parse_ies_summary, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_field, m)?)?;
    m.add_function(wrap_pyfunction!(optimize_layout, m)?)?;
    m.add_class::<PhotometrySummary>()?;
    m.add_class::<FieldResult>()?;
    m.add_class::<LayoutResult>()?;
    Ok(())
}
