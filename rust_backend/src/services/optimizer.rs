//! Ranked layout search.
//!
//! The spacing solver sizes a layout from the photon budget alone, which
//! ignores spill past the area edges and the shape of the beam. The optimizer
//! closes that gap by evaluating every candidate through the grid evaluator:
//!
//! 1. the spacing plan at the requested mounting height
//! 2. count-corrected plans, rescaling the count by `target / mean` until the
//!    mean is within tolerance or no unseen grid size remains
//! 3. the plan nearest the target whose height range brackets it, with its
//!    mounting height bisected inside that bracket
//!
//! Candidates within the PPFD tolerance rank first, then by [`fit_score`].

use serde::Serialize;

use crate::algorithms::layout::{arrange_grid, place_fixtures, solve_spacing, SpacingPlan};
use crate::config::{OptimizerSettings, ResolvedDesign};
use crate::core::{GrowArea, LightSource};
use crate::error::{LightingError, LightingResult};
use crate::services::grid_field::{FieldStatistics, GridEvaluator};

/// Weight of PPFD accuracy in the fit score.
pub const PPFD_WEIGHT: f64 = 0.6;

/// Weight of uniformity (relative to its target) in the fit score.
pub const UNIFORMITY_WEIGHT: f64 = 0.4;

/// Intervals the height range is split into when looking for a bracket.
pub const HEIGHT_SCAN_STEPS: usize = 24;

/// What to light and with which fixture.
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    pub area: GrowArea,
    pub target_ppfd: f64,
    pub uniformity_target: f64,
    pub mounting_height: f64,
    /// Copied onto every grid position; its position and id are ignored.
    pub fixture: LightSource,
}

impl LayoutRequest {
    pub fn new(
        area: GrowArea,
        target_ppfd: f64,
        mounting_height: f64,
        fixture: LightSource,
    ) -> Self {
        Self {
            area,
            target_ppfd,
            uniformity_target: 0.7,
            mounting_height,
            fixture,
        }
    }

    /// Builds a request from a resolved design record.
    ///
    /// The record's mounting height is taken in the area's length unit.
    pub fn from_design(design: &ResolvedDesign, area: GrowArea, fixture: LightSource) -> Self {
        Self {
            area,
            target_ppfd: design.target_ppfd,
            uniformity_target: design.uniformity_target,
            mounting_height: design.mounting_height,
            fixture,
        }
    }

    pub fn with_uniformity_target(mut self, uniformity_target: f64) -> Self {
        self.uniformity_target = uniformity_target;
        self
    }
}

/// How a candidate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CandidateOrigin {
    SpacingPlan,
    CountCorrected { round: usize },
    HeightCalibrated,
}

impl CandidateOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            CandidateOrigin::SpacingPlan => "spacing_plan",
            CandidateOrigin::CountCorrected { .. } => "count_corrected",
            CandidateOrigin::HeightCalibrated => "height_calibrated",
        }
    }
}

/// An evaluated layout proposal.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutCandidate {
    pub origin: CandidateOrigin,
    pub fixture_count: usize,
    pub rows: usize,
    pub columns: usize,
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub mounting_height: f64,
    pub statistics: FieldStatistics,
    pub fit_score: f64,
    pub within_tolerance: bool,
    pub fixtures: Vec<LightSource>,
}

impl LayoutCandidate {
    /// Signed relative deviation of the mean from `target_ppfd`.
    pub fn ppfd_error(&self, target_ppfd: f64) -> f64 {
        (self.statistics.mean - target_ppfd) / target_ppfd
    }
}

/// Combined PPFD-accuracy and uniformity score in [0, 1].
pub fn fit_score(statistics: &FieldStatistics, target_ppfd: f64, uniformity_target: f64) -> f64 {
    let accuracy = (1.0 - (statistics.mean - target_ppfd).abs() / target_ppfd).max(0.0);
    let uniformity = if uniformity_target > 0.0 {
        (statistics.uniformity / uniformity_target).min(1.0)
    } else {
        1.0
    };
    PPFD_WEIGHT * accuracy + UNIFORMITY_WEIGHT * uniformity
}

/// Searches fixture count and mounting height for a target PPFD.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutOptimizer {
    settings: OptimizerSettings,
}

impl LayoutOptimizer {
    pub fn new(settings: OptimizerSettings) -> LightingResult<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Returns every evaluated candidate, best first.
    ///
    /// # Errors
    /// `ConfigurationError` for a non-positive target, area, mounting height
    /// or fixture output, or a disabled template fixture.
    pub fn optimize(&self, request: &LayoutRequest) -> LightingResult<Vec<LayoutCandidate>> {
        if !request.fixture.enabled {
            return Err(LightingError::configuration(
                "layout has zero enabled fixtures: template fixture is disabled",
            ));
        }
        if !(request.mounting_height.is_finite() && request.mounting_height > 0.0) {
            return Err(LightingError::configuration(format!(
                "mounting height must be positive, got {}",
                request.mounting_height
            )));
        }
        let effective_ppf = request.fixture.ppf * request.fixture.dimming;
        let evaluator = GridEvaluator::new(request.area, self.settings.grid_resolution)?;

        let base = solve_spacing(request.target_ppfd, &request.area, effective_ppf)?;
        let mut candidates = vec![self.evaluate(
            &evaluator,
            request,
            &base,
            request.mounting_height,
            CandidateOrigin::SpacingPlan,
        )];

        self.refine_count(&evaluator, request, &mut candidates);

        let calibrated = by_distance_to_target(&candidates, request.target_ppfd)
            .into_iter()
            .find_map(|plan| self.calibrate_height(&evaluator, request, &plan));
        candidates.extend(calibrated);

        candidates.sort_by(|a, b| {
            b.within_tolerance
                .cmp(&a.within_tolerance)
                .then_with(|| b.fit_score.total_cmp(&a.fit_score))
        });

        if let Some(best) = candidates.first() {
            log::info!(
                "layout for {} PPFD over {} x {}: {} fixtures ({} x {}) at height {:.3}, \
                 mean {:.1}, uniformity {:.3}, {} of {} candidates within tolerance",
                request.target_ppfd,
                request.area.width,
                request.area.length,
                best.fixture_count,
                best.columns,
                best.rows,
                best.mounting_height,
                best.statistics.mean,
                best.statistics.uniformity,
                candidates.iter().filter(|c| c.within_tolerance).count(),
                candidates.len()
            );
        }
        Ok(candidates)
    }

    fn refine_count(
        &self,
        evaluator: &GridEvaluator,
        request: &LayoutRequest,
        candidates: &mut Vec<LayoutCandidate>,
    ) {
        let mut seen: Vec<usize> = candidates.iter().map(|c| c.fixture_count).collect();

        for round in 1..=self.settings.refinement_rounds {
            let Some(last) = candidates.last() else {
                return;
            };
            if last.within_tolerance || last.statistics.mean <= 0.0 {
                return;
            }
            let fewer = last.statistics.mean > request.target_ppfd;
            let scaled = last.fixture_count as f64 * request.target_ppfd / last.statistics.mean;
            let count = (scaled.round() as usize).max(1);
            let Some(plan) = next_unseen_grid(count, fewer, &seen, &request.area) else {
                return;
            };
            seen.push(plan.fixture_count());

            let candidate = self.evaluate(
                evaluator,
                request,
                &plan,
                request.mounting_height,
                CandidateOrigin::CountCorrected { round },
            );
            log::debug!(
                "count correction {}: {} fixtures, mean {:.1}",
                round,
                candidate.fixture_count,
                candidate.statistics.mean
            );
            candidates.push(candidate);
        }
    }

    /// Bisects the mounting height of `plan` so the mean meets the target.
    ///
    /// The mean is not monotonic in height: very low fixtures put their
    /// peaks between sample points. The height range is scanned first and
    /// only a pair of samples on either side of the target is bisected. The
    /// bracket nearest the requested height wins. Returns `None` when no
    /// scanned pair brackets the target.
    fn calibrate_height(
        &self,
        evaluator: &GridEvaluator,
        request: &LayoutRequest,
        plan: &SpacingPlan,
    ) -> Option<LayoutCandidate> {
        let target = request.target_ppfd;
        let accept = self.settings.ppfd_tolerance / 4.0;
        let origin = CandidateOrigin::HeightCalibrated;
        let offset = |candidate: &LayoutCandidate| candidate.statistics.mean - target;

        let min = self.settings.min_mounting_height;
        let step = (self.settings.max_mounting_height - min) / HEIGHT_SCAN_STEPS as f64;
        let samples: Vec<LayoutCandidate> = (0..=HEIGHT_SCAN_STEPS)
            .map(|i| self.evaluate(evaluator, request, plan, min + i as f64 * step, origin))
            .collect();

        let Some(pair) = samples
            .windows(2)
            .filter(|pair| offset(&pair[0]) * offset(&pair[1]) <= 0.0)
            .min_by(|a, b| {
                let mid_a = 0.5 * (a[0].mounting_height + a[1].mounting_height);
                let mid_b = 0.5 * (b[0].mounting_height + b[1].mounting_height);
                (mid_a - request.mounting_height)
                    .abs()
                    .total_cmp(&(mid_b - request.mounting_height).abs())
            })
        else {
            log::debug!("height calibration: no bracket for {} PPFD", target);
            return None;
        };

        let (mut low, mut high) = (pair[0].clone(), pair[1].clone());
        let mut best = if offset(&low).abs() <= offset(&high).abs() {
            low.clone()
        } else {
            high.clone()
        };
        for _ in 0..self.settings.height_iterations {
            if (offset(&best) / target).abs() <= accept {
                break;
            }
            let height = 0.5 * (low.mounting_height + high.mounting_height);
            let candidate = self.evaluate(evaluator, request, plan, height, origin);
            if offset(&candidate).abs() < offset(&best).abs() {
                best = candidate.clone();
            }
            if offset(&candidate) * offset(&low) > 0.0 {
                low = candidate;
            } else {
                high = candidate;
            }
        }
        log::debug!(
            "height calibration: {:.3} gives mean {:.1}",
            best.mounting_height,
            best.statistics.mean
        );
        Some(best)
    }

    fn evaluate(
        &self,
        evaluator: &GridEvaluator,
        request: &LayoutRequest,
        plan: &SpacingPlan,
        mounting_height: f64,
        origin: CandidateOrigin,
    ) -> LayoutCandidate {
        let fixtures = place_fixtures(plan, &request.fixture, mounting_height);
        let field = evaluator.evaluate(&fixtures);
        let statistics = *field.statistics();
        let deviation = ((statistics.mean - request.target_ppfd) / request.target_ppfd).abs();

        LayoutCandidate {
            origin,
            fixture_count: fixtures.len(),
            rows: plan.rows,
            columns: plan.columns,
            spacing_x: plan.spacing_x,
            spacing_y: plan.spacing_y,
            mounting_height,
            fit_score: fit_score(&statistics, request.target_ppfd, request.uniformity_target),
            within_tolerance: deviation <= self.settings.ppfd_tolerance,
            statistics,
            fixtures,
        }
    }
}

/// First grid from `count` whose size is not in `seen`, stepping the count
/// towards fewer or more fixtures.
fn next_unseen_grid(
    count: usize,
    fewer: bool,
    seen: &[usize],
    area: &GrowArea,
) -> Option<SpacingPlan> {
    let mut count = count;
    let mut plan = arrange_grid(count, area);
    while seen.contains(&plan.fixture_count()) {
        if fewer {
            if count <= 1 {
                return None;
            }
            count -= 1;
        } else {
            count = plan.fixture_count() + 1;
        }
        plan = arrange_grid(count, area);
    }
    Some(plan)
}

/// Plans of `candidates`, nearest mean first.
fn by_distance_to_target(candidates: &[LayoutCandidate], target_ppfd: f64) -> Vec<SpacingPlan> {
    let mut ordered: Vec<&LayoutCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| {
        (a.statistics.mean - target_ppfd)
            .abs()
            .total_cmp(&(b.statistics.mean - target_ppfd).abs())
    });
    ordered.into_iter().map(plan_of).collect()
}

fn plan_of(candidate: &LayoutCandidate) -> SpacingPlan {
    SpacingPlan {
        required_count: candidate.fixture_count,
        rows: candidate.rows,
        columns: candidate.columns,
        spacing_x: candidate.spacing_x,
        spacing_y: candidate.spacing_y,
        score: 0.0,
    }
}
