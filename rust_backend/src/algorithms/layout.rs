//! Fixture-count and grid-spacing solvers.
//!
//! Two independent sizing strategies:
//!
//! - [`solve_spacing`] derives the fixture count from the photon budget
//!   (`target × area / PPF`) and picks the rows × columns grid whose cells are
//!   closest to square while wasting the fewest positions.
//! - [`solve_coverage`] starts from the footprint of each fixture's beam and
//!   applies a fixed sequence of corrections: PPFD scaling, density floor,
//!   safety buffer.
//!
//! Neither solver evaluates a field. [`crate::services::LayoutOptimizer`]
//! re-evaluates their output through the grid evaluator.

use serde::Serialize;

use crate::core::{GrowArea, LightSource, Point};
use crate::error::{LightingError, LightingResult};
use crate::models::cone_radius;

/// Weight of cell squareness in the grid score.
pub const ASPECT_WEIGHT: f64 = 0.7;

/// Weight of grid fill (`count / positions`) in the grid score.
pub const FILL_WEIGHT: f64 = 0.3;

/// Smallest footprint credited to one fixture, in area units.
pub const MIN_COVERAGE_AREA: f64 = 4.0;

/// Largest upward correction applied when footprints alone fall short of target.
pub const MAX_OVERLAP_FACTOR: f64 = 2.5;

/// Area served by one fixture at the minimum professional density.
pub const MAX_AREA_PER_FIXTURE: f64 = 16.0;

/// Final headroom on the coverage-driven count.
pub const COVERAGE_BUFFER: f64 = 1.05;

/// A rows × columns arrangement over a growing area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpacingPlan {
    /// Fixtures the photon budget asked for.
    pub required_count: usize,
    pub rows: usize,
    pub columns: usize,
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub score: f64,
}

impl SpacingPlan {
    /// Number of grid positions, which may exceed `required_count`.
    pub fn fixture_count(&self) -> usize {
        self.rows * self.columns
    }

    /// Cell-centred positions, row-major from the area origin.
    pub fn positions(&self) -> Vec<Point> {
        let mut positions = Vec::with_capacity(self.fixture_count());
        for row in 0..self.rows {
            let y = (row as f64 + 0.5) * self.spacing_y;
            for column in 0..self.columns {
                positions.push(Point::new((column as f64 + 0.5) * self.spacing_x, y));
            }
        }
        positions
    }
}

/// Output of the coverage-driven solver, with each intermediate count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageSizing {
    pub coverage_radius: f64,
    pub coverage_area: f64,
    pub min_fixtures: usize,
    pub after_ppfd_scaling: usize,
    pub after_density_floor: usize,
    pub recommended: usize,
}

/// Fixtures needed to deliver `target_ppfd` over `area` if every photon landed.
pub fn required_fixture_count(
    target_ppfd: f64,
    area: &GrowArea,
    ppf: f64,
) -> LightingResult<usize> {
    validate_target(target_ppfd)?;
    area.validate()?;
    validate_ppf(ppf)?;
    let count = (target_ppfd * area.area() / ppf).ceil();
    Ok((count as usize).max(1))
}

/// Sizes and arranges fixtures so the photon budget meets `target_ppfd`.
pub fn solve_spacing(target_ppfd: f64, area: &GrowArea, ppf: f64) -> LightingResult<SpacingPlan> {
    let required = required_fixture_count(target_ppfd, area, ppf)?;
    Ok(arrange_grid(required, area))
}

/// Best-scoring rows × columns grid holding at least `count` positions.
///
/// Columns run along the width. Falls back to a single row if no candidate
/// produces a finite score.
pub fn arrange_grid(count: usize, area: &GrowArea) -> SpacingPlan {
    let count = count.max(1);
    let mut best: Option<SpacingPlan> = None;

    for columns in 1..=count {
        let rows = count.div_ceil(columns);
        let spacing_x = area.width / columns as f64;
        let spacing_y = area.length / rows as f64;
        let closeness = spacing_x.min(spacing_y) / spacing_x.max(spacing_y);
        let fill = count as f64 / (rows * columns) as f64;
        let score = ASPECT_WEIGHT * closeness + FILL_WEIGHT * fill;
        if !score.is_finite() {
            continue;
        }
        if best.map_or(true, |plan| score > plan.score) {
            best = Some(SpacingPlan {
                required_count: count,
                rows,
                columns,
                spacing_x,
                spacing_y,
                score,
            });
        }
    }

    best.unwrap_or_else(|| {
        log::warn!("no scored grid for {} fixtures, using a single row", count);
        SpacingPlan {
            required_count: count,
            rows: 1,
            columns: count,
            spacing_x: area.width / count as f64,
            spacing_y: area.length,
            score: 0.0,
        }
    })
}

/// Clones `template` onto every position of `plan` at `mounting_height`.
///
/// Ids are assigned sequentially from 1 in row-major order.
pub fn place_fixtures(
    plan: &SpacingPlan,
    template: &LightSource,
    mounting_height: f64,
) -> Vec<LightSource> {
    plan.positions()
        .into_iter()
        .zip(1u32..)
        .map(|(position, id)| {
            let mut source = template.clone();
            source.id = id.into();
            source.position = position;
            source.mounting_height = mounting_height;
            source
        })
        .collect()
}

/// Sizes a layout from each fixture's beam footprint.
///
/// Steps, always in this order:
/// 1. footprint = π × (height × tan(beam/2))², floored at [`MIN_COVERAGE_AREA`]
/// 2. `min_fixtures = ceil(area / footprint)`
/// 3. if `min_fixtures × ppf / area` is below target, scale by
///    `target / achieved`, capped at [`MAX_OVERLAP_FACTOR`]
/// 4. at least one fixture per [`MAX_AREA_PER_FIXTURE`]
/// 5. multiply by [`COVERAGE_BUFFER`]
pub fn solve_coverage(
    target_ppfd: f64,
    area: &GrowArea,
    ppf: f64,
    beam_angle: f64,
    mounting_height: f64,
) -> LightingResult<CoverageSizing> {
    validate_target(target_ppfd)?;
    area.validate()?;
    validate_ppf(ppf)?;
    if !(mounting_height.is_finite() && mounting_height > 0.0) {
        return Err(LightingError::configuration(format!(
            "mounting height must be positive, got {}",
            mounting_height
        )));
    }

    let coverage_radius = cone_radius(mounting_height, beam_angle);
    let coverage_area =
        (std::f64::consts::PI * coverage_radius * coverage_radius).max(MIN_COVERAGE_AREA);
    let min_fixtures = ((area.area() / coverage_area).ceil() as usize).max(1);

    let achieved = min_fixtures as f64 * ppf / area.area();
    let after_ppfd_scaling = if achieved < target_ppfd {
        let factor = (target_ppfd / achieved).min(MAX_OVERLAP_FACTOR);
        (min_fixtures as f64 * factor).ceil() as usize
    } else {
        min_fixtures
    };

    let density_floor = (area.area() / MAX_AREA_PER_FIXTURE).ceil() as usize;
    let after_density_floor = after_ppfd_scaling.max(density_floor);
    let recommended = (after_density_floor as f64 * COVERAGE_BUFFER).ceil() as usize;

    Ok(CoverageSizing {
        coverage_radius,
        coverage_area,
        min_fixtures,
        after_ppfd_scaling,
        after_density_floor,
        recommended,
    })
}

fn validate_target(target_ppfd: f64) -> LightingResult<()> {
    if target_ppfd.is_finite() && target_ppfd > 0.0 {
        Ok(())
    } else {
        Err(LightingError::configuration(format!(
            "target PPFD must be positive, got {}",
            target_ppfd
        )))
    }
}

fn validate_ppf(ppf: f64) -> LightingResult<()> {
    if ppf.is_finite() && ppf > 0.0 {
        Ok(())
    } else {
        Err(LightingError::configuration(format!(
            "fixture PPF must be positive, got {}",
            ppf
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixtureId;

    #[test]
    fn test_required_count_rounds_up() {
        let area = GrowArea::new(10.0, 20.0);
        // 400 × 200 / 1700 = 47.06
        assert_eq!(required_fixture_count(400.0, &area, 1700.0).unwrap(), 48);
        assert_eq!(required_fixture_count(1.0, &area, 1e9).unwrap(), 1);
    }

    #[test]
    fn test_spacing_prefers_square_cells() {
        let plan = solve_spacing(200.0, &GrowArea::new(10.0, 20.0), 2500.0).unwrap();
        // 16 fixtures over 10 × 20: 4 × 4 and 2 × 8 leave 2:1 cells,
        // 3 columns × 6 rows gives square cells with two spare positions.
        assert_eq!(plan.required_count, 16);
        assert_eq!((plan.columns, plan.rows), (3, 6));
        assert!((plan.spacing_x - plan.spacing_y).abs() < 1e-12);
        assert!(plan.fixture_count() >= plan.required_count);
    }

    #[test]
    fn test_exact_grid_scores_full_fill() {
        let plan = arrange_grid(16, &GrowArea::new(40.0, 40.0));
        assert_eq!((plan.columns, plan.rows), (4, 4));
        assert!((plan.score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_positions_are_cell_centred() {
        let plan = arrange_grid(4, &GrowArea::new(4.0, 4.0));
        let positions = plan.positions();
        assert_eq!(
            positions,
            vec![
                Point::new(1.0, 1.0),
                Point::new(3.0, 1.0),
                Point::new(1.0, 3.0),
                Point::new(3.0, 3.0),
            ]
        );
    }

    #[test]
    fn test_place_fixtures_assigns_ids_and_height() {
        let plan = arrange_grid(6, &GrowArea::new(6.0, 4.0));
        let template = LightSource::new(0, Point::default(), 1.0, 900.0).with_dimming(0.8);
        let fixtures = place_fixtures(&plan, &template, 2.5);
        assert_eq!(fixtures.len(), plan.fixture_count());
        assert_eq!(fixtures[0].id, FixtureId(1));
        assert!(fixtures.iter().all(|f| f.mounting_height == 2.5 && f.dimming == 0.8));
    }

    #[test]
    fn test_invalid_inputs_are_configuration_errors() {
        let area = GrowArea::new(10.0, 10.0);
        assert!(matches!(
            solve_spacing(0.0, &area, 1000.0),
            Err(LightingError::ConfigurationError(_))
        ));
        assert!(matches!(
            solve_spacing(400.0, &GrowArea::new(-1.0, 10.0), 1000.0),
            Err(LightingError::ConfigurationError(_))
        ));
        assert!(matches!(
            solve_spacing(400.0, &area, 0.0),
            Err(LightingError::ConfigurationError(_))
        ));
        assert!(solve_coverage(400.0, &area, 1000.0, 120.0, 0.0).is_err());
    }

    #[test]
    fn test_coverage_steps_in_order() {
        // radius = 2 × tan 45° = 2, footprint = 4π ≈ 12.57
        let sizing = solve_coverage(800.0, &GrowArea::new(20.0, 20.0), 600.0, 90.0, 2.0).unwrap();
        assert!((sizing.coverage_radius - 2.0).abs() < 1e-12);
        assert_eq!(sizing.min_fixtures, 32);
        // 32 × 600 / 400 = 48 PPFD, scale capped at 2.5 → 80
        assert_eq!(sizing.after_ppfd_scaling, 80);
        assert_eq!(sizing.after_density_floor, 80);
        assert_eq!(sizing.recommended, 84);
    }

    #[test]
    fn test_coverage_floors() {
        // Tiny cone: footprint floored at 4 area units.
        let sizing = solve_coverage(100.0, &GrowArea::new(8.0, 8.0), 5000.0, 10.0, 1.0).unwrap();
        assert_eq!(sizing.coverage_area, MIN_COVERAGE_AREA);
        assert_eq!(sizing.min_fixtures, 16);
        assert_eq!(sizing.after_ppfd_scaling, 16);

        // Wide cone over a big room: density floor dominates.
        let sizing = solve_coverage(50.0, &GrowArea::new(40.0, 40.0), 5000.0, 160.0, 10.0).unwrap();
        assert_eq!(sizing.min_fixtures, 1);
        assert_eq!(sizing.after_density_floor, 100);
        assert_eq!(sizing.recommended, 105);
    }
}
