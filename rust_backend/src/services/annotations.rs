//! Per-fixture intensity annotations for layout reports.

use serde::Serialize;

use crate::algorithms::illuminance;
use crate::core::{FixtureId, LightSource, Point};
use crate::services::grid_field::GridSpec;

/// What one fixture delivers, and what the canopy under it receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureAnnotation {
    pub id: FixtureId,
    pub position: Point,
    pub enabled: bool,
    /// Total PPFD from all enabled fixtures directly below this one.
    pub nadir_ppfd: f64,
    /// This fixture's largest contribution to any grid cell.
    pub peak_contribution: f64,
    /// This fixture's contribution averaged over every grid cell.
    pub mean_contribution: f64,
}

/// Annotates every fixture in `sources` against the cells of `spec`.
///
/// Disabled fixtures are listed with zero contributions.
pub fn annotate_fixtures(spec: &GridSpec, sources: &[LightSource]) -> Vec<FixtureAnnotation> {
    let cells: Vec<Point> = spec.cell_centers().collect();

    sources
        .iter()
        .map(|source| {
            let nadir_ppfd = sources
                .iter()
                .filter(|other| other.enabled)
                .map(|other| illuminance::contribution(other, source.position))
                .sum();

            let (peak_contribution, mean_contribution) = if source.enabled && !cells.is_empty() {
                let mut peak: f64 = 0.0;
                let mut total = 0.0;
                for &cell in &cells {
                    let value = illuminance::contribution(source, cell);
                    peak = peak.max(value);
                    total += value;
                }
                (peak, total / cells.len() as f64)
            } else {
                (0.0, 0.0)
            };

            FixtureAnnotation {
                id: source.id,
                position: source.position,
                enabled: source.enabled,
                nadir_ppfd,
                peak_contribution,
                mean_contribution,
            }
        })
        .collect()
}
