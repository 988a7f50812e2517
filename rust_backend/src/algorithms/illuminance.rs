//! Per-fixture PPFD contribution at a point on the growing surface.
//!
//! Three strategies, picked per fixture by [`IlluminanceStrategy::for_source`]:
//!
//! - **Photometric**: angular shape from an IES candela table, normalized by
//!   the table's peak so the file only supplies the *shape* and the fixture's
//!   PPF supplies the absolute photon output. Lumens are never converted to
//!   photon flux.
//! - **Distributed**: fixtures longer than one unit are split into segments
//!   along their long axis, each treated as an independent point emitter.
//! - **PointSource**: cosine-squared beam with a linear soft edge out to
//!   1.2 × the half beam angle.
//!
//! Every strategy applies the fixture's dimming fraction last. Whether a
//! fixture is enabled is the caller's concern; these functions evaluate the
//! fixture regardless.

use serde::Serialize;

use crate::core::{LightSource, Point};
use crate::models::PhotometricFile;

/// Distances below this are clamped to avoid the 1/d² singularity.
pub const MIN_DISTANCE: f64 = 1e-6;

/// Soft-edge extent of the geometric beam, as a multiple of the half angle.
pub const SOFT_EDGE_FACTOR: f64 = 1.2;

/// Minimum number of segments for a distributed source.
pub const MIN_SEGMENTS: usize = 8;

/// Segments per unit of fixture length for a distributed source.
pub const SEGMENTS_PER_UNIT: f64 = 2.0;

/// How a fixture's contribution is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IlluminanceStrategy {
    Photometric,
    Distributed,
    PointSource,
}

impl IlluminanceStrategy {
    pub fn for_source(source: &LightSource) -> Self {
        if source.is_distributed() {
            IlluminanceStrategy::Distributed
        } else if source.photometry.is_some() {
            IlluminanceStrategy::Photometric
        } else {
            IlluminanceStrategy::PointSource
        }
    }
}

/// PPFD (μmol/m²/s) delivered by `source` at `point`, dimming included.
pub fn contribution(source: &LightSource, point: Point) -> f64 {
    let raw = match IlluminanceStrategy::for_source(source) {
        IlluminanceStrategy::Distributed => distributed_contribution(source, point),
        IlluminanceStrategy::Photometric | IlluminanceStrategy::PointSource => {
            emitter_contribution(source, source.position, source.ppf, point)
        }
    };
    raw * source.dimming
}

/// Number of segments used for a distributed source of `length`.
pub fn segment_count(length: f64) -> usize {
    let by_length = (SEGMENTS_PER_UNIT * length).ceil();
    if by_length.is_finite() && by_length > MIN_SEGMENTS as f64 {
        by_length as usize
    } else {
        MIN_SEGMENTS
    }
}

/// Sum of equal-share point emitters spread along the fixture's long axis.
///
/// Dimming is not applied here.
pub fn distributed_contribution(source: &LightSource, point: Point) -> f64 {
    let length = source.length.unwrap_or(0.0);
    let segments = segment_count(length);
    let segment_ppf = source.ppf / segments as f64;
    let step = length / segments as f64;
    let (sin, cos) = source.orientation_deg.to_radians().sin_cos();

    (0..segments)
        .map(|i| {
            let offset = -0.5 * length + (i as f64 + 0.5) * step;
            let emitter = Point::new(
                source.position.x + offset * cos,
                source.position.y + offset * sin,
            );
            emitter_contribution(source, emitter, segment_ppf, point)
        })
        .sum()
}

/// One point emitter of `ppf` at `emitter`, shaped by the fixture's photometry
/// when present and by its geometric beam otherwise. Dimming is not applied.
fn emitter_contribution(source: &LightSource, emitter: Point, ppf: f64, point: Point) -> f64 {
    let dx = point.x - emitter.x;
    let dy = point.y - emitter.y;
    let height = source.mounting_height;

    match &source.photometry {
        Some(file) => {
            photometric_contribution(file, ppf, dx, dy, height, source.orientation_deg)
        }
        None => point_source_contribution(ppf, source.beam_angle, dx, dy, height),
    }
}

/// IES-shaped contribution of an emitter `height` above the plane, at
/// horizontal offset (`dx`, `dy`) from the emitter to the point.
///
/// `PPF × I(v, h)/I_max × 1/d² × cos(v)`
pub fn photometric_contribution(
    file: &PhotometricFile,
    ppf: f64,
    dx: f64,
    dy: f64,
    height: f64,
    orientation_deg: f64,
) -> f64 {
    let max_candela = file.max_candela();
    if max_candela <= 0.0 {
        return 0.0;
    }

    let distance = clamped_distance(dx, dy, height);
    let cos_vertical = (height / distance).clamp(-1.0, 1.0);
    if cos_vertical <= 0.0 {
        return 0.0;
    }
    let vertical = cos_vertical.acos().to_degrees();
    let azimuth = normalize_azimuth(dy.atan2(dx).to_degrees() - orientation_deg);
    let horizontal = file.fold_horizontal(azimuth);

    let intensity_factor = file.interpolate_candela(vertical, horizontal) / max_candela;
    ppf * intensity_factor / (distance * distance) * cos_vertical
}

/// Geometric beam contribution: `PPF × I(θ) × 1/d² × (h/d)`.
pub fn point_source_contribution(ppf: f64, beam_angle: f64, dx: f64, dy: f64, height: f64) -> f64 {
    let distance = clamped_distance(dx, dy, height);
    let cos_incidence = (height / distance).clamp(-1.0, 1.0);
    if cos_incidence <= 0.0 {
        return 0.0;
    }
    let angle = cos_incidence.acos().to_degrees();

    ppf * point_source_intensity(angle, beam_angle) / (distance * distance) * cos_incidence
}

/// Relative intensity of the geometric beam at `angle` degrees from nadir.
///
/// `cos²(angle)` inside the half beam angle, then a linear taper from the
/// edge value down to zero at 1.2 × the half angle, and zero beyond.
pub fn point_source_intensity(angle: f64, beam_angle: f64) -> f64 {
    let half = 0.5 * beam_angle;
    let soft_edge = SOFT_EDGE_FACTOR * half;

    if angle <= half {
        let cos = angle.to_radians().cos();
        cos * cos
    } else if angle <= soft_edge {
        let edge_cos = half.to_radians().cos();
        let remaining = 1.0 - (angle - half) / (soft_edge - half);
        edge_cos * edge_cos * remaining.max(0.0)
    } else {
        0.0
    }
}

/// Maps any angle onto [0, 360), snapping values that round up to 360 back to 0.
pub fn normalize_azimuth(degrees: f64) -> f64 {
    let azimuth = degrees.rem_euclid(360.0);
    if azimuth >= 360.0 - 1e-9 {
        0.0
    } else {
        azimuth
    }
}

fn clamped_distance(dx: f64, dy: f64, height: f64) -> f64 {
    (dx * dx + dy * dy + height * height).sqrt().max(MIN_DISTANCE)
}
