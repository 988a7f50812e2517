//! Domain models for fixtures, growing areas and catalog records.
//!
//! All geometry shares one length unit: positions, mounting heights, fixture
//! lengths and area dimensions must be expressed in the same unit, and PPFD
//! results are per square of that unit.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{LightingError, LightingResult};
use crate::models::PhotometricFile;

/// Beam angle assumed for fixtures without photometric data.
pub const DEFAULT_BEAM_ANGLE_DEG: f64 = 120.0;

/// Fixtures longer than this are modelled as distributed sources.
pub const DISTRIBUTED_LENGTH_THRESHOLD: f64 = 1.0;

/// A point on the growing surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Identifier of a placed fixture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FixtureId(pub u32);

impl std::fmt::Display for FixtureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FixtureId {
    fn from(v: u32) -> Self {
        FixtureId(v)
    }
}

/// A placed light fixture.
///
/// # Fields
///
/// * `position` - Fixture centre projected onto the growing surface
/// * `mounting_height` - Height of the emitting surface above the canopy plane
/// * `ppf` - Total photon output in μmol/s
/// * `photometry` - Optional angular distribution shared with other fixtures
/// * `length` - Physical length along the long axis, if the fixture is linear
/// * `orientation_deg` - Direction of the long axis, degrees from +X
/// * `beam_angle` - Full beam angle, used only without `photometry`
/// * `enabled` - Disabled fixtures contribute nothing
/// * `dimming` - Output fraction in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightSource {
    pub id: FixtureId,
    pub position: Point,
    pub mounting_height: f64,
    pub ppf: f64,
    #[serde(skip)]
    pub photometry: Option<Arc<PhotometricFile>>,
    pub length: Option<f64>,
    pub orientation_deg: f64,
    pub beam_angle: f64,
    pub enabled: bool,
    pub dimming: f64,
}

impl LightSource {
    /// Creates an enabled, undimmed point fixture with the default beam angle.
    pub fn new(id: u32, position: Point, mounting_height: f64, ppf: f64) -> Self {
        Self {
            id: id.into(),
            position,
            mounting_height,
            ppf,
            photometry: None,
            length: None,
            orientation_deg: 0.0,
            beam_angle: DEFAULT_BEAM_ANGLE_DEG,
            enabled: true,
            dimming: 1.0,
        }
    }

    pub fn with_photometry(mut self, photometry: Arc<PhotometricFile>) -> Self {
        self.photometry = Some(photometry);
        self
    }

    pub fn with_length(mut self, length: f64, orientation_deg: f64) -> Self {
        self.length = Some(length);
        self.orientation_deg = orientation_deg;
        self
    }

    pub fn with_beam_angle(mut self, beam_angle: f64) -> Self {
        self.beam_angle = beam_angle;
        self
    }

    /// Sets the dimming fraction, clamped to [0, 1].
    pub fn with_dimming(mut self, dimming: f64) -> Self {
        self.set_dimming(dimming);
        self
    }

    pub fn set_dimming(&mut self, dimming: f64) {
        self.dimming = if dimming.is_nan() {
            0.0
        } else {
            dimming.clamp(0.0, 1.0)
        };
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the fixture is long enough to be split into segments.
    pub fn is_distributed(&self) -> bool {
        self.length
            .map_or(false, |length| length > DISTRIBUTED_LENGTH_THRESHOLD)
    }
}

/// Rectangular growing area with its origin at one corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowArea {
    pub width: f64,
    pub length: f64,
}

impl GrowArea {
    pub fn new(width: f64, length: f64) -> Self {
        Self { width, length }
    }

    pub fn area(&self) -> f64 {
        self.width * self.length
    }

    /// Rejects non-positive or non-finite dimensions.
    pub fn validate(&self) -> LightingResult<()> {
        if !(self.width.is_finite() && self.width > 0.0)
            || !(self.length.is_finite() && self.length > 0.0)
        {
            return Err(LightingError::configuration(format!(
                "area dimensions must be positive, got {} x {}",
                self.width, self.length
            )));
        }
        Ok(())
    }
}

/// Spectral composition of a fixture's photon flux, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpectralFlux {
    #[serde(default)]
    pub blue_percent: f64,
    #[serde(default)]
    pub green_percent: f64,
    #[serde(default)]
    pub red_percent: f64,
    #[serde(default)]
    pub far_red_percent: f64,
}

/// Fixture catalog record supplied by the catalog collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub name: String,
    /// Photon output in μmol/s.
    pub ppf: f64,
    pub wattage: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub beam_angle: Option<f64>,
    #[serde(default)]
    pub spectrum: SpectralFlux,
}

impl FixtureRecord {
    /// Photon efficacy in μmol/J, 0 when no wattage is declared.
    pub fn photon_efficacy(&self) -> f64 {
        if self.wattage > 0.0 {
            self.ppf / self.wattage
        } else {
            0.0
        }
    }

    /// Places this fixture at `position`, `mounting_height` above the canopy.
    pub fn place(&self, id: u32, position: Point, mounting_height: f64) -> LightSource {
        let mut source = LightSource::new(id, position, mounting_height, self.ppf);
        if self.length > 0.0 {
            source = source.with_length(self.length, 0.0);
        }
        if let Some(beam_angle) = self.beam_angle {
            source = source.with_beam_angle(beam_angle);
        }
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimming_is_clamped() {
        let source = LightSource::new(1, Point::default(), 2.0, 100.0).with_dimming(1.7);
        assert_eq!(source.dimming, 1.0);
        let source = source.with_dimming(-0.2);
        assert_eq!(source.dimming, 0.0);
    }

    #[test]
    fn test_distributed_threshold() {
        let point = LightSource::new(1, Point::default(), 2.0, 100.0);
        assert!(!point.is_distributed());
        assert!(!point.clone().with_length(1.0, 0.0).is_distributed());
        assert!(point.with_length(4.0, 90.0).is_distributed());
    }

    #[test]
    fn test_area_validation() {
        assert!(GrowArea::new(10.0, 20.0).validate().is_ok());
        assert!(GrowArea::new(0.0, 20.0).validate().is_err());
        assert!(GrowArea::new(10.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_fixture_record_placement() {
        let record: FixtureRecord = serde_json::from_str(
            r#"{"name": "Bar 4ft", "ppf": 1700.0, "wattage": 630.0, "length": 4.0,
                "spectrum": {"blue_percent": 18.0, "red_percent": 62.0}}"#,
        )
        .unwrap();
        assert!((record.photon_efficacy() - 1700.0 / 630.0).abs() < 1e-12);
        assert_eq!(record.spectrum.far_red_percent, 0.0);

        let placed = record.place(7, Point::new(1.0, 2.0), 3.0);
        assert_eq!(placed.id, FixtureId(7));
        assert_eq!(placed.ppf, 1700.0);
        assert!(placed.is_distributed());
        assert_eq!(placed.beam_angle, DEFAULT_BEAM_ANGLE_DEG);
    }
}
