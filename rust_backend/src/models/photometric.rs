//! Photometric data model for IES LM-63 luminaire files.
//!
//! A [`PhotometricFile`] is the validated, immutable form of an IES file: the
//! angular candela table plus the lamp/ballast metadata and a handful of
//! derived quantities (peak candela, beam and field angles, efficacy). It is
//! intended to be shared between many fixtures through an `Arc`.
//!
//! Angle conventions: vertical angle 0° points straight down (nadir) and
//! increases towards 180° (zenith); horizontal angles are azimuths in degrees.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::f64::consts::PI;

use crate::error::{LightingError, LightingResult};

/// Half-angle cap used when turning a beam angle into a cone footprint.
///
/// A 180° beam would otherwise produce an infinite radius.
pub const MAX_CONE_HALF_ANGLE_DEG: f64 = 89.0;

/// Stable identifier of a photometric distribution (SHA-256 of its angular data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotometricId([u8; 32]);

impl PhotometricId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for PhotometricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for PhotometricId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// `TILT=` directive of an IES file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Tilt {
    None,
    /// Inline tilt block (skipped, never evaluated).
    Include,
    /// Reference to an external tilt file.
    File(String),
}

/// LM-63 photometric type (goniometer convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhotometricType {
    TypeC,
    TypeB,
    TypeA,
}

impl PhotometricType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(PhotometricType::TypeC),
            2 => Some(PhotometricType::TypeB),
            3 => Some(PhotometricType::TypeA),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            PhotometricType::TypeC => 1,
            PhotometricType::TypeB => 2,
            PhotometricType::TypeA => 3,
        }
    }
}

/// Unit of the luminous opening dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitsType {
    Feet,
    Meters,
}

impl UnitsType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(UnitsType::Feet),
            2 => Some(UnitsType::Meters),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            UnitsType::Feet => 1,
            UnitsType::Meters => 2,
        }
    }
}

/// Luminous opening dimensions as declared on the photometric line.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LuminaireDimensions {
    pub width: f64,
    pub length: f64,
    pub height: f64,
}

/// Free-form header of an IES file (everything before `TILT=`).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IesHeader {
    /// Format identifier such as `IESNA:LM-63-2002`, if present.
    pub format_line: Option<String>,
    /// `[KEYWORD] value` pairs in file order.
    pub keywords: Vec<(String, String)>,
}

impl IesHeader {
    /// First value recorded for `keyword` (case-insensitive, without brackets).
    pub fn keyword(&self, keyword: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw photometric record, before validation.
///
/// Candela values are expected to be already scaled by the file's candela
/// multiplier; `candela_multiplier` is kept for reference only.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotometricData {
    pub header: IesHeader,
    pub tilt: Tilt,
    pub lamp_count: u32,
    /// Rated lumens per lamp; `-1` marks absolute photometry.
    pub lumens_per_lamp: f64,
    pub candela_multiplier: f64,
    pub photometric_type: PhotometricType,
    pub units: UnitsType,
    pub dimensions: LuminaireDimensions,
    pub ballast_factor: f64,
    pub ballast_lamp_factor: f64,
    pub input_watts: f64,
    pub vertical_angles: Vec<f64>,
    pub horizontal_angles: Vec<f64>,
    /// Indexed `[horizontal][vertical]`.
    pub candela: Vec<Vec<f64>>,
}

impl PhotometricData {
    /// Minimal type-C record around an angular table, with neutral metadata.
    pub fn from_table(
        vertical_angles: Vec<f64>,
        horizontal_angles: Vec<f64>,
        candela: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            header: IesHeader::default(),
            tilt: Tilt::None,
            lamp_count: 1,
            lumens_per_lamp: -1.0,
            candela_multiplier: 1.0,
            photometric_type: PhotometricType::TypeC,
            units: UnitsType::Meters,
            dimensions: LuminaireDimensions::default(),
            ballast_factor: 1.0,
            ballast_lamp_factor: 1.0,
            input_watts: 0.0,
            vertical_angles,
            horizontal_angles,
            candela,
        }
    }
}

/// Validated angular intensity distribution with derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotometricFile {
    id: PhotometricId,
    header: IesHeader,
    tilt: Tilt,
    lamp_count: u32,
    lumens_per_lamp: f64,
    candela_multiplier: f64,
    photometric_type: PhotometricType,
    units: UnitsType,
    dimensions: LuminaireDimensions,
    ballast_factor: f64,
    ballast_lamp_factor: f64,
    input_watts: f64,
    vertical_angles: Vec<f64>,
    horizontal_angles: Vec<f64>,
    candela: Vec<Vec<f64>>,
    total_lumens: f64,
    max_candela: f64,
    beam_angle: f64,
    field_angle: f64,
    efficacy: f64,
}

impl PhotometricFile {
    /// Validates `data` and computes the derived metrics.
    ///
    /// # Errors
    /// `FormatError` when angle lists are empty, out of range or not strictly
    /// increasing, when the candela table shape does not match the angle
    /// lists, or when any candela value is negative or not finite.
    pub fn new(data: PhotometricData) -> LightingResult<Self> {
        validate_angles(&data.vertical_angles, "vertical", 0.0, 180.0)?;
        validate_angles(&data.horizontal_angles, "horizontal", 0.0, 360.0)?;
        if data.horizontal_angles[0] >= 360.0 {
            return Err(LightingError::FormatError(
                "first horizontal angle must lie in [0, 360)".to_string(),
            ));
        }
        validate_table(&data)?;

        let max_candela = data
            .candela
            .iter()
            .flatten()
            .copied()
            .fold(0.0_f64, f64::max);

        let total_lumens = if data.lumens_per_lamp < 0.0 {
            zonal_lumens(&data.vertical_angles, &data.candela)
        } else {
            data.lamp_count as f64 * data.lumens_per_lamp * data.ballast_factor
        };
        let efficacy = if data.input_watts > 0.0 {
            total_lumens / data.input_watts
        } else {
            0.0
        };

        let beam_angle = spread_angle(&data.vertical_angles, &data.candela, max_candela, 0.5);
        let field_angle = spread_angle(&data.vertical_angles, &data.candela, max_candela, 0.1);
        let id = compute_id(&data);

        Ok(Self {
            id,
            header: data.header,
            tilt: data.tilt,
            lamp_count: data.lamp_count,
            lumens_per_lamp: data.lumens_per_lamp,
            candela_multiplier: data.candela_multiplier,
            photometric_type: data.photometric_type,
            units: data.units,
            dimensions: data.dimensions,
            ballast_factor: data.ballast_factor,
            ballast_lamp_factor: data.ballast_lamp_factor,
            input_watts: data.input_watts,
            vertical_angles: data.vertical_angles,
            horizontal_angles: data.horizontal_angles,
            candela: data.candela,
            total_lumens,
            max_candela,
            beam_angle,
            field_angle,
            efficacy,
        })
    }

    pub fn id(&self) -> PhotometricId {
        self.id
    }

    pub fn header(&self) -> &IesHeader {
        &self.header
    }

    pub fn tilt(&self) -> &Tilt {
        &self.tilt
    }

    pub fn lamp_count(&self) -> u32 {
        self.lamp_count
    }

    pub fn lumens_per_lamp(&self) -> f64 {
        self.lumens_per_lamp
    }

    pub fn candela_multiplier(&self) -> f64 {
        self.candela_multiplier
    }

    pub fn photometric_type(&self) -> PhotometricType {
        self.photometric_type
    }

    pub fn units(&self) -> UnitsType {
        self.units
    }

    pub fn dimensions(&self) -> LuminaireDimensions {
        self.dimensions
    }

    pub fn ballast_factor(&self) -> f64 {
        self.ballast_factor
    }

    pub fn ballast_lamp_factor(&self) -> f64 {
        self.ballast_lamp_factor
    }

    pub fn input_watts(&self) -> f64 {
        self.input_watts
    }

    pub fn vertical_angles(&self) -> &[f64] {
        &self.vertical_angles
    }

    pub fn horizontal_angles(&self) -> &[f64] {
        &self.horizontal_angles
    }

    /// Candela table indexed `[horizontal][vertical]`.
    pub fn candela(&self) -> &[Vec<f64>] {
        &self.candela
    }

    pub fn total_lumens(&self) -> f64 {
        self.total_lumens
    }

    pub fn max_candela(&self) -> f64 {
        self.max_candela
    }

    /// Full beam angle in degrees (50% of peak).
    pub fn beam_angle(&self) -> f64 {
        self.beam_angle
    }

    /// Full field angle in degrees (10% of peak).
    pub fn field_angle(&self) -> f64 {
        self.field_angle
    }

    /// Lumens per input watt, 0 when the file declares no input power.
    pub fn efficacy(&self) -> f64 {
        self.efficacy
    }

    /// Radius of the beam footprint on a plane `height` below the fixture.
    pub fn beam_radius_at(&self, height: f64) -> f64 {
        cone_radius(height, self.beam_angle)
    }

    /// Radius of the field footprint on a plane `height` below the fixture.
    pub fn field_radius_at(&self, height: f64) -> f64 {
        cone_radius(height, self.field_angle)
    }

    /// Area of the beam footprint on a plane `height` below the fixture.
    pub fn coverage_area_at(&self, height: f64) -> f64 {
        let radius = self.beam_radius_at(height);
        PI * radius * radius
    }

    /// Bilinear candela lookup.
    ///
    /// Queries outside the table's angular range are clamped to the edge
    /// value on that axis; the table is never extrapolated. A query that hits
    /// a table angle exactly returns the stored value.
    pub fn interpolate_candela(&self, vertical: f64, horizontal: f64) -> f64 {
        let (v0, v1, tv) = bracket(&self.vertical_angles, vertical);
        let (h0, h1, th) = bracket(&self.horizontal_angles, horizontal);

        let near = lerp(self.candela[h0][v0], self.candela[h0][v1], tv);
        let far = lerp(self.candela[h1][v0], self.candela[h1][v1], tv);
        lerp(near, far, th)
    }

    /// Maps an azimuth in [0, 360) onto the measured horizontal range using
    /// the LM-63 symmetry implied by the last horizontal angle.
    ///
    /// Last angle 0 means rotational symmetry, 90 quadrant symmetry and 180
    /// bilateral symmetry about the 0-180 plane. Full sets pass through.
    pub fn fold_horizontal(&self, azimuth: f64) -> f64 {
        let last = self.horizontal_angles[self.horizontal_angles.len() - 1];
        let a = azimuth.rem_euclid(360.0);

        if self.horizontal_angles.len() == 1 || last.abs() < ANGLE_EPSILON {
            0.0
        } else if (last - 90.0).abs() < ANGLE_EPSILON {
            match a {
                a if a <= 90.0 => a,
                a if a <= 180.0 => 180.0 - a,
                a if a <= 270.0 => a - 180.0,
                a => 360.0 - a,
            }
        } else if (last - 180.0).abs() < ANGLE_EPSILON {
            if a <= 180.0 {
                a
            } else {
                360.0 - a
            }
        } else {
            a
        }
    }
}

const ANGLE_EPSILON: f64 = 1e-9;

/// Footprint radius of a cone with full opening `angle_deg` at distance `height`.
pub fn cone_radius(height: f64, angle_deg: f64) -> f64 {
    let half = (angle_deg / 2.0).clamp(0.0, MAX_CONE_HALF_ANGLE_DEG);
    height * half.to_radians().tan()
}

fn validate_angles(angles: &[f64], axis: &str, min: f64, max: f64) -> LightingResult<()> {
    if angles.is_empty() {
        return Err(LightingError::FormatError(format!(
            "{} angle list is empty",
            axis
        )));
    }
    for (i, &angle) in angles.iter().enumerate() {
        if !angle.is_finite() || angle < min || angle > max {
            return Err(LightingError::FormatError(format!(
                "{} angle {} out of range [{}, {}]",
                axis, angle, min, max
            )));
        }
        if i > 0 && angle <= angles[i - 1] {
            return Err(LightingError::FormatError(format!(
                "{} angles must be strictly increasing ({} after {})",
                axis,
                angle,
                angles[i - 1]
            )));
        }
    }
    Ok(())
}

fn validate_table(data: &PhotometricData) -> LightingResult<()> {
    if data.candela.len() != data.horizontal_angles.len() {
        return Err(LightingError::FormatError(format!(
            "candela table has {} rows, expected {}",
            data.candela.len(),
            data.horizontal_angles.len()
        )));
    }
    for (h, row) in data.candela.iter().enumerate() {
        if row.len() != data.vertical_angles.len() {
            return Err(LightingError::FormatError(format!(
                "candela row {} has {} values, expected {}",
                h,
                row.len(),
                data.vertical_angles.len()
            )));
        }
        if let Some(bad) = row.iter().find(|c| !c.is_finite() || **c < 0.0) {
            return Err(LightingError::FormatError(format!(
                "candela row {} contains invalid value {}",
                h, bad
            )));
        }
    }
    Ok(())
}

/// Mean candela per vertical angle across all horizontal planes.
fn vertical_profile(candela: &[Vec<f64>], vertical_count: usize) -> Vec<f64> {
    let planes = candela.len() as f64;
    (0..vertical_count)
        .map(|v| candela.iter().map(|row| row[v]).sum::<f64>() / planes)
        .collect()
}

/// Full spread angle out to the last vertical angle, scanning up from the
/// first, whose brightest plane stays at or above `fraction × max_candela`.
///
/// The scan stops at the first angle below the threshold, so a table that is
/// already dim at its first angle spreads 0°.
fn spread_angle(
    vertical_angles: &[f64],
    candela: &[Vec<f64>],
    max_candela: f64,
    fraction: f64,
) -> f64 {
    if max_candela <= 0.0 {
        return 0.0;
    }
    let threshold = fraction * max_candela;
    let half_angle = vertical_angles
        .iter()
        .enumerate()
        .take_while(|(v, _)| {
            candela.iter().map(|row| row[*v]).fold(0.0_f64, f64::max) >= threshold
        })
        .last()
        .map_or(0.0, |(_, angle)| *angle);

    2.0 * half_angle
}

/// Luminous flux from zonal integration of the plane-averaged distribution.
fn zonal_lumens(vertical_angles: &[f64], candela: &[Vec<f64>]) -> f64 {
    let profile = vertical_profile(candela, vertical_angles.len());
    vertical_angles
        .windows(2)
        .zip(profile.windows(2))
        .map(|(angles, values)| {
            let solid_angle =
                2.0 * PI * (angles[0].to_radians().cos() - angles[1].to_radians().cos());
            0.5 * (values[0] + values[1]) * solid_angle
        })
        .sum()
}

fn compute_id(data: &PhotometricData) -> PhotometricId {
    let mut hasher = Sha256::new();
    hasher.update((data.vertical_angles.len() as u64).to_le_bytes());
    hasher.update((data.horizontal_angles.len() as u64).to_le_bytes());
    for angle in data.vertical_angles.iter().chain(&data.horizontal_angles) {
        hasher.update(angle.to_bits().to_le_bytes());
    }
    for value in data.candela.iter().flatten() {
        hasher.update(value.to_bits().to_le_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    PhotometricId(bytes)
}

/// Returns `(lower, upper, t)` such that the query lies at fraction `t`
/// between `angles[lower]` and `angles[upper]`, clamped to the ends.
fn bracket(angles: &[f64], query: f64) -> (usize, usize, f64) {
    let last = angles.len() - 1;
    if last == 0 || query.is_nan() || query <= angles[0] {
        return (0, 0, 0.0);
    }
    if query >= angles[last] {
        return (last, last, 0.0);
    }

    let upper = angles.partition_point(|&a| a <= query);
    let lower = upper - 1;
    let t = (query - angles[lower]) / (angles[upper] - angles[lower]);
    (lower, upper, t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
