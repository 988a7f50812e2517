//! Photometric data models.

pub mod photometric;

pub use photometric::{
    cone_radius, IesHeader, LuminaireDimensions, PhotometricData, PhotometricFile,
    PhotometricId, PhotometricType, Tilt, UnitsType,
};
