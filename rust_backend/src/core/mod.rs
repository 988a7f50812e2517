//! Core domain models for fixture placement.
//!
//! This module defines the fixtures, growing areas and catalog records that the
//! illuminance models, grid evaluator and layout search operate on.

pub mod domain;

pub use domain::{
    FixtureId, FixtureRecord, GrowArea, LightSource, Point, SpectralFlux,
    DEFAULT_BEAM_ANGLE_DEG, DISTRIBUTED_LENGTH_THRESHOLD,
};
