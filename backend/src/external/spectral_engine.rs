//! Native Spectral Engine
//!
//! Calibrated spectral response model loaded from a JSON file. The model is a
//! list of control points, each giving the per-feature response at one
//! wavelength; responses at other wavelengths are linearly interpolated and
//! held constant past either end.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::spectral::BandResponse;

/// Errors raised while loading an engine model
#[derive(Error, Debug)]
pub enum EngineLoadError {
    #[error("Cannot read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse model file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    Invalid(String),
}

/// On-disk model format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineModel {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub control_points: Vec<ControlPoint>,
}

/// Response at one calibrated wavelength
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ControlPoint {
    pub wavelength_nm: f64,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    #[serde(default)]
    pub vegetation: f64,
    #[serde(default)]
    pub bias: f64,
}

impl ControlPoint {
    fn response(&self) -> BandResponse {
        BandResponse {
            red: self.red,
            green: self.green,
            blue: self.blue,
            vegetation: self.vegetation,
            bias: self.bias,
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.wavelength_nm,
            self.red,
            self.green,
            self.blue,
            self.vegetation,
            self.bias,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Loaded and validated spectral engine
#[derive(Debug, Clone)]
pub struct NativeEngine {
    name: String,
    version: Option<String>,
    points: Vec<ControlPoint>,
}

impl NativeEngine {
    /// Load a model from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineLoadError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Parse and validate a model from JSON text
    pub fn from_json(raw: &str) -> Result<Self, EngineLoadError> {
        let model: EngineModel = serde_json::from_str(raw)?;
        Self::from_model(model)
    }

    pub fn from_model(model: EngineModel) -> Result<Self, EngineLoadError> {
        let mut points = model.control_points;
        if points.len() < 2 {
            return Err(EngineLoadError::Invalid(
                "at least two control points are required".to_string(),
            ));
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(EngineLoadError::Invalid(format!(
                "control point at {} nm has non-finite values",
                bad.wavelength_nm
            )));
        }

        points.sort_by(|a, b| a.wavelength_nm.total_cmp(&b.wavelength_nm));
        if points
            .windows(2)
            .any(|w| w[0].wavelength_nm >= w[1].wavelength_nm)
        {
            return Err(EngineLoadError::Invalid(
                "control point wavelengths must be distinct".to_string(),
            ));
        }

        Ok(Self {
            name: model.name,
            version: model.version,
            points,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.name
    }

    pub fn model_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn control_point_count(&self) -> usize {
        self.points.len()
    }

    /// Interpolated response at `wavelength_nm`
    pub fn response_at(&self, wavelength_nm: f64) -> BandResponse {
        // Validation guarantees at least two points
        let first = &self.points[0];
        let last = &self.points[self.points.len() - 1];
        if wavelength_nm <= first.wavelength_nm {
            return first.response();
        }
        if wavelength_nm >= last.wavelength_nm {
            return last.response();
        }

        let upper = self
            .points
            .partition_point(|p| p.wavelength_nm <= wavelength_nm);
        let (lo, hi) = (&self.points[upper - 1], &self.points[upper]);
        let t = (wavelength_nm - lo.wavelength_nm) / (hi.wavelength_nm - lo.wavelength_nm);
        BandResponse::lerp(lo.response(), hi.response(), t)
    }
}
