//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// GPS coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl GpsCoordinates {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Default spectral band count of the synthetic sensor
pub const DEFAULT_BAND_COUNT: usize = 424;

/// Default lower wavelength bound in nanometres
pub const DEFAULT_WAVELENGTH_MIN_NM: f64 = 381.45;

/// Default upper wavelength bound in nanometres
pub const DEFAULT_WAVELENGTH_MAX_NM: f64 = 2500.12;

/// Spectral range covered by a cube, serialized as `[min_nm, max_nm]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct WavelengthRange {
    pub min_nm: f64,
    pub max_nm: f64,
}

impl WavelengthRange {
    pub fn new(min_nm: f64, max_nm: f64) -> Self {
        Self { min_nm, max_nm }
    }

    /// Width of the range in nanometres
    pub fn span(&self) -> f64 {
        self.max_nm - self.min_nm
    }

    /// Centre wavelength of band `index` when the range is split into
    /// `band_count` evenly spaced bands. A single band sits at `min_nm`.
    pub fn band_center(&self, index: usize, band_count: usize) -> f64 {
        if band_count <= 1 {
            return self.min_nm;
        }
        self.min_nm + self.span() * index as f64 / (band_count - 1) as f64
    }
}

impl Default for WavelengthRange {
    fn default() -> Self {
        Self::new(DEFAULT_WAVELENGTH_MIN_NM, DEFAULT_WAVELENGTH_MAX_NM)
    }
}

impl From<(f64, f64)> for WavelengthRange {
    fn from((min_nm, max_nm): (f64, f64)) -> Self {
        Self::new(min_nm, max_nm)
    }
}

impl From<WavelengthRange> for (f64, f64) {
    fn from(range: WavelengthRange) -> Self {
        (range.min_nm, range.max_nm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_centers_span_range() {
        let range = WavelengthRange::default();
        assert_eq!(range.band_center(0, DEFAULT_BAND_COUNT), DEFAULT_WAVELENGTH_MIN_NM);
        let last = range.band_center(DEFAULT_BAND_COUNT - 1, DEFAULT_BAND_COUNT);
        assert!((last - DEFAULT_WAVELENGTH_MAX_NM).abs() < 1e-9);
    }

    #[test]
    fn test_single_band_sits_at_min() {
        let range = WavelengthRange::new(400.0, 900.0);
        assert_eq!(range.band_center(0, 1), 400.0);
    }

    #[test]
    fn test_wavelength_range_serializes_as_pair() {
        let json = serde_json::to_string(&WavelengthRange::new(400.0, 900.5)).unwrap();
        assert_eq!(json, "[400.0,900.5]");

        let parsed: WavelengthRange = serde_json::from_str("[381.45,2500.12]").unwrap();
        assert_eq!(parsed, WavelengthRange::default());
    }
}
