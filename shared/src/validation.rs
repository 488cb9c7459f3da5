//! Validation utilities for the Crop Health Hyperspectral Analysis service

use rust_decimal::Decimal;

use crate::models::HealthAnalysis;
use crate::types::{GpsCoordinates, WavelengthRange};

/// Image file extensions accepted for analysis uploads
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "tiff", "tif", "bmp"];

/// Upper bound on bands per request; keeps cube allocation bounded
pub const MAX_BAND_COUNT: usize = 2048;

// ============================================================================
// Spectral Parameter Validations
// ============================================================================

/// Validate requested spectral band count
pub fn validate_band_count(band_count: usize) -> Result<(), &'static str> {
    if band_count == 0 {
        return Err("band_count must be greater than zero");
    }
    if band_count > MAX_BAND_COUNT {
        return Err("band_count exceeds the supported maximum of 2048");
    }
    Ok(())
}

/// Validate a wavelength range is finite, positive and not inverted
pub fn validate_wavelength_range(range: &WavelengthRange) -> Result<(), &'static str> {
    if !range.min_nm.is_finite() || !range.max_nm.is_finite() {
        return Err("wavelength range bounds must be finite");
    }
    if range.min_nm <= 0.0 {
        return Err("wavelength range minimum must be positive");
    }
    if range.min_nm >= range.max_nm {
        return Err("wavelength range minimum must be below its maximum");
    }
    Ok(())
}

// ============================================================================
// Result Validations
// ============================================================================

/// Validate that category percentages sum to 100 (within rounding tolerance)
pub fn validate_health_percentages(analysis: &HealthAnalysis) -> Result<(), &'static str> {
    let parts = [
        analysis.excellent_percent,
        analysis.good_percent,
        analysis.fair_percent,
        analysis.poor_percent,
    ];
    if parts.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err("Health percentages must be finite and non-negative");
    }
    if (analysis.percent_total() - 100.0).abs() > 1e-6 {
        return Err("Health percentages must sum to 100");
    }
    Ok(())
}

// ============================================================================
// Upload Validations
// ============================================================================

/// Check if a file name carries an accepted image extension
pub fn is_allowed_image_file(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// Validate latitude/longitude are within their geographic bounds
pub fn validate_coordinates(coordinates: &GpsCoordinates) -> Result<(), &'static str> {
    if coordinates.latitude < Decimal::from(-90) || coordinates.latitude > Decimal::from(90) {
        return Err("Latitude must be between -90 and 90");
    }
    if coordinates.longitude < Decimal::from(-180) || coordinates.longitude > Decimal::from(180) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}
