//! HTTP handlers for image analysis endpoints

use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use shared::{is_allowed_image_file, AnalysisEnvelope, BatchReport, WavelengthRange};
use validator::Validate;

use crate::analysis::AnalysisOptions;
use crate::error::{AppError, AppResult};
use crate::services::BatchItem;
use crate::AppState;

/// Multipart field carrying the image of a single analysis
const IMAGE_FIELD: &str = "image";

/// Multipart field carrying each image of a batch
const BATCH_FIELD: &str = "images";

/// Optional overrides of the configured analysis parameters
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AnalyzeQuery {
    #[validate(range(min = 1, max = 2048))]
    pub band_count: Option<usize>,
    pub wavelength_min: Option<f64>,
    pub wavelength_max: Option<f64>,
    /// A number, or `random` for a fresh seed
    pub seed: Option<String>,
}

impl AnalyzeQuery {
    /// Merge the query over the configured defaults
    pub fn resolve(&self, defaults: AnalysisOptions) -> AppResult<AnalysisOptions> {
        self.validate()?;

        Ok(AnalysisOptions {
            band_count: self.band_count.unwrap_or(defaults.band_count),
            wavelength_range: WavelengthRange::new(
                self.wavelength_min
                    .unwrap_or(defaults.wavelength_range.min_nm),
                self.wavelength_max
                    .unwrap_or(defaults.wavelength_range.max_nm),
            ),
            seed: parse_seed(self.seed.as_deref(), defaults.seed)?,
        })
    }
}

/// `None` keeps the default; `random` draws a fresh seed
pub fn parse_seed(raw: Option<&str>, default: u64) -> AppResult<u64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(s) if s.eq_ignore_ascii_case("random") => Ok(rand::random()),
        Some(s) => s.parse().map_err(|_| AppError::Validation {
            field: "seed".to_string(),
            message: format!("expected a non-negative integer or \"random\", got {:?}", s),
        }),
    }
}

/// JSON body alternative to a multipart upload
#[derive(Debug, Deserialize)]
pub struct Base64ImageRequest {
    pub image_base64: String,
    pub file_name: Option<String>,
}

fn check_upload_size(file_name: &str, size: usize, limit: usize) -> AppResult<()> {
    if size > limit {
        return Err(AppError::PayloadTooLarge(format!(
            "{} is {} bytes; the per-file limit is {} bytes",
            file_name, size, limit
        )));
    }
    Ok(())
}

fn check_extension(file_name: &str) -> AppResult<()> {
    if !is_allowed_image_file(file_name) {
        return Err(AppError::Validation {
            field: "file_name".to_string(),
            message: format!("unsupported file type: {}", file_name),
        });
    }
    Ok(())
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::ValidationError(e.body_text())
    }
}

async fn read_multipart_image(mut multipart: Multipart, limit: usize) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::ValidationError("No image file selected".to_string()))?;
        check_extension(&file_name)?;

        let bytes = field.bytes().await.map_err(multipart_error)?;
        check_upload_size(&file_name, bytes.len(), limit)?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(AppError::ValidationError("No image file provided".to_string()))
}

fn read_base64_image(payload: Base64ImageRequest, limit: usize) -> AppResult<(String, Vec<u8>)> {
    let file_name = payload.file_name.unwrap_or_else(|| "upload.png".to_string());
    check_extension(&file_name)?;

    let bytes = STANDARD
        .decode(payload.image_base64.trim())
        .map_err(|e| AppError::Validation {
            field: "image_base64".to_string(),
            message: format!("invalid base64: {}", e),
        })?;
    check_upload_size(&file_name, bytes.len(), limit)?;
    Ok((file_name, bytes))
}

/// Analyse one image, uploaded as multipart `image` or as base64 JSON
pub async fn process_image(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    request: Request,
) -> AppResult<Json<AnalysisEnvelope>> {
    let options = query.resolve(state.config.default_options())?;
    let limit = state.config.max_upload_bytes();

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let (file_name, bytes) = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::ValidationError(e.body_text()))?;
        read_multipart_image(multipart, limit).await?
    } else if content_type.starts_with("application/json") {
        let Json(payload) = Json::<Base64ImageRequest>::from_request(request, &state)
            .await
            .map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge(e.body_text())
                } else {
                    AppError::ValidationError(e.body_text())
                }
            })?;
        read_base64_image(payload, limit)?
    } else {
        return Err(AppError::ValidationError(
            "expected a multipart/form-data or application/json body".to_string(),
        ));
    };

    tracing::info!(
        file = %file_name,
        bytes = bytes.len(),
        band_count = options.band_count,
        seed = options.seed,
        "Processing image"
    );

    let result = state.hyperspectral.analyze_image(bytes, options).await?;
    Ok(Json(AnalysisEnvelope::Success(result)))
}

/// Analyse every multipart `images` field of the request
pub async fn batch_process(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<BatchReport>> {
    let options = query.resolve(state.config.default_options())?;
    let limit = state.config.max_upload_bytes();

    let mut items = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(BATCH_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("image_{}", items.len() + 1));
        let bytes = field.bytes().await.map_err(multipart_error)?;
        check_upload_size(&file_name, bytes.len(), limit)?;
        items.push(BatchItem::new(file_name, bytes.to_vec()));
    }

    if items.is_empty() {
        return Err(AppError::ValidationError("No image files provided".to_string()));
    }

    let report = state.hyperspectral.analyze_batch(items, options).await;
    Ok(Json(report))
}
