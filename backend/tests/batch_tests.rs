//! Tests for single-image and batch analysis through the worker pool
//! Verifies failure isolation, the exhaustion policy and timeouts

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use crop_health_backend::analysis::{
    AnalysisOptions, AnalysisOrchestrator, AnalysisStage, PipelineError, DEFAULT_MAX_DIMENSION,
};
use crop_health_backend::services::{BatchItem, ExhaustionPolicy, HyperspectralService, WorkerPool};
use image::{ImageFormat, Rgb, RgbImage};
use shared::{AnalysisEnvelope, BatchStatus};

fn png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn service(max_concurrent: usize, policy: ExhaustionPolicy, timeout: Duration) -> HyperspectralService {
    HyperspectralService::new(
        Arc::new(AnalysisOrchestrator::default()),
        WorkerPool::new(max_concurrent, policy),
        timeout,
        DEFAULT_MAX_DIMENSION,
    )
}

fn small_options() -> AnalysisOptions {
    AnalysisOptions {
        band_count: 64,
        ..AnalysisOptions::default()
    }
}

#[tokio::test]
async fn single_image_succeeds() {
    let service = service(2, ExhaustionPolicy::Queue, Duration::from_secs(30));
    let result = service
        .analyze_image(png(8, 8, [20, 200, 30]), small_options())
        .await
        .unwrap();

    assert_eq!(result.hyperspectral_bands, 64);
    assert_eq!(result.health_analysis.pixels_analyzed, 64);
    assert_eq!(service.pool().available(), 2);
}

#[tokio::test]
async fn corrupt_image_fails_in_estimation() {
    let service = service(2, ExhaustionPolicy::Queue, Duration::from_secs(30));
    let failure = service
        .analyze_image(b"\x89PNG but not really".to_vec(), small_options())
        .await
        .unwrap_err();

    assert_eq!(failure.stage, AnalysisStage::Estimating);
    assert!(matches!(failure.error, PipelineError::InvalidImage(_)));
}

#[tokio::test]
async fn batch_isolates_failures() {
    let service = service(4, ExhaustionPolicy::Queue, Duration::from_secs(30));
    let items = vec![
        BatchItem::new("healthy.png", png(6, 6, [20, 200, 30])),
        BatchItem::new("corrupt.jpg", b"not an image".to_vec()),
        BatchItem::new("notes.txt", png(2, 2, [0, 0, 0])),
        BatchItem::new("soil.png", png(6, 6, [120, 90, 60])),
    ];

    let report = service.analyze_batch(items, small_options()).await;

    assert_eq!(report.status, BatchStatus::PartialSuccess);
    assert_eq!(report.batch_size, 4);
    assert_eq!(report.summary.successful, 2);
    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.summary.total, 4);
    assert!(report.summary.total_processing_time_secs >= 0.0);

    let names: Vec<_> = report.results.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["healthy.png", "corrupt.jpg", "notes.txt", "soil.png"]);

    match &report.results[1].outcome {
        AnalysisEnvelope::Error(e) => {
            assert_eq!(e.stage, "estimating");
            assert_eq!(e.code, "INVALID_IMAGE");
        }
        other => panic!("expected error envelope, got {:?}", other),
    }
    match &report.results[2].outcome {
        AnalysisEnvelope::Error(e) => assert_eq!(e.stage, "pending"),
        other => panic!("expected error envelope, got {:?}", other),
    }
    assert!(report.results[0].outcome.is_success());
    assert!(report.results[3].outcome.is_success());
}

#[tokio::test]
async fn batch_of_failures_reports_error_status() {
    let service = service(2, ExhaustionPolicy::Queue, Duration::from_secs(30));
    let items = vec![
        BatchItem::new("a.png", Vec::new()),
        BatchItem::new("b.png", b"garbage".to_vec()),
    ];

    let report = service.analyze_batch(items, small_options()).await;
    assert_eq!(report.status, BatchStatus::Error);
    assert_eq!(report.summary.successful, 0);
}

#[tokio::test]
async fn batch_item_json_is_tagged_with_file_name() {
    let service = service(2, ExhaustionPolicy::Queue, Duration::from_secs(30));
    let report = service
        .analyze_batch(vec![BatchItem::new("leaf.png", png(3, 3, [10, 220, 10]))], small_options())
        .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["results"][0]["file_name"], "leaf.png");
    assert_eq!(json["results"][0]["status"], "success");
    assert!(json["results"][0]["health_analysis"].is_object());
}

#[tokio::test]
async fn reject_policy_refuses_when_saturated() {
    let service = service(1, ExhaustionPolicy::Reject, Duration::from_secs(30));
    let held = service.pool().acquire().await.unwrap();

    let failure = service
        .analyze_image(png(4, 4, [20, 200, 30]), small_options())
        .await
        .unwrap_err();
    assert_eq!(failure.stage, AnalysisStage::Pending);
    assert_eq!(failure.error, PipelineError::PoolExhausted(1));

    drop(held);
    assert!(service
        .analyze_image(png(4, 4, [20, 200, 30]), small_options())
        .await
        .is_ok());
}

#[tokio::test]
async fn queue_policy_waits_for_a_slot() {
    let service = service(1, ExhaustionPolicy::Queue, Duration::from_secs(30));
    let held = service.pool().acquire().await.unwrap();

    let pending = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .analyze_image(png(4, 4, [20, 200, 30]), small_options())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!pending.is_finished());

    drop(held);
    assert!(pending.await.unwrap().is_ok());
}

#[tokio::test]
async fn queued_request_times_out_while_waiting() {
    let service = service(1, ExhaustionPolicy::Queue, Duration::from_millis(100));
    let _held = service.pool().acquire().await.unwrap();

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        service.analyze_image(png(4, 4, [20, 200, 30]), small_options()),
    )
    .await
    .expect("request should give up on its own timeout");

    let failure = outcome.unwrap_err();
    assert_eq!(failure.stage, AnalysisStage::Pending);
    assert_eq!(failure.error, PipelineError::Timeout);
}

#[tokio::test]
async fn batch_item_without_extension_is_decoded() {
    let service = service(2, ExhaustionPolicy::Queue, Duration::from_secs(30));
    let report = service
        .analyze_batch(
            vec![
                BatchItem::new("image_1", png(4, 4, [20, 200, 30])),
                BatchItem::new("image_2", b"not an image".to_vec()),
            ],
            small_options(),
        )
        .await;

    assert!(report.results[0].outcome.is_success());
    match &report.results[1].outcome {
        AnalysisEnvelope::Error(e) => {
            assert_eq!(e.stage, "estimating");
            assert_eq!(e.code, "INVALID_IMAGE");
        }
        other => panic!("expected error envelope, got {:?}", other),
    }
    assert_eq!(report.status, BatchStatus::PartialSuccess);
}

#[tokio::test]
async fn zero_timeout_yields_timeout() {
    let service = service(1, ExhaustionPolicy::Queue, Duration::ZERO);
    let failure = service
        .analyze_image(png(16, 16, [20, 200, 30]), AnalysisOptions::default())
        .await
        .unwrap_err();

    assert_eq!(failure.error, PipelineError::Timeout);
    assert_eq!(failure.to_error_envelope().code, "TIMEOUT");
}
