use std::io::Cursor;

use chrono::{TimeZone, Utc};

use super::*;
use crate::capture::memory::MemoryRuntime;
use crate::sequence::entry::IncomingFile;
use crate::sequence::handles::HandleRegistry;
use crate::sequence::list::Sequence;

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn sequence(files: Vec<(&str, Vec<u8>)>) -> Sequence {
    let mut seq = Sequence::new(HandleRegistry::new());
    let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    seq.ingest(
        files
            .into_iter()
            .map(|(name, bytes)| IncomingFile::from_bytes(name, bytes, t)),
    );
    seq
}

fn small_cfg() -> ExportConfig {
    ExportConfig {
        fps: 2.0,
        width: 640,
        height: 480,
        ..ExportConfig::default()
    }
}

#[tokio::test]
async fn empty_sequence_touches_no_runtime_resource() {
    let mut exporter = Exporter::new(MemoryRuntime::new());
    let err = exporter
        .export_video(&[], &small_cfg())
        .await
        .unwrap_err();
    assert!(matches!(err, StillsError::Validation(_)));
    assert_eq!(exporter.runtime().stats(), Default::default());
    assert!(exporter.runtime().downloads().is_empty());
}

#[tokio::test]
async fn invalid_config_is_rejected_before_acquisition() {
    let seq = sequence(vec![("a.png", png(4, 2, [255, 0, 0, 255]))]);
    let mut exporter = Exporter::new(MemoryRuntime::new());
    let cfg = ExportConfig {
        fps: 0.0,
        ..small_cfg()
    };
    let err = exporter.export_video(seq.entries(), &cfg).await.unwrap_err();
    assert!(matches!(err, StillsError::Validation(_)));
    assert_eq!(exporter.runtime().stats().surfaces_acquired, 0);
}

#[tokio::test]
async fn stream_failure_creates_no_sink_and_no_file() {
    let seq = sequence(vec![("a.png", png(4, 2, [255, 0, 0, 255]))]);
    let mut exporter = Exporter::new(MemoryRuntime::new().failing_stream());
    let err = exporter
        .export_video(seq.entries(), &small_cfg())
        .await
        .unwrap_err();
    assert!(matches!(err, StillsError::Stream(_)));
    assert_eq!(exporter.runtime().stats().sinks_created, 0);
    assert!(exporter.runtime().downloads().is_empty());
}

#[tokio::test]
async fn decode_failure_aborts_the_recording() {
    let mut bad = png(4, 2, [0, 0, 255, 255]);
    bad.truncate(24);
    let seq = sequence(vec![
        ("a.png", png(4, 2, [255, 0, 0, 255])),
        ("broken.png", bad),
    ]);
    let mut exporter = Exporter::new(MemoryRuntime::new());
    let err = exporter
        .export_video(seq.entries(), &small_cfg())
        .await
        .unwrap_err();
    match err {
        StillsError::Decode(msg) => assert!(msg.contains("broken.png"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }

    let rec = exporter.runtime().last_recording().unwrap().snapshot();
    assert!(rec.aborted);
    assert!(!rec.stopped);
    assert_eq!(rec.samples.len(), 15);
    assert!(exporter.runtime().downloads().is_empty());
}

#[tokio::test]
async fn custom_sample_rate_changes_sample_count_only() {
    let seq = sequence(vec![
        ("a.png", png(4, 2, [255, 0, 0, 255])),
        ("b.png", png(2, 4, [0, 255, 0, 255])),
    ]);
    let mut exporter = Exporter::new(MemoryRuntime::new())
        .with_sample_rate(10)
        .with_drain_interval(Duration::ZERO);
    let report = exporter
        .export_video(seq.entries(), &small_cfg())
        .await
        .unwrap();
    assert_eq!(report.samples, 10);
    assert_eq!(report.nominal_duration, Duration::from_secs(1));
    assert_eq!(report.frames, 2);
}

#[tokio::test]
async fn taken_output_name_is_refused_before_recording() {
    let seq = sequence(vec![("a.png", png(4, 2, [255, 0, 0, 255]))]);
    let now = Utc.timestamp_opt(1_700_000_123, 0).unwrap();
    let mut exporter = Exporter::new(MemoryRuntime::new().with_clock(now))
        .with_drain_interval(Duration::ZERO);
    exporter
        .export_video(seq.entries(), &small_cfg())
        .await
        .unwrap();

    let err = exporter
        .export_video(seq.entries(), &small_cfg())
        .await
        .unwrap_err();
    assert!(matches!(err, StillsError::Validation(_)));
    let stats = exporter.runtime().stats();
    assert_eq!(stats.surfaces_acquired, 1);
    assert_eq!(stats.sinks_created, 1);
    assert_eq!(exporter.runtime().downloads().len(), 1);
}

#[test]
fn fallback_notice_names_both_codecs() {
    let notice = Notice::CodecFallback {
        requested: CodecId::H264,
        used: CodecId::Vp9,
    };
    assert_eq!(
        notice.to_string(),
        "codec 'h264' is not supported, used 'vp9'"
    );
}
