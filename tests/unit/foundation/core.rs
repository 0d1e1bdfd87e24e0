use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    let c = Canvas::new(640, 480).unwrap();
    assert_eq!(c.rgba_len(), 640 * 480 * 4);
    assert!((c.aspect() - 4.0 / 3.0).abs() < 1e-12);
}

#[test]
fn fps_rejects_non_positive_and_non_finite() {
    assert!(Fps::new(0.0).is_err());
    assert!(Fps::new(-1.0).is_err());
    assert!(Fps::new(f64::NAN).is_err());
    assert!(Fps::new(f64::INFINITY).is_err());
}

#[test]
fn fps_frame_duration_matches_rate() {
    let fps = Fps::new(2.0).unwrap();
    assert_eq!(fps.frame_duration(), Duration::from_millis(500));
    assert_eq!(fps.frame_duration_ms(), 500.0);

    let slow = Fps::new(0.1).unwrap();
    assert_eq!(slow.frame_duration(), Duration::from_secs(10));
    assert_eq!(slow.frames_to_duration(3), Duration::from_secs(30));
}

#[test]
fn fps_deserializes_through_validation() {
    let ok: Fps = serde_json::from_str("12.5").unwrap();
    assert_eq!(ok.as_f64(), 12.5);
    assert!(serde_json::from_str::<Fps>("0").is_err());
    assert_eq!(serde_json::to_string(&ok).unwrap(), "12.5");
}
