use super::*;

#[test]
fn defaults_are_valid() {
    let opts = RetouchOpts::default();
    opts.validate().unwrap();
    assert_eq!(opts.export_format, ExportFormat::Jpeg);
    assert_eq!(opts.jpeg_quality, 0.9);
    assert_eq!(opts.snapshot_scale(true), 1.0);
    assert_eq!(opts.snapshot_scale(false), 2.0);
    assert_eq!(opts.snapshot_background.to_string(), "#111111");
}

#[test]
fn partial_json_overrides_only_given_keys() {
    let opts = RetouchOpts::from_json(
        r##"{"export_format": "png", "snapshot_background": "#000", "stage_timeout_ms": 500}"##,
    )
    .unwrap();
    assert_eq!(opts.export_format, ExportFormat::Png);
    assert_eq!(opts.snapshot_background, Rgb8::BLACK);
    assert_eq!(opts.stage_timeout(), Duration::from_millis(500));
    assert_eq!(opts.blob_url_ttl_ms, 60_000);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(RetouchOpts::from_json(r#"{"jpeg_quality": 0}"#).is_err());
    assert!(RetouchOpts::from_json(r#"{"snapshot_scale_touch": -1}"#).is_err());
    assert!(RetouchOpts::from_json(r#"{"reference_width": 0}"#).is_err());
    assert!(RetouchOpts::from_json(r#"{"no_such_key": 1}"#).is_err());
    assert!(RetouchOpts::from_json(r##"{"jpeg_background": "#12"}"##).is_err());
}

#[test]
fn encode_settings_follow_options() {
    let opts = RetouchOpts {
        jpeg_quality: 0.5,
        ..RetouchOpts::default()
    };
    let s = opts.encode_settings();
    assert_eq!(s.quality, 0.5);
    assert_eq!(s.format, ExportFormat::Jpeg);
}
