//! Tests for configuration loading and resolution.

use std::io::Write;

use smlm_renderer::{
    render, ColorMapping, ColorSource, ColormapRegistry, FieldRange, PointCloud, RenderConfig,
    RenderError, Rgb, Strategy,
};
use tempfile::NamedTempFile;
use test_utils::{assert_approx_eq, camera_grid, clustered_cloud, three_point_cloud};

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ============================================================================
// Selection rules
// ============================================================================

#[test]
fn test_missing_resolution() {
    let config = RenderConfig::from_json(r#"{"grayscale": true}"#).unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, RenderError::MissingSelection(_)));
    assert!(err.is_usage_error());
}

#[test]
fn test_missing_color_mode() {
    let config = RenderConfig::from_json(r#"{"pixel_size": 10.0}"#).unwrap();
    assert!(matches!(
        config.color_mapping(),
        Err(RenderError::MissingSelection(_))
    ));
}

#[test]
fn test_multiple_color_modes() {
    let json = r#"{
        "pixel_size": 10.0,
        "field": { "attribute": "z" },
        "color": [1.0, 0.0, 0.0]
    }"#;
    let config = RenderConfig::from_json(json).unwrap();
    let err = config.validate().unwrap_err();
    match err {
        RenderError::ConflictingSelection(msg) => {
            assert!(msg.contains("field"));
            assert!(msg.contains("manual"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_roi_without_zoom() {
    let json = r#"{"pixel_size": 10.0, "grayscale": true, "roi": {"x": [0, 4], "y": [0, 4]}}"#;
    let config = RenderConfig::from_json(json).unwrap();
    assert!(matches!(
        config.validate(),
        Err(RenderError::InvalidParameter { ref param, .. }) if param == "roi"
    ));
}

#[test]
fn test_invalid_clip_percentile() {
    let json = r#"{"pixel_size": 10.0, "colormap": "hot", "clip_percentile": 0.0}"#;
    let config = RenderConfig::from_json(json).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_huge_line_width_rejected() {
    let json = r#"{
        "pixel_size": 10.0,
        "strategy": { "type": "circle", "line_width": 1e12 },
        "categorical": { "attribute": "cluster" }
    }"#;
    let config = RenderConfig::from_json(json).unwrap();
    assert!(matches!(
        config.validate(),
        Err(RenderError::InvalidParameter { ref param, .. }) if param == "line_width"
    ));
}

#[test]
fn test_bad_json_is_config_error() {
    assert!(matches!(
        RenderConfig::from_json("{ not json"),
        Err(RenderError::ConfigError(_))
    ));
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_field_selection_defaults() {
    let config = RenderConfig::from_json(r#"{"pixel_size": 10.0, "field": {"attribute": "z"}}"#).unwrap();
    assert_eq!(
        config.color_mapping().unwrap(),
        ColorMapping::Field {
            attribute: "z".into(),
            colormap: "viridis".into(),
            range: FieldRange::Auto,
            clip_percentiles: None,
        }
    );
}

#[test]
fn test_resolve_fixed_resolution() {
    let json = r#"{
        "zoom": 2.0,
        "roi": { "x": [8, 24], "y": [0, 10] },
        "grayscale": true
    }"#;
    let config = RenderConfig::from_json(json).unwrap();
    let grid = camera_grid();
    let request = config.resolve(&three_point_cloud(), Some(&grid)).unwrap();

    assert_eq!(request.target.width(), 32);
    assert_eq!(request.target.height(), 20);
    assert_approx_eq!(request.target.pixel_size(), 50.0, 1e-9);
    assert_eq!(request.color, ColorMapping::Grayscale);
    assert_eq!(request.brightness_clip, Some(0.99));
}

#[test]
fn test_zoom_needs_reference_grid() {
    let config = RenderConfig::from_json(r#"{"zoom": 2.0, "grayscale": true}"#).unwrap();
    assert!(matches!(
        config.resolve(&three_point_cloud(), None),
        Err(RenderError::MissingSelection(_))
    ));
}

#[test]
fn test_resolve_data_bounds() {
    let json = r#"{"pixel_size": 500.0, "margin": 0.25, "color": [0.0, 1.0, 0.0], "disable_clipping": true}"#;
    let config = RenderConfig::from_json(json).unwrap();
    let cloud = PointCloud::new(vec![0.0, 4.0], vec![1.0, 2.0]).unwrap();
    let request = config.resolve(&cloud, None).unwrap();

    assert_eq!(request.target.width(), 12);
    assert_eq!(request.target.height(), 3);
    assert_eq!(request.color, ColorMapping::manual(Rgb::new(0.0, 1.0, 0.0)));
    assert_eq!(request.brightness_clip, None);
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_config_from_file_renders() {
    let file = write_temp(
        r#"{
            "pixel_size": 20.0,
            "strategy": { "type": "gaussian", "n_sigmas": 2.5 },
            "categorical": { "attribute": "cluster" }
        }"#,
    );
    let config = RenderConfig::from_file(file.path()).unwrap();
    let cloud = clustered_cloud(3, 20, 2.0, 0.1, 9);
    let request = config.resolve(&cloud, None).unwrap();
    assert!(matches!(request.strategy, Strategy::Gaussian(ref p) if p.n_sigmas == 2.5));

    let output = render(&cloud, &request, &ColormapRegistry::builtin()).unwrap();
    assert_eq!(output.info.color_mode, "categorical");
    assert!(output.image.max_channel_value() > 0.0);
}

#[test]
fn test_missing_config_file() {
    assert!(matches!(
        RenderConfig::from_file("/nonexistent/render.json"),
        Err(RenderError::ConfigError(_))
    ));
}

#[test]
fn test_registry_from_file() {
    let file = write_temp(
        r##"{
            "colormaps": {
                "fire": { "stops": [
                    { "value": 0.0, "color": "#000000" },
                    { "value": 0.5, "color": "#FF0000" },
                    { "value": 1.0, "color": "#FFFF00" }
                ] }
            },
            "palettes": { "duo": ["#0000FF", "#FFFFFF"] }
        }"##,
    );
    let registry = ColormapRegistry::from_file(file.path()).unwrap();

    let fire = registry.colormap("fire").unwrap();
    assert_eq!(fire.sample(0.5), Rgb::new(1.0, 0.0, 0.0));
    assert_eq!(fire.sample(1.0), Rgb::new(1.0, 1.0, 0.0));
    assert_eq!(registry.palette("duo").unwrap().color_for(3.0), Rgb::new(0.0, 0.0, 1.0));
    assert!(registry.colormap_names().contains(&"inferno"));
}

#[test]
fn test_registry_rejects_unordered_stops() {
    let file = write_temp(
        r##"{ "colormaps": { "bad": { "stops": [
            { "value": 1.0, "color": "#000000" },
            { "value": 0.0, "color": "#FFFFFF" }
        ] } } }"##,
    );
    assert!(ColormapRegistry::from_file(file.path()).is_err());
}
