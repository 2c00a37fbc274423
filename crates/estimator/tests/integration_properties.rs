//! Invariants of the geometry and cost pipeline that must hold for any input.

use approx::assert_relative_eq;
use estimator::cost;
use estimator::fixtures::*;
use estimator::merge::merge_scene;
use estimator::normalize::center_buffer;
use estimator::slicer_output;
use estimator::volume::{enclosed_volume, measure};
use estimator::{GeometryError, SceneNode, TriangleBuffer};
use glam::{DMat4, DVec3};
use shared::{EstimateRequest, PrintSpeedModel};

fn request(volume_mm3: f64, scale: f64, infill_percent: f64) -> EstimateRequest {
    EstimateRequest {
        volume_mm3,
        scale,
        infill_percent,
        density: 1.24,
        price_per_kg: None,
        speed_model: PrintSpeedModel::default(),
    }
}

#[test]
fn test_cube_volume() {
    let m = measure(&cube(10.0, DVec3::ZERO)).unwrap();
    assert_relative_eq!(m.volume_mm3, 1000.0, max_relative = 1e-6);
}

#[test]
fn test_translation_invariance() {
    let base = cube(10.0, DVec3::ZERO);
    for offset in [
        DVec3::new(100.0, 0.0, 0.0),
        DVec3::new(-37.5, 12.25, 80.0),
        DVec3::new(0.0, 0.0, -500.0),
    ] {
        let moved = base.translated(offset);
        assert_relative_eq!(enclosed_volume(&moved), 1000.0, max_relative = 1e-6);

        let centered = center_buffer(&moved);
        let m = measure(&centered).unwrap();
        assert!(m.bounds.center().length() < 1e-4, "{:?}", m.bounds.center());
        assert_relative_eq!(m.volume_mm3, 1000.0, max_relative = 1e-6);
    }
}

#[test]
fn test_disjoint_merge_is_sum() {
    let a = box_mesh(DVec3::new(2.0, 3.0, 4.0), DVec3::ZERO);
    let b = tetrahedron();
    let root = SceneNode::group("root")
        .child(SceneNode::with_mesh("a", a.clone()).transformed(DMat4::from_translation(DVec3::X * -20.0)))
        .child(SceneNode::with_mesh("b", b.clone()).transformed(DMat4::from_translation(DVec3::X * 20.0)));

    let merged = merge_scene(&root).unwrap();
    assert_eq!(merged.triangle_count(), a.triangle_count() + b.triangle_count());
    assert_relative_eq!(
        enclosed_volume(&merged),
        enclosed_volume(&a) + enclosed_volume(&b),
        max_relative = 1e-6
    );
}

#[test]
fn test_uniform_scale_is_cubic() {
    let base = measure(&cube(10.0, DVec3::ZERO)).unwrap().volume_mm3;
    for s in [0.5, 2.0, 3.0] {
        let scaled = measure(&cube(10.0, DVec3::ZERO).scaled(s)).unwrap().volume_mm3;
        assert_relative_eq!(scaled, base * s * s * s, max_relative = 1e-6);

        assert_relative_eq!(
            cost::adjusted_volume(&request(base, s, 100.0)),
            base * s * s * s,
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_filament_mass_examples() {
    let full = cost::estimate(&request(1000.0, 1.0, 100.0)).unwrap();
    assert_relative_eq!(full.filament_grams, 1.24, max_relative = 1e-12);
    let half = cost::estimate(&request(1000.0, 1.0, 50.0)).unwrap();
    assert_relative_eq!(half.filament_grams, 0.62, max_relative = 1e-12);
}

#[test]
fn test_slicer_output_example() {
    let stdout = "Slicing...\nFilament used: 3.5m\nPrint time: 90min\n";
    let e = slicer_output::interpret(stdout, "PETG");
    let expected_grams = std::f64::consts::PI * (0.875_f64 * 0.875) * 3500.0 / 1000.0 * (1.27 / 1000.0);
    assert_relative_eq!(e.filament_grams, expected_grams, max_relative = 1e-12);
    assert_relative_eq!(e.time_hours, 1.5);
    assert_relative_eq!(e.price, expected_grams * 0.05 + 1.5 * 0.20, max_relative = 1e-12);
}

#[test]
fn test_empty_buffer_has_no_estimate() {
    assert_eq!(
        measure(&TriangleBuffer::new()).unwrap_err(),
        GeometryError::DegenerateGeometry
    );
    assert!(cost::estimate(&request(0.0, 1.0, 15.0)).is_err());
}

#[test]
fn test_reproducible_bits() {
    let scene = two_cube_scene();
    let first = merge_scene(&scene).unwrap();
    let second = merge_scene(&scene).unwrap();
    assert_eq!(first, second);

    let v1 = measure(&first).unwrap().volume_mm3;
    let v2 = measure(&second).unwrap().volume_mm3;
    assert_eq!(v1.to_bits(), v2.to_bits());

    let a = cost::estimate(&request(v1, 1.7, 23.0)).unwrap();
    let b = cost::estimate(&request(v2, 1.7, 23.0)).unwrap();
    assert_eq!(a.filament_grams.to_bits(), b.filament_grams.to_bits());
    assert_eq!(a.time_hours.to_bits(), b.time_hours.to_bits());
    assert_eq!(a.price.to_bits(), b.price.to_bits());
}
