//! Integration tests exercising the full engine pipeline:
//! topology → rotation → projection → frame, through the public API.

use approx::assert_relative_eq;
use proptest::prelude::*;
use tess_core::{
    EDGE_COUNT, Engine, EngineSettings, FixedTicks, HypercubeTopology, ProjectionPipeline,
    RotationState, SATURATION_MAGNITUDE, SignalCell, VERTEX_COUNT, Vertex4D, export_json,
};

fn engine_with(coherence: f64, speed: f64) -> Engine {
    Engine::new(EngineSettings {
        initial_coherence: coherence,
        rotation_speed: speed,
        ..EngineSettings::default()
    })
    .unwrap()
}

/// One tick at the documented defaults emits the full frame and telemetry.
#[test]
fn single_tick_end_to_end() {
    let mut engine = engine_with(0.5, 0.02);
    let frame = engine.tick();

    assert_eq!(frame.vertices.len(), 16);
    assert_eq!(frame.edges.len(), 32);
    assert_eq!(frame.telemetry.coherence, 0.5);
    assert_eq!(frame.telemetry.rotation_speed, 0.02);
    assert_eq!(frame.telemetry.vertex_count, 16);

    let status = engine.status();
    assert_eq!(status.vertex_count, VERTEX_COUNT);
    assert!(!status.is_running);
}

#[test]
fn quaternions_stay_unit_over_long_runs() {
    let mut state = RotationState::new();
    for i in 0..10_000 {
        state.step(0.01 + (i % 7) as f64 * 0.013);
    }
    assert!((state.q1().norm() - 1.0).abs() < 1e-4);
    assert!((state.q2().norm() - 1.0).abs() < 1e-4);
}

#[test]
fn every_output_finite_across_input_grid() {
    for coherence in [0.0, 0.5, 1.0] {
        for speed in [0.0, 0.02, 0.1] {
            let mut engine = engine_with(coherence, speed);
            let mut last_tick = 0;
            engine.run(&mut FixedTicks(1000), |frame| {
                assert!(
                    frame.is_finite(),
                    "non-finite frame at tick {} (c={coherence}, s={speed})",
                    frame.tick
                );
                last_tick = frame.tick;
            });
            assert_eq!(last_tick, 1000);
        }
    }
}

#[test]
fn focal_plane_point_is_saturated_not_divided() {
    // Vertex 15 = (1,1,1,1). With q1 at rest and q2 about X by θ, the rotated
    // w is sin θ + cos θ = √2·sin(θ + π/4). Pick θ so that 3·w = 4, i.e. the
    // denominator vanishes at coherence 0.
    let target = 4.0 / 3.0;
    let theta = (target / std::f64::consts::SQRT_2).asin() - std::f64::consts::FRAC_PI_4;
    let state = RotationState::from_angles(0.0, theta);

    let rotated = state.rotate(Vertex4D::from_index(15));
    let pipeline = ProjectionPipeline::default();
    let denominator = 4.0 - rotated.w * pipeline.w_factor(0.0);
    assert!(denominator.abs() < 1e-4, "denominator = {denominator}");

    let projected = pipeline.project(rotated, 0.0);
    assert!(projected.is_finite());
    assert!(projected.max_abs() <= SATURATION_MAGNITUDE * 2.0);
}

#[test]
fn identical_inputs_give_identical_frames() {
    let mut a = engine_with(0.3, 0.04);
    let mut b = engine_with(0.3, 0.04);
    for i in 0..200 {
        if i % 17 == 0 {
            let c = (i as f64 / 200.0).sin().abs();
            a.set_coherence(c);
            b.set_coherence(c);
        }
        assert_eq!(a.tick(), b.tick());
    }
}

#[test]
fn coherence_modulates_projection() {
    let state = RotationState::from_angles(0.3, 0.3);
    let rotated = state.rotate(Vertex4D::from_index(9));
    let pipeline = ProjectionPipeline::default();

    assert_relative_eq!(pipeline.w_factor(0.0), 3.0);
    assert_relative_eq!(pipeline.w_factor(1.0), 1.0);
    assert_ne!(pipeline.project(rotated, 0.0), pipeline.project(rotated, 1.0));
}

#[test]
fn pushed_coherence_reaches_next_frame() {
    let cell = SignalCell::new();
    let mut engine = engine_with(0.5, 0.02).with_coherence_source(cell.clone());
    engine.tick();
    for v in [0.1, 0.2, 0.3, 0.95] {
        cell.set(v);
    }
    let frame = engine.tick();
    assert_eq!(frame.telemetry.coherence, 0.95);
}

#[test]
fn frame_exports_as_json() {
    let mut engine = engine_with(0.5, 0.02);
    let json = export_json(&engine.tick()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["edges"].as_array().unwrap().len(), EDGE_COUNT);
    assert_eq!(value["telemetry"]["vertexCount"], 16);
}

#[test]
fn topology_is_fixed_after_ticks() {
    let mut engine = engine_with(0.5, 0.1);
    let before = engine.topology().edges().to_vec();
    for _ in 0..50 {
        engine.tick();
    }
    assert_eq!(engine.topology().edges().to_vec(), before);
    assert_eq!(
        HypercubeTopology::new().unwrap().edges().to_vec(),
        before
    );
}

proptest! {
    #[test]
    fn rotation_preserves_norm(
        xyz in -10.0f64..10.0,
        zw in -10.0f64..10.0,
        speed in 0.0f64..0.2,
        steps in 0usize..200,
        index in 0usize..16,
    ) {
        let mut state = RotationState::from_angles(xyz, zw);
        for _ in 0..steps {
            state.step(speed);
        }
        let v = Vertex4D::from_index(index);
        prop_assert!((state.rotate(v).norm() - v.norm()).abs() < 1e-6);
    }

    #[test]
    fn projection_is_total(
        x in -2.0f64..2.0,
        y in -2.0f64..2.0,
        z in -2.0f64..2.0,
        w in -2.0f64..2.0,
        coherence in prop::num::f64::ANY,
    ) {
        let out = ProjectionPipeline::default().project(Vertex4D::new(x, y, z, w), coherence);
        prop_assert!(out.is_finite());
    }
}
