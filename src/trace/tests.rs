use super::*;
use crate::geodesic::CRITICAL_IMPACT_PARAMETER;
use crate::integrate::{IntegrationMethod, Integrator};
use crate::scene::{build_disk_ramp, CubeFace};

fn blackhole(inner: f64, outer: f64) -> BlackHole {
    BlackHole::new(
        Vector3::new(0.0, 0.0, 0.0),
        inner,
        outer,
        build_disk_ramp(20).unwrap(),
    )
    .unwrap()
}

/// Each face a different shade of blue so sky hits can be told apart.
fn face_coded_skybox() -> Skybox {
    let shade = |face: CubeFace| Color::new(0.0, 0.0, 0.1 * (face.index() + 1) as f32);
    Skybox::solid(CubeFace::ALL.map(shade)).unwrap()
}

fn is_ramp_color(color: Color, bh: &BlackHole) -> bool {
    bh.ramp().colors().contains(&color)
}

fn run(
    camera: [f64; 3],
    direction: [f64; 3],
    bh: &BlackHole,
    integrator: &mut Integrator,
) -> Result<TraceOutcome, TraceError> {
    trace(
        Vector3::from(direction),
        bh,
        Vector3::from(camera),
        &face_coded_skybox(),
        integrator,
    )
}

fn all_methods() -> [Integrator; 3] {
    [
        Integrator::new(IntegrationMethod::FixedStep),
        Integrator::new(IntegrationMethod::Adaptive),
        Integrator::new(IntegrationMethod::RungeKutta),
    ]
}

#[test]
fn ray_geometry_matches_impact_parameter() {
    let bh = blackhole(4.0, 10.0);
    // 45 degrees off the line of sight from r = 20.
    let ray = RayGeometry::new(
        Vector3::new(1.0, 0.0, -1.0),
        &bh,
        Vector3::new(0.0, 0.0, 20.0),
    )
    .unwrap();
    assert!((ray.theta - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    assert!((ray.b - 14.9071198499986).abs() < 1e-9);
    assert!((ray.axis.magnitude() - 1.0).abs() < 1e-12);
    assert!((ray.position_after(0.0) - ray.offset).magnitude() < 1e-12);
}

#[test]
fn radial_ray_is_captured() {
    let bh = blackhole(4.0, 10.0);
    let mut integrator = Integrator::new(IntegrationMethod::Adaptive);
    let outcome = run([0.0, 3.0, 12.0], [0.0, -3.0, -12.0], &bh, &mut integrator).unwrap();
    assert_eq!(outcome.hit, Hit::Nothing);
    assert_eq!(outcome.color, Color::BLACK);
}

#[test]
fn plunging_ray_crosses_disk_by_sign_change() {
    let bh = blackhole(4.0, 10.0);
    for mut integrator in all_methods() {
        let ray = RayGeometry::new(
            Vector3::new(0.0, -0.5, -1.0),
            &bh,
            Vector3::new(0.0, 3.0, 12.0),
        )
        .unwrap();
        assert!(ray.b < CRITICAL_IMPACT_PARAMETER);
        let band = integrator.integrate(10.0, 4.0, ray.b).unwrap();
        assert!(band.abs() < std::f64::consts::PI);

        let fate = classify(&ray, &bh, &mut integrator).unwrap();
        let RayFate::CrossedDisk(span) = fate else {
            panic!("expected a disk crossing, got {fate:?}");
        };
        assert_eq!((span.r_from, span.r_to), (10.0, 4.0));

        let outcome = run([0.0, 3.0, 12.0], [0.0, -0.5, -1.0], &bh, &mut integrator).unwrap();
        assert_eq!(outcome.hit, Hit::Disk);
        assert!(is_ramp_color(outcome.color, &bh));
    }
}

#[test]
fn plunging_ray_crosses_disk_by_half_turn() {
    let bh = blackhole(2.5, 10.0);
    let mut integrator = Integrator::new(IntegrationMethod::Adaptive);
    let ray = RayGeometry::new(
        Vector3::new(0.41, -0.2, -1.0),
        &bh,
        Vector3::new(0.0, 3.0, 12.0),
    )
    .unwrap();
    assert!(ray.b < CRITICAL_IMPACT_PARAMETER);
    let band = integrator.integrate(10.0, 2.5, ray.b).unwrap();
    assert!(band.abs() > std::f64::consts::PI);

    assert!(matches!(
        classify_capture(&ray, &bh, &mut integrator).unwrap(),
        RayFate::CrossedDisk(DiskSpan { r_to, .. }) if r_to == 2.5
    ));
    let outcome = run([0.0, 3.0, 12.0], [0.41, -0.2, -1.0], &bh, &mut integrator).unwrap();
    assert_eq!(outcome.hit, Hit::Disk);
    assert!(is_ramp_color(outcome.color, &bh));
}

#[test]
fn plunging_ray_above_the_disk_is_captured() {
    let bh = blackhole(4.0, 10.0);
    for mut integrator in all_methods() {
        let outcome = run([0.0, 3.0, 12.0], [0.0, -0.22, -1.0], &bh, &mut integrator).unwrap();
        assert_eq!(outcome.hit, Hit::Nothing);
        assert_eq!(outcome.color, Color::BLACK);
    }
}

#[test]
fn wide_ray_escapes_to_the_sky() {
    let bh = blackhole(4.0, 10.0);
    let sky = face_coded_skybox();
    let front = sky.face(CubeFace::Front).texel(0, 0).unwrap();
    for mut integrator in all_methods() {
        let ray = RayGeometry::new(
            Vector3::new(0.9, 0.0, -1.0),
            &bh,
            Vector3::new(0.0, 1.0, 20.0),
        )
        .unwrap();
        let RayFate::Escaped(sweep) = classify(&ray, &bh, &mut integrator).unwrap() else {
            panic!("expected the ray to escape");
        };
        assert!(sweep.abs() < std::f64::consts::TAU);

        let outcome = run([0.0, 1.0, 20.0], [0.9, 0.0, -1.0], &bh, &mut integrator).unwrap();
        assert_eq!(outcome.hit, Hit::Sky);
        assert_eq!(outcome.color, front);
    }
}

#[test]
fn ray_threading_above_the_disk_still_escapes() {
    // Periastron is about 9.71, inside the outer edge, but the photon stays
    // above the plane on both in-disk legs.
    let bh = blackhole(4.0, 10.0);
    let front = face_coded_skybox().face(CubeFace::Front).texel(0, 0).unwrap();
    for mut integrator in all_methods() {
        let outcome = run([0.0, 1.0, 20.0], [0.6, 0.0, -1.0], &bh, &mut integrator).unwrap();
        assert_eq!(outcome.hit, Hit::Sky);
        assert_eq!(outcome.color, front);
    }
}

#[test]
fn ray_crosses_disk_on_the_way_out() {
    let bh = blackhole(3.0, 10.0);
    for mut integrator in all_methods() {
        let ray = RayGeometry::new(
            Vector3::new(0.4, 0.0, -1.0),
            &bh,
            Vector3::new(0.0, 3.0, 12.0),
        )
        .unwrap();
        assert!(ray.b > CRITICAL_IMPACT_PARAMETER);
        let fate = classify_escape(&ray, &bh, &mut integrator).unwrap();
        let RayFate::CrossedDisk(span) = fate else {
            panic!("expected a disk crossing, got {fate:?}");
        };
        // Outbound leg: from the periastron back out to the rim.
        assert!(span.r_from < span.r_to);
        assert_eq!(span.r_to, 10.0);
        assert!((span.r_from - 4.2846).abs() < 1e-3);

        let outcome = run([0.0, 3.0, 12.0], [0.4, 0.0, -1.0], &bh, &mut integrator).unwrap();
        assert_eq!(outcome.hit, Hit::Disk);
        assert!(is_ramp_color(outcome.color, &bh));
    }
}

#[test]
fn passage_inside_the_inner_edge_is_reported() {
    let bh = blackhole(4.0, 10.0);
    let mut integrator = Integrator::new(IntegrationMethod::Adaptive);
    let err = run([0.0, 1.0, 12.0], [0.45, -0.1, -1.0], &bh, &mut integrator).unwrap_err();
    let TraceError::InnerEdgePassage {
        periastron,
        disk_inner,
    } = err
    else {
        panic!("expected an inner edge passage, got {err:?}");
    };
    assert!((periastron - 3.587).abs() < 1e-2);
    assert_eq!(disk_inner, 4.0);
    assert_eq!(err.severity(), Severity::Unresolved);
}

#[test]
fn captured_rays_never_see_the_sky() {
    let bh = blackhole(4.0, 10.0);
    let mut integrator = Integrator::new(IntegrationMethod::Adaptive);
    let camera = Vector3::new(0.0, 3.0, 12.0);
    let mut captured = 0;
    for i in 0..12 {
        for j in 0..12 {
            let direction = Vector3::new(-0.5 + i as f64 / 11.0, -0.6 + j as f64 / 11.0, -1.0);
            let ray = RayGeometry::new(direction, &bh, camera).unwrap();
            if ray.b >= CRITICAL_IMPACT_PARAMETER {
                continue;
            }
            captured += 1;
            let outcome = trace(direction, &bh, camera, &face_coded_skybox(), &mut integrator)
                .unwrap();
            assert_ne!(outcome.hit, Hit::Sky, "direction {direction:?}");
        }
    }
    assert!(captured > 10);
}

#[test]
fn tracing_is_repeatable_with_a_reused_integrator() {
    let bh = blackhole(3.0, 10.0);
    let mut integrator = Integrator::new(IntegrationMethod::Adaptive);
    let first = run([0.0, 3.0, 12.0], [0.4, 0.0, -1.0], &bh, &mut integrator).unwrap();
    let _ = run([0.0, 1.0, 20.0], [0.9, 0.0, -1.0], &bh, &mut integrator).unwrap();
    let again = run([0.0, 3.0, 12.0], [0.4, 0.0, -1.0], &bh, &mut integrator).unwrap();
    assert_eq!(first, again);
    if let Integrator::Adaptive(inner) = &integrator {
        assert!(inner.workspace().is_clear());
    }
}

#[test]
fn black_hole_offset_moves_the_scene() {
    // Same geometry as the far-sky case, shifted by (5, -2, 7).
    let shift = Vector3::new(5.0, -2.0, 7.0);
    let mut bh = blackhole(4.0, 10.0);
    bh.position = shift;
    let mut integrator = Integrator::new(IntegrationMethod::Adaptive);
    let shifted = trace(
        Vector3::new(0.9, 0.0, -1.0),
        &bh,
        Vector3::new(0.0, 1.0, 20.0) + shift,
        &face_coded_skybox(),
        &mut integrator,
    )
    .unwrap();
    let centred = run([0.0, 1.0, 20.0], [0.9, 0.0, -1.0], &blackhole(4.0, 10.0), &mut integrator)
        .unwrap();
    assert_eq!(shifted, centred);
}

#[test]
fn bad_inputs_are_contract_violations() {
    let bh = blackhole(4.0, 10.0);
    let mut integrator = Integrator::new(IntegrationMethod::Adaptive);

    let err = run([0.0, 0.0, 2.5], [0.0, 0.0, -1.0], &bh, &mut integrator).unwrap_err();
    assert!(matches!(err, TraceError::Scene(SceneError::CameraTooClose { .. })));
    assert_eq!(err.severity(), Severity::ContractViolation);

    let err = run([0.0, 3.0, 12.0], [0.0, 0.0, 0.0], &bh, &mut integrator).unwrap_err();
    assert_eq!(err, TraceError::DegenerateDirection);
    assert_eq!(err.severity(), Severity::ContractViolation);

    let stalled = TraceError::from(IntegrationError::NoConvergence {
        method: IntegrationMethod::Adaptive,
        estimated_error: 1.0,
    });
    assert_eq!(stalled.severity(), Severity::NonConvergence);
}
