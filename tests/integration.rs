use rig_engine::RigEngine;
use rig_engine::geom::{Point3, Transform};
use rig_engine::rig::{Binding, RigError, RigOptions};

fn assert_point_close(actual: Point3, expected: [f64; 3], tolerance: f64) {
    let expected = Point3::from_array(expected);
    let distance = actual.distance_to(expected);
    assert!(
        distance < tolerance,
        "expected {expected:?}, got {actual:?} (distance {distance})"
    );
}

fn unit_z_points() -> Vec<[f64; 3]> {
    vec![[0.0, 0.0, 0.0], [0.0, 0.0, 1.0]]
}

fn engine_with_default_rig() -> RigEngine {
    let mut engine = RigEngine::new();
    engine.add_curve("cable", &unit_z_points(), 1).expect("curve registreert");
    engine
        .build_rig("cable", &RigOptions::default())
        .expect("rig bouwt");
    engine.evaluate().expect("rig evalueert");
    engine
}

fn joint_z_positions(engine: &RigEngine, curve: &str) -> Vec<f64> {
    engine
        .joint_world_transforms(curve)
        .expect("joints leesbaar")
        .iter()
        .map(|transform| transform.translation().z)
        .collect()
}

#[test]
fn default_build_spaces_joints_evenly_along_a_unit_curve() {
    let engine = engine_with_default_rig();
    let transforms = engine.joint_world_transforms("cable").unwrap();
    assert_eq!(transforms.len(), 10);

    assert_point_close(transforms[0].translation(), [0.0, 0.0, 0.0], 1e-4);
    assert_point_close(transforms[9].translation(), [0.0, 0.0, 1.0], 1e-4);

    let step = 1.0 / 9.0;
    for (i, transform) in transforms.iter().enumerate() {
        assert_point_close(transform.translation(), [0.0, 0.0, step * i as f64], 1e-4);
    }
}

#[test]
fn sub_range_with_edge_exemption_compresses_interior_joints() {
    let mut engine = RigEngine::new();
    engine.add_curve("cable", &unit_z_points(), 1).unwrap();
    engine
        .build_rig(
            "cable",
            &RigOptions {
                u_min: 0.25,
                u_max: 0.75,
                ..RigOptions::default()
            },
        )
        .unwrap();
    engine.evaluate().unwrap();

    let z = joint_z_positions(&engine, "cable");
    assert!(z[0].abs() < 1e-4);
    assert!((z[9] - 1.0).abs() < 1e-4);
    for (i, z) in z.iter().enumerate().take(9).skip(1) {
        assert!(
            (0.25 - 1e-4..=0.75 + 1e-4).contains(z),
            "joint {i} ligt op z {z}"
        );
    }
}

#[test]
fn controls_are_distributed_uniformly_without_sub_range() {
    let mut engine = RigEngine::new();
    engine.add_curve("cable", &unit_z_points(), 1).unwrap();
    engine
        .build_rig(
            "cable",
            &RigOptions {
                u_min: 0.25,
                u_max: 0.75,
                ..RigOptions::default()
            },
        )
        .unwrap();
    engine.evaluate().unwrap();

    let controls = engine.control_transforms("cable").unwrap();
    assert_eq!(controls.len(), 4);
    for (j, control) in controls.iter().enumerate() {
        let expected = j as f64 / 3.0;
        assert_point_close(control.translation(), [0.0, 0.0, expected], 1e-4);
    }
}

#[test]
fn stretch_ratio_is_one_at_rest() {
    let engine = engine_with_default_rig();
    assert!((engine.stretch_ratio("cable").unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn zero_stretch_amount_preserves_absolute_arclength_positions() {
    let mut engine = engine_with_default_rig();
    let before = joint_z_positions(&engine, "cable");

    // Curve naar dubbele lengte; de weging staat standaard op 0.
    engine
        .set_curve_points("cable", &[[0.0, 0.0, 0.0], [0.0, 0.0, 2.0]])
        .unwrap();
    engine.evaluate().unwrap();

    let ratio = engine.stretch_ratio("cable").unwrap();
    assert!((ratio - 0.5).abs() < 1e-6, "ratio was {ratio}");

    let after = joint_z_positions(&engine, "cable");
    for (i, (a, b)) in before.iter().zip(&after).enumerate() {
        assert!((a - b).abs() < 1e-4, "joint {i} verschoof van {a} naar {b}");
    }
}

#[test]
fn full_stretch_amount_scales_positions_with_the_curve() {
    let mut engine = engine_with_default_rig();
    engine.set_stretch_amount("cable", 1.0).unwrap();
    engine
        .set_curve_points("cable", &[[0.0, 0.0, 0.0], [0.0, 0.0, 2.0]])
        .unwrap();
    engine.evaluate().unwrap();

    assert!((engine.stretch_ratio("cable").unwrap() - 1.0).abs() < 1e-9);

    let z = joint_z_positions(&engine, "cable");
    let step = 2.0 / 9.0;
    for (i, z) in z.iter().enumerate() {
        assert!(
            (z - step * i as f64).abs() < 1e-4,
            "joint {i} ligt op z {z}"
        );
    }
}

#[test]
fn slide_shifts_every_joint_by_the_same_distance() {
    let mut engine = engine_with_default_rig();
    let before = joint_z_positions(&engine, "cable");

    engine.set_slide_amount("cable", 0.1).unwrap();
    engine.evaluate().unwrap();
    let after = joint_z_positions(&engine, "cable");

    // Alles behalve het eindpunt schuift exact de slide-afstand op; het
    // laatste punt klemt op het einde van de curve.
    for (i, (a, b)) in before.iter().zip(&after).enumerate().take(9) {
        assert!(
            (b - a - 0.1).abs() < 1e-4,
            "joint {i} schoof {} in plaats van 0.1",
            b - a
        );
    }
    assert!((after[9] - 1.0).abs() < 1e-4);
}

#[test]
fn negative_slide_shifts_joints_backwards() {
    let mut engine = engine_with_default_rig();
    engine.set_slide_amount("cable", -0.2).unwrap();
    engine.evaluate().unwrap();

    let z = joint_z_positions(&engine, "cable");
    assert!(z[0].abs() < 1e-4, "begin klemt op de curve");
    assert!((z[9] - 0.8).abs() < 1e-4);
}

#[test]
fn repeated_evaluation_is_bit_identical() {
    let mut engine = engine_with_default_rig();
    let first = engine.rig_export("cable").unwrap();

    engine.evaluate().unwrap();
    let second = engine.rig_export("cable").unwrap();
    assert_eq!(first, second);
}

#[test]
fn incremental_evaluation_matches_a_fresh_full_evaluation() {
    // Incrementeel pad: bouw, evalueer, wijzig alleen de slide.
    let mut incremental = engine_with_default_rig();
    incremental.set_slide_amount("cable", 0.05).unwrap();
    incremental.evaluate().unwrap();

    // Verspad: zelfde toestand, maar in één volledige evaluatie.
    let mut full = RigEngine::new();
    full.add_curve("cable", &unit_z_points(), 1).unwrap();
    full.build_rig("cable", &RigOptions::default()).unwrap();
    full.set_slide_amount("cable", 0.05).unwrap();
    full.evaluate().unwrap();

    assert_eq!(
        incremental.rig_export("cable").unwrap(),
        full.rig_export("cable").unwrap()
    );
}

#[test]
fn joint_chain_locals_compose_back_to_world() {
    let engine = engine_with_default_rig();
    let world = engine.joint_world_transforms("cable").unwrap();
    let locals = engine.joint_local_transforms("cable").unwrap();

    let mut accumulated = Transform::identity();
    for (joint_world, joint_local) in world.iter().zip(&locals) {
        accumulated = accumulated.compose(joint_local);
        let expected = joint_world.translation();
        assert_point_close(accumulated.translation(), expected.to_array(), 1e-9);
    }
}

#[test]
fn joints_follow_a_bent_curve() {
    let mut engine = RigEngine::new();
    engine
        .add_curve(
            "hoek",
            &[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0]],
            1,
        )
        .unwrap();
    engine.build_rig("hoek", &RigOptions::default()).unwrap();
    engine.evaluate().unwrap();

    // Elke joint hoort dicht bij het L-vormige pad te liggen.
    for transform in engine.joint_world_transforms("hoek").unwrap() {
        let p = transform.translation();
        let on_first_leg = p.x.abs() < 0.05 && (0.0..=1.05).contains(&p.z);
        let on_second_leg = (p.z - 1.0).abs() < 0.05 && (-0.05..=1.05).contains(&p.x);
        assert!(
            on_first_leg || on_second_leg,
            "joint ligt naast het pad: {p:?}"
        );
    }
}

#[test]
fn building_twice_on_the_same_curve_collides() {
    let mut engine = RigEngine::new();
    engine.add_curve("cable", &unit_z_points(), 1).unwrap();
    engine.build_rig("cable", &RigOptions::default()).unwrap();

    let err = engine
        .build_rig("cable", &RigOptions::default())
        .unwrap_err();
    assert!(matches!(err, RigError::NameCollision(_)));
}

#[test]
fn invalid_counts_are_rejected() {
    let mut engine = RigEngine::new();
    engine.add_curve("cable", &unit_z_points(), 1).unwrap();

    for options in [
        RigOptions {
            joint_count: 1,
            ..RigOptions::default()
        },
        RigOptions {
            control_count: 0,
            ..RigOptions::default()
        },
        RigOptions {
            strip_width: -1.0,
            ..RigOptions::default()
        },
    ] {
        let err = engine.build_rig("cable", &options).unwrap_err();
        assert!(matches!(err, RigError::InvalidInput(_)));
    }
}

#[test]
fn wire_geometry_requires_an_existing_rig() {
    let mut engine = RigEngine::new();
    let err = engine.wire_geometry("spook", "geo").unwrap_err();
    assert!(matches!(err, RigError::NotFound { .. }));
}

#[test]
fn wire_geometry_records_a_binding_on_an_existing_rig() {
    let mut engine = engine_with_default_rig();
    engine.wire_geometry("cable", "cable_geo").unwrap();

    let rig = engine.rig("cable").unwrap();
    assert!(rig.bindings.iter().any(|binding| matches!(
        binding,
        Binding::Wire { target, .. } if target == "cable_geo"
    )));
}

#[test]
fn bindings_describe_who_drives_what() {
    let engine = engine_with_default_rig();
    let rig = engine.rig("cable").unwrap();

    // Stripjoints dragen de surface, skinjoints dragen de herbouwde curve.
    let strip_nodes: Vec<_> = rig.strip_joints.iter().map(|j| j.node).collect();
    let skin_nodes: Vec<_> = rig.skin_joints.iter().map(|j| j.node).collect();
    assert!(rig.bindings.iter().any(|binding| matches!(
        binding,
        Binding::Skin { joints, target }
            if *target == rig.internal.surface_node && *joints == strip_nodes
    )));
    assert!(rig.bindings.iter().any(|binding| matches!(
        binding,
        Binding::Skin { joints, target }
            if *target == rig.wire_curve_node && *joints == skin_nodes
    )));
}

#[test]
fn master_control_is_larger_and_carries_the_shared_state() {
    let engine = engine_with_default_rig();
    let rig = engine.rig("cable").unwrap();

    let master = rig.master_control();
    assert!(master.size > rig.controls[1].size);
    assert_eq!(rig.controls.len(), 4);

    // De kubusproxy staat symmetrisch rond de oorsprong van de control.
    let half = master.size * 0.5;
    for p in master.proxy.points() {
        assert!(p.x.abs() <= half + 1e-12);
        assert!(p.y.abs() <= half + 1e-12);
        assert!(p.z.abs() <= half + 1e-12);
    }
}

#[test]
fn moving_a_control_moves_its_strip_joint_with_it() {
    let mut engine = engine_with_default_rig();
    let control_name = engine.rig("cable").unwrap().controls[1].name.clone();

    let moved = Transform::translate(rig_engine::geom::Vec3::new(0.5, 0.25, 0.0));
    engine.set_control_transform(&control_name, moved).unwrap();
    engine.evaluate().unwrap();

    let controls = engine.control_transforms("cable").unwrap();
    assert_point_close(controls[1].translation(), [0.5, 0.25, 0.0], 1e-9);

    // De stripjoint volgt de control één-op-één; de rest blijft staan.
    let strips = engine.strip_joint_transforms("cable").unwrap();
    assert_point_close(strips[1].translation(), [0.5, 0.25, 0.0], 1e-9);
    assert_point_close(strips[0].translation(), [0.0, 0.0, 0.0], 1e-4);
}
