//! Behavior every kernel must share. Each check runs against the truck
//! kernel, the OCCT kernel when built, and the mock so the mock stays a
//! faithful stand-in.

use approx::assert_abs_diff_eq;
use solid_kernel::{
    Axis, EdgeContinuity, Kernel, KernelBundle, KernelError, KernelIntrospect, MockKernel, ShapeId,
    Transform, TruckKernel,
};

const BOUNDS_EPS: f64 = 0.05;

fn kernels() -> Vec<(&'static str, Box<dyn KernelBundle>)> {
    let mut kernels: Vec<(&'static str, Box<dyn KernelBundle>)> = vec![
        ("truck", Box::new(TruckKernel::new())),
        ("mock", Box::new(MockKernel::new())),
    ];
    #[cfg(feature = "opencascade")]
    kernels.push(("occt", Box::new(solid_kernel::OcctKernel::new())));
    kernels
}

/// Kernels with a working fillet operator.
fn filleting_kernels() -> Vec<(&'static str, Box<dyn KernelBundle>)> {
    let mut kernels: Vec<(&'static str, Box<dyn KernelBundle>)> =
        vec![("mock", Box::new(MockKernel::new()))];
    #[cfg(feature = "opencascade")]
    kernels.push(("occt", Box::new(solid_kernel::OcctKernel::new())));
    kernels
}

fn assert_bounds(kb: &dyn KernelBundle, shape: ShapeId, min: [f64; 3], max: [f64; 3], name: &str) {
    let bbox = kb.as_introspect().bounding_box(shape).unwrap();
    for axis in 0..3 {
        assert!(
            (bbox.min[axis] - min[axis]).abs() < BOUNDS_EPS,
            "{name}: min[{axis}] = {}, expected {}",
            bbox.min[axis],
            min[axis]
        );
        assert!(
            (bbox.max[axis] - max[axis]).abs() < BOUNDS_EPS,
            "{name}: max[{axis}] = {}, expected {}",
            bbox.max[axis],
            max[axis]
        );
    }
}

#[test]
fn box_sits_on_the_origin_corner() {
    for (name, mut kb) in kernels() {
        let b = kb.make_box(2.0, 3.0, 4.0).unwrap();
        assert_bounds(kb.as_ref(), b, [0.0; 3], [2.0, 3.0, 4.0], name);
        assert_eq!(kb.as_introspect().explore_edges(b).unwrap().len(), 12, "{name}");
    }
}

#[test]
fn cylinder_base_is_on_z_zero() {
    for (name, mut kb) in kernels() {
        let c = kb.make_cylinder(1.0, 5.0).unwrap();
        assert_bounds(kb.as_ref(), c, [-1.0, -1.0, 0.0], [1.0, 1.0, 5.0], name);
    }
}

#[test]
fn sphere_is_centered() {
    for (name, mut kb) in kernels() {
        let s = kb.make_sphere(2.0).unwrap();
        assert_bounds(kb.as_ref(), s, [-2.0; 3], [2.0; 3], name);
    }
}

#[test]
fn transforms_produce_new_shapes_and_keep_inputs() {
    for (name, mut kb) in kernels() {
        let b = kb.make_box(1.0, 1.0, 1.0).unwrap();
        let moved = kb
            .transform(b, &Transform::Translation([5.0, 0.0, 0.0]))
            .unwrap();
        let turned = kb
            .transform(
                b,
                &Transform::Rotation {
                    axis: Axis::Z,
                    angle: std::f64::consts::FRAC_PI_2,
                },
            )
            .unwrap();
        let stretched = kb.transform(b, &Transform::diagonal(2.0, 1.0, 3.0)).unwrap();

        assert_ne!(moved, b, "{name}");
        assert_eq!(kb.live_shapes(), 4, "{name}");
        assert_bounds(kb.as_ref(), b, [0.0; 3], [1.0; 3], name);
        assert_bounds(kb.as_ref(), moved, [5.0, 0.0, 0.0], [6.0, 1.0, 1.0], name);
        assert_bounds(kb.as_ref(), turned, [-1.0, 0.0, 0.0], [0.0, 1.0, 1.0], name);
        assert_bounds(kb.as_ref(), stretched, [0.0; 3], [2.0, 1.0, 3.0], name);
    }
}

#[test]
fn release_frees_storage_and_tolerates_repeats() {
    for (name, mut kb) in kernels() {
        let b = kb.make_box(1.0, 1.0, 1.0).unwrap();
        kb.release(b);
        kb.release(b);
        assert_eq!(kb.live_shapes(), 0, "{name}");
        assert!(
            matches!(
                kb.as_introspect().bounding_box(b),
                Err(KernelError::ShapeNotFound { .. })
            ),
            "{name}"
        );
    }
}

#[test]
fn overlapping_union_spans_both_inputs() {
    for (name, mut kb) in kernels() {
        let a = kb.make_box(1.0, 1.0, 1.0).unwrap();
        let b = kb.make_box(1.0, 1.0, 1.0).unwrap();
        let b = kb
            .transform(b, &Transform::Translation([0.5, 0.5, 0.5]))
            .unwrap();
        let u = kb.boolean_union(a, b).unwrap();
        assert_bounds(kb.as_ref(), u, [0.0; 3], [1.5; 3], name);
    }
}

#[test]
fn tessellation_is_indexed_triangles() {
    for (name, mut kb) in kernels() {
        let b = kb.make_box(1.0, 2.0, 3.0).unwrap();
        let mesh = kb.tessellate(b, 0.05).unwrap();
        assert!(mesh.triangle_count() >= 12, "{name}");
        assert_eq!(mesh.indices.len() % 3, 0, "{name}");
        let vertex_count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < vertex_count), "{name}");
    }
}

#[test]
fn step_text_is_an_exchange_file() {
    for (name, mut kb) in kernels() {
        let b = kb.make_box(1.0, 1.0, 1.0).unwrap();
        let text = kb.write_step(b).unwrap();
        assert!(text.starts_with("ISO-10303-21;"), "{name}");
        assert!(text.contains("END-ISO-10303-21;"), "{name}");
    }
}

#[test]
fn box_edges_are_creases() {
    for (name, mut kb) in kernels() {
        let b = kb.make_box(1.0, 1.0, 1.0).unwrap();
        let introspect = kb.as_introspect();
        for edge in introspect.explore_edges(b).unwrap() {
            assert_eq!(
                introspect.edge_continuity(edge).unwrap(),
                EdgeContinuity::Sharp,
                "{name}"
            );
        }
    }
}

#[test]
fn mock_fillet_rounds_selected_creases() {
    let mut kernel = MockKernel::new();
    let b = kernel.make_box(10.0, 10.0, 10.0).unwrap();
    let edges = kernel.explore_edges(b).unwrap();
    let rounded = kernel.fillet_edges(b, &edges[..2], 1.0).unwrap();

    let after = kernel.explore_edges(rounded).unwrap();
    assert_eq!(after.len(), 12 + 4);
    let smooth = after
        .iter()
        .filter(|e| kernel.edge_continuity(**e).unwrap() == EdgeContinuity::Smooth)
        .count();
    assert_eq!(smooth, 2 + 4);
    assert_abs_diff_eq!(kernel.bounding_box(rounded).unwrap().max[0], 10.0, epsilon = 1e-12);
}

#[test]
fn truck_fillet_is_reported_unsupported() {
    let mut kernel = TruckKernel::new();
    let b = kernel.make_box(10.0, 10.0, 10.0).unwrap();
    let edges = kernel.explore_edges(b).unwrap();
    assert!(matches!(
        kernel.fillet_edges(b, &edges, 1.0),
        Err(KernelError::NotSupported { .. })
    ));
}

#[test]
fn fillet_all_and_by_index_on_a_ten_box() {
    for (name, mut kb) in filleting_kernels() {
        let b = kb.make_box(10.0, 10.0, 10.0).unwrap();
        let edges = kb.as_introspect().explore_edges(b).unwrap();

        let all = kb.fillet_edges(b, &edges, 1.0).unwrap();
        let some = kb.fillet_edges(b, &edges[..3], 1.0).unwrap();

        let introspect = kb.as_introspect();
        assert!(introspect.explore_edges(all).unwrap().len() > 12, "{name}");
        assert!(introspect.explore_edges(some).unwrap().len() > 12, "{name}");
        assert!(
            introspect
                .explore_edges(all)
                .unwrap()
                .into_iter()
                .any(|e| introspect.edge_continuity(e).unwrap() == EdgeContinuity::Smooth),
            "{name}"
        );
        assert_bounds(kb.as_ref(), all, [0.0; 3], [10.0; 3], name);
        // input stays alive next to both results
        assert_eq!(kb.live_shapes(), 3, "{name}");
    }
}

#[test]
fn fillet_with_an_edge_of_another_shape_fails() {
    for (name, mut kb) in filleting_kernels() {
        let a = kb.make_box(10.0, 10.0, 10.0).unwrap();
        let b = kb.make_box(10.0, 10.0, 10.0).unwrap();
        let foreign = kb.as_introspect().explore_edges(b).unwrap();
        assert!(kb.fillet_edges(a, &foreign[..1], 1.0).is_err(), "{name}");
        assert_eq!(kb.live_shapes(), 2, "{name}");
    }
}
