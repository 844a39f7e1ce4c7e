//! truck solids for the kernel primitives.
//!
//! truck has no built-in box, cylinder or sphere; each one is a chain of sweeps.

use std::f64::consts::PI;
use truck_modeling::builder;
use truck_modeling::topology::{Edge, Solid, Wire};
use truck_modeling::{EuclideanSpace, Point3, Rad, Vector3};

use crate::types::KernelError;

/// Create a box solid via successive translational sweeps.
/// Origin at (0,0,0), extends to (dx,dy,dz).
pub fn make_box(dx: f64, dy: f64, dz: f64) -> Solid {
    let v = builder::vertex(Point3::new(0.0, 0.0, 0.0));
    let edge = builder::tsweep(&v, Vector3::new(dx, 0.0, 0.0));
    let face = builder::tsweep(&edge, Vector3::new(0.0, dy, 0.0));
    builder::tsweep(&face, Vector3::new(0.0, 0.0, dz))
}

/// Create a cylinder solid: circle wire → face → translational sweep.
/// Base centered at origin in XY plane, extending along +Z.
pub fn make_cylinder(radius: f64, height: f64) -> Result<Solid, KernelError> {
    let v = builder::vertex(Point3::new(radius, 0.0, 0.0));
    let wire = builder::rsweep(&v, Point3::origin(), Vector3::unit_z(), Rad(2.0 * PI));
    let face = builder::try_attach_plane(&[wire]).map_err(|e| KernelError::ConstructionFailed {
        reason: format!("circular cap: {e}"),
    })?;
    Ok(builder::tsweep(&face, Vector3::new(0.0, 0.0, height)))
}

/// Create a sphere solid centered on the origin.
///
/// A half-disc profile in the XZ plane, bounded by a meridian arc and the
/// segment of the Z axis between the poles, revolved a full turn about Z.
pub fn make_sphere(radius: f64) -> Result<Solid, KernelError> {
    let north = builder::vertex(Point3::new(0.0, 0.0, radius));
    // Through (r, 0, 0) down to the south pole
    let mut profile: Wire = builder::rsweep(&north, Point3::origin(), Vector3::unit_y(), Rad(PI));

    let (Some(top), Some(bottom)) = (profile.front_vertex(), profile.back_vertex()) else {
        return Err(KernelError::ConstructionFailed {
            reason: "meridian arc has no end vertices".to_string(),
        });
    };
    let axis_edge: Edge = builder::line(bottom, top);
    profile.push_back(axis_edge);

    let face = builder::try_attach_plane(&[profile]).map_err(|e| KernelError::ConstructionFailed {
        reason: format!("half-disc profile: {e}"),
    })?;

    Ok(builder::rsweep(
        &face,
        Point3::origin(),
        Vector3::unit_z(),
        Rad(2.0 * PI),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_bounds(solid: &Solid) -> ([f64; 3], [f64; 3]) {
        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for shell in solid.boundaries() {
            for v in shell.vertex_iter() {
                let p = v.point();
                for i in 0..3 {
                    min[i] = min[i].min(p[i]);
                    max[i] = max[i].max(p[i]);
                }
            }
        }
        (min, max)
    }

    #[test]
    fn test_make_box_topology() {
        let solid = make_box(1.0, 2.0, 3.0);

        let boundaries = solid.boundaries();
        assert_eq!(boundaries.len(), 1, "Box should have 1 shell");

        let shell = &boundaries[0];
        let faces: Vec<_> = shell.face_iter().collect();

        let mut edge_ids = std::collections::HashSet::new();
        for edge in shell.edge_iter() {
            edge_ids.insert(edge.id());
        }
        let mut vert_ids = std::collections::HashSet::new();
        for v in shell.vertex_iter() {
            vert_ids.insert(v.id());
        }

        assert_eq!(faces.len(), 6, "Box should have 6 faces");
        assert_eq!(edge_ids.len(), 12, "Box should have 12 edges");
        assert_eq!(vert_ids.len(), 8, "Box should have 8 vertices");
    }

    #[test]
    fn test_make_box_corner_at_origin() {
        let (min, max) = vertex_bounds(&make_box(2.0, 3.0, 4.0));
        let eps = 1e-10;
        for i in 0..3 {
            assert!(min[i].abs() < eps, "min corner should sit on the origin");
        }
        assert!((max[0] - 2.0).abs() < eps);
        assert!((max[1] - 3.0).abs() < eps);
        assert!((max[2] - 4.0).abs() < eps);
    }

    #[test]
    fn test_make_cylinder_spans_base_to_height() {
        let solid = make_cylinder(1.0, 2.0).unwrap();
        assert_eq!(solid.boundaries().len(), 1, "Cylinder should have 1 shell");

        let faces: Vec<_> = solid.boundaries()[0].face_iter().collect();
        assert!(faces.len() >= 3, "Cylinder should have at least 3 faces");

        let (min, max) = vertex_bounds(&solid);
        assert!(min[2].abs() < 1e-10);
        assert!((max[2] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_make_sphere_has_one_shell() {
        let solid = make_sphere(1.5).unwrap();
        assert_eq!(solid.boundaries().len(), 1);
    }

    #[test]
    fn test_make_sphere_poles_on_z_axis() {
        let (min, max) = vertex_bounds(&make_sphere(1.5).unwrap());
        assert!((max[2] - 1.5).abs() < 1e-10);
        assert!((min[2] + 1.5).abs() < 1e-10);
    }
}
