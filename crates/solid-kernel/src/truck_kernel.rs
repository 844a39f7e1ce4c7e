//! Geometry kernel backed by the truck B-rep crates.

use std::collections::{HashMap, HashSet};

use truck_modeling::builder;
use truck_modeling::topology::Solid;
use truck_modeling::{EuclideanSpace, Matrix4, Point3, Rad, Vector3};
use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModel};
use tracing::{debug, trace};

use crate::primitives;
use crate::tessellation;
use crate::traits::{Kernel, KernelIntrospect};
use crate::transform::Transform;
use crate::types::*;

/// Boolean tolerance handed to truck-shapeops.
const BOOLEAN_TOLERANCE: f64 = 0.05;

/// Chord tolerance used when sampling a solid for its bounds.
const BOUNDS_TOLERANCE: f64 = 0.01;

/// Real geometry kernel backed by the truck BREP library.
pub struct TruckKernel {
    next_handle: u64,
    solids: HashMap<u64, Solid>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
        }
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> ShapeId {
        let id = ShapeId::from_raw(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(id.raw(), solid);
        id
    }

    pub(crate) fn get_solid(&self, shape: ShapeId) -> Result<&Solid, KernelError> {
        self.solids
            .get(&shape.raw())
            .ok_or(KernelError::ShapeNotFound { id: shape })
    }

    /// Number of unique edges of a solid, counted in shell order.
    fn edge_count(solid: &Solid) -> usize {
        let mut seen = HashSet::new();
        solid
            .boundaries()
            .iter()
            .flat_map(|shell| shell.edge_iter())
            .filter(|edge| seen.insert(edge.id()))
            .count()
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn vector(v: [f64; 3]) -> Vector3 {
    Vector3::new(v[0], v[1], v[2])
}

impl Kernel for TruckKernel {
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<ShapeId, KernelError> {
        Ok(self.store_solid(primitives::make_box(dx, dy, dz)))
    }

    fn make_sphere(&mut self, radius: f64) -> Result<ShapeId, KernelError> {
        let solid = primitives::make_sphere(radius)?;
        Ok(self.store_solid(solid))
    }

    fn make_cylinder(&mut self, radius: f64, height: f64) -> Result<ShapeId, KernelError> {
        let solid = primitives::make_cylinder(radius, height)?;
        Ok(self.store_solid(solid))
    }

    fn transform(
        &mut self,
        shape: ShapeId,
        transform: &Transform,
    ) -> Result<ShapeId, KernelError> {
        let solid = self.get_solid(shape)?;
        let moved = match *transform {
            Transform::Translation(d) => builder::translated(solid, vector(d)),
            Transform::Rotation { axis, angle } => {
                builder::rotated(solid, Point3::origin(), vector(axis.unit()), Rad(angle))
            }
            Transform::UniformScale(f) => {
                builder::scaled(solid, Point3::origin(), Vector3::new(f, f, f))
            }
            Transform::Affine(m) => {
                // cgmath matrices are column-major
                #[rustfmt::skip]
                let mat = Matrix4::new(
                    m[0][0], m[1][0], m[2][0], 0.0,
                    m[0][1], m[1][1], m[2][1], 0.0,
                    m[0][2], m[1][2], m[2][2], 0.0,
                    m[0][3], m[1][3], m[2][3], 1.0,
                );
                builder::transformed(solid, mat)
            }
        };
        Ok(self.store_solid(moved))
    }

    fn boolean_union(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError> {
        let solid_a = self.get_solid(a)?;
        let solid_b = self.get_solid(b)?;

        let result = truck_shapeops::or(solid_a, solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            debug!(%a, %b, "truck union failed");
            KernelError::BooleanFailed {
                reason: "truck or() returned None".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn boolean_subtract(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError> {
        let solid_a = self.get_solid(a)?;
        let mut solid_b = self.get_solid(b)?.clone();

        // Subtraction = A ∩ ¬B. not() mutates in place.
        solid_b.not();
        let result = truck_shapeops::and(solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            debug!(%a, %b, "truck subtraction failed");
            KernelError::BooleanFailed {
                reason: "truck and() returned None for subtraction".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn boolean_intersect(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError> {
        let solid_a = self.get_solid(a)?;
        let solid_b = self.get_solid(b)?;

        let result = truck_shapeops::and(solid_a, solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            debug!(%a, %b, "truck intersection failed");
            KernelError::BooleanFailed {
                reason: "truck and() returned None".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn fillet_edges(
        &mut self,
        shape: ShapeId,
        edges: &[EdgeId],
        _radius: f64,
    ) -> Result<ShapeId, KernelError> {
        let count = Self::edge_count(self.get_solid(shape)?);
        if let Some(&edge) = edges
            .iter()
            .find(|e| e.shape != shape || e.index as usize >= count)
        {
            return Err(KernelError::EdgeNotFound { edge });
        }
        Err(KernelError::NotSupported {
            operation: "fillet_edges".to_string(),
        })
    }

    fn tessellate(&mut self, shape: ShapeId, tolerance: f64) -> Result<RenderMesh, KernelError> {
        tessellation::tessellate_solid(self.get_solid(shape)?, tolerance)
    }

    fn write_step(&mut self, shape: ShapeId) -> Result<String, KernelError> {
        let compressed = self.get_solid(shape)?.compress();
        let step = CompleteStepDisplay::new(
            StepModel::from(&compressed),
            StepHeaderDescriptor {
                organization_system: "solid-kernel".to_owned(),
                ..Default::default()
            },
        )
        .to_string();
        if step.is_empty() {
            return Err(KernelError::StepWriteFailed {
                reason: "empty STEP document".to_string(),
            });
        }
        Ok(step)
    }

    fn release(&mut self, shape: ShapeId) {
        if self.solids.remove(&shape.raw()).is_some() {
            trace!(%shape, live = self.solids.len(), "released");
        }
    }
}

impl KernelIntrospect for TruckKernel {
    fn explore_edges(&self, shape: ShapeId) -> Result<Vec<EdgeId>, KernelError> {
        let count = Self::edge_count(self.get_solid(shape)?);
        Ok((0..count as u32).map(|i| EdgeId::new(shape, i)).collect())
    }

    /// truck exposes no tangency query; every edge is reported as a crease.
    fn edge_continuity(&self, edge: EdgeId) -> Result<EdgeContinuity, KernelError> {
        let count = Self::edge_count(self.get_solid(edge.shape)?);
        if edge.index as usize >= count {
            return Err(KernelError::EdgeNotFound { edge });
        }
        Ok(EdgeContinuity::Sharp)
    }

    fn bounding_box(&self, shape: ShapeId) -> Result<BoundingBox, KernelError> {
        let solid = self.get_solid(shape)?;
        let samples = tessellation::sample_positions(solid, BOUNDS_TOLERANCE);
        if samples.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: format!("{shape} has no sample points"),
            });
        }
        Ok(BoundingBox::from_points(&samples))
    }

    fn live_shapes(&self) -> usize {
        self.solids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Axis;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_box_bounds_and_edges() {
        let mut kernel = TruckKernel::new();
        let b = kernel.make_box(2.0, 3.0, 4.0).unwrap();

        let bbox = kernel.bounding_box(b).unwrap();
        assert_abs_diff_eq!(bbox.min[0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.max[1], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.max[2], 4.0, epsilon = 1e-9);

        let edges = kernel.explore_edges(b).unwrap();
        assert_eq!(edges.len(), 12);
        assert_eq!(edges[3], EdgeId::new(b, 3));
    }

    #[test]
    fn test_translate_moves_bounds() {
        let mut kernel = TruckKernel::new();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let moved = kernel
            .transform(b, &Transform::Translation([10.0, 0.0, -1.0]))
            .unwrap();

        let bbox = kernel.bounding_box(moved).unwrap();
        assert_abs_diff_eq!(bbox.min[0], 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.max[2], 0.0, epsilon = 1e-9);
        // the input survives
        assert!(kernel.bounding_box(b).is_ok());
    }

    #[test]
    fn test_rotation_about_global_origin() {
        let mut kernel = TruckKernel::new();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let moved = kernel
            .transform(b, &Transform::Translation([5.0, 0.0, 0.0]))
            .unwrap();
        let turned = kernel
            .transform(
                moved,
                &Transform::Rotation {
                    axis: Axis::Z,
                    angle: std::f64::consts::FRAC_PI_2,
                },
            )
            .unwrap();

        let bbox = kernel.bounding_box(turned).unwrap();
        assert_abs_diff_eq!(bbox.min[1], 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bbox.max[1], 6.0, epsilon = 1e-6);
    }

    #[test]
    fn test_diagonal_affine_scales_each_axis() {
        let mut kernel = TruckKernel::new();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let scaled = kernel
            .transform(b, &Transform::diagonal(1.0, 2.0, 3.0))
            .unwrap();
        let size = kernel.bounding_box(scaled).unwrap().size();
        assert_abs_diff_eq!(size[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(size[1], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(size[2], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_offset_boolean_union() {
        let mut kernel = TruckKernel::new();
        let a = kernel.make_box(10.0, 10.0, 10.0).unwrap();
        let b0 = kernel.make_box(10.0, 10.0, 10.0).unwrap();
        let b = kernel
            .transform(b0, &Transform::Translation([5.0, 5.0, 5.0]))
            .unwrap();

        let merged = kernel.boolean_union(a, b).unwrap();
        let bbox = kernel.bounding_box(merged).unwrap();
        assert_abs_diff_eq!(bbox.max[0], 15.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fillet_reports_not_supported() {
        let mut kernel = TruckKernel::new();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let edges = kernel.explore_edges(b).unwrap();
        assert!(matches!(
            kernel.fillet_edges(b, &edges, 0.1),
            Err(KernelError::NotSupported { .. })
        ));
        assert!(matches!(
            kernel.fillet_edges(b, &[EdgeId::new(b, 99)], 0.1),
            Err(KernelError::EdgeNotFound { .. })
        ));
    }

    #[test]
    fn test_write_step_box() {
        let mut kernel = TruckKernel::new();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        let step = kernel.write_step(b).unwrap();
        assert!(step.contains("ISO-10303-21"), "Should have STEP header");
        assert!(step.contains("ENDSEC"), "Should have proper STEP footer");
    }

    #[test]
    fn test_release_frees_storage() {
        let mut kernel = TruckKernel::new();
        let b = kernel.make_box(1.0, 1.0, 1.0).unwrap();
        assert_eq!(kernel.live_shapes(), 1);
        kernel.release(b);
        kernel.release(b);
        assert_eq!(kernel.live_shapes(), 0);
        assert!(matches!(
            kernel.bounding_box(b),
            Err(KernelError::ShapeNotFound { .. })
        ));
    }
}
