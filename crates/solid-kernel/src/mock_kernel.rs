//! Deterministic test double implementing Kernel and KernelIntrospect.
//!
//! Solids are sampled point clouds with an explicit edge table. Transforms
//! move the samples exactly, so bounds are real; booleans and fillets are
//! topological approximations with predictable edge counts. Every kernel call
//! is appended to a log that tests can inspect.

use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::traits::{Kernel, KernelIntrospect};
use crate::transform::Transform;
use crate::types::*;

/// Number of segments used to sample circular outlines.
const CIRCLE_SEGMENTS: usize = 16;

/// A recorded kernel call.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelCall {
    MakeBox([f64; 3]),
    MakeSphere(f64),
    MakeCylinder { radius: f64, height: f64 },
    Transform(Transform),
    Union,
    Subtract,
    Intersect,
    Fillet { edges: Vec<u32>, radius: f64 },
    Tessellate,
    WriteStep,
    Release(ShapeId),
}

/// A synthetic solid.
#[derive(Debug, Clone)]
struct MockSolid {
    /// Points on the surface; bounds are computed from these.
    samples: Vec<[f64; 3]>,
    /// Edge table in traversal order.
    edges: Vec<EdgeContinuity>,
    faces: usize,
}

impl MockSolid {
    fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.samples)
    }

    fn cuboid(bbox: &BoundingBox) -> Self {
        Self {
            samples: bbox.corners().to_vec(),
            edges: vec![EdgeContinuity::Sharp; 12],
            faces: 6,
        }
    }
}

/// Deterministic test double for the geometry kernel.
pub struct MockKernel {
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    calls: Vec<KernelCall>,
    fail_booleans: bool,
    step_supported: bool,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            solids: HashMap::new(),
            calls: Vec::new(),
            fail_booleans: false,
            step_supported: true,
        }
    }

    /// A kernel whose boolean operations always fail.
    pub fn failing_booleans() -> Self {
        Self {
            fail_booleans: true,
            ..Self::new()
        }
    }

    /// A kernel built without STEP support.
    pub fn without_step() -> Self {
        Self {
            step_supported: false,
            ..Self::new()
        }
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> &[KernelCall] {
        &self.calls
    }

    /// Only the transforms applied so far, oldest first.
    pub fn transforms(&self) -> Vec<Transform> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                KernelCall::Transform(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn store(&mut self, solid: MockSolid) -> ShapeId {
        let id = ShapeId::from_raw(self.next_handle);
        self.next_handle += 1;
        self.solids.insert(id.raw(), solid);
        id
    }

    fn get(&self, shape: ShapeId) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&shape.raw())
            .ok_or(KernelError::ShapeNotFound { id: shape })
    }

    fn check_boolean(&self, a: ShapeId, b: ShapeId) -> Result<(MockSolid, MockSolid), KernelError> {
        let solid_a = self.get(a)?.clone();
        let solid_b = self.get(b)?.clone();
        if self.fail_booleans {
            return Err(KernelError::BooleanFailed {
                reason: "mock kernel configured to fail booleans".to_string(),
            });
        }
        Ok((solid_a, solid_b))
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample points on a circle of `radius` at height `z`, starting on +X.
fn circle(radius: f64, z: f64) -> impl Iterator<Item = [f64; 3]> {
    (0..CIRCLE_SEGMENTS).map(move |i| {
        let t = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
        [radius * t.cos(), radius * t.sin(), z]
    })
}

impl Kernel for MockKernel {
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<ShapeId, KernelError> {
        self.calls.push(KernelCall::MakeBox([dx, dy, dz]));
        let bbox = BoundingBox::from_points(&[[0.0; 3], [dx, dy, dz]]);
        Ok(self.store(MockSolid::cuboid(&bbox)))
    }

    fn make_sphere(&mut self, radius: f64) -> Result<ShapeId, KernelError> {
        self.calls.push(KernelCall::MakeSphere(radius));
        if radius <= 0.0 {
            return Err(KernelError::ConstructionFailed {
                reason: format!("sphere radius must be positive, got {radius}"),
            });
        }
        let mut samples: Vec<[f64; 3]> = circle(radius, 0.0).collect();
        samples.push([0.0, 0.0, radius]);
        samples.push([0.0, 0.0, -radius]);
        // One seam edge; a sphere has no creases
        Ok(self.store(MockSolid {
            samples,
            edges: vec![EdgeContinuity::Smooth],
            faces: 1,
        }))
    }

    fn make_cylinder(&mut self, radius: f64, height: f64) -> Result<ShapeId, KernelError> {
        self.calls.push(KernelCall::MakeCylinder { radius, height });
        if radius <= 0.0 {
            return Err(KernelError::ConstructionFailed {
                reason: format!("cylinder radius must be positive, got {radius}"),
            });
        }
        let samples = circle(radius, 0.0).chain(circle(radius, height)).collect();
        // Bottom rim, top rim, side seam
        Ok(self.store(MockSolid {
            samples,
            edges: vec![
                EdgeContinuity::Sharp,
                EdgeContinuity::Sharp,
                EdgeContinuity::Smooth,
            ],
            faces: 3,
        }))
    }

    fn transform(
        &mut self,
        shape: ShapeId,
        transform: &Transform,
    ) -> Result<ShapeId, KernelError> {
        self.calls.push(KernelCall::Transform(*transform));
        let source = self.get(shape)?;
        let moved = MockSolid {
            samples: source.samples.iter().map(|p| transform.apply(*p)).collect(),
            edges: source.edges.clone(),
            faces: source.faces,
        };
        Ok(self.store(moved))
    }

    fn boolean_union(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError> {
        self.calls.push(KernelCall::Union);
        let (mut solid_a, solid_b) = self.check_boolean(a, b)?;
        solid_a.samples.extend(solid_b.samples);
        solid_a.edges.extend(solid_b.edges);
        solid_a.faces += solid_b.faces;
        Ok(self.store(solid_a))
    }

    fn boolean_subtract(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError> {
        self.calls.push(KernelCall::Subtract);
        let (mut solid_a, solid_b) = self.check_boolean(a, b)?;
        // A disjoint tool leaves A untouched; otherwise the cut adds the
        // tool's edges and faces to A without growing its bounds.
        if solid_a.bounds().intersection(&solid_b.bounds()).is_some() {
            solid_a.edges.extend(solid_b.edges);
            solid_a.faces += solid_b.faces;
        }
        Ok(self.store(solid_a))
    }

    fn boolean_intersect(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError> {
        self.calls.push(KernelCall::Intersect);
        let (solid_a, solid_b) = self.check_boolean(a, b)?;
        let common = solid_a
            .bounds()
            .intersection(&solid_b.bounds())
            .ok_or_else(|| KernelError::BooleanFailed {
                reason: "solids do not overlap".to_string(),
            })?;
        Ok(self.store(MockSolid::cuboid(&common)))
    }

    fn fillet_edges(
        &mut self,
        shape: ShapeId,
        edges: &[EdgeId],
        radius: f64,
    ) -> Result<ShapeId, KernelError> {
        self.calls.push(KernelCall::Fillet {
            edges: edges.iter().map(|e| e.index).collect(),
            radius,
        });
        if radius <= 0.0 {
            return Err(KernelError::FilletFailed {
                reason: "radius must be positive".to_string(),
            });
        }
        if edges.is_empty() {
            return Err(KernelError::FilletFailed {
                reason: "no edges added to fillet".to_string(),
            });
        }

        let mut result = self.get(shape)?.clone();
        let thinnest = result
            .bounds()
            .size()
            .into_iter()
            .fold(f64::INFINITY, f64::min);
        if 2.0 * radius >= thinnest {
            return Err(KernelError::FilletFailed {
                reason: format!("radius {radius} too large for a solid {thinnest} thick"),
            });
        }

        for edge in edges {
            let slot = result
                .edges
                .get_mut(edge.index as usize)
                .filter(|_| edge.shape == shape)
                .ok_or(KernelError::EdgeNotFound { edge: *edge })?;
            if *slot == EdgeContinuity::Smooth {
                return Err(KernelError::FilletFailed {
                    reason: format!("edge {} is not a crease", edge.index),
                });
            }
            // The crease becomes a blend surface bounded by two tangent edges
            *slot = EdgeContinuity::Smooth;
        }
        let blended = edges.len();
        result
            .edges
            .extend(std::iter::repeat(EdgeContinuity::Smooth).take(2 * blended));
        result.faces += blended;

        Ok(self.store(result))
    }

    fn tessellate(&mut self, shape: ShapeId, _tolerance: f64) -> Result<RenderMesh, KernelError> {
        self.calls.push(KernelCall::Tessellate);
        let corners = self.get(shape)?.bounds().corners();

        // Six quads over the bounds, two triangles each.
        let quads: [([usize; 4], [f32; 3]); 6] = [
            ([0, 3, 2, 1], [0.0, 0.0, -1.0]),
            ([4, 5, 6, 7], [0.0, 0.0, 1.0]),
            ([0, 1, 5, 4], [0.0, -1.0, 0.0]),
            ([2, 3, 7, 6], [0.0, 1.0, 0.0]),
            ([0, 4, 7, 3], [-1.0, 0.0, 0.0]),
            ([1, 2, 6, 5], [1.0, 0.0, 0.0]),
        ];

        let mut mesh = RenderMesh::default();
        for (face_index, (quad, normal)) in quads.iter().enumerate() {
            let start_index = mesh.indices.len() as u32;
            let base = mesh.vertex_count() as u32;
            for &corner in quad {
                let p = corners[corner];
                mesh.vertices
                    .extend_from_slice(&[p[0] as f32, p[1] as f32, p[2] as f32]);
                mesh.normals.extend_from_slice(normal);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
            mesh.face_ranges.push(FaceRange {
                face_index: face_index as u32,
                start_index,
                end_index: mesh.indices.len() as u32,
            });
        }
        Ok(mesh)
    }

    fn write_step(&mut self, shape: ShapeId) -> Result<String, KernelError> {
        self.calls.push(KernelCall::WriteStep);
        if !self.step_supported {
            return Err(KernelError::NotSupported {
                operation: "write_step".to_string(),
            });
        }
        let solid = self.get(shape)?;
        let bbox = solid.bounds();
        Ok(format!(
            "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION(('mock'),'2;1');\nENDSEC;\nDATA;\n\
             #1=MANIFOLD_SOLID_BREP('',#2);\n/* faces={} edges={} min={:?} max={:?} */\n\
             ENDSEC;\nEND-ISO-10303-21;\n",
            solid.faces,
            solid.edges.len(),
            bbox.min,
            bbox.max
        ))
    }

    fn release(&mut self, shape: ShapeId) {
        self.calls.push(KernelCall::Release(shape));
        self.solids.remove(&shape.raw());
    }
}

impl KernelIntrospect for MockKernel {
    fn explore_edges(&self, shape: ShapeId) -> Result<Vec<EdgeId>, KernelError> {
        let solid = self.get(shape)?;
        Ok((0..solid.edges.len() as u32)
            .map(|i| EdgeId::new(shape, i))
            .collect())
    }

    fn edge_continuity(&self, edge: EdgeId) -> Result<EdgeContinuity, KernelError> {
        self.get(edge.shape)?
            .edges
            .get(edge.index as usize)
            .copied()
            .ok_or(KernelError::EdgeNotFound { edge })
    }

    fn bounding_box(&self, shape: ShapeId) -> Result<BoundingBox, KernelError> {
        Ok(self.get(shape)?.bounds())
    }

    fn live_shapes(&self) -> usize {
        self.solids.len()
    }
}
