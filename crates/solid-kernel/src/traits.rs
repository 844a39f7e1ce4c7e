use std::sync::Arc;

use parking_lot::Mutex;

use crate::transform::Transform;
use crate::types::*;

/// Core geometry kernel trait: the capability interface every modeling
/// operation goes through.
///
/// Every method that returns a [`ShapeId`] allocates kernel-side storage that
/// stays alive until [`Kernel::release`] is called for it. Inputs are never
/// consumed or released by the kernel itself.
/// Implemented by TruckKernel (wraps real truck), OcctKernel (OCCT, behind the
/// `opencascade` feature) and MockKernel (deterministic test double).
pub trait Kernel {
    /// Axis-aligned box with one corner on the origin, extending along +X, +Y, +Z.
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<ShapeId, KernelError>;

    /// Sphere centered on the origin.
    fn make_sphere(&mut self, radius: f64) -> Result<ShapeId, KernelError>;

    /// Cylinder along +Z with its base centered on the origin.
    fn make_cylinder(&mut self, radius: f64, height: f64) -> Result<ShapeId, KernelError>;

    /// Apply an affine transform, producing a new shape.
    fn transform(&mut self, shape: ShapeId, transform: &Transform)
        -> Result<ShapeId, KernelError>;

    /// Boolean union of two solids.
    fn boolean_union(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError>;

    /// Boolean subtraction: a minus b.
    fn boolean_subtract(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError>;

    /// Boolean intersection of two solids.
    fn boolean_intersect(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError>;

    /// Fillet (round) the specified edges with the given radius in one build.
    fn fillet_edges(
        &mut self,
        shape: ShapeId,
        edges: &[EdgeId],
        radius: f64,
    ) -> Result<ShapeId, KernelError>;

    /// Tessellate a solid to a triangle mesh.
    fn tessellate(&mut self, shape: ShapeId, tolerance: f64) -> Result<RenderMesh, KernelError>;

    /// Serialize a solid as a STEP document.
    fn write_step(&mut self, shape: ShapeId) -> Result<String, KernelError>;

    /// Free a shape. Releasing an unknown or already released id is a no-op.
    fn release(&mut self, shape: ShapeId);
}

/// Topology introspection trait. Provides read-only queries on kernel geometry.
pub trait KernelIntrospect {
    /// Every edge of the shape exactly once, in the kernel's traversal order.
    /// The order is stable for a given shape.
    fn explore_edges(&self, shape: ShapeId) -> Result<Vec<EdgeId>, KernelError>;

    /// Continuity of the faces meeting at an edge.
    fn edge_continuity(&self, edge: EdgeId) -> Result<EdgeContinuity, KernelError>;

    /// Axis-aligned bounds of a shape.
    fn bounding_box(&self, shape: ShapeId) -> Result<BoundingBox, KernelError>;

    /// Number of shapes currently held by the kernel.
    fn live_shapes(&self) -> usize;
}

/// Combined trait for operations that need both mutable Kernel access
/// and read-only KernelIntrospect access on the same object.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;
}

// Blanket implementation for any type that implements both traits
impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}

/// Process-shareable kernel instance.
///
/// The kernel is not re-entrant: hold the lock only for the duration of one
/// operation and never across an `.await`.
pub type SharedKernel = Arc<Mutex<dyn KernelBundle + Send>>;

/// Wrap a kernel for sharing between a model, its handles and its builders.
pub fn share<K: KernelBundle + Send + 'static>(kernel: K) -> SharedKernel {
    Arc::new(Mutex::new(kernel))
}
