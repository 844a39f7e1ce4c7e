use serde::{Deserialize, Serialize};

/// Opaque reference to a solid held by a kernel.
/// Valid until passed to [`Kernel::release`](crate::Kernel::release).
/// NEVER persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

impl ShapeId {
    /// Wrap a kernel-assigned raw id. Only kernel implementations should call this.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

/// An edge of a specific shape, identified by its position in the shape's
/// edge traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId {
    /// The shape this edge belongs to.
    pub shape: ShapeId,
    /// Zero-based position in the shape's edge traversal.
    pub index: u32,
}

impl EdgeId {
    pub fn new(shape: ShapeId, index: u32) -> Self {
        Self { shape, index }
    }
}

/// Whether the surfaces meeting at an edge form a crease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeContinuity {
    /// A crease between two faces. Candidate for filleting.
    Sharp,
    /// Tangent-continuous (seams, fillet boundaries).
    Smooth,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    /// A box containing nothing. Extending it with a point yields that point.
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; 3]>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.extend(*p);
        }
        bbox
    }

    pub fn extend(&mut self, p: [f64; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    /// Overlap of two boxes, or `None` when they do not overlap with
    /// positive volume.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let mut out = BoundingBox::empty();
        for i in 0..3 {
            out.min[i] = self.min[i].max(other.min[i]);
            out.max[i] = self.max[i].min(other.max[i]);
            if out.min[i] >= out.max[i] {
                return None;
            }
        }
        Some(out)
    }

    /// The eight corners, bottom face first.
    pub fn corners(&self) -> [[f64; 3]; 8] {
        let (a, b) = (self.min, self.max);
        [
            [a[0], a[1], a[2]],
            [b[0], a[1], a[2]],
            [b[0], b[1], a[2]],
            [a[0], b[1], a[2]],
            [a[0], a[1], b[2]],
            [b[0], a[1], b[2]],
            [b[0], b[1], b[2]],
            [a[0], b[1], b[2]],
        ]
    }
}

/// Tessellated triangle mesh of one solid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f32>,
    /// Flat array of vertex normals [nx0, ny0, nz0, nx1, ny1, nz1, ...].
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex array.
    pub indices: Vec<u32>,
    /// Mapping from triangle ranges to B-rep faces.
    pub face_ranges: Vec<FaceRange>,
}

impl RenderMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Maps a contiguous range of triangle indices to one B-rep face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRange {
    /// Position of the face in the solid's face traversal.
    pub face_index: u32,
    /// Start index in the indices array (inclusive).
    pub start_index: u32,
    /// End index in the indices array (exclusive).
    pub end_index: u32,
}

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("primitive construction failed: {reason}")]
    ConstructionFailed { reason: String },

    #[error("transform failed: {reason}")]
    TransformFailed { reason: String },

    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("STEP write failed: {reason}")]
    StepWriteFailed { reason: String },

    #[error("shape not found: {id}")]
    ShapeNotFound { id: ShapeId },

    #[error("edge {} not found on {}", .edge.index, .edge.shape)]
    EdgeNotFound { edge: EdgeId },

    #[error("operation not supported by this kernel: {operation}")]
    NotSupported { operation: String },

    #[error("kernel load failed: {reason}")]
    LoadFailed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_from_points() {
        let bbox = BoundingBox::from_points(&[[1.0, -2.0, 3.0], [-1.0, 2.0, 0.0]]);
        assert_eq!(bbox.min, [-1.0, -2.0, 0.0]);
        assert_eq!(bbox.max, [1.0, 2.0, 3.0]);
        assert_eq!(bbox.size(), [2.0, 4.0, 3.0]);
        assert_eq!(bbox.center(), [0.0, 0.0, 1.5]);
    }

    #[test]
    fn empty_bbox() {
        assert!(BoundingBox::empty().is_empty());
        assert!(!BoundingBox::from_points(&[[0.0; 3]]).is_empty());
    }

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = BoundingBox::from_points(&[[0.0; 3], [1.0; 3]]);
        let b = BoundingBox::from_points(&[[1.0, 0.0, 0.0], [2.0, 1.0, 1.0]]);
        let c = BoundingBox::from_points(&[[0.5; 3], [3.0; 3]]);
        assert!(a.intersection(&b).is_none());
        let i = a.intersection(&c).unwrap();
        assert_eq!(i.min, [0.5; 3]);
        assert_eq!(i.max, [1.0; 3]);
    }
}
