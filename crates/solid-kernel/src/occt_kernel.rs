//! Geometry kernel backed by OpenCASCADE.
//!
//! Built only with the `opencascade` feature. OCCT has the fillet operator
//! truck lacks, so the bootstrap loads this kernel whenever the feature is on.
//!
//! Edges are addressed the same way as in the other kernels: by position in a
//! deduplicated `TopExp_Explorer` walk. The explorer visits an edge once per
//! face that bounds it, so occurrences are merged by their curve samples.

use std::collections::{HashMap, HashSet};

use opencascade_sys::ffi;
use tracing::{debug, trace};

use crate::traits::{Kernel, KernelIntrospect};
use crate::transform::Transform;
use crate::types::*;

type OccShape = cxx::UniquePtr<ffi::TopoDS_Shape>;

/// Angular deflection of every mesh this kernel builds, in radians.
const ANGULAR_DEFLECTION: f64 = 0.1;

/// Linear deflection used when sampling a solid for its bounds.
const BOUNDS_TOLERANCE: f64 = 0.01;

/// Linear deflection of the mesh that face normals are read from.
const CONTINUITY_TOLERANCE: f64 = 0.01;

/// Curve samples closer than this are the same point.
const EDGE_KEY_RESOLUTION: f64 = 1e-6;

/// Faces whose normals at a shared edge agree within about 15 degrees are tangent.
const SMOOTH_COSINE: f64 = 0.965;

/// Smallest transform determinant OCCT can invert.
const SINGULAR_DETERMINANT: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
enum BooleanOp {
    Union,
    Subtract,
    Intersect,
}

/// Real geometry kernel backed by OCCT.
pub struct OcctKernel {
    next_handle: u64,
    shapes: HashMap<u64, OccShape>,
}

impl OcctKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            shapes: HashMap::new(),
        }
    }

    fn store(&mut self, shape: OccShape) -> ShapeId {
        let id = ShapeId::from_raw(self.next_handle);
        self.next_handle += 1;
        self.shapes.insert(id.raw(), shape);
        id
    }

    fn get(&self, shape: ShapeId) -> Result<&OccShape, KernelError> {
        self.shapes
            .get(&shape.raw())
            .ok_or(KernelError::ShapeNotFound { id: shape })
    }

    fn boolean(&mut self, a: ShapeId, b: ShapeId, op: BooleanOp) -> Result<ShapeId, KernelError> {
        let result = {
            let (solid_a, solid_b) = (self.get(a)?, self.get(b)?);
            match op {
                BooleanOp::Union => ffi::BRepAlgoAPI_Fuse_ctor(solid_a, solid_b).Shape(),
                BooleanOp::Subtract => ffi::BRepAlgoAPI_Cut_ctor(solid_a, solid_b).Shape(),
                BooleanOp::Intersect => ffi::BRepAlgoAPI_Common_ctor(solid_a, solid_b).Shape(),
            }
        };
        let result = non_empty(result).ok_or_else(|| {
            debug!(%a, %b, ?op, "occt boolean left no faces");
            KernelError::BooleanFailed {
                reason: format!("{op:?} of {a} and {b} produced an empty shape"),
            }
        })?;
        Ok(self.store(result))
    }
}

impl Default for OcctKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn origin() -> cxx::UniquePtr<ffi::gp_Pnt> {
    ffi::new_gp_Pnt(0.0, 0.0, 0.0)
}

fn point(p: &ffi::gp_Pnt) -> [f64; 3] {
    [ffi::gp_Pnt_X(p), ffi::gp_Pnt_Y(p), ffi::gp_Pnt_Z(p)]
}

/// `None` for a null result or one without a single face.
fn non_empty(shape: OccShape) -> Option<OccShape> {
    if shape.is_null() || count(&shape, ffi::TopAbs_ShapeEnum::TopAbs_FACE) == 0 {
        None
    } else {
        Some(shape)
    }
}

fn count(shape: &OccShape, kind: ffi::TopAbs_ShapeEnum) -> usize {
    let mut explorer = ffi::TopExp_Explorer_ctor(shape, kind);
    let mut n = 0;
    while ffi::TopExp_Explorer_More(&explorer) {
        n += 1;
        ffi::TopExp_Explorer_Next(&mut explorer);
    }
    n
}

fn determinant(m: &[[f64; 4]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn transformed(shape: &OccShape, transform: &Transform) -> OccShape {
    match *transform {
        Transform::Translation([dx, dy, dz]) => {
            let mut trsf = ffi::new_gp_Trsf();
            ffi::gp_Trsf_SetTranslation(&mut trsf, &ffi::new_gp_Vec(dx, dy, dz));
            ffi::BRepBuilderAPI_Transform_ctor(shape, &trsf, true).Shape()
        }
        Transform::Rotation { axis, angle } => {
            let [x, y, z] = axis.unit();
            let gp_axis = ffi::new_gp_Ax1(&origin(), &ffi::new_gp_Dir(x, y, z));
            let mut trsf = ffi::new_gp_Trsf();
            ffi::gp_Trsf_SetRotation(&mut trsf, &gp_axis, angle);
            ffi::BRepBuilderAPI_Transform_ctor(shape, &trsf, true).Shape()
        }
        Transform::UniformScale(factor) => {
            let mut trsf = ffi::new_gp_Trsf();
            ffi::gp_Trsf_SetScale(&mut trsf, &origin(), factor);
            ffi::BRepBuilderAPI_Transform_ctor(shape, &trsf, true).Shape()
        }
        Transform::Affine(m) => {
            // gp_GTrsf rows and columns are 1-based
            let mut gtrsf = ffi::new_gp_GTrsf();
            for (row, values) in m.iter().enumerate() {
                for (col, value) in values.iter().enumerate() {
                    ffi::gp_GTrsf_SetValue(&mut gtrsf, row as i32 + 1, col as i32 + 1, *value);
                }
            }
            ffi::BRepBuilderAPI_GTransform_ctor(shape, &gtrsf, true).Shape()
        }
    }
}

type EdgeKey = [i64; 9];

/// Position-based identity of an edge, shared by all its explorer occurrences.
struct EdgeSample {
    key: EdgeKey,
    mid: [f64; 3],
}

fn quantize(p: [f64; 3]) -> [i64; 3] {
    p.map(|c| (c / EDGE_KEY_RESOLUTION).round() as i64)
}

/// Degenerated edges (sphere poles) carry no 3D curve and yield `None`.
fn sample_edge(edge_shape: &OccShape) -> Option<EdgeSample> {
    let edge = ffi::TopoDS_cast_to_edge(edge_shape);
    let mut first = 0.0f64;
    let mut last = 0.0f64;
    let curve = ffi::BRep_Tool_Curve(&edge, &mut first, &mut last);
    if curve.is_null() {
        return None;
    }

    let at = |t: f64| point(&ffi::Geom_Curve_Value(&curve, t));
    let (start, mid, end) = (at(first), at((first + last) / 2.0), at(last));
    let (a, b) = (quantize(start), quantize(end));
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let m = quantize(mid);
    Some(EdgeSample {
        key: [lo[0], lo[1], lo[2], m[0], m[1], m[2], hi[0], hi[1], hi[2]],
        mid,
    })
}

/// Each edge once, in explorer order, as its first occurrence.
fn unique_edges(shape: &OccShape) -> Vec<(OccShape, EdgeSample)> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    let mut explorer = ffi::TopExp_Explorer_ctor(shape, ffi::TopAbs_ShapeEnum::TopAbs_EDGE);
    while ffi::TopExp_Explorer_More(&explorer) {
        let edge_shape = ffi::TopExp_Explorer_Current(&explorer);
        if let Some(sample) = sample_edge(&edge_shape) {
            if seen.insert(sample.key) {
                edges.push((edge_shape, sample));
            }
        }
        ffi::TopExp_Explorer_Next(&mut explorer);
    }
    edges
}

/// Positions of the faces whose boundary contains the edge with `key`.
fn faces_bounded_by(shape: &OccShape, key: &EdgeKey) -> Vec<usize> {
    let mut faces = Vec::new();
    let mut face_index = 0usize;
    let mut explorer = ffi::TopExp_Explorer_ctor(shape, ffi::TopAbs_ShapeEnum::TopAbs_FACE);
    while ffi::TopExp_Explorer_More(&explorer) {
        let face_shape = ffi::TopExp_Explorer_Current(&explorer);
        let mut edges =
            ffi::TopExp_Explorer_ctor(&face_shape, ffi::TopAbs_ShapeEnum::TopAbs_EDGE);
        while ffi::TopExp_Explorer_More(&edges) {
            let edge_shape = ffi::TopExp_Explorer_Current(&edges);
            if sample_edge(&edge_shape).is_some_and(|s| s.key == *key) {
                faces.push(face_index);
                break;
            }
            ffi::TopExp_Explorer_Next(&mut edges);
        }
        face_index += 1;
        ffi::TopExp_Explorer_Next(&mut explorer);
    }
    faces
}

/// Triangulation of one face, wound so normals point out of the solid.
#[derive(Default)]
struct FaceMesh {
    positions: Vec<[f64; 3]>,
    triangles: Vec<[usize; 3]>,
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn normalized(v: [f64; 3]) -> Option<[f64; 3]> {
    let len = dot(v, v).sqrt();
    (len > 1e-12).then(|| [v[0] / len, v[1] / len, v[2] / len])
}

impl FaceMesh {
    fn triangle_normal(&self, tri: &[usize; 3]) -> [f64; 3] {
        let [a, b, c] = tri.map(|i| self.positions[i]);
        cross(sub(b, a), sub(c, a))
    }

    /// Unit normal of the triangle whose centroid lies nearest `p`.
    fn normal_near(&self, p: [f64; 3]) -> Option<[f64; 3]> {
        let nearest = self.triangles.iter().min_by(|x, y| {
            let d = |tri: &[usize; 3]| {
                let [a, b, c] = tri.map(|i| self.positions[i]);
                let centroid = [
                    (a[0] + b[0] + c[0]) / 3.0,
                    (a[1] + b[1] + c[1]) / 3.0,
                    (a[2] + b[2] + c[2]) / 3.0,
                ];
                let off = sub(centroid, p);
                dot(off, off)
            };
            d(x).total_cmp(&d(y))
        })?;
        normalized(self.triangle_normal(nearest))
    }
}

/// Mesh `shape` and read back one [`FaceMesh`] per face, in explorer order.
/// Faces without a triangulation yield an empty entry so indices line up.
fn face_meshes(shape: &OccShape, tolerance: f64) -> Vec<FaceMesh> {
    let _mesher =
        ffi::BRepMesh_IncrementalMesh_ctor(shape, tolerance, false, ANGULAR_DEFLECTION, true);

    let mut faces = Vec::new();
    let mut explorer = ffi::TopExp_Explorer_ctor(shape, ffi::TopAbs_ShapeEnum::TopAbs_FACE);
    while ffi::TopExp_Explorer_More(&explorer) {
        let face_shape = ffi::TopExp_Explorer_Current(&explorer);
        let face = ffi::TopoDS_cast_to_face(&face_shape);
        let location = ffi::TopLoc_Location_ctor();
        let triangulation = ffi::BRep_Tool_Triangulation(&face, &location);

        let mut mesh = FaceMesh::default();
        if !triangulation.is_null() {
            let placement = ffi::TopLoc_Location_Transformation(&location);
            for i in 1..=ffi::Poly_Triangulation_NbNodes(&triangulation) {
                let node = ffi::Poly_Triangulation_Node(&triangulation, i);
                mesh.positions
                    .push(point(&ffi::gp_Pnt_Transformed(&node, &placement)));
            }

            let reversed = ffi::TopoDS_Shape_Orientation(&face_shape)
                == ffi::TopAbs_Orientation::TopAbs_REVERSED;
            for i in 1..=ffi::Poly_Triangulation_NbTriangles(&triangulation) {
                let triangle = ffi::Poly_Triangulation_Triangle(&triangulation, i);
                let corner = |k| ffi::Poly_Triangle_Value(&triangle, k) as usize - 1;
                let (a, b, c) = (corner(1), corner(2), corner(3));
                mesh.triangles
                    .push(if reversed { [a, c, b] } else { [a, b, c] });
            }
        }
        faces.push(mesh);
        ffi::TopExp_Explorer_Next(&mut explorer);
    }
    faces
}

impl Kernel for OcctKernel {
    fn make_box(&mut self, dx: f64, dy: f64, dz: f64) -> Result<ShapeId, KernelError> {
        if dx <= 0.0 || dy <= 0.0 || dz <= 0.0 {
            return Err(KernelError::ConstructionFailed {
                reason: format!("box dimensions must be positive, got {dx} x {dy} x {dz}"),
            });
        }
        let corner = ffi::new_gp_Pnt(dx, dy, dz);
        let box_maker = ffi::BRepPrimAPI_MakeBox_ctor(&origin(), &corner);
        Ok(self.store(box_maker.Shape()))
    }

    fn make_sphere(&mut self, radius: f64) -> Result<ShapeId, KernelError> {
        if radius <= 0.0 {
            return Err(KernelError::ConstructionFailed {
                reason: format!("sphere radius must be positive, got {radius}"),
            });
        }
        let sphere = ffi::BRepPrimAPI_MakeSphere_ctor(&origin(), radius);
        Ok(self.store(sphere.Shape()))
    }

    fn make_cylinder(&mut self, radius: f64, height: f64) -> Result<ShapeId, KernelError> {
        if radius <= 0.0 || height <= 0.0 {
            return Err(KernelError::ConstructionFailed {
                reason: format!("cylinder needs positive radius and height, got {radius}, {height}"),
            });
        }
        let ax2 = ffi::new_gp_Ax2(&origin(), &ffi::new_gp_Dir(0.0, 0.0, 1.0));
        let cylinder = ffi::BRepPrimAPI_MakeCylinder_ctor(&ax2, radius, height);
        Ok(self.store(cylinder.Shape()))
    }

    fn transform(
        &mut self,
        shape: ShapeId,
        transform: &Transform,
    ) -> Result<ShapeId, KernelError> {
        if determinant(&transform.matrix()).abs() < SINGULAR_DETERMINANT {
            return Err(KernelError::TransformFailed {
                reason: format!("{transform:?} collapses the solid"),
            });
        }
        let moved = transformed(self.get(shape)?, transform);
        if moved.is_null() {
            return Err(KernelError::TransformFailed {
                reason: format!("OCCT could not apply {transform:?} to {shape}"),
            });
        }
        Ok(self.store(moved))
    }

    fn boolean_union(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError> {
        self.boolean(a, b, BooleanOp::Union)
    }

    fn boolean_subtract(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError> {
        self.boolean(a, b, BooleanOp::Subtract)
    }

    fn boolean_intersect(&mut self, a: ShapeId, b: ShapeId) -> Result<ShapeId, KernelError> {
        self.boolean(a, b, BooleanOp::Intersect)
    }

    fn fillet_edges(
        &mut self,
        shape: ShapeId,
        edges: &[EdgeId],
        radius: f64,
    ) -> Result<ShapeId, KernelError> {
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

        let result = {
            let solid = self.get(shape)?;
            let unique = unique_edges(solid);
            if let Some(&edge) = edges
                .iter()
                .find(|e| e.shape != shape || e.index as usize >= unique.len())
            {
                return Err(KernelError::EdgeNotFound { edge });
            }

            let selected: HashSet<u32> = edges.iter().map(|e| e.index).collect();
            let mut fillet = ffi::BRepFilletAPI_MakeFillet_ctor(solid);
            for (index, (edge_shape, _)) in unique.iter().enumerate() {
                if selected.contains(&(index as u32)) {
                    let edge = ffi::TopoDS_cast_to_edge(edge_shape);
                    ffi::BRepFilletAPI_MakeFillet_Add(&mut fillet, radius, &edge);
                }
            }
            ffi::BRepFilletAPI_MakeFillet_Build(&mut fillet);
            ffi::BRepFilletAPI_MakeFillet_Shape(&fillet)
        };

        let result = non_empty(result).ok_or_else(|| KernelError::FilletFailed {
            reason: format!("OCCT could not round {} edges of {shape} at r={radius}", edges.len()),
        })?;
        debug!(%shape, edges = edges.len(), radius, "occt fillet built");
        Ok(self.store(result))
    }

    fn tessellate(&mut self, shape: ShapeId, tolerance: f64) -> Result<RenderMesh, KernelError> {
        if tolerance <= 0.0 {
            return Err(KernelError::TessellationFailed {
                reason: format!("tolerance must be positive, got {tolerance}"),
            });
        }

        let mut mesh = RenderMesh::default();
        for (face_index, face) in face_meshes(self.get(shape)?, tolerance).iter().enumerate() {
            if face.triangles.is_empty() {
                continue;
            }

            // Smooth normals within a face, creases between faces
            let mut normals = vec![[0.0f64; 3]; face.positions.len()];
            for tri in &face.triangles {
                let n = face.triangle_normal(tri);
                for &i in tri {
                    normals[i] = [normals[i][0] + n[0], normals[i][1] + n[1], normals[i][2] + n[2]];
                }
            }

            let base = mesh.vertex_count() as u32;
            for (p, n) in face.positions.iter().zip(&normals) {
                let n = normalized(*n).unwrap_or([0.0, 0.0, 1.0]);
                mesh.vertices
                    .extend_from_slice(&[p[0] as f32, p[1] as f32, p[2] as f32]);
                mesh.normals
                    .extend_from_slice(&[n[0] as f32, n[1] as f32, n[2] as f32]);
            }

            let start_index = mesh.indices.len() as u32;
            mesh.indices.extend(
                face.triangles
                    .iter()
                    .flat_map(|tri| tri.map(|i| i as u32 + base)),
            );
            mesh.face_ranges.push(FaceRange {
                face_index: face_index as u32,
                start_index,
                end_index: mesh.indices.len() as u32,
            });
        }

        if mesh.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: format!("{shape} produced no triangles"),
            });
        }
        Ok(mesh)
    }

    fn write_step(&mut self, shape: ShapeId) -> Result<String, KernelError> {
        let solid = self.get(shape)?;
        let failed = |reason: String| KernelError::StepWriteFailed { reason };

        // STEPControl_Writer only writes to a path
        let file = tempfile::Builder::new()
            .prefix("solid-kernel-")
            .suffix(".step")
            .tempfile()
            .map_err(|e| failed(format!("temporary STEP file: {e}")))?;
        let path = file.path().to_string_lossy().to_string();

        let mut writer = ffi::STEPControl_Writer_ctor();
        let status = ffi::transfer_shape(writer.pin_mut(), solid);
        if status != ffi::IFSelect_ReturnStatus::IFSelect_RetDone {
            return Err(failed(format!("shape transfer returned {status:?}")));
        }
        let status = ffi::write_step(writer.pin_mut(), path);
        if status != ffi::IFSelect_ReturnStatus::IFSelect_RetDone {
            return Err(failed(format!("STEP write returned {status:?}")));
        }

        let text = std::fs::read_to_string(file.path())
            .map_err(|e| failed(format!("reading back STEP output: {e}")))?;
        if text.is_empty() {
            return Err(failed("empty STEP document".to_string()));
        }
        Ok(text)
    }

    fn release(&mut self, shape: ShapeId) {
        if self.shapes.remove(&shape.raw()).is_some() {
            trace!(%shape, live = self.shapes.len(), "released");
        }
    }
}

impl KernelIntrospect for OcctKernel {
    fn explore_edges(&self, shape: ShapeId) -> Result<Vec<EdgeId>, KernelError> {
        let count = unique_edges(self.get(shape)?).len();
        Ok((0..count as u32).map(|i| EdgeId::new(shape, i)).collect())
    }

    /// A seam bounds a single face and is smooth. Otherwise the two faces'
    /// mesh normals nearest the edge midpoint decide.
    fn edge_continuity(&self, edge: EdgeId) -> Result<EdgeContinuity, KernelError> {
        let solid = self.get(edge.shape)?;
        let unique = unique_edges(solid);
        let (_, sample) = unique
            .get(edge.index as usize)
            .ok_or(KernelError::EdgeNotFound { edge })?;

        let faces = faces_bounded_by(solid, &sample.key);
        let [first, second, ..] = *faces.as_slice() else {
            return Ok(EdgeContinuity::Smooth);
        };

        let meshes = face_meshes(solid, CONTINUITY_TOLERANCE);
        let normal = |face: usize| meshes.get(face).and_then(|m| m.normal_near(sample.mid));
        match (normal(first), normal(second)) {
            (Some(a), Some(b)) if dot(a, b) >= SMOOTH_COSINE => Ok(EdgeContinuity::Smooth),
            (Some(_), Some(_)) => Ok(EdgeContinuity::Sharp),
            _ => Err(KernelError::TessellationFailed {
                reason: format!("no mesh around edge {} of {}", edge.index, edge.shape),
            }),
        }
    }

    fn bounding_box(&self, shape: ShapeId) -> Result<BoundingBox, KernelError> {
        let meshes = face_meshes(self.get(shape)?, BOUNDS_TOLERANCE);
        let bbox = BoundingBox::from_points(meshes.iter().flat_map(|m| &m.positions));
        if bbox.is_empty() {
            return Err(KernelError::TessellationFailed {
                reason: format!("{shape} has no sample points"),
            });
        }
        Ok(bbox)
    }

    fn live_shapes(&self) -> usize {
        self.shapes.len()
    }
}
