//! Tessellation wrapper with face-range metadata.
//!
//! Wraps truck-meshalgo to produce a RenderMesh with FaceRange entries that
//! map triangle index ranges back to the B-rep faces they came from.

use crate::types::*;
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::{MeshableShape, MeshedShape};

type TruckSolid = truck_modeling::Solid;

/// Tessellate a truck Solid into a RenderMesh with per-face tracking.
///
/// Each face is tessellated as part of the solid, then the meshed faces are
/// walked in shell order to extract per-face triangle ranges.
pub fn tessellate_solid(
    solid: &TruckSolid,
    tolerance: f64,
) -> std::result::Result<RenderMesh, KernelError> {
    if tolerance <= 0.0 {
        return Err(KernelError::TessellationFailed {
            reason: format!("tolerance must be positive, got {tolerance}"),
        });
    }

    let meshed_solid = solid.triangulation(tolerance);

    let mut mesh = RenderMesh::default();
    let mut face_index = 0u32;

    for shell in meshed_solid.boundaries().iter() {
        for face in shell.face_iter() {
            let this_face = face_index;
            face_index += 1;

            // Each meshed face's surface is Option<PolygonMesh>
            let maybe_mesh: Option<PolygonMesh> = face.surface();
            let Some(face_mesh) = maybe_mesh else {
                continue;
            };

            // If face is inverted, the mesh needs inversion too
            let face_mesh = if !face.orientation() {
                let mut m = face_mesh;
                m.invert();
                m
            } else {
                face_mesh
            };

            let start_index = mesh.indices.len() as u32;
            append_polygon(&mut mesh, &face_mesh);
            let end_index = mesh.indices.len() as u32;

            if end_index > start_index {
                mesh.face_ranges.push(FaceRange {
                    face_index: this_face,
                    start_index,
                    end_index,
                });
            }
        }
    }

    // Fallback: merge everything into a single polygon mesh
    if mesh.is_empty() {
        let merged = meshed_solid.to_polygon();
        append_polygon(&mut mesh, &merged);
        mesh.face_ranges = vec![FaceRange {
            face_index: 0,
            start_index: 0,
            end_index: mesh.indices.len() as u32,
        }];
    }

    if mesh.is_empty() {
        return Err(KernelError::TessellationFailed {
            reason: "solid produced no triangles".to_string(),
        });
    }

    Ok(mesh)
}

/// Collect every mesh position of a solid, for bounding-box queries.
pub fn sample_positions(solid: &TruckSolid, tolerance: f64) -> Vec<[f64; 3]> {
    let polygon = solid.triangulation(tolerance).to_polygon();
    polygon
        .positions()
        .iter()
        .map(|p| [p[0], p[1], p[2]])
        .collect()
}

fn append_polygon(mesh: &mut RenderMesh, polygon: &PolygonMesh) {
    let base_vertex = mesh.vertex_count() as u32;
    let positions = polygon.positions();
    let normals = polygon.normals();

    for pos in positions {
        mesh.vertices
            .extend_from_slice(&[pos[0] as f32, pos[1] as f32, pos[2] as f32]);
    }

    // Per-position normals only when the mesh carries one per position
    if normals.len() == positions.len() {
        for norm in normals {
            mesh.normals
                .extend_from_slice(&[norm[0] as f32, norm[1] as f32, norm[2] as f32]);
        }
    } else {
        for _ in 0..positions.len() {
            mesh.normals.extend_from_slice(&[0.0, 0.0, 1.0]);
        }
    }

    for tri in polygon.tri_faces() {
        for v in tri.iter() {
            mesh.indices.push(v.pos as u32 + base_vertex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    #[test]
    fn box_tessellation_has_six_face_ranges() {
        let solid = primitives::make_box(1.0, 1.0, 1.0);
        let mesh = tessellate_solid(&solid, 0.1).unwrap();

        assert!(!mesh.vertices.is_empty(), "Mesh should have vertices");
        assert_eq!(mesh.vertices.len(), mesh.normals.len());
        assert_eq!(mesh.face_ranges.len(), 6, "Box should have 6 face ranges");

        let covered: u32 = mesh
            .face_ranges
            .iter()
            .map(|r| r.end_index - r.start_index)
            .sum();
        assert_eq!(covered, mesh.indices.len() as u32);
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        let solid = primitives::make_box(1.0, 1.0, 1.0);
        assert!(matches!(
            tessellate_solid(&solid, 0.0),
            Err(KernelError::TessellationFailed { .. })
        ));
    }
}
