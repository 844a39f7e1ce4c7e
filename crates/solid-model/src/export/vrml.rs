//! Faceted VRML 2.0 writer.
//!
//! One `Shape` node per solid, in model order. Color and name survive: the
//! color becomes the node's `Material`, the name a comment line right before
//! the node.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use cad_types::Rgba;
use solid_kernel::{KernelBundle, RenderMesh};
use tracing::{debug, info};

use crate::config::ExportOptions;
use crate::errors::ExportError;
use crate::export::ExportSolid;

pub const HEADER: &str = "#VRML V2.0 utf8";

/// Tessellate every solid and write the scene to `path`.
pub fn write_vrml(
    kb: &mut dyn KernelBundle,
    solids: &[ExportSolid],
    path: &Path,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let meshes = solids
        .iter()
        .map(|solid| kb.tessellate(solid.shape, options.tessellation_tolerance))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        solids = solids.len(),
        triangles = meshes.iter().map(RenderMesh::triangle_count).sum::<usize>(),
        "tessellated"
    );

    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io_error)?);
    write_scene(&mut out, solids, &meshes, options.default_color).map_err(io_error)?;
    out.flush().map_err(io_error)?;

    info!(path = %path.display(), solids = solids.len(), "wrote VRML");
    Ok(())
}

/// Serialize already tessellated solids. `meshes[i]` belongs to `solids[i]`.
pub fn write_scene<W: Write>(
    out: &mut W,
    solids: &[ExportSolid],
    meshes: &[RenderMesh],
    default_color: Rgba,
) -> io::Result<()> {
    writeln!(out, "{HEADER}")?;
    writeln!(out)?;
    for (solid, mesh) in solids.iter().zip(meshes) {
        if let Some(name) = &solid.name {
            // a newline would end the comment early
            writeln!(out, "# {}", name.replace(['\r', '\n'], " "))?;
        }
        write_shape(out, mesh, solid.color.unwrap_or(default_color))?;
    }
    Ok(())
}

fn write_shape<W: Write>(out: &mut W, mesh: &RenderMesh, color: Rgba) -> io::Result<()> {
    writeln!(out, "Shape {{")?;
    writeln!(out, "  appearance Appearance {{")?;
    writeln!(out, "    material Material {{")?;
    writeln!(out, "      diffuseColor {} {} {}", color.r, color.g, color.b)?;
    if color.a < 1.0 {
        writeln!(out, "      transparency {}", 1.0 - color.a)?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "  }}")?;

    writeln!(out, "  geometry IndexedFaceSet {{")?;
    writeln!(out, "    coord Coordinate {{")?;
    writeln!(out, "      point [")?;
    for p in mesh.vertices.chunks_exact(3) {
        writeln!(out, "        {} {} {},", p[0], p[1], p[2])?;
    }
    writeln!(out, "      ]")?;
    writeln!(out, "    }}")?;

    if !mesh.normals.is_empty() && mesh.normals.len() == mesh.vertices.len() {
        writeln!(out, "    normal Normal {{")?;
        writeln!(out, "      vector [")?;
        for n in mesh.normals.chunks_exact(3) {
            writeln!(out, "        {} {} {},", n[0], n[1], n[2])?;
        }
        writeln!(out, "      ]")?;
        writeln!(out, "    }}")?;
        writeln!(out, "    normalPerVertex TRUE")?;
    }

    writeln!(out, "    coordIndex [")?;
    for tri in mesh.indices.chunks_exact(3) {
        writeln!(out, "      {}, {}, {}, -1,", tri[0], tri[1], tri[2])?;
    }
    writeln!(out, "    ]")?;
    writeln!(out, "  }}")?;
    writeln!(out, "}}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solid_kernel::ShapeId;

    fn triangle() -> RenderMesh {
        RenderMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
            face_ranges: Vec::new(),
        }
    }

    fn render(solids: &[ExportSolid]) -> String {
        let meshes = vec![triangle(); solids.len()];
        let mut buf = Vec::new();
        write_scene(&mut buf, solids, &meshes, Rgba::rgb(0.8, 0.8, 0.8)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn solid(color: Option<Rgba>, name: Option<&str>) -> ExportSolid {
        ExportSolid {
            shape: ShapeId::from_raw(1),
            color,
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn header_comes_first() {
        let text = render(&[solid(None, None)]);
        assert!(text.starts_with("#VRML V2.0 utf8\n"));
        assert!(text.contains("diffuseColor 0.8 0.8 0.8"));
        assert!(text.contains("IndexedFaceSet"));
        assert!(text.contains("0, 1, 2, -1,"));
    }

    #[test]
    fn name_comment_precedes_its_shape() {
        let text = render(&[
            solid(Some(Rgba::rgb(1.0, 0.0, 0.0)), Some("red")),
            solid(Some(Rgba::rgb(0.0, 1.0, 0.0)), Some("green")),
        ]);
        let red = text.find("# red\nShape {").unwrap();
        let green = text.find("# green\nShape {").unwrap();
        assert!(red < green);
        assert!(text[red..green].contains("diffuseColor 1 0 0"));
        assert!(text[green..].contains("diffuseColor 0 1 0"));
    }

    #[test]
    fn translucent_color_sets_transparency() {
        let text = render(&[solid(Some(Rgba::new(0.0, 0.0, 1.0, 0.25)), None)]);
        assert!(text.contains("transparency 0.75"));
        let opaque = render(&[solid(Some(Rgba::rgb(0.0, 0.0, 1.0)), None)]);
        assert!(!opaque.contains("transparency"));
    }

    #[test]
    fn multiline_names_stay_in_the_comment() {
        let text = render(&[solid(None, Some("a\nb"))]);
        assert!(text.contains("# a b\n"));
    }
}
