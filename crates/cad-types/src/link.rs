use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::vec3::Vec3;

/// How a host document should reference an exported 3D file.
///
/// Produced by export and handed to external document writers; nothing in
/// this workspace interprets or validates the triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model3DLink {
    /// Path of the exported file.
    pub path: PathBuf,
    /// Placement offset (millimeters).
    #[serde(default)]
    pub offset: Vec3,
    /// Per-axis scale.
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    /// Euler rotation (degrees).
    #[serde(default)]
    pub rotate: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Model3DLink {
    /// Link with zero offset, unit scale and no rotation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: Vec3::ZERO,
            scale: Vec3::ONE,
            rotate: Vec3::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: impl Into<Vec3>) -> Self {
        self.offset = offset.into();
        self
    }

    pub fn with_scale(mut self, scale: impl Into<Vec3>) -> Self {
        self.scale = scale.into();
        self
    }

    pub fn with_rotate(mut self, rotate: impl Into<Vec3>) -> Self {
        self.rotate = rotate.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_triples() {
        let link = Model3DLink::new("out/board.wrl")
            .with_offset([1.25, -3.5, 0.0])
            .with_scale([1.0, 1.0, 2.5])
            .with_rotate([0.0, 0.0, 90.0]);

        let json = serde_json::to_string(&link).unwrap();
        let back: Model3DLink = serde_json::from_str(&json).unwrap();

        assert_eq!(back, link);
        assert_eq!(back.offset, Vec3::new(1.25, -3.5, 0.0));
        assert_eq!(back.scale, Vec3::new(1.0, 1.0, 2.5));
        assert_eq!(back.rotate, Vec3::z(90.0));
    }

    #[test]
    fn omitted_fields_take_neutral_defaults() {
        let link: Model3DLink = serde_json::from_str(r#"{"path":"a.wrl"}"#).unwrap();
        assert_eq!(link, Model3DLink::new("a.wrl"));
    }
}
