//! Affine transform descriptors handed to [`Kernel::transform`](crate::Kernel::transform).

/// A principal axis through the global origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> [f64; 3] {
        match self {
            Axis::X => [1.0, 0.0, 0.0],
            Axis::Y => [0.0, 1.0, 0.0],
            Axis::Z => [0.0, 0.0, 1.0],
        }
    }
}

/// One affine transform. All variants act about the global origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// Rigid translation by a vector.
    Translation([f64; 3]),
    /// Rotation by `angle` radians about a global axis (right-handed).
    Rotation { axis: Axis, angle: f64 },
    /// Uniform scale about the origin.
    UniformScale(f64),
    /// General affine map given as the top three rows of a 4x4 matrix
    /// (row-major, last column is the translation).
    Affine([[f64; 4]; 3]),
}

impl Transform {
    /// Diagonal scale matrix with no translation or shear.
    pub fn diagonal(sx: f64, sy: f64, sz: f64) -> Self {
        Transform::Affine([
            [sx, 0.0, 0.0, 0.0],
            [0.0, sy, 0.0, 0.0],
            [0.0, 0.0, sz, 0.0],
        ])
    }

    /// Row-major 3x4 matrix of this transform.
    pub fn matrix(&self) -> [[f64; 4]; 3] {
        match *self {
            Transform::Translation([dx, dy, dz]) => [
                [1.0, 0.0, 0.0, dx],
                [0.0, 1.0, 0.0, dy],
                [0.0, 0.0, 1.0, dz],
            ],
            Transform::Rotation { axis, angle } => {
                let (s, c) = angle.sin_cos();
                match axis {
                    Axis::X => [
                        [1.0, 0.0, 0.0, 0.0],
                        [0.0, c, -s, 0.0],
                        [0.0, s, c, 0.0],
                    ],
                    Axis::Y => [
                        [c, 0.0, s, 0.0],
                        [0.0, 1.0, 0.0, 0.0],
                        [-s, 0.0, c, 0.0],
                    ],
                    Axis::Z => [
                        [c, -s, 0.0, 0.0],
                        [s, c, 0.0, 0.0],
                        [0.0, 0.0, 1.0, 0.0],
                    ],
                }
            }
            Transform::UniformScale(f) => [
                [f, 0.0, 0.0, 0.0],
                [0.0, f, 0.0, 0.0],
                [0.0, 0.0, f, 0.0],
            ],
            Transform::Affine(m) => m,
        }
    }

    /// Map a point through this transform.
    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let m = self.matrix();
        let mut out = [0.0; 3];
        for (row, o) in m.iter().zip(out.iter_mut()) {
            *o = row[0] * p[0] + row[1] * p[1] + row[2] * p[2] + row[3];
        }
        out
    }
}
