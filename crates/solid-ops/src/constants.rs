//! Numeric constants shared by the geometry engines.

/// Rotation angles (degrees) with a smaller magnitude are treated as exactly
/// zero: no transform is built for that axis.
pub const ANGLE_EPSILON: f64 = 1e-9;

/// Scale factors closer than this (pairwise) select the uniform-scale path.
pub const SCALE_EPSILON: f64 = 1e-9;

/// Extra height given to the bore of a pipe so its end faces never coincide
/// with the outer cylinder's.
pub const PIPE_CLEARANCE: f64 = 0.1;

/// Degrees to radians.
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
