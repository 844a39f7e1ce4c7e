//! Transform engine: translate, rotate and scale a solid.
//!
//! Each function leaves its input shape alive and returns a new one; the
//! caller decides when the input is released. Shapes created along the way
//! are released before returning.

use cad_types::Vec3;
use solid_kernel::{Axis, KernelBundle, ShapeId, Transform};
use tracing::debug;

use crate::constants::{ANGLE_EPSILON, DEG_TO_RAD, SCALE_EPSILON};
use crate::scratch::Scratch;
use crate::types::OpError;

/// Rigid translation.
pub fn translate(
    kb: &mut dyn KernelBundle,
    shape: ShapeId,
    offset: Vec3,
) -> Result<ShapeId, OpError> {
    debug!(%shape, ?offset, "translate");
    Ok(kb.transform(shape, &Transform::Translation(offset.to_array()))?)
}

/// Per-axis rotation steps for an Euler triple in degrees: X, then Y, then Z.
/// Axes whose angle is below [`ANGLE_EPSILON`] in magnitude produce no step.
pub fn rotation_steps(angles: Vec3) -> Vec<Transform> {
    [(Axis::X, angles.x), (Axis::Y, angles.y), (Axis::Z, angles.z)]
        .into_iter()
        .filter(|(_, deg)| deg.abs() >= ANGLE_EPSILON)
        .map(|(axis, deg)| Transform::Rotation {
            axis,
            angle: deg * DEG_TO_RAD,
        })
        .collect()
}

/// Rotate about the global X, Y and Z axes, in that order, each step
/// composed onto the previous result.
///
/// Rotation is about the world origin, not the solid's centroid: a solid
/// sitting away from the origin revolves around it.
///
/// When every angle is negligible no kernel call is made and `shape` itself
/// is returned.
pub fn rotate(
    kb: &mut dyn KernelBundle,
    shape: ShapeId,
    angles: Vec3,
) -> Result<ShapeId, OpError> {
    debug!(%shape, ?angles, "rotate");
    let mut scratch = Scratch::new(kb);
    let mut current = shape;
    for step in rotation_steps(angles) {
        let next = scratch.transform(current, &step)?;
        scratch.track(next);
        // The caller's input is never released here, only our own intermediates
        if current != shape {
            scratch.release(current);
        }
        current = next;
    }
    Ok(scratch.keep(current))
}

/// The kernel transform for a per-axis scale: a native uniform scale when
/// all factors agree within [`SCALE_EPSILON`], otherwise a diagonal affine
/// matrix in world axes.
pub fn scale_transform(factors: Vec3) -> Transform {
    let Vec3 { x, y, z } = factors;
    let uniform = (x - y).abs() < SCALE_EPSILON
        && (y - z).abs() < SCALE_EPSILON
        && (x - z).abs() < SCALE_EPSILON;
    if uniform {
        Transform::UniformScale(x)
    } else {
        Transform::diagonal(x, y, z)
    }
}

/// Scale about the origin.
///
/// Non-uniform factors apply along the world axes regardless of how the
/// solid was rotated before.
pub fn scale(kb: &mut dyn KernelBundle, shape: ShapeId, factors: Vec3) -> Result<ShapeId, OpError> {
    debug!(%shape, ?factors, "scale");
    Ok(kb.transform(shape, &scale_transform(factors))?)
}
