//! Primitive constructors built from kernel primitives.
//!
//! Dimensions are not validated here; degenerate input produces whatever the
//! kernel produces.

use cad_types::Vec3;
use solid_kernel::{KernelBundle, ShapeId, Transform};
use tracing::debug;

use crate::constants::PIPE_CLEARANCE;
use crate::fillet::fillet_all;
use crate::scratch::Scratch;
use crate::types::OpError;

/// Replace a tracked shape with a translated copy, releasing the original.
fn shifted(scratch: &mut Scratch<'_>, shape: ShapeId, offset: [f64; 3]) -> Result<ShapeId, OpError> {
    let moved = scratch.transform(shape, &Transform::Translation(offset))?;
    scratch.track(moved);
    scratch.release(shape);
    Ok(moved)
}

/// Axis-aligned box. Uncentered, one corner sits on the origin; centered, the
/// box is symmetric about it.
pub fn make_box(kb: &mut dyn KernelBundle, size: Vec3, center: bool) -> Result<ShapeId, OpError> {
    debug!(?size, center, "box");
    let mut scratch = Scratch::new(kb);
    let mut shape = scratch.make_box(size.x, size.y, size.z)?;
    scratch.track(shape);
    if center {
        shape = shifted(&mut scratch, shape, (-size * 0.5).to_array())?;
    }
    Ok(scratch.keep(shape))
}

/// Sphere on the origin. `center` is accepted for symmetry with the other
/// constructors; a sphere is always centered.
pub fn make_sphere(kb: &mut dyn KernelBundle, radius: f64, _center: bool) -> Result<ShapeId, OpError> {
    debug!(radius, "sphere");
    Ok(kb.make_sphere(radius)?)
}

/// Cylinder along Z with its base on z=0, or shifted down by `height / 2`
/// when centered.
pub fn make_cylinder(
    kb: &mut dyn KernelBundle,
    radius: f64,
    height: f64,
    center: bool,
) -> Result<ShapeId, OpError> {
    debug!(radius, height, center, "cylinder");
    let mut scratch = Scratch::new(kb);
    let mut shape = scratch.make_cylinder(radius, height)?;
    scratch.track(shape);
    if center {
        shape = shifted(&mut scratch, shape, [0.0, 0.0, -height / 2.0])?;
    }
    Ok(scratch.keep(shape))
}

/// Cylindrical shell: an outer cylinder minus a bore of radius
/// `radius - wall`.
///
/// The bore is [`PIPE_CLEARANCE`] taller than the pipe and sticks out by half
/// of that at both ends, so no end face of the cut is coplanar.
pub fn make_pipe(
    kb: &mut dyn KernelBundle,
    radius: f64,
    wall: f64,
    height: f64,
    center: bool,
) -> Result<ShapeId, OpError> {
    debug!(radius, wall, height, center, "pipe");
    let mut scratch = Scratch::new(kb);

    let outer = scratch.make_cylinder(radius, height)?;
    scratch.track(outer);
    let bore = scratch.make_cylinder(radius - wall, height + PIPE_CLEARANCE)?;
    scratch.track(bore);
    let bore = shifted(&mut scratch, bore, [0.0, 0.0, -PIPE_CLEARANCE / 2.0])?;

    let mut shape = scratch.boolean_subtract(outer, bore)?;
    scratch.track(shape);
    scratch.release(outer);
    scratch.release(bore);

    if center {
        shape = shifted(&mut scratch, shape, [0.0, 0.0, -height / 2.0])?;
    }
    Ok(scratch.keep(shape))
}

/// Box with every edge rounded to `radius`. Only the rounded solid survives.
pub fn make_rounded_box(
    kb: &mut dyn KernelBundle,
    size: Vec3,
    radius: f64,
    center: bool,
) -> Result<ShapeId, OpError> {
    let base = make_box(kb, size, center)?;
    let mut scratch = Scratch::new(kb);
    scratch.track(base);
    let rounded = fillet_all(&mut *scratch, base, radius)?;
    Ok(scratch.keep(rounded))
}
