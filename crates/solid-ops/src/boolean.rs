//! Boolean algebra on kernel shapes.

use solid_kernel::{KernelBundle, ShapeId};
use tracing::debug;

use crate::scratch::Scratch;
use crate::types::OpError;

/// Boolean operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanKind {
    Union,
    Subtract,
    Intersect,
}

/// Execute a boolean operation between two solids.
///
/// Neither input is released; both stay owned by the caller.
pub fn execute_boolean(
    kb: &mut dyn KernelBundle,
    a: ShapeId,
    b: ShapeId,
    kind: BooleanKind,
) -> Result<ShapeId, OpError> {
    debug!(%a, %b, ?kind, "boolean");
    let result = match kind {
        BooleanKind::Union => kb.boolean_union(a, b)?,
        BooleanKind::Subtract => kb.boolean_subtract(a, b)?,
        BooleanKind::Intersect => kb.boolean_intersect(a, b)?,
    };
    Ok(result)
}

/// Fold a list of solids into one by successive unions, left to right.
///
/// Returns `None` for an empty list. A single solid comes back as itself, so
/// the caller should only release the result when it is not one of the
/// inputs. Partial unions are released as the fold advances; the inputs
/// never are.
pub fn fuse_all(kb: &mut dyn KernelBundle, shapes: &[ShapeId]) -> Result<Option<ShapeId>, OpError> {
    let Some((&first, rest)) = shapes.split_first() else {
        return Ok(None);
    };
    let mut scratch = Scratch::new(kb);
    let mut acc = first;
    for &next in rest {
        let fused = scratch.boolean_union(acc, next)?;
        scratch.track(fused);
        if acc != first {
            scratch.release(acc);
        }
        acc = fused;
    }
    debug!(count = shapes.len(), result = %acc, "fused");
    Ok(Some(scratch.keep(acc)))
}
