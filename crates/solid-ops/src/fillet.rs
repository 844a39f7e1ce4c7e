//! Fillet engine: round every edge or a subset picked by traversal index.

use std::collections::HashSet;

use solid_kernel::{EdgeId, KernelBundle, ShapeId};
use tracing::debug;

use crate::types::OpError;

/// Which edges of a solid to round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeSelection {
    All,
    /// Zero-based positions in the kernel's edge traversal order.
    Indices(HashSet<usize>),
}

impl EdgeSelection {
    pub fn indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::Indices(indices.into_iter().collect())
    }

    fn contains(&self, position: usize) -> bool {
        match self {
            Self::All => true,
            Self::Indices(set) => set.contains(&position),
        }
    }
}

/// Resolve a selection against the shape's edges, in traversal order.
pub fn select_edges(
    kb: &dyn KernelBundle,
    shape: ShapeId,
    selection: &EdgeSelection,
) -> Result<Vec<EdgeId>, OpError> {
    let edges = kb.as_introspect().explore_edges(shape)?;
    Ok(edges
        .into_iter()
        .enumerate()
        .filter(|(position, _)| selection.contains(*position))
        .map(|(_, edge)| edge)
        .collect())
}

/// Round the selected edges of `shape` with one fillet build.
///
/// The input shape is left alive. Indices past the last edge select nothing;
/// a selection that resolves to no edges is [`OpError::NoEdgesSelected`].
pub fn fillet(
    kb: &mut dyn KernelBundle,
    shape: ShapeId,
    selection: &EdgeSelection,
    radius: f64,
) -> Result<ShapeId, OpError> {
    if radius <= 0.0 {
        return Err(OpError::InvalidParameter {
            reason: "fillet radius must be positive".to_string(),
        });
    }

    let edges = select_edges(kb, shape, selection)?;
    if edges.is_empty() {
        return Err(OpError::NoEdgesSelected);
    }
    debug!(%shape, edges = edges.len(), radius, "fillet");

    Ok(kb.fillet_edges(shape, &edges, radius)?)
}

pub fn fillet_all(kb: &mut dyn KernelBundle, shape: ShapeId, radius: f64) -> Result<ShapeId, OpError> {
    fillet(kb, shape, &EdgeSelection::All, radius)
}

pub fn fillet_by_index(
    kb: &mut dyn KernelBundle,
    shape: ShapeId,
    indices: &[usize],
    radius: f64,
) -> Result<ShapeId, OpError> {
    fillet(kb, shape, &EdgeSelection::indices(indices.iter().copied()), radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solid_kernel::{Kernel, KernelCall, KernelIntrospect, MockKernel};

    fn last_fillet(kernel: &MockKernel) -> Option<Vec<u32>> {
        kernel.calls().iter().rev().find_map(|c| match c {
            KernelCall::Fillet { edges, .. } => Some(edges.clone()),
            _ => None,
        })
    }

    #[test]
    fn all_selects_every_edge() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(4.0, 4.0, 4.0).unwrap();
        fillet_all(&mut kernel, b, 0.5).unwrap();
        assert_eq!(last_fillet(&kernel), Some((0..12).collect()));
    }

    #[test]
    fn indices_keep_traversal_order() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(4.0, 4.0, 4.0).unwrap();
        fillet_by_index(&mut kernel, b, &[7, 2, 40], 0.5).unwrap();
        assert_eq!(last_fillet(&kernel), Some(vec![2, 7]));
    }

    #[test]
    fn empty_selection_is_reported_before_the_kernel() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(4.0, 4.0, 4.0).unwrap();
        let err = fillet_by_index(&mut kernel, b, &[99], 0.5).unwrap_err();
        assert!(matches!(err, OpError::NoEdgesSelected));
        assert_eq!(last_fillet(&kernel), None);
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(4.0, 4.0, 4.0).unwrap();
        assert!(matches!(
            fillet_all(&mut kernel, b, 0.0),
            Err(OpError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn oversized_radius_fails_the_whole_operation() {
        let mut kernel = MockKernel::new();
        let b = kernel.make_box(4.0, 4.0, 1.0).unwrap();
        assert!(matches!(fillet_all(&mut kernel, b, 0.6), Err(OpError::Kernel(_))));
        assert_eq!(kernel.live_shapes(), 1);
    }
}
