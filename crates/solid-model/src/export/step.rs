//! Best-effort STEP writer.
//!
//! All solids are fused into one shape and written as a single B-rep; color
//! and name are dropped. Every failure is reported as a [`StepFailure`]
//! instead of an error so the rest of an export can go on.

use std::path::Path;

use solid_kernel::KernelBundle;
use solid_ops::{fuse_all, Scratch};
use tracing::info;

use crate::errors::StepFailure;
use crate::export::ExportSolid;

pub fn write_step(
    kb: &mut dyn KernelBundle,
    solids: &[ExportSolid],
    path: &Path,
) -> Result<(), StepFailure> {
    let shapes: Vec<_> = solids.iter().map(|s| s.shape).collect();

    let mut scratch = Scratch::new(kb);
    let fused = fuse_all(&mut *scratch, &shapes)?.ok_or(StepFailure::Empty)?;
    if !shapes.contains(&fused) {
        scratch.track(fused);
    }
    let text = scratch.write_step(fused)?;
    drop(scratch);

    std::fs::write(path, text).map_err(|e| StepFailure::Io(e.to_string()))?;
    info!(path = %path.display(), solids = solids.len(), "wrote STEP");
    Ok(())
}
