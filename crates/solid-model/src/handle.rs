use std::fmt;

use cad_types::Rgba;
use serde::{Deserialize, Serialize};
use solid_kernel::{ShapeId, SharedKernel};
use tracing::debug;
use uuid::Uuid;

/// Stable identity of a solid within a session, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolidId(Uuid);

impl SolidId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SolidId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SolidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live kernel solid plus its display metadata.
///
/// The handle owns its shape: replacing the shape releases the previous one,
/// and dropping the handle releases the current one. Both lock the kernel,
/// so neither may happen while the caller already holds that lock.
pub struct SolidHandle {
    id: SolidId,
    shape: ShapeId,
    color: Option<Rgba>,
    name: Option<String>,
    kernel: SharedKernel,
}

impl SolidHandle {
    pub(crate) fn new(kernel: SharedKernel, shape: ShapeId) -> Self {
        let id = SolidId::new();
        debug!(solid = %id, %shape, "registered");
        Self {
            id,
            shape,
            color: None,
            name: None,
            kernel,
        }
    }

    pub fn id(&self) -> SolidId {
        self.id
    }

    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    pub fn color(&self) -> Option<Rgba> {
        self.color
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Point the handle at `shape`, releasing the shape it held before.
    pub(crate) fn set_shape(&mut self, shape: ShapeId) {
        if shape == self.shape {
            return;
        }
        let old = std::mem::replace(&mut self.shape, shape);
        self.kernel.lock().release(old);
        debug!(solid = %self.id, from = %old, to = %shape, "shape replaced");
    }

    pub(crate) fn set_color(&mut self, color: Rgba) {
        self.color = Some(color);
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }
}

impl fmt::Debug for SolidHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolidHandle")
            .field("id", &self.id)
            .field("shape", &self.shape)
            .field("color", &self.color)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Drop for SolidHandle {
    fn drop(&mut self) {
        self.kernel.lock().release(self.shape);
        debug!(solid = %self.id, shape = %self.shape, "released");
    }
}
