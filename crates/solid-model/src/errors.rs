use std::path::PathBuf;

use cad_types::ColorParseError;
use serde::{Deserialize, Serialize};
use solid_kernel::KernelError;
use solid_ops::OpError;

use crate::handle::SolidId;

/// Errors surfaced by [`crate::Model`] and [`crate::SolidBuilder`].
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A geometry call was made before any kernel was attached.
    #[error("kernel not initialized: call Model::init or construct the model with a kernel")]
    KernelNotInitialized,

    #[error(transparent)]
    Op(#[from] OpError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("a solid cannot be combined with itself")]
    SameOperand,

    #[error("solid {id} was consumed by a boolean operation")]
    SolidConsumed { id: SolidId },

    /// The solid is registered with a different model.
    #[error("solid {id} does not belong to this model")]
    ForeignSolid { id: SolidId },

    #[error(transparent)]
    Color(#[from] ColorParseError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Failures of a mandatory export format.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Op(#[from] OpError),
}

/// Why the STEP writer produced no file. STEP output is best effort, so
/// these never abort an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StepFailure {
    /// The kernel build has no STEP writer.
    #[error("STEP output is not supported by this kernel")]
    Unsupported,

    #[error("kernel failed while preparing STEP output: {0}")]
    Kernel(String),

    #[error("could not write STEP file: {0}")]
    Io(String),

    #[error("no solids to export")]
    Empty,
}

impl From<KernelError> for StepFailure {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::NotSupported { .. } => StepFailure::Unsupported,
            other => StepFailure::Kernel(other.to_string()),
        }
    }
}

impl From<OpError> for StepFailure {
    fn from(err: OpError) -> Self {
        match err {
            OpError::Kernel(inner) => inner.into(),
            other => StepFailure::Kernel(other.to_string()),
        }
    }
}
