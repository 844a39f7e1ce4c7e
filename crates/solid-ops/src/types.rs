/// Errors from modeling operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpError {
    #[error("kernel error: {0}")]
    Kernel(#[from] solid_kernel::KernelError),

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("no edges selected for fillet")]
    NoEdgesSelected,
}
