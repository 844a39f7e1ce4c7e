pub mod mock_kernel;
#[cfg(feature = "opencascade")]
pub mod occt_kernel;
pub mod primitives;
pub mod tessellation;
pub mod traits;
pub mod transform;
pub mod truck_kernel;
pub mod types;

pub use mock_kernel::{KernelCall, MockKernel};
#[cfg(feature = "opencascade")]
pub use occt_kernel::OcctKernel;
pub use traits::*;
pub use transform::{Axis, Transform};
pub use truck_kernel::TruckKernel;
pub use types::*;
