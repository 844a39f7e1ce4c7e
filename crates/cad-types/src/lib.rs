pub mod color;
pub mod format;
pub mod link;
pub mod vec3;

pub use color::*;
pub use format::*;
pub use link::*;
pub use vec3::*;
