pub mod boolean;
pub mod constants;
pub mod fillet;
pub mod primitives;
pub mod scratch;
pub mod transform;
pub mod types;

pub use boolean::{execute_boolean, fuse_all, BooleanKind};
pub use fillet::{fillet, fillet_all, fillet_by_index, EdgeSelection};
pub use primitives::{make_box, make_cylinder, make_pipe, make_rounded_box, make_sphere};
pub use scratch::Scratch;
pub use transform::{rotate, scale, translate};
pub use types::*;
