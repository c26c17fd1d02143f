//! Node transforms and the scene hierarchy resolver

pub mod graph;
pub mod transform;

pub use graph::{Pose, global_transform};
pub use transform::Transform;
