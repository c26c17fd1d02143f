//! glbview - GLB model viewer with skeletal animation
//!
//! Loads a binary glTF (GLB) file, plays its skeletal animations and
//! renders the skinned result with a dynamically updated texture fed
//! from an external pixel source.

pub mod animation;
pub mod core;
pub mod document;
pub mod render;
pub mod scene;
pub mod viewer;
