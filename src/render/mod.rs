//! GPU resource management and frame rendering

pub mod context;
pub mod frame;
pub mod mesh;
pub mod pipeline;
pub mod texture;

pub use context::GpuContext;
pub use frame::FrameRenderer;
pub use texture::FeedTexture;
