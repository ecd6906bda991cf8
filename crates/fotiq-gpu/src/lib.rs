//! FOTIQ GPU: wgpu compute backend for the adjustment pipeline.
//!
//! [`GpuRenderer`] implements [`fotiq_core::RenderBackend`]. Source and
//! rendered images live in `vec4<f32>` storage buffers; the point curve is a
//! 1D lookup texture. Results come back through blocking buffer readback.

pub mod adjust_pass;
pub mod buffers;
pub mod context;
pub mod error;
pub mod histogram_pass;
mod layout;
pub mod pipeline;
pub mod readback;

pub use context::{GpuContext, required_features};
pub use error::GpuError;
pub use pipeline::GpuRenderer;
