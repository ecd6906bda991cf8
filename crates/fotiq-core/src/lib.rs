//! FOTIQ Core: domain layer for non-destructive photo adjustment.
//!
//! This crate contains the edit data model, color science, grading math,
//! masks, history, the sidecar format, and a CPU reference renderer. No GPU
//! dependencies; `fotiq-gpu` implements [`RenderBackend`] on wgpu.

pub mod color_management;
pub mod config;
pub mod error;
pub mod frame;
pub mod grading;
pub mod history;
pub mod image;
pub mod mask;
pub mod scopes;
pub mod session;
pub mod sidecar;
pub mod transform;

// Re-exports for convenience.
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use history::EditHistory;
pub use image::{BitDepth, LinearImage, PixelData};
pub use mask::{Mask, MaskGeometry, MaskKind};
pub use scopes::HistogramData;
pub use session::{EditSession, Engine};
pub use sidecar::Sidecar;
pub use transform::evaluate::evaluate_transform;
pub use transform::params::{AdjustmentState, EditCommand, GradingParams, apply_adjustment};
pub use transform::render::{CpuRenderer, RenderBackend};
pub use transform::uniforms::{OutputMode, RenderUniforms};
