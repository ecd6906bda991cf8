//! Render orchestration: the backend trait and the CPU reference backend.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::image::LinearImage;
use crate::scopes::histogram::{self, HistogramData};
use crate::transform::evaluate::FrameTransform;
use crate::transform::params::AdjustmentState;
use crate::transform::uniforms::OutputMode;

/// A device that turns a source image and an adjustment state into pixels.
///
/// Implementations keep one source image and the displayed frame. Only
/// [`render`](Self::render) replaces the displayed frame, and histograms
/// describe it. Offscreen renders leave both alone.
pub trait RenderBackend {
    /// Replace the source image.
    fn load_image(&mut self, image: LinearImage) -> Result<()>;

    /// Dimensions of the loaded source, if any.
    fn source_size(&self) -> Option<[u32; 2]>;

    fn set_output_mode(&mut self, mode: OutputMode);

    /// Render the displayed frame at the source's size.
    fn render(&mut self, state: &AdjustmentState) -> Result<LinearImage>;

    /// Render offscreen at an arbitrary size. The displayed frame and its
    /// histogram are not touched.
    fn render_scaled(
        &mut self,
        state: &AdjustmentState,
        width: u32,
        height: u32,
    ) -> Result<LinearImage>;

    /// Histogram of the displayed frame, or of the source before any render.
    fn histogram(&self) -> Result<HistogramData>;
}

/// Reject target sizes the engine will not allocate.
pub fn check_target_size(width: u32, height: u32, max_dimension: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EngineError::UnsupportedInput(format!(
            "render target must be non-empty, got {width}x{height}"
        )));
    }
    if width > max_dimension || height > max_dimension {
        return Err(EngineError::UnsupportedInput(format!(
            "render target {width}x{height} exceeds the {max_dimension}px limit"
        )));
    }
    Ok(())
}

/// Reference backend evaluating the pipeline on the CPU.
#[derive(Debug, Default)]
pub struct CpuRenderer {
    config: EngineConfig,
    source: Option<LinearImage>,
    frame: Option<LinearImage>,
    output_mode: OutputMode,
}

impl CpuRenderer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// The displayed frame, if any.
    pub fn frame(&self) -> Option<&LinearImage> {
        self.frame.as_ref()
    }

    fn draw(&self, state: &AdjustmentState, width: u32, height: u32) -> Result<LinearImage> {
        let source = self.source.as_ref().ok_or(EngineError::NoSourceImage)?;
        check_target_size(width, height, self.config.max_render_dimension)?;

        let start = std::time::Instant::now();
        let frame = FrameTransform::new(source, state, self.output_mode).render(width, height);
        tracing::debug!(width, height, elapsed = ?start.elapsed(), "cpu render complete");
        Ok(frame)
    }
}

impl RenderBackend for CpuRenderer {
    fn load_image(&mut self, image: LinearImage) -> Result<()> {
        check_target_size(image.width, image.height, self.config.max_render_dimension)?;
        if image.pixels.len() != image.width as usize * image.height as usize {
            return Err(EngineError::UnsupportedInput(format!(
                "{} pixels do not fill {}x{}",
                image.pixels.len(),
                image.width,
                image.height
            )));
        }
        self.source = Some(image);
        self.frame = None;
        Ok(())
    }

    fn source_size(&self) -> Option<[u32; 2]> {
        self.source.as_ref().map(|s| [s.width, s.height])
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    fn render(&mut self, state: &AdjustmentState) -> Result<LinearImage> {
        let [width, height] = self.source_size().ok_or(EngineError::NoSourceImage)?;
        let frame = self.draw(state, width, height)?;
        self.frame = Some(frame.clone());
        Ok(frame)
    }

    fn render_scaled(
        &mut self,
        state: &AdjustmentState,
        width: u32,
        height: u32,
    ) -> Result<LinearImage> {
        self.draw(state, width, height)
    }

    fn histogram(&self) -> Result<HistogramData> {
        self.frame
            .as_ref()
            .or(self.source.as_ref())
            .map(histogram::compute)
            .ok_or(EngineError::NoSourceImage)
    }
}
