//! wgpu implementation of [`RenderBackend`].

use std::sync::Arc;

use fotiq_core::config::EngineConfig;
use fotiq_core::error::{EngineError, Result};
use fotiq_core::image::{BitDepth, LinearImage};
use fotiq_core::scopes::{HistogramData, histogram};
use fotiq_core::transform::params::AdjustmentState;
use fotiq_core::transform::render::{RenderBackend, check_target_size};
use fotiq_core::transform::uniforms::{OutputMode, RenderUniforms};

use crate::adjust_pass::AdjustPass;
use crate::buffers::{CurveTexture, GpuImage, check_fits};
use crate::context::GpuContext;
use crate::histogram_pass::HistogramPass;
use crate::readback::Readback;

struct LoadedSource {
    image: GpuImage,
    bit_depth: BitDepth,
    /// Histogram served before the first render.
    histogram: HistogramData,
}

/// Renders adjustment states with compute passes on a wgpu device.
///
/// Every render runs the adjustment pass, the histogram pass and the
/// readback copies in one submission, then blocks until the results are
/// mapped.
pub struct GpuRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: EngineConfig,
    adjust: AdjustPass,
    histogram: HistogramPass,
    curve: CurveTexture,
    readback: Readback,
    source: Option<LoadedSource>,
    /// Reused while consecutive renders keep the same size.
    target: Option<GpuImage>,
    frame_histogram: Option<HistogramData>,
    output_mode: OutputMode,
}

impl GpuRenderer {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, config: EngineConfig) -> Self {
        let adjust = AdjustPass::new(&device);
        let histogram = HistogramPass::new(&device);
        let curve = CurveTexture::new(&device, &queue);
        Self {
            device,
            queue,
            config: config.sanitized(),
            adjust,
            histogram,
            curve,
            readback: Readback::default(),
            source: None,
            target: None,
            frame_histogram: None,
            output_mode: OutputMode::Normal,
        }
    }

    pub fn from_context(context: &GpuContext, config: EngineConfig) -> Self {
        Self::new(Arc::clone(&context.device), Arc::clone(&context.queue), config)
    }

    /// Largest width or height this renderer accepts: the configured limit or
    /// the device's 2D texture limit, whichever is smaller.
    pub fn max_dimension(&self) -> u32 {
        self.config
            .max_render_dimension
            .min(self.device.limits().max_texture_dimension_2d)
    }

    fn check_size(&self, width: u32, height: u32) -> Result<()> {
        check_target_size(width, height, self.max_dimension())?;
        check_fits(&self.device, width, height)?;
        Ok(())
    }

    fn ensure_target(&mut self, width: u32, height: u32) {
        if self.target.as_ref().is_some_and(|t| t.size() == [width, height]) {
            return;
        }
        tracing::debug!(width, height, "allocating render target");
        self.target = Some(GpuImage::create_output(&self.device, width, height));
    }

    /// Grade into the target and read back the pixels with their histogram.
    fn draw(
        &mut self,
        state: &AdjustmentState,
        width: u32,
        height: u32,
    ) -> Result<(LinearImage, HistogramData)> {
        let (source_size, bit_depth) = match &self.source {
            Some(s) => (s.image.size(), s.bit_depth),
            None => return Err(EngineError::NoSourceImage),
        };
        self.check_size(width, height)?;

        let start = std::time::Instant::now();
        let uniforms = RenderUniforms::from_state(state, source_size, [width, height], self.output_mode);
        if uniforms.has_curve != 0 {
            self.curve.write(&self.queue, state.tone_curve().lut());
        }

        self.ensure_target(width, height);
        let (Some(source), Some(target)) = (&self.source, &self.target) else {
            return Err(EngineError::NoSourceImage);
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fotiq_render_encoder"),
            });
        self.adjust.encode(
            &self.device,
            &self.queue,
            &mut encoder,
            &source.image,
            &self.curve,
            target,
            &uniforms,
        );
        self.histogram
            .encode(&self.device, &self.queue, &mut encoder, target);
        self.readback
            .encode(&self.device, &mut encoder, target, &self.histogram.bins);
        self.queue.submit(std::iter::once(encoder.finish()));

        let (frame, histogram) = self
            .readback
            .read(&self.device, width, height, bit_depth)?;
        tracing::debug!(width, height, elapsed = ?start.elapsed(), "gpu render complete");
        Ok((frame, histogram))
    }
}

impl RenderBackend for GpuRenderer {
    fn load_image(&mut self, image: LinearImage) -> Result<()> {
        self.check_size(image.width, image.height)?;
        if image.pixels.len() != image.width as usize * image.height as usize {
            return Err(EngineError::UnsupportedInput(format!(
                "{} pixels do not fill {}x{}",
                image.pixels.len(),
                image.width,
                image.height
            )));
        }
        tracing::info!(
            width = image.width,
            height = image.height,
            "uploading source image"
        );
        self.source = Some(LoadedSource {
            image: GpuImage::upload(&self.device, &image),
            bit_depth: image.source_bit_depth,
            histogram: histogram::compute(&image),
        });
        self.frame_histogram = None;
        Ok(())
    }

    fn source_size(&self) -> Option<[u32; 2]> {
        self.source.as_ref().map(|s| s.image.size())
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    fn render(&mut self, state: &AdjustmentState) -> Result<LinearImage> {
        let [width, height] = self.source_size().ok_or(EngineError::NoSourceImage)?;
        let (frame, histogram) = self.draw(state, width, height)?;
        self.frame_histogram = Some(histogram);
        Ok(frame)
    }

    fn render_scaled(
        &mut self,
        state: &AdjustmentState,
        width: u32,
        height: u32,
    ) -> Result<LinearImage> {
        let (frame, _) = self.draw(state, width, height)?;
        Ok(frame)
    }

    fn histogram(&self) -> Result<HistogramData> {
        self.frame_histogram
            .as_ref()
            .or(self.source.as_ref().map(|s| &s.histogram))
            .cloned()
            .ok_or(EngineError::NoSourceImage)
    }
}
