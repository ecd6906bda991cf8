//! Blocking readback of render targets and histogram bins.

use fotiq_core::image::{BitDepth, LinearImage};
use fotiq_core::scopes::HistogramData;

use crate::buffers::GpuImage;
use crate::error::GpuError;
use crate::histogram_pass::BINS_BYTES;

/// Staging buffers reused across frames. The image buffer grows on demand.
#[derive(Default)]
pub struct Readback {
    image_staging: Option<wgpu::Buffer>,
    bins_staging: Option<wgpu::Buffer>,
}

impl Readback {
    /// Record copies of `frame` and `bins` into the staging buffers.
    pub fn encode(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        frame: &GpuImage,
        bins: &wgpu::Buffer,
    ) {
        let size = frame.byte_size();
        let image_staging = staging(device, &mut self.image_staging, size, "fotiq_image_staging");
        encoder.copy_buffer_to_buffer(&frame.buffer, 0, image_staging, 0, size);

        let bins_staging = staging(device, &mut self.bins_staging, BINS_BYTES, "fotiq_bins_staging");
        encoder.copy_buffer_to_buffer(bins, 0, bins_staging, 0, BINS_BYTES);
    }

    /// Wait for the submitted copies and read both results.
    pub fn read(
        &self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
        bit_depth: BitDepth,
    ) -> Result<(LinearImage, HistogramData), GpuError> {
        let (Some(image_staging), Some(bins_staging)) = (&self.image_staging, &self.bins_staging)
        else {
            return Err(GpuError::Readback("nothing was encoded".to_string()));
        };
        let image_bytes = u64::from(width) * u64::from(height) * crate::buffers::PIXEL_BYTES;

        let image_mapped = map_read(image_staging.slice(..image_bytes));
        let bins_mapped = map_read(bins_staging.slice(..));
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::Readback(e.to_string()))?;
        await_map(image_mapped)?;
        await_map(bins_mapped)?;

        let data = image_staging.slice(..image_bytes).get_mapped_range();
        let pixels: Vec<[f32; 4]> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        image_staging.unmap();

        let data = bins_staging.slice(..).get_mapped_range();
        let bins: Vec<u32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        bins_staging.unmap();

        let histogram = HistogramData::from_flat(&bins)
            .ok_or_else(|| GpuError::Readback(format!("expected 768 bins, got {}", bins.len())))?;
        let image = LinearImage {
            width,
            height,
            pixels,
            source_bit_depth: bit_depth,
        };
        Ok((image, histogram))
    }
}

fn staging<'a>(
    device: &wgpu::Device,
    cache: &'a mut Option<wgpu::Buffer>,
    size: u64,
    label: &str,
) -> &'a wgpu::Buffer {
    if cache.as_ref().is_some_and(|buf| buf.size() < size) {
        *cache = None;
    }
    cache.get_or_insert_with(|| {
        tracing::debug!(label, size, "allocating staging buffer");
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        })
    })
}

type MapResult = std::sync::mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>;

fn map_read(slice: wgpu::BufferSlice<'_>) -> MapResult {
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    rx
}

fn await_map(rx: MapResult) -> Result<(), GpuError> {
    rx.recv()
        .map_err(|e| GpuError::Readback(e.to_string()))?
        .map_err(|e| GpuError::Readback(e.to_string()))
}
