//! Histogram of a rendered frame, accumulated with atomics on the GPU.

use fotiq_core::scopes::histogram::HISTOGRAM_BINS;

use crate::buffers::GpuImage;
use crate::layout::{create_compute_pipeline, storage_ro_entry, storage_rw_entry, uniform_entry};

const WORKGROUP_SIZE: u32 = 16;

/// Byte size of the red, green and blue bin arrays.
pub const BINS_BYTES: u64 = (HISTOGRAM_BINS * 3 * 4) as u64;

pub struct HistogramPass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    dims: wgpu::Buffer,
    /// Atomic bins written by the shader and copied out for readback.
    pub bins: wgpu::Buffer,
}

impl HistogramPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let (pipeline, layout) = create_compute_pipeline(
            device,
            "histogram",
            include_str!("../shaders/histogram.wgsl"),
            &[
                storage_ro_entry(0),
                storage_rw_entry(1, BINS_BYTES),
                uniform_entry(2, 16),
            ],
        );
        let dims = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fotiq_histogram_dims"),
            size: 16,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bins = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fotiq_histogram_bins"),
            size: BINS_BYTES,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            pipeline,
            layout,
            dims,
            bins,
        }
    }

    /// Clear the bins and record a pass over `frame`.
    pub fn encode(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        frame: &GpuImage,
    ) {
        queue.write_buffer(
            &self.dims,
            0,
            bytemuck::cast_slice(&[frame.width, frame.height, 0, 0]),
        );
        encoder.clear_buffer(&self.bins, 0, None);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fotiq_histogram_bg"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.bins.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.dims.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("fotiq_histogram_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(
            frame.width.div_ceil(WORKGROUP_SIZE),
            frame.height.div_ceil(WORKGROUP_SIZE),
            1,
        );
    }
}
