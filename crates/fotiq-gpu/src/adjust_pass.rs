//! The per-pixel adjustment compute pass.

use fotiq_core::transform::uniforms::RenderUniforms;

use crate::buffers::{CurveTexture, GpuImage};
use crate::layout::{
    create_compute_pipeline, storage_ro_entry, storage_rw_entry, texture_1d_entry, uniform_entry,
};

const WORKGROUP_SIZE: u32 = 8;

/// Evaluates the adjustment pipeline for every pixel of a render target.
pub struct AdjustPass {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    uniforms: wgpu::Buffer,
}

impl AdjustPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_size = std::mem::size_of::<RenderUniforms>() as u64;
        let (pipeline, layout) = create_compute_pipeline(
            device,
            "adjust",
            include_str!("../shaders/adjust.wgsl"),
            &[
                storage_ro_entry(0),
                texture_1d_entry(1),
                uniform_entry(2, uniform_size),
                storage_rw_entry(3, 16),
            ],
        );
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fotiq_adjust_uniforms"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            pipeline,
            layout,
            uniforms,
        }
    }

    /// Write `uniforms` and record one dispatch covering `target`.
    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        source: &GpuImage,
        curve: &CurveTexture,
        target: &GpuImage,
        uniforms: &RenderUniforms,
    ) {
        queue.write_buffer(&self.uniforms, 0, uniforms.as_bytes());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fotiq_adjust_bg"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: source.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&curve.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: target.buffer.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("fotiq_adjust_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(
            target.width.div_ceil(WORKGROUP_SIZE),
            target.height.div_ceil(WORKGROUP_SIZE),
            1,
        );
    }
}
