//! GPU-resident images and the point-curve lookup texture.

use fotiq_core::grading::curves::{LUT_SIZE, identity_lut};
use fotiq_core::image::LinearImage;
use wgpu::util::DeviceExt;

use crate::error::GpuError;

/// Bytes per RGBA f32 pixel.
pub const PIXEL_BYTES: u64 = 16;

/// Largest image buffer the device can bind, in bytes.
pub fn max_image_bytes(device: &wgpu::Device) -> u64 {
    let limits = device.limits();
    u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size)
}

/// Fail when a `width × height` image does not fit one storage binding.
pub fn check_fits(device: &wgpu::Device, width: u32, height: u32) -> Result<u64, GpuError> {
    let bytes = u64::from(width) * u64::from(height) * PIXEL_BYTES;
    let limit = max_image_bytes(device);
    if bytes > limit {
        return Err(GpuError::ImageTooLarge {
            width,
            height,
            bytes,
            limit,
        });
    }
    Ok(bytes)
}

/// An RGBA f32 image stored row-major as a `vec4<f32>` storage buffer.
pub struct GpuImage {
    pub buffer: wgpu::Buffer,
    pub width: u32,
    pub height: u32,
}

impl GpuImage {
    /// Upload `image`. The caller checks the size with [`check_fits`].
    pub fn upload(device: &wgpu::Device, image: &LinearImage) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fotiq_source_image"),
            contents: bytemuck::cast_slice(&image.pixels),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });
        Self {
            buffer,
            width: image.width,
            height: image.height,
        }
    }

    /// Allocate an uninitialized render target.
    pub fn create_output(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fotiq_render_target"),
            size: u64::from(width) * u64::from(height) * PIXEL_BYTES,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            width,
            height,
        }
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    pub fn byte_size(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * PIXEL_BYTES
    }
}

/// The 256-entry point curve as a 1D `R32Float` texture, read with `textureLoad`.
pub struct CurveTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl CurveTexture {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fotiq_curve_lut"),
            size: wgpu::Extent3d {
                width: LUT_SIZE as u32,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D1,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("fotiq_curve_lut_view"),
            dimension: Some(wgpu::TextureViewDimension::D1),
            ..Default::default()
        });
        let curve = Self { texture, view };
        curve.write(queue, &identity_lut());
        curve
    }

    pub fn write(&self, queue: &wgpu::Queue, lut: &[f32; LUT_SIZE]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(lut),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(LUT_SIZE as u32 * 4),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: LUT_SIZE as u32,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }
}
