//! Headless device creation.

use std::sync::Arc;

use crate::error::GpuError;

/// Features the backend relies on beyond the WebGPU baseline. None today.
pub fn required_features() -> wgpu::Features {
    wgpu::Features::empty()
}

/// A device and queue opened for offscreen rendering.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Open the preferred adapter and block until the device is ready.
    pub fn new_blocking() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            ..Default::default()
        }))?;
        let adapter_info = adapter.get_info();

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("fotiq_device"),
            required_features: required_features(),
            required_limits: adapter.limits(),
            ..Default::default()
        }))?;

        tracing::info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            "opened GPU device"
        );
        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }
}
