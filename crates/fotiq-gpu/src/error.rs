//! GPU backend errors.

use fotiq_core::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The image needs a buffer larger than the device allows.
    #[error("{width}x{height} image needs {bytes} bytes, device limit is {limit}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        bytes: u64,
        limit: u64,
    },

    #[error("GPU readback failed: {0}")]
    Readback(String),
}

impl From<GpuError> for EngineError {
    fn from(err: GpuError) -> Self {
        match err {
            GpuError::Readback(_) => EngineError::Backend(err.to_string()),
            _ => EngineError::UnsupportedInput(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_errors_are_unsupported_input() {
        let err = GpuError::ImageTooLarge {
            width: 70_000,
            height: 70_000,
            bytes: 78_400_000_000,
            limit: 134_217_728,
        };
        assert!(matches!(EngineError::from(err), EngineError::UnsupportedInput(_)));
    }

    #[test]
    fn test_readback_failure_is_backend_error() {
        let err = GpuError::Readback("device lost".to_string());
        assert!(matches!(EngineError::from(err), EngineError::Backend(_)));
    }
}
