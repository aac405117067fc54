//! Compute device selection.
//!
//! Every entry point picks the best available accelerator the same way:
//! Metal on Apple hardware, then CUDA, then CPU.

use candle_core::Device;

use crate::error::Result;

/// Selects the best available compute device.
pub fn auto_device() -> Result<Device> {
    if candle_core::utils::metal_is_available() {
        Ok(Device::new_metal(0)?)
    } else if candle_core::utils::cuda_is_available() {
        Ok(Device::new_cuda(0)?)
    } else {
        Ok(Device::Cpu)
    }
}

/// Human-readable label for a device, for startup logging.
pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}
