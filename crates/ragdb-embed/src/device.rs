use candle_core::Device;
use tracing::info;

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            info!("inference device: Metal (MPS)");
            return dev;
        }
    }
    info!("inference device: CPU");
    Device::Cpu
}
