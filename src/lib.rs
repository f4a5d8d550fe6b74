pub mod capture;
pub mod display;
pub mod pipeline;
pub mod process;
pub mod utils;

use arc_swap::ArcSwap;
use capture::frame::PixelFormat;
use serde::{Deserialize, Serialize};

use crate::utils::FoundDevice;

/// Global configuration that can be atomically swapped at runtime
pub static CONFIG: once_cell::sync::Lazy<ArcSwap<Config>> =
    once_cell::sync::Lazy::new(|| ArcSwap::from_pointee(Config::default()));

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
    pub display: DisplayConfig,
    pub process: ProcessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub device: FoundDevice,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: PixelFormat,
    pub buffer_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

/// Which transform runs on the capture worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProcessConfig {
    /// Stride-aware copy, no transform. Useful for latency measurement.
    Passthrough,
    /// Sobel gradient magnitude with a binary threshold.
    Sobel { threshold: u16 },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                device: FoundDevice::new("/dev/video0".into(), PixelFormat::Yuyv),
                width: 800,
                height: 600,
                fps: 30,
                format: PixelFormat::Yuyv,
                buffer_count: 4,
            },
            display: DisplayConfig {
                width: 800,
                height: 600,
                vsync: true,
            },
            process: ProcessConfig::Sobel { threshold: 160 },
        }
    }
}
