//! 设备能力探测
//!
//! 从设备标识字符串推断GPU厂商家族，以及光线追踪、AI超分辨率、帧生成的硬件支持，
//! 并提供超分辨率质量档位的渲染缩放查找表。

pub mod gpu;
pub mod upscaling;

// Re-export public API
pub use gpu::{probe, DeviceCapabilities, VendorFamily};
pub use upscaling::UpscalingQuality;
