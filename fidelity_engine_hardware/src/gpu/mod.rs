//! GPU能力探测模块

pub mod detect;

pub use detect::{probe, DeviceCapabilities, VendorFamily};
