//! GPU能力探测
//!
//! 根据设备标识字符串推断厂商家族以及光线追踪、超分辨率、帧生成的硬件支持。
//! 探测是纯函数：同一设备字符串总是得到同一结果，且永不失败。

use serde::{Deserialize, Serialize};

/// GPU厂商家族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VendorFamily {
    /// NVIDIA RTX 系列
    NvidiaRtx,
    /// AMD RDNA 架构（RX 6000 / RX 7000）
    AmdRdna,
    /// Intel Arc 独立显卡
    IntelArc,
    /// 未知或不支持的设备
    Other,
}

/// 设备能力记录
///
/// 启动时计算一次，之后只读共享。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    pub vendor_family: VendorFamily,
    pub has_hardware_rt: bool,
    /// 仅 NVIDIA RTX
    pub has_upscaling_hw: bool,
    /// 仅 NVIDIA RTX 40 系列
    pub has_frame_gen_hw: bool,
    /// 原始设备名，仅用于诊断
    pub device_name: String,
}

impl DeviceCapabilities {
    /// 无任何高级能力的设备
    pub fn unsupported(device_name: impl Into<String>) -> Self {
        Self {
            vendor_family: VendorFamily::Other,
            has_hardware_rt: false,
            has_upscaling_hw: false,
            has_frame_gen_hw: false,
            device_name: device_name.into(),
        }
    }
}

const NVIDIA_VENDOR_MARKERS: &[&str] = &["nvidia", "geforce"];
const NVIDIA_RTX_MARKERS: &[&str] = &["rtx", "geforce 20", "geforce 30", "geforce 40"];
const NVIDIA_RTX_40_MARKERS: &[&str] = &["rtx 40", "geforce 40", "4060", "4070", "4080", "4090"];
const AMD_RDNA_MARKERS: &[&str] = &["rx 6", "rx 7"];
const INTEL_ARC_MARKERS: &[&str] = &["arc"];

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| haystack.contains(marker))
}

/// 按顺序匹配厂商谓词，第一个命中的家族胜出
fn classify(normalized: &str) -> VendorFamily {
    if contains_any(normalized, NVIDIA_VENDOR_MARKERS) && contains_any(normalized, NVIDIA_RTX_MARKERS) {
        VendorFamily::NvidiaRtx
    } else if contains_any(normalized, AMD_RDNA_MARKERS) {
        VendorFamily::AmdRdna
    } else if contains_any(normalized, INTEL_ARC_MARKERS) {
        VendorFamily::IntelArc
    } else {
        VendorFamily::Other
    }
}

/// 探测设备能力
pub fn probe(device_name: &str) -> DeviceCapabilities {
    let normalized = device_name.to_lowercase();
    let family = classify(&normalized);

    let caps = match family {
        VendorFamily::NvidiaRtx => DeviceCapabilities {
            vendor_family: family,
            has_hardware_rt: true,
            has_upscaling_hw: true,
            has_frame_gen_hw: contains_any(&normalized, NVIDIA_RTX_40_MARKERS),
            device_name: device_name.to_string(),
        },
        VendorFamily::AmdRdna | VendorFamily::IntelArc => DeviceCapabilities {
            vendor_family: family,
            has_hardware_rt: true,
            has_upscaling_hw: false,
            has_frame_gen_hw: false,
            device_name: device_name.to_string(),
        },
        VendorFamily::Other => {
            tracing::warn!(
                target: "hardware",
                "Unrecognized graphics device '{}', advanced rendering features unavailable",
                device_name
            );
            DeviceCapabilities::unsupported(device_name)
        }
    };

    tracing::info!(
        target: "hardware",
        "Probed '{}': family={:?} hw_rt={} upscaling={} frame_gen={}",
        caps.device_name,
        caps.vendor_family,
        caps.has_hardware_rt,
        caps.has_upscaling_hw,
        caps.has_frame_gen_hw
    );

    caps
}
