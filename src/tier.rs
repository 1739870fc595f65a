//! 画质档位选择
//!
//! 按严格优先级把设备能力和用户请求映射为一个档位和激活计划：
//!
//! 1. 用户没有请求任何高级功能 → `Disabled`
//! 2. 设备有硬件光线追踪 → `Hardware`，路径追踪以 High 预设叠加
//! 3. 光线追踪API可用 → `Software`，路径追踪 Medium 预设
//! 4. 其它 → `Approximation`，基础反射/阴影增强加 Minimal 预设
//!
//! 超分辨率和帧生成只由各自的硬件标志和用户请求决定，与光线追踪档位无关。

use crate::features::PathTracingPreset;
use fidelity_engine_hardware::DeviceCapabilities;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 画质档位，按视觉保真度和设备要求排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Disabled,
    Approximation,
    Software,
    Hardware,
}

impl QualityTier {
    /// 该档位叠加的路径追踪预设
    pub fn path_tracing_preset(self) -> Option<PathTracingPreset> {
        match self {
            QualityTier::Disabled => None,
            QualityTier::Approximation => Some(PathTracingPreset::Minimal),
            QualityTier::Software => Some(PathTracingPreset::Medium),
            QualityTier::Hardware => Some(PathTracingPreset::High),
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 用户请求的高级功能
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureRequest {
    pub ray_tracing: bool,
    pub upscaling: bool,
    pub frame_generation: bool,
}

impl FeatureRequest {
    /// 请求全部功能
    pub fn all() -> Self {
        Self {
            ray_tracing: true,
            upscaling: true,
            frame_generation: true,
        }
    }

    /// 是否请求了任一功能
    pub fn any(&self) -> bool {
        self.ray_tracing || self.upscaling || self.frame_generation
    }
}

/// 激活计划
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationPlan {
    pub tier: QualityTier,
    pub ray_tracing: bool,
    pub upscaling: bool,
    pub frame_generation: bool,
    /// 光线追踪启用时叠加的路径追踪预设
    pub path_tracing: Option<PathTracingPreset>,
}

impl ActivationPlan {
    pub fn disabled() -> Self {
        Self {
            tier: QualityTier::Disabled,
            ray_tracing: false,
            upscaling: false,
            frame_generation: false,
            path_tracing: None,
        }
    }
}

impl Default for ActivationPlan {
    fn default() -> Self {
        Self::disabled()
    }
}

/// 选择档位并生成激活计划
pub fn select_tier(
    caps: &DeviceCapabilities,
    ray_tracing_api_available: bool,
    request: FeatureRequest,
) -> ActivationPlan {
    if !request.any() {
        tracing::info!(target: "tier", "No advanced feature requested, tier Disabled");
        return ActivationPlan::disabled();
    }

    let tier = if caps.has_hardware_rt {
        QualityTier::Hardware
    } else if ray_tracing_api_available {
        QualityTier::Software
    } else {
        QualityTier::Approximation
    };

    let plan = ActivationPlan {
        tier,
        ray_tracing: request.ray_tracing,
        upscaling: request.upscaling && caps.has_upscaling_hw,
        frame_generation: request.frame_generation && caps.has_frame_gen_hw,
        path_tracing: if request.ray_tracing {
            tier.path_tracing_preset()
        } else {
            None
        },
    };

    tracing::info!(
        target: "tier",
        "Selected tier {} for '{}' (ray tracing: {}, upscaling: {}, frame generation: {}, path tracing: {:?})",
        plan.tier,
        caps.device_name,
        plan.ray_tracing,
        plan.upscaling,
        plan.frame_generation,
        plan.path_tracing
    );
    plan
}
