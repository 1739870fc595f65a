//! 超分辨率质量模式
//!
//! 质量模式到内部渲染缩放比例的固定查找表。

use serde::{Deserialize, Serialize};

/// 超分辨率质量模式（五档，从性能优先到质量优先）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UpscalingQuality {
    /// 超性能模式
    UltraPerformance,
    /// 性能模式
    Performance,
    /// 平衡模式
    Balanced,
    /// 质量模式
    Quality,
    /// 超质量模式
    UltraQuality,
}

/// 按质量档位索引的渲染缩放比例
const RENDER_SCALES: [f32; 5] = [0.33, 0.50, 0.58, 0.67, 0.77];

impl UpscalingQuality {
    /// 所有档位，按序数排列
    pub const ALL: [UpscalingQuality; 5] = [
        UpscalingQuality::UltraPerformance,
        UpscalingQuality::Performance,
        UpscalingQuality::Balanced,
        UpscalingQuality::Quality,
        UpscalingQuality::UltraQuality,
    ];

    /// 档位序数（0..=4）
    pub fn index(self) -> usize {
        self as usize
    }

    /// 从序数构造，越界返回 None
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 获取内部渲染分辨率缩放比例
    pub fn render_scale(self) -> f32 {
        RENDER_SCALES[self.index()]
    }

    /// 按缩放比例计算内部渲染分辨率
    pub fn render_resolution(self, display_width: u32, display_height: u32) -> (u32, u32) {
        let scale = self.render_scale();
        (
            (display_width as f32 * scale).round() as u32,
            (display_height as f32 * scale).round() as u32,
        )
    }
}

impl Default for UpscalingQuality {
    fn default() -> Self {
        UpscalingQuality::Balanced
    }
}
