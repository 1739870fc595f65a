//! AI超分辨率控制器
//!
//! 以较低的内部分辨率渲染后放大到输出分辨率。质量档位到渲染比例的映射见
//! [`UpscalingQuality::render_scale`]。

use super::{FeatureController, FeatureKind, FeatureState, Lifecycle, RenderContext};
use crate::core::error::FeatureResult;
use crate::host::{AnisotropicFiltering, RenderParam};
use fidelity_engine_hardware::{DeviceCapabilities, UpscalingQuality};

/// 启用后的抗锯齿采样数
pub const UPSCALING_ANTI_ALIASING: i32 = 4;

/// 超分辨率控制器
#[derive(Debug)]
pub struct UpscalingController {
    lifecycle: Lifecycle,
    quality: UpscalingQuality,
}

impl UpscalingController {
    pub fn new(quality: UpscalingQuality) -> Self {
        Self {
            lifecycle: Lifecycle::new(FeatureKind::Upscaling),
            quality,
        }
    }

    pub fn quality(&self) -> UpscalingQuality {
        self.quality
    }

    /// 当前质量档位对应的渲染比例
    pub fn render_scale(&self) -> f32 {
        self.quality.render_scale()
    }

    pub fn is_enabled(&self) -> bool {
        self.lifecycle.is_enabled()
    }

    pub fn enable(&mut self, ctx: &mut RenderContext<'_>) -> FeatureResult<()> {
        self.lifecycle.check_enable()?;
        self.apply_quality(ctx);
        self.lifecycle.mark_enabled();
        tracing::info!(target: "upscaling", "Upscaling enabled at {:?}", self.quality);
        Ok(())
    }

    /// 修改质量档位，启用状态下立即重新应用
    pub fn set_quality(
        &mut self,
        ctx: &mut RenderContext<'_>,
        quality: UpscalingQuality,
    ) -> FeatureResult<()> {
        self.lifecycle.check_configure("set upscaling quality")?;
        self.quality = quality;
        self.apply_quality(ctx);
        Ok(())
    }

    fn apply_quality(&self, ctx: &mut RenderContext<'_>) {
        let owner = FeatureKind::Upscaling;
        let scale = self.quality.render_scale();

        ctx.set(owner, RenderParam::RenderScale, scale);
        ctx.set(owner, RenderParam::AntiAliasing, UPSCALING_ANTI_ALIASING);
        ctx.set(owner, RenderParam::AnisotropicFiltering, AnisotropicFiltering::ForceEnable);

        let (width, height) = ctx.host.screen_size();
        let (render_width, render_height) = self.quality.render_resolution(width, height);
        tracing::info!(
            target: "upscaling",
            "Upscaling {:?}: rendering {}x{} -> output {}x{} (scale {:.2})",
            self.quality,
            render_width,
            render_height,
            width,
            height,
            scale
        );
    }
}

impl FeatureController for UpscalingController {
    fn kind(&self) -> FeatureKind {
        FeatureKind::Upscaling
    }

    fn state(&self) -> FeatureState {
        self.lifecycle.state()
    }

    fn attach(&mut self, caps: &DeviceCapabilities) -> FeatureState {
        self.lifecycle.attach(&caps.device_name, caps.has_upscaling_hw)
    }

    fn disable(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.lifecycle.mark_disabled() {
            return;
        }
        let restored = ctx.restore(FeatureKind::Upscaling);
        tracing::info!(target: "upscaling", "Upscaling disabled, {} settings restored", restored);
    }
}
