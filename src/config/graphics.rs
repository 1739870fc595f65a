use super::{ConfigError, ConfigResult};
use crate::features::frame_generation::{MAX_TARGET_FPS, MIN_TARGET_FPS};
use crate::impl_default;
use crate::tier::FeatureRequest;
use fidelity_engine_hardware::UpscalingQuality;
use serde::{Deserialize, Serialize};

/// 纹理质量取值范围（0=低, 1=中, 2=高, 3=超高）
pub const TEXTURE_QUALITY_RANGE: (i32, i32) = (0, 3);

/// 内部渲染缩放取值范围
pub const RENDER_SCALE_RANGE: (f32, f32) = (0.5, 2.0);

/// 用户图形选项
///
/// 键名与持久化配置文件中的名称一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// 光线追踪（需要RTX级别GPU）
    #[serde(rename = "EnableRayTracing")]
    pub enable_ray_tracing: bool,

    /// AI超分辨率（需要NVIDIA RTX GPU）
    #[serde(rename = "EnableDLSS")]
    pub enable_dlss: bool,

    /// 帧生成（需要RTX 40系列GPU）
    #[serde(rename = "EnableFrameGeneration")]
    pub enable_frame_generation: bool,

    /// 纹理质量等级
    #[serde(rename = "TextureQuality")]
    pub texture_quality: i32,

    /// 内部渲染分辨率缩放
    #[serde(rename = "RenderScale")]
    pub render_scale: f32,

    /// 超分辨率质量模式
    #[serde(rename = "UpscalingQuality")]
    pub upscaling_quality: UpscalingQuality,

    /// 帧生成目标帧率
    #[serde(rename = "FrameGenerationTargetFps")]
    pub frame_generation_target_fps: i32,
}

impl_default!(GraphicsConfig {
    enable_ray_tracing: false,
    enable_dlss: false,
    enable_frame_generation: false,
    texture_quality: 2,
    render_scale: 1.0,
    upscaling_quality: UpscalingQuality::Balanced,
    frame_generation_target_fps: 120,
});

impl GraphicsConfig {
    /// 用户请求的高级功能
    pub fn feature_request(&self) -> FeatureRequest {
        FeatureRequest {
            ray_tracing: self.enable_ray_tracing,
            upscaling: self.enable_dlss,
            frame_generation: self.enable_frame_generation,
        }
    }

    /// 验证配置，超出范围的值被拒绝
    pub fn validate(&self) -> ConfigResult<()> {
        let (tq_min, tq_max) = TEXTURE_QUALITY_RANGE;
        if !(tq_min..=tq_max).contains(&self.texture_quality) {
            return Err(ConfigError::ValidationError(format!(
                "TextureQuality {} outside [{}, {}]",
                self.texture_quality, tq_min, tq_max
            )));
        }

        let (rs_min, rs_max) = RENDER_SCALE_RANGE;
        if !(rs_min..=rs_max).contains(&self.render_scale) {
            return Err(ConfigError::ValidationError(format!(
                "RenderScale {} outside [{}, {}]",
                self.render_scale, rs_min, rs_max
            )));
        }

        if !(MIN_TARGET_FPS..=MAX_TARGET_FPS).contains(&self.frame_generation_target_fps) {
            return Err(ConfigError::ValidationError(format!(
                "FrameGenerationTargetFps {} outside [{}, {}]",
                self.frame_generation_target_fps, MIN_TARGET_FPS, MAX_TARGET_FPS
            )));
        }

        Ok(())
    }

    /// 把超出范围的值钳制到合法区间，返回每次调整的说明
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut adjustments = Vec::new();

        let (tq_min, tq_max) = TEXTURE_QUALITY_RANGE;
        let texture_quality = self.texture_quality.clamp(tq_min, tq_max);
        if texture_quality != self.texture_quality {
            adjustments.push(format!(
                "TextureQuality {} clamped to {}",
                self.texture_quality, texture_quality
            ));
            self.texture_quality = texture_quality;
        }

        let (rs_min, rs_max) = RENDER_SCALE_RANGE;
        let render_scale = if self.render_scale.is_finite() {
            self.render_scale.clamp(rs_min, rs_max)
        } else {
            1.0
        };
        if render_scale != self.render_scale {
            adjustments.push(format!(
                "RenderScale {} clamped to {}",
                self.render_scale, render_scale
            ));
            self.render_scale = render_scale;
        }

        let target_fps = self
            .frame_generation_target_fps
            .clamp(MIN_TARGET_FPS, MAX_TARGET_FPS);
        if target_fps != self.frame_generation_target_fps {
            adjustments.push(format!(
                "FrameGenerationTargetFps {} clamped to {}",
                self.frame_generation_target_fps, target_fps
            ));
            self.frame_generation_target_fps = target_fps;
        }

        for adjustment in &adjustments {
            tracing::warn!(target: "config", "{}", adjustment);
        }

        adjustments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GraphicsConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.feature_request().any());
    }

    #[test]
    fn test_sanitize_clamps() {
        let mut config = GraphicsConfig {
            texture_quality: 7,
            render_scale: 0.1,
            frame_generation_target_fps: 500,
            ..GraphicsConfig::default()
        };
        assert!(config.validate().is_err());

        let adjustments = config.sanitize();
        assert_eq!(adjustments.len(), 3);
        assert_eq!(config.texture_quality, 3);
        assert_eq!(config.render_scale, 0.5);
        assert_eq!(config.frame_generation_target_fps, 240);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sanitize_non_finite_render_scale() {
        let mut config = GraphicsConfig {
            render_scale: f32::NAN,
            ..GraphicsConfig::default()
        };
        config.sanitize();
        assert_eq!(config.render_scale, 1.0);
    }
}
