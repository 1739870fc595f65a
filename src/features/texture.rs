//! 纹理质量增强
//!
//! `TextureQuality` 0..=3 查表得到纹理分辨率限制、各向异性过滤和流送预算，
//! 并逐个调整已加载纹理的各向异性等级与过滤模式（系统纹理除外）。
//! 质量为 0 时不修改任何设置。

use super::{FeatureController, FeatureKind, FeatureState, Lifecycle, RenderContext};
use crate::core::error::FeatureResult;
use crate::host::{AnisotropicFiltering, ParamKey, RenderParam, TextureFilter, TextureParam};
use fidelity_engine_hardware::DeviceCapabilities;
use serde::Serialize;

/// 单个质量档的纹理设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextureProfile {
    /// 纹理mip限制，0为全分辨率
    pub texture_limit: i32,
    pub anisotropic: AnisotropicFiltering,
    /// 流送预算（MB）
    pub streaming_budget_mb: i32,
    /// 逐纹理各向异性等级
    pub aniso_level: i32,
    pub filter: TextureFilter,
}

const TEXTURE_PROFILES: [TextureProfile; 4] = [
    TextureProfile {
        texture_limit: 3,
        anisotropic: AnisotropicFiltering::Disable,
        streaming_budget_mb: 512,
        aniso_level: 0,
        filter: TextureFilter::Bilinear,
    },
    TextureProfile {
        texture_limit: 2,
        anisotropic: AnisotropicFiltering::Enable,
        streaming_budget_mb: 1024,
        aniso_level: 2,
        filter: TextureFilter::Bilinear,
    },
    TextureProfile {
        texture_limit: 1,
        anisotropic: AnisotropicFiltering::ForceEnable,
        streaming_budget_mb: 2048,
        aniso_level: 8,
        filter: TextureFilter::Trilinear,
    },
    TextureProfile {
        texture_limit: 0,
        anisotropic: AnisotropicFiltering::ForceEnable,
        streaming_budget_mb: 4096,
        aniso_level: 16,
        filter: TextureFilter::Trilinear,
    },
];

impl TextureProfile {
    /// 越界质量钳制到表内
    pub fn for_quality(quality: i32) -> Self {
        let index = quality.clamp(0, TEXTURE_PROFILES.len() as i32 - 1) as usize;
        TEXTURE_PROFILES[index]
    }
}

/// 系统纹理（字体、界面、光标、内置隐藏资源）保持原样
pub fn is_system_texture(name: &str) -> bool {
    name.starts_with("Hidden/")
        || ["Font", "UI", "Cursor"].iter().any(|marker| name.contains(marker))
}

/// 纹理增强
#[derive(Debug)]
pub struct TextureEnhancer {
    lifecycle: Lifecycle,
    quality: i32,
}

impl TextureEnhancer {
    pub fn new(quality: i32) -> Self {
        Self {
            lifecycle: Lifecycle::new(FeatureKind::Texture),
            quality,
        }
    }

    pub fn quality(&self) -> i32 {
        self.quality
    }

    /// 只记录新质量，下次启用时生效
    pub fn stage_quality(&mut self, quality: i32) {
        self.quality = quality;
    }

    /// 应用当前质量，返回是否修改了设置
    pub fn enable(&mut self, ctx: &mut RenderContext<'_>) -> FeatureResult<bool> {
        self.lifecycle.check_enable()?;
        if self.lifecycle.is_enabled() {
            ctx.restore(FeatureKind::Texture);
        }
        if self.quality <= 0 {
            tracing::debug!(target: "texture", "Texture quality 0, leaving texture settings untouched");
            self.lifecycle.mark_disabled();
            return Ok(false);
        }

        let profile = TextureProfile::for_quality(self.quality);
        let owner = FeatureKind::Texture;
        ctx.set(owner, RenderParam::TextureLimit, profile.texture_limit);
        ctx.set(owner, RenderParam::AnisotropicFiltering, profile.anisotropic);
        ctx.set(owner, RenderParam::StreamingBudget, profile.streaming_budget_mb);
        let enhanced = Self::enhance_loaded_textures(ctx, &profile);
        self.lifecycle.mark_enabled();

        tracing::info!(
            target: "texture",
            "Texture quality {} applied (limit {}, {:?}, {} MB streaming, {} textures enhanced)",
            self.quality,
            profile.texture_limit,
            profile.anisotropic,
            profile.streaming_budget_mb,
            enhanced
        );
        Ok(true)
    }

    fn enhance_loaded_textures(ctx: &mut RenderContext<'_>, profile: &TextureProfile) -> usize {
        let owner = FeatureKind::Texture;
        let mut enhanced = 0;
        for texture in ctx.host.textures() {
            if is_system_texture(&texture.name) {
                continue;
            }
            let key = |param| ParamKey::Texture(texture.id, param);
            let aniso = ctx.set(owner, key(TextureParam::AnisoLevel), profile.aniso_level);
            let filter = ctx.set(owner, key(TextureParam::FilterMode), profile.filter);
            if aniso && filter {
                enhanced += 1;
            }
        }
        enhanced
    }

    /// 修改质量并重新应用
    pub fn set_quality(&mut self, ctx: &mut RenderContext<'_>, quality: i32) -> FeatureResult<bool> {
        self.stage_quality(quality);
        self.enable(ctx)
    }
}

impl FeatureController for TextureEnhancer {
    fn kind(&self) -> FeatureKind {
        FeatureKind::Texture
    }

    fn state(&self) -> FeatureState {
        self.lifecycle.state()
    }

    fn attach(&mut self, caps: &DeviceCapabilities) -> FeatureState {
        self.lifecycle.attach(&caps.device_name, true)
    }

    fn disable(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.lifecycle.mark_disabled() {
            return;
        }
        ctx.restore(FeatureKind::Texture);
        tracing::info!(target: "texture", "Texture settings restored");
    }
}
