//! 保真度增强编排器
//!
//! [`FidelityEnhancer`] 独占所有功能控制器、设置账本和诊断记录，按两阶段初始化：
//!
//! 1. [`FidelityEnhancer::construct`]：探测设备、挂载控制器、选择档位，不修改宿主；
//! 2. [`FidelityEnhancer::activate_after_host_ready`]：宿主场景就绪后应用纹理、
//!    渲染比例和激活计划。
//!
//! 编排器不持有宿主，每个会修改宿主的操作都显式借用 `&mut dyn HostEngine`。
//! 关闭时调用 [`FidelityEnhancer::shutdown`] 恢复所有设置。
//!
//! # 示例
//!
//! ```
//! use fidelity_engine::config::GraphicsConfig;
//! use fidelity_engine::enhancer::FidelityEnhancer;
//! use fidelity_engine::host::SimulatedHost;
//! use fidelity_engine::tier::QualityTier;
//!
//! let mut host = SimulatedHost::new("NVIDIA GeForce RTX 4090");
//! let config = GraphicsConfig {
//!     enable_ray_tracing: true,
//!     ..GraphicsConfig::default()
//! };
//!
//! let mut enhancer = FidelityEnhancer::construct(config, &host);
//! assert_eq!(enhancer.tier(), QualityTier::Hardware);
//!
//! enhancer.activate_after_host_ready(&mut host);
//! enhancer.on_frame(&mut host, 1.0 / 60.0);
//! enhancer.shutdown(&mut host);
//! assert!(enhancer.ledger().is_empty());
//! ```

use crate::config::GraphicsConfig;
use crate::core::diagnostics::Diagnostics;
use crate::core::error::FeatureError;
use crate::features::{
    apply_render_scale, FeatureController, FeatureKind, FeatureState, FrameGenerationController,
    PathTracingParams, RayTracingController, RenderContext, TextureEnhancer, UpscalingController,
};
use crate::host::HostEngine;
use crate::ledger::SettingsLedger;
use crate::tier::{select_tier, ActivationPlan, QualityTier};
use fidelity_engine_hardware::{probe, DeviceCapabilities, UpscalingQuality, VendorFamily};
use serde::Serialize;
use std::collections::BTreeMap;

/// 编排器状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancerStatus {
    pub device_name: String,
    pub vendor_family: VendorFamily,
    pub capabilities: DeviceCapabilities,
    pub tier: QualityTier,
    pub activated: bool,
    pub features: BTreeMap<FeatureKind, FeatureState>,
    pub path_tracing: Option<PathTracingParams>,
    pub upscaling_quality: UpscalingQuality,
    pub upscaling_render_scale: Option<f32>,
    pub target_fps: Option<i32>,
    pub ledger_entries: usize,
    pub diagnostics_reported: u64,
}

impl EnhancerStatus {
    /// 序列化为格式化的JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// 保真度增强编排器
#[derive(Debug)]
pub struct FidelityEnhancer {
    config: GraphicsConfig,
    caps: DeviceCapabilities,
    ray_tracing_api: bool,
    plan: ActivationPlan,
    ray_tracing: RayTracingController,
    upscaling: UpscalingController,
    frame_generation: FrameGenerationController,
    texture: TextureEnhancer,
    ledger: SettingsLedger,
    diagnostics: Diagnostics,
    activated: bool,
}

impl FidelityEnhancer {
    /// 第一阶段：探测、挂载、选择档位
    pub fn construct(mut config: GraphicsConfig, host: &dyn HostEngine) -> Self {
        config.sanitize();

        let caps = probe(host.device_name());
        let ray_tracing_api = host.supports_ray_tracing();

        let mut enhancer = Self {
            ray_tracing: RayTracingController::new(),
            upscaling: UpscalingController::new(config.upscaling_quality),
            frame_generation: FrameGenerationController::new(config.frame_generation_target_fps),
            texture: TextureEnhancer::new(config.texture_quality),
            plan: ActivationPlan::disabled(),
            ledger: SettingsLedger::new(),
            diagnostics: Diagnostics::new(),
            activated: false,
            config,
            caps,
            ray_tracing_api,
        };
        enhancer.attach_controllers();
        enhancer.plan = select_tier(&enhancer.caps, ray_tracing_api, enhancer.config.feature_request());

        tracing::info!(
            target: "enhancer",
            "Fidelity enhancer constructed for '{}' ({:?}), tier {}",
            enhancer.caps.device_name,
            enhancer.caps.vendor_family,
            enhancer.plan.tier
        );
        enhancer
    }

    fn attach_controllers(&mut self) {
        self.ray_tracing.attach(&self.caps);
        self.upscaling.attach(&self.caps);
        self.frame_generation.attach(&self.caps);
        self.texture.attach(&self.caps);
    }

    /// 以当前配置重建控制器，下次挂载时重新做能力检查
    fn rebuild_controllers(&mut self) {
        self.ray_tracing = RayTracingController::new();
        self.upscaling = UpscalingController::new(self.config.upscaling_quality);
        self.frame_generation = FrameGenerationController::new(self.config.frame_generation_target_fps);
        self.texture = TextureEnhancer::new(self.config.texture_quality);
        self.attach_controllers();
    }

    /// 第二阶段：宿主就绪后应用设置
    ///
    /// 重复调用只记录警告，返回 false。
    pub fn activate_after_host_ready(&mut self, host: &mut dyn HostEngine) -> bool {
        if self.activated {
            tracing::warn!(target: "enhancer", "Enhancer already activated, ignoring");
            return false;
        }
        self.activated = true;
        self.apply_all(host);
        tracing::info!(
            target: "enhancer",
            "Fidelity enhancer activated: tier {}, {} settings recorded",
            self.plan.tier,
            self.ledger.len()
        );
        true
    }

    fn apply_all(&mut self, host: &mut dyn HostEngine) {
        let plan = self.plan;
        let request = self.config.feature_request();
        let mut ctx = RenderContext::new(host, &mut self.ledger, &mut self.diagnostics);

        let texture = self.texture.enable(&mut ctx);
        ctx.diagnostics.absorb(texture);
        let render_scale = apply_render_scale(&mut ctx, self.config.render_scale);
        ctx.diagnostics.absorb(render_scale);

        if plan.ray_tracing {
            let result = self.ray_tracing.enable(&mut ctx, plan.tier, plan.path_tracing);
            ctx.diagnostics.absorb(result);
        }

        // 请求了但硬件不支持时由控制器报告能力不匹配
        if request.upscaling {
            let result = self.upscaling.enable(&mut ctx);
            ctx.diagnostics.absorb(result);
        }
        if request.frame_generation {
            let result = self.frame_generation.enable(&mut ctx);
            ctx.diagnostics.absorb(result);
        }
    }

    fn teardown_features(&mut self, host: &mut dyn HostEngine) {
        let mut ctx = RenderContext::new(host, &mut self.ledger, &mut self.diagnostics);
        self.frame_generation.teardown(&mut ctx);
        self.upscaling.teardown(&mut ctx);
        self.ray_tracing.teardown(&mut ctx);
        self.texture.teardown(&mut ctx);
        ctx.restore(FeatureKind::RenderScale);
    }

    /// 显式重新配置：拆除所有功能、重新选择档位，已激活时立即重新应用
    pub fn apply_config(&mut self, host: &mut dyn HostEngine, mut config: GraphicsConfig) {
        config.sanitize();
        self.teardown_features(host);
        self.config = config;
        self.rebuild_controllers();
        self.plan = select_tier(&self.caps, self.ray_tracing_api, self.config.feature_request());

        if self.activated {
            self.apply_all(host);
        }
        tracing::info!(target: "enhancer", "Configuration applied, tier {}", self.plan.tier);
    }

    /// 重新探测设备能力并重新配置
    pub fn reprobe(&mut self, host: &mut dyn HostEngine) {
        self.caps = probe(host.device_name());
        self.ray_tracing_api = host.supports_ray_tracing();
        let config = self.config.clone();
        self.apply_config(host, config);
    }

    /// 单独开关一个功能，档位保持不变
    ///
    /// 档位为 `Disabled` 时开启功能等同于重新配置。
    pub fn set_feature_enabled(&mut self, host: &mut dyn HostEngine, kind: FeatureKind, enabled: bool) {
        let mut config = self.config.clone();
        match kind {
            FeatureKind::RayTracing => config.enable_ray_tracing = enabled,
            FeatureKind::Upscaling => config.enable_dlss = enabled,
            FeatureKind::FrameGeneration => config.enable_frame_generation = enabled,
            FeatureKind::PathTracing | FeatureKind::Texture | FeatureKind::RenderScale => {
                self.diagnostics.report(FeatureError::PreconditionNotMet {
                    feature: kind,
                    operation: "toggle".to_string(),
                    state: "not independently toggleable".to_string(),
                });
                return;
            }
        }

        if enabled && self.plan.tier == QualityTier::Disabled {
            self.apply_config(host, config);
            return;
        }
        self.config = config;

        let tier = self.plan.tier;
        match kind {
            FeatureKind::RayTracing => {
                self.plan.ray_tracing = enabled;
                self.plan.path_tracing = if enabled { tier.path_tracing_preset() } else { None };
            }
            FeatureKind::Upscaling => self.plan.upscaling = enabled && self.caps.has_upscaling_hw,
            FeatureKind::FrameGeneration => {
                self.plan.frame_generation = enabled && self.caps.has_frame_gen_hw
            }
            FeatureKind::PathTracing | FeatureKind::Texture | FeatureKind::RenderScale => {}
        }

        if self.activated {
            let preset = self.plan.path_tracing;
            let mut ctx = RenderContext::new(host, &mut self.ledger, &mut self.diagnostics);
            let result = match (kind, enabled) {
                (FeatureKind::RayTracing, true) => self.ray_tracing.enable(&mut ctx, tier, preset),
                (FeatureKind::Upscaling, true) => self.upscaling.enable(&mut ctx),
                (FeatureKind::FrameGeneration, true) => self.frame_generation.enable(&mut ctx),
                (FeatureKind::RayTracing, false) => {
                    self.ray_tracing.disable(&mut ctx);
                    Ok(())
                }
                (FeatureKind::Upscaling, false) => {
                    self.upscaling.disable(&mut ctx);
                    Ok(())
                }
                (FeatureKind::FrameGeneration, false) => {
                    self.frame_generation.disable(&mut ctx);
                    Ok(())
                }
                _ => Ok(()),
            };
            ctx.diagnostics.absorb(result);
        }

        tracing::info!(
            target: "enhancer",
            "{} {} (tier stays {})",
            kind,
            if enabled { "enabled" } else { "disabled" },
            tier
        );
    }

    /// 修改超分辨率质量，未启用时报告前置条件未满足
    pub fn set_upscaling_quality(&mut self, host: &mut dyn HostEngine, quality: UpscalingQuality) -> bool {
        let mut ctx = RenderContext::new(host, &mut self.ledger, &mut self.diagnostics);
        let result = self.upscaling.set_quality(&mut ctx, quality);
        let applied = ctx.diagnostics.absorb(result).is_some();
        if applied {
            self.config.upscaling_quality = quality;
        }
        applied
    }

    /// 修改帧生成目标帧率，返回钳制后的值
    pub fn set_frame_rate_target(&mut self, host: &mut dyn HostEngine, fps: i32) -> Option<i32> {
        let mut ctx = RenderContext::new(host, &mut self.ledger, &mut self.diagnostics);
        let result = self.frame_generation.set_target_frame_rate(&mut ctx, fps);
        let clamped = ctx.diagnostics.absorb(result)?;
        self.config.frame_generation_target_fps = clamped;
        Some(clamped)
    }

    /// 修改纹理质量；已激活时立即重新应用，否则留到激活时应用
    pub fn set_texture_quality(&mut self, host: &mut dyn HostEngine, quality: i32) {
        let mut config = self.config.clone();
        config.texture_quality = quality;
        config.sanitize();
        self.config.texture_quality = config.texture_quality;

        if !self.activated {
            self.texture.stage_quality(config.texture_quality);
            return;
        }
        let mut ctx = RenderContext::new(host, &mut self.ledger, &mut self.diagnostics);
        let result = self.texture.set_quality(&mut ctx, config.texture_quality);
        ctx.diagnostics.absorb(result);
    }

    /// 每帧钩子
    pub fn on_frame(&mut self, host: &mut dyn HostEngine, delta_seconds: f32) {
        if !self.activated {
            return;
        }
        let mut ctx = RenderContext::new(host, &mut self.ledger, &mut self.diagnostics);
        self.ray_tracing.on_frame(&mut ctx);
        self.frame_generation.on_frame(delta_seconds);
    }

    /// 拆除所有功能并恢复账本中剩余的全部设置，返回关闭前的活跃条目数
    pub fn shutdown(&mut self, host: &mut dyn HostEngine) -> usize {
        let before = self.ledger.len();
        self.teardown_features(host);
        let leftover = self.ledger.restore_all(host);
        self.activated = false;
        tracing::info!(
            target: "enhancer",
            "Fidelity enhancer shut down ({} entries before, {} restored by sweep)",
            before,
            leftover
        );
        before
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    pub fn tier(&self) -> QualityTier {
        self.plan.tier
    }

    pub fn plan(&self) -> ActivationPlan {
        self.plan
    }

    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// 单个功能的状态
    pub fn feature_state(&self, kind: FeatureKind) -> FeatureState {
        match kind {
            FeatureKind::RayTracing => self.ray_tracing.state(),
            FeatureKind::Upscaling => self.upscaling.state(),
            FeatureKind::FrameGeneration => self.frame_generation.state(),
            FeatureKind::Texture => self.texture.state(),
            FeatureKind::PathTracing => self
                .ray_tracing
                .path_tracing()
                .map(|pt| pt.state())
                .unwrap_or(FeatureState::Uninitialized),
            FeatureKind::RenderScale => {
                if self.ledger.holds(FeatureKind::RenderScale) {
                    FeatureState::Enabled
                } else {
                    FeatureState::Supported
                }
            }
        }
    }

    pub fn path_tracing_params(&self) -> Option<PathTracingParams> {
        self.ray_tracing.path_tracing_params()
    }

    /// 超分辨率启用时的渲染比例
    pub fn upscaling_render_scale(&self) -> Option<f32> {
        self.upscaling.is_enabled().then(|| self.upscaling.render_scale())
    }

    /// 帧生成启用时的目标帧率
    pub fn target_fps(&self) -> Option<i32> {
        self.frame_generation
            .is_enabled()
            .then(|| self.frame_generation.target_fps())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn ledger(&self) -> &SettingsLedger {
        &self.ledger
    }

    /// 状态快照
    pub fn status(&self) -> EnhancerStatus {
        let features = [
            FeatureKind::RayTracing,
            FeatureKind::Upscaling,
            FeatureKind::FrameGeneration,
            FeatureKind::PathTracing,
            FeatureKind::Texture,
            FeatureKind::RenderScale,
        ]
        .into_iter()
        .map(|kind| (kind, self.feature_state(kind)))
        .collect();

        EnhancerStatus {
            device_name: self.caps.device_name.clone(),
            vendor_family: self.caps.vendor_family,
            capabilities: self.caps.clone(),
            tier: self.plan.tier,
            activated: self.activated,
            features,
            path_tracing: self.path_tracing_params(),
            upscaling_quality: self.upscaling.quality(),
            upscaling_render_scale: self.upscaling_render_scale(),
            target_fps: self.target_fps(),
            ledger_entries: self.ledger.len(),
            diagnostics_reported: self.diagnostics.total_reported(),
        }
    }
}

impl Drop for FidelityEnhancer {
    fn drop(&mut self) {
        if !self.ledger.is_empty() {
            tracing::warn!(
                target: "enhancer",
                "Fidelity enhancer dropped with {} unrestored settings; call shutdown first",
                self.ledger.len()
            );
        }
    }
}
