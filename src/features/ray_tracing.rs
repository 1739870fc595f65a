//! 光线追踪控制器
//!
//! 按档位查表得到反射探针、光源阴影和全局阴影/环境光配置，并持有路径追踪附加层。
//! 光源和探针在每次状态转换时重新扫描，场景变化后重新启用即可覆盖新对象。

use super::path_tracing::AUX_PROBE_PREFIX;
use super::{
    FeatureController, FeatureKind, FeatureState, Lifecycle, PathTracingController,
    PathTracingParams, PathTracingPreset, RenderContext,
};
use crate::core::error::{FeatureError, FeatureResult};
use crate::host::{
    AmbientMode, LightKind, LightParam, LightShadows, ParamKey, ProbeParam, RenderParam,
    ShadowQuality, ShadowResolution,
};
use crate::tier::QualityTier;
use fidelity_engine_hardware::DeviceCapabilities;
use serde::Serialize;

/// 单个档位的光线追踪配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RayTracingProfile {
    pub probe_resolution: i32,
    pub probe_intensity: f32,
    pub shadow_resolution: ShadowResolution,
    pub shadow_distance: f32,
    pub shadow_cascades: i32,
    pub ambient_mode: Option<AmbientMode>,
    pub ambient_intensity: Option<f32>,
}

const HARDWARE_PROFILE: RayTracingProfile = RayTracingProfile {
    probe_resolution: 2048,
    probe_intensity: 1.5,
    shadow_resolution: ShadowResolution::VeryHigh,
    shadow_distance: 150.0,
    shadow_cascades: 4,
    ambient_mode: Some(AmbientMode::Trilight),
    ambient_intensity: Some(1.0),
};

const SOFTWARE_PROFILE: RayTracingProfile = RayTracingProfile {
    probe_resolution: 1024,
    probe_intensity: 1.25,
    shadow_resolution: ShadowResolution::High,
    shadow_distance: 120.0,
    shadow_cascades: 4,
    ambient_mode: Some(AmbientMode::Trilight),
    ambient_intensity: None,
};

const APPROXIMATION_PROFILE: RayTracingProfile = RayTracingProfile {
    probe_resolution: 512,
    probe_intensity: 1.1,
    shadow_resolution: ShadowResolution::High,
    shadow_distance: 100.0,
    shadow_cascades: 2,
    ambient_mode: None,
    ambient_intensity: None,
};

const LIGHT_SHADOW_BIAS: f32 = 0.05;
const LIGHT_SHADOW_NORMAL_BIAS: f32 = 0.4;
const DIRECTIONAL_SHADOW_STRENGTH: f32 = 1.0;

impl RayTracingProfile {
    /// 档位对应的配置，`Disabled` 没有配置
    pub fn for_tier(tier: QualityTier) -> Option<Self> {
        match tier {
            QualityTier::Disabled => None,
            QualityTier::Approximation => Some(APPROXIMATION_PROFILE),
            QualityTier::Software => Some(SOFTWARE_PROFILE),
            QualityTier::Hardware => Some(HARDWARE_PROFILE),
        }
    }
}

/// 光线追踪控制器
#[derive(Debug)]
pub struct RayTracingController {
    lifecycle: Lifecycle,
    caps: Option<DeviceCapabilities>,
    tier: QualityTier,
    path_tracing: Option<PathTracingController>,
}

impl RayTracingController {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new(FeatureKind::RayTracing),
            caps: None,
            tier: QualityTier::Disabled,
            path_tracing: None,
        }
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn is_enabled(&self) -> bool {
        self.lifecycle.is_enabled()
    }

    pub fn path_tracing(&self) -> Option<&PathTracingController> {
        self.path_tracing.as_ref()
    }

    /// 已挂载的路径追踪参数
    pub fn path_tracing_params(&self) -> Option<PathTracingParams> {
        self.path_tracing
            .as_ref()
            .filter(|pt| pt.is_enabled())
            .map(|pt| pt.params())
    }

    /// 以指定档位启用（或重新配置），可选叠加路径追踪
    pub fn enable(
        &mut self,
        ctx: &mut RenderContext<'_>,
        tier: QualityTier,
        preset: Option<PathTracingPreset>,
    ) -> FeatureResult<()> {
        self.lifecycle.check_enable()?;
        let profile = RayTracingProfile::for_tier(tier).ok_or_else(|| {
            FeatureError::PreconditionNotMet {
                feature: FeatureKind::RayTracing,
                operation: "enable".to_string(),
                state: format!("tier {}", tier),
            }
        })?;

        if self.lifecycle.is_enabled() {
            ctx.restore(FeatureKind::RayTracing);
        }
        self.apply_profile(ctx, &profile);
        self.tier = tier;
        self.lifecycle.mark_enabled();
        tracing::info!(target: "ray_tracing", "Ray tracing enabled at tier {}", tier);

        match preset {
            Some(preset) => self.attach_path_tracing(ctx, preset),
            None => self.detach_path_tracing(ctx),
        }
        Ok(())
    }

    fn apply_profile(&self, ctx: &mut RenderContext<'_>, profile: &RayTracingProfile) {
        let owner = FeatureKind::RayTracing;

        ctx.set(owner, RenderParam::ShadowResolution, profile.shadow_resolution);
        ctx.set(owner, RenderParam::ShadowDistance, profile.shadow_distance);
        ctx.set(owner, RenderParam::ShadowCascades, profile.shadow_cascades);
        ctx.set(owner, RenderParam::Shadows, ShadowQuality::All);
        if let Some(mode) = profile.ambient_mode {
            ctx.set(owner, RenderParam::AmbientMode, mode);
        }
        if let Some(intensity) = profile.ambient_intensity {
            ctx.set(owner, RenderParam::AmbientIntensity, intensity);
        }

        let probes: Vec<_> = ctx
            .host
            .reflection_probes()
            .into_iter()
            .filter(|probe| !probe.name.starts_with(AUX_PROBE_PREFIX))
            .collect();
        for probe in &probes {
            ctx.set(owner, ParamKey::Probe(probe.id, ProbeParam::Resolution), profile.probe_resolution);
            ctx.set(owner, ParamKey::Probe(probe.id, ProbeParam::Intensity), profile.probe_intensity);
            ctx.set(owner, ParamKey::Probe(probe.id, ProbeParam::Hdr), true);
        }

        let lights = ctx.host.lights();
        for light in &lights {
            ctx.set(owner, ParamKey::Light(light.id, LightParam::Shadows), LightShadows::Soft);
            ctx.set(owner, ParamKey::Light(light.id, LightParam::ShadowBias), LIGHT_SHADOW_BIAS);
            ctx.set(
                owner,
                ParamKey::Light(light.id, LightParam::ShadowNormalBias),
                LIGHT_SHADOW_NORMAL_BIAS,
            );
            if light.kind == LightKind::Directional {
                ctx.set(
                    owner,
                    ParamKey::Light(light.id, LightParam::ShadowStrength),
                    DIRECTIONAL_SHADOW_STRENGTH,
                );
            }
        }

        tracing::debug!(
            target: "ray_tracing",
            "Configured {} reflection probes and {} lights",
            probes.len(),
            lights.len()
        );
    }

    fn attach_path_tracing(&mut self, ctx: &mut RenderContext<'_>, preset: PathTracingPreset) {
        let caps = self.caps.as_ref();
        let path_tracing = self.path_tracing.get_or_insert_with(|| {
            let mut controller = PathTracingController::new();
            if let Some(caps) = caps {
                controller.attach(caps);
            }
            controller
        });

        if let Err(error) = path_tracing.enable(ctx, preset.params()) {
            ctx.report(error);
        }
    }

    /// 拆除路径追踪附加层
    fn detach_path_tracing(&mut self, ctx: &mut RenderContext<'_>) {
        if let Some(mut path_tracing) = self.path_tracing.take() {
            path_tracing.teardown(ctx);
            tracing::info!(target: "ray_tracing", "Path tracing add-on detached");
        }
    }

    /// 每帧转发给路径追踪附加层
    pub fn on_frame(&mut self, ctx: &mut RenderContext<'_>) {
        if let Some(path_tracing) = self.path_tracing.as_mut() {
            path_tracing.on_frame(ctx);
        }
    }
}

impl Default for RayTracingController {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureController for RayTracingController {
    fn kind(&self) -> FeatureKind {
        FeatureKind::RayTracing
    }

    fn state(&self) -> FeatureState {
        self.lifecycle.state()
    }

    /// 任何设备都至少支持近似档位
    fn attach(&mut self, caps: &DeviceCapabilities) -> FeatureState {
        self.caps = Some(caps.clone());
        self.lifecycle.attach(&caps.device_name, true)
    }

    fn disable(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.lifecycle.mark_disabled() {
            return;
        }
        self.detach_path_tracing(ctx);
        let restored = ctx.restore(FeatureKind::RayTracing);
        self.tier = QualityTier::Disabled;
        tracing::info!(target: "ray_tracing", "Ray tracing disabled, {} settings restored", restored);
    }

    fn teardown(&mut self, ctx: &mut RenderContext<'_>) {
        self.disable(ctx);
        self.detach_path_tracing(ctx);
        ctx.restore(FeatureKind::RayTracing);
    }
}
