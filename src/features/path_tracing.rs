//! 路径追踪回退
//!
//! 软件近似的全局光照：提高阴影/环境光/反射设置，逐光源开启像素光照和间接反弹，
//! 场景反射探针不足时在相机周围放置一组辅助探针，并在每帧刷新探针以近似GI。
//!
//! 辅助探针名称带 [`AUX_PROBE_PREFIX`] 前缀；每次启用前先移除自己之前创建的探针，
//! 重复启用不会泄漏场景对象。

use super::{FeatureController, FeatureKind, FeatureState, Lifecycle, RenderContext};
use crate::core::error::{FeatureError, FeatureResult};
use crate::host::{
    AmbientMode, LightKind, LightParam, LightRenderMode, LightShadows, ParamKey, ProbeId, ProbeInfo,
    ProbeParam, ProbeSpawn, RenderParam, ShadowQuality, ShadowResolution,
};
use crate::impl_default;
use fidelity_engine_hardware::DeviceCapabilities;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// 辅助探针名称前缀
pub const AUX_PROBE_PREFIX: &str = "PathTracing_Probe_";

/// 场景探针少于该数量时放置辅助探针
pub const MIN_SCENE_PROBES: usize = 4;

const AUX_GRID_SPACING: f32 = 10.0;
const AUX_PROBE_SIZE: f32 = 15.0;
const AUX_PROBE_RESOLUTION: i32 = 512;
const GI_PROBE_RESOLUTION: i32 = 1024;

/// 路径追踪预设（反弹次数, 每像素采样数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathTracingPreset {
    /// 1 次反弹 / 2 采样
    Minimal,
    /// 2 次反弹 / 4 采样
    Medium,
    /// 4 次反弹 / 8 采样
    High,
}

const PRESET_TABLE: [(u32, u32); 3] = [(1, 2), (2, 4), (4, 8)];

impl PathTracingPreset {
    pub fn bounce_count(self) -> u32 {
        PRESET_TABLE[self as usize].0
    }

    pub fn samples_per_pixel(self) -> u32 {
        PRESET_TABLE[self as usize].1
    }

    /// 该预设对应的参数集
    pub fn params(self) -> PathTracingParams {
        PathTracingParams {
            bounce_count: self.bounce_count(),
            samples_per_pixel: self.samples_per_pixel(),
            ..PathTracingParams::default()
        }
    }
}

/// 路径追踪参数集
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathTracingParams {
    pub bounce_count: u32,
    pub samples_per_pixel: u32,
    pub gi_intensity: f32,
}

impl_default!(PathTracingParams {
    bounce_count: 3,
    samples_per_pixel: 4,
    gi_intensity: 1.0,
});

/// 路径追踪回退控制器
#[derive(Debug)]
pub struct PathTracingController {
    lifecycle: Lifecycle,
    params: PathTracingParams,
    aux_probes: Vec<ProbeId>,
}

impl PathTracingController {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::new(FeatureKind::PathTracing),
            params: PathTracingParams::default(),
            aux_probes: Vec::new(),
        }
    }

    pub fn params(&self) -> PathTracingParams {
        self.params
    }

    pub fn aux_probe_count(&self) -> usize {
        self.aux_probes.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.lifecycle.is_enabled()
    }

    /// 以指定参数启用（或重新配置）
    pub fn enable(
        &mut self,
        ctx: &mut RenderContext<'_>,
        params: PathTracingParams,
    ) -> FeatureResult<()> {
        self.lifecycle.check_enable()?;
        self.params = params;

        let camera = ctx.host.main_camera_position();
        if camera.is_some() {
            ctx.set(FeatureKind::PathTracing, RenderParam::CameraDepthNormals, true);
        }

        self.apply_advanced_lighting(ctx);

        self.remove_aux_probes(ctx);
        match camera {
            Some(position) => self.place_aux_probes_if_sparse(ctx, position),
            None => ctx.report(FeatureError::ResourceUnavailable {
                feature: FeatureKind::PathTracing,
                resource: "main camera".to_string(),
            }),
        }

        self.lifecycle.mark_enabled();
        tracing::info!(
            target: "path_tracing",
            "Path tracing enabled: {} bounces, {} samples per pixel",
            params.bounce_count,
            params.samples_per_pixel
        );
        Ok(())
    }

    fn apply_advanced_lighting(&self, ctx: &mut RenderContext<'_>) {
        let owner = FeatureKind::PathTracing;
        ctx.set(owner, RenderParam::ShadowCascades, 4i32);
        ctx.set(owner, RenderParam::ShadowDistance, 200.0f32);
        ctx.set(owner, RenderParam::ShadowResolution, ShadowResolution::VeryHigh);
        ctx.set(owner, RenderParam::Shadows, ShadowQuality::All);
        ctx.set(owner, RenderParam::AmbientMode, AmbientMode::Trilight);
        ctx.set(owner, RenderParam::AmbientIntensity, 1.2f32);
        ctx.set(owner, RenderParam::ReflectionIntensity, 1.5f32);
        ctx.set(owner, RenderParam::ReflectionBounces, self.params.bounce_count as i32);

        let lights = ctx.host.lights();
        for light in &lights {
            let key = |param| ParamKey::Light(light.id, param);
            ctx.set(owner, key(LightParam::Shadows), LightShadows::Soft);
            ctx.set(owner, key(LightParam::ShadowResolution), ShadowResolution::VeryHigh);
            ctx.set(owner, key(LightParam::RenderMode), LightRenderMode::ForcePixel);
            ctx.set(owner, key(LightParam::BounceIntensity), 2.0f32);
            if light.kind == LightKind::Directional {
                ctx.set(owner, key(LightParam::ShadowBias), 0.02f32);
                ctx.set(owner, key(LightParam::ShadowNormalBias), 0.2f32);
            }
        }

        tracing::debug!(
            target: "path_tracing",
            "Advanced lighting configured for {} lights",
            lights.len()
        );
    }

    fn scene_probes(ctx: &RenderContext<'_>) -> Vec<ProbeInfo> {
        ctx.host
            .reflection_probes()
            .into_iter()
            .filter(|probe| !probe.name.starts_with(AUX_PROBE_PREFIX))
            .collect()
    }

    /// 场景探针不足时在相机周围放置 3x3 辅助探针网格
    fn place_aux_probes_if_sparse(&mut self, ctx: &mut RenderContext<'_>, camera: Vec3) {
        if Self::scene_probes(ctx).len() >= MIN_SCENE_PROBES {
            return;
        }

        for x in -1i32..=1 {
            for z in -1i32..=1 {
                let offset = Vec3::new(x as f32, 0.0, z as f32) * AUX_GRID_SPACING;
                let id = ctx.host.spawn_probe(ProbeSpawn {
                    name: format!("{}{}_{}", AUX_PROBE_PREFIX, x, z),
                    position: camera + offset,
                    size: Vec3::splat(AUX_PROBE_SIZE),
                    resolution: AUX_PROBE_RESOLUTION,
                    intensity: self.params.gi_intensity * 0.5,
                    realtime: true,
                    refresh_every_frame: true,
                });
                self.aux_probes.push(id);
            }
        }

        tracing::info!(
            target: "path_tracing",
            "Created {} auxiliary probes for GI approximation",
            self.aux_probes.len()
        );
    }

    /// 移除自己创建的辅助探针，包括之前实例遗留的同前缀探针
    fn remove_aux_probes(&mut self, ctx: &mut RenderContext<'_>) {
        let mut targets: Vec<ProbeId> = std::mem::take(&mut self.aux_probes);
        for probe in ctx.host.reflection_probes() {
            if probe.name.starts_with(AUX_PROBE_PREFIX) && !targets.contains(&probe.id) {
                targets.push(probe.id);
            }
        }

        for id in &targets {
            if let Err(error) = ctx.host.destroy_probe(*id) {
                tracing::debug!(target: "path_tracing", "Auxiliary probe already gone: {}", error);
            }
        }

        if !targets.is_empty() {
            tracing::debug!(target: "path_tracing", "Removed {} auxiliary probes", targets.len());
        }
    }

    /// 每帧GI刷新
    pub fn on_frame(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.lifecycle.is_enabled() {
            return;
        }

        let owner = FeatureKind::PathTracing;
        let scene_probes = Self::scene_probes(ctx);
        for probe in &scene_probes {
            let key = |param| ParamKey::Probe(probe.id, param);
            ctx.set(owner, key(ProbeParam::Realtime), true);
            ctx.set(owner, key(ProbeParam::RefreshEveryFrame), true);
            ctx.set(owner, key(ProbeParam::Resolution), GI_PROBE_RESOLUTION);
            ctx.set(owner, key(ProbeParam::Intensity), self.params.gi_intensity);
            ctx.set(owner, key(ProbeParam::Importance), self.params.bounce_count as i32);
        }

        if self.aux_probes.is_empty() {
            if let Some(camera) = ctx.host.main_camera_position() {
                self.place_aux_probes_if_sparse(ctx, camera);
            }
        }
    }
}

impl Default for PathTracingController {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureController for PathTracingController {
    fn kind(&self) -> FeatureKind {
        FeatureKind::PathTracing
    }

    fn state(&self) -> FeatureState {
        self.lifecycle.state()
    }

    /// 软件回退在任何设备上都可用
    fn attach(&mut self, caps: &DeviceCapabilities) -> FeatureState {
        self.lifecycle.attach(&caps.device_name, true)
    }

    fn disable(&mut self, ctx: &mut RenderContext<'_>) {
        if !self.lifecycle.mark_disabled() {
            return;
        }
        self.remove_aux_probes(ctx);
        ctx.restore(FeatureKind::PathTracing);
        tracing::info!(target: "path_tracing", "Path tracing disabled");
    }

    fn teardown(&mut self, ctx: &mut RenderContext<'_>) {
        self.disable(ctx);
        self.remove_aux_probes(ctx);
        ctx.restore(FeatureKind::PathTracing);
    }
}
