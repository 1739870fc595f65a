//! 内存中的宿主引擎
//!
//! 以默认画质设置、可编辑的场景对象和已加载纹理模拟宿主，供演示程序、测试和基准使用。

use super::params::*;
use super::{HostEngine, LightInfo, LightKind, ProbeInfo, ProbeSpawn, TextureInfo};
use crate::core::error::{HostError, HostResult};
use glam::Vec3;
use std::collections::{BTreeMap, HashMap};
use std::mem::discriminant;

#[derive(Debug, Clone)]
struct SimLight {
    kind: LightKind,
    params: HashMap<LightParam, ParamValue>,
}

/// 场景探针默认包围盒尺寸
const DEFAULT_PROBE_SIZE: f32 = 10.0;

#[derive(Debug, Clone)]
struct SimProbe {
    name: String,
    position: Vec3,
    size: Vec3,
    params: HashMap<ProbeParam, ParamValue>,
}

#[derive(Debug, Clone)]
struct SimTexture {
    name: String,
    params: HashMap<TextureParam, ParamValue>,
}

/// 模拟宿主
#[derive(Debug, Clone)]
pub struct SimulatedHost {
    device_name: String,
    ray_tracing_api: bool,
    screen: (u32, u32),
    camera: Option<Vec3>,
    globals: HashMap<RenderParam, ParamValue>,
    lights: BTreeMap<LightId, SimLight>,
    probes: BTreeMap<ProbeId, SimProbe>,
    textures: BTreeMap<TextureId, SimTexture>,
    next_id: u32,
    write_count: u64,
}

fn default_globals() -> HashMap<RenderParam, ParamValue> {
    HashMap::from([
        (RenderParam::TextureLimit, ParamValue::Int(0)),
        (RenderParam::AnisotropicFiltering, ParamValue::Anisotropic(AnisotropicFiltering::Enable)),
        (RenderParam::AntiAliasing, ParamValue::Int(2)),
        (RenderParam::StreamingBudget, ParamValue::Int(1024)),
        (RenderParam::ShadowResolution, ParamValue::ShadowResolution(ShadowResolution::High)),
        (RenderParam::ShadowDistance, ParamValue::Float(100.0)),
        (RenderParam::ShadowCascades, ParamValue::Int(2)),
        (RenderParam::Shadows, ParamValue::Shadows(ShadowQuality::HardOnly)),
        (RenderParam::AmbientMode, ParamValue::Ambient(AmbientMode::Skybox)),
        (RenderParam::AmbientIntensity, ParamValue::Float(1.0)),
        (RenderParam::ReflectionIntensity, ParamValue::Float(1.0)),
        (RenderParam::ReflectionBounces, ParamValue::Int(1)),
        (RenderParam::VSyncCount, ParamValue::Int(1)),
        (RenderParam::TargetFrameRate, ParamValue::Int(UNBOUNDED_FRAME_RATE)),
        (RenderParam::FixedTimestep, ParamValue::Float(DEFAULT_FIXED_TIMESTEP)),
        (RenderParam::RenderScale, ParamValue::Float(1.0)),
        (RenderParam::CameraDepthNormals, ParamValue::Bool(false)),
    ])
}

fn default_light_params() -> HashMap<LightParam, ParamValue> {
    HashMap::from([
        (LightParam::Shadows, ParamValue::LightShadows(LightShadows::Hard)),
        (LightParam::ShadowResolution, ParamValue::ShadowResolution(ShadowResolution::Medium)),
        (LightParam::ShadowBias, ParamValue::Float(0.05)),
        (LightParam::ShadowNormalBias, ParamValue::Float(0.4)),
        (LightParam::ShadowStrength, ParamValue::Float(0.8)),
        (LightParam::RenderMode, ParamValue::RenderMode(LightRenderMode::Auto)),
        (LightParam::BounceIntensity, ParamValue::Float(1.0)),
    ])
}

fn default_probe_params() -> HashMap<ProbeParam, ParamValue> {
    HashMap::from([
        (ProbeParam::Resolution, ParamValue::Int(128)),
        (ProbeParam::Hdr, ParamValue::Bool(false)),
        (ProbeParam::Intensity, ParamValue::Float(1.0)),
        (ProbeParam::Realtime, ParamValue::Bool(false)),
        (ProbeParam::RefreshEveryFrame, ParamValue::Bool(false)),
        (ProbeParam::Importance, ParamValue::Int(1)),
    ])
}

fn default_texture_params() -> HashMap<TextureParam, ParamValue> {
    HashMap::from([
        (TextureParam::AnisoLevel, ParamValue::Int(1)),
        (TextureParam::FilterMode, ParamValue::Filter(TextureFilter::Bilinear)),
    ])
}

/// 写入前检查值类型与现有值一致
fn checked_write(
    slot: Option<&mut ParamValue>,
    key: ParamKey,
    value: ParamValue,
) -> HostResult<()> {
    let current = slot.ok_or(HostError::ParameterMissing(key))?;
    if discriminant(current) != discriminant(&value) {
        return Err(HostError::TypeMismatch { key, value });
    }
    *current = value;
    Ok(())
}

impl SimulatedHost {
    /// 以默认设置创建，主相机位于原点
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            ray_tracing_api: false,
            screen: (1920, 1080),
            camera: Some(Vec3::ZERO),
            globals: default_globals(),
            lights: BTreeMap::new(),
            probes: BTreeMap::new(),
            textures: BTreeMap::new(),
            next_id: 1,
            write_count: 0,
        }
    }

    pub fn with_ray_tracing_api(mut self, available: bool) -> Self {
        self.ray_tracing_api = available;
        self
    }

    pub fn with_screen(mut self, width: u32, height: u32) -> Self {
        self.screen = (width, height);
        self
    }

    pub fn with_camera(mut self, camera: Option<Vec3>) -> Self {
        self.camera = camera;
        self
    }

    pub fn set_camera(&mut self, camera: Option<Vec3>) {
        self.camera = camera;
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// 添加光源
    pub fn add_light(&mut self, kind: LightKind) -> LightId {
        let id = LightId(self.allocate_id());
        self.lights.insert(id, SimLight { kind, params: default_light_params() });
        id
    }

    /// 移除光源（模拟场景对象被宿主销毁）
    pub fn remove_light(&mut self, id: LightId) -> bool {
        self.lights.remove(&id).is_some()
    }

    /// 添加场景反射探针
    pub fn add_probe(&mut self, name: impl Into<String>, position: Vec3) -> ProbeId {
        let id = ProbeId(self.allocate_id());
        self.probes.insert(
            id,
            SimProbe {
                name: name.into(),
                position,
                size: Vec3::splat(DEFAULT_PROBE_SIZE),
                params: default_probe_params(),
            },
        );
        id
    }

    /// 加载纹理
    pub fn add_texture(&mut self, name: impl Into<String>) -> TextureId {
        let id = TextureId(self.allocate_id());
        self.textures
            .insert(id, SimTexture { name: name.into(), params: default_texture_params() });
        id
    }

    /// 卸载纹理
    pub fn remove_texture(&mut self, id: TextureId) -> bool {
        self.textures.remove(&id).is_some()
    }

    /// 读取全局参数（测试辅助）
    pub fn global(&self, param: RenderParam) -> ParamValue {
        self.globals[&param]
    }

    /// 探针名称列表
    pub fn probe_names(&self) -> Vec<String> {
        self.probes.values().map(|p| p.name.clone()).collect()
    }

    /// 探针位置
    pub fn probe_position(&self, id: ProbeId) -> Option<Vec3> {
        self.probes.get(&id).map(|p| p.position)
    }

    /// 探针包围盒尺寸
    pub fn probe_size(&self, id: ProbeId) -> Option<Vec3> {
        self.probes.get(&id).map(|p| p.size)
    }

    /// 所有可寻址参数的当前值
    pub fn snapshot(&self) -> HashMap<ParamKey, ParamValue> {
        let mut all: HashMap<ParamKey, ParamValue> = self
            .globals
            .iter()
            .map(|(param, value)| (ParamKey::Global(*param), *value))
            .collect();
        for (id, light) in &self.lights {
            for (param, value) in &light.params {
                all.insert(ParamKey::Light(*id, *param), *value);
            }
        }
        for (id, probe) in &self.probes {
            for (param, value) in &probe.params {
                all.insert(ParamKey::Probe(*id, *param), *value);
            }
        }
        for (id, texture) in &self.textures {
            for (param, value) in &texture.params {
                all.insert(ParamKey::Texture(*id, *param), *value);
            }
        }
        all
    }

    /// 累计写入次数
    pub fn write_count(&self) -> u64 {
        self.write_count
    }
}

impl HostEngine for SimulatedHost {
    fn device_name(&self) -> &str {
        &self.device_name
    }

    fn supports_ray_tracing(&self) -> bool {
        self.ray_tracing_api
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn main_camera_position(&self) -> Option<Vec3> {
        self.camera
    }

    fn lights(&self) -> Vec<LightInfo> {
        self.lights
            .iter()
            .map(|(id, light)| LightInfo { id: *id, kind: light.kind })
            .collect()
    }

    fn reflection_probes(&self) -> Vec<ProbeInfo> {
        self.probes
            .iter()
            .map(|(id, probe)| ProbeInfo { id: *id, name: probe.name.clone() })
            .collect()
    }

    fn textures(&self) -> Vec<TextureInfo> {
        self.textures
            .iter()
            .map(|(id, texture)| TextureInfo { id: *id, name: texture.name.clone() })
            .collect()
    }

    fn read(&self, key: ParamKey) -> HostResult<ParamValue> {
        let value = match key {
            ParamKey::Global(param) => self.globals.get(&param),
            ParamKey::Light(id, param) => self.lights.get(&id).and_then(|l| l.params.get(&param)),
            ParamKey::Probe(id, param) => self.probes.get(&id).and_then(|p| p.params.get(&param)),
            ParamKey::Texture(id, param) => {
                self.textures.get(&id).and_then(|t| t.params.get(&param))
            }
        };
        value.copied().ok_or(HostError::ParameterMissing(key))
    }

    fn write(&mut self, key: ParamKey, value: ParamValue) -> HostResult<()> {
        let slot = match key {
            ParamKey::Global(param) => self.globals.get_mut(&param),
            ParamKey::Light(id, param) => {
                self.lights.get_mut(&id).and_then(|l| l.params.get_mut(&param))
            }
            ParamKey::Probe(id, param) => {
                self.probes.get_mut(&id).and_then(|p| p.params.get_mut(&param))
            }
            ParamKey::Texture(id, param) => {
                self.textures.get_mut(&id).and_then(|t| t.params.get_mut(&param))
            }
        };
        checked_write(slot, key, value)?;
        self.write_count += 1;
        Ok(())
    }

    fn spawn_probe(&mut self, spawn: ProbeSpawn) -> ProbeId {
        let id = self.add_probe(spawn.name, spawn.position);
        if let Some(probe) = self.probes.get_mut(&id) {
            probe.size = spawn.size;
            probe.params.insert(ProbeParam::Resolution, ParamValue::Int(spawn.resolution));
            probe.params.insert(ProbeParam::Intensity, ParamValue::Float(spawn.intensity));
            probe.params.insert(ProbeParam::Realtime, ParamValue::Bool(spawn.realtime));
            probe
                .params
                .insert(ProbeParam::RefreshEveryFrame, ParamValue::Bool(spawn.refresh_every_frame));
        }
        id
    }

    fn destroy_probe(&mut self, id: ProbeId) -> HostResult<()> {
        self.probes
            .remove(&id)
            .map(|_| ())
            .ok_or(HostError::ObjectMissing(format!("probe {}", id.0)))
    }
}
