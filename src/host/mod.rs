//! 宿主引擎边界
//!
//! 核心只通过 [`HostEngine`] 读取设备信息、枚举场景对象和已加载纹理、读写画质参数，
//! 以及创建/销毁辅助反射探针。真实引擎的集成层负责实现该 trait。

pub mod params;
pub mod simulated;

pub use params::{
    AmbientMode, AnisotropicFiltering, LightId, LightParam, LightRenderMode, LightShadows,
    ParamKey, ParamValue, ProbeId, ProbeParam, RenderParam, ShadowQuality, ShadowResolution,
    TextureFilter, TextureId, TextureParam, DEFAULT_FIXED_TIMESTEP, UNBOUNDED_FRAME_RATE,
};
pub use simulated::SimulatedHost;

use crate::core::error::HostResult;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// 光源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// 场景光源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightInfo {
    pub id: LightId,
    pub kind: LightKind,
}

/// 场景反射探针
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeInfo {
    pub id: ProbeId,
    pub name: String,
}

/// 已加载纹理
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub id: TextureId,
    pub name: String,
}

/// 创建辅助反射探针的参数
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSpawn {
    /// 名称（带前缀，用于识别归属）
    pub name: String,
    pub position: Vec3,
    pub size: Vec3,
    pub resolution: i32,
    pub intensity: f32,
    pub realtime: bool,
    pub refresh_every_frame: bool,
}

/// 宿主渲染引擎接口
pub trait HostEngine {
    /// 图形设备标识字符串
    fn device_name(&self) -> &str;

    /// 光线追踪API是否可用（不要求专用硬件）
    fn supports_ray_tracing(&self) -> bool;

    /// 屏幕尺寸（像素）
    fn screen_size(&self) -> (u32, u32);

    /// 主相机位置，宿主尚未就绪时为 None
    fn main_camera_position(&self) -> Option<Vec3>;

    /// 枚举场景中的光源
    fn lights(&self) -> Vec<LightInfo>;

    /// 枚举场景中的反射探针
    fn reflection_probes(&self) -> Vec<ProbeInfo>;

    /// 枚举当前已加载的纹理
    fn textures(&self) -> Vec<TextureInfo>;

    /// 读取参数当前值
    fn read(&self, key: ParamKey) -> HostResult<ParamValue>;

    /// 写入参数
    fn write(&mut self, key: ParamKey, value: ParamValue) -> HostResult<()>;

    /// 创建反射探针
    fn spawn_probe(&mut self, spawn: ProbeSpawn) -> ProbeId;

    /// 销毁反射探针
    fn destroy_probe(&mut self, id: ProbeId) -> HostResult<()>;
}
