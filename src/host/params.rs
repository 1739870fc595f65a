//! 宿主渲染参数命名空间
//!
//! 把分散的全局画质设置、逐光源和逐反射探针参数统一为一个可寻址的键空间，
//! 供设置账本记录和恢复。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 帧率上限的“不限制”哨兵值
pub const UNBOUNDED_FRAME_RATE: i32 = -1;

/// 宿主默认的固定物理步长（50Hz）
pub const DEFAULT_FIXED_TIMESTEP: f32 = 0.02;

/// 光源句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId(pub u32);

/// 反射探针句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProbeId(pub u32);

/// 已加载纹理句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// 全局渲染/画质参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderParam {
    /// 纹理分辨率限制（0 = 全分辨率）
    TextureLimit,
    /// 各向异性过滤模式
    AnisotropicFiltering,
    /// MSAA 采样数
    AntiAliasing,
    /// 纹理流送预算（MB）
    StreamingBudget,
    /// 全局阴影分辨率
    ShadowResolution,
    /// 阴影距离
    ShadowDistance,
    /// 阴影级联数
    ShadowCascades,
    /// 阴影开关
    Shadows,
    /// 环境光模式
    AmbientMode,
    /// 环境光强度
    AmbientIntensity,
    /// 反射强度
    ReflectionIntensity,
    /// 反射反弹次数
    ReflectionBounces,
    /// 垂直同步计数（0 = 关闭）
    VSyncCount,
    /// 目标帧率（-1 = 不限制）
    TargetFrameRate,
    /// 固定物理步长（秒）
    FixedTimestep,
    /// 内部渲染缩放
    RenderScale,
    /// 主相机深度与法线纹理
    CameraDepthNormals,
}

/// 逐光源参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightParam {
    Shadows,
    ShadowResolution,
    ShadowBias,
    ShadowNormalBias,
    ShadowStrength,
    RenderMode,
    BounceIntensity,
}

/// 逐反射探针参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeParam {
    Resolution,
    Hdr,
    Intensity,
    Realtime,
    RefreshEveryFrame,
    Importance,
}

/// 逐纹理采样参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureParam {
    /// 各向异性等级（0 = 关闭）
    AnisoLevel,
    FilterMode,
}

/// 账本可寻址的参数键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKey {
    Global(RenderParam),
    Light(LightId, LightParam),
    Probe(ProbeId, ProbeParam),
    Texture(TextureId, TextureParam),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Global(param) => write!(f, "{:?}", param),
            ParamKey::Light(id, param) => write!(f, "light[{}].{:?}", id.0, param),
            ParamKey::Probe(id, param) => write!(f, "probe[{}].{:?}", id.0, param),
            ParamKey::Texture(id, param) => write!(f, "texture[{}].{:?}", id.0, param),
        }
    }
}

impl From<RenderParam> for ParamKey {
    fn from(param: RenderParam) -> Self {
        ParamKey::Global(param)
    }
}

/// 阴影分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShadowResolution {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// 各向异性过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnisotropicFiltering {
    Disable,
    Enable,
    ForceEnable,
}

/// 环境光模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbientMode {
    Skybox,
    Trilight,
    Flat,
}

/// 全局阴影开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadowQuality {
    Disable,
    HardOnly,
    All,
}

/// 逐光源阴影类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightShadows {
    None,
    Hard,
    Soft,
}

/// 光源渲染模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightRenderMode {
    Auto,
    ForcePixel,
    ForceVertex,
}

/// 纹理过滤模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFilter {
    Point,
    Bilinear,
    Trilinear,
}

/// 参数值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    ShadowResolution(ShadowResolution),
    Anisotropic(AnisotropicFiltering),
    Ambient(AmbientMode),
    Shadows(ShadowQuality),
    LightShadows(LightShadows),
    RenderMode(LightRenderMode),
    Filter(TextureFilter),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<ShadowResolution> for ParamValue {
    fn from(v: ShadowResolution) -> Self {
        ParamValue::ShadowResolution(v)
    }
}

impl From<AnisotropicFiltering> for ParamValue {
    fn from(v: AnisotropicFiltering) -> Self {
        ParamValue::Anisotropic(v)
    }
}

impl From<AmbientMode> for ParamValue {
    fn from(v: AmbientMode) -> Self {
        ParamValue::Ambient(v)
    }
}

impl From<ShadowQuality> for ParamValue {
    fn from(v: ShadowQuality) -> Self {
        ParamValue::Shadows(v)
    }
}

impl From<LightShadows> for ParamValue {
    fn from(v: LightShadows) -> Self {
        ParamValue::LightShadows(v)
    }
}

impl From<LightRenderMode> for ParamValue {
    fn from(v: LightRenderMode) -> Self {
        ParamValue::RenderMode(v)
    }
}

impl From<TextureFilter> for ParamValue {
    fn from(v: TextureFilter) -> Self {
        ParamValue::Filter(v)
    }
}
