//! 功能控制器
//!
//! 每个控制器拥有一个功能的启用状态机、参数派生和设置足迹。
//! 所有对宿主参数的修改都经由 [`RenderContext`] 写入账本后再落到宿主。
//!
//! 状态机：
//!
//! ```text
//! Uninitialized ──attach──▶ Supported ──enable──▶ Enabled ──disable──▶ Disabled
//!               └────────▶ Unsupported                ▲                   │
//!                                                     └──────enable───────┘
//! ```

pub mod frame_generation;
pub mod path_tracing;
pub mod ray_tracing;
pub mod render_scale;
pub mod texture;
pub mod upscaling;

pub use frame_generation::FrameGenerationController;
pub use path_tracing::{PathTracingController, PathTracingParams, PathTracingPreset};
pub use ray_tracing::{RayTracingController, RayTracingProfile};
pub use render_scale::apply_render_scale;
pub use texture::{TextureEnhancer, TextureProfile};
pub use upscaling::UpscalingController;

use crate::core::diagnostics::Diagnostics;
use crate::core::error::{FeatureError, FeatureResult};
use crate::host::{HostEngine, ParamKey, ParamValue};
use crate::ledger::SettingsLedger;
use fidelity_engine_hardware::DeviceCapabilities;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 功能类别，同时作为账本中的持有者标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKind {
    RayTracing,
    Upscaling,
    FrameGeneration,
    PathTracing,
    Texture,
    RenderScale,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 功能状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureState {
    Uninitialized,
    Supported,
    Unsupported,
    Enabled,
    Disabled,
}

impl fmt::Display for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 控制器共用的状态机
#[derive(Debug, Clone)]
pub struct Lifecycle {
    kind: FeatureKind,
    state: FeatureState,
    device: String,
}

impl Lifecycle {
    pub fn new(kind: FeatureKind) -> Self {
        Self {
            kind,
            state: FeatureState::Uninitialized,
            device: String::new(),
        }
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn state(&self) -> FeatureState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state == FeatureState::Enabled
    }

    /// 挂载时的本地能力检查
    pub fn attach(&mut self, device: &str, supported: bool) -> FeatureState {
        self.device = device.to_string();
        self.state = if supported {
            FeatureState::Supported
        } else {
            FeatureState::Unsupported
        };
        tracing::debug!(target: "enhancer", "{} attached: {}", self.kind, self.state);
        self.state
    }

    /// 检查能否进入 Enabled
    pub fn check_enable(&self) -> FeatureResult<()> {
        match self.state {
            FeatureState::Supported | FeatureState::Disabled | FeatureState::Enabled => Ok(()),
            FeatureState::Unsupported => Err(FeatureError::CapabilityMismatch {
                feature: self.kind,
                device: self.device.clone(),
            }),
            FeatureState::Uninitialized => Err(self.precondition("enable")),
        }
    }

    /// 检查能否在当前状态下调整参数
    pub fn check_configure(&self, operation: &str) -> FeatureResult<()> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(self.precondition(operation))
        }
    }

    fn precondition(&self, operation: &str) -> FeatureError {
        FeatureError::PreconditionNotMet {
            feature: self.kind,
            operation: operation.to_string(),
            state: self.state.to_string(),
        }
    }

    pub fn mark_enabled(&mut self) {
        self.state = FeatureState::Enabled;
    }

    /// Enabled → Disabled，其余状态不变，返回是否发生了转换
    pub fn mark_disabled(&mut self) -> bool {
        if self.is_enabled() {
            self.state = FeatureState::Disabled;
            true
        } else {
            false
        }
    }
}

/// 控制器操作宿主所需的上下文
pub struct RenderContext<'a> {
    pub host: &'a mut dyn HostEngine,
    pub ledger: &'a mut SettingsLedger,
    pub diagnostics: &'a mut Diagnostics,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        host: &'a mut dyn HostEngine,
        ledger: &'a mut SettingsLedger,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self { host, ledger, diagnostics }
    }

    /// 记录后写入，宿主拒绝时记录警告并返回 false
    pub fn set(
        &mut self,
        owner: FeatureKind,
        key: impl Into<ParamKey>,
        value: impl Into<ParamValue>,
    ) -> bool {
        let key = key.into();
        match self.ledger.apply(&mut *self.host, owner, key, value.into()) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(target: "enhancer", "{} could not set {}: {}", owner, key, error);
                false
            }
        }
    }

    /// 恢复 `owner` 的全部设置
    pub fn restore(&mut self, owner: FeatureKind) -> usize {
        self.ledger.restore(&mut *self.host, owner)
    }

    /// 报告可恢复错误
    pub fn report(&mut self, error: FeatureError) {
        self.diagnostics.report(error);
    }
}

/// 控制器公共接口
pub trait FeatureController {
    /// 功能类别
    fn kind(&self) -> FeatureKind;

    /// 当前状态
    fn state(&self) -> FeatureState;

    /// 挂载：根据能力记录决定 Supported 或 Unsupported
    fn attach(&mut self, caps: &DeviceCapabilities) -> FeatureState;

    /// 禁用并恢复设置；未启用时为空操作
    fn disable(&mut self, ctx: &mut RenderContext<'_>);

    /// 拆除：无论当前状态如何都尝试恢复
    fn teardown(&mut self, ctx: &mut RenderContext<'_>) {
        self.disable(ctx);
        ctx.restore(self.kind());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut lifecycle = Lifecycle::new(FeatureKind::Upscaling);
        assert!(matches!(
            lifecycle.check_enable(),
            Err(FeatureError::PreconditionNotMet { .. })
        ));

        lifecycle.attach("gpu", true);
        assert!(lifecycle.check_enable().is_ok());
        assert!(lifecycle.check_configure("set quality").is_err());

        lifecycle.mark_enabled();
        assert!(lifecycle.check_configure("set quality").is_ok());
        assert!(lifecycle.mark_disabled());
        assert_eq!(lifecycle.state(), FeatureState::Disabled);
        assert!(!lifecycle.mark_disabled());

        // 重新启用
        assert!(lifecycle.check_enable().is_ok());
    }

    #[test]
    fn test_unsupported_reports_capability_mismatch() {
        let mut lifecycle = Lifecycle::new(FeatureKind::FrameGeneration);
        lifecycle.attach("Intel UHD 620", false);

        match lifecycle.check_enable() {
            Err(FeatureError::CapabilityMismatch { feature, device }) => {
                assert_eq!(feature, FeatureKind::FrameGeneration);
                assert_eq!(device, "Intel UHD 620");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(!lifecycle.mark_disabled());
        assert_eq!(lifecycle.state(), FeatureState::Unsupported);
    }
}
