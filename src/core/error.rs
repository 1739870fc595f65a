//! 统一错误处理模块
//!
//! ## 错误类型分层
//!
//! - **功能层错误** (`FeatureError`): 能力不匹配、前置条件未满足、宿主资源缺失。
//!   三者都可恢复：操作降级为空操作并记录警告，不会中断编排器。
//! - **宿主边界错误** (`HostError`): 参数或场景对象在宿主中已不存在。
//!   恢复设置时遇到的宿主错误只记录、跳过，不向上传播。

use crate::features::FeatureKind;
use crate::host::{ParamKey, ParamValue};
use thiserror::Error;

/// 功能控制器报告的可恢复错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// 请求的功能不被探测到的硬件支持
    #[error("{feature} is not supported on '{device}'")]
    CapabilityMismatch { feature: FeatureKind, device: String },

    /// 操作依赖一个尚未发生的启用
    #[error("{feature}: cannot {operation} while {state}")]
    PreconditionNotMet {
        feature: FeatureKind,
        operation: String,
        state: String,
    },

    /// 初始化时缺少必需的宿主对象
    #[error("{feature}: required host resource '{resource}' is unavailable")]
    ResourceUnavailable { feature: FeatureKind, resource: String },
}

/// 功能操作结果类型
pub type FeatureResult<T> = Result<T, FeatureError>;

/// 宿主边界错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// 参数不存在（例如所属光源已被销毁）
    #[error("Host parameter {0} no longer exists")]
    ParameterMissing(ParamKey),

    /// 写入值类型与参数不符
    #[error("Host parameter {key} rejected value {value:?}")]
    TypeMismatch { key: ParamKey, value: ParamValue },

    /// 场景对象不存在
    #[error("Host object {0} no longer exists")]
    ObjectMissing(String),
}

/// 宿主操作结果类型
pub type HostResult<T> = Result<T, HostError>;
