//! 核心模块
//!
//! - `error` - 错误类型定义
//! - `diagnostics` - 可恢复错误的有界记录
//! - `logging` - 日志初始化
//! - `macros` - 通用宏

pub mod diagnostics;
pub mod error;
pub mod logging;
#[macro_use]
pub mod macros;

pub use diagnostics::Diagnostics;
pub use error::{FeatureError, FeatureResult, HostError, HostResult};
pub use logging::init_logging;
