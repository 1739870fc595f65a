//! 日志初始化
//!
//! 使用 `tracing` 输出日志，`RUST_LOG` 环境变量优先于配置文件中的级别。

use crate::config::{LogLevel, LoggingConfig};
use tracing_subscriber::EnvFilter;

impl LogLevel {
    /// 对应的 EnvFilter 指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 初始化日志系统
///
/// 重复调用是安全的：已安装全局订阅者时直接返回 false。
pub fn init_logging(config: &LoggingConfig) -> bool {
    if !config.log_to_console {
        return false;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(target: "enhancer", "Logging initialized at level {:?}", config.level);
    }
    installed
}
