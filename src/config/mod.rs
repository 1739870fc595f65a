/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和取值范围钳制。
/// 取值范围在此边界处理，核心逻辑只接收合法配置。
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod graphics;

pub use graphics::{GraphicsConfig, RENDER_SCALE_RANGE, TEXTURE_QUALITY_RANGE};

use crate::impl_default;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 增强器主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EnhancerConfig {
    /// 图形选项
    #[serde(default, rename = "Graphics")]
    pub graphics: GraphicsConfig,

    /// 日志配置
    #[serde(default, rename = "Logging")]
    pub logging: LoggingConfig,
}

impl EnhancerConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置（自动钳制越界值）
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.graphics.sanitize();
        Ok(config)
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置（自动钳制越界值）
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let mut config: Self =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.graphics.sanitize();
        Ok(config)
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    /// 从任意键值来源覆盖配置，随后重新钳制
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let graphics = &mut self.graphics;

        if let Some(val) = lookup("FIDELITY_ENABLE_RAY_TRACING") {
            graphics.enable_ray_tracing = val.parse().unwrap_or(graphics.enable_ray_tracing);
        }
        if let Some(val) = lookup("FIDELITY_ENABLE_DLSS") {
            graphics.enable_dlss = val.parse().unwrap_or(graphics.enable_dlss);
        }
        if let Some(val) = lookup("FIDELITY_ENABLE_FRAME_GENERATION") {
            graphics.enable_frame_generation =
                val.parse().unwrap_or(graphics.enable_frame_generation);
        }
        if let Some(val) = lookup("FIDELITY_TEXTURE_QUALITY") {
            if let Ok(quality) = val.parse() {
                graphics.texture_quality = quality;
            }
        }
        if let Some(val) = lookup("FIDELITY_RENDER_SCALE") {
            if let Ok(scale) = val.parse() {
                graphics.render_scale = scale;
            }
        }

        graphics.sanitize();
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.graphics.validate()
    }

    /// 用户配置目录中的配置文件路径
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fidelity_engine").join("config.toml"))
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./fidelity.toml
    /// 2. ./fidelity.json
    /// 3. <用户配置目录>/fidelity_engine/config.toml
    /// 4. 使用默认配置
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::from_toml_file("fidelity.toml") {
            tracing::info!(target: "config", "Loaded config from fidelity.toml");
            return config;
        }

        if let Ok(config) = Self::from_json_file("fidelity.json") {
            tracing::info!(target: "config", "Loaded config from fidelity.json");
            return config;
        }

        if let Some(path) = Self::user_config_path() {
            if let Ok(config) = Self::from_toml_file(&path) {
                tracing::info!(target: "config", "Loaded config from {:?}", path);
                return config;
            }
        }

        tracing::info!(target: "config", "Using default configuration");
        Self::default()
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 是否输出到控制台
    pub log_to_console: bool,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    log_to_console: true,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}
