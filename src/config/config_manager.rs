// ==========================================
// 报关单生成系统 - 配置管理器
// ==========================================
// 职责: 配置文件定位、加载、快照
// 优先级: 显式路径 > 环境变量 > 用户配置目录 > 内置默认值
// ==========================================

use crate::config::conversion_config::ConversionConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// 配置文件路径环境变量
pub const CONFIG_ENV_VAR: &str = "CUSTOMS_SHEET_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(String),

    #[error("配置文件读取失败 {path}: {message}")]
    Read { path: String, message: String },

    #[error("配置文件格式错误 {path}: {message}")]
    Parse { path: String, message: String },
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager;

impl ConfigManager {
    /// 默认配置文件路径（{config_dir}/customs-sheet/config.json）
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("customs-sheet").join("config.json"))
    }

    /// 解析应加载的配置文件
    ///
    /// # 返回
    /// - Some((path, explicit)): 待加载文件；explicit=true 时文件必须存在
    /// - None: 使用内置默认值
    pub fn resolve_path(explicit: Option<&Path>) -> Option<(PathBuf, bool)> {
        if let Some(path) = explicit {
            return Some((path.to_path_buf(), true));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some((PathBuf::from(path), true));
            }
        }
        Self::default_config_path()
            .filter(|p| p.exists())
            .map(|p| (p, false))
    }

    /// 按优先级加载配置
    pub fn load(explicit: Option<&Path>) -> Result<ConversionConfig, ConfigError> {
        match Self::resolve_path(explicit) {
            Some((path, required)) => {
                if !path.exists() && required {
                    return Err(ConfigError::NotFound(path.display().to_string()));
                }
                Self::load_from_file(&path)
            }
            None => {
                debug!("未找到配置文件，使用内置默认值");
                Ok(ConversionConfig::default())
            }
        }
    }

    /// 从 JSON 文件加载（缺省字段取默认值）
    pub fn load_from_file(path: &Path) -> Result<ConversionConfig, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: ConversionConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        info!(file = %path.display(), "配置文件加载完成");
        Ok(config)
    }

    /// 获取配置快照（JSON 格式），随转换结果记录
    pub fn snapshot(config: &ConversionConfig) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(config)
    }
}
