// ==========================================
// 报关单生成系统 - 配置层
// ==========================================
// 职责: 转换配置定义与加载，支持文件/环境变量覆写
// 存储: JSON 配置文件（缺省字段取内置默认值）
// ==========================================

pub mod config_manager;
pub mod conversion_config;

// 重导出核心配置管理器
pub use config_manager::{ConfigError, ConfigManager, CONFIG_ENV_VAR};
pub use conversion_config::{
    ConversionConfig, FieldRule, FieldSource, IngestLayout, InvoiceHeaderLayout, MappingConfig,
    OutputLayout, PackingListLayout, ReferenceAttribute, ReferenceLayout, ValueRow,
};
