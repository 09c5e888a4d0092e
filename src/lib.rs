// ==========================================
// 报关单生成系统 - 核心库
// ==========================================
// 输入: 商业发票/装箱单 + 申报要素参照表 + 政策费率表 + 模板
// 输出: 报关单明细工作簿 + 合并后的完整报关单
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 数据模型与告警
pub mod domain;

// 导入层 - 读取/映射/派生/写出
pub mod importer;

// 配置层 - 版式与映射配置
pub mod config;

// 模板层 - 表头/合计模板填充
pub mod template;

// 合并层 - 工作簿纵向合并
pub mod merge;

// 管道层 - 端到端编排
pub mod pipeline;

// 原子写出
pub mod fs_atomic;

// 日志系统
pub mod logging;

#[cfg(test)]
mod test_support;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{ConfigManager, ConversionConfig};
pub use domain::{
    AggregateTotals, CellValue, ConversionWarning, DeclarationField, FillContext, OutputRecord,
    RateTable,
};
pub use importer::{ImportError, ImportResult};
pub use merge::{MergeError, MergeReport, WorkbookMerger};
pub use pipeline::{ConversionInputs, ConversionOutcome, ConversionPipeline, PipelineError};
pub use template::{AnnotateError, TemplateAnnotator};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "报关单生成系统";
