// ==========================================
// 报关单生成系统 - 模板层
// ==========================================
// 职责: 表头模板 / 合计模板 填充
// ==========================================

pub mod annotator;
pub mod error;
pub mod label_schema;

pub use annotator::{AnnotationSummary, TemplateAnnotator};
pub use error::{AnnotateError, AnnotateResult};
pub use label_schema::{LabelRule, LabelSchema, LabelValue, TotalsRule, TotalsSchema};
