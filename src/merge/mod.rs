// ==========================================
// 报关单生成系统 - 合并层
// ==========================================
// 职责: 表头模板 + 报关单明细 + 合计模板 纵向合并
// ==========================================

pub mod error;
pub mod merger;
pub mod range;

pub use error::{MergeError, MergeResult};
pub use merger::{ConditionalFormatScope, MergeOptions, MergeReport, MergedSource, WorkbookMerger};
pub use range::{column_index, column_letters, shift_sqref, CellRange};
