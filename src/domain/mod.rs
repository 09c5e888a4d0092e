// ==========================================
// 报关单生成系统 - 领域模型层
// ==========================================
// 职责: 定义单元格值、报关字段、源数据与派生结果
// 红线: 不含文件读写逻辑
// ==========================================

pub mod declaration;
pub mod types;
pub mod warning;

// 重导出核心类型
pub use declaration::{
    AggregateTotals, FillContext, InvoiceParties, MaterialRecord, OutputRecord, RateTable,
    ShipmentMetadata, SourceRow, SourceTable, TradeConstants,
};
pub use types::{format_number, CellValue, DeclarationField};
pub use warning::ConversionWarning;
