// ==========================================
// 报关单生成系统 - 导入层 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// ==========================================

use crate::domain::{
    AggregateTotals, CellValue, ConversionWarning, OutputRecord, RateTable, SourceTable,
};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{SheetGrid, SheetSelector};
use crate::importer::reference_resolver::ReferenceResolver;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 工作簿读取接口（阶段 0）
// 实现者: ExcelParser
pub trait FileParser: Send + Sync {
    /// 读取选定工作表为物理行网格
    ///
    /// # 参数
    /// - file_path: 工作簿路径
    /// - selector: 工作表选择规则
    ///
    /// # 返回
    /// - Ok(SheetGrid): rows[0] 对应 Excel 第 1 行
    /// - Err: 文件缺失、格式不支持、解析失败
    fn read_sheet(&self, file_path: &Path, selector: SheetSelector) -> ImportResult<SheetGrid>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗与标准化（阶段 1）
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// 文本清洗（TRIM）
    fn clean_text(&self, value: &str) -> String;

    /// 是否为截断哨兵（标准化后落在哨兵集合内）
    fn is_sentinel(&self, value: &CellValue, sentinels: &[String]) -> bool;

    /// 数值强制转换
    ///
    /// # 返回
    /// - Ok(Empty): 空白
    /// - Ok(Float/Int): 数值或可解析的数值文本
    /// - Err(原文): 非数值文本
    fn coerce_numeric(&self, value: &CellValue) -> Result<CellValue, String>;

    /// 物料号匹配键（TRIM + 字符串化，整数值浮点去小数点）
    fn material_key(&self, value: &CellValue) -> String;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 字段映射接口（阶段 2）
// 实现者: FieldMapperImpl
pub trait FieldMapper: Send + Sync {
    /// 将源表映射为报关单标准行
    ///
    /// # 参数
    /// - table: 清洗截断后的源表
    /// - resolver: 物料参照（已预建索引）
    ///
    /// # 返回
    /// - MappedRecords: 与源行一一对应的输出记录 + 告警
    fn map_records(&self, table: &SourceTable, resolver: &ReferenceResolver) -> MappedRecords;
}

/// 字段映射结果
#[derive(Debug, Clone, Default)]
pub struct MappedRecords {
    pub records: Vec<OutputRecord>,
    pub warnings: Vec<ConversionWarning>,
}

// ==========================================
// DerivationService Trait
// ==========================================
// 用途: 金额派生接口（阶段 3）
// 实现者: FinancialDeriver
pub trait DerivationService: Send + Sync {
    /// 派生总货值/总净重/运费/保费
    ///
    /// # 规则
    /// - total_amount = round(Σ总价, 2)
    /// - total_net_weight = round(Σ净重, 2)
    /// - freight = round(total_net_weight × shipping_rate, 2)
    /// - insurance = round(total_amount × markup × coeff1 × coeff2 ÷ exchange_rate, 2)
    fn derive_totals(&self, records: &[OutputRecord], rates: &RateTable) -> AggregateTotals;
}
