// ==========================================
// 报关单生成系统 - 报关领域模型
// ==========================================
// 职责: 定义源数据行、物料参照、费率表、输出记录、汇总值
// 用途: 导入层写入, 派生层/模板层只读
// ==========================================

use crate::domain::types::{CellValue, DeclarationField};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// SourceTable - 源数据表（清洗后）
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceTable {
    pub sheet_name: String,      // 实际读取的工作表名
    pub headers: Vec<String>,    // 已 TRIM 的列名
    pub rows: Vec<SourceRow>,    // 截断后的数据行
}

impl SourceTable {
    /// 按别名查找列位置
    ///
    /// # 规则
    /// 1. 别名顺序优先，精确匹配
    /// 2. 全部失败后，忽略大小写与空白再匹配一次
    pub fn find_column<S: AsRef<str>>(&self, aliases: &[S]) -> Option<usize> {
        for alias in aliases {
            if let Some(idx) = self.headers.iter().position(|h| h == alias.as_ref().trim()) {
                return Some(idx);
            }
        }
        for alias in aliases {
            let wanted = loose_key(alias.as_ref());
            if let Some(idx) = self.headers.iter().position(|h| loose_key(h) == wanted) {
                return Some(idx);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn loose_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

// ==========================================
// SourceRow - 发票明细行
// ==========================================
// 标识 = 行位置；仅在导入阶段可变
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRow {
    pub row_index: usize, // 清洗后行号（0-based）
    pub sheet_row: u32,   // 工作表物理行号（1-based，诊断用）
    pub cells: Vec<CellValue>,
}

impl SourceRow {
    pub fn get(&self, col: usize) -> &CellValue {
        self.cells.get(col).unwrap_or(&CellValue::EMPTY)
    }
}

// ==========================================
// MaterialRecord - 物料参照记录
// ==========================================
// 物料号 → {商品编号, 申报要素, ...}
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialRecord {
    pub material_code: String,
    pub attributes: HashMap<String, CellValue>,
}

// ==========================================
// RateTable - 政策费率表
// ==========================================
// 加载后不可变；使用前已通过单元格位置校验
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTable {
    pub shipping_rate: f64,           // 运费费率（CNY/千克）
    pub exchange_rate: f64,           // 汇率（CNY → USD）
    pub markup: f64,                  // 加价倍数（105% 记为 1.05）
    pub insurance_coefficient_1: f64, // 保费系数1
    pub insurance_coefficient_2: f64, // 保费系数2（保险费率）
    pub insurance_base_amount: f64,   // 保险金额
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            shipping_rate: 1.795242141,
            exchange_rate: 0.139275766016713,
            markup: 1.05,
            insurance_coefficient_1: 1.10,
            insurance_coefficient_2: 0.0005,
            insurance_base_amount: 0.0,
        }
    }
}

// ==========================================
// OutputRecord - 报关单标准行
// ==========================================
// 与通过校验的 SourceRow 一一对应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub source_row: usize,
    cells: Vec<CellValue>,
}

impl OutputRecord {
    pub fn new(source_row: usize) -> Self {
        Self {
            source_row,
            cells: vec![CellValue::Empty; DeclarationField::COUNT],
        }
    }

    pub fn get(&self, field: DeclarationField) -> &CellValue {
        &self.cells[field.index()]
    }

    pub fn set(&mut self, field: DeclarationField, value: CellValue) {
        self.cells[field.index()] = value;
    }

    /// 按固定输出顺序返回字段值
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }
}

// ==========================================
// AggregateTotals - 汇总派生值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AggregateTotals {
    pub total_amount: f64,     // 总货值（2位小数）
    pub total_net_weight: f64, // 总净重（2位小数）
    pub freight: f64,          // 运费（CNY）
    pub insurance: f64,        // 保费（CNY）
}

// ==========================================
// ShipmentMetadata - 装箱单汇总
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ShipmentMetadata {
    pub package_count: f64, // 件数
    pub gross_weight: f64,  // 毛重（千克）
    pub net_weight: f64,    // 净重（千克）
}

// ==========================================
// InvoiceParties - 发票抬头信息
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InvoiceParties {
    pub seller: Option<String>,      // 发票卖方（境内发货人/生产销售单位）
    pub buyer: Option<String>,       // 发票买方（境外收货人）
    pub contract_no: Option<String>, // 出口发票号（合同协议号）
}

// ==========================================
// TradeConstants - 贸易监管常量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConstants {
    pub supervision_mode: String, // 监管方式
    pub tax_nature: String,       // 征免性质
    pub trade_country: String,    // 贸易国(地区)
    pub arrival_country: String,  // 运抵国(地区)
}

impl Default for TradeConstants {
    fn default() -> Self {
        Self {
            supervision_mode: "一般贸易".to_string(),
            tax_nature: "一般征税".to_string(),
            trade_country: "印度".to_string(),
            arrival_country: "印度".to_string(),
        }
    }
}

// ==========================================
// FillContext - 模板填充上下文
// ==========================================
// 各阶段显式传递的不可变上下文（取代全局累加字典）
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FillContext {
    pub totals: AggregateTotals,
    pub shipment: ShipmentMetadata,
    pub parties: InvoiceParties,
    pub trade: TradeConstants,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str]) -> SourceTable {
        SourceTable {
            sheet_name: "Sheet1".to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    #[test]
    fn test_find_column_alias_order() {
        let t = table(&["项号", "NO.", "DESCRIPTION"]);
        assert_eq!(t.find_column(&["NO.", "项号"]), Some(1));
        assert_eq!(t.find_column(&["项号", "NO."]), Some(0));
    }

    #[test]
    fn test_find_column_loose_match() {
        let t = table(&["Material Code", "net weight"]);
        assert_eq!(t.find_column(&["Material code"]), Some(0));
        assert_eq!(t.find_column(&["NET WEIGHT"]), Some(1));
        assert_eq!(t.find_column(&["Amount"]), None);
    }

    #[test]
    fn test_output_record_starts_blank() {
        let record = OutputRecord::new(0);
        assert!(record.cells().iter().all(|c| *c == CellValue::Empty));
        assert_eq!(record.cells().len(), DeclarationField::COUNT);
    }

    #[test]
    fn test_source_row_out_of_range_is_empty() {
        let row = SourceRow {
            row_index: 0,
            sheet_row: 12,
            cells: vec![CellValue::Int(1)],
        };
        assert_eq!(row.get(5), &CellValue::Empty);
    }
}
