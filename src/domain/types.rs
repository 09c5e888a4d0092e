// ==========================================
// 报关单生成系统 - 领域类型定义
// ==========================================
// 职责: 单元格值 + 报关单标准字段
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 单元格值
// ==========================================
// Empty 即"未找到"标记（空白），不会出现部分填充的字段
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    /// 空白单元格常量（用于越界读取时返回引用）
    pub const EMPTY: CellValue = CellValue::Empty;

    pub fn text<S: Into<String>>(value: S) -> Self {
        CellValue::Text(value.into())
    }

    /// 是否为空（Empty 或仅含空白的文本）
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 数值视图（仅 Int / Float）
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Float(_))
    }

    /// 标准化字符串（TRIM + 字符串化）
    ///
    /// # 规则
    /// - Empty → ""
    /// - 整数值浮点 → 不带小数点（1.0 → "1"）
    /// - 文本 → 去首尾空白
    pub fn normalized(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", format_number(*v)),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

/// 数值格式化：整数不带小数点，其余保留最短表示
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

// ==========================================
// DeclarationField - 报关单标准字段
// ==========================================
// 顺序即输出列顺序（固定，不随配置变化）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationField {
    #[serde(alias = "项号")]
    ItemNo,
    #[serde(alias = "商品编号")]
    DeclaredCode,
    #[serde(alias = "品名")]
    Description,
    #[serde(alias = "型号")]
    Model,
    #[serde(alias = "申报要素")]
    DeclarationElements,
    #[serde(alias = "数量")]
    Quantity,
    #[serde(alias = "单位")]
    Unit,
    #[serde(alias = "单价")]
    UnitPrice,
    #[serde(alias = "总价")]
    Amount,
    #[serde(alias = "币制")]
    Currency,
    #[serde(alias = "原产国（地区）")]
    OriginCountry,
    #[serde(alias = "最终目的国（地区）")]
    DestinationCountry,
    #[serde(alias = "境内货源地")]
    DomesticSource,
    #[serde(alias = "征免")]
    TaxExemption,
    #[serde(alias = "净重")]
    NetWeight,
}

impl DeclarationField {
    pub const COUNT: usize = 15;

    pub const ALL: [DeclarationField; DeclarationField::COUNT] = [
        DeclarationField::ItemNo,
        DeclarationField::DeclaredCode,
        DeclarationField::Description,
        DeclarationField::Model,
        DeclarationField::DeclarationElements,
        DeclarationField::Quantity,
        DeclarationField::Unit,
        DeclarationField::UnitPrice,
        DeclarationField::Amount,
        DeclarationField::Currency,
        DeclarationField::OriginCountry,
        DeclarationField::DestinationCountry,
        DeclarationField::DomesticSource,
        DeclarationField::TaxExemption,
        DeclarationField::NetWeight,
    ];

    /// 输出列位置（0-based）
    pub fn index(self) -> usize {
        self as usize
    }

    /// 输出表头（中文）
    pub fn header(self) -> &'static str {
        match self {
            DeclarationField::ItemNo => "项号",
            DeclarationField::DeclaredCode => "商品编号",
            DeclarationField::Description => "品名",
            DeclarationField::Model => "型号",
            DeclarationField::DeclarationElements => "申报要素",
            DeclarationField::Quantity => "数量",
            DeclarationField::Unit => "单位",
            DeclarationField::UnitPrice => "单价",
            DeclarationField::Amount => "总价",
            DeclarationField::Currency => "币制",
            DeclarationField::OriginCountry => "原产国（地区）",
            DeclarationField::DestinationCountry => "最终目的国（地区）",
            DeclarationField::DomesticSource => "境内货源地",
            DeclarationField::TaxExemption => "征免",
            DeclarationField::NetWeight => "净重",
        }
    }
}

impl fmt::Display for DeclarationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header())
    }
}
