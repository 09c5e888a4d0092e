// ==========================================
// 报关单生成系统 - 转换配置
// ==========================================
// 职责: 各阶段的版式/映射/常量配置（JSON 可覆写，全部字段有默认值）
// 红线: 配置为不可变值，按引用传入各阶段，不使用全局状态
// ==========================================

use crate::domain::{CellValue, DeclarationField, RateTable, TradeConstants};
use crate::importer::file_parser::SheetSelector;
use crate::merge::merger::MergeOptions;
use crate::template::label_schema::{LabelSchema, TotalsSchema};
use serde::{Deserialize, Serialize};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// ==========================================
// ConversionConfig - 全量配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub ingest: IngestLayout,
    pub mapping: MappingConfig,
    pub reference: ReferenceLayout,
    pub packing_list: PackingListLayout,
    pub invoice_header: InvoiceHeaderLayout,
    pub labels: LabelSchema,
    pub totals: TotalsSchema,
    pub trade: TradeConstants,
    pub rates: RateTable, // 政策文件空白单元格的回退值
    pub output: OutputLayout,
    pub merge: MergeOptions,
}

// ==========================================
// IngestLayout - 发票明细表版式
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestLayout {
    pub sheet: SheetSelector,          // 工作表选择
    pub skip_rows: usize,              // 表头前跳过的物理行数（抬头/信头）
    pub drop_first_row: bool,          // 丢弃首个数据行（二级表头）
    pub item_no_columns: Vec<String>,  // 项号列别名（截断哨兵列）
    pub sentinel_values: Vec<String>,  // 视为空的标准化值
}

impl Default for IngestLayout {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::PreferSecond,
            skip_rows: 9,
            drop_first_row: true,
            item_no_columns: strings(&["NO.", "No.", "项号"]),
            sentinel_values: strings(&["", "nan"]),
        }
    }
}

// ==========================================
// MappingConfig - 字段映射配置
// ==========================================
// 不同发票版式 = 不同配置实例（同一个 FieldMapper）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub material_code_columns: Vec<String>, // 源表物料号列别名
    pub rules: Vec<FieldRule>,
}

/// 单字段映射规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: DeclarationField,
    pub source: FieldSource,
    #[serde(default)]
    pub numeric: bool, // 强制数值或空白
}

impl FieldRule {
    pub fn input(field: DeclarationField, columns: &[&str]) -> Self {
        Self {
            field,
            source: FieldSource::Input(strings(columns)),
            numeric: false,
        }
    }

    pub fn reference(field: DeclarationField, attribute: &str) -> Self {
        Self {
            field,
            source: FieldSource::Reference(attribute.to_string()),
            numeric: false,
        }
    }

    pub fn fixed<V: Into<CellValue>>(field: DeclarationField, value: V) -> Self {
        Self {
            field,
            source: FieldSource::Fixed(value.into()),
            numeric: false,
        }
    }

    pub fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }
}

/// 字段来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// 源表列（别名列表，按顺序匹配）
    Input(Vec<String>),
    /// 参照表属性（按物料号匹配）
    Reference(String),
    /// 固定值
    Fixed(CellValue),
}

impl Default for MappingConfig {
    fn default() -> Self {
        use DeclarationField::*;
        Self {
            material_code_columns: strings(&["Material code", "MaterialCode", "物料代码", "物料号"]),
            rules: vec![
                FieldRule::input(ItemNo, &["NO.", "No.", "项号"]),
                FieldRule::reference(DeclaredCode, "商品编号"),
                FieldRule::input(Description, &["DESCRIPTION", "品名"]),
                FieldRule::input(Model, &["Model NO.", "Model No.", "型号"]),
                FieldRule::reference(DeclarationElements, "申报要素"),
                FieldRule::input(Quantity, &["Qty", "数量"]),
                FieldRule::input(Unit, &["Unit", "单位"]),
                FieldRule::input(UnitPrice, &["Unit Price", "Unit Price USD", "单价"]),
                FieldRule::input(Amount, &["Amount", "Amount USD", "总价"]).numeric(),
                FieldRule::fixed(Currency, "美元"),
                FieldRule::fixed(OriginCountry, "中国"),
                FieldRule::fixed(DestinationCountry, "印度"),
                FieldRule::fixed(DomesticSource, "深圳特区"),
                FieldRule::fixed(TaxExemption, "照章征税"),
                FieldRule::input(NetWeight, &["net weight", "N.W.", "净重"]).numeric(),
            ],
        }
    }
}

// ==========================================
// ReferenceLayout - 申报要素参照表版式
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceLayout {
    pub sheet: SheetSelector,
    pub header_row: usize,                  // 表头物理行（0-based）
    pub material_code_columns: Vec<String>, // 参照表物料号列别名
    pub attributes: Vec<ReferenceAttribute>,
}

/// 参照属性：对外名称 + 参照表候选列名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceAttribute {
    pub name: String,
    pub columns: Vec<String>,
}

impl Default for ReferenceLayout {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::Index(0),
            header_row: 0,
            material_code_columns: strings(&["Material code", "MaterialCode", "物料代码", "物料号"]),
            attributes: vec![
                // 商品编号在参照表中以 HSCODE 列提供
                ReferenceAttribute {
                    name: "商品编号".to_string(),
                    columns: strings(&["HSCODE", "HS CODE", "商品编号"]),
                },
                ReferenceAttribute {
                    name: "申报要素".to_string(),
                    columns: strings(&["申报要素"]),
                },
            ],
        }
    }
}

// ==========================================
// PackingListLayout - 装箱单合计行版式
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingListLayout {
    pub sheet: SheetSelector,
    pub header_rows: usize,      // 表头行数（不参与扫描）
    pub label_column: usize,     // 哨兵所在列（A 列 = 0）
    pub sentinel: String,        // 合计行标记
    pub value_row: ValueRow,     // 取值行（哨兵上一行 / 哨兵行）
    pub package_column: usize,   // 件数列（F）
    pub gross_weight_column: usize, // 毛重列（H）
    pub net_weight_column: usize,   // 净重列（I）
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRow {
    Above,
    Sentinel,
}

impl Default for PackingListLayout {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::Index(0),
            header_rows: 1,
            label_column: 0,
            sentinel: "TTL:".to_string(),
            value_row: ValueRow::Above,
            package_column: 5,
            gross_weight_column: 7,
            net_weight_column: 8,
        }
    }
}

// ==========================================
// InvoiceHeaderLayout - 发票抬头版式
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceHeaderLayout {
    pub sheet: SheetSelector,
    pub seller_row: usize,      // 卖方单元格（A1）
    pub seller_column: usize,
    pub scan_start_row: usize,  // 抬头扫描起始物理行（0-based）
    pub scan_rows: usize,       // 扫描行数
    pub buyer_marker: String,
    pub contract_marker: String,
}

impl Default for InvoiceHeaderLayout {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::PreferSecond,
            seller_row: 0,
            seller_column: 0,
            scan_start_row: 1,
            scan_rows: 4,
            buyer_marker: "Buyer:".to_string(),
            contract_marker: "CI No.:".to_string(),
        }
    }
}

// ==========================================
// OutputLayout - 报关单输出版式
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLayout {
    pub sheet_name: String,
    pub column_width: f64,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
            column_width: 15.0,
        }
    }
}
