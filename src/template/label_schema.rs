// ==========================================
// 报关单生成系统 - 模板标签规则
// ==========================================
// 职责: 定义表头模板/合计模板的标签匹配规则与取值来源
// 规则: 按顺序匹配，单元格文本包含 needle 的首条规则生效
// ==========================================

use crate::domain::{format_number, FillContext};
use serde::{Deserialize, Serialize};

/// 标签取值来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelValue {
    PackageCount,
    GrossWeight,
    NetWeight,
    SupervisionMode,
    TaxNature,
    TradeCountry,
    ArrivalCountry,
    Freight,
    Insurance,
    TotalAmount,
    TotalNetWeight,
    Seller,
    Buyer,
    ContractNo,
    Fixed(String),
}

impl LabelValue {
    /// 数值型来源取数
    pub fn number(&self, ctx: &FillContext) -> Option<f64> {
        match self {
            LabelValue::PackageCount => Some(ctx.shipment.package_count),
            LabelValue::GrossWeight => Some(ctx.shipment.gross_weight),
            LabelValue::NetWeight => Some(ctx.shipment.net_weight),
            LabelValue::Freight => Some(ctx.totals.freight),
            LabelValue::Insurance => Some(ctx.totals.insurance),
            LabelValue::TotalAmount => Some(ctx.totals.total_amount),
            LabelValue::TotalNetWeight => Some(ctx.totals.total_net_weight),
            _ => None,
        }
    }

    /// 渲染为文本（缺失的抬头信息渲染为空串）
    pub fn render(&self, ctx: &FillContext) -> String {
        if let Some(n) = self.number(ctx) {
            return format_number(n);
        }
        let party = |v: &Option<String>| v.clone().unwrap_or_default();
        match self {
            LabelValue::SupervisionMode => ctx.trade.supervision_mode.clone(),
            LabelValue::TaxNature => ctx.trade.tax_nature.clone(),
            LabelValue::TradeCountry => ctx.trade.trade_country.clone(),
            LabelValue::ArrivalCountry => ctx.trade.arrival_country.clone(),
            LabelValue::Seller => party(&ctx.parties.seller),
            LabelValue::Buyer => party(&ctx.parties.buyer),
            LabelValue::ContractNo => party(&ctx.parties.contract_no),
            LabelValue::Fixed(text) => text.clone(),
            _ => String::new(),
        }
    }
}

/// 单条标签规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRule {
    pub needle: String, // 单元格包含此文本即命中
    pub label: String,  // 改写后的标签
    pub value: LabelValue,
}

impl LabelRule {
    pub fn new(needle: &str, label: &str, value: LabelValue) -> Self {
        Self {
            needle: needle.to_string(),
            label: label.to_string(),
            value,
        }
    }

    /// 改写后的单元格文本: "{label}\n{value}"
    pub fn render(&self, ctx: &FillContext) -> String {
        format!("{}\n{}", self.label, self.value.render(ctx))
    }
}

// ==========================================
// LabelSchema - 表头模板规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSchema {
    pub scan_rows: u32, // 扫描前 N 行
    pub rules: Vec<LabelRule>,
}

impl LabelSchema {
    /// 返回首条命中规则的序号
    pub fn match_rule(&self, text: &str) -> Option<usize> {
        self.rules.iter().position(|r| text.contains(r.needle.as_str()))
    }
}

impl Default for LabelSchema {
    fn default() -> Self {
        use LabelValue::*;
        Self {
            scan_rows: 10,
            rules: vec![
                LabelRule::new("件数", "件数", PackageCount),
                LabelRule::new("毛重(千克)", "毛重(千克)", GrossWeight),
                LabelRule::new("净重(千克)", "净重(千克)", NetWeight),
                LabelRule::new("监管方式", "监管方式", SupervisionMode),
                LabelRule::new("征免性质", "征免性质", TaxNature),
                LabelRule::new("贸易国", "贸易国(地区)", TradeCountry),
                LabelRule::new("运抵国", "运抵国（地区)", ArrivalCountry),
                LabelRule::new("运费", "运费（CNY)", Freight),
                LabelRule::new("保费", "保费（CNY)", Insurance),
                LabelRule::new("境内发货人", "境内发货人", Seller),
                LabelRule::new("生产销售单位", "生产销售单位", Seller),
                LabelRule::new("境外收货人", "境外收货人", Buyer),
                LabelRule::new("合同协议号", "合同协议号", ContractNo),
            ],
        }
    }
}

// ==========================================
// TotalsSchema - 合计模板规则
// ==========================================
// 命中单元格右侧一格写入数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalsSchema {
    pub scan_rows: u32,
    pub rules: Vec<TotalsRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsRule {
    pub needle: String,
    pub value: LabelValue,
}

impl TotalsSchema {
    pub fn match_rule(&self, text: &str) -> Option<usize> {
        self.rules.iter().position(|r| text.contains(r.needle.as_str()))
    }
}

impl Default for TotalsSchema {
    fn default() -> Self {
        Self {
            scan_rows: 2,
            rules: vec![
                TotalsRule {
                    needle: "总货值".to_string(),
                    value: LabelValue::TotalAmount,
                },
                TotalsRule {
                    needle: "总净重".to_string(),
                    value: LabelValue::TotalNetWeight,
                },
            ],
        }
    }
}
