// ==========================================
// 报关单生成系统 - 转换告警
// ==========================================
// 职责: 可降级问题（缺列/未匹配/模板填充失败）的结构化记录
// 红线: 告警不中断流程，随结果一并返回调用方
// ==========================================

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionWarning {
    /// 源表缺少期望列（字段留空）
    #[error("输入文件缺少列: {column}")]
    MissingColumn { column: String },

    /// 参照表缺少属性列
    #[error("参照文件缺少属性列: {attribute} (候选列名: {})", .candidates.join(", "))]
    MissingReferenceColumn {
        attribute: String,
        candidates: Vec<String>,
    },

    /// 物料号列缺失（参照匹配整体跳过）
    #[error("{workbook} 中未找到物料号列")]
    MaterialCodeColumnMissing { workbook: String },

    /// 物料号未在参照表中找到
    #[error("物料号未匹配 (行 {row}): {code}")]
    UnmatchedMaterialCode { row: usize, code: String },

    /// 数值字段出现非数值文本（已置空）
    #[error("非数值内容已置空 (行 {row}, 字段 {field}): {value}")]
    NonNumericValue {
        row: usize,
        field: String,
        value: String,
    },

    #[error("装箱单未找到合计行: {path}")]
    PackingTotalsNotFound { path: String },

    #[error("装箱单读取失败 {path}: {message}")]
    PackingListUnreadable { path: String, message: String },

    #[error("发票抬头读取失败 {path}: {message}")]
    InvoiceHeaderUnreadable { path: String, message: String },

    #[error("发票抬头缺少字段: {field}")]
    InvoicePartyMissing { field: String },

    #[error("模板 {template} 中未找到标签: {label}")]
    LabelNotFound { template: String, label: String },

    /// 模板填充失败（使用未填充模板继续合并）
    #[error("模板 {template} 填充失败: {message}")]
    AnnotationFailed { template: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_candidates() {
        let warning = ConversionWarning::MissingReferenceColumn {
            attribute: "申报要素".to_string(),
            candidates: vec!["申报要素".to_string(), "要素".to_string()],
        };
        assert_eq!(
            warning.to_string(),
            "参照文件缺少属性列: 申报要素 (候选列名: 申报要素, 要素)"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let warning = ConversionWarning::UnmatchedMaterialCode {
            row: 3,
            code: "MC9".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "unmatched_material_code");
        assert_eq!(json["code"], "MC9");
        assert_eq!(warning.to_string(), "物料号未匹配 (行 3): MC9");
    }
}
