// ==========================================
// 报关单生成系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / 哨兵判定 / 数值强制转换 / 物料号标准化
// ==========================================

use crate::domain::CellValue;
use crate::importer::importer_trait::DataCleaner as DataCleanerTrait;

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    fn is_sentinel(&self, value: &CellValue, sentinels: &[String]) -> bool {
        let normalized = value.normalized();
        sentinels.iter().any(|s| s.trim() == normalized)
    }

    fn coerce_numeric(&self, value: &CellValue) -> Result<CellValue, String> {
        match value {
            CellValue::Int(_) | CellValue::Float(_) => Ok(value.clone()),
            CellValue::Empty => Ok(CellValue::Empty),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(CellValue::Empty);
                }
                // 千分位逗号
                let plain: String = trimmed.chars().filter(|c| *c != ',').collect();
                plain
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(CellValue::Float)
                    .ok_or_else(|| s.clone())
            }
            CellValue::Bool(b) => Err(b.to_string()),
        }
    }

    fn material_key(&self, value: &CellValue) -> String {
        value.normalized()
    }
}

/// 保留 2 位小数，恰好为半数时取偶（0.125 → 0.12）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
