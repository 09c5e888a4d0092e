// ==========================================
// 报关单生成系统 - 物料参照解析
// ==========================================
// 职责: 参照表 → 每属性一张 物料号 → 值 索引（O(1) 查找）
// 规则: 重复物料号后者覆盖；未匹配返回 Empty，不报错
// ==========================================

use crate::config::{ReferenceAttribute, ReferenceLayout};
use crate::domain::{CellValue, ConversionWarning, MaterialRecord};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::SheetGrid;
use crate::importer::importer_trait::{DataCleaner as DataCleanerTrait, FileParser};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    // 属性名 → (物料号 → 值)
    maps: HashMap<String, HashMap<String, CellValue>>,
    warnings: Vec<ConversionWarning>,
}

impl ReferenceResolver {
    /// 读取参照工作簿并建立索引
    #[instrument(skip(parser, layout), fields(file = %path.display()))]
    pub fn load<P: FileParser>(
        parser: &P,
        path: &Path,
        layout: &ReferenceLayout,
    ) -> ImportResult<Self> {
        let grid = parser.read_sheet(path, layout.sheet)?;
        let resolver = Self::from_grid(&grid, layout, &path.display().to_string());
        info!(
            attributes = resolver.maps.len(),
            warnings = resolver.warnings.len(),
            "参照表索引建立完成"
        );
        Ok(resolver)
    }

    /// 从已读取的网格建立索引
    pub fn from_grid(grid: &SheetGrid, layout: &ReferenceLayout, workbook: &str) -> Self {
        let cleaner = DataCleaner;
        let mut resolver = Self::default();

        let headers: Vec<String> = grid
            .rows
            .get(layout.header_row)
            .map(|cells| cells.iter().map(|c| cleaner.clean_text(&c.normalized())).collect())
            .unwrap_or_default();

        let code_col = match find_header(&headers, &layout.material_code_columns) {
            Some(col) => col,
            None => {
                warn!(workbook, "参照表未找到物料号列");
                resolver.warnings.push(ConversionWarning::MaterialCodeColumnMissing {
                    workbook: workbook.to_string(),
                });
                return resolver;
            }
        };

        for ReferenceAttribute { name, columns } in &layout.attributes {
            let Some(col) = find_header(&headers, columns) else {
                warn!(attribute = %name, "参照表缺少属性列");
                resolver.warnings.push(ConversionWarning::MissingReferenceColumn {
                    attribute: name.clone(),
                    candidates: columns.clone(),
                });
                continue;
            };

            let map = resolver.maps.entry(name.clone()).or_default();
            for row in grid.rows.iter().skip(layout.header_row + 1) {
                let code = cleaner.material_key(row.get(code_col).unwrap_or(&CellValue::EMPTY));
                if code.is_empty() {
                    continue;
                }
                let value = row.get(col).cloned().unwrap_or_default();
                // 后出现的同号记录覆盖先前记录
                map.insert(code, value);
            }
            debug!(attribute = %name, entries = map.len(), "属性索引完成");
        }

        resolver
    }

    /// 汇总单个物料的全部属性；空物料号或未匹配返回 None
    pub fn record(&self, material_code: &CellValue) -> Option<MaterialRecord> {
        let key = DataCleaner.material_key(material_code);
        if key.is_empty() {
            return None;
        }
        let attributes: HashMap<String, CellValue> = self
            .maps
            .iter()
            .filter_map(|(attr, m)| m.get(&key).map(|v| (attr.clone(), v.clone())))
            .collect();
        if attributes.is_empty() {
            None
        } else {
            Some(MaterialRecord {
                material_code: key,
                attributes,
            })
        }
    }

    /// 已建索引的属性名
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    /// 建索引过程产生的告警
    pub fn warnings(&self) -> &[ConversionWarning] {
        &self.warnings
    }

    #[cfg(test)]
    pub fn insert(&mut self, attribute: &str, material_code: &str, value: CellValue) {
        self.maps
            .entry(attribute.to_string())
            .or_default()
            .insert(material_code.trim().to_string(), value);
    }
}

fn find_header(headers: &[String], aliases: &[String]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| headers.iter().position(|h| h == alias.trim()))
        .or_else(|| {
            aliases.iter().find_map(|alias| {
                let wanted = alias.trim().to_lowercase();
                headers.iter().position(|h| h.to_lowercase() == wanted)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::ExcelParser;
    use crate::test_support::{text_row, write_workbook};
    use tempfile::tempdir;

    fn reference_grid() -> SheetGrid {
        SheetGrid {
            sheet_name: "Sheet1".to_string(),
            sheet_count: 1,
            rows: vec![
                text_row(&["物料号", "HSCODE", "申报要素"]),
                text_row(&["MC1", "HS1", "E1"]),
                vec![CellValue::Float(10086.0), CellValue::text("HS2"), CellValue::text("E2")],
                text_row(&["MC1", "HS1-NEW", "E1-NEW"]),
                text_row(&["", "orphan", "orphan"]),
            ],
        }
    }

    fn value(resolver: &ReferenceResolver, attribute: &str, code: CellValue) -> CellValue {
        resolver
            .record(&code)
            .and_then(|r| r.attributes.get(attribute).cloned())
            .unwrap_or_default()
    }

    #[test]
    fn test_lookup_and_last_duplicate_wins() {
        let resolver =
            ReferenceResolver::from_grid(&reference_grid(), &ReferenceLayout::default(), "ref.xlsx");
        assert!(resolver.warnings().is_empty());
        let mut attributes: Vec<&str> = resolver.attributes().collect();
        attributes.sort();
        assert_eq!(attributes, vec!["商品编号", "申报要素"]);
        assert_eq!(
            value(&resolver, "商品编号", CellValue::text(" MC1 ")),
            CellValue::text("HS1-NEW")
        );
        assert_eq!(
            value(&resolver, "申报要素", CellValue::text("10086")),
            CellValue::text("E2")
        );
        assert_eq!(
            value(&resolver, "商品编号", CellValue::Float(10086.0)),
            CellValue::text("HS2")
        );
    }

    #[test]
    fn test_unmatched_returns_empty() {
        let resolver =
            ReferenceResolver::from_grid(&reference_grid(), &ReferenceLayout::default(), "ref.xlsx");
        assert_eq!(value(&resolver, "商品编号", CellValue::text("UNKNOWN")), CellValue::Empty);
        assert!(resolver.record(&CellValue::text("UNKNOWN")).is_none());
        // 空物料号不入索引
        assert!(resolver.record(&CellValue::Empty).is_none());
    }

    #[test]
    fn test_declared_code_falls_back_to_chinese_header() {
        let grid = SheetGrid {
            sheet_name: "Sheet1".to_string(),
            sheet_count: 1,
            rows: vec![
                text_row(&["Material code", "商品编号", "申报要素"]),
                text_row(&["MC1", "8471", "E1"]),
            ],
        };
        let resolver = ReferenceResolver::from_grid(&grid, &ReferenceLayout::default(), "ref.xlsx");
        let record = resolver.record(&CellValue::text("MC1")).unwrap();
        assert_eq!(record.attributes["商品编号"], CellValue::text("8471"));
        assert_eq!(record.attributes["申报要素"], CellValue::text("E1"));
    }

    #[test]
    fn test_missing_attribute_column_warns() {
        let grid = SheetGrid {
            sheet_name: "Sheet1".to_string(),
            sheet_count: 1,
            rows: vec![text_row(&["物料号", "HSCODE"]), text_row(&["MC1", "HS1"])],
        };
        let resolver = ReferenceResolver::from_grid(&grid, &ReferenceLayout::default(), "ref.xlsx");
        assert!(matches!(
            resolver.warnings(),
            [ConversionWarning::MissingReferenceColumn { attribute, .. }] if attribute == "申报要素"
        ));
        assert_eq!(value(&resolver, "商品编号", CellValue::text("MC1")), CellValue::text("HS1"));
    }

    #[test]
    fn test_missing_code_column_warns() {
        let grid = SheetGrid {
            sheet_name: "Sheet1".to_string(),
            sheet_count: 1,
            rows: vec![text_row(&["HSCODE"]), text_row(&["HS1"])],
        };
        let resolver = ReferenceResolver::from_grid(&grid, &ReferenceLayout::default(), "ref.xlsx");
        assert!(matches!(
            resolver.warnings(),
            [ConversionWarning::MaterialCodeColumnMissing { .. }]
        ));
        assert_eq!(resolver.attributes().count(), 0);
        assert!(resolver.record(&CellValue::text("HS1")).is_none());
    }

    #[test]
    fn test_load_from_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reference.xlsx");
        write_workbook(
            &path,
            &[(
                "Sheet1",
                vec![
                    text_row(&["Material code", "HSCODE", "申报要素"]),
                    text_row(&["MC1", "HS1", "E1"]),
                ],
            )],
        );
        let resolver =
            ReferenceResolver::load(&ExcelParser, &path, &ReferenceLayout::default()).unwrap();
        assert_eq!(value(&resolver, "申报要素", CellValue::text("MC1")), CellValue::text("E1"));
    }
}
