// ==========================================
// 报关单生成系统 - 发票明细读取
// ==========================================
// 职责: 选表 → 跳过抬头 → 表头识别 → 丢弃二级表头 → 哨兵截断
// 输出: SourceTable（行号与截断规则可复现）
// ==========================================

use crate::config::IngestLayout;
use crate::domain::{CellValue, ConversionWarning, SourceRow, SourceTable};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportResult;
use crate::importer::importer_trait::{DataCleaner as DataCleanerTrait, FileParser};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// 明细读取结果
#[derive(Debug, Clone, Default)]
pub struct IngestedSheet {
    pub table: SourceTable,
    pub warnings: Vec<ConversionWarning>,
}

pub struct SheetIngestor<P>
where
    P: FileParser,
{
    parser: P,
    cleaner: DataCleaner,
    layout: IngestLayout,
}

impl<P> SheetIngestor<P>
where
    P: FileParser,
{
    pub fn new(parser: P, layout: IngestLayout) -> Self {
        Self {
            parser,
            cleaner: DataCleaner,
            layout,
        }
    }

    /// 读取发票明细表
    ///
    /// # 错误
    /// - 工作簿缺失/无法解析 → ImportError（致命）
    #[instrument(skip(self), fields(file = %path.display()))]
    pub fn ingest(&self, path: &Path) -> ImportResult<IngestedSheet> {
        let grid = self.parser.read_sheet(path, self.layout.sheet)?;
        info!(sheet = %grid.sheet_name, sheet_count = grid.sheet_count, "开始读取发票明细");

        // 跳过抬头行后，忽略整行空白
        let mut remaining = grid
            .rows
            .iter()
            .enumerate()
            .skip(self.layout.skip_rows)
            .filter(|(_, cells)| !cells.iter().all(CellValue::is_empty));

        let headers = match remaining.next() {
            Some((_, cells)) => self.build_headers(cells),
            None => {
                warn!(skip_rows = self.layout.skip_rows, "跳过抬头后无表头行");
                return Ok(IngestedSheet {
                    table: SourceTable {
                        sheet_name: grid.sheet_name,
                        ..Default::default()
                    },
                    warnings: Vec::new(),
                });
            }
        };

        let mut data: Vec<(usize, &Vec<CellValue>)> = remaining.collect();
        if self.layout.drop_first_row && !data.is_empty() {
            data.remove(0);
        }

        let rows: Vec<SourceRow> = data
            .into_iter()
            .enumerate()
            .map(|(row_index, (physical, cells))| SourceRow {
                row_index,
                sheet_row: physical as u32 + 1,
                cells: cells.clone(),
            })
            .collect();

        let mut table = SourceTable {
            sheet_name: grid.sheet_name,
            headers,
            rows,
        };

        let mut warnings = Vec::new();
        match table.find_column(&self.layout.item_no_columns) {
            Some(col) => {
                let before = table.rows.len();
                truncate_at_sentinel(&mut table, col, &self.layout.sentinel_values);
                debug!(before, after = table.rows.len(), "哨兵截断完成");
            }
            None => {
                let column = self.layout.item_no_columns.join("/");
                warn!(column = %column, "未找到项号列，跳过截断");
                warnings.push(ConversionWarning::MissingColumn { column });
            }
        }

        info!(rows = table.rows.len(), columns = table.headers.len(), "发票明细读取完成");
        Ok(IngestedSheet { table, warnings })
    }

    /// 表头标准化: TRIM，空名 → "Unnamed: {col}"，重名追加 ".n"
    fn build_headers(&self, cells: &[CellValue]) -> Vec<String> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        cells
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                let name = self.cleaner.clean_text(&cell.normalized());
                let name = if name.is_empty() {
                    format!("Unnamed: {}", col)
                } else {
                    name
                };
                let count = seen.entry(name.clone()).or_insert(0);
                let unique = if *count == 0 {
                    name
                } else {
                    format!("{}.{}", name, count)
                };
                *count += 1;
                unique
            })
            .collect()
    }
}

/// 在首个哨兵行之前截断（单调、幂等）
///
/// 找不到哨兵时保留全部行
pub fn truncate_at_sentinel(table: &mut SourceTable, item_col: usize, sentinels: &[String]) {
    let cleaner = DataCleaner;
    if let Some(cut) = table
        .rows
        .iter()
        .position(|row| cleaner.is_sentinel(row.get(item_col), sentinels))
    {
        table.rows.truncate(cut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::ExcelParser;
    use crate::test_support::{text_row, write_workbook};
    use tempfile::tempdir;

    fn letterhead() -> Vec<Vec<CellValue>> {
        (0..9)
            .map(|i| text_row(&[&format!("抬头 {}", i)]))
            .collect()
    }

    fn invoice_rows(extra: Vec<Vec<CellValue>>) -> Vec<Vec<CellValue>> {
        let mut rows = letterhead();
        rows.push(text_row(&["NO.", "DESCRIPTION", "Amount", "Material code"]));
        rows.push(text_row(&["项号", "品名", "总价", "物料号"]));
        rows.extend(extra);
        rows
    }

    fn item(no: f64, desc: &str, amount: f64) -> Vec<CellValue> {
        vec![
            CellValue::Float(no),
            CellValue::text(desc),
            CellValue::Float(amount),
            CellValue::text("MC1"),
        ]
    }

    #[test]
    fn test_ingest_skips_header_and_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invoice.xlsx");
        let rows = invoice_rows(vec![
            item(1.0, "Widget", 50.0),
            item(2.0, "Gadget", 20.0),
            vec![CellValue::text("nan"), CellValue::text("TOTAL"), CellValue::Float(70.0)],
            item(3.0, "Ignored", 1.0),
        ]);
        write_workbook(&path, &[("PL", vec![]), ("CI", rows)]);

        let ingestor = SheetIngestor::new(ExcelParser, IngestLayout::default());
        let result = ingestor.ingest(&path).unwrap();

        assert_eq!(result.table.sheet_name, "CI");
        assert_eq!(result.table.headers[0], "NO.");
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.table.rows[0].get(1), &CellValue::text("Widget"));
        assert_eq!(result.table.rows[0].sheet_row, 12);
        assert_eq!(result.table.rows[1].row_index, 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_blank_rows_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invoice.xlsx");
        let rows = invoice_rows(vec![item(1.0, "Widget", 50.0), vec![], item(2.0, "Gadget", 20.0)]);
        write_workbook(&path, &[("CI", rows)]);

        let ingestor = SheetIngestor::new(ExcelParser, IngestLayout::default());
        let result = ingestor.ingest(&path).unwrap();
        assert_eq!(result.table.len(), 2);
        assert_eq!(result.table.rows[1].get(1), &CellValue::text("Gadget"));
    }

    #[test]
    fn test_missing_item_column_warns_and_keeps_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invoice.xlsx");
        let mut rows = letterhead();
        rows.push(text_row(&["DESCRIPTION", "Amount"]));
        rows.push(text_row(&["品名", "总价"]));
        rows.push(text_row(&["Widget", "50"]));
        rows.push(text_row(&["", "70"]));
        write_workbook(&path, &[("CI", rows)]);

        let ingestor = SheetIngestor::new(ExcelParser, IngestLayout::default());
        let result = ingestor.ingest(&path).unwrap();
        assert_eq!(result.table.len(), 2);
        assert!(matches!(
            result.warnings.as_slice(),
            [ConversionWarning::MissingColumn { .. }]
        ));
    }

    #[test]
    fn test_header_normalization() {
        let ingestor = SheetIngestor::new(ExcelParser, IngestLayout::default());
        let headers = ingestor.build_headers(&[
            CellValue::text(" NO. "),
            CellValue::Empty,
            CellValue::text("Qty"),
            CellValue::text("Qty"),
        ]);
        assert_eq!(headers, vec!["NO.", "Unnamed: 1", "Qty", "Qty.1"]);
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let mut table = SourceTable {
            sheet_name: "CI".to_string(),
            headers: vec!["NO.".to_string()],
            rows: [Some(1.0), Some(2.0), None, Some(4.0)]
                .iter()
                .enumerate()
                .map(|(i, v)| SourceRow {
                    row_index: i,
                    sheet_row: i as u32 + 12,
                    cells: vec![v.map(CellValue::Float).unwrap_or_default()],
                })
                .collect(),
        };
        let sentinels = IngestLayout::default().sentinel_values;

        truncate_at_sentinel(&mut table, 0, &sentinels);
        let once = table.clone();
        truncate_at_sentinel(&mut table, 0, &sentinels);

        assert_eq!(once.len(), 2);
        assert_eq!(table.rows, once.rows);
    }
}
