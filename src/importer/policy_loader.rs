// ==========================================
// 报关单生成系统 - 政策费率读取
// ==========================================
// 职责: 政策工作簿固定单元格 → RateTable（计算前完成校验）
// 单元格: B4 运费费率 / B5 汇率 / B6 加价倍数 / B7 保费系数1 / B8 保费系数2 / B16 保险金额
// ==========================================

use crate::domain::{CellValue, RateTable};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{SheetGrid, SheetSelector};
use crate::importer::importer_trait::{DataCleaner as DataCleanerTrait, FileParser};
use std::path::Path;
use tracing::{info, instrument};

/// 政策单元格定义
struct PolicyCell {
    name: &'static str, // A1 记法
    row: usize,
    col: usize,
    required: bool, // 必填（空白即报错）；非必填空白回退默认值
}

const SHIPPING_RATE: PolicyCell = PolicyCell { name: "B4", row: 3, col: 1, required: true };
const EXCHANGE_RATE: PolicyCell = PolicyCell { name: "B5", row: 4, col: 1, required: true };
const MARKUP: PolicyCell = PolicyCell { name: "B6", row: 5, col: 1, required: false };
const COEFFICIENT_1: PolicyCell = PolicyCell { name: "B7", row: 6, col: 1, required: false };
const COEFFICIENT_2: PolicyCell = PolicyCell { name: "B8", row: 7, col: 1, required: false };
const BASE_AMOUNT: PolicyCell = PolicyCell { name: "B16", row: 15, col: 1, required: false };

pub struct PolicyLoader<'a, P>
where
    P: FileParser,
{
    parser: &'a P,
    defaults: RateTable,
}

impl<'a, P> PolicyLoader<'a, P>
where
    P: FileParser,
{
    pub fn new(parser: &'a P, defaults: RateTable) -> Self {
        Self { parser, defaults }
    }

    /// 读取政策工作簿首个工作表
    #[instrument(skip(self), fields(file = %path.display()))]
    pub fn load(&self, path: &Path) -> ImportResult<RateTable> {
        let grid = self.parser.read_sheet(path, SheetSelector::Index(0))?;
        let rates = self.from_grid(&grid)?;
        info!(
            shipping_rate = rates.shipping_rate,
            exchange_rate = rates.exchange_rate,
            markup = rates.markup,
            "政策费率读取完成"
        );
        Ok(rates)
    }

    /// 按固定单元格解析并校验
    pub fn from_grid(&self, grid: &SheetGrid) -> ImportResult<RateTable> {
        let d = &self.defaults;
        let rates = RateTable {
            shipping_rate: read_cell(grid, &SHIPPING_RATE, d.shipping_rate)?,
            exchange_rate: read_cell(grid, &EXCHANGE_RATE, d.exchange_rate)?,
            markup: read_cell(grid, &MARKUP, d.markup)?,
            insurance_coefficient_1: read_cell(grid, &COEFFICIENT_1, d.insurance_coefficient_1)?,
            insurance_coefficient_2: read_cell(grid, &COEFFICIENT_2, d.insurance_coefficient_2)?,
            insurance_base_amount: read_cell(grid, &BASE_AMOUNT, d.insurance_base_amount)?,
        };

        if rates.exchange_rate <= 0.0 {
            return Err(ImportError::PolicyFormat {
                cell: EXCHANGE_RATE.name.to_string(),
                message: format!("汇率必须大于 0，实际为 {}", rates.exchange_rate),
            });
        }
        Ok(rates)
    }
}

fn read_cell(grid: &SheetGrid, cell: &PolicyCell, default: f64) -> ImportResult<f64> {
    let raw = grid.get(cell.row, cell.col);
    let policy_error = |message: String| ImportError::PolicyFormat {
        cell: cell.name.to_string(),
        message,
    };

    let value = match DataCleaner.coerce_numeric(raw) {
        Ok(CellValue::Empty) if cell.required => {
            return Err(policy_error("单元格为空".to_string()));
        }
        Ok(CellValue::Empty) => default,
        Ok(v) => v
            .as_f64()
            .ok_or_else(|| policy_error(format!("不是数值: {}", v)))?,
        Err(text) => return Err(policy_error(format!("不是数值: {}", text))),
    };

    if value < 0.0 {
        return Err(policy_error(format!("不能为负数: {}", value)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::file_parser::ExcelParser;
    use crate::test_support::write_workbook;
    use tempfile::tempdir;

    fn policy_grid(cells: &[(usize, CellValue)]) -> SheetGrid {
        let mut rows = vec![vec![CellValue::Empty; 2]; 16];
        for (row, value) in cells {
            rows[*row][1] = value.clone();
        }
        SheetGrid {
            sheet_name: "Sheet1".to_string(),
            sheet_count: 1,
            rows,
        }
    }

    fn full_policy() -> Vec<(usize, CellValue)> {
        vec![
            (3, CellValue::Float(1.8)),
            (4, CellValue::Float(0.14)),
            (5, CellValue::Float(1.05)),
            (6, CellValue::Float(1.1)),
            (7, CellValue::Float(0.0005)),
            (15, CellValue::Float(20000.0)),
        ]
    }

    #[test]
    fn test_from_grid_reads_fixed_cells() {
        let loader = PolicyLoader::new(&ExcelParser, RateTable::default());
        let rates = loader.from_grid(&policy_grid(&full_policy())).unwrap();
        assert_eq!(rates.shipping_rate, 1.8);
        assert_eq!(rates.exchange_rate, 0.14);
        assert_eq!(rates.insurance_coefficient_2, 0.0005);
        assert_eq!(rates.insurance_base_amount, 20000.0);
    }

    #[test]
    fn test_numeric_text_accepted_and_blank_optional_uses_default() {
        let loader = PolicyLoader::new(&ExcelParser, RateTable::default());
        let grid = policy_grid(&[(3, CellValue::text(" 2.5 ")), (4, CellValue::text("0.2"))]);
        let rates = loader.from_grid(&grid).unwrap();
        assert_eq!(rates.shipping_rate, 2.5);
        assert_eq!(rates.markup, 1.05);
        assert_eq!(rates.insurance_coefficient_1, 1.10);
    }

    #[test]
    fn test_non_numeric_cell_is_policy_format_error() {
        let loader = PolicyLoader::new(&ExcelParser, RateTable::default());
        let mut cells = full_policy();
        cells[0] = (3, CellValue::text("运费费率"));
        let err = loader.from_grid(&policy_grid(&cells)).unwrap_err();
        assert!(err.is_policy_format());
        assert!(matches!(err, ImportError::PolicyFormat { ref cell, .. } if cell == "B4"));
    }

    #[test]
    fn test_zero_exchange_rate_rejected() {
        let loader = PolicyLoader::new(&ExcelParser, RateTable::default());
        let mut cells = full_policy();
        cells[1] = (4, CellValue::Float(0.0));
        let err = loader.from_grid(&policy_grid(&cells)).unwrap_err();
        assert!(matches!(err, ImportError::PolicyFormat { ref cell, .. } if cell == "B5"));
    }

    #[test]
    fn test_negative_and_missing_required_rejected() {
        let loader = PolicyLoader::new(&ExcelParser, RateTable::default());
        let mut cells = full_policy();
        cells[2] = (5, CellValue::Float(-1.0));
        assert!(loader.from_grid(&policy_grid(&cells)).unwrap_err().is_policy_format());

        let err = loader.from_grid(&policy_grid(&[])).unwrap_err();
        assert!(matches!(err, ImportError::PolicyFormat { ref cell, .. } if cell == "B4"));
    }

    #[test]
    fn test_load_from_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.xlsx");
        let mut rows = vec![vec![CellValue::Empty; 2]; 16];
        for (row, value) in full_policy() {
            rows[row][0] = CellValue::text("参数");
            rows[row][1] = value;
        }
        write_workbook(&path, &[("Sheet1", rows)]);

        let rates = PolicyLoader::new(&ExcelParser, RateTable::default())
            .load(&path)
            .unwrap();
        assert_eq!(rates.exchange_rate, 0.14);
    }
}
