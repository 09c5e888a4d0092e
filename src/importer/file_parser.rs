// ==========================================
// 报关单生成系统 - 文件解析器实现
// ==========================================
// 职责: 工作簿读取 → 物理行网格（保留前导空行，行号与 Excel 对齐）
// 支持: Excel (.xlsx/.xlsm/.xls)
// ==========================================

use crate::domain::CellValue;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

// ==========================================
// SheetSelector - 工作表选择规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetSelector {
    /// 固定序号
    Index(usize),
    /// 工作表数 ≥ 2 取第二张（首张为封面/装箱单），否则取第一张
    PreferSecond,
}

impl SheetSelector {
    /// 根据工作表数量解析实际序号
    pub fn resolve(self, sheet_count: usize) -> Option<usize> {
        match self {
            SheetSelector::Index(idx) if idx < sheet_count => Some(idx),
            SheetSelector::Index(_) => None,
            SheetSelector::PreferSecond if sheet_count >= 2 => Some(1),
            SheetSelector::PreferSecond if sheet_count == 1 => Some(0),
            SheetSelector::PreferSecond => None,
        }
    }
}

// ==========================================
// SheetGrid - 物理行网格
// ==========================================
// rows[0] 对应 Excel 第 1 行，列同理
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub sheet_name: String,
    pub sheet_count: usize,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    /// 读取单元格（0-based，越界返回 Empty）
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::EMPTY)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn read_sheet(&self, file_path: &Path, selector: SheetSelector) -> ImportResult<SheetGrid> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xlsm" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // 打开 Excel 文件
        let mut workbook = open_workbook_auto(path)?;
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError(format!(
                "Excel 文件无工作表: {}",
                path.display()
            )));
        }

        let index = selector
            .resolve(sheet_names.len())
            .ok_or_else(|| ImportError::SheetNotFound {
                path: path.display().to_string(),
                index: match selector {
                    SheetSelector::Index(i) => i,
                    SheetSelector::PreferSecond => 1,
                },
            })?;
        let sheet_name = sheet_names[index].clone();

        let range = workbook
            .worksheet_range_at(index)
            .ok_or_else(|| ImportError::SheetNotFound {
                path: path.display().to_string(),
                index,
            })??;

        let rows = range_to_rows(&range);
        debug!(
            file = %path.display(),
            sheet = %sheet_name,
            sheet_count = sheet_names.len(),
            rows = rows.len(),
            "工作表读取完成"
        );

        Ok(SheetGrid {
            sheet_name,
            sheet_count: sheet_names.len(),
            rows,
        })
    }
}

/// 将 calamine Range 展开为从 A1 起算的稠密网格
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let (end_row, end_col) = match range.end() {
        Some(end) => end,
        None => return Vec::new(),
    };

    (0..=end_row)
        .map(|r| {
            (0..=end_col)
                .map(|c| range.get_value((r, c)).map(convert_cell).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// calamine 单元格 → CellValue
pub fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.num_seconds_from_midnight() == 0 => {
                CellValue::Text(ndt.format("%Y-%m-%d").to_string())
            }
            Some(ndt) => CellValue::Text(ndt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
