// ==========================================
// 报关单生成系统 - 报关单输出
// ==========================================
// 职责: OutputRecord 列表 → 单表工作簿（表头 + 明细，固定列宽）
// 工具: rust_xlsxwriter
// ==========================================

use crate::config::OutputLayout;
use crate::domain::{CellValue, DeclarationField, OutputRecord};
use crate::fs_atomic::write_atomically;
use crate::importer::error::{ImportError, ImportResult};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::{info, instrument};

pub struct DeclarationWriter<'a> {
    layout: &'a OutputLayout,
}

impl<'a> DeclarationWriter<'a> {
    pub fn new(layout: &'a OutputLayout) -> Self {
        Self { layout }
    }

    /// 写出报关单（原子写出）
    #[instrument(skip(self, records), fields(file = %path.display(), records = records.len()))]
    pub fn write(&self, records: &[OutputRecord], path: &Path) -> ImportResult<()> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        self.fill_sheet(sheet, records)?;

        write_atomically::<ImportError, _>(path, |tmp| {
            workbook.save(tmp)?;
            Ok(())
        })?;

        info!("报关单写出完成");
        Ok(())
    }

    fn fill_sheet(&self, sheet: &mut Worksheet, records: &[OutputRecord]) -> Result<(), XlsxError> {
        sheet.set_name(&self.layout.sheet_name)?;

        for field in DeclarationField::ALL {
            let col = field.index() as u16;
            sheet.write_string(0, col, field.header())?;
            sheet.set_column_width(col, self.layout.column_width)?;
        }

        for (idx, record) in records.iter().enumerate() {
            let row = idx as u32 + 1;
            for (col, value) in record.cells().iter().enumerate() {
                write_cell(sheet, row, col as u16, value)?;
            }
        }
        Ok(())
    }
}

/// 写单元格（空白不写）
pub fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
) -> Result<(), XlsxError> {
    match value {
        CellValue::Empty => {}
        CellValue::Int(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) => {
            sheet.write_number(row, col, *f)?;
        }
        CellValue::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}
