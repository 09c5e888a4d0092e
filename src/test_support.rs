// ==========================================
// 单元测试辅助: 生成测试工作簿
// ==========================================

use crate::domain::CellValue;
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// 按 (工作表名, 行列表) 写出测试工作簿；行列均为 0-based 物理位置
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<CellValue>>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match value {
                    CellValue::Empty => {}
                    CellValue::Int(i) => {
                        sheet.write_number(r, c, *i as f64).unwrap();
                    }
                    CellValue::Float(f) => {
                        sheet.write_number(r, c, *f).unwrap();
                    }
                    CellValue::Text(s) => {
                        sheet.write_string(r, c, s).unwrap();
                    }
                    CellValue::Bool(b) => {
                        sheet.write_boolean(r, c, *b).unwrap();
                    }
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

/// 文本行快捷构造
pub fn text_row(values: &[&str]) -> Vec<CellValue> {
    values
        .iter()
        .map(|v| {
            if v.is_empty() {
                CellValue::Empty
            } else {
                CellValue::text(*v)
            }
        })
        .collect()
}
