// ==========================================
// 报关单生成系统 - 模板填充
// ==========================================
// 职责: 表头模板标签改写 / 合计模板数值写入
// 工具: umya-spreadsheet（读改写，保留原有格式）
// 红线: 只写显式输出路径，不改动模板原文件
// ==========================================

use crate::domain::{ConversionWarning, FillContext};
use crate::fs_atomic::write_atomically;
use crate::template::error::{AnnotateError, AnnotateResult};
use crate::template::label_schema::{LabelSchema, TotalsSchema};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// 单个模板的填充结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnotationSummary {
    pub template: String,
    pub cells_written: usize,
    pub matched: Vec<String>, // 命中的 needle
    pub missing: Vec<String>, // 未命中的 needle
}

impl AnnotationSummary {
    /// 未命中标签 → LabelNotFound 告警
    pub fn warnings(&self) -> Vec<ConversionWarning> {
        self.missing
            .iter()
            .map(|label| ConversionWarning::LabelNotFound {
                template: self.template.clone(),
                label: label.clone(),
            })
            .collect()
    }
}

pub struct TemplateAnnotator<'a> {
    labels: &'a LabelSchema,
    totals: &'a TotalsSchema,
}

impl<'a> TemplateAnnotator<'a> {
    pub fn new(labels: &'a LabelSchema, totals: &'a TotalsSchema) -> Self {
        Self { labels, totals }
    }

    /// 表头模板: 前 N 行文本单元格按标签规则改写为 "{label}\n{value}"
    #[instrument(skip(self, ctx), fields(template = %template.display(), output = %output.display()))]
    pub fn annotate_header(
        &self,
        template: &Path,
        output: &Path,
        ctx: &FillContext,
    ) -> AnnotateResult<AnnotationSummary> {
        let mut book = read_book(template)?;
        let sheet = first_sheet_mut(&mut book, template)?;

        let mut hits = vec![0usize; self.labels.rules.len()];
        let mut written = 0;
        let max_row = self.labels.scan_rows.min(sheet.get_highest_row());
        let max_col = sheet.get_highest_column();

        for row in 1..=max_row {
            for col in 1..=max_col {
                let Some(text) = text_at(sheet, col, row) else {
                    continue;
                };
                let Some(idx) = self.labels.match_rule(&text) else {
                    continue;
                };
                let rule = &self.labels.rules[idx];
                let value = rule.render(ctx);
                debug!(row, col, needle = %rule.needle, "标签改写");
                sheet.get_cell_mut((col, row)).set_value_string(value);
                hits[idx] += 1;
                written += 1;
            }
        }

        let summary = summarize(
            template,
            written,
            self.labels.rules.iter().map(|r| r.needle.as_str()),
            &hits,
        );
        save_book(&book, output)?;
        log_summary(&summary);
        Ok(summary)
    }

    /// 合计模板: 前 N 行命中单元格右侧写入数值
    #[instrument(skip(self, ctx), fields(template = %template.display(), output = %output.display()))]
    pub fn annotate_totals(
        &self,
        template: &Path,
        output: &Path,
        ctx: &FillContext,
    ) -> AnnotateResult<AnnotationSummary> {
        let mut book = read_book(template)?;
        let sheet = first_sheet_mut(&mut book, template)?;

        let mut hits = vec![0usize; self.totals.rules.len()];
        let mut written = 0;
        let max_row = self.totals.scan_rows.min(sheet.get_highest_row());
        // 最后一列右侧无可写位置
        let max_col = sheet.get_highest_column().saturating_sub(1);

        for row in 1..=max_row {
            for col in 1..=max_col {
                let Some(text) = text_at(sheet, col, row) else {
                    continue;
                };
                let Some(idx) = self.totals.match_rule(&text) else {
                    continue;
                };
                let rule = &self.totals.rules[idx];
                match rule.value.number(ctx) {
                    Some(n) => {
                        sheet.get_cell_mut((col + 1, row)).set_value_number(n);
                    }
                    None => {
                        sheet
                            .get_cell_mut((col + 1, row))
                            .set_value_string(rule.value.render(ctx));
                    }
                }
                debug!(row, col, needle = %rule.needle, "合计值写入");
                hits[idx] += 1;
                written += 1;
            }
        }

        let summary = summarize(
            template,
            written,
            self.totals.rules.iter().map(|r| r.needle.as_str()),
            &hits,
        );
        save_book(&book, output)?;
        log_summary(&summary);
        Ok(summary)
    }
}

/// 文本单元格内容（数值/空白返回 None）
fn text_at(sheet: &Worksheet, col: u32, row: u32) -> Option<String> {
    let cell = sheet.get_cell((col, row))?;
    if cell.get_value_number().is_some() {
        return None;
    }
    let value = cell.get_value().to_string();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn summarize<'n>(
    template: &Path,
    written: usize,
    needles: impl Iterator<Item = &'n str>,
    hits: &[usize],
) -> AnnotationSummary {
    let mut summary = AnnotationSummary {
        template: template.display().to_string(),
        cells_written: written,
        ..Default::default()
    };
    for (needle, count) in needles.zip(hits) {
        if *count > 0 {
            summary.matched.push(needle.to_string());
        } else {
            summary.missing.push(needle.to_string());
        }
    }
    summary
}

fn log_summary(summary: &AnnotationSummary) {
    if summary.missing.is_empty() {
        info!(cells = summary.cells_written, "模板填充完成");
    } else {
        warn!(
            cells = summary.cells_written,
            missing = ?summary.missing,
            "模板填充完成，存在未命中标签"
        );
    }
}

fn read_book(path: &Path) -> AnnotateResult<Spreadsheet> {
    if !path.exists() {
        return Err(AnnotateError::TemplateNotFound(path.display().to_string()));
    }
    umya_spreadsheet::reader::xlsx::read(path).map_err(|e| AnnotateError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn first_sheet_mut<'b>(book: &'b mut Spreadsheet, path: &Path) -> AnnotateResult<&'b mut Worksheet> {
    book.get_sheet_mut(&0)
        .ok_or_else(|| AnnotateError::EmptyWorkbook(path.display().to_string()))
}

fn save_book(book: &Spreadsheet, output: &Path) -> AnnotateResult<()> {
    write_atomically::<AnnotateError, _>(output, |tmp| {
        umya_spreadsheet::writer::xlsx::write(book, tmp).map_err(|e| AnnotateError::Write {
            path: output.display().to_string(),
            message: e.to_string(),
        })
    })
}
