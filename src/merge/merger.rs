// ==========================================
// 报关单生成系统 - 工作簿纵向合并
// ==========================================
// 职责: 多个工作簿首表按顺序纵向拼接到单个 "Merged" 工作表
// 保留: 值 / 样式 / 合并区域 / 图片 / 条件格式（仅最后一个源）
// 红线: 全部源读取成功后才写出；写出走临时文件 + 原子改名
// ==========================================

use crate::fs_atomic::write_atomically;
use crate::merge::error::{MergeError, MergeResult};
use crate::merge::range::{shift_sqref, CellRange};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use umya_spreadsheet::{Cell, Image, SequenceOfReferences, Spreadsheet, Worksheet};

// ==========================================
// MergeOptions - 合并选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    pub sheet_name: String,
    pub conditional_formats: ConditionalFormatScope,
    pub tall_rows: (u32, u32),    // 加高行区间（含两端）
    pub height_factor: f64,       // 相对第 1 行的倍数
    pub default_row_height: f64,  // 第 1 行未设置行高时的取值
}

/// 条件格式复制范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalFormatScope {
    /// 仅最后一个源（按该源偏移量平移）
    LastSource,
    /// 全部源（各自按偏移量平移）
    AllSources,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Merged".to_string(),
            conditional_formats: ConditionalFormatScope::LastSource,
            tall_rows: (3, 6),
            height_factor: 2.0,
            default_row_height: 15.0,
        }
    }
}

// ==========================================
// MergeReport - 合并报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    pub output: PathBuf,
    pub sources: Vec<MergedSource>,
    pub total_rows: u32,
    pub conditional_formats: usize,
    pub skipped_conditional_formats: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedSource {
    pub path: PathBuf,
    pub row_offset: u32,
    pub rows: u32,
    pub merged_ranges: usize,
    pub skipped_ranges: usize, // 与已有合并区域冲突或无法解析
    pub images: usize,
}

/// 已读取的源工作簿
struct LoadedSource {
    path: PathBuf,
    book: Spreadsheet,
}

impl LoadedSource {
    fn sheet(&self) -> MergeResult<&Worksheet> {
        self.book
            .get_sheet(&0)
            .ok_or_else(|| MergeError::EmptyWorkbook(self.path.display().to_string()))
    }
}

pub struct WorkbookMerger {
    options: MergeOptions,
}

impl WorkbookMerger {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    /// 按顺序合并 sources 到 output
    #[instrument(skip(self, sources), fields(sources = sources.len(), output = %output.display()))]
    pub fn merge<P: AsRef<Path>>(&self, sources: &[P], output: &Path) -> MergeResult<MergeReport> {
        if sources.is_empty() {
            return Err(MergeError::NoSources);
        }

        // 先全部读取，任一失败即终止
        let loaded = sources
            .iter()
            .map(|p| load_source(p.as_ref()))
            .collect::<MergeResult<Vec<_>>>()?;

        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let target = book
            .new_sheet(self.options.sheet_name.as_str())
            .map_err(|e| MergeError::Write {
                path: output.display().to_string(),
                message: e.to_string(),
            })?;

        let mut report = MergeReport {
            output: output.to_path_buf(),
            ..Default::default()
        };
        let mut target_merges: Vec<CellRange> = Vec::new();
        let mut row_offset = 0u32;

        for source in &loaded {
            let sheet = source.sheet()?;
            let merged = append_sheet(sheet, target, row_offset, &mut target_merges);
            debug!(
                file = %source.path.display(),
                row_offset,
                rows = merged.rows,
                merged_ranges = merged.merged_ranges,
                "源工作表已追加"
            );
            row_offset += merged.rows;
            report.sources.push(MergedSource {
                path: source.path.clone(),
                ..merged
            });
        }
        report.total_rows = row_offset;

        // 条件格式
        let cf_sources: Vec<(usize, &LoadedSource)> = match self.options.conditional_formats {
            ConditionalFormatScope::LastSource => {
                let last = loaded.len() - 1;
                vec![(last, &loaded[last])]
            }
            ConditionalFormatScope::AllSources => loaded.iter().enumerate().collect(),
        };
        for (idx, source) in cf_sources {
            let offset = report.sources[idx].row_offset;
            let (copied, skipped) = copy_conditional_formats(source.sheet()?, target, offset);
            report.conditional_formats += copied;
            report.skipped_conditional_formats += skipped;
        }

        self.adjust_row_heights(target);

        write_atomically::<MergeError, _>(output, |tmp| {
            umya_spreadsheet::writer::xlsx::write(&book, tmp).map_err(|e| MergeError::Write {
                path: output.display().to_string(),
                message: e.to_string(),
            })
        })?;

        info!(
            total_rows = report.total_rows,
            conditional_formats = report.conditional_formats,
            "工作簿合并完成"
        );
        Ok(report)
    }

    /// tall_rows 区间行高 = 第 1 行行高 × 倍数
    fn adjust_row_heights(&self, target: &mut Worksheet) {
        let base = target
            .get_row_dimension(&1)
            .map(|r| r.get_height().to_owned())
            .filter(|h| *h > 0.0)
            .unwrap_or(self.options.default_row_height);
        let height = base * self.options.height_factor;
        let (start, end) = self.options.tall_rows;
        for row in start..=end {
            target
                .get_row_dimension_mut(&row)
                .set_height(height)
                .set_custom_height(true);
        }
    }
}

fn load_source(path: &Path) -> MergeResult<LoadedSource> {
    if !path.exists() {
        return Err(MergeError::SourceNotFound(path.display().to_string()));
    }
    let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| MergeError::Unreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let source = LoadedSource {
        path: path.to_path_buf(),
        book,
    };
    source.sheet()?;
    Ok(source)
}

/// 追加单个源工作表（值、样式、合并区域、图片）
fn append_sheet(
    sheet: &Worksheet,
    target: &mut Worksheet,
    row_offset: u32,
    target_merges: &mut Vec<CellRange>,
) -> MergedSource {
    let mut source_merges = Vec::new();
    let mut skipped = 0;
    for range in sheet.get_merge_cells() {
        match CellRange::parse(&range.get_range()) {
            Some(r) => source_merges.push(r),
            None => {
                warn!(range = %range.get_range(), "合并区域无法解析，已跳过");
                skipped += 1;
            }
        }
    }

    // 合并区域的非主单元格可能从未写入，高度/宽度需覆盖整个区域
    let rows = source_merges
        .iter()
        .map(|r| r.end_row)
        .fold(sheet.get_highest_row(), u32::max);
    let cols = source_merges
        .iter()
        .map(|r| r.end_col)
        .fold(sheet.get_highest_column(), u32::max);

    for row in 1..=rows {
        for col in 1..=cols {
            let Some(cell) = sheet.get_cell((col, row)) else {
                continue;
            };
            // 合并区域内非主单元格取主单元格的值
            let value_cell = source_merges
                .iter()
                .find(|r| r.contains(col, row) && r.anchor() != (col, row))
                .and_then(|r| sheet.get_cell(r.anchor()))
                .unwrap_or(cell);

            let out = target.get_cell_mut((col, row + row_offset));
            copy_value(value_cell, out);
            out.set_style(cell.get_style().clone());
        }
    }

    // 合并区域中仅有主单元格被写入时，非主单元格也需取主单元格的值
    for range in &source_merges {
        let Some(anchor) = sheet.get_cell(range.anchor()) else {
            continue;
        };
        for row in range.start_row..=range.end_row {
            for col in range.start_col..=range.end_col {
                if (col, row) == range.anchor() || sheet.get_cell((col, row)).is_some() {
                    continue;
                }
                copy_value(anchor, target.get_cell_mut((col, row + row_offset)));
            }
        }
    }

    let mut merged_ranges = 0;
    for range in &source_merges {
        let shifted = range.shift_rows(row_offset);
        if target_merges.iter().any(|m| m.overlaps(&shifted)) {
            debug!(range = %shifted, "合并区域与已有区域冲突，已跳过");
            skipped += 1;
            continue;
        }
        target.add_merge_cells(shifted.to_a1());
        target_merges.push(shifted);
        merged_ranges += 1;
    }

    let mut images = 0;
    for image in sheet.get_image_collection() {
        let mut image = image.clone();
        shift_image(&mut image, row_offset);
        target.add_image(image);
        images += 1;
    }

    MergedSource {
        path: PathBuf::new(),
        row_offset,
        rows,
        merged_ranges,
        skipped_ranges: skipped,
        images,
    }
}

/// 复制单元格值（数值/布尔保持原类型，公式取缓存值）
fn copy_value(source: &Cell, target: &mut Cell) {
    if source.get_data_type() == "b" {
        let value = source.get_value();
        target.set_value_bool(value.eq_ignore_ascii_case("TRUE") || value == "1");
        return;
    }
    if let Some(number) = source.get_value_number() {
        target.set_value_number(number);
        return;
    }
    let value = source.get_value();
    if !value.is_empty() {
        target.set_value_string(value.to_string());
    }
}

/// 图片锚点下移（绘图锚点行号为 0-based，平移量相同）
fn shift_image(image: &mut Image, row_offset: u32) {
    if let Some(anchor) = image.get_two_cell_anchor_mut() {
        let from = anchor.get_from_marker_mut();
        let row = from.get_row().to_owned();
        from.set_row(row + row_offset);
        let to = anchor.get_to_marker_mut();
        let row = to.get_row().to_owned();
        to.set_row(row + row_offset);
    }
    if let Some(anchor) = image.get_one_cell_anchor_mut() {
        let from = anchor.get_from_marker_mut();
        let row = from.get_row().to_owned();
        from.set_row(row + row_offset);
    }
}

/// 复制条件格式并平移区域；返回 (复制数, 跳过数)
fn copy_conditional_formats(
    sheet: &Worksheet,
    target: &mut Worksheet,
    row_offset: u32,
) -> (usize, usize) {
    let mut copied = 0;
    let mut skipped = 0;
    for cf in sheet.get_conditional_formatting_collection() {
        let sqref = cf.get_sequence_of_references().get_sqref();
        let Some(shifted) = shift_sqref(&sqref, row_offset) else {
            warn!(sqref = %sqref, "条件格式区域无法解析，已跳过");
            skipped += 1;
            continue;
        };
        let mut new_cf = cf.clone();
        let mut references = SequenceOfReferences::default();
        references.set_sqref(shifted.as_str());
        new_cf.set_sequence_of_references(references);
        target.add_conditional_formatting_collection(new_cf);
        copied += 1;
    }
    (copied, skipped)
}
