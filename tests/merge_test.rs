// ==========================================
// 工作簿合并集成测试
// ==========================================
// 测试目标: 行偏移 / 合并区域平移 / 条件格式 / 图片锚点 / 行高 / 失败不写出
// ==========================================


use customs_sheet::merge::{ConditionalFormatScope, MergeError, MergeOptions, WorkbookMerger};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use test_helpers::{write_three_row_sheet, write_umya_sheet, GridOptions};

// ==========================================
// 辅助函数
// ==========================================

fn merged_sheet(path: &Path) -> umya_spreadsheet::Spreadsheet {
    umya_spreadsheet::reader::xlsx::read(path).expect("读取合并结果失败")
}

fn value_at(book: &umya_spreadsheet::Spreadsheet, coordinate: &str) -> String {
    book.get_sheet(&0)
        .and_then(|sheet| sheet.get_cell(coordinate))
        .map(|cell| cell.get_value().to_string())
        .unwrap_or_default()
}

fn merge_ranges(book: &umya_spreadsheet::Spreadsheet) -> Vec<String> {
    book.get_sheet(&0)
        .map(|sheet| {
            sheet
                .get_merge_cells()
                .iter()
                .map(|r| r.get_range().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn two_sources(dir: &TempDir, first: GridOptions, second: GridOptions) -> Vec<PathBuf> {
    let a = dir.path().join("a.xlsx");
    let b = dir.path().join("b.xlsx");
    write_three_row_sheet(&a, "a", first).unwrap();
    write_three_row_sheet(&b, "b", second).unwrap();
    vec![a, b]
}

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_rows_are_stacked_in_order() {
    let dir = TempDir::new().unwrap();
    let sources = two_sources(&dir, GridOptions::default(), GridOptions::default());
    let output = dir.path().join("merged.xlsx");

    let report = WorkbookMerger::new(MergeOptions::default())
        .merge(&sources, &output)
        .unwrap();

    assert_eq!(report.total_rows, 6);
    assert_eq!(report.sources[0].row_offset, 0);
    assert_eq!(report.sources[1].row_offset, 3);

    let book = merged_sheet(&output);
    assert_eq!(book.get_sheet(&0).unwrap().get_name(), "Merged");
    assert_eq!(value_at(&book, "A1"), "a-1-1");
    assert_eq!(value_at(&book, "C3"), "a-3-3");
    assert_eq!(value_at(&book, "A4"), "b-1-1");
    assert_eq!(value_at(&book, "C6"), "b-3-3");
}

#[test]
fn test_merge_ranges_are_shifted_by_offset() {
    let dir = TempDir::new().unwrap();
    let sources = two_sources(
        &dir,
        GridOptions::default(),
        GridOptions {
            merge_a1_b2: true,
            ..Default::default()
        },
    );
    let output = dir.path().join("merged.xlsx");

    let report = WorkbookMerger::new(MergeOptions::default())
        .merge(&sources, &output)
        .unwrap();
    assert_eq!(report.sources[1].merged_ranges, 1);

    let book = merged_sheet(&output);
    assert_eq!(merge_ranges(&book), vec!["A4:B5".to_string()]);
    assert_eq!(value_at(&book, "A4"), "b-merged");
    // 非主单元格取主单元格的值
    assert_eq!(value_at(&book, "B5"), "b-merged");
}

#[test]
fn test_only_last_source_conditional_formats_are_kept() {
    let dir = TempDir::new().unwrap();
    let with_cf = || GridOptions {
        conditional_a1_a3: true,
        ..Default::default()
    };
    let sources = two_sources(&dir, with_cf(), with_cf());
    let output = dir.path().join("merged.xlsx");

    let report = WorkbookMerger::new(MergeOptions::default())
        .merge(&sources, &output)
        .unwrap();
    assert_eq!(report.conditional_formats, 1);

    let book = merged_sheet(&output);
    let sqrefs: Vec<String> = book
        .get_sheet(&0)
        .unwrap()
        .get_conditional_formatting_collection()
        .iter()
        .map(|cf| cf.get_sequence_of_references().get_sqref())
        .collect();
    assert_eq!(sqrefs, vec!["A4:A6".to_string()]);
}

#[test]
fn test_all_sources_conditional_formats_option() {
    let dir = TempDir::new().unwrap();
    let with_cf = || GridOptions {
        conditional_a1_a3: true,
        ..Default::default()
    };
    let sources = two_sources(&dir, with_cf(), with_cf());
    let output = dir.path().join("merged.xlsx");

    let options = MergeOptions {
        conditional_formats: ConditionalFormatScope::AllSources,
        ..Default::default()
    };
    let report = WorkbookMerger::new(options).merge(&sources, &output).unwrap();
    assert_eq!(report.conditional_formats, 2);

    let book = merged_sheet(&output);
    let mut sqrefs: Vec<String> = book
        .get_sheet(&0)
        .unwrap()
        .get_conditional_formatting_collection()
        .iter()
        .map(|cf| cf.get_sequence_of_references().get_sqref())
        .collect();
    sqrefs.sort();
    assert_eq!(sqrefs, vec!["A1:A3".to_string(), "A4:A6".to_string()]);
}

#[test]
fn test_image_anchor_moves_with_its_source() {
    let dir = TempDir::new().unwrap();
    let sources = two_sources(
        &dir,
        GridOptions::default(),
        GridOptions {
            image_at_a1: true,
            ..Default::default()
        },
    );
    let output = dir.path().join("merged.xlsx");

    let report = WorkbookMerger::new(MergeOptions::default())
        .merge(&sources, &output)
        .unwrap();
    assert_eq!(report.sources[1].images, 1);

    let book = merged_sheet(&output);
    let images = book.get_sheet(&0).unwrap().get_image_collection();
    assert_eq!(images.len(), 1);
    let from_row = images[0]
        .get_two_cell_anchor()
        .map(|a| a.get_from_marker().get_row().to_owned())
        .or_else(|| {
            images[0]
                .get_one_cell_anchor()
                .map(|a| a.get_from_marker().get_row().to_owned())
        });
    // 绘图锚点行号 0-based: 第 4 行
    assert_eq!(from_row, Some(3));
}

#[test]
fn test_rows_three_to_six_are_double_height() {
    let dir = TempDir::new().unwrap();
    let sources = two_sources(&dir, GridOptions::default(), GridOptions::default());
    let output = dir.path().join("merged.xlsx");

    WorkbookMerger::new(MergeOptions::default())
        .merge(&sources, &output)
        .unwrap();

    let book = merged_sheet(&output);
    let sheet = book.get_sheet(&0).unwrap();
    for row in 3..=6u32 {
        let height = sheet
            .get_row_dimension(&row)
            .map(|r| r.get_height().to_owned())
            .unwrap_or_default();
        assert!((height - 30.0).abs() < 1e-9, "第 {} 行行高 {}", row, height);
    }
}

#[test]
fn test_missing_source_aborts_without_output() {
    let dir = TempDir::new().unwrap();
    let mut sources = two_sources(&dir, GridOptions::default(), GridOptions::default());
    sources.push(dir.path().join("absent.xlsx"));
    let output = dir.path().join("merged.xlsx");

    let result = WorkbookMerger::new(MergeOptions::default()).merge(&sources, &output);

    assert!(matches!(result, Err(MergeError::SourceNotFound(_))));
    assert!(!output.exists());
}

#[test]
fn test_unreadable_source_aborts_without_output() {
    let dir = TempDir::new().unwrap();
    let mut sources = two_sources(&dir, GridOptions::default(), GridOptions::default());
    let broken = dir.path().join("broken.xlsx");
    std::fs::write(&broken, b"not a zip archive").unwrap();
    sources.insert(1, broken);
    let output = dir.path().join("merged.xlsx");

    let result = WorkbookMerger::new(MergeOptions::default()).merge(&sources, &output);

    assert!(matches!(result, Err(MergeError::Unreadable { .. })));
    assert!(!output.exists());
}

#[test]
fn test_merge_below_last_written_row_reserves_rows() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.xlsx");
    let b = dir.path().join("b.xlsx");
    // A1:B2 仅主单元格有值，第 2 行未写入任何单元格
    write_umya_sheet(&a, |sheet| {
        sheet.get_cell_mut("A1").set_value_string("title");
        sheet.add_merge_cells("A1:B2");
    })
    .unwrap();
    write_umya_sheet(&b, |sheet| {
        for row in 1..=3u32 {
            sheet
                .get_cell_mut((1, row))
                .set_value_string(format!("b{}", row));
        }
    })
    .unwrap();
    let output = dir.path().join("merged.xlsx");

    let report = WorkbookMerger::new(MergeOptions::default())
        .merge(&[a, b], &output)
        .unwrap();

    let offsets: Vec<u32> = report.sources.iter().map(|s| s.row_offset).collect();
    assert_eq!(offsets, vec![0, 2]);
    assert_eq!(report.total_rows, 5);

    let book = merged_sheet(&output);
    assert_eq!(merge_ranges(&book), vec!["A1:B2"]);
    assert_eq!(value_at(&book, "A3"), "b1");
    assert_eq!(value_at(&book, "A5"), "b3");
}

#[test]
fn test_colliding_merge_range_is_skipped_and_counted() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.xlsx");
    write_umya_sheet(&a, |sheet| {
        sheet.get_cell_mut("A1").set_value_string("first");
        sheet.get_cell_mut("B2").set_value_string("second");
        sheet.get_cell_mut("C3").set_value_string("tail");
        sheet.add_merge_cells("A1:B2");
        sheet.add_merge_cells("B2:C3");
    })
    .unwrap();
    let sources = vec![dir.path().join("lead.xlsx"), a];
    write_three_row_sheet(&sources[0], "lead", GridOptions::default()).unwrap();
    let output = dir.path().join("merged.xlsx");

    let report = WorkbookMerger::new(MergeOptions::default())
        .merge(&sources, &output)
        .unwrap();

    assert_eq!(report.sources[1].row_offset, 3);
    assert_eq!(report.sources[1].merged_ranges, 1);
    assert_eq!(report.sources[1].skipped_ranges, 1);
    assert_eq!(merge_ranges(&merged_sheet(&output)), vec!["A4:B5"]);
}

#[test]
fn test_blank_non_anchor_cells_are_filled_with_anchor_value() {
    let dir = TempDir::new().unwrap();
    let sources = two_sources(
        &dir,
        GridOptions::default(),
        GridOptions {
            merge_a1_b2: true,
            ..Default::default()
        },
    );
    // merge_range 为非主单元格写入带格式的空单元格
    let source = merged_sheet(&sources[1]);
    let blank = source.get_sheet(&0).and_then(|s| s.get_cell("B2")).unwrap();
    assert_eq!(blank.get_value(), "");
    let output = dir.path().join("merged.xlsx");

    WorkbookMerger::new(MergeOptions::default())
        .merge(&sources, &output)
        .unwrap();

    let book = merged_sheet(&output);
    for coordinate in ["A4", "B4", "A5", "B5"] {
        assert_eq!(value_at(&book, coordinate), "b-merged");
    }
}
