// ==========================================
// 报关单生成系统 - 单元格区域
// ==========================================
// 职责: A1 记法区域解析 / 行偏移 / 重叠判定
// 约定: 行列均为 1-based（与 Excel 一致）
// ==========================================

use std::fmt;

/// 矩形单元格区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start_col: u32,
    pub start_row: u32,
    pub end_col: u32,
    pub end_row: u32,
}

impl CellRange {
    pub fn new(start_col: u32, start_row: u32, end_col: u32, end_row: u32) -> Self {
        Self {
            start_col: start_col.min(end_col),
            start_row: start_row.min(end_row),
            end_col: start_col.max(end_col),
            end_row: start_row.max(end_row),
        }
    }

    /// 解析 "A1:B2" / "A1" / "$A$1:$B$2"
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (first, second) = match text.split_once(':') {
            Some((a, b)) => (a, b),
            None => (text, text),
        };
        let (c1, r1) = parse_cell(first)?;
        let (c2, r2) = parse_cell(second)?;
        Some(Self::new(c1, r1, c2, r2))
    }

    /// 整体下移 offset 行
    pub fn shift_rows(&self, offset: u32) -> Self {
        Self {
            start_row: self.start_row + offset,
            end_row: self.end_row + offset,
            ..*self
        }
    }

    pub fn contains(&self, col: u32, row: u32) -> bool {
        (self.start_col..=self.end_col).contains(&col) && (self.start_row..=self.end_row).contains(&row)
    }

    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start_col <= other.end_col
            && other.start_col <= self.end_col
            && self.start_row <= other.end_row
            && other.start_row <= self.end_row
    }

    /// 左上角（合并区域的主单元格）
    pub fn anchor(&self) -> (u32, u32) {
        (self.start_col, self.start_row)
    }

    pub fn is_single_cell(&self) -> bool {
        self.start_col == self.end_col && self.start_row == self.end_row
    }

    pub fn to_a1(&self) -> String {
        let start = format!("{}{}", column_letters(self.start_col), self.start_row);
        if self.is_single_cell() {
            start
        } else {
            format!(
                "{}:{}{}",
                start,
                column_letters(self.end_col),
                self.end_row
            )
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// 单元格引用 → (列, 行)
fn parse_cell(text: &str) -> Option<(u32, u32)> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '$').collect();
    let split = cleaned.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cleaned.split_at(split);
    let col = column_index(letters)?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((col, row))
}

/// 列号（1-based）→ 列字母
pub fn column_letters(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 列字母 → 列号（1-based）
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        if c.is_ascii_alphabetic() {
            let v = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            acc.checked_mul(26)?.checked_add(v)
        } else {
            None
        }
    })
}

/// 平移空格分隔的区域列表（条件格式 sqref）
///
/// 任一区域无法解析时返回 None
pub fn shift_sqref(sqref: &str, offset: u32) -> Option<String> {
    let shifted: Option<Vec<String>> = sqref
        .split_whitespace()
        .map(|part| CellRange::parse(part).map(|r| r.shift_rows(offset).to_a1()))
        .collect();
    shifted.filter(|parts| !parts.is_empty()).map(|parts| parts.join(" "))
}
