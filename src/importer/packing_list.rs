// ==========================================
// 报关单生成系统 - 装箱单合计读取
// ==========================================
// 职责: 扫描合计行标记（TTL:）→ 件数 / 毛重 / 净重
// 红线: 读取失败或未找到只产生告警，不中断转换
// ==========================================

use crate::config::{PackingListLayout, ValueRow};
use crate::domain::{ConversionWarning, ShipmentMetadata};
use crate::importer::file_parser::SheetGrid;
use crate::importer::importer_trait::FileParser;
use std::path::Path;
use tracing::{info, instrument, warn};

/// 装箱单读取结果（metadata 缺失时为全 0）
#[derive(Debug, Clone, Default)]
pub struct PackingTotals {
    pub metadata: ShipmentMetadata,
    pub found: bool,
    pub warnings: Vec<ConversionWarning>,
}

pub struct PackingListReader<'a, P>
where
    P: FileParser,
{
    parser: &'a P,
    layout: &'a PackingListLayout,
}

impl<'a, P> PackingListReader<'a, P>
where
    P: FileParser,
{
    pub fn new(parser: &'a P, layout: &'a PackingListLayout) -> Self {
        Self { parser, layout }
    }

    #[instrument(skip(self), fields(file = %path.display()))]
    pub fn read(&self, path: &Path) -> PackingTotals {
        let path_str = path.display().to_string();
        let grid = match self.parser.read_sheet(path, self.layout.sheet) {
            Ok(grid) => grid,
            Err(e) => {
                warn!(error = %e, "装箱单读取失败，件数/重量按 0 处理");
                return PackingTotals {
                    warnings: vec![ConversionWarning::PackingListUnreadable {
                        path: path_str,
                        message: e.to_string(),
                    }],
                    ..Default::default()
                };
            }
        };

        match self.scan(&grid) {
            Some(metadata) => {
                info!(
                    package_count = metadata.package_count,
                    gross_weight = metadata.gross_weight,
                    net_weight = metadata.net_weight,
                    "装箱单合计读取完成"
                );
                PackingTotals {
                    metadata,
                    found: true,
                    warnings: Vec::new(),
                }
            }
            None => {
                warn!(sentinel = %self.layout.sentinel, "装箱单未找到合计行");
                PackingTotals {
                    warnings: vec![ConversionWarning::PackingTotalsNotFound { path: path_str }],
                    ..Default::default()
                }
            }
        }
    }

    /// 在网格中定位合计行并取值
    ///
    /// # 规则
    /// - 标记列文本（TRIM 后）等于哨兵
    /// - 上一行标记列为数值（最后一个明细行）才算命中
    /// - 空白/非数值单元格记为 0
    pub fn scan(&self, grid: &SheetGrid) -> Option<ShipmentMetadata> {
        let layout = self.layout;
        let first_data_row = layout.header_rows;

        for row in first_data_row..grid.height() {
            let label = grid.get(row, layout.label_column).normalized();
            if label != layout.sentinel.trim() {
                continue;
            }
            if row == first_data_row {
                continue;
            }
            if !grid.get(row - 1, layout.label_column).is_numeric() {
                continue;
            }

            let value_row = match layout.value_row {
                ValueRow::Above => row - 1,
                ValueRow::Sentinel => row,
            };
            let number = |col: usize| grid.get(value_row, col).as_f64().unwrap_or(0.0);
            return Some(ShipmentMetadata {
                package_count: number(layout.package_column),
                gross_weight: number(layout.gross_weight_column),
                net_weight: number(layout.net_weight_column),
            });
        }
        None
    }
}
