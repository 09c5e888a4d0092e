// ==========================================
// 报关单生成系统 - 发票抬头读取
// ==========================================
// 职责: 卖方（A1）/ 买方（Buyer:）/ 合同协议号（CI No.:）
// ==========================================

use crate::config::InvoiceHeaderLayout;
use crate::domain::{ConversionWarning, InvoiceParties};
use crate::importer::file_parser::SheetGrid;
use crate::importer::importer_trait::FileParser;
use std::path::Path;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct InvoiceHeader {
    pub parties: InvoiceParties,
    pub warnings: Vec<ConversionWarning>,
}

pub struct InvoiceHeaderReader<'a, P>
where
    P: FileParser,
{
    parser: &'a P,
    layout: &'a InvoiceHeaderLayout,
}

impl<'a, P> InvoiceHeaderReader<'a, P>
where
    P: FileParser,
{
    pub fn new(parser: &'a P, layout: &'a InvoiceHeaderLayout) -> Self {
        Self { parser, layout }
    }

    #[instrument(skip(self), fields(file = %path.display()))]
    pub fn read(&self, path: &Path) -> InvoiceHeader {
        let grid = match self.parser.read_sheet(path, self.layout.sheet) {
            Ok(grid) => grid,
            Err(e) => {
                warn!(error = %e, "发票抬头读取失败");
                return InvoiceHeader {
                    parties: InvoiceParties::default(),
                    warnings: vec![ConversionWarning::InvoiceHeaderUnreadable {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    }],
                };
            }
        };

        let parties = self.extract(&grid);
        let mut warnings = Vec::new();
        for (field, value) in [
            ("seller", &parties.seller),
            ("buyer", &parties.buyer),
            ("contract_no", &parties.contract_no),
        ] {
            if value.is_none() {
                warn!(field, "发票抬头缺少字段");
                warnings.push(ConversionWarning::InvoicePartyMissing {
                    field: field.to_string(),
                });
            }
        }
        InvoiceHeader { parties, warnings }
    }

    /// 从网格提取抬头信息（同一标记出现多次时取最后一次）
    pub fn extract(&self, grid: &SheetGrid) -> InvoiceParties {
        let layout = self.layout;
        let mut parties = InvoiceParties {
            seller: non_blank(grid.get(layout.seller_row, layout.seller_column).normalized()),
            ..Default::default()
        };

        let end = layout.scan_start_row + layout.scan_rows;
        for row in layout.scan_start_row..end.min(grid.height()) {
            let width = grid.rows[row].len();
            for col in 0..width {
                let text = grid.get(row, col).to_string();
                if text.contains(layout.buyer_marker.trim()) {
                    // 取首个冒号后的内容
                    let buyer = text
                        .split_once(':')
                        .or_else(|| text.split_once('：'))
                        .map(|(_, rest)| rest.trim().to_string())
                        .unwrap_or_default();
                    if let Some(buyer) = non_blank(buyer) {
                        parties.buyer = Some(buyer);
                    }
                }
                if text.contains(layout.contract_marker.trim()) {
                    if let Some(no) = non_blank(grid.get(row, col + 1).normalized()) {
                        parties.contract_no = Some(no);
                    }
                }
            }
        }

        debug!(?parties, "发票抬头解析完成");
        parties
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
