// ==========================================
// 报关单生成系统 - 转换编排器
// ==========================================
// 用途: 协调各阶段的执行顺序
// 流程: 政策校验 → 明细读取 → 参照匹配 → 字段映射 → 金额派生
//       → 报关单写出 → 模板填充 → 合并
// ==========================================

use crate::config::ConversionConfig;
use crate::domain::{
    AggregateTotals, ConversionWarning, FillContext, InvoiceParties, OutputRecord, RateTable,
    ShipmentMetadata,
};
use crate::importer::{
    DeclarationWriter, DerivationService, ExcelParser, FieldMapper, FieldMapperImpl,
    FinancialDeriver, InvoiceHeaderReader, PackingListReader, PolicyLoader, ReferenceResolver,
    SheetIngestor,
};
use crate::merge::{MergeReport, WorkbookMerger};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::template::{AnnotationSummary, TemplateAnnotator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

// ==========================================
// ConversionInputs - 显式输入/输出路径
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConversionInputs {
    pub invoice: PathBuf,                   // 发票/装箱单工作簿
    pub reference: PathBuf,                 // 申报要素参照表
    pub policy: PathBuf,                    // 政策费率表
    pub declaration_output: PathBuf,        // 报关单明细输出
    pub packing_list: Option<PathBuf>,      // 缺省取发票工作簿
    pub header_template: Option<PathBuf>,   // 表头模板
    pub totals_template: Option<PathBuf>,   // 合计模板
    pub merged_output: Option<PathBuf>,     // 合并输出（缺省不合并）
    pub intermediates_dir: Option<PathBuf>, // 保留填充后模板的目录（缺省用临时目录）
}

// ==========================================
// ConversionOutcome - 转换结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source_sheet: String,
    pub reference_attributes: Vec<String>, // 参照表已建索引的属性
    pub records: Vec<OutputRecord>,
    pub rates: RateTable,
    pub totals: AggregateTotals,
    pub shipment: ShipmentMetadata,
    pub parties: InvoiceParties,
    pub warnings: Vec<ConversionWarning>,
    pub declaration_path: PathBuf,
    pub header_annotation: Option<AnnotationSummary>,
    pub totals_annotation: Option<AnnotationSummary>,
    pub merge: Option<MergeReport>,
}

/// 模板类型
#[derive(Debug, Clone, Copy)]
enum TemplateKind {
    Header,
    Totals,
}

impl TemplateKind {
    fn file_name(self) -> &'static str {
        match self {
            TemplateKind::Header => "header.annotated.xlsx",
            TemplateKind::Totals => "totals.annotated.xlsx",
        }
    }
}

// ==========================================
// ConversionPipeline - 转换编排器
// ==========================================
pub struct ConversionPipeline {
    config: ConversionConfig,
    parser: ExcelParser,
}

impl ConversionPipeline {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            parser: ExcelParser,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// 执行完整转换流程
    ///
    /// # 错误
    /// - MissingInput: 必需输入文件不存在
    /// - Import: 工作簿结构错误 / 政策文件格式错误 / 报关单写出失败
    /// - Merge: 合并失败（已写出的报关单保留）
    pub fn run(&self, inputs: &ConversionInputs) -> PipelineResult<ConversionOutcome> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = info_span!("conversion", run_id = %run_id);
        let _guard = span.enter();

        info!(invoice = %inputs.invoice.display(), "开始执行报关单转换");
        self.check_inputs(inputs)?;

        let mut warnings: Vec<ConversionWarning> = Vec::new();

        // ==========================================
        // 步骤1: 政策费率（先于任何计算校验）
        // ==========================================
        let rates = PolicyLoader::new(&self.parser, self.config.rates).load(&inputs.policy)?;

        // ==========================================
        // 步骤2: 发票明细读取
        // ==========================================
        let ingestor = SheetIngestor::new(ExcelParser, self.config.ingest.clone());
        let ingested = ingestor.ingest(&inputs.invoice)?;
        warnings.extend(ingested.warnings);
        let table = ingested.table;

        // ==========================================
        // 步骤3: 参照匹配 + 字段映射
        // ==========================================
        let resolver = ReferenceResolver::load(&self.parser, &inputs.reference, &self.config.reference)?;
        warnings.extend(resolver.warnings().iter().cloned());
        let mut reference_attributes: Vec<String> =
            resolver.attributes().map(str::to_string).collect();
        reference_attributes.sort();
        debug!(attributes = ?reference_attributes, "参照属性索引");

        let mapper = FieldMapperImpl::new(self.config.mapping.clone());
        let mapped = mapper.map_records(&table, &resolver);
        warnings.extend(mapped.warnings);
        let records = mapped.records;

        // ==========================================
        // 步骤4: 金额派生 + 报关单写出
        // ==========================================
        let totals = FinancialDeriver.derive_totals(&records, &rates);
        DeclarationWriter::new(&self.config.output).write(&records, &inputs.declaration_output)?;

        // ==========================================
        // 步骤5: 装箱单合计 + 发票抬头
        // ==========================================
        let packing_path = inputs.packing_list.as_deref().unwrap_or(inputs.invoice.as_path());
        let packing = PackingListReader::new(&self.parser, &self.config.packing_list).read(packing_path);
        warnings.extend(packing.warnings);

        let header = InvoiceHeaderReader::new(&self.parser, &self.config.invoice_header).read(&inputs.invoice);
        warnings.extend(header.warnings);

        let ctx = FillContext {
            totals,
            shipment: packing.metadata,
            parties: header.parties,
            trade: self.config.trade.clone(),
        };

        // ==========================================
        // 步骤6: 模板填充（失败降级为原模板）
        // ==========================================
        let scratch = match &inputs.intermediates_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                None
            }
            None => Some(TempDir::new()?),
        };
        let work_dir: &Path = match (&inputs.intermediates_dir, &scratch) {
            (Some(dir), _) => dir.as_path(),
            (None, Some(tmp)) => tmp.path(),
            (None, None) => Path::new("."),
        };

        let annotator = TemplateAnnotator::new(&self.config.labels, &self.config.totals);
        let header_filled = inputs.header_template.as_deref().map(|template| {
            self.annotate(&annotator, TemplateKind::Header, template, work_dir, &ctx, &mut warnings)
        });
        let totals_filled = inputs.totals_template.as_deref().map(|template| {
            self.annotate(&annotator, TemplateKind::Totals, template, work_dir, &ctx, &mut warnings)
        });

        // ==========================================
        // 步骤7: 合并 [表头模板, 报关单, 合计模板]
        // ==========================================
        let merge = match &inputs.merged_output {
            Some(output) => {
                let mut sources: Vec<PathBuf> = Vec::new();
                if let Some((path, _)) = &header_filled {
                    sources.push(path.clone());
                }
                sources.push(inputs.declaration_output.clone());
                if let Some((path, _)) = &totals_filled {
                    sources.push(path.clone());
                }
                debug!(sources = ?sources, "合并源顺序");
                let merger = WorkbookMerger::new(self.config.merge.clone());
                Some(merger.merge(&sources, output)?)
            }
            None => None,
        };

        let outcome = ConversionOutcome {
            run_id,
            started_at,
            finished_at: Utc::now(),
            source_sheet: table.sheet_name,
            reference_attributes,
            records,
            rates,
            totals,
            shipment: ctx.shipment,
            parties: ctx.parties,
            warnings,
            declaration_path: inputs.declaration_output.clone(),
            header_annotation: header_filled.and_then(|(_, s)| s),
            totals_annotation: totals_filled.and_then(|(_, s)| s),
            merge,
        };

        info!(
            records = outcome.records.len(),
            warnings = outcome.warnings.len(),
            total_amount = outcome.totals.total_amount,
            "报关单转换完成"
        );
        Ok(outcome)
    }

    /// 必需输入存在性检查
    fn check_inputs(&self, inputs: &ConversionInputs) -> PipelineResult<()> {
        let mut required: Vec<(&str, &Path)> = vec![
            ("invoice", inputs.invoice.as_path()),
            ("reference", inputs.reference.as_path()),
            ("policy", inputs.policy.as_path()),
        ];
        if let Some(path) = &inputs.header_template {
            required.push(("header_template", path.as_path()));
        }
        if let Some(path) = &inputs.totals_template {
            required.push(("totals_template", path.as_path()));
        }

        for (role, path) in required {
            if !path.exists() {
                return Err(PipelineError::MissingInput {
                    role: role.to_string(),
                    path: path.display().to_string(),
                });
            }
        }
        Ok(())
    }

    /// 填充单个模板
    ///
    /// # 返回
    /// (参与合并的路径, 填充结果)；失败时路径为原模板，结果为 None
    fn annotate(
        &self,
        annotator: &TemplateAnnotator<'_>,
        kind: TemplateKind,
        template: &Path,
        work_dir: &Path,
        ctx: &FillContext,
        warnings: &mut Vec<ConversionWarning>,
    ) -> (PathBuf, Option<AnnotationSummary>) {
        let output = work_dir.join(kind.file_name());
        let result = match kind {
            TemplateKind::Header => annotator.annotate_header(template, &output, ctx),
            TemplateKind::Totals => annotator.annotate_totals(template, &output, ctx),
        };
        match result {
            Ok(summary) => {
                warnings.extend(summary.warnings());
                (output, Some(summary))
            }
            Err(e) => {
                warn!(template = %template.display(), error = %e, "模板填充失败，使用原模板合并");
                warnings.push(ConversionWarning::AnnotationFailed {
                    template: template.display().to_string(),
                    message: e.to_string(),
                });
                (template.to_path_buf(), None)
            }
        }
    }
}
