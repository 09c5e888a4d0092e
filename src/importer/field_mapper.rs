// ==========================================
// 报关单生成系统 - 字段映射器实现
// ==========================================
// 职责: 源表列 / 参照属性 / 固定值 → 报关单 15 个标准字段
// 约束: 输出顺序固定；未配置或未找到的字段为空白，不做部分填充
// ==========================================

use crate::config::{FieldSource, MappingConfig};
use crate::domain::{CellValue, ConversionWarning, DeclarationField, OutputRecord, SourceTable};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::importer_trait::{
    DataCleaner as DataCleanerTrait, FieldMapper as FieldMapperTrait, MappedRecords,
};
use crate::importer::reference_resolver::ReferenceResolver;
use tracing::{debug, info, warn};

pub struct FieldMapperImpl {
    config: MappingConfig,
    cleaner: DataCleaner,
}

/// 单条规则在当前表上的解析结果
enum ResolvedSource<'a> {
    Column(usize),
    Reference(&'a str),
    Fixed(&'a CellValue),
    Missing,
}

impl FieldMapperImpl {
    pub fn new(config: MappingConfig) -> Self {
        Self {
            config,
            cleaner: DataCleaner,
        }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }
}

impl FieldMapperTrait for FieldMapperImpl {
    fn map_records(&self, table: &SourceTable, resolver: &ReferenceResolver) -> MappedRecords {
        let mut out = MappedRecords::default();

        // 列位置按表解析一次；缺列每列只告警一次
        let resolved: Vec<(DeclarationField, bool, ResolvedSource)> = self
            .config
            .rules
            .iter()
            .map(|rule| {
                let source = match &rule.source {
                    FieldSource::Input(aliases) => match table.find_column(aliases) {
                        Some(col) => ResolvedSource::Column(col),
                        None => {
                            let column = aliases.first().cloned().unwrap_or_default();
                            warn!(field = %rule.field, column = %column, "输入文件缺少列，字段留空");
                            out.warnings.push(ConversionWarning::MissingColumn { column });
                            ResolvedSource::Missing
                        }
                    },
                    FieldSource::Reference(attr) => ResolvedSource::Reference(attr.as_str()),
                    FieldSource::Fixed(value) => ResolvedSource::Fixed(value),
                };
                (rule.field, rule.numeric, source)
            })
            .collect();

        let uses_reference = resolved
            .iter()
            .any(|(_, _, s)| matches!(s, ResolvedSource::Reference(_)));
        let code_col = table.find_column(&self.config.material_code_columns);
        if uses_reference && code_col.is_none() {
            warn!(sheet = %table.sheet_name, "输入文件缺少物料号列，参照字段留空");
            out.warnings.push(ConversionWarning::MaterialCodeColumnMissing {
                workbook: table.sheet_name.clone(),
            });
        }

        for row in &table.rows {
            let mut record = OutputRecord::new(row.row_index);
            let material_code = code_col.map(|c| row.get(c)).unwrap_or(&CellValue::EMPTY);
            let matched = if uses_reference {
                resolver.record(material_code)
            } else {
                None
            };

            for (field, numeric, source) in &resolved {
                let value = match source {
                    ResolvedSource::Column(col) => row.get(*col).clone(),
                    ResolvedSource::Reference(attr) => matched
                        .as_ref()
                        .and_then(|m| m.attributes.get(*attr).cloned())
                        .unwrap_or_default(),
                    ResolvedSource::Fixed(value) => (*value).clone(),
                    ResolvedSource::Missing => CellValue::Empty,
                };

                let value = if *numeric {
                    match self.cleaner.coerce_numeric(&value) {
                        Ok(v) => v,
                        Err(raw) => {
                            debug!(row = row.sheet_row, field = %field, value = %raw, "非数值内容置空");
                            out.warnings.push(ConversionWarning::NonNumericValue {
                                row: row.sheet_row as usize,
                                field: field.header().to_string(),
                                value: raw,
                            });
                            CellValue::Empty
                        }
                    }
                } else {
                    value
                };
                record.set(*field, value);
            }

            if uses_reference && !material_code.is_empty() && matched.is_none() {
                let code = self.cleaner.material_key(material_code);
                debug!(row = row.sheet_row, code = %code, "物料号未匹配");
                out.warnings.push(ConversionWarning::UnmatchedMaterialCode {
                    row: row.sheet_row as usize,
                    code,
                });
            }

            out.records.push(record);
        }

        info!(
            records = out.records.len(),
            warnings = out.warnings.len(),
            "字段映射完成"
        );
        out
    }
}
