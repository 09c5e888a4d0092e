// ==========================================
// 报关单生成系统 - 导入层
// ==========================================
// 职责: 发票/参照/政策/装箱单读取 → 字段映射 → 金额派生 → 报关单写出
// 支持: Excel (.xlsx/.xlsm/.xls)
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod derivation;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod invoice_header;
pub mod output_writer;
pub mod packing_list;
pub mod policy_loader;
pub mod reference_resolver;
pub mod sheet_ingestor;

// 重导出核心类型
pub use data_cleaner::{round2, DataCleaner as DataCleanerImpl};
pub use derivation::FinancialDeriver;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapperImpl;
pub use file_parser::{ExcelParser, SheetGrid, SheetSelector};
pub use invoice_header::{InvoiceHeader, InvoiceHeaderReader};
pub use output_writer::DeclarationWriter;
pub use packing_list::{PackingListReader, PackingTotals};
pub use policy_loader::PolicyLoader;
pub use reference_resolver::ReferenceResolver;
pub use sheet_ingestor::{truncate_at_sentinel, IngestedSheet, SheetIngestor};

// 重导出 Trait 接口
pub use importer_trait::{DataCleaner, DerivationService, FieldMapper, FileParser, MappedRecords};
