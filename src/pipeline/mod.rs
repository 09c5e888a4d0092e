// ==========================================
// 报关单生成系统 - 管道层
// ==========================================
// 职责: 单次转换的端到端编排（同步、单线程）
// ==========================================

pub mod error;
pub mod orchestrator;

pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{ConversionInputs, ConversionOutcome, ConversionPipeline};
