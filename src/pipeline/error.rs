// ==========================================
// 报关单生成系统 - 管道错误类型
// ==========================================
// 致命错误: 输入缺失 / 结构或政策文件格式错误 / 合并失败
// 其余问题以 ConversionWarning 形式随结果返回
// ==========================================

use crate::importer::ImportError;
use crate::merge::MergeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("缺少输入文件 ({role}): {path}")]
    MissingInput { role: String, path: String },

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("合并失败: {0}")]
    Merge(#[from] MergeError),

    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
