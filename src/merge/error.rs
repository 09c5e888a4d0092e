// ==========================================
// 报关单生成系统 - 合并模块错误类型
// ==========================================
// 红线: 任一错误发生时不产生输出文件
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("没有可合并的文件")]
    NoSources,

    #[error("待合并文件不存在: {0}")]
    SourceNotFound(String),

    #[error("无法打开文件 {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("文件无工作表: {0}")]
    EmptyWorkbook(String),

    #[error("合并结果写出失败 {path}: {message}")]
    Write { path: String, message: String },

    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type MergeResult<T> = Result<T, MergeError>;
