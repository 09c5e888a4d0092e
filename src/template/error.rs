// ==========================================
// 报关单生成系统 - 模板填充错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("模板不存在: {0}")]
    TemplateNotFound(String),

    #[error("模板读取失败 {path}: {message}")]
    Read { path: String, message: String },

    #[error("模板无工作表: {0}")]
    EmptyWorkbook(String),

    #[error("模板写出失败 {path}: {message}")]
    Write { path: String, message: String },

    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type AnnotateResult<T> = Result<T, AnnotateError>;
