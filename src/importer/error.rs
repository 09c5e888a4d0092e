// ==========================================
// 报关单生成系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 文件缺失 / 结构异常 / 政策文件格式错误 / 写出失败
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("工作表不存在 (文件 {path}, 序号 {index})")]
    SheetNotFound { path: String, index: usize },

    // ===== 政策文件错误 =====
    #[error("政策文件格式错误 (单元格 {cell}): {message}")]
    PolicyFormat { cell: String, message: String },

    // ===== 写出错误 =====
    #[error("Excel 写出失败: {0}")]
    WriteError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为政策文件格式问题（与一般 I/O 错误区分）
    pub fn is_policy_format(&self) -> bool {
        matches!(self, ImportError::PolicyFormat { .. })
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<rust_xlsxwriter::XlsxError>
impl From<rust_xlsxwriter::XlsxError> for ImportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportError::WriteError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
