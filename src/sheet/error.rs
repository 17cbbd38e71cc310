// ==========================================
// Shopify 商品批量导入生成系统 - 表格层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 表格层错误类型
#[derive(Error, Debug)]
pub enum SheetError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.xlsm/.csv）")]
    UnsupportedFormat(String),

    #[error("工作表不存在: {0}")]
    WorksheetNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    // ===== 解析错误 =====
    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for SheetError {
    fn from(err: std::io::Error) -> Self {
        SheetError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for SheetError {
    fn from(err: csv::Error) -> Self {
        SheetError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for SheetError {
    fn from(err: calamine::XlsxError) -> Self {
        SheetError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type SheetResult<T> = Result<T, SheetError>;
