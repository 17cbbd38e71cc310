// ==========================================
// Shopify 商品批量导入生成系统 - API 层错误类型
// ==========================================
// 职责: 聚合下层错误,向 CLI 暴露用户可读的失败原因
// ==========================================

use crate::domain::issue::ValidationReport;
use crate::engine::BuildCancelled;
use crate::export::ExportError;
use crate::sheet::SheetError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 放行策略错误
    // ==========================================
    /// 预检未通过,构建被阻断（101 可凭显式放行标志通过,其余编码一律阻断）
    #[error("Validation blocked the build (codes: {codes:?})")]
    ValidationBlocked {
        codes: Vec<u16>,
        /// 完整预检报告,供 CLI 渲染
        report: Box<ValidationReport>,
    },

    // ==========================================
    // 流程控制错误
    // ==========================================
    #[error("Build cancelled")]
    Cancelled(#[from] BuildCancelled),

    // ==========================================
    // 下层错误透传
    // ==========================================
    #[error("表格错误: {0}")]
    Sheet(#[from] SheetError),

    #[error("输出错误: {0}")]
    Export(#[from] ExportError),
}

/// API 层统一返回类型
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn blocked(report: ValidationReport) -> Self {
        ApiError::ValidationBlocked {
            codes: report.codes.iter().map(|c| c.code()).collect(),
            report: Box::new(report),
        }
    }
}
