// ==========================================
// Shopify 商品批量导入生成系统 - API 层
// ==========================================
// 职责: 业务入口门面,供 CLI 与集成测试调用
// ==========================================

pub mod catalog_api;
pub mod error;

// 重导出核心类型
pub use catalog_api::{BuildRequest, BuildSummary, CatalogApi};
pub use error::{ApiError, ApiResult};
