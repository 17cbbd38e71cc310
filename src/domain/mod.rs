// ==========================================
// Shopify 商品批量导入生成系统 - 领域模型层
// ==========================================
// 职责: 定义商品/变体/问题/输出行等核心类型
// 红线: 不含文件访问逻辑,不含流水线逻辑
// ==========================================

pub mod catalog_row;
pub mod issue;
pub mod product;

// 重导出核心类型
pub use catalog_row::{CatalogRow, CATALOG_HEADERS, INVENTORY_EXPORT_HEADERS};
pub use issue::{BuildFinding, IssueCode, IssueLevel, RuleFinding, ValidationReport};
pub use product::{ImageRef, OptionDimension, ProductStatus, VariantCombo};
