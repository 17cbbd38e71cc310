// ==========================================
// Shopify 商品批量导入生成系统 - 核心库
// ==========================================
// 系统定位: 运营维护表格 → 平台批量导入文件的离线转换工具
// 流水线: 规范化 → 预检 → 分配/展开/广播 → 探测 → 装配 → 落盘
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 表格层 - 输入装载与规范化
pub mod sheet;

// 校验层 - 预检规则 101-112
pub mod validator;

// 引擎层 - SKU 分配/变体展开/字段广播/行装配
pub mod engine;

// 探测层 - 图片可达性
pub mod probe;

// 输出层 - CSV 落盘
pub mod export;

// 配置层 - 应用配置
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 业务入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::catalog_row::{CatalogRow, CATALOG_HEADERS, INVENTORY_EXPORT_HEADERS};
pub use domain::issue::{BuildFinding, IssueCode, IssueLevel, ValidationReport};
pub use domain::product::{ImageRef, OptionDimension, ProductStatus, VariantCombo};

// 表格层
pub use sheet::{PriorExport, PriorLoad, SheetRow, SheetTable, UniversalSheetParser};

// 引擎
pub use engine::{
    BuildOptions, BuildOutcome, CatalogBuilder, SkuAllocator, DEFAULT_START_BASE, MAX_VARIANTS,
};

// 探测
pub use probe::{HttpImageProber, ImageProber, OfflineImageProber, ProbeOutcome};

// 配置
pub use config::AppConfig;

// API
pub use api::{ApiError, BuildRequest, BuildSummary, CatalogApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Shopify 商品批量导入生成系统";
