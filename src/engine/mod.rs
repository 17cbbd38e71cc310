// ==========================================
// Shopify 商品批量导入生成系统 - 生成引擎
// ==========================================
// 职责: SKU 分配 → 变体展开 → 字段广播 → 行装配 → 构建编排
// 红线: 商品串行处理;引擎不做 IO,落盘归 export 层
// ==========================================

// 模块声明
pub mod assembler;
pub mod broadcaster;
pub mod builder;
pub mod expander;
pub mod sku_allocator;

// 重导出核心类型
pub use assembler::{AssembleContext, AssembledProduct, HandleRegistry};
pub use broadcaster::{broadcast, split_pipe};
pub use builder::{BuildCancelled, BuildCounters, BuildOptions, BuildOutcome, CatalogBuilder};
pub use expander::{VariantGrid, VariantOverflow, MAX_VARIANTS};
pub use sku_allocator::{SkuAllocator, DEFAULT_START_BASE};
