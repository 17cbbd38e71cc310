// ==========================================
// Shopify 商品批量导入生成系统 - 表格层
// ==========================================
// 职责: 外部表格装载与规范化（缺格补空串、按列名访问）
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod error;
pub mod parser;
pub mod prior;
pub mod table;

// 重导出核心类型
pub use error::{SheetError, SheetResult};
pub use parser::{CsvParser, ExcelParser, UniversalSheetParser};
pub use prior::{clean_sku_text, extract_base6, normalize_title, PriorExport, PriorLoad};
pub use table::{columns, SheetRow, SheetTable};
