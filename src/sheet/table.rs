// ==========================================
// Shopify 商品批量导入生成系统 - 规范化表格
// ==========================================
// 职责: 按列名取值、缺列容忍、平台列名别名归一
// 约定: 缺失单元格一律暴露为空串;取值两侧空白剔除
// ==========================================

use std::collections::HashMap;

/// 模板规范列名（装配与校验统一引用,避免散落字符串）
pub mod columns {
    pub const TITLE: &str = "Title*";
    pub const VENDOR: &str = "Vendor*";
    pub const BODY_HTML: &str = "Body (HTML)";
    pub const HANDLE: &str = "Handle (optional)";
    pub const PRODUCT_TYPE: &str = "Type (Product Type)";
    pub const TAGS: &str = "Tags (comma-separated)";
    pub const PUBLISHED: &str = "Published (TRUE/FALSE)";
    pub const STATUS: &str = "Status (active/draft/archived)";
    pub const SEO_TITLE: &str = "SEO Title";
    pub const SEO_DESCRIPTION: &str = "SEO Description";
    pub const OPTION1_NAME: &str = "Option1 Name";
    pub const OPTION1_VALUES: &str = "Option1 Values";
    pub const OPTION2_NAME: &str = "Option2 Name";
    pub const OPTION2_VALUES: &str = "Option2 Values";
    pub const OPTION3_NAME: &str = "Option3 Name";
    pub const OPTION3_VALUES: &str = "Option3 Values";
    pub const VARIANT_PRICE: &str = "Variant Price*";
    pub const VARIANT_COMPARE_AT: &str = "Variant Compare At Price";
    pub const VARIANT_BARCODE: &str = "Variant Barcode (EAN/UPC)";
    pub const VARIANT_GRAMS: &str = "Variant Grams";
    pub const VARIANT_WEIGHT: &str = "Variant Weight";
    pub const VARIANT_WEIGHT_UNIT: &str = "Variant Weight Unit (g,kg,lb,oz)";
    pub const VARIANT_INVENTORY: &str = "Variant Inventory";
    pub const VARIANT_SKU: &str = "Variant SKU";
    pub const VARIANT_REQUIRES_SHIPPING: &str = "Variant Requires Shipping (TRUE/FALSE)";
    pub const VARIANT_TAXABLE: &str = "Variant Taxable (TRUE/FALSE)";
}

/// 平台导出列名 → 模板规范列名（规范列缺失时生效）
const HEADER_ALIASES: [(&str, &str); 6] = [
    ("Variant Barcode", columns::VARIANT_BARCODE),
    ("Type", columns::PRODUCT_TYPE),
    ("Tags", columns::TAGS),
    ("Handle", columns::HANDLE),
    ("Published", columns::PUBLISHED),
    ("Variant Weight Unit", columns::VARIANT_WEIGHT_UNIT),
];

// ==========================================
// SheetRow - 规范化数据行
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SheetRow {
    /// 物理表格行号（表头 = 行 1,首条数据 = 行 2;跳过空行不重排）
    pub row_number: usize,
    cells: HashMap<String, String>,
}

impl SheetRow {
    pub fn new(row_number: usize, cells: HashMap<String, String>) -> Self {
        Self { row_number, cells }
    }

    /// 按列名取值（两侧空白剔除;列缺失返回空串）
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(|v| v.trim()).unwrap_or("")
    }

    /// 原始取值（保留空白,表格回写用）
    pub fn get_raw(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    /// 覆盖单元格（别名归一与 SKU 回填用）
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.cells.insert(column.to_string(), value.into());
    }

    /// 整行是否空白
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

// ==========================================
// SheetTable - 规范化表格
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<SheetRow>,
}

impl SheetTable {
    pub fn new(headers: Vec<String>, rows: Vec<SheetRow>) -> Self {
        let mut table = Self { headers, rows };
        table.apply_header_aliases();
        table
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [SheetRow] {
        &mut self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 商品数 = 非空 Title* 的行数
    pub fn product_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| !r.get(columns::TITLE).is_empty())
            .count()
    }

    /// 追加列（别名归一与 SKU 回填用;已存在则不重复）
    pub fn ensure_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.headers.push(name.to_string());
        }
    }

    /// 平台列名别名归一
    ///
    /// Shopify 导出风格的列名映射到模板规范列名;规范列已存在时不覆盖。
    /// 兼容旧导出: 只有 Variant Grams 而无 Variant Weight 时,从克数列
    /// 暴露 Variant Weight 并隐含单位 g。
    fn apply_header_aliases(&mut self) {
        for (alias, canonical) in HEADER_ALIASES {
            if self.has_column(canonical) || !self.has_column(alias) {
                continue;
            }
            self.ensure_column(canonical);
            for row in &mut self.rows {
                let value = row.get_raw(alias).to_string();
                row.set(canonical, value);
            }
        }

        // 旧导出兼容: Variant Grams → Variant Weight + 单位 g
        if self.has_column(columns::VARIANT_GRAMS) && !self.has_column(columns::VARIANT_WEIGHT) {
            self.ensure_column(columns::VARIANT_WEIGHT);
            let need_unit = !self.has_column(columns::VARIANT_WEIGHT_UNIT);
            if need_unit {
                self.ensure_column(columns::VARIANT_WEIGHT_UNIT);
            }
            for row in &mut self.rows {
                let grams = row.get_raw(columns::VARIANT_GRAMS).to_string();
                row.set(columns::VARIANT_WEIGHT, grams);
                if need_unit {
                    row.set(columns::VARIANT_WEIGHT_UNIT, "g");
                }
            }
        }
    }
}
