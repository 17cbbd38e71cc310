// ==========================================
// Shopify 商品批量导入生成系统 - 输出行模型
// ==========================================
// 依据: Shopify flat CSV 导入格式（固定 32 列）
// 红线: 列名与列序是对外契约,不得改动
// ==========================================

use serde::{Deserialize, Serialize};

/// 主导入 CSV 的固定表头（列序即写出顺序）
pub const CATALOG_HEADERS: [&str; 32] = [
    "Handle",
    "Title",
    "Body (HTML)",
    "Vendor",
    "Type",
    "Tags",
    "Published",
    "Option1 Name",
    "Option1 Value",
    "Option2 Name",
    "Option2 Value",
    "Option3 Name",
    "Option3 Value",
    "Variant SKU",
    "Variant Grams",
    "Variant Inventory Tracker",
    "Variant Inventory Qty",
    "Variant Inventory Policy",
    "Variant Fulfillment Service",
    "Variant Price",
    "Variant Compare At Price",
    "Variant Requires Shipping",
    "Variant Taxable",
    "Variant Barcode",
    "Image Src",
    "Image Position",
    "Image Alt Text",
    "Gift Card",
    "SEO Title",
    "SEO Description",
    "Status",
    "Variant Weight Unit",
];

/// 库存导出 CSV 的固定表头（对齐 Shopify Inventory export）
pub const INVENTORY_EXPORT_HEADERS: [&str; 19] = [
    "Handle",
    "Title",
    "Option1 Name",
    "Option1 Value",
    "Option2 Name",
    "Option2 Value",
    "Option3 Name",
    "Option3 Value",
    "SKU",
    "HS Code",
    "COO",
    "Location",
    "Bin name",
    "Incoming (not editable)",
    "Unavailable (not editable)",
    "Committed (not editable)",
    "Available (not editable)",
    "On hand (current)",
    "On hand (new)",
];

// ==========================================
// CatalogRow - 扁平输出行
// ==========================================
// 生命周期: 装配器创建后不再变更,写出一次
// 约定: 变体行必有 SKU;纯图片行除 handle/图片三列外全空
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub handle: String,
    pub title: String,
    pub body_html: String,
    pub vendor: String,
    pub product_type: String,
    pub tags: String,
    pub published: String,
    pub option1_name: String,
    pub option1_value: String,
    pub option2_name: String,
    pub option2_value: String,
    pub option3_name: String,
    pub option3_value: String,
    pub variant_sku: String,
    pub variant_grams: String,
    pub variant_inventory_tracker: String,
    pub variant_inventory_qty: String,
    pub variant_inventory_policy: String,
    pub variant_fulfillment_service: String,
    pub variant_price: String,
    pub variant_compare_at_price: String,
    pub variant_requires_shipping: String,
    pub variant_taxable: String,
    pub variant_barcode: String,
    pub image_src: String,
    pub image_position: String,
    pub image_alt_text: String,
    pub gift_card: String,
    pub seo_title: String,
    pub seo_description: String,
    pub status: String,
    pub variant_weight_unit: String,
}

impl CatalogRow {
    /// 纯图片行（第 2..8 张图,排在商品变体行之后）
    pub fn image_only(
        handle: impl Into<String>,
        src: impl Into<String>,
        position: usize,
        alt: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            image_src: src.into(),
            image_position: position.to_string(),
            image_alt_text: alt.into(),
            ..Self::default()
        }
    }

    /// 是否为变体行（纯图片行无 SKU）
    pub fn is_variant_row(&self) -> bool {
        !self.variant_sku.trim().is_empty()
    }

    /// 按 CATALOG_HEADERS 列序导出（写 CSV 用）
    pub fn to_record(&self) -> [&str; 32] {
        [
            &self.handle,
            &self.title,
            &self.body_html,
            &self.vendor,
            &self.product_type,
            &self.tags,
            &self.published,
            &self.option1_name,
            &self.option1_value,
            &self.option2_name,
            &self.option2_value,
            &self.option3_name,
            &self.option3_value,
            &self.variant_sku,
            &self.variant_grams,
            &self.variant_inventory_tracker,
            &self.variant_inventory_qty,
            &self.variant_inventory_policy,
            &self.variant_fulfillment_service,
            &self.variant_price,
            &self.variant_compare_at_price,
            &self.variant_requires_shipping,
            &self.variant_taxable,
            &self.variant_barcode,
            &self.image_src,
            &self.image_position,
            &self.image_alt_text,
            &self.gift_card,
            &self.seo_title,
            &self.seo_description,
            &self.status,
            &self.variant_weight_unit,
        ]
    }
}
