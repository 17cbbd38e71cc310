// ==========================================
// Shopify 商品批量导入生成系统 - 行装配器
// ==========================================
// 职责: 单条输入行 → handle/状态/字段解析 → 变体行 + 纯图片行
// 约定: 变体行在前,纯图片行其后;首个变体行携带 1 号图
// 红线: 装配顺序 = 输入行序;同一商品内行序确定
// ==========================================

use crate::domain::catalog_row::CatalogRow;
use crate::domain::issue::BuildFinding;
use crate::domain::product::{ImageRef, ProductStatus};
use crate::engine::broadcaster::{
    broadcast, resolve_with_suffix_columns, split_pipe, BARCODE_FIELD, GRAMS_FIELD,
    INVENTORY_FIELD, WEIGHT_FIELD,
};
use crate::engine::expander::{expand, resolve_dimensions, VariantGrid};
use crate::engine::sku_allocator::SkuAllocator;
use crate::sheet::{columns, SheetRow};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

static NON_SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// 重量单位 → 克换算系数
const WEIGHT_UNITS: [(&str, f64); 4] = [
    ("g", 1.0),
    ("kg", 1000.0),
    ("lb", 453.59237),
    ("oz", 28.3495231),
];

/// 文本 slug 化（小写;非字母数字折叠为连字符;两端剔除;上限 255）
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let slug = NON_SLUG_RE.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    slug.chars().take(255).collect()
}

// ==========================================
// HandleRegistry - 运行内 handle 唯一化
// ==========================================
#[derive(Debug, Default)]
pub struct HandleRegistry {
    used: HashSet<String>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 冲突时追加 -1 / -2 … 直到唯一
    pub fn unique(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut i = 1;
        loop {
            let candidate = format!("{}-{}", base, i);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            i += 1;
        }
    }
}

/// 布尔单元格归一: true/t/yes/y/1 → TRUE,false/f/no/n/0 → FALSE,其余空串
pub fn coerce_bool_token(token: &str) -> &'static str {
    match token.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => "TRUE",
        "false" | "f" | "no" | "n" | "0" => "FALSE",
        _ => "",
    }
}

/// 由重量 + 单位换算克数（四舍五入取整;数值或单位非法返回空串）
pub fn grams_from_weight(value: &str, unit: &str) -> String {
    let Ok(weight) = value.trim().parse::<f64>() else {
        return String::new();
    };
    let unit = unit.trim().to_lowercase();
    match WEIGHT_UNITS.iter().find(|(u, _)| *u == unit) {
        Some((_, factor)) => format!("{}", (weight * factor).round() as i64),
        None => String::new(),
    }
}

/// 库存单元格 → 数量
///
/// 空/1/in/instock/in stock/true/yes → 1000;
/// 0/out/oos/outofstock/out of stock/false/no → 0;
/// 纯数字原样透传;其余按有货处理。
pub fn inventory_qty_token(token: &str) -> String {
    let s = token.trim().to_lowercase();
    match s.as_str() {
        "" | "1" | "in" | "instock" | "in stock" | "true" | "yes" => "1000".to_string(),
        "0" | "out" | "oos" | "outofstock" | "out of stock" | "false" | "no" => "0".to_string(),
        _ if s.chars().all(|c| c.is_ascii_digit()) => s,
        _ => "1000".to_string(),
    }
}

// ==========================================
// AssembleContext - 跨商品的装配状态
// ==========================================
// 生命周期: 一次构建一个;handle 注册表与 SKU 分配器跨行共享
pub struct AssembleContext<'a> {
    pub handles: HandleRegistry,
    pub allocator: SkuAllocator,
    /// 尊重输入表已有 SKU,仅填空槽
    pub respect_existing: bool,
    /// 构建级状态覆盖（替换所有商品的行级状态）
    pub status_override: Option<ProductStatus>,
    /// 破图放行时需降级为 draft 的商品标题（trim 后比对）
    pub broken_titles: &'a BTreeSet<String>,
}

// ==========================================
// AssembledProduct - 单商品装配结果
// ==========================================
#[derive(Debug, Clone)]
pub struct AssembledProduct {
    pub handle: String,
    pub title: String,
    /// 变体行在前,纯图片行其后
    pub rows: Vec<CatalogRow>,
    /// 待探测图片（position 按非空图片重排,从 1 起）
    pub images: Vec<ImageRef>,
    /// 回填输入表的竖线串
    pub sku_pipe: String,
    pub variant_count: usize,
}

/// 单条输入行装配
///
/// 返回 None 表示该商品被跳过（标题为空或变体超限）;
/// findings 两种情形均会记录,调用方继续处理后续行。
pub fn assemble_product(
    row: &SheetRow,
    headers: &[String],
    ctx: &mut AssembleContext<'_>,
) -> (Option<AssembledProduct>, Vec<BuildFinding>) {
    let mut findings = Vec::new();
    let row_number = row.row_number;

    let title = row.get(columns::TITLE).to_string();
    let vendor = row.get(columns::VENDOR).to_string();
    if title.is_empty() {
        findings.push(BuildFinding::error(row_number, columns::TITLE, "Empty title"));
        return (None, findings);
    }
    if vendor.is_empty() {
        findings.push(BuildFinding::error(row_number, columns::VENDOR, "Empty vendor"));
    }

    // handle: 显式列 > 标题 > product-{行号},slug 化后运行内唯一化
    let handle_src = {
        let explicit = row.get(columns::HANDLE);
        if !explicit.is_empty() {
            explicit.to_string()
        } else {
            title.clone()
        }
    };
    let mut slug = slugify(&handle_src);
    if slug.is_empty() {
        slug = format!("product-{}", row_number);
    }
    let handle = ctx.handles.unique(&slug);

    let status = resolve_status(row, &title, ctx, &mut findings);
    let published = {
        let coerced = coerce_bool_token(row.get(columns::PUBLISHED));
        if coerced.is_empty() { "TRUE" } else { coerced }
    };

    // 规格维度展开;超限拒绝该商品
    let dims = resolve_dimensions(row);
    let grid = match expand(&dims) {
        Ok(grid) => grid,
        Err(overflow) => {
            findings.push(BuildFinding::error(
                row_number,
                "Options",
                format!(
                    "Too many variants ({}). Please reduce combinations.",
                    overflow.count
                ),
            ));
            return (None, findings);
        }
    };
    let nvars = grid.variant_count();

    let fields = resolve_variant_fields(row, headers, &grid, &mut findings);

    // 图片: 非空 URL 按出现顺序重排位置（1 起）
    let images = collect_images(row, &handle, &title);

    // SKU: 尊重已有模式仅在任一槽位非空时生效
    let raw_sku_cell = row.get(columns::VARIANT_SKU);
    let existing = split_pipe(raw_sku_cell);
    let assigned = if ctx.respect_existing && !existing.is_empty() {
        let (slots, warning) = broadcast(&existing, grid.n1, grid.n2, grid.n3);
        if let Some(text) = warning {
            findings.push(BuildFinding::warning(row_number, columns::VARIANT_SKU, text));
        }
        ctx.allocator.allocate(nvars, Some(&slots))
    } else {
        ctx.allocator.allocate(nvars, None)
    };
    let sku_pipe = assigned.join("|");

    // 变体行(维度一主序),首行携带 1 号图
    let mut rows = Vec::with_capacity(nvars + images.len().saturating_sub(1));
    for (idx, combo) in grid.combos.iter().enumerate() {
        if fields.price[idx].is_empty() {
            findings.push(BuildFinding::error(
                row_number,
                columns::VARIANT_PRICE,
                format!("Empty price for variant #{}", idx + 1),
            ));
        }
        let unit = fields.weight_unit[idx].trim().to_lowercase();
        let grams = {
            let explicit = fields.grams[idx].trim();
            if !explicit.is_empty() {
                explicit.to_string()
            } else if !fields.weight[idx].is_empty() {
                grams_from_weight(&fields.weight[idx], &unit)
            } else {
                String::new()
            }
        };

        let mut out = CatalogRow {
            handle: handle.clone(),
            title: title.clone(),
            body_html: row.get_raw(columns::BODY_HTML).to_string(),
            vendor: vendor.clone(),
            product_type: row.get(columns::PRODUCT_TYPE).to_string(),
            tags: row.get(columns::TAGS).to_string(),
            published: published.to_string(),
            option1_name: grid.dim1_name.clone(),
            option1_value: combo.option1.clone(),
            option2_name: grid.dim2_name.clone(),
            option2_value: combo.option2.clone(),
            option3_name: grid.dim3_name.clone(),
            option3_value: combo.option3.clone(),
            variant_sku: assigned[idx].clone(),
            variant_grams: grams,
            variant_inventory_tracker: "shopify".to_string(),
            variant_inventory_qty: inventory_qty_token(&fields.inventory[idx]),
            variant_inventory_policy: "deny".to_string(),
            variant_fulfillment_service: "manual".to_string(),
            variant_price: fields.price[idx].clone(),
            variant_compare_at_price: fields.compare_at[idx].clone(),
            variant_requires_shipping: fields.requires_shipping[idx].clone(),
            variant_taxable: fields.taxable[idx].clone(),
            variant_barcode: fields.barcode[idx].clone(),
            gift_card: "FALSE".to_string(),
            seo_title: row.get(columns::SEO_TITLE).to_string(),
            seo_description: row.get(columns::SEO_DESCRIPTION).to_string(),
            status: status.as_str().to_string(),
            variant_weight_unit: unit,
            ..CatalogRow::default()
        };
        if idx == 0 {
            if let Some(first) = images.first() {
                out.image_src = first.url.clone();
                out.image_position = "1".to_string();
                out.image_alt_text = first.alt.clone();
            }
        }
        rows.push(out);
    }

    // 2..N 号图: 纯图片行,排在全部变体行之后
    for image in images.iter().skip(1) {
        rows.push(CatalogRow::image_only(
            handle.clone(),
            image.url.clone(),
            image.position,
            image.alt.clone(),
        ));
    }

    (
        Some(AssembledProduct {
            handle,
            title,
            rows,
            images,
            sku_pipe,
            variant_count: nvars,
        }),
        findings,
    )
}

/// 行级状态解析: 非法值警告并回退 active;构建级覆盖优先;破图商品降级 draft
fn resolve_status(
    row: &SheetRow,
    title: &str,
    ctx: &AssembleContext<'_>,
    findings: &mut Vec<BuildFinding>,
) -> ProductStatus {
    let raw = row.get(columns::STATUS).to_lowercase();
    let mut status = if raw.is_empty() {
        ProductStatus::Active
    } else {
        match ProductStatus::parse(&raw) {
            Some(s) => s,
            None => {
                findings.push(BuildFinding::warning(
                    row.row_number,
                    "Status",
                    format!("Unknown status '{}', defaulting to active", raw),
                ));
                ProductStatus::Active
            }
        }
    };
    if let Some(forced) = ctx.status_override {
        status = forced;
    }
    if ctx.broken_titles.contains(title) && status != ProductStatus::Draft {
        warn!(row = row.row_number, title, "商品含失效图片,降级为 draft");
        status = ProductStatus::Draft;
    }
    status
}

/// 逐变体字段向量（长度恒等于变体数）
struct VariantFields {
    price: Vec<String>,
    compare_at: Vec<String>,
    inventory: Vec<String>,
    barcode: Vec<String>,
    grams: Vec<String>,
    weight: Vec<String>,
    weight_unit: Vec<String>,
    requires_shipping: Vec<String>,
    taxable: Vec<String>,
}

fn resolve_variant_fields(
    row: &SheetRow,
    headers: &[String],
    grid: &VariantGrid,
    findings: &mut Vec<BuildFinding>,
) -> VariantFields {
    let (n1, n2, n3) = (grid.n1, grid.n2, grid.n3);
    let row_number = row.row_number;

    let mut cast = |field: &str, raw: &str| -> Vec<String> {
        let (values, warning) = broadcast(&split_pipe(raw), n1, n2, n3);
        if let Some(text) = warning {
            findings.push(BuildFinding::warning(row_number, field, text));
        }
        values
    };

    let price = cast(columns::VARIANT_PRICE, row.get(columns::VARIANT_PRICE));
    let compare_at = cast(
        columns::VARIANT_COMPARE_AT,
        row.get(columns::VARIANT_COMPARE_AT),
    );

    // 库存缺省视为有货
    let inv_raw = {
        let resolved =
            resolve_with_suffix_columns(row, headers, &INVENTORY_FIELD, &grid.dim1_values);
        if resolved.trim().is_empty() {
            "1".to_string()
        } else {
            resolved
        }
    };
    let inventory = cast(columns::VARIANT_INVENTORY, &inv_raw);

    let barcode_raw = resolve_with_suffix_columns(row, headers, &BARCODE_FIELD, &grid.dim1_values);
    let barcode = cast(columns::VARIANT_BARCODE, &barcode_raw);

    // 显式克数优先;空时留给重量 + 单位换算
    let grams_raw = resolve_with_suffix_columns(row, headers, &GRAMS_FIELD, &grid.dim1_values);
    let grams = if grams_raw.trim().is_empty() {
        vec![String::new(); grid.variant_count()]
    } else {
        cast(columns::VARIANT_GRAMS, &grams_raw)
    };

    let weight_raw = resolve_with_suffix_columns(row, headers, &WEIGHT_FIELD, &grid.dim1_values);
    let weight = cast(columns::VARIANT_WEIGHT, &weight_raw);
    let weight_unit = cast(
        columns::VARIANT_WEIGHT_UNIT,
        row.get(columns::VARIANT_WEIGHT_UNIT),
    );

    let coerce_default_true = |values: Vec<String>| -> Vec<String> {
        values
            .into_iter()
            .map(|v| {
                let coerced = coerce_bool_token(&v);
                if coerced.is_empty() { "TRUE" } else { coerced }.to_string()
            })
            .collect()
    };
    let requires_shipping = coerce_default_true(cast(
        columns::VARIANT_REQUIRES_SHIPPING,
        row.get(columns::VARIANT_REQUIRES_SHIPPING),
    ));
    let taxable = coerce_default_true(cast(
        columns::VARIANT_TAXABLE,
        row.get(columns::VARIANT_TAXABLE),
    ));

    VariantFields {
        price,
        compare_at,
        inventory,
        barcode,
        grams,
        weight,
        weight_unit,
        requires_shipping,
        taxable,
    }
}

/// 收集非空图片并按出现顺序重排位置（1 起,最多 8 列）
fn collect_images(row: &SheetRow, handle: &str, title: &str) -> Vec<ImageRef> {
    let mut images = Vec::new();
    for column_index in 1..=8 {
        let url = row.get(&format!("Image URL {}", column_index));
        if url.is_empty() {
            continue;
        }
        images.push(ImageRef {
            handle: handle.to_string(),
            title: title.to_string(),
            row_number: row.row_number,
            position: images.len() + 1,
            url: url.to_string(),
            alt: row.get(&format!("Image Alt {}", column_index)).to_string(),
        });
    }
    images
}
