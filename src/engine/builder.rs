// ==========================================
// Shopify 商品批量导入生成系统 - 目录构建器
// ==========================================
// 职责: 预检通过后的主流程 —— 分配/展开/广播/装配/探测
// 红线: 商品按输入行序串行装配;仅图片探测并发;商品间检查取消令牌
// ==========================================

use crate::domain::catalog_row::CatalogRow;
use crate::domain::issue::BuildFinding;
use crate::domain::product::{ImageRef, ProductStatus};
use crate::engine::assembler::{assemble_product, AssembleContext, HandleRegistry};
use crate::engine::sku_allocator::SkuAllocator;
use crate::probe::{probe_all, ImageProber, ProbeOutcome};
use crate::sheet::{columns, PriorLoad, SheetTable};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// 取消令牌在商品间触发,构建整体作废（不落任何输出文件）
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Build cancelled")]
pub struct BuildCancelled;

// ==========================================
// BuildOptions - 构建参数
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// 保留输入表已有 SKU,仅填空槽
    pub respect_existing_skus: bool,
    /// 构建级状态覆盖（替换所有商品的行级状态）
    pub status_override: Option<ProductStatus>,
    /// 显式起始基数（优先于历史导出种子）
    pub start_base_override: Option<u32>,
    /// 图片探测并发宽度
    pub probe_concurrency: usize,
}

// ==========================================
// BuildCounters - 运行统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildCounters {
    pub products: usize,     // 成功装配的商品数
    pub skipped: usize,      // 被跳过的商品数（空标题/变体超限）
    pub variants: usize,     // 变体行总数
    pub rows: usize,         // 输出行总数（含纯图片行）
    pub images_working: usize,
    pub images_broken: usize,
}

// ==========================================
// BuildOutcome - 构建结果
// ==========================================
#[derive(Debug)]
pub struct BuildOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub rows: Vec<CatalogRow>,
    pub findings: Vec<BuildFinding>,
    pub image_results: Vec<(ImageRef, ProbeOutcome)>,
    /// 构建前的最高已用基数（无历史时为 0）
    pub base_before: u32,
    /// 构建后的最高已用基数
    pub base_after: u32,
    pub counters: BuildCounters,
    pub elapsed_ms: u64,
}

// ==========================================
// CatalogBuilder - 构建主流程
// ==========================================
pub struct CatalogBuilder<'a> {
    prober: &'a dyn ImageProber,
    cancel: CancellationToken,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(prober: &'a dyn ImageProber, cancel: CancellationToken) -> Self {
        Self { prober, cancel }
    }

    /// 执行构建
    ///
    /// # 参数
    /// - table: 规范化输入表（Variant SKU 列会被回填竖线串）
    /// - prior: 历史导出装载结果（SKU 种子 + 标题重复基准）
    /// - broken_titles: 破图放行时需降级 draft 的商品标题
    /// - preflight: 预检阶段的探测结果,按 (行号, URL) 复用,不重复触网
    #[instrument(skip_all, fields(run_id))]
    pub async fn build(
        &self,
        table: &mut SheetTable,
        prior: &PriorLoad,
        broken_titles: &BTreeSet<String>,
        preflight: &[(ImageRef, ProbeOutcome)],
        options: &BuildOptions,
    ) -> Result<BuildOutcome, BuildCancelled> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::Span::current().record("run_id", run_id.to_string());

        // === 步骤 1: SKU 分配器初始化 ===
        debug!("步骤 1: SKU 分配器初始化");
        let seed = prior.highest_base();
        let allocator = SkuAllocator::with_override(seed, options.start_base_override);
        let base_before = allocator.highest_allocated();
        info!(
            seed,
            override_base = ?options.start_base_override,
            base_before,
            "SKU 种子确定"
        );

        // === 步骤 2: 逐行装配 ===
        debug!("步骤 2: 逐行装配");
        table.ensure_column(columns::VARIANT_SKU);
        let headers: Vec<String> = table.headers().to_vec();
        let mut ctx = AssembleContext {
            handles: HandleRegistry::new(),
            allocator,
            respect_existing: options.respect_existing_skus,
            status_override: options.status_override,
            broken_titles,
        };

        let mut rows: Vec<CatalogRow> = Vec::new();
        let mut findings: Vec<BuildFinding> = Vec::new();
        let mut image_refs: Vec<ImageRef> = Vec::new();
        let mut counters = BuildCounters::default();
        let mut sku_fills: Vec<(usize, String)> = Vec::new();

        for (index, row) in table.rows().iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(row = row.row_number, "收到取消信号,构建中止");
                return Err(BuildCancelled);
            }
            let (product, row_findings) = assemble_product(row, &headers, &mut ctx);
            findings.extend(row_findings);
            match product {
                Some(product) => {
                    counters.products += 1;
                    counters.variants += product.variant_count;
                    counters.rows += product.rows.len();
                    sku_fills.push((index, product.sku_pipe.clone()));
                    image_refs.extend(product.images);
                    rows.extend(product.rows);
                }
                None => counters.skipped += 1,
            }
        }
        let base_after = ctx.allocator.highest_allocated();
        info!(
            products = counters.products,
            skipped = counters.skipped,
            variants = counters.variants,
            rows = counters.rows,
            "装配完成"
        );

        // === 步骤 3: SKU 回填输入表 ===
        debug!("步骤 3: SKU 回填输入表");
        for (index, pipe) in sku_fills {
            table.rows_mut()[index].set(columns::VARIANT_SKU, pipe);
        }

        // === 步骤 4: 图片探测 ===
        debug!("步骤 4: 图片探测");
        // 预检已探测过的 URL 直接复用;仅对增量触发探测
        // 预检引用的 position 是原始列号,装配后已重排,联结键用 (行号, URL)
        let known: HashMap<(usize, &str), &ProbeOutcome> = preflight
            .iter()
            .map(|(image, outcome)| ((image.row_number, image.url.as_str()), outcome))
            .collect();
        let mut image_results: Vec<(ImageRef, ProbeOutcome)> =
            Vec::with_capacity(image_refs.len());
        let mut unprobed: Vec<ImageRef> = Vec::new();
        for image in image_refs {
            match known
                .get(&(image.row_number, image.url.as_str()))
                .map(|outcome| (*outcome).clone())
            {
                Some(outcome) => image_results.push((image, outcome)),
                None => unprobed.push(image),
            }
        }
        image_results
            .extend(probe_all(unprobed, self.prober, options.probe_concurrency.max(1)).await);
        image_results.sort_by_key(|(image, _)| (image.row_number, image.position));
        counters.images_working = image_results.iter().filter(|(_, o)| o.ok).count();
        counters.images_broken = image_results.len() - counters.images_working;
        info!(
            working = counters.images_working,
            broken = counters.images_broken,
            "图片探测完成"
        );

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            %run_id,
            base_before,
            base_after,
            elapsed_ms,
            "构建完成"
        );

        Ok(BuildOutcome {
            run_id,
            started_at,
            rows,
            findings,
            image_results,
            base_before,
            base_after,
            counters,
            elapsed_ms,
        })
    }
}
