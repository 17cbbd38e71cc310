// ==========================================
// Shopify 商品批量导入生成系统 - 目录流水线 API
// ==========================================
// 职责: 预检与构建两大入口;CLI 与测试统一走这里
// 红线: 构建必先预检并执行放行策略;部分输出不落盘
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::AppConfig;
use crate::domain::issue::{IssueCode, ValidationReport};
use crate::domain::product::ProductStatus;
use crate::engine::{BuildOptions, BuildOutcome, CatalogBuilder};
use crate::export;
use crate::probe::{probe_all, HttpImageProber, ImageProber, OfflineImageProber};
use crate::sheet::{PriorLoad, SheetTable, UniversalSheetParser};
use crate::validator;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

// ==========================================
// BuildRequest - 构建入口参数
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// 保留输入表已有 SKU,仅填空槽
    pub respect_existing_skus: bool,
    /// 仅剩 101（破图）时仍放行构建
    pub proceed_despite_broken_images: bool,
    /// 构建级状态覆盖
    pub status_override: Option<ProductStatus>,
    /// 显式 SKU 起始基数（优先于配置与历史导出）
    pub start_base_override: Option<u32>,
}

// ==========================================
// BuildSummary - 构建总结
// ==========================================
#[derive(Debug)]
pub struct BuildSummary {
    pub report: ValidationReport,
    pub outcome: BuildOutcome,
    pub import_csv: PathBuf,
    pub inventory_csv: PathBuf,
    pub validation_csv: PathBuf,
    pub image_report_csv: PathBuf,
    /// 仅在历史导出装载成功时写出
    pub title_matches_csv: Option<PathBuf>,
    pub input_with_skus_csv: PathBuf,
}

// ==========================================
// CatalogApi - 流水线门面
// ==========================================
pub struct CatalogApi {
    config: AppConfig,
    offline: bool,
    cancel: CancellationToken,
}

impl CatalogApi {
    pub fn new(config: AppConfig, offline: bool) -> Self {
        Self {
            config,
            offline,
            cancel: CancellationToken::new(),
        }
    }

    /// 取消令牌句柄（Ctrl-C 联动）
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn prober(&self) -> Box<dyn ImageProber> {
        if self.offline {
            Box::new(OfflineImageProber)
        } else {
            Box::new(HttpImageProber::new(self.config.probe_timeout_secs))
        }
    }

    /// 预检: 装载 → 探测 → 12 条规则聚合
    ///
    /// 输入不可读不是 API 错误,折叠为编码 104 的报告。
    #[instrument(skip(self))]
    pub async fn validate(&self, input: &Path, prev: Option<&Path>) -> ValidationReport {
        let sheet_name = self.config.sheet_name.as_str();
        let table = match UniversalSheetParser.parse(input, Some(sheet_name)) {
            Ok(table) => table,
            Err(e) => {
                warn!(input = %input.display(), error = %e, "输入表装载失败");
                return validator::unreadable_input_report(
                    sheet_name,
                    &input.display().to_string(),
                    &e.to_string(),
                );
            }
        };

        let prior = PriorLoad::resolve(prev);
        let refs = validator::collect_image_refs(&table);
        let prober = self.prober();
        let probes = probe_all(refs, prober.as_ref(), self.config.probe_concurrency).await;
        validator::validate(&table, &prior, &probes)
    }

    /// 构建: 预检 → 放行策略 → 装配 → 全部输出落盘
    #[instrument(skip(self, request))]
    pub async fn build(
        &self,
        input: &Path,
        prev: Option<&Path>,
        outdir: &Path,
        request: &BuildRequest,
    ) -> ApiResult<BuildSummary> {
        let sheet_name = self.config.sheet_name.as_str();

        // === 步骤 1: 装载与预检 ===
        let mut table: SheetTable = match UniversalSheetParser.parse(input, Some(sheet_name)) {
            Ok(table) => table,
            Err(e) => {
                let report = validator::unreadable_input_report(
                    sheet_name,
                    &input.display().to_string(),
                    &e.to_string(),
                );
                return Err(ApiError::blocked(report));
            }
        };
        let prior = PriorLoad::resolve(prev);
        let prober = self.prober();
        let refs = validator::collect_image_refs(&table);
        let probes = probe_all(refs, prober.as_ref(), self.config.probe_concurrency).await;
        let report = validator::validate(&table, &prior, &probes);

        // === 步骤 2: 放行策略 ===
        if !report.can_proceed(request.proceed_despite_broken_images) {
            return Err(ApiError::blocked(report));
        }
        if report.codes.contains(&IssueCode::BrokenImageLink) {
            warn!(
                affected = report.broken_titles.len(),
                "破图放行: 受影响商品将降级为 draft"
            );
        }

        // === 步骤 3: 构建 ===
        let options = BuildOptions {
            respect_existing_skus: request.respect_existing_skus,
            status_override: request.status_override,
            start_base_override: request.start_base_override.or(self.config.start_base),
            probe_concurrency: self.config.probe_concurrency,
        };
        let builder = CatalogBuilder::new(prober.as_ref(), self.cancel.clone());
        let outcome = builder
            .build(&mut table, &prior, &report.broken_titles, &probes, &options)
            .await?;

        // === 步骤 4: 输出落盘 ===
        export::ensure_outdir(outdir)?;
        let import_csv = export::write_import_csv(outdir, &outcome.rows)?;
        let inventory_csv = export::write_inventory_export(
            outdir,
            &outcome.rows,
            &self.config.locations,
            self.config.in_stock_qty,
        )?;
        let validation_csv = export::write_validation_report(outdir, &outcome.findings)?;
        let image_report_csv =
            export::write_image_report(outdir, &outcome.image_results, &outcome.rows)?;
        let title_matches_csv = match prior.as_loaded() {
            Some(prior_export) => Some(export::write_title_matches(outdir, &table, prior_export)?),
            None => None,
        };
        let input_with_skus_csv = export::write_input_with_skus(outdir, &table)?;

        info!(
            run_id = %outcome.run_id,
            products = outcome.counters.products,
            variants = outcome.counters.variants,
            rows = outcome.counters.rows,
            base_before = outcome.base_before,
            base_after = outcome.base_after,
            images_working = outcome.counters.images_working,
            images_broken = outcome.counters.images_broken,
            elapsed_ms = outcome.elapsed_ms,
            outdir = %outdir.display(),
            "构建总结"
        );

        Ok(BuildSummary {
            report,
            outcome,
            import_csv,
            inventory_csv,
            validation_csv,
            image_report_csv,
            title_matches_csv,
            input_with_skus_csv,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, TempDir};

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn api() -> CatalogApi {
        // 离线探测器,测试不触网
        CatalogApi::new(AppConfig::default(), true)
    }

    const CLEAN_SHEET: &str = "Title*,Vendor*,Variant Price*,Body (HTML)\n\
Shirt,Acme,9.99,A sturdy cotton shirt with reinforced stitching.\n";

    #[tokio::test]
    async fn test_validate_clean_sheet() {
        let f = write_csv(CLEAN_SHEET);
        let report = api().validate(f.path(), None).await;
        assert!(report.is_clean());
        assert_eq!(report.product_count, 1);
    }

    #[tokio::test]
    async fn test_validate_missing_input_is_code_104() {
        let report = api()
            .validate(Path::new("/no/such/input.csv"), None)
            .await;
        assert!(report.codes.contains(&IssueCode::InputUnreadable));
    }

    #[tokio::test]
    async fn test_build_blocked_on_findings() {
        let f = write_csv("Title*,Vendor*,Variant Price*,Body (HTML)\nShirt,,0,Filler body text long enough to pass.\n");
        let out = TempDir::new().unwrap();
        let err = api()
            .build(f.path(), None, out.path(), &BuildRequest::default())
            .await
            .unwrap_err();
        match err {
            ApiError::ValidationBlocked { codes, .. } => {
                assert!(codes.contains(&105));
                assert!(codes.contains(&108));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // 阻断时不落任何输出
        assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_build_writes_all_outputs() {
        let f = write_csv(CLEAN_SHEET);
        let out = TempDir::new().unwrap();
        let summary = api()
            .build(f.path(), None, out.path(), &BuildRequest::default())
            .await
            .unwrap();

        assert!(summary.import_csv.exists());
        assert!(summary.inventory_csv.exists());
        assert!(summary.validation_csv.exists());
        assert!(summary.image_report_csv.exists());
        assert!(summary.title_matches_csv.is_none());
        assert!(summary.input_with_skus_csv.exists());
        assert_eq!(summary.outcome.counters.products, 1);
        assert_eq!(summary.outcome.rows[0].variant_sku, "100001");
    }

    #[tokio::test]
    async fn test_build_broken_image_override_demotes_to_draft() {
        let f = write_csv(
            "Title*,Vendor*,Variant Price*,Body (HTML),Image URL 1\n\
Shirt,Acme,9.99,A sturdy cotton shirt with reinforced stitching.,https://cdn.example.com/a.pdf\n",
        );
        let out = TempDir::new().unwrap();

        // 无放行标志 → 101 阻断
        let err = api()
            .build(f.path(), None, out.path(), &BuildRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationBlocked { ref codes, .. } if codes == &vec![101]));

        // 显式放行 → 构建通过,受影响商品降级 draft
        let request = BuildRequest {
            proceed_despite_broken_images: true,
            ..BuildRequest::default()
        };
        let summary = api()
            .build(f.path(), None, out.path(), &request)
            .await
            .unwrap();
        assert_eq!(summary.outcome.rows[0].status, "draft");
        assert_eq!(summary.outcome.counters.images_broken, 1);
    }
}
