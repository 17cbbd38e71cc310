// ==========================================
// 构建流水线集成测试
// ==========================================
// 测试目标: CatalogApi::build 端到端（预检 → 装配 → 六类输出落盘）
// ==========================================


use shopify_import_gen::api::{BuildRequest, CatalogApi};
use shopify_import_gen::config::AppConfig;
use shopify_import_gen::engine::{BuildOptions, CatalogBuilder};
use shopify_import_gen::probe::probe_all;
use shopify_import_gen::sheet::{PriorLoad, UniversalSheetParser};
use shopify_import_gen::validator;
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::TempDir;
use test_helpers::{clean_sheet_csv, prev_export_csv, write_csv_fixture, MockImageProber};
use tokio_util::sync::CancellationToken;

fn offline_api() -> CatalogApi {
    CatalogApi::new(AppConfig::default(), true)
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

#[tokio::test]
async fn test_three_variant_build_end_to_end() {
    let input = write_csv_fixture(&clean_sheet_csv());
    let out = TempDir::new().unwrap();
    let summary = offline_api()
        .build(input.path(), None, out.path(), &BuildRequest::default())
        .await
        .unwrap();

    assert_eq!(summary.outcome.counters.products, 1);
    assert_eq!(summary.outcome.counters.variants, 3);

    // 主导入: 表头 + 3 变体行,固定值与递增 SKU 全部就位
    let lines = read_lines(&summary.import_csv);
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("premium-shirt,Premium Shirt,"));
    assert!(lines[1].contains(",100001-01,"));
    assert!(lines[3].contains(",100001-03,"));
    assert!(lines[1].contains(",shopify,1000,deny,manual,19.99,"));
    assert!(lines[1].contains(",S,"));
    assert!(lines[3].contains(",L,"));

    // 库存导出: 每变体 × 缺省库位一行,有货 → On hand (new) = 1000
    let inv = read_lines(&summary.inventory_csv);
    assert_eq!(inv.len(), 4);
    assert!(inv[1].contains(",Default,"));
    assert!(inv[1].ends_with(",0,0,0,0,0,1000"));

    // 干净输入: 校验报告仅表头,无历史导出则无标题对照
    assert_eq!(read_lines(&summary.validation_csv).len(), 1);
    assert!(summary.title_matches_csv.is_none());

    // 输入表回写: SKU 竖线串回填
    let roundtrip = read_lines(&summary.input_with_skus_csv);
    assert!(roundtrip[1].contains("100001-01|100001-02|100001-03"));
}

#[tokio::test]
async fn test_build_output_is_deterministic() {
    let input = write_csv_fixture(&clean_sheet_csv());
    let out_a = TempDir::new().unwrap();
    let out_b = TempDir::new().unwrap();

    let first = offline_api()
        .build(input.path(), None, out_a.path(), &BuildRequest::default())
        .await
        .unwrap();
    let second = offline_api()
        .build(input.path(), None, out_b.path(), &BuildRequest::default())
        .await
        .unwrap();

    assert_eq!(
        std::fs::read(&first.import_csv).unwrap(),
        std::fs::read(&second.import_csv).unwrap()
    );
    assert_eq!(
        std::fs::read(&first.inventory_csv).unwrap(),
        std::fs::read(&second.inventory_csv).unwrap()
    );
}

#[tokio::test]
async fn test_prev_export_seeds_bases_and_writes_title_matches() {
    let input = write_csv_fixture(&clean_sheet_csv());
    let prev = write_csv_fixture(&prev_export_csv());
    let out = TempDir::new().unwrap();
    let summary = offline_api()
        .build(input.path(), Some(prev.path()), out.path(), &BuildRequest::default())
        .await
        .unwrap();

    // 历史最高基数 110374 → 本次从 110375 起
    assert_eq!(summary.outcome.rows[0].variant_sku, "110375-01");
    assert_eq!(summary.outcome.rows[2].variant_sku, "110375-03");

    // 历史导出装载成功即写对照表;无共同标题则仅表头
    let matches_csv = summary.title_matches_csv.expect("title matches missing");
    let lines = read_lines(&matches_csv);
    assert_eq!(lines, vec!["Title,In Previous Count,In Input Count"]);
}

#[tokio::test]
async fn test_explicit_start_base_beats_prev_seed() {
    let input = write_csv_fixture(&clean_sheet_csv());
    let prev = write_csv_fixture(&prev_export_csv());
    let out = TempDir::new().unwrap();
    let request = BuildRequest {
        start_base_override: Some(500000),
        ..BuildRequest::default()
    };
    let summary = offline_api()
        .build(input.path(), Some(prev.path()), out.path(), &request)
        .await
        .unwrap();
    // 覆盖值按已用最高基数处理,分配从其后一位开始
    assert_eq!(summary.outcome.rows[0].variant_sku, "500001-01");
}

#[tokio::test]
async fn test_respect_existing_skus_keeps_full_rows_and_allocates_rest() {
    let input = write_csv_fixture(
        "Title*,Vendor*,Variant Price*,Body (HTML),Option1 Name,Option1 Values,Variant SKU\n\
Shirt,Acme,9.99,A sturdy cotton shirt with reinforced stitching.,Size,S|M|L,KEEP-1|KEEP-2|KEEP-3\n\
Scarf,Acme,14.99,A thick knitted scarf for cold weather days.,,,\n",
    );
    let out = TempDir::new().unwrap();
    let request = BuildRequest {
        respect_existing_skus: true,
        ..BuildRequest::default()
    };
    let summary = offline_api()
        .build(input.path(), None, out.path(), &request)
        .await
        .unwrap();

    let skus: Vec<&str> = summary
        .outcome
        .rows
        .iter()
        .map(|r| r.variant_sku.as_str())
        .collect();
    // 全槽已有 SKU 不消耗基数;后续商品仍从缺省基数分配
    assert_eq!(skus, vec!["KEEP-1", "KEEP-2", "KEEP-3", "100001"]);

    let roundtrip = read_lines(&summary.input_with_skus_csv);
    assert!(roundtrip[1].contains("KEEP-1|KEEP-2|KEEP-3"));
    assert!(roundtrip[2].contains("100001"));
}

#[tokio::test]
async fn test_two_by_two_grid_with_positional_barcodes() {
    let input = write_csv_fixture(
        "Title*,Vendor*,Variant Price*,Body (HTML),Option1 Name,Option1 Values,Option2 Name,Option2 Values,Variant Barcode (EAN/UPC)\n\
Shirt,Acme,9.99,A sturdy cotton shirt with reinforced stitching.,Size,S|M,Color,Red|Blue,b1|b2|b3|b4\n",
    );
    let out = TempDir::new().unwrap();
    let summary = offline_api()
        .build(input.path(), None, out.path(), &BuildRequest::default())
        .await
        .unwrap();

    assert_eq!(summary.outcome.counters.variants, 4);
    let combos: Vec<(String, String, String)> = summary
        .outcome
        .rows
        .iter()
        .map(|r| {
            (
                r.option1_value.clone(),
                r.option2_value.clone(),
                r.variant_barcode.clone(),
            )
        })
        .collect();
    // 维度一主序: S/Red, S/Blue, M/Red, M/Blue
    assert_eq!(
        combos,
        vec![
            ("S".into(), "Red".into(), "b1".into()),
            ("S".into(), "Blue".into(), "b2".into()),
            ("M".into(), "Red".into(), "b3".into()),
            ("M".into(), "Blue".into(), "b4".into()),
        ]
    );
}

#[tokio::test]
async fn test_builder_with_mock_prober_reports_broken_images() {
    let input = write_csv_fixture(
        "Title*,Vendor*,Variant Price*,Body (HTML),Image URL 1,Image URL 2\n\
Shirt,Acme,9.99,A sturdy cotton shirt with reinforced stitching.,https://cdn.example.com/ok.jpg,https://cdn.example.com/dead.jpg\n",
    );
    let mut table = UniversalSheetParser
        .parse(input.path(), Some("Products"))
        .unwrap();
    let prior = PriorLoad::resolve(None);
    let prober = MockImageProber::broken(&["https://cdn.example.com/dead.jpg"]);

    // 预检侧: 失效 URL 折叠为 101,商品入降级名单
    let refs = validator::collect_image_refs(&table);
    let probes = probe_all(refs, &prober, 4).await;
    let report = validator::validate(&table, &prior, &probes);
    assert!(report.broken_titles.contains("Shirt"));

    // 构建侧: 名单内商品降级 draft,预检结论直接复用
    let builder = CatalogBuilder::new(&prober, CancellationToken::new());
    let outcome = builder
        .build(
            &mut table,
            &prior,
            &report.broken_titles,
            &probes,
            &BuildOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.rows[0].status, "draft");
    assert_eq!(outcome.counters.images_working, 1);
    assert_eq!(outcome.counters.images_broken, 1);
    // 两个 URL 各探测一次,构建阶段不再触发
    assert_eq!(prober.call_count(), 2);

    // 图片报告: Working / Not Working 逐 URL 对齐
    let broken = outcome
        .image_results
        .iter()
        .find(|(image, _)| image.url.ends_with("dead.jpg"))
        .map(|(_, probe)| probe.ok);
    assert_eq!(broken, Some(false));
}
