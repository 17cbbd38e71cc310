// ==========================================
// Shopify 商品批量导入生成系统 - 预检校验器
// ==========================================
// 职责: 逐条运行 101-112 规则并聚合报告
// 约定: 规则彼此独立,检测顺序不影响结果;段落按编码升序输出
// ==========================================

pub mod fix_tips;
pub mod rules;

use crate::domain::issue::{IssueCode, ValidationReport};
use crate::domain::product::ImageRef;
use crate::probe::ProbeOutcome;
use crate::sheet::{columns, PriorLoad, SheetTable};
use tracing::{debug, info};

pub use fix_tips::build_fix_tips;

/// 收集输入表中的全部图片引用（Image URL 1..8,非空才计入）
///
/// 预检阶段 handle 尚未分配,引用以 (行号, 位置) 为键;
/// title 仅用于报告展示。
pub fn collect_image_refs(table: &SheetTable) -> Vec<ImageRef> {
    let mut refs = Vec::new();
    for row in table.rows() {
        for position in 1..=8 {
            let url = row.get(&format!("Image URL {}", position));
            if url.is_empty() {
                continue;
            }
            refs.push(ImageRef {
                handle: String::new(),
                title: row.get(columns::TITLE).to_string(),
                row_number: row.row_number,
                position,
                url: url.to_string(),
                alt: row.get(&format!("Image Alt {}", position)).to_string(),
            });
        }
    }
    refs
}

/// 运行全部预检规则并聚合
///
/// # 参数
/// - table: 规范化输入表
/// - prior: 历史导出装载结果
/// - probes: 图片探测结果（探测先于规则运行;101 为纯函数）
pub fn validate(
    table: &SheetTable,
    prior: &PriorLoad,
    probes: &[(ImageRef, ProbeOutcome)],
) -> ValidationReport {
    let mut report = ValidationReport {
        product_count: table.product_count(),
        ..ValidationReport::default()
    };

    // 固定规则清单,逐条无条件运行
    let findings = [
        rules::rule_broken_images(probes),
        rules::rule_duplicate_titles(table, prior),
        rules::rule_prior_export(prior),
        rules::rule_blank_import(table),
        rules::rule_mandatory_missing(table),
        rules::rule_seo_missing(table),
        rules::rule_body_missing(table),
        rules::rule_invalid_price(table),
        rules::rule_bad_handle(table),
        rules::rule_option_mismatch(table),
        rules::rule_seo_overlong(table),
        rules::rule_placeholder_body(table),
    ];

    let mut sections: Vec<(IssueCode, String)> = Vec::new();
    for finding in findings.into_iter().flatten() {
        for (code, text) in finding.sections {
            report.codes.insert(code);
            sections.push((code, text));
        }
        report.broken_titles.extend(finding.broken_titles);
    }

    // 段落按编码升序（集合语义,检测顺序无关）
    sections.sort_by_key(|(code, _)| *code);
    report.sections = sections.into_iter().map(|(_, text)| text).collect();

    if report.is_clean() {
        info!(products = report.product_count, "预检通过");
    } else {
        info!(
            products = report.product_count,
            codes = ?report.codes.iter().map(|c| c.code()).collect::<Vec<_>>(),
            "预检发现问题"
        );
    }
    debug!(sections = report.sections.len(), "预检段落聚合完成");

    report
}

/// 输入表无法读取时的保底报告（编码 104）
pub fn unreadable_input_report(sheet_name: &str, path: &str, error: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.codes.insert(IssueCode::InputUnreadable);
    report.sections.push(format!(
        "Error 104: Blank/Unreadable Import Sheet\nCannot read sheet '{}' in '{}'.\n\n{}",
        sheet_name, path, error
    ));
    report
}

/// 渲染人读报告: 商品数 + 段落 + 分隔线 + 修复提示
pub fn render_report(report: &ValidationReport) -> String {
    let mut parts = vec![format!(
        "Products found (non-empty Title*): {}",
        report.product_count
    )];
    parts.extend(report.sections.iter().cloned());
    let mut text = parts.join("\n\n");
    if !report.codes.is_empty() {
        let tips = build_fix_tips(&report.codes);
        if !tips.is_empty() {
            text.push_str("\n\n");
            text.push_str(&"—".repeat(60));
            text.push('\n');
            text.push_str(&tips);
        }
    }
    text
}
