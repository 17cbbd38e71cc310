// ==========================================
// Shopify 商品批量导入生成系统 - 预检规则实现
// ==========================================
// 职责: 101-112 每条规则一个纯函数,互相独立,可单测
// 约定: 规则永不中断扫描;命不命中只取决于表格/历史导出/探测结果
// 红线: 段落标题与明细行格式是对外契约,不得改动
// ==========================================

use crate::domain::issue::{IssueCode, RuleFinding};
use crate::domain::product::ImageRef;
use crate::probe::ProbeOutcome;
use crate::sheet::prior::normalize_title;
use crate::sheet::{columns, PriorLoad, SheetTable};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static PRICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap());
static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());
static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PUNCT_ONLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-–—•\s]+$").unwrap());

/// 占位文本黑名单（小写比对）
const PLACEHOLDER_TOKENS: [&str; 6] = [
    "lorem ipsum",
    "placeholder",
    "coming soon",
    "tbd",
    "to be decided",
    "to be defined",
];

// ==========================================
// 判定谓词
// ==========================================

/// 价格 token 合法性: 纯数字（可带小数）,严格 > 0,不接受货币符号/逗号
pub fn is_valid_positive_price_token(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() || !PRICE_RE.is_match(s) {
        return false;
    }
    s.parse::<f64>().map(|v| v > 0.0).unwrap_or(false)
}

/// handle 合法性: 小写字母数字段,单连字符分隔,≤ 255;空串合法（可自动生成）
pub fn is_valid_handle(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return true;
    }
    s.len() <= 255 && HANDLE_RE.is_match(s)
}

/// 描述是否形如占位文本
///
/// 命中条件（剥离 HTML 标签与常见实体、折叠空白之后）:
/// - 净文本 < 20 字符
/// - 含黑名单 token（lorem ipsum / tbd / coming soon 等）
/// - 仅剩标点/连字符/项目符号
/// 空白描述由 107 负责,这里返回 false。
pub fn looks_like_placeholder_body(body: &str) -> bool {
    let t = body.trim().to_lowercase();
    let t = HTML_TAG_RE.replace_all(&t, "");
    let t = t.replace("&nbsp;", " ").replace("&#160;", " ");
    let t = WHITESPACE_RE.replace_all(&t, " ");
    let t = t.trim();
    if t.is_empty() {
        return false;
    }
    if t.chars().count() < 20 {
        return true;
    }
    if PLACEHOLDER_TOKENS.iter().any(|tok| t.contains(tok)) {
        return true;
    }
    PUNCT_ONLY_RE.is_match(t)
}

/// 明细行截断: 超过 cap 行时追加 "... and N more row(s)"
fn capped_section(header: &str, lines: &[String], cap: usize) -> String {
    let shown = lines.iter().take(cap).cloned().collect::<Vec<_>>().join("\n");
    let more = if lines.len() > cap {
        format!("\n  ... and {} more row(s)", lines.len() - cap)
    } else {
        String::new()
    };
    format!("{}\n{}{}", header, shown, more)
}

// ==========================================
// 规则 101: 图片链接失效
// ==========================================
// 输入为探测结果（探测在规则之前完成）,规则本身是纯函数
pub fn rule_broken_images(probes: &[(ImageRef, ProbeOutcome)]) -> Option<RuleFinding> {
    let mut lines = Vec::new();
    let mut broken_titles = BTreeSet::new();

    for (image, outcome) in probes {
        if outcome.ok {
            continue;
        }
        lines.push(format!(
            "- [{}] {} => {} ({})",
            image.position, image.title, image.url, outcome.note
        ));
        if !image.title.trim().is_empty() {
            broken_titles.insert(image.title.trim().to_string());
        }
    }

    if lines.is_empty() {
        return None;
    }
    let mut finding = RuleFinding::section(
        IssueCode::BrokenImageLink,
        capped_section("Error 101: Broken Image Link", &lines, 200),
    );
    finding.broken_titles = broken_titles;
    Some(finding)
}

// ==========================================
// 规则 102: 标题重复（表内 + 与历史导出重复,两个段落）
// ==========================================
pub fn rule_duplicate_titles(table: &SheetTable, prior: &PriorLoad) -> Option<RuleFinding> {
    let mut finding = RuleFinding::default();
    if !table.has_column(columns::TITLE) {
        return None;
    }

    // 表内重复（大小写不敏感,trim 后比对;展示用首次出现的写法）
    let mut counts: BTreeMap<String, (String, usize)> = BTreeMap::new();
    for row in table.rows() {
        let title = row.get(columns::TITLE);
        if title.is_empty() {
            continue;
        }
        let entry = counts
            .entry(normalize_title(title))
            .or_insert_with(|| (title.to_string(), 0));
        entry.1 += 1;
    }
    let dup_inside: Vec<String> = counts
        .values()
        .filter(|(_, n)| *n > 1)
        .map(|(display, n)| format!("- {} (x{})", display, n))
        .collect();
    if !dup_inside.is_empty() {
        finding.sections.push((
            IssueCode::DuplicateTitle,
            format!(
                "Error 102: Duplicate Titles in Template\n{}",
                dup_inside.join("\n")
            ),
        ));
    }

    // 与历史导出重复
    if let Some(prior) = prior.as_loaded() {
        let mut dup_against: BTreeSet<String> = BTreeSet::new();
        for row in table.rows() {
            let title = row.get(columns::TITLE);
            if !title.is_empty() && prior.has_title(&normalize_title(title)) {
                dup_against.insert(format!("- {}", title));
            }
        }
        if !dup_against.is_empty() {
            let lines: Vec<String> = dup_against.into_iter().take(50).collect();
            finding.sections.push((
                IssueCode::DuplicateTitle,
                format!(
                    "Error 102: Titles already exist in Previous Export\n{}",
                    lines.join("\n")
                ),
            ));
        }
    }

    if finding.is_empty() {
        None
    } else {
        Some(finding)
    }
}

// ==========================================
// 规则 103 / 104: 历史导出状态
// ==========================================
// 104: 路径不存在或文件为空;103: 可读但无可解析 SKU 基数
pub fn rule_prior_export(prior: &PriorLoad) -> Option<RuleFinding> {
    match prior {
        PriorLoad::None => None,
        PriorLoad::Missing(_) => Some(RuleFinding::section(
            IssueCode::InputUnreadable,
            "Error 104: Previous Export not found\n- The selected file path does not exist."
                .to_string(),
        )),
        PriorLoad::Unreadable { message, .. } => Some(RuleFinding::section(
            IssueCode::PrevExportNoSku,
            format!("Error 103: Unable to read Previous Export\n- {}", message),
        )),
        PriorLoad::Loaded(prior) => {
            if prior.is_empty() {
                Some(RuleFinding::section(
                    IssueCode::InputUnreadable,
                    "Error 104: Blank/Empty Previous Export\n- The selected previous export file has no rows."
                        .to_string(),
                ))
            } else if prior.highest_base == 0 {
                Some(RuleFinding::section(
                    IssueCode::PrevExportNoSku,
                    "Error 103: Unable to find Highest SKU\n- 'Variant SKU' column missing or contains no valid 6-digit base like 110357/110357-01."
                        .to_string(),
                ))
            } else {
                None
            }
        }
    }
}

// ==========================================
// 规则 104: 输入表为空
// ==========================================
pub fn rule_blank_import(table: &SheetTable) -> Option<RuleFinding> {
    if table.is_empty() || table.product_count() == 0 {
        Some(RuleFinding::section(
            IssueCode::InputUnreadable,
            "Error 104: Blank/Empty Import\n- The input sheet has no products with non-empty Title*."
                .to_string(),
        ))
    } else {
        None
    }
}

// ==========================================
// 规则 105: 必填字段缺失
// ==========================================
pub fn rule_mandatory_missing(table: &SheetTable) -> Option<RuleFinding> {
    let mandatory = [columns::TITLE, columns::VENDOR, columns::VARIANT_PRICE];
    let mut lines = Vec::new();

    let missing_cols: Vec<&str> = mandatory
        .iter()
        .copied()
        .filter(|c| !table.has_column(c))
        .collect();
    if !missing_cols.is_empty() {
        lines.push(format!(
            "- Missing required column(s): {}",
            missing_cols.join(", ")
        ));
    } else {
        for col in mandatory {
            let rows: Vec<String> = table
                .rows()
                .iter()
                .filter(|r| r.get(col).is_empty())
                .map(|r| r.row_number.to_string())
                .collect();
            if !rows.is_empty() {
                lines.push(format!("- Missing {} on rows: {}", col, rows.join(", ")));
            }
        }
    }

    if lines.is_empty() {
        return None;
    }
    Some(RuleFinding::section(
        IssueCode::MandatoryMissing,
        format!("Error 105: Mandatory fields missing\n{}", lines.join("\n")),
    ))
}

// ==========================================
// 规则 106: SEO 字段存在但留空
// ==========================================
pub fn rule_seo_missing(table: &SheetTable) -> Option<RuleFinding> {
    let present: Vec<&str> = [columns::SEO_TITLE, columns::SEO_DESCRIPTION]
        .into_iter()
        .filter(|c| table.has_column(c))
        .collect();
    if present.is_empty() {
        return None; // SEO 列属可选,整列缺失不报
    }

    let lines: Vec<String> = table
        .rows()
        .iter()
        .filter(|r| present.iter().any(|c| r.get(c).is_empty()))
        .map(|r| format!("- Row {}: {}", r.row_number, r.get(columns::TITLE)))
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(RuleFinding::section(
        IssueCode::SeoFieldEmpty,
        capped_section(
            "Error 106: Missing SEO Title/Description on rows",
            &lines,
            40,
        ),
    ))
}

// ==========================================
// 规则 107: 有标题但描述为空
// ==========================================
pub fn rule_body_missing(table: &SheetTable) -> Option<RuleFinding> {
    if !table.has_column(columns::TITLE) || !table.has_column(columns::BODY_HTML) {
        return None;
    }
    let lines: Vec<String> = table
        .rows()
        .iter()
        .filter(|r| !r.get(columns::TITLE).is_empty() && r.get(columns::BODY_HTML).is_empty())
        .map(|r| format!("- Row {}: {}", r.row_number, r.get(columns::TITLE)))
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(RuleFinding::section(
        IssueCode::DescriptionMissing,
        capped_section("Error 107: Missing Body (HTML) on rows", &lines, 40),
    ))
}

// ==========================================
// 规则 108: 价格非正数
// ==========================================
// 空白价格归 105,此处只看非空 token
pub fn rule_invalid_price(table: &SheetTable) -> Option<RuleFinding> {
    if !table.has_column(columns::VARIANT_PRICE) {
        return None;
    }
    let lines: Vec<String> = table
        .rows()
        .iter()
        .filter(|r| {
            let s = r.get(columns::VARIANT_PRICE);
            !s.is_empty() && !is_valid_positive_price_token(s)
        })
        .map(|r| {
            format!(
                "- Row {}: {} — price='{}'",
                r.row_number,
                r.get(columns::TITLE),
                r.get(columns::VARIANT_PRICE)
            )
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(RuleFinding::section(
        IssueCode::PriceInvalid,
        capped_section("Error 108: Invalid Price", &lines, 60),
    ))
}

// ==========================================
// 规则 109: handle 格式非法
// ==========================================
pub fn rule_bad_handle(table: &SheetTable) -> Option<RuleFinding> {
    if !table.has_column(columns::HANDLE) {
        return None;
    }
    let lines: Vec<String> = table
        .rows()
        .iter()
        .filter(|r| !is_valid_handle(r.get(columns::HANDLE)))
        .map(|r| {
            format!(
                "- Row {}: {} — handle='{}'",
                r.row_number,
                r.get(columns::TITLE),
                r.get(columns::HANDLE)
            )
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(RuleFinding::section(
        IssueCode::HandleInvalid,
        capped_section("Error 109: Bad Handle Format", &lines, 60),
    ))
}

// ==========================================
// 规则 110: Option1 名称与取值不成对（异或）
// ==========================================
pub fn rule_option_mismatch(table: &SheetTable) -> Option<RuleFinding> {
    if !table.has_column(columns::OPTION1_NAME) && !table.has_column(columns::OPTION1_VALUES) {
        return None;
    }
    let lines: Vec<String> = table
        .rows()
        .iter()
        .filter(|r| {
            let has_name = !r.get(columns::OPTION1_NAME).is_empty();
            let has_vals = !r.get(columns::OPTION1_VALUES).is_empty();
            has_name ^ has_vals
        })
        .map(|r| {
            format!(
                "- Row {}: Title='{}'  Option1 Name='{}'  Option1 Values='{}'",
                r.row_number,
                r.get(columns::TITLE),
                r.get(columns::OPTION1_NAME),
                r.get(columns::OPTION1_VALUES)
            )
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(RuleFinding::section(
        IssueCode::OptionMismatch,
        capped_section("Error 110: Variant Options Mismatch (Option1)", &lines, 60),
    ))
}

// ==========================================
// 规则 111: SEO 字段超长
// ==========================================
pub fn rule_seo_overlong(table: &SheetTable) -> Option<RuleFinding> {
    if !table.has_column(columns::SEO_TITLE) && !table.has_column(columns::SEO_DESCRIPTION) {
        return None;
    }
    let lines: Vec<String> = table
        .rows()
        .iter()
        .filter_map(|r| {
            let title_len = r.get(columns::SEO_TITLE).chars().count();
            let desc_len = r.get(columns::SEO_DESCRIPTION).chars().count();
            if title_len > 60 || desc_len > 320 {
                Some(format!(
                    "- Row {}: Title='{}'  SEO Title len={}  SEO Description len={}",
                    r.row_number,
                    r.get(columns::TITLE),
                    title_len,
                    desc_len
                ))
            } else {
                None
            }
        })
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(RuleFinding::section(
        IssueCode::SeoFieldOverlong,
        capped_section(
            "Error 111: SEO Length Limits (Title > 60 or Description > 320)",
            &lines,
            60,
        ),
    ))
}

// ==========================================
// 规则 112: 描述过短或为占位文本
// ==========================================
pub fn rule_placeholder_body(table: &SheetTable) -> Option<RuleFinding> {
    if !table.has_column(columns::BODY_HTML) {
        return None;
    }
    let lines: Vec<String> = table
        .rows()
        .iter()
        .filter(|r| {
            let body = r.get(columns::BODY_HTML);
            !body.is_empty() && looks_like_placeholder_body(body)
        })
        .map(|r| format!("- Row {}: {}", r.row_number, r.get(columns::TITLE)))
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(RuleFinding::section(
        IssueCode::PlaceholderBody,
        capped_section("Error 112: Very Short/Placeholder Description", &lines, 60),
    ))
}
