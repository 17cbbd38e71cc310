// ==========================================
// Shopify 商品批量导入生成系统 - 字段广播器
// ==========================================
// 职责: 把商品级标量/竖线列表/按后缀列的取值展开到变体网格
// 红线: 精度顺序是契约 —— 总数精确匹配 > 空 > 单值 > 单维 > 双维 > 修复
// 约定: 输出长度恒等于 n1*n2*n3;修复（重复末值/截断）必伴随警告
// ==========================================

use crate::sheet::SheetRow;
use once_cell::sync::Lazy;
use regex::Regex;

/// 后缀列表头拆分: 前缀与尺码后缀之间的首个分隔符段（空格/下划线/连字符）
static SUFFIX_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ _-]+").unwrap());

/// 竖线拆分: trim 每段,剔除空段（空白单元格得空列表）
pub fn split_pipe(cell: &str) -> Vec<String> {
    if cell.trim().is_empty() {
        return Vec::new();
    }
    cell.split('|')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// 把取值列表广播到 n1×n2×n3 变体网格
///
/// 精度顺序（先匹配者胜,歧义重叠如 n1 == n2 也按此序裁决）:
/// 1. len == total → 按位使用
/// 2. len == 0 → 全空串
/// 3. len == 1 → 复制
/// 4/5/6. len == n1 / n2 / n3 → 仅随该维度变化
/// 7/8/9. len == n1*n2 / n1*n3 / n2*n3（另一维 > 1）→ 随两维变化
/// 10. 其余 → 修复（重复末值或截断）并返回警告文本
pub fn broadcast(
    values: &[String],
    n1: usize,
    n2: usize,
    n3: usize,
) -> (Vec<String>, Option<String>) {
    let total = n1 * n2 * n3;
    let len = values.len();

    if len == total {
        return (values.to_vec(), None);
    }
    if len == 0 {
        return (vec![String::new(); total], None);
    }
    if len == 1 {
        return (vec![values[0].clone(); total], None);
    }

    // 单维匹配
    if len == n1 {
        return (by_index(values, n1, n2, n3, |i, _, _| i), None);
    }
    if len == n2 {
        return (by_index(values, n1, n2, n3, |_, j, _| j), None);
    }
    if len == n3 {
        return (by_index(values, n1, n2, n3, |_, _, k| k), None);
    }

    // 双维匹配（第三维 > 1 才有歧义价值,否则已被 total 精确匹配覆盖）
    if len == n1 * n2 && n3 > 1 {
        return (by_index(values, n1, n2, n3, move |i, j, _| i * n2 + j), None);
    }
    if len == n1 * n3 && n2 > 1 {
        return (by_index(values, n1, n2, n3, move |i, _, k| i * n3 + k), None);
    }
    if len == n2 * n3 && n1 > 1 {
        return (by_index(values, n1, n2, n3, move |_, j, k| j * n3 + k), None);
    }

    // 兜底修复: 不足重复末值,超出截断
    let warning = format!(
        "Count mismatch for broadcasting: have {}, expected 1, {}, {}, {}, {}, {}, {}, or {}. Repeating/truncating.",
        len,
        n1,
        n2,
        n3,
        n1 * n2,
        n1 * n3,
        n2 * n3,
        total
    );
    let mut repaired = values.to_vec();
    if repaired.len() < total {
        let last = repaired.last().cloned().unwrap_or_default();
        repaired.resize(total, last);
    } else {
        repaired.truncate(total);
    }
    (repaired, Some(warning))
}

/// 按 (i, j, k) → 源下标 的映射展开网格
fn by_index<F>(values: &[String], n1: usize, n2: usize, n3: usize, index: F) -> Vec<String>
where
    F: Fn(usize, usize, usize) -> usize,
{
    let mut out = Vec::with_capacity(n1 * n2 * n3);
    for i in 0..n1 {
        for j in 0..n2 {
            for k in 0..n3 {
                out.push(values[index(i, j, k)].clone());
            }
        }
    }
    out
}

// ==========================================
// 按后缀列解析（barcode / weight / grams / inventory）
// ==========================================
// 运营可以不用一条竖线列表,而是提供 "Barcode 50"、"Barcode_52"
// 这样的按尺码列;尺码后缀与维度一取值对齐。

/// 支持后缀列的字段定义
#[derive(Debug, Clone, Copy)]
pub struct SuffixField {
    /// 规范列名（非空时直接使用,短路后缀扫描）
    pub canonical: &'static str,
    /// 后缀列前缀（小写比对）
    pub prefix: &'static str,
    /// 不参与后缀扫描的列名（规范名及其别名）
    pub excluded: &'static [&'static str],
}

pub const BARCODE_FIELD: SuffixField = SuffixField {
    canonical: "Variant Barcode (EAN/UPC)",
    prefix: "barcode",
    excluded: &["Variant Barcode (EAN/UPC)", "Variant Barcode"],
};

pub const WEIGHT_FIELD: SuffixField = SuffixField {
    canonical: "Variant Weight",
    prefix: "weight",
    excluded: &["Variant Weight", "Variant Weight Unit (g,kg,lb,oz)", "Variant Weight Unit"],
};

pub const GRAMS_FIELD: SuffixField = SuffixField {
    canonical: "Variant Grams",
    prefix: "grams",
    excluded: &["Variant Grams"],
};

pub const INVENTORY_FIELD: SuffixField = SuffixField {
    canonical: "Variant Inventory",
    prefix: "inventory",
    excluded: &["Variant Inventory"],
};

/// 解析带后缀列回退的字段,返回喂给 broadcast 的原始竖线串
///
/// 规范列非空 → 原样返回;否则扫描后缀列,按维度一取值顺序拼出
/// 竖线串（未命中的后缀补空串）;两者皆无 → 空串。
pub fn resolve_with_suffix_columns(
    row: &SheetRow,
    headers: &[String],
    field: &SuffixField,
    dim1_values: &[String],
) -> String {
    let canonical = row.get(field.canonical);
    if !canonical.is_empty() {
        return canonical.to_string();
    }
    if dim1_values.is_empty() {
        return String::new();
    }

    // 后缀 → 取值
    let mut per_suffix: Vec<(String, String)> = Vec::new();
    for header in headers {
        let name = header.trim();
        if !name.to_lowercase().starts_with(field.prefix) {
            continue;
        }
        if field.excluded.iter().any(|ex| *ex == name) {
            continue;
        }
        let value = row.get(name);
        if value.is_empty() {
            continue;
        }
        let mut parts = SUFFIX_SPLIT_RE.splitn(name, 2);
        let _prefix = parts.next();
        let Some(suffix) = parts.next() else { continue };
        let suffix = suffix.trim().to_lowercase();
        if suffix.is_empty() {
            continue;
        }
        per_suffix.push((suffix, value.to_string()));
    }

    if per_suffix.is_empty() {
        return String::new();
    }

    let resolved: Vec<String> = dim1_values
        .iter()
        .map(|size| {
            let key = size.trim().to_lowercase();
            per_suffix
                .iter()
                .find(|(suffix, _)| *suffix == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        })
        .collect();
    resolved.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::SheetRow;
    use std::collections::HashMap;

    fn vals(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_pipe() {
        assert_eq!(split_pipe("a|b | c"), vals(&["a", "b", "c"]));
        assert_eq!(split_pipe(" a || b "), vals(&["a", "b"]));
        assert!(split_pipe("").is_empty());
        assert!(split_pipe("   ").is_empty());
    }

    #[test]
    fn test_exact_total_passthrough() {
        let (out, warn) = broadcast(&vals(&["a", "b", "c", "d"]), 2, 2, 1);
        assert_eq!(out, vals(&["a", "b", "c", "d"]));
        assert!(warn.is_none());
    }

    #[test]
    fn test_empty_and_scalar() {
        let (out, _) = broadcast(&[], 2, 3, 1);
        assert_eq!(out, vec![String::new(); 6]);

        let (out, _) = broadcast(&vals(&["9.99"]), 3, 1, 1);
        assert_eq!(out, vals(&["9.99", "9.99", "9.99"]));
    }

    #[test]
    fn test_dim1_blocks() {
        // len == n1: 每个 dim1 值重复 n2*n3 次
        let (out, warn) = broadcast(&vals(&["x", "y"]), 2, 2, 1);
        assert_eq!(out, vals(&["x", "x", "y", "y"]));
        assert!(warn.is_none());
    }

    #[test]
    fn test_dim2_cycles() {
        let (out, _) = broadcast(&vals(&["r", "b", "g"]), 2, 3, 1);
        assert_eq!(out, vals(&["r", "b", "g", "r", "b", "g"]));
    }

    #[test]
    fn test_dim3_innermost() {
        let (out, _) = broadcast(&vals(&["p", "q"]), 3, 1, 2);
        // len==n1(3)? 否,len=2;len==n3(2) → 随 dim3 变化
        assert_eq!(out, vals(&["p", "q", "p", "q", "p", "q"]));
    }

    #[test]
    fn test_precedence_n1_wins_over_n2_tie() {
        // n1 == n2 == 2: 规则 4 先于规则 5
        let (out, _) = broadcast(&vals(&["x", "y"]), 2, 2, 2);
        assert_eq!(out, vals(&["x", "x", "x", "x", "y", "y", "y", "y"]));
    }

    #[test]
    fn test_pairwise_dim12() {
        let (out, _) = broadcast(&vals(&["a", "b", "c", "d"]), 2, 2, 2);
        assert_eq!(out, vals(&["a", "a", "b", "b", "c", "c", "d", "d"]));
    }

    #[test]
    fn test_pairwise_dim13() {
        let (out, _) = broadcast(&vals(&["a", "b", "c", "d"]), 2, 3, 2);
        // len=4=n1*n3,n2>1 → (i,k) 索引,跨 dim2 复制
        assert_eq!(
            out,
            vals(&["a", "b", "a", "b", "a", "b", "c", "d", "c", "d", "c", "d"])
        );
    }

    #[test]
    fn test_pairwise_dim23() {
        // n1=2, n2=3, n3=4: len=12 仅与 n2*n3 匹配 → 跨 dim1 复制
        let values: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        let (out, warn) = broadcast(&values, 2, 3, 4);
        assert!(warn.is_none());
        assert_eq!(out.len(), 24);
        assert_eq!(&out[..12], &values[..]);
        assert_eq!(&out[12..], &values[..]);
    }

    #[test]
    fn test_repair_short_repeats_last() {
        let (out, warn) = broadcast(&vals(&["a", "b"]), 3, 1, 1);
        // len=2 不匹配 1/3 → 修复
        assert_eq!(out, vals(&["a", "b", "b"]));
        let warn = warn.unwrap();
        assert!(warn.contains("have 2"));
        assert!(warn.contains("Repeating/truncating"));
    }

    #[test]
    fn test_repair_long_truncates() {
        let (out, warn) = broadcast(&vals(&["a", "b", "c", "d", "e"]), 3, 1, 1);
        assert_eq!(out, vals(&["a", "b", "c"]));
        assert!(warn.is_some());
    }

    #[test]
    fn test_output_length_invariant() {
        for len in 0..10usize {
            let values: Vec<String> = (0..len).map(|i| i.to_string()).collect();
            let (out, _) = broadcast(&values, 2, 3, 1);
            assert_eq!(out.len(), 6, "len={}", len);
        }
    }

    fn row_with(pairs: &[(&str, &str)]) -> SheetRow {
        let cells: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SheetRow::new(2, cells)
    }

    #[test]
    fn test_suffix_canonical_short_circuits() {
        let row = row_with(&[
            ("Variant Barcode (EAN/UPC)", "111|222"),
            ("Barcode 50", "999"),
        ]);
        let headers = vec![
            "Variant Barcode (EAN/UPC)".to_string(),
            "Barcode 50".to_string(),
        ];
        let raw = resolve_with_suffix_columns(&row, &headers, &BARCODE_FIELD, &vals(&["50", "52"]));
        assert_eq!(raw, "111|222");
    }

    #[test]
    fn test_suffix_columns_align_to_dim1() {
        let row = row_with(&[("Barcode 50", "111"), ("Barcode_54", "333")]);
        let headers = vec!["Barcode 50".to_string(), "Barcode_54".to_string()];
        let raw = resolve_with_suffix_columns(
            &row,
            &headers,
            &BARCODE_FIELD,
            &vals(&["50", "52", "54"]),
        );
        // 未命中的 52 补空串
        assert_eq!(raw, "111||333");
    }

    #[test]
    fn test_suffix_case_insensitive_prefix_and_value() {
        let row = row_with(&[("INVENTORY XL", "0")]);
        let headers = vec!["INVENTORY XL".to_string()];
        let raw =
            resolve_with_suffix_columns(&row, &headers, &INVENTORY_FIELD, &vals(&["xl", "XXL"]));
        assert_eq!(raw, "0|");
    }

    #[test]
    fn test_suffix_excludes_unit_column() {
        let row = row_with(&[("Variant Weight Unit (g,kg,lb,oz)", "kg")]);
        let headers = vec!["Variant Weight Unit (g,kg,lb,oz)".to_string()];
        let raw = resolve_with_suffix_columns(&row, &headers, &WEIGHT_FIELD, &vals(&["50"]));
        assert_eq!(raw, "");
    }
}
