// ==========================================
// Shopify 商品批量导入生成系统 - 历史导出快照
// ==========================================
// 职责: 读取上一次平台导出,提供 SKU 基数种子与标题重复检测
// 约定: 'Variant SKU' 列行 2 优先（平台导出新品在前）
// ==========================================

use crate::sheet::error::SheetResult;
use crate::sheet::parser::UniversalSheetParser;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 严格 SKU 形态: 6 位基数 + 可选 2 位变体序号
static STRICT_SKU_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{6})(?:-(\d{2}))?$").unwrap());

/// 剔除 Excel 风格的前导撇号与两侧空白
///
/// 例: `'110374` / `’110374` → `110374`
pub fn clean_sku_text(s: &str) -> &str {
    s.trim()
        .trim_start_matches('\'')
        .trim_start_matches('’')
        .trim()
}

/// SKU 匹配 `^\d{6}(-\d{2})?$` 时返回 6 位基数,否则 None
pub fn extract_base6(s: &str) -> Option<u32> {
    let cleaned = clean_sku_text(s);
    STRICT_SKU_RE
        .captures(cleaned)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// ==========================================
// PriorExport - 历史导出快照
// ==========================================
#[derive(Debug, Clone)]
pub struct PriorExport {
    pub path: PathBuf,
    /// 最高可解析 6 位基数;0 = 未找到
    pub highest_base: u32,
    pub row_count: usize,
    /// 规范化标题 → (首次出现的原始写法, 出现次数)
    title_counts: HashMap<String, (String, usize)>,
}

/// 标题规范化口径: trim + 小写（102 重复检测与标题对照报告共用）
pub fn normalize_title(s: &str) -> String {
    s.trim().to_lowercase()
}

impl PriorExport {
    /// 读取历史导出（CSV 或 Excel 第一个工作表）
    pub fn load<P: AsRef<Path>>(path: P) -> SheetResult<Self> {
        let path = path.as_ref();
        let table = UniversalSheetParser.parse(path, None)?;

        // SKU 基数: 首个非空单元格（行 2 优先）能解析则取之,否则整列取最大
        let mut highest_base = 0u32;
        if table.has_column("Variant SKU") {
            let cells: Vec<&str> = table.rows().iter().map(|r| r.get("Variant SKU")).collect();
            let top_cell = cells.iter().find(|v| !v.is_empty());
            if let Some(top) = top_cell {
                if let Some(base) = extract_base6(top) {
                    highest_base = base;
                }
            }
            if highest_base == 0 {
                highest_base = cells
                    .iter()
                    .filter_map(|v| extract_base6(v))
                    .max()
                    .unwrap_or(0);
            }
        }

        // 标题计数（'Title' 列,规范化后聚合）
        let mut title_counts: HashMap<String, (String, usize)> = HashMap::new();
        if table.has_column("Title") {
            for row in table.rows() {
                let title = row.get("Title");
                if title.is_empty() {
                    continue;
                }
                let entry = title_counts
                    .entry(normalize_title(title))
                    .or_insert_with(|| (title.to_string(), 0));
                entry.1 += 1;
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            highest_base,
            row_count: table.rows().len(),
            title_counts,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// 规范化标题是否已存在于历史导出
    pub fn has_title(&self, normalized: &str) -> bool {
        self.title_counts.contains_key(normalized)
    }

    /// 规范化标题在历史导出中的出现次数
    pub fn title_count(&self, normalized: &str) -> usize {
        self.title_counts.get(normalized).map(|(_, n)| *n).unwrap_or(0)
    }
}

// ==========================================
// PriorLoad - 历史导出装载结果
// ==========================================
// 约定: 路径不存在/不可读本身是校验发现（104/103）,不是流程中断
#[derive(Debug, Clone)]
pub enum PriorLoad {
    /// 未提供历史导出
    None,
    /// 提供了路径但文件不存在
    Missing(PathBuf),
    /// 文件存在但无法读取
    Unreadable { path: PathBuf, message: String },
    /// 装载成功
    Loaded(PriorExport),
}

impl PriorLoad {
    /// 装载可选的历史导出路径
    pub fn resolve(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return PriorLoad::None;
        };
        if !path.exists() {
            return PriorLoad::Missing(path.to_path_buf());
        }
        match PriorExport::load(path) {
            Ok(prior) => PriorLoad::Loaded(prior),
            Err(e) => PriorLoad::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        }
    }

    pub fn as_loaded(&self) -> Option<&PriorExport> {
        match self {
            PriorLoad::Loaded(prior) => Some(prior),
            _ => None,
        }
    }

    /// 校验通过后用于播种分配器的基数
    pub fn highest_base(&self) -> u32 {
        self.as_loaded().map(|p| p.highest_base).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_extract_base6() {
        assert_eq!(extract_base6("110374"), Some(110374));
        assert_eq!(extract_base6("110374-02"), Some(110374));
        assert_eq!(extract_base6("'110374"), Some(110374));
        assert_eq!(extract_base6("’110374-01 "), Some(110374));
        assert_eq!(extract_base6("11037"), None);
        assert_eq!(extract_base6("110374-3"), None);
        assert_eq!(extract_base6("SKU-110374"), None);
        assert_eq!(extract_base6(""), None);
    }

    #[test]
    fn test_row2_priority() {
        let f = write_csv("Title,Variant SKU\nNewest,110380-01\nOlder,110390\n");
        let prior = PriorExport::load(f.path()).unwrap();
        // 行 2 可解析,即使后面有更大的基数也取行 2
        assert_eq!(prior.highest_base, 110380);
    }

    #[test]
    fn test_column_max_fallback() {
        let f = write_csv("Title,Variant SKU\nNewest,not-a-sku\nOlder,110390\nOldest,110350-02\n");
        let prior = PriorExport::load(f.path()).unwrap();
        assert_eq!(prior.highest_base, 110390);
    }

    #[test]
    fn test_no_parsable_base() {
        let f = write_csv("Title,Variant SKU\nA,abc\nB,\n");
        let prior = PriorExport::load(f.path()).unwrap();
        assert_eq!(prior.highest_base, 0);
        assert!(!prior.is_empty());
    }

    #[test]
    fn test_title_counts() {
        let f = write_csv("Title,Variant SKU\nShirt,110001\nSHIRT ,110001-01\nScarf,110002\n");
        let prior = PriorExport::load(f.path()).unwrap();
        assert_eq!(prior.title_count("shirt"), 2);
        assert!(prior.has_title("scarf"));
        assert!(!prior.has_title("hat"));
    }

    #[test]
    fn test_prior_load_missing_path() {
        let load = PriorLoad::resolve(Some(Path::new("/no/such/prev.csv")));
        assert!(matches!(load, PriorLoad::Missing(_)));
        assert_eq!(load.highest_base(), 0);
    }
}
