// ==========================================
// Shopify 商品批量导入生成系统 - 配置层
// ==========================================
// 职责: 可选 JSON 配置文件装载,缺省值兜底
// 覆写顺序: 命令行 > 配置文件 > 缺省值（命令行合并在 api/main 层）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn default_sheet_name() -> String {
    "Products".to_string()
}

fn default_in_stock_qty() -> i64 {
    1000
}

fn default_probe_timeout_secs() -> u64 {
    8
}

fn default_probe_concurrency() -> usize {
    8
}

// ==========================================
// AppConfig - 应用配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Excel 工作簿中的工作表名
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// 输出目录（命令行 --outdir 优先）
    #[serde(default)]
    pub outdir: Option<PathBuf>,

    /// 库存库位清单,首个为主库位;空列表按单库位 "Default" 处理
    #[serde(default)]
    pub locations: Vec<String>,

    /// 有货变体在主库位的入库量
    #[serde(default = "default_in_stock_qty")]
    pub in_stock_qty: i64,

    /// 单次图片探测超时（秒）
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// 图片探测并发宽度
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,

    /// 显式 SKU 起始基数（优先于历史导出种子）
    #[serde(default)]
    pub start_base: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheet_name: default_sheet_name(),
            outdir: None,
            locations: Vec::new(),
            in_stock_qty: default_in_stock_qty(),
            probe_timeout_secs: default_probe_timeout_secs(),
            probe_concurrency: default_probe_concurrency(),
            start_base: None,
        }
    }
}

impl AppConfig {
    /// 平台缺省配置文件路径（如 ~/.config/shopify-import-gen/config.json）
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shopify-import-gen").join("config.json"))
    }

    /// 从显式路径装载;文件不存在或解析失败记 warn 并回退缺省值
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), "配置文件已装载");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "配置文件解析失败,使用缺省配置");
                    AppConfig::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置文件读取失败,使用缺省配置");
                AppConfig::default()
            }
        }
    }

    /// 装载: 显式路径 > 平台缺省路径（存在才读）> 缺省值
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => AppConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sheet_name, "Products");
        assert_eq!(config.in_stock_qty, 1000);
        assert_eq!(config.probe_timeout_secs, 8);
        assert_eq!(config.probe_concurrency, 8);
        assert!(config.locations.is_empty());
        assert!(config.start_base.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"{"sheet_name":"Catalog","locations":["Main","Outlet"],"start_base":120000}"#)
            .unwrap();
        let config = AppConfig::load(f.path());
        assert_eq!(config.sheet_name, "Catalog");
        assert_eq!(config.locations, vec!["Main", "Outlet"]);
        assert_eq!(config.start_base, Some(120000));
        // 未给字段取缺省值
        assert_eq!(config.in_stock_qty, 1000);
    }

    #[test]
    fn test_bad_json_falls_back() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"not json").unwrap();
        let config = AppConfig::load(f.path());
        assert_eq!(config.sheet_name, "Products");
    }
}
