// ==========================================
// Shopify 商品批量导入生成系统 - 图片探测层
// ==========================================
// 职责: 校验图片 URL 可达性与内容类型
// 约定: 探测是纯读取,结果以 (handle/行号, 位置) 回联,不改动商品行
// ==========================================

// 模块声明
pub mod http;
pub mod offline;

use crate::domain::product::ImageRef;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

// 重导出实现
pub use http::HttpImageProber;
pub use offline::OfflineImageProber;

/// URL 形态: http/https 协议头（大小写不敏感）
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

/// 图片扩展名启发式（离线模式与修复提示共用口径）
static IMAGE_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|tiff?)($|\?)").unwrap());

pub fn is_url(s: &str) -> bool {
    URL_RE.is_match(s.trim())
}

pub fn looks_like_image_url(s: &str) -> bool {
    IMAGE_EXT_RE.is_match(s.trim())
}

// ==========================================
// ProbeOutcome - 单条探测结论
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub ok: bool,
    /// 结论说明: OK / Not a URL / HTTP {status} / Content-Type ... / Error: ...
    pub note: String,
}

impl ProbeOutcome {
    pub fn ok() -> Self {
        Self {
            ok: true,
            note: "OK".to_string(),
        }
    }

    pub fn broken(note: impl Into<String>) -> Self {
        Self {
            ok: false,
            note: note.into(),
        }
    }
}

// ==========================================
// ImageProber - 探测器接口
// ==========================================
#[async_trait]
pub trait ImageProber: Send + Sync {
    /// 探测单个 URL
    ///
    /// # 返回
    /// - ProbeOutcome: 永不失败,异常折叠为 not ok + 说明
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// 有界并发批量探测
///
/// 每个 URL 一个任务,buffer_unordered 限宽;结果按 (行号, 位置)
/// 归一到输入顺序,下游消费不受完成顺序影响。
pub async fn probe_all(
    refs: Vec<ImageRef>,
    prober: &dyn ImageProber,
    concurrency: usize,
) -> Vec<(ImageRef, ProbeOutcome)> {
    let concurrency = concurrency.max(1);
    debug!(total = refs.len(), concurrency, "开始批量图片探测");

    let mut results: Vec<(ImageRef, ProbeOutcome)> = stream::iter(refs)
        .map(|image| async move {
            let outcome = prober.probe(&image.url).await;
            (image, outcome)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    results.sort_by_key(|(image, _)| (image.row_number, image.position));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProber;

    #[async_trait]
    impl ImageProber for FixedProber {
        async fn probe(&self, url: &str) -> ProbeOutcome {
            if url.ends_with(".jpg") {
                ProbeOutcome::ok()
            } else {
                ProbeOutcome::broken("Not a URL")
            }
        }
    }

    fn image(row: usize, position: usize, url: &str) -> ImageRef {
        ImageRef {
            handle: String::new(),
            title: format!("P{}", row),
            row_number: row,
            position,
            url: url.to_string(),
            alt: String::new(),
        }
    }

    #[test]
    fn test_url_predicates() {
        assert!(is_url("https://cdn.example.com/a.jpg"));
        assert!(is_url("HTTP://x.y/z"));
        assert!(!is_url("ftp://x.y/z"));
        assert!(!is_url("C:\\images\\a.jpg"));

        assert!(looks_like_image_url("https://x/a.JPG"));
        assert!(looks_like_image_url("https://x/a.webp?v=2"));
        assert!(looks_like_image_url("https://x/a.tif"));
        assert!(!looks_like_image_url("https://x/a.pdf"));
    }

    #[tokio::test]
    async fn test_probe_all_restores_input_order() {
        let refs = vec![
            image(2, 1, "https://x/a.jpg"),
            image(2, 2, "https://x/b.pdf"),
            image(3, 1, "https://x/c.jpg"),
        ];
        let results = probe_all(refs, &FixedProber, 2).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.row_number, 2);
        assert_eq!(results[0].0.position, 1);
        assert!(results[0].1.ok);
        assert!(!results[1].1.ok);
        assert_eq!(results[2].0.row_number, 3);
    }
}
