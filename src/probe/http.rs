// ==========================================
// Shopify 商品批量导入生成系统 - HTTP 图片探测器
// ==========================================
// 流程: HEAD（跟随重定向）→ 405 时改 GET → 状态码 + Content-Type 判定
// 约定: 非 2xx 即视为失效;传输异常折叠为 not ok + 异常文本
// ==========================================

use crate::probe::{is_url, ImageProber, ProbeOutcome};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tracing::debug;

pub struct HttpImageProber {
    client: Client,
}

impl HttpImageProber {
    /// # 参数
    /// - timeout_secs: 单次探测超时（默认 8 秒）
    pub fn new(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpImageProber {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl ImageProber for HttpImageProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let url = url.trim();
        if !is_url(url) {
            return ProbeOutcome::broken("Not a URL");
        }

        // HEAD 优先;部分 CDN 不支持 HEAD（405）时退回 GET
        let response = match self.client.request(Method::HEAD, url).send().await {
            Ok(resp) if resp.status() == StatusCode::METHOD_NOT_ALLOWED => {
                debug!(url, "HEAD 返回 405,改用 GET 重试");
                match self.client.get(url).send().await {
                    Ok(resp) => resp,
                    Err(e) => return ProbeOutcome::broken(format!("Error: {}", e)),
                }
            }
            Ok(resp) => resp,
            Err(e) => return ProbeOutcome::broken(format!("Error: {}", e)),
        };

        if !response.status().is_success() {
            return ProbeOutcome::broken(format!("HTTP {}", response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        if !content_type.contains("image") {
            return ProbeOutcome::broken(format!("Content-Type '{}' not image", content_type));
        }

        ProbeOutcome::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_url_short_circuits_without_network() {
        let prober = HttpImageProber::default();
        let outcome = prober.probe("not a link").await;
        assert!(!outcome.ok);
        assert_eq!(outcome.note, "Not a URL");

        let outcome = prober.probe("file:///tmp/a.jpg").await;
        assert_eq!(outcome.note, "Not a URL");
    }
}
