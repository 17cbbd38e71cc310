// ==========================================
// Shopify 商品批量导入生成系统 - 离线图片探测器
// ==========================================
// 用途: 无网络环境（--offline）的降级启发式
// 判定: URL 路径以已知图片扩展名结尾即视为可用,说明中注明降级
// ==========================================

use crate::probe::{is_url, looks_like_image_url, ImageProber, ProbeOutcome};
use async_trait::async_trait;

pub struct OfflineImageProber;

const OFFLINE_NOTE: &str = "offline mode; only extension check";

#[async_trait]
impl ImageProber for OfflineImageProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let url = url.trim();
        if !is_url(url) {
            return ProbeOutcome::broken("Not a URL");
        }
        ProbeOutcome {
            ok: looks_like_image_url(url),
            note: OFFLINE_NOTE.to_string(),
        }
    }
}
