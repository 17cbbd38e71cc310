// ==========================================
// Shopify 商品批量导入生成系统 - SKU 分配器
// ==========================================
// 职责: 单调递增的 6 位基数分配,每个商品恰好消耗一次递增
// 红线: 显式对象,禁止全局可变状态;按输入行序串行分配,不得并行
// ==========================================

use tracing::debug;

/// 无历史种子时的起始基数
pub const DEFAULT_START_BASE: u32 = 100001;

// ==========================================
// SkuAllocator - 单调 SKU 分配器
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuAllocator {
    next_base: u32,
}

impl SkuAllocator {
    /// 从历史导出种子创建
    ///
    /// seed > 0 时从 seed + 1 起,否则使用缺省起始基数。
    pub fn new(seed: u32) -> Self {
        let next_base = if seed > 0 { seed + 1 } else { DEFAULT_START_BASE };
        debug!(seed, next_base, "SKU 分配器初始化");
        Self { next_base }
    }

    /// 显式覆盖优先于历史种子（配置/命令行）
    pub fn with_override(seed: u32, override_base: Option<u32>) -> Self {
        Self::new(override_base.unwrap_or(seed))
    }

    /// 下一个待分配基数
    pub fn next_base(&self) -> u32 {
        self.next_base
    }

    /// 已分配到的最高基数（尚未分配任何商品时为起点前一位）
    pub fn highest_allocated(&self) -> u32 {
        self.next_base - 1
    }

    /// 为一个商品分配 n 个 SKU
    ///
    /// # 参数
    /// - n: 变体数
    /// - existing: 尊重已有模式下广播到 n 长度的既有 SKU 槽位;
    ///   None 表示全新分配
    ///
    /// # 约定
    /// - n == 1 → `{base:06}`;n > 1 → `{base:06}-01..{base:06}-NN`
    /// - 尊重已有模式: 非空槽位原样保留,仅填空槽;只要填了任一槽,
    ///   该商品消耗恰好一次递增;一个都没填则不消耗
    pub fn allocate(&mut self, n: usize, existing: Option<&[String]>) -> Vec<String> {
        match existing {
            Some(slots) => {
                debug_assert_eq!(slots.len(), n);
                let mut assigned: Vec<String> = slots.to_vec();
                let blanks: Vec<usize> = assigned
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.trim().is_empty())
                    .map(|(i, _)| i)
                    .collect();
                if !blanks.is_empty() {
                    let base = self.next_base;
                    if n == 1 {
                        assigned[0] = format!("{:06}", base);
                    } else {
                        // 空槽按槽位顺序取 01.. 序号
                        for (counter, idx) in blanks.into_iter().enumerate() {
                            assigned[idx] = format!("{:06}-{:02}", base, counter + 1);
                        }
                    }
                    self.next_base += 1;
                }
                assigned
            }
            None => {
                let base = self.next_base;
                self.next_base += 1;
                if n == 1 {
                    vec![format!("{:06}", base)]
                } else {
                    (1..=n).map(|j| format!("{:06}-{:02}", base, j)).collect()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_zero_uses_default_start() {
        let mut alloc = SkuAllocator::new(0);
        assert_eq!(alloc.allocate(1, None), vec!["100001"]);
    }

    #[test]
    fn test_seed_starts_after_highest() {
        let mut alloc = SkuAllocator::new(110374);
        assert_eq!(
            alloc.allocate(3, None),
            vec!["110375-01", "110375-02", "110375-03"]
        );
        assert_eq!(alloc.allocate(1, None), vec!["110376"]);
        assert_eq!(alloc.highest_allocated(), 110376);
    }

    #[test]
    fn test_override_wins_over_seed() {
        let mut alloc = SkuAllocator::with_override(110374, Some(200000));
        assert_eq!(alloc.allocate(1, None), vec!["200001"]);
    }

    #[test]
    fn test_one_increment_per_product_not_per_variant() {
        let mut alloc = SkuAllocator::new(0);
        alloc.allocate(5, None);
        alloc.allocate(2, None);
        // 两个商品 → 两次递增,与变体数无关
        assert_eq!(alloc.next_base(), 100003);
    }

    #[test]
    fn test_respect_existing_fills_only_blanks() {
        let mut alloc = SkuAllocator::new(110000);
        let slots = vec![
            "ABC-1".to_string(),
            String::new(),
            "ABC-3".to_string(),
            "  ".to_string(),
        ];
        let assigned = alloc.allocate(4, Some(&slots));
        assert_eq!(assigned[0], "ABC-1");
        assert_eq!(assigned[1], "110001-01");
        assert_eq!(assigned[2], "ABC-3");
        assert_eq!(assigned[3], "110001-02");
        // 填槽消耗恰好一次递增
        assert_eq!(alloc.next_base(), 110002);
    }

    #[test]
    fn test_respect_existing_full_consumes_nothing() {
        let mut alloc = SkuAllocator::new(110000);
        let slots = vec!["A".to_string(), "B".to_string()];
        let assigned = alloc.allocate(2, Some(&slots));
        assert_eq!(assigned, slots);
        assert_eq!(alloc.next_base(), 110001);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut alloc = SkuAllocator::new(110374);
            let mut all = Vec::new();
            for n in [3usize, 1, 2] {
                all.extend(alloc.allocate(n, None));
            }
            all
        };
        assert_eq!(run(), run());
    }
}
