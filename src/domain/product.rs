// ==========================================
// Shopify 商品批量导入生成系统 - 商品领域模型
// ==========================================
// 依据: Shopify 商品 CSV 批量导入格式（flat file）
// 依据: 商品维护模板（Products 工作表列约定）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// OptionDimension - 规格维度
// ==========================================
// 用途: Option1/2/3 Name + Values 列解析结果
// 约定: 维度一名称缺省为 "Title";取值为空时折叠为 "Default Title"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDimension {
    pub name: String,        // 维度名称（如 Size / Color）
    pub values: Vec<String>, // 维度取值（竖线列表拆分后）
}

impl OptionDimension {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// 维度是否参与组合（名称与取值均非空）
    pub fn is_active(&self) -> bool {
        !self.name.trim().is_empty() && !self.values.is_empty()
    }

    /// 参与笛卡尔积的基数（未激活维度贡献单个空值）
    pub fn cardinality(&self) -> usize {
        if self.is_active() {
            self.values.len()
        } else {
            1
        }
    }
}

// ==========================================
// VariantCombo - 变体组合
// ==========================================
// 用途: 笛卡尔积展开的单个变体（维度一为主序）
// 约定: 未激活维度对应空串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCombo {
    pub option1: String,
    pub option2: String,
    pub option3: String,
}

// ==========================================
// ProductStatus - 商品上架状态
// ==========================================
// 对齐: Shopify Status 列合法取值 active/draft/archived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    Active,
    Draft,
    Archived,
}

impl ProductStatus {
    /// 解析输入列取值（大小写不敏感,两侧空白忽略）;非法值返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(ProductStatus::Active),
            "draft" => Some(ProductStatus::Draft),
            "archived" => Some(ProductStatus::Archived),
            _ => None,
        }
    }

    /// 输出文件中的小写形式
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Draft => "draft",
            ProductStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// ImageRef - 图片引用
// ==========================================
// 用途: 探测与装配之间的共享引用
// 约定: (handle, position) 为联结键;position 从 1 起
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub handle: String,    // 商品 handle（slug 化并唯一化之后）
    pub title: String,     // 商品标题（报告展示用）
    pub row_number: usize, // 来源表格行号（行 2 = 第一条数据）
    pub position: usize,   // 图片位置（1 起,最多 8）
    pub url: String,       // 图片 URL
    pub alt: String,       // 替代文本（可为空）
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_cardinality() {
        let dim = OptionDimension::new("Size", vec!["S".into(), "M".into()]);
        assert!(dim.is_active());
        assert_eq!(dim.cardinality(), 2);

        // 名称为空 → 未激活,基数 1
        let dim = OptionDimension::new("", vec!["S".into()]);
        assert!(!dim.is_active());
        assert_eq!(dim.cardinality(), 1);

        // 取值为空 → 未激活
        let dim = OptionDimension::new("Color", vec![]);
        assert!(!dim.is_active());
        assert_eq!(dim.cardinality(), 1);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(ProductStatus::parse(" Active "), Some(ProductStatus::Active));
        assert_eq!(ProductStatus::parse("DRAFT"), Some(ProductStatus::Draft));
        assert_eq!(ProductStatus::parse("archived"), Some(ProductStatus::Archived));
        assert_eq!(ProductStatus::parse("live"), None);
        assert_eq!(ProductStatus::parse(""), None);
    }
}
