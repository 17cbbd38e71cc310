// ==========================================
// Shopify 商品批量导入生成系统 - 校验问题模型
// ==========================================
// 用途: 预检规则编码(101-112)与构建期问题记录
// 红线: 编码数值与报告文案是对外契约,不得改动
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ==========================================
// IssueLevel - 问题级别
// ==========================================
// 对齐: validation_report.csv 的 level 列取值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueLevel {
    Error,   // 错误（商品被拒绝或字段缺失）
    Warning, // 警告（已自动修复,需人工复核）
    Info,    // 提示（仅记录）
}

impl IssueLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueLevel::Error => "error",
            IssueLevel::Warning => "warning",
            IssueLevel::Info => "info",
        }
    }
}

// ==========================================
// BuildFinding - 构建期问题记录
// ==========================================
// 用途: 构建阶段逐行问题（广播修复、变体超限、状态非法等）
// 对齐: validation_report.csv 的 (level,row,field,message) 四列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFinding {
    pub level: IssueLevel, // 问题级别
    pub row_number: usize, // 原始表格行号（行 2 = 第一条数据）
    pub field: String,     // 相关列名
    pub message: String,   // 问题描述（英文,面向运营）
}

impl BuildFinding {
    pub fn error(row_number: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            row_number,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn warning(row_number: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            row_number,
            field: field.into(),
            message: message.into(),
        }
    }
}

// ==========================================
// IssueCode - 预检规则编码
// ==========================================
// 编码固定为 101-112,报告按编码升序输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueCode {
    BrokenImageLink = 101,    // 图片链接失效
    DuplicateTitle = 102,     // 标题重复（表内或与历史导出重复）
    PrevExportNoSku = 103,    // 历史导出无可解析 SKU 基数
    InputUnreadable = 104,    // 输入/历史导出为空或不可读
    MandatoryMissing = 105,   // 必填字段缺失
    SeoFieldEmpty = 106,      // SEO 字段存在但留空
    DescriptionMissing = 107, // 有标题但描述为空
    PriceInvalid = 108,       // 价格非正数
    HandleInvalid = 109,      // handle 格式非法
    OptionMismatch = 110,     // Option1 名称与取值不成对
    SeoFieldOverlong = 111,   // SEO 字段超长
    PlaceholderBody = 112,    // 描述过短或为占位文本
}

impl IssueCode {
    /// 数值编码（对外契约）
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// 全部编码,升序
    pub fn all() -> [IssueCode; 12] {
        [
            IssueCode::BrokenImageLink,
            IssueCode::DuplicateTitle,
            IssueCode::PrevExportNoSku,
            IssueCode::InputUnreadable,
            IssueCode::MandatoryMissing,
            IssueCode::SeoFieldEmpty,
            IssueCode::DescriptionMissing,
            IssueCode::PriceInvalid,
            IssueCode::HandleInvalid,
            IssueCode::OptionMismatch,
            IssueCode::SeoFieldOverlong,
            IssueCode::PlaceholderBody,
        ]
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// RuleFinding - 单条规则聚合结果
// ==========================================
// 约定: 一条规则可产出多个报告段落（如 102 表内重复 + 与历史导出重复）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFinding {
    pub sections: Vec<(IssueCode, String)>, // (编码, 报告段落文本)
    pub broken_titles: BTreeSet<String>,    // 101 专用: 受影响商品标题（已 trim）
}

impl RuleFinding {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(code: IssueCode, text: String) -> Self {
        Self {
            sections: vec![(code, text)],
            broken_titles: BTreeSet::new(),
        }
    }
}

// ==========================================
// ValidationReport - 预检报告
// ==========================================
// 约定: codes 为集合语义,段落按编码升序;检测顺序不影响结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub codes: BTreeSet<IssueCode>,      // 命中的规则编码集合
    pub sections: Vec<String>,           // 报告段落（按编码升序）
    pub broken_titles: BTreeSet<String>, // 101 受影响商品标题
    pub product_count: usize,            // 非空 Title* 行数
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.codes.is_empty()
    }

    /// 放行判定: 无任何编码,或仅剩 101 且调用方显式允许带破图继续
    pub fn can_proceed(&self, allow_broken_images: bool) -> bool {
        if self.codes.is_empty() {
            return true;
        }
        allow_broken_images
            && self
                .codes
                .iter()
                .all(|c| *c == IssueCode::BrokenImageLink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_code_values() {
        assert_eq!(IssueCode::BrokenImageLink.code(), 101);
        assert_eq!(IssueCode::PlaceholderBody.code(), 112);
        assert_eq!(IssueCode::BrokenImageLink.to_string(), "101");
    }

    #[test]
    fn test_issue_codes_ordered() {
        let all = IssueCode::all();
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_proceed_policy() {
        let mut report = ValidationReport::default();
        assert!(report.can_proceed(false));

        report.codes.insert(IssueCode::BrokenImageLink);
        assert!(!report.can_proceed(false));
        assert!(report.can_proceed(true));

        // 101 之外的编码一律阻断,即使显式允许破图
        report.codes.insert(IssueCode::PriceInvalid);
        assert!(!report.can_proceed(true));
    }
}
