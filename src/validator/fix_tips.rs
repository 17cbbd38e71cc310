// ==========================================
// Shopify 商品批量导入生成系统 - 修复提示
// ==========================================
// 职责: 按命中编码渲染 "How to fix" 提示块,附在人读报告末尾
// 红线: 提示文案面向运营,是对外契约
// ==========================================

use crate::domain::issue::IssueCode;
use std::collections::BTreeSet;

fn tip_for(code: IssueCode) -> &'static str {
    match code {
        IssueCode::BrokenImageLink => {
            "How to fix Error 101 (Broken Image Link):\n\
             - Use public https URLs that open in a browser and end with .jpg/.jpeg/.png/.gif/.webp/.tiff\n\
             - Avoid Google Drive viewer links or local file paths\n\
             - Upload to Shopify Files and use that URL if needed"
        }
        IssueCode::DuplicateTitle => {
            "How to fix Error 102 (Duplicate Titles):\n\
             - Make Title unique OR provide a unique Handle (optional)\n\
             - For updates, put the existing product Handle so import updates instead of duplicating\n\
             - Remove accidental duplicate rows\n\
             - Clean duplicates in the previous export / Shopify if they already exist there"
        }
        IssueCode::PrevExportNoSku => {
            "How to fix Error 103 (Unable to find Highest SKU):\n\
             - Pick a recent Shopify export where 'Variant SKU' exists\n\
             - Ensure first data row under 'Variant SKU' looks like 110357 or 110357-01\n\
             - Header must be exactly 'Variant SKU'\n\
             - If first run without history, leave previous export empty"
        }
        IssueCode::InputUnreadable => {
            "How to fix Error 104 (Blank/Empty Import or Previous Export):\n\
             - Check file paths and sheet name\n\
             - Make sure the sheet/file has rows and is not protected\n\
             - Re-export products from Shopify if the export is empty"
        }
        IssueCode::MandatoryMissing => {
            "How to fix Error 105 (Missing mandatory Shopify fields):\n\
             - Fill Title*, Vendor*, and Variant Price*\n\
             - For variants, set Option1 Name (e.g., Size) and Option1 Values (e.g., 52|54|56|58)"
        }
        IssueCode::SeoFieldEmpty => {
            "How to fix Error 106 (Missing SEO Title/Description on rows):\n\
             - For every product row, fill both 'SEO Title' and 'SEO Description'\n\
             - Recommended: Title ≤ 60 chars, Description ≤ 320 chars\n\
             - If the columns aren't present, add them to your template so you can fill them"
        }
        IssueCode::DescriptionMissing => {
            "How to fix Error 107 (Missing Body (HTML) on rows):\n\
             - For every product with a Title*, enter a product description in 'Body (HTML)'\n\
             - Plain text is fine, or include simple HTML if you want formatting\n\
             - Even a short sentence is okay as a placeholder to clear this error"
        }
        IssueCode::PriceInvalid => {
            "How to fix Error 108 (Invalid Price):\n\
             - 'Variant Price*' must be a positive number (e.g., 19.99)\n\
             - Do NOT include currency symbols (₹, £, $, etc.) or commas\n\
             - No zeros or negatives; enter a value > 0"
        }
        IssueCode::HandleInvalid => {
            "How to fix Error 109 (Bad Handle Format):\n\
             - Use lowercase letters and numbers only, separated by hyphens\n\
             - No spaces, uppercase, or symbols; e.g., 'my-product-name'\n\
             - Remove accents (use plain a-z) and keep length ≤ 255"
        }
        IssueCode::OptionMismatch => {
            "How to fix Error 110 (Variant Options Mismatch):\n\
             - If you enter values (e.g., S|M|L), you must provide an Option1 Name (e.g., Size)\n\
             - If there are no variants, leave BOTH Option1 Name and Option1 Values blank\n\
             - Do not mix one without the other"
        }
        IssueCode::SeoFieldOverlong => {
            "How to fix Error 111 (SEO Length Limits):\n\
             - Keep 'SEO Title' ≤ ~60 characters\n\
             - Keep 'SEO Description' ≤ ~320 characters\n\
             - Trim extra words so search results don't truncate"
        }
        IssueCode::PlaceholderBody => {
            "How to fix Error 112 (Very Short/Placeholder Description):\n\
             - Add a meaningful product description in 'Body (HTML)'.\n\
             - Avoid placeholders like 'lorem ipsum' or just dashes.\n\
             - Aim for at least 20+ characters; 1-2 clear sentences is fine."
        }
    }
}

/// 渲染命中编码的修复提示（按编码升序）;无命中返回空串
pub fn build_fix_tips(codes: &BTreeSet<IssueCode>) -> String {
    let blocks: Vec<&str> = IssueCode::all()
        .into_iter()
        .filter(|c| codes.contains(c))
        .map(tip_for)
        .collect();
    if blocks.is_empty() {
        String::new()
    } else {
        blocks.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tips_ordered_by_code() {
        let mut codes = BTreeSet::new();
        codes.insert(IssueCode::PlaceholderBody);
        codes.insert(IssueCode::DuplicateTitle);
        let tips = build_fix_tips(&codes);
        let pos_102 = tips.find("Error 102").unwrap();
        let pos_112 = tips.find("Error 112").unwrap();
        assert!(pos_102 < pos_112);
        assert!(!tips.contains("Error 105"));
    }

    #[test]
    fn test_no_codes_no_tips() {
        assert!(build_fix_tips(&BTreeSet::new()).is_empty());
    }
}
