// ==========================================
// Shopify 商品批量导入生成系统 - 输出文件层
// ==========================================
// 职责: 全部 CSV 落盘（主导入/库存导出/校验报告/辅助报告）
// 红线: 表头与列序是对外契约;零数据行也写表头;内容确定可复现
// ==========================================

use crate::domain::catalog_row::{CatalogRow, CATALOG_HEADERS, INVENTORY_EXPORT_HEADERS};
use crate::domain::issue::BuildFinding;
use crate::domain::product::ImageRef;
use crate::probe::ProbeOutcome;
use crate::sheet::prior::{normalize_title, PriorExport};
use crate::sheet::{columns, SheetTable};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// ==========================================
// 错误类型
// ==========================================
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("无法创建输出目录 {path}: {source}")]
    CreateDirError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("写出 CSV 失败 {path}: {source}")]
    CsvWriteError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// 确保输出目录存在
pub fn ensure_outdir(outdir: &Path) -> ExportResult<()> {
    fs::create_dir_all(outdir).map_err(|source| ExportError::CreateDirError {
        path: outdir.display().to_string(),
        source,
    })
}

fn csv_error(path: &Path, source: csv::Error) -> ExportError {
    ExportError::CsvWriteError {
        path: path.display().to_string(),
        source,
    }
}

fn writer(path: &Path) -> ExportResult<csv::Writer<fs::File>> {
    csv::Writer::from_path(path).map_err(|e| csv_error(path, e))
}

/// 主导入 CSV（固定 32 列,列序即 CATALOG_HEADERS）
pub fn write_import_csv(outdir: &Path, rows: &[CatalogRow]) -> ExportResult<PathBuf> {
    let path = outdir.join("shopify_import.csv");
    let mut w = writer(&path)?;
    w.write_record(CATALOG_HEADERS).map_err(|e| csv_error(&path, e))?;
    for row in rows {
        w.write_record(row.to_record()).map_err(|e| csv_error(&path, e))?;
    }
    w.flush().map_err(|e| csv_error(&path, e.into()))?;
    info!(path = %path.display(), rows = rows.len(), "主导入 CSV 已写出");
    Ok(path)
}

/// 库存数量解析: 浮点字符串截断取整,垃圾值按 0
fn to_int_safe(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }
    s.parse::<f64>().map(|f| f as i64).unwrap_or(0)
}

/// 库存导出 CSV（固定 19 列;每个带 SKU 的变体行 × 每个库位一行）
///
/// 首个库位为主库位: 四个只读列与 On hand (current) 置 0,
/// On hand (new) = 有货时的配置量;其余库位输出 "not stocked"。
pub fn write_inventory_export(
    outdir: &Path,
    rows: &[CatalogRow],
    locations: &[String],
    in_stock_qty: i64,
) -> ExportResult<PathBuf> {
    let path = outdir.join("shopify_inventory_export.csv");
    let default_locations = vec!["Default".to_string()];
    let locations = if locations.is_empty() {
        &default_locations
    } else {
        locations
    };

    let mut w = writer(&path)?;
    w.write_record(INVENTORY_EXPORT_HEADERS)
        .map_err(|e| csv_error(&path, e))?;

    let mut count = 0usize;
    for row in rows {
        // 纯图片行无 SKU,跳过
        if !row.is_variant_row() {
            continue;
        }
        let qty_primary = if to_int_safe(&row.variant_inventory_qty) > 0 {
            in_stock_qty
        } else {
            0
        };

        for (index, location) in locations.iter().enumerate() {
            let primary = index == 0;
            let qty_new = qty_primary.to_string();
            let record: [&str; 19] = [
                &row.handle,
                &row.title,
                &row.option1_name,
                &row.option1_value,
                &row.option2_name,
                &row.option2_value,
                &row.option3_name,
                &row.option3_value,
                &row.variant_sku,
                "", // HS Code
                "", // COO
                location,
                "", // Bin name
                if primary { "0" } else { "not stocked" },
                if primary { "0" } else { "not stocked" },
                if primary { "0" } else { "not stocked" },
                "0",
                "0",
                if primary { &qty_new } else { "not stocked" },
            ];
            w.write_record(record).map_err(|e| csv_error(&path, e))?;
            count += 1;
        }
    }
    w.flush().map_err(|e| csv_error(&path, e.into()))?;
    info!(path = %path.display(), rows = count, "库存导出 CSV 已写出");
    Ok(path)
}

/// 校验报告 CSV: (level,row,field,message) 四列,构建期全部发现
pub fn write_validation_report(
    outdir: &Path,
    findings: &[BuildFinding],
) -> ExportResult<PathBuf> {
    let path = outdir.join("validation_report.csv");
    let mut w = writer(&path)?;
    w.write_record(["level", "row", "field", "message"])
        .map_err(|e| csv_error(&path, e))?;
    for finding in findings {
        w.write_record([
            finding.level.as_str(),
            &finding.row_number.to_string(),
            &finding.field,
            &finding.message,
        ])
        .map_err(|e| csv_error(&path, e))?;
    }
    w.flush().map_err(|e| csv_error(&path, e.into()))?;
    info!(path = %path.display(), findings = findings.len(), "校验报告已写出");
    Ok(path)
}

/// 图片探测报告 CSV
///
/// Title 由装配行按 handle 反查（首个带标题的行）。
pub fn write_image_report(
    outdir: &Path,
    image_results: &[(ImageRef, ProbeOutcome)],
    rows: &[CatalogRow],
) -> ExportResult<PathBuf> {
    let path = outdir.join("image_report.csv");

    let mut handle_to_title: HashMap<&str, &str> = HashMap::new();
    for row in rows {
        if !row.handle.is_empty() && !row.title.is_empty() {
            handle_to_title.entry(&row.handle).or_insert(&row.title);
        }
    }

    let mut w = writer(&path)?;
    w.write_record(["Title", "Handle", "Image Position", "Image URL", "Working", "Note"])
        .map_err(|e| csv_error(&path, e))?;
    for (image, outcome) in image_results {
        let title = handle_to_title
            .get(image.handle.as_str())
            .copied()
            .unwrap_or("");
        w.write_record([
            title,
            &image.handle,
            &image.position.to_string(),
            &image.url,
            if outcome.ok { "Working" } else { "Not Working" },
            &outcome.note,
        ])
        .map_err(|e| csv_error(&path, e))?;
    }
    w.flush().map_err(|e| csv_error(&path, e.into()))?;
    info!(path = %path.display(), images = image_results.len(), "图片报告已写出");
    Ok(path)
}

/// 标题对照报告 CSV: 同时出现在历史导出与本次输入的标题及其次数
///
/// 排序按规范化标题;展示写法取输入中的首次出现。
pub fn write_title_matches(
    outdir: &Path,
    table: &SheetTable,
    prior: &PriorExport,
) -> ExportResult<PathBuf> {
    let path = outdir.join("title_matches.csv");

    // 规范化标题 → (首次出现写法, 输入内次数)
    let mut input_counts: HashMap<String, (String, usize)> = HashMap::new();
    for row in table.rows() {
        let title = row.get(columns::TITLE);
        if title.is_empty() {
            continue;
        }
        let entry = input_counts
            .entry(normalize_title(title))
            .or_insert_with(|| (title.to_string(), 0));
        entry.1 += 1;
    }

    let mut matches: Vec<(String, String, usize, usize)> = input_counts
        .into_iter()
        .filter(|(normalized, _)| prior.has_title(normalized))
        .map(|(normalized, (display, input_count))| {
            let prev_count = prior.title_count(&normalized);
            (normalized, display, prev_count, input_count)
        })
        .collect();
    matches.sort_by(|a, b| a.0.cmp(&b.0));

    let mut w = writer(&path)?;
    w.write_record(["Title", "In Previous Count", "In Input Count"])
        .map_err(|e| csv_error(&path, e))?;
    for (_, display, prev_count, input_count) in &matches {
        w.write_record([
            display.as_str(),
            &prev_count.to_string(),
            &input_count.to_string(),
        ])
        .map_err(|e| csv_error(&path, e))?;
    }
    w.flush().map_err(|e| csv_error(&path, e.into()))?;
    info!(path = %path.display(), matches = matches.len(), "标题对照报告已写出");
    Ok(path)
}

/// 输入表回写 CSV: 原列序 + 回填后的 Variant SKU 竖线串
///
/// 无论输入是 CSV 还是 Excel,回写一律落 CSV。
pub fn write_input_with_skus(outdir: &Path, table: &SheetTable) -> ExportResult<PathBuf> {
    let path = outdir.join("input_with_skus.csv");
    let mut w = writer(&path)?;
    w.write_record(table.headers()).map_err(|e| csv_error(&path, e))?;
    for row in table.rows() {
        let record: Vec<&str> = table.headers().iter().map(|h| row.get_raw(h)).collect();
        w.write_record(record).map_err(|e| csv_error(&path, e))?;
    }
    w.flush().map_err(|e| csv_error(&path, e.into()))?;
    info!(path = %path.display(), rows = table.rows().len(), "带 SKU 输入表已写出");
    Ok(path)
}
