// ==========================================
// Shopify 商品批量导入生成系统 - 文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xls/.xlsm) / CSV (.csv)
// 约定: 全空行跳过,物理行号保持不变（表头 = 行 1）
// ==========================================

use crate::sheet::error::{SheetError, SheetResult};
use crate::sheet::table::{SheetRow, SheetTable};
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    pub fn parse(&self, file_path: &Path) -> SheetResult<SheetTable> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(SheetError::FileNotFound(file_path.display().to_string()));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取数据行（行号从 2 起,跳过空行不重排）
        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut cells = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    // 重名表头: 后列覆盖前列
                    cells.insert(header.clone(), value.to_string());
                }
            }

            let row = SheetRow::new(row_idx + 2, cells);
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        Ok(SheetTable::new(headers, rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 解析 Excel 工作表
    ///
    /// # 参数
    /// - sheet_name: 工作表名;None 取第一个工作表（历史导出约定）
    pub fn parse(&self, file_path: &Path, sheet_name: Option<&str>) -> SheetResult<SheetTable> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(SheetError::FileNotFound(file_path.display().to_string()));
        }

        let mut workbook: Xlsx<_> = open_workbook(file_path)?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(SheetError::ExcelParseError("Excel 文件无工作表".to_string()));
        }

        let target = match sheet_name {
            Some(name) => {
                if !sheet_names.iter().any(|s| s == name) {
                    return Err(SheetError::WorksheetNotFound(name.to_string()));
                }
                name.to_string()
            }
            None => sheet_names[0].clone(),
        };

        let range = workbook
            .worksheet_range(&target)
            .map_err(|e| SheetError::ExcelParseError(e.to_string()))?;

        // 表头（第一行）
        let mut sheet_rows = range.rows();
        let header_row = match sheet_rows.next() {
            Some(r) => r,
            None => return Ok(SheetTable::new(Vec::new(), Vec::new())),
        };

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        // 数据行（行号从 2 起）
        let mut rows = Vec::new();
        for (row_idx, data_row) in sheet_rows.enumerate() {
            let mut cells = HashMap::new();

            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    cells.insert(header.clone(), cell.to_string());
                }
            }

            let row = SheetRow::new(row_idx + 2, cells);
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        Ok(SheetTable::new(headers, rows))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalSheetParser;

impl UniversalSheetParser {
    pub fn parse<P: AsRef<Path>>(
        &self,
        file_path: P,
        sheet_name: Option<&str>,
    ) -> SheetResult<SheetTable> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse(path),
            "xlsx" | "xls" | "xlsm" => ExcelParser.parse(path, sheet_name),
            _ => Err(SheetError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::table::columns;
    use std::io::Write;
    use tempfile::Builder;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let f = write_csv("Title*,Vendor*,Variant Price*\nShirt,Acme,9.99\nScarf,Acme,4.50\n");
        let table = CsvParser.parse(f.path()).unwrap();

        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].get(columns::TITLE), "Shirt");
        assert_eq!(table.rows()[0].row_number, 2);
        assert_eq!(table.rows()[1].get(columns::VARIANT_PRICE), "4.50");
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(SheetError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skips_blank_rows_keeps_numbering() {
        let f = write_csv("Title*,Vendor*\nShirt,Acme\n,\nScarf,Acme\n");
        let table = CsvParser.parse(f.path()).unwrap();

        // 空行跳过,后续行号不重排
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].row_number, 2);
        assert_eq!(table.rows()[1].row_number, 4);
    }

    #[test]
    fn test_csv_parser_empty_file_yields_zero_rows() {
        let f = write_csv("Title*,Vendor*\n");
        let table = CsvParser.parse(f.path()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers().len(), 2);
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let result = UniversalSheetParser.parse(Path::new("input.docx"), None);
        assert!(matches!(result, Err(SheetError::UnsupportedFormat(_))));
    }
}
