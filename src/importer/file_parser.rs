// ==========================================
// 工艺主数据目录 - 工作簿解析器
// ==========================================
// 支持: Excel (.xlsx, 全部工作表) / CSV (.csv, 单工作表)
// 输出: domain::sheet::Workbook
// ==========================================

use crate::domain::sheet::{CellValue, Sheet, Workbook};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook, open_workbook_from_rs, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

/// 工作簿解析接口
pub trait WorkbookParser {
    fn parse_path(&self, file_path: &Path) -> ImportResult<Workbook>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// CSV Parser 实现
// ==========================================
/// CSV 视为单工作表，工作表名取文件名（不含扩展名）
pub struct CsvParser;

impl CsvParser {
    /// 从内存字节解析
    pub fn parse_bytes(&self, sheet_name: &str, bytes: &[u8]) -> ImportResult<Workbook> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut sheet = Sheet::new(sheet_name, headers);
        for result in reader.records() {
            let record = result?;
            let row: Vec<CellValue> = record.iter().map(CellValue::text).collect();

            // 跳过完全空白的行
            if row.iter().all(CellValue::is_blank) {
                continue;
            }
            sheet.push_row(row);
        }

        debug!(sheet = %sheet.name, rows = sheet.len(), "CSV 工作表解析完成");
        let mut workbook = Workbook::new();
        workbook.add_sheet(sheet);
        Ok(workbook)
    }
}

impl WorkbookParser for CsvParser {
    fn parse_path(&self, file_path: &Path) -> ImportResult<Workbook> {
        ensure_exists(file_path)?;
        let sheet_name = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Sheet1")
            .to_string();
        let bytes = std::fs::read(file_path)?;
        self.parse_bytes(&sheet_name, &bytes)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 从内存字节解析（上传场景）
    pub fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Workbook> {
        let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))?;
        read_all_sheets(workbook)
    }
}

impl WorkbookParser for ExcelParser {
    fn parse_path(&self, file_path: &Path) -> ImportResult<Workbook> {
        ensure_exists(file_path)?;
        let workbook: Xlsx<_> = open_workbook(file_path)?;
        read_all_sheets(workbook)
    }
}

/// 读取全部工作表：首行为表头，其余为数据行
fn read_all_sheets<RS: Read + Seek>(mut xlsx: Xlsx<RS>) -> ImportResult<Workbook> {
    let sheet_names = xlsx.sheet_names();
    if sheet_names.is_empty() {
        return Err(ImportError::EmptyWorkbook);
    }

    let mut workbook = Workbook::new();
    for sheet_name in sheet_names {
        let range = xlsx.worksheet_range(&sheet_name)?;
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            // 空工作表: 无列无行
            None => Vec::new(),
        };

        let mut sheet = Sheet::new(sheet_name.clone(), headers);
        for data_row in rows {
            let row: Vec<CellValue> = data_row.iter().map(cell_from_data).collect();
            if row.iter().all(CellValue::is_blank) {
                continue;
            }
            sheet.push_row(row);
        }

        debug!(sheet = %sheet.name, rows = sheet.len(), "Excel 工作表解析完成");
        workbook.add_sheet(sheet);
    }
    Ok(workbook)
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::text(other.to_string()),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Workbook> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_path(path),
            "xlsx" => ExcelParser.parse_path(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
