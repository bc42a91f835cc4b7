// ==========================================
// 工艺主数据目录 - 工作簿写出
// ==========================================
// 职责: Workbook → xlsx 字节；Sheet → csv 字节
// 工具: rust_xlsxwriter / csv
// ==========================================

use crate::domain::sheet::{CellValue, Sheet, Workbook};
use crate::engine::error::{EngineError, EngineResult};

/// 每个工作表一个 worksheet，首行为表头
pub fn workbook_to_xlsx(workbook: &Workbook) -> EngineResult<Vec<u8>> {
    let mut book = rust_xlsxwriter::Workbook::new();

    for sheet in &workbook.sheets {
        let worksheet = book.add_worksheet();
        worksheet.set_name(sheet.name.as_str())?;

        for (col, name) in sheet.columns.iter().enumerate() {
            worksheet.write_string(0, col as u16, name.as_str())?;
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            let excel_row = (r + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(s) => {
                        worksheet.write_string(excel_row, col, s.as_str())?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(excel_row, col, *n)?;
                    }
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(excel_row, col, *b)?;
                    }
                }
            }
        }
    }

    Ok(book.save_to_buffer()?)
}

/// 单表 CSV（表头 + 数据行）
pub fn sheet_to_csv(sheet: &Sheet) -> EngineResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(&sheet.columns)?;
    for row in &sheet.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| EngineError::CsvWriteError(e.to_string()))
}
