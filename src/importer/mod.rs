// ==========================================
// 工艺主数据目录 - 导入层
// ==========================================
// 职责: 外部工作簿文件 → 内存 Workbook
// 支持: Excel (.xlsx), CSV
// ==========================================

pub mod error;
pub mod file_parser;

pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser, WorkbookParser};
