// ==========================================
// 工艺主数据目录 - 工作簿抽象
// ==========================================
// 职责: 命名工作表 + 命名列 + 异构单元格
// 用途: 导入（xlsx/csv 解析结果）与导出（主数据投影结果）共用
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// 文本单元格，空字符串视为 Empty
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        value.map(CellValue::text).unwrap_or(CellValue::Empty)
    }

    pub fn int(value: i64) -> Self {
        CellValue::Number(value as f64)
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 去除首尾空白后的非空文本
    pub fn trimmed_text(&self) -> Option<String> {
        let s = self.to_string();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// 原样文本（仅空白时为 None）
    pub fn raw_text(&self) -> Option<String> {
        if self.is_blank() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// 整数解析：整数值的数字单元格，或可解析为整数的文本（允许 `3.0`）
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            CellValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite() && n.fract() == 0.0)
                        .map(|n| n as i64)
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            // 整数值的浮点数按整数输出（10.0 → "10"）
            CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::text(value)
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(CellValue::text).unwrap_or(CellValue::Empty)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::int(value)
    }
}

// ==========================================
// Sheet - 工作表
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_columns(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(name, columns.iter().map(|c| c.to_string()).collect())
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按候选列名（含历史别名）定位列索引
    pub fn column_index(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.columns.iter().position(|c| c.trim() == *name))
    }

    /// 逐行访问
    pub fn records(&self) -> impl Iterator<Item = SheetRow<'_>> {
        self.rows.iter().enumerate().map(move |(idx, cells)| SheetRow {
            sheet: self,
            cells,
            // 表头占第 1 行
            row_number: idx + 2,
        })
    }
}

// ==========================================
// SheetRow - 行视图
// ==========================================
pub struct SheetRow<'a> {
    sheet: &'a Sheet,
    cells: &'a [CellValue],
    pub row_number: usize,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl<'a> SheetRow<'a> {
    /// 列缺失或单元格缺失时返回 Empty
    pub fn get(&self, names: &[&str]) -> &'a CellValue {
        self.sheet
            .column_index(names)
            .and_then(|idx| self.cells.get(idx))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn has_column(&self, names: &[&str]) -> bool {
        self.sheet.column_index(names).is_some()
    }

    /// 键值列：去空白后的文本，空白时为空字符串
    pub fn key(&self, names: &[&str]) -> String {
        self.get(names).trimmed_text().unwrap_or_default()
    }

    pub fn raw_text(&self, names: &[&str]) -> Option<String> {
        self.get(names).raw_text()
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet.name
    }
}

// ==========================================
// Workbook - 工作簿
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// 按候选名称查找工作表
    pub fn sheet(&self, names: &[&str]) -> Option<&Sheet> {
        names
            .iter()
            .find_map(|name| self.sheets.iter().find(|s| s.name.trim() == *name))
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
