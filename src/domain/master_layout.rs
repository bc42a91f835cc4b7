// ==========================================
// 工艺主数据目录 - 主数据工作簿布局
// ==========================================
// 职责: 工作表名 / 列名（导出规范名 + 历史工作簿别名）
// 约定: 多语言列以数字区域代码为后缀 (1046 / 1033 / 3082)
// 说明: 每个常量数组第一个元素为导出使用的规范名
// ==========================================

use crate::domain::catalog::LocalizedText;
use crate::domain::sheet::SheetRow;
use crate::domain::types::{Locale, TRANSITION_GRID};

// ===== 工作表 =====
pub const SHEET_AREAS: &[&str] = &["Areas"];
pub const SHEET_UNITS: &[&str] = &["Units", "Unidades"];
pub const SHEET_PHASES: &[&str] = &["Phases"];
pub const SHEET_PARAMETERS: &[&str] = &["Parameters", "Parametros"];
pub const SHEET_STEPS: &[&str] = &["Steps", "Passos"];
pub const SHEET_INTERLOCKS: &[&str] = &["Interlocks"];
pub const SHEET_TRANSITIONS: &[&str] = &["Transitions", "Transicoes"];

// ===== 通用键列 =====
pub const COL_AREA: &[&str] = &["Area"];
pub const COL_UNIT: &[&str] = &["Unit", "Unidade"];
pub const COL_PHASE: &[&str] = &["Phase"];

// ===== Areas =====
pub const COL_AREA_NAME: &[&str] = &["Area_Name", "Nome_Area"];
pub const COL_AREA_DESCRIPTION: &[&str] = &["Area_Description", "Descricao_Area"];

// ===== Units =====
pub const COL_UNIT_NAME: &[&str] = &["Unit_Name", "Nome_Unidade"];
pub const COL_UNIT_DESCRIPTION: &[&str] = &["Unit_Description", "Descricao_Unidade"];

// ===== Phases =====
pub const COL_PHASE_TYPE: &[&str] = &["Type", "Tipo"];

// ===== Parameters =====
pub const COL_PARAM_CLASS: &[&str] = &["Class", "Classe"];
pub const COL_PARAM_NUMBER: &[&str] = &["Number", "Numero"];
pub const COL_PARAM_DATA_TYPE: &[&str] = &["Data_Type", "Tipo"];
pub const COL_PARAM_DEFAULT: &[&str] = &["Default"];
pub const COL_PARAM_MIN: &[&str] = &["Min"];
pub const COL_PARAM_MAX: &[&str] = &["Max"];
pub const COL_PARAM_ENG_UNIT: &[&str] = &["Eng_Unit", "Unidade_Eng"];

// ===== Steps =====
pub const COL_STEP_INDEX: &[&str] = &["Index"];
pub const COL_STEP_NUMBER: &[&str] = &["Step_Number"];

// ===== Interlocks =====
pub const COL_INTERLOCK_BIT: &[&str] = &["Bit"];

// ===== Transitions =====
pub const COL_TRANSITION_ROW: &[&str] = &["Row_Bit", "Bit_Linha"];

// ==========================================
// 多语言列
// ==========================================

/// 多语言列族：规范前缀 + 历史前缀
#[derive(Debug, Clone, Copy)]
pub struct LocalizedColumns {
    pub prefix: &'static str,
    pub legacy_prefix: &'static str,
}

pub const DESC_COLUMNS: LocalizedColumns = LocalizedColumns {
    prefix: "Desc",
    legacy_prefix: "Desc",
};

pub const SAFETY_COLUMNS: LocalizedColumns = LocalizedColumns {
    prefix: "Safety",
    legacy_prefix: "Seg",
};

pub const PROCESS_COLUMNS: LocalizedColumns = LocalizedColumns {
    prefix: "Process",
    legacy_prefix: "Proc",
};

pub const ROW_DESC_COLUMNS: LocalizedColumns = LocalizedColumns {
    prefix: "Row_Desc",
    legacy_prefix: "Desc_Linha",
};

impl LocalizedColumns {
    /// 规范列名 `{prefix}_{code}`
    pub fn column(&self, locale: Locale) -> String {
        format!("{}_{}", self.prefix, locale.code())
    }

    /// 历史列名 `{legacy}_{PT|EN|ES}`
    pub fn legacy_column(&self, locale: Locale) -> String {
        format!("{}_{}", self.legacy_prefix, locale.iso().to_ascii_uppercase())
    }

    /// 规范列名（按 pt / en / es 顺序）
    pub fn columns(&self) -> Vec<String> {
        Locale::COLUMN_ORDER.iter().map(|l| self.column(*l)).collect()
    }

    /// 从行读取三语文本（规范列名优先，其次历史列名）
    pub fn read(&self, row: &SheetRow<'_>) -> LocalizedText {
        let cell = |locale: Locale| {
            let canonical = self.column(locale);
            let legacy = self.legacy_column(locale);
            row.raw_text(&[canonical.as_str(), legacy.as_str()])
        };
        LocalizedText::new(cell(Locale::Pt), cell(Locale::En), cell(Locale::Es))
    }
}

/// 转换网格步骤列名 `Step_{n}`
pub fn step_column(step_index: usize) -> String {
    format!("Step_{}", step_index)
}

/// 全部步骤列名 Step_0 .. Step_31
pub fn step_columns() -> Vec<String> {
    (0..TRANSITION_GRID).map(step_column).collect()
}
