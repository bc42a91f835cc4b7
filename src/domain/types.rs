// ==========================================
// 工艺主数据目录 - 领域类型定义
// ==========================================
// 职责: 参数类别、数据类型、条件逻辑、语言区域
// 序列化格式: 与数据库/工作表文本一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 每个 Phase 的步骤槽位数 (0..49)
pub const STEP_SLOTS: usize = 50;

/// 每个 Phase 的联锁位数 (0..31)
pub const INTERLOCK_BITS: usize = 32;

/// 转换条件网格边长 (32 步骤列 × 32 条件行)
pub const TRANSITION_GRID: usize = 32;

// ==========================================
// 参数类别 (Parameter Class)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamClass {
    PA,
    PE,
    PR,
}

impl ParamClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamClass::PA => "PA",
            ParamClass::PE => "PE",
            ParamClass::PR => "PR",
        }
    }

    /// 从文本解析（大小写不敏感，去除首尾空白）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PA" => Some(ParamClass::PA),
            "PE" => Some(ParamClass::PE),
            "PR" => Some(ParamClass::PR),
            _ => None,
        }
    }
}

impl fmt::Display for ParamClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 参数名派生规则: `{class}{number:03}`
pub fn derive_parameter_name(class: ParamClass, number: i64) -> String {
    format!("{}{:03}", class.as_str(), number)
}

// ==========================================
// 参数数据类型 (Data Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Real,
    Integer,
    Bool,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Real => "real",
            DataType::Integer => "integer",
            DataType::Bool => "bool",
        }
    }

    /// 从文本解析，兼容旧工作表的 `inteiro` / `booleano`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "real" | "float" => Some(DataType::Real),
            "integer" | "inteiro" | "int" => Some(DataType::Integer),
            "bool" | "boolean" | "booleano" => Some(DataType::Bool),
            _ => None,
        }
    }

    /// 下游参数模板名后缀
    pub fn template_suffix(&self) -> &'static str {
        match self {
            DataType::Real => "Float",
            DataType::Integer => "Integer",
            DataType::Bool => "Bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 条件逻辑 (Condition Logic)
// ==========================================
// 表示本条件行与下一行的组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionLogic {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl ConditionLogic {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionLogic::And => "AND",
            ConditionLogic::Or => "OR",
            ConditionLogic::NotApplicable => "N/A",
        }
    }

    /// 从数据库/表单文本解析，无法识别时视为 N/A
    pub fn from_db_str(raw: &str) -> Self {
        match raw.trim() {
            "AND" => ConditionLogic::And,
            "OR" => ConditionLogic::Or,
            _ => ConditionLogic::NotApplicable,
        }
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self, ConditionLogic::NotApplicable)
    }
}

impl fmt::Display for ConditionLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 语言区域 (Locale)
// ==========================================
// 源语言 pt，目标语言 en / es；下游格式使用数字区域代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    Pt,
    En,
    Es,
}

impl Locale {
    /// 源语言
    pub const SOURCE: Locale = Locale::Pt;

    /// 翻译目标语言
    pub const TARGETS: [Locale; 2] = [Locale::En, Locale::Es];

    /// 主数据列顺序（源语言在前）
    pub const COLUMN_ORDER: [Locale; 3] = [Locale::Pt, Locale::En, Locale::Es];

    /// 步骤翻译 XML / 转换条件报表的区域顺序
    pub const LOCALE_ID_ORDER: [Locale; 3] = [Locale::En, Locale::Pt, Locale::Es];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::Pt => "1046",
            Locale::En => "1033",
            Locale::Es => "3082",
        }
    }

    /// ISO 语言代码（翻译服务使用）
    pub fn iso(&self) -> &'static str {
        match self {
            Locale::Pt => "pt",
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    /// 步骤描述占位符前缀
    pub fn step_placeholder_prefix(&self) -> &'static str {
        match self {
            Locale::Pt => "zzStep",
            Locale::En => "zzEnStep",
            Locale::Es => "zzEsStep",
        }
    }
}
