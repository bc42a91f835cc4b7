// ==========================================
// 工艺主数据目录 - 目录实体
// ==========================================
// 层级: Area → Unit → Phase → Parameter / Step / Interlock / Transition
// 对齐: db.rs CATALOG_SCHEMA_SQL
// ==========================================

use crate::domain::types::{ConditionLogic, DataType, Locale, ParamClass};
use serde::{Deserialize, Serialize};

/// 空白文本归一化为 None（空白即"无值"）
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// 空白判定（None 或全空白）
pub fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

// ==========================================
// LocalizedText - 三语文本
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub pt: Option<String>,
    pub en: Option<String>,
    pub es: Option<String>,
}

impl LocalizedText {
    pub fn new(pt: Option<String>, en: Option<String>, es: Option<String>) -> Self {
        Self {
            pt: non_blank(pt),
            en: non_blank(en),
            es: non_blank(es),
        }
    }

    /// 仅源语言文本
    pub fn source_only(pt: impl Into<String>) -> Self {
        Self::new(Some(pt.into()), None, None)
    }

    pub fn get(&self, locale: Locale) -> Option<&str> {
        match locale {
            Locale::Pt => self.pt.as_deref(),
            Locale::En => self.en.as_deref(),
            Locale::Es => self.es.as_deref(),
        }
    }

    pub fn set(&mut self, locale: Locale, value: Option<String>) {
        let value = non_blank(value);
        match locale {
            Locale::Pt => self.pt = value,
            Locale::En => self.en = value,
            Locale::Es => self.es = value,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.get(Locale::SOURCE)
    }

    /// 目标语言文本，缺失时回退到源语言
    pub fn get_or_source(&self, locale: Locale) -> Option<&str> {
        self.get(locale).or_else(|| self.source())
    }

    /// 三种语言均为空
    pub fn is_blank(&self) -> bool {
        Locale::COLUMN_ORDER.iter().all(|l| self.get(*l).is_none())
    }

    /// 导出用：缺失时输出空字符串
    pub fn text_or_empty(&self, locale: Locale) -> String {
        self.get(locale).unwrap_or_default().to_string()
    }
}

// ==========================================
// 实体定义
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub area_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_id: i64,
    pub area_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub phase_id: i64,
    pub unit_id: i64,
    pub name: String,
    pub phase_type: String,
    pub description: LocalizedText,
}

/// Phase 及其所属 Unit / Area 名称（导出与过滤使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub area_id: i64,
    pub area_name: String,
    pub unit_name: String,
}

impl PhaseRecord {
    /// 下游标签名前缀 `{area}_{phase}`
    pub fn tag_prefix(&self) -> String {
        format!("{}_{}", self.area_name, self.phase.name)
    }

    /// 下游区域名 `{area}_{unit}`
    pub fn area_tag(&self) -> String {
        format!("{}_{}", self.area_name, self.unit_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub param_id: i64,
    pub phase_id: i64,
    pub number: i64,
    /// 始终由 class + number 派生
    pub name: String,
    pub class: ParamClass,
    pub data_type: DataType,
    pub description: LocalizedText,
    pub default_value: Option<String>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub eng_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub step_id: i64,
    pub phase_id: i64,
    /// 0 起始槽位 (0..49)
    pub index: i64,
    /// 人工步骤号
    pub code: Option<String>,
    pub description: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interlock {
    pub interlock_id: i64,
    pub phase_id: i64,
    pub bit: i64,
    pub safety: LocalizedText,
    pub process: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRowDescription {
    pub row_desc_id: i64,
    pub phase_id: i64,
    pub row: i64,
    pub description: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionCondition {
    pub condition_id: i64,
    pub phase_id: i64,
    pub step_index: i64,
    pub row: i64,
    pub logic: ConditionLogic,
    /// 存储的文本不含逻辑后缀
    pub text: LocalizedText,
}

impl TransitionCondition {
    /// 重建单元格文本: logic ≠ N/A 时为 `"{text} {logic}"`
    ///
    /// 文本为空时返回 None
    pub fn cell_text(&self, locale: Locale) -> Option<String> {
        let text = self.text.get(locale)?.trim();
        if text.is_empty() {
            return None;
        }
        if self.logic.is_applicable() {
            Some(format!("{} {}", text, self.logic))
        } else {
            Some(text.to_string())
        }
    }
}

// ==========================================
// 新增记录（无主键）
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub struct NewPhase {
    pub unit_id: i64,
    pub name: String,
    pub phase_type: String,
    pub description: LocalizedText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewParameter {
    pub phase_id: i64,
    pub number: i64,
    pub class: ParamClass,
    pub data_type: DataType,
    pub description: LocalizedText,
    pub default_value: Option<String>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub eng_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStep {
    pub phase_id: i64,
    pub index: i64,
    pub code: Option<String>,
    pub description: LocalizedText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInterlock {
    pub phase_id: i64,
    pub bit: i64,
    pub safety: LocalizedText,
    pub process: LocalizedText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransitionRowDescription {
    pub phase_id: i64,
    pub row: i64,
    pub description: LocalizedText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransitionCondition {
    pub phase_id: i64,
    pub step_index: i64,
    pub row: i64,
    pub logic: ConditionLogic,
    pub text: LocalizedText,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(text: &str, logic: ConditionLogic) -> TransitionCondition {
        TransitionCondition {
            condition_id: 1,
            phase_id: 1,
            step_index: 0,
            row: 0,
            logic,
            text: LocalizedText::source_only(text),
        }
    }

    #[test]
    fn test_localized_text_blank_normalization() {
        let text = LocalizedText::new(Some("  ".into()), Some("x".into()), None);
        assert_eq!(text.pt, None);
        assert_eq!(text.get_or_source(Locale::En), Some("x"));
        assert_eq!(text.get_or_source(Locale::Es), None);
        assert!(LocalizedText::default().is_blank());
    }

    #[test]
    fn test_cell_text_appends_logic_once() {
        assert_eq!(
            condition("X=1", ConditionLogic::And).cell_text(Locale::Pt),
            Some("X=1 AND".to_string())
        );
        assert_eq!(
            condition("X=1", ConditionLogic::NotApplicable).cell_text(Locale::Pt),
            Some("X=1".to_string())
        );
        assert_eq!(condition("X=1", ConditionLogic::Or).cell_text(Locale::En), None);
    }
}
