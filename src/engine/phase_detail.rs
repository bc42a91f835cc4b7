// ==========================================
// 工艺主数据目录 - Phase 详情保存服务
// ==========================================
// 职责: 参数 / 步骤 / 转换条件 / 联锁 的批量保存
// 规则: 源语言文本为空即删除该行；目标语言空白时自动翻译
// 事务: 每次调用一个事务
// ==========================================

use crate::domain::catalog::{
    non_blank, LocalizedText, NewInterlock, NewParameter, NewStep, NewTransitionCondition,
    NewTransitionRowDescription, Parameter,
};
use crate::domain::types::{
    ConditionLogic, DataType, ParamClass, INTERLOCK_BITS, STEP_SLOTS, TRANSITION_GRID,
};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::translation::{fill_missing_targets, translated_from_source, Translator};
use crate::repository::{
    InterlockRepository, ParameterRepository, PhaseRepository, RepositoryError, StepRepository,
    TransitionRepository,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tracing::info;

// ==========================================
// 表单输入
// ==========================================

/// 已有参数的编辑
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEdit {
    pub param_id: i64,
    /// 勾选删除
    #[serde(default)]
    pub delete: bool,
    pub number: i64,
    pub class: ParamClass,
    pub data_type: DataType,
    pub description: LocalizedText,
    pub default_value: Option<String>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub eng_unit: Option<String>,
}

/// 新增参数行（number 为空的行忽略）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewParameterRow {
    pub number: Option<i64>,
    pub class: ParamClass,
    pub data_type: DataType,
    pub description: LocalizedText,
    pub default_value: Option<String>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub eng_unit: Option<String>,
}

/// 参数表单上下文：下一次新增行默认使用的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterFormContext {
    pub last_class: ParamClass,
}

impl Default for ParameterFormContext {
    fn default() -> Self {
        Self {
            last_class: ParamClass::PE,
        }
    }
}

/// 单个步骤槽位输入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSlotInput {
    pub index: i64,
    pub code: Option<String>,
    pub description: LocalizedText,
}

/// 单个条件单元格输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionCellInput {
    pub step_index: i64,
    pub row: i64,
    pub text: Option<String>,
    pub logic: ConditionLogic,
}

/// 转换条件网格输入；未出现的行 / 单元格视为空白
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionGridInput {
    /// (row, 源语言描述)
    pub row_descriptions: Vec<(i64, Option<String>)>,
    pub cells: Vec<TransitionCellInput>,
}

/// 单个联锁位输入；未出现的位视为空白
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterlockInput {
    pub bit: i64,
    pub safety: LocalizedText,
    pub process: LocalizedText,
}

/// 保存结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailSaveSummary {
    pub upserted: usize,
    pub deleted: usize,
}

// ==========================================
// PhaseDetailService - Phase 详情保存服务
// ==========================================
pub struct PhaseDetailService {
    translator: Arc<dyn Translator>,
}

impl PhaseDetailService {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    fn ensure_phase(conn: &Connection, phase_id: i64) -> EngineResult<()> {
        PhaseRepository::new(conn).get_record(phase_id)?;
        Ok(())
    }

    /// 保存参数表单
    ///
    /// # 返回
    /// - ParameterFormContext: 最后使用的参数类别
    pub fn save_parameters(
        &self,
        conn: &mut Connection,
        phase_id: i64,
        edits: &[ParameterEdit],
        new_rows: &[NewParameterRow],
    ) -> EngineResult<ParameterFormContext> {
        let tx = conn.transaction()?;
        Self::ensure_phase(&tx, phase_id)?;
        let repo = ParameterRepository::new(&tx);
        let mut context = ParameterFormContext::default();

        for edit in edits {
            if edit.delete {
                if !repo.delete(phase_id, edit.param_id)? {
                    return Err(RepositoryError::not_found("Parameter", edit.param_id).into());
                }
                continue;
            }
            validate_number(edit.number)?;
            let mut description = edit.description.clone();
            fill_missing_targets(self.translator.as_ref(), &mut description);
            repo.update(&Parameter {
                param_id: edit.param_id,
                phase_id,
                number: edit.number,
                // 由仓储重新派生
                name: String::new(),
                class: edit.class,
                data_type: edit.data_type,
                description,
                default_value: non_blank(edit.default_value.clone()),
                min_value: non_blank(edit.min_value.clone()),
                max_value: non_blank(edit.max_value.clone()),
                eng_unit: non_blank(edit.eng_unit.clone()),
            })?;
            context.last_class = edit.class;
        }

        for row in new_rows {
            let Some(number) = row.number else {
                continue;
            };
            validate_number(number)?;
            let mut description = row.description.clone();
            fill_missing_targets(self.translator.as_ref(), &mut description);
            repo.insert(&NewParameter {
                phase_id,
                number,
                class: row.class,
                data_type: row.data_type,
                description,
                default_value: non_blank(row.default_value.clone()),
                min_value: non_blank(row.min_value.clone()),
                max_value: non_blank(row.max_value.clone()),
                eng_unit: non_blank(row.eng_unit.clone()),
            })?;
            context.last_class = row.class;
        }

        tx.commit()?;
        info!(phase_id, edits = edits.len(), new_rows = new_rows.len(), "参数已保存");
        Ok(context)
    }

    /// 保存步骤网格的一个区间 `[start, end)`
    ///
    /// 代码与源语言描述都为空的槽位删除，其余覆盖写入。
    pub fn save_steps(
        &self,
        conn: &mut Connection,
        phase_id: i64,
        range: Range<i64>,
        slots: &[StepSlotInput],
    ) -> EngineResult<DetailSaveSummary> {
        if range.start < 0 || range.end > STEP_SLOTS as i64 || range.start > range.end {
            return Err(EngineError::validation(
                "Steps",
                0,
                "Index",
                format!("区间 {}..{} 超出 0..{}", range.start, range.end, STEP_SLOTS),
            ));
        }

        let tx = conn.transaction()?;
        Self::ensure_phase(&tx, phase_id)?;
        let repo = StepRepository::new(&tx);
        let by_index: HashMap<i64, &StepSlotInput> = slots.iter().map(|s| (s.index, s)).collect();
        let mut summary = DetailSaveSummary::default();

        for index in range {
            let slot = by_index.get(&index);
            let code = slot.and_then(|s| non_blank(s.code.clone()));
            let mut description = slot.map(|s| s.description.clone()).unwrap_or_default();

            if code.is_none() && description.source().is_none() {
                if repo.delete(phase_id, index)? {
                    summary.deleted += 1;
                }
                continue;
            }
            fill_missing_targets(self.translator.as_ref(), &mut description);
            repo.upsert(&NewStep {
                phase_id,
                index,
                code: code.map(|c| c.trim().to_string()),
                description,
            })?;
            summary.upserted += 1;
        }

        tx.commit()?;
        info!(phase_id, upserted = summary.upserted, deleted = summary.deleted, "步骤已保存");
        Ok(summary)
    }

    /// 保存整个 32×32 转换条件网格及 32 条行描述
    ///
    /// - 行描述: 源语言为空删除，否则目标语言重新翻译
    /// - 单元格: 文本为空且逻辑为 N/A 删除，否则覆盖写入
    pub fn save_transitions(
        &self,
        conn: &mut Connection,
        phase_id: i64,
        grid: &TransitionGridInput,
    ) -> EngineResult<DetailSaveSummary> {
        let tx = conn.transaction()?;
        Self::ensure_phase(&tx, phase_id)?;
        let repo = TransitionRepository::new(&tx);

        let row_descriptions: HashMap<i64, Option<&str>> = grid
            .row_descriptions
            .iter()
            .map(|(row, text)| (*row, text.as_deref()))
            .collect();
        let cells: HashMap<(i64, i64), &TransitionCellInput> = grid
            .cells
            .iter()
            .map(|c| ((c.step_index, c.row), c))
            .collect();
        let mut summary = DetailSaveSummary::default();

        for row in 0..TRANSITION_GRID as i64 {
            let source = row_descriptions.get(&row).copied().flatten();
            let description = translated_from_source(self.translator.as_ref(), source);
            if description.source().is_none() {
                if repo.delete_row_description(phase_id, row)? {
                    summary.deleted += 1;
                }
            } else {
                repo.upsert_row_description(&NewTransitionRowDescription {
                    phase_id,
                    row,
                    description,
                })?;
                summary.upserted += 1;
            }

            for step_index in 0..TRANSITION_GRID as i64 {
                let cell = cells.get(&(step_index, row));
                let text = cell.and_then(|c| non_blank(c.text.clone()));
                let logic = cell
                    .map(|c| c.logic)
                    .unwrap_or(ConditionLogic::NotApplicable);

                if text.is_none() && !logic.is_applicable() {
                    if repo.delete_condition(phase_id, step_index, row)? {
                        summary.deleted += 1;
                    }
                    continue;
                }
                repo.upsert_condition(&NewTransitionCondition {
                    phase_id,
                    step_index,
                    row,
                    logic,
                    text: translated_from_source(self.translator.as_ref(), text.as_deref()),
                })?;
                summary.upserted += 1;
            }
        }

        tx.commit()?;
        info!(phase_id, upserted = summary.upserted, deleted = summary.deleted, "转换条件已保存");
        Ok(summary)
    }

    /// 保存 32 个联锁位
    ///
    /// 安全与过程源语言文本都为空时删除；显式给出的目标语言优先于翻译。
    pub fn save_interlocks(
        &self,
        conn: &mut Connection,
        phase_id: i64,
        inputs: &[InterlockInput],
    ) -> EngineResult<DetailSaveSummary> {
        let tx = conn.transaction()?;
        Self::ensure_phase(&tx, phase_id)?;
        let repo = InterlockRepository::new(&tx);
        let by_bit: HashMap<i64, &InterlockInput> = inputs.iter().map(|i| (i.bit, i)).collect();
        let mut summary = DetailSaveSummary::default();

        for bit in 0..INTERLOCK_BITS as i64 {
            let input = by_bit.get(&bit);
            let mut safety = input.map(|i| i.safety.clone()).unwrap_or_default();
            let mut process = input.map(|i| i.process.clone()).unwrap_or_default();

            if safety.source().is_none() && process.source().is_none() {
                if repo.delete(phase_id, bit)? {
                    summary.deleted += 1;
                }
                continue;
            }
            fill_missing_targets(self.translator.as_ref(), &mut safety);
            fill_missing_targets(self.translator.as_ref(), &mut process);
            repo.upsert(&NewInterlock {
                phase_id,
                bit,
                safety,
                process,
            })?;
            summary.upserted += 1;
        }

        tx.commit()?;
        info!(phase_id, upserted = summary.upserted, deleted = summary.deleted, "联锁已保存");
        Ok(summary)
    }
}

fn validate_number(number: i64) -> EngineResult<()> {
    if number < 0 {
        return Err(EngineError::validation(
            "Parameters",
            0,
            "Number",
            format!("参数编号不能为负: {}", number),
        ));
    }
    Ok(())
}
