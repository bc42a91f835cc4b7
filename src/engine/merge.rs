// ==========================================
// 工艺主数据目录 - 主数据合并引擎
// ==========================================
// 职责: 外部工作簿 → 目录（仅插入缺失行，已存在行保持不变）
// 顺序: Areas → Units → Phases → Parameters → Steps → Interlocks → Transitions
// 事务: 整个合并一个事务，任何错误回滚
// 红线: Engine 不拼 SQL，写入全部经由 Repository
// ==========================================

use crate::domain::catalog::{
    LocalizedText, NewInterlock, NewParameter, NewPhase, NewStep, NewTransitionCondition,
    NewTransitionRowDescription,
};
use crate::domain::master_layout::*;
use crate::domain::sheet::{CellValue, Sheet, SheetRow, Workbook};
use crate::domain::types::{
    DataType, ParamClass, INTERLOCK_BITS, STEP_SLOTS, TRANSITION_GRID,
};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::key_resolver::KeyResolver;
use crate::engine::logic_suffix::parse_logic;
use crate::engine::translation::{fill_missing_targets, Translator};
use crate::repository::{
    clear_catalog, AreaRepository, InterlockRepository, ParameterRepository, PhaseRepository,
    StepRepository, TransitionRepository, UnitRepository,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Phase 类型缺省值
pub const DEFAULT_PHASE_TYPE: &str = "PH";

/// 合并结果统计（插入条数 + 跳过行数）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub areas: usize,
    pub units: usize,
    pub phases: usize,
    pub parameters: usize,
    pub steps: usize,
    pub interlocks: usize,
    pub row_descriptions: usize,
    pub conditions: usize,
    /// 父键无法解析、自身键已存在或键为空的行
    pub skipped_rows: usize,
}

impl MergeSummary {
    pub fn total_inserted(&self) -> usize {
        self.areas
            + self.units
            + self.phases
            + self.parameters
            + self.steps
            + self.interlocks
            + self.row_descriptions
            + self.conditions
    }
}

// ==========================================
// MergeEngine - 主数据合并引擎
// ==========================================
pub struct MergeEngine {
    translator: Arc<dyn Translator>,
}

impl MergeEngine {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    /// 幂等合并（主入口）
    ///
    /// # 返回
    /// - MergeSummary: 各实体插入条数
    ///
    /// # 错误
    /// - ValidationFailure: 键列非数字 / 槽位越界 / 类别或数据类型未知，整体回滚
    pub fn merge(&self, conn: &mut Connection, workbook: &Workbook) -> EngineResult<MergeSummary> {
        info!(sheets = ?workbook.sheet_names(), "开始合并主数据工作簿");
        let tx = conn.transaction()?;
        let summary = self.merge_in(&tx, workbook)?;
        tx.commit()?;
        info!(
            inserted = summary.total_inserted(),
            skipped = summary.skipped_rows,
            "主数据合并完成"
        );
        Ok(summary)
    }

    /// 全量导入: 清空目录后合并，同一事务内完成
    ///
    /// 合并失败时原目录保持不变。
    pub fn import_full(
        &self,
        conn: &mut Connection,
        workbook: &Workbook,
    ) -> EngineResult<MergeSummary> {
        info!(sheets = ?workbook.sheet_names(), "开始全量导入主数据工作簿");
        let tx = conn.transaction()?;
        clear_catalog(&tx)?;
        let summary = self.merge_in(&tx, workbook)?;
        tx.commit()?;
        info!(inserted = summary.total_inserted(), "全量导入完成");
        Ok(summary)
    }

    /// 在调用方事务内合并
    pub fn merge_in(&self, conn: &Connection, workbook: &Workbook) -> EngineResult<MergeSummary> {
        let mut resolver = KeyResolver::load(conn)?;
        let mut summary = MergeSummary::default();

        if let Some(sheet) = workbook.sheet(SHEET_AREAS) {
            self.merge_areas(conn, sheet, &mut resolver, &mut summary)?;
        }
        if let Some(sheet) = workbook.sheet(SHEET_UNITS) {
            self.merge_units(conn, sheet, &mut resolver, &mut summary)?;
        }
        if let Some(sheet) = workbook.sheet(SHEET_PHASES) {
            self.merge_phases(conn, sheet, &mut resolver, &mut summary)?;
        }
        if let Some(sheet) = workbook.sheet(SHEET_PARAMETERS) {
            self.merge_parameters(conn, sheet, &mut resolver, &mut summary)?;
        }
        if let Some(sheet) = workbook.sheet(SHEET_STEPS) {
            self.merge_steps(conn, sheet, &mut resolver, &mut summary)?;
        }
        if let Some(sheet) = workbook.sheet(SHEET_INTERLOCKS) {
            self.merge_interlocks(conn, sheet, &mut resolver, &mut summary)?;
        }
        if let Some(sheet) = workbook.sheet(SHEET_TRANSITIONS) {
            self.merge_transitions(conn, sheet, &mut resolver, &mut summary)?;
        }

        Ok(summary)
    }

    fn localized(&self, row: &SheetRow<'_>, columns: &LocalizedColumns) -> LocalizedText {
        let mut text = columns.read(row);
        fill_missing_targets(self.translator.as_ref(), &mut text);
        text
    }

    // ==========================================
    // Areas / Units / Phases
    // ==========================================

    fn merge_areas(
        &self,
        conn: &Connection,
        sheet: &Sheet,
        resolver: &mut KeyResolver,
        summary: &mut MergeSummary,
    ) -> EngineResult<()> {
        let repo = AreaRepository::new(conn);
        let before = summary.areas;
        for row in sheet.records() {
            let name = row.key(COL_AREA_NAME);
            if name.is_empty() || resolver.area_id(&name).is_some() {
                summary.skipped_rows += 1;
                continue;
            }
            let description = row.raw_text(COL_AREA_DESCRIPTION);
            let area_id = repo.insert(&name, description.as_deref())?;
            resolver.register_area(&name, area_id);
            summary.areas += 1;
        }
        debug!(sheet = %sheet.name, inserted = summary.areas - before, "Areas 合并完成");
        Ok(())
    }

    fn merge_units(
        &self,
        conn: &Connection,
        sheet: &Sheet,
        resolver: &mut KeyResolver,
        summary: &mut MergeSummary,
    ) -> EngineResult<()> {
        let repo = UnitRepository::new(conn);
        let before = summary.units;
        for row in sheet.records() {
            let area = row.key(COL_AREA);
            let unit = row.key(COL_UNIT_NAME);
            let area_id = match resolver.area_id(&area) {
                Some(id) if !unit.is_empty() && !resolver.has_unit_name(&unit) => id,
                _ => {
                    summary.skipped_rows += 1;
                    continue;
                }
            };
            let description = row.raw_text(COL_UNIT_DESCRIPTION);
            let unit_id = repo.insert(area_id, &unit, description.as_deref())?;
            resolver.register_unit(&area, &unit, unit_id);
            summary.units += 1;
        }
        debug!(sheet = %sheet.name, inserted = summary.units - before, "Units 合并完成");
        Ok(())
    }

    fn merge_phases(
        &self,
        conn: &Connection,
        sheet: &Sheet,
        resolver: &mut KeyResolver,
        summary: &mut MergeSummary,
    ) -> EngineResult<()> {
        let repo = PhaseRepository::new(conn);
        let before = summary.phases;
        for row in sheet.records() {
            let area = row.key(COL_AREA);
            let unit = row.key(COL_UNIT);
            let phase = row.key(COL_PHASE);
            let unit_id = match resolver.unit_id(&area, &unit) {
                Some(id) if !phase.is_empty() && !resolver.has_phase(id, &phase) => id,
                _ => {
                    summary.skipped_rows += 1;
                    continue;
                }
            };

            let mut phase_type = row.key(COL_PHASE_TYPE);
            if phase_type.is_empty() {
                phase_type = DEFAULT_PHASE_TYPE.to_string();
            }
            let phase_id = repo.insert(&NewPhase {
                unit_id,
                name: phase.clone(),
                phase_type,
                description: self.localized(&row, &DESC_COLUMNS),
            })?;
            resolver.register_phase(&area, &unit, &phase, unit_id, phase_id);
            summary.phases += 1;
        }
        debug!(sheet = %sheet.name, inserted = summary.phases - before, "Phases 合并完成");
        Ok(())
    }

    // ==========================================
    // Phase 子记录
    // ==========================================

    fn merge_parameters(
        &self,
        conn: &Connection,
        sheet: &Sheet,
        resolver: &mut KeyResolver,
        summary: &mut MergeSummary,
    ) -> EngineResult<()> {
        let repo = ParameterRepository::new(conn);
        let before = summary.parameters;
        for row in sheet.records() {
            let Some(phase_id) = resolve_phase(&row, resolver) else {
                summary.skipped_rows += 1;
                continue;
            };

            let number = required_index(&row, COL_PARAM_NUMBER, i64::MAX)?;
            let class_raw = row.key(COL_PARAM_CLASS);
            let class = ParamClass::parse(&class_raw).ok_or_else(|| {
                invalid(&row, COL_PARAM_CLASS, format!("未知参数类别: '{}'", class_raw))
            })?;
            let data_type_raw = row.key(COL_PARAM_DATA_TYPE);
            let data_type = DataType::parse(&data_type_raw).ok_or_else(|| {
                invalid(&row, COL_PARAM_DATA_TYPE, format!("未知数据类型: '{}'", data_type_raw))
            })?;

            if !resolver.register_parameter(phase_id, class, number) {
                summary.skipped_rows += 1;
                continue;
            }
            repo.insert(&NewParameter {
                phase_id,
                number,
                class,
                data_type,
                description: self.localized(&row, &DESC_COLUMNS),
                default_value: row.raw_text(COL_PARAM_DEFAULT),
                min_value: row.raw_text(COL_PARAM_MIN),
                max_value: row.raw_text(COL_PARAM_MAX),
                eng_unit: row.raw_text(COL_PARAM_ENG_UNIT),
            })?;
            summary.parameters += 1;
        }
        debug!(sheet = %sheet.name, inserted = summary.parameters - before, "Parameters 合并完成");
        Ok(())
    }

    fn merge_steps(
        &self,
        conn: &Connection,
        sheet: &Sheet,
        resolver: &mut KeyResolver,
        summary: &mut MergeSummary,
    ) -> EngineResult<()> {
        let repo = StepRepository::new(conn);
        let before = summary.steps;
        for row in sheet.records() {
            let Some(phase_id) = resolve_phase(&row, resolver) else {
                summary.skipped_rows += 1;
                continue;
            };
            let index = required_index(&row, COL_STEP_INDEX, STEP_SLOTS as i64 - 1)?;
            if !resolver.register_step(phase_id, index) {
                summary.skipped_rows += 1;
                continue;
            }
            repo.insert(&NewStep {
                phase_id,
                index,
                code: step_code(row.get(COL_STEP_NUMBER)),
                description: self.localized(&row, &DESC_COLUMNS),
            })?;
            summary.steps += 1;
        }
        debug!(sheet = %sheet.name, inserted = summary.steps - before, "Steps 合并完成");
        Ok(())
    }

    fn merge_interlocks(
        &self,
        conn: &Connection,
        sheet: &Sheet,
        resolver: &mut KeyResolver,
        summary: &mut MergeSummary,
    ) -> EngineResult<()> {
        let repo = InterlockRepository::new(conn);
        let before = summary.interlocks;
        for row in sheet.records() {
            let Some(phase_id) = resolve_phase(&row, resolver) else {
                summary.skipped_rows += 1;
                continue;
            };
            let Some(bit) = non_negative_int(row.get(COL_INTERLOCK_BIT)) else {
                warn!(sheet = %sheet.name, row = row.row_number, "Bit 不是非负整数，跳过");
                summary.skipped_rows += 1;
                continue;
            };
            if bit >= INTERLOCK_BITS as i64 {
                return Err(invalid(
                    &row,
                    COL_INTERLOCK_BIT,
                    format!("Bit {} 超出范围 0..{}", bit, INTERLOCK_BITS - 1),
                ));
            }
            if !resolver.register_interlock(phase_id, bit) {
                summary.skipped_rows += 1;
                continue;
            }
            repo.insert(&NewInterlock {
                phase_id,
                bit,
                safety: self.localized(&row, &SAFETY_COLUMNS),
                process: self.localized(&row, &PROCESS_COLUMNS),
            })?;
            summary.interlocks += 1;
        }
        debug!(sheet = %sheet.name, inserted = summary.interlocks - before, "Interlocks 合并完成");
        Ok(())
    }

    fn merge_transitions(
        &self,
        conn: &Connection,
        sheet: &Sheet,
        resolver: &mut KeyResolver,
        summary: &mut MergeSummary,
    ) -> EngineResult<()> {
        let repo = TransitionRepository::new(conn);
        let step_columns = step_columns();
        let before = summary.conditions;
        for row in sheet.records() {
            let Some(phase_id) = resolve_phase(&row, resolver) else {
                summary.skipped_rows += 1;
                continue;
            };
            if row.get(COL_TRANSITION_ROW).is_blank() {
                warn!(sheet = %sheet.name, row = row.row_number, "Row_Bit 为空，跳过");
                summary.skipped_rows += 1;
                continue;
            }
            let row_number = required_index(&row, COL_TRANSITION_ROW, TRANSITION_GRID as i64 - 1)?;

            // 行描述: 任一语言非空且 (phase, row) 不存在
            let mut row_desc = ROW_DESC_COLUMNS.read(&row);
            if !row_desc.is_blank() && resolver.register_row_description(phase_id, row_number) {
                fill_missing_targets(self.translator.as_ref(), &mut row_desc);
                repo.insert_row_description(&NewTransitionRowDescription {
                    phase_id,
                    row: row_number,
                    description: row_desc,
                })?;
                summary.row_descriptions += 1;
            }

            // 条件单元格: 去逻辑后缀，清洗后的文本再翻译
            for (step_index, column) in step_columns.iter().enumerate() {
                let cell = row.get(&[column.as_str()]);
                if cell.is_blank() {
                    continue;
                }
                let step_index = step_index as i64;
                if !resolver.register_condition(phase_id, step_index, row_number) {
                    continue;
                }
                let raw = cell.to_string();
                let (text, logic) = parse_logic(Some(&raw));
                let (en, es) = self
                    .translator
                    .translate(text.as_deref().unwrap_or_default());
                repo.insert_condition(&NewTransitionCondition {
                    phase_id,
                    step_index,
                    row: row_number,
                    logic,
                    text: LocalizedText::new(text, Some(en), Some(es)),
                })?;
                summary.conditions += 1;
            }
        }
        debug!(
            sheet = %sheet.name,
            conditions = summary.conditions - before,
            "Transitions 合并完成"
        );
        Ok(())
    }
}

// ==========================================
// 行级辅助函数
// ==========================================

fn resolve_phase(row: &SheetRow<'_>, resolver: &KeyResolver) -> Option<i64> {
    resolver.phase_id(&row.key(COL_AREA), &row.key(COL_UNIT), &row.key(COL_PHASE))
}

fn invalid(row: &SheetRow<'_>, columns: &[&str], message: String) -> EngineError {
    EngineError::validation(row.sheet_name(), row.row_number, columns[0], message)
}

/// 必填的非负整数键列，超过 max 视为越界
fn required_index(row: &SheetRow<'_>, columns: &[&str], max: i64) -> EngineResult<i64> {
    let cell = row.get(columns);
    let value = cell
        .as_i64()
        .ok_or_else(|| invalid(row, columns, format!("不是整数: '{}'", cell)))?;
    if value < 0 || value > max {
        return Err(invalid(row, columns, format!("{} 超出范围 0..{}", value, max)));
    }
    Ok(value)
}

/// 仅接受纯数字文本或整数值数字单元格
fn non_negative_int(cell: &CellValue) -> Option<i64> {
    let text = cell.trimmed_text()?;
    if text.chars().all(|c| c.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}

/// 步骤号: 去掉首个 '.' 及其后内容（`10.0` → `10`），空白为 None
fn step_code(cell: &CellValue) -> Option<String> {
    let text = cell.trimmed_text()?;
    let code = text.split('.').next().unwrap_or_default().trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_catalog;
    use crate::engine::translation::PassThroughTranslator;

    fn engine() -> MergeEngine {
        MergeEngine::new(Arc::new(PassThroughTranslator))
    }

    fn base_workbook() -> Workbook {
        let mut workbook = Workbook::new();
        let mut areas = Sheet::with_columns("Areas", &["Area_Name", "Area_Description"]);
        areas.push_row(vec!["Utilities".into(), CellValue::Empty]);
        workbook.add_sheet(areas);

        let mut units = Sheet::with_columns("Units", &["Area", "Unit_Name", "Unit_Description"]);
        units.push_row(vec!["Utilities".into(), "Boiler1".into(), CellValue::Empty]);
        workbook.add_sheet(units);

        let mut phases = Sheet::with_columns(
            "Phases",
            &["Area", "Unit", "Phase", "Type", "Desc_1046", "Desc_1033", "Desc_3082"],
        );
        phases.push_row(vec![
            "Utilities".into(),
            "Boiler1".into(),
            "PH01".into(),
            CellValue::Empty,
            "desc".into(),
            CellValue::Empty,
            CellValue::Empty,
        ]);
        workbook.add_sheet(phases);
        workbook
    }

    #[test]
    fn test_step_code() {
        assert_eq!(step_code(&CellValue::text("10.0")), Some("10".to_string()));
        assert_eq!(step_code(&CellValue::Number(20.0)), Some("20".to_string()));
        assert_eq!(step_code(&CellValue::text("S1")), Some("S1".to_string()));
        assert_eq!(step_code(&CellValue::Empty), None);
    }

    #[test]
    fn test_non_negative_int() {
        assert_eq!(non_negative_int(&CellValue::Number(3.0)), Some(3));
        assert_eq!(non_negative_int(&CellValue::text("12")), Some(12));
        assert_eq!(non_negative_int(&CellValue::text("-1")), None);
        assert_eq!(non_negative_int(&CellValue::text("x")), None);
        assert_eq!(non_negative_int(&CellValue::Empty), None);
    }

    #[test]
    fn test_phase_type_defaults_and_translation_fill() {
        let mut conn = open_in_memory_catalog().unwrap();
        let summary = engine().merge(&mut conn, &base_workbook()).unwrap();
        assert_eq!(summary.areas, 1);
        assert_eq!(summary.units, 1);
        assert_eq!(summary.phases, 1);

        let phases = PhaseRepository::new(&conn)
            .list_records(&crate::repository::PhaseFilter::all(), None)
            .unwrap();
        assert_eq!(phases[0].phase.phase_type, DEFAULT_PHASE_TYPE);
        assert_eq!(phases[0].phase.description.en.as_deref(), Some("desc"));
        assert_eq!(phases[0].phase.description.es.as_deref(), Some("desc"));
    }

    #[test]
    fn test_second_merge_inserts_nothing() {
        let mut conn = open_in_memory_catalog().unwrap();
        engine().merge(&mut conn, &base_workbook()).unwrap();
        let second = engine().merge(&mut conn, &base_workbook()).unwrap();
        assert_eq!(second.total_inserted(), 0);
        assert_eq!(second.skipped_rows, 3);
    }

    #[test]
    fn test_invalid_parameter_class_rolls_back() {
        let mut conn = open_in_memory_catalog().unwrap();
        let mut workbook = base_workbook();
        let mut params = Sheet::with_columns(
            "Parameters",
            &["Area", "Unit", "Phase", "Class", "Number", "Data_Type"],
        );
        params.push_row(vec![
            "Utilities".into(),
            "Boiler1".into(),
            "PH01".into(),
            "PX".into(),
            CellValue::int(1),
            "real".into(),
        ]);
        workbook.add_sheet(params);

        let err = engine().merge(&mut conn, &workbook).unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailure { .. }));
        assert!(AreaRepository::new(&conn).list_all().unwrap().is_empty());
    }
}
