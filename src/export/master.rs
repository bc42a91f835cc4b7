// ==========================================
// 工艺主数据目录 - 主数据投影
// ==========================================
// 职责: 目录 → 七张主数据工作表（与合并引擎读取的列名一致）
// 排序: 区域 → 单元 → Phase → 次级键
// 红线: 只读；读取经由 Repository
// ==========================================

use crate::domain::catalog::{LocalizedText, PhaseRecord};
use crate::domain::master_layout::*;
use crate::domain::sheet::{CellValue, Sheet, Workbook};
use crate::domain::types::{Locale, INTERLOCK_BITS, TRANSITION_GRID};
use crate::engine::error::EngineResult;
use crate::repository::{
    AreaRepository, InterlockRepository, ParameterRepository, PhaseFilter, PhaseRepository,
    StepRepository, TransitionRepository, UnitRepository,
};
use rusqlite::Connection;
use std::collections::HashMap;
use tracing::info;

/// 键列 + 其余列名 → 表头
fn header(keys: &[&[&str]], rest: Vec<String>) -> Vec<String> {
    keys.iter()
        .map(|names| names[0].to_string())
        .chain(rest)
        .collect()
}

fn canonical(names: &[&str]) -> String {
    names[0].to_string()
}

/// 三语文本按 pt / en / es 列顺序
fn localized_cells(text: &LocalizedText) -> impl Iterator<Item = CellValue> + '_ {
    Locale::COLUMN_ORDER
        .into_iter()
        .map(move |locale| CellValue::opt_text(text.get(locale)))
}

fn phase_key_cells(record: &PhaseRecord) -> Vec<CellValue> {
    vec![
        CellValue::text(record.area_name.as_str()),
        CellValue::text(record.unit_name.as_str()),
        CellValue::text(record.phase.name.as_str()),
    ]
}

fn all_phases(conn: &Connection) -> EngineResult<Vec<PhaseRecord>> {
    Ok(PhaseRepository::new(conn).list_records(&PhaseFilter::all(), None)?)
}

// ==========================================
// 单表投影
// ==========================================

pub fn areas_sheet(conn: &Connection) -> EngineResult<Sheet> {
    let mut sheet = Sheet::new(
        SHEET_AREAS[0],
        vec![canonical(COL_AREA_NAME), canonical(COL_AREA_DESCRIPTION)],
    );
    for area in AreaRepository::new(conn).list_all()? {
        sheet.push_row(vec![
            CellValue::text(area.name),
            CellValue::opt_text(area.description.as_deref()),
        ]);
    }
    Ok(sheet)
}

pub fn units_sheet(conn: &Connection) -> EngineResult<Sheet> {
    let mut sheet = Sheet::new(
        SHEET_UNITS[0],
        header(
            &[COL_AREA],
            vec![canonical(COL_UNIT_NAME), canonical(COL_UNIT_DESCRIPTION)],
        ),
    );
    for record in UnitRepository::new(conn).list_records(None)? {
        sheet.push_row(vec![
            CellValue::text(record.area_name),
            CellValue::text(record.unit.name),
            CellValue::opt_text(record.unit.description.as_deref()),
        ]);
    }
    Ok(sheet)
}

pub fn phases_sheet(conn: &Connection) -> EngineResult<Sheet> {
    let mut rest = vec![canonical(COL_PHASE_TYPE)];
    rest.extend(DESC_COLUMNS.columns());
    let mut sheet = Sheet::new(SHEET_PHASES[0], header(&[COL_AREA, COL_UNIT, COL_PHASE], rest));

    for record in all_phases(conn)? {
        let mut row = phase_key_cells(&record);
        row.push(CellValue::text(record.phase.phase_type.as_str()));
        row.extend(localized_cells(&record.phase.description));
        sheet.push_row(row);
    }
    Ok(sheet)
}

/// 参数按 Class → Number 排序
pub fn parameters_sheet(conn: &Connection) -> EngineResult<Sheet> {
    let mut rest = vec![
        canonical(COL_PARAM_CLASS),
        canonical(COL_PARAM_NUMBER),
        canonical(COL_PARAM_DATA_TYPE),
    ];
    rest.extend(DESC_COLUMNS.columns());
    rest.extend(
        [COL_PARAM_DEFAULT, COL_PARAM_MIN, COL_PARAM_MAX, COL_PARAM_ENG_UNIT]
            .iter()
            .map(|c| canonical(c)),
    );
    let mut sheet = Sheet::new(
        SHEET_PARAMETERS[0],
        header(&[COL_AREA, COL_UNIT, COL_PHASE], rest),
    );

    let repo = ParameterRepository::new(conn);
    for record in all_phases(conn)? {
        for param in repo.list_by_phase(record.phase.phase_id)? {
            let mut row = phase_key_cells(&record);
            row.push(CellValue::text(param.class.as_str()));
            row.push(CellValue::int(param.number));
            row.push(CellValue::text(param.data_type.as_str()));
            row.extend(localized_cells(&param.description));
            row.push(CellValue::opt_text(param.default_value.as_deref()));
            row.push(CellValue::opt_text(param.min_value.as_deref()));
            row.push(CellValue::opt_text(param.max_value.as_deref()));
            row.push(CellValue::opt_text(param.eng_unit.as_deref()));
            sheet.push_row(row);
        }
    }
    Ok(sheet)
}

pub fn steps_sheet(conn: &Connection) -> EngineResult<Sheet> {
    let mut rest = vec![canonical(COL_STEP_INDEX), canonical(COL_STEP_NUMBER)];
    rest.extend(DESC_COLUMNS.columns());
    let mut sheet = Sheet::new(SHEET_STEPS[0], header(&[COL_AREA, COL_UNIT, COL_PHASE], rest));

    let repo = StepRepository::new(conn);
    for record in all_phases(conn)? {
        for step in repo.list_by_phase(record.phase.phase_id)? {
            let mut row = phase_key_cells(&record);
            row.push(CellValue::int(step.index));
            row.push(CellValue::opt_text(step.code.as_deref()));
            row.extend(localized_cells(&step.description));
            sheet.push_row(row);
        }
    }
    Ok(sheet)
}

/// 每个 Phase 固定 32 行，缺失位留空
pub fn interlocks_sheet(conn: &Connection) -> EngineResult<Sheet> {
    let mut rest = vec![canonical(COL_INTERLOCK_BIT)];
    rest.extend(SAFETY_COLUMNS.columns());
    rest.extend(PROCESS_COLUMNS.columns());
    let mut sheet = Sheet::new(
        SHEET_INTERLOCKS[0],
        header(&[COL_AREA, COL_UNIT, COL_PHASE], rest),
    );

    let repo = InterlockRepository::new(conn);
    let empty = LocalizedText::default();
    for record in all_phases(conn)? {
        let by_bit: HashMap<i64, _> = repo
            .list_by_phase(record.phase.phase_id)?
            .into_iter()
            .map(|i| (i.bit, i))
            .collect();

        for bit in 0..INTERLOCK_BITS as i64 {
            let interlock = by_bit.get(&bit);
            let mut row = phase_key_cells(&record);
            row.push(CellValue::int(bit));
            row.extend(localized_cells(interlock.map(|i| &i.safety).unwrap_or(&empty)));
            row.extend(localized_cells(interlock.map(|i| &i.process).unwrap_or(&empty)));
            sheet.push_row(row);
        }
    }
    Ok(sheet)
}

/// 每个 Phase 固定 32 行 × Step_0..Step_31
///
/// 单元格为源语言文本加逻辑后缀；源语言文本为空的条件不输出
pub fn transitions_sheet(conn: &Connection) -> EngineResult<Sheet> {
    let mut rest = vec![canonical(COL_TRANSITION_ROW)];
    rest.extend(ROW_DESC_COLUMNS.columns());
    rest.extend(step_columns());
    let mut sheet = Sheet::new(
        SHEET_TRANSITIONS[0],
        header(&[COL_AREA, COL_UNIT, COL_PHASE], rest),
    );

    let repo = TransitionRepository::new(conn);
    let empty = LocalizedText::default();
    for record in all_phases(conn)? {
        let phase_id = record.phase.phase_id;
        let descriptions: HashMap<i64, LocalizedText> = repo
            .list_row_descriptions(phase_id)?
            .into_iter()
            .map(|d| (d.row, d.description))
            .collect();
        let mut grid = vec![vec![CellValue::Empty; TRANSITION_GRID]; TRANSITION_GRID];
        for condition in repo.list_conditions(phase_id)? {
            let (row, step) = (condition.row as usize, condition.step_index as usize);
            if row >= TRANSITION_GRID || step >= TRANSITION_GRID {
                continue;
            }
            if let Some(text) = condition.cell_text(Locale::SOURCE) {
                grid[row][step] = CellValue::text(text);
            }
        }

        for (row_bit, cells) in grid.into_iter().enumerate() {
            let mut row = phase_key_cells(&record);
            row.push(CellValue::int(row_bit as i64));
            row.extend(localized_cells(
                descriptions.get(&(row_bit as i64)).unwrap_or(&empty),
            ));
            row.extend(cells);
            sheet.push_row(row);
        }
    }
    Ok(sheet)
}

// ==========================================
// 主数据工作簿
// ==========================================

/// 七张工作表，顺序与合并顺序一致
pub fn master_workbook(conn: &Connection) -> EngineResult<Workbook> {
    let mut workbook = Workbook::new();
    workbook.add_sheet(areas_sheet(conn)?);
    workbook.add_sheet(units_sheet(conn)?);
    workbook.add_sheet(phases_sheet(conn)?);
    workbook.add_sheet(parameters_sheet(conn)?);
    workbook.add_sheet(steps_sheet(conn)?);
    workbook.add_sheet(interlocks_sheet(conn)?);
    workbook.add_sheet(transitions_sheet(conn)?);

    info!(
        sheets = workbook.sheets.len(),
        rows = workbook.sheets.iter().map(Sheet::len).sum::<usize>(),
        "主数据投影完成"
    );
    Ok(workbook)
}
