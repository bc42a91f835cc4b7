// ==========================================
// 合并引擎集成测试
// ==========================================
// 测试目标: 幂等合并、全量导入回滚、历史工作簿名称、导出再合并
// ==========================================


use phase_catalog::engine::EngineError;
use phase_catalog::export::master_workbook;
use phase_catalog::logging;
use phase_catalog::repository::{
    AreaRepository, InterlockRepository, ParameterRepository, PhaseFilter, PhaseRepository,
    StepRepository, TransitionRepository,
};
use phase_catalog::{CellValue, ConditionLogic, Sheet, Workbook};
use test_helpers::*;

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_hierarchy_merge_into_empty_catalog() {
    logging::init_test();

    let mut conn = create_test_catalog();
    let summary = merge_engine()
        .merge(&mut conn, &hierarchy_workbook())
        .expect("merge failed");

    assert_eq!(summary.areas, 1);
    assert_eq!(summary.units, 1);
    assert_eq!(summary.phases, 1);

    let records = PhaseRepository::new(&conn)
        .list_records(&PhaseFilter::all(), None)
        .unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.area_name, "Utilities");
    assert_eq!(record.unit_name, "Boiler1");
    assert_eq!(record.phase.name, "PH01");
    assert_eq!(record.phase.phase_type, "PH");

    // 翻译不可用时原文复制到目标语言
    let description = &record.phase.description;
    assert_eq!(description.pt.as_deref(), Some("desc"));
    assert_eq!(description.en.as_deref(), Some("desc"));
    assert_eq!(description.es.as_deref(), Some("desc"));
}

#[test]
fn test_full_sample_merge_counts() {
    let mut conn = create_test_catalog();
    let summary = merge_engine()
        .merge(&mut conn, &sample_workbook())
        .expect("merge failed");

    assert_eq!(summary.parameters, 2);
    assert_eq!(summary.steps, 2);
    assert_eq!(summary.interlocks, 1);
    assert_eq!(summary.row_descriptions, 1);
    assert_eq!(summary.conditions, 2);
    assert_eq!(summary.skipped_rows, 0);

    let phase_id = phase_id(&conn, "PH01");
    let params = ParameterRepository::new(&conn).list_by_phase(phase_id).unwrap();
    let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["PE002", "PR001"]);
    let pr = params.iter().find(|p| p.name == "PR001").unwrap();
    assert_eq!(pr.description.en.as_deref(), Some("Temperature"));
    assert_eq!(pr.description.es.as_deref(), Some("Temperatura"));

    let steps = StepRepository::new(&conn).list_by_phase(phase_id).unwrap();
    assert_eq!(steps[0].code.as_deref(), Some("10"));
    assert_eq!(steps[1].code, None);

    let conditions = TransitionRepository::new(&conn).list_conditions(phase_id).unwrap();
    let and_cell = conditions
        .iter()
        .find(|c| c.step_index == 3 && c.row == 5)
        .expect("condition at step 3 row 5");
    assert_eq!(and_cell.text.pt.as_deref(), Some("X=1"));
    assert_eq!(and_cell.logic, ConditionLogic::And);
    let plain = conditions.iter().find(|c| c.step_index == 4).unwrap();
    assert_eq!(plain.logic, ConditionLogic::NotApplicable);
}

#[test]
fn test_second_merge_is_idempotent() {
    let mut conn = seeded_catalog();
    let before = master_workbook(&conn).unwrap();
    let counts_before: Vec<i64> = ["areas", "units", "phases", "parameters", "steps", "interlocks"]
        .iter()
        .map(|t| count_rows(&conn, t))
        .collect();

    let second = merge_engine()
        .merge(&mut conn, &sample_workbook())
        .expect("second merge must not fail");
    assert_eq!(second.total_inserted(), 0);

    let counts_after: Vec<i64> = ["areas", "units", "phases", "parameters", "steps", "interlocks"]
        .iter()
        .map(|t| count_rows(&conn, t))
        .collect();
    assert_eq!(counts_before, counts_after);
    assert_eq!(before, master_workbook(&conn).unwrap());
}

#[test]
fn test_merge_never_overwrites_existing_rows() {
    let mut conn = seeded_catalog();

    let mut workbook = Workbook::new();
    let mut areas = Sheet::with_columns("Areas", &["Area_Name", "Area_Description"]);
    areas.push_row(vec!["Utilities".into(), "changed".into()]);
    areas.push_row(vec!["Packaging".into(), CellValue::Empty]);
    workbook.add_sheet(areas);

    let summary = merge_engine().merge(&mut conn, &workbook).unwrap();
    assert_eq!(summary.areas, 1);
    assert_eq!(summary.skipped_rows, 1);

    let utilities = AreaRepository::new(&conn)
        .find_by_name("Utilities")
        .unwrap()
        .unwrap();
    assert_eq!(utilities.description, None);
}

#[test]
fn test_rows_with_unknown_parent_are_skipped() {
    let mut conn = create_test_catalog();
    let mut workbook = Workbook::new();
    let mut units = Sheet::with_columns("Units", &["Area", "Unit_Name"]);
    units.push_row(vec!["Nowhere".into(), "Boiler9".into()]);
    workbook.add_sheet(units);

    let summary = merge_engine().merge(&mut conn, &workbook).unwrap();
    assert_eq!(summary.total_inserted(), 0);
    assert_eq!(summary.skipped_rows, 1);
}

#[test]
fn test_parent_inserted_earlier_in_same_workbook_resolves() {
    // 同一工作簿内 Area 与 Unit 同时新增
    let mut conn = create_test_catalog();
    let mut workbook = hierarchy_workbook();
    let units = workbook
        .sheets
        .iter_mut()
        .find(|s| s.name == "Units")
        .unwrap();
    units.push_row(vec!["Utilities".into(), "Boiler2".into(), CellValue::Empty]);

    let summary = merge_engine().merge(&mut conn, &workbook).unwrap();
    assert_eq!(summary.units, 2);
}

#[test]
fn test_import_full_replaces_catalog() {
    let mut conn = seeded_catalog();

    let mut workbook = Workbook::new();
    let mut areas = Sheet::with_columns("Areas", &["Area_Name"]);
    areas.push_row(vec!["Packaging".into()]);
    workbook.add_sheet(areas);

    merge_engine().import_full(&mut conn, &workbook).unwrap();

    let names: Vec<String> = AreaRepository::new(&conn)
        .list_all()
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(names, vec!["Packaging".to_string()]);
    assert_eq!(count_rows(&conn, "transition_conditions"), 0);
    assert_eq!(count_rows(&conn, "parameters"), 0);
}

#[test]
fn test_import_full_failure_keeps_prior_catalog() {
    let mut conn = seeded_catalog();
    let phase_id = phase_id(&conn, "PH01");

    let mut workbook = hierarchy_workbook();
    let mut params = Sheet::with_columns(
        "Parameters",
        &["Area", "Unit", "Phase", "Class", "Number", "Data_Type"],
    );
    params.push_row(vec![
        "Utilities".into(),
        "Boiler1".into(),
        "PH01".into(),
        "PR".into(),
        "abc".into(),
        "real".into(),
    ]);
    workbook.add_sheet(params);

    let err = merge_engine().import_full(&mut conn, &workbook).unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailure { .. }));

    assert_eq!(count_rows(&conn, "areas"), 1);
    assert_eq!(
        ParameterRepository::new(&conn).list_by_phase(phase_id).unwrap().len(),
        2
    );
    assert_eq!(
        InterlockRepository::new(&conn).list_by_phase(phase_id).unwrap().len(),
        1
    );
}

#[test]
fn test_interlock_bit_out_of_range_aborts_merge() {
    let mut conn = create_test_catalog();
    let mut workbook = hierarchy_workbook();
    let mut interlocks = Sheet::with_columns("Interlocks", &["Area", "Unit", "Phase", "Bit"]);
    interlocks.push_row(vec![
        "Utilities".into(),
        "Boiler1".into(),
        "PH01".into(),
        CellValue::int(32),
    ]);
    workbook.add_sheet(interlocks);

    let err = merge_engine().merge(&mut conn, &workbook).unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailure { .. }));
    assert_eq!(count_rows(&conn, "areas"), 0);
}

#[test]
fn test_interlock_non_integer_bit_is_skipped() {
    let mut conn = create_test_catalog();
    let mut workbook = hierarchy_workbook();
    let mut interlocks = Sheet::with_columns(
        "Interlocks",
        &["Area", "Unit", "Phase", "Bit", "Safety_1046"],
    );
    interlocks.push_row(vec![
        "Utilities".into(),
        "Boiler1".into(),
        "PH01".into(),
        "x".into(),
        "Porta".into(),
    ]);
    workbook.add_sheet(interlocks);

    let summary = merge_engine().merge(&mut conn, &workbook).unwrap();
    assert_eq!(summary.interlocks, 0);
    assert_eq!(summary.skipped_rows, 1);
}

#[test]
fn test_transition_blank_row_bit_is_skipped() {
    let mut conn = create_test_catalog();
    let mut workbook = hierarchy_workbook();
    let mut transitions = Sheet::with_columns(
        "Transitions",
        &["Area", "Unit", "Phase", "Row_Bit", "Step_0"],
    );
    transitions.push_row(vec![
        "Utilities".into(),
        "Boiler1".into(),
        "PH01".into(),
        CellValue::Empty,
        "A=1".into(),
    ]);
    transitions.push_row(vec![
        "Utilities".into(),
        "Boiler1".into(),
        "PH01".into(),
        CellValue::int(2),
        "B=1 OR".into(),
    ]);
    workbook.add_sheet(transitions);

    let summary = merge_engine().merge(&mut conn, &workbook).unwrap();
    assert_eq!(summary.conditions, 1);
    assert_eq!(summary.skipped_rows, 1);

    let phase_id = phase_id(&conn, "PH01");
    let conditions = TransitionRepository::new(&conn).list_conditions(phase_id).unwrap();
    assert_eq!(conditions.len(), 1);
    assert_eq!(conditions[0].row, 2);
    assert_eq!(conditions[0].logic, ConditionLogic::Or);
}

#[test]
fn test_transition_non_integer_row_bit_aborts_merge() {
    let mut conn = create_test_catalog();
    let mut workbook = hierarchy_workbook();
    let mut transitions = Sheet::with_columns("Transitions", &["Area", "Unit", "Phase", "Row_Bit"]);
    transitions.push_row(vec![
        "Utilities".into(),
        "Boiler1".into(),
        "PH01".into(),
        "x".into(),
    ]);
    workbook.add_sheet(transitions);

    let err = merge_engine().merge(&mut conn, &workbook).unwrap_err();
    assert!(matches!(err, EngineError::ValidationFailure { .. }));
}

#[test]
fn test_legacy_sheet_and_column_names_accepted() {
    let mut conn = create_test_catalog();
    let mut workbook = Workbook::new();

    let mut areas = Sheet::with_columns("Areas", &["Nome_Area", "Descricao_Area"]);
    areas.push_row(vec!["Utilities".into(), "Utilidades".into()]);
    workbook.add_sheet(areas);

    let mut units = Sheet::with_columns("Unidades", &["Area", "Nome_Unidade"]);
    units.push_row(vec!["Utilities".into(), "Boiler1".into()]);
    workbook.add_sheet(units);

    let mut phases = Sheet::with_columns("Phases", &["Area", "Unidade", "Phase", "Tipo", "Desc_PT"]);
    phases.push_row(vec![
        "Utilities".into(),
        "Boiler1".into(),
        "PH01".into(),
        "PH".into(),
        "Aquecimento".into(),
    ]);
    workbook.add_sheet(phases);

    let mut steps = Sheet::with_columns("Passos", &["Area", "Unidade", "Phase", "Index", "Desc_PT"]);
    steps.push_row(vec![
        "Utilities".into(),
        "Boiler1".into(),
        "PH01".into(),
        CellValue::int(0),
        "Encher".into(),
    ]);
    workbook.add_sheet(steps);

    let summary = merge_engine().merge(&mut conn, &workbook).unwrap();
    assert_eq!(summary.areas, 1);
    assert_eq!(summary.units, 1);
    assert_eq!(summary.phases, 1);
    assert_eq!(summary.steps, 1);

    let phase_id = phase_id(&conn, "PH01");
    let steps = StepRepository::new(&conn).list_by_phase(phase_id).unwrap();
    assert_eq!(steps[0].description.pt.as_deref(), Some("Encher"));
}

#[test]
fn test_exported_master_merges_into_identical_catalog() {
    let source = seeded_catalog();
    let exported = master_workbook(&source).unwrap();

    let mut target = create_test_catalog();
    merge_engine().merge(&mut target, &exported).unwrap();

    assert_eq!(exported, master_workbook(&target).unwrap());
}
