// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 级联删除范围、自然键唯一性、参数名派生、槽位约束
// ==========================================


use phase_catalog::domain::{NewParameter, NewPhase, NewStep};
use phase_catalog::repository::{
    clear_catalog, AreaRepository, ParameterRepository, PhaseFilter, PhaseRepository,
    RepositoryError, StepRepository, UnitRepository,
};
use phase_catalog::{DataType, LocalizedText, ParamClass, Sheet};
use test_helpers::*;

const CHILD_TABLES: [&str; 5] = [
    "parameters",
    "steps",
    "interlocks",
    "transition_row_descriptions",
    "transition_conditions",
];

/// 样例目录 + 第二个区域 Packaging / Filler1 / PH01
fn two_area_catalog() -> rusqlite::Connection {
    let mut conn = seeded_catalog();
    let mut workbook = sample_workbook();
    for sheet in workbook.sheets.iter_mut() {
        rename_keys(sheet);
    }
    merge_engine().merge(&mut conn, &workbook).unwrap();
    conn
}

fn rename_keys(sheet: &mut Sheet) {
    for row in sheet.rows.iter_mut() {
        for cell in row.iter_mut() {
            match cell.trimmed_text().as_deref() {
                Some("Utilities") => *cell = "Packaging".into(),
                Some("Boiler1") => *cell = "Filler1".into(),
                _ => {}
            }
        }
    }
}

#[test]
fn test_delete_area_cascades_only_own_descendants() {
    let conn = two_area_catalog();
    for table in CHILD_TABLES {
        assert!(count_rows(&conn, table) > 0, "{} should be seeded", table);
    }
    let per_area: Vec<i64> = CHILD_TABLES.iter().map(|t| count_rows(&conn, t) / 2).collect();

    let utilities = AreaRepository::new(&conn)
        .find_by_name("Utilities")
        .unwrap()
        .unwrap();
    assert!(AreaRepository::new(&conn).delete(utilities.area_id).unwrap());

    let units = UnitRepository::new(&conn).list_records(None).unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].unit.name, "Filler1");

    let phases = PhaseRepository::new(&conn)
        .list_records(&PhaseFilter::all(), None)
        .unwrap();
    assert_eq!(phases.len(), 1);
    assert_eq!(phases[0].area_name, "Packaging");

    let remaining: Vec<i64> = CHILD_TABLES.iter().map(|t| count_rows(&conn, t)).collect();
    assert_eq!(remaining, per_area);
}

#[test]
fn test_delete_unit_cascades_phases() {
    let conn = seeded_catalog();
    let unit = &UnitRepository::new(&conn).list_records(None).unwrap()[0];
    assert!(UnitRepository::new(&conn).delete(unit.unit.unit_id).unwrap());

    assert_eq!(count_rows(&conn, "phases"), 0);
    assert_eq!(count_rows(&conn, "transition_conditions"), 0);
    assert_eq!(count_rows(&conn, "areas"), 1);
}

#[test]
fn test_unit_name_unique_across_areas() {
    let conn = create_test_catalog();
    let areas = AreaRepository::new(&conn);
    let a = areas.insert("A", None).unwrap();
    let b = areas.insert("B", None).unwrap();

    let units = UnitRepository::new(&conn);
    units.insert(a, "U1", None).unwrap();
    let err = units.insert(b, "U1", None).unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
}

#[test]
fn test_phase_name_unique_per_unit_only() {
    let conn = create_test_catalog();
    let area = AreaRepository::new(&conn).insert("A", None).unwrap();
    let units = UnitRepository::new(&conn);
    let u1 = units.insert(area, "U1", None).unwrap();
    let u2 = units.insert(area, "U2", None).unwrap();

    let phases = PhaseRepository::new(&conn);
    let phase = |unit_id| NewPhase {
        unit_id,
        name: "PH01".to_string(),
        phase_type: "PH".to_string(),
        description: LocalizedText::default(),
    };
    phases.insert(&phase(u1)).unwrap();
    phases.insert(&phase(u2)).unwrap();
    let err = phases.insert(&phase(u1)).unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
}

#[test]
fn test_parameter_name_follows_class_and_number() {
    let conn = seeded_catalog();
    let phase_id = phase_id(&conn, "PH01");
    let repo = ParameterRepository::new(&conn);

    let param_id = repo
        .insert(&NewParameter {
            phase_id,
            number: 3,
            class: ParamClass::PA,
            data_type: DataType::Integer,
            description: LocalizedText::default(),
            default_value: None,
            min_value: None,
            max_value: None,
            eng_unit: None,
        })
        .unwrap();
    let mut param = repo.find_by_id(param_id).unwrap().unwrap();
    assert_eq!(param.name, "PA003");

    param.class = ParamClass::PR;
    param.number = 120;
    repo.update(&param).unwrap();
    assert_eq!(repo.find_by_id(param_id).unwrap().unwrap().name, "PR120");

    for p in repo.list_by_phase(phase_id).unwrap() {
        assert_eq!(p.name, format!("{}{:03}", p.class.as_str(), p.number));
    }
}

#[test]
fn test_step_slot_out_of_range_rejected() {
    let conn = seeded_catalog();
    let phase_id = phase_id(&conn, "PH01");
    let err = StepRepository::new(&conn)
        .insert(&NewStep {
            phase_id,
            index: 50,
            code: None,
            description: LocalizedText::default(),
        })
        .unwrap_err();
    assert!(matches!(err, RepositoryError::CheckConstraintViolation(_)));
}

#[test]
fn test_clear_catalog_empties_every_table() {
    let conn = two_area_catalog();
    clear_catalog(&conn).unwrap();
    for table in ["areas", "units", "phases"].iter().chain(CHILD_TABLES.iter()) {
        assert_eq!(count_rows(&conn, table), 0, "{} not cleared", table);
    }
}
