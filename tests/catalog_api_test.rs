// ==========================================
// 目录 API / 异步命令集成测试
// ==========================================
// 测试目标: 项目注册表 → 文件合并 → 查询 → 导出 的完整链路
// ==========================================


use phase_catalog::api::{ApiError, PhaseEdit};
use phase_catalog::app::commands;
use phase_catalog::export::workbook_to_xlsx;
use phase_catalog::importer::ExcelParser;
use phase_catalog::{logging, AppState, CatalogConfig, LocalizedText, PhaseFilter};
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;
use test_helpers::*;

/// 临时目录下的应用状态（离线翻译）
fn test_state() -> (TempDir, AppState) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let state = AppState::with_translator(CatalogConfig::with_folder(dir.path()), translator());
    (dir, state)
}

/// 把样例工作簿写成 xlsx 文件
fn write_sample_xlsx(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("master.xlsx");
    let bytes = workbook_to_xlsx(&sample_workbook()).expect("xlsx write failed");
    std::fs::write(&path, bytes).expect("Failed to write xlsx");
    path
}

#[tokio::test]
async fn test_project_lifecycle() {
    logging::init_test();
    let (_dir, state) = test_state();

    commands::create_project(&state, "plant_a").await.unwrap();
    commands::create_project(&state, "plant_b").await.unwrap();
    assert_eq!(
        commands::list_projects(&state).await.unwrap(),
        vec!["plant_a".to_string(), "plant_b".to_string()]
    );

    let err = commands::create_project(&state, "plant_a").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    let err = commands::create_project(&state, "bad name").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    commands::delete_project(&state, "plant_b").await.unwrap();
    assert_eq!(commands::list_projects(&state).await.unwrap(), vec!["plant_a".to_string()]);

    let err = commands::list_phases(&state, "plant_b", PhaseFilter::all(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_merge_file_then_export() {
    let (dir, state) = test_state();
    commands::create_project(&state, "plant").await.unwrap();
    let path = write_sample_xlsx(&dir);

    let summary = commands::merge_file(&state, "plant", path.clone()).await.unwrap();
    assert_eq!(summary.phases, 1);
    assert_eq!(summary.conditions, 2);

    // 同一文件再次合并不插入任何行
    let again = commands::merge_file(&state, "plant", path).await.unwrap();
    assert_eq!(again.total_inserted(), 0);

    let phases = commands::list_phases(&state, "plant", PhaseFilter::all(), None)
        .await
        .unwrap();
    assert_eq!(phases.len(), 1);
    assert_eq!(phases[0].tag_prefix(), "Utilities_PH01");

    let xlsx = commands::export_master_xlsx(&state, "plant").await.unwrap();
    let parsed = ExcelParser.parse_bytes(&xlsx).unwrap();
    assert_eq!(parsed.sheet(&["Transitions"]).unwrap().len(), 32);

    let csv = commands::export_master_csv(&state, "plant", "Areas").await.unwrap();
    let text = String::from_utf8(csv).unwrap();
    assert_eq!(text.lines().next(), Some("Area_Name,Area_Description"));

    let zip_bytes = commands::export_steps_zip(&state, "plant", PhaseFilter::all())
        .await
        .unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(zip_bytes)).unwrap();
    assert_eq!(archive.len(), 1);

    let transitions = commands::export_transitions_csv(&state, "plant", PhaseFilter::all())
        .await
        .unwrap();
    let text = String::from_utf8(transitions).unwrap();
    assert!(text.starts_with(":TEMPLATE=$NRK100_Procedure_Transitions_G"));
    assert!(text.contains("X=1 AND"));

    state.shutdown().unwrap();
}

#[tokio::test]
async fn test_import_file_rejects_unsupported_extension() {
    let (dir, state) = test_state();
    commands::create_project(&state, "plant").await.unwrap();
    let path = dir.path().join("master.txt");
    std::fs::write(&path, "nothing").unwrap();

    let err = commands::import_file(&state, "plant", path).await.unwrap_err();
    assert!(matches!(err, ApiError::ImportError(_)));
}

#[tokio::test]
async fn test_export_steps_xml_unknown_phase() {
    let (_dir, state) = test_state();
    commands::create_project(&state, "plant").await.unwrap();

    let err = commands::export_steps_xml(&state, "plant", 42).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_crud_through_catalog_api() {
    let (_dir, state) = test_state();
    commands::create_project(&state, "plant").await.unwrap();

    let phase = commands::with_catalog(&state, "plant", "test.crud", |api| {
        let area_id = api.add_area("Utilities", None)?;
        let unit_id = api.add_unit(area_id, "Boiler1", Some(" "))?;
        let phase_id = api.add_phase(unit_id, "PH", "01", Some("Aquecimento"))?;
        api.edit_phase(&PhaseEdit {
            phase_id,
            unit_id,
            phase_type: "OP".to_string(),
            name: "PH01".to_string(),
            description: LocalizedText::source_only("Aquecimento"),
        })
    })
    .await
    .unwrap();

    assert_eq!(phase.name, "OPPH01");
    assert_eq!(phase.description.en.as_deref(), Some("Aquecimento"));

    let detail = commands::with_catalog(&state, "plant", "test.detail", move |api| {
        api.phase_detail(phase.phase_id)
    })
    .await
    .unwrap();
    assert_eq!(detail.record.area_name, "Utilities");
    assert!(detail.steps.is_empty());

    let units = commands::with_catalog(&state, "plant", "test.cascade", |api| {
        let area_id = api.list_areas()?[0].area_id;
        api.delete_area(area_id)?;
        api.list_units(None)
    })
    .await
    .unwrap();
    assert!(units.is_empty());
}
