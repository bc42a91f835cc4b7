// ==========================================
// 导出引擎集成测试
// ==========================================
// 测试目标: 固定宽度网格、逻辑后缀还原、模板报表、步骤翻译 XML/ZIP
// ==========================================


use phase_catalog::export::{
    interlocks_report, interlocks_sheet, master_workbook, parameters_report, procedures_report,
    sheet_to_csv, steps_archive, steps_xml, transitions_report, transitions_sheet,
    workbook_to_xlsx,
};
use phase_catalog::importer::ExcelParser;
use phase_catalog::repository::{PhaseFilter, StepRepository, TransitionRepository};
use phase_catalog::{CellValue, Sheet};
use std::io::{Cursor, Read};
use test_helpers::*;

fn cell<'a>(sheet: &'a Sheet, row: usize, column: &str) -> &'a CellValue {
    let idx = sheet
        .columns
        .iter()
        .position(|c| c == column)
        .unwrap_or_else(|| panic!("missing column {}", column));
    &sheet.rows[row][idx]
}

fn text_of(value: &CellValue) -> String {
    value.trimmed_text().unwrap_or_default()
}

// ==========================================
// 主数据投影
// ==========================================

#[test]
fn test_interlock_grid_always_32_rows() {
    let conn = seeded_catalog();
    let sheet = interlocks_sheet(&conn).unwrap();

    assert_eq!(sheet.len(), 32);
    for (bit, _) in sheet.rows.iter().enumerate() {
        assert_eq!(cell(&sheet, bit, "Bit").as_i64(), Some(bit as i64));
    }
    assert_eq!(text_of(cell(&sheet, 3, "Safety_1046")), "Porta aberta");
    assert_eq!(text_of(cell(&sheet, 3, "Safety_1033")), "Door open");
    assert!(cell(&sheet, 0, "Safety_1046").is_blank());
    assert!(cell(&sheet, 31, "Process_3082").is_blank());
}

#[test]
fn test_transition_grid_reproduces_logic_suffix() {
    let conn = seeded_catalog();
    let sheet = transitions_sheet(&conn).unwrap();

    assert_eq!(sheet.len(), 32);
    let step_columns = sheet.columns.iter().filter(|c| c.starts_with("Step_")).count();
    assert_eq!(step_columns, 32);

    assert_eq!(text_of(cell(&sheet, 5, "Step_3")), "X=1 AND");
    assert_eq!(text_of(cell(&sheet, 5, "Step_4")), "Y>2");
    assert_eq!(text_of(cell(&sheet, 5, "Row_Desc_1046")), "Aquecer");
    assert!(cell(&sheet, 4, "Step_3").is_blank());
}

#[test]
fn test_logic_suffix_not_duplicated_across_round_trips() {
    let conn = seeded_catalog();
    let exported = master_workbook(&conn).unwrap();

    let mut second = create_test_catalog();
    merge_engine().merge(&mut second, &exported).unwrap();

    let phase_id = phase_id(&second, "PH01");
    let stored = TransitionRepository::new(&second)
        .list_conditions(phase_id)
        .unwrap();
    let condition = stored.iter().find(|c| c.step_index == 3).unwrap();
    assert_eq!(condition.text.pt.as_deref(), Some("X=1"));
    assert_eq!(condition.text.en.as_deref(), Some("X=1"));

    let sheet = transitions_sheet(&second).unwrap();
    assert_eq!(text_of(cell(&sheet, 5, "Step_3")), "X=1 AND");
}

#[test]
fn test_master_workbook_sheet_order_and_xlsx() {
    let conn = seeded_catalog();
    let workbook = master_workbook(&conn).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec!["Areas", "Units", "Phases", "Parameters", "Steps", "Interlocks", "Transitions"]
    );

    let bytes = workbook_to_xlsx(&workbook).unwrap();
    let parsed = ExcelParser.parse_bytes(&bytes).unwrap();
    assert_eq!(parsed.sheet_names(), workbook.sheet_names());
    assert_eq!(parsed.sheet(&["Interlocks"]).unwrap().len(), 32);
}

#[test]
fn test_master_sheet_csv_has_header_and_rows() {
    let conn = seeded_catalog();
    let workbook = master_workbook(&conn).unwrap();
    let csv = sheet_to_csv(workbook.sheet(&["Parameters"]).unwrap()).unwrap();
    let text = String::from_utf8(csv).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Area,Unit,Phase,Class,Number,Data_Type"));
    assert!(lines[1].contains("PE"));
    assert!(lines[2].contains("Temperature"));
}

// ==========================================
// 下游模板报表
// ==========================================

#[test]
fn test_procedures_report_normalizes_root() {
    let conn = seeded_catalog();
    let report = procedures_report(&conn, &PhaseFilter::all(), r"C:\Steps").unwrap();
    let row = &report.sections[0].rows[0];

    assert_eq!(row[0], "Utilities_PH01");
    assert_eq!(row[1], "Utilities_Boiler1");
    assert_eq!(row[5], "C:/Steps/Boiler1/Utilities_PH01.xml");

    let text = String::from_utf8(report.to_csv_bytes().unwrap()).unwrap();
    assert!(text.starts_with(":TEMPLATE=$NRK100_Procedure\r\n"));
}

#[test]
fn test_parameters_report_sections_by_data_type() {
    let conn = seeded_catalog();
    let report = parameters_report(&conn, &PhaseFilter::all()).unwrap();

    // 编号 1 (real) → 编号 2 (integer)
    assert_eq!(report.sections.len(), 2);
    assert_eq!(report.row_count(), 2);
    assert_eq!(report.sections[0].rows[0][4], "PR001");
    assert_eq!(report.sections[0].rows[0][9], "PR001-Temperature");
    assert_eq!(report.sections[1].rows[0][4], "PE002");
    assert_ne!(report.sections[0].template, report.sections[1].template);
}

#[test]
fn test_interlocks_report_joins_32_bits() {
    let conn = seeded_catalog();
    let report = interlocks_report(&conn, &PhaseFilter::all()).unwrap();
    let section = &report.sections[0];
    let row = &section.rows[0];

    let idx = section
        .header
        .iter()
        .position(|h| h == "HMIText_SecureInterlocks.1046")
        .unwrap();
    let bits: Vec<&str> = row[idx].split(',').collect();
    assert_eq!(bits.len(), 32);
    assert_eq!(bits[3], "Porta aberta");
    assert!(bits[0].is_empty());
}

#[test]
fn test_transitions_report_per_locale_columns() {
    let conn = seeded_catalog();
    let report = transitions_report(&conn, &PhaseFilter::all()).unwrap();
    let section = &report.sections[0];
    let row = &section.rows[0];
    assert_eq!(row.len(), section.header.len());
    assert_eq!(row[0], "Utilities_PH01_Tran");

    for code in ["1033", "1046", "3082"] {
        let column = format!("HMI_ConditionsDescription_03.{}", code);
        let idx = section.header.iter().position(|h| *h == column).unwrap();
        let lines: Vec<&str> = row[idx].split(',').collect();
        assert_eq!(lines.len(), 32);
        assert_eq!(lines[5], "X=1 AND");
    }

    let desc_idx = section
        .header
        .iter()
        .position(|h| h == "HMI_TransitionDescription.1046")
        .unwrap();
    assert_eq!(row[desc_idx].split(',').nth(5), Some("Aquecer"));
}

#[test]
fn test_reports_honor_phase_filter() {
    let conn = seeded_catalog();
    let filter = PhaseFilter {
        phase_type: Some("XX".to_string()),
        ..PhaseFilter::default()
    };
    assert_eq!(procedures_report(&conn, &filter, "root").unwrap().row_count(), 0);
    assert_eq!(interlocks_report(&conn, &filter).unwrap().row_count(), 0);
}

// ==========================================
// 步骤翻译
// ==========================================

#[test]
fn test_steps_xml_for_seeded_phase() {
    let conn = seeded_catalog();
    let phase_id = phase_id(&conn, "PH01");
    let steps = StepRepository::new(&conn).list_by_phase(phase_id).unwrap();

    let text = String::from_utf8(steps_xml(&steps).unwrap()).unwrap();
    assert_eq!(text.matches("<Step>").count(), 150);
    assert!(text.contains("<Number>10</Number>"));
    assert!(text.contains("<Number>zzNumber001</Number>"));
    assert!(text.contains("<Description>Fill</Description>"));
    assert!(text.contains("<Description>zzEsStep049</Description>"));
}

#[test]
fn test_steps_archive_layout() {
    let conn = seeded_catalog();
    let bytes = steps_archive(&conn, &PhaseFilter::all()).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 1);
    let mut entry = archive.by_name("Steps/Boiler1/Utilities_PH01.xml").unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    assert_eq!(xml.matches("<Step>").count(), 150);
}
