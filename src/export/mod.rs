// ==========================================
// 工艺主数据目录 - 导出层
// ==========================================
// 职责: 主数据投影、xlsx/csv 写出、下游模板报表、步骤翻译 XML/ZIP
// 红线: 只读，不修改目录
// ==========================================

pub mod master;
pub mod steps_xml;
pub mod template_reports;
pub mod writer;

pub use master::{
    areas_sheet, interlocks_sheet, master_workbook, parameters_sheet, phases_sheet, steps_sheet,
    transitions_sheet, units_sheet,
};
pub use steps_xml::{archive_entry_path, steps_archive, steps_xml};
pub use template_reports::{
    interlocks_report, parameters_report, procedures_report, transitions_report, TemplateReport,
    TemplateSection,
};
pub use writer::{sheet_to_csv, workbook_to_xlsx};
