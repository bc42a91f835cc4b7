// ==========================================
// 工艺主数据目录 - 下游模板 CSV 报表
// ==========================================
// 职责: 目录 → 自动化系统批量导入文件（`:TEMPLATE=` 行 + 表头 + 数据行）
// 报表: 过程列表 / 参数 / 联锁 / 转换条件
// 过滤: 全部报表接受 PhaseFilter（区域 / 单元 / Phase 类型）
// ==========================================

use crate::domain::catalog::{Interlock, LocalizedText, PhaseRecord};
use crate::domain::types::{DataType, Locale, INTERLOCK_BITS, TRANSITION_GRID};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{
    InterlockRepository, ParameterRepository, PhaseFilter, PhaseRepository, TransitionRepository,
};
use rusqlite::Connection;
use std::collections::HashMap;
use tracing::info;

const PROCEDURE_TEMPLATE: &str = "$NRK100_Procedure";
const TRANSITION_TEMPLATE: &str = "$NRK100_Procedure_Transitions_G";
const SECURITY_GROUP: &str = "Default";
const TRANSITION_CONTAINED_NAME: &str = "TransitionConditions";

// ==========================================
// TemplateReport - 报表结构
// ==========================================

/// 一个模板段：模板行 + 表头 + 数据行
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSection {
    pub template: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TemplateSection {
    pub fn new(template: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            template: template.into(),
            header,
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateReport {
    pub sections: Vec<TemplateSection>,
}

impl TemplateReport {
    pub fn single(section: TemplateSection) -> Self {
        Self {
            sections: vec![section],
        }
    }

    pub fn row_count(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }

    /// 写出为 CSV（CRLF 行尾，段与段之间空一行）
    pub fn to_csv_bytes(&self) -> EngineResult<Vec<u8>> {
        let mut out = Vec::new();
        for (idx, section) in self.sections.iter().enumerate() {
            if idx > 0 {
                out.extend_from_slice(b"\r\n");
            }
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .terminator(csv::Terminator::CRLF)
                .from_writer(Vec::new());
            writer.write_record([format!(":TEMPLATE={}", section.template)])?;
            writer.write_record(&section.header)?;
            for row in &section.rows {
                writer.write_record(row)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| EngineError::CsvWriteError(e.to_string()))?;
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn filtered_phases(conn: &Connection, filter: &PhaseFilter) -> EngineResult<Vec<PhaseRecord>> {
    Ok(PhaseRepository::new(conn).list_records(filter, None)?)
}

// ==========================================
// 过程列表
// ==========================================

/// 每个 Phase 一行，末列为步骤翻译 XML 路径 `{root}/{unit}/{area}_{phase}.xml`
pub fn procedures_report(
    conn: &Connection,
    filter: &PhaseFilter,
    steps_root: &str,
) -> EngineResult<TemplateReport> {
    let root = steps_root.replace('\\', "/");
    let mut section = TemplateSection::new(
        PROCEDURE_TEMPLATE,
        columns(&[
            ":Tagname",
            "Area",
            "SecurityGroup",
            "ContainedName",
            "ShortDesc",
            "HMIText_StepInformation",
        ]),
    );

    for record in filtered_phases(conn, filter)? {
        let phase = &record.phase.name;
        section.rows.push(vec![
            record.tag_prefix(),
            record.area_tag(),
            SECURITY_GROUP.to_string(),
            phase.clone(),
            phase.clone(),
            format!(
                "{}/{}/{}.xml",
                root,
                record.unit_name,
                record.tag_prefix()
            ),
        ]);
    }

    info!(rows = section.rows.len(), "过程列表报表生成");
    Ok(TemplateReport::single(section))
}

// ==========================================
// 参数
// ==========================================

const PARAMETER_HEADER: [&str; 14] = [
    ":Tagname",
    "Area",
    "SecurityGroup",
    "Container",
    "ContainedName",
    "Description",
    "ShortDesc",
    "EngUnits",
    "HMIText_ParamDescription.1046",
    "HMIText_ParamDescription.1033",
    "HMIText_ParamDescription.3082",
    "AliasName",
    "ExecutionRelativeOrder",
    "ExecutionRelatedObject",
];

/// `{name}-{text}`，目标语言为空时回退源语言
fn param_description(name: &str, text: &LocalizedText, locale: Locale) -> String {
    format!("{}-{}", name, text.get_or_source(locale).unwrap_or(""))
}

/// 数据类型每变化一次开启新段
pub fn parameters_report(conn: &Connection, filter: &PhaseFilter) -> EngineResult<TemplateReport> {
    let repo = ParameterRepository::new(conn);
    let mut report = TemplateReport::default();
    let mut current: Option<DataType> = None;

    for record in filtered_phases(conn, filter)? {
        for param in repo.list_by_phase_by_number(record.phase.phase_id)? {
            if current != Some(param.data_type) {
                report.sections.push(TemplateSection::new(
                    format!("$NRK100_Parameter{}_GEA", param.data_type.template_suffix()),
                    columns(&PARAMETER_HEADER),
                ));
                current = Some(param.data_type);
            }

            let d_pt = param_description(&param.name, &param.description, Locale::Pt);
            let d_en = param_description(&param.name, &param.description, Locale::En);
            let d_es = param_description(&param.name, &param.description, Locale::Es);
            let row = vec![
                format!("{}_{}", record.tag_prefix(), param.name),
                record.area_tag(),
                SECURITY_GROUP.to_string(),
                record.tag_prefix(),
                param.name.clone(),
                d_pt.clone(),
                d_pt.clone(),
                param.eng_unit.clone().unwrap_or_default(),
                d_pt,
                d_en,
                d_es,
                "None".to_string(),
                String::new(),
                String::new(),
            ];
            if let Some(section) = report.sections.last_mut() {
                section.rows.push(row);
            }
        }
    }

    info!(
        sections = report.sections.len(),
        rows = report.row_count(),
        "参数报表生成"
    );
    Ok(report)
}

// ==========================================
// 联锁
// ==========================================

fn join_bits<F>(by_bit: &HashMap<i64, Interlock>, pick: F) -> String
where
    F: Fn(&Interlock) -> String,
{
    (0..INTERLOCK_BITS as i64)
        .map(|bit| by_bit.get(&bit).map(&pick).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",")
}

/// 每个 Phase 一行；6 个多语言列各为 32 位文本以 `,` 连接
pub fn interlocks_report(conn: &Connection, filter: &PhaseFilter) -> EngineResult<TemplateReport> {
    let mut header = columns(&[":Tagname", "Area"]);
    for kind in ["HMIText_SecureInterlocks", "HMIText_ProcessInterlocks"] {
        for locale in Locale::COLUMN_ORDER {
            header.push(format!("{}.{}", kind, locale.code()));
        }
    }
    let mut section = TemplateSection::new(PROCEDURE_TEMPLATE, header);

    let repo = InterlockRepository::new(conn);
    for record in filtered_phases(conn, filter)? {
        let by_bit: HashMap<i64, Interlock> = repo
            .list_by_phase(record.phase.phase_id)?
            .into_iter()
            .map(|i| (i.bit, i))
            .collect();

        let mut row = vec![record.tag_prefix(), record.area_tag()];
        for locale in Locale::COLUMN_ORDER {
            row.push(join_bits(&by_bit, |i| i.safety.text_or_empty(locale)));
        }
        for locale in Locale::COLUMN_ORDER {
            row.push(join_bits(&by_bit, |i| i.process.text_or_empty(locale)));
        }
        section.rows.push(row);
    }

    info!(rows = section.rows.len(), "联锁报表生成");
    Ok(TemplateReport::single(section))
}

// ==========================================
// 转换条件
// ==========================================

fn transitions_header() -> Vec<String> {
    let mut header = columns(&[
        ":Tagname",
        "Area",
        "SecurityGroup",
        "Container",
        "ContainedName",
        "Description",
        "ShortDesc",
    ]);
    for locale in Locale::LOCALE_ID_ORDER {
        for step in 0..TRANSITION_GRID {
            header.push(format!(
                "HMI_ConditionsDescription_{:02}.{}",
                step,
                locale.code()
            ));
        }
    }
    for locale in Locale::LOCALE_ID_ORDER {
        header.push(format!("HMI_TransitionDescription.{}", locale.code()));
    }
    header
}

/// 每个 Phase 一行：按区域 (en, pt, es) × 步骤 0..31 输出条件列，再输出 3 列行描述
///
/// 源语言文本为空的条件不输出；各区域文本为空时该位置留空
pub fn transitions_report(conn: &Connection, filter: &PhaseFilter) -> EngineResult<TemplateReport> {
    let mut section = TemplateSection::new(TRANSITION_TEMPLATE, transitions_header());

    let repo = TransitionRepository::new(conn);
    for record in filtered_phases(conn, filter)? {
        let phase_id = record.phase.phase_id;
        let conditions: HashMap<(i64, i64), _> = repo
            .list_conditions(phase_id)?
            .into_iter()
            .filter(|c| c.cell_text(Locale::SOURCE).is_some())
            .map(|c| ((c.step_index, c.row), c))
            .collect();
        let descriptions: HashMap<i64, LocalizedText> = repo
            .list_row_descriptions(phase_id)?
            .into_iter()
            .map(|d| (d.row, d.description))
            .collect();

        let mut row = vec![
            format!("{}_Tran", record.tag_prefix()),
            record.area_tag(),
            SECURITY_GROUP.to_string(),
            record.tag_prefix(),
        ];
        row.extend(std::iter::repeat(TRANSITION_CONTAINED_NAME.to_string()).take(3));

        for locale in Locale::LOCALE_ID_ORDER {
            for step in 0..TRANSITION_GRID as i64 {
                let lines: Vec<String> = (0..TRANSITION_GRID as i64)
                    .map(|r| {
                        conditions
                            .get(&(step, r))
                            .and_then(|c| c.cell_text(locale))
                            .unwrap_or_default()
                    })
                    .collect();
                row.push(lines.join(","));
            }
        }
        for locale in Locale::LOCALE_ID_ORDER {
            let lines: Vec<String> = (0..TRANSITION_GRID as i64)
                .map(|r| {
                    descriptions
                        .get(&r)
                        .map(|d| d.text_or_empty(locale))
                        .unwrap_or_default()
                })
                .collect();
            row.push(lines.join(","));
        }
        section.rows.push(row);
    }

    info!(rows = section.rows.len(), "转换条件报表生成");
    Ok(TemplateReport::single(section))
}
