// ==========================================
// 工艺主数据目录 - 步骤翻译 XML / ZIP
// ==========================================
// 职责: 单个 Phase → `<Translations>` 文档（3 个区域 × 50 个步骤）
//       多个 Phase → ZIP 包 `Steps/{unit}/{area}_{phase}.xml`
// 工具: quick-xml（2 空格缩进）/ zip（Deflated）
// ==========================================

use crate::domain::catalog::{PhaseRecord, Step};
use crate::domain::types::{Locale, STEP_SLOTS};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{PhaseFilter, PhaseRepository, StepRepository};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rusqlite::Connection;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn xml_err(err: impl std::fmt::Display) -> EngineError {
    EngineError::XmlWriteError(err.to_string())
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> EngineResult<()> {
    writer.write_event(event).map_err(xml_err)
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> EngineResult<()> {
    write_event(writer, Event::Start(BytesStart::new(tag)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(tag)))
}

/// 步骤号：人工编号，空白时为 `zzNumber{NNN}`
fn step_number(step: Option<&Step>, slot: usize) -> String {
    step.and_then(|s| s.code.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("zzNumber{:03}", slot))
}

/// 描述：目标语言 → 源语言 → 占位符 `{prefix}{NNN}`
fn step_description(step: Option<&Step>, slot: usize, locale: Locale) -> String {
    step.and_then(|s| s.description.get_or_source(locale))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}{:03}", locale.step_placeholder_prefix(), slot))
}

/// 单个 Phase 的步骤翻译文档
pub fn steps_xml(steps: &[Step]) -> EngineResult<Vec<u8>> {
    let by_index: HashMap<i64, &Step> = steps.iter().map(|s| (s.index, s)).collect();
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    write_event(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write_event(&mut writer, Event::Start(BytesStart::new("Translations")))?;

    for locale in Locale::LOCALE_ID_ORDER {
        let mut translation = BytesStart::new("Translation");
        translation.push_attribute(("LocaleID", locale.code()));
        write_event(&mut writer, Event::Start(translation))?;
        write_event(&mut writer, Event::Start(BytesStart::new("Steps")))?;

        for slot in 0..STEP_SLOTS {
            let step = by_index.get(&(slot as i64)).copied();
            write_event(&mut writer, Event::Start(BytesStart::new("Step")))?;
            write_text_element(&mut writer, "Number", &step_number(step, slot))?;
            write_text_element(
                &mut writer,
                "Description",
                &step_description(step, slot, locale),
            )?;
            write_event(&mut writer, Event::End(BytesEnd::new("Step")))?;
        }

        write_event(&mut writer, Event::End(BytesEnd::new("Steps")))?;
        write_event(&mut writer, Event::End(BytesEnd::new("Translation")))?;
    }

    write_event(&mut writer, Event::End(BytesEnd::new("Translations")))?;
    Ok(writer.into_inner())
}

/// ZIP 包内路径
pub fn archive_entry_path(record: &PhaseRecord) -> String {
    format!("Steps/{}/{}.xml", record.unit_name, record.tag_prefix())
}

/// 按过滤条件打包全部 Phase 的步骤翻译文档
pub fn steps_archive(conn: &Connection, filter: &PhaseFilter) -> EngineResult<Vec<u8>> {
    let records = PhaseRepository::new(conn).list_records(filter, None)?;
    let steps = StepRepository::new(conn);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for record in &records {
        let xml = steps_xml(&steps.list_by_phase(record.phase.phase_id)?)?;
        zip.start_file(archive_entry_path(record), options)?;
        zip.write_all(&xml)
            .map_err(|e| EngineError::ArchiveError(e.to_string()))?;
    }

    let cursor = zip.finish()?;
    info!(documents = records.len(), "步骤翻译 ZIP 打包完成");
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_catalog;
    use crate::domain::catalog::{LocalizedText, NewPhase, NewStep};
    use crate::repository::{AreaRepository, UnitRepository};
    use std::io::Read;

    fn step(index: i64, code: Option<&str>, pt: &str, en: Option<&str>) -> Step {
        Step {
            step_id: index + 1,
            phase_id: 1,
            index,
            code: code.map(str::to_string),
            description: LocalizedText::new(Some(pt.to_string()), en.map(str::to_string), None),
        }
    }

    #[test]
    fn test_steps_xml_has_150_steps() {
        let xml = steps_xml(&[step(0, Some("10"), "Encher", Some("Fill"))]).unwrap();
        let text = String::from_utf8(xml).unwrap();

        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert_eq!(text.matches("<Step>").count(), 150);
        assert_eq!(text.matches("<Translation LocaleID=").count(), 3);
        assert!(text.contains("<Number>10</Number>"));
        assert!(text.contains("<Description>Fill</Description>"));
        // es 回退源语言
        assert_eq!(text.matches("<Description>Encher</Description>").count(), 2);
        assert!(text.contains("<Number>zzNumber001</Number>"));
        assert!(text.contains("<Description>zzEnStep049</Description>"));
        assert!(text.contains("<Description>zzStep049</Description>"));
        assert!(text.contains("<Description>zzEsStep049</Description>"));
    }

    #[test]
    fn test_locale_block_order() {
        let text = String::from_utf8(steps_xml(&[]).unwrap()).unwrap();
        let en = text.find(r#"LocaleID="1033""#).unwrap();
        let pt = text.find(r#"LocaleID="1046""#).unwrap();
        let es = text.find(r#"LocaleID="3082""#).unwrap();
        assert!(en < pt && pt < es);
        assert!(text.contains("\n  <Translation"));
    }

    #[test]
    fn test_steps_archive_paths() {
        let conn = open_in_memory_catalog().unwrap();
        let area_id = AreaRepository::new(&conn).insert("Utilities", None).unwrap();
        let unit_id = UnitRepository::new(&conn)
            .insert(area_id, "Boiler1", None)
            .unwrap();
        let phase_id = PhaseRepository::new(&conn)
            .insert(&NewPhase {
                unit_id,
                name: "PH01".to_string(),
                phase_type: "PH".to_string(),
                description: LocalizedText::default(),
            })
            .unwrap();
        StepRepository::new(&conn)
            .insert(&NewStep {
                phase_id,
                index: 2,
                code: Some("30".to_string()),
                description: LocalizedText::source_only("Aquecer"),
            })
            .unwrap();

        let bytes = steps_archive(&conn, &PhaseFilter::all()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("Steps/Boiler1/Utilities_PH01.xml").unwrap();
        let mut xml = String::new();
        entry.read_to_string(&mut xml).unwrap();
        assert!(xml.contains("<Number>30</Number>"));
    }
}
