// ==========================================
// 工艺主数据目录 - 目录 API
// ==========================================
// 职责: 外部层（CLI / 命令层）使用的门面
//       CRUD、合并/全量导入、导出、Phase 详情保存
// 并发: 每个项目一个 Arc<Mutex<Connection>>，每次调用一个事务
// 说明: 方法为同步阻塞调用，异步入口见 app::commands
// ==========================================

use crate::domain::catalog::{
    Area, Interlock, LocalizedText, NewPhase, Parameter, Phase, PhaseRecord, Step,
    TransitionCondition, TransitionRowDescription,
};
use crate::domain::sheet::Workbook;
use crate::engine::{
    fill_missing_targets, translated_from_source, DetailSaveSummary, InterlockInput,
    MergeEngine, MergeSummary, NewParameterRow, ParameterEdit, ParameterFormContext,
    PhaseDetailService, StepSlotInput, TransitionGridInput, Translator,
};
use crate::export;
use crate::api::error::{ApiError, ApiResult};
use crate::importer::UniversalFileParser;
use crate::repository::{
    AreaRepository, InterlockRepository, ParameterRepository, PhaseFilter, PhaseRepository,
    RepositoryError, StepRepository, TransitionRepository, UnitRecord, UnitRepository,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// 无过滤条件时 Phase 列表的默认上限
pub const DEFAULT_PHASE_LIST_LIMIT: usize = 2000;

/// Phase 编辑输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEdit {
    pub phase_id: i64,
    pub unit_id: i64,
    pub phase_type: String,
    /// 可带或不带类型前缀
    pub name: String,
    pub description: LocalizedText,
}

/// Phase 详情页读模型
#[derive(Debug, Clone, Serialize)]
pub struct PhaseDetail {
    pub record: PhaseRecord,
    pub parameters: Vec<Parameter>,
    pub steps: Vec<Step>,
    pub interlocks: Vec<Interlock>,
    pub row_descriptions: Vec<TransitionRowDescription>,
    pub conditions: Vec<TransitionCondition>,
}

fn required_name(field: &str, value: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// 存储名 = `{type}{suffix}`；输入已带类型前缀时先去除
pub fn prefixed_phase_name(phase_type: &str, name: &str) -> String {
    let name = name.trim();
    let suffix = name.strip_prefix(phase_type).unwrap_or(name);
    format!("{}{}", phase_type, suffix)
}

// ==========================================
// CatalogApi - 目录 API
// ==========================================
pub struct CatalogApi {
    conn: Arc<Mutex<Connection>>,
    translator: Arc<dyn Translator>,
    merge_engine: MergeEngine,
    detail_service: PhaseDetailService,
}

impl CatalogApi {
    pub fn new(conn: Arc<Mutex<Connection>>, translator: Arc<dyn Translator>) -> Self {
        Self {
            conn,
            merge_engine: MergeEngine::new(translator.clone()),
            detail_service: PhaseDetailService::new(translator.clone()),
            translator,
        }
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()).into())
    }

    // ==========================================
    // Area
    // ==========================================

    pub fn list_areas(&self) -> ApiResult<Vec<Area>> {
        let conn = self.lock()?;
        Ok(AreaRepository::new(&conn).list_all()?)
    }

    pub fn add_area(&self, name: &str, description: Option<&str>) -> ApiResult<i64> {
        let name = required_name("区域名称", name)?;
        let conn = self.lock()?;
        let area_id = AreaRepository::new(&conn).insert(&name, optional_text(description))?;
        info!(area_id, name = %name, "新增区域");
        Ok(area_id)
    }

    pub fn rename_area(
        &self,
        area_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> ApiResult<()> {
        let name = required_name("区域名称", name)?;
        let conn = self.lock()?;
        AreaRepository::new(&conn).update(area_id, &name, optional_text(description))?;
        Ok(())
    }

    /// 删除区域（级联删除其下全部单元与 Phase）
    pub fn delete_area(&self, area_id: i64) -> ApiResult<bool> {
        let conn = self.lock()?;
        let deleted = AreaRepository::new(&conn).delete(area_id)?;
        info!(area_id, deleted, "删除区域");
        Ok(deleted)
    }

    // ==========================================
    // Unit
    // ==========================================

    pub fn list_units(&self, area_id: Option<i64>) -> ApiResult<Vec<UnitRecord>> {
        let conn = self.lock()?;
        Ok(UnitRepository::new(&conn).list_records(area_id)?)
    }

    pub fn add_unit(&self, area_id: i64, name: &str, description: Option<&str>) -> ApiResult<i64> {
        let name = required_name("单元名称", name)?;
        let conn = self.lock()?;
        if AreaRepository::new(&conn).find_by_id(area_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Area(id={})不存在", area_id)));
        }
        let unit_id = UnitRepository::new(&conn).insert(area_id, &name, optional_text(description))?;
        info!(unit_id, area_id, name = %name, "新增单元");
        Ok(unit_id)
    }

    pub fn edit_unit(
        &self,
        unit_id: i64,
        area_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> ApiResult<()> {
        let name = required_name("单元名称", name)?;
        let conn = self.lock()?;
        UnitRepository::new(&conn).update(unit_id, area_id, &name, optional_text(description))?;
        Ok(())
    }

    pub fn delete_unit(&self, unit_id: i64) -> ApiResult<bool> {
        let conn = self.lock()?;
        Ok(UnitRepository::new(&conn).delete(unit_id)?)
    }

    // ==========================================
    // Phase
    // ==========================================

    /// 过滤条件为空且未指定上限时最多返回 DEFAULT_PHASE_LIST_LIMIT 条
    pub fn list_phases(
        &self,
        filter: &PhaseFilter,
        limit: Option<usize>,
    ) -> ApiResult<Vec<PhaseRecord>> {
        let limit = match limit {
            Some(n) => Some(n),
            None if filter.is_empty() => Some(DEFAULT_PHASE_LIST_LIMIT),
            None => None,
        };
        let conn = self.lock()?;
        Ok(PhaseRepository::new(&conn).list_records(filter, limit)?)
    }

    /// 新增 Phase：存储名 `{type}{suffix}`，目标语言描述由翻译生成
    pub fn add_phase(
        &self,
        unit_id: i64,
        phase_type: &str,
        suffix: &str,
        description_pt: Option<&str>,
    ) -> ApiResult<i64> {
        let phase_type = required_name("Phase 类型", phase_type)?;
        let name = prefixed_phase_name(&phase_type, suffix);
        let description = translated_from_source(self.translator.as_ref(), description_pt);

        let conn = self.lock()?;
        if UnitRepository::new(&conn).find_by_id(unit_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Unit(id={})不存在", unit_id)));
        }
        let phase_id = PhaseRepository::new(&conn).insert(&NewPhase {
            unit_id,
            name: name.clone(),
            phase_type,
            description,
        })?;
        info!(phase_id, unit_id, name = %name, "新增 Phase");
        Ok(phase_id)
    }

    /// 编辑 Phase：重新加类型前缀，空白目标语言描述由翻译补全
    pub fn edit_phase(&self, edit: &PhaseEdit) -> ApiResult<Phase> {
        let phase_type = required_name("Phase 类型", &edit.phase_type)?;
        let mut description = edit.description.clone();
        fill_missing_targets(self.translator.as_ref(), &mut description);

        let phase = Phase {
            phase_id: edit.phase_id,
            unit_id: edit.unit_id,
            name: prefixed_phase_name(&phase_type, &edit.name),
            phase_type,
            description,
        };

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        PhaseRepository::new(&tx).update(&phase)?;
        tx.commit()?;
        Ok(phase)
    }

    pub fn delete_phase(&self, phase_id: i64) -> ApiResult<bool> {
        let conn = self.lock()?;
        Ok(PhaseRepository::new(&conn).delete(phase_id)?)
    }

    /// Phase 详情（参数按类别 → 编号排序）
    pub fn phase_detail(&self, phase_id: i64) -> ApiResult<PhaseDetail> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let record = PhaseRepository::new(&tx).get_record(phase_id)?;
        let transitions = TransitionRepository::new(&tx);
        let detail = PhaseDetail {
            parameters: ParameterRepository::new(&tx).list_by_phase(phase_id)?,
            steps: StepRepository::new(&tx).list_by_phase(phase_id)?,
            interlocks: InterlockRepository::new(&tx).list_by_phase(phase_id)?,
            row_descriptions: transitions.list_row_descriptions(phase_id)?,
            conditions: transitions.list_conditions(phase_id)?,
            record,
        };
        tx.commit()?;
        Ok(detail)
    }

    // ==========================================
    // 合并 / 全量导入
    // ==========================================

    pub fn merge_workbook(&self, workbook: &Workbook) -> ApiResult<MergeSummary> {
        let mut conn = self.lock()?;
        self.merge_engine
            .merge(&mut conn, workbook)
            .map_err(|e| ApiError::transaction("主数据合并失败", e))
    }

    pub fn import_workbook(&self, workbook: &Workbook) -> ApiResult<MergeSummary> {
        let mut conn = self.lock()?;
        self.merge_engine
            .import_full(&mut conn, workbook)
            .map_err(|e| ApiError::transaction("主数据全量导入失败", e))
    }

    /// 解析 xlsx/csv 文件后合并
    pub fn merge_file(&self, path: &Path) -> ApiResult<MergeSummary> {
        let workbook = UniversalFileParser.parse(path)?;
        self.merge_workbook(&workbook)
    }

    /// 解析 xlsx/csv 文件后全量导入
    pub fn import_file(&self, path: &Path) -> ApiResult<MergeSummary> {
        let workbook = UniversalFileParser.parse(path)?;
        self.import_workbook(&workbook)
    }

    // ==========================================
    // 导出（只读事务内完成）
    // ==========================================

    fn read_snapshot<T>(
        &self,
        op: impl FnOnce(&Connection) -> crate::engine::EngineResult<T>,
    ) -> ApiResult<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let result = op(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn master_workbook(&self) -> ApiResult<Workbook> {
        self.read_snapshot(export::master_workbook)
    }

    pub fn export_master_xlsx(&self) -> ApiResult<Vec<u8>> {
        let workbook = self.master_workbook()?;
        Ok(export::workbook_to_xlsx(&workbook)?)
    }

    /// 单张主数据表的 CSV
    pub fn export_master_csv(&self, sheet_name: &str) -> ApiResult<Vec<u8>> {
        let workbook = self.master_workbook()?;
        let sheet = workbook
            .sheet(&[sheet_name.trim()])
            .ok_or_else(|| ApiError::NotFound(format!("工作表 {} 不存在", sheet_name)))?;
        Ok(export::sheet_to_csv(sheet)?)
    }

    pub fn export_procedures_csv(&self, filter: &PhaseFilter, steps_root: &str) -> ApiResult<Vec<u8>> {
        let report = self.read_snapshot(|conn| export::procedures_report(conn, filter, steps_root))?;
        Ok(report.to_csv_bytes()?)
    }

    pub fn export_parameters_csv(&self, filter: &PhaseFilter) -> ApiResult<Vec<u8>> {
        let report = self.read_snapshot(|conn| export::parameters_report(conn, filter))?;
        Ok(report.to_csv_bytes()?)
    }

    pub fn export_interlocks_csv(&self, filter: &PhaseFilter) -> ApiResult<Vec<u8>> {
        let report = self.read_snapshot(|conn| export::interlocks_report(conn, filter))?;
        Ok(report.to_csv_bytes()?)
    }

    pub fn export_transitions_csv(&self, filter: &PhaseFilter) -> ApiResult<Vec<u8>> {
        let report = self.read_snapshot(|conn| export::transitions_report(conn, filter))?;
        Ok(report.to_csv_bytes()?)
    }

    /// 单个 Phase 的步骤翻译 XML
    pub fn export_steps_xml(&self, phase_id: i64) -> ApiResult<Vec<u8>> {
        self.read_snapshot(|conn| {
            PhaseRepository::new(conn).get_record(phase_id)?;
            export::steps_xml(&StepRepository::new(conn).list_by_phase(phase_id)?)
        })
    }

    pub fn export_steps_zip(&self, filter: &PhaseFilter) -> ApiResult<Vec<u8>> {
        self.read_snapshot(|conn| export::steps_archive(conn, filter))
    }

    // ==========================================
    // Phase 详情保存
    // ==========================================

    pub fn save_parameters(
        &self,
        phase_id: i64,
        edits: &[ParameterEdit],
        new_rows: &[NewParameterRow],
    ) -> ApiResult<ParameterFormContext> {
        let mut conn = self.lock()?;
        Ok(self
            .detail_service
            .save_parameters(&mut conn, phase_id, edits, new_rows)?)
    }

    pub fn save_steps(
        &self,
        phase_id: i64,
        range: Range<i64>,
        slots: &[StepSlotInput],
    ) -> ApiResult<DetailSaveSummary> {
        let mut conn = self.lock()?;
        Ok(self
            .detail_service
            .save_steps(&mut conn, phase_id, range, slots)?)
    }

    pub fn save_transitions(
        &self,
        phase_id: i64,
        grid: &TransitionGridInput,
    ) -> ApiResult<DetailSaveSummary> {
        let mut conn = self.lock()?;
        Ok(self
            .detail_service
            .save_transitions(&mut conn, phase_id, grid)?)
    }

    pub fn save_interlocks(
        &self,
        phase_id: i64,
        inputs: &[InterlockInput],
    ) -> ApiResult<DetailSaveSummary> {
        let mut conn = self.lock()?;
        Ok(self
            .detail_service
            .save_interlocks(&mut conn, phase_id, inputs)?)
    }
}
