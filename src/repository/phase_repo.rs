// ==========================================
// 工艺主数据目录 - Phase 仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 排序: 区域名 → 单元名 → Phase 名（导出结果可稳定比对）
// ==========================================

use crate::domain::catalog::{LocalizedText, NewPhase, Phase, PhaseRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::localized_from_row;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult};
use serde::{Deserialize, Serialize};

/// Phase 过滤条件（下游报表与列表共用）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFilter {
    pub area_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub phase_type: Option<String>,
}

impl PhaseFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.area_id.is_none()
            && self.unit_id.is_none()
            && self.phase_type.as_deref().map(str::is_empty).unwrap_or(true)
    }
}

const PHASE_RECORD_SELECT: &str = r#"
    SELECT p.phase_id, p.unit_id, p.name, p.phase_type,
           p.description_pt, p.description_en, p.description_es,
           u.area_id, a.name, u.name
    FROM phases p
    JOIN units u ON u.unit_id = p.unit_id
    JOIN areas a ON a.area_id = u.area_id
"#;

// ==========================================
// PhaseRepository - Phase 仓储
// ==========================================
pub struct PhaseRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PhaseRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 新增 Phase，返回 phase_id
    pub fn insert(&self, phase: &NewPhase) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO phases (unit_id, name, phase_type, description_pt, description_en, description_es)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                phase.unit_id,
                phase.name,
                phase.phase_type,
                phase.description.pt,
                phase.description.en,
                phase.description.es,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 按主键查询（含区域/单元名）
    pub fn find_record(&self, phase_id: i64) -> RepositoryResult<Option<PhaseRecord>> {
        let sql = format!("{} WHERE p.phase_id = ?1", PHASE_RECORD_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![phase_id], map_phase_record)?;
        match rows.next() {
            Some(record) => Ok(Some(record?)),
            None => Ok(None),
        }
    }

    /// 按主键查询，不存在时报 NotFound
    pub fn get_record(&self, phase_id: i64) -> RepositoryResult<PhaseRecord> {
        self.find_record(phase_id)?
            .ok_or_else(|| RepositoryError::not_found("Phase", phase_id))
    }

    /// 按过滤条件查询，按 区域 / 单元 / Phase 名排序
    ///
    /// # 参数
    /// - `filter`: 区域 / 单元 / Phase 类型过滤
    /// - `limit`: 可选，最大返回条数
    pub fn list_records(
        &self,
        filter: &PhaseFilter,
        limit: Option<usize>,
    ) -> RepositoryResult<Vec<PhaseRecord>> {
        let mut sql = format!("{} WHERE 1 = 1", PHASE_RECORD_SELECT);
        let mut values: Vec<Value> = Vec::new();

        if let Some(area_id) = filter.area_id {
            values.push(Value::Integer(area_id));
            sql.push_str(&format!(" AND u.area_id = ?{}", values.len()));
        }
        if let Some(unit_id) = filter.unit_id {
            values.push(Value::Integer(unit_id));
            sql.push_str(&format!(" AND p.unit_id = ?{}", values.len()));
        }
        if let Some(phase_type) = filter.phase_type.as_deref().filter(|t| !t.is_empty()) {
            values.push(Value::Text(phase_type.to_string()));
            sql.push_str(&format!(" AND p.phase_type = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY a.name ASC, u.name ASC, p.name ASC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values), map_phase_record)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 更新 Phase（名称/类型/所属单元/描述）
    pub fn update(&self, phase: &Phase) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            r#"
            UPDATE phases
            SET unit_id = ?1, name = ?2, phase_type = ?3,
                description_pt = ?4, description_en = ?5, description_es = ?6
            WHERE phase_id = ?7
            "#,
            params![
                phase.unit_id,
                phase.name,
                phase.phase_type,
                phase.description.pt,
                phase.description.en,
                phase.description.es,
                phase.phase_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Phase", phase.phase_id));
        }
        Ok(())
    }

    /// 删除 Phase（级联删除参数/步骤/联锁/转换条件）
    pub fn delete(&self, phase_id: i64) -> RepositoryResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM phases WHERE phase_id = ?1", params![phase_id])?;
        Ok(affected > 0)
    }
}

fn map_phase_record(row: &rusqlite::Row<'_>) -> SqliteResult<PhaseRecord> {
    let description: LocalizedText = localized_from_row(row, 4)?;
    Ok(PhaseRecord {
        phase: Phase {
            phase_id: row.get(0)?,
            unit_id: row.get(1)?,
            name: row.get(2)?,
            phase_type: row.get(3)?,
            description,
        },
        area_id: row.get(7)?,
        area_name: row.get(8)?,
        unit_name: row.get(9)?,
    })
}
