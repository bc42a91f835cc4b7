// ==========================================
// 工艺主数据目录 - Step 仓储
// ==========================================
// 自然键: (phase_id, step_index)
// ==========================================

use crate::domain::catalog::{NewStep, Step};
use crate::repository::error::RepositoryResult;
use crate::repository::localized_from_row;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

const STEP_SELECT: &str = r#"
    SELECT step_id, phase_id, step_index, code,
           description_pt, description_en, description_es
    FROM steps
"#;

// ==========================================
// StepRepository - 步骤仓储
// ==========================================
pub struct StepRepository<'c> {
    conn: &'c Connection,
}

impl<'c> StepRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, step: &NewStep) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO steps (phase_id, step_index, code, description_pt, description_en, description_es)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                step.phase_id,
                step.index,
                step.code,
                step.description.pt,
                step.description.en,
                step.description.es,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 按自然键写入: 存在则覆盖，不存在则新增
    pub fn upsert(&self, step: &NewStep) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO steps (phase_id, step_index, code, description_pt, description_en, description_es)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (phase_id, step_index) DO UPDATE SET
                code = excluded.code,
                description_pt = excluded.description_pt,
                description_en = excluded.description_en,
                description_es = excluded.description_es
            "#,
            params![
                step.phase_id,
                step.index,
                step.code,
                step.description.pt,
                step.description.en,
                step.description.es,
            ],
        )?;
        Ok(())
    }

    pub fn find(&self, phase_id: i64, index: i64) -> RepositoryResult<Option<Step>> {
        let sql = format!("{} WHERE phase_id = ?1 AND step_index = ?2", STEP_SELECT);
        let step = self
            .conn
            .query_row(&sql, params![phase_id, index], map_step)
            .optional()?;
        Ok(step)
    }

    /// Phase 下全部步骤，按槽位排序
    pub fn list_by_phase(&self, phase_id: i64) -> RepositoryResult<Vec<Step>> {
        let sql = format!("{} WHERE phase_id = ?1 ORDER BY step_index ASC", STEP_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let steps = stmt
            .query_map(params![phase_id], map_step)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(steps)
    }

    /// 删除指定槽位，返回是否存在
    pub fn delete(&self, phase_id: i64, index: i64) -> RepositoryResult<bool> {
        let affected = self.conn.execute(
            "DELETE FROM steps WHERE phase_id = ?1 AND step_index = ?2",
            params![phase_id, index],
        )?;
        Ok(affected > 0)
    }

    /// 全部 (phase_id, step_index) 自然键
    pub fn list_keys(&self) -> RepositoryResult<Vec<(i64, i64)>> {
        let mut stmt = self.conn.prepare("SELECT phase_id, step_index FROM steps")?;
        let keys = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(keys)
    }
}

fn map_step(row: &rusqlite::Row<'_>) -> SqliteResult<Step> {
    Ok(Step {
        step_id: row.get(0)?,
        phase_id: row.get(1)?,
        index: row.get(2)?,
        code: row.get(3)?,
        description: localized_from_row(row, 4)?,
    })
}
