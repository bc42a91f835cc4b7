// ==========================================
// 工艺主数据目录 - Interlock 仓储
// ==========================================
// 自然键: (phase_id, bit)，bit ∈ 0..31
// ==========================================

use crate::domain::catalog::{Interlock, NewInterlock};
use crate::repository::error::RepositoryResult;
use crate::repository::localized_from_row;
use rusqlite::{params, Connection, Result as SqliteResult};

pub struct InterlockRepository<'c> {
    conn: &'c Connection,
}

impl<'c> InterlockRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, interlock: &NewInterlock) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO interlocks (
                phase_id, bit, safety_pt, safety_en, safety_es, process_pt, process_en, process_es
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                interlock.phase_id,
                interlock.bit,
                interlock.safety.pt,
                interlock.safety.en,
                interlock.safety.es,
                interlock.process.pt,
                interlock.process.en,
                interlock.process.es,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 按 (phase_id, bit) 覆盖写入
    pub fn upsert(&self, interlock: &NewInterlock) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO interlocks (
                phase_id, bit, safety_pt, safety_en, safety_es, process_pt, process_en, process_es
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (phase_id, bit) DO UPDATE SET
                safety_pt = excluded.safety_pt,
                safety_en = excluded.safety_en,
                safety_es = excluded.safety_es,
                process_pt = excluded.process_pt,
                process_en = excluded.process_en,
                process_es = excluded.process_es
            "#,
            params![
                interlock.phase_id,
                interlock.bit,
                interlock.safety.pt,
                interlock.safety.en,
                interlock.safety.es,
                interlock.process.pt,
                interlock.process.en,
                interlock.process.es,
            ],
        )?;
        Ok(())
    }

    /// Phase 下全部联锁，按 bit 排序
    pub fn list_by_phase(&self, phase_id: i64) -> RepositoryResult<Vec<Interlock>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT interlock_id, phase_id, bit,
                   safety_pt, safety_en, safety_es,
                   process_pt, process_en, process_es
            FROM interlocks
            WHERE phase_id = ?1
            ORDER BY bit ASC
            "#,
        )?;
        let interlocks = stmt
            .query_map(params![phase_id], |row| {
                Ok(Interlock {
                    interlock_id: row.get(0)?,
                    phase_id: row.get(1)?,
                    bit: row.get(2)?,
                    safety: localized_from_row(row, 3)?,
                    process: localized_from_row(row, 6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(interlocks)
    }

    pub fn delete(&self, phase_id: i64, bit: i64) -> RepositoryResult<bool> {
        let affected = self.conn.execute(
            "DELETE FROM interlocks WHERE phase_id = ?1 AND bit = ?2",
            params![phase_id, bit],
        )?;
        Ok(affected > 0)
    }

    pub fn list_keys(&self) -> RepositoryResult<Vec<(i64, i64)>> {
        let mut stmt = self.conn.prepare("SELECT phase_id, bit FROM interlocks")?;
        let keys = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(keys)
    }
}
