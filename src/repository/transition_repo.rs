// ==========================================
// 工艺主数据目录 - 转换条件仓储
// ==========================================
// 两张表:
// - transition_row_descriptions: 自然键 (phase_id, row_number)
// - transition_conditions: 自然键 (phase_id, step_index, condition_row)
// 存储的条件文本不含逻辑后缀
// ==========================================

use crate::domain::catalog::{
    NewTransitionCondition, NewTransitionRowDescription, TransitionCondition,
    TransitionRowDescription,
};
use crate::domain::types::ConditionLogic;
use crate::repository::error::RepositoryResult;
use crate::repository::localized_from_row;
use rusqlite::{params, Connection, Result as SqliteResult};

pub struct TransitionRepository<'c> {
    conn: &'c Connection,
}

impl<'c> TransitionRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ==========================================
    // 行描述
    // ==========================================

    pub fn insert_row_description(
        &self,
        row_desc: &NewTransitionRowDescription,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO transition_row_descriptions (
                phase_id, row_number, description_pt, description_en, description_es
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                row_desc.phase_id,
                row_desc.row,
                row_desc.description.pt,
                row_desc.description.en,
                row_desc.description.es,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn upsert_row_description(
        &self,
        row_desc: &NewTransitionRowDescription,
    ) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO transition_row_descriptions (
                phase_id, row_number, description_pt, description_en, description_es
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (phase_id, row_number) DO UPDATE SET
                description_pt = excluded.description_pt,
                description_en = excluded.description_en,
                description_es = excluded.description_es
            "#,
            params![
                row_desc.phase_id,
                row_desc.row,
                row_desc.description.pt,
                row_desc.description.en,
                row_desc.description.es,
            ],
        )?;
        Ok(())
    }

    pub fn list_row_descriptions(
        &self,
        phase_id: i64,
    ) -> RepositoryResult<Vec<TransitionRowDescription>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT row_desc_id, phase_id, row_number,
                   description_pt, description_en, description_es
            FROM transition_row_descriptions
            WHERE phase_id = ?1
            ORDER BY row_number ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![phase_id], |row| {
                Ok(TransitionRowDescription {
                    row_desc_id: row.get(0)?,
                    phase_id: row.get(1)?,
                    row: row.get(2)?,
                    description: localized_from_row(row, 3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn delete_row_description(&self, phase_id: i64, row: i64) -> RepositoryResult<bool> {
        let affected = self.conn.execute(
            "DELETE FROM transition_row_descriptions WHERE phase_id = ?1 AND row_number = ?2",
            params![phase_id, row],
        )?;
        Ok(affected > 0)
    }

    pub fn list_row_description_keys(&self) -> RepositoryResult<Vec<(i64, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT phase_id, row_number FROM transition_row_descriptions")?;
        let keys = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(keys)
    }

    // ==========================================
    // 条件单元格
    // ==========================================

    pub fn insert_condition(&self, condition: &NewTransitionCondition) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO transition_conditions (
                phase_id, step_index, condition_row, condition_logic, text_pt, text_en, text_es
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                condition.phase_id,
                condition.step_index,
                condition.row,
                condition.logic.as_str(),
                condition.text.pt,
                condition.text.en,
                condition.text.es,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn upsert_condition(&self, condition: &NewTransitionCondition) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO transition_conditions (
                phase_id, step_index, condition_row, condition_logic, text_pt, text_en, text_es
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (phase_id, step_index, condition_row) DO UPDATE SET
                condition_logic = excluded.condition_logic,
                text_pt = excluded.text_pt,
                text_en = excluded.text_en,
                text_es = excluded.text_es
            "#,
            params![
                condition.phase_id,
                condition.step_index,
                condition.row,
                condition.logic.as_str(),
                condition.text.pt,
                condition.text.en,
                condition.text.es,
            ],
        )?;
        Ok(())
    }

    /// Phase 下全部条件，按 条件行 / 步骤列 排序
    pub fn list_conditions(&self, phase_id: i64) -> RepositoryResult<Vec<TransitionCondition>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT condition_id, phase_id, step_index, condition_row, condition_logic,
                   text_pt, text_en, text_es
            FROM transition_conditions
            WHERE phase_id = ?1
            ORDER BY condition_row ASC, step_index ASC
            "#,
        )?;
        let conditions = stmt
            .query_map(params![phase_id], |row| {
                let logic: String = row.get(4)?;
                Ok(TransitionCondition {
                    condition_id: row.get(0)?,
                    phase_id: row.get(1)?,
                    step_index: row.get(2)?,
                    row: row.get(3)?,
                    logic: ConditionLogic::from_db_str(&logic),
                    text: localized_from_row(row, 5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(conditions)
    }

    pub fn delete_condition(
        &self,
        phase_id: i64,
        step_index: i64,
        row: i64,
    ) -> RepositoryResult<bool> {
        let affected = self.conn.execute(
            r#"
            DELETE FROM transition_conditions
            WHERE phase_id = ?1 AND step_index = ?2 AND condition_row = ?3
            "#,
            params![phase_id, step_index, row],
        )?;
        Ok(affected > 0)
    }

    pub fn list_condition_keys(&self) -> RepositoryResult<Vec<(i64, i64, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT phase_id, step_index, condition_row FROM transition_conditions")?;
        let keys = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_catalog;
    use crate::domain::catalog::{LocalizedText, NewPhase};
    use crate::repository::{AreaRepository, PhaseRepository, UnitRepository};

    fn seed_phase(conn: &Connection) -> i64 {
        let area_id = AreaRepository::new(conn).insert("A", None).unwrap();
        let unit_id = UnitRepository::new(conn).insert(area_id, "U", None).unwrap();
        PhaseRepository::new(conn)
            .insert(&NewPhase {
                unit_id,
                name: "PH01".to_string(),
                phase_type: "PH".to_string(),
                description: LocalizedText::default(),
            })
            .unwrap()
    }

    #[test]
    fn test_condition_logic_round_trip() {
        let conn = open_in_memory_catalog().unwrap();
        let phase_id = seed_phase(&conn);
        let repo = TransitionRepository::new(&conn);

        repo.insert_condition(&NewTransitionCondition {
            phase_id,
            step_index: 3,
            row: 5,
            logic: ConditionLogic::And,
            text: LocalizedText::source_only("X=1"),
        })
        .unwrap();

        let listed = repo.list_conditions(phase_id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].logic, ConditionLogic::And);
        assert_eq!(listed[0].text.pt.as_deref(), Some("X=1"));
        assert_eq!(repo.list_condition_keys().unwrap(), vec![(phase_id, 3, 5)]);
    }

    #[test]
    fn test_row_description_upsert_and_delete() {
        let conn = open_in_memory_catalog().unwrap();
        let phase_id = seed_phase(&conn);
        let repo = TransitionRepository::new(&conn);

        let mut row_desc = NewTransitionRowDescription {
            phase_id,
            row: 0,
            description: LocalizedText::source_only("Linha 0"),
        };
        repo.upsert_row_description(&row_desc).unwrap();
        row_desc.description = LocalizedText::source_only("Linha zero");
        repo.upsert_row_description(&row_desc).unwrap();

        let rows = repo.list_row_descriptions(phase_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description.pt.as_deref(), Some("Linha zero"));
        assert!(repo.delete_row_description(phase_id, 0).unwrap());
        assert!(!repo.delete_row_description(phase_id, 0).unwrap());
    }
}
