// ==========================================
// 工艺主数据目录 - Unit 仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::catalog::{non_blank, Unit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

/// Unit 及所属区域名称
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRecord {
    pub unit: Unit,
    pub area_name: String,
}

// ==========================================
// UnitRepository - 单元仓储
// ==========================================
pub struct UnitRepository<'c> {
    conn: &'c Connection,
}

impl<'c> UnitRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 新增单元，返回 unit_id
    pub fn insert(
        &self,
        area_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT INTO units (area_id, name, description) VALUES (?1, ?2, ?3)",
            params![area_id, name, non_blank(description.map(str::to_string))],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, unit_id: i64) -> RepositoryResult<Option<Unit>> {
        let unit = self
            .conn
            .query_row(
                "SELECT unit_id, area_id, name, description FROM units WHERE unit_id = ?1",
                params![unit_id],
                map_unit,
            )
            .optional()?;
        Ok(unit)
    }

    /// 全部单元（含区域名），按 区域名 / 单元名 排序
    ///
    /// # 参数
    /// - `area_id`: 可选，仅返回该区域下的单元
    pub fn list_records(&self, area_id: Option<i64>) -> RepositoryResult<Vec<UnitRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT u.unit_id, u.area_id, u.name, u.description, a.name
            FROM units u
            JOIN areas a ON a.area_id = u.area_id
            WHERE (?1 IS NULL OR u.area_id = ?1)
            ORDER BY a.name ASC, u.name ASC
            "#,
        )?;
        let records = stmt
            .query_map(params![area_id], |row| {
                Ok(UnitRecord {
                    unit: map_unit(row)?,
                    area_name: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 更新名称、所属区域与描述
    pub fn update(
        &self,
        unit_id: i64,
        area_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            "UPDATE units SET area_id = ?1, name = ?2, description = ?3 WHERE unit_id = ?4",
            params![
                area_id,
                name,
                non_blank(description.map(str::to_string)),
                unit_id
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Unit", unit_id));
        }
        Ok(())
    }

    /// 删除单元（级联删除其下全部 Phase 及子记录）
    pub fn delete(&self, unit_id: i64) -> RepositoryResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM units WHERE unit_id = ?1", params![unit_id])?;
        Ok(affected > 0)
    }
}

fn map_unit(row: &rusqlite::Row<'_>) -> SqliteResult<Unit> {
    Ok(Unit {
        unit_id: row.get(0)?,
        area_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
    })
}
