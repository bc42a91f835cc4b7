// ==========================================
// 工艺主数据目录 - Area 仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::catalog::{non_blank, Area};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

// ==========================================
// AreaRepository - 区域仓储
// ==========================================
/// 职责: 管理 areas 表的 CRUD 操作
///
/// 连接由调用方提供（通常为事务），仓储本身不持有事务边界。
pub struct AreaRepository<'c> {
    conn: &'c Connection,
}

impl<'c> AreaRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 新增区域，返回 area_id
    pub fn insert(&self, name: &str, description: Option<&str>) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT INTO areas (name, description) VALUES (?1, ?2)",
            params![name, non_blank(description.map(str::to_string))],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 按主键查询
    pub fn find_by_id(&self, area_id: i64) -> RepositoryResult<Option<Area>> {
        let area = self
            .conn
            .query_row(
                "SELECT area_id, name, description FROM areas WHERE area_id = ?1",
                params![area_id],
                map_area,
            )
            .optional()?;
        Ok(area)
    }

    /// 按名称查询（名称全局唯一）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Area>> {
        let area = self
            .conn
            .query_row(
                "SELECT area_id, name, description FROM areas WHERE name = ?1",
                params![name],
                map_area,
            )
            .optional()?;
        Ok(area)
    }

    /// 全部区域，按名称排序
    pub fn list_all(&self) -> RepositoryResult<Vec<Area>> {
        let mut stmt = self
            .conn
            .prepare("SELECT area_id, name, description FROM areas ORDER BY name ASC")?;
        let areas = stmt
            .query_map([], map_area)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(areas)
    }

    /// 更新名称与描述
    pub fn update(
        &self,
        area_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            "UPDATE areas SET name = ?1, description = ?2 WHERE area_id = ?3",
            params![name, non_blank(description.map(str::to_string)), area_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Area", area_id));
        }
        Ok(())
    }

    /// 删除区域（级联删除其下全部 Unit / Phase 及子记录）
    ///
    /// # 返回
    /// - true: 已删除
    /// - false: 记录不存在
    pub fn delete(&self, area_id: i64) -> RepositoryResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM areas WHERE area_id = ?1", params![area_id])?;
        Ok(affected > 0)
    }
}

fn map_area(row: &rusqlite::Row<'_>) -> SqliteResult<Area> {
    Ok(Area {
        area_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}
