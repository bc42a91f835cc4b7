// ==========================================
// 工艺主数据目录 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化; 连接(或事务)由调用方传入
// ==========================================

pub mod area_repo;
pub mod error;
pub mod interlock_repo;
pub mod parameter_repo;
pub mod phase_repo;
pub mod step_repo;
pub mod transition_repo;
pub mod unit_repo;

// 重导出核心仓储
pub use area_repo::AreaRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use interlock_repo::InterlockRepository;
pub use parameter_repo::ParameterRepository;
pub use phase_repo::{PhaseFilter, PhaseRepository};
pub use step_repo::StepRepository;
pub use transition_repo::TransitionRepository;
pub use unit_repo::{UnitRecord, UnitRepository};

use crate::db::TABLES_CHILD_FIRST;
use crate::domain::catalog::LocalizedText;
use rusqlite::types::Type;
use rusqlite::Connection;

/// 清空整个目录（子表 → 父表）
///
/// 不开启事务，由调用方决定事务边界。
pub fn clear_catalog(conn: &Connection) -> RepositoryResult<()> {
    for table in TABLES_CHILD_FIRST {
        conn.execute(&format!("DELETE FROM {}", table), [])?;
    }
    Ok(())
}

/// 从连续三列 (pt, en, es) 读取三语文本
pub(crate) fn localized_from_row(
    row: &rusqlite::Row<'_>,
    first_column: usize,
) -> rusqlite::Result<LocalizedText> {
    Ok(LocalizedText::new(
        row.get(first_column)?,
        row.get(first_column + 1)?,
        row.get(first_column + 2)?,
    ))
}

/// 列值无法转换为领域类型
pub(crate) fn invalid_column(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}
