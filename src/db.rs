// ==========================================
// 工艺主数据目录 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键级联删除依赖 foreign_keys=ON）
// - 统一 busy_timeout
// - 建库: schema 不存在时自动创建
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::Path;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 目录 schema
///
/// 唯一约束与自然键一一对应；删除 Area/Unit/Phase 经 ON DELETE CASCADE 级联到全部后代。
pub const CATALOG_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS areas (
    area_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS units (
    unit_id INTEGER PRIMARY KEY,
    area_id INTEGER NOT NULL REFERENCES areas(area_id) ON DELETE CASCADE,
    name TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS phases (
    phase_id INTEGER PRIMARY KEY,
    unit_id INTEGER NOT NULL REFERENCES units(unit_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    phase_type TEXT NOT NULL,
    description_pt TEXT,
    description_en TEXT,
    description_es TEXT,
    UNIQUE (unit_id, name)
);

CREATE TABLE IF NOT EXISTS parameters (
    param_id INTEGER PRIMARY KEY,
    phase_id INTEGER NOT NULL REFERENCES phases(phase_id) ON DELETE CASCADE,
    number INTEGER NOT NULL,
    name TEXT NOT NULL,
    class TEXT NOT NULL CHECK (class IN ('PA', 'PE', 'PR')),
    data_type TEXT NOT NULL CHECK (data_type IN ('real', 'integer', 'bool')),
    description_pt TEXT,
    description_en TEXT,
    description_es TEXT,
    default_value TEXT,
    min_value TEXT,
    max_value TEXT,
    eng_unit TEXT,
    UNIQUE (phase_id, class, number)
);

CREATE TABLE IF NOT EXISTS steps (
    step_id INTEGER PRIMARY KEY,
    phase_id INTEGER NOT NULL REFERENCES phases(phase_id) ON DELETE CASCADE,
    step_index INTEGER NOT NULL CHECK (step_index BETWEEN 0 AND 49),
    code TEXT,
    description_pt TEXT,
    description_en TEXT,
    description_es TEXT,
    UNIQUE (phase_id, step_index)
);

CREATE TABLE IF NOT EXISTS interlocks (
    interlock_id INTEGER PRIMARY KEY,
    phase_id INTEGER NOT NULL REFERENCES phases(phase_id) ON DELETE CASCADE,
    bit INTEGER NOT NULL CHECK (bit BETWEEN 0 AND 31),
    safety_pt TEXT,
    safety_en TEXT,
    safety_es TEXT,
    process_pt TEXT,
    process_en TEXT,
    process_es TEXT,
    UNIQUE (phase_id, bit)
);

CREATE TABLE IF NOT EXISTS transition_row_descriptions (
    row_desc_id INTEGER PRIMARY KEY,
    phase_id INTEGER NOT NULL REFERENCES phases(phase_id) ON DELETE CASCADE,
    row_number INTEGER NOT NULL CHECK (row_number BETWEEN 0 AND 31),
    description_pt TEXT,
    description_en TEXT,
    description_es TEXT,
    UNIQUE (phase_id, row_number)
);

CREATE TABLE IF NOT EXISTS transition_conditions (
    condition_id INTEGER PRIMARY KEY,
    phase_id INTEGER NOT NULL REFERENCES phases(phase_id) ON DELETE CASCADE,
    step_index INTEGER NOT NULL CHECK (step_index BETWEEN 0 AND 31),
    condition_row INTEGER NOT NULL CHECK (condition_row BETWEEN 0 AND 31),
    condition_logic TEXT NOT NULL DEFAULT 'N/A' CHECK (condition_logic IN ('AND', 'OR', 'N/A')),
    text_pt TEXT,
    text_en TEXT,
    text_es TEXT,
    UNIQUE (phase_id, step_index, condition_row)
);

CREATE INDEX IF NOT EXISTS idx_units_area ON units(area_id);
CREATE INDEX IF NOT EXISTS idx_phases_unit ON phases(unit_id);
"#;

/// 子表 → 父表顺序（全量删除使用）
pub const TABLES_CHILD_FIRST: [&str; 8] = [
    "transition_conditions",
    "transition_row_descriptions",
    "steps",
    "parameters",
    "interlocks",
    "phases",
    "units",
    "areas",
];

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection<P: AsRef<Path>>(db_path: P) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建目录 schema（幂等）并登记 schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CATALOG_SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 打开连接 + 建表
pub fn open_catalog_connection<P: AsRef<Path>>(db_path: P) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// 内存库（测试/临时计算）
pub fn open_in_memory_catalog() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = open_in_memory_catalog().unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_in_memory_catalog().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
