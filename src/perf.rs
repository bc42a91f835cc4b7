// ==========================================
// 工艺主数据目录 - 命令性能日志
// ==========================================
// 职责: 每个命令一条 perf 日志（项目、耗时、行数、SQL 数、慢 SQL 数）
// 实现: 命令作用域压栈到线程局部；SQLite profile 回调计入栈顶作用域
// 开关: PHASE_CATALOG_PERF_SQL / PHASE_CATALOG_SLOW_SQL_MS
// ==========================================

use rusqlite::Connection;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub const PERF_SQL_ENV: &str = "PHASE_CATALOG_PERF_SQL";
pub const SLOW_SQL_MS_ENV: &str = "PHASE_CATALOG_SLOW_SQL_MS";

const SLOW_SQL_LOG_LEN: usize = 420;

// profile 回调是 fn 指针，阈值只能放全局
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

/// 一个命令作用域内累计的 SQL 统计
#[derive(Debug, Default, Clone)]
struct CommandScope {
    project: Option<String>,
    sql_count: u64,
    slow_sql_count: u64,
}

thread_local! {
    static SCOPES: RefCell<Vec<CommandScope>> = const { RefCell::new(Vec::new()) };
}

// ==========================================
// SQL profile 配置
// ==========================================

/// 项目连接的 SQL profile 设置
///
/// Debug 构建默认开启（阈值 50ms），Release 默认关闭（阈值 200ms）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlProfileSettings {
    pub enabled: bool,
    pub slow_ms: u64,
}

impl SqlProfileSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup(PERF_SQL_ENV)
            .map(|v| flag_enabled(&v))
            .unwrap_or(cfg!(debug_assertions));
        let slow_ms = lookup(SLOW_SQL_MS_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self { enabled, slow_ms }
    }
}

fn flag_enabled(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn single_line_sql(sql: &str, max_len: usize) -> String {
    let flat: String = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

/// 为项目连接安装 SQL profile；关闭时清除回调
pub fn install_sqlite_tracing(conn: &mut Connection, project: &str, settings: SqlProfileSettings) {
    if !settings.enabled {
        conn.profile(None);
        return;
    }
    SLOW_SQL_THRESHOLD_MS.store(settings.slow_ms, Ordering::Relaxed);
    conn.profile(Some(on_statement_profiled));
    tracing::debug!(target: "perf", project, slow_ms = settings.slow_ms, "SQL profile 已开启");
}

fn on_statement_profiled(sql: &str, duration: Duration) {
    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    let slow = threshold > 0 && ms >= threshold;

    let project = SCOPES.with(|scopes| {
        let mut scopes = scopes.borrow_mut();
        scopes.last_mut().and_then(|scope| {
            scope.sql_count += 1;
            if slow {
                scope.slow_sql_count += 1;
            }
            scope.project.clone()
        })
    });

    if slow {
        tracing::warn!(
            target: "slow_sql",
            project = project.as_deref().unwrap_or("-"),
            duration_ms = ms,
            sql = %single_line_sql(sql, SLOW_SQL_LOG_LEN),
            "slow sql"
        );
    }
}

// ==========================================
// PerfGuard - 命令级性能日志
// ==========================================

/// 命令作用域：drop 时输出 `perf` 日志
///
/// 嵌套作用域结束时，SQL 计数并入外层作用域。
///
/// ```ignore
/// let mut perf = phase_catalog::perf::PerfGuard::new("cmd.merge_file").for_project("plant");
/// let summary = api.merge_file(&path)?;
/// perf.record_rows(summary.total_inserted());
/// ```
pub struct PerfGuard {
    op: &'static str,
    project: Option<String>,
    start: Instant,
    rows: Option<usize>,
    output_bytes: Option<usize>,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        SCOPES.with(|s| s.borrow_mut().push(CommandScope::default()));
        Self {
            op,
            project: None,
            start: Instant::now(),
            rows: None,
            output_bytes: None,
        }
    }

    pub fn for_project(mut self, project: &str) -> Self {
        self.project = Some(project.to_string());
        SCOPES.with(|s| {
            if let Some(scope) = s.borrow_mut().last_mut() {
                scope.project = Some(project.to_string());
            }
        });
        self
    }

    /// 合并插入行数 / 查询返回行数
    pub fn record_rows(&mut self, rows: usize) {
        self.rows = Some(rows);
    }

    /// 导出内容字节数
    pub fn record_output(&mut self, bytes: usize) {
        self.output_bytes = Some(bytes);
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let scope = SCOPES.with(|s| {
            let mut scopes = s.borrow_mut();
            let finished = scopes.pop().unwrap_or_default();
            if let Some(outer) = scopes.last_mut() {
                outer.sql_count += finished.sql_count;
                outer.slow_sql_count += finished.slow_sql_count;
            }
            finished
        });

        tracing::info!(
            target: "perf",
            op = self.op,
            project = self.project.as_deref().unwrap_or("-"),
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            rows = self.rows,
            output_bytes = self.output_bytes,
            sql_count = scope.sql_count,
            slow_sql_count = scope.slow_sql_count,
            "done"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_sql_count() -> Option<u64> {
        SCOPES.with(|s| s.borrow().last().map(|scope| scope.sql_count))
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = SqlProfileSettings::from_lookup(|key| match key {
            PERF_SQL_ENV => Some(" ON ".to_string()),
            SLOW_SQL_MS_ENV => Some("75".to_string()),
            _ => None,
        });
        assert_eq!(settings, SqlProfileSettings { enabled: true, slow_ms: 75 });

        let off = SqlProfileSettings::from_lookup(|key| (key == PERF_SQL_ENV).then(|| "0".to_string()));
        assert!(!off.enabled);
    }

    #[test]
    fn test_single_line_sql() {
        assert_eq!(single_line_sql("SELECT 1\n  FROM areas", 100), "SELECT 1 FROM areas");
        assert_eq!(single_line_sql("SELECT name FROM phases", 6), "SELECT…");
    }

    #[test]
    fn test_statements_counted_in_innermost_scope() {
        let mut conn = Connection::open_in_memory().unwrap();
        install_sqlite_tracing(
            &mut conn,
            "plant",
            SqlProfileSettings { enabled: true, slow_ms: 0 },
        );

        let outer = PerfGuard::new("test.outer").for_project("plant");
        conn.execute_batch("CREATE TABLE areas (name TEXT)").unwrap();
        {
            let mut inner = PerfGuard::new("test.inner").for_project("plant");
            conn.execute("INSERT INTO areas VALUES ('Utilities')", []).unwrap();
            conn.execute("INSERT INTO areas VALUES ('Packaging')", []).unwrap();
            inner.record_rows(2);
            assert_eq!(current_sql_count(), Some(2));
        }
        assert_eq!(current_sql_count(), Some(3));
        drop(outer);
        assert_eq!(current_sql_count(), None);
    }
}
