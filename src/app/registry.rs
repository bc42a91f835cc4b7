// ==========================================
// 工艺主数据目录 - 项目注册表
// ==========================================
// 职责: 项目数据库文件的创建/列举/删除；每个项目一个缓存连接
// 约定: 项目文件 `{folder}/{name}.db`；模板库存在时创建项目复制模板
// 生命周期: 连接在进程内复用，close / close_all 显式释放
// ==========================================

use crate::api::{ApiError, ApiResult};
use crate::config::CatalogConfig;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::perf::{install_sqlite_tracing, SqlProfileSettings};
use crate::repository::RepositoryError;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

const DB_EXTENSION: &str = "db";

pub type SharedConnection = Arc<Mutex<Connection>>;

/// 项目名校验：非空，且不含空格、`.` 与路径分隔符
pub fn validate_project_name(name: &str) -> ApiResult<&str> {
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|c| c == ' ' || c == '.' || c == '/' || c == '\\');
    if invalid {
        return Err(ApiError::InvalidInput(format!(
            "项目名无效: '{}'（不能为空，不能包含空格、'.' 或路径分隔符）",
            name
        )));
    }
    Ok(name)
}

// ==========================================
// ProjectRegistry - 项目注册表
// ==========================================
pub struct ProjectRegistry {
    config: CatalogConfig,
    sql_profile: SqlProfileSettings,
    connections: Mutex<HashMap<String, SharedConnection>>,
}

impl ProjectRegistry {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            sql_profile: SqlProfileSettings::from_env(),
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    fn cache(&self) -> ApiResult<std::sync::MutexGuard<'_, HashMap<String, SharedConnection>>> {
        self.connections
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()).into())
    }

    pub fn project_path(&self, name: &str) -> ApiResult<PathBuf> {
        let name = validate_project_name(name)?;
        Ok(self
            .config
            .database_folder
            .join(format!("{}.{}", name, DB_EXTENSION)))
    }

    /// 创建项目：复制模板库（若存在），再补齐 schema
    pub fn create(&self, name: &str) -> ApiResult<PathBuf> {
        let path = self.project_path(name)?;
        if path.exists() {
            return Err(ApiError::InvalidInput(format!("项目 '{}' 已存在", name)));
        }
        std::fs::create_dir_all(&self.config.database_folder)?;

        let template = self.config.template_db_path();
        if template.is_file() {
            std::fs::copy(&template, &path)?;
            info!(project = name, template = %template.display(), "项目由模板创建");
        } else {
            info!(project = name, "项目创建（空库）");
        }

        let conn = open_sqlite_connection(&path)?;
        ensure_schema(&conn)?;
        Ok(path)
    }

    /// 列出项目名（不含模板库），按名称排序
    pub fn list(&self) -> ApiResult<Vec<String>> {
        let folder = &self.config.database_folder;
        if !folder.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(folder)? {
            let path = entry?.path();
            let is_db = path.extension().and_then(|e| e.to_str()) == Some(DB_EXTENSION);
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if !is_db || file_name == self.config.template_db_name {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// 删除项目文件（先关闭缓存连接）
    pub fn delete(&self, name: &str) -> ApiResult<()> {
        let path = self.project_path(name)?;
        self.close(name)?;
        if !path.exists() {
            return Err(ApiError::NotFound(format!("项目 '{}' 不存在", name)));
        }
        std::fs::remove_file(&path)?;
        info!(project = name, "项目已删除");
        Ok(())
    }

    /// 获取项目连接（首次打开后缓存）
    pub fn connection(&self, name: &str) -> ApiResult<SharedConnection> {
        let path = self.project_path(name)?;
        let mut cache = self.cache()?;
        if let Some(conn) = cache.get(name) {
            return Ok(conn.clone());
        }
        if !path.is_file() {
            return Err(ApiError::NotFound(format!("项目 '{}' 不存在", name)));
        }

        let mut conn = open_sqlite_connection(&path)?;
        ensure_schema(&conn)?;
        install_sqlite_tracing(&mut conn, name, self.sql_profile);

        let shared = Arc::new(Mutex::new(conn));
        cache.insert(name.to_string(), shared.clone());
        info!(project = name, path = %path.display(), "项目连接已打开");
        Ok(shared)
    }

    /// 关闭单个项目连接；仍被其他持有者引用时仅从缓存移除
    pub fn close(&self, name: &str) -> ApiResult<()> {
        let removed = self.cache()?.remove(name);
        if let Some(shared) = removed {
            close_shared(name, shared);
        }
        Ok(())
    }

    pub fn close_all(&self) -> ApiResult<()> {
        let drained: Vec<_> = self.cache()?.drain().collect();
        for (name, shared) in drained {
            close_shared(&name, shared);
        }
        Ok(())
    }

    pub fn open_count(&self) -> ApiResult<usize> {
        Ok(self.cache()?.len())
    }
}

fn close_shared(name: &str, shared: SharedConnection) {
    match Arc::try_unwrap(shared) {
        Ok(mutex) => {
            let conn = match mutex.into_inner() {
                Ok(conn) => conn,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Err((_, e)) = conn.close() {
                warn!(project = name, error = %e, "项目连接关闭失败");
            }
        }
        Err(_) => warn!(project = name, "项目连接仍被引用，延后释放"),
    }
}
