// ==========================================
// 工艺主数据目录 - 运行配置
// ==========================================
// 来源优先级: JSON 文件 > 环境变量 > 默认值
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 环境变量名
pub mod env_keys {
    pub const DATA_DIR: &str = "PHASE_CATALOG_DATA_DIR";
    pub const TEMPLATE_DB: &str = "PHASE_CATALOG_TEMPLATE_DB";
    pub const TRANSLATE_URL: &str = "PHASE_CATALOG_TRANSLATE_URL";
    pub const TRANSLATE_KEY: &str = "PHASE_CATALOG_TRANSLATE_KEY";
    pub const TRANSLATE_TIMEOUT_MS: &str = "PHASE_CATALOG_TRANSLATE_TIMEOUT_MS";
}

/// 默认模板库文件名（存在时新建项目会复制它）
pub const DEFAULT_TEMPLATE_DB_NAME: &str = "template.db";

/// 默认翻译请求超时（毫秒）
pub const DEFAULT_TRANSLATE_TIMEOUT_MS: u64 = 5_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    FileReadError { path: String, message: String },

    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    #[error("配置值格式错误 (key: {key}, value: {value})")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// TranslationConfig - 翻译服务配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub enabled: bool,
    /// LibreTranslate 兼容端点，例如 `http://localhost:5000/translate`
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            timeout_ms: DEFAULT_TRANSLATE_TIMEOUT_MS,
        }
    }
}

// ==========================================
// CatalogConfig - 目录服务配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// 项目数据库目录（每个项目一个 `{name}.db`）
    pub database_folder: PathBuf,
    /// 模板库文件名（位于 database_folder 下）
    pub template_db_name: String,
    pub translation: TranslationConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_folder: get_default_database_folder(),
            template_db_name: DEFAULT_TEMPLATE_DB_NAME.to_string(),
            translation: TranslationConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// 指定目录，其余取默认值（测试常用）
    pub fn with_folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            database_folder: folder.into(),
            ..Self::default()
        }
    }

    /// 从环境变量加载
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载（环境变量的可测试形式）
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(dir) = get(env_keys::DATA_DIR) {
            config.database_folder = PathBuf::from(dir);
        }
        if let Some(name) = get(env_keys::TEMPLATE_DB) {
            config.template_db_name = name;
        }
        if let Some(url) = get(env_keys::TRANSLATE_URL) {
            config.translation.enabled = true;
            config.translation.endpoint = Some(url);
        }
        config.translation.api_key = get(env_keys::TRANSLATE_KEY);
        if let Some(raw) = get(env_keys::TRANSLATE_TIMEOUT_MS) {
            config.translation.timeout_ms =
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: env_keys::TRANSLATE_TIMEOUT_MS.to_string(),
                    value: raw.clone(),
                })?;
        }
        Ok(config)
    }

    /// 从 JSON 文件加载，缺失字段取默认值
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 模板库完整路径
    pub fn template_db_path(&self) -> PathBuf {
        self.database_folder.join(&self.template_db_name)
    }
}

/// 默认项目数据库目录
///
/// - 用户数据目录/phase-catalog/databases
/// - 无法获取用户数据目录时回退到 ./databases
pub fn get_default_database_folder() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("phase-catalog").join("databases"),
        None => PathBuf::from("./databases"),
    }
}
