// ==========================================
// 工艺主数据目录 - API层错误类型
// ==========================================
// 职责: 汇总下层错误，转换为面向调用方的错误消息
// ==========================================

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::importer::ImportError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与资源
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("约束违反: {0}")]
    ConstraintViolation(String),

    // ==========================================
    // 数据访问
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    /// 合并/导入失败，事务已回滚
    #[error("事务失败（已回滚）: {0}")]
    TransactionFailure(String),

    // ==========================================
    // 导入导出
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("文件导出失败: {0}")]
    ExportError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 将合并引擎错误包装为事务失败，保留校验错误的原始分类
    pub fn transaction(context: &str, err: EngineError) -> Self {
        match err {
            EngineError::ValidationFailure { .. } => {
                ApiError::InvalidInput(format!("{}: {}", context, err))
            }
            other => ApiError::TransactionFailure(format!("{}: {}", context, other)),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ConstraintViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ConstraintViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("检查约束违反: {}", msg))
            }
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        RepositoryError::from(err).into()
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ValidationFailure { .. } => ApiError::InvalidInput(err.to_string()),
            EngineError::ConstraintViolation(msg) => ApiError::ConstraintViolation(msg),
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::Repository(inner) => inner.into(),
            EngineError::XmlWriteError(_)
            | EngineError::ArchiveError(_)
            | EngineError::CsvWriteError(_)
            | EngineError::XlsxWriteError(_) => ApiError::ExportError(err.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::NotFound(format!("文件不存在: {}", path)),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::InternalError(format!("IO错误: {}", err))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
