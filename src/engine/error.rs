// ==========================================
// 工艺主数据目录 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 合并/导出过程中任何错误都会导致事务回滚
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 输入校验 =====
    #[error("校验失败 (工作表 {sheet}, 行 {row}, 列 {column}): {message}")]
    ValidationFailure {
        sheet: String,
        row: usize,
        column: String,
        message: String,
    },

    #[error("约束违反: {0}")]
    ConstraintViolation(String),

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    // ===== 存储 =====
    #[error("仓储错误: {0}")]
    Repository(RepositoryError),

    // ===== 导出写出 =====
    #[error("XML 写出失败: {0}")]
    XmlWriteError(String),

    #[error("ZIP 打包失败: {0}")]
    ArchiveError(String),

    #[error("CSV 写出失败: {0}")]
    CsvWriteError(String),

    #[error("Excel 写出失败: {0}")]
    XlsxWriteError(String),
}

impl EngineError {
    pub fn validation(
        sheet: &str,
        row: usize,
        column: &str,
        message: impl Into<String>,
    ) -> Self {
        EngineError::ValidationFailure {
            sheet: sheet.to_string(),
            row,
            column: column.to_string(),
            message: message.into(),
        }
    }
}

// 唯一约束与未找到单独归类，其余保留仓储错误
impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueConstraintViolation(msg) => {
                EngineError::ConstraintViolation(msg)
            }
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Repository(other),
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        RepositoryError::from(err).into()
    }
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::CsvWriteError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for EngineError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        EngineError::XlsxWriteError(err.to_string())
    }
}

impl From<zip::result::ZipError> for EngineError {
    fn from(err: zip::result::ZipError) -> Self {
        EngineError::ArchiveError(err.to_string())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_becomes_constraint_violation() {
        let err: EngineError =
            RepositoryError::UniqueConstraintViolation("UNIQUE constraint failed".into()).into();
        assert!(matches!(err, EngineError::ConstraintViolation(_)));
    }

    #[test]
    fn test_validation_message() {
        let err = EngineError::validation("Parameters", 3, "Number", "不是整数");
        assert_eq!(
            err.to_string(),
            "校验失败 (工作表 Parameters, 行 3, 列 Number): 不是整数"
        );
    }
}
