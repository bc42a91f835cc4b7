// ==========================================
// 工艺主数据目录 - API 层
// ==========================================
// 职责: 提供目录业务接口，供命令层 / CLI 调用
// ==========================================

pub mod catalog_api;
pub mod error;

// 重导出核心类型
pub use catalog_api::{
    prefixed_phase_name, CatalogApi, PhaseDetail, PhaseEdit, DEFAULT_PHASE_LIST_LIMIT,
};
pub use error::{ApiError, ApiResult};
