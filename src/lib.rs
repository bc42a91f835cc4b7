// ==========================================
// 工艺主数据目录 - 核心库
// ==========================================
// 目录: Area → Unit → Phase → 参数 / 步骤 / 联锁 / 转换条件
// 存储: SQLite，每个项目一个数据库文件
// 核心: 主数据幂等合并导入 + 多格式导出
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 合并规则 / 翻译 / 详情保存
pub mod engine;

// 导出层 - 主数据投影 / 下游报表
pub mod export;

// 导入层 - 工作簿解析
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能日志
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 项目注册表 / 异步命令
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CellValue, ConditionLogic, DataType, Locale, LocalizedText, ParamClass, PhaseRecord, Sheet,
    Workbook,
};
pub use engine::{MergeEngine, MergeSummary, PhaseDetailService, Translator};
pub use api::{ApiError, ApiResult, CatalogApi};
pub use app::{AppState, ProjectRegistry};
pub use config::CatalogConfig;
pub use repository::PhaseFilter;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工艺主数据目录";
