// ==========================================
// 工艺主数据目录 - 配置层
// ==========================================
// 职责: 项目目录、模板库、翻译服务配置
// 来源: JSON 文件 / 环境变量 / 默认值
// ==========================================

pub mod catalog_config;

pub use catalog_config::{
    env_keys, get_default_database_folder, CatalogConfig, ConfigError, ConfigResult,
    TranslationConfig,
};
