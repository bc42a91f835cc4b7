// ==========================================
// 工艺主数据目录 - 应用状态
// ==========================================
// 职责: 进程级共享状态（配置 + 项目注册表 + 翻译器）
// ==========================================

use std::sync::Arc;

use crate::api::{ApiResult, CatalogApi};
use crate::app::registry::ProjectRegistry;
use crate::config::CatalogConfig;
use crate::engine::{build_translator, Translator};

/// 应用状态
///
/// 命令层持有一个实例；每个请求按项目名取得 CatalogApi
pub struct AppState {
    pub registry: Arc<ProjectRegistry>,
    pub translator: Arc<dyn Translator>,
}

impl AppState {
    pub fn new(config: CatalogConfig) -> Self {
        tracing::info!(
            folder = %config.database_folder.display(),
            translation = config.translation.enabled,
            "初始化AppState"
        );
        let translator: Arc<dyn Translator> = Arc::from(build_translator(&config.translation));
        Self::with_translator(config, translator)
    }

    /// 指定翻译器（测试或离线场景）
    pub fn with_translator(config: CatalogConfig, translator: Arc<dyn Translator>) -> Self {
        Self {
            registry: Arc::new(ProjectRegistry::new(config)),
            translator,
        }
    }

    /// 项目的目录 API（连接由注册表缓存）
    pub fn catalog_api(&self, project: &str) -> ApiResult<CatalogApi> {
        let conn = self.registry.connection(project)?;
        Ok(CatalogApi::new(conn, self.translator.clone()))
    }

    /// 进程退出前释放全部连接
    pub fn shutdown(&self) -> ApiResult<()> {
        self.registry.close_all()
    }
}
