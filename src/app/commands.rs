// ==========================================
// 工艺主数据目录 - 异步命令层
// ==========================================
// 职责: 外部层入口；阻塞的数据库/翻译操作放到 spawn_blocking 执行
// 约定: 每个命令记录一次 perf 日志（项目、耗时、行数或输出字节数、SQL 计数）
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ApiError, ApiResult, CatalogApi};
use crate::app::registry::ProjectRegistry;
use crate::app::state::AppState;
use crate::domain::catalog::PhaseRecord;
use crate::engine::{MergeSummary, Translator};
use crate::perf::PerfGuard;
use crate::repository::PhaseFilter;

async fn run_blocking<T, F>(op: &'static str, project: Option<String>, f: F) -> ApiResult<T>
where
    F: FnOnce(&mut PerfGuard) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut perf = PerfGuard::new(op);
        if let Some(project) = &project {
            perf = perf.for_project(project);
        }
        f(&mut perf)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("任务执行失败: {}", e)))?
}

/// 在阻塞线程上对指定项目执行一次目录操作
pub async fn with_catalog<T, F>(
    state: &AppState,
    project: &str,
    op: &'static str,
    f: F,
) -> ApiResult<T>
where
    F: FnOnce(&CatalogApi) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    measured_catalog(state, project, op, move |api, _| f(api)).await
}

/// 同 with_catalog，闭包可向 perf 日志补充行数 / 输出字节数
async fn measured_catalog<T, F>(
    state: &AppState,
    project: &str,
    op: &'static str,
    f: F,
) -> ApiResult<T>
where
    F: FnOnce(&CatalogApi, &mut PerfGuard) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let registry: Arc<ProjectRegistry> = state.registry.clone();
    let translator: Arc<dyn Translator> = state.translator.clone();
    let project = project.to_string();
    run_blocking(op, Some(project.clone()), move |perf| {
        let conn = registry.connection(&project)?;
        let api = CatalogApi::new(conn, translator);
        f(&api, perf)
    })
    .await
}

/// 导出命令：记录输出字节数
async fn export<F>(state: &AppState, project: &str, op: &'static str, f: F) -> ApiResult<Vec<u8>>
where
    F: FnOnce(&CatalogApi) -> ApiResult<Vec<u8>> + Send + 'static,
{
    measured_catalog(state, project, op, move |api, perf| {
        let bytes = f(api)?;
        perf.record_output(bytes.len());
        Ok(bytes)
    })
    .await
}

// ==========================================
// 项目
// ==========================================

pub async fn create_project(state: &AppState, name: &str) -> ApiResult<PathBuf> {
    let registry = state.registry.clone();
    let name = name.to_string();
    run_blocking("cmd.create_project", None, move |_| registry.create(&name)).await
}

pub async fn list_projects(state: &AppState) -> ApiResult<Vec<String>> {
    let registry = state.registry.clone();
    run_blocking("cmd.list_projects", None, move |perf| {
        let names = registry.list()?;
        perf.record_rows(names.len());
        Ok(names)
    }).await
}

pub async fn delete_project(state: &AppState, name: &str) -> ApiResult<()> {
    let registry = state.registry.clone();
    let name = name.to_string();
    run_blocking("cmd.delete_project", None, move |_| registry.delete(&name)).await
}

// ==========================================
// 合并 / 全量导入
// ==========================================

pub async fn merge_file(state: &AppState, project: &str, path: PathBuf) -> ApiResult<MergeSummary> {
    measured_catalog(state, project, "cmd.merge_file", move |api, perf| {
        let summary = api.merge_file(&path)?;
        perf.record_rows(summary.total_inserted());
        Ok(summary)
    })
    .await
}

pub async fn import_file(state: &AppState, project: &str, path: PathBuf) -> ApiResult<MergeSummary> {
    measured_catalog(state, project, "cmd.import_file", move |api, perf| {
        let summary = api.import_file(&path)?;
        perf.record_rows(summary.total_inserted());
        Ok(summary)
    })
    .await
}

// ==========================================
// 查询 / 导出
// ==========================================

pub async fn list_phases(
    state: &AppState,
    project: &str,
    filter: PhaseFilter,
    limit: Option<usize>,
) -> ApiResult<Vec<PhaseRecord>> {
    measured_catalog(state, project, "cmd.list_phases", move |api, perf| {
        let phases = api.list_phases(&filter, limit)?;
        perf.record_rows(phases.len());
        Ok(phases)
    })
    .await
}

pub async fn export_master_xlsx(state: &AppState, project: &str) -> ApiResult<Vec<u8>> {
    export(state, project, "cmd.export_master_xlsx", |api| {
        api.export_master_xlsx()
    })
    .await
}

pub async fn export_master_csv(state: &AppState, project: &str, sheet: &str) -> ApiResult<Vec<u8>> {
    let sheet = sheet.to_string();
    export(state, project, "cmd.export_master_csv", move |api| {
        api.export_master_csv(&sheet)
    })
    .await
}

pub async fn export_procedures_csv(
    state: &AppState,
    project: &str,
    filter: PhaseFilter,
    steps_root: &str,
) -> ApiResult<Vec<u8>> {
    let steps_root = steps_root.to_string();
    export(state, project, "cmd.export_procedures_csv", move |api| {
        api.export_procedures_csv(&filter, &steps_root)
    })
    .await
}

pub async fn export_parameters_csv(
    state: &AppState,
    project: &str,
    filter: PhaseFilter,
) -> ApiResult<Vec<u8>> {
    export(state, project, "cmd.export_parameters_csv", move |api| {
        api.export_parameters_csv(&filter)
    })
    .await
}

pub async fn export_interlocks_csv(
    state: &AppState,
    project: &str,
    filter: PhaseFilter,
) -> ApiResult<Vec<u8>> {
    export(state, project, "cmd.export_interlocks_csv", move |api| {
        api.export_interlocks_csv(&filter)
    })
    .await
}

pub async fn export_transitions_csv(
    state: &AppState,
    project: &str,
    filter: PhaseFilter,
) -> ApiResult<Vec<u8>> {
    export(state, project, "cmd.export_transitions_csv", move |api| {
        api.export_transitions_csv(&filter)
    })
    .await
}

pub async fn export_steps_zip(
    state: &AppState,
    project: &str,
    filter: PhaseFilter,
) -> ApiResult<Vec<u8>> {
    export(state, project, "cmd.export_steps_zip", move |api| {
        api.export_steps_zip(&filter)
    })
    .await
}

pub async fn export_steps_xml(state: &AppState, project: &str, phase_id: i64) -> ApiResult<Vec<u8>> {
    export(state, project, "cmd.export_steps_xml", move |api| {
        api.export_steps_xml(phase_id)
    })
    .await
}
