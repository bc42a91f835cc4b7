// ==========================================
// 工艺主数据目录 - 应用层
// ==========================================
// 职责: 项目注册表、进程级状态、异步命令入口
// ==========================================

pub mod commands;
pub mod registry;
pub mod state;

// 重导出
pub use registry::{validate_project_name, ProjectRegistry, SharedConnection};
pub use state::AppState;
