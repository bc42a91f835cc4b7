// ==========================================
// 工艺主数据目录 - 领域模型层
// ==========================================
// 职责: 定义目录实体、类型、工作簿抽象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod master_layout;
pub mod sheet;
pub mod types;

// 重导出核心类型
pub use catalog::{
    is_blank, non_blank, Area, Interlock, LocalizedText, NewInterlock, NewParameter, NewPhase,
    NewStep, NewTransitionCondition, NewTransitionRowDescription, Parameter, Phase, PhaseRecord,
    Step, TransitionCondition, TransitionRowDescription, Unit,
};
pub use sheet::{CellValue, Sheet, SheetRow, Workbook};
pub use types::{
    derive_parameter_name, ConditionLogic, DataType, Locale, ParamClass, INTERLOCK_BITS,
    STEP_SLOTS, TRANSITION_GRID,
};
