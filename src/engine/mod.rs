// ==========================================
// 工艺主数据目录 - 引擎层
// ==========================================
// 职责: 合并规则、键解析、逻辑后缀、翻译、详情保存
// 红线: Engine 不拼 SQL，数据访问全部经由 Repository
// ==========================================

pub mod error;
pub mod key_resolver;
pub mod logic_suffix;
pub mod merge;
pub mod phase_detail;
pub mod translation;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use key_resolver::KeyResolver;
pub use logic_suffix::parse_logic;
pub use merge::{MergeEngine, MergeSummary, DEFAULT_PHASE_TYPE};
pub use phase_detail::{
    DetailSaveSummary, InterlockInput, NewParameterRow, ParameterEdit, ParameterFormContext,
    PhaseDetailService, StepSlotInput, TransitionCellInput, TransitionGridInput,
};
pub use translation::{
    build_translator, fill_missing_targets, translated_from_source, HttpTranslator,
    PassThroughTranslator, TranslationError, TranslationResult, Translator,
};
