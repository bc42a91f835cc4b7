// ==========================================
// 工艺主数据目录 - 条件逻辑后缀解析
// ==========================================
// 单元格文本末尾的 " AND" / " OR" 表示与下一行的组合方式
// ==========================================

use crate::domain::types::ConditionLogic;

/// 拆分条件单元格: (去掉后缀的文本, 逻辑)
///
/// 空白或缺失 → `(None, N/A)`
pub fn parse_logic(cell: Option<&str>) -> (Option<String>, ConditionLogic) {
    let text = match cell.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return (None, ConditionLogic::NotApplicable),
    };

    let (body, logic) = if let Some(body) = text.strip_suffix(" AND") {
        (body, ConditionLogic::And)
    } else if let Some(body) = text.strip_suffix(" OR") {
        (body, ConditionLogic::Or)
    } else {
        (text, ConditionLogic::NotApplicable)
    };

    let body = body.trim();
    if body.is_empty() {
        (None, logic)
    } else {
        (Some(body.to_string()), logic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cells() {
        assert_eq!(parse_logic(None), (None, ConditionLogic::NotApplicable));
        assert_eq!(parse_logic(Some("")), (None, ConditionLogic::NotApplicable));
        assert_eq!(parse_logic(Some("   ")), (None, ConditionLogic::NotApplicable));
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(
            parse_logic(Some(" X=1 AND ")),
            (Some("X=1".to_string()), ConditionLogic::And)
        );
        assert_eq!(
            parse_logic(Some("Y>2 OR")),
            (Some("Y>2".to_string()), ConditionLogic::Or)
        );
        assert_eq!(
            parse_logic(Some("BAND")),
            (Some("BAND".to_string()), ConditionLogic::NotApplicable)
        );
    }

    #[test]
    fn test_round_trip() {
        for logic in [ConditionLogic::And, ConditionLogic::Or] {
            let cell = format!("Nivel alto {}", logic);
            assert_eq!(
                parse_logic(Some(&cell)),
                (Some("Nivel alto".to_string()), logic)
            );
        }
    }
}
