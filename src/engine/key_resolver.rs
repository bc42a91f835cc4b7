// ==========================================
// 工艺主数据目录 - 自然键解析器
// ==========================================
// 职责: 自然键 → 行 id 的内存索引 + 已存在键集合
// 红线: 只读，不写数据库；新插入的键由调用方登记
// ==========================================

use crate::domain::types::ParamClass;
use crate::engine::error::EngineResult;
use crate::repository::{
    AreaRepository, InterlockRepository, ParameterRepository, PhaseFilter, PhaseRepository,
    StepRepository, TransitionRepository, UnitRepository,
};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};

type UnitKey = (String, String);
type PhaseKey = (String, String, String);

#[derive(Debug, Default)]
pub struct KeyResolver {
    areas: HashMap<String, i64>,
    units: HashMap<UnitKey, i64>,
    /// 单元名全局唯一
    unit_names: HashSet<String>,
    phases: HashMap<PhaseKey, i64>,
    phase_names: HashSet<(i64, String)>,
    parameters: HashSet<(i64, ParamClass, i64)>,
    steps: HashSet<(i64, i64)>,
    interlocks: HashSet<(i64, i64)>,
    row_descriptions: HashSet<(i64, i64)>,
    conditions: HashSet<(i64, i64, i64)>,
}

impl KeyResolver {
    /// 从当前事务快照构建
    pub fn load(conn: &Connection) -> EngineResult<Self> {
        let mut resolver = Self::default();

        for area in AreaRepository::new(conn).list_all()? {
            resolver.areas.insert(area.name, area.area_id);
        }
        for record in UnitRepository::new(conn).list_records(None)? {
            resolver.unit_names.insert(record.unit.name.clone());
            resolver
                .units
                .insert((record.area_name, record.unit.name), record.unit.unit_id);
        }
        for record in PhaseRepository::new(conn).list_records(&PhaseFilter::all(), None)? {
            resolver
                .phase_names
                .insert((record.phase.unit_id, record.phase.name.clone()));
            resolver.phases.insert(
                (record.area_name, record.unit_name, record.phase.name),
                record.phase.phase_id,
            );
        }

        resolver.parameters = ParameterRepository::new(conn)
            .list_keys()?
            .into_iter()
            .filter_map(|(phase_id, class, number)| {
                ParamClass::parse(&class).map(|c| (phase_id, c, number))
            })
            .collect();
        resolver.steps = StepRepository::new(conn).list_keys()?.into_iter().collect();
        resolver.interlocks = InterlockRepository::new(conn)
            .list_keys()?
            .into_iter()
            .collect();

        let transitions = TransitionRepository::new(conn);
        resolver.row_descriptions = transitions.list_row_description_keys()?.into_iter().collect();
        resolver.conditions = transitions.list_condition_keys()?.into_iter().collect();

        Ok(resolver)
    }

    // ===== Area =====

    pub fn area_id(&self, area: &str) -> Option<i64> {
        self.areas.get(area).copied()
    }

    pub fn register_area(&mut self, area: &str, area_id: i64) {
        self.areas.insert(area.to_string(), area_id);
    }

    // ===== Unit =====

    pub fn unit_id(&self, area: &str, unit: &str) -> Option<i64> {
        self.units
            .get(&(area.to_string(), unit.to_string()))
            .copied()
    }

    pub fn has_unit_name(&self, unit: &str) -> bool {
        self.unit_names.contains(unit)
    }

    pub fn register_unit(&mut self, area: &str, unit: &str, unit_id: i64) {
        self.unit_names.insert(unit.to_string());
        self.units
            .insert((area.to_string(), unit.to_string()), unit_id);
    }

    // ===== Phase =====

    pub fn phase_id(&self, area: &str, unit: &str, phase: &str) -> Option<i64> {
        self.phases
            .get(&(area.to_string(), unit.to_string(), phase.to_string()))
            .copied()
    }

    pub fn has_phase(&self, unit_id: i64, phase: &str) -> bool {
        self.phase_names.contains(&(unit_id, phase.to_string()))
    }

    pub fn register_phase(
        &mut self,
        area: &str,
        unit: &str,
        phase: &str,
        unit_id: i64,
        phase_id: i64,
    ) {
        self.phase_names.insert((unit_id, phase.to_string()));
        self.phases.insert(
            (area.to_string(), unit.to_string(), phase.to_string()),
            phase_id,
        );
    }

    // ===== Phase 子记录 =====
    // register_* 返回 true 表示键此前不存在

    pub fn has_parameter(&self, phase_id: i64, class: ParamClass, number: i64) -> bool {
        self.parameters.contains(&(phase_id, class, number))
    }

    pub fn register_parameter(&mut self, phase_id: i64, class: ParamClass, number: i64) -> bool {
        self.parameters.insert((phase_id, class, number))
    }

    pub fn has_step(&self, phase_id: i64, index: i64) -> bool {
        self.steps.contains(&(phase_id, index))
    }

    pub fn register_step(&mut self, phase_id: i64, index: i64) -> bool {
        self.steps.insert((phase_id, index))
    }

    pub fn has_interlock(&self, phase_id: i64, bit: i64) -> bool {
        self.interlocks.contains(&(phase_id, bit))
    }

    pub fn register_interlock(&mut self, phase_id: i64, bit: i64) -> bool {
        self.interlocks.insert((phase_id, bit))
    }

    pub fn has_row_description(&self, phase_id: i64, row: i64) -> bool {
        self.row_descriptions.contains(&(phase_id, row))
    }

    pub fn register_row_description(&mut self, phase_id: i64, row: i64) -> bool {
        self.row_descriptions.insert((phase_id, row))
    }

    pub fn has_condition(&self, phase_id: i64, step_index: i64, row: i64) -> bool {
        self.conditions.contains(&(phase_id, step_index, row))
    }

    pub fn register_condition(&mut self, phase_id: i64, step_index: i64, row: i64) -> bool {
        self.conditions.insert((phase_id, step_index, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_catalog;
    use crate::domain::catalog::{LocalizedText, NewPhase};

    #[test]
    fn test_load_indexes_existing_catalog() {
        let conn = open_in_memory_catalog().unwrap();
        let area_id = AreaRepository::new(&conn).insert("Utilities", None).unwrap();
        let unit_id = UnitRepository::new(&conn)
            .insert(area_id, "Boiler1", None)
            .unwrap();
        let phase_id = PhaseRepository::new(&conn)
            .insert(&NewPhase {
                unit_id,
                name: "PH01".to_string(),
                phase_type: "PH".to_string(),
                description: LocalizedText::default(),
            })
            .unwrap();

        let resolver = KeyResolver::load(&conn).unwrap();
        assert_eq!(resolver.area_id("Utilities"), Some(area_id));
        assert_eq!(resolver.unit_id("Utilities", "Boiler1"), Some(unit_id));
        assert!(resolver.has_unit_name("Boiler1"));
        assert_eq!(resolver.phase_id("Utilities", "Boiler1", "PH01"), Some(phase_id));
        assert!(resolver.has_phase(unit_id, "PH01"));
        assert_eq!(resolver.unit_id("Other", "Boiler1"), None);
    }

    #[test]
    fn test_register_reports_new_keys() {
        let mut resolver = KeyResolver::default();
        assert!(resolver.register_condition(1, 3, 5));
        assert!(!resolver.register_condition(1, 3, 5));
        assert!(resolver.has_condition(1, 3, 5));

        resolver.register_unit("A", "U", 7);
        assert!(resolver.has_unit_name("U"));
        assert_eq!(resolver.unit_id("A", "U"), Some(7));
    }
}
