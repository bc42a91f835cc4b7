// ==========================================
// 工艺主数据目录 - Parameter 仓储
// ==========================================
// 红线: name 不接受外部输入，每次写入均由 class + number 重新派生
// ==========================================

use crate::domain::catalog::{NewParameter, Parameter};
use crate::domain::types::{derive_parameter_name, DataType, ParamClass};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{invalid_column, localized_from_row};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

const PARAMETER_SELECT: &str = r#"
    SELECT param_id, phase_id, number, name, class, data_type,
           description_pt, description_en, description_es,
           default_value, min_value, max_value, eng_unit
    FROM parameters
"#;

// ==========================================
// ParameterRepository - 参数仓储
// ==========================================
pub struct ParameterRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ParameterRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 新增参数，返回 param_id
    pub fn insert(&self, param: &NewParameter) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO parameters (
                phase_id, number, name, class, data_type,
                description_pt, description_en, description_es,
                default_value, min_value, max_value, eng_unit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                param.phase_id,
                param.number,
                derive_parameter_name(param.class, param.number),
                param.class.as_str(),
                param.data_type.as_str(),
                param.description.pt,
                param.description.en,
                param.description.es,
                param.default_value,
                param.min_value,
                param.max_value,
                param.eng_unit,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, param_id: i64) -> RepositoryResult<Option<Parameter>> {
        let sql = format!("{} WHERE param_id = ?1", PARAMETER_SELECT);
        let param = self
            .conn
            .query_row(&sql, params![param_id], map_parameter)
            .optional()?;
        Ok(param)
    }

    /// Phase 下全部参数，按 类别 / 编号 排序（主数据导出与详情页）
    pub fn list_by_phase(&self, phase_id: i64) -> RepositoryResult<Vec<Parameter>> {
        self.query_by_phase(phase_id, "class ASC, number ASC")
    }

    /// Phase 下全部参数，按 编号 / 类别 排序（下游参数报表）
    pub fn list_by_phase_by_number(&self, phase_id: i64) -> RepositoryResult<Vec<Parameter>> {
        self.query_by_phase(phase_id, "number ASC, class ASC")
    }

    fn query_by_phase(&self, phase_id: i64, order_by: &str) -> RepositoryResult<Vec<Parameter>> {
        let sql = format!(
            "{} WHERE phase_id = ?1 ORDER BY {}",
            PARAMETER_SELECT, order_by
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let params = stmt
            .query_map(params![phase_id], map_parameter)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(params)
    }

    /// 更新参数（name 随 class / number 重新派生；仅限 param.phase_id 下的行）
    pub fn update(&self, param: &Parameter) -> RepositoryResult<()> {
        let affected = self.conn.execute(
            r#"
            UPDATE parameters
            SET number = ?1, name = ?2, class = ?3, data_type = ?4,
                description_pt = ?5, description_en = ?6, description_es = ?7,
                default_value = ?8, min_value = ?9, max_value = ?10, eng_unit = ?11
            WHERE param_id = ?12 AND phase_id = ?13
            "#,
            params![
                param.number,
                derive_parameter_name(param.class, param.number),
                param.class.as_str(),
                param.data_type.as_str(),
                param.description.pt,
                param.description.en,
                param.description.es,
                param.default_value,
                param.min_value,
                param.max_value,
                param.eng_unit,
                param.param_id,
                param.phase_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Parameter", param.param_id));
        }
        Ok(())
    }

    pub fn delete(&self, phase_id: i64, param_id: i64) -> RepositoryResult<bool> {
        let affected = self.conn.execute(
            "DELETE FROM parameters WHERE param_id = ?1 AND phase_id = ?2",
            params![param_id, phase_id],
        )?;
        Ok(affected > 0)
    }

    /// 全部 (phase_id, class, number) 自然键
    pub fn list_keys(&self) -> RepositoryResult<Vec<(i64, String, i64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT phase_id, class, number FROM parameters")?;
        let keys = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(keys)
    }
}

fn map_parameter(row: &rusqlite::Row<'_>) -> SqliteResult<Parameter> {
    let class_raw: String = row.get(4)?;
    let class = ParamClass::parse(&class_raw)
        .ok_or_else(|| invalid_column(4, format!("未知参数类别: {}", class_raw)))?;
    let data_type_raw: String = row.get(5)?;
    let data_type = DataType::parse(&data_type_raw)
        .ok_or_else(|| invalid_column(5, format!("未知数据类型: {}", data_type_raw)))?;

    Ok(Parameter {
        param_id: row.get(0)?,
        phase_id: row.get(1)?,
        number: row.get(2)?,
        name: row.get(3)?,
        class,
        data_type,
        description: localized_from_row(row, 6)?,
        default_value: row.get(9)?,
        min_value: row.get(10)?,
        max_value: row.get(11)?,
        eng_unit: row.get(12)?,
    })
}
