// ==========================================
// 绩效评分引擎 - 模板与指标数据仓储
// ==========================================
// 表: objective_template, template_goal
// ==========================================

use crate::domain::goal::Goal;
use crate::domain::template::ObjectiveTemplate;
use crate::domain::types::{
    AccumulationMode, ComparisonOperator, ScopeType, TemplateKind, TrackingMethod,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::parse_enum;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const TEMPLATE_COLUMNS: &str = r#"
    template_id, year, scope_type, scope_id, kind, process, name,
    description, kpi, target, tracking, base_weight, active
"#;

fn map_template(row: &Row) -> SqliteResult<ObjectiveTemplate> {
    Ok(ObjectiveTemplate {
        template_id: row.get(0)?,
        year: row.get(1)?,
        scope_type: parse_enum(2, &row.get::<_, String>(2)?, ScopeType::parse)?,
        scope_id: row.get(3)?,
        kind: parse_enum(4, &row.get::<_, String>(4)?, TemplateKind::parse)?,
        process: row.get(5)?,
        name: row.get(6)?,
        description: row.get(7)?,
        kpi: row.get(8)?,
        target: row.get(9)?,
        tracking: parse_enum(10, &row.get::<_, String>(10)?, TrackingMethod::parse)?,
        base_weight: row.get(11)?,
        active: row.get::<_, i32>(12)? != 0,
    })
}

fn map_goal(row: &Row) -> SqliteResult<Goal> {
    Ok(Goal {
        goal_id: row.get(0)?,
        template_id: row.get(1)?,
        name: row.get(2)?,
        expected: row.get(3)?,
        operator: parse_enum(4, &row.get::<_, String>(4)?, ComparisonOperator::parse)?,
        weight: row.get(5)?,
        accumulation: parse_enum(6, &row.get::<_, String>(6)?, AccumulationMode::parse)?,
        allow_exceed: row.get::<_, i32>(7)? != 0,
    })
}

// ==========================================
// TemplateRepository - 模板仓储
// ==========================================
pub struct TemplateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TemplateRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入或更新模板
    pub fn upsert(&self, t: &ObjectiveTemplate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO objective_template (
                template_id, year, scope_type, scope_id, kind, process, name,
                description, kpi, target, tracking, base_weight, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(template_id) DO UPDATE SET
                year = excluded.year,
                scope_type = excluded.scope_type,
                scope_id = excluded.scope_id,
                kind = excluded.kind,
                process = excluded.process,
                name = excluded.name,
                description = excluded.description,
                kpi = excluded.kpi,
                target = excluded.target,
                tracking = excluded.tracking,
                base_weight = excluded.base_weight,
                active = excluded.active
            "#,
            params![
                t.template_id,
                t.year,
                t.scope_type.to_db_str(),
                t.scope_id,
                t.kind.to_db_str(),
                t.process,
                t.name,
                t.description,
                t.kpi,
                t.target,
                t.tracking.to_db_str(),
                t.base_weight,
                t.active as i32,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, template_id: &str) -> RepositoryResult<Option<ObjectiveTemplate>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM objective_template WHERE template_id = ?1",
            TEMPLATE_COLUMNS
        );
        let t = conn
            .query_row(&sql, params![template_id], map_template)
            .optional()?;
        Ok(t)
    }

    /// 查询年度启用模板（作用域过滤由引擎完成）
    pub fn list_active_by_year(&self, year: i32) -> RepositoryResult<Vec<ObjectiveTemplate>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM objective_template WHERE year = ?1 AND active = 1 ORDER BY template_id",
            TEMPLATE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![year], map_template)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    // ==========================================
    // 指标 (template_goal)
    // ==========================================

    /// 插入或更新指标
    pub fn upsert_goal(&self, goal: &Goal, seq_no: i32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO template_goal (
                goal_id, template_id, name, expected, operator,
                weight, accumulation, allow_exceed, seq_no
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(goal_id) DO UPDATE SET
                template_id = excluded.template_id,
                name = excluded.name,
                expected = excluded.expected,
                operator = excluded.operator,
                weight = excluded.weight,
                accumulation = excluded.accumulation,
                allow_exceed = excluded.allow_exceed,
                seq_no = excluded.seq_no
            "#,
            params![
                goal.goal_id,
                goal.template_id,
                goal.name,
                goal.expected,
                goal.operator.as_symbol(),
                goal.weight,
                goal.accumulation.to_db_str(),
                goal.allow_exceed as i32,
                seq_no,
            ],
        )?;
        Ok(())
    }

    /// 查询模板下的指标（按录入顺序）
    pub fn list_goals(&self, template_id: &str) -> RepositoryResult<Vec<Goal>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT goal_id, template_id, name, expected, operator,
                   weight, accumulation, allow_exceed
            FROM template_goal
            WHERE template_id = ?1
            ORDER BY seq_no, goal_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![template_id], map_goal)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
