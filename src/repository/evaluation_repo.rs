// ==========================================
// 绩效评分引擎 - 评估单数据仓储
// ==========================================
// 自然键: (employee_id, template_id, period_key) UNIQUE
// JSON 列: goal_results_json / comments_json / timeline_json / score_json
// ==========================================

use crate::domain::evaluation::Evaluation;
use crate::domain::period::FiscalPeriodKey;
use crate::domain::types::EvaluationState;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{format_ts, parse_enum, parse_json, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const EVALUATION_COLUMNS: &str = r#"
    evaluation_id, employee_id, template_id, year, period_key, state,
    goal_results_json, comments_json, timeline_json, score_json,
    created_at, updated_at
"#;

fn map_evaluation(row: &Row) -> SqliteResult<Evaluation> {
    let score_raw: Option<String> = row.get(9)?;
    let score = match score_raw {
        Some(raw) => Some(parse_json(9, &raw)?),
        None => None,
    };

    Ok(Evaluation {
        evaluation_id: row.get(0)?,
        employee_id: row.get(1)?,
        template_id: row.get(2)?,
        year: row.get(3)?,
        period_key: row.get(4)?,
        state: parse_enum(5, &row.get::<_, String>(5)?, EvaluationState::parse)?,
        goal_results: parse_json(6, &row.get::<_, String>(6)?)?,
        comments: parse_json(7, &row.get::<_, String>(7)?)?,
        timeline: parse_json(8, &row.get::<_, String>(8)?)?,
        score,
        created_at: parse_ts(10, &row.get::<_, String>(10)?)?,
        updated_at: parse_ts(11, &row.get::<_, String>(11)?)?,
    })
}

// ==========================================
// EvaluationRepository - 评估单仓储
// ==========================================
pub struct EvaluationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EvaluationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 取得或创建主管草稿
    ///
    /// # 返回
    /// (评估单, 是否新建)。同一自然键重复调用返回同一条记录。
    pub fn ensure_draft(
        &self,
        employee_id: &str,
        template_id: &str,
        period: &FiscalPeriodKey,
    ) -> RepositoryResult<(Evaluation, bool)> {
        let draft = Evaluation::new_draft(employee_id, template_id, period);
        let conn = self.get_conn()?;

        let inserted = conn.execute(
            r#"
            INSERT INTO evaluation (
                evaluation_id, employee_id, template_id, year, period_key, state,
                goal_results_json, comments_json, timeline_json, score_json,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, '{}', '{}', '[]', NULL, ?7, ?8)
            ON CONFLICT(employee_id, template_id, period_key) DO NOTHING
            "#,
            params![
                draft.evaluation_id,
                draft.employee_id,
                draft.template_id,
                draft.year,
                draft.period_key,
                draft.state.to_db_str(),
                format_ts(&draft.created_at),
                format_ts(&draft.updated_at),
            ],
        )?;

        let sql = format!(
            "SELECT {} FROM evaluation WHERE employee_id = ?1 AND template_id = ?2 AND period_key = ?3",
            EVALUATION_COLUMNS
        );
        let evaluation = conn.query_row(
            &sql,
            params![employee_id, template_id, draft.period_key],
            map_evaluation,
        )?;

        Ok((evaluation, inserted == 1))
    }

    pub fn find_by_id(&self, evaluation_id: &str) -> RepositoryResult<Option<Evaluation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM evaluation WHERE evaluation_id = ?1",
            EVALUATION_COLUMNS
        );
        let evaluation = conn
            .query_row(&sql, params![evaluation_id], map_evaluation)
            .optional()?;
        Ok(evaluation)
    }

    /// 按 (employee, template) 查询模板年度内全部期间的评估单
    ///
    /// 年度与模板不一致的记录不返回。
    pub fn list_by_employee_template(
        &self,
        employee_id: &str,
        template_id: &str,
    ) -> RepositoryResult<Vec<Evaluation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM evaluation
            WHERE employee_id = ?1
              AND template_id = ?2
              AND year = (SELECT t.year FROM objective_template t WHERE t.template_id = ?2)
            ORDER BY period_key
            "#,
            EVALUATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![employee_id, template_id], map_evaluation)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询年度内有评估单的员工ID（去重）
    pub fn list_employee_ids_by_year(&self, year: i32) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT e.employee_id
            FROM evaluation e
            JOIN objective_template t ON t.template_id = e.template_id
            WHERE e.year = ?1 AND t.year = e.year
            ORDER BY e.employee_id
            "#,
        )?;
        let ids = stmt
            .query_map(params![year], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(ids)
    }

    /// 回写评估单可变字段（状态/结果/意见/时间线/评分）
    ///
    /// 最后写入者生效，不做版本校验。
    pub fn update(&self, evaluation: &Evaluation) -> RepositoryResult<()> {
        let goal_results_json = serde_json::to_string(&evaluation.goal_results)?;
        let comments_json = serde_json::to_string(&evaluation.comments)?;
        let timeline_json = serde_json::to_string(&evaluation.timeline)?;
        let score_json = match &evaluation.score {
            Some(score) => Some(serde_json::to_string(score)?),
            None => None,
        };

        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE evaluation SET
                state = ?2,
                goal_results_json = ?3,
                comments_json = ?4,
                timeline_json = ?5,
                score_json = ?6,
                updated_at = ?7
            WHERE evaluation_id = ?1
            "#,
            params![
                evaluation.evaluation_id,
                evaluation.state.to_db_str(),
                goal_results_json,
                comments_json,
                timeline_json,
                score_json,
                format_ts(&evaluation.updated_at),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Evaluation".to_string(),
                id: evaluation.evaluation_id.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::evaluation::{push_timeline, NewTimelineEntry};
    use crate::domain::types::TimelineAction;

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO employee (employee_id, full_name, area_id, sector_id, base_salary)
                VALUES ('E001', 'Ana', 'A1', 'S1', 1000);
            INSERT INTO objective_template (template_id, year, scope_type, scope_id, kind, name, tracking, base_weight)
                VALUES ('T001', 2025, 'area', 'A1', 'objective', 'Ventas', 'quarterly', 50);
            "#,
        )
        .unwrap();
        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn test_ensure_draft_is_idempotent() {
        let repo = EvaluationRepository::new(setup());
        let key = FiscalPeriodKey::parse("2025Q1").unwrap();

        let (first, created) = repo.ensure_draft("E001", "T001", &key).unwrap();
        assert!(created);
        assert_eq!(first.state, EvaluationState::ManagerDraft);

        let (second, created_again) = repo.ensure_draft("E001", "T001", &key).unwrap();
        assert!(!created_again);
        assert_eq!(second.evaluation_id, first.evaluation_id);
    }

    #[test]
    fn test_update_round_trips_json_columns() {
        let repo = EvaluationRepository::new(setup());
        let key = FiscalPeriodKey::parse("2025Q1").unwrap();
        let (mut eval, _) = repo.ensure_draft("E001", "T001", &key).unwrap();

        eval.goal_results.insert("G1".to_string(), 42.5);
        eval.comments.manager = Some("buen trimestre".to_string());
        eval.state = EvaluationState::PendingEmployee;
        push_timeline(&mut eval, NewTimelineEntry::new(TimelineAction::Sent, "U-MGR"));
        repo.update(&eval).unwrap();

        let loaded = repo.find_by_id(&eval.evaluation_id).unwrap().unwrap();
        assert_eq!(loaded.state, EvaluationState::PendingEmployee);
        assert_eq!(loaded.goal_results.get("G1"), Some(&42.5));
        assert_eq!(loaded.comments.manager.as_deref(), Some("buen trimestre"));
        assert_eq!(loaded.timeline.len(), 1);
        assert_eq!(loaded.timeline[0].action, TimelineAction::Sent);
    }

    #[test]
    fn test_update_unknown_evaluation_not_found() {
        let repo = EvaluationRepository::new(setup());
        let key = FiscalPeriodKey::parse("2025Q1").unwrap();
        let mut eval = Evaluation::new_draft("E001", "T001", &key);
        eval.evaluation_id = "missing".to_string();

        let result = repo.update(&eval);
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[test]
    fn test_list_employee_ids_by_year() {
        let repo = EvaluationRepository::new(setup());
        let q1 = FiscalPeriodKey::parse("2025Q1").unwrap();
        let q2 = FiscalPeriodKey::parse("2025Q2").unwrap();
        repo.ensure_draft("E001", "T001", &q1).unwrap();
        repo.ensure_draft("E001", "T001", &q2).unwrap();

        assert_eq!(repo.list_employee_ids_by_year(2025).unwrap(), vec!["E001".to_string()]);
        assert!(repo.list_employee_ids_by_year(2024).unwrap().is_empty());
        assert_eq!(repo.list_by_employee_template("E001", "T001").unwrap().len(), 2);
    }

    #[test]
    fn test_mismatched_year_rows_are_ignored() {
        let repo = EvaluationRepository::new(setup());
        let q1 = FiscalPeriodKey::parse("2025Q1").unwrap();
        let stale = FiscalPeriodKey::parse("2024FINAL").unwrap();
        repo.ensure_draft("E001", "T001", &q1).unwrap();
        repo.ensure_draft("E001", "T001", &stale).unwrap();

        let rows = repo.list_by_employee_template("E001", "T001").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].period_key, "2025Q1");
        assert!(repo.list_employee_ids_by_year(2024).unwrap().is_empty());
    }
}
