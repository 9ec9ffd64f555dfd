// ==========================================
// 绩效评分引擎 - 部门参与 / 目标覆写仓储
// ==========================================
// 表: employee_sector_participation  唯一键 (employee, sector, year)
//     employee_objective_override    唯一键 (employee, template, year)
// ==========================================

use crate::domain::employee::{EmployeeObjectiveOverride, EmployeeSectorParticipation};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// ParticipationRepository - 部门参与仓储
// ==========================================
pub struct ParticipationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ParticipationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn upsert(&self, p: &EmployeeSectorParticipation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO employee_sector_participation (employee_id, sector_id, year, participation_pct)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(employee_id, sector_id, year) DO UPDATE SET
                participation_pct = excluded.participation_pct
            "#,
            params![p.employee_id, p.sector_id, p.year, p.participation_pct],
        )?;
        Ok(())
    }

    pub fn list_by_employee_year(
        &self,
        employee_id: &str,
        year: i32,
    ) -> RepositoryResult<Vec<EmployeeSectorParticipation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, sector_id, year, participation_pct
            FROM employee_sector_participation
            WHERE employee_id = ?1 AND year = ?2
            ORDER BY sector_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![employee_id, year], |row| {
                Ok(EmployeeSectorParticipation {
                    employee_id: row.get(0)?,
                    sector_id: row.get(1)?,
                    year: row.get(2)?,
                    participation_pct: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

// ==========================================
// OverrideRepository - 目标覆写仓储
// ==========================================
pub struct OverrideRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OverrideRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn upsert(&self, o: &EmployeeObjectiveOverride) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO employee_objective_override (
                employee_id, template_id, year, excluded, weight_override, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(employee_id, template_id, year) DO UPDATE SET
                excluded = excluded.excluded,
                weight_override = excluded.weight_override,
                note = excluded.note
            "#,
            params![
                o.employee_id,
                o.template_id,
                o.year,
                o.excluded as i32,
                o.weight_override,
                o.note,
            ],
        )?;
        Ok(())
    }

    pub fn list_by_employee_year(
        &self,
        employee_id: &str,
        year: i32,
    ) -> RepositoryResult<Vec<EmployeeObjectiveOverride>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, template_id, year, excluded, weight_override, note
            FROM employee_objective_override
            WHERE employee_id = ?1 AND year = ?2
            ORDER BY template_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![employee_id, year], |row| {
                Ok(EmployeeObjectiveOverride {
                    employee_id: row.get(0)?,
                    template_id: row.get(1)?,
                    year: row.get(2)?,
                    excluded: row.get::<_, i32>(3)? != 0,
                    weight_override: row.get(4)?,
                    note: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
