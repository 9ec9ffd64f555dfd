// ==========================================
// 绩效评分引擎 - 员工数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::employee::Employee;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::build_in_clause;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const EMPLOYEE_COLUMNS: &str = "employee_id, full_name, area_id, sector_id, base_salary, active";

fn map_employee(row: &Row) -> SqliteResult<Employee> {
    Ok(Employee {
        employee_id: row.get(0)?,
        full_name: row.get(1)?,
        area_id: row.get(2)?,
        sector_id: row.get(3)?,
        base_salary: row.get(4)?,
        active: row.get::<_, i32>(5)? != 0,
    })
}

// ==========================================
// EmployeeRepository - 员工仓储
// ==========================================
pub struct EmployeeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EmployeeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入或更新员工
    pub fn upsert(&self, employee: &Employee) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO employee (employee_id, full_name, area_id, sector_id, base_salary, active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(employee_id) DO UPDATE SET
                full_name = excluded.full_name,
                area_id = excluded.area_id,
                sector_id = excluded.sector_id,
                base_salary = excluded.base_salary,
                active = excluded.active
            "#,
            params![
                employee.employee_id,
                employee.full_name,
                employee.area_id,
                employee.sector_id,
                employee.base_salary,
                employee.active as i32,
            ],
        )?;
        Ok(())
    }

    /// 按ID查询员工
    pub fn find_by_id(&self, employee_id: &str) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM employee WHERE employee_id = ?1", EMPLOYEE_COLUMNS);
        let employee = conn
            .query_row(&sql, params![employee_id], map_employee)
            .optional()?;
        Ok(employee)
    }

    /// 批量查询员工（不存在的ID被忽略）
    pub fn find_by_ids(&self, employee_ids: &[String]) -> RepositoryResult<Vec<Employee>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM employee WHERE {} ORDER BY employee_id",
            EMPLOYEE_COLUMNS,
            build_in_clause("employee_id", employee_ids)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(employee_ids.iter()), map_employee)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
