// ==========================================
// 绩效评分引擎 - 年度奖金数据仓储
// ==========================================
// bono_config: 每年一条，配置整体以 JSON 存储
// bono_anual:  (employee_id, year) 覆盖写入，批量写入单事务
// ==========================================

use crate::domain::bonus::{BonoAnual, BonoConfig};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{format_ts, parse_json, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// BonoConfigRepository - 奖金配置仓储
// ==========================================
pub struct BonoConfigRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BonoConfigRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn upsert(&self, config: &BonoConfig) -> RepositoryResult<()> {
        let config_json = serde_json::to_string(config)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO bono_config (year, config_json, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(year) DO UPDATE SET
                config_json = excluded.config_json,
                updated_at = excluded.updated_at
            "#,
            params![config.year, config_json],
        )?;
        Ok(())
    }

    pub fn find_by_year(&self, year: i32) -> RepositoryResult<Option<BonoConfig>> {
        let conn = self.get_conn()?;
        let config = conn
            .query_row(
                "SELECT config_json FROM bono_config WHERE year = ?1",
                params![year],
                |row| parse_json::<BonoConfig>(0, &row.get::<_, String>(0)?),
            )
            .optional()?;
        Ok(config)
    }
}

// ==========================================
// BonoAnualRepository - 奖金结果仓储
// ==========================================
pub struct BonoAnualRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BonoAnualRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量覆盖写入（单事务，任一失败整体回滚）
    ///
    /// # 返回
    /// 写入条数
    pub fn batch_upsert(&self, results: &[BonoAnual]) -> RepositoryResult<usize> {
        if results.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO bono_anual (
                    employee_id, year, bono_base, bono_final, score, payout_pct, calculated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(employee_id, year) DO UPDATE SET
                    bono_base = excluded.bono_base,
                    bono_final = excluded.bono_final,
                    score = excluded.score,
                    payout_pct = excluded.payout_pct,
                    calculated_at = excluded.calculated_at
                "#,
            )?;

            for r in results {
                stmt.execute(params![
                    r.employee_id,
                    r.year,
                    r.bono_base,
                    r.bono_final,
                    r.score,
                    r.payout_pct,
                    format_ts(&r.calculated_at),
                ])?;
                count += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    pub fn list_by_year(&self, year: i32) -> RepositoryResult<Vec<BonoAnual>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, year, bono_base, bono_final, score, payout_pct, calculated_at
            FROM bono_anual
            WHERE year = ?1
            ORDER BY employee_id
            "#,
        )?;
        let rows = stmt
            .query_map(params![year], |row| {
                Ok(BonoAnual {
                    employee_id: row.get(0)?,
                    year: row.get(1)?,
                    bono_base: row.get(2)?,
                    bono_final: row.get(3)?,
                    score: row.get(4)?,
                    payout_pct: row.get(5)?,
                    calculated_at: parse_ts(6, &row.get::<_, String>(6)?)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
