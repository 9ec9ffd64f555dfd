// ==========================================
// 绩效评分引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供幂等建表 (init_schema)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 幂等建表
///
/// 表:
/// - config_kv: 运行参数
/// - employee / objective_template / template_goal
/// - employee_sector_participation / employee_objective_override
/// - evaluation: 目标结果/意见/时间线/评分快照以 JSON 列存储
/// - bono_config / bono_anual
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS employee (
            employee_id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            area_id TEXT NOT NULL,
            sector_id TEXT NOT NULL,
            base_salary REAL NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS objective_template (
            template_id TEXT PRIMARY KEY,
            year INTEGER NOT NULL,
            scope_type TEXT NOT NULL CHECK (scope_type IN ('area', 'sector')),
            scope_id TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('objective', 'aptitude')),
            process TEXT,
            name TEXT NOT NULL,
            description TEXT,
            kpi TEXT,
            target TEXT,
            tracking TEXT NOT NULL,
            base_weight REAL NOT NULL DEFAULT 0 CHECK (base_weight >= 0),
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_objective_template_year
            ON objective_template(year, active);

        CREATE TABLE IF NOT EXISTS template_goal (
            goal_id TEXT PRIMARY KEY,
            template_id TEXT NOT NULL REFERENCES objective_template(template_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            expected REAL NOT NULL,
            operator TEXT NOT NULL,
            weight REAL NOT NULL DEFAULT 0,
            accumulation TEXT NOT NULL DEFAULT 'period',
            allow_exceed INTEGER NOT NULL DEFAULT 0,
            seq_no INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_template_goal_template
            ON template_goal(template_id, seq_no);

        CREATE TABLE IF NOT EXISTS employee_sector_participation (
            employee_id TEXT NOT NULL REFERENCES employee(employee_id) ON DELETE CASCADE,
            sector_id TEXT NOT NULL,
            year INTEGER NOT NULL,
            participation_pct REAL NOT NULL CHECK (participation_pct >= 0 AND participation_pct <= 100),
            PRIMARY KEY (employee_id, sector_id, year)
        );

        CREATE TABLE IF NOT EXISTS employee_objective_override (
            employee_id TEXT NOT NULL REFERENCES employee(employee_id) ON DELETE CASCADE,
            template_id TEXT NOT NULL REFERENCES objective_template(template_id) ON DELETE CASCADE,
            year INTEGER NOT NULL,
            excluded INTEGER NOT NULL DEFAULT 0,
            weight_override REAL,
            note TEXT,
            PRIMARY KEY (employee_id, template_id, year)
        );

        CREATE TABLE IF NOT EXISTS evaluation (
            evaluation_id TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL REFERENCES employee(employee_id),
            template_id TEXT NOT NULL REFERENCES objective_template(template_id),
            year INTEGER NOT NULL,
            period_key TEXT NOT NULL,
            state TEXT NOT NULL,
            goal_results_json TEXT NOT NULL DEFAULT '{}',
            comments_json TEXT NOT NULL DEFAULT '{}',
            timeline_json TEXT NOT NULL DEFAULT '[]',
            score_json TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (employee_id, template_id, period_key)
        );

        CREATE INDEX IF NOT EXISTS idx_evaluation_year
            ON evaluation(year, employee_id);

        CREATE TABLE IF NOT EXISTS bono_config (
            year INTEGER PRIMARY KEY,
            config_json TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS bono_anual (
            employee_id TEXT NOT NULL REFERENCES employee(employee_id),
            year INTEGER NOT NULL,
            bono_base REAL NOT NULL,
            bono_final REAL NOT NULL,
            score REAL NOT NULL,
            payout_pct REAL NOT NULL,
            calculated_at TEXT NOT NULL,
            PRIMARY KEY (employee_id, year)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
