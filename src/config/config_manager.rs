// ==========================================
// 绩效评分引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、快照与恢复
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::db::open_sqlite_connection;
use crate::engine::bonus::DEFAULT_AMOUNT_DECIMALS;
use crate::engine::workflow::WorkflowPolicy;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 配置层错误（与 EngineConfigReader 共用）
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// 金额小数位上限
pub const MAX_AMOUNT_DECIMALS: u32 = 6;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 返回
    /// - Ok(String): 配置快照的JSON字符串（按键排序）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名 global 配置，快照中没有的键保持不变
    /// - `__meta_` 前缀的键不回写
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key.starts_with("__meta_") {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    // ===== 评估流程配置 =====

    /// 获取评估流程策略
    ///
    /// # 默认值
    /// - workflow_ack_forwards_to_hr = false
    pub fn get_workflow_policy(&self) -> ConfigResult<WorkflowPolicy> {
        let ack_forwards_to_hr = match self.get_config_value(config_keys::WORKFLOW_ACK_FORWARDS_TO_HR)? {
            None => false,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" | "" => false,
                _ => {
                    tracing::warn!(
                        config_key = config_keys::WORKFLOW_ACK_FORWARDS_TO_HR,
                        raw_value = %raw,
                        "流程策略配置格式错误，使用默认值 false"
                    );
                    false
                }
            },
        };

        Ok(WorkflowPolicy { ack_forwards_to_hr })
    }

    // ===== 奖金配置 =====

    /// 获取金额小数位
    ///
    /// # 默认值
    /// - 2（取值范围 0..=6，超出范围回退默认值）
    pub fn get_bonus_amount_decimals(&self) -> ConfigResult<u32> {
        let raw = match self.get_config_value(config_keys::BONUS_AMOUNT_DECIMALS)? {
            Some(v) => v,
            None => return Ok(DEFAULT_AMOUNT_DECIMALS),
        };

        match raw.trim().parse::<u32>() {
            Ok(v) if v <= MAX_AMOUNT_DECIMALS => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = config_keys::BONUS_AMOUNT_DECIMALS,
                    raw_value = %raw,
                    default = DEFAULT_AMOUNT_DECIMALS,
                    "金额小数位配置无效，使用默认值"
                );
                Ok(DEFAULT_AMOUNT_DECIMALS)
            }
        }
    }
}

// ==========================================
// EngineConfigReader Trait 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn workflow_policy(&self) -> ConfigResult<WorkflowPolicy> {
        self.get_workflow_policy()
    }

    async fn bonus_amount_decimals(&self) -> ConfigResult<u32> {
        self.get_bonus_amount_decimals()
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 评估流程: 员工确认后是否直接转交 HR
    pub const WORKFLOW_ACK_FORWARDS_TO_HR: &str = "workflow_ack_forwards_to_hr";

    // 奖金金额小数位
    pub const BONUS_AMOUNT_DECIMALS: &str = "bonus_amount_decimals";
}
