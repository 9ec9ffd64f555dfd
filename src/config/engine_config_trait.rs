// ==========================================
// 绩效评分引擎 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义 API 层所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::config_manager::ConfigResult;
use crate::engine::workflow::WorkflowPolicy;
use async_trait::async_trait;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    /// 获取评估流程策略
    ///
    /// # 默认值
    /// - ack_forwards_to_hr = false（员工确认不改变状态）
    async fn workflow_policy(&self) -> ConfigResult<WorkflowPolicy>;

    /// 获取奖金金额小数位
    ///
    /// # 默认值
    /// - 2
    async fn bonus_amount_decimals(&self) -> ConfigResult<u32>;
}
