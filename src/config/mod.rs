// ==========================================
// 绩效评分引擎 - 配置层
// ==========================================
// 职责: 运行参数管理（流程策略、金额精度）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ConfigResult};
pub use engine_config_trait::EngineConfigReader;
