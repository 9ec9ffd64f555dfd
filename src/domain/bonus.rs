// ==========================================
// 绩效评分引擎 - 年度奖金领域模型
// ==========================================
// BonoConfig: 年度奖金配置（根配置 + 覆写列表）
// BonoAnual: 年度奖金计算结果，按 (employee_id, year) 覆盖写入
// ==========================================

use crate::domain::types::{OverrideScope, ScaleType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// PayoutScale - 发放曲线
// ==========================================
// min_pct / max_pct 为百分比 (0..=100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutScale {
    #[serde(rename = "type")]
    pub scale_type: ScaleType,
    pub min_pct: f64,
    pub max_pct: f64,
    pub score_threshold: f64,
}

/// 覆写项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonoOverride {
    #[serde(rename = "type")]
    pub scope: OverrideScope,
    pub target_id: String,
    /// 未设置时沿用根配置
    pub target_ratio: Option<f64>,
    pub scale: Option<PayoutScale>,
}

// ==========================================
// BonoConfig - 年度奖金配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonoConfig {
    pub year: i32,
    /// 目标奖金 / 基本薪资
    pub target_ratio: f64,
    pub scale: PayoutScale,
    #[serde(default)]
    pub overrides: Vec<BonoOverride>,
}

/// 员工生效配置来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Root,
    Area,
    Employee,
}

/// 员工生效配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveBonoConfig {
    pub target_ratio: f64,
    pub scale: PayoutScale,
    pub source: ConfigSource,
}

// ==========================================
// BonoAnual - 年度奖金结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonoAnual {
    pub employee_id: String,
    pub year: i32,
    pub bono_base: f64,
    pub bono_final: f64,
    pub score: f64,
    /// 发放百分比 (0..=100)
    pub payout_pct: f64,
    pub calculated_at: NaiveDateTime,
}
