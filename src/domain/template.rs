// ==========================================
// 绩效评分引擎 - 目标/能力模板
// ==========================================
// ObjectiveTemplate: 年度模板（持久化）
// AssignmentRow: 每次请求实时计算，不落库
// ==========================================

use crate::domain::employee::EmployeeSummary;
use crate::domain::types::{ScopeType, TemplateKind, TrackingMethod};
use serde::{Deserialize, Serialize};

// ==========================================
// ObjectiveTemplate - 模板
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveTemplate {
    pub template_id: String,
    pub year: i32,
    pub scope_type: ScopeType,
    pub scope_id: String,          // 区域ID 或 部门ID
    pub kind: TemplateKind,
    pub process: Option<String>,   // 流程标签
    pub name: String,
    pub description: Option<String>,
    pub kpi: Option<String>,
    pub target: Option<String>,
    pub tracking: TrackingMethod,
    pub base_weight: f64,          // >= 0
    pub active: bool,
}

// ==========================================
// AssignmentRow - 分配行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRow {
    pub template_id: String,
    pub kind: TemplateKind,
    pub name: String,
    pub scope_type: ScopeType,
    pub scope_id: String,
    pub tracking: TrackingMethod,
    /// 模板原始权重
    pub base_weight: f64,
    /// 使用的参与比例（仅部门模板）
    pub participation_pct: Option<f64>,
    /// 参与比例缩放后的权重
    pub scaled_weight: f64,
    pub effective_weight: f64,
    pub overridden: bool,
    pub excluded: bool,
}

// ==========================================
// AssignmentResult - 分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResult {
    pub employee: EmployeeSummary,
    pub year: i32,
    /// 是否使用了默认主部门参与
    pub synthetic_participation: bool,
    pub items: Vec<AssignmentRow>,
    pub total: f64,
}
