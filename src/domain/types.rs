// ==========================================
// 绩效评分引擎 - 领域类型定义
// ==========================================
// 序列化格式与数据库存储字符串保持一致
// 解析失败统一返回 None，由调用方转换为 ValidationError
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 模板作用域 (Scope Type)
// ==========================================
// 区域模板: 权重不缩放
// 部门模板: 权重按参与比例缩放
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Area,   // 区域
    Sector, // 部门
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ScopeType {
    /// 从字符串解析作用域
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "area" => Some(ScopeType::Area),
            "sector" => Some(ScopeType::Sector),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScopeType::Area => "area",
            ScopeType::Sector => "sector",
        }
    }
}

// ==========================================
// 模板类别 (Template Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Objective, // 目标
    Aptitude,  // 能力
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TemplateKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "objective" => Some(TemplateKind::Objective),
            "aptitude" => Some(TemplateKind::Aptitude),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TemplateKind::Objective => "objective",
            TemplateKind::Aptitude => "aptitude",
        }
    }
}

// ==========================================
// 跟踪频率 (Tracking Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMethod {
    Quarterly,  // 季度
    Semiannual, // 半年
    Annual,     // 年度
}

impl fmt::Display for TrackingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TrackingMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "quarterly" => Some(TrackingMethod::Quarterly),
            "semiannual" => Some(TrackingMethod::Semiannual),
            "annual" => Some(TrackingMethod::Annual),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TrackingMethod::Quarterly => "quarterly",
            TrackingMethod::Semiannual => "semiannual",
            TrackingMethod::Annual => "annual",
        }
    }
}

// ==========================================
// 比较运算符 (Comparison Operator)
// ==========================================
// 零容差比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_symbol())
    }
}

impl ComparisonOperator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            ">=" => Some(ComparisonOperator::Gte),
            "<=" => Some(ComparisonOperator::Lte),
            "==" => Some(ComparisonOperator::Eq),
            ">" => Some(ComparisonOperator::Gt),
            "<" => Some(ComparisonOperator::Lt),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Gte => ">=",
            ComparisonOperator::Lte => "<=",
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Lt => "<",
        }
    }

    /// 比较实际值与期望值
    pub fn compare(&self, actual: f64, expected: f64) -> bool {
        match self {
            ComparisonOperator::Gte => actual >= expected,
            ComparisonOperator::Lte => actual <= expected,
            ComparisonOperator::Eq => actual == expected,
            ComparisonOperator::Gt => actual > expected,
            ComparisonOperator::Lt => actual < expected,
        }
    }

    /// 是否"越小越好"
    pub fn lower_is_better(&self) -> bool {
        matches!(self, ComparisonOperator::Lte | ComparisonOperator::Lt)
    }
}

// ==========================================
// 累计模式 (Accumulation Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccumulationMode {
    #[default]
    Period,     // 每期独立
    Cumulative, // 跨期累计
}

impl fmt::Display for AccumulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AccumulationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "period" => Some(AccumulationMode::Period),
            "cumulative" => Some(AccumulationMode::Cumulative),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AccumulationMode::Period => "period",
            AccumulationMode::Cumulative => "cumulative",
        }
    }
}

// ==========================================
// 评估单状态 (Evaluation State)
// ==========================================
// 顺序: MANAGER_DRAFT -> PENDING_EMPLOYEE -> PENDING_HR -> CLOSED
// 唯一回退: CLOSED -> PENDING_HR (reopen)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationState {
    ManagerDraft,    // 主管草稿
    PendingEmployee, // 待员工反馈
    PendingHr,       // 待人事审核
    Closed,          // 已关闭
}

impl fmt::Display for EvaluationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl EvaluationState {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MANAGER_DRAFT" => Some(EvaluationState::ManagerDraft),
            "PENDING_EMPLOYEE" => Some(EvaluationState::PendingEmployee),
            "PENDING_HR" => Some(EvaluationState::PendingHr),
            "CLOSED" => Some(EvaluationState::Closed),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            EvaluationState::ManagerDraft => "MANAGER_DRAFT",
            EvaluationState::PendingEmployee => "PENDING_EMPLOYEE",
            EvaluationState::PendingHr => "PENDING_HR",
            EvaluationState::Closed => "CLOSED",
        }
    }
}

// ==========================================
// 时间线动作 (Timeline Action)
// ==========================================
// 存储值沿用业务方约定的动作标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineAction {
    #[serde(rename = "enviado")]
    Sent,
    #[serde(rename = "feedback")]
    Feedback,
    #[serde(rename = "rrhh")]
    ForwardedToHr,
    #[serde(rename = "cerrado")]
    Closed,
    #[serde(rename = "reopen")]
    Reopened,
}

impl fmt::Display for TimelineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TimelineAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineAction::Sent => "enviado",
            TimelineAction::Feedback => "feedback",
            TimelineAction::ForwardedToHr => "rrhh",
            TimelineAction::Closed => "cerrado",
            TimelineAction::Reopened => "reopen",
        }
    }
}

// ==========================================
// 奖金发放曲线类型 (Scale Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Lineal, // 阈值以上线性插值
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleType::Lineal => write!(f, "lineal"),
        }
    }
}

// ==========================================
// 奖金覆写作用域 (Override Scope)
// ==========================================
// 优先级: employee > area > 根配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideScope {
    Employee,
    Area,
}

impl fmt::Display for OverrideScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideScope::Employee => write!(f, "employee"),
            OverrideScope::Area => write!(f, "area"),
        }
    }
}
