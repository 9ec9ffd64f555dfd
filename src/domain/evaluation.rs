// ==========================================
// 绩效评分引擎 - 评估单领域模型
// ==========================================
// 自然键: (employee_id, template_id, period_key)
// 时间线: 只追加，不重排，不删除
// ==========================================

use crate::domain::goal::PeriodScore;
use crate::domain::period::FiscalPeriodKey;
use crate::domain::types::{EvaluationState, TimelineAction};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ==========================================
// Evaluation - 评估单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub evaluation_id: String,
    pub employee_id: String,
    pub template_id: String,
    pub year: i32,
    pub period_key: String,
    pub state: EvaluationState,
    /// goal_id -> 本期上报值
    #[serde(default)]
    pub goal_results: BTreeMap<String, f64>,
    #[serde(default)]
    pub comments: EvaluationComments,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    /// 最近一次期间评分
    pub score: Option<PeriodScore>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationComments {
    pub manager: Option<String>,
    pub employee: Option<String>,
    pub hr: Option<String>,
}

/// 时间线条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub action: TimelineAction,
    pub actor: String,
    pub timestamp: NaiveDateTime,
    pub note: Option<String>,
}

/// 待追加的时间线条目（时间戳可缺省）
#[derive(Debug, Clone)]
pub struct NewTimelineEntry {
    pub action: TimelineAction,
    pub actor: String,
    pub timestamp: Option<NaiveDateTime>,
    pub note: Option<String>,
}

impl NewTimelineEntry {
    pub fn new(action: TimelineAction, actor: impl Into<String>) -> Self {
        Self {
            action,
            actor: actor.into(),
            timestamp: None,
            note: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub fn at(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl Evaluation {
    /// 创建主管草稿
    pub fn new_draft(employee_id: &str, template_id: &str, period: &FiscalPeriodKey) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            evaluation_id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            template_id: template_id.to_string(),
            year: period.year,
            period_key: period.canonical(),
            state: EvaluationState::ManagerDraft,
            goal_results: BTreeMap::new(),
            comments: EvaluationComments::default(),
            timeline: Vec::new(),
            score: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 追加时间线条目
///
/// 纯内存操作，持久化由调用方负责。
/// 时间线缺失（旧数据反序列化）时由 serde default 初始化为空。
pub fn push_timeline(evaluation: &mut Evaluation, entry: NewTimelineEntry) -> &TimelineEntry {
    let timestamp = entry.timestamp.unwrap_or_else(|| Utc::now().naive_utc());
    evaluation.timeline.push(TimelineEntry {
        action: entry.action,
        actor: entry.actor,
        timestamp,
        note: entry.note,
    });
    // 刚 push 过，last 必然存在
    &evaluation.timeline[evaluation.timeline.len() - 1]
}
