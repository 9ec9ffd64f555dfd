// ==========================================
// 绩效评分引擎 - 评估审批状态机
// ==========================================
// MANAGER_DRAFT -> PENDING_EMPLOYEE -> PENDING_HR -> CLOSED
// 唯一回退: CLOSED -> PENDING_HR (reopen)
// ==========================================
// 守卫顺序: 源状态 -> 操作人能力 -> 备注校验
// 任一守卫失败都不修改评估单（包括时间线）
// 并发: 无锁，同一评估单的并发转换以最后写入为准
// ==========================================

use crate::domain::evaluation::{push_timeline, Evaluation, NewTimelineEntry};
use crate::domain::types::{EvaluationState, TimelineAction};
use crate::engine::capability::Actor;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Transition - 状态转换
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transition {
    SubmitToEmployee,
    EmployeeAck,
    EmployeeContest,
    SubmitToHr,
    Close,
    Reopen,
}

/// 转换所需的操作人身份
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequiredRole {
    Manager,
    Subject,
    Hr,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::SubmitToEmployee => "submitToEmployee",
            Transition::EmployeeAck => "employeeAck",
            Transition::EmployeeContest => "employeeContest",
            Transition::SubmitToHr => "submitToHR",
            Transition::Close => "close",
            Transition::Reopen => "reopen",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "submitToEmployee" => Some(Transition::SubmitToEmployee),
            "employeeAck" => Some(Transition::EmployeeAck),
            "employeeContest" => Some(Transition::EmployeeContest),
            "submitToHR" | "submitToHr" => Some(Transition::SubmitToHr),
            "close" => Some(Transition::Close),
            "reopen" => Some(Transition::Reopen),
            _ => None,
        }
    }

    /// 允许的源状态
    pub fn allowed_from(&self) -> EvaluationState {
        match self {
            Transition::SubmitToEmployee => EvaluationState::ManagerDraft,
            Transition::EmployeeAck
            | Transition::EmployeeContest
            | Transition::SubmitToHr => EvaluationState::PendingEmployee,
            Transition::Close => EvaluationState::PendingHr,
            Transition::Reopen => EvaluationState::Closed,
        }
    }

    pub fn timeline_action(&self) -> TimelineAction {
        match self {
            Transition::SubmitToEmployee => TimelineAction::Sent,
            Transition::EmployeeAck | Transition::EmployeeContest => TimelineAction::Feedback,
            Transition::SubmitToHr => TimelineAction::ForwardedToHr,
            Transition::Close => TimelineAction::Closed,
            Transition::Reopen => TimelineAction::Reopened,
        }
    }

    fn required_role(&self) -> RequiredRole {
        match self {
            Transition::SubmitToEmployee | Transition::SubmitToHr => RequiredRole::Manager,
            Transition::EmployeeAck | Transition::EmployeeContest => RequiredRole::Subject,
            Transition::Close | Transition::Reopen => RequiredRole::Hr,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// WorkflowPolicy - 流程策略
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowPolicy {
    /// 员工确认后直接转人事审核
    pub ack_forwards_to_hr: bool,
}

// ==========================================
// EvaluationWorkflow - 审批状态机
// ==========================================
pub struct EvaluationWorkflow {
    policy: WorkflowPolicy,
}

impl EvaluationWorkflow {
    pub fn new(policy: WorkflowPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> WorkflowPolicy {
        self.policy
    }

    /// 校验转换并给出目标状态（不修改评估单）
    pub fn check(
        &self,
        evaluation: &Evaluation,
        transition: Transition,
        actor: &Actor,
        note: Option<&str>,
    ) -> EngineResult<EvaluationState> {
        if evaluation.state != transition.allowed_from() {
            return Err(EngineError::InvalidTransition {
                action: transition.as_str().to_string(),
                from: evaluation.state,
            });
        }

        let permitted = match transition.required_role() {
            RequiredRole::Manager => actor.is_manager,
            RequiredRole::Hr => actor.is_hr,
            RequiredRole::Subject => {
                actor.is_employee
                    && actor.employee_id.as_deref() == Some(evaluation.employee_id.as_str())
            }
        };
        if !permitted {
            return Err(EngineError::PermissionDenied(format!(
                "用户{}无权执行{}",
                actor.user_id,
                transition.as_str()
            )));
        }

        if transition == Transition::EmployeeContest && note.is_none() {
            return Err(EngineError::ValidationError(
                "员工异议必须填写意见".to_string(),
            ));
        }

        Ok(self.target_state(transition, evaluation.state))
    }

    /// 执行转换
    ///
    /// 成功时更新状态、意见与时间线；失败时评估单保持原样。
    /// 持久化由调用方负责。
    pub fn apply(
        &self,
        evaluation: &mut Evaluation,
        transition: Transition,
        actor: &Actor,
        note: Option<String>,
        now: Option<NaiveDateTime>,
    ) -> EngineResult<EvaluationState> {
        let note = normalize_note(note);
        let from = evaluation.state;
        let to = self.check(evaluation, transition, actor, note.as_deref())?;
        let now = now.unwrap_or_else(|| Utc::now().naive_utc());

        if let Some(text) = note.clone() {
            match transition.required_role() {
                RequiredRole::Manager => evaluation.comments.manager = Some(text),
                RequiredRole::Subject => evaluation.comments.employee = Some(text),
                RequiredRole::Hr => evaluation.comments.hr = Some(text),
            }
        }

        evaluation.state = to;
        evaluation.updated_at = now;
        push_timeline(
            evaluation,
            NewTimelineEntry::new(transition.timeline_action(), actor.user_id.clone())
                .with_note(note)
                .at(now),
        );

        tracing::info!(
            evaluation_id = %evaluation.evaluation_id,
            transition = %transition,
            from = %from,
            to = %to,
            actor = %actor.user_id,
            "评估单状态转换"
        );

        Ok(to)
    }

    fn target_state(&self, transition: Transition, current: EvaluationState) -> EvaluationState {
        match transition {
            Transition::SubmitToEmployee => EvaluationState::PendingEmployee,
            Transition::EmployeeAck if self.policy.ack_forwards_to_hr => EvaluationState::PendingHr,
            Transition::EmployeeAck | Transition::EmployeeContest => current,
            Transition::SubmitToHr => EvaluationState::PendingHr,
            Transition::Close => EvaluationState::Closed,
            Transition::Reopen => EvaluationState::PendingHr,
        }
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
