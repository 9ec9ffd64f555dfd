// ==========================================
// 绩效评分引擎 - 评估单 API
// ==========================================
// 职责: 草稿创建、结果录入、期间评分、流程转换、时间线查询
// 约束: 引擎校验失败时不写库
// ==========================================

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::run_blocking;
use crate::config::EngineConfigReader;
use crate::domain::evaluation::{Evaluation, TimelineEntry};
use crate::domain::goal::PeriodScore;
use crate::domain::period::FiscalPeriodKey;
use crate::domain::types::EvaluationState;
use crate::engine::accumulation::AccumulationAggregator;
use crate::engine::capability::{Actor, CapabilityTable};
use crate::engine::period_score::PeriodScoreCalculator;
use crate::engine::workflow::{EvaluationWorkflow, Transition};
use crate::repository::employee_repo::EmployeeRepository;
use crate::repository::evaluation_repo::EvaluationRepository;
use crate::repository::template_repo::TemplateRepository;

// ==========================================
// EvaluationApi - 评估单 API
// ==========================================
pub struct EvaluationApi {
    evaluation_repo: Arc<EvaluationRepository>,
    employee_repo: Arc<EmployeeRepository>,
    template_repo: Arc<TemplateRepository>,
    config_reader: Arc<dyn EngineConfigReader>,
    capabilities: Arc<CapabilityTable>,
    calculator: PeriodScoreCalculator,
    aggregator: AccumulationAggregator,
}

impl EvaluationApi {
    pub fn new(
        evaluation_repo: Arc<EvaluationRepository>,
        employee_repo: Arc<EmployeeRepository>,
        template_repo: Arc<TemplateRepository>,
        config_reader: Arc<dyn EngineConfigReader>,
        capabilities: Arc<CapabilityTable>,
    ) -> Self {
        Self {
            evaluation_repo,
            employee_repo,
            template_repo,
            config_reader,
            capabilities,
            calculator: PeriodScoreCalculator::new(),
            aggregator: AccumulationAggregator::new(),
        }
    }

    /// 取得或创建评估草稿
    ///
    /// # 返回
    /// - Ok((Evaluation, created)): created=false 表示返回已有记录
    /// - Err(ApiError::ValidationError): 期间键非法，或期间年度与模板年度不一致
    /// - Err(ApiError::NotFound): 员工或模板不存在
    pub fn ensure_draft(
        &self,
        employee_id: &str,
        template_id: &str,
        period_key: &str,
    ) -> ApiResult<(Evaluation, bool)> {
        let key = FiscalPeriodKey::parse(period_key)
            .map_err(|e| ApiError::ValidationError(e.to_string()))?;

        if self.employee_repo.find_by_id(employee_id)?.is_none() {
            return Err(ApiError::NotFound(format!("员工(id={})不存在", employee_id)));
        }
        let template = self
            .template_repo
            .find_by_id(template_id)?
            .ok_or_else(|| ApiError::NotFound(format!("模板(id={})不存在", template_id)))?;
        if key.year != template.year {
            return Err(ApiError::ValidationError(format!(
                "期间{}不属于模板{}的年度{}",
                key, template_id, template.year
            )));
        }

        let (evaluation, created) =
            self.evaluation_repo
                .ensure_draft(employee_id, template_id, &key)?;

        tracing::info!(
            evaluation_id = %evaluation.evaluation_id,
            employee_id,
            template_id,
            period_key = %evaluation.period_key,
            created,
            "评估草稿就绪"
        );

        Ok((evaluation, created))
    }

    pub fn get(&self, evaluation_id: &str) -> ApiResult<Evaluation> {
        self.evaluation_repo
            .find_by_id(evaluation_id)?
            .ok_or_else(|| ApiError::NotFound(format!("评估单(id={})不存在", evaluation_id)))
    }

    /// 录入本期上报值（整体替换）
    ///
    /// 仅主管草稿状态允许录入；指标ID必须属于模板。
    pub fn record_results(
        &self,
        evaluation_id: &str,
        results: BTreeMap<String, f64>,
    ) -> ApiResult<Evaluation> {
        let mut evaluation = self.get(evaluation_id)?;
        ensure_manager_draft(&evaluation, "recordResults")?;

        let goals = self.template_repo.list_goals(&evaluation.template_id)?;
        for (goal_id, value) in &results {
            if !goals.iter().any(|g| &g.goal_id == goal_id) {
                return Err(ApiError::ValidationError(format!(
                    "指标{}不属于模板{}",
                    goal_id, evaluation.template_id
                )));
            }
            if !value.is_finite() {
                return Err(ApiError::ValidationError(format!(
                    "指标{}上报值非法: {}",
                    goal_id, value
                )));
            }
        }

        evaluation.goal_results = results;
        evaluation.updated_at = Utc::now().naive_utc();
        self.evaluation_repo.update(&evaluation)?;

        tracing::info!(
            evaluation_id,
            goals = evaluation.goal_results.len(),
            "上报值已录入"
        );
        Ok(evaluation)
    }

    /// 历史期间累计值 (goal_id -> sum)
    pub fn prior_accumulated(
        &self,
        template_id: &str,
        period_key: &str,
        employee_id: &str,
    ) -> ApiResult<HashMap<String, f64>> {
        let records = self
            .evaluation_repo
            .list_by_employee_template(employee_id, template_id)?;

        Ok(self
            .aggregator
            .prior_accumulated(employee_id, template_id, period_key, &records)?)
    }

    /// 计算并保存期间评分快照
    ///
    /// 与结果录入相同，仅主管草稿状态允许；提交后的快照保持不变。
    pub fn score_period(&self, evaluation_id: &str) -> ApiResult<PeriodScore> {
        let mut evaluation = self.get(evaluation_id)?;
        ensure_manager_draft(&evaluation, "scorePeriod")?;

        let goals = self.template_repo.list_goals(&evaluation.template_id)?;
        let prior = self.prior_accumulated(
            &evaluation.template_id,
            &evaluation.period_key,
            &evaluation.employee_id,
        )?;
        let reported = PeriodScoreCalculator::attach_results(goals, &evaluation.goal_results);
        let score = self.calculator.score(&reported, &prior)?;

        evaluation.score = Some(score.clone());
        evaluation.updated_at = Utc::now().naive_utc();
        self.evaluation_repo.update(&evaluation)?;

        tracing::info!(
            evaluation_id,
            period_key = %evaluation.period_key,
            objective_score = ?score.objective_score,
            "期间评分完成"
        );
        Ok(score)
    }

    /// 执行流程转换
    ///
    /// 守卫失败时返回错误，数据库记录保持不变。
    pub async fn transition(
        &self,
        evaluation_id: &str,
        transition: Transition,
        actor: &Actor,
        note: Option<String>,
    ) -> ApiResult<Evaluation> {
        let mut evaluation = {
            let repo = Arc::clone(&self.evaluation_repo);
            let id = evaluation_id.to_string();
            run_blocking(move || repo.find_by_id(&id)).await?
        }
        .ok_or_else(|| ApiError::NotFound(format!("评估单(id={})不存在", evaluation_id)))?;

        let policy = self
            .config_reader
            .workflow_policy()
            .await
            .map_err(|e| ApiError::InternalError(format!("读取流程策略失败: {}", e)))?;
        let workflow = EvaluationWorkflow::new(policy);

        if let Err(e) = workflow.apply(&mut evaluation, transition, actor, note, None) {
            tracing::warn!(
                evaluation_id,
                transition = %transition,
                actor = %actor.user_id,
                error = %e,
                "状态转换被拒绝"
            );
            return Err(e.into());
        }

        let saved = evaluation.clone();
        let repo = Arc::clone(&self.evaluation_repo);
        run_blocking(move || repo.update(&saved)).await?;
        Ok(evaluation)
    }

    /// 按角色执行流程转换
    ///
    /// # 参数
    /// - action: 转换名（submitToEmployee / employeeAck / ...）
    /// - roles: 调用方角色集合，经能力表换算为操作人
    pub async fn transition_as(
        &self,
        evaluation_id: &str,
        action: &str,
        user_id: &str,
        employee_id: Option<&str>,
        roles: &[String],
        note: Option<String>,
    ) -> ApiResult<Evaluation> {
        let transition = Transition::parse(action)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知的流程操作: {}", action)))?;
        let actor = self.capabilities.actor(user_id, employee_id, roles);
        self.transition(evaluation_id, transition, &actor, note).await
    }

    pub fn timeline(&self, evaluation_id: &str) -> ApiResult<Vec<TimelineEntry>> {
        Ok(self.get(evaluation_id)?.timeline)
    }
}

/// 录入/评分前置条件: 仅主管草稿
fn ensure_manager_draft(evaluation: &Evaluation, action: &str) -> ApiResult<()> {
    if evaluation.state != EvaluationState::ManagerDraft {
        return Err(ApiError::InvalidTransition {
            action: action.to_string(),
            from: evaluation.state,
        });
    }
    Ok(())
}
