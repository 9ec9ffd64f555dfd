// ==========================================
// 绩效评分引擎 - 目标分配 API
// ==========================================
// 职责: 员工年度目标分配查询
// 四个读取（员工/参与/模板/覆写）并发执行，全部完成后计算权重
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::run_blocking;
use crate::domain::template::AssignmentResult;
use crate::engine::assignment::AssignmentResolver;
use crate::engine::capability::{capabilities, CapabilityTable};
use crate::repository::employee_repo::EmployeeRepository;
use crate::repository::participation_repo::{OverrideRepository, ParticipationRepository};
use crate::repository::template_repo::TemplateRepository;

// ==========================================
// AssignmentApi - 目标分配 API
// ==========================================
pub struct AssignmentApi {
    employee_repo: Arc<EmployeeRepository>,
    template_repo: Arc<TemplateRepository>,
    participation_repo: Arc<ParticipationRepository>,
    override_repo: Arc<OverrideRepository>,
    capabilities: Arc<CapabilityTable>,
    resolver: AssignmentResolver,
}

impl AssignmentApi {
    pub fn new(
        employee_repo: Arc<EmployeeRepository>,
        template_repo: Arc<TemplateRepository>,
        participation_repo: Arc<ParticipationRepository>,
        override_repo: Arc<OverrideRepository>,
        capabilities: Arc<CapabilityTable>,
    ) -> Self {
        Self {
            employee_repo,
            template_repo,
            participation_repo,
            override_repo,
            capabilities,
            resolver: AssignmentResolver::new(),
        }
    }

    /// 计算员工年度目标分配
    ///
    /// # 参数
    /// - employee_id: 员工ID
    /// - year: 年度
    ///
    /// # 返回
    /// - Ok(AssignmentResult): 分配行（排序后）与权重合计
    /// - Err(ApiError::NotFound): 员工不存在
    pub async fn resolve(&self, employee_id: &str, year: i32) -> ApiResult<AssignmentResult> {
        if employee_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("员工ID不能为空".to_string()));
        }

        tracing::info!(employee_id, year, "计算员工年度目标分配");

        let employee_fut = {
            let repo = Arc::clone(&self.employee_repo);
            let id = employee_id.to_string();
            run_blocking(move || repo.find_by_id(&id))
        };
        let participations_fut = {
            let repo = Arc::clone(&self.participation_repo);
            let id = employee_id.to_string();
            run_blocking(move || repo.list_by_employee_year(&id, year))
        };
        let templates_fut = {
            let repo = Arc::clone(&self.template_repo);
            run_blocking(move || repo.list_active_by_year(year))
        };
        let overrides_fut = {
            let repo = Arc::clone(&self.override_repo);
            let id = employee_id.to_string();
            run_blocking(move || repo.list_by_employee_year(&id, year))
        };

        let (employee, participations, templates, overrides) =
            tokio::try_join!(employee_fut, participations_fut, templates_fut, overrides_fut)?;

        let employee = employee
            .ok_or_else(|| ApiError::NotFound(format!("员工(id={})不存在", employee_id)))?;

        let result =
            self.resolver
                .resolve(&employee, year, participations, &templates, &overrides);

        tracing::info!(
            employee_id,
            year,
            items = result.items.len(),
            total = result.total,
            synthetic_participation = result.synthetic_participation,
            "目标分配完成"
        );

        Ok(result)
    }
    /// 按角色查询目标分配（需要 assignment:read）
    pub async fn resolve_as(
        &self,
        employee_id: &str,
        year: i32,
        roles: &[String],
    ) -> ApiResult<AssignmentResult> {
        if !self
            .capabilities
            .has_capability(roles, capabilities::ASSIGNMENT_READ)
        {
            tracing::warn!(employee_id, ?roles, "目标分配查询被拒绝");
            return Err(ApiError::PermissionDenied(format!(
                "缺少能力: {}",
                capabilities::ASSIGNMENT_READ
            )));
        }
        self.resolve(employee_id, year).await
    }
}
