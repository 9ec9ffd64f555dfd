// ==========================================
// 绩效评分引擎 - 年度奖金 API
// ==========================================
// 流程:
// 1. 读取年度配置（不存在 -> ConfigNotFound，不写库）
// 2. 确定当年有评估单的员工（为空 -> count=0，不调用外部评分）
// 3. 外部聚合服务计算最终得分
// 4. 逐人解析生效配置并计算
// 5. 单事务批量覆盖写入
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::run_blocking;
use crate::config::EngineConfigReader;
use crate::domain::bonus::{BonoAnual, BonoConfig};
use crate::engine::bonus::BonusEngine;
use crate::engine::capability::{capabilities, CapabilityTable};
use crate::engine::scoring::{EmployeeSelector, ScoreAggregator};
use crate::repository::bono_repo::{BonoAnualRepository, BonoConfigRepository};
use crate::repository::employee_repo::EmployeeRepository;
use crate::repository::evaluation_repo::EvaluationRepository;

/// 批量计算结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusRunSummary {
    pub year: i32,
    /// 写入条数
    pub count: usize,
}

// ==========================================
// BonusApi - 年度奖金 API
// ==========================================
pub struct BonusApi {
    bono_config_repo: Arc<BonoConfigRepository>,
    bono_anual_repo: Arc<BonoAnualRepository>,
    evaluation_repo: Arc<EvaluationRepository>,
    employee_repo: Arc<EmployeeRepository>,
    scorer: Arc<dyn ScoreAggregator>,
    config_reader: Arc<dyn EngineConfigReader>,
    capabilities: Arc<CapabilityTable>,
}

impl BonusApi {
    pub fn new(
        bono_config_repo: Arc<BonoConfigRepository>,
        bono_anual_repo: Arc<BonoAnualRepository>,
        evaluation_repo: Arc<EvaluationRepository>,
        employee_repo: Arc<EmployeeRepository>,
        scorer: Arc<dyn ScoreAggregator>,
        config_reader: Arc<dyn EngineConfigReader>,
        capabilities: Arc<CapabilityTable>,
    ) -> Self {
        Self {
            bono_config_repo,
            bono_anual_repo,
            evaluation_repo,
            employee_repo,
            scorer,
            config_reader,
            capabilities,
        }
    }

    /// 保存年度奖金配置（先校验）
    pub fn save_config(&self, config: &BonoConfig) -> ApiResult<()> {
        BonusEngine::default().validate_config(config)?;
        self.bono_config_repo.upsert(config)?;
        tracing::info!(year = config.year, overrides = config.overrides.len(), "奖金配置已保存");
        Ok(())
    }

    /// 计算年度全部员工奖金
    ///
    /// # 返回
    /// - Ok(BonusRunSummary): 写入条数
    /// - Err(ApiError::ConfigNotFound): 当年无配置
    /// - Err(ApiError::ScoringUnavailable): 外部评分失败（不写库）
    pub async fn calculate_all(&self, year: i32) -> ApiResult<BonusRunSummary> {
        tracing::info!(year, "开始计算年度奖金");

        let config = {
            let repo = Arc::clone(&self.bono_config_repo);
            run_blocking(move || repo.find_by_year(year)).await?
        }
        .ok_or(ApiError::ConfigNotFound(year))?;

        let decimals = self
            .config_reader
            .bonus_amount_decimals()
            .await
            .map_err(|e| ApiError::InternalError(format!("读取金额精度失败: {}", e)))?;
        let engine = BonusEngine::new(decimals);
        engine.validate_config(&config)?;

        let employee_ids = {
            let repo = Arc::clone(&self.evaluation_repo);
            run_blocking(move || repo.list_employee_ids_by_year(year)).await?
        };

        if employee_ids.is_empty() {
            tracing::info!(year, "当年无评估记录，跳过奖金计算");
            return Ok(BonusRunSummary { year, count: 0 });
        }

        let selector = EmployeeSelector {
            year,
            employee_ids: employee_ids.clone(),
        };
        let scores = self
            .scorer
            .compute_for_employees(&selector)
            .await
            .map_err(|e| {
                tracing::error!(year, error = %e, "外部评分失败");
                ApiError::from(e)
            })?;
        let scores = BonusEngine::scores_by_employee(scores);

        let employees = {
            let repo = Arc::clone(&self.employee_repo);
            run_blocking(move || repo.find_by_ids(&employee_ids)).await?
        };

        let calculated_at = Utc::now().naive_utc();
        let results: Vec<BonoAnual> = employees
            .iter()
            .map(|employee| {
                let score = scores.get(&employee.employee_id).copied().unwrap_or(0.0);
                engine.compute(employee, year, score, &config, calculated_at)
            })
            .collect();

        let count = {
            let repo = Arc::clone(&self.bono_anual_repo);
            run_blocking(move || repo.batch_upsert(&results)).await?
        };

        tracing::info!(year, count, "年度奖金计算完成");
        Ok(BonusRunSummary { year, count })
    }

    /// 按角色计算年度奖金（需要 bonus:calculate）
    ///
    /// 权限不足时不读取配置、不调用外部评分。
    pub async fn calculate_all_as(&self, year: i32, roles: &[String]) -> ApiResult<BonusRunSummary> {
        if !self
            .capabilities
            .has_capability(roles, capabilities::BONUS_CALCULATE)
        {
            tracing::warn!(year, ?roles, "奖金计算被拒绝");
            return Err(ApiError::PermissionDenied(format!(
                "缺少能力: {}",
                capabilities::BONUS_CALCULATE
            )));
        }
        self.calculate_all(year).await
    }

    /// 查询年度奖金结果
    pub fn list_results(&self, year: i32) -> ApiResult<Vec<BonoAnual>> {
        Ok(self.bono_anual_repo.list_by_year(year)?)
    }
}
