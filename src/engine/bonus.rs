// ==========================================
// 绩效评分引擎 - 年度奖金引擎
// ==========================================
// 生效配置优先级: 员工覆写 > 区域覆写 > 根配置
// lineal 曲线: 得分低于阈值发放 0%;
//   阈值处发放 min_pct，得分 100 发放 max_pct，中间线性插值
// bono_base = 基本薪资 * target_ratio
// bono_final = bono_base * 发放百分比 / 100
// ==========================================

use crate::domain::bonus::{BonoAnual, BonoConfig, ConfigSource, EffectiveBonoConfig, PayoutScale};
use crate::domain::employee::Employee;
use crate::domain::types::{OverrideScope, ScaleType};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::scoring::EmployeeFinalScore;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// 金额默认保留小数位
pub const DEFAULT_AMOUNT_DECIMALS: u32 = 2;

pub struct BonusEngine {
    amount_decimals: u32,
}

impl Default for BonusEngine {
    fn default() -> Self {
        Self::new(DEFAULT_AMOUNT_DECIMALS)
    }
}

impl BonusEngine {
    pub fn new(amount_decimals: u32) -> Self {
        Self { amount_decimals }
    }

    /// 校验年度配置（根配置与所有覆写）
    pub fn validate_config(&self, config: &BonoConfig) -> EngineResult<()> {
        validate_ratio(config.target_ratio, "根配置")?;
        validate_scale(&config.scale, "根配置")?;
        for ov in &config.overrides {
            let label = format!("{}覆写{}", ov.scope, ov.target_id);
            if let Some(ratio) = ov.target_ratio {
                validate_ratio(ratio, &label)?;
            }
            if let Some(scale) = &ov.scale {
                validate_scale(scale, &label)?;
            }
        }
        Ok(())
    }

    /// 解析员工生效配置
    pub fn resolve_config(&self, config: &BonoConfig, employee: &Employee) -> EffectiveBonoConfig {
        let find = |scope: OverrideScope, target: &str| {
            config
                .overrides
                .iter()
                .find(|o| o.scope == scope && o.target_id == target)
        };

        let (ov, source) = match find(OverrideScope::Employee, &employee.employee_id) {
            Some(o) => (Some(o), ConfigSource::Employee),
            None => match find(OverrideScope::Area, &employee.area_id) {
                Some(o) => (Some(o), ConfigSource::Area),
                None => (None, ConfigSource::Root),
            },
        };

        EffectiveBonoConfig {
            target_ratio: ov
                .and_then(|o| o.target_ratio)
                .unwrap_or(config.target_ratio),
            scale: ov
                .and_then(|o| o.scale.clone())
                .unwrap_or_else(|| config.scale.clone()),
            source,
        }
    }

    /// 发放百分比 (0..=100 区间内的 min_pct..=max_pct)
    pub fn payout_pct(&self, scale: &PayoutScale, score: f64) -> f64 {
        let score = if score.is_finite() { score.clamp(0.0, 100.0) } else { 0.0 };

        match scale.scale_type {
            ScaleType::Lineal => {
                if score < scale.score_threshold {
                    0.0
                } else if scale.score_threshold >= 100.0 {
                    scale.max_pct
                } else {
                    let span = 100.0 - scale.score_threshold;
                    scale.min_pct
                        + (score - scale.score_threshold) / span * (scale.max_pct - scale.min_pct)
                }
            }
        }
    }

    /// 计算单个员工的年度奖金
    pub fn compute(
        &self,
        employee: &Employee,
        year: i32,
        score: f64,
        config: &BonoConfig,
        calculated_at: NaiveDateTime,
    ) -> BonoAnual {
        let effective = self.resolve_config(config, employee);
        let payout_pct = self.payout_pct(&effective.scale, score);
        let bono_base = employee.base_salary * effective.target_ratio;
        let bono_final = bono_base * payout_pct / 100.0;

        tracing::debug!(
            employee_id = %employee.employee_id,
            year,
            score,
            source = ?effective.source,
            target_ratio = effective.target_ratio,
            payout_pct,
            "奖金计算"
        );

        BonoAnual {
            employee_id: employee.employee_id.clone(),
            year,
            bono_base: round_to(bono_base, self.amount_decimals),
            bono_final: round_to(bono_final, self.amount_decimals),
            score,
            payout_pct,
            calculated_at,
        }
    }

    /// 外部得分 -> employee_id 索引，缺失得分按 0
    pub fn scores_by_employee(results: Vec<EmployeeFinalScore>) -> HashMap<String, f64> {
        results
            .into_iter()
            .map(|r| (r.employee_id, r.score_final.unwrap_or(0.0)))
            .collect()
    }
}

fn validate_ratio(ratio: f64, label: &str) -> EngineResult<()> {
    if !ratio.is_finite() || ratio < 0.0 {
        return Err(EngineError::ValidationError(format!(
            "{}目标奖金比例非法: {}",
            label, ratio
        )));
    }
    Ok(())
}

fn validate_scale(scale: &PayoutScale, label: &str) -> EngineResult<()> {
    let finite = scale.min_pct.is_finite()
        && scale.max_pct.is_finite()
        && scale.score_threshold.is_finite();
    if !finite
        || scale.min_pct < 0.0
        || scale.min_pct > scale.max_pct
        || !(0.0..=100.0).contains(&scale.score_threshold)
    {
        return Err(EngineError::ValidationError(format!(
            "{}发放曲线非法: min={}, max={}, threshold={}",
            label, scale.min_pct, scale.max_pct, scale.score_threshold
        )));
    }
    Ok(())
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
