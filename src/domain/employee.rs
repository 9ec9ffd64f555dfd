// ==========================================
// 绩效评分引擎 - 员工领域模型
// ==========================================
// 包含: 员工主数据、部门参与比例、目标覆写
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Employee - 员工
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub full_name: String,
    pub area_id: String,         // 所属区域
    pub sector_id: String,       // 主部门
    pub base_salary: f64,        // 基本薪资
    pub active: bool,
}

/// 员工摘要（随分配结果一起返回）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub employee_id: String,
    pub full_name: String,
    pub area_id: String,
    pub sector_id: String,
}

impl From<&Employee> for EmployeeSummary {
    fn from(e: &Employee) -> Self {
        Self {
            employee_id: e.employee_id.clone(),
            full_name: e.full_name.clone(),
            area_id: e.area_id.clone(),
            sector_id: e.sector_id.clone(),
        }
    }
}

// ==========================================
// EmployeeSectorParticipation - 部门参与比例
// ==========================================
// 唯一键: (employee_id, sector_id, year)
// 不校验同一年度各部门之和是否 <= 100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSectorParticipation {
    pub employee_id: String,
    pub sector_id: String,
    pub year: i32,
    pub participation_pct: f64, // 0..=100
}

impl EmployeeSectorParticipation {
    /// 无参与记录时的默认值: 主部门 100%
    pub fn primary_default(employee: &Employee, year: i32) -> Self {
        Self {
            employee_id: employee.employee_id.clone(),
            sector_id: employee.sector_id.clone(),
            year,
            participation_pct: 100.0,
        }
    }
}

// ==========================================
// EmployeeObjectiveOverride - 员工目标覆写
// ==========================================
// 唯一键: (employee_id, template_id, year)
// excluded=true 时强制有效权重为 0，忽略 weight_override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeObjectiveOverride {
    pub employee_id: String,
    pub template_id: String,
    pub year: i32,
    pub excluded: bool,
    pub weight_override: Option<f64>,
    pub note: Option<String>,
}
