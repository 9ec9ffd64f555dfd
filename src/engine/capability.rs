// ==========================================
// 绩效评分引擎 - 角色能力表
// ==========================================
// 角色 -> 能力模式集合，启动时构建一次，之后只读
// 模式匹配: 精确 / 全局通配 "*" / 前缀通配 "domain:*"
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 能力常量
pub mod capabilities {
    pub const ASSIGNMENT_READ: &str = "assignment:read";
    pub const EVALUATION_READ: &str = "evaluation:read";
    pub const EVALUATION_SUBMIT: &str = "evaluation:submit";
    pub const EVALUATION_FEEDBACK: &str = "evaluation:feedback";
    pub const EVALUATION_REVIEW: &str = "evaluation:review";
    pub const BONUS_CALCULATE: &str = "bonus:calculate";
}

/// 能力模式是否匹配
pub fn pattern_matches(pattern: &str, capability: &str) -> bool {
    if pattern == "*" || pattern == capability {
        return true;
    }
    match pattern.strip_suffix(":*") {
        Some(domain) => capability
            .strip_prefix(domain)
            .map(|rest| rest.starts_with(':'))
            .unwrap_or(false),
        None => false,
    }
}

// ==========================================
// Actor - 操作人能力标记
// ==========================================
// 工作流只读取这些标记，不做认证
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    /// 操作人对应的员工ID（员工本人反馈时比对）
    pub employee_id: Option<String>,
    pub is_manager: bool,
    pub is_employee: bool,
    pub is_hr: bool,
}

impl Actor {
    pub fn manager(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_manager: true,
            ..Self::default()
        }
    }

    pub fn employee(user_id: &str, employee_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            employee_id: Some(employee_id.to_string()),
            is_employee: true,
            ..Self::default()
        }
    }

    pub fn hr(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_hr: true,
            ..Self::default()
        }
    }
}

// ==========================================
// CapabilityTable - 角色能力表
// ==========================================
#[derive(Debug, Clone)]
pub struct CapabilityTable {
    patterns_by_role: HashMap<String, Vec<String>>,
}

impl CapabilityTable {
    pub fn new(patterns_by_role: HashMap<String, Vec<String>>) -> Self {
        Self { patterns_by_role }
    }

    /// 标准角色表
    pub fn standard() -> Self {
        use capabilities::*;

        let table: [(&str, &[&str]); 4] = [
            ("admin", &["*"]),
            ("hr", &["evaluation:*", "bonus:*", ASSIGNMENT_READ]),
            ("manager", &[EVALUATION_READ, EVALUATION_SUBMIT, ASSIGNMENT_READ]),
            ("employee", &[EVALUATION_READ, EVALUATION_FEEDBACK]),
        ];

        Self::new(
            table
                .iter()
                .map(|(role, patterns)| {
                    (
                        role.to_string(),
                        patterns.iter().map(|p| p.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    /// 角色集合是否拥有能力（未知角色视为无能力）
    pub fn has_capability<S: AsRef<str>>(&self, roles: &[S], capability: &str) -> bool {
        roles.iter().any(|role| {
            self.patterns_by_role
                .get(role.as_ref())
                .map(|patterns| patterns.iter().any(|p| pattern_matches(p, capability)))
                .unwrap_or(false)
        })
    }

    /// 由角色集合生成工作流操作人
    pub fn actor<S: AsRef<str>>(&self, user_id: &str, employee_id: Option<&str>, roles: &[S]) -> Actor {
        use capabilities::*;

        Actor {
            user_id: user_id.to_string(),
            employee_id: employee_id.map(str::to_string),
            is_manager: self.has_capability(roles, EVALUATION_SUBMIT),
            is_employee: self.has_capability(roles, EVALUATION_FEEDBACK),
            is_hr: self.has_capability(roles, EVALUATION_REVIEW),
        }
    }
}
