// ==========================================
// 绩效评分引擎 - 目标分配解析器
// ==========================================
// 输入: 员工 + 参与比例 + 年度模板 + 员工覆写
// 输出: AssignmentResult (按名称排序的分配行 + 总权重)
// ==========================================
// 规则:
// 1. 无参与记录 -> 主部门 100% 默认参与
// 2. 候选模板: 当年、启用、且 (部门模板命中参与部门 或 区域模板命中员工区域)
// 3. 部门模板权重 = base_weight * 参与比例 / 100; 区域模板不缩放
// 4. 覆写: excluded -> 0; 否则 weight_override 优先; 否则缩放后权重
// ==========================================

use crate::domain::employee::{
    Employee, EmployeeObjectiveOverride, EmployeeSectorParticipation, EmployeeSummary,
};
use crate::domain::template::{AssignmentResult, AssignmentRow, ObjectiveTemplate};
use crate::domain::types::ScopeType;
use std::cmp::Ordering;
use std::collections::HashMap;

// ==========================================
// AssignmentResolver - 分配解析器
// ==========================================
pub struct AssignmentResolver {
    // 无状态引擎，数据加载由调用方完成
}

impl Default for AssignmentResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentResolver {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析员工年度有效参与比例
    ///
    /// # 返回
    /// (参与记录, 是否使用默认主部门参与)
    pub fn effective_participations(
        &self,
        employee: &Employee,
        year: i32,
        rows: Vec<EmployeeSectorParticipation>,
    ) -> (Vec<EmployeeSectorParticipation>, bool) {
        let rows: Vec<_> = rows
            .into_iter()
            .filter(|p| p.employee_id == employee.employee_id && p.year == year)
            .collect();

        if rows.is_empty() {
            tracing::debug!(
                employee_id = %employee.employee_id,
                year,
                sector_id = %employee.sector_id,
                "无部门参与记录，使用主部门 100% 默认参与"
            );
            (vec![EmployeeSectorParticipation::primary_default(employee, year)], true)
        } else {
            (rows, false)
        }
    }

    /// 计算员工年度分配结果
    ///
    /// # 参数
    /// - `employee`: 员工
    /// - `year`: 年度
    /// - `participations`: 员工参与记录（可为空）
    /// - `templates`: 当年模板（可包含不相关模板，内部过滤）
    /// - `overrides`: 员工当年覆写
    pub fn resolve(
        &self,
        employee: &Employee,
        year: i32,
        participations: Vec<EmployeeSectorParticipation>,
        templates: &[ObjectiveTemplate],
        overrides: &[EmployeeObjectiveOverride],
    ) -> AssignmentResult {
        let (participations, synthetic) =
            self.effective_participations(employee, year, participations);

        let pct_by_sector: HashMap<&str, f64> = participations
            .iter()
            .map(|p| (p.sector_id.as_str(), p.participation_pct))
            .collect();

        let override_by_template: HashMap<&str, &EmployeeObjectiveOverride> = overrides
            .iter()
            .filter(|o| o.employee_id == employee.employee_id && o.year == year)
            .map(|o| (o.template_id.as_str(), o))
            .collect();

        let mut items: Vec<AssignmentRow> = templates
            .iter()
            .filter(|t| t.year == year && t.active)
            .filter(|t| match t.scope_type {
                ScopeType::Sector => pct_by_sector.contains_key(t.scope_id.as_str()),
                ScopeType::Area => t.scope_id == employee.area_id,
            })
            .map(|t| {
                let participation_pct = match t.scope_type {
                    ScopeType::Sector => pct_by_sector.get(t.scope_id.as_str()).copied(),
                    ScopeType::Area => None,
                };
                self.build_row(
                    t,
                    participation_pct,
                    override_by_template.get(t.template_id.as_str()).copied(),
                )
            })
            .collect();

        items.sort_by(compare_rows);

        let total = items.iter().map(|r| r.effective_weight).sum();

        tracing::debug!(
            employee_id = %employee.employee_id,
            year,
            item_count = items.len(),
            total,
            "分配解析完成"
        );

        AssignmentResult {
            employee: EmployeeSummary::from(employee),
            year,
            synthetic_participation: synthetic,
            items,
            total,
        }
    }

    /// 构造单个分配行
    fn build_row(
        &self,
        template: &ObjectiveTemplate,
        participation_pct: Option<f64>,
        ov: Option<&EmployeeObjectiveOverride>,
    ) -> AssignmentRow {
        let scaled_weight = self.scaled_weight(template, participation_pct);
        let (effective_weight, overridden, excluded) = apply_override(scaled_weight, ov);

        AssignmentRow {
            template_id: template.template_id.clone(),
            kind: template.kind,
            name: template.name.clone(),
            scope_type: template.scope_type,
            scope_id: template.scope_id.clone(),
            tracking: template.tracking,
            base_weight: template.base_weight,
            participation_pct,
            scaled_weight,
            effective_weight,
            overridden,
            excluded,
        }
    }

    /// 按作用域缩放模板权重
    ///
    /// 部门模板没有精确匹配的参与记录时权重为 0
    pub fn scaled_weight(&self, template: &ObjectiveTemplate, participation_pct: Option<f64>) -> f64 {
        match template.scope_type {
            ScopeType::Area => template.base_weight,
            ScopeType::Sector => match participation_pct {
                Some(pct) => template.base_weight * pct / 100.0,
                None => 0.0,
            },
        }
    }
}

/// 应用员工覆写
///
/// # 返回
/// (有效权重, 是否被权重覆写, 是否被排除)
pub fn apply_override(scaled_weight: f64, ov: Option<&EmployeeObjectiveOverride>) -> (f64, bool, bool) {
    match ov {
        Some(o) if o.excluded => (0.0, false, true),
        Some(EmployeeObjectiveOverride {
            weight_override: Some(w),
            ..
        }) => (*w, true, false),
        _ => (scaled_weight, false, false),
    }
}

/// 名称排序键: 忽略大小写与西语重音
pub fn collation_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn compare_rows(a: &AssignmentRow, b: &AssignmentRow) -> Ordering {
    collation_key(&a.name)
        .cmp(&collation_key(&b.name))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.template_id.cmp(&b.template_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{TemplateKind, TrackingMethod};

    fn employee() -> Employee {
        Employee {
            employee_id: "E001".to_string(),
            full_name: "Ana Pérez".to_string(),
            area_id: "A1".to_string(),
            sector_id: "S1".to_string(),
            base_salary: 1000.0,
            active: true,
        }
    }

    fn template(id: &str, name: &str, scope: ScopeType, scope_id: &str, weight: f64) -> ObjectiveTemplate {
        ObjectiveTemplate {
            template_id: id.to_string(),
            year: 2025,
            scope_type: scope,
            scope_id: scope_id.to_string(),
            kind: TemplateKind::Objective,
            process: None,
            name: name.to_string(),
            description: None,
            kpi: None,
            target: None,
            tracking: TrackingMethod::Quarterly,
            base_weight: weight,
            active: true,
        }
    }

    fn participation(sector: &str, pct: f64) -> EmployeeSectorParticipation {
        EmployeeSectorParticipation {
            employee_id: "E001".to_string(),
            sector_id: sector.to_string(),
            year: 2025,
            participation_pct: pct,
        }
    }

    fn ov(template_id: &str, excluded: bool, weight: Option<f64>) -> EmployeeObjectiveOverride {
        EmployeeObjectiveOverride {
            employee_id: "E001".to_string(),
            template_id: template_id.to_string(),
            year: 2025,
            excluded,
            weight_override: weight,
            note: None,
        }
    }

    #[test]
    fn test_no_participation_synthesizes_primary_sector() {
        let resolver = AssignmentResolver::new();
        let (rows, synthetic) = resolver.effective_participations(&employee(), 2025, vec![]);

        assert!(synthetic);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sector_id, "S1");
        assert_eq!(rows[0].participation_pct, 100.0);
    }

    #[test]
    fn test_other_year_participation_is_ignored() {
        let resolver = AssignmentResolver::new();
        let mut old = participation("S2", 50.0);
        old.year = 2024;
        let (rows, synthetic) = resolver.effective_participations(&employee(), 2025, vec![old]);
        assert!(synthetic);
        assert_eq!(rows[0].sector_id, "S1");
    }

    #[test]
    fn test_sector_template_scaled_by_participation() {
        let resolver = AssignmentResolver::new();
        let templates = vec![template("T1", "Ventas", ScopeType::Sector, "S2", 40.0)];
        let result = resolver.resolve(
            &employee(),
            2025,
            vec![participation("S1", 70.0), participation("S2", 30.0)],
            &templates,
            &[],
        );

        assert_eq!(result.items.len(), 1);
        let row = &result.items[0];
        assert_eq!(row.participation_pct, Some(30.0));
        assert!((row.effective_weight - 12.0).abs() < 1e-9);
        assert!(row.effective_weight <= row.base_weight);
        assert!(!result.synthetic_participation);
    }

    #[test]
    fn test_sector_template_requires_exact_sector() {
        let resolver = AssignmentResolver::new();
        let templates = vec![template("T1", "Calidad", ScopeType::Sector, "S9", 40.0)];
        let result = resolver.resolve(
            &employee(),
            2025,
            vec![participation("S1", 100.0)],
            &templates,
            &[],
        );
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0.0);

        let t = &templates[0];
        assert_eq!(resolver.scaled_weight(t, None), 0.0);
    }

    #[test]
    fn test_area_template_unscaled() {
        let resolver = AssignmentResolver::new();
        let templates = vec![
            template("T1", "Seguridad", ScopeType::Area, "A1", 25.0),
            template("T2", "Otra área", ScopeType::Area, "A2", 25.0),
        ];
        let result = resolver.resolve(
            &employee(),
            2025,
            vec![participation("S1", 40.0)],
            &templates,
            &[],
        );
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].effective_weight, 25.0);
        assert_eq!(result.items[0].participation_pct, None);
    }

    #[test]
    fn test_excluded_wins_over_weight_override() {
        let resolver = AssignmentResolver::new();
        let templates = vec![template("T1", "Seguridad", ScopeType::Area, "A1", 25.0)];
        let result = resolver.resolve(
            &employee(),
            2025,
            vec![],
            &templates,
            &[ov("T1", true, Some(80.0))],
        );
        let row = &result.items[0];
        assert!(row.excluded);
        assert!(!row.overridden);
        assert_eq!(row.effective_weight, 0.0);
        assert_eq!(result.total, 0.0);
    }

    #[test]
    fn test_weight_override_replaces_scaled_weight() {
        let resolver = AssignmentResolver::new();
        let templates = vec![template("T1", "Ventas", ScopeType::Sector, "S1", 40.0)];
        let result = resolver.resolve(
            &employee(),
            2025,
            vec![participation("S1", 50.0)],
            &templates,
            &[ov("T1", false, Some(35.0))],
        );
        let row = &result.items[0];
        assert!(row.overridden);
        assert_eq!(row.scaled_weight, 20.0);
        assert_eq!(row.effective_weight, 35.0);
    }

    #[test]
    fn test_inactive_and_other_year_templates_skipped() {
        let resolver = AssignmentResolver::new();
        let mut inactive = template("T1", "Inactivo", ScopeType::Area, "A1", 10.0);
        inactive.active = false;
        let mut old = template("T2", "Viejo", ScopeType::Area, "A1", 10.0);
        old.year = 2024;
        let result = resolver.resolve(&employee(), 2025, vec![], &[inactive, old], &[]);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_rows_sorted_by_name_and_total_order_independent() {
        let resolver = AssignmentResolver::new();
        let mut templates = vec![
            template("T1", "zeta", ScopeType::Area, "A1", 10.0),
            template("T2", "Ámbito", ScopeType::Area, "A1", 20.0),
            template("T3", "beta", ScopeType::Sector, "S1", 30.0),
        ];
        let first = resolver.resolve(&employee(), 2025, vec![], &templates, &[]);
        templates.reverse();
        let second = resolver.resolve(&employee(), 2025, vec![], &templates, &[]);

        let names: Vec<_> = first.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ámbito", "beta", "zeta"]);
        assert_eq!(first.total, second.total);
        assert_eq!(first.total, first.items.iter().map(|r| r.effective_weight).sum::<f64>());
        assert_eq!(first.total, 60.0);
    }
}
