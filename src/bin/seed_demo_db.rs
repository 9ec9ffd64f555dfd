// ==========================================
// 绩效评分引擎 - 演示数据库初始化
// ==========================================
// 用法: seed_demo_db [db_path] [year]
// 已存在的数据库先备份再重建
// ==========================================

use chrono::{Datelike, Local};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use performance_engine::app::get_default_db_path;
use performance_engine::db::{init_schema, open_sqlite_connection};
use performance_engine::domain::bonus::{BonoConfig, BonoOverride, PayoutScale};
use performance_engine::domain::employee::{
    Employee, EmployeeObjectiveOverride, EmployeeSectorParticipation,
};
use performance_engine::domain::goal::Goal;
use performance_engine::domain::template::ObjectiveTemplate;
use performance_engine::domain::types::{
    AccumulationMode, ComparisonOperator, OverrideScope, ScaleType, ScopeType, TemplateKind,
    TrackingMethod,
};
use performance_engine::repository::{
    BonoConfigRepository, EmployeeRepository, OverrideRepository, ParticipationRepository,
    TemplateRepository,
};

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    let year = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or_else(|| Local::now().year());

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    seed(conn.clone(), year)?;
    print_quick_counts(conn)?;

    eprintln!("Seeded {} for year {}", db_path, year);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed(conn: Arc<Mutex<rusqlite::Connection>>, year: i32) -> Result<(), Box<dyn Error>> {
    let employees = EmployeeRepository::new(conn.clone());
    let templates = TemplateRepository::new(conn.clone());
    let participations = ParticipationRepository::new(conn.clone());
    let overrides = OverrideRepository::new(conn.clone());
    let bono = BonoConfigRepository::new(conn);

    let staff = [
        ("E001", "Ana Pérez", "COM", "VENTAS", 3000.0),
        ("E002", "Luis Álvarez", "COM", "MARKETING", 2800.0),
        ("E003", "Marta Núñez", "OPS", "LOGISTICA", 2500.0),
    ];
    for (id, name, area, sector, salary) in staff {
        employees.upsert(&Employee {
            employee_id: id.to_string(),
            full_name: name.to_string(),
            area_id: area.to_string(),
            sector_id: sector.to_string(),
            base_salary: salary,
            active: true,
        })?;
    }

    let defs = [
        ("T-COM-1", ScopeType::Area, "COM", TemplateKind::Objective, "Crecimiento comercial", 40.0),
        ("T-VEN-1", ScopeType::Sector, "VENTAS", TemplateKind::Objective, "Cuota de ventas", 30.0),
        ("T-MKT-1", ScopeType::Sector, "MARKETING", TemplateKind::Objective, "Leads calificados", 30.0),
        ("T-OPS-1", ScopeType::Area, "OPS", TemplateKind::Objective, "Entregas a tiempo", 60.0),
        ("T-APT-1", ScopeType::Area, "COM", TemplateKind::Aptitude, "Trabajo en equipo", 30.0),
    ];
    for (id, scope_type, scope_id, kind, name, weight) in defs {
        templates.upsert(&ObjectiveTemplate {
            template_id: id.to_string(),
            year,
            scope_type,
            scope_id: scope_id.to_string(),
            kind,
            process: None,
            name: name.to_string(),
            description: None,
            kpi: None,
            target: None,
            tracking: TrackingMethod::Quarterly,
            base_weight: weight,
            active: true,
        })?;
    }

    let goals = [
        ("G-VEN-1", "T-VEN-1", "Ventas acumuladas", 1200.0, ComparisonOperator::Gte, 70.0, AccumulationMode::Cumulative),
        ("G-VEN-2", "T-VEN-1", "Devoluciones", 5.0, ComparisonOperator::Lte, 30.0, AccumulationMode::Period),
        ("G-OPS-1", "T-OPS-1", "Entregas a tiempo %", 95.0, ComparisonOperator::Gte, 100.0, AccumulationMode::Period),
    ];
    for (seq, (id, template_id, name, expected, operator, weight, accumulation)) in
        goals.into_iter().enumerate()
    {
        templates.upsert_goal(
            &Goal {
                goal_id: id.to_string(),
                template_id: template_id.to_string(),
                name: name.to_string(),
                expected,
                operator,
                weight,
                accumulation,
                allow_exceed: false,
            },
            seq as i32,
        )?;
    }

    // E002 同时参与两个部门
    for (sector, pct) in [("MARKETING", 60.0), ("VENTAS", 40.0)] {
        participations.upsert(&EmployeeSectorParticipation {
            employee_id: "E002".to_string(),
            sector_id: sector.to_string(),
            year,
            participation_pct: pct,
        })?;
    }

    overrides.upsert(&EmployeeObjectiveOverride {
        employee_id: "E001".to_string(),
        template_id: "T-APT-1".to_string(),
        year,
        excluded: false,
        weight_override: Some(20.0),
        note: Some("Ajuste acordado con RRHH".to_string()),
    })?;

    bono.upsert(&BonoConfig {
        year,
        target_ratio: 1.0,
        scale: PayoutScale {
            scale_type: ScaleType::Lineal,
            min_pct: 50.0,
            max_pct: 100.0,
            score_threshold: 60.0,
        },
        overrides: vec![BonoOverride {
            scope: OverrideScope::Area,
            target_id: "OPS".to_string(),
            target_ratio: Some(0.8),
            scale: None,
        }],
    })?;

    Ok(())
}

fn print_quick_counts(conn: Arc<Mutex<rusqlite::Connection>>) -> Result<(), Box<dyn Error>> {
    let conn = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
    for table in [
        "employee",
        "objective_template",
        "template_goal",
        "employee_sector_participation",
        "employee_objective_override",
        "bono_config",
    ] {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        eprintln!("{:<32} {}", table, count);
    }
    Ok(())
}
