// ==========================================
// AssignmentApi 集成测试
// ==========================================
// 测试范围:
// 1. 默认主部门参与（无参与记录）
// 2. 部门参与比例缩放、覆写、排除
// 3. 名称排序（忽略大小写/重音）
// 4. 员工不存在
// 5. 按角色查询需要 assignment:read
// ==========================================


use performance_engine::api::ApiError;
use performance_engine::domain::types::ScopeType;
use test_helpers::TestEnv;

#[tokio::test]
async fn test_resolve_默认主部门参与() {
    let env = TestEnv::with_default_scorer().expect("无法创建测试环境");
    env.seed_employee("E001", "A1", "S1", 1000.0);
    env.seed_template("T1", 2025, ScopeType::Area, "A1", "Zeta", 40.0);
    env.seed_template("T2", 2025, ScopeType::Sector, "S1", "alfa", 30.0);
    env.seed_template("T3", 2025, ScopeType::Sector, "S2", "Beta", 50.0);
    env.seed_template("T4", 2025, ScopeType::Area, "A2", "Omega", 10.0);
    env.seed_template("T5", 2024, ScopeType::Area, "A1", "Anterior", 10.0);

    let result = env
        .state
        .assignment_api
        .resolve("E001", 2025)
        .await
        .expect("分配失败");

    assert!(result.synthetic_participation);
    let ids: Vec<&str> = result.items.iter().map(|r| r.template_id.as_str()).collect();
    assert_eq!(ids, vec!["T2", "T1"]);
    assert_eq!(result.items[0].participation_pct, Some(100.0));
    assert_eq!(result.items[0].effective_weight, 30.0);
    assert_eq!(result.items[1].participation_pct, None);
    assert_eq!(result.total, 70.0);
    assert_eq!(result.employee.employee_id, "E001");
}

#[tokio::test]
async fn test_resolve_参与比例缩放与覆写() {
    let env = TestEnv::with_default_scorer().expect("无法创建测试环境");
    env.seed_employee("E002", "A1", "S1", 1000.0);
    env.seed_template("T1", 2025, ScopeType::Area, "A1", "Zeta", 40.0);
    env.seed_template("T2", 2025, ScopeType::Sector, "S1", "alfa", 30.0);
    env.seed_template("T3", 2025, ScopeType::Sector, "S2", "Beta", 50.0);
    env.seed_participation("E002", "S1", 2025, 60.0);
    env.seed_participation("E002", "S2", 2025, 40.0);
    env.seed_override("E002", "T1", 2025, false, Some(25.0));
    env.seed_override("E002", "T3", 2025, true, Some(99.0));
    // 其他年度的覆写不生效
    env.seed_override("E002", "T2", 2024, true, None);

    let result = env
        .state
        .assignment_api
        .resolve("E002", 2025)
        .await
        .expect("分配失败");

    assert!(!result.synthetic_participation);
    let ids: Vec<&str> = result.items.iter().map(|r| r.template_id.as_str()).collect();
    assert_eq!(ids, vec!["T2", "T3", "T1"]);

    let t2 = &result.items[0];
    assert_eq!(t2.scaled_weight, 18.0);
    assert_eq!(t2.effective_weight, 18.0);
    assert!(!t2.overridden && !t2.excluded);

    let t3 = &result.items[1];
    assert_eq!(t3.scaled_weight, 20.0);
    assert_eq!(t3.effective_weight, 0.0);
    assert!(t3.excluded);
    assert!(!t3.overridden);

    let t1 = &result.items[2];
    assert_eq!(t1.effective_weight, 25.0);
    assert!(t1.overridden);

    assert_eq!(result.total, 43.0);
}

#[tokio::test]
async fn test_resolve_主部门无参与记录时不分配() {
    let env = TestEnv::with_default_scorer().expect("无法创建测试环境");
    env.seed_employee("E003", "A1", "S1", 1000.0);
    env.seed_template("T2", 2025, ScopeType::Sector, "S1", "Propio", 30.0);
    env.seed_template("T3", 2025, ScopeType::Sector, "S2", "Prestado", 50.0);
    env.seed_participation("E003", "S2", 2025, 60.0);

    let result = env
        .state
        .assignment_api
        .resolve("E003", 2025)
        .await
        .expect("分配失败");

    assert!(!result.synthetic_participation);
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].template_id, "T3");
    assert_eq!(result.total, 30.0);
}

#[tokio::test]
async fn test_resolve_名称排序忽略重音() {
    let env = TestEnv::with_default_scorer().expect("无法创建测试环境");
    env.seed_employee("E001", "A1", "S1", 1000.0);
    env.seed_template("T1", 2025, ScopeType::Area, "A1", "Ético", 10.0);
    env.seed_template("T2", 2025, ScopeType::Area, "A1", "etapa", 10.0);
    env.seed_template("T3", 2025, ScopeType::Area, "A1", "Estrategia", 10.0);

    let result = env
        .state
        .assignment_api
        .resolve("E001", 2025)
        .await
        .expect("分配失败");

    let names: Vec<&str> = result.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Estrategia", "etapa", "Ético"]);
}

#[tokio::test]
async fn test_resolve_员工不存在() {
    let env = TestEnv::with_default_scorer().expect("无法创建测试环境");

    let err = env
        .state
        .assignment_api
        .resolve("E404", 2025)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = env.state.assignment_api.resolve("  ", 2025).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_resolve_as_按角色校验() {
    let env = TestEnv::with_default_scorer().expect("无法创建测试环境");
    env.seed_employee("E001", "A1", "S1", 1000.0);
    env.seed_template("T1", 2025, ScopeType::Area, "A1", "Ventas", 40.0);
    let api = &env.state.assignment_api;

    let err = api
        .resolve_as("E001", 2025, &["employee".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));

    let err = api.resolve_as("E001", 2025, &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));

    for role in ["manager", "hr", "admin"] {
        let result = api
            .resolve_as("E001", 2025, &[role.to_string()])
            .await
            .expect("分配失败");
        assert_eq!(result.total, 40.0, "{role}");
    }
}
