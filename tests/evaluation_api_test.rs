// ==========================================
// EvaluationApi 集成测试
// ==========================================
// 测试范围:
// 1. 草稿幂等创建与输入校验
// 2. 结果录入限制
// 3. 累计指标跨期间评分
// 4. 流程转换持久化 / 守卫失败不写库
// 5. 流程策略配置（含替换配置读取器）
// 6. 期间年度与模板年度一致
// ==========================================


use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use performance_engine::api::{ApiError, EvaluationApi};
use performance_engine::config::{config_keys, ConfigResult, EngineConfigReader};
use performance_engine::domain::period::FiscalPeriodKey;
use performance_engine::domain::types::{
    AccumulationMode, ComparisonOperator, EvaluationState, ScopeType, TimelineAction,
};
use performance_engine::engine::capability::Actor;
use performance_engine::engine::workflow::{Transition, WorkflowPolicy};
use test_helpers::TestEnv;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn results(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// 员工 E001 + 模板 T1（G1 累计 >= 50, G2 本期 >= 10）
fn setup() -> TestEnv {
    let env = TestEnv::with_default_scorer().expect("无法创建测试环境");
    env.seed_employee("E001", "A1", "S1", 1000.0);
    env.seed_template("T1", 2025, ScopeType::Area, "A1", "Ventas", 50.0);
    env.seed_goal("G1", "T1", 50.0, ComparisonOperator::Gte, 1.0, AccumulationMode::Cumulative, 0);
    env.seed_goal("G2", "T1", 10.0, ComparisonOperator::Gte, 1.0, AccumulationMode::Period, 1);
    env
}

// ==========================================
// 草稿创建
// ==========================================

#[test]
fn test_ensure_draft_幂等() {
    let env = setup();
    let api = &env.state.evaluation_api;

    let (first, created) = api.ensure_draft("E001", "T1", "2025Q1").expect("创建失败");
    assert!(created);
    assert_eq!(first.state, EvaluationState::ManagerDraft);
    assert_eq!(first.year, 2025);
    assert_eq!(first.period_key, "2025Q1");

    // 分隔符/大小写不同的同一期间返回同一条记录
    let (second, created_again) = api.ensure_draft("E001", "T1", "2025-q1").expect("查询失败");
    assert!(!created_again);
    assert_eq!(second.evaluation_id, first.evaluation_id);

    assert_eq!(env.query_i64("SELECT COUNT(*) FROM evaluation"), 1);
}

#[test]
fn test_ensure_draft_输入校验() {
    let env = setup();
    let api = &env.state.evaluation_api;

    let err = api.ensure_draft("E001", "T1", "2025Q4").unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    let err = api.ensure_draft("E404", "T1", "2025Q1").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = api.ensure_draft("E001", "T404", "2025Q1").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    assert_eq!(env.query_i64("SELECT COUNT(*) FROM evaluation"), 0);
}

#[test]
fn test_ensure_draft_期间年度须与模板一致() {
    let env = setup();
    let api = &env.state.evaluation_api;

    for raw in ["2024FINAL", "2026Q1", "2024M10"] {
        let err = api.ensure_draft("E001", "T1", raw).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)), "{raw}");
    }
    assert_eq!(env.query_i64("SELECT COUNT(*) FROM evaluation"), 0);

    api.ensure_draft("E001", "T1", "2025FINAL").expect("同年度应允许");
}

#[test]
fn test_prior_accumulated_忽略其他年度记录() {
    let env = setup();
    let api = &env.state.evaluation_api;

    let (q1, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();
    api.record_results(&q1.evaluation_id, results(&[("G1", 4.0)]))
        .unwrap();

    // 绕过 API 直接写入一条 2024 年的历史记录
    let stale_key = FiscalPeriodKey::parse("2024FINAL").unwrap();
    let (mut stale, _) = env
        .state
        .evaluation_repo
        .ensure_draft("E001", "T1", &stale_key)
        .unwrap();
    stale.goal_results.insert("G1".to_string(), 100.0);
    env.state.evaluation_repo.update(&stale).unwrap();

    let prior = api.prior_accumulated("T1", "2025Q2", "E001").unwrap();
    assert_eq!(prior.get("G1"), Some(&4.0));
    let prior = api.prior_accumulated("T1", "2025Q1", "E001").unwrap();
    assert_eq!(prior.get("G1").copied().unwrap_or(0.0), 0.0);

    assert!(env
        .state
        .evaluation_repo
        .list_employee_ids_by_year(2024)
        .unwrap()
        .is_empty());
}

// ==========================================
// 结果录入
// ==========================================

#[test]
fn test_record_results_校验指标归属() {
    let env = setup();
    let api = &env.state.evaluation_api;
    let (eval, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();

    let err = api
        .record_results(&eval.evaluation_id, results(&[("G9", 1.0)]))
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    let err = api
        .record_results(&eval.evaluation_id, results(&[("G1", f64::NAN)]))
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    let saved = api
        .record_results(&eval.evaluation_id, results(&[("G1", 10.0)]))
        .expect("录入失败");
    assert_eq!(saved.goal_results.get("G1"), Some(&10.0));
}

#[tokio::test]
async fn test_record_results_仅草稿可录入() {
    let env = setup();
    let api = &env.state.evaluation_api;
    let (eval, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();

    api.transition(
        &eval.evaluation_id,
        Transition::SubmitToEmployee,
        &Actor::manager("U-MGR"),
        None,
    )
    .await
    .expect("提交失败");

    let err = api
        .record_results(&eval.evaluation_id, results(&[("G1", 10.0)]))
        .unwrap_err();
    match err {
        ApiError::InvalidTransition { from, .. } => {
            assert_eq!(from, EvaluationState::PendingEmployee)
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_score_period_提交后快照不变() {
    let env = setup();
    let api = &env.state.evaluation_api;
    let (eval, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();
    let id = eval.evaluation_id.as_str();

    api.record_results(id, results(&[("G1", 10.0), ("G2", 10.0)]))
        .unwrap();
    api.score_period(id).expect("草稿评分失败");

    let hr = Actor::hr("U-HR");
    api.transition(id, Transition::SubmitToEmployee, &Actor::manager("U-MGR"), None)
        .await
        .unwrap();
    api.transition(id, Transition::SubmitToHr, &Actor::manager("U-MGR"), None)
        .await
        .unwrap();
    api.transition(id, Transition::Close, &hr, None).await.unwrap();
    let closed = api.get(id).unwrap();

    let err = api.score_period(id).unwrap_err();
    match err {
        ApiError::InvalidTransition { action, from } => {
            assert_eq!(action, "scorePeriod");
            assert_eq!(from, EvaluationState::Closed);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(api.get(id).unwrap(), closed);
}

// ==========================================
// 期间评分
// ==========================================

#[test]
fn test_score_period_累计指标跨期间() {
    let env = setup();
    let api = &env.state.evaluation_api;

    let (q1, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();
    api.record_results(&q1.evaluation_id, results(&[("G1", 10.0), ("G2", 10.0)]))
        .unwrap();
    let (q2, _) = api.ensure_draft("E001", "T1", "2025Q2").unwrap();
    api.record_results(&q2.evaluation_id, results(&[("G1", 30.0), ("G2", 5.0)]))
        .unwrap();
    // 之后期间的值不计入
    let (q3, _) = api.ensure_draft("E001", "T1", "2025Q3").unwrap();
    api.record_results(&q3.evaluation_id, results(&[("G1", 1000.0)]))
        .unwrap();

    let prior = api.prior_accumulated("T1", "2025Q2", "E001").unwrap();
    assert_eq!(prior.get("G1"), Some(&10.0));

    let q1_score = api.score_period(&q1.evaluation_id).expect("评分失败");
    assert!(approx(q1_score.objective_score.unwrap(), 60.0));

    let q2_score = api.score_period(&q2.evaluation_id).expect("评分失败");
    let g1 = &q2_score.processed_goals[0];
    assert_eq!(g1.goal_id, "G1");
    assert_eq!(g1.cumulative_total, Some(40.0));
    assert!(!g1.cumple);
    assert!(approx(g1.achievement_pct, 80.0));
    let g2 = &q2_score.processed_goals[1];
    assert_eq!(g2.cumulative_total, None);
    assert!(approx(g2.achievement_pct, 50.0));
    assert!(approx(q2_score.objective_score.unwrap(), 65.0));

    // 评分快照已保存
    let stored = api.get(&q2.evaluation_id).unwrap().score.expect("评分快照缺失");
    assert_eq!(stored.processed_goals.len(), 2);
    assert!(approx(stored.objective_score.unwrap(), 65.0));
}

#[test]
fn test_prior_accumulated_按财年月份排序() {
    let env = setup();
    let api = &env.state.evaluation_api;

    // 10 月为财年第 2 个月，早于 Q1（第 3 个月）
    let (m10, _) = api.ensure_draft("E001", "T1", "2025M10").unwrap();
    api.record_results(&m10.evaluation_id, results(&[("G1", 5.0)]))
        .unwrap();
    // 1 月为财年第 5 个月，晚于 Q1
    let (m1, _) = api.ensure_draft("E001", "T1", "2025M1").unwrap();
    api.record_results(&m1.evaluation_id, results(&[("G1", 7.0)]))
        .unwrap();

    let prior = api.prior_accumulated("T1", "2025Q1", "E001").unwrap();
    assert_eq!(prior.get("G1"), Some(&5.0));

    let err = api.prior_accumulated("T1", "bogus", "E001").unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_score_period_无指标() {
    let env = setup();
    env.seed_template("T2", 2025, ScopeType::Area, "A1", "Vacio", 10.0);
    let api = &env.state.evaluation_api;

    let (eval, _) = api.ensure_draft("E001", "T2", "2025Q1").unwrap();
    let score = api.score_period(&eval.evaluation_id).unwrap();
    assert!(score.processed_goals.is_empty());
    assert_eq!(score.objective_score, None);
}

// ==========================================
// 流程转换
// ==========================================

#[tokio::test]
async fn test_transition_完整流程持久化() {
    let env = setup();
    let api = &env.state.evaluation_api;
    let (eval, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();
    let id = eval.evaluation_id.as_str();

    let manager = Actor::manager("U-MGR");
    let subject = Actor::employee("U-E001", "E001");
    let hr = Actor::hr("U-HR");

    let e = api
        .transition(id, Transition::SubmitToEmployee, &manager, Some("  Buen trabajo ".to_string())).await
        .unwrap();
    assert_eq!(e.state, EvaluationState::PendingEmployee);
    assert_eq!(e.comments.manager.as_deref(), Some("Buen trabajo"));

    // 默认策略: 员工确认不改变状态
    let e = api
        .transition(id, Transition::EmployeeAck, &subject, Some("De acuerdo".to_string())).await
        .unwrap();
    assert_eq!(e.state, EvaluationState::PendingEmployee);
    assert_eq!(e.comments.employee.as_deref(), Some("De acuerdo"));

    let e = api.transition(id, Transition::SubmitToHr, &manager, None).await.unwrap();
    assert_eq!(e.state, EvaluationState::PendingHr);
    let e = api.transition(id, Transition::Close, &hr, None).await.unwrap();
    assert_eq!(e.state, EvaluationState::Closed);
    let e = api
        .transition(id, Transition::Reopen, &hr, Some("Corrección".to_string())).await
        .unwrap();
    assert_eq!(e.state, EvaluationState::PendingHr);

    let timeline = api.timeline(id).unwrap();
    let actions: Vec<TimelineAction> = timeline.iter().map(|t| t.action).collect();
    assert_eq!(
        actions,
        vec![
            TimelineAction::Sent,
            TimelineAction::Feedback,
            TimelineAction::ForwardedToHr,
            TimelineAction::Closed,
            TimelineAction::Reopened,
        ]
    );
    assert_eq!(timeline[0].actor, "U-MGR");
    assert_eq!(timeline[4].note.as_deref(), Some("Corrección"));

    let stored = api.get(id).unwrap();
    assert_eq!(stored.state, EvaluationState::PendingHr);
    assert_eq!(stored.comments.hr.as_deref(), Some("Corrección"));
}

#[tokio::test]
async fn test_transition_守卫失败不写库() {
    let env = setup();
    let api = &env.state.evaluation_api;
    let (eval, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();
    let id = eval.evaluation_id.as_str();
    let before = api.get(id).unwrap();

    // 状态不符
    let err = api
        .transition(id, Transition::Close, &Actor::hr("U-HR"), None).await
        .unwrap_err();
    match err {
        ApiError::InvalidTransition { action, from } => {
            assert_eq!(action, "close");
            assert_eq!(from, EvaluationState::ManagerDraft);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // 权限不足
    let err = api
        .transition(id, Transition::SubmitToEmployee, &Actor::employee("U-E001", "E001"), None).await
        .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));

    assert_eq!(api.get(id).unwrap(), before);

    // 异议必须填写意见
    api.transition(id, Transition::SubmitToEmployee, &Actor::manager("U-MGR"), None).await
        .unwrap();
    let after_submit = api.get(id).unwrap();
    let err = api
        .transition(
            id,
            Transition::EmployeeContest,
            &Actor::employee("U-E001", "E001"),
            Some("   ".to_string()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 其他员工不能代为确认
    let err = api
        .transition(id, Transition::EmployeeAck, &Actor::employee("U-E002", "E002"), None).await
        .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));

    assert_eq!(api.get(id).unwrap(), after_submit);
}

#[tokio::test]
async fn test_transition_员工确认转交人事策略() {
    let env = setup();
    env.state
        .config_manager
        .set_config_value(config_keys::WORKFLOW_ACK_FORWARDS_TO_HR, "true")
        .unwrap();
    let api = &env.state.evaluation_api;
    let (eval, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();
    let id = eval.evaluation_id.as_str();

    api.transition(id, Transition::SubmitToEmployee, &Actor::manager("U-MGR"), None).await
        .unwrap();
    let e = api
        .transition(id, Transition::EmployeeAck, &Actor::employee("U-E001", "E001"), None).await
        .unwrap();
    assert_eq!(e.state, EvaluationState::PendingHr);
}

#[tokio::test]
async fn test_transition_as_按角色换算() {
    let env = setup();
    let api = &env.state.evaluation_api;
    let (eval, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();
    let id = eval.evaluation_id.as_str();

    let err = api
        .transition_as(id, "submitToEmployee", "U-EMP", Some("E001"), &["employee".to_string()], None).await
        .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));

    let e = api
        .transition_as(id, "submitToEmployee", "U-MGR", None, &["manager".to_string()], None).await
        .unwrap();
    assert_eq!(e.state, EvaluationState::PendingEmployee);

    let e = api
        .transition_as(
            id,
            "employeeContest",
            "U-EMP",
            Some("E001"),
            &["employee".to_string()],
            Some("No coincido".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(e.state, EvaluationState::PendingEmployee);

    let err = api
        .transition_as(id, "approve", "U-ADM", None, &["admin".to_string()], None).await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

/// 固定返回"确认即转人事"的配置读取器
struct ForwardingPolicyReader;

#[async_trait]
impl EngineConfigReader for ForwardingPolicyReader {
    async fn workflow_policy(&self) -> ConfigResult<WorkflowPolicy> {
        Ok(WorkflowPolicy {
            ack_forwards_to_hr: true,
        })
    }

    async fn bonus_amount_decimals(&self) -> ConfigResult<u32> {
        Ok(2)
    }
}

#[tokio::test]
async fn test_transition_使用替换的配置读取器() {
    let env = setup();
    // config_kv 保持默认（不转交），策略只来自替换的读取器
    let api = EvaluationApi::new(
        env.state.evaluation_repo.clone(),
        env.state.employee_repo.clone(),
        env.state.template_repo.clone(),
        Arc::new(ForwardingPolicyReader),
        env.state.capabilities.clone(),
    );
    let (eval, _) = api.ensure_draft("E001", "T1", "2025Q1").unwrap();
    let id = eval.evaluation_id.as_str();

    api.transition(id, Transition::SubmitToEmployee, &Actor::manager("U-MGR"), None)
        .await
        .unwrap();
    let e = api
        .transition(id, Transition::EmployeeAck, &Actor::employee("U-E001", "E001"), None)
        .await
        .unwrap();
    assert_eq!(e.state, EvaluationState::PendingHr);

    // 默认 ConfigManager 读取器下同一操作不改变状态
    let (other, _) = env.state.evaluation_api.ensure_draft("E001", "T1", "2025Q2").unwrap();
    let other_id = other.evaluation_id.as_str();
    env.state
        .evaluation_api
        .transition(other_id, Transition::SubmitToEmployee, &Actor::manager("U-MGR"), None)
        .await
        .unwrap();
    let e = env
        .state
        .evaluation_api
        .transition(other_id, Transition::EmployeeAck, &Actor::employee("U-E001", "E001"), None)
        .await
        .unwrap();
    assert_eq!(e.state, EvaluationState::PendingEmployee);
}
