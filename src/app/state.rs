// ==========================================
// 绩效评分引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{AssignmentApi, BonusApi, EvaluationApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::capability::CapabilityTable;
use crate::engine::scoring::ScoreAggregator;
use crate::repository::{
    bono_repo::{BonoAnualRepository, BonoConfigRepository},
    employee_repo::EmployeeRepository,
    evaluation_repo::EvaluationRepository,
    participation_repo::{OverrideRepository, ParticipationRepository},
    template_repo::TemplateRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PERFORMANCE_ENGINE_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 目标分配API
    pub assignment_api: Arc<AssignmentApi>,

    /// 评估单API
    pub evaluation_api: Arc<EvaluationApi>,

    /// 年度奖金API
    pub bonus_api: Arc<BonusApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 角色能力表（启动时构建，只读）
    pub capabilities: Arc<CapabilityTable>,

    // 基础数据仓储（数据维护、命令行导入）
    pub employee_repo: Arc<EmployeeRepository>,
    pub template_repo: Arc<TemplateRepository>,
    pub participation_repo: Arc<ParticipationRepository>,
    pub override_repo: Arc<OverrideRepository>,
    pub evaluation_repo: Arc<EvaluationRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - scorer: 最终得分聚合服务
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接，拒绝高于当前版本的 schema，幂等建表
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String, scorer: Arc<dyn ScoreAggregator>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        match read_schema_version(&conn).map_err(|e| format!("读取schema版本失败: {}", e))? {
            Some(version) if version > CURRENT_SCHEMA_VERSION => {
                return Err(format!(
                    "数据库schema版本{}高于程序支持的版本{}",
                    version, CURRENT_SCHEMA_VERSION
                ));
            }
            version => tracing::debug!(?version, "schema版本检查通过"),
        }
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let employee_repo = Arc::new(EmployeeRepository::new(conn.clone()));
        let template_repo = Arc::new(TemplateRepository::new(conn.clone()));
        let participation_repo = Arc::new(ParticipationRepository::new(conn.clone()));
        let override_repo = Arc::new(OverrideRepository::new(conn.clone()));
        let evaluation_repo = Arc::new(EvaluationRepository::new(conn.clone()));
        let bono_config_repo = Arc::new(BonoConfigRepository::new(conn.clone()));
        let bono_anual_repo = Arc::new(BonoAnualRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let capabilities = Arc::new(CapabilityTable::standard());

        // ==========================================
        // 创建API实例
        // ==========================================
        let assignment_api = Arc::new(AssignmentApi::new(
            employee_repo.clone(),
            template_repo.clone(),
            participation_repo.clone(),
            override_repo.clone(),
            capabilities.clone(),
        ));

        let evaluation_api = Arc::new(EvaluationApi::new(
            evaluation_repo.clone(),
            employee_repo.clone(),
            template_repo.clone(),
            config_manager.clone(),
            capabilities.clone(),
        ));

        let bonus_api = Arc::new(BonusApi::new(
            bono_config_repo,
            bono_anual_repo,
            evaluation_repo.clone(),
            employee_repo.clone(),
            scorer,
            config_manager.clone(),
            capabilities.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            assignment_api,
            evaluation_api,
            bonus_api,
            config_manager,
            capabilities,
            employee_repo,
            template_repo,
            participation_repo,
            override_repo,
            evaluation_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./performance_engine.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("performance-engine");
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("performance_engine.db"),
            Err(e) => tracing::warn!("无法创建数据目录 {}: {}，使用当前目录", dir.display(), e),
        }
    }

    path.to_string_lossy().to_string()
}
