// ==========================================
// 绩效评分引擎 - 命令行主入口
// ==========================================
// 命令:
//   assignments <employee_id> <year>    输出年度目标分配 (JSON)
//   calc-bonus <year> <scores.json>     计算年度奖金
//   period-order <key>...               按财年顺序输出期间键
// ==========================================

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use performance_engine::app::{get_default_db_path, AppState};
use performance_engine::domain::FiscalPeriodKey;
use performance_engine::engine::scoring::StaticScoreAggregator;
use performance_engine::logging;

const USAGE: &str = "用法:
  performance-engine assignments <employee_id> <year>
  performance-engine calc-bonus <year> <scores.json>
  performance-engine period-order <key>...";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        bail!("缺少命令");
    };

    tracing::info!(
        version = performance_engine::VERSION,
        command = %command,
        "{}",
        performance_engine::APP_NAME
    );

    match command.as_str() {
        "assignments" => {
            let (employee_id, year) = match &args[1..] {
                [employee_id, year] => (employee_id.as_str(), parse_year(year)?),
                _ => bail!("参数错误\n{}", USAGE),
            };
            let state = open_state(Arc::new(StaticScoreAggregator::default()))?;
            let result = state.assignment_api.resolve(employee_id, year).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "calc-bonus" => {
            let (year, scores_path) = match &args[1..] {
                [year, path] => (parse_year(year)?, path.as_str()),
                _ => bail!("参数错误\n{}", USAGE),
            };
            let raw = std::fs::read_to_string(scores_path)
                .with_context(|| format!("无法读取得分文件: {}", scores_path))?;
            let scorer = StaticScoreAggregator::from_json(&raw)
                .with_context(|| format!("得分文件格式错误: {}", scores_path))?;

            let state = open_state(Arc::new(scorer))?;
            let summary = state.bonus_api.calculate_all(year).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "period-order" => {
            let mut keys = args[1..]
                .iter()
                .map(|raw| {
                    FiscalPeriodKey::parse(raw).with_context(|| format!("期间键非法: {}", raw))
                })
                .collect::<Result<Vec<_>>>()?;
            keys.sort_by(|a, b| a.fiscal_cmp(b));
            for key in keys {
                println!("{}", key);
            }
        }
        other => {
            eprintln!("{}", USAGE);
            bail!("未知命令: {}", other);
        }
    }

    Ok(())
}

fn parse_year(raw: &str) -> Result<i32> {
    raw.trim()
        .parse::<i32>()
        .with_context(|| format!("年度非法: {}", raw))
}

fn open_state(scorer: Arc<StaticScoreAggregator>) -> Result<AppState> {
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    AppState::new(db_path, scorer).map_err(anyhow::Error::msg)
}
