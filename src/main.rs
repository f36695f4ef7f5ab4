// ==========================================
// 家禽批次管理系统 - 命令行入口
// ==========================================
// 用法:
//   poultry-batch-stats [--db <path>] [--json-log] <command> [args]
//
// 命令:
//   stats <batch_id>        计算统计快照（不回写）
//   recompute <batch_id>    重算并回写批次派生字段
//   reprocess-all           全量重算所有批次
//   overview                驾驶舱总览
//   history <batch_id> [n]  重算历史（默认 20 条）
//   config                  当前全局配置快照
//
// 结果以 JSON 输出到 stdout, 日志输出到 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use serde::Serialize;

use poultry_batch_stats::app::{get_default_db_path, AppState};
use poultry_batch_stats::{logging, RecalcTrigger, APP_NAME, VERSION};

const USAGE: &str = "usage: poultry-batch-stats [--db <path>] [--json-log] <stats|recompute|reprocess-all|overview|history|config> [args]";

#[tokio::main]
async fn main() -> Result<()> {
    let mut db_path: Option<String> = None;
    let mut json_log = false;
    let mut positional: Vec<String> = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                db_path = Some(args.next().ok_or_else(|| anyhow!("--db 缺少路径参数"))?);
            }
            "--json-log" => json_log = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => positional.push(arg),
        }
    }

    if json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("{} v{}", APP_NAME, VERSION);

    let db_path = db_path.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    let Some(command) = positional.first().map(|s| s.as_str()) else {
        bail!("{}", USAGE);
    };

    match command {
        "stats" => {
            let batch_id = required_arg(&positional, 1, "batch_id")?;
            let snapshot = state
                .batch_stats_api
                .get_statistics(batch_id, Utc::now())
                .await
                .with_context(|| format!("计算批次统计失败: {}", batch_id))?;
            print_json(&snapshot)
        }
        "recompute" => {
            let batch_id = required_arg(&positional, 1, "batch_id")?;
            let snapshot = state
                .batch_stats_api
                .recompute_batch(batch_id, RecalcTrigger::ManualRecompute)
                .await
                .with_context(|| format!("重算批次失败: {}", batch_id))?;
            print_json(&snapshot)
        }
        "reprocess-all" => {
            let summary = state
                .batch_stats_api
                .reprocess_all(RecalcTrigger::ReprocessAll)
                .await
                .context("全量重算失败")?;
            print_json(&summary)
        }
        "overview" => {
            let overview = state
                .dashboard_api
                .get_overview(Utc::now())
                .await
                .context("驾驶舱总览失败")?;
            print_json(&overview)
        }
        "history" => {
            let batch_id = required_arg(&positional, 1, "batch_id")?;
            let limit = match positional.get(2) {
                Some(raw) => raw
                    .parse::<i32>()
                    .with_context(|| format!("无效的条数: {}", raw))?,
                None => 20,
            };
            let logs = state
                .batch_stats_api
                .list_recalc_history(batch_id, limit)
                .with_context(|| format!("查询重算历史失败: {}", batch_id))?;
            print_json(&logs)
        }
        "config" => {
            let snapshot = state
                .config_manager
                .get_config_snapshot()
                .map_err(|e| anyhow!("读取配置失败: {}", e))?;
            let value: serde_json::Value =
                serde_json::from_str(&snapshot).context("配置快照解析失败")?;
            print_json(&value)
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }
}

fn required_arg<'a>(positional: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    positional
        .get(index)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("缺少参数 <{}>\n{}", name, USAGE))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("JSON 序列化失败")?;
    println!("{}", out);
    Ok(())
}
