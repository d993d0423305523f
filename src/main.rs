// ==========================================
// 产线产能模拟 - 命令行入口
// ==========================================
// 用法: line-capacity-sim <request.json> [db_path]
// 输出: 模拟结果 JSON (stdout), 日志 (stderr)
// ==========================================

use line_capacity_sim::app::{get_default_db_path, AppState};
use line_capacity_sim::domain::simulation::SimulationRequest;
use line_capacity_sim::logging;
use std::process::ExitCode;

const USAGE: &str = "用法: line-capacity-sim <request.json> [db_path]";

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "模拟失败");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let request_path = args.next().ok_or_else(|| anyhow::anyhow!(USAGE))?;
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", line_capacity_sim::APP_NAME, line_capacity_sim::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let raw = std::fs::read_to_string(&request_path)
        .map_err(|e| anyhow::anyhow!("无法读取请求文件 {}: {}", request_path, e))?;
    let request: SimulationRequest = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("请求 JSON 无法解析: {}", e))?;

    let state = AppState::new(db_path).await.map_err(anyhow::Error::msg)?;
    let outcome = state.simulation_api.simulate(&request)?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
