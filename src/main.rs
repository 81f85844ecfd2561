//! # Egg Dashboard 主程序
//!
//! 鸡蛋分拣看板服务：加载配置、连接存储、启动 HTTP 服务

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use egg_dashboard::{
    config::ConfigManager,
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
    management::{DashboardServer, EggService},
    statistics::build_strategy,
    store::build_store,
};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "egg-dashboard", version, about = "Egg sorting dashboard server")]
struct Cli {
    /// 配置文件路径（默认 config/config.{RUST_ENV}.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别（`RUST_LOG` 优先）
    #[arg(long)]
    log_level: Option<String>,

    /// 覆盖监听端口
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    logging::init_logging(cli.log_level.as_deref());

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动"
    );

    if let Err(e) = run(cli).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:#}")
        );
        return Err(e);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let manager = ConfigManager::new(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("配置加载失败: {e}"))?;
    let mut config = manager.into_config();
    if let Some(port) = cli.port {
        config.server.port = port;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("配置校验失败: {e}"))?;
    }

    let store = build_store(&config.store)
        .await
        .map_err(|e| anyhow::anyhow!("存储初始化失败: {e}"))?;
    let counters = build_strategy(config.store.counter_strategy, Arc::clone(&store));
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "counter_strategy",
        &format!("计数策略: {}", counters.kind()),
        backend = store.backend_name()
    );

    let service = Arc::new(EggService::new(store, counters, config.report.clone()));
    DashboardServer::new(config.server.clone(), service)
        .serve(shutdown_signal())
        .await?;
    Ok(())
}

/// 等待 Ctrl+C（Unix 下同时监听 SIGTERM）
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            lerror!(
                "system",
                LogStage::Shutdown,
                LogComponent::Main,
                "signal_error",
                &format!("无法监听 Ctrl+C: {e}")
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "shutdown_signal",
        "收到停止信号，正在关闭"
    );
}
