//! 应用生命周期 - 编排层
//!
//! ## 职责
//!
//! 1. **初始化**：打印启动信息、创建打印引擎并预热、创建临时文件登记表
//! 2. **运行**：启动后台清理任务，绑定端口提供 HTTP 服务
//! 3. **退出**：收到 Ctrl+C 后优雅停止，最后清理所有临时文件
//!
//! 唯一持有浏览器（通过 `ChromePrintEngine`）和登记表的模块

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::infrastructure::{ChromePrintEngine, TempFileRegistry};
use crate::utils::logging::{log_shutdown, log_startup};
use crate::workflow::GenerateFlow;

/// 应用主结构
pub struct App {
    config: Config,
    engine: Arc<ChromePrintEngine>,
    registry: Arc<TempFileRegistry>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        std::fs::create_dir_all(config.temp_dir()).with_context(|| {
            format!("创建临时目录失败: {}", config.temp_dir().display())
        })?;

        let engine = Arc::new(ChromePrintEngine::new(&config));
        // 浏览器启动失败不阻止服务启动，PDF 请求时会重试
        engine.warmup().await;

        let registry = Arc::new(TempFileRegistry::new(config.cleanup_grace()));

        Ok(Self {
            config,
            engine,
            registry,
        })
    }

    /// 运行 HTTP 服务直到收到退出信号
    pub async fn run(&self) -> Result<()> {
        let sweeper = self.registry.spawn_sweeper(self.config.cleanup_interval());

        let flow = Arc::new(GenerateFlow::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.registry),
            &self.config,
        ));
        let router = create_router(AppState::new(flow, &self.config));

        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("绑定地址失败: {}", address))?;
        info!("✅ 服务已启动: http://{}", address);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        sweeper.abort();
        log_shutdown(self.registry.pending_count());
        self.registry.cleanup_all();
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ 无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，正在停止...");
}
