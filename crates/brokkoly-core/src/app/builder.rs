//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! 登録済みの `TaskRegistry` と `ServerConfig` から HTTP サーバーを組み立てます。
//! 起動時検証（Fail-fast）で、期待した task が揃っていなければ起動しません。

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use super::http::{AppState, router};
use super::producer::Producer;
use super::resources::StaticResources;
use crate::config::ServerConfig;
use crate::typed::TaskRegistry;

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(registry)
///     .config(config)
///     .expect_tasks(&["echo"])
///     .build()?;
/// app.serve().await?;
/// ```
pub struct AppBuilder {
    registry: TaskRegistry,
    config: ServerConfig,
    expected_tasks: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing tasks: {0:?}. These tasks were expected but not registered.")]
    MissingTasks(Vec<String>),
}

impl AppBuilder {
    pub fn new(registry: TaskRegistry) -> Self {
        Self {
            registry,
            config: ServerConfig::default(),
            expected_tasks: None,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// 起動時に登録済みであるべき task 名
    pub fn expect_tasks(mut self, names: &[&str]) -> Self {
        self.expected_tasks = Some(names.iter().map(|name| name.to_string()).collect());
        self
    }

    /// # 検証
    /// - expect_tasks() で設定された task が全て登録されているかチェック
    /// - 不足があれば BuildError::MissingTasks を返す
    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected_tasks) = &self.expected_tasks {
            let registered = self.registry.registered_tasks();
            let missing: Vec<String> = expected_tasks
                .iter()
                .filter(|x| !registered.contains(x))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingTasks(missing));
            }
        }

        let resources = match &self.config.static_dir {
            Some(dir) => StaticResources::with_dir(dir.clone()),
            None => StaticResources::embedded(),
        };
        Ok(App {
            producer: Arc::new(Producer::new(Arc::new(self.registry))),
            resources: Arc::new(resources),
            config: self.config,
        })
    }
}

/// 構築済みのアプリケーション。レジストリは以後読み取り専用。
pub struct App {
    producer: Arc<Producer>,
    resources: Arc<StaticResources>,
    config: ServerConfig,
}

impl App {
    pub fn registry(&self) -> &TaskRegistry {
        self.producer.registry()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        router(AppState {
            producer: self.producer.clone(),
            resources: self.resources.clone(),
        })
    }

    /// Bind `config.bind` and serve until the listener fails.
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind).await?;
        info!(addr = %listener.local_addr()?, queues = ?self.registry().queue_names(), "listening");
        axum::serve(listener, self.router()).await
    }
}
