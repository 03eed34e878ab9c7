use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use brokkoly_core::app::AppBuilder;
use brokkoly_core::config::ServerConfig;
use brokkoly_core::domain::{ParamType, Payload, TaskError};
use brokkoly_core::impls::{InMemoryBroker, InMemoryConnector, MEMORY_SCHEME, Retention};
use brokkoly_core::typed::{Handler, Params, PreprocessError, Preprocessor, Task, TaskRegistry};
use clap::Parser;
use serde::Deserialize;
use tokio::time::{Duration, interval};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Enqueue tasks over HTTP.
#[derive(Debug, Parser)]
#[command(name = "brokkoly", version)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BROKKOLY_BIND", default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Broker location (only memory:// is built in)
    #[arg(long, env = "BROKKOLY_BROKER_URL", default_value = MEMORY_SCHEME)]
    broker_url: String,

    /// Directory with static assets served before the embedded ones
    #[arg(long, env = "BROKKOLY_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Log filter, e.g. "info" or "brokkoly_core=debug"
    #[arg(long, env = "BROKKOLY_LOG", default_value = "info")]
    log_level: String,

    /// How often the in-memory broker runs pending jobs, in milliseconds
    #[arg(long, env = "BROKKOLY_POLL_MS", default_value_t = 200)]
    poll_ms: u64,

    /// How long finished jobs stay queryable in the in-memory broker, in seconds
    #[arg(long, env = "BROKKOLY_RETAIN_SECS", default_value_t = 3600)]
    retain_secs: u64,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            broker_url: self.broker_url.clone(),
            static_dir: self.static_dir.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Echo {
    text: String,
}

impl Params for Echo {
    const PARAMS: &'static [(&'static str, ParamType)] = &[("text", ParamType::Str)];
}

impl Task for Echo {
    const NAME: &'static str = "echo";
}

struct EchoHandler;

#[async_trait]
impl Handler<Echo> for EchoHandler {
    async fn handle(&self, task: Echo) -> Result<(), TaskError> {
        info!(text = %task.text, "echo");
        Ok(())
    }
}

/// `text -> text + text`
struct TwoTimes;

impl Preprocessor for TwoTimes {
    type Input = Echo;
    const NAME: &'static str = "two_times";

    fn process(&self, input: Echo) -> Result<Payload, PreprocessError> {
        let mut out = Payload::new();
        out.insert("text".into(), input.text.repeat(2).into());
        Ok(out)
    }
}

/// Drain the in-memory broker on a fixed tick; stands in for a worker process.
async fn worker_loop(broker: Arc<InMemoryBroker>, every: Duration) {
    let mut tick = interval(every);
    loop {
        tick.tick().await;
        match broker.run_pending().await {
            Ok(0) => {}
            Ok(ran) => info!(ran, "ran pending jobs"),
            Err(e) => warn!(error = %e, "worker tick failed"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = args.server_config();
    let connector = Arc::new(InMemoryConnector::with_retention(Retention::keep_for(
        Duration::from_secs(args.retain_secs),
    )));
    let mut registry = TaskRegistry::new(connector.clone());

    let example = registry
        .register_queue("example", &config.broker_url)
        .with_context(|| format!("connect broker at {}", config.broker_url))?;
    registry
        .task(&example)
        .preprocessor(TwoTimes)
        .register::<Echo, _>(EchoHandler)
        .context("register echo")?;

    if let Some(broker) = connector.broker(&config.broker_url) {
        tokio::spawn(worker_loop(broker, Duration::from_millis(args.poll_ms)));
    }

    let app = AppBuilder::new(registry)
        .config(config)
        .expect_tasks(&[Echo::NAME])
        .build()?;

    tokio::select! {
        result = app.serve() => {
            if let Err(e) = &result {
                error!(error = %e, "server stopped");
            }
            result.context("serve")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }
    Ok(())
}
