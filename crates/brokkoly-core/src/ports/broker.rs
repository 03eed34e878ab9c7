//! Broker port - 非同期実行バックエンド（分散タスクキュー）
//!
//! core はタスクを実行しません。検証済みの引数をブローカーへ渡し、
//! 返ってきた JobHandle を呼び出し元へ返すだけです。
//!
//! # 3 つの capability
//! - `BrokerConnector::connect`: queue 登録時に broker location からブローカーを得る
//! - `Broker::bind_task`: タスク本体をリモート実行可能にする
//! - `RemoteTask::submit` / `RemoteTask::status`: 投入と状態確認

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{BrokerError, JobHandle, JobState, Payload};
use crate::typed::DynHandler;

/// A task bound to a broker; the remotely invocable side.
#[async_trait]
pub trait RemoteTask: Send + Sync {
    /// Enqueue one job with keyword arguments. Returns as soon as the broker
    /// has accepted it.
    async fn submit(&self, kwargs: Payload) -> Result<JobHandle, BrokerError>;

    async fn status(&self, job: &JobHandle) -> Result<JobState, BrokerError>;
}

/// A broker connection shared by every task of one queue.
pub trait Broker: Send + Sync {
    /// Opaque location the broker was connected with.
    fn location(&self) -> &str;

    fn bind_task(
        &self,
        name: &str,
        handler: Arc<dyn DynHandler>,
    ) -> Result<Arc<dyn RemoteTask>, BrokerError>;
}

/// Turns an opaque broker location into a broker.
pub trait BrokerConnector: Send + Sync {
    fn connect(&self, queue: &str, location: &str) -> Result<Arc<dyn Broker>, BrokerError>;
}
