//! Producer - リクエストを検証してブローカーへ投入する
//!
//! HTTP に依存しない dispatch のロジックです。最初の失敗で終了します:
//!
//! 1. Resolve: queue / task を引く
//! 2. Read body: 空なら `EmptyPayload`
//! 3. Parse JSON: `MalformedJson`
//! 4. Extract message: `InvalidMessageShape`
//! 5. Preprocess: 前処理チェーン（段ごとに検証）
//! 6. Validate final: Task のシグネチャで検証
//! 7. Dispatch: ブローカーへ submit し JobHandle を返す

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::preprocess::run_chain;
use super::schema::TaskSchema;
use crate::domain::{
    BrokerError, JobHandle, JobState, Payload, RequestError, Stage, parse_message, validate,
};
use crate::typed::{RegisteredTask, TaskRegistry};

/// Accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enqueued {
    pub queue: String,
    pub task: String,
    pub job_id: JobHandle,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

pub struct Producer {
    registry: Arc<TaskRegistry>,
}

impl Producer {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Steps 1-6: resolve, parse, preprocess, validate. Pure, no broker call.
    pub fn prepare(
        &self,
        queue: &str,
        task: &str,
        body: &[u8],
    ) -> Result<(&RegisteredTask, Payload), RequestError> {
        let registered = self.registry.lookup(queue, task)?;
        let message = parse_message(body)?;
        let preprocessed = run_chain(registered.preprocessors(), message)?;
        let kwargs = validate(&preprocessed, registered.signature(), &Stage::Task)?;
        Ok((registered, kwargs))
    }

    pub async fn enqueue(
        &self,
        queue: &str,
        task: &str,
        body: &[u8],
    ) -> Result<Enqueued, DispatchError> {
        let (registered, kwargs) = self.prepare(queue, task, body).inspect_err(|e| {
            debug!(queue, task, title = e.title(), description = %e, "rejected request");
        })?;

        let job_id = registered.remote().submit(kwargs).await.inspect_err(|e| {
            warn!(queue, task, error = %e, "broker rejected submission");
        })?;

        info!(queue, task, %job_id, "enqueued");
        Ok(Enqueued {
            queue: queue.to_string(),
            task: task.to_string(),
            job_id,
        })
    }

    /// Schema of a task, for discovery. No validation, no submission.
    pub fn describe(&self, queue: &str, task: &str) -> Result<TaskSchema, RequestError> {
        let registered = self.registry.lookup(queue, task)?;
        Ok(TaskSchema::from_registered(registered))
    }

    pub async fn status(
        &self,
        queue: &str,
        task: &str,
        job: &JobHandle,
    ) -> Result<JobState, DispatchError> {
        let registered = self.registry.lookup(queue, task).map_err(RequestError::from)?;
        Ok(registered.remote().status(job).await?)
    }
}
