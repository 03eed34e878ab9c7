//! Handler trait - Task 本体（ブローカーのワーカー側で実行される）
//!
//! - ジェネリック trait (Handler<T>)
//! - Object-safe trait (DynHandler)
//! - Type erasure パターン (TypedHandler<T, H> → DynHandler)

use super::task::Task;
use crate::domain::{Payload, TaskError};
use async_trait::async_trait;
use std::marker::PhantomData;

/// Handler は Task を実行する
///
/// # 使用例
/// ```ignore
/// struct EchoHandler;
///
/// #[async_trait]
/// impl Handler<Echo> for EchoHandler {
///     async fn handle(&self, task: Echo) -> Result<(), TaskError> {
///         println!("{}", task.text);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<T: Task>: Send + Sync {
    async fn handle(&self, task: T) -> Result<(), TaskError>;
}

/// DynHandler は object-safe な Handler の抽象化
///
/// ブローカーは kwargs (JSON) しか持たないので、
/// `Arc<dyn DynHandler>` として受け取ります。
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, kwargs: Payload) -> Result<(), TaskError>;
}

pub struct TypedHandler<T: Task, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Task, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Task, H: Handler<T>> DynHandler for TypedHandler<T, H> {
    async fn handle_dyn(&self, kwargs: Payload) -> Result<(), TaskError> {
        let task: T = serde_json::from_value(serde_json::Value::Object(kwargs))
            .map_err(|e| TaskError::new(format!("json decode: {e}")))?;
        self.handler.handle(task).await
    }
}

/// Handler that does nothing, for tasks whose effect lives entirely in the
/// worker process.
pub struct NoopHandler;

#[async_trait]
impl<T: Task> Handler<T> for NoopHandler {
    async fn handle(&self, _task: T) -> Result<(), TaskError> {
        Ok(())
    }
}
