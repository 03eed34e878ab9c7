//! TaskRegistry - queue と task の登録と管理
//!
//! - HashMap での型消去された trait object の管理
//! - Generic methods での登録と型安全性
//! - 起動時に構築 (mutable) → 実行時は `Arc<TaskRegistry>` として共有 (immutable)
//!
//! task 名は queue をまたいで一意です。登録は atomic で、
//! 途中で失敗した場合は何も登録されません。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::handler::{Handler, TypedHandler};
use super::preprocessor::{Preprocessor, PreprocessorSpec};
use super::task::Task;
use crate::domain::{BrokkolyError, RequestError, TaskSignature};
use crate::ports::{Broker, BrokerConnector, RemoteTask};

/// Queue names starting with this prefix are reserved.
pub const RESERVED_PREFIX: char = '_';

/// Handle returned by `register_queue`; pass it to `register_task`.
#[derive(Clone)]
pub struct QueueHandle {
    name: String,
    broker: Arc<dyn Broker>,
}

impl QueueHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn broker(&self) -> &Arc<dyn Broker> {
        &self.broker
    }
}

impl std::fmt::Debug for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueHandle")
            .field("name", &self.name)
            .field("broker", &self.broker.location())
            .finish()
    }
}

/// Everything needed to accept a request for one task.
pub struct RegisteredTask {
    name: String,
    queue: String,
    remote: Arc<dyn RemoteTask>,
    signature: TaskSignature,
    preprocessors: Vec<PreprocessorSpec>,
}

impl RegisteredTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn remote(&self) -> &Arc<dyn RemoteTask> {
        &self.remote
    }

    /// Signature of the target task (not of its preprocessors).
    pub fn signature(&self) -> &TaskSignature {
        &self.signature
    }

    pub fn preprocessors(&self) -> &[PreprocessorSpec] {
        &self.preprocessors
    }
}

/// Why a `(queue, task)` lookup found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("undefined queue '{0}'")]
    UndefinedQueue(String),

    #[error("undefined task '{task}' in queue '{queue}'")]
    UndefinedTask { queue: String, task: String },
}

impl From<LookupError> for RequestError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::UndefinedQueue(queue) => RequestError::UndefinedQueue(queue),
            LookupError::UndefinedTask { task, .. } => RequestError::UndefinedTask(task),
        }
    }
}

struct QueueEntry {
    handle: QueueHandle,
    tasks: HashMap<String, RegisteredTask>,
}

/// TaskRegistry は queue と task を登録・管理
///
/// # 使用例
/// ```ignore
/// let mut registry = TaskRegistry::new(Arc::new(InMemoryConnector::new()));
/// let queue = registry.register_queue("example", "memory://example")?;
///
/// registry
///     .task(&queue)
///     .preprocessor(TwoTimes)
///     .register::<Echo, _>(EchoHandler)?;
///
/// let task = registry.lookup("example", "echo")?;
/// ```
pub struct TaskRegistry {
    connector: Arc<dyn BrokerConnector>,
    queues: HashMap<String, QueueEntry>,
    /// task name -> queue name, for global uniqueness.
    owners: HashMap<String, String>,
}

impl TaskRegistry {
    pub fn new(connector: Arc<dyn BrokerConnector>) -> Self {
        Self {
            connector,
            queues: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    pub fn register_queue(
        &mut self,
        queue_id: &str,
        broker_location: &str,
    ) -> Result<QueueHandle, BrokkolyError> {
        if queue_id.starts_with(RESERVED_PREFIX) {
            return Err(BrokkolyError::ReservedQueueName(queue_id.to_string()));
        }
        if self.queues.contains_key(queue_id) {
            return Err(BrokkolyError::DuplicateQueue(queue_id.to_string()));
        }

        let broker = self.connector.connect(queue_id, broker_location)?;
        let handle = QueueHandle {
            name: queue_id.to_string(),
            broker,
        };
        self.queues.insert(
            queue_id.to_string(),
            QueueEntry {
                handle: handle.clone(),
                tasks: HashMap::new(),
            },
        );
        info!(queue = queue_id, broker = broker_location, "registered queue");
        Ok(handle)
    }

    /// Register `handler` as task `T::NAME` under `queue`.
    pub fn register_task<T: Task, H: Handler<T> + 'static>(
        &mut self,
        queue: &QueueHandle,
        handler: H,
        preprocessors: Vec<PreprocessorSpec>,
    ) -> Result<&RegisteredTask, BrokkolyError> {
        let name = T::NAME;

        let entry = self
            .queues
            .get_mut(queue.name())
            .filter(|entry| Arc::ptr_eq(&entry.handle.broker, &queue.broker))
            .ok_or_else(|| BrokkolyError::UnknownQueue(queue.name().to_string()))?;

        if let Some(owner) = self.owners.get(name) {
            return Err(BrokkolyError::DuplicateTask {
                task: name.to_string(),
                queue: owner.clone(),
            });
        }

        let signature = T::signature().map_err(|source| BrokkolyError::Signature {
            owner: name.to_string(),
            source,
        })?;

        let remote = entry
            .handle
            .broker
            .bind_task(name, Arc::new(TypedHandler::<T, H>::new(handler)))?;

        info!(
            queue = queue.name(),
            task = name,
            params = signature.len(),
            preprocessors = preprocessors.len(),
            "registered task"
        );

        self.owners.insert(name.to_string(), queue.name().to_string());
        let task = RegisteredTask {
            name: name.to_string(),
            queue: queue.name().to_string(),
            remote,
            signature,
            preprocessors,
        };
        Ok(entry.tasks.entry(name.to_string()).or_insert(task))
    }

    /// Decorator style registration: `registry.task(&q).preprocessor(p).register::<T, _>(h)`.
    pub fn task<'r>(&'r mut self, queue: &QueueHandle) -> TaskBuilder<'r> {
        TaskBuilder {
            registry: self,
            queue: queue.clone(),
            preprocessors: Ok(Vec::new()),
        }
    }

    pub fn lookup(&self, queue_id: &str, task_name: &str) -> Result<&RegisteredTask, LookupError> {
        let entry = self
            .queues
            .get(queue_id)
            .ok_or_else(|| LookupError::UndefinedQueue(queue_id.to_string()))?;
        entry
            .tasks
            .get(task_name)
            .ok_or_else(|| LookupError::UndefinedTask {
                queue: queue_id.to_string(),
                task: task_name.to_string(),
            })
    }

    pub fn queue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn task_names(&self, queue_id: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .queues
            .get(queue_id)
            .map(|entry| entry.tasks.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// All registered task names across queues.
    pub fn registered_tasks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.owners.keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every queue and task. Intended for test isolation.
    pub fn clear(&mut self) {
        self.queues.clear();
        self.owners.clear();
    }
}

/// Collects preprocessors for one task; finish with `register`.
pub struct TaskBuilder<'r> {
    registry: &'r mut TaskRegistry,
    queue: QueueHandle,
    preprocessors: Result<Vec<PreprocessorSpec>, BrokkolyError>,
}

impl<'r> TaskBuilder<'r> {
    /// Append a preprocessor; preprocessors run in the order they are added.
    pub fn preprocessor<P: Preprocessor>(mut self, preprocessor: P) -> Self {
        self.preprocessors = self.preprocessors.and_then(|mut list| {
            let spec =
                PreprocessorSpec::new(preprocessor).map_err(|source| BrokkolyError::Signature {
                    owner: P::NAME.to_string(),
                    source,
                })?;
            list.push(spec);
            Ok(list)
        });
        self
    }

    pub fn register<T: Task, H: Handler<T> + 'static>(
        self,
        handler: H,
    ) -> Result<&'r RegisteredTask, BrokkolyError> {
        let TaskBuilder {
            registry,
            queue,
            preprocessors,
        } = self;
        registry.register_task::<T, H>(&queue, handler, preprocessors?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParamType, Payload};
    use crate::impls::InMemoryConnector;
    use crate::typed::Params;
    use crate::typed::handler::NoopHandler;
    use crate::typed::preprocessor::PreprocessError;
    use crate::typed::preprocessor::fixtures::{NumberToText, TwoTimes};
    use crate::typed::task::fixtures::{BrokenTask, TaskForTest, TextTask};
    use serde::Deserialize;

    fn registry() -> TaskRegistry {
        TaskRegistry::new(Arc::new(InMemoryConnector::new()))
    }

    #[test]
    fn register_task_captures_signature() {
        let mut reg = registry();
        let queue = reg.register_queue("test_queue", "memory://test").unwrap();
        reg.register_task::<TaskForTest, _>(&queue, NoopHandler, vec![])
            .unwrap();

        let task = reg.lookup("test_queue", "task_for_test").unwrap();
        assert!(task.preprocessors().is_empty());
        assert_eq!(task.queue(), "test_queue");

        let mut params: Vec<(&str, ParamType)> = task
            .signature()
            .params()
            .iter()
            .map(|p| (p.name.as_str(), p.ty))
            .collect();
        params.sort_by_key(|(name, _)| *name);
        assert_eq!(params, vec![("number", ParamType::Int), ("text", ParamType::Str)]);
    }

    #[test]
    fn register_same_task_fails_and_keeps_first() {
        let mut reg = registry();
        let queue = reg.register_queue("test_queue", "memory://test").unwrap();
        reg.register_task::<TextTask, _>(&queue, NoopHandler, vec![])
            .unwrap();

        let err = reg
            .task(&queue)
            .preprocessor(NumberToText::default())
            .register::<TextTask, _>(NoopHandler)
            .err()
            .unwrap();
        assert!(matches!(err, BrokkolyError::DuplicateTask { .. }));

        let kept = reg.lookup("test_queue", "task_for_preprocessor_test").unwrap();
        assert!(kept.preprocessors().is_empty());
    }

    #[test]
    fn task_names_are_unique_across_queues() {
        let mut reg = registry();
        let q1 = reg.register_queue("q1", "memory://a").unwrap();
        let q2 = reg.register_queue("q2", "memory://b").unwrap();
        reg.register_task::<TaskForTest, _>(&q1, NoopHandler, vec![])
            .unwrap();

        let err = reg
            .register_task::<TaskForTest, _>(&q2, NoopHandler, vec![])
            .err()
            .unwrap();
        assert!(matches!(err, BrokkolyError::DuplicateTask { ref queue, .. } if queue == "q1"));
        assert!(reg.task_names("q2").is_empty());
    }

    #[test]
    fn reserved_queue_name_is_rejected() {
        let mut reg = registry();
        for location in ["memory://test", "memory://", "memory://other"] {
            let err = reg.register_queue("_queue", location).unwrap_err();
            assert!(matches!(err, BrokkolyError::ReservedQueueName(_)));
        }
        assert!(reg.queue_names().is_empty());
    }

    #[test]
    fn duplicate_queue_is_rejected() {
        let mut reg = registry();
        reg.register_queue("q", "memory://a").unwrap();
        let err = reg.register_queue("q", "memory://b").unwrap_err();
        assert!(matches!(err, BrokkolyError::DuplicateQueue(_)));
    }

    #[test]
    fn unsupported_broker_location_is_a_registration_error() {
        let mut reg = registry();
        let err = reg.register_queue("q", "amqp://localhost").unwrap_err();
        assert!(matches!(err, BrokkolyError::Broker(_)));
        assert!(reg.queue_names().is_empty());
    }

    #[test]
    fn bad_signature_registers_nothing() {
        let mut reg = registry();
        let queue = reg.register_queue("q", "memory://a").unwrap();
        let err = reg
            .register_task::<BrokenTask, _>(&queue, NoopHandler, vec![])
            .err()
            .unwrap();
        assert!(matches!(err, BrokkolyError::Signature { .. }));
        assert!(reg.registered_tasks().is_empty());
    }

    #[test]
    fn bad_preprocessor_signature_registers_nothing() {
        #[derive(Deserialize)]
        struct Dup {}
        impl Params for Dup {
            const PARAMS: &'static [(&'static str, ParamType)] =
                &[("x", ParamType::Int), ("x", ParamType::Str)];
        }
        struct DupPre;
        impl Preprocessor for DupPre {
            type Input = Dup;
            const NAME: &'static str = "dup";
            fn process(&self, _input: Dup) -> Result<Payload, PreprocessError> {
                Ok(Payload::new())
            }
        }

        let mut reg = registry();
        let queue = reg.register_queue("q", "memory://a").unwrap();
        let err = reg
            .task(&queue)
            .preprocessor(DupPre)
            .preprocessor(TwoTimes)
            .register::<TextTask, _>(NoopHandler)
            .err()
            .unwrap();
        assert!(matches!(err, BrokkolyError::Signature { ref owner, .. } if owner == "dup"));
        assert!(reg.registered_tasks().is_empty());
    }

    #[test]
    fn handle_from_another_registry_is_rejected() {
        let mut other = registry();
        let foreign = other.register_queue("q", "memory://a").unwrap();

        let mut reg = registry();
        reg.register_queue("q", "memory://a").unwrap();
        let err = reg
            .register_task::<TaskForTest, _>(&foreign, NoopHandler, vec![])
            .err()
            .unwrap();
        assert!(matches!(err, BrokkolyError::UnknownQueue(_)));
    }

    #[test]
    fn preprocessors_keep_registration_order() {
        let mut reg = registry();
        let queue = reg.register_queue("q", "memory://a").unwrap();
        let task = reg
            .task(&queue)
            .preprocessor(NumberToText::default())
            .preprocessor(TwoTimes)
            .register::<TextTask, _>(NoopHandler)
            .unwrap();

        let names: Vec<&str> = task.preprocessors().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["number_to_text", "two_times"]);
    }

    #[test]
    fn lookup_distinguishes_queue_and_task() {
        let mut reg = registry();
        let queue = reg.register_queue("test_queue", "memory://a").unwrap();
        reg.register_task::<TaskForTest, _>(&queue, NoopHandler, vec![])
            .unwrap();

        assert_eq!(
            reg.lookup("undefined_queue", "task_for_test").err(),
            Some(LookupError::UndefinedQueue("undefined_queue".into()))
        );
        assert!(matches!(
            reg.lookup("test_queue", "undefined_task"),
            Err(LookupError::UndefinedTask { .. })
        ));
    }

    #[test]
    fn clear_empties_everything() {
        let mut reg = registry();
        let queue = reg.register_queue("q", "memory://a").unwrap();
        reg.register_task::<TaskForTest, _>(&queue, NoopHandler, vec![])
            .unwrap();

        reg.clear();
        assert!(reg.queue_names().is_empty());
        assert!(reg.registered_tasks().is_empty());

        // 同じ名前で再登録できる
        let queue = reg.register_queue("q", "memory://a").unwrap();
        assert!(reg
            .register_task::<TaskForTest, _>(&queue, NoopHandler, vec![])
            .is_ok());
    }
}
