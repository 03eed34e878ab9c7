//! Errors - エラー型と分類
//!
//! - **BrokkolyError**: 登録時のエラー（起動時に fail-fast）
//! - **RequestError**: リクエスト単位のエラー（400 としてクライアントへ返す）
//! - **BrokerError**: ブローカー側のエラー（リトライせずにそのまま伝搬）

use std::fmt;

use super::ids::JobHandle;
use super::signature::{ParamType, SignatureError};

/// Raised while registering queues and tasks.
#[derive(Debug, thiserror::Error)]
pub enum BrokkolyError {
    #[error("queue name '{0}' starts with the reserved prefix '_'")]
    ReservedQueueName(String),

    #[error("queue '{0}' is already registered")]
    DuplicateQueue(String),

    #[error("task '{task}' is already registered in queue '{queue}'")]
    DuplicateTask { task: String, queue: String },

    #[error("queue '{0}' is not registered in this registry")]
    UnknownQueue(String),

    #[error("invalid signature for '{owner}': {source}")]
    Signature {
        owner: String,
        #[source]
        source: SignatureError,
    },

    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),
}

/// Which validation step rejected a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Preprocessor(String),
    Task,
}

impl Stage {
    fn attribution(&self) -> String {
        match self {
            Stage::Preprocessor(name) => format!(" by preprocessor {name}"),
            Stage::Task => String::new(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Preprocessor(name) => f.write_str(name),
            Stage::Task => f.write_str("task"),
        }
    }
}

/// Per-request rejection. `Display` is the human readable description;
/// `title()` is the stable machine-checkable string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("{0} is undefined queue name")]
    UndefinedQueue(String),

    #[error("{0} is undefined task name")]
    UndefinedTask(String),

    #[error("payload must not be empty")]
    EmptyPayload,

    #[error("payload must be a JSON document ({0})")]
    MalformedJson(String),

    #[error("JSON must have message field holding an object")]
    InvalidMessageShape,

    #[error("{field} is required{}", .stage.attribution())]
    MissingField { stage: Stage, field: String },

    #[error("{field} must be {expected} type{}", .stage.attribution())]
    InvalidType {
        stage: Stage,
        field: String,
        expected: ParamType,
    },

    #[error("preprocessor {preprocessor} failed: {reason}")]
    PreprocessFailed { preprocessor: String, reason: String },
}

impl RequestError {
    pub fn title(&self) -> &'static str {
        match self {
            RequestError::UndefinedQueue(_) => "Undefined queue",
            RequestError::UndefinedTask(_) => "Undefined task",
            RequestError::EmptyPayload => "Empty payload",
            RequestError::MalformedJson(_) => "Payload is not a JSON",
            RequestError::InvalidMessageShape => "Invalid JSON",
            RequestError::MissingField { .. } => "Missing required filed",
            RequestError::InvalidType { .. } => "Invalid type",
            RequestError::PreprocessFailed { .. } => "Preprocess failed",
        }
    }

    pub fn description(&self) -> String {
        self.to_string()
    }

    /// Stage that rejected the payload, for field level errors.
    pub fn stage(&self) -> Option<&Stage> {
        match self {
            RequestError::MissingField { stage, .. } | RequestError::InvalidType { stage, .. } => {
                Some(stage)
            }
            _ => None,
        }
    }
}

/// Failures reported by the backend broker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    #[error("unsupported broker location '{0}'")]
    UnsupportedLocation(String),

    #[error("broker unavailable: {0}")]
    Unavailable(String),

    #[error("task '{0}' is not bound to this broker")]
    UnboundTask(String),

    #[error("unknown job {0}")]
    UnknownJob(JobHandle),
}

/// Failure returned by a task body when the broker runs it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_stable() {
        assert_eq!(RequestError::EmptyPayload.title(), "Empty payload");
        assert_eq!(
            RequestError::MalformedJson("expected value".into()).title(),
            "Payload is not a JSON"
        );
        assert_eq!(RequestError::InvalidMessageShape.title(), "Invalid JSON");
    }

    #[test]
    fn field_errors_share_titles_but_name_their_stage() {
        let pre = RequestError::MissingField {
            stage: Stage::Preprocessor("two_times".into()),
            field: "text".into(),
        };
        let fin = RequestError::MissingField {
            stage: Stage::Task,
            field: "text".into(),
        };

        assert_eq!(pre.title(), fin.title());
        assert_eq!(fin.description(), "text is required");
        assert_eq!(pre.description(), "text is required by preprocessor two_times");
        assert_eq!(pre.stage().map(ToString::to_string).as_deref(), Some("two_times"));
        assert_eq!(fin.stage().map(ToString::to_string).as_deref(), Some("task"));
    }

    #[test]
    fn invalid_type_description_names_expected_type() {
        let err = RequestError::InvalidType {
            stage: Stage::Task,
            field: "number".into(),
            expected: ParamType::Int,
        };
        assert_eq!(err.description(), "number must be int type");
    }
}
