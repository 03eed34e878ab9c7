//! Preprocessor - payload を Task の形へ整形する前処理
//!
//! 前処理は登録順に実行され、各段の出力 (Payload) が次の段の入力になります。
//! 入力の型は `Preprocessor::Input` (Params) で宣言し、
//! 呼び出し前に検証されます。出力のフィールドは静的にはわからないので、
//! 最後の Task 側の検証でまとめてチェックされます。

use std::sync::Arc;

use crate::domain::{Payload, SignatureError, TaskSignature};

use super::task::Params;

/// Error a preprocessor may return for inputs it cannot transform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreprocessError {
    #[error("input decode: {0}")]
    Decode(String),

    #[error("{0}")]
    Rejected(String),
}

impl PreprocessError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// Typed preprocessor.
///
/// # 使用例
/// ```ignore
/// struct TwoTimes;
///
/// impl Preprocessor for TwoTimes {
///     type Input = TextInput;
///     const NAME: &'static str = "two_times";
///
///     fn process(&self, input: TextInput) -> Result<Payload, PreprocessError> {
///         let mut out = Payload::new();
///         out.insert("text".into(), input.text.repeat(2).into());
///         Ok(out)
///     }
/// }
/// ```
pub trait Preprocessor: Send + Sync + 'static {
    type Input: Params;
    const NAME: &'static str;

    fn process(&self, input: Self::Input) -> Result<Payload, PreprocessError>;
}

/// Object-safe side of `Preprocessor`.
pub trait DynPreprocessor: Send + Sync {
    fn process_dyn(&self, args: Payload) -> Result<Payload, PreprocessError>;
}

struct TypedPreprocessor<P>(P);

impl<P: Preprocessor> DynPreprocessor for TypedPreprocessor<P> {
    fn process_dyn(&self, args: Payload) -> Result<Payload, PreprocessError> {
        let input: P::Input = serde_json::from_value(serde_json::Value::Object(args))
            .map_err(|e| PreprocessError::Decode(e.to_string()))?;
        self.0.process(input)
    }
}

/// A registered preprocessor: its name, the fields it requires, and the
/// erased callable.
#[derive(Clone)]
pub struct PreprocessorSpec {
    name: String,
    signature: TaskSignature,
    inner: Arc<dyn DynPreprocessor>,
}

impl PreprocessorSpec {
    pub fn new<P: Preprocessor>(preprocessor: P) -> Result<Self, SignatureError> {
        Ok(Self {
            name: P::NAME.to_string(),
            signature: P::Input::signature()?,
            inner: Arc::new(TypedPreprocessor(preprocessor)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &TaskSignature {
        &self.signature
    }

    /// Call the preprocessor. `args` should already be restricted to and
    /// validated against `signature()`.
    pub fn call(&self, args: Payload) -> Result<Payload, PreprocessError> {
        self.inner.process_dyn(args)
    }
}

impl std::fmt::Debug for PreprocessorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreprocessorSpec")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::ParamType;

    #[derive(Debug, Deserialize)]
    pub struct NumberInput {
        pub number: i64,
    }

    impl Params for NumberInput {
        const PARAMS: &'static [(&'static str, ParamType)] = &[("number", ParamType::Int)];
    }

    #[derive(Debug, Deserialize)]
    pub struct TextInput {
        pub text: String,
    }

    impl Params for TextInput {
        const PARAMS: &'static [(&'static str, ParamType)] = &[("text", ParamType::Str)];
    }

    /// `number -> {"text": number.to_string()}`
    #[derive(Default)]
    pub struct NumberToText {
        pub calls: Arc<AtomicUsize>,
    }

    impl Preprocessor for NumberToText {
        type Input = NumberInput;
        const NAME: &'static str = "number_to_text";

        fn process(&self, input: NumberInput) -> Result<Payload, PreprocessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut out = Payload::new();
            out.insert("text".into(), input.number.to_string().into());
            Ok(out)
        }
    }

    /// `text -> {"text": text + text}`
    pub struct TwoTimes;

    impl Preprocessor for TwoTimes {
        type Input = TextInput;
        const NAME: &'static str = "two_times";

        fn process(&self, input: TextInput) -> Result<Payload, PreprocessError> {
            let mut out = Payload::new();
            out.insert("text".into(), input.text.repeat(2).into());
            Ok(out)
        }
    }

    /// Requires `text`, rejects empty strings.
    pub struct NonEmpty;

    impl Preprocessor for NonEmpty {
        type Input = TextInput;
        const NAME: &'static str = "non_empty";

        fn process(&self, input: TextInput) -> Result<Payload, PreprocessError> {
            if input.text.is_empty() {
                return Err(PreprocessError::rejected("text must not be empty"));
            }
            let mut out = Payload::new();
            out.insert("text".into(), input.text.into());
            Ok(out)
        }
    }
}
