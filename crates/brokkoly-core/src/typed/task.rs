//! Task trait - 型付き Task の定義
//!
//! 引数の型は `PARAMS` に明示的に書きます。登録時にここから
//! `TaskSignature` を作り、リクエスト時の検証に使います。
//!
//! # Trait Bounds
//! - `DeserializeOwned`: 検証済みの payload から復元するため
//! - `Send + 'static`: ブローカーのワーカーへ渡すため

use serde::de::DeserializeOwned;

use crate::domain::{ParamType, SignatureError, TaskSignature};

/// Typed argument set with an explicit structural description.
///
/// `PARAMS` must describe the same fields `Deserialize` expects.
pub trait Params: DeserializeOwned + Send + 'static {
    const PARAMS: &'static [(&'static str, ParamType)];

    fn signature() -> Result<TaskSignature, SignatureError> {
        TaskSignature::from_params(Self::PARAMS)
    }
}

/// Task は task 名と引数の型を対応付ける
///
/// # 使用例
/// ```ignore
/// #[derive(Deserialize)]
/// struct Echo {
///     text: String,
/// }
///
/// impl Params for Echo {
///     const PARAMS: &'static [(&'static str, ParamType)] = &[("text", ParamType::Str)];
/// }
///
/// impl Task for Echo {
///     const NAME: &'static str = "echo";
/// }
/// ```
pub trait Task: Params + Sync {
    /// Registry wide unique name; also the last path segment of the endpoint.
    const NAME: &'static str;
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn signature_field_set_equals_declared_params() {
        let sig = TaskForTest::signature().unwrap();
        let mut names: Vec<&str> = sig.names().collect();
        names.sort();
        assert_eq!(names, vec!["number", "text"]);
    }

    #[test]
    fn duplicate_params_fail_signature_extraction() {
        assert!(matches!(
            BrokenTask::signature(),
            Err(SignatureError::DuplicateParam(name)) if name == "a"
        ));
    }
}
