//! JobHandle - ブローカーが返すジョブ識別子
//!
//! ULID ベースの ID です。
//! - **時刻でソート可能**: timestamp が先頭にあるため、生成順序でソートできる
//! - **分散生成可能**: 調整なしで複数ノードで生成できる
//!
//! core はこの値を解釈せず、呼び出し元へそのまま返すだけです。
//! 文字列表現は `job-<ulid>` で、JSON でも同じ形式を使います。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

const PREFIX: &str = "job-";

/// Opaque identifier of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct JobHandle(Ulid);

impl JobHandle {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for JobHandle {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid job handle '{0}'")]
pub struct InvalidJobHandle(pub String);

impl FromStr for JobHandle {
    type Err = InvalidJobHandle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| InvalidJobHandle(s.to_string()))?;
        Ulid::from_string(raw)
            .map(Self)
            .map_err(|_| InvalidJobHandle(s.to_string()))
    }
}

impl From<JobHandle> for String {
    fn from(handle: JobHandle) -> Self {
        handle.to_string()
    }
}

impl TryFrom<String> for JobHandle {
    type Error = InvalidJobHandle;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
