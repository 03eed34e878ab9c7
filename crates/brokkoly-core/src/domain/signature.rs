//! Signature - タスクが受け取る引数の型記述
//!
//! 引数の型は実行時に関数から推測するのではなく、登録時に
//! `(name, ParamType)` の一覧として明示的に渡します。
//!
//! # 例
//! ```ignore
//! const PARAMS: &[(&str, ParamType)] = &[("text", ParamType::Str), ("number", ParamType::Int)];
//! let signature = TaskSignature::from_params(PARAMS)?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primitive types a task parameter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
}

impl ParamType {
    /// Exact match against a decoded JSON value. No coercion happens here:
    /// `1` is not a float, `true` is not an int, `"1"` is not an int.
    /// `int` is signed 64-bit, the width typed params decode into.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ParamType::Str => value.is_string(),
            ParamType::Int => value.is_i64(),
            ParamType::Float => value.is_f64(),
            ParamType::Bool => value.is_boolean(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::Str => "str",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "bool",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" | "string" => Ok(ParamType::Str),
            "int" | "integer" => Ok(ParamType::Int),
            "float" => Ok(ParamType::Float),
            "bool" | "boolean" => Ok(ParamType::Bool),
            other => Err(SignatureError::UnsupportedType(other.to_string())),
        }
    }
}

/// One named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ParamType,
}

/// SignatureError は登録時の型記述エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("unsupported parameter type '{0}' (expected one of str, int, float, bool)")]
    UnsupportedType(String),

    #[error("parameter '{0}' is declared more than once")]
    DuplicateParam(String),

    #[error("parameter name must not be empty")]
    EmptyName,
}

/// Ordered set of `(name, type)` pairs with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskSignature {
    params: Vec<Param>,
}

impl TaskSignature {
    /// Build a signature from a static declaration.
    pub fn from_params(params: &[(&str, ParamType)]) -> Result<Self, SignatureError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(params.len());
        for &(name, ty) in params {
            if name.is_empty() {
                return Err(SignatureError::EmptyName);
            }
            if !seen.insert(name) {
                return Err(SignatureError::DuplicateParam(name.to_string()));
            }
            out.push(Param {
                name: name.to_string(),
                ty,
            });
        }
        Ok(Self { params: out })
    }

    /// Build a signature from type names, e.g. `[("text", "str")]`.
    pub fn parse<'a, I>(decl: I) -> Result<Self, SignatureError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let typed = decl
            .into_iter()
            .map(|(name, ty)| ty.parse::<ParamType>().map(|ty| (name, ty)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_params(&typed)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<ParamType> {
        self.params.iter().find(|p| p.name == name).map(|p| p.ty)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
