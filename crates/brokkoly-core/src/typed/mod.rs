//! Typed - 型付き Task API
//!
//! task 名の typo と引数の型を型で縛り、
//! Handler / Preprocessor との対応付けを静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Task` / `Params` trait, `Handler<T>`, `Preprocessor` - 型安全
//! - **内部（Dyn）**: `DynHandler`, `DynPreprocessor` - object-safe, type erasure

pub mod handler;
pub mod preprocessor;
pub mod registry;
pub mod task;

pub use self::handler::{DynHandler, Handler, NoopHandler, TypedHandler};
pub use self::preprocessor::{DynPreprocessor, PreprocessError, Preprocessor, PreprocessorSpec};
pub use self::registry::{
    LookupError, QueueHandle, RESERVED_PREFIX, RegisteredTask, TaskBuilder, TaskRegistry,
};
pub use self::task::{Params, Task};
