//! App - アプリケーション層
//!
//! このモジュールは、registry と ports を組み合わせて dispatch を実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **Producer**: 検証してブローカーへ投入する（HTTP 非依存）
//! - **run_chain**: 前処理チェーンの実行
//! - **TaskSchema**: GET で返すスキーマ記述
//! - **StaticResources**: 同梱の静的ファイル
//! - **http**: axum ルーター

pub mod builder;
pub mod http;
pub mod preprocess;
pub mod producer;
pub mod resources;
pub mod schema;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::http::{ApiError, AppState, router};
pub use self::preprocess::run_chain;
pub use self::producer::{DispatchError, Enqueued, Producer};
pub use self::resources::{Resource, StaticResources};
pub use self::schema::{PreprocessorSchema, TaskSchema};
