//! brokkoly-core
//!
//! HTTP から非同期タスクを投入するためのコア部品。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, signature, payload, validation, state, errors）
//! - **ports**: 抽象化レイヤー（Broker, BrokerConnector, RemoteTask, Clock, IdGenerator）
//! - **typed**: 型付き Task API（Task / Params trait, Handler, Preprocessor, TaskRegistry）
//! - **app**: アプリケーションロジック（builder, producer, preprocess, schema, http）
//! - **impls**: 実装（InMemoryBroker など開発用）
//! - **config**: サーバー設定
//! - **observability**: ジョブ数の集計

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod typed;
