//! Ports - 抽象化レイヤー
//!
//! 外部システム（ブローカー、時刻、ID 生成）へのインターフェースを定義します。
//! 開発用の実装は `impls` にあります。

pub mod broker;
pub mod clock;
pub mod id_generator;

pub use self::broker::{Broker, BrokerConnector, RemoteTask};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
