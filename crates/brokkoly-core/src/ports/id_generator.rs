//! IdGenerator port - JobHandle 生成の抽象化
//!
//! テスト容易性のために trait として抽象化しています。
//! **UlidGenerator** は Clock の時刻を timestamp 部分に使うので、
//! FixedClock を渡せば timestamp が固定された handle を作れます。

use crate::domain::JobHandle;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は JobHandle を生成
pub trait IdGenerator: Send + Sync {
    fn generate_job_handle(&self) -> JobHandle;
}

pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_job_handle(&self) -> JobHandle {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        JobHandle::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
