//! 徽章 worker
//!
//! 从 Kafka 消费徽章收集事件，把徽章收入对应的收藏册。
//! 业务错误直接丢弃，基础设施故障按退避策略重试，重试耗尽后进入死信队列。

pub mod consumer;
pub mod error;

pub use consumer::{DeadLetterSink, EmblemCollector, EmblemConsumer, EmblemProcessor, Outcome};
pub use error::WorkerError;
