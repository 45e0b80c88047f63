//! 徽章事件发布
//!
//! 展览集齐后发布 `EmblemCollectedEvent`，由 emblem-worker 消费并写入收藏册。

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use rokamoka_shared::events::EmblemCollectedEvent;
use rokamoka_shared::kafka::{KafkaProducer, topics};

use crate::error::{Result, RokaMokaError};

/// 徽章事件发布接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmblemEventPublisher: Send + Sync {
    async fn publish(&self, event: &EmblemCollectedEvent) -> Result<()>;
}

/// 基于 Kafka 的发布者，按收藏册分区以保证同一收藏册事件有序
#[derive(Clone)]
pub struct KafkaEmblemPublisher {
    producer: KafkaProducer,
}

impl KafkaEmblemPublisher {
    pub fn new(producer: KafkaProducer) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl EmblemEventPublisher for KafkaEmblemPublisher {
    async fn publish(&self, event: &EmblemCollectedEvent) -> Result<()> {
        let (partition, offset) = self
            .producer
            .send_json(topics::EMBLEM_COLLECTED, &event.partition_key(), event)
            .await?;

        debug!(
            event_id = %event.event_id,
            partition,
            offset,
            "徽章事件已发布"
        );
        Ok(())
    }
}

/// 记录已发布事件的内存发布者，用于测试和本地运行
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<EmblemCollectedEvent>>,
    fail: Mutex<bool>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟 broker 不可用
    pub fn failing() -> Self {
        let publisher = Self::default();
        *publisher.fail.lock() = true;
        publisher
    }

    pub fn events(&self) -> Vec<EmblemCollectedEvent> {
        self.events.lock().clone()
    }

    /// 取出并清空已记录的事件
    pub fn drain(&self) -> Vec<EmblemCollectedEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

#[async_trait]
impl EmblemEventPublisher for RecordingPublisher {
    async fn publish(&self, event: &EmblemCollectedEvent) -> Result<()> {
        if *self.fail.lock() {
            return Err(RokaMokaError::Broker("broker unavailable".to_string()));
        }
        self.events.lock().push(event.clone());
        Ok(())
    }
}
