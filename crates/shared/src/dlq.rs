//! 死信队列
//!
//! 徽章事件因基础设施故障处理失败且重试耗尽后，写入死信 topic 等待人工排查或重放。
//! 业务错误（重复、内容不存在）直接丢弃，不进入死信队列。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SharedError;
use crate::kafka::{KafkaProducer, topics};

/// 死信消息信封
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterMessage {
    /// 原始消息 ID（事件的 eventId）
    pub message_id: String,
    pub source_topic: String,
    /// 原始消息内容
    pub payload: String,
    pub error: String,
    /// 进入死信队列前已重试的次数
    pub retry_count: u32,
    pub failed_at: DateTime<Utc>,
    pub source_service: String,
}

impl DeadLetterMessage {
    pub fn new(
        message_id: impl Into<String>,
        source_topic: impl Into<String>,
        payload: impl Into<String>,
        error: impl Into<String>,
        retry_count: u32,
        source_service: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            source_topic: source_topic.into(),
            payload: payload.into(),
            error: error.into(),
            retry_count,
            failed_at: Utc::now(),
            source_service: source_service.into(),
        }
    }
}

/// 死信生产者
#[derive(Clone)]
pub struct DlqProducer {
    producer: KafkaProducer,
    source_service: String,
}

impl DlqProducer {
    pub fn new(producer: KafkaProducer, source_service: &str) -> Self {
        Self {
            producer,
            source_service: source_service.to_string(),
        }
    }

    /// 将失败消息写入徽章死信 topic
    pub async fn send_to_dlq(
        &self,
        message_id: &str,
        source_topic: &str,
        payload: &str,
        error: &str,
        retry_count: u32,
    ) -> Result<(), SharedError> {
        let dlq_msg = DeadLetterMessage::new(
            message_id,
            source_topic,
            payload,
            error,
            retry_count,
            &self.source_service,
        );

        self.producer
            .send_json(topics::EMBLEM_DEAD_LETTER, message_id, &dlq_msg)
            .await?;

        warn!(message_id, source_topic, error, "消息已发送到死信队列");

        Ok(())
    }
}
