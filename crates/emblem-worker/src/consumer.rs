//! 徽章事件消费者
//!
//! 从 `rokamoka.emblem.collected` 消费事件并把徽章收入收藏册。
//!
//! - 负载无法解析、内容不存在、重复收集、尚未集齐：视为业务拒绝，记录后跳过
//! - 数据库、消息队列故障：按 [`RetryPolicy`] 退避重试，耗尽后写入死信队列

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use mokadex::models::Mokadex;
use mokadex::service::CollectionService;
use mokadex::{RokaMokaError, ServiceContext};
use rokamoka_shared::config::AppConfig;
use rokamoka_shared::dlq::DlqProducer;
use rokamoka_shared::error::SharedError;
use rokamoka_shared::events::EmblemCollectedEvent;
use rokamoka_shared::kafka::{ConsumerMessage, KafkaConsumer, topics};
use rokamoka_shared::observability::metrics;
use rokamoka_shared::retry::{RetryPolicy, retry_with_policy};

use crate::error::WorkerError;

/// 收集徽章的能力，生产环境由 [`CollectionService`] 提供
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmblemCollector: Send + Sync {
    async fn collect_emblem(
        &self,
        ctx: &ServiceContext,
        mokadex_id: i64,
        emblem_id: i64,
    ) -> Result<Mokadex, RokaMokaError>;
}

#[async_trait]
impl EmblemCollector for CollectionService {
    async fn collect_emblem(
        &self,
        ctx: &ServiceContext,
        mokadex_id: i64,
        emblem_id: i64,
    ) -> Result<Mokadex, RokaMokaError> {
        CollectionService::collect_emblem(self, ctx, mokadex_id, emblem_id).await
    }
}

/// 死信投递
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn send_to_dlq(
        &self,
        message_id: &str,
        source_topic: &str,
        payload: &str,
        error: &str,
        retry_count: u32,
    ) -> Result<(), SharedError>;
}

#[async_trait]
impl DeadLetterSink for DlqProducer {
    async fn send_to_dlq(
        &self,
        message_id: &str,
        source_topic: &str,
        payload: &str,
        error: &str,
        retry_count: u32,
    ) -> Result<(), SharedError> {
        DlqProducer::send_to_dlq(self, message_id, source_topic, payload, error, retry_count).await
    }
}

/// 单条消息的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Collected,
    /// 业务拒绝，不重试、不进死信
    Rejected,
    DeadLettered,
}

/// 单条事件的处理逻辑，与 Kafka 消费循环解耦以便测试
pub struct EmblemProcessor {
    collector: Arc<dyn EmblemCollector>,
    dlq: Arc<dyn DeadLetterSink>,
    policy: RetryPolicy,
}

impl EmblemProcessor {
    pub fn new(
        collector: Arc<dyn EmblemCollector>,
        dlq: Arc<dyn DeadLetterSink>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            collector,
            dlq,
            policy,
        }
    }

    /// 处理一条消息
    ///
    /// 只有死信投递本身失败时返回错误，此时事件可能丢失。
    #[instrument(skip(self, msg), fields(topic = %msg.topic, partition = msg.partition, offset = msg.offset))]
    pub async fn process(&self, msg: &ConsumerMessage) -> Result<Outcome, WorkerError> {
        let event: EmblemCollectedEvent = match msg.deserialize_payload() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "徽章事件负载无法解析，丢弃");
                metrics::record_emblem_collection("rejected");
                return Ok(Outcome::Rejected);
            }
        };

        info!(
            event_id = %event.event_id,
            mokadex_id = event.mokadex_id,
            emblem_id = event.emblem_id,
            "收到徽章收集事件"
        );

        let ctx = ServiceContext::system();
        let ctx = &ctx;
        let collector = self.collector.as_ref();
        let (mokadex_id, emblem_id) = (event.mokadex_id, event.emblem_id);

        let result = retry_with_policy(
            &self.policy,
            "collect_emblem",
            RokaMokaError::is_retryable,
            move || collector.collect_emblem(ctx, mokadex_id, emblem_id),
        )
        .await;

        match result {
            Ok(_) => {
                metrics::record_emblem_collection("collected");
                info!(event_id = %event.event_id, "徽章已收集");
                Ok(Outcome::Collected)
            }
            Err(e) if e.is_domain_error() => {
                metrics::record_emblem_collection("rejected");
                warn!(
                    event_id = %event.event_id,
                    code = e.error_code(),
                    error = %e,
                    "徽章事件被业务规则拒绝，丢弃"
                );
                Ok(Outcome::Rejected)
            }
            Err(e) => {
                metrics::record_emblem_collection("failed");
                error!(event_id = %event.event_id, error = %e, "徽章收集失败，投递死信队列");

                let payload = String::from_utf8_lossy(&msg.payload);
                self.dlq
                    .send_to_dlq(
                        &event.event_id,
                        &msg.topic,
                        &payload,
                        &e.to_string(),
                        self.policy.max_retries,
                    )
                    .await?;
                Ok(Outcome::DeadLettered)
            }
        }
    }
}

/// 徽章事件消费者
pub struct EmblemConsumer {
    consumer: KafkaConsumer,
    processor: EmblemProcessor,
}

impl EmblemConsumer {
    pub fn new(config: &AppConfig, processor: EmblemProcessor) -> Result<Self, WorkerError> {
        let consumer = KafkaConsumer::new(&config.kafka, None)?;
        Ok(Self {
            consumer,
            processor,
        })
    }

    /// 启动消费循环，直到收到 shutdown 信号
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), WorkerError> {
        self.consumer.subscribe(&[topics::EMBLEM_COLLECTED])?;

        info!(topic = topics::EMBLEM_COLLECTED, "徽章消费者已启动");

        let processor = self.processor;
        self.consumer
            .start(shutdown, |msg| {
                let processor = &processor;
                async move {
                    if let Err(e) = processor.process(&msg).await {
                        error!(
                            error = %e,
                            topic = %msg.topic,
                            partition = msg.partition,
                            offset = msg.offset,
                            "死信投递失败，徽章事件可能丢失"
                        );
                    }
                    Ok(())
                }
            })
            .await;

        info!("徽章消费者已停止");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use chrono::Utc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    fn message(payload: Vec<u8>) -> ConsumerMessage {
        ConsumerMessage {
            topic: topics::EMBLEM_COLLECTED.to_string(),
            partition: 0,
            offset: 7,
            key: Some("mokadex-3".to_string()),
            payload,
            timestamp: Some(Utc::now().timestamp_millis()),
            headers: HashMap::new(),
        }
    }

    fn event_message() -> ConsumerMessage {
        let event = EmblemCollectedEvent::new(3, 9, 5, 11);
        message(serde_json::to_vec(&event).unwrap())
    }

    fn processor(collector: MockEmblemCollector, dlq: MockDeadLetterSink) -> EmblemProcessor {
        EmblemProcessor::new(Arc::new(collector), Arc::new(dlq), fast_policy())
    }

    #[tokio::test]
    async fn test_collects_emblem() {
        let mut collector = MockEmblemCollector::new();
        collector
            .expect_collect_emblem()
            .withf(|_, mokadex_id, emblem_id| *mokadex_id == 3 && *emblem_id == 11)
            .times(1)
            .returning(|_, mokadex_id, emblem_id| {
                let mut mokadex = Mokadex::new(mokadex_id, 9);
                mokadex.add_emblem(emblem_id);
                Ok(mokadex)
            });
        let mut dlq = MockDeadLetterSink::new();
        dlq.expect_send_to_dlq().never();

        let outcome = processor(collector, dlq)
            .process(&event_message())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Collected);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected_without_retry() {
        let mut collector = MockEmblemCollector::new();
        collector.expect_collect_emblem().never();
        let mut dlq = MockDeadLetterSink::new();
        dlq.expect_send_to_dlq().never();

        let outcome = processor(collector, dlq)
            .process(&message(b"not json".to_vec()))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Rejected);
    }

    #[tokio::test]
    async fn test_domain_error_is_rejected_after_single_attempt() {
        let mut collector = MockEmblemCollector::new();
        collector
            .expect_collect_emblem()
            .times(1)
            .returning(|_, _, _| Err(RokaMokaError::ContentDuplicated("徽章".to_string())));
        let mut dlq = MockDeadLetterSink::new();
        dlq.expect_send_to_dlq().never();

        let outcome = processor(collector, dlq)
            .process(&event_message())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Rejected);
    }

    #[tokio::test]
    async fn test_transient_error_recovers_on_retry() {
        let mut collector = MockEmblemCollector::new();
        let mut seq = mockall::Sequence::new();
        collector
            .expect_collect_emblem()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(RokaMokaError::Broker("leader not available".to_string())));
        collector
            .expect_collect_emblem()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, mokadex_id, _| Ok(Mokadex::new(mokadex_id, 9)));
        let mut dlq = MockDeadLetterSink::new();
        dlq.expect_send_to_dlq().never();

        let outcome = processor(collector, dlq)
            .process(&event_message())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Collected);
    }

    #[tokio::test]
    async fn test_exhausted_retries_go_to_dead_letter() {
        let mut collector = MockEmblemCollector::new();
        // 首次执行 + 2 次重试
        collector
            .expect_collect_emblem()
            .times(3)
            .returning(|_, _, _| Err(RokaMokaError::Broker("broker down".to_string())));
        let mut dlq = MockDeadLetterSink::new();
        dlq.expect_send_to_dlq()
            .withf(|_, topic, payload, _, retry_count| {
                topic == topics::EMBLEM_COLLECTED && payload.contains("mokadexId") && *retry_count == 2
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        let outcome = processor(collector, dlq)
            .process(&event_message())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::DeadLettered);
    }

    #[tokio::test]
    async fn test_dead_letter_failure_is_reported() {
        let mut collector = MockEmblemCollector::new();
        collector
            .expect_collect_emblem()
            .returning(|_, _, _| Err(RokaMokaError::Internal("bug".to_string())));
        let mut dlq = MockDeadLetterSink::new();
        dlq.expect_send_to_dlq()
            .times(1)
            .returning(|_, _, _, _, _| Err(SharedError::Kafka("dlq unavailable".to_string())));

        let result = processor(collector, dlq).process(&event_message()).await;
        assert!(matches!(result, Err(WorkerError::Shared(_))));
    }
}
