//! 端到端：扫码集齐展览 -> 发布事件 -> worker 收集徽章

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use emblem_worker::{DeadLetterSink, EmblemProcessor, Outcome};
use mokadex::models::{NewArtwork, NewEmblem, NewExhibition, RoleName};
use mokadex::service::dto::NewAccount;
use mokadex::{
    MemoryStore, Principal, RecordingPublisher, Repositories, ServiceContext, Services,
};
use rokamoka_shared::error::SharedError;
use rokamoka_shared::events::EmblemCollectedEvent;
use rokamoka_shared::kafka::{ConsumerMessage, topics};
use rokamoka_shared::retry::RetryPolicy;

#[derive(Default)]
struct RecordingDlq {
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl DeadLetterSink for RecordingDlq {
    async fn send_to_dlq(
        &self,
        message_id: &str,
        _source_topic: &str,
        _payload: &str,
        _error: &str,
        _retry_count: u32,
    ) -> Result<(), SharedError> {
        self.messages.lock().push(message_id.to_string());
        Ok(())
    }
}

struct Fixture {
    services: Services,
    publisher: Arc<RecordingPublisher>,
    dlq: Arc<RecordingDlq>,
    processor: EmblemProcessor,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let repos = Repositories::in_memory(store);
    let services = Services::with_bcrypt_cost(&repos, publisher.clone(), 4);
    let dlq = Arc::new(RecordingDlq::default());
    let processor = EmblemProcessor::new(
        services.collection.clone(),
        dlq.clone(),
        RetryPolicy {
            max_retries: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            multiplier: 1.0,
        },
    );
    Fixture {
        services,
        publisher,
        dlq,
        processor,
    }
}

fn message(event: &EmblemCollectedEvent) -> ConsumerMessage {
    ConsumerMessage {
        topic: topics::EMBLEM_COLLECTED.to_string(),
        partition: 0,
        offset: 0,
        key: Some(event.partition_key()),
        payload: serde_json::to_vec(event).unwrap(),
        timestamp: None,
        headers: HashMap::new(),
    }
}

/// 一个展览、两件展品、一枚徽章；访客扫完两件展品
async fn complete_exhibition(services: &Services) -> (ServiceContext, i64) {
    let curator = ServiceContext::for_principal(Principal::new(
        9_000,
        "curadoria",
        vec![RoleName::User, RoleName::Curator],
    ));

    let exhibition = services
        .catalog
        .create_exhibition(
            &curator,
            NewExhibition {
                name: "Tropicália".to_string(),
                description: None,
                start_date: None,
                end_date: None,
                location_id: None,
                image: None,
            },
        )
        .await
        .unwrap();

    for qr_code in ["QR-PARANGOLE", "QR-BOLIDE"] {
        services
            .catalog
            .create_artwork(
                &curator,
                NewArtwork {
                    exhibition_id: exhibition.id,
                    name: qr_code.to_string(),
                    author: None,
                    description: None,
                    qr_code: qr_code.to_string(),
                    image: None,
                },
            )
            .await
            .unwrap();
    }

    let emblem = services
        .catalog
        .create_emblem(
            &curator,
            NewEmblem {
                exhibition_id: exhibition.id,
                name: "Tropicalista".to_string(),
                description: None,
                image: None,
            },
        )
        .await
        .unwrap();

    let user = services
        .accounts
        .register(
            &ServiceContext::default(),
            NewAccount {
                name: "Hélio Oiticica".to_string(),
                username: "helio".to_string(),
                email: "helio@rokamoka.dev".to_string(),
                password: "segredo123".to_string(),
            },
        )
        .await
        .unwrap();
    let visitor = ServiceContext::for_principal(Principal::new(
        user.id,
        user.username.clone(),
        user.roles.clone(),
    ));

    services
        .collection
        .collect_star(&visitor, "QR-PARANGOLE")
        .await
        .unwrap();
    services
        .collection
        .collect_star(&visitor, "QR-BOLIDE")
        .await
        .unwrap();

    (visitor, emblem.id)
}

#[tokio::test]
async fn test_published_event_is_collected_once() {
    let fx = fixture();
    let (visitor, emblem_id) = complete_exhibition(&fx.services).await;

    let events = fx.publisher.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].emblem_id, emblem_id);

    let outcome = fx.processor.process(&message(&events[0])).await.unwrap();
    assert_eq!(outcome, Outcome::Collected);
    // 收集徽章不会发布新事件
    assert!(fx.publisher.events().is_empty());

    let view = fx
        .services
        .collection
        .get_my_mokadex(&visitor)
        .await
        .unwrap();
    assert_eq!(view.emblems.len(), 1);
    assert_eq!(view.emblems[0].id, emblem_id);

    // 重复投递的事件被拒绝，不进入死信队列
    let outcome = fx.processor.process(&message(&events[0])).await.unwrap();
    assert_eq!(outcome, Outcome::Rejected);
    assert!(fx.dlq.messages.lock().is_empty());
}

#[tokio::test]
async fn test_event_for_unknown_mokadex_is_rejected() {
    let fx = fixture();
    let (_, emblem_id) = complete_exhibition(&fx.services).await;

    let event = EmblemCollectedEvent::new(404, 1, 1, emblem_id);
    let outcome = fx.processor.process(&message(&event)).await.unwrap();

    assert_eq!(outcome, Outcome::Rejected);
    assert!(fx.dlq.messages.lock().is_empty());
}

#[tokio::test]
async fn test_incomplete_exhibition_is_rejected() {
    let fx = fixture();
    let (_, emblem_id) = complete_exhibition(&fx.services).await;
    let event = fx.publisher.drain().remove(0);

    let other = fx
        .services
        .accounts
        .register(
            &ServiceContext::default(),
            NewAccount {
                name: "Lygia Clark".to_string(),
                username: "lygia".to_string(),
                email: "lygia@rokamoka.dev".to_string(),
                password: "segredo123".to_string(),
            },
        )
        .await
        .unwrap();
    let other_ctx = ServiceContext::for_principal(Principal::new(
        other.id,
        other.username.clone(),
        other.roles.clone(),
    ));
    let partial = fx
        .services
        .collection
        .collect_star(&other_ctx, "QR-BOLIDE")
        .await
        .unwrap();

    // 伪造事件：另一个只集了一件展品的收藏册
    let forged = EmblemCollectedEvent::new(partial.mokadex.id, other.id, event.exhibition_id, emblem_id);
    let outcome = fx.processor.process(&message(&forged)).await.unwrap();

    assert_eq!(outcome, Outcome::Rejected);
}
