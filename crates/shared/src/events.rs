//! 跨服务事件模型
//!
//! API 服务在 Mokadex 集齐某展览全部作品时发布 [`EmblemCollectedEvent`]，
//! 徽章 worker 消费后把对应徽章收入 Mokadex。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 徽章收集事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmblemCollectedEvent {
    pub event_id: String,
    pub mokadex_id: i64,
    pub user_id: i64,
    pub exhibition_id: i64,
    pub emblem_id: i64,
    pub occurred_at: DateTime<Utc>,
}

impl EmblemCollectedEvent {
    pub fn new(mokadex_id: i64, user_id: i64, exhibition_id: i64, emblem_id: i64) -> Self {
        Self {
            event_id: Uuid::now_v7().to_string(),
            mokadex_id,
            user_id,
            exhibition_id,
            emblem_id,
            occurred_at: Utc::now(),
        }
    }

    /// 消息 key：同一 Mokadex 的事件落在同一分区，保证分区内有序
    pub fn partition_key(&self) -> String {
        format!("mokadex-{}", self.mokadex_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_camel_case() {
        let event = EmblemCollectedEvent::new(3, 9, 5, 11);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["mokadexId"], 3);
        assert_eq!(json["userId"], 9);
        assert_eq!(json["exhibitionId"], 5);
        assert_eq!(json["emblemId"], 11);
        assert!(json["eventId"].is_string());
        assert!(json["occurredAt"].is_string());
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = EmblemCollectedEvent::new(1, 1, 1, 1);
        let b = EmblemCollectedEvent::new(1, 1, 1, 1);
        assert_ne!(a.event_id, b.event_id);
        assert_eq!(a.partition_key(), "mokadex-1");
    }
}
