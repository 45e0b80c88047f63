//! Mokadex：用户的个人收藏册

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户的收藏册，每个用户一个
///
/// 展品和徽章都是集合语义，重复加入是无操作
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mokadex {
    pub id: i64,
    pub user_id: i64,
    pub artworks: BTreeSet<i64>,
    pub emblems: BTreeSet<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

identity_eq!(Mokadex);

impl Mokadex {
    pub fn new(id: i64, user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            artworks: BTreeSet::new(),
            emblems: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 加入展品，返回是否为新加入
    pub fn add_artwork(&mut self, artwork_id: i64) -> bool {
        let inserted = self.artworks.insert(artwork_id);
        if inserted {
            self.updated_at = Utc::now();
        }
        inserted
    }

    /// 加入徽章，返回是否为新加入
    pub fn add_emblem(&mut self, emblem_id: i64) -> bool {
        let inserted = self.emblems.insert(emblem_id);
        if inserted {
            self.updated_at = Utc::now();
        }
        inserted
    }

    pub fn has_artwork(&self, artwork_id: i64) -> bool {
        self.artworks.contains(&artwork_id)
    }

    pub fn has_emblem(&self, emblem_id: i64) -> bool {
        self.emblems.contains(&emblem_id)
    }
}
