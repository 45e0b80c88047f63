//! 服务层 DTO
//!
//! 服务方法的输入与组合输出，API 层直接序列化这些结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Artwork, Emblem, Mokadex};

/// 注册输入（明文密码，由服务哈希）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// 收藏册视图：展开展品与徽章详情
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MokadexView {
    pub id: i64,
    pub user_id: i64,
    pub artworks: Vec<Artwork>,
    pub emblems: Vec<Emblem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MokadexView {
    pub fn new(mokadex: &Mokadex, artworks: Vec<Artwork>, emblems: Vec<Emblem>) -> Self {
        Self {
            id: mokadex.id,
            user_id: mokadex.user_id,
            artworks,
            emblems,
            created_at: mokadex.created_at,
            updated_at: mokadex.updated_at,
        }
    }

    pub fn artwork_ids(&self) -> Vec<i64> {
        self.artworks.iter().map(|a| a.id).collect()
    }
}

/// 扫码收集结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResult {
    pub mokadex: MokadexView,
    pub artwork: Artwork,
    /// 本次扫码是否新加入了展品（重复扫码为 false）
    pub newly_collected: bool,
    /// 本次收集是否使所属展览集齐
    pub exhibition_completed: bool,
    /// 是否已发布徽章事件
    pub emblem_event_published: bool,
}

/// 当前用户在某展览的收集进度
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhibitionCompletion {
    pub exhibition_id: i64,
    pub total_artworks: i64,
    pub collected_artworks: i64,
    pub completed: bool,
    pub emblem_id: Option<i64>,
    pub emblem_collected: bool,
}

/// 单件展品的收集统计
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkStatistic {
    pub artwork_id: i64,
    pub name: String,
    pub collected_count: i64,
}

/// 展览统计（研究员视角）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhibitionStatistics {
    pub exhibition_id: i64,
    pub exhibition_name: String,
    pub total_artworks: i64,
    /// 至少收集了一件展品的收藏册数
    pub collectors: i64,
    pub emblem_id: Option<i64>,
    pub emblem_holders: i64,
    pub artworks: Vec<ArtworkStatistic>,
}
