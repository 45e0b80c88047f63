//! 目录实体：展览、展品、徽章、地点与图片

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::audit::Audit;

/// 图片，随所属实体一起创建
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: i64,
    pub url: String,
    #[sqlx(default)]
    pub description: Option<String>,
}

identity_eq!(Image);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImage {
    pub url: String,
    pub description: Option<String>,
}

/// 地址，内嵌在地点中
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[sqlx(default)]
    pub street: Option<String>,
    #[sqlx(default)]
    pub number: Option<String>,
    #[sqlx(default)]
    pub complement: Option<String>,
    #[sqlx(default)]
    pub district: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    #[sqlx(default)]
    pub postal_code: Option<String>,
}

/// 展览举办地点
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i64,
    pub name: String,
    #[sqlx(flatten)]
    pub address: Address,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

identity_eq!(Location);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub name: String,
    pub address: Address,
}

/// 展览
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Exhibition {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    #[sqlx(default)]
    pub start_date: Option<NaiveDate>,
    #[sqlx(default)]
    pub end_date: Option<NaiveDate>,
    #[sqlx(default)]
    pub location_id: Option<i64>,
    #[sqlx(default)]
    pub image_id: Option<i64>,
    #[sqlx(skip)]
    pub image: Option<Image>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

identity_eq!(Exhibition);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExhibition {
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location_id: Option<i64>,
    pub image: Option<NewImage>,
}

/// 展品，通过二维码被参观者收集
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: i64,
    pub exhibition_id: i64,
    pub name: String,
    #[sqlx(default)]
    pub author: Option<String>,
    #[sqlx(default)]
    pub description: Option<String>,
    /// 全局唯一
    pub qr_code: String,
    #[sqlx(default)]
    pub image_id: Option<i64>,
    #[sqlx(skip)]
    pub image: Option<Image>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

identity_eq!(Artwork);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtwork {
    pub exhibition_id: i64,
    pub name: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub qr_code: String,
    pub image: Option<NewImage>,
}

/// 徽章，每个展览最多一个，收集齐展览全部展品后获得
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Emblem {
    pub id: i64,
    pub exhibition_id: i64,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    #[sqlx(default)]
    pub image_id: Option<i64>,
    #[sqlx(skip)]
    pub image: Option<Image>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

identity_eq!(Emblem);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmblem {
    pub exhibition_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<NewImage>,
}
