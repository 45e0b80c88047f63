//! 请求 DTO
//!
//! 字段格式校验在此完成，业务规则校验在服务层。

use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use mokadex::models::{
    Address, DevicePlatform, NewArtwork, NewEmblem, NewExhibition, NewImage, NewLocation, RoleName,
};
use mokadex::service::dto::NewAccount;

// ==================== 账号 ====================

/// 注册请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 120, message = "姓名长度必须在 1-120 之间"))]
    pub name: String,
    #[validate(length(min = 3, max = 50, message = "用户名长度必须在 3-50 之间"))]
    pub username: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(length(min = 6, max = 72, message = "密码长度必须在 6-72 之间"))]
    pub password: String,
}

impl From<RegisterRequest> for NewAccount {
    fn from(req: RegisterRequest) -> Self {
        Self {
            name: req.name,
            username: req.username,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    #[validate(length(min = 6, max = 72, message = "密码长度必须在 6-72 之间"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    #[validate(length(min = 1, max = 255, message = "设备标识长度必须在 1-255 之间"))]
    pub identifier: String,
    pub platform: DevicePlatform,
}

// ==================== 目录 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[validate(length(min = 1, max = 1024, message = "图片地址长度必须在 1-1024 之间"))]
    pub url: String,
    pub description: Option<String>,
}

impl From<ImageRequest> for NewImage {
    fn from(req: ImageRequest) -> Self {
        Self {
            url: req.url,
            description: req.description,
        }
    }
}

/// 展览创建/更新请求；更新时不传图片则保留原图
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExhibitionRequest {
    #[validate(length(min = 1, max = 255, message = "展览名称长度必须在 1-255 之间"))]
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location_id: Option<i64>,
    #[validate(nested)]
    pub image: Option<ImageRequest>,
}

impl From<ExhibitionRequest> for NewExhibition {
    fn from(req: ExhibitionRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            location_id: req.location_id,
            image: req.image.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkRequest {
    pub exhibition_id: i64,
    #[validate(length(min = 1, max = 255, message = "展品名称长度必须在 1-255 之间"))]
    pub name: String,
    pub author: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255, message = "二维码长度必须在 1-255 之间"))]
    pub qr_code: String,
    #[validate(nested)]
    pub image: Option<ImageRequest>,
}

impl From<ArtworkRequest> for NewArtwork {
    fn from(req: ArtworkRequest) -> Self {
        Self {
            exhibition_id: req.exhibition_id,
            name: req.name,
            author: req.author,
            description: req.description,
            qr_code: req.qr_code,
            image: req.image.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmblemRequest {
    pub exhibition_id: i64,
    #[validate(length(min = 1, max = 255, message = "徽章名称长度必须在 1-255 之间"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(nested)]
    pub image: Option<ImageRequest>,
}

impl From<EmblemRequest> for NewEmblem {
    fn from(req: EmblemRequest) -> Self {
        Self {
            exhibition_id: req.exhibition_id,
            name: req.name,
            description: req.description,
            image: req.image.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    #[validate(length(min = 1, max = 255, message = "城市不能为空"))]
    pub city: String,
    #[validate(length(min = 1, max = 255, message = "州不能为空"))]
    pub state: String,
    #[validate(length(min = 1, max = 255, message = "国家不能为空"))]
    pub country: String,
    pub postal_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    #[validate(length(min = 1, max = 255, message = "地点名称长度必须在 1-255 之间"))]
    pub name: String,
    #[validate(nested)]
    pub address: AddressRequest,
}

impl From<LocationRequest> for NewLocation {
    fn from(req: LocationRequest) -> Self {
        let a = req.address;
        Self {
            name: req.name,
            address: Address {
                street: a.street,
                number: a.number,
                complement: a.complement,
                district: a.district,
                city: a.city,
                state: a.state,
                country: a.country,
                postal_code: a.postal_code,
            },
        }
    }
}

// ==================== 权限申请 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionRequest {
    pub role: RoleName,
}

/// 审批意见
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    #[validate(length(min = 1, max = 500, message = "审批意见长度必须在 1-500 之间"))]
    pub justification: String,
}
