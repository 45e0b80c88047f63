//! 领域模型定义
//!
//! 实体按 `id` 判等：两个实例只要 id 相同即视为同一实体，与其余字段无关。

/// 为实体实现基于 `id` 的 PartialEq / Eq / Hash
macro_rules! identity_eq {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    self.id == other.id
                }
            }

            impl Eq for $ty {}

            impl std::hash::Hash for $ty {
                fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                    self.id.hash(state);
                }
            }
        )+
    };
}

mod audit;
mod catalog;
mod enums;
mod mokadex;
mod permission;
mod user;

pub use audit::Audit;
pub use catalog::{
    Address, Artwork, Emblem, Exhibition, Image, Location, NewArtwork, NewEmblem, NewExhibition,
    NewImage, NewLocation,
};
pub use enums::{DevicePlatform, PermissionStatus, RoleName};
pub use mokadex::Mokadex;
pub use permission::{PermissionRequest, PermissionReview};
pub use user::{Device, NewUser, Role, User};
