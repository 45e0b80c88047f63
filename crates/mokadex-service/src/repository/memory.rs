//! 内存仓储
//!
//! 基于 `parking_lot::RwLock` 的单进程实现，适用于测试和本地开发。
//! 复现数据库的唯一约束与级联删除，使服务层在两种实现下行为一致。

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::traits::{
    ArtworkRepositoryTrait, DeviceRepositoryTrait, EmblemRepositoryTrait,
    ExhibitionRepositoryTrait, LocationRepositoryTrait, MokadexRepositoryTrait,
    PermissionRepositoryTrait, UserRepositoryTrait,
};
use crate::context::ServiceContext;
use crate::error::{Result, RokaMokaError};
use crate::models::{
    Artwork, Audit, Device, DevicePlatform, Emblem, Exhibition, Image, Location, Mokadex,
    NewArtwork, NewEmblem, NewExhibition, NewImage, NewLocation, NewUser, PermissionRequest,
    PermissionReview, PermissionStatus, RoleName, User,
};

#[derive(Default)]
struct State {
    next_id: i64,
    users: BTreeMap<i64, User>,
    devices: BTreeMap<i64, Device>,
    exhibitions: BTreeMap<i64, Exhibition>,
    artworks: BTreeMap<i64, Artwork>,
    emblems: BTreeMap<i64, Emblem>,
    locations: BTreeMap<i64, Location>,
    mokadexes: BTreeMap<i64, Mokadex>,
    requests: BTreeMap<i64, PermissionRequest>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn new_image(&mut self, image: Option<&NewImage>) -> Option<Image> {
        image.map(|img| Image {
            id: self.next_id(),
            url: img.url.clone(),
            description: img.description.clone(),
        })
    }
}

fn duplicated(constraint: &str) -> RokaMokaError {
    RokaMokaError::ContentDuplicated(constraint.to_string())
}

/// 内存存储，一个实例同时实现全部仓储接口
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// ==================== 用户 ====================

#[async_trait]
impl UserRepositoryTrait for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .state
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        Ok(self
            .state
            .read()
            .users
            .values()
            .any(|u| u.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self
            .state
            .read()
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn create(&self, ctx: &ServiceContext, new_user: &NewUser) -> Result<User> {
        let mut state = self.state.write();
        if state.users.values().any(|u| u.username == new_user.username) {
            return Err(duplicated("usuario_username_key"));
        }
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(duplicated("usuario_email_key"));
        }

        let mut roles = new_user.roles.clone();
        roles.sort();
        roles.dedup();

        let user = User {
            id: state.next_id(),
            name: new_user.name.clone(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            roles,
            audit: Audit::created(&ctx.actor()),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password(
        &self,
        ctx: &ServiceContext,
        user_id: i64,
        password_hash: &str,
    ) -> Result<()> {
        let mut state = self.state.write();
        if let Some(user) = state.users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
            user.audit.touch(&ctx.actor());
        }
        Ok(())
    }

    async fn add_role(&self, user_id: i64, role: RoleName) -> Result<()> {
        let mut state = self.state.write();
        if let Some(user) = state.users.get_mut(&user_id)
            && !user.roles.contains(&role)
        {
            user.roles.push(role);
            user.roles.sort();
        }
        Ok(())
    }
}

// ==================== 设备 ====================

#[async_trait]
impl DeviceRepositoryTrait for MemoryStore {
    async fn upsert(
        &self,
        ctx: &ServiceContext,
        user_id: i64,
        identifier: &str,
        platform: DevicePlatform,
    ) -> Result<Device> {
        let actor = ctx.actor();
        let mut state = self.state.write();

        if let Some(device) = state
            .devices
            .values_mut()
            .find(|d| d.identifier == identifier)
        {
            device.user_id = user_id;
            device.platform = platform;
            device.audit.touch(&actor);
            return Ok(device.clone());
        }

        let device = Device {
            id: state.next_id(),
            user_id,
            identifier: identifier.to_string(),
            platform,
            audit: Audit::created(&actor),
        };
        state.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Device>> {
        Ok(self
            .state
            .read()
            .devices
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }
}

// ==================== 展览 ====================

#[async_trait]
impl ExhibitionRepositoryTrait for MemoryStore {
    async fn list(&self) -> Result<Vec<Exhibition>> {
        Ok(self.state.read().exhibitions.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Exhibition>> {
        Ok(self.state.read().exhibitions.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.state.read().exhibitions.contains_key(&id))
    }

    async fn create(
        &self,
        ctx: &ServiceContext,
        exhibition: &NewExhibition,
    ) -> Result<Exhibition> {
        let mut state = self.state.write();
        let image = state.new_image(exhibition.image.as_ref());
        let created = Exhibition {
            id: state.next_id(),
            name: exhibition.name.clone(),
            description: exhibition.description.clone(),
            start_date: exhibition.start_date,
            end_date: exhibition.end_date,
            location_id: exhibition.location_id,
            image_id: image.as_ref().map(|i| i.id),
            image,
            audit: Audit::created(&ctx.actor()),
        };
        state.exhibitions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &ServiceContext,
        id: i64,
        exhibition: &NewExhibition,
    ) -> Result<Option<Exhibition>> {
        let mut state = self.state.write();
        let image = state.new_image(exhibition.image.as_ref());
        let Some(current) = state.exhibitions.get_mut(&id) else {
            return Ok(None);
        };

        current.name = exhibition.name.clone();
        current.description = exhibition.description.clone();
        current.start_date = exhibition.start_date;
        current.end_date = exhibition.end_date;
        current.location_id = exhibition.location_id;
        if let Some(image) = image {
            current.image_id = Some(image.id);
            current.image = Some(image);
        }
        current.audit.touch(&ctx.actor());
        Ok(Some(current.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write();
        if state.exhibitions.remove(&id).is_none() {
            return Ok(false);
        }

        let artwork_ids: Vec<i64> = state
            .artworks
            .values()
            .filter(|a| a.exhibition_id == id)
            .map(|a| a.id)
            .collect();
        let emblem_ids: Vec<i64> = state
            .emblems
            .values()
            .filter(|e| e.exhibition_id == id)
            .map(|e| e.id)
            .collect();

        for artwork_id in &artwork_ids {
            state.artworks.remove(artwork_id);
        }
        for emblem_id in &emblem_ids {
            state.emblems.remove(emblem_id);
        }
        for mokadex in state.mokadexes.values_mut() {
            mokadex.artworks.retain(|a| !artwork_ids.contains(a));
            mokadex.emblems.retain(|e| !emblem_ids.contains(e));
        }
        Ok(true)
    }
}

// ==================== 展品 ====================

#[async_trait]
impl ArtworkRepositoryTrait for MemoryStore {
    async fn list(&self) -> Result<Vec<Artwork>> {
        Ok(self.state.read().artworks.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Artwork>> {
        Ok(self.state.read().artworks.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Artwork>> {
        let state = self.state.read();
        Ok(state
            .artworks
            .values()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn find_by_qr_code(&self, qr_code: &str) -> Result<Option<Artwork>> {
        Ok(self
            .state
            .read()
            .artworks
            .values()
            .find(|a| a.qr_code == qr_code)
            .cloned())
    }

    async fn list_by_exhibition(&self, exhibition_id: i64) -> Result<Vec<Artwork>> {
        Ok(self
            .state
            .read()
            .artworks
            .values()
            .filter(|a| a.exhibition_id == exhibition_id)
            .cloned()
            .collect())
    }

    async fn count_by_exhibition(&self, exhibition_id: i64) -> Result<i64> {
        Ok(self
            .state
            .read()
            .artworks
            .values()
            .filter(|a| a.exhibition_id == exhibition_id)
            .count() as i64)
    }

    async fn create(&self, ctx: &ServiceContext, artwork: &NewArtwork) -> Result<Artwork> {
        let mut state = self.state.write();
        if !state.exhibitions.contains_key(&artwork.exhibition_id) {
            return Err(RokaMokaError::not_found("展览", artwork.exhibition_id));
        }
        if state.artworks.values().any(|a| a.qr_code == artwork.qr_code) {
            return Err(duplicated("obra_qr_code_key"));
        }

        let image = state.new_image(artwork.image.as_ref());
        let created = Artwork {
            id: state.next_id(),
            exhibition_id: artwork.exhibition_id,
            name: artwork.name.clone(),
            author: artwork.author.clone(),
            description: artwork.description.clone(),
            qr_code: artwork.qr_code.clone(),
            image_id: image.as_ref().map(|i| i.id),
            image,
            audit: Audit::created(&ctx.actor()),
        };
        state.artworks.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &ServiceContext,
        id: i64,
        artwork: &NewArtwork,
    ) -> Result<Option<Artwork>> {
        let mut state = self.state.write();
        if !state.artworks.contains_key(&id) {
            return Ok(None);
        }
        if state
            .artworks
            .values()
            .any(|a| a.id != id && a.qr_code == artwork.qr_code)
        {
            return Err(duplicated("obra_qr_code_key"));
        }

        let image = state.new_image(artwork.image.as_ref());
        let Some(current) = state.artworks.get_mut(&id) else {
            return Ok(None);
        };
        current.exhibition_id = artwork.exhibition_id;
        current.name = artwork.name.clone();
        current.author = artwork.author.clone();
        current.description = artwork.description.clone();
        current.qr_code = artwork.qr_code.clone();
        if let Some(image) = image {
            current.image_id = Some(image.id);
            current.image = Some(image);
        }
        current.audit.touch(&ctx.actor());
        Ok(Some(current.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write();
        if state.artworks.remove(&id).is_none() {
            return Ok(false);
        }
        for mokadex in state.mokadexes.values_mut() {
            mokadex.artworks.remove(&id);
        }
        Ok(true)
    }
}

// ==================== 徽章 ====================

#[async_trait]
impl EmblemRepositoryTrait for MemoryStore {
    async fn list(&self) -> Result<Vec<Emblem>> {
        Ok(self.state.read().emblems.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Emblem>> {
        Ok(self.state.read().emblems.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Emblem>> {
        let state = self.state.read();
        Ok(state
            .emblems
            .values()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }

    async fn find_by_exhibition(&self, exhibition_id: i64) -> Result<Option<Emblem>> {
        Ok(self
            .state
            .read()
            .emblems
            .values()
            .find(|e| e.exhibition_id == exhibition_id)
            .cloned())
    }

    async fn create(&self, ctx: &ServiceContext, emblem: &NewEmblem) -> Result<Emblem> {
        let mut state = self.state.write();
        if !state.exhibitions.contains_key(&emblem.exhibition_id) {
            return Err(RokaMokaError::not_found("展览", emblem.exhibition_id));
        }
        if state
            .emblems
            .values()
            .any(|e| e.exhibition_id == emblem.exhibition_id)
        {
            return Err(duplicated("emblema_exhibition_id_key"));
        }

        let image = state.new_image(emblem.image.as_ref());
        let created = Emblem {
            id: state.next_id(),
            exhibition_id: emblem.exhibition_id,
            name: emblem.name.clone(),
            description: emblem.description.clone(),
            image_id: image.as_ref().map(|i| i.id),
            image,
            audit: Audit::created(&ctx.actor()),
        };
        state.emblems.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write();
        if state.emblems.remove(&id).is_none() {
            return Ok(false);
        }
        for mokadex in state.mokadexes.values_mut() {
            mokadex.emblems.remove(&id);
        }
        Ok(true)
    }
}

// ==================== 地点 ====================

#[async_trait]
impl LocationRepositoryTrait for MemoryStore {
    async fn list(&self) -> Result<Vec<Location>> {
        Ok(self.state.read().locations.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Location>> {
        Ok(self.state.read().locations.get(&id).cloned())
    }

    async fn create(&self, ctx: &ServiceContext, location: &NewLocation) -> Result<Location> {
        let mut state = self.state.write();
        let created = Location {
            id: state.next_id(),
            name: location.name.clone(),
            address: location.address.clone(),
            audit: Audit::created(&ctx.actor()),
        };
        state.locations.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        ctx: &ServiceContext,
        id: i64,
        location: &NewLocation,
    ) -> Result<Option<Location>> {
        let mut state = self.state.write();
        let Some(current) = state.locations.get_mut(&id) else {
            return Ok(None);
        };
        current.name = location.name.clone();
        current.address = location.address.clone();
        current.audit.touch(&ctx.actor());
        Ok(Some(current.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write();
        if state.locations.remove(&id).is_none() {
            return Ok(false);
        }
        // ON DELETE SET NULL
        for exhibition in state.exhibitions.values_mut() {
            if exhibition.location_id == Some(id) {
                exhibition.location_id = None;
            }
        }
        Ok(true)
    }
}

// ==================== 收藏册 ====================

#[async_trait]
impl MokadexRepositoryTrait for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Mokadex>> {
        Ok(self.state.read().mokadexes.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Option<Mokadex>> {
        Ok(self
            .state
            .read()
            .mokadexes
            .values()
            .find(|m| m.user_id == user_id)
            .cloned())
    }

    async fn get_or_create(&self, user_id: i64) -> Result<Mokadex> {
        let mut state = self.state.write();
        if let Some(existing) = state.mokadexes.values().find(|m| m.user_id == user_id) {
            return Ok(existing.clone());
        }
        let mokadex = Mokadex::new(state.next_id(), user_id);
        state.mokadexes.insert(mokadex.id, mokadex.clone());
        Ok(mokadex)
    }

    async fn add_artwork(&self, mokadex_id: i64, artwork_id: i64) -> Result<bool> {
        let mut state = self.state.write();
        if !state.artworks.contains_key(&artwork_id) {
            return Err(RokaMokaError::not_found("展品", artwork_id));
        }
        let mokadex = state
            .mokadexes
            .get_mut(&mokadex_id)
            .ok_or_else(|| RokaMokaError::not_found("收藏册", mokadex_id))?;
        Ok(mokadex.add_artwork(artwork_id))
    }

    async fn add_emblem(&self, mokadex_id: i64, emblem_id: i64) -> Result<bool> {
        let mut state = self.state.write();
        if !state.emblems.contains_key(&emblem_id) {
            return Err(RokaMokaError::not_found("徽章", emblem_id));
        }
        let mokadex = state
            .mokadexes
            .get_mut(&mokadex_id)
            .ok_or_else(|| RokaMokaError::not_found("收藏册", mokadex_id))?;
        Ok(mokadex.add_emblem(emblem_id))
    }

    async fn count_collected_in_exhibition(
        &self,
        mokadex_id: i64,
        exhibition_id: i64,
    ) -> Result<i64> {
        let state = self.state.read();
        let Some(mokadex) = state.mokadexes.get(&mokadex_id) else {
            return Ok(0);
        };
        Ok(state
            .artworks
            .values()
            .filter(|a| a.exhibition_id == exhibition_id && mokadex.has_artwork(a.id))
            .count() as i64)
    }

    async fn count_collectors(&self, exhibition_id: i64) -> Result<i64> {
        let state = self.state.read();
        let artwork_ids: Vec<i64> = state
            .artworks
            .values()
            .filter(|a| a.exhibition_id == exhibition_id)
            .map(|a| a.id)
            .collect();
        Ok(state
            .mokadexes
            .values()
            .filter(|m| artwork_ids.iter().any(|id| m.has_artwork(*id)))
            .count() as i64)
    }

    async fn count_emblem_holders(&self, emblem_id: i64) -> Result<i64> {
        Ok(self
            .state
            .read()
            .mokadexes
            .values()
            .filter(|m| m.has_emblem(emblem_id))
            .count() as i64)
    }

    async fn artwork_collection_counts(&self, exhibition_id: i64) -> Result<Vec<(i64, i64)>> {
        let state = self.state.read();
        Ok(state
            .artworks
            .values()
            .filter(|a| a.exhibition_id == exhibition_id)
            .map(|a| {
                let count = state
                    .mokadexes
                    .values()
                    .filter(|m| m.has_artwork(a.id))
                    .count() as i64;
                (a.id, count)
            })
            .collect())
    }
}

// ==================== 权限申请 ====================

#[async_trait]
impl PermissionRepositoryTrait for MemoryStore {
    async fn create(&self, user_id: i64, role: RoleName) -> Result<PermissionRequest> {
        let mut state = self.state.write();
        if state
            .requests
            .values()
            .any(|r| r.user_id == user_id && r.role == role && r.is_pending())
        {
            return Err(duplicated("uk_solicitacao_pending"));
        }

        let now = Utc::now();
        let request = PermissionRequest {
            id: state.next_id(),
            user_id,
            role,
            status: PermissionStatus::Pending,
            created_at: now,
            updated_at: now,
            review: None,
        };
        state.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PermissionRequest>> {
        Ok(self.state.read().requests.get(&id).cloned())
    }

    async fn exists_pending(&self, user_id: i64, role: RoleName) -> Result<bool> {
        Ok(self
            .state
            .read()
            .requests
            .values()
            .any(|r| r.user_id == user_id && r.role == role && r.is_pending()))
    }

    async fn list_pending(&self) -> Result<Vec<PermissionRequest>> {
        Ok(self
            .state
            .read()
            .requests
            .values()
            .filter(|r| r.is_pending())
            .cloned()
            .collect())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<PermissionRequest>> {
        Ok(self
            .state
            .read()
            .requests
            .values()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn decide(
        &self,
        request_id: i64,
        reviewer_id: i64,
        decision: PermissionStatus,
        justification: &str,
    ) -> Result<Option<PermissionRequest>> {
        // 写锁覆盖整个审批过程，等价于数据库事务
        let mut state = self.state.write();
        let review_id = state.next_id();

        let Some(request) = state.requests.get_mut(&request_id) else {
            return Ok(None);
        };
        if !request.is_pending() {
            return Ok(None);
        }

        let now = Utc::now();
        request.status = decision;
        request.updated_at = now;
        request.review = Some(PermissionReview {
            id: review_id,
            request_id,
            reviewer_id,
            decision,
            justification: justification.to_string(),
            created_at: now,
        });
        let decided = request.clone();

        if decision == PermissionStatus::Confirm
            && let Some(user) = state.users.get_mut(&decided.user_id)
            && !user.roles.contains(&decided.role)
        {
            user.roles.push(decided.role);
            user.roles.sort();
        }

        Ok(Some(decided))
    }
}
