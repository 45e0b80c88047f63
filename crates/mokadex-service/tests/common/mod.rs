//! 集成测试公共夹具：内存仓储 + 记录型发布者

#![allow(dead_code)]

use std::sync::Arc;

use fake::Fake;
use fake::faker::name::en::Name;

use mokadex::models::{NewArtwork, NewEmblem, NewExhibition, RoleName, User};
use mokadex::service::dto::NewAccount;
use mokadex::{MemoryStore, Principal, RecordingPublisher, Repositories, ServiceContext, Services};

/// 测试中使用最低的 bcrypt cost
pub const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub services: Services,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_publisher(RecordingPublisher::new())
    }

    pub fn with_publisher(publisher: RecordingPublisher) -> Self {
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(publisher);
        let repos = Repositories::in_memory(store.clone());
        let services = Services::with_bcrypt_cost(&repos, publisher.clone(), TEST_BCRYPT_COST);
        Self {
            store,
            publisher,
            services,
        }
    }

    /// 注册一个普通访客并返回其上下文
    pub async fn visitor(&self, username: &str) -> (User, ServiceContext) {
        let user = self
            .services
            .accounts
            .register(&ServiceContext::default(), account(username, "segredo123"))
            .await
            .expect("register visitor");
        let ctx = ctx_for(&user);
        (user, ctx)
    }

    /// 创建展览、若干展品以及可选的徽章
    pub async fn exhibition_with(
        &self,
        name: &str,
        qr_codes: &[&str],
        with_emblem: bool,
    ) -> (i64, Option<i64>) {
        let curator = curator_ctx();
        let catalog = &self.services.catalog;

        let exhibition = catalog
            .create_exhibition(
                &curator,
                NewExhibition {
                    name: name.to_string(),
                    description: None,
                    start_date: None,
                    end_date: None,
                    location_id: None,
                    image: None,
                },
            )
            .await
            .expect("create exhibition");

        for qr_code in qr_codes {
            catalog
                .create_artwork(
                    &curator,
                    NewArtwork {
                        exhibition_id: exhibition.id,
                        name: format!("Obra {qr_code}"),
                        author: Some(Name().fake()),
                        description: None,
                        qr_code: qr_code.to_string(),
                        image: None,
                    },
                )
                .await
                .expect("create artwork");
        }

        let emblem_id = if with_emblem {
            let emblem = catalog
                .create_emblem(
                    &curator,
                    NewEmblem {
                        exhibition_id: exhibition.id,
                        name: format!("Emblema {name}"),
                        description: None,
                        image: None,
                    },
                )
                .await
                .expect("create emblem");
            Some(emblem.id)
        } else {
            None
        };

        (exhibition.id, emblem_id)
    }
}

pub fn account(username: &str, password: &str) -> NewAccount {
    NewAccount {
        name: Name().fake(),
        username: username.to_string(),
        email: format!("{username}@rokamoka.dev"),
        password: password.to_string(),
    }
}

pub fn ctx_for(user: &User) -> ServiceContext {
    ServiceContext::for_principal(Principal::new(
        user.id,
        user.username.clone(),
        user.roles.clone(),
    ))
}

pub fn curator_ctx() -> ServiceContext {
    ServiceContext::for_principal(Principal::new(
        9_000,
        "curadoria",
        vec![RoleName::User, RoleName::Curator],
    ))
}
