//! 目录维护与研究统计集成测试

mod common;

use chrono::NaiveDate;

use common::{TestApp, curator_ctx};
use mokadex::models::{Address, NewArtwork, NewEmblem, NewExhibition, NewImage, NewLocation, RoleName};
use mokadex::{Principal, RokaMokaError, ServiceContext};

fn exhibition(name: &str, location_id: Option<i64>) -> NewExhibition {
    NewExhibition {
        name: name.to_string(),
        description: Some("Acervo permanente".to_string()),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 10),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 20),
        location_id,
        image: Some(NewImage {
            url: "https://cdn.rokamoka.dev/expo.png".to_string(),
            description: None,
        }),
    }
}

fn artwork(exhibition_id: i64, qr_code: &str) -> NewArtwork {
    NewArtwork {
        exhibition_id,
        name: format!("Obra {qr_code}"),
        author: None,
        description: None,
        qr_code: qr_code.to_string(),
        image: None,
    }
}

fn location(name: &str) -> NewLocation {
    NewLocation {
        name: name.to_string(),
        address: Address {
            street: Some("Avenida Paulista".to_string()),
            number: Some("1578".to_string()),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            country: "Brasil".to_string(),
            ..Default::default()
        },
    }
}

fn researcher_ctx() -> ServiceContext {
    ServiceContext::for_principal(Principal::new(
        9_100,
        "pesquisa",
        vec![RoleName::User, RoleName::Researcher],
    ))
}

#[tokio::test]
async fn test_catalog_writes_require_curator_or_admin() {
    let app = TestApp::new();
    let (_, visitor) = app.visitor("visitante").await;
    let catalog = &app.services.catalog;

    let result = catalog
        .create_exhibition(&visitor, exhibition("Proibida", None))
        .await;
    assert!(matches!(result, Err(RokaMokaError::Forbidden(_))));

    let anonymous = catalog.list_exhibitions(&ServiceContext::default()).await;
    assert!(matches!(anonymous, Err(RokaMokaError::Unauthorized(_))));

    // 任意登录用户可查询
    assert!(catalog.list_exhibitions(&visitor).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_exhibition_lifecycle_with_location() {
    let app = TestApp::new();
    let curator = curator_ctx();
    let catalog = &app.services.catalog;

    let masp = catalog
        .create_location(&curator, location("MASP"))
        .await
        .unwrap();
    let created = catalog
        .create_exhibition(&curator, exhibition("Acervo em transformação", Some(masp.id)))
        .await
        .unwrap();
    assert_eq!(created.location_id, Some(masp.id));
    assert!(created.image.is_some());
    assert_eq!(created.audit.created_by.as_deref(), Some("curadoria"));

    let missing_location = catalog
        .create_exhibition(&curator, exhibition("Sem lugar", Some(404)))
        .await;
    assert!(matches!(
        missing_location,
        Err(RokaMokaError::ContentNotFound(_))
    ));

    let mut reversed = exhibition("Datas invertidas", None);
    reversed.start_date = NaiveDate::from_ymd_opt(2025, 5, 1);
    reversed.end_date = NaiveDate::from_ymd_opt(2025, 4, 1);
    let invalid = catalog.create_exhibition(&curator, reversed).await;
    assert!(matches!(invalid, Err(RokaMokaError::Validation(_))));

    let updated = catalog
        .update_exhibition(&curator, created.id, exhibition("Acervo renovado", Some(masp.id)))
        .await
        .unwrap();
    assert_eq!(updated.name, "Acervo renovado");

    let unknown = catalog
        .update_exhibition(&curator, 123_456, exhibition("Fantasma", None))
        .await;
    assert!(matches!(unknown, Err(RokaMokaError::ContentNotFound(_))));

    catalog.delete_location(&curator, masp.id).await.unwrap();
    let detached = catalog.get_exhibition(&curator, created.id).await.unwrap();
    assert_eq!(detached.location_id, None);
}

#[tokio::test]
async fn test_artwork_qr_codes_are_unique() {
    let app = TestApp::new();
    let curator = curator_ctx();
    let catalog = &app.services.catalog;
    let expo = catalog
        .create_exhibition(&curator, exhibition("Pinacoteca", None))
        .await
        .unwrap();

    let first = catalog
        .create_artwork(&curator, artwork(expo.id, "QR-001"))
        .await
        .unwrap();
    let second = catalog
        .create_artwork(&curator, artwork(expo.id, "QR-002"))
        .await
        .unwrap();

    let duplicate = catalog
        .create_artwork(&curator, artwork(expo.id, "QR-001"))
        .await;
    assert!(matches!(duplicate, Err(RokaMokaError::ContentDuplicated(_))));

    let steal = catalog
        .update_artwork(&curator, second.id, artwork(expo.id, "QR-001"))
        .await;
    assert!(matches!(steal, Err(RokaMokaError::ContentDuplicated(_))));

    // 保留自身二维码的更新是允许的
    let renamed = catalog
        .update_artwork(&curator, first.id, artwork(expo.id, "QR-001"))
        .await
        .unwrap();
    assert_eq!(renamed.qr_code, "QR-001");

    let found = catalog
        .get_artwork_by_qr_code(&curator, "QR-002")
        .await
        .unwrap();
    assert_eq!(found.id, second.id);

    let orphan = catalog.create_artwork(&curator, artwork(999, "QR-999")).await;
    assert!(matches!(orphan, Err(RokaMokaError::ContentNotFound(_))));

    let listed = catalog
        .list_exhibition_artworks(&curator, expo.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_one_emblem_per_exhibition() {
    let app = TestApp::new();
    let curator = curator_ctx();
    let catalog = &app.services.catalog;
    let expo = catalog
        .create_exhibition(&curator, exhibition("Tropicália", None))
        .await
        .unwrap();

    let emblem = NewEmblem {
        exhibition_id: expo.id,
        name: "Parangolé".to_string(),
        description: None,
        image: None,
    };
    let created = catalog.create_emblem(&curator, emblem.clone()).await.unwrap();

    let second = catalog.create_emblem(&curator, emblem).await;
    assert!(matches!(second, Err(RokaMokaError::ContentDuplicated(_))));

    let by_exhibition = catalog
        .get_emblem_by_exhibition(&curator, expo.id)
        .await
        .unwrap();
    assert_eq!(by_exhibition.id, created.id);
}

#[tokio::test]
async fn test_deleting_exhibition_removes_its_artworks() {
    let app = TestApp::new();
    let curator = curator_ctx();
    let catalog = &app.services.catalog;
    let (exhibition_id, emblem_id) = app.exhibition_with("Efêmera", &["QR-E1"], true).await;
    let artwork = catalog
        .get_artwork_by_qr_code(&curator, "QR-E1")
        .await
        .unwrap();

    catalog
        .delete_exhibition(&curator, exhibition_id)
        .await
        .unwrap();

    let gone = catalog.get_artwork(&curator, artwork.id).await;
    assert!(matches!(gone, Err(RokaMokaError::ContentNotFound(_))));
    let emblem = catalog.get_emblem(&curator, emblem_id.unwrap()).await;
    assert!(matches!(emblem, Err(RokaMokaError::ContentNotFound(_))));

    let again = catalog.delete_exhibition(&curator, exhibition_id).await;
    assert!(matches!(again, Err(RokaMokaError::ContentNotFound(_))));
}

#[tokio::test]
async fn test_exhibition_statistics() {
    let app = TestApp::new();
    let (exhibition_id, emblem_id) = app
        .exhibition_with("Concretismo", &["QR-C1", "QR-C2"], true)
        .await;
    let collection = &app.services.collection;

    let (_, ana) = app.visitor("ana").await;
    let (_, bia) = app.visitor("bia").await;
    let (_, caio) = app.visitor("caio").await;

    collection.collect_star(&ana, "QR-C1").await.unwrap();
    collection.collect_star(&ana, "QR-C2").await.unwrap();
    collection.collect_star(&bia, "QR-C1").await.unwrap();
    // caio só abre o Mokadex
    collection.get_my_mokadex(&caio).await.unwrap();

    for event in app.publisher.drain() {
        collection
            .collect_emblem(&ServiceContext::system(), event.mokadex_id, event.emblem_id)
            .await
            .unwrap();
    }

    let research = &app.services.research;
    let stats = research
        .exhibition_statistics(&researcher_ctx(), exhibition_id)
        .await
        .unwrap();
    assert_eq!(stats.exhibition_name, "Concretismo");
    assert_eq!(stats.total_artworks, 2);
    assert_eq!(stats.collectors, 2);
    assert_eq!(stats.emblem_id, emblem_id);
    assert_eq!(stats.emblem_holders, 1);

    let counts: Vec<i64> = stats.artworks.iter().map(|a| a.collected_count).collect();
    assert_eq!(counts, vec![2, 1]);

    let visitor = research.exhibition_statistics(&ana, exhibition_id).await;
    assert!(matches!(visitor, Err(RokaMokaError::Forbidden(_))));
    let unknown = research
        .exhibition_statistics(&researcher_ctx(), 404_404)
        .await;
    assert!(matches!(unknown, Err(RokaMokaError::ContentNotFound(_))));
}
