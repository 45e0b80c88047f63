//! 账号流程集成测试

mod common;

use common::{TestApp, account, ctx_for};
use mokadex::models::{DevicePlatform, RoleName};
use mokadex::{RokaMokaError, ServiceContext};

#[tokio::test]
async fn test_register_and_authenticate() {
    let app = TestApp::new();
    let accounts = &app.services.accounts;

    let user = accounts
        .register(&ServiceContext::default(), account("maria", "senha-forte"))
        .await
        .unwrap();
    assert_eq!(user.roles, vec![RoleName::User]);
    assert_ne!(user.password_hash, "senha-forte");

    let logged = accounts.authenticate("maria", "senha-forte").await.unwrap();
    assert_eq!(logged.id, user.id);

    let wrong = accounts.authenticate("maria", "errada").await;
    assert!(matches!(wrong, Err(RokaMokaError::Unauthorized(_))));
    let unknown = accounts.authenticate("ninguem", "senha-forte").await;
    assert!(matches!(unknown, Err(RokaMokaError::Unauthorized(_))));
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let app = TestApp::new();
    let accounts = &app.services.accounts;
    let ctx = ServiceContext::default();

    accounts
        .register(&ctx, account("joao", "senha-forte"))
        .await
        .unwrap();

    let same_username = accounts.register(&ctx, account("joao", "outra-senha")).await;
    assert!(matches!(
        same_username,
        Err(RokaMokaError::ContentDuplicated(_))
    ));

    let mut same_email = account("joao2", "outra-senha");
    same_email.email = "JOAO@rokamoka.dev".to_string();
    let result = accounts.register(&ctx, same_email).await;
    assert!(matches!(result, Err(RokaMokaError::ContentDuplicated(_))));
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = TestApp::new();
    let result = app
        .services
        .accounts
        .register(&ServiceContext::default(), account("x", "123"))
        .await;
    assert!(matches!(result, Err(RokaMokaError::Validation(_))));
}

#[tokio::test]
async fn test_reset_password_only_for_self() {
    let app = TestApp::new();
    let accounts = &app.services.accounts;
    let (alice, alice_ctx) = app.visitor("alice").await;
    let (bob, _) = app.visitor("bob").await;

    let other = accounts
        .reset_password(&alice_ctx, bob.id, "invadida")
        .await;
    assert!(matches!(other, Err(RokaMokaError::Forbidden(_))));

    let missing = accounts
        .reset_password(&alice_ctx, 999_999, "qualquer")
        .await;
    assert!(matches!(missing, Err(RokaMokaError::ContentNotFound(_))));

    accounts
        .reset_password(&alice_ctx, alice.id, "nova-senha")
        .await
        .unwrap();
    assert!(accounts.authenticate("alice", "nova-senha").await.is_ok());
    assert!(accounts.authenticate("alice", "segredo123").await.is_err());
    // bob não é afetado
    assert!(accounts.authenticate("bob", "segredo123").await.is_ok());
}

#[tokio::test]
async fn test_device_moves_to_latest_user() {
    let app = TestApp::new();
    let accounts = &app.services.accounts;
    let (_, first) = app.visitor("primeiro").await;
    let (second_user, second) = app.visitor("segundo").await;

    let device = accounts
        .register_device(&first, "device-abc", DevicePlatform::Android)
        .await
        .unwrap();
    assert_eq!(accounts.list_devices(&first).await.unwrap().len(), 1);

    let moved = accounts
        .register_device(&second, "device-abc", DevicePlatform::Ios)
        .await
        .unwrap();
    assert_eq!(moved.id, device.id);
    assert_eq!(moved.user_id, second_user.id);
    assert_eq!(moved.platform, DevicePlatform::Ios);
    assert!(accounts.list_devices(&first).await.unwrap().is_empty());

    let blank = accounts
        .register_device(&second, "   ", DevicePlatform::Web)
        .await;
    assert!(matches!(blank, Err(RokaMokaError::Validation(_))));
}

#[tokio::test]
async fn test_current_user_requires_login() {
    let app = TestApp::new();
    let (user, _) = app.visitor("logado").await;

    let anonymous = app
        .services
        .accounts
        .current_user(&ServiceContext::default())
        .await;
    assert!(matches!(anonymous, Err(RokaMokaError::Unauthorized(_))));

    let me = app
        .services
        .accounts
        .current_user(&ctx_for(&user))
        .await
        .unwrap();
    assert_eq!(me.username, "logado");
}
