//! 权限申请流程集成测试

mod common;

use common::{TestApp, ctx_for};
use mokadex::models::{PermissionStatus, RoleName};
use mokadex::{RokaMokaError, ServiceContext};
use rokamoka_shared::config::BootstrapAdminConfig;

async fn bootstrap_admin(app: &TestApp) -> ServiceContext {
    let config = BootstrapAdminConfig {
        name: "Administração".to_string(),
        username: "admin".to_string(),
        email: "admin@rokamoka.dev".to_string(),
        password: "admin-segredo".to_string(),
    };
    let admin = app
        .services
        .accounts
        .ensure_bootstrap_admin(&config)
        .await
        .unwrap()
        .expect("admin created");
    assert!(admin.has_role(RoleName::Admin));
    ctx_for(&admin)
}

#[tokio::test]
async fn test_bootstrap_admin_is_idempotent() {
    let app = TestApp::new();
    bootstrap_admin(&app).await;

    let config = BootstrapAdminConfig {
        name: "Outro".to_string(),
        username: "admin".to_string(),
        email: "outro@rokamoka.dev".to_string(),
        password: "outra-senha".to_string(),
    };
    let second = app
        .services
        .accounts
        .ensure_bootstrap_admin(&config)
        .await
        .unwrap();
    assert!(second.is_none());

    // 原密码仍然有效
    assert!(app
        .services
        .accounts
        .authenticate("admin", "admin-segredo")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_only_one_pending_request_per_role() {
    let app = TestApp::new();
    let (_, ctx) = app.visitor("aspirante").await;
    let permissions = &app.services.permissions;

    let request = permissions
        .create_request(&ctx, RoleName::Curator)
        .await
        .unwrap();
    assert_eq!(request.status, PermissionStatus::Pending);

    let duplicate = permissions.create_request(&ctx, RoleName::Curator).await;
    assert!(matches!(duplicate, Err(RokaMokaError::ContentDuplicated(_))));

    // 不同角色可以同时申请
    permissions
        .create_request(&ctx, RoleName::Researcher)
        .await
        .unwrap();
    assert_eq!(permissions.list_mine(&ctx).await.unwrap().len(), 2);

    let admin_role = permissions.create_request(&ctx, RoleName::Admin).await;
    assert!(matches!(admin_role, Err(RokaMokaError::Validation(_))));
}

#[tokio::test]
async fn test_accept_grants_role() {
    let app = TestApp::new();
    let admin = bootstrap_admin(&app).await;
    let (user, ctx) = app.visitor("curadora").await;
    let permissions = &app.services.permissions;

    let request = permissions
        .create_request(&ctx, RoleName::Curator)
        .await
        .unwrap();
    assert_eq!(permissions.list_pending(&admin).await.unwrap().len(), 1);

    let accepted = permissions
        .accept(&admin, request.id, "Experiência comprovada")
        .await
        .unwrap();
    assert_eq!(accepted.status, PermissionStatus::Confirm);
    let review = accepted.review.expect("review recorded");
    assert_eq!(review.justification, "Experiência comprovada");
    assert_eq!(review.decision, PermissionStatus::Confirm);

    let current = app.services.accounts.current_user(&ctx).await.unwrap();
    assert_eq!(current.id, user.id);
    assert!(current.has_role(RoleName::Curator));
    assert!(permissions.list_pending(&admin).await.unwrap().is_empty());

    // 已持有的角色不能再申请
    let again = permissions.create_request(&ctx, RoleName::Curator).await;
    assert!(matches!(again, Err(RokaMokaError::ContentDuplicated(_))));
}

#[tokio::test]
async fn test_decided_request_cannot_change() {
    let app = TestApp::new();
    let admin = bootstrap_admin(&app).await;
    let (_, ctx) = app.visitor("pesquisador").await;
    let permissions = &app.services.permissions;

    let request = permissions
        .create_request(&ctx, RoleName::Researcher)
        .await
        .unwrap();
    let denied = permissions
        .deny(&admin, request.id, "Documentação insuficiente")
        .await
        .unwrap();
    assert_eq!(denied.status, PermissionStatus::Deny);

    let flip = permissions.accept(&admin, request.id, "Mudei de ideia").await;
    assert!(matches!(flip, Err(RokaMokaError::Forbidden(_))));

    let stored = permissions.get_request(&ctx, request.id).await.unwrap();
    assert_eq!(stored.status, PermissionStatus::Deny);
    let current = app.services.accounts.current_user(&ctx).await.unwrap();
    assert!(!current.has_role(RoleName::Researcher));

    // 被拒绝后可以重新申请
    let retry = permissions
        .create_request(&ctx, RoleName::Researcher)
        .await
        .unwrap();
    assert_ne!(retry.id, request.id);
}

#[tokio::test]
async fn test_non_admin_cannot_review() {
    let app = TestApp::new();
    let (_, requester) = app.visitor("requerente").await;
    let (_, other) = app.visitor("curioso").await;
    let permissions = &app.services.permissions;

    let request = permissions
        .create_request(&requester, RoleName::Curator)
        .await
        .unwrap();

    let result = permissions.accept(&other, request.id, "ok").await;
    assert!(matches!(result, Err(RokaMokaError::Forbidden(_))));
    let listing = permissions.list_pending(&other).await;
    assert!(matches!(listing, Err(RokaMokaError::Forbidden(_))));
    let peek = permissions.get_request(&other, request.id).await;
    assert!(matches!(peek, Err(RokaMokaError::Forbidden(_))));
}

#[tokio::test]
async fn test_unknown_request_is_not_found() {
    let app = TestApp::new();
    let admin = bootstrap_admin(&app).await;

    let result = app
        .services
        .permissions
        .deny(&admin, 777_777, "não existe")
        .await;
    assert!(matches!(result, Err(RokaMokaError::ContentNotFound(_))));
}
