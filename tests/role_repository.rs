mod common;

use uuid::Uuid;

use account_service::domain::role::{Role, RoleRepository};
use account_service::domain::user::{User, UserRepository};
use account_service::infrastructure::{SeaOrmRoleRepository, SeaOrmUserRepository};
use account_service::shared::PaginationFilter;
use account_service::{DomainError, ErrorKind, RequestContext};

use common::create_test_db;

async fn repos() -> (SeaOrmRoleRepository, SeaOrmUserRepository) {
    let db = create_test_db().await;
    (SeaOrmRoleRepository::new(db.clone()), SeaOrmUserRepository::new(db))
}

fn perms(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn seed_user(users: &SeaOrmUserRepository, ctx: &RequestContext) -> User {
    users
        .create(ctx, User::new("Ann", "Ann Example", "ann", "ann@x.com", "hash".into()))
        .await
        .unwrap()
}

#[tokio::test]
async fn permissions_round_trip_through_json_column() {
    let (roles, _) = repos().await;
    let ctx = RequestContext::background();

    let created = roles
        .create(&ctx, Role::new("editor", perms(&["posts:write", "posts:read"])))
        .await
        .unwrap();

    let found = roles.find_by_name(&ctx, "editor").await.unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.permissions, perms(&["posts:write", "posts:read"]));
    assert!(found.has_permission("posts:read"));
}

#[tokio::test]
async fn role_names_are_unique() {
    let (roles, _) = repos().await;
    let ctx = RequestContext::background();
    roles.create(&ctx, Role::new("admin", vec![])).await.unwrap();
    let other = roles.create(&ctx, Role::new("viewer", vec![])).await.unwrap();

    let err = roles.create(&ctx, Role::new("admin", vec![])).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict { entity: "Role", field: Some("name") }));

    // Renaming onto a taken name
    let mut renamed = other.clone();
    renamed.name = "admin".into();
    let err = roles.update(&ctx, renamed).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn find_many_skips_unknown_ids() {
    let (roles, _) = repos().await;
    let ctx = RequestContext::background();
    let b = roles.create(&ctx, Role::new("beta", vec![])).await.unwrap();
    let a = roles.create(&ctx, Role::new("alpha", vec![])).await.unwrap();

    let found = roles
        .find_many_by_id(&ctx, &[b.id, Uuid::new_v4(), a.id])
        .await
        .unwrap();
    let names: Vec<&str> = found.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);

    assert!(roles.find_many_by_id(&ctx, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn find_all_filters_by_name() {
    let (roles, _) = repos().await;
    let ctx = RequestContext::background();
    for name in ["admin", "auditor", "viewer"] {
        roles.create(&ctx, Role::new(name, vec![])).await.unwrap();
    }

    let page = roles
        .find_all(&ctx, &PaginationFilter::new("A", 1, 1, "asc"))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 2);

    let page = roles.find_all(&ctx, &PaginationFilter::default()).await.unwrap();
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn find_all_folds_non_ascii_names_and_survives_huge_pages() {
    let (roles, _) = repos().await;
    let ctx = RequestContext::background();
    roles.create(&ctx, Role::new("Überprüfer", vec![])).await.unwrap();
    roles.create(&ctx, Role::new("viewer", vec![])).await.unwrap();

    let page = roles
        .find_all(&ctx, &PaginationFilter::new("ÜBER", 10, 1, "asc"))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Überprüfer");

    let page = roles
        .find_all(&ctx, &PaginationFilter::new("", 1 << 40, 1 << 40, "asc"))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn update_and_delete_unknown_role_are_not_found() {
    let (roles, _) = repos().await;
    let ctx = RequestContext::background();
    let ghost = Role::new("ghost", vec![]);

    assert_eq!(roles.update(&ctx, ghost.clone()).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(roles.delete(&ctx, ghost.id).await.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn assign_and_unassign_are_idempotent() {
    let (roles, users) = repos().await;
    let ctx = RequestContext::background();
    let role = roles.create(&ctx, Role::new("admin", vec![])).await.unwrap();
    let user = seed_user(&users, &ctx).await;

    roles.assign_user(&ctx, user.id, role.id).await.unwrap();
    roles.assign_user(&ctx, user.id, role.id).await.unwrap();
    let loaded = users.get_by_id(&ctx, user.id).await.unwrap();
    assert_eq!(loaded.role_id, Some(role.id));
    assert_eq!(loaded.role.map(|r| r.name), Some("admin".to_string()));

    // A role the user does not hold is left alone
    let other = roles.create(&ctx, Role::new("viewer", vec![])).await.unwrap();
    roles.unassign_user(&ctx, user.id, other.id).await.unwrap();
    assert_eq!(users.get_by_id(&ctx, user.id).await.unwrap().role_id, Some(role.id));

    roles.unassign_user(&ctx, user.id, role.id).await.unwrap();
    roles.unassign_user(&ctx, user.id, role.id).await.unwrap();
    assert_eq!(users.get_by_id(&ctx, user.id).await.unwrap().role_id, None);
}

#[tokio::test]
async fn assign_requires_role_and_user() {
    let (roles, users) = repos().await;
    let ctx = RequestContext::background();
    let role = roles.create(&ctx, Role::new("admin", vec![])).await.unwrap();
    let user = seed_user(&users, &ctx).await;

    let err = roles.assign_user(&ctx, user.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "Role", .. }));

    let err = roles.assign_user(&ctx, Uuid::new_v4(), role.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "User", .. }));

    let err = roles.unassign_user(&ctx, Uuid::new_v4(), role.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "User", .. }));
}

#[tokio::test]
async fn deleting_a_role_detaches_its_users() {
    let (roles, users) = repos().await;
    let ctx = RequestContext::background();
    let role = roles.create(&ctx, Role::new("admin", vec![])).await.unwrap();
    let user = seed_user(&users, &ctx).await;
    roles.assign_user(&ctx, user.id, role.id).await.unwrap();

    roles.delete(&ctx, role.id).await.unwrap();

    let loaded = users.get_by_id(&ctx, user.id).await.unwrap();
    assert_eq!(loaded.role_id, None);
    assert!(loaded.role.is_none());
}
