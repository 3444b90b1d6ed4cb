mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use account_service::domain::role::{Role, RoleRepository};
use account_service::domain::user::{User, UserRepository};
use account_service::infrastructure::{InMemoryAccountStore, SeaOrmRoleRepository, SeaOrmUserRepository};
use account_service::shared::PaginationFilter;
use account_service::{DomainError, ErrorKind, RequestContext};

use common::create_test_db;

fn user(name: &str, username: &str, email: &str) -> User {
    User::new(name, format!("{name} Example"), username, email, "$2b$04$hash".into())
}

/// Five users with strictly increasing `updated_at`
async fn seed_users(repo: &SeaOrmUserRepository, ctx: &RequestContext) -> Vec<User> {
    let base = Utc::now();
    let mut out = Vec::new();
    for (i, name) in ["Alice", "Alina", "Bob", "Carol", "Dave"].iter().enumerate() {
        let mut u = user(name, &name.to_lowercase(), &format!("{}@example.com", name.to_lowercase()));
        u.updated_at = base + Duration::seconds(i as i64);
        out.push(repo.create(ctx, u).await.unwrap());
    }
    out
}

#[tokio::test]
async fn create_and_read_back_by_every_key() {
    let repo = SeaOrmUserRepository::new(create_test_db().await);
    let ctx = RequestContext::background();

    let created = repo.create(&ctx, user("Alice", "alice", "a@x.com")).await.unwrap();

    let by_id = repo.get_by_id(&ctx, created.id).await.unwrap();
    assert_eq!(by_id.username, "alice");
    assert!(by_id.is_active);
    assert!(by_id.role.is_none());

    assert_eq!(repo.get_by_email(&ctx, "a@x.com").await.unwrap().id, created.id);
    assert_eq!(repo.get_by_username(&ctx, "alice").await.unwrap().id, created.id);

    let err = repo.get_by_username(&ctx, "nobody").await.unwrap_err();
    match err {
        DomainError::NotFound { entity, field, value } => {
            assert_eq!(entity, "User");
            assert_eq!(field, "username");
            assert_eq!(value, "nobody");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn duplicates_are_conflicts_naming_the_column() {
    let repo = SeaOrmUserRepository::new(create_test_db().await);
    let ctx = RequestContext::background();
    repo.create(&ctx, user("Alice", "alice", "a@x.com")).await.unwrap();

    let err = repo
        .create(&ctx, user("Other", "alice", "other@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict { entity: "User", field: Some("username") }));

    let err = repo
        .create(&ctx, user("Other", "other", "a@x.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict { entity: "User", field: Some("email") }));
}

#[tokio::test]
async fn page_size_offset_and_filtered_total() {
    let repo = SeaOrmUserRepository::new(create_test_db().await);
    let ctx = RequestContext::background();
    let seeded = seed_users(&repo, &ctx).await;

    let page = repo
        .get_all(&ctx, &PaginationFilter::new("", 2, 2, "asc"))
        .await
        .unwrap();
    let ids: Vec<Uuid> = page.items.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![seeded[2].id, seeded[3].id]);
    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);

    let page = repo
        .get_all(&ctx, &PaginationFilter::new("", 2, 1, "desc"))
        .await
        .unwrap();
    let names: Vec<&str> = page.items.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Dave", "Carol"]);

    // Anything but "asc"/"desc" sorts ascending
    let page = repo
        .get_all(&ctx, &PaginationFilter::new("", 1, 1, "DESC"))
        .await
        .unwrap();
    assert_eq!(page.items[0].id, seeded[0].id);

    // Total follows the search predicate, not the table
    let page = repo
        .get_all(&ctx, &PaginationFilter::new("ALI", 1, 1, "asc"))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 2);

    // Page past the end
    let page = repo
        .get_all(&ctx, &PaginationFilter::new("", 10, 4, "asc"))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn search_matches_email_and_treats_wildcards_literally() {
    let repo = SeaOrmUserRepository::new(create_test_db().await);
    let ctx = RequestContext::background();
    repo.create(&ctx, user("Alice", "alice", "alice@corp.io")).await.unwrap();
    repo.create(&ctx, user("Bob", "bob", "bob_smith@corp.io")).await.unwrap();
    repo.create(&ctx, user("Carol", "carol", "carolxsmith@home.net")).await.unwrap();

    let page = repo
        .get_all(&ctx, &PaginationFilter::new("CORP.IO", 10, 1, "asc"))
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let page = repo
        .get_all(&ctx, &PaginationFilter::new("_smith", 10, 1, "asc"))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].username, "bob");
}

#[tokio::test]
async fn non_ascii_search_matches_like_the_in_memory_store() {
    let repo = SeaOrmUserRepository::new(create_test_db().await);
    let store = InMemoryAccountStore::new();
    let ctx = RequestContext::background();

    for u in [
        user("Éloïse", "eloise", "eloise@x.com"),
        user("Øystein", "oystein", "ØYSTEIN@x.com"),
        user("Bob", "bob", "bob@x.com"),
    ] {
        repo.create(&ctx, u.clone()).await.unwrap();
        UserRepository::create(&store, &ctx, u).await.unwrap();
    }

    for (term, expected) in [("ÉLO", 1), ("éloï", 1), ("øyst", 1), ("ØYSTEIN@", 1), ("x.com", 3), ("zzz", 0)] {
        let filter = PaginationFilter::new(term, 10, 1, "asc");
        let sql = repo.get_all(&ctx, &filter).await.unwrap();
        let mem = store.get_all(&ctx, &filter).await.unwrap();
        assert_eq!(sql.total, expected, "sqlite total for {term:?}");
        assert_eq!(mem.total, expected, "memory total for {term:?}");
    }

    // A rename refreshes the search key
    let mut renamed = repo.get_by_username(&ctx, "bob").await.unwrap();
    renamed.name = "Ängel".into();
    repo.update(&ctx, renamed).await.unwrap();
    let page = repo
        .get_all(&ctx, &PaginationFilter::new("äng", 10, 1, "asc"))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].username, "bob");
}

#[tokio::test]
async fn huge_page_and_limit_return_an_empty_page() {
    let repo = SeaOrmUserRepository::new(create_test_db().await);
    let ctx = RequestContext::background();
    seed_users(&repo, &ctx).await;

    for (limit, page) in [(1u64 << 40, 1u64 << 40), (u64::MAX, u64::MAX), (10, u64::MAX)] {
        let result = repo
            .get_all(&ctx, &PaginationFilter::new("", limit, page, "asc"))
            .await
            .unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total, 5);
    }
}

#[tokio::test]
async fn update_and_delete_of_missing_rows_are_not_found() {
    let repo = SeaOrmUserRepository::new(create_test_db().await);
    let ctx = RequestContext::background();

    let ghost = user("Ghost", "ghost", "ghost@x.com");
    let err = repo.update(&ctx, ghost.clone()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = repo.delete(&ctx, ghost.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn update_persists_fields_and_loads_role() {
    let db = create_test_db().await;
    let users = SeaOrmUserRepository::new(db.clone());
    let roles = SeaOrmRoleRepository::new(db);
    let ctx = RequestContext::background();

    let role = roles
        .create(&ctx, Role::new("admin", vec!["users:write".into()]))
        .await
        .unwrap();
    let mut u = users.create(&ctx, user("Alice", "alice", "a@x.com")).await.unwrap();

    u.email = "new@x.com".into();
    u.role_id = Some(role.id);
    let updated = users.update(&ctx, u.clone()).await.unwrap();

    assert_eq!(updated.email, "new@x.com");
    assert_eq!(updated.created_at, u.created_at);
    let loaded = updated.role.expect("role loaded");
    assert_eq!(loaded.name, "admin");
    assert_eq!(loaded.permissions, vec!["users:write".to_string()]);
}

#[tokio::test]
async fn dangling_role_reference_is_role_not_found() {
    let repo = SeaOrmUserRepository::new(create_test_db().await);
    let ctx = RequestContext::background();

    let mut u = user("Alice", "alice", "a@x.com");
    u.role_id = Some(Uuid::new_v4());

    let err = repo.create(&ctx, u).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "Role", .. }));
}

#[tokio::test]
async fn cancelled_context_does_not_touch_storage() {
    let repo = SeaOrmUserRepository::new(create_test_db().await);
    let token = tokio_util::sync::CancellationToken::new();
    token.cancel();
    let ctx = RequestContext::with_cancellation(token);

    let err = repo
        .create(&ctx, user("Alice", "alice", "a@x.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);

    let ctx = RequestContext::background();
    assert!(repo.get_by_username(&ctx, "alice").await.unwrap_err().is_not_found());
}
