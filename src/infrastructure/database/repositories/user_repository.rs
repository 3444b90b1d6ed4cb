use async_trait::async_trait;
use sea_orm::sea_query::{Condition, Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::db_errors::{db_err, is_foreign_key_violation, like_pattern, sort_order, write_err};
use super::role_repository::role_model_to_domain;
use crate::domain::user::{User, UserRepository};
use crate::infrastructure::database::entities::{role, user};
use crate::shared::{fold_case, PaginatedResult, PaginationFilter};
use crate::support::{DomainError, DomainResult, RequestContext};

const USER_UNIQUE_COLUMNS: &[&str] = &["username", "email"];

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_one(
        &self,
        ctx: &RequestContext,
        condition: Condition,
        field: &'static str,
        value: &str,
    ) -> DomainResult<User> {
        let found = ctx
            .guard("users.find_one", async {
                user::Entity::find()
                    .filter(condition)
                    .find_also_related(role::Entity)
                    .one(&self.db)
                    .await
                    .map_err(db_err("users.find_one"))
            })
            .await?;

        match found {
            Some((model, role)) => user_model_to_domain(model, role),
            None => Err(DomainError::not_found("User", field, value)),
        }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn user_model_to_domain(model: user::Model, role: Option<role::Model>) -> DomainResult<User> {
    Ok(User {
        id: model.id,
        name: model.name,
        full_name: model.full_name,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        role_id: model.role_id,
        role: role.map(role_model_to_domain).transpose()?,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn user_write_err(role_id: Option<Uuid>, operation: &'static str) -> impl FnOnce(DbErr) -> DomainError {
    move |e| match role_id {
        Some(role_id) if is_foreign_key_violation(&e) => DomainError::not_found("Role", "id", role_id),
        _ => write_err("User", USER_UNIQUE_COLUMNS, operation)(e),
    }
}

fn search_condition(term: &str) -> Condition {
    let pattern = like_pattern(term);
    Condition::any()
        .add(
            Expr::col((user::Entity, user::Column::NameSearch))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
        .add(
            Expr::col((user::Entity, user::Column::EmailSearch))
                .like(LikeExpr::new(pattern).escape('\\')),
        )
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn get_all(
        &self,
        ctx: &RequestContext,
        filter: &PaginationFilter,
    ) -> DomainResult<PaginatedResult<User>> {
        let mut query = user::Entity::find();

        // Apply search filter (name or email)
        if let Some(term) = filter.search_term() {
            query = query.filter(search_condition(&term));
        }

        let order = sort_order(filter.sort);
        debug!(
            page = filter.page,
            limit = filter.limit,
            sort = %filter.sort,
            search = %filter.search,
            "Listing users"
        );

        let (total, rows) = ctx
            .guard("users.get_all", async {
                // Count total over the same filtered query
                let total = query
                    .clone()
                    .count(&self.db)
                    .await
                    .map_err(db_err("users.count"))?;

                // Paginate
                let rows = query
                    .order_by(user::Column::UpdatedAt, order.clone())
                    .order_by(user::Column::Id, order)
                    .offset(filter.offset())
                    .limit(filter.query_limit())
                    .find_also_related(role::Entity)
                    .all(&self.db)
                    .await
                    .map_err(db_err("users.get_all"))?;

                Ok((total, rows))
            })
            .await?;

        let items = rows
            .into_iter()
            .map(|(model, role)| user_model_to_domain(model, role))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total, filter.page, filter.limit))
    }

    async fn get_by_id(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<User> {
        self.find_one(
            ctx,
            Condition::all().add(user::Column::Id.eq(id)),
            "id",
            &id.to_string(),
        )
        .await
    }

    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> DomainResult<User> {
        self.find_one(
            ctx,
            Condition::all().add(user::Column::Email.eq(email)),
            "email",
            email,
        )
        .await
    }

    async fn get_by_username(&self, ctx: &RequestContext, username: &str) -> DomainResult<User> {
        self.find_one(
            ctx,
            Condition::all().add(user::Column::Username.eq(username)),
            "username",
            username,
        )
        .await
    }

    async fn create(&self, ctx: &RequestContext, user: User) -> DomainResult<User> {
        let id = user.id;
        let new_user = user::ActiveModel {
            id: Set(user.id),
            name_search: Set(fold_case(&user.name)),
            email_search: Set(fold_case(&user.email)),
            name: Set(user.name),
            full_name: Set(user.full_name),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role_id: Set(user.role_id),
            is_active: Set(user.is_active),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        };

        ctx.guard("users.create", async {
            new_user
                .insert(&self.db)
                .await
                .map_err(user_write_err(user.role_id, "users.create"))
        })
        .await?;

        info!(user_id = %id, "User created");
        self.get_by_id(ctx, id).await
    }

    async fn update(&self, ctx: &RequestContext, user: User) -> DomainResult<User> {
        let id = user.id;
        let active = user::ActiveModel {
            name_search: Set(fold_case(&user.name)),
            email_search: Set(fold_case(&user.email)),
            name: Set(user.name),
            full_name: Set(user.full_name),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role_id: Set(user.role_id),
            is_active: Set(user.is_active),
            updated_at: Set(user.updated_at),
            ..Default::default()
        };

        let result = ctx
            .guard("users.update", async {
                user::Entity::update_many()
                    .set(active)
                    .filter(user::Column::Id.eq(id))
                    .exec(&self.db)
                    .await
                    .map_err(user_write_err(user.role_id, "users.update"))
            })
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", "id", id));
        }

        info!(user_id = %id, "User updated");
        self.get_by_id(ctx, id).await
    }

    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<()> {
        let result = ctx
            .guard("users.delete", async {
                user::Entity::delete_by_id(id)
                    .exec(&self.db)
                    .await
                    .map_err(db_err("users.delete"))
            })
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", "id", id));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}
