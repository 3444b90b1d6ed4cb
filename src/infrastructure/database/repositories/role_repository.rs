//! SeaORM implementation of RoleRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::db_errors::{db_err, is_foreign_key_violation, like_pattern, sort_order, write_err};
use crate::domain::role::{Role, RoleRepository};
use crate::infrastructure::database::entities::{role, user};
use crate::shared::{fold_case, PaginatedResult, PaginationFilter};
use crate::support::{DomainError, DomainResult, RequestContext};

const ROLE_UNIQUE_COLUMNS: &[&str] = &["name"];

pub struct SeaOrmRoleRepository {
    db: DatabaseConnection,
}

impl SeaOrmRoleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn role_model_to_domain(model: role::Model) -> DomainResult<Role> {
    let permissions: Vec<String> = serde_json::from_str(&model.permissions).map_err(|e| {
        DomainError::internal("DECODE_ERROR", "stored role permissions are malformed", e)
    })?;

    Ok(Role {
        id: model.id,
        name: model.name,
        permissions,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn encode_permissions(permissions: &[String]) -> DomainResult<String> {
    serde_json::to_string(permissions)
        .map_err(|e| DomainError::internal("ENCODE_ERROR", "failed to encode permissions", e))
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl RoleRepository for SeaOrmRoleRepository {
    async fn create(&self, ctx: &RequestContext, role: Role) -> DomainResult<Role> {
        let active = role::ActiveModel {
            id: Set(role.id),
            name_search: Set(fold_case(&role.name)),
            name: Set(role.name.clone()),
            permissions: Set(encode_permissions(&role.permissions)?),
            created_at: Set(role.created_at),
            updated_at: Set(role.updated_at),
        };

        let model = ctx
            .guard("roles.create", async {
                active
                    .insert(&self.db)
                    .await
                    .map_err(write_err("Role", ROLE_UNIQUE_COLUMNS, "roles.create"))
            })
            .await?;

        info!(role_id = %model.id, name = %model.name, "Role created");
        role_model_to_domain(model)
    }

    async fn find_by_id(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<Role> {
        let model = ctx
            .guard("roles.find_by_id", async {
                role::Entity::find_by_id(id)
                    .one(&self.db)
                    .await
                    .map_err(db_err("roles.find_by_id"))
            })
            .await?
            .ok_or_else(|| DomainError::not_found("Role", "id", id))?;

        role_model_to_domain(model)
    }

    async fn find_by_name(&self, ctx: &RequestContext, name: &str) -> DomainResult<Role> {
        let model = ctx
            .guard("roles.find_by_name", async {
                role::Entity::find()
                    .filter(role::Column::Name.eq(name))
                    .one(&self.db)
                    .await
                    .map_err(db_err("roles.find_by_name"))
            })
            .await?
            .ok_or_else(|| DomainError::not_found("Role", "name", name))?;

        role_model_to_domain(model)
    }

    async fn find_many_by_id(&self, ctx: &RequestContext, ids: &[Uuid]) -> DomainResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = ctx
            .guard("roles.find_many_by_id", async {
                role::Entity::find()
                    .filter(role::Column::Id.is_in(ids.iter().copied()))
                    .order_by_asc(role::Column::Name)
                    .all(&self.db)
                    .await
                    .map_err(db_err("roles.find_many_by_id"))
            })
            .await?;

        models.into_iter().map(role_model_to_domain).collect()
    }

    async fn find_all(
        &self,
        ctx: &RequestContext,
        filter: &PaginationFilter,
    ) -> DomainResult<PaginatedResult<Role>> {
        let mut query = role::Entity::find();

        if let Some(term) = filter.search_term() {
            query = query.filter(
                Expr::col((role::Entity, role::Column::NameSearch))
                    .like(LikeExpr::new(like_pattern(&term)).escape('\\')),
            );
        }

        let order = sort_order(filter.sort);
        debug!(
            page = filter.page,
            limit = filter.limit,
            sort = %filter.sort,
            search = %filter.search,
            "Listing roles"
        );

        let (total, models) = ctx
            .guard("roles.find_all", async {
                // Count and page share the same predicate
                let total = query
                    .clone()
                    .count(&self.db)
                    .await
                    .map_err(db_err("roles.count"))?;

                let models = query
                    .order_by(role::Column::UpdatedAt, order.clone())
                    .order_by(role::Column::Id, order)
                    .offset(filter.offset())
                    .limit(filter.query_limit())
                    .all(&self.db)
                    .await
                    .map_err(db_err("roles.find_all"))?;

                Ok((total, models))
            })
            .await?;

        let items = models
            .into_iter()
            .map(role_model_to_domain)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total, filter.page, filter.limit))
    }

    async fn update(&self, ctx: &RequestContext, role: Role) -> DomainResult<Role> {
        let id = role.id;
        let active = role::ActiveModel {
            name_search: Set(fold_case(&role.name)),
            name: Set(role.name),
            permissions: Set(encode_permissions(&role.permissions)?),
            updated_at: Set(role.updated_at),
            ..Default::default()
        };

        let result = ctx
            .guard("roles.update", async {
                role::Entity::update_many()
                    .set(active)
                    .filter(role::Column::Id.eq(id))
                    .exec(&self.db)
                    .await
                    .map_err(write_err("Role", ROLE_UNIQUE_COLUMNS, "roles.update"))
            })
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Role", "id", id));
        }

        info!(role_id = %id, "Role updated");
        self.find_by_id(ctx, id).await
    }

    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<()> {
        let result = ctx
            .guard("roles.delete", async {
                role::Entity::delete_by_id(id)
                    .exec(&self.db)
                    .await
                    .map_err(db_err("roles.delete"))
            })
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Role", "id", id));
        }

        info!(role_id = %id, "Role deleted");
        Ok(())
    }

    async fn assign_user(&self, ctx: &RequestContext, user_id: Uuid, role_id: Uuid) -> DomainResult<()> {
        self.find_by_id(ctx, role_id).await?;
        let current = load_user(&self.db, ctx, user_id).await?;

        if current.role_id == Some(role_id) {
            debug!(%user_id, %role_id, "Role already assigned");
            return Ok(());
        }

        let result = ctx
            .guard("roles.assign_user", async {
                user::Entity::update_many()
                    .col_expr(user::Column::RoleId, Expr::value(Some(role_id)))
                    .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(user::Column::Id.eq(user_id))
                    .exec(&self.db)
                    .await
                    .map_err(|e| {
                        if is_foreign_key_violation(&e) {
                            DomainError::not_found("Role", "id", role_id)
                        } else {
                            db_err("roles.assign_user")(e)
                        }
                    })
            })
            .await?;

        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", "id", user_id));
        }

        info!(%user_id, %role_id, "Role assigned to user");
        Ok(())
    }

    async fn unassign_user(&self, ctx: &RequestContext, user_id: Uuid, role_id: Uuid) -> DomainResult<()> {
        let current = load_user(&self.db, ctx, user_id).await?;

        if current.role_id != Some(role_id) {
            debug!(%user_id, %role_id, "User does not hold role, nothing to unassign");
            return Ok(());
        }

        ctx.guard("roles.unassign_user", async {
            user::Entity::update_many()
                .col_expr(user::Column::RoleId, Expr::value(Option::<Uuid>::None))
                .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(user::Column::Id.eq(user_id))
                .filter(user::Column::RoleId.eq(role_id))
                .exec(&self.db)
                .await
                .map_err(db_err("roles.unassign_user"))
        })
        .await?;

        info!(%user_id, %role_id, "Role unassigned from user");
        Ok(())
    }
}

async fn load_user(
    db: &DatabaseConnection,
    ctx: &RequestContext,
    user_id: Uuid,
) -> DomainResult<user::Model> {
    ctx.guard("users.get_by_id", async {
        user::Entity::find_by_id(user_id)
            .one(db)
            .await
            .map_err(db_err("users.get_by_id"))
    })
    .await?
    .ok_or_else(|| DomainError::not_found("User", "id", user_id))
}
