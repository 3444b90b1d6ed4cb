//! In-memory storage implementation
//!
//! Mirrors the SeaORM repositories: same filtering, ordering, paging,
//! uniqueness and set-null semantics. Used as the fake in service tests.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::role::{Role, RoleRepository};
use crate::domain::user::{User, UserRepository};
use crate::shared::{PaginatedResult, PaginationFilter, SortDirection};
use crate::support::{DomainError, DomainResult, RequestContext};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
}

impl State {
    /// Stored users never carry a loaded role; reads attach the current one.
    fn load_user(&self, user: &User) -> User {
        let mut user = user.clone();
        user.role = user.role_id.and_then(|id| self.roles.get(&id).cloned());
        user
    }

    fn check_user_unique(&self, user: &User) -> DomainResult<()> {
        for other in self.users.values().filter(|u| u.id != user.id) {
            if other.username == user.username {
                return Err(DomainError::conflict("User", Some("username")));
            }
            if other.email == user.email {
                return Err(DomainError::conflict("User", Some("email")));
            }
        }
        Ok(())
    }

    fn check_role_reference(&self, role_id: Option<Uuid>) -> DomainResult<()> {
        match role_id {
            Some(id) if !self.roles.contains_key(&id) => Err(DomainError::not_found("Role", "id", id)),
            _ => Ok(()),
        }
    }

    fn check_role_unique(&self, role: &Role) -> DomainResult<()> {
        if self
            .roles
            .values()
            .any(|r| r.id != role.id && r.name == role.name)
        {
            return Err(DomainError::conflict("Role", Some("name")));
        }
        Ok(())
    }
}

/// In-memory user and role storage for development and testing
#[derive(Default)]
pub struct InMemoryAccountStore {
    state: RwLock<State>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Order by `updated_at`, then `id`, both in the requested direction, and cut
/// out the requested page.
fn paginate<T>(
    mut items: Vec<T>,
    filter: &PaginationFilter,
    key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid),
) -> PaginatedResult<T> {
    items.sort_by(|a, b| {
        let ord: Ordering = key(a).cmp(&key(b));
        match filter.sort {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    let total = items.len() as u64;
    let page: Vec<T> = items
        .into_iter()
        .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(filter.query_limit()).unwrap_or(usize::MAX))
        .collect();

    PaginatedResult::new(page, total, filter.page, filter.limit)
}

#[async_trait]
impl UserRepository for InMemoryAccountStore {
    async fn get_all(
        &self,
        ctx: &RequestContext,
        filter: &PaginationFilter,
    ) -> DomainResult<PaginatedResult<User>> {
        ctx.guard("users.get_all", async {
            let state = self.state.read().await;
            let matching: Vec<User> = state
                .users
                .values()
                .filter(|u| filter.matches_any(&[u.name.as_str(), u.email.as_str()]))
                .map(|u| state.load_user(u))
                .collect();
            Ok(paginate(matching, filter, |u| (u.updated_at, u.id)))
        })
        .await
    }

    async fn get_by_id(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<User> {
        ctx.guard("users.get_by_id", async {
            let state = self.state.read().await;
            state
                .users
                .get(&id)
                .map(|u| state.load_user(u))
                .ok_or_else(|| DomainError::not_found("User", "id", id))
        })
        .await
    }

    async fn get_by_email(&self, ctx: &RequestContext, email: &str) -> DomainResult<User> {
        ctx.guard("users.get_by_email", async {
            let state = self.state.read().await;
            state
                .users
                .values()
                .find(|u| u.email == email)
                .map(|u| state.load_user(u))
                .ok_or_else(|| DomainError::not_found("User", "email", email))
        })
        .await
    }

    async fn get_by_username(&self, ctx: &RequestContext, username: &str) -> DomainResult<User> {
        ctx.guard("users.get_by_username", async {
            let state = self.state.read().await;
            state
                .users
                .values()
                .find(|u| u.username == username)
                .map(|u| state.load_user(u))
                .ok_or_else(|| DomainError::not_found("User", "username", username))
        })
        .await
    }

    async fn create(&self, ctx: &RequestContext, mut user: User) -> DomainResult<User> {
        ctx.guard("users.create", async {
            let mut state = self.state.write().await;
            if state.users.contains_key(&user.id) {
                return Err(DomainError::conflict("User", Some("id")));
            }
            state.check_user_unique(&user)?;
            state.check_role_reference(user.role_id)?;

            user.role = None;
            state.users.insert(user.id, user.clone());
            Ok(state.load_user(&user))
        })
        .await
    }

    async fn update(&self, ctx: &RequestContext, mut user: User) -> DomainResult<User> {
        ctx.guard("users.update", async {
            let mut state = self.state.write().await;
            let created_at = match state.users.get(&user.id) {
                Some(existing) => existing.created_at,
                None => return Err(DomainError::not_found("User", "id", user.id)),
            };
            state.check_user_unique(&user)?;
            state.check_role_reference(user.role_id)?;

            user.role = None;
            user.created_at = created_at;
            state.users.insert(user.id, user.clone());
            Ok(state.load_user(&user))
        })
        .await
    }

    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<()> {
        ctx.guard("users.delete", async {
            let mut state = self.state.write().await;
            state
                .users
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| DomainError::not_found("User", "id", id))
        })
        .await
    }
}

#[async_trait]
impl RoleRepository for InMemoryAccountStore {
    async fn create(&self, ctx: &RequestContext, role: Role) -> DomainResult<Role> {
        ctx.guard("roles.create", async {
            let mut state = self.state.write().await;
            if state.roles.contains_key(&role.id) {
                return Err(DomainError::conflict("Role", Some("id")));
            }
            state.check_role_unique(&role)?;
            state.roles.insert(role.id, role.clone());
            Ok(role)
        })
        .await
    }

    async fn find_by_id(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<Role> {
        ctx.guard("roles.find_by_id", async {
            self.state
                .read()
                .await
                .roles
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::not_found("Role", "id", id))
        })
        .await
    }

    async fn find_by_name(&self, ctx: &RequestContext, name: &str) -> DomainResult<Role> {
        ctx.guard("roles.find_by_name", async {
            self.state
                .read()
                .await
                .roles
                .values()
                .find(|r| r.name == name)
                .cloned()
                .ok_or_else(|| DomainError::not_found("Role", "name", name))
        })
        .await
    }

    async fn find_many_by_id(&self, ctx: &RequestContext, ids: &[Uuid]) -> DomainResult<Vec<Role>> {
        ctx.guard("roles.find_many_by_id", async {
            let state = self.state.read().await;
            let mut roles: Vec<Role> = state
                .roles
                .values()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect();
            roles.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(roles)
        })
        .await
    }

    async fn find_all(
        &self,
        ctx: &RequestContext,
        filter: &PaginationFilter,
    ) -> DomainResult<PaginatedResult<Role>> {
        ctx.guard("roles.find_all", async {
            let state = self.state.read().await;
            let matching: Vec<Role> = state
                .roles
                .values()
                .filter(|r| filter.matches_any(&[r.name.as_str()]))
                .cloned()
                .collect();
            Ok(paginate(matching, filter, |r| (r.updated_at, r.id)))
        })
        .await
    }

    async fn update(&self, ctx: &RequestContext, mut role: Role) -> DomainResult<Role> {
        ctx.guard("roles.update", async {
            let mut state = self.state.write().await;
            let created_at = match state.roles.get(&role.id) {
                Some(existing) => existing.created_at,
                None => return Err(DomainError::not_found("Role", "id", role.id)),
            };
            state.check_role_unique(&role)?;

            role.created_at = created_at;
            state.roles.insert(role.id, role.clone());
            Ok(role)
        })
        .await
    }

    async fn delete(&self, ctx: &RequestContext, id: Uuid) -> DomainResult<()> {
        ctx.guard("roles.delete", async {
            let mut state = self.state.write().await;
            if state.roles.remove(&id).is_none() {
                return Err(DomainError::not_found("Role", "id", id));
            }
            // ON DELETE SET NULL
            for user in state.users.values_mut().filter(|u| u.role_id == Some(id)) {
                user.role_id = None;
            }
            Ok(())
        })
        .await
    }

    async fn assign_user(&self, ctx: &RequestContext, user_id: Uuid, role_id: Uuid) -> DomainResult<()> {
        ctx.guard("roles.assign_user", async {
            let mut state = self.state.write().await;
            if !state.roles.contains_key(&role_id) {
                return Err(DomainError::not_found("Role", "id", role_id));
            }
            let user = state
                .users
                .get_mut(&user_id)
                .ok_or_else(|| DomainError::not_found("User", "id", user_id))?;

            if user.role_id != Some(role_id) {
                user.role_id = Some(role_id);
                user.updated_at = Utc::now();
            }
            Ok(())
        })
        .await
    }

    async fn unassign_user(&self, ctx: &RequestContext, user_id: Uuid, role_id: Uuid) -> DomainResult<()> {
        ctx.guard("roles.unassign_user", async {
            let mut state = self.state.write().await;
            let user = state
                .users
                .get_mut(&user_id)
                .ok_or_else(|| DomainError::not_found("User", "id", user_id))?;

            if user.role_id == Some(role_id) {
                user.role_id = None;
                user.updated_at = Utc::now();
            }
            Ok(())
        })
        .await
    }
}
