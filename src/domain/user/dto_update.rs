use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Partial user update.
///
/// `None` and empty strings both mean "leave unchanged"; there is no way to
/// clear a field through this request. A nil `role_id` is ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub username: Option<String>,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "password is too short"))]
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl UpdateUserRequest {
    /// Collapse the "empty means unchanged" convention into `None`.
    pub fn normalized(self) -> Self {
        Self {
            name: non_empty(self.name),
            full_name: non_empty(self.full_name),
            username: non_empty(self.username),
            email: non_empty(self.email),
            password: non_empty(self.password),
            role_id: self.role_id.filter(|id| !id.is_nil()),
            is_active: self.is_active,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.full_name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role_id.is_none()
            && self.is_active.is_none()
    }
}
