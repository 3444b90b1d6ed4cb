//! Database entities module

pub mod role;
pub mod user;

pub use role::Entity as Role;
pub use user::Entity as User;
