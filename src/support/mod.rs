pub mod context;
pub mod errors;

pub use context::RequestContext;
pub use errors::{BoxError, DomainError, DomainResult, ErrorKind};
