//! SurrealDB repository implementations.

mod audit;
mod refresh_token;
mod task;
mod user;

pub use audit::SurrealAuditLogRepository;
pub use refresh_token::SurrealRefreshTokenRepository;
pub use task::SurrealTaskRepository;
pub use user::SurrealUserRepository;
