//! TASKVAULT Auth — credential verification with account lockout,
//! access/refresh token lifecycle, break-the-glass reveal workflow,
//! and audited administrative actions.

pub mod admin;
pub mod config;
pub mod cookie;
pub mod error;
pub mod password;
pub mod reveal;
pub mod service;
pub mod token;
pub mod verifier;

pub use admin::AdminService;
pub use config::AuthConfig;
pub use error::AuthError;
pub use reveal::RevealService;
pub use service::{AuthService, LoginInput, LoginOutput, RefreshOutput};
pub use token::AccessTokenClaims;
pub use verifier::CredentialVerifier;
