//! Authentication configuration.

/// Configuration for the authentication services.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded Ed25519 private key for JWT signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded Ed25519 public key for JWT verification.
    pub jwt_public_key_pem: String,
    /// Access token lifetime in seconds (default: 900 = 15 minutes).
    /// Kept short on purpose: a deactivated user's already-issued
    /// access token stays valid until natural expiry.
    pub access_token_lifetime_secs: u64,
    /// Refresh token lifetime in seconds (default: 2_592_000 = 30 days).
    pub refresh_token_lifetime_secs: u64,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Optional pepper prepended to passwords before Argon2id.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Consecutive failed password checks before lockout (default: 5).
    /// Shared across every verification surface.
    pub max_failed_attempts: u32,
    /// Lockout window in seconds (default: 900 = 15 minutes).
    pub lockout_window_secs: u64,
    /// Cookie path scope for the refresh token (auth routes only).
    pub auth_cookie_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 900,
            refresh_token_lifetime_secs: 2_592_000,
            jwt_issuer: "taskvault".into(),
            pepper: None,
            min_password_length: 12,
            max_failed_attempts: 5,
            lockout_window_secs: 900,
            auth_cookie_path: "/api/auth".into(),
        }
    }
}
