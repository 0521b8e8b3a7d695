//! Refresh-token cookie construction.
//!
//! The raw refresh token travels only inside this cookie — never in a
//! JSON body. The flags are security-critical: HttpOnly keeps scripts
//! out, SameSite=Strict blocks cross-site sends, and the path scope
//! confines the cookie to the auth routes. Header emission belongs to
//! the HTTP layer; this module only builds the values.

use crate::config::AuthConfig;

pub const REFRESH_COOKIE_NAME: &str = "tv_refresh";

/// `Set-Cookie` value carrying a freshly issued refresh token.
pub fn refresh_cookie(raw_token: &str, config: &AuthConfig) -> String {
    format!(
        "{REFRESH_COOKIE_NAME}={raw_token}; Max-Age={}; Path={}; HttpOnly; Secure; SameSite=Strict",
        config.refresh_token_lifetime_secs, config.auth_cookie_path
    )
}

/// `Set-Cookie` value that clears the refresh cookie (logout).
pub fn clear_refresh_cookie(config: &AuthConfig) -> String {
    format!(
        "{REFRESH_COOKIE_NAME}=; Max-Age=0; Path={}; HttpOnly; Secure; SameSite=Strict",
        config.auth_cookie_path
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_required_flags() {
        let cookie = refresh_cookie("raw-token-value", &AuthConfig::default());
        assert!(cookie.starts_with("tv_refresh=raw-token-value;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/api/auth"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_refresh_cookie(&AuthConfig::default());
        assert!(cookie.starts_with("tv_refresh=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
    }
}
