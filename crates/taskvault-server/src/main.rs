//! TASKVAULT Server — Application entry point.
//!
//! Wires configuration, the SurrealDB connection, and schema
//! migrations. The HTTP surface mounts on top of the auth services.

use taskvault_auth::AuthConfig;
use taskvault_db::{DbConfig, DbManager};
use taskvault_protect::FieldCipher;
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// The field-encryption key: 32 bytes, hex-encoded, from the
/// environment. Refusing to start beats running with a bad key.
fn load_field_cipher() -> Result<FieldCipher, String> {
    let hex_key =
        std::env::var("TASKVAULT_FIELD_KEY").map_err(|_| "TASKVAULT_FIELD_KEY is not set")?;
    let bytes = hex::decode(hex_key.trim()).map_err(|e| format!("bad field key hex: {e}"))?;
    let key: [u8; 32] = bytes
        .try_into()
        .map_err(|_| "field key must be exactly 32 bytes".to_string())?;
    Ok(FieldCipher::new(key))
}

fn load_auth_config() -> Result<AuthConfig, String> {
    let private_pem = std::fs::read_to_string(env_or(
        "TASKVAULT_JWT_PRIVATE_KEY_FILE",
        "keys/jwt-ed25519.pem",
    ))
    .map_err(|e| format!("cannot read JWT private key: {e}"))?;
    let public_pem = std::fs::read_to_string(env_or(
        "TASKVAULT_JWT_PUBLIC_KEY_FILE",
        "keys/jwt-ed25519.pub.pem",
    ))
    .map_err(|e| format!("cannot read JWT public key: {e}"))?;

    Ok(AuthConfig {
        jwt_private_key_pem: private_pem,
        jwt_public_key_pem: public_pem,
        pepper: std::env::var("TASKVAULT_PEPPER").ok(),
        ..AuthConfig::default()
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("taskvault=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting TASKVAULT server...");

    let _cipher = match load_field_cipher() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Field encryption key unavailable");
            std::process::exit(1);
        }
    };

    let _auth_config = match load_auth_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Auth configuration unavailable");
            std::process::exit(1);
        }
    };

    let manager = match DbManager::connect(&DbConfig::from_env()).await {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = manager.migrate().await {
        tracing::error!(error = %e, "Schema migration failed");
        std::process::exit(1);
    }

    // TODO: Mount the REST API (login/refresh/logout, reveal, admin)
    // over AuthService, RevealService, and AdminService.

    tracing::info!("TASKVAULT server stopped.");
}
