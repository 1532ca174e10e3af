mod jwt;
mod routes;

pub use jwt::{create_jwt, parse_token, Claims};
pub use routes::routes;

use crate::config::Config;
use jsonwebtoken::{DecodingKey, EncodingKey};

/// Token signing keys and password hashing parameters.
pub struct AuthSettings {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
}

impl AuthSettings {
    pub fn new(secret: &str, token_ttl: chrono::Duration, bcrypt_cost: u32) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
            bcrypt_cost,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            chrono::Duration::hours(config.jwt_ttl_hours),
            config.bcrypt_cost,
        )
    }
}

pub fn hash_password(password: &str, cost: u32) -> anyhow::Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    Ok(bcrypt::verify(password, hash)?)
}
