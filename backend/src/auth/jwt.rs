use crate::auth::AuthSettings;
use crate::services;
use chrono::Utc;
use common::User;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn create_jwt(settings: &AuthSettings, user: &User) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        iat: now.timestamp().max(0) as usize,
        exp: (now + settings.token_ttl).timestamp().max(0) as usize,
    };

    let mut header = Header::new(Algorithm::HS512);
    header.kid = Some("signing_key".to_owned());

    Ok(encode(&header, &claims, &settings.encoding)?)
}

/// Resolves a token to its user. Malformed, expired or forged tokens, and
/// tokens for deleted users, all yield `None`.
pub async fn parse_token(
    db: &mut SqliteConnection,
    settings: &AuthSettings,
    token: &str,
) -> anyhow::Result<Option<User>> {
    let token_data = match decode::<Claims>(
        token,
        &settings.decoding,
        &Validation::new(Algorithm::HS512),
    ) {
        Ok(data) => data,
        Err(e) => {
            log::debug!("rejected token: {}", e);
            return Ok(None);
        }
    };

    let id = match Uuid::parse_str(&token_data.claims.sub) {
        Ok(id) => id,
        Err(_) => return Ok(None),
    };

    services::user::get(db, id).await
}
