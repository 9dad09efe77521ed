//! User model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// User account with its borrowing policy.
///
/// Registration and password management live in the identity provider;
/// this service only reads accounts to enforce borrowing rules and to
/// address notifications.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Cap on simultaneous outstanding borrows
    pub max_borrows: i16,
    /// Maximum allowed loan length in days
    pub borrow_max_days: i16,
    /// Currency charged per day overdue
    #[schema(value_type = f64)]
    pub penalty_amount: rust_decimal::Decimal,
    /// Stored on the account but not consulted by the borrow flow
    pub restricted: bool,
}

/// JWT claims carried by tokens the identity provider issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_preserves_claims() {
        let claims = UserClaims {
            sub: "reader".to_string(),
            user_id: 7,
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = claims.create_token("secret").expect("encode");
        let parsed = UserClaims::from_token(&token, "secret").expect("decode");
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.sub, "reader");
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let claims = UserClaims {
            sub: "reader".to_string(),
            user_id: 7,
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = claims.create_token("secret").expect("encode");
        assert!(UserClaims::from_token(&token, "other").is_err());
    }
}
