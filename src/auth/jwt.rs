use crate::models::Claims;
use jsonwebtoken::{decode, DecodingKey, Validation};

/// Tokens are minted by the identity service; this side only verifies
/// signature and expiry against the shared secret.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenType;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};
    use uuid::Uuid;

    const SECRET: &str = "test-secret";

    fn now() -> usize {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
    }

    fn token_with_exp(exp: usize) -> String {
        let claims = Claims {
            user_id: 12,
            sub: "adiallo".to_string(),
            role: 3,
            exp,
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
            employee_id: Some(7),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_round_trips_claims() {
        let claims = verify_token(&token_with_exp(now() + 3600), SECRET).unwrap();
        assert_eq!(claims.user_id, 12);
        assert_eq!(claims.sub, "adiallo");
        assert_eq!(claims.role, 3);
        assert_eq!(claims.employee_id, Some(7));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        assert!(verify_token(&token_with_exp(now() + 3600), "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Default validation allows 60s leeway.
        assert!(verify_token(&token_with_exp(now() - 120), SECRET).is_err());
    }
}
