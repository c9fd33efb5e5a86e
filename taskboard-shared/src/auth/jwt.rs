/// Identity token validation
///
/// Tokens come from the identity provider that handles sign-in for the
/// dashboard. They are HS256-signed with a secret shared with this server
/// and carry the user's id in `sub`.
///
/// # Security
///
/// - **Algorithm**: HS256 only; tokens signed with anything else are rejected
/// - **Validation**: signature, expiration and audience
/// - **Secret Management**: secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{create_identity_token, validate_identity_token, IdentityClaims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "identity-provider-secret-32-bytes!!";
/// let user_id = Uuid::new_v4();
///
/// let claims = IdentityClaims::new(user_id, Some("dev@example.com".into()), "authenticated", Duration::hours(1));
/// let token = create_identity_token(&claims, secret)?;
///
/// let validated = validate_identity_token(&token, secret, "authenticated")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum accepted length of a signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Audience the identity provider puts on signed-in users' tokens
pub const DEFAULT_AUDIENCE: &str = "authenticated";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature or structure did not check out
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued for another audience
    #[error("Invalid audience: expected {expected}")]
    InvalidAudience { expected: String },
}

/// Claims the identity provider puts in its tokens
///
/// Unknown claims are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Email the user signed in with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Audience
    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl IdentityClaims {
    /// Builds claims valid for `expires_in` from now
    pub fn new(user_id: Uuid, email: Option<String>, audience: &str, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email,
            aud: audience.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
///
/// Production tokens are minted by the identity provider; this is used by
/// tests and local tooling.
pub fn create_identity_token(claims: &IdentityClaims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates an identity token and extracts its claims
///
/// Verifies:
/// - Signature is valid for `secret`
/// - Token hasn't expired
/// - `aud` equals `audience`
///
/// # Errors
///
/// - `JwtError::Expired` for expired tokens
/// - `JwtError::InvalidAudience` for tokens issued to someone else
/// - `JwtError::ValidationError` for everything else
pub fn validate_identity_token(
    token: &str,
    secret: &str,
    audience: &str,
) -> Result<IdentityClaims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);
    validation.validate_exp = true;

    let token_data = decode::<IdentityClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::InvalidAudience {
                expected: audience.to_string(),
            },
            _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = IdentityClaims::new(
            user_id,
            Some("a@example.com".to_string()),
            DEFAULT_AUDIENCE,
            Duration::hours(1),
        );
        let token = create_identity_token(&claims, SECRET).expect("Should create token");

        let validated =
            validate_identity_token(&token, SECRET, DEFAULT_AUDIENCE).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.email.as_deref(), Some("a@example.com"));
        assert!(!validated.is_expired());
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = IdentityClaims::new(Uuid::new_v4(), None, DEFAULT_AUDIENCE, Duration::hours(1));
        let token = create_identity_token(&claims, SECRET).unwrap();

        let result = validate_identity_token(&token, "another-secret-that-is-long-enough!!", DEFAULT_AUDIENCE);
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_validate_expired_token() {
        // expired an hour ago, well past the default leeway
        let claims = IdentityClaims::new(Uuid::new_v4(), None, DEFAULT_AUDIENCE, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_identity_token(&claims, SECRET).unwrap();
        let result = validate_identity_token(&token, SECRET, DEFAULT_AUDIENCE);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_wrong_audience() {
        let claims = IdentityClaims::new(Uuid::new_v4(), None, "anon", Duration::hours(1));
        let token = create_identity_token(&claims, SECRET).unwrap();

        let result = validate_identity_token(&token, SECRET, DEFAULT_AUDIENCE);
        assert!(matches!(result, Err(JwtError::InvalidAudience { .. })));
    }

    #[test]
    fn test_garbage_token() {
        let result = validate_identity_token("not-a-token", SECRET, DEFAULT_AUDIENCE);
        assert!(result.is_err());
    }
}
