/// Identity of the caller
///
/// Users sign in with the external identity provider, which issues HS256
/// tokens. The server never issues tokens of its own; it only validates them
/// to learn who is acting.
///
/// # Modules
///
/// - [`jwt`]: identity token validation
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::jwt::validate_identity_token;
/// use taskboard_shared::auth::Actor;
///
/// # fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let claims = validate_identity_token(token, "identity-secret-at-least-32-bytes", "authenticated")?;
/// let actor = Actor::from(claims);
/// println!("request made by {}", actor.user_id);
/// # Ok(())
/// # }
/// ```

pub mod jwt;

use uuid::Uuid;

/// The user making the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl From<jwt::IdentityClaims> for Actor {
    fn from(claims: jwt::IdentityClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}
