/// Request extractors and body helpers shared by the handlers

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Extension, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use taskboard_shared::auth::Actor;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

/// JSON body that has passed `validator` checks
///
/// Malformed JSON, wrong types, unknown enum values and failed validations
/// are all rejected with 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Tells an absent field (`None`) from an explicit `null` (`Some(None)`)
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// User an action is attributed to: the token's user, else the id the
/// client put in the body
pub fn acting_user(actor: Option<Extension<Actor>>, fallback: Option<Uuid>) -> Option<Uuid> {
    actor.map(|Extension(actor)| actor.user_id).or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        description: Option<Option<String>>,
    }

    #[test]
    fn test_double_option() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.description, None);

        let cleared: Patch = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: Patch = serde_json::from_str(r#"{"description":"x"}"#).unwrap();
        assert_eq!(set.description, Some(Some("x".to_string())));
    }

    #[test]
    fn test_acting_user_prefers_token() {
        let token_user = Uuid::new_v4();
        let body_user = Uuid::new_v4();
        let actor = Extension(Actor {
            user_id: token_user,
            email: None,
        });

        assert_eq!(acting_user(Some(actor), Some(body_user)), Some(token_user));
        assert_eq!(acting_user(None, Some(body_user)), Some(body_user));
        assert_eq!(acting_user(None, None), None);
    }
}
