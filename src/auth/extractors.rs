use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use sqlx::PgConnection;
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::User;
use crate::error::ApiError;

/// One message for every token failure, so callers can't distinguish a bad
/// signature from an expired or garbled token.
const TOKEN_REJECTED: &str = "Invalid or expired token";

/// Bearer token string pulled from the `Authorization` header.
///
/// Transport-level extraction only; verification and identity lookup happen
/// in [`resolve_identity`] on the request's session handle.
#[derive(Debug)]
pub struct Bearer(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized("Missing Authorization header"))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized("Invalid auth scheme"))?;

        Ok(Bearer(token.to_string()))
    }
}

/// Authentication gate: verify the token, then load the identity record on
/// the caller's session handle.
///
/// Token failures all collapse to the same generic 401. A valid token whose
/// subject has no stored record is a distinct 404.
pub async fn resolve_identity(
    keys: &JwtKeys,
    token: &str,
    conn: &mut PgConnection,
) -> Result<User, ApiError> {
    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        ApiError::Unauthorized(TOKEN_REJECTED)
    })?;

    let user_id = parse_subject(&claims.sub)?;

    match User::find_by_id(conn, user_id).await? {
        Some(user) => Ok(user),
        None => Err(ApiError::NotFound("User")),
    }
}

fn parse_subject(sub: &str) -> Result<i64, ApiError> {
    sub.parse().map_err(|_| {
        warn!(sub, "token subject is not a user id");
        ApiError::Unauthorized(TOKEN_REJECTED)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_must_be_a_decimal_id() {
        assert_eq!(parse_subject("42").unwrap(), 42);
        assert!(matches!(
            parse_subject("abc"),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(parse_subject(""), Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn bearer_requires_the_authorization_header() {
        let req = axum::http::Request::builder().body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        let err = Bearer::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn bearer_requires_the_bearer_scheme() {
        let req = axum::http::Request::builder()
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let err = Bearer::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn bearer_accepts_either_prefix_case() {
        for header in ["Bearer abc.def.ghi", "bearer abc.def.ghi"] {
            let req = axum::http::Request::builder()
                .header("Authorization", header)
                .body(())
                .unwrap();
            let (mut parts, _) = req.into_parts();
            let Bearer(token) = Bearer::from_request_parts(&mut parts, &())
                .await
                .expect("bearer should extract");
            assert_eq!(token, "abc.def.ghi");
        }
    }
}
