use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::auth::claims::Claims;
use crate::config::JwtConfig;

/// Why a token was rejected. Internally distinct; every variant is surfaced
/// to the client as the same generic 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Token service: holds the signing/verification keys derived from the
/// process secret, plus the configured algorithm and TTL.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            ttl: Duration::from_secs((cfg.ttl_minutes as u64) * 60),
        }
    }

    /// Sign a token for `subject` expiring `ttl` from now.
    pub fn issue(&self, subject: i64) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id = subject, "jwt signed");
        Ok(token)
    }

    /// Check signature and expiry; claims come back only from a fully
    /// trusted token, never partially.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // No leeway: a token is expired the second its `exp` passes.
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, ttl_minutes: i64) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            ttl_minutes,
        })
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret", 5);
        let token = keys.issue(42).expect("sign token");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, "42");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_signature_is_rejected_as_invalid_signature() {
        let keys = make_keys("dev-secret", 5);
        let token = keys.issue(42).expect("sign token");
        // Swap the last signature character for a different canonical
        // base64url symbol so the decoded bytes change.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'E' } else { 'A' });
        assert_eq!(keys.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn wrong_secret_is_rejected_as_invalid_signature() {
        let keys = make_keys("dev-secret", 5);
        let other = make_keys("other-secret", 5);
        let token = keys.issue(42).expect("sign token");
        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn zero_ttl_token_expires_within_a_second() {
        let keys = make_keys("dev-secret", 0);
        let token = keys.issue(42).expect("sign token");
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_is_rejected_as_malformed() {
        let keys = make_keys("dev-secret", 5);
        assert_eq!(keys.verify("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(keys.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn expired_token_never_yields_claims() {
        let keys = make_keys("dev-secret", 0);
        let token = keys.issue(7).expect("sign token");
        std::thread::sleep(Duration::from_millis(1100));
        let result = keys.verify(&token);
        assert!(result.is_err(), "expired token must not decode: {result:?}");
    }
}
