//! Signed session tokens.
//!
//! Sessions live entirely in the client cookie as HS256 JWTs. A token is
//! live iff its signature verifies, `now < exp`, and its `jti` has not been
//! revoked by a logout. Every rejection reason is reported to the caller as
//! the same [`AuthError::InvalidSession`].

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use uuid::Uuid;

use crate::error::AuthError;

use super::types::{SessionClaims, SessionProfile};

/// Why a token was rejected. Only ever logged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("signature does not verify")]
    Signature,
    #[error("malformed token")]
    Malformed,
    #[error("session expired")]
    Expired,
    #[error("session was logged out")]
    Revoked,
}

pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    /// jti -> exp of logged-out sessions that have not expired yet
    revoked: DashMap<String, i64>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .field("revoked", &self.revoked.len())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock with zero leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
            revoked: DashMap::new(),
        }
    }

    /// Configured session time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(subject, SessionProfile::default(), ttl, Utc::now())
    }

    pub fn issue_with(
        &self,
        subject: &str,
        profile: SessionProfile,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        self.issue_at(subject, profile, ttl, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        profile: SessionProfile,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = SessionClaims {
            sub: subject.to_string(),
            email: profile.email,
            provider: profile.provider,
            iat,
            exp: iat + ttl.num_seconds(),
            jti: Uuid::new_v4().to_string(),
        };

        self.sign(&claims)
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        self.inspect(token, now).map_err(|reason| {
            tracing::debug!("Session rejected: {}", reason);
            AuthError::InvalidSession
        })
    }

    /// Revoke `current` (if it is a token we signed) and return a
    /// replacement that differs from it and is never live.
    pub fn invalidate(&self, current: &str) -> Result<String, AuthError> {
        self.invalidate_at(current, Utc::now())
    }

    pub fn invalidate_at(&self, current: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let now_ts = now.timestamp();

        if let Ok(claims) = self.verify_signature(current) {
            if claims.exp > now_ts {
                self.revoke(claims.jti, claims.exp, now_ts);
            }
        }

        let replacement = SessionClaims {
            sub: String::new(),
            email: None,
            provider: None,
            iat: now_ts,
            exp: now_ts,
            jti: Uuid::new_v4().to_string(),
        };

        self.sign(&replacement)
    }

    /// Number of logged-out sessions still tracked.
    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    fn inspect(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let claims = self.verify_signature(token)?;

        if claims.sub.is_empty() || claims.jti.is_empty() {
            return Err(SessionError::Malformed);
        }
        if now.timestamp() >= claims.exp {
            return Err(SessionError::Expired);
        }
        if self.revoked.contains_key(&claims.jti) {
            return Err(SessionError::Revoked);
        }

        Ok(claims)
    }

    fn verify_signature(&self, token: &str) -> Result<SessionClaims, SessionError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => SessionError::Signature,
                _ => SessionError::Malformed,
            })
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Failed to sign session: {}", e)))
    }

    fn revoke(&self, jti: String, exp: i64, now_ts: i64) {
        self.revoked.retain(|_, expires| *expires > now_ts);
        self.revoked.insert(jti, exp);
    }
}
