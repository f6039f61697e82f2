//! Credential verification and email whitelisting.
//!
//! Everything here is a pure function over immutable state, so a single
//! [`Authenticator`] is shared by all requests without locking.

use std::collections::HashSet;

use crate::error::AuthError;

use super::types::User;
use super::users::UserStore;

/// Allow-list of emails for externally authenticated identities.
///
/// An empty whitelist authorizes every email. Matching is exact and
/// case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    emails: HashSet<String>,
}

impl Whitelist {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(Into::into)
                .filter(|e: &String| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_authorized(&self, email: &str) -> bool {
        self.emails.is_empty() || self.emails.contains(email)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

pub struct Authenticator {
    users: UserStore,
    whitelist: Whitelist,
    // Verified against when the identifier is unknown
    dummy_hash: Option<String>,
}

impl Authenticator {
    /// Build the authenticator, hashing the dummy password up front at the
    /// cost of the first configured user.
    pub fn new(users: UserStore, whitelist: Whitelist) -> Self {
        let dummy_hash = users.iter().next().and_then(|user| {
            let cost = bcrypt_cost(&user.password_hash).unwrap_or(bcrypt::DEFAULT_COST);
            bcrypt::hash(uuid::Uuid::new_v4().to_string(), cost).ok()
        });

        Self {
            users,
            whitelist,
            dummy_hash,
        }
    }

    /// Find a user whose username or email equals `identifier` exactly.
    pub fn find_user(&self, identifier: &str) -> Option<&User> {
        if identifier.is_empty() {
            return None;
        }

        self.users
            .iter()
            .find(|user| user.username == identifier || user.email.as_deref() == Some(identifier))
    }

    /// Compare `candidate` against the user's bcrypt hash.
    ///
    /// Hashing errors (e.g. a corrupt stored hash) count as a mismatch.
    pub fn verify_password(&self, user: &User, candidate: &str) -> bool {
        match bcrypt::verify(candidate, &user.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("Password check failed for {}: {}", user.username, e);
                false
            }
        }
    }

    pub fn is_email_authorized(&self, email: &str) -> bool {
        self.whitelist.is_authorized(email)
    }

    /// Look up and verify in one step.
    ///
    /// Unknown users and wrong passwords both yield
    /// [`AuthError::InvalidCredentials`], and an unknown user still pays for
    /// one bcrypt comparison.
    pub fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        match self.find_user(identifier) {
            Some(user) if self.verify_password(user, password) => Ok(user.clone()),
            Some(_) => Err(AuthError::InvalidCredentials),
            None => {
                if let Some(hash) = &self.dummy_hash {
                    let _ = bcrypt::verify(password, hash);
                }
                Err(AuthError::InvalidCredentials)
            }
        }
    }

}

fn bcrypt_cost(hash: &str) -> Option<u32> {
    hash.split('$').nth(2)?.parse().ok()
}
