//! Static user list.

use std::slice;

use thiserror::Error;

use super::types::User;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserParseError {
    #[error("user entry {0:?} must be username:hash or username:email:hash")]
    Format(String),

    #[error("user entry {0:?} has an empty username")]
    EmptyUsername(String),

    #[error("user {0:?} does not have a bcrypt password hash")]
    NotBcrypt(String),
}

/// Ordered, immutable list of configured users.
///
/// Username uniqueness is not enforced; lookups return the first match in
/// configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStore {
    users: Vec<User>,
}

impl UserStore {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Parse `username:hash` / `username:email:hash` entries.
    ///
    /// Entries are trimmed and blank entries skipped.
    pub fn parse<I, S>(entries: I) -> Result<Self, UserParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let users = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_string())
            .filter(|entry| !entry.is_empty())
            .map(|entry| parse_entry(&entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { users })
    }

    pub fn iter(&self) -> slice::Iter<'_, User> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn parse_entry(entry: &str) -> Result<User, UserParseError> {
    let parts: Vec<&str> = entry.split(':').map(str::trim).collect();

    let (username, email, hash) = match parts.as_slice() {
        [username, hash] => (*username, None, *hash),
        [username, email, hash] => {
            let email = (!email.is_empty()).then(|| email.to_string());
            (*username, email, *hash)
        }
        _ => return Err(UserParseError::Format(redact(entry))),
    };

    if username.is_empty() {
        return Err(UserParseError::EmptyUsername(redact(entry)));
    }

    if !hash.starts_with("$2") {
        return Err(UserParseError::NotBcrypt(username.to_string()));
    }

    Ok(User {
        username: username.to_string(),
        email,
        password_hash: hash.to_string(),
    })
}

// Keep password hashes out of error messages
fn redact(entry: &str) -> String {
    match entry.split_once(':') {
        Some((head, _)) => format!("{}:...", head),
        None => entry.to_string(),
    }
}
