use std::str::FromStr;

use grantdesk_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Account a permission is granted to or revoked from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountIdentity {
    username: NonEmptyString,
    host: NonEmptyString,
}

impl AccountIdentity {
    /// Creates an identity; both parts are trimmed and must be non-empty.
    pub fn new(username: impl AsRef<str>, host: impl AsRef<str>) -> AppResult<Self> {
        let username = NonEmptyString::new(username.as_ref().trim())
            .map_err(|_| AppError::Validation("username is required".to_owned()))?;
        let host = NonEmptyString::new(host.as_ref().trim())
            .map_err(|_| AppError::Validation("host is required".to_owned()))?;

        Ok(Self { username, host })
    }

    /// Returns the account name.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the host pattern.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }
}

impl FromStr for AccountIdentity {
    type Err = AppError;

    /// Accepts `user@host` and `'user'@'host'`. The last `@` splits, so
    /// user names may contain `@`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (username, host) = value.trim().rsplit_once('@').ok_or_else(|| {
            AppError::Validation(format!("account '{value}' must look like user@host"))
        })?;

        Self::new(strip_quotes(username), strip_quotes(host))
    }
}

impl std::fmt::Display for AccountIdentity {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "'{}'@'{}'", self.username, self.host)
    }
}

fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(value)
}

/// Raw `(username, host)` pair addressing one account's permissions.
///
/// Values are kept decoded. Percent-encoding happens exactly once when the
/// detail path is built, and already-encoded input is decoded exactly once
/// through [`UserKey::from_encoded`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserKey {
    username: String,
    host: String,
}

impl UserKey {
    /// Creates a key from raw values.
    pub fn from_raw(username: impl Into<String>, host: impl Into<String>) -> AppResult<Self> {
        let username = username.into();
        let host = host.into();
        if username.is_empty() || host.is_empty() {
            return Err(AppError::Validation(
                "username and host are both required".to_owned(),
            ));
        }

        Ok(Self { username, host })
    }

    /// Creates a key from percent-encoded path segments.
    pub fn from_encoded(username: &str, host: &str) -> AppResult<Self> {
        Self::from_raw(decode_segment(username)?, decode_segment(host)?)
    }

    /// Returns the raw account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the raw host pattern.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Account name encoded for one path segment.
    #[must_use]
    pub fn encoded_username(&self) -> String {
        urlencoding::encode(&self.username).into_owned()
    }

    /// Host pattern encoded for one path segment.
    #[must_use]
    pub fn encoded_host(&self) -> String {
        urlencoding::encode(&self.host).into_owned()
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "'{}'@'{}'", self.username, self.host)
    }
}

fn decode_segment(value: &str) -> AppResult<String> {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|error| AppError::Validation(format!("invalid encoded segment '{value}': {error}")))
}
