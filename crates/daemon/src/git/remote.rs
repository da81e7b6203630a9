// SSH-style remote locators: `user@host:path`.

use std::fmt::{Display, Formatter};

use crate::error::RepoError;

/// A validated remote in scp-like SSH syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocator {
    user: String,
    host: String,
    path: String,
}

impl RemoteLocator {
    /// Parse `user@host:path`. Surrounding whitespace is ignored.
    ///
    /// `user` and `host` must be non-empty and free of `@`, `:`, `/` and
    /// whitespace; `path` must be non-empty. URL schemes such as
    /// `ssh://` or `https://` are rejected.
    pub fn parse(raw: &str) -> Result<Self, RepoError> {
        let trimmed = raw.trim();
        let invalid = || RepoError::InvalidRemote { locator: trimmed.to_string() };

        let (user, rest) = trimmed.split_once('@').ok_or_else(invalid)?;
        let (host, path) = rest.split_once(':').ok_or_else(invalid)?;

        let valid_segment = |segment: &str| {
            !segment.is_empty()
                && !segment.chars().any(|c| matches!(c, '@' | ':' | '/') || c.is_whitespace())
        };
        if !valid_segment(user) || !valid_segment(host) {
            return Err(invalid());
        }
        if path.is_empty() || path.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(Self { user: user.to_string(), host: host.to_string(), path: path.to_string() })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Display for RemoteLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.path)
    }
}
