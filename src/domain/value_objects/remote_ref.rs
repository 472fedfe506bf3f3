use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

use crate::common::error::MultiRepoError;

/// Remote reference parsing errors
#[derive(Debug, Error, PartialEq)]
pub enum RemoteRefError {
    #[error("Empty remote reference")]
    Empty,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Invalid characters in reference: {0}")]
    InvalidCharacters(String),
}

impl From<RemoteRefError> for MultiRepoError {
    fn from(error: RemoteRefError) -> Self {
        let value = match &error {
            RemoteRefError::Empty => String::new(),
            RemoteRefError::InvalidFormat(value) | RemoteRefError::InvalidCharacters(value) => {
                value.clone()
            }
        };
        MultiRepoError::invalid_reference(value, error.to_string())
    }
}

/// `user@host:path`, the scp-like form git accepts for ssh remotes.
fn scp_like() -> &'static Regex {
    static SCP_LIKE: OnceLock<Regex> = OnceLock::new();
    SCP_LIKE.get_or_init(|| {
        Regex::new(r"^([\w.-]+)@([\w.-]+):(.+)$").expect("scp-like pattern is a valid regex")
    })
}

/// A reference to a remote store.
///
/// Two references denote the same store when their normalized forms are
/// equal; the trimmed original is what gets handed to the clone command.
#[derive(Debug, Clone)]
pub struct RemoteRef {
    /// Trimmed input, used as the clone source
    raw: String,

    /// Identity of the reference
    normalized: String,

    /// Host component, when the reference is URL-shaped
    host: Option<String>,
}

impl RemoteRef {
    /// Parse and normalize a remote reference
    pub fn parse(raw: &str) -> Result<Self, RemoteRefError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RemoteRefError::Empty);
        }

        if let Some(ch) = trimmed.chars().find(|c| c.is_control()) {
            return Err(RemoteRefError::InvalidCharacters(format!(
                "control character {:?} in {}",
                ch, trimmed
            )));
        }

        let (normalized, host) = Self::normalize(trimmed)?;

        Ok(Self {
            raw: trimmed.to_string(),
            normalized,
            host,
        })
    }

    fn strip_suffixes(value: &str) -> &str {
        let value = value.trim_end_matches('/');
        let value = value.strip_suffix(".git").unwrap_or(value);
        value.trim_end_matches('/')
    }

    fn normalize(trimmed: &str) -> Result<(String, Option<String>), RemoteRefError> {
        let stripped = Self::strip_suffixes(trimmed);

        // scp-like syntax is rewritten to an ssh URL so both spellings compare equal
        let candidate = if !stripped.contains("://") {
            match scp_like().captures(stripped) {
                Some(captures) => {
                    let user = &captures[1];
                    let host = &captures[2];
                    let path = captures[3].trim_start_matches('/');
                    Some(format!("ssh://{}@{}/{}", user, host, path))
                }
                None => None,
            }
        } else {
            Some(stripped.to_string())
        };

        let Some(candidate) = candidate else {
            // Plain names and filesystem paths are compared verbatim
            return Ok((stripped.to_string(), None));
        };

        let parsed =
            Url::parse(&candidate).map_err(|_| RemoteRefError::InvalidFormat(trimmed.to_string()))?;
        let host = parsed.host_str().map(|h| h.to_string());
        let normalized = Self::strip_suffixes(parsed.as_str()).to_string();

        Ok((normalized, host))
    }

    /// Original reference as written by the user
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Normalized identity
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Host name, for URL-shaped references
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Last path segment of the reference
    pub fn repo_name(&self) -> Option<&str> {
        self.path_segments().last().copied()
    }

    fn path_segments(&self) -> Vec<&str> {
        let path = match self.normalized.find("://") {
            Some(idx) => {
                let after_scheme = &self.normalized[idx + 3..];
                match after_scheme.find('/') {
                    Some(slash) => &after_scheme[slash + 1..],
                    None => "",
                }
            }
            None => self.normalized.as_str(),
        };

        path.split(|c| c == '/' || c == '\\')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .collect()
    }

    /// Directory name a clone of this reference lands in.
    ///
    /// Derived only from the normalized reference, so the same reference
    /// always maps to the same directory.
    pub fn directory_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(host) = self.host() {
            parts.push(host);
        }
        parts.extend(self.path_segments());

        let joined = parts.join("_");
        let sanitized: String = joined
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let sanitized = sanitized.trim_start_matches('.');

        if sanitized.is_empty() {
            "store".to_string()
        } else {
            sanitized.to_string()
        }
    }
}

impl PartialEq for RemoteRef {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for RemoteRef {}

impl Hash for RemoteRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl TryFrom<&str> for RemoteRef {
    type Error = RemoteRefError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        RemoteRef::parse(value)
    }
}
