//! GitHub API error types.
//!
//! Errors are categorized as transient or permanent. The service performs no
//! internal retries (the webhook dispatcher redelivers failed invocations),
//! but the category still drives log severity and tells an operator whether a
//! redelivery can be expected to help.

use std::fmt;
use thiserror::Error;

/// The category of a GitHub API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Would likely succeed if redelivered: 5xx, rate limits, network-level
    /// failures.
    Transient,

    /// Requires intervention: most 4xx (bad credentials, missing resource,
    /// validation failures).
    Permanent,
}

impl GitHubErrorKind {
    pub fn is_transient(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }
}

/// A categorized GitHub API error.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if one could be determined.
    pub status_code: Option<u16>,

    pub message: String,

    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates a permanent error with no underlying octocrab source.
    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Categorizes an octocrab error by status code and message patterns.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = extract_status_code(&err);
        let message = err.to_string();

        let kind = match status_code {
            Some(429) => GitHubErrorKind::Transient,
            Some(403) if is_rate_limit_error(&message) => GitHubErrorKind::Transient,
            Some(code) if (500..600).contains(&code) => GitHubErrorKind::Transient,
            Some(_) => GitHubErrorKind::Permanent,
            None => {
                if is_network_error(&message) {
                    GitHubErrorKind::Transient
                } else {
                    GitHubErrorKind::Permanent
                }
            }
        };

        Self {
            kind,
            status_code,
            message,
            source: Some(err),
        }
    }
}

/// Extracts the HTTP status code from an octocrab error, if present.
///
/// octocrab does not expose a stable status accessor across its error
/// variants, so this parses the rendered message. The `None` fallback is
/// safe: uncategorized errors are treated as permanent.
fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
    let err_str = err.to_string();

    if let Some(idx) = err_str.find("status: ") {
        let rest = &err_str[idx + 8..];
        if let Some(end) = rest.find(|c: char| !c.is_ascii_digit()) {
            if let Ok(code) = rest[..end].parse() {
                return Some(code);
            }
        } else if let Ok(code) = rest.trim().parse() {
            return Some(code);
        }
    }

    for code in [404u16, 409, 422, 403, 401, 429, 500, 502, 503] {
        if err_str.contains(&code.to_string()) {
            return Some(code);
        }
    }

    None
}

fn is_rate_limit_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("rate limit")
        || message_lower.contains("api rate")
        || message_lower.contains("secondary rate")
        || message_lower.contains("abuse detection")
}

fn is_network_error(message: &str) -> bool {
    let message_lower = message.to_lowercase();
    message_lower.contains("timeout")
        || message_lower.contains("connection")
        || message_lower.contains("network")
        || message_lower.contains("dns")
        || message_lower.contains("timed out")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_detection() {
        assert!(is_rate_limit_error("API rate limit exceeded"));
        assert!(is_rate_limit_error("secondary rate limit hit"));
        assert!(!is_rate_limit_error("Permission denied"));
    }

    #[test]
    fn network_error_detection() {
        assert!(is_network_error("connection refused"));
        assert!(is_network_error("request timed out"));
        assert!(!is_network_error("Not found"));
    }

    #[test]
    fn kind_transience() {
        assert!(GitHubErrorKind::Transient.is_transient());
        assert!(!GitHubErrorKind::Permanent.is_transient());
    }

    #[test]
    fn without_source_is_permanent() {
        let err = GitHubApiError::permanent_without_source("missing installation");
        assert_eq!(err.kind, GitHubErrorKind::Permanent);
        assert_eq!(err.status_code, None);
        assert!(err.source.is_none());
    }
}
