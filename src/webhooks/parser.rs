//! GitHub webhook payload parser.
//!
//! Turns raw webhook JSON into a typed [`GitHubEvent`]. The event type comes
//! from the `X-GitHub-Event` header; unknown event types and irrelevant
//! pull-request actions parse to `Ok(None)` rather than erroring, so GitHub
//! sees a 200 and does not redeliver them. Malformed payloads for a known
//! event type are errors.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{PrNumber, RepoId, Sha};

use super::events::{GitHubEvent, PrAction, PullRequestEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Field has an invalid value.
    #[error("invalid field value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook payload into a typed event.
///
/// * `Ok(Some(event))` - a known, relevant event
/// * `Ok(None)` - unknown event type or irrelevant action (ignored)
/// * `Err(e)` - malformed payload for a known event type
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    match event_type {
        "pull_request" => parse_pull_request(payload).map(|opt| opt.map(GitHubEvent::PullRequest)),
        // Unknown event types are ignored (not an error)
        _ => Ok(None),
    }
}

// Raw payload structures matching GitHub's webhook JSON. Optional fields are
// handled with Option<T> and validated explicitly where required.

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
    installation: Option<RawInstallation>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    head: RawRef,
    base: RawRef,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    sha: String,
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
    html_url: String,
    owner: RawOwner,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawInstallation {
    id: u64,
}

fn parse_pull_request(payload: &[u8]) -> Result<Option<PullRequestEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "opened" => PrAction::Opened,
        "reopened" => PrAction::Reopened,
        "synchronize" => PrAction::Synchronize,
        "edited" => PrAction::Edited,
        // Other actions (closed, labeled, assigned, ...) do not trigger builds
        _ => return Ok(None),
    };

    if raw.pull_request.head.sha.is_empty() {
        return Err(ParseError::InvalidField {
            field: "pull_request.head.sha",
            value: String::new(),
        });
    }

    Ok(Some(PullRequestEvent {
        repo: RepoId::new(raw.repository.owner.login, raw.repository.name),
        repository_url: raw.repository.html_url,
        action,
        pr_number: PrNumber(raw.pull_request.number),
        head_sha: Sha::new(raw.pull_request.head.sha),
        base_branch: raw.pull_request.base.ref_name,
        head_branch: raw.pull_request.head.ref_name,
        installation_id: raw.installation.map(|i| i.id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr_payload(action: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "action": action,
            "pull_request": {
                "number": 42,
                "head": { "sha": "a".repeat(40), "ref": "feature/login" },
                "base": { "sha": "b".repeat(40), "ref": "main" }
            },
            "repository": {
                "name": "app",
                "html_url": "https://github.com/acme/app",
                "owner": { "login": "acme" }
            },
            "installation": { "id": 777 }
        }))
        .unwrap()
    }

    #[test]
    fn parses_opened_pull_request() {
        let event = parse_webhook("pull_request", &pr_payload("opened"))
            .unwrap()
            .unwrap();
        let GitHubEvent::PullRequest(pr) = event;
        assert_eq!(pr.action, PrAction::Opened);
        assert_eq!(pr.pr_number, PrNumber(42));
        assert_eq!(pr.repo, RepoId::new("acme", "app"));
        assert_eq!(pr.repository_url, "https://github.com/acme/app");
        assert_eq!(pr.base_branch, "main");
        assert_eq!(pr.head_branch, "feature/login");
        assert_eq!(pr.installation_id, Some(777));
    }

    #[test]
    fn relevant_actions_all_parse() {
        for action in ["opened", "reopened", "synchronize", "edited"] {
            let parsed = parse_webhook("pull_request", &pr_payload(action)).unwrap();
            assert!(parsed.is_some(), "action {action} should parse");
        }
    }

    #[test]
    fn irrelevant_actions_are_ignored() {
        for action in ["closed", "labeled", "assigned", "review_requested"] {
            let parsed = parse_webhook("pull_request", &pr_payload(action)).unwrap();
            assert!(parsed.is_none(), "action {action} should be ignored");
        }
    }

    #[test]
    fn unknown_event_types_are_ignored() {
        assert!(parse_webhook("push", b"{}").unwrap().is_none());
        assert!(parse_webhook("issue_comment", b"{}").unwrap().is_none());
        assert!(parse_webhook("nonsense", b"not even json").unwrap().is_none());
    }

    #[test]
    fn missing_installation_parses_as_none_field() {
        let mut payload: serde_json::Value =
            serde_json::from_slice(&pr_payload("opened")).unwrap();
        payload.as_object_mut().unwrap().remove("installation");
        let event = parse_webhook("pull_request", &serde_json::to_vec(&payload).unwrap())
            .unwrap()
            .unwrap();
        let GitHubEvent::PullRequest(pr) = event;
        assert_eq!(pr.installation_id, None);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(parse_webhook("pull_request", b"not json").is_err());
        assert!(parse_webhook("pull_request", b"{}").is_err());
        let missing_head = serde_json::json!({
            "action": "opened",
            "pull_request": { "number": 1, "base": { "sha": "b", "ref": "main" } },
            "repository": {
                "name": "app",
                "html_url": "https://github.com/acme/app",
                "owner": { "login": "acme" }
            }
        });
        assert!(parse_webhook("pull_request", &serde_json::to_vec(&missing_head).unwrap()).is_err());
    }

    #[test]
    fn empty_head_sha_is_rejected() {
        let mut payload: serde_json::Value =
            serde_json::from_slice(&pr_payload("opened")).unwrap();
        payload["pull_request"]["head"]["sha"] = serde_json::json!("");
        let result = parse_webhook("pull_request", &serde_json::to_vec(&payload).unwrap());
        assert!(matches!(
            result,
            Err(ParseError::InvalidField { field: "pull_request.head.sha", .. })
        ));
    }
}
