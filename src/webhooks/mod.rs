//! Webhook ingestion: signature verification, payload parsing, typed events.

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{GitHubEvent, PrAction, PullRequestEvent};
pub use parser::{parse_webhook, ParseError};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
