//! build-relay: a GitHub App service that turns pull-request webhooks into
//! mobile CI build jobs and projects each job's status back onto GitHub.
//!
//! A pull-request delivery is matched against registered workflow
//! configurations; each match gets a queued check run and a persisted job
//! record. The external build executor reports status flags through a
//! callback, and the synchronizer reacts to each job write with idempotent
//! effects: check-run transitions, a per-workflow build-number comment, and
//! an atomically incremented per-organization build counter.

pub mod config;
pub mod github;
pub mod registry;
pub mod server;
pub mod store;
pub mod sync;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_utils;
