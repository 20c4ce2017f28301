//! Job lifecycle synchronizer.
//!
//! Two entry points: the creation path ([`creation::handle_pull_request`])
//! runs inside the webhook request, and the status path
//! ([`status::handle_job_change`]) runs once per job-change notification,
//! dispatched by [`run_dispatcher`]. Each notification is handled as an
//! independent task; a failed invocation is logged and dropped, never
//! retried here.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, warn};

use crate::github::GatewayFactory;
use crate::store::{JobStore, OrganizationStore, WorkflowStore};

pub mod comment;
pub mod creation;
pub mod status;
pub mod transition;

pub use creation::{handle_pull_request, TriggerError};
pub use status::{handle_job_change, SyncError};
pub use transition::{transition, InvalidTransition, StatusEdge};

/// Consumes the store's job-change stream until it closes, spawning one task
/// per notification.
pub async fn run_dispatcher<S, F>(store: Arc<S>, factory: F)
where
    S: JobStore + WorkflowStore + OrganizationStore + Send + Sync + 'static,
    F: GatewayFactory + Clone + Send + Sync + 'static,
    F::Gateway: 'static,
{
    let mut rx = store.subscribe();
    loop {
        match rx.recv().await {
            Ok(change) => {
                let store = Arc::clone(&store);
                let factory = factory.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_job_change(store.as_ref(), &factory, &change).await {
                        error!(
                            job_id = %change.new.id,
                            error = %e,
                            "status synchronization failed"
                        );
                    }
                });
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "job-change stream lagged; notifications were dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
