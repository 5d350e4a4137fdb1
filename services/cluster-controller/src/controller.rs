//! Entry point invoked by the work queue for every cluster change.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::clients::ClusterStore;
use crate::config::Config;
use crate::deletion::{ClusterDeletion, Collaborators, DeletionError, DeletionOutcome};
use crate::model::Cluster;

/// Result of a reconcile call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The cluster is not being deleted.
    Skipped,

    /// A deletion pass ran.
    Deletion(DeletionOutcome),
}

/// Reconciles cluster records.
///
/// The caller guarantees that a cluster is never reconciled by two tasks at
/// the same time. Without that guarantee, serialize calls per cluster name
/// before they reach this type.
pub struct ClusterController {
    deletion: ClusterDeletion,
    clusters: Arc<dyn ClusterStore>,
}

impl ClusterController {
    pub fn new(config: &Config, deps: Collaborators) -> Self {
        let clusters = deps.clusters.clone();
        Self {
            deletion: ClusterDeletion::new(deps, config.default_datacenter.clone()),
            clusters,
        }
    }

    /// Reconcile `cluster`.
    ///
    /// An error asks the caller to retry later. `Ok` means nothing more can be
    /// done right now, which does not imply teardown is complete.
    #[instrument(skip_all, fields(cluster = %cluster.name))]
    pub async fn reconcile(&self, cluster: &Cluster) -> Result<ReconcileOutcome, DeletionError> {
        if !cluster.is_deleting() {
            return Ok(ReconcileOutcome::Skipped);
        }

        let outcome = self.deletion.run(cluster).await?;

        if let Some(finalizers) = outcome.finalizers() {
            if *finalizers != cluster.finalizers {
                debug!(%finalizers, "Persisting finalizers");
                match self
                    .clusters
                    .update_finalizers(&cluster.name, finalizers)
                    .await
                {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {
                        warn!("Cluster record vanished before finalizers were persisted");
                    }
                    Err(source) => {
                        return Err(DeletionError::Record {
                            name: cluster.name.clone(),
                            source,
                        })
                    }
                }
            }
        }

        Ok(ReconcileOutcome::Deletion(outcome))
    }
}
