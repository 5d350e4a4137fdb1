//! Node teardown.
//!
//! Provisioning requests are removed before raw compute units. A request
//! keeps reconciling its compute unit until the request itself is gone, so
//! deleting units first would be undone by the provisioning system.

use seed_reconcile::{FinalizerSet, PhaseOutcome};
use tracing::{debug, info, instrument};

use super::{ClusterDeletion, DeletionError};
use crate::finalizers::NODE_DELETION;
use crate::model::Cluster;

impl ClusterDeletion {
    /// Delete everything that runs workloads for `cluster`.
    ///
    /// Reports pending whenever a delete was issued; the finalizer is only
    /// removed on a pass that finds neither requests nor compute units.
    #[instrument(skip_all, fields(cluster = %cluster.name))]
    pub(crate) async fn cleanup_nodes(
        &self,
        cluster: &Cluster,
        finalizers: &FinalizerSet,
    ) -> Result<PhaseOutcome, DeletionError> {
        if !finalizers.contains(&NODE_DELETION) {
            return Ok(PhaseOutcome::done(finalizers.clone()));
        }

        let client = self
            .deps
            .user_clusters
            .connect(cluster)
            .await
            .map_err(|source| DeletionError::Connect {
                cluster: cluster.name.clone(),
                source,
            })?;

        let requests = client
            .list_provisioning_requests()
            .await
            .map_err(|source| DeletionError::Nodes {
                action: "list provisioning requests",
                source,
            })?;
        if !requests.is_empty() {
            info!(count = requests.len(), "Deleting provisioning requests");
            client
                .delete_all_provisioning_requests()
                .await
                .map_err(|source| DeletionError::Nodes {
                    action: "delete provisioning requests",
                    source,
                })?;
            return Ok(PhaseOutcome::pending(finalizers.clone()));
        }

        let units = client
            .list_compute_units()
            .await
            .map_err(|source| DeletionError::Nodes {
                action: "list compute units",
                source,
            })?;
        if units.is_empty() {
            debug!(finalizer = %NODE_DELETION, "No nodes left, removing finalizer");
            return Ok(PhaseOutcome::done(finalizers.without(&NODE_DELETION)));
        }

        info!(count = units.len(), "Deleting compute units");
        client
            .delete_all_compute_units()
            .await
            .map_err(|source| DeletionError::Nodes {
                action: "delete compute units",
                source,
            })?;

        Ok(PhaseOutcome::pending(finalizers.clone()))
    }
}
