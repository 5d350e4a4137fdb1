//! Cascading teardown of a cluster marked for deletion.
//!
//! The sequence runs four steps in a fixed order on every pass:
//!
//! 1. `nodes`: provisioning requests first, then compute units
//! 2. `cloud`: platform infrastructure through the provider registry
//! 3. `resource_group`: the cluster's resource group on the seed
//! 4. `record`: the cluster record itself, once no finalizers remain
//!
//! There is no persisted phase. Each step is gated by its finalizer and gets
//! the finalizer snapshot left by the previous step, returning the next one.
//! While nodes are still being torn down the pass stops after step 1.

mod cloud;
mod nodes;
mod record;
mod resource_group;

use std::sync::Arc;

use seed_id::{ClusterName, DatacenterName, ResourceGroupName};
use seed_reconcile::FinalizerSet;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::clients::{ClientError, ClusterStore, SeedClientProvider, UserClusterConnector};
use crate::model::Cluster;
use crate::provider::{ProviderError, ProviderRegistry};

/// Errors that abort a deletion pass.
///
/// Finalizers are left in place on every error path, so the failed step is
/// repeated on the next pass.
#[derive(Debug, Error)]
pub enum DeletionError {
    #[error("failed to connect to cluster {cluster}: {source}")]
    Connect {
        cluster: ClusterName,
        #[source]
        source: ClientError,
    },

    #[error("failed to {action}: {source}")]
    Nodes {
        action: &'static str,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    ProviderResolution(#[from] ProviderError),

    /// Cloud provider failures are passed through unchanged.
    #[error(transparent)]
    CloudProvider(anyhow::Error),

    #[error("failed to get clients for seed datacenter {datacenter}: {source}")]
    Seed {
        datacenter: DatacenterName,
        #[source]
        source: ClientError,
    },

    #[error("failed to {action} resource group {name}: {source}")]
    ResourceGroup {
        action: &'static str,
        name: ResourceGroupName,
        #[source]
        source: ClientError,
    },

    #[error("failed to delete cluster {name}: {source}")]
    Record {
        name: ClusterName,
        #[source]
        source: ClientError,
    },
}

/// Where a deletion pass stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Node teardown is in flight; later steps were not attempted.
    NodesPending { finalizers: FinalizerSet },

    /// Every step ran, but finalizers remain that a later pass has to clear.
    Converging { finalizers: FinalizerSet },

    /// The cluster record was deleted (or was already gone).
    Deleted,
}

impl DeletionOutcome {
    /// Finalizers the record should carry after this pass.
    pub fn finalizers(&self) -> Option<&FinalizerSet> {
        match self {
            Self::NodesPending { finalizers } | Self::Converging { finalizers } => Some(finalizers),
            Self::Deleted => None,
        }
    }
}

/// Collaborators the deletion sequence talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub user_clusters: Arc<dyn UserClusterConnector>,
    pub providers: Arc<ProviderRegistry>,
    pub seeds: Arc<dyn SeedClientProvider>,
    pub clusters: Arc<dyn ClusterStore>,
}

/// Runs the deletion sequence for clusters.
pub struct ClusterDeletion {
    deps: Collaborators,

    /// Seed datacenter used when a cluster does not name one.
    default_datacenter: DatacenterName,
}

impl ClusterDeletion {
    pub fn new(deps: Collaborators, default_datacenter: DatacenterName) -> Self {
        Self {
            deps,
            default_datacenter,
        }
    }

    /// Run one deletion pass for `cluster`.
    ///
    /// Returns `Ok` both when the record is gone and when teardown is waiting
    /// for external systems; an error means the pass should be retried.
    #[instrument(skip_all, fields(cluster = %cluster.name, finalizers = %cluster.finalizers))]
    pub async fn run(&self, cluster: &Cluster) -> Result<DeletionOutcome, DeletionError> {
        let outcome = self.cleanup_nodes(cluster, &cluster.finalizers).await?;
        if outcome.progress.is_pending() {
            debug!("Nodes still being deleted, deferring remaining cleanup");
            return Ok(DeletionOutcome::NodesPending {
                finalizers: outcome.finalizers,
            });
        }

        let finalizers = self
            .cleanup_cloud_provider(cluster, &outcome.finalizers)
            .await?;
        let finalizers = self.cleanup_resource_group(cluster, &finalizers).await?;

        if self.delete_record(cluster, &finalizers).await? {
            info!("Cluster deleted");
            return Ok(DeletionOutcome::Deleted);
        }

        Ok(DeletionOutcome::Converging { finalizers })
    }

    fn seed_datacenter<'a>(&'a self, cluster: &'a Cluster) -> &'a DatacenterName {
        cluster
            .spec
            .seed_datacenter
            .as_ref()
            .unwrap_or(&self.default_datacenter)
    }
}
