//! Cloud provider infrastructure teardown.

use seed_reconcile::FinalizerSet;
use tracing::{info, instrument};

use super::{ClusterDeletion, DeletionError};
use crate::finalizers::CLOUD_PROVIDER_CLEANUP;
use crate::model::Cluster;

impl ClusterDeletion {
    /// Release the cluster's platform infrastructure.
    ///
    /// The provider is invoked on every pass that still sees the finalizer,
    /// including after a crash between cleanup and persisting the result.
    #[instrument(skip_all, fields(cluster = %cluster.name))]
    pub(crate) async fn cleanup_cloud_provider(
        &self,
        cluster: &Cluster,
        finalizers: &FinalizerSet,
    ) -> Result<FinalizerSet, DeletionError> {
        if !finalizers.contains(&CLOUD_PROVIDER_CLEANUP) {
            return Ok(finalizers.clone());
        }

        let provider = self.deps.providers.resolve(&cluster.spec.cloud)?;
        provider
            .clean_up(&cluster.spec.cloud)
            .await
            .map_err(DeletionError::CloudProvider)?;

        info!(
            datacenter = %cluster.spec.cloud.datacenter_name,
            "Cloud provider resources released"
        );
        Ok(finalizers.without(&CLOUD_PROVIDER_CLEANUP))
    }
}
