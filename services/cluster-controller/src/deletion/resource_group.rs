//! Resource group teardown.
//!
//! State is read through the seed's cache, which may lag behind the API. The
//! finalizer is only removed once the cache no longer holds the group; a
//! successful delete request alone is not enough.

use seed_reconcile::FinalizerSet;
use tracing::{debug, info, instrument};

use super::{ClusterDeletion, DeletionError};
use crate::finalizers::RESOURCE_GROUP_DELETION;
use crate::model::Cluster;

impl ClusterDeletion {
    #[instrument(skip_all, fields(cluster = %cluster.name))]
    pub(crate) async fn cleanup_resource_group(
        &self,
        cluster: &Cluster,
        finalizers: &FinalizerSet,
    ) -> Result<FinalizerSet, DeletionError> {
        if !finalizers.contains(&RESOURCE_GROUP_DELETION) {
            return Ok(finalizers.clone());
        }

        let name = cluster.resource_group_name();
        let datacenter = self.seed_datacenter(cluster);
        let seed_error = |source| DeletionError::Seed {
            datacenter: datacenter.clone(),
            source,
        };

        let lister = self
            .deps
            .seeds
            .resource_group_lister(datacenter)
            .map_err(seed_error)?;

        let group = match lister.get(&name).await {
            Ok(group) => group,
            Err(e) if e.is_not_found() => {
                debug!(resource_group = %name, "Resource group gone, removing finalizer");
                return Ok(finalizers.without(&RESOURCE_GROUP_DELETION));
            }
            Err(source) => {
                return Err(DeletionError::ResourceGroup {
                    action: "get",
                    name,
                    source,
                })
            }
        };

        if group.is_terminating() {
            debug!(resource_group = %name, "Resource group still terminating");
            return Ok(finalizers.clone());
        }

        let api = self
            .deps
            .seeds
            .resource_group_api(datacenter)
            .map_err(seed_error)?;
        info!(resource_group = %name, %datacenter, "Deleting resource group");
        match api.delete(&name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(resource_group = %name, "Resource group already gone, waiting for cache");
            }
            Err(source) => {
                return Err(DeletionError::ResourceGroup {
                    action: "delete",
                    name,
                    source,
                })
            }
        }

        Ok(finalizers.clone())
    }
}
