//! Finalizers the controller attaches to cluster records.

use seed_reconcile::{Finalizer, FinalizerSet};

/// Held until every provisioning request and compute unit is gone.
pub const NODE_DELETION: Finalizer = Finalizer::from_static("seed.io/delete-nodes");

/// Held until the cloud provider released the cluster's infrastructure.
pub const CLOUD_PROVIDER_CLEANUP: Finalizer = Finalizer::from_static("seed.io/cleanup-cloud-provider");

/// Held until the cluster's resource group disappeared from the seed.
pub const RESOURCE_GROUP_DELETION: Finalizer = Finalizer::from_static("seed.io/delete-resource-group");

/// All finalizers a freshly provisioned cluster carries.
pub fn all() -> FinalizerSet {
    [NODE_DELETION, CLOUD_PROVIDER_CLEANUP, RESOURCE_GROUP_DELETION]
        .into_iter()
        .collect()
}
