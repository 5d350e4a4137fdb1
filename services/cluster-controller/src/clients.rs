//! Interfaces to the APIs the controller reads from and deletes through.
//!
//! Concrete bindings live outside this crate; [`crate::fake`] provides
//! in-memory versions.

use std::sync::Arc;

use async_trait::async_trait;
use seed_id::{ClusterName, DatacenterName, ResourceGroupName};
use seed_reconcile::FinalizerSet;
use thiserror::Error;

use crate::model::{Cluster, ComputeUnit, ProvisioningRequest, ResourceGroup};

/// Errors returned by API clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The object does not exist.
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    /// The object was modified concurrently.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The API could not be reached.
    #[error("api unavailable: {0}")]
    Unavailable(String),

    /// The API rejected the request.
    #[error("api error: {0}")]
    Api(String),
}

impl ClientError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Returns true if the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Client for the API of a single managed cluster.
#[async_trait]
pub trait UserClusterClient: Send + Sync {
    async fn list_provisioning_requests(&self) -> Result<Vec<ProvisioningRequest>, ClientError>;

    /// Delete every provisioning request in the cluster.
    async fn delete_all_provisioning_requests(&self) -> Result<(), ClientError>;

    async fn list_compute_units(&self) -> Result<Vec<ComputeUnit>, ClientError>;

    /// Delete every compute unit registered with the cluster.
    async fn delete_all_compute_units(&self) -> Result<(), ClientError>;
}

/// Opens clients for managed clusters.
#[async_trait]
pub trait UserClusterConnector: Send + Sync {
    async fn connect(&self, cluster: &Cluster) -> Result<Arc<dyn UserClusterClient>, ClientError>;
}

/// Cached, possibly stale view of resource groups on a seed.
#[async_trait]
pub trait ResourceGroupLister: Send + Sync {
    /// Fails with [`ClientError::NotFound`] when the cache holds no such group.
    async fn get(&self, name: &ResourceGroupName) -> Result<ResourceGroup, ClientError>;
}

/// Live resource group API of a seed.
#[async_trait]
pub trait ResourceGroupApi: Send + Sync {
    async fn delete(&self, name: &ResourceGroupName) -> Result<(), ClientError>;
}

/// Hands out clients per seed datacenter.
pub trait SeedClientProvider: Send + Sync {
    fn resource_group_lister(
        &self,
        datacenter: &DatacenterName,
    ) -> Result<Arc<dyn ResourceGroupLister>, ClientError>;

    fn resource_group_api(
        &self,
        datacenter: &DatacenterName,
    ) -> Result<Arc<dyn ResourceGroupApi>, ClientError>;
}

/// Storage of cluster records.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Fails with [`ClientError::NotFound`] when the record is already gone.
    async fn delete(&self, name: &ClusterName) -> Result<(), ClientError>;

    async fn update_finalizers(
        &self,
        name: &ClusterName,
        finalizers: &FinalizerSet,
    ) -> Result<(), ClientError>;
}
