//! Cluster record and the resources it owns.

use chrono::{DateTime, Utc};
use seed_id::{ClusterName, DatacenterName, ResourceGroupName};
use seed_reconcile::FinalizerSet;
use serde::{Deserialize, Serialize};

/// A managed cluster record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: ClusterName,

    #[serde(default)]
    pub finalizers: FinalizerSet,

    /// Set once deletion of the cluster was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,

    pub spec: ClusterSpec,

    #[serde(default)]
    pub status: ClusterStatus,
}

impl Cluster {
    /// Returns true if deletion of this cluster was requested.
    pub fn is_deleting(&self) -> bool {
        self.deletion_timestamp.is_some()
    }

    /// Name of the resource group owned by this cluster.
    ///
    /// Falls back to the canonical name when the status does not record one.
    pub fn resource_group_name(&self) -> ResourceGroupName {
        match &self.status.resource_group {
            Some(name) => name.clone(),
            None => ResourceGroupName::for_cluster(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub cloud: CloudSpec,

    /// Seed datacenter hosting the cluster's resource group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_datacenter: Option<DatacenterName>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<ResourceGroupName>,
}

/// Where a cluster's infrastructure lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudSpec {
    pub datacenter_name: DatacenterName,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformSpec>,
}

/// Platform specific settings of a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum PlatformSpec {
    Fake {
        token: String,
    },
    BringYourOwn,
    Aws {
        region: String,
        #[serde(default)]
        vpc_id: Option<String>,
        #[serde(default)]
        security_group_id: Option<String>,
    },
    Digitalocean {
        token: String,
    },
    Openstack {
        domain: String,
        tenant: String,
        #[serde(default)]
        network: Option<String>,
    },
}

impl PlatformSpec {
    pub fn kind(&self) -> PlatformKind {
        match self {
            Self::Fake { .. } => PlatformKind::Fake,
            Self::BringYourOwn => PlatformKind::BringYourOwn,
            Self::Aws { .. } => PlatformKind::Aws,
            Self::Digitalocean { .. } => PlatformKind::Digitalocean,
            Self::Openstack { .. } => PlatformKind::Openstack,
        }
    }
}

/// Platform identity used to select a cloud provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    Fake,
    BringYourOwn,
    Aws,
    Digitalocean,
    Openstack,
}

impl PlatformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fake => "fake",
            Self::BringYourOwn => "bringyourown",
            Self::Aws => "aws",
            Self::Digitalocean => "digitalocean",
            Self::Openstack => "openstack",
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative request that provisions compute units inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningRequest {
    pub name: String,
}

/// A compute node registered with a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeUnit {
    pub name: String,
}

/// A cluster's resource group on the seed, as observed through the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: ResourceGroupName,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

impl ResourceGroup {
    /// Returns true once deletion of the group was accepted.
    pub fn is_terminating(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}
