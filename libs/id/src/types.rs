//! Typed name definitions for controller resources.

use sha2::{Digest, Sha256};

use crate::{define_name, MAX_NAME_LEN};

// =============================================================================
// Cluster Model
// =============================================================================

define_name!(ClusterName, "cluster");
define_name!(ResourceGroupName, "resource group");

// =============================================================================
// Placement
// =============================================================================

define_name!(DatacenterName, "datacenter");

impl ResourceGroupName {
    /// Prefix of the resource group that is created for every cluster.
    pub const CLUSTER_PREFIX: &'static str = "cluster-";

    /// Hex characters of the digest appended to shortened names.
    const HASH_LEN: usize = 8;

    /// Derives the canonical resource group name owned by `cluster`.
    ///
    /// Short cluster names map to `cluster-<name>`. When that would exceed
    /// [`MAX_NAME_LEN`], the cluster name is cut and suffixed with a digest of
    /// the full name, so the result is always a valid label.
    pub fn for_cluster(cluster: &ClusterName) -> Self {
        let name = cluster.as_str();
        if Self::CLUSTER_PREFIX.len() + name.len() <= MAX_NAME_LEN {
            return Self(format!("{}{}", Self::CLUSTER_PREFIX, name));
        }

        let digest = Sha256::digest(name.as_bytes());
        let hash = hex::encode(&digest[..Self::HASH_LEN / 2]);
        let keep = MAX_NAME_LEN - Self::CLUSTER_PREFIX.len() - 1 - Self::HASH_LEN;
        // Names are ASCII, so byte slicing is on a char boundary.
        Self(format!("{}{}-{}", Self::CLUSTER_PREFIX, &name[..keep], hash))
    }
}

// =============================================================================
// Tests
// =============================================================================
