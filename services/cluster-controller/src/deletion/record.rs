//! Removal of the cluster record.

use seed_reconcile::FinalizerSet;
use tracing::{debug, instrument};

use super::{ClusterDeletion, DeletionError};
use crate::model::Cluster;

impl ClusterDeletion {
    /// Delete the cluster record once no finalizers remain.
    ///
    /// Returns true if the record is gone, including when an earlier pass
    /// already deleted it.
    #[instrument(skip_all, fields(cluster = %cluster.name))]
    pub(crate) async fn delete_record(
        &self,
        cluster: &Cluster,
        finalizers: &FinalizerSet,
    ) -> Result<bool, DeletionError> {
        if !finalizers.is_empty() {
            debug!(%finalizers, "Finalizers remain, keeping cluster record");
            return Ok(false);
        }

        match self.deps.clusters.delete(&cluster.name).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                debug!("Cluster record already deleted");
                Ok(true)
            }
            Err(source) => Err(DeletionError::Record {
                name: cluster.name.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use seed_reconcile::FinalizerSet;

    use crate::clients::ClientError;
    use crate::deletion::DeletionError;
    use crate::fake::{test_cluster, Fixture};
    use crate::finalizers::NODE_DELETION;

    #[tokio::test]
    async fn test_deletes_when_no_finalizers() {
        let fixture = Fixture::new();
        let cluster = test_cluster(FinalizerSet::new());
        fixture.clusters.insert(cluster.clone()).await;

        let deleted = fixture
            .deletion()
            .delete_record(&cluster, &cluster.finalizers)
            .await
            .unwrap();

        assert!(deleted);
        assert!(!fixture.clusters.contains(&cluster.name).await);
    }

    #[tokio::test]
    async fn test_never_deletes_with_finalizers() {
        let fixture = Fixture::new();
        let cluster = test_cluster(FinalizerSet::new().with(&NODE_DELETION));
        fixture.clusters.insert(cluster.clone()).await;

        let deleted = fixture
            .deletion()
            .delete_record(&cluster, &cluster.finalizers)
            .await
            .unwrap();

        assert!(!deleted);
        assert_eq!(fixture.clusters.delete_calls().await, 0);
    }

    #[tokio::test]
    async fn test_not_found_is_success() {
        let fixture = Fixture::new();
        let cluster = test_cluster(FinalizerSet::new());

        let deleted = fixture
            .deletion()
            .delete_record(&cluster, &cluster.finalizers)
            .await
            .unwrap();

        assert!(deleted);
        assert_eq!(fixture.clusters.delete_calls().await, 1);
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let fixture = Fixture::new();
        fixture
            .clusters
            .fail_with(ClientError::Conflict("resource version changed".to_string()))
            .await;
        let cluster = test_cluster(FinalizerSet::new());

        let err = fixture
            .deletion()
            .delete_record(&cluster, &cluster.finalizers)
            .await
            .unwrap_err();

        assert!(matches!(err, DeletionError::Record { .. }));
    }
}
