//! Integration tests for cluster teardown.
//!
//! These tests drive `ClusterController::reconcile` against the in-memory
//! fakes, re-reading the stored record between passes the way a work queue
//! would.

use rstest::rstest;
use seed_cluster_controller::clients::ClientError;
use seed_cluster_controller::fake::{test_cluster, Fixture};
use seed_cluster_controller::finalizers::{
    self, CLOUD_PROVIDER_CLEANUP, NODE_DELETION, RESOURCE_GROUP_DELETION,
};
use seed_cluster_controller::{Cluster, DeletionError, DeletionOutcome, ReconcileOutcome};
use seed_id::{ClusterName, ResourceGroupName};
use seed_reconcile::{Finalizer, FinalizerSet};

const GROUP: &str = "cluster-prod-eu-1";

async fn stored(fixture: &Fixture, cluster: &Cluster) -> Option<Cluster> {
    fixture.clusters.get(&cluster.name).await
}

/// Reconcile the stored record until it is gone, letting the seed finish
/// resource group termination between passes.
async fn reconcile_until_deleted(fixture: &Fixture, cluster: &Cluster, max_passes: usize) {
    let controller = fixture.controller();
    for _ in 0..max_passes {
        let Some(current) = stored(fixture, cluster).await else {
            return;
        };
        controller.reconcile(&current).await.unwrap();
        fixture.seed.finish_termination().await;
    }
    panic!("cluster not deleted after {max_passes} passes");
}

#[tokio::test]
async fn test_single_pass_when_nothing_is_left() {
    let fixture = Fixture::new();
    let cluster = test_cluster(finalizers::all());
    fixture.clusters.insert(cluster.clone()).await;

    let outcome = fixture.controller().reconcile(&cluster).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Deletion(DeletionOutcome::Deleted));
    assert!(stored(&fixture, &cluster).await.is_none());
    assert_eq!(fixture.provider.clean_up_calls(), 1);
    assert_eq!(fixture.seed.delete_calls().await, 0);
}

#[tokio::test]
async fn test_provisioning_request_defers_everything_else() {
    let fixture = Fixture::new();
    fixture.user_cluster.add_provisioning_request("md-1").await;
    fixture.seed.add_resource_group(GROUP).await;
    let cluster = test_cluster(finalizers::all());
    fixture.clusters.insert(cluster.clone()).await;

    let outcome = fixture.controller().reconcile(&cluster).await.unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::Deletion(DeletionOutcome::NodesPending {
            finalizers: finalizers::all()
        })
    );
    assert_eq!(fixture.user_cluster.provisioning_request_count().await, 0);
    assert_eq!(fixture.provider.clean_up_calls(), 0);
    assert_eq!(fixture.seed.delete_calls().await, 0);
    assert_eq!(fixture.clusters.delete_calls().await, 0);
    assert_eq!(
        stored(&fixture, &cluster).await.unwrap().finalizers,
        finalizers::all()
    );
}

#[tokio::test]
async fn test_live_resource_group_is_deleted_but_guard_kept() {
    let fixture = Fixture::new();
    fixture.seed.add_resource_group(GROUP).await;
    let cluster = test_cluster(FinalizerSet::new().with(&RESOURCE_GROUP_DELETION));
    fixture.clusters.insert(cluster.clone()).await;

    let outcome = fixture.controller().reconcile(&cluster).await.unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::Deletion(DeletionOutcome::Converging {
            finalizers: cluster.finalizers.clone()
        })
    );
    assert!(fixture.seed.is_terminating(GROUP).await);
    assert_eq!(fixture.clusters.delete_calls().await, 0);
    assert!(stored(&fixture, &cluster).await.is_some());
}

#[tokio::test]
async fn test_stale_cache_entry_keeps_guard() {
    let fixture = Fixture::new();
    fixture.seed.add_resource_group(GROUP).await;
    fixture.seed.drop_live(GROUP).await;
    let cluster = test_cluster(FinalizerSet::new().with(&RESOURCE_GROUP_DELETION));
    fixture.clusters.insert(cluster.clone()).await;

    let outcome = fixture.controller().reconcile(&cluster).await.unwrap();

    assert_eq!(
        outcome,
        ReconcileOutcome::Deletion(DeletionOutcome::Converging {
            finalizers: cluster.finalizers.clone()
        })
    );
    assert_eq!(fixture.seed.delete_calls().await, 1);
    assert_eq!(fixture.clusters.delete_calls().await, 0);
    assert_eq!(
        stored(&fixture, &cluster).await.unwrap().finalizers,
        cluster.finalizers
    );
}

#[rstest]
#[case(56)]
#[case(60)]
#[case(63)]
#[tokio::test]
async fn test_long_cluster_name_converges(#[case] len: usize) {
    let fixture = Fixture::new();
    let mut cluster = test_cluster(FinalizerSet::new().with(&RESOURCE_GROUP_DELETION));
    cluster.name = ClusterName::parse(&"a".repeat(len)).unwrap();
    let group = ResourceGroupName::for_cluster(&cluster.name);
    fixture.seed.add_resource_group(group.as_str()).await;
    fixture.clusters.insert(cluster.clone()).await;

    reconcile_until_deleted(&fixture, &cluster, 5).await;

    assert!(stored(&fixture, &cluster).await.is_none());
    assert_eq!(fixture.seed.delete_calls().await, 1);
    assert!(!fixture.seed.contains(group.as_str()).await);
}

#[tokio::test]
async fn test_already_deleted_record_is_success() {
    let fixture = Fixture::new();
    let cluster = test_cluster(FinalizerSet::new());

    let outcome = fixture.controller().reconcile(&cluster).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Deletion(DeletionOutcome::Deleted));
    assert_eq!(fixture.clusters.delete_calls().await, 1);
}

#[tokio::test]
async fn test_repeated_pass_is_idempotent() {
    let fixture = Fixture::new();
    fixture.user_cluster.add_provisioning_request("md-1").await;
    fixture.user_cluster.hold_deletes(true).await;
    let cluster = test_cluster(finalizers::all());
    fixture.clusters.insert(cluster.clone()).await;
    let controller = fixture.controller();

    let first = controller.reconcile(&cluster).await.unwrap();
    let second = controller.reconcile(&cluster).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        stored(&fixture, &cluster).await.unwrap().finalizers,
        finalizers::all()
    );
    assert_eq!(fixture.user_cluster.delete_provisioning_requests_calls().await, 2);
    assert_eq!(fixture.user_cluster.delete_compute_units_calls().await, 0);
    assert_eq!(fixture.provider.clean_up_calls(), 0);
}

#[tokio::test]
async fn test_repeated_pass_on_terminating_group_is_idempotent() {
    let fixture = Fixture::new();
    fixture.seed.add_resource_group(GROUP).await;
    let cluster = test_cluster(FinalizerSet::new().with(&RESOURCE_GROUP_DELETION));
    fixture.clusters.insert(cluster.clone()).await;
    let controller = fixture.controller();

    let first = controller.reconcile(&cluster).await.unwrap();
    let second = controller.reconcile(&cluster).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fixture.seed.delete_calls().await, 1);
    assert_eq!(fixture.clusters.update_calls().await, 0);
}

#[tokio::test]
async fn test_terminating_group_converges_over_passes() {
    let fixture = Fixture::new();
    fixture.user_cluster.add_provisioning_request("md-1").await;
    fixture.user_cluster.add_compute_unit("node-1").await;
    fixture.seed.add_resource_group(GROUP).await;
    let cluster = test_cluster(finalizers::all());
    fixture.clusters.insert(cluster.clone()).await;
    let controller = fixture.controller();

    // Pass 1: provisioning requests.
    let current = stored(&fixture, &cluster).await.unwrap();
    controller.reconcile(&current).await.unwrap();
    assert_eq!(fixture.user_cluster.compute_unit_count().await, 1);

    // Pass 2: compute units.
    let current = stored(&fixture, &cluster).await.unwrap();
    controller.reconcile(&current).await.unwrap();
    assert_eq!(fixture.user_cluster.compute_unit_count().await, 0);
    assert_eq!(fixture.provider.clean_up_calls(), 0);

    // Pass 3: nodes confirmed gone, cloud released, group delete issued.
    let current = stored(&fixture, &cluster).await.unwrap();
    controller.reconcile(&current).await.unwrap();
    let current = stored(&fixture, &cluster).await.unwrap();
    assert_eq!(
        current.finalizers,
        FinalizerSet::new().with(&RESOURCE_GROUP_DELETION)
    );
    assert!(fixture.seed.is_terminating(GROUP).await);

    // Pass 4: group still terminating in the cache.
    controller.reconcile(&current).await.unwrap();
    assert_eq!(fixture.seed.delete_calls().await, 1);
    assert!(stored(&fixture, &cluster).await.is_some());

    // Pass 5: cache reports the group gone.
    fixture.seed.finish_termination().await;
    let current = stored(&fixture, &cluster).await.unwrap();
    let outcome = controller.reconcile(&current).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Deletion(DeletionOutcome::Deleted));
    assert!(!fixture.seed.contains(GROUP).await);
}

#[rstest]
#[case(&[])]
#[case(&[NODE_DELETION])]
#[case(&[CLOUD_PROVIDER_CLEANUP])]
#[case(&[RESOURCE_GROUP_DELETION])]
#[case(&[NODE_DELETION, RESOURCE_GROUP_DELETION])]
#[case(&[NODE_DELETION, CLOUD_PROVIDER_CLEANUP, RESOURCE_GROUP_DELETION])]
#[tokio::test]
async fn test_any_finalizer_subset_converges(#[case] initial: &[Finalizer]) {
    let fixture = Fixture::new();
    fixture.user_cluster.add_provisioning_request("md-1").await;
    fixture.user_cluster.add_compute_unit("node-1").await;
    fixture.seed.add_resource_group(GROUP).await;
    let cluster = test_cluster(initial.iter().cloned().collect());
    fixture.clusters.insert(cluster.clone()).await;

    reconcile_until_deleted(&fixture, &cluster, 10).await;

    assert!(stored(&fixture, &cluster).await.is_none());
    let expected_cleanups = usize::from(initial.contains(&CLOUD_PROVIDER_CLEANUP));
    assert_eq!(fixture.provider.clean_up_calls(), expected_cleanups);
}

#[tokio::test]
async fn test_cloud_finalizer_never_cleared_while_nodes_pending() {
    let fixture = Fixture::new();
    fixture.user_cluster.add_compute_unit("node-1").await;
    let cluster = test_cluster(finalizers::all());
    fixture.clusters.insert(cluster.clone()).await;

    let outcome = fixture.controller().reconcile(&cluster).await.unwrap();

    let finalizers = match outcome {
        ReconcileOutcome::Deletion(DeletionOutcome::NodesPending { finalizers }) => finalizers,
        other => panic!("expected pending nodes, got {other:?}"),
    };
    assert!(finalizers.contains(&NODE_DELETION));
    assert!(finalizers.contains(&CLOUD_PROVIDER_CLEANUP));
    assert_eq!(fixture.provider.clean_up_calls(), 0);
}

#[tokio::test]
async fn test_provider_failure_aborts_pass_and_keeps_guards() {
    let fixture = Fixture::with_failing_provider();
    let cluster = test_cluster(finalizers::all());
    fixture.clusters.insert(cluster.clone()).await;

    let err = fixture.controller().reconcile(&cluster).await.unwrap_err();

    assert!(matches!(err, DeletionError::CloudProvider(_)));
    assert_eq!(fixture.seed.delete_calls().await, 0);
    assert_eq!(fixture.clusters.delete_calls().await, 0);
    assert_eq!(
        stored(&fixture, &cluster).await.unwrap().finalizers,
        finalizers::all()
    );
}

#[tokio::test]
async fn test_transient_failure_recovers_on_retry() {
    let fixture = Fixture::new();
    let cluster = test_cluster(finalizers::all());
    fixture.clusters.insert(cluster.clone()).await;
    fixture
        .seed
        .fail_with(ClientError::Unavailable("cache not synced".to_string()))
        .await;
    let controller = fixture.controller();

    let err = controller.reconcile(&cluster).await.unwrap_err();
    assert!(err.to_string().contains("resource group cluster-prod-eu-1"));

    fixture.seed.clear_failure().await;
    let current = stored(&fixture, &cluster).await.unwrap();
    let outcome = controller.reconcile(&current).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Deletion(DeletionOutcome::Deleted));
    // The failed pass had already released cloud resources; the retry does it again.
    assert_eq!(fixture.provider.clean_up_calls(), 2);
}

#[tokio::test]
async fn test_unknown_platform_keeps_failing() {
    let fixture = Fixture::new();
    let mut cluster = test_cluster(finalizers::all());
    cluster.spec.cloud.platform = None;
    fixture.clusters.insert(cluster.clone()).await;
    let controller = fixture.controller();

    for _ in 0..2 {
        let err = controller.reconcile(&cluster).await.unwrap_err();
        assert!(matches!(err, DeletionError::ProviderResolution(_)));
    }
    assert!(stored(&fixture, &cluster).await.is_some());
}
