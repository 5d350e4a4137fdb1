//! In-memory collaborators for tests and local development.
//!
//! The fakes record how often they were called and can be told to fail every
//! request with a given [`ClientError`]. Deletes take effect immediately,
//! except for resource groups: a deleted group stays in the cache as
//! terminating until [`FakeSeed::finish_termination`] is called.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use seed_id::{ClusterName, DatacenterName, ResourceGroupName};
use seed_reconcile::FinalizerSet;
use tokio::sync::Mutex;
use tracing::debug;

use crate::clients::{
    ClientError, ClusterStore, ResourceGroupApi, ResourceGroupLister, SeedClientProvider,
    UserClusterClient, UserClusterConnector,
};
use crate::config::{Config, LogFormat};
use crate::controller::ClusterController;
use crate::deletion::{ClusterDeletion, Collaborators};
use crate::model::{
    CloudSpec, Cluster, ClusterSpec, ClusterStatus, ComputeUnit, PlatformKind, PlatformSpec,
    ProvisioningRequest, ResourceGroup,
};
use crate::provider::{CloudProvider, ProviderRegistry};

/// Seed datacenter every fixture knows about.
pub const FAKE_DATACENTER: &str = "seed";

// =============================================================================
// User cluster
// =============================================================================

#[derive(Default)]
struct UserClusterState {
    provisioning_requests: Vec<ProvisioningRequest>,
    compute_units: Vec<ComputeUnit>,
    connect_calls: usize,
    delete_requests_calls: usize,
    delete_units_calls: usize,
    hold_deletes: bool,
    failure: Option<ClientError>,
}

/// Fake managed cluster API. Also acts as its own connector.
#[derive(Clone, Default)]
pub struct FakeUserCluster {
    state: Arc<Mutex<UserClusterState>>,
}

impl FakeUserCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_provisioning_request(&self, name: &str) {
        self.state
            .lock()
            .await
            .provisioning_requests
            .push(ProvisioningRequest {
                name: name.to_string(),
            });
    }

    pub async fn add_compute_unit(&self, name: &str) {
        self.state.lock().await.compute_units.push(ComputeUnit {
            name: name.to_string(),
        });
    }

    pub async fn provisioning_request_count(&self) -> usize {
        self.state.lock().await.provisioning_requests.len()
    }

    pub async fn compute_unit_count(&self) -> usize {
        self.state.lock().await.compute_units.len()
    }

    pub async fn connect_calls(&self) -> usize {
        self.state.lock().await.connect_calls
    }

    pub async fn delete_provisioning_requests_calls(&self) -> usize {
        self.state.lock().await.delete_requests_calls
    }

    pub async fn delete_compute_units_calls(&self) -> usize {
        self.state.lock().await.delete_units_calls
    }

    /// Accept deletes without removing anything, like objects blocked by
    /// their own finalizers.
    pub async fn hold_deletes(&self, hold: bool) {
        self.state.lock().await.hold_deletes = hold;
    }

    /// Fail every subsequent list and delete call with `error`.
    pub async fn fail_with(&self, error: ClientError) {
        self.state.lock().await.failure = Some(error);
    }

    pub async fn clear_failure(&self) {
        self.state.lock().await.failure = None;
    }
}

impl UserClusterState {
    fn check(&self) -> Result<(), ClientError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UserClusterClient for FakeUserCluster {
    async fn list_provisioning_requests(&self) -> Result<Vec<ProvisioningRequest>, ClientError> {
        let state = self.state.lock().await;
        state.check()?;
        Ok(state.provisioning_requests.clone())
    }

    async fn delete_all_provisioning_requests(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.check()?;
        state.delete_requests_calls += 1;
        if !state.hold_deletes {
            state.provisioning_requests.clear();
        }
        Ok(())
    }

    async fn list_compute_units(&self) -> Result<Vec<ComputeUnit>, ClientError> {
        let state = self.state.lock().await;
        state.check()?;
        Ok(state.compute_units.clone())
    }

    async fn delete_all_compute_units(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        state.check()?;
        state.delete_units_calls += 1;
        if !state.hold_deletes {
            state.compute_units.clear();
        }
        Ok(())
    }
}

#[async_trait]
impl UserClusterConnector for FakeUserCluster {
    async fn connect(&self, cluster: &Cluster) -> Result<Arc<dyn UserClusterClient>, ClientError> {
        debug!(cluster = %cluster.name, "Connecting to fake user cluster");
        self.state.lock().await.connect_calls += 1;
        Ok(Arc::new(self.clone()))
    }
}

// =============================================================================
// Seed
// =============================================================================

#[derive(Default)]
struct SeedState {
    groups: HashMap<ResourceGroupName, ResourceGroup>,
    /// Groups the cache still lists but the live API no longer has.
    dropped: HashSet<ResourceGroupName>,
    delete_calls: usize,
    failure: Option<ClientError>,
}

/// Fake seed serving both the cached and the live resource group API.
#[derive(Clone)]
pub struct FakeSeed {
    datacenters: Arc<HashSet<String>>,
    state: Arc<Mutex<SeedState>>,
}

impl Default for FakeSeed {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSeed {
    /// A seed that serves [`FAKE_DATACENTER`].
    pub fn new() -> Self {
        Self {
            datacenters: Arc::new(HashSet::from([FAKE_DATACENTER.to_string()])),
            state: Arc::new(Mutex::new(SeedState::default())),
        }
    }

    /// Add a live resource group named `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid resource group name.
    pub async fn add_resource_group(&self, name: &str) {
        let name: ResourceGroupName = name.parse().expect("valid resource group name");
        self.state.lock().await.groups.insert(
            name.clone(),
            ResourceGroup {
                name,
                deletion_timestamp: None,
            },
        );
    }

    /// Remove `name` from the live API only, leaving a stale cache entry.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid resource group name.
    pub async fn drop_live(&self, name: &str) {
        let name: ResourceGroupName = name.parse().expect("valid resource group name");
        self.state.lock().await.dropped.insert(name);
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.state
            .lock()
            .await
            .groups
            .keys()
            .any(|group| group.as_str() == name)
    }

    pub async fn is_terminating(&self, name: &str) -> bool {
        self.state
            .lock()
            .await
            .groups
            .values()
            .any(|group| group.name.as_str() == name && group.is_terminating())
    }

    /// Drop every terminating group, as the seed would once cleanup finished.
    pub async fn finish_termination(&self) {
        self.state
            .lock()
            .await
            .groups
            .retain(|_, group| !group.is_terminating());
    }

    pub async fn delete_calls(&self) -> usize {
        self.state.lock().await.delete_calls
    }

    /// Fail every subsequent get and delete call with `error`.
    pub async fn fail_with(&self, error: ClientError) {
        self.state.lock().await.failure = Some(error);
    }

    pub async fn clear_failure(&self) {
        self.state.lock().await.failure = None;
    }

    fn serves(&self, datacenter: &DatacenterName) -> Result<(), ClientError> {
        if self.datacenters.contains(datacenter.as_str()) {
            Ok(())
        } else {
            Err(ClientError::not_found("datacenter", datacenter.as_str()))
        }
    }
}

#[async_trait]
impl ResourceGroupLister for FakeSeed {
    async fn get(&self, name: &ResourceGroupName) -> Result<ResourceGroup, ClientError> {
        let state = self.state.lock().await;
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        state
            .groups
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::not_found(ResourceGroupName::KIND, name.as_str()))
    }
}

#[async_trait]
impl ResourceGroupApi for FakeSeed {
    async fn delete(&self, name: &ResourceGroupName) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        state.delete_calls += 1;
        if state.dropped.contains(name) {
            return Err(ClientError::not_found(ResourceGroupName::KIND, name.as_str()));
        }
        match state.groups.get_mut(name) {
            Some(group) => {
                if group.deletion_timestamp.is_none() {
                    group.deletion_timestamp = Some(Utc::now());
                }
                Ok(())
            }
            None => Err(ClientError::not_found(ResourceGroupName::KIND, name.as_str())),
        }
    }
}

impl SeedClientProvider for FakeSeed {
    fn resource_group_lister(
        &self,
        datacenter: &DatacenterName,
    ) -> Result<Arc<dyn ResourceGroupLister>, ClientError> {
        self.serves(datacenter)?;
        Ok(Arc::new(self.clone()))
    }

    fn resource_group_api(
        &self,
        datacenter: &DatacenterName,
    ) -> Result<Arc<dyn ResourceGroupApi>, ClientError> {
        self.serves(datacenter)?;
        Ok(Arc::new(self.clone()))
    }
}

// =============================================================================
// Cluster records
// =============================================================================

#[derive(Default)]
struct ClusterStoreState {
    records: HashMap<ClusterName, Cluster>,
    delete_calls: usize,
    update_calls: usize,
    failure: Option<ClientError>,
}

/// Fake cluster record storage.
#[derive(Clone, Default)]
pub struct FakeClusterStore {
    state: Arc<Mutex<ClusterStoreState>>,
}

impl FakeClusterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, cluster: Cluster) {
        self.state
            .lock()
            .await
            .records
            .insert(cluster.name.clone(), cluster);
    }

    pub async fn get(&self, name: &ClusterName) -> Option<Cluster> {
        self.state.lock().await.records.get(name).cloned()
    }

    pub async fn contains(&self, name: &ClusterName) -> bool {
        self.state.lock().await.records.contains_key(name)
    }

    pub async fn delete_calls(&self) -> usize {
        self.state.lock().await.delete_calls
    }

    pub async fn update_calls(&self) -> usize {
        self.state.lock().await.update_calls
    }

    /// Fail every subsequent delete and update call with `error`.
    pub async fn fail_with(&self, error: ClientError) {
        self.state.lock().await.failure = Some(error);
    }

    pub async fn clear_failure(&self) {
        self.state.lock().await.failure = None;
    }
}

#[async_trait]
impl ClusterStore for FakeClusterStore {
    async fn delete(&self, name: &ClusterName) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        state.delete_calls += 1;
        state
            .records
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ClientError::not_found(ClusterName::KIND, name.as_str()))
    }

    async fn update_finalizers(
        &self,
        name: &ClusterName,
        finalizers: &FinalizerSet,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        state.update_calls += 1;
        let record = state
            .records
            .get_mut(name)
            .ok_or_else(|| ClientError::not_found(ClusterName::KIND, name.as_str()))?;
        record.finalizers = finalizers.clone();
        Ok(())
    }
}

// =============================================================================
// Cloud provider
// =============================================================================

/// Cloud provider that counts cleanups.
#[derive(Default)]
pub struct RecordingProvider {
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose cleanup always fails.
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn clean_up_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudProvider for RecordingProvider {
    async fn clean_up(&self, spec: &CloudSpec) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("cloud provider configured to fail");
        }
        debug!(datacenter = %spec.datacenter_name, "Fake cloud cleanup");
        Ok(())
    }
}

// =============================================================================
// Fixture
// =============================================================================

/// A full set of fakes wired together.
///
/// The [`RecordingProvider`] is registered for [`PlatformKind::Aws`], which is
/// the platform of [`test_cluster`].
pub struct Fixture {
    pub user_cluster: FakeUserCluster,
    pub seed: FakeSeed,
    pub clusters: FakeClusterStore,
    pub provider: Arc<RecordingProvider>,
    pub registry: Arc<ProviderRegistry>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_provider(RecordingProvider::new())
    }

    pub fn with_failing_provider() -> Self {
        Self::with_provider(RecordingProvider::failing())
    }

    fn with_provider(provider: RecordingProvider) -> Self {
        let provider = Arc::new(provider);
        let mut registry = ProviderRegistry::with_builtin();
        registry.register(PlatformKind::Aws, provider.clone());

        Self {
            user_cluster: FakeUserCluster::new(),
            seed: FakeSeed::new(),
            clusters: FakeClusterStore::new(),
            provider,
            registry: Arc::new(registry),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            user_clusters: Arc::new(self.user_cluster.clone()),
            providers: self.registry.clone(),
            seeds: Arc::new(self.seed.clone()),
            clusters: Arc::new(self.clusters.clone()),
        }
    }

    pub fn config(&self) -> Config {
        Config {
            log_level: "debug".to_string(),
            log_format: LogFormat::Pretty,
            default_datacenter: fake_datacenter(),
        }
    }

    pub fn deletion(&self) -> ClusterDeletion {
        ClusterDeletion::new(self.collaborators(), fake_datacenter())
    }

    pub fn controller(&self) -> ClusterController {
        ClusterController::new(&self.config(), self.collaborators())
    }
}

fn fake_datacenter() -> DatacenterName {
    FAKE_DATACENTER.parse().expect("valid datacenter name")
}

/// Cluster `prod-eu-1` on AWS, marked for deletion, carrying `finalizers`.
pub fn test_cluster(finalizers: FinalizerSet) -> Cluster {
    Cluster {
        name: "prod-eu-1".parse().expect("valid cluster name"),
        finalizers,
        deletion_timestamp: Some(Utc::now()),
        spec: ClusterSpec {
            cloud: CloudSpec {
                datacenter_name: "europe-west3".parse().expect("valid datacenter name"),
                platform: Some(PlatformSpec::Aws {
                    region: "eu-central-1".to_string(),
                    vpc_id: None,
                    security_group_id: None,
                }),
            },
            seed_datacenter: None,
        },
        status: ClusterStatus::default(),
    }
}
