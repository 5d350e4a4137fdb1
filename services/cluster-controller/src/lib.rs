//! Seed cluster controller library.
//!
//! Drives the teardown of a managed cluster once its record is marked for
//! deletion. Teardown is level-triggered: every call looks at the record's
//! finalizers and at the observed state of the resources the cluster owns,
//! takes the next safe step, and returns. The caller (a work queue outside
//! this crate) invokes [`ClusterController::reconcile`] again until the
//! record is gone.
//!
//! ## Teardown order
//!
//! ```text
//! reconcile(cluster)
//! ├── nodes           provisioning requests, then compute units
//! ├── cloud provider  platform specific infrastructure
//! ├── resource group  the cluster's namespace on the seed
//! └── record          the cluster object itself
//! ```
//!
//! Each step is gated by its finalizer and only the step owning a finalizer
//! removes it. Callers must not reconcile the same cluster concurrently.
//!
//! This crate ships no binary. The embedding binary is expected to load
//! [`config::Config::from_env`] and call [`telemetry::init`] once before
//! building a [`ClusterController`].
//!
//! ## Modules
//!
//! - `clients`: traits for the APIs the controller talks to
//! - `deletion`: the teardown sequence and its steps
//! - `provider`: cloud provider registry
//! - `fake`: in-memory collaborators for tests and local development

pub mod clients;
pub mod config;
pub mod controller;
pub mod deletion;
pub mod fake;
pub mod finalizers;
pub mod model;
pub mod provider;
pub mod telemetry;

pub use controller::{ClusterController, ReconcileOutcome};
pub use deletion::{ClusterDeletion, DeletionError, DeletionOutcome};
pub use model::Cluster;
