//! # seed-id
//!
//! Validated name types for resources managed by the seed cluster controller.
//!
//! ## Design Principles
//!
//! - Names are user- or system-chosen labels that double as API identities
//! - All names follow the DNS-1123 label rules used by the cluster API
//! - Parsing is strict; a constructed name is always valid
//! - Names are typed to prevent passing a cluster name where a resource
//!   group name is expected
//!
//! ## Name Format
//!
//! A name is 1 to 63 characters of lowercase ASCII letters, digits or `-`,
//! starting and ending with a letter or digit.
//!
//! Examples:
//! - `prod-eu-1` (cluster)
//! - `cluster-prod-eu-1` (the cluster's resource group)
//! - `europe-west3` (seed datacenter)

mod error;
mod macros;
mod types;

pub use error::NameError;
pub use macros::{validate_label, MAX_NAME_LEN};
pub use types::*;
