//! Dependency injection for contracts through a central registry.
//!
//! This crate provides:
//! - [`ContractsRegistry`]: an ownable name → address book that deploys and
//!   upgrades transparent proxies and injects dependencies into dependants
//! - The [`Dependant`] capability and the [`Managed`] wrapper that adds the
//!   injector bookkeeping to any business contract
//! - [`ProxyUpgrader`], the registry's proxy admin
//! - Typed client handles, event decoding and a JSON deployment manifest
//!
//! Contracts run on a [`ledger_host::Host`]. A dependant resolves its
//! collaborators by name from the registry it is handed during
//! `setDependencies`, so re-pointing a name and re-injecting is enough to
//! rewire a deployment.

pub mod client;
pub mod dependant;
pub mod error;
pub mod events;
pub mod interface;
pub mod manifest;
pub mod proxy_upgrader;
pub mod registry;

pub use client::{DependantHandle, RegistryHandle};
pub use dependant::{Dependant, Managed};
pub use error::ManifestError;
pub use events::RegistryEvent;
pub use manifest::DeploymentManifest;
pub use proxy_upgrader::ProxyUpgrader;
pub use registry::ContractsRegistry;
