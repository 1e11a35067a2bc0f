//! Declarative registry setup.
//!
//! A manifest lists registry entries and the injections to run once they are
//! in place:
//!
//! ```json
//! {
//!   "entries": [
//!     { "kind": "plain", "name": "Token", "address": "0x…" },
//!     { "kind": "proxy", "name": "Vault", "implementation": "0x…", "init": "0x…" },
//!     { "kind": "existing_proxy", "name": "Legacy", "address": "0x…" }
//!   ],
//!   "injections": [
//!     { "name": "Vault" },
//!     { "name": "Legacy", "data": "0x01" }
//!   ]
//! }
//! ```
//!
//! [`DeploymentManifest::apply`] sends one transaction per entry, then one per
//! injection, in file order, and stops at the first revert. Steps that already
//! went through stay applied.

use std::collections::HashSet;
use std::path::Path;

use ledger_host::address::parse_address;
use ledger_host::{Address, Host, Receipt};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::RegistryHandle;
use crate::error::ManifestError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentManifest {
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
    #[serde(default)]
    pub injections: Vec<Injection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ManifestEntry {
    /// Registered with `addContract`.
    Plain { name: String, address: String },
    /// Deployed behind a new proxy with `addProxyContract`, or
    /// `addProxyContractAndCall` when `init` is present.
    Proxy {
        name: String,
        implementation: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<String>,
    },
    /// A proxy already administered by the registry's upgrader, registered
    /// with `justAddProxyContract`.
    ExistingProxy { name: String, address: String },
}

impl ManifestEntry {
    pub fn name(&self) -> &str {
        match self {
            ManifestEntry::Plain { name, .. }
            | ManifestEntry::Proxy { name, .. }
            | ManifestEntry::ExistingProxy { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Injection {
    pub name: String,
    /// Hex calldata forwarded to the dependant's hook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

enum Step {
    Add {
        name: String,
        address: Address,
    },
    AddProxy {
        name: String,
        implementation: Address,
        init: Vec<u8>,
    },
    AddExistingProxy {
        name: String,
        address: Address,
    },
    Inject {
        name: String,
        data: Vec<u8>,
        declared: bool,
    },
}

impl Step {
    fn label(&self) -> String {
        match self {
            Step::Add { name, .. } => format!("addContract({name})"),
            Step::AddProxy { name, init, .. } if init.is_empty() => {
                format!("addProxyContract({name})")
            }
            Step::AddProxy { name, .. } => format!("addProxyContractAndCall({name})"),
            Step::AddExistingProxy { name, .. } => format!("justAddProxyContract({name})"),
            Step::Inject { name, data, .. } if data.is_empty() => {
                format!("injectDependencies({name})")
            }
            Step::Inject { name, .. } => format!("injectDependenciesWithData({name})"),
        }
    }
}

impl DeploymentManifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Checks names, addresses and hex data without touching a ledger.
    ///
    /// Injections naming an entry not declared here are accepted; whether the
    /// registry already holds them is only known at [`apply`](Self::apply)
    /// time.
    pub fn validate(&self) -> Result<(), ManifestError> {
        self.steps().map(|_| ())
    }

    /// Applies the manifest to `registry`, sending every transaction from
    /// `owner`. Returns one receipt per step.
    pub fn apply(
        &self,
        host: &mut Host,
        registry: &RegistryHandle,
        owner: Address,
    ) -> Result<Vec<Receipt>, ManifestError> {
        let steps = self.steps()?;
        let mut receipts = Vec::with_capacity(steps.len());

        for step in &steps {
            let label = step.label();
            let result = match step {
                Step::Add { name, address } => registry.add_contract(host, owner, name, *address),
                Step::AddProxy {
                    name,
                    implementation,
                    init,
                } if init.is_empty() => registry.add_proxy_contract(host, owner, name, *implementation),
                Step::AddProxy {
                    name,
                    implementation,
                    init,
                } => registry.add_proxy_contract_and_call(host, owner, name, *implementation, init),
                Step::AddExistingProxy { name, address } => {
                    registry.just_add_proxy_contract(host, owner, name, *address)
                }
                Step::Inject {
                    name,
                    data,
                    declared,
                } => {
                    if !declared {
                        let registered = registry.has_contract(host, name).map_err(|err| {
                            ManifestError::reverted(format!("hasContract({name})"), err)
                        })?;
                        if !registered {
                            return Err(ManifestError::UnknownInjection(name.clone()));
                        }
                    }
                    if data.is_empty() {
                        registry.inject_dependencies(host, owner, name)
                    } else {
                        registry.inject_dependencies_with_data(host, owner, name, data)
                    }
                }
            };

            let receipt = result.map_err(|err| ManifestError::reverted(label.clone(), err))?;
            info!(registry = %registry.address(), step = %label, "manifest step applied");
            receipts.push(receipt);
        }

        Ok(receipts)
    }

    fn steps(&self) -> Result<Vec<Step>, ManifestError> {
        let mut declared = HashSet::new();
        let mut steps = Vec::with_capacity(self.entries.len() + self.injections.len());

        for entry in &self.entries {
            let name = entry.name();
            if name.is_empty() {
                return Err(ManifestError::EmptyName);
            }
            if !declared.insert(name.to_string()) {
                return Err(ManifestError::DuplicateName(name.to_string()));
            }

            let step = match entry {
                ManifestEntry::Plain { name, address } => Step::Add {
                    name: name.clone(),
                    address: address_field(name, address)?,
                },
                ManifestEntry::Proxy {
                    name,
                    implementation,
                    init,
                } => Step::AddProxy {
                    name: name.clone(),
                    implementation: address_field(name, implementation)?,
                    init: hex_field(name, init.as_deref())?,
                },
                ManifestEntry::ExistingProxy { name, address } => Step::AddExistingProxy {
                    name: name.clone(),
                    address: address_field(name, address)?,
                },
            };
            steps.push(step);
        }

        for injection in &self.injections {
            if injection.name.is_empty() {
                return Err(ManifestError::EmptyName);
            }
            steps.push(Step::Inject {
                name: injection.name.clone(),
                data: hex_field(&injection.name, injection.data.as_deref())?,
                declared: declared.contains(&injection.name),
            });
        }

        Ok(steps)
    }
}

fn address_field(name: &str, value: &str) -> Result<Address, ManifestError> {
    parse_address(value).map_err(|err| ManifestError::invalid_address(name, err))
}

fn hex_field(name: &str, value: Option<&str>) -> Result<Vec<u8>, ManifestError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let digits = value.strip_prefix("0x").unwrap_or(value);

    hex::decode(digits).map_err(|err| ManifestError::InvalidHex {
        name: name.to_string(),
        reason: err.to_string(),
    })
}
