use ledger_host::abi::{self, AbiValue, Decoder};
use ledger_host::log::{event_topic, Log};
use ledger_host::{Address, Revert, B256};
use serde::Serialize;

use crate::interface::{
    CONTRACT_ADDED_EVENT, CONTRACT_REMOVED_EVENT, PROXY_CONTRACT_ADDED_EVENT,
    PROXY_CONTRACT_UPGRADED_EVENT,
};

/// Notifications emitted by the registry. All parameters are unindexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    ContractAdded {
        name: String,
        contract_address: Address,
    },
    ProxyContractAdded {
        name: String,
        contract_address: Address,
        implementation: Address,
    },
    ProxyContractUpgraded {
        name: String,
        new_implementation: Address,
    },
    ContractRemoved {
        name: String,
    },
}

impl RegistryEvent {
    pub fn signature(&self) -> &'static str {
        match self {
            RegistryEvent::ContractAdded { .. } => CONTRACT_ADDED_EVENT,
            RegistryEvent::ProxyContractAdded { .. } => PROXY_CONTRACT_ADDED_EVENT,
            RegistryEvent::ProxyContractUpgraded { .. } => PROXY_CONTRACT_UPGRADED_EVENT,
            RegistryEvent::ContractRemoved { .. } => CONTRACT_REMOVED_EVENT,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RegistryEvent::ContractAdded { name, .. }
            | RegistryEvent::ProxyContractAdded { name, .. }
            | RegistryEvent::ProxyContractUpgraded { name, .. }
            | RegistryEvent::ContractRemoved { name } => name,
        }
    }

    pub fn topics(&self) -> Vec<B256> {
        vec![event_topic(self.signature())]
    }

    /// ABI-encoded parameters.
    pub fn data(&self) -> Vec<u8> {
        match self {
            RegistryEvent::ContractAdded {
                name,
                contract_address,
            } => abi::encode(&[
                AbiValue::String(name.clone()),
                AbiValue::Address(*contract_address),
            ]),
            RegistryEvent::ProxyContractAdded {
                name,
                contract_address,
                implementation,
            } => abi::encode(&[
                AbiValue::String(name.clone()),
                AbiValue::Address(*contract_address),
                AbiValue::Address(*implementation),
            ]),
            RegistryEvent::ProxyContractUpgraded {
                name,
                new_implementation,
            } => abi::encode(&[
                AbiValue::String(name.clone()),
                AbiValue::Address(*new_implementation),
            ]),
            RegistryEvent::ContractRemoved { name } => {
                abi::encode(&[AbiValue::String(name.clone())])
            }
        }
    }

    /// Decodes a registry log.
    ///
    /// Returns `Ok(None)` for logs whose first topic is not a registry event,
    /// and an error if the topic matches but the data is malformed.
    pub fn decode(log: &Log) -> Result<Option<Self>, Revert> {
        let Some(topic) = log.topic0() else {
            return Ok(None);
        };
        let mut data = Decoder::new(&log.data);

        let event = if topic == event_topic(CONTRACT_ADDED_EVENT) {
            RegistryEvent::ContractAdded {
                name: data.string()?,
                contract_address: data.address()?,
            }
        } else if topic == event_topic(PROXY_CONTRACT_ADDED_EVENT) {
            RegistryEvent::ProxyContractAdded {
                name: data.string()?,
                contract_address: data.address()?,
                implementation: data.address()?,
            }
        } else if topic == event_topic(PROXY_CONTRACT_UPGRADED_EVENT) {
            RegistryEvent::ProxyContractUpgraded {
                name: data.string()?,
                new_implementation: data.address()?,
            }
        } else if topic == event_topic(CONTRACT_REMOVED_EVENT) {
            RegistryEvent::ContractRemoved {
                name: data.string()?,
            }
        } else {
            return Ok(None);
        };

        Ok(Some(event))
    }

    /// Registry events emitted by `registry`, in order. Logs from other
    /// emitters and logs that fail to decode are skipped.
    pub fn collect(logs: &[Log], registry: Address) -> Vec<Self> {
        logs.iter()
            .filter(|log| log.address == registry)
            .filter_map(|log| Self::decode(log).ok().flatten())
            .collect()
    }
}
