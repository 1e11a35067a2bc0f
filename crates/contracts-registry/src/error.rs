use ledger_host::error::LedgerError;
use ledger_host::Revert;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("malformed manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("entry names must not be empty")]
    EmptyName,

    #[error("duplicate entry name: {0}")]
    DuplicateName(String),

    #[error("invalid address for {name}: {reason}")]
    InvalidAddress { name: String, reason: String },

    #[error("invalid hex data for {name}: {reason}")]
    InvalidHex { name: String, reason: String },

    #[error("injection target {0} is neither declared nor registered")]
    UnknownInjection(String),

    #[error("{step} reverted: {source}")]
    Reverted {
        step: String,
        #[source]
        source: Revert,
    },
}

impl ManifestError {
    pub(crate) fn invalid_address(name: &str, err: LedgerError) -> Self {
        ManifestError::InvalidAddress {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn reverted(step: impl Into<String>, source: Revert) -> Self {
        ManifestError::Reverted {
            step: step.into(),
            source,
        }
    }
}
