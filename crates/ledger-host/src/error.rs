use alloy_primitives::Address;
use thiserror::Error;

/// Key and address errors raised outside of contract execution.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Reasons a contract call fails.
///
/// A revert aborts the frame that raised it and every frame above it that
/// propagates it; the host discards all state changes and events of the
/// aborted frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Revert {
    /// The caller is not the principal the operation requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A name or address has no registered entry.
    #[error("not found: {0}")]
    NotFound(String),

    /// An argument is outside the accepted domain (e.g. the zero address).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not valid for the current state of the target.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A call to another contract did not behave as expected.
    #[error("external call failed: {0}")]
    ExternalCall(String),

    #[error("unknown function selector 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    #[error("abi decoding error: {0}")]
    Abi(String),

    #[error("no contract code at {0}")]
    NoCode(Address),

    #[error("call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_private_key() {
        let err = LedgerError::InvalidPrivateKey("scalar is zero".into());
        assert_eq!(err.to_string(), "invalid private key: scalar is zero");
    }

    #[test]
    fn display_invalid_address() {
        let err = LedgerError::InvalidAddress("bad checksum".into());
        assert_eq!(err.to_string(), "invalid address: bad checksum");
    }

    #[test]
    fn display_unauthorized() {
        let err = Revert::Unauthorized("caller is not the owner".into());
        assert_eq!(err.to_string(), "unauthorized: caller is not the owner");
    }

    #[test]
    fn display_unknown_selector() {
        let err = Revert::UnknownSelector([0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(err.to_string(), "unknown function selector 0xdeadbeef");
    }

    #[test]
    fn display_no_code() {
        let err = Revert::NoCode(Address::ZERO);
        assert!(err.to_string().starts_with("no contract code at 0x"));
    }

    #[test]
    fn display_call_depth() {
        let err = Revert::CallDepthExceeded(1024);
        assert_eq!(err.to_string(), "call depth limit of 1024 exceeded");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(Revert::NotFound("Vault".into()));
        assert!(err.to_string().contains("Vault"));
    }

    #[test]
    fn reverts_compare_by_value() {
        assert_eq!(
            Revert::InvalidState("not a proxy".into()),
            Revert::InvalidState("not a proxy".into())
        );
        assert_ne!(
            Revert::InvalidState("not a proxy".into()),
            Revert::NotFound("not a proxy".into())
        );
    }
}
