//! In-process execution host.
//!
//! Contracts are stateless code objects; their state lives in the host's
//! [`Storage`] under the address they execute as. Calls run synchronously on
//! the caller's stack. Every state change is recorded in a journal together
//! with the value it replaced. A frame remembers the journal length when it
//! starts and, if it reverts, unwinds the journal back to that point, so a
//! failed call leaves no state changes and no events behind, and a failed
//! transaction is as if it never ran. The journal is cleared once a
//! top-level transaction commits.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::address::contract_address;
use crate::error::Revert;
use crate::log::Log;
use crate::storage::{Storage, StorageKey};

/// Default maximum nesting of calls, matching the EVM.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Host tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Frames nested deeper than this revert with
    /// [`Revert::CallDepthExceeded`].
    pub max_call_depth: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Contract code.
///
/// Implementations keep no state of their own: everything persistent goes
/// through the [`CallContext`], which scopes storage to the executing address.
/// The same code object can therefore back many addresses, and a proxy can run
/// an implementation's code against its own storage.
pub trait Contract: Send + Sync + 'static {
    /// Runs once, when the code is deployed.
    fn construct(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> Result<(), Revert> {
        let _ = (ctx, args);
        Ok(())
    }

    /// Handles a call and returns the ABI-encoded output.
    fn call(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert>;
}

/// Result of a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub output: Vec<u8>,
    /// Events emitted by the transaction, in emission order.
    pub logs: Vec<Log>,
}

#[derive(Default)]
struct World {
    code: HashMap<Address, Arc<dyn Contract>>,
    storage: Storage,
    nonces: HashMap<Address, u64>,
}

/// One undoable state change.
enum JournalEntry {
    StorageChanged {
        address: Address,
        key: StorageKey,
        previous: B256,
    },
    CodeDeployed(Address),
    NonceChanged {
        address: Address,
        previous: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    journal: usize,
    logs: usize,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Address whose storage the frame reads and writes.
    address: Address,
    /// Address whose code runs. Differs from `address` under delegate calls.
    code_address: Address,
    caller: Address,
    depth: usize,
}

/// The execution environment: code, storage, nonces and the event log.
#[derive(Default)]
pub struct Host {
    world: World,
    journal: Vec<JournalEntry>,
    logs: Vec<Log>,
    config: HostConfig,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HostConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Every event emitted by committed transactions.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub fn storage(&self) -> &Storage {
        &self.world.storage
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.world.code.contains_key(&address)
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.world.nonces.get(&address).copied().unwrap_or(0)
    }

    /// Deploys `code` from `from`, running its constructor with `args`.
    ///
    /// The address follows the CREATE rule over `from`'s nonce.
    pub fn deploy(
        &mut self,
        from: Address,
        code: Arc<dyn Contract>,
        args: &[u8],
    ) -> Result<Address, Revert> {
        let address = self.create(from, 1, code, args)?;
        self.journal.clear();
        Ok(address)
    }

    /// Executes a call from `from` to `to` atomically.
    pub fn transact(&mut self, from: Address, to: Address, input: &[u8]) -> Result<Receipt, Revert> {
        let first_log = self.logs.len();
        let output = self.execute(
            Frame {
                address: to,
                code_address: to,
                caller: from,
                depth: 1,
            },
            input,
        )?;
        self.journal.clear();

        Ok(Receipt {
            output,
            logs: self.logs[first_log..].to_vec(),
        })
    }

    /// Executes a call and discards all of its effects, keeping only the
    /// output.
    pub fn view(&mut self, from: Address, to: Address, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let checkpoint = self.checkpoint();
        let result = self.execute(
            Frame {
                address: to,
                code_address: to,
                caller: from,
                depth: 1,
            },
            input,
        );
        self.restore(checkpoint);
        result
    }

    fn execute(&mut self, frame: Frame, input: &[u8]) -> Result<Vec<u8>, Revert> {
        self.check_depth(frame.depth)?;

        let code = self
            .world
            .code
            .get(&frame.code_address)
            .cloned()
            .ok_or(Revert::NoCode(frame.code_address))?;

        trace!(
            caller = %frame.caller,
            address = %frame.address,
            code = %frame.code_address,
            depth = frame.depth,
            "call"
        );

        let checkpoint = self.checkpoint();
        let result = code.call(&mut CallContext { host: self, frame }, input);
        if let Err(err) = &result {
            debug!(address = %frame.address, depth = frame.depth, error = %err, "call reverted");
            self.restore(checkpoint);
        }
        result
    }

    fn create(
        &mut self,
        deployer: Address,
        depth: usize,
        code: Arc<dyn Contract>,
        args: &[u8],
    ) -> Result<Address, Revert> {
        self.check_depth(depth)?;

        let nonce = self.nonce(deployer);
        let address = contract_address(deployer, nonce);
        if self.has_code(address) {
            return Err(Revert::InvalidState(format!(
                "contract already deployed at {address}"
            )));
        }

        let checkpoint = self.checkpoint();
        self.set_nonce(deployer, nonce + 1);
        self.set_nonce(address, 1);
        self.world.code.insert(address, Arc::clone(&code));
        self.journal.push(JournalEntry::CodeDeployed(address));

        let frame = Frame {
            address,
            code_address: address,
            caller: deployer,
            depth,
        };
        if let Err(err) = code.construct(&mut CallContext { host: self, frame }, args) {
            debug!(%deployer, %address, error = %err, "constructor reverted");
            self.restore(checkpoint);
            return Err(err);
        }

        debug!(%deployer, %address, nonce, "deployed contract");
        Ok(address)
    }

    fn check_depth(&self, depth: usize) -> Result<(), Revert> {
        if depth > self.config.max_call_depth {
            return Err(Revert::CallDepthExceeded(self.config.max_call_depth));
        }
        Ok(())
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        let previous = self.world.nonces.insert(address, nonce);
        self.journal
            .push(JournalEntry::NonceChanged { address, previous });
    }

    fn sstore(&mut self, address: Address, key: StorageKey, value: B256) {
        let previous = self.world.storage.store(address, key.clone(), value);
        if previous != value {
            self.journal.push(JournalEntry::StorageChanged {
                address,
                key,
                previous,
            });
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            journal: self.journal.len(),
            logs: self.logs.len(),
        }
    }

    /// Undoes every change journaled since `checkpoint`, newest first.
    fn restore(&mut self, checkpoint: Checkpoint) {
        let undone = self.journal.split_off(checkpoint.journal);
        for entry in undone.into_iter().rev() {
            match entry {
                JournalEntry::StorageChanged {
                    address,
                    key,
                    previous,
                } => {
                    self.world.storage.store(address, key, previous);
                }
                JournalEntry::CodeDeployed(address) => {
                    self.world.code.remove(&address);
                }
                JournalEntry::NonceChanged { address, previous } => match previous {
                    Some(nonce) => {
                        self.world.nonces.insert(address, nonce);
                    }
                    None => {
                        self.world.nonces.remove(&address);
                    }
                },
            }
        }
        self.logs.truncate(checkpoint.logs);
    }
}

/// What a running contract can see and do.
pub struct CallContext<'h> {
    host: &'h mut Host,
    frame: Frame,
}

impl CallContext<'_> {
    /// The immediate caller. Preserved across delegate calls.
    pub fn caller(&self) -> Address {
        self.frame.caller
    }

    /// The address the frame executes as (whose storage it uses).
    pub fn address(&self) -> Address {
        self.frame.address
    }

    /// The address whose code is running.
    pub fn code_address(&self) -> Address {
        self.frame.code_address
    }

    pub fn depth(&self) -> usize {
        self.frame.depth
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.host.has_code(address)
    }

    pub fn load(&self, key: &StorageKey) -> B256 {
        self.host.world.storage.load(self.frame.address, key)
    }

    pub fn store(&mut self, key: StorageKey, value: B256) {
        self.host.sstore(self.frame.address, key, value);
    }

    pub fn load_address(&self, key: &StorageKey) -> Address {
        self.host.world.storage.load_address(self.frame.address, key)
    }

    pub fn store_address(&mut self, key: StorageKey, value: Address) {
        self.store(key, value.into_word());
    }

    pub fn load_bool(&self, key: &StorageKey) -> bool {
        self.host.world.storage.load_bool(self.frame.address, key)
    }

    pub fn store_bool(&mut self, key: StorageKey, value: bool) {
        let word = if value {
            B256::with_last_byte(1)
        } else {
            B256::ZERO
        };
        self.store(key, word);
    }

    /// Calls `to` as this contract.
    pub fn call(&mut self, to: Address, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let frame = Frame {
            address: to,
            code_address: to,
            caller: self.frame.address,
            depth: self.frame.depth + 1,
        };
        self.host.execute(frame, input)
    }

    /// Runs the code at `code_address` against this contract's storage, with
    /// this frame's caller.
    pub fn delegate_call(&mut self, code_address: Address, input: &[u8]) -> Result<Vec<u8>, Revert> {
        let frame = Frame {
            address: self.frame.address,
            code_address,
            caller: self.frame.caller,
            depth: self.frame.depth + 1,
        };
        self.host.execute(frame, input)
    }

    /// Deploys `code` with this contract as the deployer.
    pub fn create(&mut self, code: Arc<dyn Contract>, args: &[u8]) -> Result<Address, Revert> {
        self.host
            .create(self.frame.address, self.frame.depth + 1, code, args)
    }

    /// Appends an event attributed to this contract.
    pub fn emit(&mut self, topics: Vec<B256>, data: Vec<u8>) {
        self.host.logs.push(Log {
            address: self.frame.address,
            topics,
            data: data.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{self, AbiValue, Decoder};
    use crate::log::event_topic;

    const COUNTER: &str = "counter";

    fn count_key() -> StorageKey {
        StorageKey::new(COUNTER, "count")
    }

    /// Increments a counter, optionally failing afterwards, and can forward
    /// calls to another contract.
    struct Counter;

    impl Contract for Counter {
        fn construct(&self, ctx: &mut CallContext<'_>, args: &[u8]) -> Result<(), Revert> {
            if args == b"fail" {
                return Err(Revert::InvalidArgument("constructor asked to fail".into()));
            }
            ctx.store(count_key(), B256::with_last_byte(10));
            Ok(())
        }

        fn call(&self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Vec<u8>, Revert> {
            let (selector, args) = abi::split_selector(input)?;
            let mut args = Decoder::new(args);

            if selector == abi::selector("bump(bool)") {
                let fail = args.bool()?;
                let next = ctx.load(&count_key()).0[31] + 1;
                ctx.store(count_key(), B256::with_last_byte(next));
                ctx.emit(vec![event_topic("Bumped()")], vec![]);
                if fail {
                    return Err(Revert::InvalidState("bump asked to fail".into()));
                }
                Ok(Vec::new())
            } else if selector == abi::selector("count()") {
                Ok(ctx.load(&count_key()).to_vec())
            } else if selector == abi::selector("forward(address,bytes)") {
                let to = args.address()?;
                let data = args.bytes()?;
                ctx.call(to, &data)
            } else if selector == abi::selector("whoami()") {
                Ok(abi::encode(&[
                    AbiValue::Address(ctx.caller()),
                    AbiValue::Address(ctx.address()),
                ]))
            } else if selector == abi::selector("recurse()") {
                let me = ctx.address();
                ctx.call(me, input)
            } else {
                Err(Revert::UnknownSelector(selector))
            }
        }
    }

    fn bump(fail: bool) -> Vec<u8> {
        abi::encode_function_call(abi::selector("bump(bool)"), &[AbiValue::Bool(fail)])
    }

    fn count(host: &mut Host, at: Address) -> u8 {
        host.view(Address::ZERO, at, &abi::selector("count()")).unwrap()[31]
    }

    fn sender() -> Address {
        Address::repeat_byte(0x11)
    }

    #[test]
    fn deploy_runs_constructor_and_advances_nonce() {
        let mut host = Host::new();

        let first = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();
        let second = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();

        assert_eq!(first, contract_address(sender(), 0));
        assert_eq!(second, contract_address(sender(), 1));
        assert_eq!(host.nonce(sender()), 2);
        assert_eq!(count(&mut host, first), 10);
    }

    #[test]
    fn failed_constructor_leaves_no_trace() {
        let mut host = Host::new();

        let err = host.deploy(sender(), Arc::new(Counter), b"fail").unwrap_err();

        assert!(matches!(err, Revert::InvalidArgument(_)));
        assert_eq!(host.nonce(sender()), 0);
        assert!(!host.has_code(contract_address(sender(), 0)));
    }

    #[test]
    fn transact_commits_state_and_logs() {
        let mut host = Host::new();
        let counter = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();

        let receipt = host.transact(sender(), counter, &bump(false)).unwrap();

        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].address, counter);
        assert_eq!(host.logs().len(), 1);
        assert_eq!(count(&mut host, counter), 11);
    }

    #[test]
    fn reverted_transaction_discards_state_and_logs() {
        let mut host = Host::new();
        let counter = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();

        let err = host.transact(sender(), counter, &bump(true)).unwrap_err();

        assert!(matches!(err, Revert::InvalidState(_)));
        assert!(host.logs().is_empty());
        assert_eq!(count(&mut host, counter), 10);
    }

    #[test]
    fn nested_revert_propagates_and_rolls_back_outer_frame() {
        let mut host = Host::new();
        let outer = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();
        let inner = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();

        let forward = abi::encode_function_call(
            abi::selector("forward(address,bytes)"),
            &[AbiValue::Address(inner), AbiValue::Bytes(bump(true))],
        );
        assert!(host.transact(sender(), outer, &forward).is_err());
        assert_eq!(count(&mut host, inner), 10);
    }

    #[test]
    fn restore_unwinds_overwrites_deletes_and_deployments() {
        let mut host = Host::new();
        let counter = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();
        let extra = StorageKey::new(COUNTER, "extra");
        host.sstore(counter, extra.clone(), B256::with_last_byte(5));
        host.journal.clear();

        let checkpoint = host.checkpoint();
        host.sstore(counter, count_key(), B256::with_last_byte(99));
        host.sstore(counter, extra.clone(), B256::ZERO);
        let nested = host.create(counter, 2, Arc::new(Counter), &[]).unwrap();
        assert!(host.has_code(nested));
        host.restore(checkpoint);

        assert!(host.journal.is_empty());
        assert!(!host.has_code(nested));
        assert_eq!(host.nonce(counter), 1);
        assert_eq!(host.storage().load(counter, &extra), B256::with_last_byte(5));
        assert_eq!(count(&mut host, counter), 10);
    }

    #[test]
    fn journal_is_cleared_after_each_transaction() {
        let mut host = Host::new();
        let counter = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();
        assert!(host.journal.is_empty());

        host.transact(sender(), counter, &bump(false)).unwrap();
        assert!(host.journal.is_empty());

        host.transact(sender(), counter, &bump(true)).unwrap_err();
        host.view(sender(), counter, &bump(false)).unwrap();
        assert!(host.journal.is_empty());
    }

    #[test]
    fn view_discards_effects() {
        let mut host = Host::new();
        let counter = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();

        host.view(sender(), counter, &bump(false)).unwrap();

        assert!(host.logs().is_empty());
        assert_eq!(count(&mut host, counter), 10);
    }

    #[test]
    fn call_sets_caller_to_calling_contract() {
        let mut host = Host::new();
        let outer = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();
        let inner = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();

        let forward = abi::encode_function_call(
            abi::selector("forward(address,bytes)"),
            &[
                AbiValue::Address(inner),
                AbiValue::Bytes(abi::selector("whoami()").to_vec()),
            ],
        );
        let output = host.view(sender(), outer, &forward).unwrap();

        let mut decoder = Decoder::new(&output);
        assert_eq!(decoder.address().unwrap(), outer);
        assert_eq!(decoder.address().unwrap(), inner);
    }

    #[test]
    fn call_to_address_without_code_reverts() {
        let mut host = Host::new();
        let err = host
            .transact(sender(), Address::repeat_byte(0x42), &bump(false))
            .unwrap_err();
        assert_eq!(err, Revert::NoCode(Address::repeat_byte(0x42)));
    }

    #[test]
    fn unbounded_recursion_hits_depth_limit() {
        let mut host = Host::with_config(HostConfig { max_call_depth: 16 });
        let counter = host.deploy(sender(), Arc::new(Counter), &[]).unwrap();

        let err = host
            .transact(sender(), counter, &abi::selector("recurse()"))
            .unwrap_err();
        assert_eq!(err, Revert::CallDepthExceeded(16));
    }

    #[test]
    fn host_config_defaults_when_fields_are_missing() {
        let config: HostConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);

        let config: HostConfig = serde_json::from_str(r#"{"max_call_depth": 8}"#).unwrap();
        assert_eq!(config.max_call_depth, 8);
    }
}
