//! Test doubles shared across unit and integration tests. Gated behind `cfg(test)` / the
//! `test-utils` feature so production builds never link them.

use crate::chain::{AccountState, ChainConfig, ChainHeadEvent, ChainView, Header};
use alloy_primitives::{Address, B256, U256};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;

/// An in-memory [`ChainView`] whose account projections and header are set directly by the test,
/// rather than derived from any real execution.
pub struct MockChainView {
    accounts: Mutex<FxHashMap<Address, AccountState>>,
    header: Mutex<Header>,
    config: ChainConfig,
    sender: broadcast::Sender<ChainHeadEvent>,
}

impl MockChainView {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            accounts: Mutex::new(FxHashMap::default()),
            header: Mutex::new(Header::zero()),
            config: ChainConfig {
                chain_id: 1,
                london_activation_height: Some(0),
                evm_denom: "wei".to_string(),
                max_gas: None,
            },
            sender,
        }
    }

    /// Convenience constructor for the common case of a single funded account.
    pub fn with_account(addr: Address, balance: U256, nonce: u64) -> Self {
        let view = Self::new();
        view.set_account(addr, balance, nonce);
        view
    }

    pub fn set_account(&self, addr: Address, balance: U256, nonce: u64) {
        self.accounts.lock().insert(addr, AccountState { balance, nonce, has_code: false });
    }

    pub fn advance_block(&self, base_fee: Option<u64>) {
        let mut header = self.header.lock();
        header.number += 1;
        header.base_fee = base_fee;
        header.parent_hash = B256::repeat_byte(header.number as u8);
    }
}

impl Default for MockChainView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainView for MockChainView {
    fn current_header(&self) -> Header {
        self.header.lock().clone()
    }

    fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn get_block(&self, _hash: B256, number: u64) -> Header {
        if number > 1 {
            panic!("get_block called for height {number} under an instant-finality chain");
        }
        Header::zero()
    }

    fn state_at(&self, root: B256, address: Address) -> Result<AccountState, String> {
        if root == B256::ZERO {
            return Ok(self.accounts.lock().get(&address).copied().unwrap_or_default());
        }
        Ok(self.accounts.lock().get(&address).copied().unwrap_or_default())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChainHeadEvent> {
        self.sender.subscribe()
    }

    fn notify_new_block(&self) {
        let header = self.current_header();
        let _ = self.sender.send(ChainHeadEvent { header });
    }
}
