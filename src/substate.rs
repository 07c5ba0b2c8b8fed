//! Accrued transaction substate: the EIP-2929 access sets, emitted logs,
//! selfdestruct marks, accounts created this transaction, and the refund
//! counter.
//!
//! Each sub-call pushes a backup of the whole substate; a reverting frame
//! restores it, which also un-warms the addresses and slots the child
//! touched and drops its logs, as snapshot semantics require.

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

/// Warm/cold sets of [EIP-2929], scoped to one transaction.
#[derive(Debug, Clone, Default)]
pub struct AccessList {
    addresses: FxHashSet<Address>,
    slots: FxHashMap<Address, FxHashSet<U256>>,
}

impl AccessList {
    /// Marks the address warm. Returns whether it was cold before.
    pub fn mark_address_warm(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    /// Marks the (address, key) slot warm. Returns whether it was cold.
    pub fn mark_slot_warm(&mut self, address: Address, key: U256) -> bool {
        self.slots.entry(address).or_default().insert(key)
    }

    pub fn is_address_warm(&self, address: Address) -> bool {
        self.addresses.contains(&address)
    }

    pub fn is_slot_warm(&self, address: Address, key: U256) -> bool {
        self.slots
            .get(&address)
            .is_some_and(|keys| keys.contains(&key))
    }

    pub fn reset(&mut self) {
        self.addresses.clear();
        self.slots.clear();
    }
}

/// A single emitted log: address, up to four topics, opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

/// Information accrued while a transaction executes.
#[derive(Debug, Clone, Default)]
pub struct Substate {
    pub access_list: AccessList,
    pub logs: Vec<LogEntry>,
    pub selfdestruct_set: FxHashSet<Address>,
    pub created_accounts: FxHashSet<Address>,
    pub refunded_gas: u64,
}

impl Substate {
    /// Clears everything for a fresh transaction.
    pub fn reset(&mut self) {
        self.access_list.reset();
        self.logs.clear();
        self.selfdestruct_set.clear();
        self.created_accounts.clear();
        self.refunded_gas = 0;
    }

    pub fn add_log(&mut self, log: LogEntry) {
        self.logs.push(log);
    }

    pub fn add_selfdestruct(&mut self, address: Address) {
        self.selfdestruct_set.insert(address);
    }

    pub fn add_created_account(&mut self, address: Address) {
        self.created_accounts.insert(address);
    }

    pub fn is_account_created(&self, address: Address) -> bool {
        self.created_accounts.contains(&address)
    }

    pub fn add_refund(&mut self, amount: u64) {
        self.refunded_gas = self.refunded_gas.saturating_add(amount);
    }

    pub fn remove_refund(&mut self, amount: u64) {
        self.refunded_gas = self.refunded_gas.saturating_sub(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_touch_is_cold_second_is_warm() {
        let mut list = AccessList::default();
        let address = Address::from_low_u64_be(1);
        assert!(list.mark_address_warm(address));
        assert!(!list.mark_address_warm(address));
        assert!(list.mark_slot_warm(address, U256::zero()));
        assert!(!list.mark_slot_warm(address, U256::zero()));
        assert!(list.mark_slot_warm(address, U256::one()));
    }

    #[test]
    fn reset_clears_warmth() {
        let mut list = AccessList::default();
        let address = Address::from_low_u64_be(2);
        list.mark_address_warm(address);
        list.mark_slot_warm(address, U256::zero());
        list.reset();
        assert!(!list.is_address_warm(address));
        assert!(!list.is_slot_warm(address, U256::zero()));
    }

    #[test]
    fn backup_restores_warmth_and_logs() {
        let mut substate = Substate::default();
        let address = Address::from_low_u64_be(3);
        substate.access_list.mark_address_warm(address);

        let backup = substate.clone();
        substate.access_list.mark_address_warm(Address::from_low_u64_be(4));
        substate.add_log(LogEntry {
            address,
            topics: vec![],
            data: Bytes::new(),
        });
        substate.add_refund(100);

        substate = backup;
        assert!(substate.access_list.is_address_warm(address));
        assert!(!substate.access_list.is_address_warm(Address::from_low_u64_be(4)));
        assert!(substate.logs.is_empty());
        assert_eq!(substate.refunded_gas, 0);
    }
}
