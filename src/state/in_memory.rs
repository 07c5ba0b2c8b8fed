//! In-memory world state with journaled snapshots.
//!
//! Mutations append inverse operations to a write-ahead journal while any
//! snapshot is live; `revert_to_snapshot` replays the journal suffix in
//! reverse, `commit_snapshot` just forgets the marker. The state root is a
//! flat keccak commitment over the sorted account and storage contents —
//! real trie hashing belongs to the embedding node, not the core.

use super::{SnapshotId, VmState};
use crate::{
    account::{code_hash, Account},
    constants::EMPTY_CODE_HASH,
    errors::DatabaseError,
};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use keccak_hash::keccak;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Inverse operation recorded before each mutation.
#[derive(Debug, Clone)]
enum JournalEntry {
    /// Account (and, for deletions, its whole storage) before the change.
    Account {
        address: Address,
        previous: Option<Account>,
    },
    AccountDestroyed {
        address: Address,
        previous: Option<Account>,
        storage: BTreeMap<U256, U256>,
    },
    Storage {
        address: Address,
        key: U256,
        previous: U256,
    },
    CodeStored {
        code_hash: H256,
        was_present: bool,
    },
    Transient {
        address: Address,
        key: U256,
        previous: U256,
    },
}

/// Buffered writes of an open batch. Reads see the overlay.
#[derive(Debug, Default)]
struct BatchOverlay {
    accounts: FxHashMap<Address, Option<Account>>,
    storage: FxHashMap<(Address, U256), U256>,
    code: FxHashMap<H256, Bytes>,
    transient: FxHashMap<(Address, U256), U256>,
}

#[derive(Debug, Default)]
pub struct InMemoryState {
    accounts: BTreeMap<Address, Account>,
    storage: BTreeMap<Address, BTreeMap<U256, U256>>,
    code: FxHashMap<H256, Bytes>,
    transient: FxHashMap<(Address, U256), U256>,

    journal: Vec<JournalEntry>,
    /// Live snapshots as (id, journal length at creation), innermost last.
    snapshots: Vec<(SnapshotId, usize)>,
    next_snapshot_id: u64,

    batch: Option<BatchOverlay>,
}

impl InMemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/setup convenience: seeds an account without journaling.
    pub fn seed_account(&mut self, address: Address, account: Account) {
        self.accounts.insert(address, account);
    }

    /// Test/setup convenience: seeds code and returns its hash.
    pub fn seed_code(&mut self, code: Bytes) -> H256 {
        let hash = code_hash(&code);
        if hash != EMPTY_CODE_HASH {
            self.code.insert(hash, code);
        }
        hash
    }

    fn journaling(&self) -> bool {
        !self.snapshots.is_empty()
    }

    fn apply_set_account(&mut self, address: Address, account: Account) {
        if self.journaling() {
            self.journal.push(JournalEntry::Account {
                address,
                previous: self.accounts.get(&address).cloned(),
            });
        }
        self.accounts.insert(address, account);
    }

    fn apply_delete_account(&mut self, address: Address) {
        let previous = self.accounts.remove(&address);
        let storage = self.storage.remove(&address).unwrap_or_default();
        if self.journaling() {
            self.journal.push(JournalEntry::AccountDestroyed {
                address,
                previous,
                storage,
            });
        }
        self.transient.retain(|(a, _), _| *a != address);
    }

    fn apply_set_storage(&mut self, address: Address, key: U256, value: U256) {
        let previous = self
            .storage
            .get(&address)
            .and_then(|slots| slots.get(&key))
            .copied()
            .unwrap_or_default();
        if self.journaling() {
            self.journal.push(JournalEntry::Storage {
                address,
                key,
                previous,
            });
        }
        let slots = self.storage.entry(address).or_default();
        if value.is_zero() {
            slots.remove(&key);
        } else {
            slots.insert(key, value);
        }
    }

    fn apply_set_code(&mut self, code: Bytes) -> H256 {
        let hash = code_hash(&code);
        if hash == EMPTY_CODE_HASH {
            return hash;
        }
        let was_present = self.code.contains_key(&hash);
        if !was_present {
            self.code.insert(hash, code);
        }
        if self.journaling() {
            self.journal.push(JournalEntry::CodeStored {
                code_hash: hash,
                was_present,
            });
        }
        hash
    }

    fn apply_set_transient(&mut self, address: Address, key: U256, value: U256) {
        let previous = self
            .transient
            .get(&(address, key))
            .copied()
            .unwrap_or_default();
        if self.journaling() {
            self.journal.push(JournalEntry::Transient {
                address,
                key,
                previous,
            });
        }
        if value.is_zero() {
            self.transient.remove(&(address, key));
        } else {
            self.transient.insert((address, key), value);
        }
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::Account { address, previous } => match previous {
                Some(account) => {
                    self.accounts.insert(address, account);
                }
                None => {
                    self.accounts.remove(&address);
                }
            },
            JournalEntry::AccountDestroyed {
                address,
                previous,
                storage,
            } => {
                match previous {
                    Some(account) => {
                        self.accounts.insert(address, account);
                    }
                    None => {
                        self.accounts.remove(&address);
                    }
                }
                if !storage.is_empty() {
                    self.storage.insert(address, storage);
                }
            }
            JournalEntry::Storage {
                address,
                key,
                previous,
            } => {
                let slots = self.storage.entry(address).or_default();
                if previous.is_zero() {
                    slots.remove(&key);
                } else {
                    slots.insert(key, previous);
                }
            }
            JournalEntry::CodeStored {
                code_hash,
                was_present,
            } => {
                if !was_present {
                    self.code.remove(&code_hash);
                }
            }
            JournalEntry::Transient {
                address,
                key,
                previous,
            } => {
                if previous.is_zero() {
                    self.transient.remove(&(address, key));
                } else {
                    self.transient.insert((address, key), previous);
                }
            }
        }
    }

    /// Flat keccak commitment over one account's sorted storage.
    fn storage_commitment(slots: &BTreeMap<U256, U256>) -> H256 {
        if slots.is_empty() {
            return crate::constants::EMPTY_TRIE_HASH;
        }
        let mut buffer = Vec::with_capacity(slots.len() * 64);
        for (key, value) in slots {
            buffer.extend_from_slice(&key.to_big_endian());
            buffer.extend_from_slice(&value.to_big_endian());
        }
        keccak(&buffer)
    }
}

impl VmState for InMemoryState {
    fn account_exists(&self, address: Address) -> Result<bool, DatabaseError> {
        if let Some(overlay) = &self.batch {
            if let Some(staged) = overlay.accounts.get(&address) {
                return Ok(staged.is_some());
            }
        }
        Ok(self.accounts.contains_key(&address))
    }

    fn get_account(&self, address: Address) -> Result<Option<Account>, DatabaseError> {
        if let Some(overlay) = &self.batch {
            if let Some(staged) = overlay.accounts.get(&address) {
                return Ok(staged.clone());
            }
        }
        Ok(self.accounts.get(&address).cloned())
    }

    fn set_account(&mut self, address: Address, account: Account) -> Result<(), DatabaseError> {
        if let Some(overlay) = &mut self.batch {
            overlay.accounts.insert(address, Some(account));
        } else {
            self.apply_set_account(address, account);
        }
        Ok(())
    }

    fn delete_account(&mut self, address: Address) -> Result<(), DatabaseError> {
        if let Some(overlay) = &mut self.batch {
            overlay.accounts.insert(address, None);
        } else {
            self.apply_delete_account(address);
        }
        Ok(())
    }

    fn get_storage(&self, address: Address, key: U256) -> Result<U256, DatabaseError> {
        if let Some(overlay) = &self.batch {
            if let Some(value) = overlay.storage.get(&(address, key)) {
                return Ok(*value);
            }
        }
        Ok(self
            .storage
            .get(&address)
            .and_then(|slots| slots.get(&key))
            .copied()
            .unwrap_or_default())
    }

    fn set_storage(
        &mut self,
        address: Address,
        key: U256,
        value: U256,
    ) -> Result<(), DatabaseError> {
        if let Some(overlay) = &mut self.batch {
            overlay.storage.insert((address, key), value);
        } else {
            self.apply_set_storage(address, key, value);
        }
        Ok(())
    }

    fn get_code(&self, hash: H256) -> Result<Bytes, DatabaseError> {
        if hash == EMPTY_CODE_HASH {
            return Ok(Bytes::new());
        }
        if let Some(overlay) = &self.batch {
            if let Some(code) = overlay.code.get(&hash) {
                return Ok(code.clone());
            }
        }
        self.code.get(&hash).cloned().ok_or(DatabaseError::NotFound)
    }

    fn set_code(&mut self, code: Bytes) -> Result<H256, DatabaseError> {
        if let Some(overlay) = &mut self.batch {
            let hash = code_hash(&code);
            if hash != EMPTY_CODE_HASH {
                overlay.code.insert(hash, code);
            }
            Ok(hash)
        } else {
            Ok(self.apply_set_code(code))
        }
    }

    fn get_transient(&self, address: Address, key: U256) -> Result<U256, DatabaseError> {
        if let Some(overlay) = &self.batch {
            if let Some(value) = overlay.transient.get(&(address, key)) {
                return Ok(*value);
            }
        }
        Ok(self
            .transient
            .get(&(address, key))
            .copied()
            .unwrap_or_default())
    }

    fn set_transient(
        &mut self,
        address: Address,
        key: U256,
        value: U256,
    ) -> Result<(), DatabaseError> {
        if let Some(overlay) = &mut self.batch {
            overlay.transient.insert((address, key), value);
        } else {
            self.apply_set_transient(address, key, value);
        }
        Ok(())
    }

    fn create_snapshot(&mut self) -> Result<SnapshotId, DatabaseError> {
        let id = SnapshotId(self.next_snapshot_id);
        self.next_snapshot_id += 1;
        self.snapshots.push((id, self.journal.len()));
        Ok(id)
    }

    fn commit_snapshot(&mut self, id: SnapshotId) -> Result<(), DatabaseError> {
        let position = self
            .snapshots
            .iter()
            .position(|(snapshot, _)| *snapshot == id)
            .ok_or(DatabaseError::NotFound)?;
        // The journal segment stays so an outer snapshot can still revert
        // over it; only the marker goes away.
        self.snapshots.remove(position);
        if self.snapshots.is_empty() {
            self.journal.clear();
        }
        Ok(())
    }

    fn revert_to_snapshot(&mut self, id: SnapshotId) -> Result<(), DatabaseError> {
        let position = self
            .snapshots
            .iter()
            .position(|(snapshot, _)| *snapshot == id)
            .ok_or(DatabaseError::NotFound)?;
        let (_, journal_len) = self.snapshots[position];
        // Snapshots taken after this one become invalid too.
        self.snapshots.truncate(position);
        while self.journal.len() > journal_len {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
        Ok(())
    }

    fn begin_batch(&mut self) -> Result<(), DatabaseError> {
        if self.batch.is_some() {
            return Err(DatabaseError::ResourceError(
                "batch already open".to_string(),
            ));
        }
        self.batch = Some(BatchOverlay::default());
        Ok(())
    }

    fn commit_batch(&mut self) -> Result<(), DatabaseError> {
        let overlay = self.batch.take().ok_or_else(|| {
            DatabaseError::ResourceError("no open batch to commit".to_string())
        })?;
        for (address, staged) in overlay.accounts {
            match staged {
                Some(account) => self.apply_set_account(address, account),
                None => self.apply_delete_account(address),
            }
        }
        for ((address, key), value) in overlay.storage {
            self.apply_set_storage(address, key, value);
        }
        for (_, code) in overlay.code {
            self.apply_set_code(code);
        }
        for ((address, key), value) in overlay.transient {
            self.apply_set_transient(address, key, value);
        }
        Ok(())
    }

    fn rollback_batch(&mut self) -> Result<(), DatabaseError> {
        self.batch
            .take()
            .map(|_| ())
            .ok_or_else(|| DatabaseError::ResourceError("no open batch to roll back".to_string()))
    }

    fn get_state_root(&self) -> Result<H256, DatabaseError> {
        let empty_storage = BTreeMap::new();
        let mut buffer = Vec::with_capacity(self.accounts.len() * 136);
        for (address, account) in &self.accounts {
            let slots = self.storage.get(address).unwrap_or(&empty_storage);
            buffer.extend_from_slice(address.as_bytes());
            buffer.extend_from_slice(&account.balance.to_big_endian());
            buffer.extend_from_slice(&account.nonce.to_be_bytes());
            buffer.extend_from_slice(account.code_hash.as_bytes());
            buffer.extend_from_slice(Self::storage_commitment(slots).as_bytes());
        }
        Ok(keccak(&buffer))
    }

    fn commit_changes(&mut self) -> Result<H256, DatabaseError> {
        self.journal.clear();
        self.snapshots.clear();
        self.transient.clear();
        self.get_state_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn revert_restores_accounts_and_storage() {
        let mut state = InMemoryState::new();
        state.seed_account(address(1), Account::with_balance(U256::from(100)));
        state.set_storage(address(1), U256::zero(), U256::from(7)).unwrap();
        let root_before = state.get_state_root().unwrap();

        let snapshot = state.create_snapshot().unwrap();
        state
            .set_account(address(1), Account::with_balance(U256::from(5)))
            .unwrap();
        state.set_storage(address(1), U256::zero(), U256::from(9)).unwrap();
        state
            .set_account(address(2), Account::with_balance(U256::one()))
            .unwrap();
        assert_ne!(state.get_state_root().unwrap(), root_before);

        state.revert_to_snapshot(snapshot).unwrap();
        assert_eq!(state.get_state_root().unwrap(), root_before);
        assert_eq!(
            state.get_storage(address(1), U256::zero()).unwrap(),
            U256::from(7)
        );
        assert!(state.get_account(address(2)).unwrap().is_none());
    }

    #[test]
    fn revert_invalidates_inner_snapshots() {
        let mut state = InMemoryState::new();
        let outer = state.create_snapshot().unwrap();
        let inner = state.create_snapshot().unwrap();
        state.revert_to_snapshot(outer).unwrap();
        assert_eq!(
            state.revert_to_snapshot(inner),
            Err(DatabaseError::NotFound)
        );
        assert_eq!(state.revert_to_snapshot(outer), Err(DatabaseError::NotFound));
    }

    #[test]
    fn commit_keeps_changes_revertible_by_outer_snapshot() {
        let mut state = InMemoryState::new();
        let root_before = state.get_state_root().unwrap();

        let outer = state.create_snapshot().unwrap();
        let inner = state.create_snapshot().unwrap();
        state
            .set_account(address(9), Account::with_balance(U256::from(3)))
            .unwrap();
        state.commit_snapshot(inner).unwrap();
        assert!(state.get_account(address(9)).unwrap().is_some());

        state.revert_to_snapshot(outer).unwrap();
        assert_eq!(state.get_state_root().unwrap(), root_before);
    }

    #[test]
    fn delete_account_reverts_with_storage() {
        let mut state = InMemoryState::new();
        state.seed_account(address(5), Account::with_balance(U256::from(10)));
        state.set_storage(address(5), U256::one(), U256::from(2)).unwrap();

        let snapshot = state.create_snapshot().unwrap();
        state.delete_account(address(5)).unwrap();
        assert!(!state.account_exists(address(5)).unwrap());

        state.revert_to_snapshot(snapshot).unwrap();
        assert!(state.account_exists(address(5)).unwrap());
        assert_eq!(
            state.get_storage(address(5), U256::one()).unwrap(),
            U256::from(2)
        );
    }

    #[test]
    fn code_is_content_addressed() {
        let mut state = InMemoryState::new();
        let code = Bytes::from_static(&[0x60, 0x01]);
        let hash = state.set_code(code.clone()).unwrap();
        assert_eq!(state.get_code(hash).unwrap(), code);
        assert_eq!(state.get_code(EMPTY_CODE_HASH).unwrap(), Bytes::new());
        assert_eq!(state.get_code(H256::repeat_byte(0xaa)), Err(DatabaseError::NotFound));
    }

    #[test]
    fn transient_storage_journals_and_clears() {
        let mut state = InMemoryState::new();
        let snapshot = state.create_snapshot().unwrap();
        state
            .set_transient(address(1), U256::zero(), U256::from(42))
            .unwrap();
        state.revert_to_snapshot(snapshot).unwrap();
        assert_eq!(
            state.get_transient(address(1), U256::zero()).unwrap(),
            U256::zero()
        );

        state
            .set_transient(address(1), U256::zero(), U256::from(42))
            .unwrap();
        state.commit_changes().unwrap();
        assert_eq!(
            state.get_transient(address(1), U256::zero()).unwrap(),
            U256::zero()
        );
    }

    #[test]
    fn batch_stages_until_commit() {
        let mut state = InMemoryState::new();
        state.begin_batch().unwrap();
        state
            .set_account(address(1), Account::with_balance(U256::from(50)))
            .unwrap();
        // reads see the overlay
        assert!(state.account_exists(address(1)).unwrap());
        state.commit_batch().unwrap();
        assert!(state.account_exists(address(1)).unwrap());
    }

    #[test]
    fn batch_rollback_discards_writes() {
        let mut state = InMemoryState::new();
        state.begin_batch().unwrap();
        state
            .set_account(address(1), Account::with_balance(U256::from(50)))
            .unwrap();
        state.rollback_batch().unwrap();
        assert!(!state.account_exists(address(1)).unwrap());
    }

    #[test]
    fn batch_misuse_is_a_resource_error() {
        let mut state = InMemoryState::new();
        assert!(matches!(
            state.commit_batch(),
            Err(DatabaseError::ResourceError(_))
        ));
        assert!(matches!(
            state.rollback_batch(),
            Err(DatabaseError::ResourceError(_))
        ));
        state.begin_batch().unwrap();
        assert!(matches!(
            state.begin_batch(),
            Err(DatabaseError::ResourceError(_))
        ));
    }
}
