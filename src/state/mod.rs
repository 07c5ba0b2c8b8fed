//! The world-state interface consumed by the interpreter, plus the
//! in-memory reference implementation.
//!
//! Snapshots are the executor's per-call revert mechanism; batches are an
//! orthogonal, caller-facing staging area. The interpreter never drives
//! batches.

use crate::{account::Account, errors::DatabaseError};
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

mod in_memory;

pub use in_memory::InMemoryState;

/// Opaque name of a point-in-time of the state. Invalidated by the commit
/// or revert that consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(pub(crate) u64);

/// World-state database as seen by the execution core.
///
/// Every operation is fallible: implementations backed by real storage can
/// surface IO failures as [`DatabaseError`], which abort the transaction as
/// `ExecutionFailed` rather than reverting it.
pub trait VmState {
    fn account_exists(&self, address: Address) -> Result<bool, DatabaseError>;
    fn get_account(&self, address: Address) -> Result<Option<Account>, DatabaseError>;
    fn set_account(&mut self, address: Address, account: Account) -> Result<(), DatabaseError>;
    fn delete_account(&mut self, address: Address) -> Result<(), DatabaseError>;

    /// Reads a storage slot; absent slots are zero.
    fn get_storage(&self, address: Address, key: U256) -> Result<U256, DatabaseError>;
    fn set_storage(&mut self, address: Address, key: U256, value: U256)
        -> Result<(), DatabaseError>;

    /// Fetches a code blob by hash; the empty hash yields the empty slice.
    fn get_code(&self, code_hash: H256) -> Result<Bytes, DatabaseError>;
    /// Registers a code blob content-addressed and returns its hash.
    fn set_code(&mut self, code: Bytes) -> Result<H256, DatabaseError>;

    /// [EIP-1153] transient storage; cleared by `commit_changes`.
    fn get_transient(&self, address: Address, key: U256) -> Result<U256, DatabaseError>;
    fn set_transient(
        &mut self,
        address: Address,
        key: U256,
        value: U256,
    ) -> Result<(), DatabaseError>;

    fn create_snapshot(&mut self) -> Result<SnapshotId, DatabaseError>;
    /// Folds the snapshot into its parent. Fails with `NotFound` on an
    /// unknown or already-consumed id.
    fn commit_snapshot(&mut self, id: SnapshotId) -> Result<(), DatabaseError>;
    /// Undoes every mutation made after the snapshot and invalidates it
    /// (and any snapshot taken after it). Fails with `NotFound` on an
    /// unknown id.
    fn revert_to_snapshot(&mut self, id: SnapshotId) -> Result<(), DatabaseError>;

    /// Opens a staging area; subsequent writes are buffered until
    /// `commit_batch` applies them atomically or `rollback_batch` drops
    /// them. Fails with `ResourceError` when misused (nested begin, commit
    /// or rollback without an open batch).
    fn begin_batch(&mut self) -> Result<(), DatabaseError>;
    fn commit_batch(&mut self) -> Result<(), DatabaseError>;
    fn rollback_batch(&mut self) -> Result<(), DatabaseError>;

    /// Commitment to the current state.
    fn get_state_root(&self) -> Result<H256, DatabaseError>;
    /// Finalizes the pending mutations (drops journal history, clears
    /// transient storage) and returns the resulting root.
    fn commit_changes(&mut self) -> Result<H256, DatabaseError>;
}
