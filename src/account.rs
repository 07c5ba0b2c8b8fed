use crate::constants::{EMPTY_CODE_HASH, EMPTY_TRIE_HASH};
use bytes::Bytes;
use ethereum_types::{H256, U256};
use keccak_hash::keccak;
use serde::{Deserialize, Serialize};

/// On-chain account record. Code lives content-addressed in the state
/// backend; only its hash is carried here. `storage_root` is opaque to the
/// core (trie hashing is an external concern) and kept for interface
/// fidelity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code_hash: H256,
    pub storage_root: H256,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: U256::zero(),
            nonce: 0,
            code_hash: EMPTY_CODE_HASH,
            storage_root: EMPTY_TRIE_HASH,
        }
    }
}

impl Account {
    pub fn new(balance: U256, nonce: u64, code_hash: H256) -> Self {
        Self {
            balance,
            nonce,
            code_hash,
            storage_root: EMPTY_TRIE_HASH,
        }
    }

    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    pub fn has_code(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH
    }

    pub fn has_nonce(&self) -> bool {
        self.nonce != 0
    }

    /// [EIP-161] emptiness: zero balance, zero nonce, no code.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && !self.has_code()
    }

    /// A create targeting this account would collide.
    pub fn create_would_collide(&self) -> bool {
        self.has_code() || self.has_nonce()
    }
}

pub fn code_hash(code: &Bytes) -> H256 {
    if code.is_empty() {
        EMPTY_CODE_HASH
    } else {
        keccak(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_account_is_empty() {
        assert!(Account::default().is_empty());
    }

    #[test]
    fn empty_code_hashes_to_the_fixed_constant() {
        assert_eq!(code_hash(&Bytes::new()), EMPTY_CODE_HASH);
        assert_eq!(keccak([]), EMPTY_CODE_HASH);
    }

    #[test]
    fn balance_makes_account_non_empty() {
        assert!(!Account::with_balance(U256::one()).is_empty());
    }
}
