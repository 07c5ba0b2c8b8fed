use crate::fork::ForkRules;
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use std::collections::BTreeMap;

/// Block-level context the interpreter can observe.
#[derive(Debug, Clone, Default)]
pub struct BlockContext {
    pub number: u64,
    pub timestamp: u64,
    pub coinbase: Address,
    pub prevrandao: H256,
    pub gas_limit: u64,
    pub base_fee: U256,
    pub chain_id: u64,
    pub blob_base_fee: U256,
    pub blob_versioned_hashes: Vec<H256>,
    /// Hashes of the most recent 256 ancestor blocks, keyed by number, for
    /// BLOCKHASH. Absent entries read as zero.
    pub block_hashes: BTreeMap<u64, H256>,
}

/// Everything that parameterizes a single execution: the transaction-level
/// inputs, the block context, and the active rule set.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub origin: Address,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub block: BlockContext,
    pub rules: ForkRules,
}

/// What kind of call a transaction performs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
    Create2 {
        salt: U256,
    },
}

/// The executor-facing description of one transaction-level call.
#[derive(Debug, Clone, Default)]
pub struct TxCall {
    pub kind: TxKind,
    pub from: Address,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    pub gas_price: U256,
    /// [EIP-2930] declared access list: pre-warmed addresses and slots.
    pub access_list: Vec<(Address, Vec<U256>)>,
}

impl TxCall {
    pub fn is_create(&self) -> bool {
        !matches!(self.kind, TxKind::Call(_))
    }

    pub fn to(&self) -> Option<Address> {
        match self.kind {
            TxKind::Call(address) => Some(address),
            _ => None,
        }
    }
}
