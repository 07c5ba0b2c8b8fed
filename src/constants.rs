use ethereum_types::{H256, U256};

pub const WORD_SIZE_IN_BYTES_USIZE: usize = 32;
pub const WORD_SIZE_IN_BYTES_U64: u64 = 32;

pub const SUCCESS: U256 = U256([1, 0, 0, 0]);
pub const FAIL: U256 = U256::zero();

pub const STACK_LIMIT: usize = 1024;
pub const CALL_DEPTH_LIMIT: u16 = 1024;

/// keccak256 of the empty byte string.
pub const EMPTY_CODE_HASH: H256 = H256([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// Root hash of an empty storage trie.
pub const EMPTY_TRIE_HASH: H256 = H256([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

pub const MEMORY_EXPANSION_QUOTIENT: usize = 512;

// Transaction costs in gas
pub const TX_BASE_COST: u64 = 21000;
pub const TX_CREATE_COST: u64 = 32000;

// [EIP-170] runtime code deposit cap
pub const MAX_CODE_SIZE: usize = 0x6000;
// [EIP-3860] initcode cap
pub const INIT_CODE_MAX_SIZE: usize = 49152;

// [EIP-3541] code starting with 0xEF may not be deployed
pub const EOF_PREFIX: u8 = 0xef;

// BLOCKHASH serves only the most recent 256 blocks
pub const LAST_AVAILABLE_BLOCK_LIMIT: u64 = 256;

/// Denominator of the refund cap from London onwards ([EIP-3529]).
pub const MAX_REFUND_QUOTIENT: u64 = 5;
/// Denominator of the refund cap before London.
pub const MAX_REFUND_QUOTIENT_PRE_LONDON: u64 = 2;
