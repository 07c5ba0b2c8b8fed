//! # Block information operations
//!
//! Includes the following opcodes:
//!   - `BLOCKHASH`, `COINBASE`, `TIMESTAMP`, `NUMBER`, `PREVRANDAO`
//!   - `GASLIMIT`, `CHAINID`, `SELFBALANCE`, `BASEFEE`
//!   - `BLOBHASH`, `BLOBBASEFEE`

use crate::{
    constants::LAST_AVAILABLE_BLOCK_LIMIT,
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
    utils::{address_to_word, h256_to_u256, u256_to_usize},
    vm::VM,
};
use ethereum_types::U256;

/// Implementation for the `BLOCKHASH` opcode.
///
/// Only the 256 most recent ancestors are addressable; anything else
/// (including the current block) reads as zero.
pub struct OpBlockHashHandler;
impl OpcodeHandler for OpBlockHashHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let requested = unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0];
        let current = vm.env.block.number;

        let hash = match u64::try_from(requested) {
            Ok(number)
                if number < current
                    && number >= current.saturating_sub(LAST_AVAILABLE_BLOCK_LIMIT) =>
            {
                vm.env
                    .block
                    .block_hashes
                    .get(&number)
                    .map(|hash| h256_to_u256(*hash))
                    .unwrap_or_default()
            }
            _ => U256::zero(),
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(hash) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `COINBASE` opcode.
pub struct OpCoinbaseHandler;
impl OpcodeHandler for OpCoinbaseHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let coinbase = address_to_word(vm.env.block.coinbase);
        unsafe { vm.current_call_frame.stack.push_unchecked(coinbase) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `TIMESTAMP` opcode.
pub struct OpTimestampHandler;
impl OpcodeHandler for OpTimestampHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let timestamp = U256::from(vm.env.block.timestamp);
        unsafe { vm.current_call_frame.stack.push_unchecked(timestamp) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `NUMBER` opcode.
pub struct OpNumberHandler;
impl OpcodeHandler for OpNumberHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let number = U256::from(vm.env.block.number);
        unsafe { vm.current_call_frame.stack.push_unchecked(number) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `PREVRANDAO` opcode ([EIP-4399]; DIFFICULTY
/// before the merge, with the same slot).
pub struct OpPrevRandaoHandler;
impl OpcodeHandler for OpPrevRandaoHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let randao = h256_to_u256(vm.env.block.prevrandao);
        unsafe { vm.current_call_frame.stack.push_unchecked(randao) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GASLIMIT` opcode.
pub struct OpGasLimitHandler;
impl OpcodeHandler for OpGasLimitHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let gas_limit = U256::from(vm.env.block.gas_limit);
        unsafe { vm.current_call_frame.stack.push_unchecked(gas_limit) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CHAINID` opcode ([EIP-1344]).
pub struct OpChainIdHandler;
impl OpcodeHandler for OpChainIdHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let chain_id = U256::from(vm.env.block.chain_id);
        unsafe { vm.current_call_frame.stack.push_unchecked(chain_id) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SELFBALANCE` opcode ([EIP-1884]).
pub struct OpSelfBalanceHandler;
impl OpcodeHandler for OpSelfBalanceHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let balance = vm.get_account(vm.current_call_frame.to)?.balance;
        unsafe { vm.current_call_frame.stack.push_unchecked(balance) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BASEFEE` opcode ([EIP-3198]).
pub struct OpBaseFeeHandler;
impl OpcodeHandler for OpBaseFeeHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let base_fee = vm.env.block.base_fee;
        unsafe { vm.current_call_frame.stack.push_unchecked(base_fee) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BLOBHASH` opcode ([EIP-4844]).
pub struct OpBlobHashHandler;
impl OpcodeHandler for OpBlobHashHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let index = unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0];
        let hashes = &vm.env.block.blob_versioned_hashes;

        let hash = match u256_to_usize(index) {
            Ok(index) if index < hashes.len() => h256_to_u256(hashes[index]),
            _ => U256::zero(),
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(hash) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BLOBBASEFEE` opcode ([EIP-7516]).
pub struct OpBlobBaseFeeHandler;
impl OpcodeHandler for OpBlobBaseFeeHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let blob_base_fee = vm.env.block.blob_base_fee;
        unsafe { vm.current_call_frame.stack.push_unchecked(blob_base_fee) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
