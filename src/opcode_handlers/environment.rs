//! # Environment operations
//!
//! Includes the following opcodes:
//!   - `ADDRESS`, `BALANCE`, `ORIGIN`, `CALLER`, `CALLVALUE`, `GASPRICE`
//!   - `CALLDATALOAD`, `CALLDATASIZE`, `CALLDATACOPY`
//!   - `CODESIZE`, `CODECOPY`
//!   - `EXTCODESIZE`, `EXTCODECOPY`, `EXTCODEHASH`
//!   - `RETURNDATASIZE`, `RETURNDATACOPY`

use crate::{
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    utils::{address_to_word, h256_to_u256, size_offset_to_usize, u256_to_usize, word_to_address},
    vm::VM,
};
use ethereum_types::U256;

/// Implementation for the `ADDRESS` opcode.
pub struct OpAddressHandler;
impl OpcodeHandler for OpAddressHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let address = address_to_word(vm.current_call_frame.to);
        unsafe { vm.current_call_frame.stack.push_unchecked(address) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BALANCE` opcode.
pub struct OpBalanceHandler;
impl OpcodeHandler for OpBalanceHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let address = word_to_address(unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0]);
        let address_was_cold = vm.substate.access_list.mark_address_warm(address);
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::address_access(address_was_cold, vm.schedule()))?;

        let balance = vm.get_account(address)?.balance;
        unsafe { vm.current_call_frame.stack.push_unchecked(balance) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `ORIGIN` opcode.
pub struct OpOriginHandler;
impl OpcodeHandler for OpOriginHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let origin = address_to_word(vm.env.origin);
        unsafe { vm.current_call_frame.stack.push_unchecked(origin) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLER` opcode.
pub struct OpCallerHandler;
impl OpcodeHandler for OpCallerHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let caller = address_to_word(vm.current_call_frame.msg_sender);
        unsafe { vm.current_call_frame.stack.push_unchecked(caller) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLVALUE` opcode.
pub struct OpCallValueHandler;
impl OpcodeHandler for OpCallValueHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let value = vm.current_call_frame.msg_value;
        unsafe { vm.current_call_frame.stack.push_unchecked(value) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GASPRICE` opcode.
pub struct OpGasPriceHandler;
impl OpcodeHandler for OpGasPriceHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let gas_price = vm.env.gas_price;
        unsafe { vm.current_call_frame.stack.push_unchecked(gas_price) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLDATALOAD` opcode.
///
/// Reads a full word; bytes past the end of calldata are zero.
pub struct OpCallDataLoadHandler;
impl OpcodeHandler for OpCallDataLoadHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let frame = &mut vm.current_call_frame;
        let offset = unsafe { frame.stack.pop_unchecked::<1>() }[0];

        let value = match usize::try_from(offset)
            .ok()
            .and_then(|offset| frame.calldata.get(offset..))
        {
            Some(data) if data.len() >= 32 => U256::from_big_endian(&data[..32]),
            Some(data) if !data.is_empty() => {
                let mut padded = [0u8; 32];
                padded[..data.len()].copy_from_slice(data);
                U256::from_big_endian(&padded)
            }
            _ => U256::zero(),
        };
        unsafe { frame.stack.push_unchecked(value) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLDATASIZE` opcode.
pub struct OpCallDataSizeHandler;
impl OpcodeHandler for OpCallDataSizeHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let size = U256::from(vm.current_call_frame.calldata.len());
        unsafe { vm.current_call_frame.stack.push_unchecked(size) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CALLDATACOPY` opcode.
pub struct OpCallDataCopyHandler;
impl OpcodeHandler for OpCallDataCopyHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [dst_offset, src_offset, size] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;
        let src_offset = u256_to_usize(src_offset).unwrap_or(usize::MAX);

        let new_memory_size = calculate_memory_size(dst_offset, size)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::calldatacopy(
                new_memory_size,
                vm.current_call_frame.memory.len(),
                size,
            )?)?;

        if size > 0 {
            let frame = &mut vm.current_call_frame;
            frame.memory.resize(new_memory_size);
            let data = frame.calldata.get(src_offset..).unwrap_or_default();
            frame.memory.store_data_padded(dst_offset, data, size)?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CODESIZE` opcode.
pub struct OpCodeSizeHandler;
impl OpcodeHandler for OpCodeSizeHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let size = U256::from(vm.current_call_frame.bytecode.len());
        unsafe { vm.current_call_frame.stack.push_unchecked(size) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `CODECOPY` opcode.
pub struct OpCodeCopyHandler;
impl OpcodeHandler for OpCodeCopyHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [dst_offset, src_offset, size] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;
        let src_offset = u256_to_usize(src_offset).unwrap_or(usize::MAX);

        let new_memory_size = calculate_memory_size(dst_offset, size)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::codecopy(
                new_memory_size,
                vm.current_call_frame.memory.len(),
                size,
            )?)?;

        if size > 0 {
            let frame = &mut vm.current_call_frame;
            frame.memory.resize(new_memory_size);
            let data = frame.bytecode.get(src_offset..).unwrap_or_default();
            frame.memory.store_data_padded(dst_offset, data, size)?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXTCODESIZE` opcode.
pub struct OpExtCodeSizeHandler;
impl OpcodeHandler for OpExtCodeSizeHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let address = word_to_address(unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0]);
        let address_was_cold = vm.substate.access_list.mark_address_warm(address);
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::address_access(address_was_cold, vm.schedule()))?;

        let size = U256::from(vm.get_code_of(address)?.len());
        unsafe { vm.current_call_frame.stack.push_unchecked(size) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXTCODECOPY` opcode.
pub struct OpExtCodeCopyHandler;
impl OpcodeHandler for OpExtCodeCopyHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [address, dst_offset, src_offset, size] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let address = word_to_address(address);
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;
        let src_offset = u256_to_usize(src_offset).unwrap_or(usize::MAX);

        let address_was_cold = vm.substate.access_list.mark_address_warm(address);
        let new_memory_size = calculate_memory_size(dst_offset, size)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::extcodecopy(
                new_memory_size,
                vm.current_call_frame.memory.len(),
                size,
                address_was_cold,
                vm.schedule(),
            )?)?;

        if size > 0 {
            let code = vm.get_code_of(address)?;
            let frame = &mut vm.current_call_frame;
            frame.memory.resize(new_memory_size);
            let data = code.get(src_offset..).unwrap_or_default();
            frame.memory.store_data_padded(dst_offset, data, size)?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXTCODEHASH` opcode ([EIP-1052]).
///
/// Empty accounts hash to zero, not to the empty-code hash.
pub struct OpExtCodeHashHandler;
impl OpcodeHandler for OpExtCodeHashHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let address = word_to_address(unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0]);
        let address_was_cold = vm.substate.access_list.mark_address_warm(address);
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::address_access(address_was_cold, vm.schedule()))?;

        let account = vm.get_account(address)?;
        let hash = if account.is_empty() {
            U256::zero()
        } else {
            h256_to_u256(account.code_hash)
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(hash) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `RETURNDATASIZE` opcode ([EIP-211]).
pub struct OpReturnDataSizeHandler;
impl OpcodeHandler for OpReturnDataSizeHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let size = U256::from(vm.current_call_frame.sub_return_data.len());
        unsafe { vm.current_call_frame.stack.push_unchecked(size) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `RETURNDATACOPY` opcode ([EIP-211]).
///
/// Unlike the other copy opcodes, reading past the end of the return
/// buffer is an exceptional halt.
pub struct OpReturnDataCopyHandler;
impl OpcodeHandler for OpReturnDataCopyHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [dst_offset, src_offset, size] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;
        let src_offset = u256_to_usize(src_offset)?;

        let new_memory_size = calculate_memory_size(dst_offset, size)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::returndatacopy(
                new_memory_size,
                vm.current_call_frame.memory.len(),
                size,
            )?)?;

        let frame = &mut vm.current_call_frame;
        let end = src_offset
            .checked_add(size)
            .ok_or(ExceptionalHalt::OutOfBounds)?;
        if end > frame.sub_return_data.len() {
            return Err(ExceptionalHalt::OutOfBounds.into());
        }

        if size > 0 {
            frame.memory.resize(new_memory_size);
            let data = &frame.sub_return_data[src_offset..end];
            frame.memory.store_data(dst_offset, data)?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
