//! # Stack, memory, storage and control flow operations
//!
//! Includes the following opcodes:
//!   - `POP`, `PC`, `GAS`, `MSIZE`
//!   - `MLOAD`, `MSTORE`, `MSTORE8`, `MCOPY`
//!   - `SLOAD`, `SSTORE`, `TLOAD`, `TSTORE`
//!   - `JUMP`, `JUMPI`, `JUMPDEST`

use crate::{
    constants::WORD_SIZE_IN_BYTES_USIZE,
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost::{self, SSTORE_STIPEND},
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    state::VmState,
    utils::{size_offset_to_usize, u256_to_usize},
    vm::VM,
};
use ethereum_types::U256;

/// Implementation for the `POP` opcode.
pub struct OpPopHandler;
impl OpcodeHandler for OpPopHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `PC` opcode.
pub struct OpPcHandler;
impl OpcodeHandler for OpPcHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let pc = U256::from(vm.current_call_frame.pc);
        unsafe { vm.current_call_frame.stack.push_unchecked(pc) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GAS` opcode.
///
/// Pushes the gas left *after* paying for this instruction.
pub struct OpGasHandler;
impl OpcodeHandler for OpGasHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let remaining = U256::from(vm.current_call_frame.gas_remaining);
        unsafe { vm.current_call_frame.stack.push_unchecked(remaining) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MSIZE` opcode.
pub struct OpMSizeHandler;
impl OpcodeHandler for OpMSizeHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let size = U256::from(vm.current_call_frame.memory.len());
        unsafe { vm.current_call_frame.stack.push_unchecked(size) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MLOAD` opcode.
pub struct OpMLoadHandler;
impl OpcodeHandler for OpMLoadHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let offset = u256_to_usize(unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0])?;

        let new_memory_size = calculate_memory_size(offset, WORD_SIZE_IN_BYTES_USIZE)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::memory_expansion(
                new_memory_size,
                vm.current_call_frame.memory.len(),
            )?)?;

        let frame = &mut vm.current_call_frame;
        frame.memory.resize(new_memory_size);
        let value = frame.memory.load_word(offset)?;
        unsafe { frame.stack.push_unchecked(value) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MSTORE` opcode.
pub struct OpMStoreHandler;
impl OpcodeHandler for OpMStoreHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let offset = u256_to_usize(offset)?;

        let new_memory_size = calculate_memory_size(offset, WORD_SIZE_IN_BYTES_USIZE)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::memory_expansion(
                new_memory_size,
                vm.current_call_frame.memory.len(),
            )?)?;

        let frame = &mut vm.current_call_frame;
        frame.memory.resize(new_memory_size);
        frame.memory.store_word(offset, value)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MSTORE8` opcode.
pub struct OpMStore8Handler;
impl OpcodeHandler for OpMStore8Handler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let offset = u256_to_usize(offset)?;

        let new_memory_size = calculate_memory_size(offset, 1)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::memory_expansion(
                new_memory_size,
                vm.current_call_frame.memory.len(),
            )?)?;

        let frame = &mut vm.current_call_frame;
        frame.memory.resize(new_memory_size);
        frame.memory.store_byte(offset, value.byte(0))?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MCOPY` opcode ([EIP-5656]).
pub struct OpMCopyHandler;
impl OpcodeHandler for OpMCopyHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [dst_offset, src_offset, size] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (size, dst_offset) = size_offset_to_usize(size, dst_offset)?;
        let src_offset = if size == 0 {
            0
        } else {
            u256_to_usize(src_offset)?
        };

        // both the source and destination windows may expand memory
        let new_memory_size = calculate_memory_size(dst_offset, size)?
            .max(calculate_memory_size(src_offset, size)?);
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::mcopy(
                new_memory_size,
                vm.current_call_frame.memory.len(),
                size,
            )?)?;

        let frame = &mut vm.current_call_frame;
        frame.memory.resize(new_memory_size);
        frame.memory.copy_within(src_offset, dst_offset, size)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `TLOAD` opcode ([EIP-1153]).
pub struct OpTLoadHandler;
impl OpcodeHandler for OpTLoadHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let key = unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0];
        let value = vm.db.get_transient(vm.current_call_frame.to, key)?;
        unsafe { vm.current_call_frame.stack.push_unchecked(value) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `TSTORE` opcode ([EIP-1153]).
pub struct OpTStoreHandler;
impl OpcodeHandler for OpTStoreHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        if vm.current_call_frame.is_static {
            return Err(ExceptionalHalt::WriteProtection.into());
        }

        let [key, value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        vm.db.set_transient(vm.current_call_frame.to, key, value)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SLOAD` opcode.
pub struct OpSLoadHandler;
impl OpcodeHandler for OpSLoadHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let key = unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0];
        let to = vm.current_call_frame.to;

        let slot_was_cold = vm.substate.access_list.mark_slot_warm(to, key);
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::sload(slot_was_cold, vm.schedule()))?;

        let value = vm.db.get_storage(to, key)?;
        unsafe { vm.current_call_frame.stack.push_unchecked(value) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SSTORE` opcode.
///
/// [EIP-2200] net gas metering with the [EIP-2929] cold surcharge and the
/// [EIP-3529] refund table. The 2300-gas stipend check guards reentrancy
/// through transfer stipends.
pub struct OpSStoreHandler;
impl OpcodeHandler for OpSStoreHandler {
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        if vm.current_call_frame.is_static {
            return Err(ExceptionalHalt::WriteProtection.into());
        }

        let [key, new_value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let to = vm.current_call_frame.to;

        if vm.current_call_frame.gas_remaining <= SSTORE_STIPEND {
            return Err(ExceptionalHalt::OutOfGas.into());
        }

        let slot_was_cold = vm.substate.access_list.mark_slot_warm(to, key);
        let current_value = vm.db.get_storage(to, key)?;
        let original_value = vm.get_original_storage(to, key)?;

        vm.current_call_frame
            .increase_consumed_gas(gas_cost::sstore(
                original_value,
                current_value,
                new_value,
                slot_was_cold,
                &vm.env.rules,
                vm.schedule(),
            )?)?;

        vm.apply_sstore_refunds(original_value, current_value, new_value);

        if new_value != current_value {
            vm.db.set_storage(to, key, new_value)?;
        }

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `JUMPDEST` opcode. All validation already
/// happened when the jump landed here; this is a 1-gas no-op.
pub struct OpJumpDestHandler;
impl OpcodeHandler for OpJumpDestHandler {
    #[inline(always)]
    fn eval(_vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `JUMP` opcode.
pub struct OpJumpHandler;
impl OpcodeHandler for OpJumpHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let target = unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0];
        jump(vm, target)?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}

/// Implementation for the `JUMPI` opcode.
pub struct OpJumpIHandler;
impl OpcodeHandler for OpJumpIHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [target, condition] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        if condition.is_zero() {
            return Ok(OpcodeResult::Continue { pc_increment: 1 });
        }
        jump(vm, target)?;

        Ok(OpcodeResult::Continue { pc_increment: 0 })
    }
}

/// Validates the target against the jumpdest bitmap and moves the PC
/// there. The JUMPDEST instruction itself executes (and is charged) next.
fn jump(vm: &mut VM<'_>, target: U256) -> Result<(), VMError> {
    let target = usize::try_from(target).map_err(|_| ExceptionalHalt::InvalidJump)?;
    if !vm.current_call_frame.jump_targets.is_valid(target) {
        return Err(ExceptionalHalt::InvalidJump.into());
    }
    vm.current_call_frame.pc = target;
    Ok(())
}
