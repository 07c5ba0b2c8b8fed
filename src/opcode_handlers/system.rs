//! # System operations
//!
//! Includes the following opcodes:
//!   - `CALL`, `CALLCODE`, `DELEGATECALL`, `STATICCALL`
//!   - `CREATE`, `CREATE2`
//!   - `RETURN`, `REVERT`, `SELFDESTRUCT`

use crate::{
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    state::VmState,
    utils::{size_offset_to_usize, word_to_address},
    vm::VM,
};
use ethereum_types::U256;

/// Implementation for the `CALL` opcode.
pub struct OpCallHandler;
impl OpcodeHandler for OpCallHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee, value, args_offset, args_size, ret_offset, ret_size] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let callee = word_to_address(callee);
        let (args_size, args_offset) = size_offset_to_usize(args_size, args_offset)?;
        let (ret_size, ret_offset) = size_offset_to_usize(ret_size, ret_offset)?;

        if vm.current_call_frame.is_static && !value.is_zero() {
            return Err(ExceptionalHalt::WriteProtection.into());
        }

        let (new_memory_size, address_was_cold, account_is_dead) =
            vm.get_call_gas_params(args_offset, args_size, ret_offset, ret_size, callee)?;
        let (dynamic_cost, forwarded_gas) = gas_cost::call(
            new_memory_size,
            vm.current_call_frame.memory.len(),
            address_was_cold,
            account_is_dead,
            value,
            gas,
            vm.current_call_frame.gas_remaining,
            true,
            vm.schedule(),
        )?;
        vm.current_call_frame.increase_consumed_gas(dynamic_cost)?;
        vm.current_call_frame.memory.resize(new_memory_size);

        let calldata = vm
            .current_call_frame
            .memory
            .load_range(args_offset, args_size)?;

        vm.generic_call(
            forwarded_gas,
            value,
            vm.current_call_frame.to,
            callee,
            callee,
            true,
            vm.current_call_frame.is_static,
            calldata,
            ret_offset,
            ret_size,
        )
    }
}

/// Implementation for the `CALLCODE` opcode.
///
/// Runs the callee's code against the *caller's* storage and balance; the
/// caller is also the value source.
pub struct OpCallCodeHandler;
impl OpcodeHandler for OpCallCodeHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee, value, args_offset, args_size, ret_offset, ret_size] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let callee = word_to_address(callee);
        let (args_size, args_offset) = size_offset_to_usize(args_size, args_offset)?;
        let (ret_size, ret_offset) = size_offset_to_usize(ret_size, ret_offset)?;

        let (new_memory_size, address_was_cold, _) =
            vm.get_call_gas_params(args_offset, args_size, ret_offset, ret_size, callee)?;
        let (dynamic_cost, forwarded_gas) = gas_cost::call(
            new_memory_size,
            vm.current_call_frame.memory.len(),
            address_was_cold,
            false,
            value,
            gas,
            vm.current_call_frame.gas_remaining,
            false,
            vm.schedule(),
        )?;
        vm.current_call_frame.increase_consumed_gas(dynamic_cost)?;
        vm.current_call_frame.memory.resize(new_memory_size);

        let calldata = vm
            .current_call_frame
            .memory
            .load_range(args_offset, args_size)?;

        // storage identity stays with the current account
        vm.generic_call(
            forwarded_gas,
            value,
            vm.current_call_frame.to,
            vm.current_call_frame.to,
            callee,
            false,
            vm.current_call_frame.is_static,
            calldata,
            ret_offset,
            ret_size,
        )
    }
}

/// Implementation for the `DELEGATECALL` opcode ([EIP-7]).
///
/// Preserves both the caller and the value of the current frame.
pub struct OpDelegateCallHandler;
impl OpcodeHandler for OpDelegateCallHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee, args_offset, args_size, ret_offset, ret_size] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let callee = word_to_address(callee);
        let (args_size, args_offset) = size_offset_to_usize(args_size, args_offset)?;
        let (ret_size, ret_offset) = size_offset_to_usize(ret_size, ret_offset)?;

        let (new_memory_size, address_was_cold, _) =
            vm.get_call_gas_params(args_offset, args_size, ret_offset, ret_size, callee)?;
        let (dynamic_cost, forwarded_gas) = gas_cost::call(
            new_memory_size,
            vm.current_call_frame.memory.len(),
            address_was_cold,
            false,
            U256::zero(),
            gas,
            vm.current_call_frame.gas_remaining,
            false,
            vm.schedule(),
        )?;
        vm.current_call_frame.increase_consumed_gas(dynamic_cost)?;
        vm.current_call_frame.memory.resize(new_memory_size);

        let calldata = vm
            .current_call_frame
            .memory
            .load_range(args_offset, args_size)?;

        vm.generic_call(
            forwarded_gas,
            vm.current_call_frame.msg_value,
            vm.current_call_frame.msg_sender,
            vm.current_call_frame.to,
            callee,
            false,
            vm.current_call_frame.is_static,
            calldata,
            ret_offset,
            ret_size,
        )
    }
}

/// Implementation for the `STATICCALL` opcode ([EIP-214]).
pub struct OpStaticCallHandler;
impl OpcodeHandler for OpStaticCallHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [gas, callee, args_offset, args_size, ret_offset, ret_size] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let callee = word_to_address(callee);
        let (args_size, args_offset) = size_offset_to_usize(args_size, args_offset)?;
        let (ret_size, ret_offset) = size_offset_to_usize(ret_size, ret_offset)?;

        let (new_memory_size, address_was_cold, _) =
            vm.get_call_gas_params(args_offset, args_size, ret_offset, ret_size, callee)?;
        let (dynamic_cost, forwarded_gas) = gas_cost::call(
            new_memory_size,
            vm.current_call_frame.memory.len(),
            address_was_cold,
            false,
            U256::zero(),
            gas,
            vm.current_call_frame.gas_remaining,
            false,
            vm.schedule(),
        )?;
        vm.current_call_frame.increase_consumed_gas(dynamic_cost)?;
        vm.current_call_frame.memory.resize(new_memory_size);

        let calldata = vm
            .current_call_frame
            .memory
            .load_range(args_offset, args_size)?;

        vm.generic_call(
            forwarded_gas,
            U256::zero(),
            vm.current_call_frame.to,
            callee,
            callee,
            false,
            true,
            calldata,
            ret_offset,
            ret_size,
        )
    }
}

/// Implementation for the `RETURN` opcode.
pub struct OpReturnHandler;
impl OpcodeHandler for OpReturnHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, size] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (size, offset) = size_offset_to_usize(size, offset)?;

        let new_memory_size = calculate_memory_size(offset, size)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::memory_expansion(
                new_memory_size,
                vm.current_call_frame.memory.len(),
            )?)?;

        if size != 0 {
            let frame = &mut vm.current_call_frame;
            frame.memory.resize(new_memory_size);
            frame.output = frame.memory.load_range(offset, size)?;
        }

        Ok(OpcodeResult::Halt)
    }
}

/// Implementation for the `REVERT` opcode ([EIP-140]).
pub struct OpRevertHandler;
impl OpcodeHandler for OpRevertHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, size] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (size, offset) = size_offset_to_usize(size, offset)?;

        let new_memory_size = calculate_memory_size(offset, size)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::memory_expansion(
                new_memory_size,
                vm.current_call_frame.memory.len(),
            )?)?;

        if size != 0 {
            let frame = &mut vm.current_call_frame;
            frame.memory.resize(new_memory_size);
            frame.output = frame.memory.load_range(offset, size)?;
        }

        Err(VMError::RevertOpcode)
    }
}

/// Implementation for the `CREATE` opcode.
pub struct OpCreateHandler;
impl OpcodeHandler for OpCreateHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        if vm.current_call_frame.is_static {
            return Err(ExceptionalHalt::WriteProtection.into());
        }

        let [value, code_offset, code_size] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (code_size, code_offset) = size_offset_to_usize(code_size, code_offset)?;

        let new_memory_size = calculate_memory_size(code_offset, code_size)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::create(
                new_memory_size,
                vm.current_call_frame.memory.len(),
                code_size,
                false,
                &vm.env.rules,
            )?)?;
        vm.current_call_frame.memory.resize(new_memory_size);

        vm.generic_create(value, code_offset, code_size, None)
    }
}

/// Implementation for the `CREATE2` opcode ([EIP-1014]).
pub struct OpCreate2Handler;
impl OpcodeHandler for OpCreate2Handler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        if vm.current_call_frame.is_static {
            return Err(ExceptionalHalt::WriteProtection.into());
        }

        let [value, code_offset, code_size, salt] =
            unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (code_size, code_offset) = size_offset_to_usize(code_size, code_offset)?;

        let new_memory_size = calculate_memory_size(code_offset, code_size)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::create(
                new_memory_size,
                vm.current_call_frame.memory.len(),
                code_size,
                true,
                &vm.env.rules,
            )?)?;
        vm.current_call_frame.memory.resize(new_memory_size);

        vm.generic_create(value, code_offset, code_size, Some(salt))
    }
}

/// Implementation for the `SELFDESTRUCT` opcode.
///
/// From Cancun ([EIP-6780]) the account is only scheduled for deletion if
/// it was created in the same transaction; the balance always moves.
pub struct OpSelfDestructHandler;
impl OpcodeHandler for OpSelfDestructHandler {
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        if vm.current_call_frame.is_static {
            return Err(ExceptionalHalt::WriteProtection.into());
        }

        let beneficiary =
            word_to_address(unsafe { vm.current_call_frame.stack.pop_unchecked::<1>() }[0]);
        let this = vm.current_call_frame.to;

        let address_was_cold = vm.substate.access_list.mark_address_warm(beneficiary);
        let balance = vm.get_account(this)?.balance;
        let beneficiary_is_empty = vm.get_account(beneficiary)?.is_empty();
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::selfdestruct(
                address_was_cold,
                beneficiary_is_empty,
                balance,
                vm.schedule(),
            )?)?;

        let schedule_deletion =
            !vm.env.rules.is_cancun || vm.substate.is_account_created(this);

        vm.transfer(this, beneficiary, balance)?;
        if schedule_deletion {
            // when beneficiary == self the ether is burnt
            let mut account = vm.get_account(this)?;
            account.balance = U256::zero();
            vm.db.set_account(this, account)?;

            if !vm.substate.selfdestruct_set.contains(&this) {
                vm.substate.add_refund(vm.schedule().selfdestruct_refund);
            }
            vm.substate.add_selfdestruct(this);
        }

        Ok(OpcodeResult::Halt)
    }
}
