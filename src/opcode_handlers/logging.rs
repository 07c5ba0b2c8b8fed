//! # Logging operations
//!
//! Includes the following opcodes:
//!   - `LOG0` to `LOG4`

use crate::{
    errors::{ExceptionalHalt, OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    substate::LogEntry,
    utils::{size_offset_to_usize, u256_to_h256},
    vm::VM,
};

/// Implementation for the `LOGn` opcodes.
pub struct OpLogHandler<const N: usize>;
impl<const N: usize> OpcodeHandler for OpLogHandler<N> {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        if vm.current_call_frame.is_static {
            return Err(ExceptionalHalt::WriteProtection.into());
        }

        let [offset, size] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let topics = unsafe { vm.current_call_frame.stack.pop_unchecked::<N>() }.map(u256_to_h256);
        let (size, offset) = size_offset_to_usize(size, offset)?;

        let new_memory_size = calculate_memory_size(offset, size)?;
        vm.current_call_frame.increase_consumed_gas(gas_cost::log(
            new_memory_size,
            vm.current_call_frame.memory.len(),
            size,
            N,
        )?)?;
        vm.current_call_frame.memory.resize(new_memory_size);

        let log = LogEntry {
            address: vm.current_call_frame.to,
            topics: topics.into(),
            data: vm.current_call_frame.memory.load_range(offset, size)?,
        };
        vm.substate.add_log(log);

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
