//! # KECCAK256

use crate::{
    errors::{OpcodeResult, VMError},
    gas_cost,
    memory::calculate_memory_size,
    opcode_handlers::OpcodeHandler,
    utils::size_offset_to_usize,
    vm::VM,
};
use ethereum_types::U256;
use keccak_hash::keccak;

/// Implementation for the `KECCAK256` opcode.
pub struct OpKeccak256Handler;
impl OpcodeHandler for OpKeccak256Handler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [offset, size] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (size, offset) = size_offset_to_usize(size, offset)?;

        let new_memory_size = calculate_memory_size(offset, size)?;
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::keccak256(
                new_memory_size,
                vm.current_call_frame.memory.len(),
                size,
            )?)?;
        vm.current_call_frame.memory.resize(new_memory_size);

        let data = vm.current_call_frame.memory.load_range(offset, size)?;
        let hash = keccak(&data);
        unsafe {
            vm.current_call_frame
                .stack
                .push_unchecked(U256::from_big_endian(hash.as_bytes()))
        };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
