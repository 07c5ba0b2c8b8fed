//! # Duplication operations (`DUP1` through `DUP16`)

use crate::{
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
    vm::VM,
};

/// Implementation for the `DUPn` opcodes; `N` is 1-based like the mnemonic.
pub struct OpDupHandler<const N: usize>;
impl<const N: usize> OpcodeHandler for OpDupHandler<N> {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let value = vm.current_call_frame.stack.peek(N - 1)?;
        unsafe { vm.current_call_frame.stack.push_unchecked(value) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
