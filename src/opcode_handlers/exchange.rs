//! # Exchange operations (`SWAP1` through `SWAP16`)

use crate::{
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
    vm::VM,
};

/// Implementation for the `SWAPn` opcodes; exchanges the top with the
/// value `N` slots below it.
pub struct OpSwapHandler<const N: usize>;
impl<const N: usize> OpcodeHandler for OpSwapHandler<N> {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        vm.current_call_frame.stack.swap(N)?;

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
