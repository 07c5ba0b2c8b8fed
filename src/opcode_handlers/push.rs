//! # Push operations
//!
//! `PUSH0` and `PUSH1` through `PUSH32`. Immediates running past the end
//! of code read as zeros.

use crate::{
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
    vm::VM,
};
use ethereum_types::U256;

/// Implementation for the `PUSHn` opcodes, monomorphized per width.
pub struct OpPushHandler<const N: usize>;
impl<const N: usize> OpcodeHandler for OpPushHandler<N> {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let frame = &mut vm.current_call_frame;
        // skip the opcode byte itself
        let start = frame.pc.wrapping_add(1);
        let end = start.wrapping_add(N);

        let value = if end <= frame.bytecode.len() {
            U256::from_big_endian(&frame.bytecode[start..end])
        } else if start < frame.bytecode.len() {
            // a truncated immediate is zero-padded on the right
            let available = &frame.bytecode[start..];
            let mut padded = [0u8; 32];
            padded[32 - N..32 - N + available.len()].copy_from_slice(available);
            U256::from_big_endian(&padded)
        } else {
            U256::zero()
        };
        unsafe { frame.stack.push_unchecked(value) };

        Ok(OpcodeResult::Continue { pc_increment: N + 1 })
    }
}

/// Implementation for the `PUSH0` opcode ([EIP-3855], Shanghai).
pub struct OpPush0Handler;
impl OpcodeHandler for OpPush0Handler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        unsafe { vm.current_call_frame.stack.push_unchecked(U256::zero()) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
