//! # Comparison and bitwise operations
//!
//! Includes the following opcodes:
//!   - `LT`, `GT`, `SLT`, `SGT`, `EQ`, `ISZERO`
//!   - `AND`, `OR`, `XOR`, `NOT`
//!   - `BYTE`, `SHL`, `SHR`, `SAR`

use crate::{
    errors::{OpcodeResult, VMError},
    opcode_handlers::OpcodeHandler,
    vm::VM,
};
use ethereum_types::U256;
use std::cmp::Ordering;

fn bool_to_word(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Two's-complement ordering: negatives sort below non-negatives, within a
/// sign class the unsigned order stands.
fn signed_cmp(lhs: U256, rhs: U256) -> Ordering {
    match (lhs.bit(255), rhs.bit(255)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => lhs.cmp(&rhs),
    }
}

/// Implementation for the `LT` opcode.
pub struct OpLtHandler;
impl OpcodeHandler for OpLtHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe {
            vm.current_call_frame
                .stack
                .push_unchecked(bool_to_word(lhs < rhs))
        };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `GT` opcode.
pub struct OpGtHandler;
impl OpcodeHandler for OpGtHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe {
            vm.current_call_frame
                .stack
                .push_unchecked(bool_to_word(lhs > rhs))
        };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SLT` opcode.
pub struct OpSLtHandler;
impl OpcodeHandler for OpSLtHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe {
            vm.current_call_frame
                .stack
                .push_unchecked(bool_to_word(signed_cmp(lhs, rhs) == Ordering::Less))
        };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SGT` opcode.
pub struct OpSGtHandler;
impl OpcodeHandler for OpSGtHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe {
            vm.current_call_frame
                .stack
                .push_unchecked(bool_to_word(signed_cmp(lhs, rhs) == Ordering::Greater))
        };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EQ` opcode.
pub struct OpEqHandler;
impl OpcodeHandler for OpEqHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe {
            vm.current_call_frame
                .stack
                .push_unchecked(bool_to_word(lhs == rhs))
        };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `ISZERO` opcode.
pub struct OpIsZeroHandler;
impl OpcodeHandler for OpIsZeroHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe {
            vm.current_call_frame
                .stack
                .push_unchecked(bool_to_word(value.is_zero()))
        };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `AND` opcode.
pub struct OpAndHandler;
impl OpcodeHandler for OpAndHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe { vm.current_call_frame.stack.push_unchecked(lhs & rhs) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `OR` opcode.
pub struct OpOrHandler;
impl OpcodeHandler for OpOrHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe { vm.current_call_frame.stack.push_unchecked(lhs | rhs) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `XOR` opcode.
pub struct OpXorHandler;
impl OpcodeHandler for OpXorHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe { vm.current_call_frame.stack.push_unchecked(lhs ^ rhs) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `NOT` opcode.
pub struct OpNotHandler;
impl OpcodeHandler for OpNotHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        unsafe { vm.current_call_frame.stack.push_unchecked(!value) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `BYTE` opcode.
///
/// Returns byte `index` of the word counting from the most significant
/// end; `index >= 32` yields zero.
pub struct OpByteHandler;
impl OpcodeHandler for OpByteHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [index, value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let res = match usize::try_from(index) {
            // U256::byte counts from the least significant end
            Ok(index) if index < 32 => U256::from(value.byte(31 - index)),
            _ => U256::zero(),
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SHL` opcode.
pub struct OpShlHandler;
impl OpcodeHandler for OpShlHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [shift, value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let res = match usize::try_from(shift) {
            Ok(shift) if shift < 256 => value << shift,
            _ => U256::zero(),
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SHR` opcode.
pub struct OpShrHandler;
impl OpcodeHandler for OpShrHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [shift, value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let res = match usize::try_from(shift) {
            Ok(shift) if shift < 256 => value >> shift,
            _ => U256::zero(),
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SAR` opcode.
///
/// Arithmetic right shift: shifts of 256 or more fill with the sign bit.
pub struct OpSarHandler;
impl OpcodeHandler for OpSarHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [shift, value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let negative = value.bit(255);
        let res = match usize::try_from(shift) {
            Ok(shift) if shift < 256 => {
                let shifted = value >> shift;
                if negative && shift > 0 {
                    // fill the vacated high bits with ones
                    shifted | (U256::MAX << (256 - shift))
                } else {
                    shifted
                }
            }
            _ if negative => U256::MAX,
            _ => U256::zero(),
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
