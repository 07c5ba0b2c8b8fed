//! # Arithmetic operations
//!
//! Includes the following opcodes:
//!   - `ADD`
//!   - `SUB`
//!   - `MUL`
//!   - `DIV`
//!   - `SDIV`
//!   - `MOD`
//!   - `SMOD`
//!   - `ADDMOD`
//!   - `MULMOD`
//!   - `EXP`
//!   - `SIGNEXTEND`
//!
//! Every result is reduced modulo 2^256; division by zero yields zero.

use crate::{
    errors::{OpcodeResult, VMError},
    gas_cost,
    opcode_handlers::OpcodeHandler,
    vm::VM,
};
use ethereum_types::{U256, U512};
use std::cmp::Ordering;

/// Implementation for the `ADD` opcode.
pub struct OpAddHandler;
impl OpcodeHandler for OpAddHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (res, _) = lhs.overflowing_add(rhs);
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SUB` opcode.
pub struct OpSubHandler;
impl OpcodeHandler for OpSubHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (res, _) = lhs.overflowing_sub(rhs);
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MUL` opcode.
pub struct OpMulHandler;
impl OpcodeHandler for OpMulHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let (res, _) = lhs.overflowing_mul(rhs);
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `DIV` opcode.
pub struct OpDivHandler;
impl OpcodeHandler for OpDivHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let res = lhs.checked_div(rhs).unwrap_or_default();
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SDIV` opcode.
///
/// Operands are two's-complement; MIN_I256 / -1 wraps back to MIN_I256.
pub struct OpSDivHandler;
impl OpcodeHandler for OpSDivHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [mut lhs, mut rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };

        let mut negative = false;
        if lhs.bit(255) {
            lhs = U256::zero().overflowing_sub(lhs).0;
            negative = !negative;
        }
        if rhs.bit(255) {
            rhs = U256::zero().overflowing_sub(rhs).0;
            negative = !negative;
        }

        let res = match lhs.checked_div(rhs) {
            Some(mut res) => {
                if negative {
                    res = U256::zero().overflowing_sub(res).0;
                }
                res
            }
            None => U256::zero(),
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MOD` opcode.
pub struct OpModHandler;
impl OpcodeHandler for OpModHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let res = lhs.checked_rem(rhs).unwrap_or_default();
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SMOD` opcode.
///
/// The result takes the sign of the dividend.
pub struct OpSModHandler;
impl OpcodeHandler for OpSModHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [mut lhs, mut rhs] = unsafe { vm.current_call_frame.stack.pop_unchecked() };

        let negative = lhs.bit(255);
        if negative {
            lhs = U256::zero().overflowing_sub(lhs).0;
        }
        if rhs.bit(255) {
            rhs = U256::zero().overflowing_sub(rhs).0;
        }

        let res = match lhs.checked_rem(rhs) {
            Some(mut res) => {
                if negative {
                    res = U256::zero().overflowing_sub(res).0;
                }
                res
            }
            None => U256::zero(),
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `ADDMOD` opcode.
///
/// The sum is taken in 512 bits so the overflow bit survives into the
/// reduction.
pub struct OpAddModHandler;
impl OpcodeHandler for OpAddModHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs, modulus] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let res = if modulus.is_zero() || modulus == U256::one() {
            U256::zero()
        } else {
            let sum = U512::from(lhs) + U512::from(rhs);
            let reduced = sum % U512::from(modulus);
            U256([reduced.0[0], reduced.0[1], reduced.0[2], reduced.0[3]])
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `MULMOD` opcode.
///
/// `(a · b) mod n` over the full 512-bit product, not the wrapped one.
pub struct OpMulModHandler;
impl OpcodeHandler for OpMulModHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [lhs, rhs, modulus] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        let res = if lhs.is_zero() || rhs.is_zero() || modulus.is_zero() {
            U256::zero()
        } else {
            let product = lhs.full_mul(rhs);
            let modulus = U512::from(modulus);
            match product.cmp(&modulus) {
                Ordering::Less => {
                    let reduced = product;
                    U256([reduced.0[0], reduced.0[1], reduced.0[2], reduced.0[3]])
                }
                Ordering::Equal => U256::zero(),
                Ordering::Greater => {
                    let reduced = product % modulus;
                    U256([reduced.0[0], reduced.0[1], reduced.0[2], reduced.0[3]])
                }
            }
        };
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `EXP` opcode.
pub struct OpExpHandler;
impl OpcodeHandler for OpExpHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [base, exponent] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        vm.current_call_frame
            .increase_consumed_gas(gas_cost::exp(exponent, vm.schedule())?)?;

        let (res, _) = base.overflowing_pow(exponent);
        unsafe { vm.current_call_frame.stack.push_unchecked(res) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}

/// Implementation for the `SIGNEXTEND` opcode.
///
/// Extends the sign bit of byte `index` (counting from the least
/// significant end) through the rest of the word; `index >= 31` is the
/// identity.
pub struct OpSignExtendHandler;
impl OpcodeHandler for OpSignExtendHandler {
    #[inline(always)]
    fn eval(vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        let [index, mut value] = unsafe { vm.current_call_frame.stack.pop_unchecked() };
        if let Ok(index) = usize::try_from(index) {
            if index < 31 {
                let sign_bit = 8 * index + 7;
                if value.bit(sign_bit) {
                    value |= U256::MAX << (sign_bit + 1);
                } else {
                    value &= (U256::one() << (sign_bit + 1)) - 1;
                }
            }
        }
        unsafe { vm.current_call_frame.stack.push_unchecked(value) };

        Ok(OpcodeResult::Continue { pc_increment: 1 })
    }
}
