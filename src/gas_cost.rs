//! Gas costs of the EVM instructions.
//!
//! Static (per-opcode base) costs are plain constants; they are folded into
//! the dispatch table and charged by the dispatcher before the handler
//! runs. The functions below compute only the *dynamic* remainder a handler
//! must charge itself: per-word costs, memory expansion, cold/warm access,
//! value transfer surcharges.

use crate::{
    constants::WORD_SIZE_IN_BYTES_U64,
    errors::{ExceptionalHalt, InternalError, PrecompileError, VMError},
    fork::ForkRules,
    gas_schedule::GasSchedule,
    memory,
};
use bytes::Bytes;
use ethereum_types::U256;
use ExceptionalHalt::OutOfGas;

// Base costs charged by the dispatcher (entries of the opcode table).
pub const STOP: u64 = 0;
pub const ADD: u64 = 3;
pub const MUL: u64 = 5;
pub const SUB: u64 = 3;
pub const DIV: u64 = 5;
pub const SDIV: u64 = 5;
pub const MOD: u64 = 5;
pub const SMOD: u64 = 5;
pub const ADDMOD: u64 = 8;
pub const MULMOD: u64 = 8;
pub const EXP_STATIC: u64 = 10;
pub const SIGNEXTEND: u64 = 5;
pub const LT: u64 = 3;
pub const GT: u64 = 3;
pub const SLT: u64 = 3;
pub const SGT: u64 = 3;
pub const EQ: u64 = 3;
pub const ISZERO: u64 = 3;
pub const AND: u64 = 3;
pub const OR: u64 = 3;
pub const XOR: u64 = 3;
pub const NOT: u64 = 3;
pub const BYTE: u64 = 3;
pub const SHL: u64 = 3;
pub const SHR: u64 = 3;
pub const SAR: u64 = 3;
pub const KECCAK256_STATIC: u64 = 30;
pub const KECCAK256_DYNAMIC_BASE: u64 = 6;
pub const ADDRESS: u64 = 2;
pub const ORIGIN: u64 = 2;
pub const CALLER: u64 = 2;
pub const CALLVALUE: u64 = 2;
pub const CALLDATALOAD: u64 = 3;
pub const CALLDATASIZE: u64 = 2;
pub const CALLDATACOPY_STATIC: u64 = 3;
pub const CALLDATACOPY_DYNAMIC_BASE: u64 = 3;
pub const CODESIZE: u64 = 2;
pub const CODECOPY_STATIC: u64 = 3;
pub const CODECOPY_DYNAMIC_BASE: u64 = 3;
pub const GASPRICE: u64 = 2;
pub const EXTCODECOPY_DYNAMIC_BASE: u64 = 3;
pub const RETURNDATASIZE: u64 = 2;
pub const RETURNDATACOPY_STATIC: u64 = 3;
pub const RETURNDATACOPY_DYNAMIC_BASE: u64 = 3;
pub const BLOCKHASH: u64 = 20;
pub const COINBASE: u64 = 2;
pub const TIMESTAMP: u64 = 2;
pub const NUMBER: u64 = 2;
pub const PREVRANDAO: u64 = 2;
pub const GASLIMIT: u64 = 2;
pub const CHAINID: u64 = 2;
pub const SELFBALANCE: u64 = 5;
pub const BASEFEE: u64 = 2;
pub const BLOBHASH: u64 = 3;
pub const BLOBBASEFEE: u64 = 2;
pub const POP: u64 = 2;
pub const MLOAD_STATIC: u64 = 3;
pub const MSTORE_STATIC: u64 = 3;
pub const MSTORE8_STATIC: u64 = 3;
pub const JUMP: u64 = 8;
pub const JUMPI: u64 = 10;
pub const PC: u64 = 2;
pub const MSIZE: u64 = 2;
pub const GAS: u64 = 2;
pub const JUMPDEST: u64 = 1;
pub const TLOAD: u64 = 100;
pub const TSTORE: u64 = 100;
pub const MCOPY_STATIC: u64 = 3;
pub const MCOPY_DYNAMIC_BASE: u64 = 3;
pub const PUSH0: u64 = 2;
pub const PUSHN: u64 = 3;
pub const DUPN: u64 = 3;
pub const SWAPN: u64 = 3;
pub const LOGN_STATIC: u64 = 375;
pub const LOGN_DYNAMIC_BASE: u64 = 375;
pub const LOGN_DYNAMIC_BYTE_BASE: u64 = 8;
pub const CREATE_BASE_COST: u64 = 32000;
pub const RETURN: u64 = 0;
pub const REVERT: u64 = 0;

pub const INIT_CODE_WORD_COST: u64 = 2;
pub const CODE_DEPOSIT_COST: u64 = 200;

pub const CALL_POSITIVE_VALUE: u64 = 9000;
pub const CALL_POSITIVE_VALUE_STIPEND: u64 = 2300;

pub const SSTORE_STIPEND: u64 = 2300;
pub const SSTORE_DEFAULT_DYNAMIC: u64 = 100;

// Transaction-level calldata costs (schedule-dependent ones come from
// `GasSchedule`; these are the access-list prepayments of EIP-2930).
pub const ACCESS_LIST_ADDRESS_COST: u64 = 2400;
pub const ACCESS_LIST_STORAGE_KEY_COST: u64 = 1900;

// Precompile costs
pub const ECRECOVER_COST: u64 = 3000;
pub const SHA2_256_STATIC_COST: u64 = 60;
pub const SHA2_256_DYNAMIC_BASE: u64 = 12;
pub const RIPEMD_160_STATIC_COST: u64 = 600;
pub const RIPEMD_160_DYNAMIC_BASE: u64 = 120;
pub const IDENTITY_STATIC_COST: u64 = 15;
pub const IDENTITY_DYNAMIC_BASE: u64 = 3;
pub const MODEXP_STATIC_COST: u64 = 200;
pub const MODEXP_DYNAMIC_QUOTIENT: u64 = 3;
pub const MODEXP_DYNAMIC_QUOTIENT_PRE_BERLIN: u64 = 20;
pub const MODEXP_EXPONENT_FACTOR: u64 = 8;
pub const ECADD_COST: u64 = 150;
pub const ECADD_COST_PRE_ISTANBUL: u64 = 500;
pub const ECMUL_COST: u64 = 6000;
pub const ECMUL_COST_PRE_ISTANBUL: u64 = 40000;
pub const ECPAIRING_BASE_COST: u64 = 45000;
pub const ECPAIRING_GROUP_COST: u64 = 34000;
pub const ECPAIRING_BASE_COST_PRE_ISTANBUL: u64 = 100000;
pub const ECPAIRING_GROUP_COST_PRE_ISTANBUL: u64 = 80000;
pub const BLAKE2F_ROUND_COST: u64 = 1;
pub const POINT_EVALUATION_COST: u64 = 50000;
pub const P256_VERIFY_COST: u64 = 3450;

/// EXP dynamic cost: `exp_byte · byte_size(exponent)`. The byte cost is 10
/// before Spurious Dragon and 50 after ([EIP-160]).
pub fn exp(exponent: U256, schedule: &GasSchedule) -> Result<u64, VMError> {
    let exponent_byte_size = (exponent.bits() as u64).div_ceil(8);
    schedule
        .exp_byte
        .checked_mul(exponent_byte_size)
        .ok_or(OutOfGas.into())
}

fn words(size: usize) -> Result<u64, VMError> {
    let size: u64 = size
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    size.checked_add(WORD_SIZE_IN_BYTES_U64 - 1)
        .ok_or(OutOfGas.into())
        .map(|n| n / WORD_SIZE_IN_BYTES_U64)
}

/// Shared shape of the `*COPY` opcodes: a per-word cost plus memory
/// expansion.
fn copy_behavior(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    dynamic_base: u64,
) -> Result<u64, VMError> {
    let word_cost = dynamic_base.checked_mul(words(size)?).ok_or(OutOfGas)?;
    let expansion = memory::expansion_cost(new_memory_size, current_memory_size)?;
    word_cost.checked_add(expansion).ok_or(OutOfGas.into())
}

pub fn calldatacopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, VMError> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        CALLDATACOPY_DYNAMIC_BASE,
    )
}

pub fn codecopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, VMError> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        CODECOPY_DYNAMIC_BASE,
    )
}

pub fn returndatacopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, VMError> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        RETURNDATACOPY_DYNAMIC_BASE,
    )
}

pub fn keccak256(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, VMError> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        KECCAK256_DYNAMIC_BASE,
    )
}

pub fn mcopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
) -> Result<u64, VMError> {
    copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        MCOPY_DYNAMIC_BASE,
    )
}

/// Pure memory expansion (MLOAD, MSTORE, MSTORE8, RETURN, REVERT).
pub fn memory_expansion(
    new_memory_size: usize,
    current_memory_size: usize,
) -> Result<u64, VMError> {
    memory::expansion_cost(new_memory_size, current_memory_size)
}

pub fn log(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    topic_count: usize,
) -> Result<u64, VMError> {
    let topics_cost = LOGN_DYNAMIC_BASE
        .checked_mul(topic_count as u64)
        .ok_or(OutOfGas)?;
    let size: u64 = size
        .try_into()
        .map_err(|_| ExceptionalHalt::VeryLargeNumber)?;
    let bytes_cost = LOGN_DYNAMIC_BYTE_BASE.checked_mul(size).ok_or(OutOfGas)?;
    let expansion = memory::expansion_cost(new_memory_size, current_memory_size)?;

    topics_cost
        .checked_add(bytes_cost)
        .ok_or(OutOfGas)?
        .checked_add(expansion)
        .ok_or(OutOfGas.into())
}

/// SLOAD dynamic cost. The pre-Berlin flat cost is the table base, so this
/// is zero unless access lists are active.
pub fn sload(slot_was_cold: bool, schedule: &GasSchedule) -> u64 {
    if schedule.has_access_lists {
        if slot_was_cold {
            schedule.cold_sload
        } else {
            schedule.warm_sload
        }
    } else {
        0
    }
}

/// SSTORE dynamic cost per EIP-2200 net metering with the EIP-2929 cold
/// surcharge. Pre-Constantinople (and Petersburg, which reverted EIP-1283)
/// falls back to the simple set/reset model.
pub fn sstore(
    original_value: U256,
    current_value: U256,
    new_value: U256,
    slot_was_cold: bool,
    rules: &ForkRules,
    schedule: &GasSchedule,
) -> Result<u64, VMError> {
    let net_metering = (rules.is_constantinople && !rules.is_petersburg) || rules.is_istanbul;

    let mut cost = if net_metering {
        let dirty_or_noop = if schedule.has_access_lists {
            SSTORE_DEFAULT_DYNAMIC
        } else {
            // EIP-2200 charges SLOAD_GAS, EIP-1283 charged 200
            if rules.is_istanbul { schedule.sload } else { 200 }
        };
        if new_value == current_value {
            dirty_or_noop
        } else if current_value == original_value {
            if original_value.is_zero() {
                schedule.sstore_set
            } else {
                schedule.sstore_reset
            }
        } else {
            dirty_or_noop
        }
    } else if current_value.is_zero() && !new_value.is_zero() {
        schedule.sstore_set
    } else {
        schedule.sstore_reset
    };

    if schedule.has_access_lists && slot_was_cold {
        cost = cost.checked_add(schedule.cold_sload).ok_or(OutOfGas)?;
    }
    Ok(cost)
}

/// Extra account-touch cost of BALANCE/EXTCODESIZE/EXTCODEHASH beyond the
/// table base: the EIP-2929 cold or warm charge.
pub fn address_access(address_was_cold: bool, schedule: &GasSchedule) -> u64 {
    schedule.account_access_cost(address_was_cold)
}

pub fn extcodecopy(
    new_memory_size: usize,
    current_memory_size: usize,
    size: usize,
    address_was_cold: bool,
    schedule: &GasSchedule,
) -> Result<u64, VMError> {
    let copy = copy_behavior(
        new_memory_size,
        current_memory_size,
        size,
        EXTCODECOPY_DYNAMIC_BASE,
    )?;
    copy.checked_add(schedule.account_access_cost(address_was_cold))
        .ok_or(OutOfGas.into())
}

pub fn selfdestruct(
    address_was_cold: bool,
    beneficiary_is_empty: bool,
    balance_to_transfer: U256,
    schedule: &GasSchedule,
) -> Result<u64, VMError> {
    let mut cost = if schedule.has_access_lists && address_was_cold {
        schedule.cold_account_access
    } else {
        0
    };
    if beneficiary_is_empty && !balance_to_transfer.is_zero() {
        cost = cost
            .checked_add(schedule.selfdestruct_new_account)
            .ok_or(OutOfGas)?;
    }
    Ok(cost)
}

/// CREATE/CREATE2 dynamic cost: initcode word cost ([EIP-3860], Shanghai+),
/// hashing cost for CREATE2, and memory expansion. The 32000 base is in the
/// table.
pub fn create(
    new_memory_size: usize,
    current_memory_size: usize,
    code_size_in_memory: usize,
    is_create_2: bool,
    rules: &ForkRules,
) -> Result<u64, VMError> {
    let minimum_word_size = words(code_size_in_memory)?;

    let init_code_cost = if rules.is_shanghai {
        minimum_word_size
            .checked_mul(INIT_CODE_WORD_COST)
            .ok_or(OutOfGas)?
    } else {
        0
    };

    let hash_cost = if is_create_2 {
        minimum_word_size
            .checked_mul(KECCAK256_DYNAMIC_BASE)
            .ok_or(OutOfGas)?
    } else {
        0
    };

    let expansion = memory::expansion_cost(new_memory_size, current_memory_size)?;

    init_code_cost
        .checked_add(hash_cost)
        .ok_or(OutOfGas)?
        .checked_add(expansion)
        .ok_or(OutOfGas.into())
}

/// Dynamic cost and forwarded gas limit of the call family. `gas_left` is
/// the caller's remaining gas after the table base was charged; the
/// returned cost covers access, value and new-account surcharges plus
/// memory expansion, and the limit applies the 63/64 retention rule
/// ([EIP-150]) with the 2300 stipend added on top for value transfers.
#[allow(clippy::too_many_arguments)]
pub fn call(
    new_memory_size: usize,
    current_memory_size: usize,
    address_was_cold: bool,
    account_is_dead: bool,
    value_to_transfer: U256,
    gas_from_stack: U256,
    gas_left: u64,
    charges_new_account: bool,
    schedule: &GasSchedule,
) -> Result<(u64, u64), VMError> {
    let expansion = memory::expansion_cost(new_memory_size, current_memory_size)?;
    let access = schedule.account_access_cost(address_was_cold);

    let positive_value_cost = if value_to_transfer.is_zero() {
        0
    } else {
        CALL_POSITIVE_VALUE
    };

    // G_newaccount only applies to plain CALL (and only when the target is
    // dead and value flows, post-EIP-161).
    let new_account_cost = if charges_new_account && account_is_dead && !value_to_transfer.is_zero()
    {
        schedule.call_new_account
    } else {
        0
    };

    let dynamic_cost = expansion
        .checked_add(access)
        .ok_or(OutOfGas)?
        .checked_add(positive_value_cost)
        .ok_or(OutOfGas)?
        .checked_add(new_account_cost)
        .ok_or(OutOfGas)?;

    let stipend = if value_to_transfer.is_zero() {
        0
    } else {
        CALL_POSITIVE_VALUE_STIPEND
    };

    let gas_left = gas_left.checked_sub(dynamic_cost).ok_or(OutOfGas)?;
    let max_gas_for_call = if schedule.has_63_64_rule {
        gas_left - gas_left / 64
    } else {
        gas_left
    };
    let forwarded: u64 = gas_from_stack
        .min(max_gas_for_call.into())
        .try_into()
        .map_err(|_| OutOfGas)?;

    Ok((
        dynamic_cost.checked_add(forwarded).ok_or(OutOfGas)?,
        forwarded.checked_add(stipend).ok_or(OutOfGas)?,
    ))
}

/// All but one 64th of the remaining gas ([EIP-150]); everything before
/// Tangerine Whistle forwards the full remainder.
pub fn max_message_call_gas(gas_remaining: u64, schedule: &GasSchedule) -> u64 {
    if schedule.has_63_64_rule {
        gas_remaining - gas_remaining / 64
    } else {
        gas_remaining
    }
}

/// Intrinsic calldata cost: 4 per zero byte, 68 (16 from Istanbul) per
/// non-zero byte.
pub fn tx_calldata(calldata: &Bytes, schedule: &GasSchedule) -> Result<u64, VMError> {
    let mut cost: u64 = 0;
    for byte in calldata {
        let byte_cost = if *byte == 0 {
            schedule.calldata_zero
        } else {
            schedule.calldata_nonzero
        };
        cost = cost.checked_add(byte_cost).ok_or(OutOfGas)?;
    }
    Ok(cost)
}

/// [EIP-2930] access-list prepayments.
pub fn tx_access_list(address_count: u64, storage_key_count: u64) -> Result<u64, VMError> {
    let addresses = address_count
        .checked_mul(ACCESS_LIST_ADDRESS_COST)
        .ok_or(OutOfGas)?;
    let keys = storage_key_count
        .checked_mul(ACCESS_LIST_STORAGE_KEY_COST)
        .ok_or(OutOfGas)?;
    addresses.checked_add(keys).ok_or(OutOfGas.into())
}

fn linear_precompile(data_size: usize, static_cost: u64, dynamic_base: u64) -> Result<u64, VMError> {
    let dynamic = dynamic_base.checked_mul(words(data_size)?).ok_or(OutOfGas)?;
    static_cost.checked_add(dynamic).ok_or(OutOfGas.into())
}

pub fn sha2_256(data_size: usize) -> Result<u64, VMError> {
    linear_precompile(data_size, SHA2_256_STATIC_COST, SHA2_256_DYNAMIC_BASE)
}

pub fn ripemd_160(data_size: usize) -> Result<u64, VMError> {
    linear_precompile(data_size, RIPEMD_160_STATIC_COST, RIPEMD_160_DYNAMIC_BASE)
}

pub fn identity(data_size: usize) -> Result<u64, VMError> {
    linear_precompile(data_size, IDENTITY_STATIC_COST, IDENTITY_DYNAMIC_BASE)
}

pub fn ecpairing(group_count: usize, rules: &ForkRules) -> Result<u64, VMError> {
    let group_count = u64::try_from(group_count).map_err(|_| InternalError::TypeConversion)?;
    let (base, per_group) = if rules.is_istanbul {
        (ECPAIRING_BASE_COST, ECPAIRING_GROUP_COST)
    } else {
        (ECPAIRING_BASE_COST_PRE_ISTANBUL, ECPAIRING_GROUP_COST_PRE_ISTANBUL)
    };
    group_count
        .checked_mul(per_group)
        .ok_or(OutOfGas)?
        .checked_add(base)
        .ok_or(OutOfGas.into())
}

/// MODEXP pricing: [EIP-2565] from Berlin, [EIP-198] before.
pub fn modexp(
    exponent_bits: u64,
    base_size: usize,
    exponent_size: usize,
    modulus_size: usize,
    rules: &ForkRules,
) -> Result<u64, VMError> {
    let base_size: u64 = base_size
        .try_into()
        .map_err(|_| PrecompileError::ParsingInputError)?;
    let exponent_size: u64 = exponent_size
        .try_into()
        .map_err(|_| PrecompileError::ParsingInputError)?;
    let modulus_size: u64 = modulus_size
        .try_into()
        .map_err(|_| PrecompileError::ParsingInputError)?;

    let max_length = base_size.max(modulus_size);

    let multiplication_complexity = if rules.is_berlin {
        let words = max_length.div_ceil(8);
        words.checked_pow(2).ok_or(OutOfGas)?
    } else if max_length <= 64 {
        max_length.checked_pow(2).ok_or(OutOfGas)?
    } else if max_length <= 1024 {
        max_length
            .checked_pow(2)
            .ok_or(OutOfGas)?
            .checked_div(4)
            .ok_or(OutOfGas)?
            .checked_add(96u64.checked_mul(max_length).ok_or(OutOfGas)?)
            .ok_or(OutOfGas)?
            .checked_sub(3072)
            .ok_or(InternalError::Underflow)?
    } else {
        max_length
            .checked_pow(2)
            .ok_or(OutOfGas)?
            .checked_div(16)
            .ok_or(OutOfGas)?
            .checked_add(480u64.checked_mul(max_length).ok_or(OutOfGas)?)
            .ok_or(OutOfGas)?
            .checked_sub(199680)
            .ok_or(InternalError::Underflow)?
    };

    let iteration_count = if exponent_size <= 32 && exponent_bits != 0 {
        exponent_bits.saturating_sub(1)
    } else if exponent_size > 32 {
        let extra = (exponent_size - 32)
            .checked_mul(MODEXP_EXPONENT_FACTOR)
            .ok_or(OutOfGas)?;
        extra
            .checked_add(exponent_bits.max(1))
            .ok_or(OutOfGas)?
            .saturating_sub(1)
    } else {
        0
    }
    .max(1);

    let quotient = if rules.is_berlin {
        MODEXP_DYNAMIC_QUOTIENT
    } else {
        MODEXP_DYNAMIC_QUOTIENT_PRE_BERLIN
    };

    let dynamic_cost = multiplication_complexity
        .checked_mul(iteration_count)
        .ok_or(OutOfGas)?
        / quotient;

    // EIP-2565 introduced the 200-gas floor; EIP-198 has none.
    if rules.is_berlin {
        Ok(MODEXP_STATIC_COST.max(dynamic_cost))
    } else {
        Ok(dynamic_cost)
    }
}

/// Intrinsic gas of a whole transaction (minus access-list prepayments,
/// which depend on the declared list and are added by the executor).
pub fn tx_intrinsic(
    calldata: &Bytes,
    is_create: bool,
    rules: &ForkRules,
    schedule: &GasSchedule,
) -> Result<u64, VMError> {
    let mut intrinsic = crate::constants::TX_BASE_COST
        .checked_add(tx_calldata(calldata, schedule)?)
        .ok_or(OutOfGas)?;

    if is_create {
        // the creation uplift has existed since Homestead
        if rules.is_homestead {
            intrinsic = intrinsic
                .checked_add(crate::constants::TX_CREATE_COST)
                .ok_or(OutOfGas)?;
        }
        if rules.is_shanghai {
            let initcode_cost = words(calldata.len())?
                .checked_mul(INIT_CODE_WORD_COST)
                .ok_or(OutOfGas)?;
            intrinsic = intrinsic.checked_add(initcode_cost).ok_or(OutOfGas)?;
        }
    }

    Ok(intrinsic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fork::Fork;

    fn cancun() -> (&'static GasSchedule, ForkRules) {
        (GasSchedule::for_fork(Fork::Cancun), ForkRules::mainnet(Fork::Cancun))
    }

    #[test]
    fn exp_cost_counts_exponent_bytes() {
        let (schedule, _) = cancun();
        // exponent 256 occupies two bytes
        assert_eq!(exp(U256::from(256), schedule).unwrap(), 100);
        assert_eq!(exp(U256::zero(), schedule).unwrap(), 0);
        assert_eq!(exp(U256::from(255), schedule).unwrap(), 50);
    }

    #[test]
    fn exp_cost_pre_spurious_dragon() {
        let schedule = GasSchedule::for_fork(Fork::Homestead);
        assert_eq!(exp(U256::from(256), schedule).unwrap(), 20);
    }

    #[test]
    fn keccak_cost_per_word() {
        // 33 bytes hash as two words: 6*2, no expansion
        assert_eq!(keccak256(64, 64, 33).unwrap(), 12);
    }

    #[test]
    fn sstore_fresh_slot_set() {
        let (schedule, rules) = cancun();
        let cost = sstore(
            U256::zero(),
            U256::zero(),
            U256::from(42),
            true,
            &rules,
            schedule,
        )
        .unwrap();
        // 2100 cold + 20000 set
        assert_eq!(cost, 22100);
    }

    #[test]
    fn sstore_noop_is_warm_read() {
        let (schedule, rules) = cancun();
        let cost = sstore(
            U256::from(1),
            U256::from(1),
            U256::from(1),
            false,
            &rules,
            schedule,
        )
        .unwrap();
        assert_eq!(cost, 100);
    }

    #[test]
    fn call_retains_one_64th() {
        let (schedule, _) = cancun();
        // warm call, no value, plenty of requested gas
        let (cost, forwarded) = call(
            0,
            0,
            false,
            false,
            U256::zero(),
            U256::MAX,
            6400,
            true,
            schedule,
        )
        .unwrap();
        // 6400 - 100 access = 6300 left, 63/64 = 6202 forwarded
        assert_eq!(forwarded, 6202);
        assert_eq!(cost, 100 + 6202);
    }

    #[test]
    fn call_stipend_added_on_top() {
        let (schedule, _) = cancun();
        let (_, forwarded) = call(
            0,
            0,
            false,
            false,
            U256::one(),
            U256::zero(),
            20000,
            true,
            schedule,
        )
        .unwrap();
        assert_eq!(forwarded, CALL_POSITIVE_VALUE_STIPEND);
    }

    #[test]
    fn modexp_floor_cost_post_berlin() {
        let rules = ForkRules::mainnet(Fork::Cancun);
        // tiny operands hit the 200 floor
        assert_eq!(modexp(1, 1, 1, 1, &rules).unwrap(), 200);
    }

    #[test]
    fn intrinsic_gas_call_with_data() {
        let (schedule, rules) = cancun();
        let data = Bytes::from_static(&[0, 0, 1, 2]);
        // 21000 + 2*4 + 2*16
        assert_eq!(
            tx_intrinsic(&data, false, &rules, schedule).unwrap(),
            21040
        );
    }

    #[test]
    fn intrinsic_gas_create_includes_initcode_words() {
        let (schedule, rules) = cancun();
        let data = Bytes::from(vec![1u8; 33]);
        // 21000 + 33*16 + 32000 + 2 words * 2
        assert_eq!(
            tx_intrinsic(&data, true, &rules, schedule).unwrap(),
            21000 + 528 + 32000 + 4
        );
    }
}
