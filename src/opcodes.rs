//! Opcode identifiers and the dispatch table.
//!
//! The table is a flat array of 256 records so dispatch is a single
//! indexed load. Each record carries the handler, the base gas cost and
//! the static stack preconditions; the dispatcher validates and charges
//! them before the handler runs, so handlers only deal with dynamic gas.
//! Tables are built per fork: availability and fork-dependent base costs
//! are table properties, not hot-loop branches.

use crate::{
    errors::{OpcodeResult, VMError},
    fork::ForkRules,
    gas_cost,
    gas_schedule::GasSchedule,
    opcode_handlers::{
        arithmetic::*, bitwise_comparison::*, block::*, dup::*, environment::*, exchange::*,
        keccak::*, logging::*, push::*, stack_memory_storage_flow::*, system::*, OpInvalidHandler,
        OpStopHandler, OpcodeHandler,
    },
    vm::VM,
};
use strum::EnumString;

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, EnumString, Hash)]
pub enum Opcode {
    // Stop and Arithmetic Operations
    STOP = 0x00,
    ADD = 0x01,
    MUL = 0x02,
    SUB = 0x03,
    DIV = 0x04,
    SDIV = 0x05,
    MOD = 0x06,
    SMOD = 0x07,
    ADDMOD = 0x08,
    MULMOD = 0x09,
    EXP = 0x0A,
    SIGNEXTEND = 0x0B,

    // Comparison & Bitwise Logic Operations
    LT = 0x10,
    GT = 0x11,
    SLT = 0x12,
    SGT = 0x13,
    EQ = 0x14,
    ISZERO = 0x15,
    AND = 0x16,
    OR = 0x17,
    XOR = 0x18,
    NOT = 0x19,
    BYTE = 0x1A,
    SHL = 0x1B,
    SHR = 0x1C,
    SAR = 0x1D,

    // KECCAK256
    KECCAK256 = 0x20,

    // Environmental Information
    ADDRESS = 0x30,
    BALANCE = 0x31,
    ORIGIN = 0x32,
    CALLER = 0x33,
    CALLVALUE = 0x34,
    CALLDATALOAD = 0x35,
    CALLDATASIZE = 0x36,
    CALLDATACOPY = 0x37,
    CODESIZE = 0x38,
    CODECOPY = 0x39,
    GASPRICE = 0x3A,
    EXTCODESIZE = 0x3B,
    EXTCODECOPY = 0x3C,
    RETURNDATASIZE = 0x3D,
    RETURNDATACOPY = 0x3E,
    EXTCODEHASH = 0x3F,

    // Block Information
    BLOCKHASH = 0x40,
    COINBASE = 0x41,
    TIMESTAMP = 0x42,
    NUMBER = 0x43,
    PREVRANDAO = 0x44,
    GASLIMIT = 0x45,
    CHAINID = 0x46,
    SELFBALANCE = 0x47,
    BASEFEE = 0x48,
    BLOBHASH = 0x49,
    BLOBBASEFEE = 0x4A,

    // Stack, Memory, Storage, and Flow Operations
    POP = 0x50,
    MLOAD = 0x51,
    MSTORE = 0x52,
    MSTORE8 = 0x53,
    SLOAD = 0x54,
    SSTORE = 0x55,
    JUMP = 0x56,
    JUMPI = 0x57,
    PC = 0x58,
    MSIZE = 0x59,
    GAS = 0x5A,
    JUMPDEST = 0x5B,
    TLOAD = 0x5C,
    TSTORE = 0x5D,
    MCOPY = 0x5E,

    // Push Operations
    PUSH0 = 0x5F,
    PUSH1 = 0x60,
    PUSH2 = 0x61,
    PUSH3 = 0x62,
    PUSH4 = 0x63,
    PUSH5 = 0x64,
    PUSH6 = 0x65,
    PUSH7 = 0x66,
    PUSH8 = 0x67,
    PUSH9 = 0x68,
    PUSH10 = 0x69,
    PUSH11 = 0x6A,
    PUSH12 = 0x6B,
    PUSH13 = 0x6C,
    PUSH14 = 0x6D,
    PUSH15 = 0x6E,
    PUSH16 = 0x6F,
    PUSH17 = 0x70,
    PUSH18 = 0x71,
    PUSH19 = 0x72,
    PUSH20 = 0x73,
    PUSH21 = 0x74,
    PUSH22 = 0x75,
    PUSH23 = 0x76,
    PUSH24 = 0x77,
    PUSH25 = 0x78,
    PUSH26 = 0x79,
    PUSH27 = 0x7A,
    PUSH28 = 0x7B,
    PUSH29 = 0x7C,
    PUSH30 = 0x7D,
    PUSH31 = 0x7E,
    PUSH32 = 0x7F,

    // Duplication Operations
    DUP1 = 0x80,
    DUP2 = 0x81,
    DUP3 = 0x82,
    DUP4 = 0x83,
    DUP5 = 0x84,
    DUP6 = 0x85,
    DUP7 = 0x86,
    DUP8 = 0x87,
    DUP9 = 0x88,
    DUP10 = 0x89,
    DUP11 = 0x8A,
    DUP12 = 0x8B,
    DUP13 = 0x8C,
    DUP14 = 0x8D,
    DUP15 = 0x8E,
    DUP16 = 0x8F,

    // Swap Operations
    SWAP1 = 0x90,
    SWAP2 = 0x91,
    SWAP3 = 0x92,
    SWAP4 = 0x93,
    SWAP5 = 0x94,
    SWAP6 = 0x95,
    SWAP7 = 0x96,
    SWAP8 = 0x97,
    SWAP9 = 0x98,
    SWAP10 = 0x99,
    SWAP11 = 0x9A,
    SWAP12 = 0x9B,
    SWAP13 = 0x9C,
    SWAP14 = 0x9D,
    SWAP15 = 0x9E,
    SWAP16 = 0x9F,

    // Logging Operations
    LOG0 = 0xA0,
    LOG1 = 0xA1,
    LOG2 = 0xA2,
    LOG3 = 0xA3,
    LOG4 = 0xA4,

    // System Operations
    CREATE = 0xF0,
    CALL = 0xF1,
    CALLCODE = 0xF2,
    RETURN = 0xF3,
    DELEGATECALL = 0xF4,
    CREATE2 = 0xF5,
    STATICCALL = 0xFA,
    REVERT = 0xFD,
    INVALID = 0xFE,
    SELFDESTRUCT = 0xFF,
}

impl From<Opcode> for u8 {
    #[allow(clippy::as_conversions)]
    fn from(opcode: Opcode) -> Self {
        opcode as u8
    }
}

impl From<Opcode> for usize {
    #[allow(clippy::as_conversions)]
    fn from(opcode: Opcode) -> Self {
        opcode as usize
    }
}

/// An opcode handler as a plain function pointer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpCodeFn(fn(&mut VM<'_>) -> Result<OpcodeResult, VMError>);

impl OpCodeFn {
    pub const fn new<T>() -> Self
    where
        T: OpcodeHandler,
    {
        Self(T::eval)
    }

    #[inline(always)]
    pub fn call(self, vm: &mut VM<'_>) -> Result<OpcodeResult, VMError> {
        (self.0)(vm)
    }
}

/// One record of the dispatch table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OpcodeEntry {
    pub handler: OpCodeFn,
    /// Charged by the dispatcher before the handler runs.
    pub base_gas: u64,
    /// Minimum stack size the handler may assume.
    pub min_stack: u16,
    /// Net stack growth (pushes minus pops); used for the overflow check.
    pub stack_delta: i16,
}

impl OpcodeEntry {
    const fn new<T>(base_gas: u64, min_stack: u16, stack_delta: i16) -> Self
    where
        T: OpcodeHandler,
    {
        Self {
            handler: OpCodeFn::new::<T>(),
            base_gas,
            min_stack,
            stack_delta,
        }
    }

    const fn invalid() -> Self {
        Self::new::<OpInvalidHandler>(0, 0, 0)
    }
}

macro_rules! set {
    ($table:expr, $opcode:expr, $handler:ty, $base:expr, $min:expr, $delta:expr) => {
        $table[$opcode as usize] = OpcodeEntry::new::<$handler>($base, $min, $delta);
    };
}

/// Builds the dispatch table for one fork. Unknown or not-yet-active bytes
/// point at the InvalidOpcode handler.
#[allow(clippy::indexing_slicing)]
pub(crate) fn build_opcode_table(rules: &ForkRules) -> [OpcodeEntry; 256] {
    use Opcode::*;

    let schedule = GasSchedule::for_fork(rules.fork);
    let mut table = [OpcodeEntry::invalid(); 256];

    set!(table, STOP, OpStopHandler, gas_cost::STOP, 0, 0);
    set!(table, ADD, OpAddHandler, gas_cost::ADD, 2, -1);
    set!(table, MUL, OpMulHandler, gas_cost::MUL, 2, -1);
    set!(table, SUB, OpSubHandler, gas_cost::SUB, 2, -1);
    set!(table, DIV, OpDivHandler, gas_cost::DIV, 2, -1);
    set!(table, SDIV, OpSDivHandler, gas_cost::SDIV, 2, -1);
    set!(table, MOD, OpModHandler, gas_cost::MOD, 2, -1);
    set!(table, SMOD, OpSModHandler, gas_cost::SMOD, 2, -1);
    set!(table, ADDMOD, OpAddModHandler, gas_cost::ADDMOD, 3, -2);
    set!(table, MULMOD, OpMulModHandler, gas_cost::MULMOD, 3, -2);
    set!(table, EXP, OpExpHandler, gas_cost::EXP_STATIC, 2, -1);
    set!(table, SIGNEXTEND, OpSignExtendHandler, gas_cost::SIGNEXTEND, 2, -1);

    set!(table, LT, OpLtHandler, gas_cost::LT, 2, -1);
    set!(table, GT, OpGtHandler, gas_cost::GT, 2, -1);
    set!(table, SLT, OpSLtHandler, gas_cost::SLT, 2, -1);
    set!(table, SGT, OpSGtHandler, gas_cost::SGT, 2, -1);
    set!(table, EQ, OpEqHandler, gas_cost::EQ, 2, -1);
    set!(table, ISZERO, OpIsZeroHandler, gas_cost::ISZERO, 1, 0);
    set!(table, AND, OpAndHandler, gas_cost::AND, 2, -1);
    set!(table, OR, OpOrHandler, gas_cost::OR, 2, -1);
    set!(table, XOR, OpXorHandler, gas_cost::XOR, 2, -1);
    set!(table, NOT, OpNotHandler, gas_cost::NOT, 1, 0);
    set!(table, BYTE, OpByteHandler, gas_cost::BYTE, 2, -1);

    set!(table, KECCAK256, OpKeccak256Handler, gas_cost::KECCAK256_STATIC, 2, -1);

    set!(table, ADDRESS, OpAddressHandler, gas_cost::ADDRESS, 0, 1);
    set!(table, BALANCE, OpBalanceHandler, schedule.balance, 1, 0);
    set!(table, ORIGIN, OpOriginHandler, gas_cost::ORIGIN, 0, 1);
    set!(table, CALLER, OpCallerHandler, gas_cost::CALLER, 0, 1);
    set!(table, CALLVALUE, OpCallValueHandler, gas_cost::CALLVALUE, 0, 1);
    set!(table, CALLDATALOAD, OpCallDataLoadHandler, gas_cost::CALLDATALOAD, 1, 0);
    set!(table, CALLDATASIZE, OpCallDataSizeHandler, gas_cost::CALLDATASIZE, 0, 1);
    set!(table, CALLDATACOPY, OpCallDataCopyHandler, gas_cost::CALLDATACOPY_STATIC, 3, -3);
    set!(table, CODESIZE, OpCodeSizeHandler, gas_cost::CODESIZE, 0, 1);
    set!(table, CODECOPY, OpCodeCopyHandler, gas_cost::CODECOPY_STATIC, 3, -3);
    set!(table, GASPRICE, OpGasPriceHandler, gas_cost::GASPRICE, 0, 1);
    set!(table, EXTCODESIZE, OpExtCodeSizeHandler, schedule.extcodesize, 1, 0);
    set!(table, EXTCODECOPY, OpExtCodeCopyHandler, schedule.extcodecopy_base, 4, -4);

    set!(table, BLOCKHASH, OpBlockHashHandler, gas_cost::BLOCKHASH, 1, 0);
    set!(table, COINBASE, OpCoinbaseHandler, gas_cost::COINBASE, 0, 1);
    set!(table, TIMESTAMP, OpTimestampHandler, gas_cost::TIMESTAMP, 0, 1);
    set!(table, NUMBER, OpNumberHandler, gas_cost::NUMBER, 0, 1);
    set!(table, PREVRANDAO, OpPrevRandaoHandler, gas_cost::PREVRANDAO, 0, 1);
    set!(table, GASLIMIT, OpGasLimitHandler, gas_cost::GASLIMIT, 0, 1);

    set!(table, POP, OpPopHandler, gas_cost::POP, 1, -1);
    set!(table, MLOAD, OpMLoadHandler, gas_cost::MLOAD_STATIC, 1, 0);
    set!(table, MSTORE, OpMStoreHandler, gas_cost::MSTORE_STATIC, 2, -2);
    set!(table, MSTORE8, OpMStore8Handler, gas_cost::MSTORE8_STATIC, 2, -2);
    set!(table, SLOAD, OpSLoadHandler, schedule.sload, 1, 0);
    set!(table, SSTORE, OpSStoreHandler, 0, 2, -2);
    set!(table, JUMP, OpJumpHandler, gas_cost::JUMP, 1, -1);
    set!(table, JUMPI, OpJumpIHandler, gas_cost::JUMPI, 2, -2);
    set!(table, PC, OpPcHandler, gas_cost::PC, 0, 1);
    set!(table, MSIZE, OpMSizeHandler, gas_cost::MSIZE, 0, 1);
    set!(table, GAS, OpGasHandler, gas_cost::GAS, 0, 1);
    set!(table, JUMPDEST, OpJumpDestHandler, gas_cost::JUMPDEST, 0, 0);

    set!(table, PUSH1, OpPushHandler<1>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH2, OpPushHandler<2>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH3, OpPushHandler<3>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH4, OpPushHandler<4>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH5, OpPushHandler<5>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH6, OpPushHandler<6>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH7, OpPushHandler<7>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH8, OpPushHandler<8>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH9, OpPushHandler<9>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH10, OpPushHandler<10>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH11, OpPushHandler<11>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH12, OpPushHandler<12>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH13, OpPushHandler<13>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH14, OpPushHandler<14>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH15, OpPushHandler<15>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH16, OpPushHandler<16>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH17, OpPushHandler<17>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH18, OpPushHandler<18>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH19, OpPushHandler<19>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH20, OpPushHandler<20>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH21, OpPushHandler<21>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH22, OpPushHandler<22>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH23, OpPushHandler<23>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH24, OpPushHandler<24>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH25, OpPushHandler<25>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH26, OpPushHandler<26>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH27, OpPushHandler<27>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH28, OpPushHandler<28>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH29, OpPushHandler<29>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH30, OpPushHandler<30>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH31, OpPushHandler<31>, gas_cost::PUSHN, 0, 1);
    set!(table, PUSH32, OpPushHandler<32>, gas_cost::PUSHN, 0, 1);

    set!(table, DUP1, OpDupHandler<1>, gas_cost::DUPN, 1, 1);
    set!(table, DUP2, OpDupHandler<2>, gas_cost::DUPN, 2, 1);
    set!(table, DUP3, OpDupHandler<3>, gas_cost::DUPN, 3, 1);
    set!(table, DUP4, OpDupHandler<4>, gas_cost::DUPN, 4, 1);
    set!(table, DUP5, OpDupHandler<5>, gas_cost::DUPN, 5, 1);
    set!(table, DUP6, OpDupHandler<6>, gas_cost::DUPN, 6, 1);
    set!(table, DUP7, OpDupHandler<7>, gas_cost::DUPN, 7, 1);
    set!(table, DUP8, OpDupHandler<8>, gas_cost::DUPN, 8, 1);
    set!(table, DUP9, OpDupHandler<9>, gas_cost::DUPN, 9, 1);
    set!(table, DUP10, OpDupHandler<10>, gas_cost::DUPN, 10, 1);
    set!(table, DUP11, OpDupHandler<11>, gas_cost::DUPN, 11, 1);
    set!(table, DUP12, OpDupHandler<12>, gas_cost::DUPN, 12, 1);
    set!(table, DUP13, OpDupHandler<13>, gas_cost::DUPN, 13, 1);
    set!(table, DUP14, OpDupHandler<14>, gas_cost::DUPN, 14, 1);
    set!(table, DUP15, OpDupHandler<15>, gas_cost::DUPN, 15, 1);
    set!(table, DUP16, OpDupHandler<16>, gas_cost::DUPN, 16, 1);

    set!(table, SWAP1, OpSwapHandler<1>, gas_cost::SWAPN, 2, 0);
    set!(table, SWAP2, OpSwapHandler<2>, gas_cost::SWAPN, 3, 0);
    set!(table, SWAP3, OpSwapHandler<3>, gas_cost::SWAPN, 4, 0);
    set!(table, SWAP4, OpSwapHandler<4>, gas_cost::SWAPN, 5, 0);
    set!(table, SWAP5, OpSwapHandler<5>, gas_cost::SWAPN, 6, 0);
    set!(table, SWAP6, OpSwapHandler<6>, gas_cost::SWAPN, 7, 0);
    set!(table, SWAP7, OpSwapHandler<7>, gas_cost::SWAPN, 8, 0);
    set!(table, SWAP8, OpSwapHandler<8>, gas_cost::SWAPN, 9, 0);
    set!(table, SWAP9, OpSwapHandler<9>, gas_cost::SWAPN, 10, 0);
    set!(table, SWAP10, OpSwapHandler<10>, gas_cost::SWAPN, 11, 0);
    set!(table, SWAP11, OpSwapHandler<11>, gas_cost::SWAPN, 12, 0);
    set!(table, SWAP12, OpSwapHandler<12>, gas_cost::SWAPN, 13, 0);
    set!(table, SWAP13, OpSwapHandler<13>, gas_cost::SWAPN, 14, 0);
    set!(table, SWAP14, OpSwapHandler<14>, gas_cost::SWAPN, 15, 0);
    set!(table, SWAP15, OpSwapHandler<15>, gas_cost::SWAPN, 16, 0);
    set!(table, SWAP16, OpSwapHandler<16>, gas_cost::SWAPN, 17, 0);

    set!(table, LOG0, OpLogHandler<0>, gas_cost::LOGN_STATIC, 2, -2);
    set!(table, LOG1, OpLogHandler<1>, gas_cost::LOGN_STATIC, 3, -3);
    set!(table, LOG2, OpLogHandler<2>, gas_cost::LOGN_STATIC, 4, -4);
    set!(table, LOG3, OpLogHandler<3>, gas_cost::LOGN_STATIC, 5, -5);
    set!(table, LOG4, OpLogHandler<4>, gas_cost::LOGN_STATIC, 6, -6);

    set!(table, CREATE, OpCreateHandler, gas_cost::CREATE_BASE_COST, 3, -2);
    set!(table, CALL, OpCallHandler, schedule.call_base, 7, -6);
    set!(table, CALLCODE, OpCallCodeHandler, schedule.call_base, 7, -6);
    set!(table, RETURN, OpReturnHandler, gas_cost::RETURN, 2, -2);
    set!(table, INVALID, OpInvalidHandler, 0, 0, 0);
    set!(table, SELFDESTRUCT, OpSelfDestructHandler, schedule.selfdestruct, 1, -1);

    if rules.is_homestead {
        set!(table, DELEGATECALL, OpDelegateCallHandler, schedule.call_base, 6, -5);
    }

    if rules.is_byzantium {
        set!(table, RETURNDATASIZE, OpReturnDataSizeHandler, gas_cost::RETURNDATASIZE, 0, 1);
        set!(table, RETURNDATACOPY, OpReturnDataCopyHandler, gas_cost::RETURNDATACOPY_STATIC, 3, -3);
        set!(table, STATICCALL, OpStaticCallHandler, schedule.call_base, 6, -5);
        set!(table, REVERT, OpRevertHandler, gas_cost::REVERT, 2, -2);
    }

    if rules.is_constantinople {
        set!(table, SHL, OpShlHandler, gas_cost::SHL, 2, -1);
        set!(table, SHR, OpShrHandler, gas_cost::SHR, 2, -1);
        set!(table, SAR, OpSarHandler, gas_cost::SAR, 2, -1);
        set!(table, EXTCODEHASH, OpExtCodeHashHandler, schedule.extcodehash, 1, 0);
        set!(table, CREATE2, OpCreate2Handler, gas_cost::CREATE_BASE_COST, 4, -3);
    }

    if rules.is_istanbul {
        set!(table, CHAINID, OpChainIdHandler, gas_cost::CHAINID, 0, 1);
        set!(table, SELFBALANCE, OpSelfBalanceHandler, gas_cost::SELFBALANCE, 0, 1);
    }

    if rules.is_london {
        set!(table, BASEFEE, OpBaseFeeHandler, gas_cost::BASEFEE, 0, 1);
    }

    if rules.is_shanghai {
        // [EIP-3855]
        set!(table, PUSH0, OpPush0Handler, gas_cost::PUSH0, 0, 1);
    }

    if rules.is_cancun {
        // [EIP-1153], [EIP-5656], [EIP-4844], [EIP-7516]
        set!(table, TLOAD, OpTLoadHandler, gas_cost::TLOAD, 1, 0);
        set!(table, TSTORE, OpTStoreHandler, gas_cost::TSTORE, 2, -2);
        set!(table, MCOPY, OpMCopyHandler, gas_cost::MCOPY_STATIC, 3, -3);
        set!(table, BLOBHASH, OpBlobHashHandler, gas_cost::BLOBHASH, 1, 0);
        set!(table, BLOBBASEFEE, OpBlobBaseFeeHandler, gas_cost::BLOBBASEFEE, 0, 1);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fork::Fork;

    #[test]
    fn fork_gated_availability() {
        let frontier = build_opcode_table(&ForkRules::mainnet(Fork::Frontier));
        let cancun = build_opcode_table(&ForkRules::mainnet(Fork::Cancun));
        // SHL is Constantinople+
        assert_eq!(frontier[Opcode::SHL as usize].min_stack, 0);
        assert_eq!(cancun[Opcode::SHL as usize].min_stack, 2);
        // PUSH0 is Shanghai+
        assert_eq!(
            build_opcode_table(&ForkRules::mainnet(Fork::London))[Opcode::PUSH0 as usize].base_gas,
            0
        );
        assert_eq!(cancun[Opcode::PUSH0 as usize].base_gas, 2);
    }

    #[test]
    fn fork_dependent_base_costs() {
        let istanbul = build_opcode_table(&ForkRules::mainnet(Fork::Istanbul));
        let cancun = build_opcode_table(&ForkRules::mainnet(Fork::Cancun));
        assert_eq!(istanbul[Opcode::SLOAD as usize].base_gas, 800);
        assert_eq!(cancun[Opcode::SLOAD as usize].base_gas, 0);
        assert_eq!(istanbul[Opcode::CALL as usize].base_gas, 700);
        assert_eq!(cancun[Opcode::CALL as usize].base_gas, 0);
    }

    #[test]
    fn arithmetic_preconditions() {
        let table = build_opcode_table(&ForkRules::default());
        let add = &table[Opcode::ADD as usize];
        assert_eq!(add.base_gas, 3);
        assert_eq!(add.min_stack, 2);
        assert_eq!(add.stack_delta, -1);
    }
}
