use crate::substate::LogEntry;
use bytes::Bytes;
use ethereum_types::Address;
use serde::Serialize;
use thiserror::Error;

/// Top-level error type returned by opcode handlers and propagated as frame
/// results. Only `Internal` and `Database` variants abort the whole
/// transaction; everything else is scoped to the failing call frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    /// The REVERT opcode. A normal terminal result, not an exceptional halt:
    /// it returns data and preserves remaining gas.
    #[error("revert opcode")]
    RevertOpcode,
    #[error("{0}")]
    ExceptionalHalt(#[from] ExceptionalHalt),
    #[error("{0}")]
    TxValidation(#[from] TxValidationError),
    #[error("{0}")]
    Precompile(#[from] PrecompileError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("internal error: {0}")]
    Internal(#[from] InternalError),
}

impl VMError {
    /// Errors that mean the VM itself is broken, not the executed code.
    /// These must surface to the caller instead of turning into a revert.
    pub fn should_propagate(&self) -> bool {
        matches!(self, VMError::Internal(_) | VMError::Database(_))
    }

    pub fn is_revert_opcode(&self) -> bool {
        matches!(self, VMError::RevertOpcode)
    }
}

/// Consensus-visible failures of the executing code. All of them consume
/// every unit of gas left in the failing frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExceptionalHalt {
    #[error("out of gas")]
    OutOfGas,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("invalid jump destination")]
    InvalidJump,
    #[error("invalid opcode")]
    InvalidOpcode,
    #[error("write in static context")]
    WriteProtection,
    #[error("offset out of bounds")]
    OutOfBounds,
    #[error("operand does not fit in usize")]
    VeryLargeNumber,
    #[error("deployed code exceeds the size cap")]
    ContractOutputTooBig,
    #[error("deployed code starts with the 0xEF reserved byte")]
    InvalidContractPrefix,
}

/// Rejections raised before the first opcode runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxValidationError {
    #[error("intrinsic gas exceeds the gas limit")]
    IntrinsicGasTooHigh,
    #[error("sender balance cannot cover value plus up-front fee")]
    InsufficientFunds,
    #[error("sender nonce is at its maximum")]
    NonceOverflow,
    #[error("initcode exceeds the size cap")]
    InitcodeTooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrecompileError {
    #[error("precompile ran out of gas")]
    NotEnoughGas,
    #[error("malformed precompile input")]
    ParsingInputError,
    #[error("point not on curve")]
    InvalidPoint,
    #[error("coordinate exceeds field modulus")]
    CoordinateExceedsFieldModulus,
    #[error("kzg proof verification failed")]
    VerificationFailed,
}

/// Failure modes of the state backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("not found")]
    NotFound,
    #[error("resource error: {0}")]
    ResourceError(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

/// Invariant breaches inside the VM. Reaching one of these is a bug; they
/// are never consensus-visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("type conversion failure")]
    TypeConversion,
    #[error("slicing out of bounds")]
    Slicing,
    #[error("call frame stack is empty")]
    EmptyCallFrames,
    #[error("substate backup stack is empty")]
    EmptySubstateBackups,
    #[error("call frame has no state snapshot")]
    MissingSnapshot,
}

/// What an opcode handler tells the interpreter loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeResult {
    Continue { pc_increment: usize },
    Halt,
}

/// Outcome of a single execution context (a call frame or a precompile).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxResult {
    Success,
    Revert(VMError),
}

#[derive(Debug, Clone)]
pub struct ContextResult {
    pub result: TxResult,
    pub gas_used: u64,
    pub output: Bytes,
}

impl ContextResult {
    pub fn is_success(&self) -> bool {
        matches!(self.result, TxResult::Success)
    }
}

/// Report of a whole external transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    #[serde(serialize_with = "serialize_tx_result")]
    pub result: TxResult,
    pub gas_used: u64,
    pub gas_refunded: u64,
    pub output: Bytes,
    pub logs: Vec<LogEntry>,
    /// Address of the contract deployed by a create transaction.
    pub created_address: Option<Address>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        matches!(self.result, TxResult::Success)
    }
}

fn serialize_tx_result<S>(result: &TxResult, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match result {
        TxResult::Success => serializer.serialize_str("success"),
        TxResult::Revert(err) => serializer.serialize_str(&err.to_string()),
    }
}
